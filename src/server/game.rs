//! Game server session loop
//!
//! One acceptor task, one reader task per connection, and a single game
//! loop that owns every piece of gameplay state. Reader tasks only push
//! into the mailbox; the game loop is the only consumer and the only
//! writer to sockets.
//!
//! Session flow:
//! 1. Lobby: connections join until someone sends `start` (with enough
//!    players) or the table is full.
//! 2. Selection: each connection, in accept order, picks a character.
//! 3. Battle: the current player is prompted until the manager reports
//!    the battle is over.

use crate::battle::events::BattleEvent;
use crate::battle::manager::{BattleManager, BattleOutcome, BattlePhase};
use crate::core::config::ServerConfig;
use crate::core::error::Result;
use crate::core::types::ConnectionId;
use crate::server::connection::{read_loop, ConnectionWriter, Envelope, Inbound};
use crate::server::mailbox::Mailbox;
use crate::server::protocol::{
    CharacterDescription, ClientMessage, ClientMessageKind, ServerMessage,
};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

/// A bound, not yet running, battle server
pub struct GameServer {
    config: ServerConfig,
    listener: TcpListener,
    local_addr: SocketAddr,
    battle: BattleManager,
}

impl GameServer {
    /// Validate `config`, build the character pool and bind the listener
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        config.validate()?;
        let battle = BattleManager::from_config(&config)?;
        let listener = TcpListener::bind(config.bind_addr()).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Server listening on {}", local_addr);

        Ok(Self {
            config,
            listener,
            local_addr,
            battle,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Play one full session and report how the battle ended
    pub async fn run(self) -> Result<BattleOutcome> {
        let GameServer {
            config,
            listener,
            battle,
            ..
        } = self;

        let mailbox = Arc::new(Mailbox::new());
        let acceptor = tokio::spawn(accept_loop(
            listener,
            Arc::clone(&mailbox),
            config.max_players,
        ));

        let mut session = Session::new(config, mailbox, battle);
        session.lobby().await;
        acceptor.abort();

        session.select_characters().await;
        session.battle_loop().await
    }
}

/// Accept sockets while a seat is free, handing each to a reader task
async fn accept_loop(listener: TcpListener, mailbox: Arc<Mailbox<Envelope>>, max_players: usize) {
    let seats = Arc::new(Semaphore::new(max_players));
    let mut next_id = 0;

    loop {
        let Ok(permit) = Arc::clone(&seats).acquire_owned().await else {
            return;
        };
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!("Accept failed: {}", e);
                continue;
            }
        };

        next_id += 1;
        let conn = ConnectionId::new(next_id);
        tracing::info!("{} connected from {}", conn, peer);

        let (read_half, write_half) = stream.into_split();
        mailbox.push(Envelope::new(
            conn,
            Inbound::Connected(ConnectionWriter::new(write_half)),
        ));

        let mailbox = Arc::clone(&mailbox);
        tokio::spawn(async move {
            let _permit = permit;
            read_loop(conn, read_half, mailbox).await;
        });
    }
}

struct Client {
    name: Option<String>,
    writer: ConnectionWriter,
}

/// Game-loop state. Lives on one task; nothing here is shared.
struct Session {
    config: ServerConfig,
    mailbox: Arc<Mailbox<Envelope>>,
    clients: BTreeMap<ConnectionId, Client>,
    /// `seats[i]` plays roster slot `i`
    seats: Vec<ConnectionId>,
    /// Connections whose socket failed, awaiting cleanup
    lost: Vec<ConnectionId>,
    battle: BattleManager,
}

impl Session {
    fn new(config: ServerConfig, mailbox: Arc<Mailbox<Envelope>>, battle: BattleManager) -> Self {
        Self {
            config,
            mailbox,
            clients: BTreeMap::new(),
            seats: Vec::new(),
            lost: Vec::new(),
            battle,
        }
    }

    fn label(&self, conn: ConnectionId) -> String {
        self.clients
            .get(&conn)
            .and_then(|c| c.name.clone())
            .unwrap_or_else(|| conn.to_string())
    }

    // === OUTPUT ===

    async fn send(&mut self, conn: ConnectionId, message: &ServerMessage) {
        let Some(client) = self.clients.get_mut(&conn) else {
            return;
        };
        if let Err(e) = client.writer.send(message).await {
            tracing::warn!("Write to {} failed: {}", conn, e);
            self.lost.push(conn);
        }
    }

    async fn broadcast(&mut self, message: &ServerMessage) {
        let conns: Vec<ConnectionId> = self.clients.keys().copied().collect();
        for conn in conns {
            self.send(conn, message).await;
        }
    }

    /// Send a `battle_log` to everyone, unless there is nothing to report
    async fn broadcast_events(&mut self, events: Vec<BattleEvent>) {
        if events.is_empty() {
            return;
        }
        for event in events.iter().filter(|e| e.is_elimination()) {
            tracing::info!("Turn {}: {}", self.battle.turn_number(), event);
        }
        self.broadcast(&ServerMessage::battle_log(events)).await;
    }

    async fn broadcast_state(&mut self) {
        let message = ServerMessage::GameState {
            state: self.battle.roster_snapshot(),
        };
        self.broadcast(&message).await;
    }

    // === SESSION EVENTS ===

    async fn register(&mut self, conn: ConnectionId, writer: ConnectionWriter) {
        self.clients.insert(conn, Client { name: None, writer });
        self.send(conn, &ServerMessage::Welcome { seat: conn.0 }).await;
    }

    async fn turn_away(conn: ConnectionId, mut writer: ConnectionWriter) {
        tracing::info!("Turning away late connection {}", conn);
        let message = ServerMessage::error("The game has already started");
        if let Err(e) = writer.send(&message).await {
            tracing::debug!("Could not notify {}: {}", conn, e);
        }
    }

    async fn rename(&mut self, conn: ConnectionId, player_name: String) {
        let Some(client) = self.clients.get_mut(&conn) else {
            return;
        };
        tracing::info!("{} joined as {}", conn, player_name);
        client.name = Some(player_name.clone());
        self.broadcast(&ServerMessage::status(format!("{} joined the game.", player_name)))
            .await;
    }

    /// Remove connections that went away. A seated player forfeits.
    async fn reap(&mut self) {
        while let Some(conn) = self.lost.pop() {
            let label = self.label(conn);
            if self.clients.remove(&conn).is_none() {
                continue;
            }
            tracing::info!("{} ({}) disconnected", conn, label);

            let events = match self.seats.iter().position(|c| *c == conn) {
                Some(slot) => self.battle.forfeit(slot),
                None => Vec::new(),
            };
            self.broadcast(&ServerMessage::system(format!("{} has left the game.", label)))
                .await;
            self.broadcast_events(events).await;
        }
    }

    // === LOBBY ===

    async fn lobby(&mut self) {
        loop {
            self.reap().await;
            if self.clients.len() >= self.config.max_players {
                tracing::info!("Table full with {} players", self.clients.len());
                break;
            }

            let Envelope { conn, inbound } = self.mailbox.take(|_| true).await;
            match inbound {
                Inbound::Connected(writer) => self.register(conn, writer).await,
                Inbound::Disconnected => self.lost.push(conn),
                Inbound::Message(ClientMessage::Join { player_name }) => {
                    self.rename(conn, player_name).await
                }
                Inbound::Message(ClientMessage::Start) => {
                    if self.clients.len() >= self.config.min_players {
                        tracing::info!("{} started the game", self.label(conn));
                        break;
                    }
                    let reason = format!(
                        "Need at least {} players to start ({} connected)",
                        self.config.min_players,
                        self.clients.len()
                    );
                    self.send(conn, &ServerMessage::error(reason)).await;
                }
                Inbound::Message(_) => {
                    self.send(conn, &ServerMessage::error("The game has not started yet"))
                        .await
                }
            }
        }

        self.broadcast(&ServerMessage::status("Game is starting...")).await;
    }

    /// Wait for a `kind` message from `conn`.
    ///
    /// Session events from anyone are handled on the way. Gameplay messages
    /// from other connections are rejected; other kinds from `conn` stay
    /// queued. Returns `None` once `conn` is gone or the battle is over.
    async fn wait_for(&mut self, conn: ConnectionId, kind: ClientMessageKind) -> Option<ClientMessage> {
        loop {
            self.reap().await;
            if !self.clients.contains_key(&conn) || self.battle.phase() == BattlePhase::Over {
                return None;
            }

            let envelope = self
                .mailbox
                .take(|env| match env.message() {
                    Some(message) if env.conn == conn => {
                        let k = message.kind();
                        k == kind || k == ClientMessageKind::Join || k == ClientMessageKind::Start
                    }
                    _ => true,
                })
                .await;

            let from = envelope.conn;
            match envelope.inbound {
                Inbound::Connected(writer) => Self::turn_away(from, writer).await,
                Inbound::Disconnected => self.lost.push(from),
                Inbound::Message(_) if !self.clients.contains_key(&from) => {}
                Inbound::Message(ClientMessage::Join { player_name }) => {
                    self.rename(from, player_name).await
                }
                Inbound::Message(ClientMessage::Start) => {}
                Inbound::Message(message) if from == conn => return Some(message),
                Inbound::Message(message) => {
                    tracing::debug!("Rejected out-of-turn {:?} from {}", message.kind(), from);
                    self.send(from, &ServerMessage::error("It is not your turn"))
                        .await;
                }
            }
        }
    }

    // === SELECTION ===

    async fn select_characters(&mut self) {
        let order: Vec<ConnectionId> = self.clients.keys().copied().collect();

        for conn in order {
            let label = self.label(conn);
            let others = ServerMessage::status(format!("Waiting for {} to choose a character...", label));
            let waiting: Vec<ConnectionId> =
                self.clients.keys().copied().filter(|c| *c != conn).collect();
            for other in waiting {
                self.send(other, &others).await;
            }

            loop {
                let descriptions = self
                    .battle
                    .available()
                    .iter()
                    .map(|c| CharacterDescription {
                        name: c.name().to_string(),
                        description: c.description(),
                    })
                    .collect();
                self.send(conn, &ServerMessage::CharacterSelection { descriptions })
                    .await;

                let Some(ClientMessage::CharacterChoice { character }) = self
                    .wait_for(conn, ClientMessageKind::CharacterChoice)
                    .await
                else {
                    break;
                };

                match self
                    .battle
                    .assign_character(&character)
                    .map(|c| c.name().to_string())
                {
                    Ok(name) => {
                        tracing::info!("{} is playing {}", label, name);
                        self.seats.push(conn);
                        self.send(conn, &ServerMessage::status(format!("You are playing {}", name)))
                            .await;
                        break;
                    }
                    Err(e) => {
                        tracing::debug!("Rejected choice {:?} from {}: {}", character, conn, e);
                        self.send(conn, &ServerMessage::error(&e)).await;
                    }
                }
            }
        }
    }

    // === BATTLE ===

    async fn battle_loop(&mut self) -> Result<BattleOutcome> {
        self.reap().await;
        if let Err(e) = self.battle.start_battle() {
            tracing::warn!("Cannot start battle: {}", e);
            self.broadcast(&ServerMessage::error(&e)).await;
            return Err(e);
        }
        self.broadcast_state().await;

        while self.battle.phase() == BattlePhase::InProgress {
            self.reap().await;
            let Some(actor) = self.battle.current_player_index() else {
                break;
            };

            let tick = self.battle.handle_status_effects(actor);
            let skip_turn = tick.skip_turn;
            self.broadcast_events(tick.events).await;

            let can_act = !skip_turn
                && self.battle.phase() == BattlePhase::InProgress
                && self.battle.roster()[actor].is_alive();
            if can_act {
                self.play_turn(actor).await;
            }

            let fallen = self.battle.advance_turn();
            self.broadcast_events(fallen).await;
            tracing::info!("Turn {} complete", self.battle.turn_number());
            self.broadcast_state().await;
        }

        let outcome = self.battle.outcome();
        match &outcome {
            BattleOutcome::Victory(name) => tracing::info!("{} wins the battle", name),
            _ => tracing::info!("Battle ended without a winner"),
        }
        let message = ServerMessage::BattleOver {
            winner: outcome.winner().map(str::to_string),
        };
        self.broadcast(&message).await;
        Ok(outcome)
    }

    /// Prompt the seat for `actor` until it makes a legal move or leaves
    async fn play_turn(&mut self, actor: usize) {
        let Some(conn) = self.seats.get(actor).copied() else {
            return;
        };

        loop {
            self.send(conn, &ServerMessage::ActionSelection).await;
            let Some(ClientMessage::Action { action }) =
                self.wait_for(conn, ClientMessageKind::Action).await
            else {
                return;
            };

            let target = if action.needs_target() {
                let targets = self
                    .battle
                    .alive_targets(Some(actor))
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                self.send(conn, &ServerMessage::TargetSelection { targets })
                    .await;

                let Some(ClientMessage::Target { target }) =
                    self.wait_for(conn, ClientMessageKind::Target).await
                else {
                    return;
                };
                match self.battle.target_by_name(&target) {
                    Some(slot) => Some(slot),
                    None => {
                        let reason = format!("Invalid target: {}", target);
                        self.send(conn, &ServerMessage::error(reason)).await;
                        continue;
                    }
                }
            } else {
                None
            };

            match self.battle.apply_action(actor, action, target) {
                Ok(events) => {
                    self.broadcast_events(events).await;
                    return;
                }
                Err(e) => {
                    tracing::debug!("Rejected {:?} from {}: {}", action, conn, e);
                    self.send(conn, &ServerMessage::error(&e)).await;
                }
            }
        }
    }
}
