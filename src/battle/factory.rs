//! Character roster table and factory
//!
//! The roster is closed: five characters, each a row of stats plus a
//! special-move kind. Adding a character means adding a row.

use crate::battle::action::{Attack, Defend, SpecialEffect, SpecialMove};
use crate::battle::character::Character;
use crate::core::error::{BattleError, Result};
use crate::core::types::{Hp, Turn};

struct AttackRow {
    name: &'static str,
    description: &'static str,
    voiceline: &'static str,
    damage: Hp,
}

struct DefendRow {
    name: &'static str,
    description: &'static str,
    base_defense: Hp,
    boost: Hp,
}

struct SpecialRow {
    name: &'static str,
    description: &'static str,
    voiceline: &'static str,
    cooldown: Turn,
    effect: SpecialEffect,
}

/// One row of the roster table
pub struct CharacterTemplate {
    key: &'static str,
    name: &'static str,
    hp: Hp,
    attack: AttackRow,
    defend: DefendRow,
    special: SpecialRow,
}

impl CharacterTemplate {
    /// Short lookup key (e.g. "Gojo")
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Full display name (e.g. "Satoru Gojo")
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn build(&self) -> Character {
        Character::new(
            self.name,
            self.hp,
            Attack::new(
                self.attack.name,
                self.attack.description,
                self.attack.voiceline,
                self.attack.damage,
            ),
            Defend::new(
                self.defend.name,
                self.defend.description,
                self.defend.base_defense,
                self.defend.boost,
            ),
            SpecialMove::new(
                self.special.name,
                self.special.description,
                self.special.voiceline,
                self.special.cooldown,
                self.special.effect,
            ),
        )
    }
}

static ROSTER: [CharacterTemplate; 5] = [
    CharacterTemplate {
        key: "Gojo",
        name: "Satoru Gojo",
        hp: 120,
        attack: AttackRow {
            name: "Red",
            description: "Amplifies the repelling force of Limitless using reversed cursed energy, \
                          creating a powerful shockwave that violently repels anything in its path.",
            voiceline: "Convergence, divergence... What do you think happens when one touches this void?",
            damage: 28,
        },
        defend: DefendRow {
            name: "Limitless",
            description: "Recursively divides the space between the attack and defender into a \
                          convergent series of fractional distances.",
            base_defense: 8,
            boost: 15,
        },
        special: SpecialRow {
            name: "Unlimited Void",
            description: "Traps opponents in an empty space with an overwhelming amount of information. \
                          Deals 25 damage to each player and has a 50% chance to stun each opponent.",
            voiceline: "It's ironic isn't it? When granted everything you can't do anything. \
                        Domain Expansion. Unlimited Void.",
            cooldown: 5,
            effect: SpecialEffect::StrikeThenStun {
                damage: 25,
                stun_chance: 0.5,
            },
        },
    },
    CharacterTemplate {
        key: "Sukuna",
        name: "Ryomen Sukuna",
        hp: 140,
        attack: AttackRow {
            name: "Dismantle",
            description: "Slashes opponents with cursed energy capable of cutting through anything \
                          with precision.",
            voiceline: "You are nothing but a fish on my chopping board.",
            damage: 35,
        },
        defend: DefendRow {
            name: "Falling Blossom Emotion",
            description: "An application of cursed energy that automatically repels anything it touches.",
            base_defense: 7,
            boost: 10,
        },
        special: SpecialRow {
            name: "Malevolent Shrine",
            description: "Creates an open barrier where dismantle and cleave continually cut everything \
                          within a massive radius. Deals 30 damage to each player negating defense.",
            voiceline: "This is divine punishment. Domain Expansion. Malevolent Shrine.",
            cooldown: 6,
            effect: SpecialEffect::Strike {
                damage: 30,
                pierce: true,
                heal: 0,
            },
        },
    },
    CharacterTemplate {
        key: "Megumi",
        name: "Megumi Fushiguro",
        hp: 110,
        attack: AttackRow {
            name: "Divine Dogs",
            description: "Summons shikigami that act as swift and relentless hunting beasts that track \
                          and attack his enemies.",
            voiceline: "Devour!",
            damage: 25,
        },
        defend: DefendRow {
            name: "Rabbit Escape",
            description: "Creates a shield for escape by surrounding himself with thousands of rabbit \
                          shikigami.",
            base_defense: 9,
            boost: 14,
        },
        special: SpecialRow {
            name: "Mahoraga",
            description: "Summons the shadow Mahoraga who is able to adapt to techniques and deal massive \
                          damage. Deals 25 damage to each player negating defense and heals 20hp.",
            voiceline: "With this treasure, I summon Eight-Handled Sword, Divergent Sila, Divine General \
                        Mahoraga.",
            cooldown: 5,
            effect: SpecialEffect::Strike {
                damage: 25,
                pierce: true,
                heal: 20,
            },
        },
    },
    CharacterTemplate {
        key: "Nanami",
        name: "Kento Nanami",
        hp: 120,
        attack: AttackRow {
            name: "Ratio",
            description: "Divides anything he touches into a 7:3 ratio, marking the weaker portion as a \
                          critical weak point for a guaranteed enhanced strike.",
            voiceline: "Even with just a blunt sword, a decisive hit at the weak point is lethal.",
            damage: 28,
        },
        defend: DefendRow {
            name: "Block",
            description: "Basically hardening of cursed energy to negate damage.",
            base_defense: 10,
            boost: 12,
        },
        special: SpecialRow {
            name: "Overtime",
            description: "A self-imposed restriction that temporarily increases power and speed. \
                          Has a 25% chance to stun each opponent or will deal 20 damage.",
            voiceline: "I dislike working overtime... but when I do, I give it my all.",
            cooldown: 3,
            effect: SpecialEffect::StunOrStrike {
                damage: 20,
                stun_chance: 0.25,
            },
        },
    },
    CharacterTemplate {
        key: "Nobara",
        name: "Nobara Kugisaki",
        hp: 130,
        attack: AttackRow {
            name: "Hairpin",
            description: "Plants multiple nails into a surface and detonates them simultaneously, \
                          causing large-scale destruction.",
            voiceline: "Hairpin! Hope you like surprises.",
            damage: 27,
        },
        defend: DefendRow {
            name: "Straw Doll",
            description: "Transmits damage into a straw doll to avoid taking a direct hit.",
            base_defense: 14,
            boost: 14,
        },
        special: SpecialRow {
            name: "Resonance",
            description: "Drives a nail into a straw doll linked to her opponents, transmitting poison \
                          damage to them. Randomly poisons alive players for 1-3 moves.",
            voiceline: "No matter where you run, Resonance will find you.",
            cooldown: 4,
            effect: SpecialEffect::Poison {
                min_turns: 1,
                max_turns: 3,
            },
        },
    },
];

/// Builds characters from the roster table
pub struct CharacterFactory;

impl CharacterFactory {
    /// Lookup keys, in table order
    pub fn keys() -> Vec<&'static str> {
        ROSTER.iter().map(|t| t.key).collect()
    }

    pub fn templates() -> &'static [CharacterTemplate] {
        &ROSTER
    }

    pub fn template(key: &str) -> Option<&'static CharacterTemplate> {
        ROSTER.iter().find(|t| t.key.eq_ignore_ascii_case(key))
    }

    pub fn contains(key: &str) -> bool {
        Self::template(key).is_some()
    }

    /// Build a fresh character by key; unknown keys are a hard failure
    pub fn create_character(key: &str) -> Result<Character> {
        Self::template(key)
            .map(CharacterTemplate::build)
            .ok_or_else(|| BattleError::UnknownCharacter(key.to_string()))
    }

    /// Build one character per key, in the given order
    pub fn create_roster<S: AsRef<str>>(keys: &[S]) -> Result<Vec<Character>> {
        keys.iter()
            .map(|k| Self::create_character(k.as_ref()))
            .collect()
    }
}
