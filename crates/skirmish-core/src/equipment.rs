//! Equipped items and the stat bonuses they grant.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where an item is worn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EquipmentSlot {
    /// Head.
    Helmet,
    /// Body.
    Armor,
    /// Main hand.
    Weapon,
}

/// An equippable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    /// Display name.
    pub name: String,
    /// Slot the item occupies.
    pub slot: EquipmentSlot,
    /// Flat damage added to every melee hit.
    pub attack_bonus: i32,
    /// Flat defense value.
    pub defense_bonus: i32,
}

impl Equipment {
    /// Creates an item with no bonuses.
    #[must_use]
    pub fn new(name: impl Into<String>, slot: EquipmentSlot) -> Self {
        Self {
            name: name.into(),
            slot,
            attack_bonus: 0,
            defense_bonus: 0,
        }
    }

    /// Sets the attack bonus.
    #[must_use]
    pub fn with_attack(mut self, bonus: i32) -> Self {
        self.attack_bonus = bonus;
        self
    }

    /// Sets the defense bonus.
    #[must_use]
    pub fn with_defense(mut self, bonus: i32) -> Self {
        self.defense_bonus = bonus;
        self
    }
}

/// At most one item per slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loadout {
    slots: BTreeMap<EquipmentSlot, Equipment>,
}

impl Loadout {
    /// Creates an empty loadout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Equips an item, returning whatever was in its slot.
    pub fn equip(&mut self, item: Equipment) -> Option<Equipment> {
        self.slots.insert(item.slot, item)
    }

    /// Clears a slot.
    pub fn unequip(&mut self, slot: EquipmentSlot) -> Option<Equipment> {
        self.slots.remove(&slot)
    }

    /// Item in a slot.
    #[must_use]
    pub fn get(&self, slot: EquipmentSlot) -> Option<&Equipment> {
        self.slots.get(&slot)
    }

    /// Sum of attack bonuses.
    #[must_use]
    pub fn attack_bonus(&self) -> i32 {
        self.slots.values().map(|e| e.attack_bonus).sum()
    }

    /// Sum of defense bonuses.
    #[must_use]
    pub fn defense_bonus(&self) -> i32 {
        self.slots.values().map(|e| e.defense_bonus).sum()
    }
}
