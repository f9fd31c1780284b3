use std::fmt;

use crate::net::{KEY_COUNT, KeyStateRecord};

/// 8-bit key identifier. Values follow the common virtual-key numbering,
/// so letters and digits are their upper-case ASCII codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(pub u8);

impl KeyId {
    pub const BACKSPACE: KeyId = KeyId(0x08);
    pub const TAB: KeyId = KeyId(0x09);
    pub const ENTER: KeyId = KeyId(0x0d);
    pub const SPACE: KeyId = KeyId(0x20);
    pub const LEFT: KeyId = KeyId(0x25);
    pub const UP: KeyId = KeyId(0x26);
    pub const RIGHT: KeyId = KeyId(0x27);
    pub const DOWN: KeyId = KeyId(0x28);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Held-down state for every key. Always fully defined; starts all released.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyStateTable {
    pressed: [bool; KEY_COUNT],
}

impl Default for KeyStateTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeyStateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.pressed_keys()).finish()
    }
}

impl KeyStateTable {
    pub fn new() -> Self {
        Self {
            pressed: [false; KEY_COUNT],
        }
    }

    #[inline]
    pub fn is_pressed(&self, key: KeyId) -> bool {
        self.pressed[key.index()]
    }

    /// Stores the new state and reports whether it differed from the old one.
    pub fn set(&mut self, key: KeyId, pressed: bool) -> bool {
        let slot = &mut self.pressed[key.index()];
        let changed = *slot != pressed;
        *slot = pressed;
        changed
    }

    pub fn press(&mut self, key: KeyId) -> bool {
        self.set(key, true)
    }

    pub fn release(&mut self, key: KeyId) -> bool {
        self.set(key, false)
    }

    pub fn pressed_keys(&self) -> impl Iterator<Item = KeyId> + '_ {
        self.pressed
            .iter()
            .enumerate()
            .filter(|(_, pressed)| **pressed)
            .map(|(index, _)| KeyId(index as u8))
    }

    pub fn to_record(&self) -> KeyStateRecord {
        KeyStateRecord::from_flags(&self.pressed)
    }

    /// Overwrites the whole table. Last write wins.
    pub fn apply_record(&mut self, record: &KeyStateRecord) {
        for (index, slot) in self.pressed.iter_mut().enumerate() {
            *slot = record.is_pressed(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn starts_all_released() {
        let table = KeyStateTable::new();
        assert_eq!(table.pressed_keys().count(), 0);
    }

    #[test]
    fn set_reports_changes_only() {
        let mut table = KeyStateTable::new();

        assert!(table.press(KeyId::UP));
        assert!(!table.press(KeyId::UP));
        assert!(table.is_pressed(KeyId::UP));

        assert!(table.release(KeyId::UP));
        assert!(!table.release(KeyId::UP));
        assert!(!table.is_pressed(KeyId::UP));
    }

    #[test]
    fn record_round_trip_is_exact() {
        let mut sender = KeyStateTable::new();
        sender.press(KeyId::LEFT);
        sender.press(KeyId(0));
        sender.press(KeyId(255));

        let record = KeyStateRecord::decode(sender.to_record().as_bytes()).unwrap();

        let mut receiver = KeyStateTable::new();
        receiver.press(KeyId::RIGHT);
        receiver.apply_record(&record);

        assert_eq!(receiver, sender);
    }

    #[test]
    fn debug_lists_pressed_keys() {
        let mut table = KeyStateTable::new();
        table.press(KeyId::UP);
        assert_eq!(format!("{:?}", table), "{KeyId(38)}");
    }

    proptest! {
        #[test]
        fn prop_table_matches_last_edge(
            edges in prop::collection::vec((any::<u8>(), any::<bool>()), 0..200),
        ) {
            let mut table = KeyStateTable::new();
            let mut expected = [false; KEY_COUNT];

            for (key, pressed) in &edges {
                table.set(KeyId(*key), *pressed);
                expected[*key as usize] = *pressed;
            }

            for (index, pressed) in expected.iter().enumerate() {
                prop_assert_eq!(table.is_pressed(KeyId(index as u8)), *pressed);
            }
        }

        #[test]
        fn prop_repeated_edge_is_noop(key in any::<u8>(), pressed in any::<bool>()) {
            let mut table = KeyStateTable::new();
            table.set(KeyId(key), pressed);
            let snapshot = table.clone();

            prop_assert!(!table.set(KeyId(key), pressed));
            prop_assert_eq!(table, snapshot);
        }
    }
}
