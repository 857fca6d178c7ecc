use std::collections::BTreeMap;

/// Fixed room-type → total-unit-count table. Defined at startup, never
/// mutated at runtime.
#[derive(Debug, Clone)]
pub struct RoomInventory {
    rooms: BTreeMap<String, u32>,
}

impl RoomInventory {
    pub fn new(rooms: BTreeMap<String, u32>) -> Self {
        Self { rooms }
    }

    /// The inventory this mock property ships with.
    pub fn standard() -> Self {
        Self::new(BTreeMap::from([
            ("single".to_string(), 5),
            ("double".to_string(), 3),
            ("suite".to_string(), 2),
        ]))
    }

    pub fn total(&self, room_type: &str) -> Option<u32> {
        self.rooms.get(room_type).copied()
    }

    pub fn contains(&self, room_type: &str) -> bool {
        self.rooms.contains_key(room_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.rooms.iter().map(|(name, total)| (name.as_str(), *total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table() {
        let inv = RoomInventory::standard();
        assert_eq!(inv.total("single"), Some(5));
        assert_eq!(inv.total("double"), Some(3));
        assert_eq!(inv.total("suite"), Some(2));
        assert_eq!(inv.total("penthouse"), None);
        assert!(inv.contains("single"));
        assert!(!inv.contains("penthouse"));
    }

    #[test]
    fn iteration_is_ordered() {
        let inv = RoomInventory::standard();
        let names: Vec<&str> = inv.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["double", "single", "suite"]);
    }
}
