use thiserror::Error;

/// Stable identifier of one named register within a core's state table.
pub type StateIndex = u16;

/// One named register exposed to the debugger and save states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEntry {
    pub index: StateIndex,
    pub name: &'static str,
    pub width_bits: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("unknown state index {index}")]
    UnknownIndex { index: StateIndex },
    #[error("value {value:#x} does not fit the {width_bits}-bit register {name}")]
    ValueTooWide {
        name: &'static str,
        width_bits: u8,
        value: u64,
    },
}

/// Ordered collection of a core's named registers.
///
/// Declared once when the core is constructed; the order of declaration is
/// the order of export, which is what makes save states layout-stable.
#[derive(Debug, Clone, Default)]
pub struct StateTable {
    entries: Vec<StateEntry>,
}

impl StateTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a register. Indices and names are fixed hardware facts, so
    /// duplicates are a bug in the core, not a runtime condition.
    pub fn add(&mut self, index: StateIndex, name: &'static str, width_bits: u8) -> &mut Self {
        assert!(
            self.lookup(index).is_none(),
            "state index {index} declared twice"
        );
        assert!(
            self.by_name(name).is_none(),
            "state name {name:?} declared twice"
        );
        assert!((1..=64).contains(&width_bits), "bad register width");
        self.entries.push(StateEntry {
            index,
            name,
            width_bits,
        });
        self
    }

    #[must_use]
    pub fn entries(&self) -> &[StateEntry] {
        &self.entries
    }

    #[must_use]
    pub fn lookup(&self, index: StateIndex) -> Option<&StateEntry> {
        self.entries.iter().find(|e| e.index == index)
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&StateEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Validates that `value` fits `index`'s declared width.
    pub fn check(&self, index: StateIndex, value: u64) -> Result<(), StateError> {
        let entry = self
            .lookup(index)
            .ok_or(StateError::UnknownIndex { index })?;
        if entry.width_bits < 64 && value >> entry.width_bits != 0 {
            return Err(StateError::ValueTooWide {
                name: entry.name,
                width_bits: entry.width_bits,
                value,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> StateTable {
        let mut t = StateTable::new();
        t.add(0, "PC", 32).add(1, "CR", 32).add(2, "CA", 1);
        t
    }

    #[test]
    fn declaration_order_is_preserved() {
        let t = table();
        let names: Vec<_> = t.entries().iter().map(|e| e.name).collect();
        assert_eq!(names, ["PC", "CR", "CA"]);
        assert_eq!(t.by_name("CR").map(|e| e.index), Some(1));
        assert_eq!(t.lookup(2).map(|e| e.name), Some("CA"));
    }

    #[test]
    fn check_enforces_width_and_known_index() {
        let t = table();
        t.check(0, u64::from(u32::MAX)).unwrap();
        assert!(matches!(
            t.check(2, 2),
            Err(StateError::ValueTooWide { name: "CA", .. })
        ));
        assert!(matches!(
            t.check(9, 0),
            Err(StateError::UnknownIndex { index: 9 })
        ));
    }

    #[test]
    #[should_panic(expected = "declared twice")]
    fn duplicate_index_panics() {
        let mut t = StateTable::new();
        t.add(0, "A", 8).add(0, "B", 8);
    }
}
