use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Per-machine user configuration, deserialized from the front end.
///
/// Only consulted during [`MachineConfig::build`]; nothing reads it at run
/// time, so changing options means rebuilding the machine.
///
/// [`MachineConfig::build`]: crate::MachineConfig::build
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MachineOptions {
    /// Slot tag → selected option name. Absent slots use the machine
    /// description's default.
    #[serde(default)]
    pub slots: HashMap<String, String>,
}

impl MachineOptions {
    #[must_use]
    pub fn slot_selection(&self, tag: &str) -> Option<&str> {
        self.slots.get(tag).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_defaults() {
        let opts: MachineOptions = serde_json::from_str("{}").unwrap();
        assert!(opts.slots.is_empty());

        let opts: MachineOptions =
            serde_json::from_str(r#"{"slots": {"maple:port0": "pad"}}"#).unwrap();
        assert_eq!(opts.slot_selection("maple:port0"), Some("pad"));
        assert_eq!(opts.slot_selection("maple:port1"), None);
    }
}
