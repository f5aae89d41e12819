use std::fmt;

/// Path-like device identifier: colon-separated segments, root devices one
/// segment deep (`"maincpu"`, `"maple:port0"`).
///
/// Construction goes through [`MachineConfig`]; a `DeviceTag` in hand is
/// always syntactically valid.
///
/// [`MachineConfig`]: crate::MachineConfig
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceTag(String);

impl DeviceTag {
    /// Validates and wraps `tag`. Segments are non-empty and limited to
    /// lowercase alphanumerics plus `_`, `-` and `.`.
    pub(crate) fn parse(tag: &str) -> Option<Self> {
        if tag.is_empty() {
            return None;
        }
        let valid = tag.split(':').all(|seg| {
            !seg.is_empty()
                && seg
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "_-.".contains(c))
        });
        valid.then(|| Self(tag.to_owned()))
    }

    pub(crate) fn child(&self, segment: &str) -> String {
        format!("{}:{segment}", self.0)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(':')
    }

    /// Tag path of the owning device, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.0.rsplit_once(':').map(|(head, _)| head)
    }

    /// Final path segment.
    #[must_use]
    pub fn leaf(&self) -> &str {
        self.0.rsplit(':').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for DeviceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
