//! Scan window bounds.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("window start {start} lies after the scan origin")]
    StartAfterOrigin { start: i32 },
    #[error("window end {end} does not extend past the scan origin")]
    EndBeforeOrigin { end: i32 },
    #[error("sequence cap of zero describes nothing")]
    ZeroSequenceCap,
}

/// Bounds on how far a describe pass may walk.
///
/// `window_start`/`window_end` are byte offsets relative to the scan
/// origin; the window covers `[origin + window_start, origin + window_end]`.
/// The walker only moves forward, so `window_end` is what stops it;
/// `window_start` exists for consumers asking whether a backward branch
/// target still lies inside the described window. `max_sequence` caps the
/// descriptor count outright, since conditional branches do not end the
/// walk and a loop-free cap must.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    pub window_start: i32,
    pub window_end: i32,
    pub max_sequence: u32,
}

impl WindowConfig {
    pub fn new(window_start: i32, window_end: i32, max_sequence: u32) -> Result<Self, WindowError> {
        if window_start > 0 {
            return Err(WindowError::StartAfterOrigin {
                start: window_start,
            });
        }
        if window_end <= 0 {
            return Err(WindowError::EndBeforeOrigin { end: window_end });
        }
        if max_sequence == 0 {
            return Err(WindowError::ZeroSequenceCap);
        }
        Ok(Self {
            window_start,
            window_end,
            max_sequence,
        })
    }

    /// Whether `pc` falls inside the window anchored at `origin`.
    /// Distance is computed modulo 2^32 and taken as signed, so windows
    /// straddling the address-space wrap behave.
    #[must_use]
    pub fn contains(&self, origin: u32, pc: u32) -> bool {
        let delta = pc.wrapping_sub(origin) as i32;
        delta >= self.window_start && delta <= self.window_end
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_start: 0,
            window_end: 4096,
            max_sequence: 64,
        }
    }
}
