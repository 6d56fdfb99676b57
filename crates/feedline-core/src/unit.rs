//! A single discrete item traveling along a path.

use crate::fixed::Fixed64;

/// One physical unit on a conveyor path.
///
/// Owned exclusively by the [`Path`](crate::path::Path) whose queue holds
/// it; created by the source controller, removed by the take scheduler.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Unit {
    /// Distance along the path, monotonically non-decreasing while moving.
    pub position: Fixed64,
    /// True if emitted as a forced flush during buffer-stop recovery.
    pub is_purge: bool,
    /// True only while strictly short of the motion target. Derived,
    /// read by rendering consumers.
    pub is_moving: bool,
}

impl Unit {
    /// A regular unit at the given position.
    pub fn new(position: Fixed64) -> Self {
        Self {
            position,
            is_purge: false,
            is_moving: false,
        }
    }

    /// A purge-flagged unit at the given position.
    pub fn purge(position: Fixed64) -> Self {
        Self {
            position,
            is_purge: true,
            is_moving: false,
        }
    }
}
