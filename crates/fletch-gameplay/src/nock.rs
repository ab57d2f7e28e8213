//! Arrows and the nock slot that holds one on the string.

use serde::{Deserialize, Serialize};

use fletch_common::{ArcheryError, ArrowId, RigId};

/// Who drives an arrow's motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KinematicMode {
    /// In hand or in the quiver, no physics
    Held,
    /// Seated on a string, no physics
    Nocked,
    /// Physics driven, owned by the flight system
    Flying,
    /// Frozen at its contact point
    Impacted,
}

/// A single arrow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrow {
    id: ArrowId,
    owner_rig: Option<RigId>,
    damage: i32,
    mode: KinematicMode,
}

impl Arrow {
    /// Creates a held arrow.
    #[must_use]
    pub const fn new(id: ArrowId, damage: i32) -> Self {
        Self {
            id,
            owner_rig: None,
            damage,
            mode: KinematicMode::Held,
        }
    }

    /// Arrow identifier.
    #[must_use]
    pub const fn id(&self) -> ArrowId {
        self.id
    }

    /// Rig that last nocked this arrow.
    #[must_use]
    pub const fn owner_rig(&self) -> Option<RigId> {
        self.owner_rig
    }

    /// Damage dealt on impact.
    #[must_use]
    pub const fn damage(&self) -> i32 {
        self.damage
    }

    /// Current kinematic mode.
    #[must_use]
    pub const fn mode(&self) -> KinematicMode {
        self.mode
    }

    /// Checks whether the arrow has struck something.
    #[must_use]
    pub fn has_impacted(&self) -> bool {
        self.mode == KinematicMode::Impacted
    }

    pub(crate) fn set_mode(&mut self, mode: KinematicMode) {
        self.mode = mode;
    }

    pub(crate) fn set_owner(&mut self, rig: Option<RigId>) {
        self.owner_rig = rig;
    }
}

/// An arrow that could not be nocked, handed back to the caller.
#[derive(Debug)]
pub struct NockRejected {
    /// The arrow, unchanged
    pub arrow: Arrow,
    /// Why it was rejected
    pub error: ArcheryError,
}

/// Holds at most one arrow.
#[derive(Debug, Clone, Default)]
pub struct NockSlot {
    arrow: Option<Arrow>,
}

impl NockSlot {
    /// Creates an empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self { arrow: None }
    }

    /// Seats an arrow. An occupied slot hands the new arrow back.
    pub fn place(&mut self, arrow: Arrow) -> Result<(), NockRejected> {
        if let Some(existing) = &self.arrow {
            return Err(NockRejected {
                error: ArcheryError::SlotOccupied(existing.id()),
                arrow,
            });
        }
        self.arrow = Some(arrow);
        Ok(())
    }

    /// Removes and returns the seated arrow.
    pub fn take(&mut self) -> Option<Arrow> {
        self.arrow.take()
    }

    /// Seated arrow, if any.
    #[must_use]
    pub const fn peek(&self) -> Option<&Arrow> {
        self.arrow.as_ref()
    }

    /// Checks whether an arrow is seated.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.arrow.is_some()
    }
}
