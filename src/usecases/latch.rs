//! In-flight latch: at most one outstanding request per user action.

use crate::domain::DomainError;
use tokio::sync::{Semaphore, SemaphorePermit};

/// A single-permit gate. Holding the permit marks the action as in flight;
/// dropping it (on success or failure) re-opens the gate.
pub struct InFlight {
    gate: Semaphore,
}

impl InFlight {
    pub fn new() -> Self {
        Self {
            gate: Semaphore::new(1),
        }
    }

    /// Claim the gate or fail with `Busy` without waiting.
    pub fn try_begin(&self) -> Result<SemaphorePermit<'_>, DomainError> {
        self.gate.try_acquire().map_err(|_| DomainError::Busy)
    }

    pub fn is_busy(&self) -> bool {
        self.gate.available_permits() == 0
    }
}

impl Default for InFlight {
    fn default() -> Self {
        Self::new()
    }
}
