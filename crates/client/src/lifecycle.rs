//! Worker lifecycle state machine.
//!
//! `Parsed → Installing → Installed → Activating → Activated`, with
//! `Redundant` when install cannot reach storage at all.

use asset_cache_core::Error;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

/// Lifecycle bookkeeping owned by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    pub state: WorkerState,
    /// Set once install completes: supersede the active worker without waiting.
    pub skip_waiting: bool,
    /// Set once activation completes: already-open pages are controlled too.
    pub controls_clients: bool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self { state: WorkerState::Parsed, skip_waiting: false, controls_clients: false }
    }
}

impl Lifecycle {
    pub fn begin_install(&mut self) -> Result<(), Error> {
        match self.state {
            WorkerState::Parsed | WorkerState::Installed => {
                self.state = WorkerState::Installing;
                Ok(())
            }
            other => Err(Error::InvalidState(format!("cannot install from {other:?}"))),
        }
    }

    pub fn finish_install(&mut self) {
        self.state = WorkerState::Installed;
        self.skip_waiting = true;
    }

    pub fn fail_install(&mut self) {
        self.state = WorkerState::Redundant;
    }

    pub fn begin_activate(&mut self) -> Result<(), Error> {
        match self.state {
            WorkerState::Installed => {
                self.state = WorkerState::Activating;
                Ok(())
            }
            other => Err(Error::InvalidState(format!("cannot activate from {other:?}"))),
        }
    }

    pub fn finish_activate(&mut self) {
        self.state = WorkerState::Activated;
        self.controls_clients = true;
    }

    /// Activation failed after cleanup started; stay installed so it can be retried.
    pub fn abort_activate(&mut self) {
        self.state = WorkerState::Installed;
    }
}
