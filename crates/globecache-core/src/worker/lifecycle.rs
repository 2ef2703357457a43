use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Where a worker generation is in its install/activate lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    Parsed = 0,
    Installing = 1,
    Installed = 2,
    Activating = 3,
    Activated = 4,
    /// Installation failed; the host discards this generation
    Redundant = 5,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => WorkerState::Installing,
            2 => WorkerState::Installed,
            3 => WorkerState::Activating,
            4 => WorkerState::Activated,
            5 => WorkerState::Redundant,
            _ => WorkerState::Parsed,
        }
    }
}

/// Lifecycle state and the signals the worker raises for its host.
#[derive(Debug)]
pub struct Lifecycle {
    state: AtomicU8,
    skip_waiting: AtomicBool,
    clients_claimed: AtomicBool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(WorkerState::Parsed as u8),
            skip_waiting: AtomicBool::new(false),
            clients_claimed: AtomicBool::new(false),
        }
    }
}

impl Lifecycle {
    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Ask the host to activate this generation without waiting for old
    /// clients to close
    pub(crate) fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::Release);
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::Acquire)
    }

    /// Take control of all open client pages
    pub(crate) fn claim_clients(&self) {
        self.clients_claimed.store(true, Ordering::Release);
    }

    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed.load(Ordering::Acquire)
    }
}
