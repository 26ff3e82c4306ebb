use super::{Phase, PhaseCell, UserRequest};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};

const NO_REQUEST: u8 = 0;

impl UserRequest {
    fn to_u8(self) -> u8 {
        match self {
            UserRequest::Connect => 1,
            UserRequest::Disconnect => 2,
            UserRequest::Toggle => 3,
        }
    }

    fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(UserRequest::Connect),
            2 => Some(UserRequest::Disconnect),
            3 => Some(UserRequest::Toggle),
            _ => None,
        }
    }
}

/// Holds at most one user request; a newer one replaces the older.
#[derive(Debug, Default)]
pub(crate) struct RequestSlot(Arc<AtomicU8>);

impl RequestSlot {
    /// Removes the pending request, if any.
    pub(crate) fn take(&self) -> Option<UserRequest> {
        UserRequest::from_u8(self.0.swap(NO_REQUEST, Ordering::AcqRel))
    }

    fn downgrade(&self) -> Weak<AtomicU8> {
        Arc::downgrade(&self.0)
    }
}

/// Cloneable handle for user-facing contexts.
///
/// Requests are not queued: only the latest one issued before the next
/// main tick is applied there, and whether it does anything is decided
/// from the phase at that moment.
#[derive(Clone)]
pub struct SessionHandle {
    requests: Weak<AtomicU8>,
    phase: PhaseCell,
}

impl SessionHandle {
    pub(crate) fn new(requests: &RequestSlot, phase: PhaseCell) -> Self {
        Self {
            requests: requests.downgrade(),
            phase,
        }
    }

    /// Returns `false` if the controller is gone.
    pub fn connect(&self) -> bool {
        self.send(UserRequest::Connect)
    }

    pub fn disconnect(&self) -> bool {
        self.send(UserRequest::Disconnect)
    }

    /// What the device's single button does.
    pub fn toggle(&self) -> bool {
        self.send(UserRequest::Toggle)
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    fn send(&self, request: UserRequest) -> bool {
        match self.requests.upgrade() {
            Some(slot) => {
                slot.store(request.to_u8(), Ordering::Release);
                true
            }
            None => false,
        }
    }
}
