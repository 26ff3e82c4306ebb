//! Session lifecycle coordination.
//!
//! [`SessionController`] owns the connection phase and the transport, and is
//! the only place phase transitions happen. Transport callbacks arrive as
//! queued [`SessionEvent`]s; user requests collapse into one pending slot.
//! Both are applied on the main tick.

mod controller;
mod event;
mod handle;
mod phase;
mod runtime;

pub use controller::{SessionConfig, SessionController, SessionParts};
pub use event::{SessionEvent, TransportEvent, UserRequest};
pub use handle::SessionHandle;
pub use phase::{Phase, PhaseCell};
pub use runtime::run_main_tick;
