//! Core vocabulary: the state contract, contract-violation errors, and
//! transition records.
//!
//! Everything here is independent of the transition engine itself; the
//! engine in [`crate::machine`] builds on these types.

mod error;
mod record;
mod state;

pub use error::MachineError;
pub use record::{TransitionLog, TransitionRecord, DEFAULT_LOG_CAPACITY};
pub use state::{State, StateRef};
