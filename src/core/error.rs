//! Contract-violation errors raised by the state machine.

use thiserror::Error;

/// Errors raised when the machine's usage contract is violated.
///
/// Every variant indicates a bug in the driving code, not a recoverable
/// runtime condition. The machine remains usable after raising any of
/// them; in particular the re-entrancy flag is always released.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum MachineError {
    /// `init` was called on a machine that already has a bound actor.
    #[error("state machine is already initialized")]
    AlreadyInitialized,

    /// A transition was requested before `init` bound an actor.
    #[error("state machine is not initialized")]
    NotInitialized,

    /// A transition was requested while another transition was still in
    /// progress on the same machine, e.g. from inside `enter`, `exit`, or
    /// an observer notification.
    #[error("re-entrant transition: a transition is already in progress")]
    ReentrantTransition,
}
