//! Change-notification observers.
//!
//! Observers receive `(previous, next)` after every accepted transition,
//! including the initial one performed by `init`, where `previous` is
//! `None`. Delivery is synchronous and in registration order; there is no
//! buffering and no replay for late subscribers.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;

use crate::core::{State, StateRef, TransitionLog, TransitionRecord};

/// Identifier handed out by [`observe`](crate::machine::StateMachine::observe);
/// pass it to [`unobserve`](crate::machine::StateMachine::unobserve) to
/// remove the observer again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);

/// Receiver for change notifications.
///
/// Notifications run while the machine's re-entrancy flag is held, so a
/// transition requested from inside one is rejected as re-entrant. The
/// observer registry itself must not be modified from inside a
/// notification.
pub trait StateObserver<A> {
    /// Called after `next` has been entered and installed as current.
    fn on_state_change(&mut self, previous: Option<&StateRef<A>>, next: &StateRef<A>);
}

/// Adapter that lets a plain closure act as an observer.
pub(crate) struct FnObserver<F>(pub(crate) F);

impl<A, F> StateObserver<A> for FnObserver<F>
where
    F: FnMut(Option<&StateRef<A>>, &StateRef<A>),
{
    fn on_state_change(&mut self, previous: Option<&StateRef<A>>, next: &StateRef<A>) {
        (self.0)(previous, next);
    }
}

/// A shared [`TransitionLog`] can be registered directly: it records the
/// state names and timestamp of every notification it sees, while the
/// caller keeps its own handle for reading.
impl<A> StateObserver<A> for Rc<RefCell<TransitionLog>> {
    fn on_state_change(&mut self, previous: Option<&StateRef<A>>, next: &StateRef<A>) {
        let record = TransitionRecord {
            from: previous.map(|state| state.borrow().name().to_string()),
            to: next.borrow().name().to_string(),
            timestamp: Utc::now(),
        };
        self.borrow_mut().record(record);
    }
}
