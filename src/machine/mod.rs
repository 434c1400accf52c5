//! The transition engine.
//!
//! A [`StateMachine`] owns the current behavior state of one actor and
//! performs re-entrancy-guarded transitions between states: the previous
//! state's `exit`, the swap, the next state's `enter`, and the observer
//! notification form one indivisible step relative to any nested
//! transition attempt.
//!
//! All methods take `&self`; the machine uses interior mutability so that
//! states can call back into it from inside the callbacks it invokes. The
//! same choice makes a machine `!Send + !Sync`: one logical thread of
//! control (a frame loop) drives it, and the type system holds drivers to
//! that.

use std::cell::{Cell, OnceCell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::core::{MachineError, State, StateRef};

mod observe;

pub use observe::{ObserverId, StateObserver};

/// Drives one actor through mutually exclusive behavior states.
///
/// A machine starts empty. [`init`](StateMachine::init) binds the actor
/// and enters the start state; after that, states request transitions via
/// [`transition_to`](StateMachine::transition_to) from inside their
/// `update`/`fixed_update` callbacks while the driver ticks the machine.
/// [`teardown`](StateMachine::teardown) exits the final state at end of
/// life.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use stance::{State, StateMachine};
///
/// struct Door {
///     open: bool,
/// }
///
/// struct Closed;
///
/// impl State<Door> for Closed {
///     fn name(&self) -> &str {
///         "closed"
///     }
/// }
///
/// let machine = StateMachine::new();
/// let door = Rc::new(RefCell::new(Door { open: false }));
/// machine.init(Closed.into_ref(), Rc::clone(&door)).unwrap();
/// assert_eq!(machine.current_state().unwrap().borrow().name(), "closed");
///
/// machine.teardown();
/// assert!(machine.current_state().is_none());
/// ```
pub struct StateMachine<A> {
    /// Bound actor; set exactly once by `init` and never cleared, which is
    /// also what makes re-initialization detectable after teardown.
    actor: OnceCell<Rc<RefCell<A>>>,
    current: RefCell<Option<StateRef<A>>>,
    /// Held for the dynamic extent of one transition (exit, swap, enter,
    /// notify) and during the teardown exit.
    transitioning: Cell<bool>,
    /// Held while a tick callback is running on the current state.
    dispatching: Cell<bool>,
    /// Transitions requested during dispatch, applied in order when the
    /// callback returns.
    pending: RefCell<VecDeque<StateRef<A>>>,
    observers: RefCell<Vec<(ObserverId, Box<dyn StateObserver<A>>)>>,
    next_observer: Cell<u64>,
}

impl<A> StateMachine<A> {
    /// Create an empty, uninitialized machine.
    pub fn new() -> Self {
        Self {
            actor: OnceCell::new(),
            current: RefCell::new(None),
            transitioning: Cell::new(false),
            dispatching: Cell::new(false),
            pending: RefCell::new(VecDeque::new()),
            observers: RefCell::new(Vec::new()),
            next_observer: Cell::new(0),
        }
    }

    /// Bind the actor and enter the start state.
    ///
    /// The start state's `enter` runs with no preceding `exit` (there is
    /// nothing to leave), then observers are notified with a previous
    /// state of `None`.
    ///
    /// # Errors
    ///
    /// [`MachineError::AlreadyInitialized`] if the machine was initialized
    /// before; initialization is single-shot and the rejected call leaves
    /// the machine untouched.
    pub fn init(&self, start: StateRef<A>, actor: Rc<RefCell<A>>) -> Result<(), MachineError> {
        if self.actor.set(Rc::clone(&actor)).is_err() {
            return Err(MachineError::AlreadyInitialized);
        }
        tracing::debug!("state machine initialized");
        self.apply(start, &actor);
        Ok(())
    }

    /// Request a transition to `next`.
    ///
    /// Transitioning to the state that is already current is a no-op: no
    /// callbacks run and no notification fires. Otherwise the previous
    /// state's `exit`, the swap, `next`'s `enter`, and the observer
    /// notification happen as one step under the re-entrancy flag.
    ///
    /// When called from inside an `update`/`fixed_update` callback the
    /// request is validated here and applied, in request order, before the
    /// machine's tick method returns to the driver.
    ///
    /// # Errors
    ///
    /// - [`MachineError::NotInitialized`] before [`init`](StateMachine::init)
    ///   has bound an actor.
    /// - [`MachineError::ReentrantTransition`] while another transition is
    ///   in progress, i.e. from inside `enter`, `exit`, or an observer
    ///   notification. The flag is released on every path, so a rejected
    ///   call never wedges the machine.
    pub fn transition_to(&self, next: StateRef<A>) -> Result<(), MachineError> {
        let actor = match self.actor.get() {
            Some(actor) => Rc::clone(actor),
            None => return Err(MachineError::NotInitialized),
        };
        if self.transitioning.get() {
            return Err(MachineError::ReentrantTransition);
        }
        if self.is_current(&next) {
            return Ok(());
        }
        if self.dispatching.get() {
            self.pending.borrow_mut().push_back(next);
            return Ok(());
        }
        self.apply(next, &actor);
        Ok(())
    }

    /// Forward a variable-timestep tick to the current state.
    ///
    /// A no-op when no state is current (before `init`, after
    /// `teardown`) and while an enter/exit or another dispatch is running.
    /// Never returns an error; panics from state code propagate.
    pub fn update(&self) {
        self.dispatch(TickKind::Update);
    }

    /// Forward a fixed-timestep tick to the current state.
    ///
    /// Same rules as [`update`](StateMachine::update).
    pub fn fixed_update(&self) {
        self.dispatch(TickKind::Fixed);
    }

    /// Exit the current state and leave the machine empty.
    ///
    /// The exit runs under the re-entrancy flag, so transition requests
    /// from inside it are rejected. Idempotent: calling on an empty
    /// machine does nothing, and the call is a no-op while a transition or
    /// dispatch is still running. The actor binding is kept, so a later
    /// `init` is still rejected.
    pub fn teardown(&self) {
        if self.transitioning.get() || self.dispatching.get() {
            return;
        }
        let Some(state) = self.current.borrow_mut().take() else {
            return;
        };
        if let Some(actor) = self.actor.get() {
            let _transition = RaisedFlag::raise(&self.transitioning);
            tracing::debug!(state = state.borrow().name(), "state machine torn down");
            state.borrow_mut().exit(self, &mut actor.borrow_mut());
        }
    }

    /// Handle to the current state, if any.
    pub fn current_state(&self) -> Option<StateRef<A>> {
        self.current.borrow().clone()
    }

    /// Whether `init` has bound an actor. Stays `true` after teardown.
    pub fn is_initialized(&self) -> bool {
        self.actor.get().is_some()
    }

    /// Handle to the bound actor, if any.
    pub fn actor(&self) -> Option<Rc<RefCell<A>>> {
        self.actor.get().cloned()
    }

    /// Register an observer; it will see every later accepted transition.
    ///
    /// Observers run synchronously, in registration order. There is no
    /// replay: transitions that happened before registration are not
    /// delivered.
    pub fn observe(&self, observer: impl StateObserver<A> + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer.get());
        self.next_observer.set(id.0 + 1);
        self.observers.borrow_mut().push((id, Box::new(observer)));
        id
    }

    /// Register a closure as an observer.
    pub fn observe_fn<F>(&self, callback: F) -> ObserverId
    where
        F: FnMut(Option<&StateRef<A>>, &StateRef<A>) + 'static,
    {
        self.observe(observe::FnObserver(callback))
    }

    /// Remove a previously registered observer. Returns whether it was
    /// still registered.
    pub fn unobserve(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    fn is_current(&self, state: &StateRef<A>) -> bool {
        match self.current.borrow().as_ref() {
            Some(current) => Rc::ptr_eq(current, state),
            None => false,
        }
    }

    /// Perform one transition: exit previous, swap, enter next, notify.
    ///
    /// Re-checks handle identity so that queued duplicates of the same
    /// request net a single transition.
    fn apply(&self, next: StateRef<A>, actor: &Rc<RefCell<A>>) {
        if self.is_current(&next) {
            return;
        }
        let _transition = RaisedFlag::raise(&self.transitioning);
        let previous = self.current.borrow_mut().take();
        let from_name = previous
            .as_ref()
            .map(|state| state.borrow().name().to_string());
        if let Some(previous) = &previous {
            previous.borrow_mut().exit(self, &mut actor.borrow_mut());
        }
        *self.current.borrow_mut() = Some(Rc::clone(&next));
        next.borrow_mut().enter(self, &mut actor.borrow_mut());
        tracing::debug!(
            from = from_name.as_deref().unwrap_or("none"),
            to = next.borrow().name(),
            "state transition"
        );
        self.notify(previous.as_ref(), &next);
    }

    fn dispatch(&self, tick: TickKind) {
        if self.transitioning.get() || self.dispatching.get() {
            return;
        }
        let Some(state) = self.current_state() else {
            return;
        };
        let Some(actor) = self.actor.get().cloned() else {
            return;
        };
        {
            let _dispatch = RaisedFlag::raise(&self.dispatching);
            let mut actor_mut = actor.borrow_mut();
            let mut state_mut = state.borrow_mut();
            tracing::trace!(state = state_mut.name(), "forwarding tick");
            match tick {
                TickKind::Update => state_mut.update(self, &mut actor_mut),
                TickKind::Fixed => state_mut.fixed_update(self, &mut actor_mut),
            }
        }
        self.drain(&actor);
    }

    /// Apply transitions requested during the dispatch, in request order.
    fn drain(&self, actor: &Rc<RefCell<A>>) {
        loop {
            let next = self.pending.borrow_mut().pop_front();
            match next {
                Some(next) => self.apply(next, actor),
                None => break,
            }
        }
    }

    fn notify(&self, previous: Option<&StateRef<A>>, next: &StateRef<A>) {
        let mut observers = self.observers.borrow_mut();
        for (_, observer) in observers.iter_mut() {
            observer.on_state_change(previous, next);
        }
    }
}

impl<A> Default for StateMachine<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for StateMachine<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = match self.current.try_borrow() {
            Ok(current) => match current.as_ref() {
                Some(state) => match state.try_borrow() {
                    Ok(state) => state.name().to_string(),
                    Err(_) => "<in callback>".to_string(),
                },
                None => "<none>".to_string(),
            },
            Err(_) => "<mid-transition>".to_string(),
        };
        f.debug_struct("StateMachine")
            .field("initialized", &self.is_initialized())
            .field("current", &current)
            .field("transitioning", &self.transitioning.get())
            .field(
                "observers",
                &self.observers.try_borrow().map_or(0, |observers| observers.len()),
            )
            .finish()
    }
}

enum TickKind {
    Update,
    Fixed,
}

/// Holds a `Cell<bool>` flag raised for one lexical scope; dropping
/// releases it, on normal return and on unwind alike.
struct RaisedFlag<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> RaisedFlag<'a> {
    fn raise(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for RaisedFlag<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}
