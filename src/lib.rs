//! Stance: a lifecycle-driven state machine for actors in game and
//! simulation loops.
//!
//! A [`StateMachine`] drives one actor through mutually exclusive behavior
//! modes. Each mode is a [`State`] with `enter`/`update`/`fixed_update`/
//! `exit` callbacks; the machine keeps exactly one state current, runs
//! exit-then-enter in a deterministic order, rejects re-entrant
//! transitions, and notifies observers after every accepted transition.
//!
//! Machines are single-threaded by construction (`Rc`/`RefCell` inside),
//! matching the frame-loop drivers they are built for: call
//! [`update`](StateMachine::update) once per variable tick and
//! [`fixed_update`](StateMachine::fixed_update) once per fixed tick, all
//! from one thread.
//!
//! # Core Concepts
//!
//! - **State**: a unit of behavior, active for a contiguous span of time
//! - **Transition**: the atomic exit-swap-enter step between states
//! - **Observer**: a callback notified after each accepted transition
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use stance::{State, StateMachine};
//!
//! struct Player {
//!     speed: f32,
//! }
//!
//! struct Idle;
//!
//! impl State<Player> for Idle {
//!     fn name(&self) -> &str {
//!         "idle"
//!     }
//!
//!     fn update(&mut self, machine: &StateMachine<Player>, actor: &mut Player) {
//!         if actor.speed > 0.0 {
//!             machine.transition_to(Running.into_ref()).unwrap();
//!         }
//!     }
//! }
//!
//! struct Running;
//!
//! impl State<Player> for Running {
//!     fn name(&self) -> &str {
//!         "running"
//!     }
//! }
//!
//! let machine = StateMachine::new();
//! let player = Rc::new(RefCell::new(Player { speed: 0.0 }));
//! machine.init(Idle.into_ref(), Rc::clone(&player)).unwrap();
//!
//! player.borrow_mut().speed = 4.0;
//! machine.update();
//! assert_eq!(machine.current_state().unwrap().borrow().name(), "running");
//!
//! machine.teardown();
//! assert!(machine.current_state().is_none());
//! ```

pub mod core;
pub mod machine;

// Re-export commonly used types
pub use crate::core::{MachineError, State, StateRef, TransitionLog, TransitionRecord};
pub use crate::machine::{ObserverId, StateMachine, StateObserver};
