//! Property-based tests for the transition engine.
//!
//! These drive arbitrary transition-request sequences over a pool of
//! instrumented states and verify the enter/exit bookkeeping, the
//! notification count, and teardown balancing across many inputs.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use stance::{State, StateMachine, StateRef};

struct World;

struct Probe {
    label: String,
    enters: usize,
    exits: usize,
}

impl Probe {
    fn new(index: usize) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            label: format!("state-{index}"),
            enters: 0,
            exits: 0,
        }))
    }
}

impl State<World> for Probe {
    fn name(&self) -> &str {
        &self.label
    }

    fn enter(&mut self, _machine: &StateMachine<World>, _actor: &mut World) {
        self.enters += 1;
    }

    fn exit(&mut self, _machine: &StateMachine<World>, _actor: &mut World) {
        self.exits += 1;
    }
}

fn pool(size: usize) -> Vec<Rc<RefCell<Probe>>> {
    (0..size).map(Probe::new).collect()
}

fn handle(probe: &Rc<RefCell<Probe>>) -> StateRef<World> {
    let concrete: Rc<RefCell<Probe>> = Rc::clone(probe);
    let handle: StateRef<World> = concrete;
    handle
}

fn counting_machine(states: &[Rc<RefCell<Probe>>]) -> (StateMachine<World>, Rc<RefCell<usize>>) {
    let machine = StateMachine::new();
    let notifications = Rc::new(RefCell::new(0usize));
    let sink = Rc::clone(&notifications);
    machine.observe_fn(move |_, _| *sink.borrow_mut() += 1);
    machine
        .init(handle(&states[0]), Rc::new(RefCell::new(World)))
        .unwrap();
    (machine, notifications)
}

proptest! {
    #[test]
    fn bookkeeping_invariants_hold(requests in prop::collection::vec(0..4usize, 0..32)) {
        let states = pool(4);
        let (machine, notifications) = counting_machine(&states);

        // One accepted transition so far: init's entry into state-0.
        let mut accepted = 1usize;
        let mut current = 0usize;
        for &target in &requests {
            machine.transition_to(handle(&states[target])).unwrap();
            if target != current {
                accepted += 1;
                current = target;
            }
        }

        prop_assert_eq!(*notifications.borrow(), accepted);
        let current_handle = machine.current_state().unwrap();
        let current_ref = current_handle.borrow();
        let expected_ref = states[current].borrow();
        prop_assert_eq!(current_ref.name(), expected_ref.name());
        drop(current_ref);
        drop(expected_ref);
        for (index, state) in states.iter().enumerate() {
            let state = state.borrow();
            prop_assert!(state.exits <= state.enters);
            let live = state.enters - state.exits;
            prop_assert_eq!(live, usize::from(index == current));
        }
    }

    #[test]
    fn repeated_self_requests_change_nothing(repeats in 1..16usize) {
        let states = pool(2);
        let (machine, notifications) = counting_machine(&states);

        machine.transition_to(handle(&states[1])).unwrap();
        for _ in 0..repeats {
            machine.transition_to(handle(&states[1])).unwrap();
        }

        prop_assert_eq!(*notifications.borrow(), 2);
        prop_assert_eq!(states[1].borrow().enters, 1);
        prop_assert_eq!(states[1].borrow().exits, 0);
    }

    #[test]
    fn teardown_balances_every_enter_with_an_exit(
        requests in prop::collection::vec(0..3usize, 0..24)
    ) {
        let states = pool(3);
        let (machine, _notifications) = counting_machine(&states);

        for &target in &requests {
            machine.transition_to(handle(&states[target])).unwrap();
        }
        machine.teardown();

        prop_assert!(machine.current_state().is_none());
        for state in &states {
            let state = state.borrow();
            prop_assert_eq!(state.enters, state.exits);
        }
    }

    #[test]
    fn ticks_never_disturb_bookkeeping(
        requests in prop::collection::vec(0..3usize, 0..12),
        ticks in 0..8usize
    ) {
        let states = pool(3);
        let (machine, _notifications) = counting_machine(&states);

        for &target in &requests {
            machine.transition_to(handle(&states[target])).unwrap();
            for _ in 0..ticks {
                machine.update();
                machine.fixed_update();
            }
        }

        for state in &states {
            let state = state.borrow();
            prop_assert!(state.exits <= state.enters);
            prop_assert!(state.enters - state.exits <= 1);
        }
    }
}
