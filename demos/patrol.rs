//! Sentry patrol demo.
//!
//! A sentry actor alternates between patrolling waypoints and chasing an
//! intruder, driven by a small scripted frame loop.
//!
//! Run with: cargo run --example patrol

use std::cell::RefCell;
use std::rc::Rc;

use stance::{State, StateMachine, TransitionLog};

struct Sentry {
    waypoint: u32,
    intruder_distance: f32,
}

struct Patrol;

impl State<Sentry> for Patrol {
    fn name(&self) -> &str {
        "patrol"
    }

    fn enter(&mut self, _machine: &StateMachine<Sentry>, actor: &mut Sentry) {
        println!("  [patrol] resuming route at waypoint {}", actor.waypoint);
    }

    fn update(&mut self, machine: &StateMachine<Sentry>, actor: &mut Sentry) {
        actor.waypoint = (actor.waypoint + 1) % 4;
        if actor.intruder_distance < 10.0 {
            machine
                .transition_to(Chase.into_ref())
                .expect("transition requested from update");
        }
    }
}

struct Chase;

impl State<Sentry> for Chase {
    fn name(&self) -> &str {
        "chase"
    }

    fn enter(&mut self, _machine: &StateMachine<Sentry>, actor: &mut Sentry) {
        println!(
            "  [chase] intruder spotted {:.1}m away",
            actor.intruder_distance
        );
    }

    fn update(&mut self, machine: &StateMachine<Sentry>, actor: &mut Sentry) {
        if actor.intruder_distance >= 10.0 {
            machine
                .transition_to(Patrol.into_ref())
                .expect("transition requested from update");
        }
    }

    fn fixed_update(&mut self, _machine: &StateMachine<Sentry>, actor: &mut Sentry) {
        // Close in a little every physics step.
        actor.intruder_distance -= 0.5;
    }
}

fn main() {
    println!("=== Sentry Patrol ===\n");

    let sentry = Rc::new(RefCell::new(Sentry {
        waypoint: 0,
        intruder_distance: 50.0,
    }));
    let machine: StateMachine<Sentry> = StateMachine::new();

    machine.observe_fn(|previous, next| {
        let from = previous.map(|state| state.borrow().name().to_string());
        println!(
            "  -> now {} (was {})",
            next.borrow().name(),
            from.as_deref().unwrap_or("nothing")
        );
    });
    let log = TransitionLog::shared(32);
    machine.observe(Rc::clone(&log));

    machine
        .init(Patrol.into_ref(), Rc::clone(&sentry))
        .expect("machine initialized once");

    // Scripted intruder distance per frame.
    let distances = [50.0, 30.0, 8.0, 6.0, 12.0, 20.0, 40.0, 5.0];
    for (frame, distance) in distances.into_iter().enumerate() {
        sentry.borrow_mut().intruder_distance = distance;
        println!("frame {frame}: intruder at {distance:.0}m");
        machine.fixed_update();
        machine.update();
    }

    machine.teardown();

    println!("\nroute taken: {}", log.borrow().path().join(" -> "));
}
