//! Traffic Light
//!
//! A flat machine cycling Red -> Green -> Yellow -> Red, with a guarded
//! emergency stop and a null transition that counts ticks.
//!
//! Key concepts:
//! - Building a machine with `MachineBuilder`
//! - Guards and actions on transitions
//! - Logging through `TracingSink`
//!
//! Run with: cargo run --example traffic_light

use hfsm::builder::{MachineBuilder, TransitionSpec};
use hfsm::core::{Event, State};
use hfsm::log::TracingSink;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Sensor {
    pedestrians: u32,
}

fn lamp(name: &'static str) -> State<Sensor> {
    let mut state = State::new(name);
    state.on_entry(move |_: &Sensor| {
        println!("  lamp: {name} on");
        Ok(())
    });
    state
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    println!("=== Traffic Light Example ===\n");

    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ticks);

    let mut light = MachineBuilder::new("traffic-light")
        .log_sink(Arc::new(TracingSink))
        .initial(lamp("Red"))
        .state(lamp("Green"))
        .state(lamp("Yellow"))
        .events(["next", "tick", "emergency"])
        .transition(
            TransitionSpec::normal("Red", "Green", "next")
                .when(|s: &Sensor| s.pedestrians == 0),
        )
        .transition(TransitionSpec::normal("Green", "Yellow", "next"))
        .transition(TransitionSpec::normal("Yellow", "Red", "next"))
        .transition(TransitionSpec::null("Red", "tick").action(move |_: &Sensor| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))
        .transition(TransitionSpec::normal("Green", "NormalExitState", "emergency"))
        .on_exit(|state, _| {
            println!("  light shut down via {}", state.name());
            Ok(())
        })
        .build()?;

    let next = Event::new("next");
    let tick = Event::new("tick");

    light.start(&Sensor { pedestrians: 0 })?;
    light.trigger_event(&tick, &Sensor { pedestrians: 2 }, false)?;

    let outcome = light.trigger_event(&next, &Sensor { pedestrians: 2 }, false)?;
    println!("Pedestrians waiting: {outcome:?}");

    light.trigger_event(&next, &Sensor { pedestrians: 0 }, false)?;
    light.trigger_event(&Event::new("emergency"), &Sensor { pedestrians: 0 }, false)?;

    println!("\nTicks counted on red: {}", ticks.load(Ordering::SeqCst));
    println!("Still running: {}", light.is_running());

    println!("\n=== Example Complete ===");
    Ok(())
}
