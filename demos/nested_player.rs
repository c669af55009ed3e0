//! Nested Media Player
//!
//! A player whose `Playing` state owns a child machine for track
//! navigation. Events are propagated into the child while playing.
//!
//! Key concepts:
//! - States owning child machines
//! - Entry/exit cascading into nested machines
//! - Propagation versus handling in the parent
//!
//! Run with: cargo run --example nested_player

use hfsm::core::{Event, State, StateId};
use hfsm::log::{Level, SharedSink};
use hfsm::machine::StateMachine;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Nested Player Example ===\n");

    let sink: SharedSink = Arc::new(|level: Level, message: &str| {
        println!("  [{level}] {message}");
    });

    let skip = Event::new("skip");
    let mut tracks: StateMachine<()> = StateMachine::new("tracks");
    tracks.set_log_sink(Arc::clone(&sink));
    let first = tracks.add_state(State::new("Track1"), true)?;
    let second = tracks.add_state(State::new("Track2"), false)?;
    tracks.add_event(skip.clone());
    tracks.add_transition(&first, &second, &skip);
    tracks.add_transition(&second, &first, &skip);

    let play = Event::new("play");
    let pause = Event::new("pause");
    let mut player: StateMachine<()> = StateMachine::new("player");
    player.set_log_sink(sink);
    let paused = player.add_state(State::new("Paused"), true)?;
    let playing = player.add_state(State::with_child("Playing", tracks), false)?;
    for event in [&play, &pause, &skip] {
        player.add_event(event.clone());
    }
    player.add_transition(&paused, &playing, &play);
    player.add_transition(&playing, &paused, &pause);

    player.start(&())?;
    player.trigger_event(&play, &(), false)?;
    player.trigger_event(&skip, &(), true)?;
    player.trigger_event(&skip, &(), false)?;
    player.trigger_event(&pause, &(), false)?;

    let tracks = player
        .state(&StateId::from("Playing"))
        .and_then(State::child_sm)
        .map(|m| m.current_state().map(|s| s.name().to_string()));
    println!("\nPlayer state: {:?}", player.current_state().map(State::name));
    println!("Track machine after pause: {tracks:?}");

    println!("\n=== Example Complete ===");
    Ok(())
}
