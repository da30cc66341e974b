//! Property tests for the timer engine.

use chrono::Utc;
use focustrack_core::{Phase, TimerEngine, TimerSettings};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Start,
    Tick(u8),
    Pause,
    Background,
    Foreground,
    RequestStop,
    Answer(Option<usize>),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Start),
        (1u8..30).prop_map(Op::Tick),
        Just(Op::Pause),
        Just(Op::Background),
        Just(Op::Foreground),
        Just(Op::RequestStop),
        proptest::option::of(0usize..3).prop_map(Op::Answer),
    ]
}

fn settings() -> TimerSettings {
    TimerSettings {
        work_minutes: 2,
        ..TimerSettings::default()
    }
}

fn apply(engine: &mut TimerEngine, op: &Op) {
    match op {
        Op::Start => {
            engine.start();
        }
        Op::Tick(n) => {
            for _ in 0..*n {
                engine.tick();
            }
        }
        Op::Pause => {
            engine.pause();
        }
        Op::Background => {
            engine.background();
        }
        Op::Foreground => {
            engine.foreground();
        }
        Op::RequestStop => {
            engine.request_stop();
        }
        Op::Answer(choice) => {
            if let Some((token, _)) = engine.pending_decision() {
                engine.resolve(token, *choice, &settings());
            }
        }
    }
}

proptest! {
    #[test]
    fn countdown_never_increases_within_an_interval(ops in proptest::collection::vec(op(), 0..80)) {
        let mut engine = TimerEngine::new(&settings());
        let total = engine.state().total_secs;
        let mut last_remaining = engine.state().remaining_secs;
        let mut last_interruptions = 0;

        for op in &ops {
            apply(&mut engine, op);
            let state = engine.state();
            prop_assert_eq!(state.total_secs, total);
            prop_assert!(state.remaining_secs <= last_remaining);
            prop_assert!(state.interruption_count >= last_interruptions);
            prop_assert_eq!(state.remaining_secs == 0, state.phase == Phase::Completed);
            last_remaining = state.remaining_secs;
            last_interruptions = state.interruption_count;
        }
    }

    #[test]
    fn completion_is_closed_exactly_once(extra_ticks in 0u64..200) {
        let settings = TimerSettings { work_minutes: 1, ..TimerSettings::default() };
        let mut engine = TimerEngine::new(&settings);
        engine.start();
        for _ in 0..(60 + extra_ticks) {
            engine.tick();
        }
        prop_assert!(engine.complete_interval(&settings, None, Utc::now()).is_some());
        prop_assert!(engine.complete_interval(&settings, None, Utc::now()).is_none());
        prop_assert_eq!(engine.state().completed_work_intervals, 1);
    }

    #[test]
    fn recorded_minutes_are_whole_elapsed_minutes(elapsed in 0u64..1500) {
        let settings = TimerSettings::default();
        let mut engine = TimerEngine::new(&settings);
        engine.start();
        for _ in 0..elapsed {
            engine.tick();
        }
        let stopped = engine.stop_and_save(&settings, None, Utc::now()).unwrap();
        let minutes = elapsed / 60;
        match stopped.record {
            Some(record) => {
                prop_assert!(minutes >= 1);
                prop_assert_eq!(u64::from(record.duration_minutes), minutes);
                prop_assert!(!record.completed);
            }
            None => prop_assert_eq!(minutes, 0),
        }
        prop_assert_eq!(engine.phase(), Phase::Idle);
    }
}
