mod common;

use std::thread;

use chrono::Duration;
use replay_sim::replay::{ReplaySimulator, SharedStep};

#[test]
fn readers_on_other_threads_only_see_complete_prefixes() {
    let series = common::hourly_series("USDJPY", 2_000);
    let expected = series.bars().to_vec();
    let sim = ReplaySimulator::new(series, common::t0()).unwrap();
    let (mut writer, reader) = sim.into_shared();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let reader = reader.clone();
            let expected = expected.clone();
            thread::spawn(move || {
                let mut last = 0;
                loop {
                    let window = reader.recent_past(usize::MAX);
                    assert!(window.len() >= last, "past shrank");
                    assert_eq!(&*window, &expected[..window.len()]);
                    last = window.len();
                    if reader.future_len() == 0 {
                        break;
                    }
                    thread::yield_now();
                }
                last
            })
        })
        .collect();

    let mut moved = 0;
    while let SharedStep::Advanced(_) = writer.advance() {
        moved += 1;
    }
    assert_eq!(moved, 1_999);

    for handle in readers {
        assert_eq!(handle.join().unwrap(), 2_000);
    }
}

#[test]
fn window_taken_before_advance_is_stable() {
    let sim = ReplaySimulator::new(
        common::hourly_series("AUDUSD", 10),
        common::t0() + Duration::hours(4),
    )
    .unwrap();
    let (mut writer, reader) = sim.into_shared();
    let window = reader.recent_past(3);
    let closes: Vec<f64> = window.iter().map(|b| b.close).collect();

    for _ in 0..3 {
        let _ = writer.advance();
    }
    assert_eq!(window.iter().map(|b| b.close).collect::<Vec<_>>(), closes);
    assert_eq!(reader.recent_past(3).last().unwrap().close, 8.0);
}
