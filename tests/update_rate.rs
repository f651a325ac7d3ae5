use std::time::{Duration, Instant};

// Sanity check on the command-sampling rule the sliders rely on: an event
// stream far denser than the minimum interval must collapse to roughly
// one command per interval, never more.
#[test]
fn dense_event_stream_is_bounded_by_min_interval() {
    let min_interval = Duration::from_millis(100);
    let start = Instant::now();

    let mut last_command: Option<Instant> = None;
    let mut commands = 0;

    // 10ms event spacing over one simulated second.
    for tick in 0..100u64 {
        let now = start + Duration::from_millis(tick * 10);
        let due = match last_command {
            Some(last) => now.duration_since(last) > min_interval,
            None => true,
        };
        if due {
            last_command = Some(now);
            commands += 1;
        }
    }

    assert!(commands <= 10, "fired {commands} commands in one second");
    assert!(commands >= 9);
}
