use crate::config::DebounceConfig;
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

/// Per-key cooldown tracker for click-style actions. A key that fired within
/// the cooldown window is suppressed; everything else records a timestamp and
/// passes. Play/pause deliberately bypasses this gate so the toggle never
/// feels stuck.
pub struct AntiSpamGate {
    cooldown: Duration,
    last_fire: HashMap<String, Instant>,
}

impl AntiSpamGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_fire: HashMap::new(),
        }
    }

    pub fn attempt(&mut self, key: &str) -> bool {
        self.attempt_at(key, Instant::now())
    }

    pub fn attempt_at(&mut self, key: &str, now: Instant) -> bool {
        if let Some(last) = self.last_fire.get(key) {
            if now.duration_since(*last) < self.cooldown {
                return false;
            }
        }
        self.last_fire.insert(key.to_owned(), now);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliderKind {
    Seek,
    Volume,
}

#[derive(Debug, Default)]
struct SliderChannel {
    last_touch: Option<Instant>,
    last_command: Option<Instant>,
    pending: Option<f64>,
}

/// Rate-limits continuous slider streams into bounded-rate commands.
///
/// Every event records a touch and overwrites the pending value; a command is
/// released only when the per-kind minimum interval has elapsed since the
/// previous one. Events that land inside the window are sampled away, not
/// queued: the next event past the window carries whatever value the slider
/// has by then. The much longer touch window is what the poll loop consults
/// before overwriting a slider the user is still dragging.
pub struct SliderDebouncer {
    seek_min_interval: Duration,
    volume_min_interval: Duration,
    touch_window: Duration,
    seek: SliderChannel,
    volume: SliderChannel,
}

impl SliderDebouncer {
    pub fn new(config: &DebounceConfig) -> Self {
        Self {
            seek_min_interval: config.seek_min_interval,
            volume_min_interval: config.volume_min_interval,
            touch_window: config.touch_window,
            seek: SliderChannel::default(),
            volume: SliderChannel::default(),
        }
    }

    pub fn on_changed(&mut self, kind: SliderKind, value: f64) -> Option<f64> {
        self.on_changed_at(kind, value, Instant::now())
    }

    /// Returns the value to dispatch, or `None` when the event falls inside
    /// the command-rate window.
    pub fn on_changed_at(&mut self, kind: SliderKind, value: f64, now: Instant) -> Option<f64> {
        let min_interval = self.min_interval(kind);
        let channel = self.channel_mut(kind);

        channel.last_touch = Some(now);
        channel.pending = Some(value.clamp(0.0, 100.0));

        let due = match channel.last_command {
            Some(last) => now.duration_since(last) > min_interval,
            None => true,
        };

        if due {
            channel.last_command = Some(now);
            channel.pending.take()
        } else {
            None
        }
    }

    pub fn recently_touched(&self, kind: SliderKind) -> bool {
        self.recently_touched_at(kind, Instant::now())
    }

    pub fn recently_touched_at(&self, kind: SliderKind, now: Instant) -> bool {
        match self.channel(kind).last_touch {
            Some(touch) => now.duration_since(touch) <= self.touch_window,
            None => false,
        }
    }

    fn min_interval(&self, kind: SliderKind) -> Duration {
        match kind {
            SliderKind::Seek => self.seek_min_interval,
            SliderKind::Volume => self.volume_min_interval,
        }
    }

    fn channel(&self, kind: SliderKind) -> &SliderChannel {
        match kind {
            SliderKind::Seek => &self.seek,
            SliderKind::Volume => &self.volume,
        }
    }

    fn channel_mut(&mut self, kind: SliderKind) -> &mut SliderChannel {
        match kind {
            SliderKind::Seek => &mut self.seek,
            SliderKind::Volume => &mut self.volume,
        }
    }
}
