use anyhow::Context;
use serde::Deserialize;
use std::{env, fs, time::Duration};

/// Tuning knobs for the polling, debounce, and hover machinery. All of these
/// were picked empirically; the config file exists so they can be adjusted
/// without a rebuild, not because the exact values matter.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub media: MediaConfig,
    pub debounce: DebounceConfig,
    pub hover: HoverConfig,
    pub position: PositionConfig,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let mut candidates = Vec::new();

        if let Ok(current_dir) = env::current_dir() {
            candidates.push(current_dir.join("config.toml"));
            candidates.push(current_dir.join("config").join("island.toml"));
        }

        if let Ok(exe) = env::current_exe() {
            if let Some(dir) = exe.parent() {
                candidates.push(dir.join("config.toml"));
                candidates.push(dir.join("config").join("island.toml"));
            }
        }

        for path in candidates {
            if path.exists() {
                let data = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                let doc: ConfigDocument = toml::from_str(&data)
                    .with_context(|| format!("Failed to parse config: {}", path.display()))?;
                return Ok(doc.into());
            }
        }

        Ok(Config::default())
    }
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Cadence of the now-playing/volume poll.
    pub poll_interval: Duration,
    /// How long a poll request may stay in flight before it is written off.
    pub poll_timeout: Duration,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            poll_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DebounceConfig {
    /// Minimum spacing between seek commands while dragging.
    pub seek_min_interval: Duration,
    /// Minimum spacing between volume-set commands while dragging.
    pub volume_min_interval: Duration,
    /// Window after the last slider touch during which poll results must not
    /// overwrite the slider's displayed value.
    pub touch_window: Duration,
    /// Cooldown applied per button key by the anti-spam gate.
    pub spam_cooldown: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            seek_min_interval: Duration::from_millis(100),
            volume_min_interval: Duration::from_millis(50),
            touch_window: Duration::from_secs(5),
            spam_cooldown: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HoverConfig {
    /// Delay between the pointer leaving the window and the first close check.
    pub exit_recheck: Duration,
    /// Recheck spacing while the pointer sits inside the buffer zone.
    pub buffer_recheck: Duration,
    /// Dwell buffer around the expanded frame, in points.
    pub buffer_px: f32,
    /// Delay before the control surface is revealed after expansion starts,
    /// so the resize animation visually leads.
    pub reveal_delay: Duration,
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            exit_recheck: Duration::from_millis(100),
            buffer_recheck: Duration::from_millis(500),
            buffer_px: 10.0,
            reveal_delay: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PositionConfig {
    /// How often the window origin is compared against the expected anchor.
    pub check_interval: Duration,
    /// Per-axis tolerance before a correction is forced, in points.
    pub tolerance_px: f32,
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(5),
            tolerance_px: 5.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    media: MediaSection,
    #[serde(default)]
    debounce: DebounceSection,
    #[serde(default)]
    hover: HoverSection,
    #[serde(default)]
    position: PositionSection,
}

impl From<ConfigDocument> for Config {
    fn from(value: ConfigDocument) -> Self {
        let defaults = Config::default();

        let media = MediaConfig {
            poll_interval: secs_or(value.media.poll_interval_secs, defaults.media.poll_interval),
            poll_timeout: secs_or(value.media.poll_timeout_secs, defaults.media.poll_timeout),
        };

        let debounce = DebounceConfig {
            seek_min_interval: secs_or(
                value.debounce.seek_min_interval_secs,
                defaults.debounce.seek_min_interval,
            ),
            volume_min_interval: secs_or(
                value.debounce.volume_min_interval_secs,
                defaults.debounce.volume_min_interval,
            ),
            touch_window: secs_or(
                value.debounce.touch_window_secs,
                defaults.debounce.touch_window,
            ),
            spam_cooldown: secs_or(
                value.debounce.spam_cooldown_secs,
                defaults.debounce.spam_cooldown,
            ),
        };

        let hover = HoverConfig {
            exit_recheck: secs_or(value.hover.exit_recheck_secs, defaults.hover.exit_recheck),
            buffer_recheck: secs_or(
                value.hover.buffer_recheck_secs,
                defaults.hover.buffer_recheck,
            ),
            buffer_px: value.hover.buffer_px.unwrap_or(defaults.hover.buffer_px),
            reveal_delay: secs_or(value.hover.reveal_delay_secs, defaults.hover.reveal_delay),
        };

        let position = PositionConfig {
            check_interval: secs_or(
                value.position.check_interval_secs,
                defaults.position.check_interval,
            ),
            tolerance_px: value
                .position
                .tolerance_px
                .unwrap_or(defaults.position.tolerance_px),
        };

        Config {
            media,
            debounce,
            hover,
            position,
        }
    }
}

fn secs_or(value: Option<f64>, fallback: Duration) -> Duration {
    match value {
        Some(secs) if secs.is_finite() && secs >= 0.0 => Duration::from_secs_f64(secs),
        _ => fallback,
    }
}

#[derive(Debug, Default, Deserialize)]
struct MediaSection {
    poll_interval_secs: Option<f64>,
    poll_timeout_secs: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct DebounceSection {
    seek_min_interval_secs: Option<f64>,
    volume_min_interval_secs: Option<f64>,
    touch_window_secs: Option<f64>,
    spam_cooldown_secs: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct HoverSection {
    exit_recheck_secs: Option<f64>,
    buffer_recheck_secs: Option<f64>,
    buffer_px: Option<f32>,
    reveal_delay_secs: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct PositionSection {
    check_interval_secs: Option<f64>,
    tolerance_px: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let doc: ConfigDocument = toml::from_str("").unwrap();
        let config: Config = doc.into();
        assert_eq!(config.media.poll_interval, Duration::from_secs(1));
        assert_eq!(config.debounce.seek_min_interval, Duration::from_millis(100));
        assert_eq!(config.debounce.volume_min_interval, Duration::from_millis(50));
        assert_eq!(config.hover.buffer_px, 10.0);
        assert_eq!(config.position.tolerance_px, 5.0);
    }

    #[test]
    fn partial_document_overrides_only_named_fields() {
        let doc: ConfigDocument = toml::from_str(
            r#"
[debounce]
seek_min_interval_secs = 0.25

[hover]
buffer_px = 16.0
"#,
        )
        .unwrap();
        let config: Config = doc.into();
        assert_eq!(config.debounce.seek_min_interval, Duration::from_millis(250));
        assert_eq!(config.debounce.volume_min_interval, Duration::from_millis(50));
        assert_eq!(config.hover.buffer_px, 16.0);
        assert_eq!(config.hover.reveal_delay, Duration::from_millis(200));
    }

    #[test]
    fn negative_intervals_fall_back_to_defaults() {
        let doc: ConfigDocument = toml::from_str(
            r#"
[media]
poll_interval_secs = -3.0
"#,
        )
        .unwrap();
        let config: Config = doc.into();
        assert_eq!(config.media.poll_interval, Duration::from_secs(1));
    }
}
