use std::{
    process::Command,
    sync::mpsc::{self, Receiver, Sender},
    thread,
};

use anyhow::Context;
use tracing::{debug, warn};

// Artist names longer than this overflow the panel; truncated, not scrolled.
const ARTIST_MAX_CHARS: usize = 15;

/// Title shown when no source reports an active track.
pub const IDLE_TITLE: &str = "Locked In";

/// Point-in-time summary of the active track. Rebuilt wholesale on every
/// poll from exactly one source; fields are never merged across sources.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub title: String,
    pub artist: String,
    pub elapsed_secs: f64,
    pub duration_secs: f64,
    pub playing: bool,
    pub artwork_url: Option<String>,
}

impl Snapshot {
    pub fn idle() -> Self {
        Self {
            title: IDLE_TITLE.to_string(),
            artist: String::new(),
            elapsed_secs: 0.0,
            duration_secs: 0.0,
            playing: false,
            artwork_url: None,
        }
    }

    pub fn progress_percent(&self) -> f64 {
        if self.duration_secs > 0.0 {
            (self.elapsed_secs / self.duration_secs * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    /// Same-track comparison for display purposes; position moves every
    /// second and must not count as a track change.
    pub fn same_track(&self, other: &Snapshot) -> bool {
        self.title == other.title && self.artist == other.artist
    }
}

/// One result of a poll cycle, shipped from the media worker to the UI.
#[derive(Debug, Clone)]
pub struct PollOutcome {
    pub snapshot: Snapshot,
    pub system_volume: Option<u8>,
}

/// A queryable now-playing provider. Sources are consulted in priority
/// order; the first one reporting a track wins the whole snapshot.
pub trait NowPlayingSource: Send {
    fn name(&self) -> &'static str;

    /// `Ok(None)` means "nothing playing here"; errors are downgraded to the
    /// same by the reconciler.
    fn query(&self) -> anyhow::Result<Option<Snapshot>>;

    /// Artwork location for the current track, asked only when the winning
    /// snapshot carried none of its own.
    fn artwork_url(&self) -> Option<String> {
        None
    }
}

/// Merges the prioritized sources into a single display snapshot.
pub struct Reconciler {
    sources: Vec<Box<dyn NowPlayingSource>>,
}

impl Reconciler {
    pub fn new(sources: Vec<Box<dyn NowPlayingSource>>) -> Self {
        Self { sources }
    }

    pub fn with_default_sources() -> Self {
        Self::new(vec![
            Box::new(MediaRemoteSource),
            Box::new(SpotifyScriptSource),
        ])
    }

    /// One poll cycle: system volume plus the reconciled snapshot. Never
    /// panics; every failure degrades to "no data".
    pub fn poll(&self) -> PollOutcome {
        PollOutcome {
            snapshot: self.reconcile(),
            system_volume: query_system_volume(),
        }
    }

    fn reconcile(&self) -> Snapshot {
        let mut winner: Option<Snapshot> = None;
        for source in &self.sources {
            match source.query() {
                Ok(Some(snapshot)) if !snapshot.title.is_empty() => {
                    winner = Some(snapshot);
                    break;
                }
                Ok(_) => {}
                Err(err) => {
                    debug!(source = source.name(), error = %format!("{err:#}"), "now-playing query failed");
                }
            }
        }

        let Some(mut snapshot) = winner else {
            return Snapshot::idle();
        };

        if snapshot.artwork_url.is_none() {
            for source in &self.sources {
                if let Some(url) = source.artwork_url() {
                    snapshot.artwork_url = Some(url);
                    break;
                }
            }
        }

        snapshot
    }
}

/// Commands handled by the media worker thread. Polls and transport both run
/// here so a slow script never stalls a frame.
pub enum MediaCommand {
    Poll,
    PlayPause,
    NextTrack,
    PreviousTrack,
    /// Absolute position in seconds.
    SeekTo(f64),
    /// System output volume, 0-100.
    SetVolume(u8),
    Shutdown,
}

/// Spawn the media worker. Commands go in, poll outcomes come back; the
/// thread exits when the command channel closes or `Shutdown` arrives.
pub fn spawn_worker() -> (Sender<MediaCommand>, Receiver<PollOutcome>) {
    let (cmd_tx, cmd_rx) = mpsc::channel::<MediaCommand>();
    let (out_tx, out_rx) = mpsc::channel::<PollOutcome>();

    thread::spawn(move || {
        let reconciler = Reconciler::with_default_sources();
        while let Ok(command) = cmd_rx.recv() {
            match command {
                MediaCommand::Poll => {
                    if out_tx.send(reconciler.poll()).is_err() {
                        break;
                    }
                }
                MediaCommand::PlayPause => run_player_command("playpause"),
                MediaCommand::NextTrack => run_player_command("next track"),
                MediaCommand::PreviousTrack => run_player_command("previous track"),
                MediaCommand::SeekTo(secs) => {
                    run_player_command(&format!("set player position to {secs:.2}"))
                }
                MediaCommand::SetVolume(volume) => set_system_volume(volume),
                MediaCommand::Shutdown => break,
            }
        }
    });

    (cmd_tx, out_rx)
}

/// Primary source: the system-wide MediaRemote registry. Sees whichever app
/// currently owns the now-playing slot, not just Spotify.
pub struct MediaRemoteSource;

impl NowPlayingSource for MediaRemoteSource {
    fn name(&self) -> &'static str {
        "media-remote"
    }

    #[cfg(target_os = "macos")]
    fn query(&self) -> anyhow::Result<Option<Snapshot>> {
        let Some(info) = mediaremote_rs::get_now_playing() else {
            return Ok(None);
        };
        if info.title.is_empty() {
            return Ok(None);
        }
        Ok(Some(Snapshot {
            title: info.title,
            artist: truncate_chars(&info.artist, ARTIST_MAX_CHARS),
            elapsed_secs: info.elapsed_time.unwrap_or(0.0),
            duration_secs: info.duration.unwrap_or(0.0),
            playing: info.playing,
            artwork_url: None,
        }))
    }

    #[cfg(not(target_os = "macos"))]
    fn query(&self) -> anyhow::Result<Option<Snapshot>> {
        Ok(None)
    }
}

/// Fallback source: ask Spotify directly over AppleScript. The reply is a
/// single pipe-delimited line (or a sentinel when idle / not running).
pub struct SpotifyScriptSource;

const SPOTIFY_STATUS_SCRIPT: &str = r#"tell application "System Events"
	if exists process "Spotify" then
		tell application "Spotify"
			set playerState to player state as string
			if playerState is "playing" or playerState is "paused" then
				return name of current track & "|" & artist of current track & "|" & player position & "|" & (duration of current track / 1000) & "|" & playerState & "|" & artwork url of current track
			else
				return "stopped"
			end if
		end tell
	else
		return "not_running"
	end if
end tell"#;

const SPOTIFY_ARTWORK_SCRIPT: &str =
    r#"tell application "Spotify" to return artwork url of current track"#;

impl NowPlayingSource for SpotifyScriptSource {
    fn name(&self) -> &'static str {
        "spotify-script"
    }

    fn query(&self) -> anyhow::Result<Option<Snapshot>> {
        let reply = run_osascript(SPOTIFY_STATUS_SCRIPT)?;
        Ok(parse_script_reply(&reply))
    }

    fn artwork_url(&self) -> Option<String> {
        match run_osascript(SPOTIFY_ARTWORK_SCRIPT) {
            Ok(url) if url.starts_with("http") => Some(url),
            Ok(_) => None,
            Err(err) => {
                debug!(error = %format!("{err:#}"), "artwork url query failed");
                None
            }
        }
    }
}

/// Parse the pipe-delimited scripted reply:
/// `title|artist|positionSeconds|durationSeconds|playerState[|artworkUrl]`.
/// The sentinels `stopped` / `not_running` and anything too short count as
/// "no snapshot".
pub fn parse_script_reply(reply: &str) -> Option<Snapshot> {
    let reply = reply.trim();
    if reply.is_empty() || reply == "stopped" || reply == "not_running" {
        return None;
    }

    let fields: Vec<&str> = reply.split('|').collect();
    if fields.len() < 2 || fields[0].is_empty() {
        return None;
    }

    let elapsed_secs = fields
        .get(2)
        .and_then(|f| f.trim().parse::<f64>().ok())
        .unwrap_or(0.0);
    let duration_secs = fields
        .get(3)
        .and_then(|f| f.trim().parse::<f64>().ok())
        .unwrap_or(0.0);
    let playing = fields
        .get(4)
        .map(|state| state.trim() == "playing")
        .unwrap_or(false);
    let artwork_url = fields
        .get(5)
        .map(|url| url.trim())
        .filter(|url| url.starts_with("http"))
        .map(str::to_string);

    Some(Snapshot {
        title: fields[0].to_string(),
        artist: truncate_chars(fields[1], ARTIST_MAX_CHARS),
        elapsed_secs,
        duration_secs,
        playing,
        artwork_url,
    })
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

fn run_osascript(script: &str) -> anyhow::Result<String> {
    let output = Command::new("osascript")
        .args(["-e", script])
        .output()
        .context("Failed to run osascript")?;
    if !output.status.success() {
        anyhow::bail!(
            "osascript exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn run_player_command(command: &str) {
    let script = format!("tell application \"Spotify\" to {command}");
    if let Err(err) = run_osascript(&script) {
        warn!(command, error = %format!("{err:#}"), "player command failed");
    }
}

fn set_system_volume(volume: u8) {
    let script = format!("set volume output volume {}", volume.min(100));
    if let Err(err) = run_osascript(&script) {
        warn!(volume, error = %format!("{err:#}"), "volume command failed");
    }
}

fn query_system_volume() -> Option<u8> {
    match run_osascript("output volume of (get volume settings)") {
        Ok(reply) => match reply.parse::<u8>() {
            Ok(volume) => Some(volume.min(100)),
            Err(_) => {
                debug!(%reply, "unparseable volume reply");
                None
            }
        },
        Err(err) => {
            debug!(error = %format!("{err:#}"), "volume query failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeSource {
        name: &'static str,
        snapshot: anyhow::Result<Option<Snapshot>>,
        artwork: Option<String>,
    }

    impl FakeSource {
        fn playing(name: &'static str, title: &str) -> Self {
            Self {
                name,
                snapshot: Ok(Some(Snapshot {
                    title: title.to_string(),
                    artist: "Someone".to_string(),
                    elapsed_secs: 10.0,
                    duration_secs: 100.0,
                    playing: true,
                    artwork_url: None,
                })),
                artwork: None,
            }
        }

        fn empty(name: &'static str) -> Self {
            Self {
                name,
                snapshot: Ok(None),
                artwork: None,
            }
        }

        fn failing(name: &'static str) -> Self {
            Self {
                name,
                snapshot: Err(anyhow::anyhow!("boom")),
                artwork: None,
            }
        }

        fn with_artwork(mut self, url: &str) -> Self {
            self.artwork = Some(url.to_string());
            self
        }
    }

    impl NowPlayingSource for FakeSource {
        fn name(&self) -> &'static str {
            self.name
        }

        fn query(&self) -> anyhow::Result<Option<Snapshot>> {
            match &self.snapshot {
                Ok(snapshot) => Ok(snapshot.clone()),
                Err(err) => Err(anyhow::anyhow!("{err}")),
            }
        }

        fn artwork_url(&self) -> Option<String> {
            self.artwork.clone()
        }
    }

    #[test]
    fn parses_full_scripted_reply() {
        let snapshot =
            parse_script_reply("Song A|Artist B|30|200|playing|http://img").expect("snapshot");
        assert_eq!(snapshot.title, "Song A");
        assert_eq!(snapshot.artist, "Artist B");
        assert_eq!(snapshot.elapsed_secs, 30.0);
        assert_eq!(snapshot.duration_secs, 200.0);
        assert!(snapshot.playing);
        assert_eq!(snapshot.artwork_url.as_deref(), Some("http://img"));
    }

    #[test]
    fn paused_state_and_missing_artwork() {
        let snapshot = parse_script_reply("Song A|Artist B|30.5|200.25|paused").expect("snapshot");
        assert!(!snapshot.playing);
        assert_eq!(snapshot.elapsed_secs, 30.5);
        assert_eq!(snapshot.artwork_url, None);
    }

    #[test]
    fn sentinels_and_garbage_yield_no_snapshot() {
        assert!(parse_script_reply("stopped").is_none());
        assert!(parse_script_reply("not_running").is_none());
        assert!(parse_script_reply("").is_none());
        assert!(parse_script_reply("   \n").is_none());
        assert!(parse_script_reply("loneliness").is_none());
        assert!(parse_script_reply("|no title").is_none());
    }

    #[test]
    fn non_http_artwork_field_is_dropped() {
        let snapshot =
            parse_script_reply("Song|Artist|1|2|playing|missing value").expect("snapshot");
        assert_eq!(snapshot.artwork_url, None);
    }

    #[test]
    fn artist_is_truncated_to_fifteen_chars() {
        let snapshot =
            parse_script_reply("Song|A Very Long Artist Name Indeed|1|2|playing").expect("snapshot");
        assert_eq!(snapshot.artist, "A Very Long Art");
        assert_eq!(snapshot.artist.chars().count(), 15);
    }

    #[test]
    fn first_source_with_a_title_wins() {
        let reconciler = Reconciler::new(vec![
            Box::new(FakeSource::playing("primary", "From Primary")),
            Box::new(FakeSource::playing("secondary", "From Secondary")),
        ]);
        assert_eq!(reconciler.reconcile().title, "From Primary");
    }

    #[test]
    fn fallback_is_used_when_primary_is_empty() {
        let reconciler = Reconciler::new(vec![
            Box::new(FakeSource::empty("primary")),
            Box::new(FakeSource::playing("secondary", "From Secondary")),
        ]);
        assert_eq!(reconciler.reconcile().title, "From Secondary");
    }

    #[test]
    fn source_errors_degrade_to_idle_default() {
        let reconciler = Reconciler::new(vec![
            Box::new(FakeSource::failing("primary")),
            Box::new(FakeSource::failing("secondary")),
        ]);
        let snapshot = reconciler.reconcile();
        assert_eq!(snapshot, Snapshot::idle());
        assert_eq!(snapshot.title, IDLE_TITLE);
        assert!(!snapshot.playing);
        assert!(snapshot.artist.is_empty());
    }

    #[test]
    fn no_sources_at_all_is_idle() {
        let reconciler = Reconciler::new(Vec::new());
        assert_eq!(reconciler.reconcile(), Snapshot::idle());
    }

    #[test]
    fn artwork_is_borrowed_from_secondary_when_winner_has_none() {
        let reconciler = Reconciler::new(vec![
            Box::new(FakeSource::playing("primary", "Track")),
            Box::new(FakeSource::empty("secondary").with_artwork("http://img/cover.jpg")),
        ]);
        let snapshot = reconciler.reconcile();
        assert_eq!(snapshot.title, "Track");
        assert_eq!(snapshot.artwork_url.as_deref(), Some("http://img/cover.jpg"));
    }

    #[test]
    fn idle_snapshot_never_asks_for_artwork() {
        let reconciler = Reconciler::new(vec![
            Box::new(FakeSource::empty("primary").with_artwork("http://img/stale.jpg")),
        ]);
        assert_eq!(reconciler.reconcile().artwork_url, None);
    }

    #[test]
    fn progress_percent_handles_zero_duration() {
        let mut snapshot = Snapshot::idle();
        assert_eq!(snapshot.progress_percent(), 0.0);
        snapshot.elapsed_secs = 50.0;
        snapshot.duration_secs = 200.0;
        assert_eq!(snapshot.progress_percent(), 25.0);
        snapshot.elapsed_secs = 400.0;
        assert_eq!(snapshot.progress_percent(), 100.0);
    }
}
