mod artwork;
mod config;
mod geometry;
mod hover;
mod interact;
mod launcher;
mod media;
mod platform;
mod settings;

use crate::{
    artwork::ArtworkCache,
    config::Config,
    hover::{ExpansionState, HoverExpansion},
    interact::{AntiSpamGate, SliderDebouncer, SliderKind},
    media::{MediaCommand, PollOutcome, Snapshot},
    settings::{Settings, PRESET_NAMES, QUICK_SLOT_COUNT},
};
use chrono::{Datelike, Days, Local};
use eframe::egui::{
    self, CornerRadius, LayerId, RichText, ViewportBuilder, ViewportCommand, WindowLevel,
};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::{
    collections::BTreeMap,
    path::Path,
    sync::mpsc::{self, Receiver, Sender, TryRecvError},
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};

const PLAY_GLYPH: &str = "▶";
const PAUSE_GLYPH: &str = "❚❚";
const PREV_GLYPH: &str = "◀◀";
const NEXT_GLYPH: &str = "▶▶";

const EXPAND_ANIMATION: Duration = Duration::from_millis(250);
const COLLAPSE_ANIMATION: Duration = Duration::from_millis(200);

const ARTWORK_POINTS: f32 = 50.0;

/// Per-frame window geometry animation between the collapsed and expanded
/// anchors.
struct FrameAnimation {
    from: egui::Rect,
    to: egui::Rect,
    started: Instant,
    duration: Duration,
}

impl FrameAnimation {
    fn new(from: egui::Rect, to: egui::Rect, started: Instant, duration: Duration) -> Self {
        Self {
            from,
            to,
            started,
            duration,
        }
    }

    fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started).as_secs_f32();
        (elapsed / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    fn sample(&self, now: Instant) -> egui::Rect {
        let t = ease_in_out(self.progress(now));
        egui::Rect::from_min_max(
            self.from.min.lerp(self.to.min, t),
            self.from.max.lerp(self.to.max, t),
        )
    }

    fn finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }
}

fn ease_in_out(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

fn app_display_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

struct App {
    config: Config,
    settings: Settings,
    settings_watcher: Option<RecommendedWatcher>,
    settings_rx: Option<Receiver<notify::Result<notify::Event>>>,

    media_tx: Option<Sender<MediaCommand>>,
    media_rx: Option<Receiver<PollOutcome>>,
    poll_inflight: bool,
    last_poll_request: Option<Instant>,
    last_poll: Instant,

    snapshot: Snapshot,
    shows_pause_glyph: bool,
    displayed_volume: f64,
    displayed_progress: f64,
    artwork: ArtworkCache,

    gate: AntiSpamGate,
    debouncer: SliderDebouncer,

    hover: HoverExpansion,
    pointer_was_inside: bool,
    reveal_at: Option<Instant>,
    animation: Option<FrameAnimation>,

    last_monitor_size: Option<egui::Vec2>,
    last_drift_check: Instant,
    window_level_set: bool,

    settings_open: bool,
    slot_edits: [String; QUICK_SLOT_COUNT],
    preset_edits: BTreeMap<String, String>,
}

impl App {
    fn new(config: Config) -> Self {
        let settings = Settings::load();
        let (media_tx, media_rx) = media::spawn_worker();

        let slot_edits = std::array::from_fn(|index| {
            settings.quick_slot(index).unwrap_or_default().to_string()
        });
        let preset_edits = PRESET_NAMES
            .iter()
            .map(|name| (name.to_string(), String::new()))
            .collect();

        let gate = AntiSpamGate::new(config.debounce.spam_cooldown);
        let debouncer = SliderDebouncer::new(&config.debounce);
        let hover = HoverExpansion::new(&config.hover);

        let mut app = Self {
            settings,
            settings_watcher: None,
            settings_rx: None,
            media_tx: Some(media_tx),
            media_rx: Some(media_rx),
            poll_inflight: false,
            last_poll_request: None,
            // Backdate so the first frame issues a poll immediately.
            last_poll: Instant::now() - config.media.poll_interval,
            snapshot: Snapshot::idle(),
            shows_pause_glyph: false,
            displayed_volume: 50.0,
            displayed_progress: 0.0,
            artwork: ArtworkCache::new(),
            gate,
            debouncer,
            hover,
            pointer_was_inside: false,
            reveal_at: None,
            animation: None,
            last_monitor_size: None,
            last_drift_check: Instant::now() - config.position.check_interval,
            window_level_set: false,
            settings_open: false,
            slot_edits,
            preset_edits,
            config,
        };

        if let Some(tx) = app.media_tx.as_ref() {
            if tx.send(MediaCommand::Poll).is_ok() {
                app.poll_inflight = true;
                app.last_poll_request = Some(Instant::now());
            } else {
                app.media_tx = None;
            }
        }

        app
    }

    fn monitor_size(&self, ctx: &egui::Context) -> egui::Vec2 {
        ctx.input(|i| i.viewport().monitor_size)
            .unwrap_or(egui::vec2(1440.0, 900.0))
    }

    fn ensure_window_level(&mut self, ctx: &egui::Context) {
        if !self.window_level_set {
            ctx.send_viewport_cmd(ViewportCommand::WindowLevel(WindowLevel::AlwaysOnTop));
            self.window_level_set = true;
        }
    }

    // ---- media plumbing ----

    fn drain_media(&mut self) {
        let mut outcomes = Vec::new();
        if let Some(rx) = self.media_rx.as_mut() {
            loop {
                match rx.try_recv() {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        self.media_rx = None;
                        self.media_tx = None;
                        self.poll_inflight = false;
                        self.last_poll_request = None;
                        break;
                    }
                }
            }
        }

        for outcome in outcomes {
            self.apply_poll(outcome);
        }
    }

    fn apply_poll(&mut self, outcome: PollOutcome) {
        self.poll_inflight = false;
        self.last_poll_request = None;
        self.last_poll = Instant::now();

        if let Some(volume) = outcome.system_volume {
            // Skip while the user is still dragging the volume slider.
            if !self.debouncer.recently_touched(SliderKind::Volume) {
                self.displayed_volume = f64::from(volume);
            }
        }

        let snapshot = outcome.snapshot;
        if !self.debouncer.recently_touched(SliderKind::Seek) {
            self.displayed_progress = snapshot.progress_percent();
        }
        self.artwork.resolve(snapshot.artwork_url.as_deref());
        self.shows_pause_glyph = snapshot.playing;
        if !snapshot.same_track(&self.snapshot) {
            debug!(title = %snapshot.title, artist = %snapshot.artist, "track changed");
        }
        self.snapshot = snapshot;
    }

    fn maybe_request_poll(&mut self) {
        let now = Instant::now();

        if self.poll_inflight {
            if let Some(sent_at) = self.last_poll_request {
                if now.duration_since(sent_at) > self.config.media.poll_timeout {
                    self.poll_inflight = false;
                    self.last_poll_request = None;
                }
            } else {
                self.poll_inflight = false;
            }
        }

        if self.poll_inflight {
            return;
        }

        if now.duration_since(self.last_poll) < self.config.media.poll_interval {
            return;
        }

        if let Some(tx) = self.media_tx.as_ref() {
            match tx.send(MediaCommand::Poll) {
                Ok(()) => {
                    self.poll_inflight = true;
                    self.last_poll_request = Some(now);
                }
                Err(_) => {
                    self.media_tx = None;
                }
            }
        }
    }

    fn send_media(&mut self, command: MediaCommand) {
        if let Some(tx) = self.media_tx.as_ref() {
            if tx.send(command).is_err() {
                warn!("media worker is gone; dropping command");
                self.media_tx = None;
            }
        }
    }

    // ---- settings plumbing ----

    fn maintain_settings_watcher(&mut self) {
        if self.settings_watcher.is_none() {
            if let Some(path) = Settings::preferences_path() {
                if path.exists() {
                    let (tx, rx) = mpsc::channel();
                    let watcher = notify::recommended_watcher(move |res| {
                        let _ = tx.send(res);
                    });
                    match watcher {
                        Ok(mut watcher) => match watcher.watch(&path, RecursiveMode::NonRecursive)
                        {
                            Ok(()) => {
                                self.settings_watcher = Some(watcher);
                                self.settings_rx = Some(rx);
                            }
                            Err(err) => {
                                debug!(error = %err, "failed to watch settings file")
                            }
                        },
                        Err(err) => debug!(error = %err, "failed to create settings watcher"),
                    }
                }
            }
        }

        let mut changed = false;
        if let Some(rx) = self.settings_rx.as_ref() {
            while let Ok(event) = rx.try_recv() {
                if event.is_ok() {
                    changed = true;
                }
            }
        }
        if changed {
            self.settings = Settings::load();
        }
    }

    // ---- hover / geometry ----

    fn handle_hover(&mut self, ctx: &egui::Context, now: Instant) {
        let root_rect = ctx.screen_rect();
        let inside = match ctx.input(|i| i.pointer.latest_pos()) {
            Some(pos) => root_rect.contains(pos),
            None => false,
        };

        if inside {
            if self.hover.pointer_entered(now) {
                self.begin_expand(ctx, now);
            }
        } else if self.pointer_was_inside {
            self.hover.pointer_exited(now);
        }
        self.pointer_was_inside = inside;

        if self.hover.recheck_due(now) {
            let inside_padded = self.pointer_inside_padded_frame(ctx);
            if self.hover.confirm_exit(now, inside_padded) {
                self.begin_collapse(ctx, now);
            }
        }
    }

    /// Close-check containment: the pointer counts as "still here" when it is
    /// over the window, or within the dwell buffer around it. The buffer test
    /// needs the global pointer, which only the platform can report once the
    /// cursor has left our window.
    fn pointer_inside_padded_frame(&self, ctx: &egui::Context) -> bool {
        if let Some(pos) = ctx.input(|i| i.pointer.latest_pos()) {
            if ctx.screen_rect().contains(pos) {
                return true;
            }
        }

        let (outer_rect, monitor_size) =
            ctx.input(|i| (i.viewport().outer_rect, i.viewport().monitor_size));
        let (Some(frame), Some(monitor)) = (outer_rect, monitor_size) else {
            return false;
        };
        let Some((global_x, global_y)) = platform::global_pointer_position() else {
            return false;
        };
        // AppKit reports a bottom-left origin; the viewport rects use
        // top-left.
        let pointer = egui::pos2(global_x as f32, monitor.y - global_y as f32);
        geometry::within_padded(frame, pointer, self.config.hover.buffer_px)
    }

    fn current_frame(&self, ctx: &egui::Context, fallback: ExpansionState) -> egui::Rect {
        ctx.input(|i| i.viewport().outer_rect)
            .unwrap_or_else(|| geometry::expected_frame(self.monitor_size(ctx), fallback))
    }

    fn begin_expand(&mut self, ctx: &egui::Context, now: Instant) {
        let monitor = self.monitor_size(ctx);
        let from = self.current_frame(ctx, ExpansionState::Collapsed);
        let to = geometry::expected_frame(monitor, ExpansionState::Expanded);
        self.animation = Some(FrameAnimation::new(from, to, now, EXPAND_ANIMATION));
        // The panel appears only after the resize has visually led.
        self.reveal_at = Some(now + self.config.hover.reveal_delay);
        platform::haptic_pulse();
        debug!("island expanding");
    }

    fn begin_collapse(&mut self, ctx: &egui::Context, now: Instant) {
        let monitor = self.monitor_size(ctx);
        let from = self.current_frame(ctx, ExpansionState::Expanded);
        let to = geometry::expected_frame(monitor, ExpansionState::Collapsed);
        self.animation = Some(FrameAnimation::new(from, to, now, COLLAPSE_ANIMATION));
        self.reveal_at = None;
        debug!("island collapsing");
    }

    fn drive_animation(&mut self, ctx: &egui::Context, now: Instant) {
        if let Some(animation) = &self.animation {
            let frame = animation.sample(now);
            ctx.send_viewport_cmd(ViewportCommand::InnerSize(frame.size()));
            ctx.send_viewport_cmd(ViewportCommand::OuterPosition(frame.min));
            if animation.finished(now) {
                self.animation = None;
            }
        }
    }

    /// Drift monitor: periodically (and on every screen reconfiguration)
    /// force the window back onto its anchor.
    fn monitor_position(&mut self, ctx: &egui::Context, now: Instant) {
        let monitor = ctx.input(|i| i.viewport().monitor_size);
        let monitor_changed = self.last_monitor_size.is_some() && monitor != self.last_monitor_size;
        let first_sighting = self.last_monitor_size.is_none() && monitor.is_some();
        self.last_monitor_size = monitor;

        if self.animation.is_some() {
            // The animation owns the frame; restart the clock afterwards.
            self.last_drift_check = now;
            return;
        }

        let due = monitor_changed
            || first_sighting
            || now.duration_since(self.last_drift_check) >= self.config.position.check_interval;
        if !due {
            return;
        }
        self.last_drift_check = now;

        let Some(monitor) = monitor else {
            return;
        };
        let expected = geometry::expected_frame(monitor, self.hover.state());
        let actual = ctx.input(|i| i.viewport().outer_rect);
        let needs_fix = monitor_changed
            || first_sighting
            || actual.map_or(true, |rect| {
                geometry::drifted(rect.min, expected.min, self.config.position.tolerance_px)
            });

        if needs_fix {
            ctx.send_viewport_cmd(ViewportCommand::InnerSize(expected.size()));
            ctx.send_viewport_cmd(ViewportCommand::OuterPosition(expected.min));
            debug!(x = %expected.min.x, y = %expected.min.y, "island reanchored");
        }
    }

    fn controls_visible(&self, now: Instant) -> bool {
        self.hover.is_expanded() && matches!(self.reveal_at, Some(at) if now >= at)
    }

    fn desired_repaint_interval(&self) -> Duration {
        if self.animation.is_some() {
            Duration::from_millis(16)
        } else if self.hover.is_expanded() {
            Duration::from_millis(100)
        } else {
            Duration::from_millis(250)
        }
    }

    // ---- actions ----

    fn toggle_play_pause(&mut self) {
        // No spam gate here: the glyph flips immediately even if the
        // underlying command is still in flight.
        self.shows_pause_glyph = !self.shows_pause_glyph;
        self.send_media(MediaCommand::PlayPause);
    }

    fn launch_quick_slot(&mut self, index: usize) {
        let Some(path) = self.settings.quick_slot(index).map(str::to_string) else {
            return;
        };
        if self.gate.attempt(&format!("quick_app_{index}")) {
            if let Err(err) = launcher::launch_app(&path) {
                warn!(error = %format!("{err:#}"), "quick launch failed");
            }
        }
    }

    fn launch_preset(&mut self, name: &str) {
        let key = format!("preset_{}", name.to_lowercase().replace(' ', "_"));
        if self.gate.attempt(&key) {
            launcher::launch_preset(name, self.settings.preset_apps(name));
        }
    }

    // ---- rendering ----

    fn paint_shell(&self, ctx: &egui::Context) {
        let rect = ctx.screen_rect();
        let radius = if rect.width() <= 210.0 {
            CornerRadius::same(22)
        } else {
            CornerRadius::same(30)
        };
        ctx.layer_painter(LayerId::background())
            .rect_filled(rect, radius, egui::Color32::BLACK);
    }

    fn render_control_panel(&mut self, ctx: &egui::Context) {
        let mut panel_frame = egui::Frame::central_panel(&ctx.style());
        panel_frame.fill = egui::Color32::TRANSPARENT;

        egui::CentralPanel::default()
            .frame(panel_frame)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    self.render_quick_access(ui);
                    ui.separator();
                    self.render_presets(ui);
                    ui.separator();
                    self.render_date_time(ui);
                    ui.separator();
                    self.render_media(ui);
                });
            });
    }

    fn render_quick_access(&mut self, ui: &mut egui::Ui) {
        ui.vertical(|ui| {
            ui.weak("Quick Access");
            egui::Grid::new("quick_access_grid")
                .spacing([6.0, 6.0])
                .show(ui, |ui| {
                    for row in 0..2 {
                        for col in 0..2 {
                            self.render_quick_slot(ui, row * 2 + col);
                        }
                        ui.end_row();
                    }
                });
        });
    }

    fn render_quick_slot(&mut self, ui: &mut egui::Ui, index: usize) {
        let slot_size = egui::vec2(64.0, 26.0);
        match self.settings.quick_slot(index).map(app_display_name) {
            Some(name) => {
                let button = egui::Button::new(RichText::new(name).small()).min_size(slot_size);
                if ui.add(button).clicked() {
                    self.launch_quick_slot(index);
                }
            }
            None => {
                let button = egui::Button::new(RichText::new("Configure…").small().weak())
                    .min_size(slot_size);
                if ui.add(button).clicked() {
                    self.settings_open = true;
                }
            }
        }
    }

    fn render_presets(&mut self, ui: &mut egui::Ui) {
        ui.vertical(|ui| {
            for name in PRESET_NAMES {
                let button =
                    egui::Button::new(RichText::new(name).small()).min_size(egui::vec2(96.0, 18.0));
                if ui.add(button).clicked() {
                    self.launch_preset(name);
                }
            }
            ui.weak("Presets");
        });
    }

    fn render_date_time(&mut self, ui: &mut egui::Ui) {
        let now = Local::now();
        let today = now.date_naive();
        let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
        let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);

        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                ui.weak(yesterday.day().to_string());
                ui.label(RichText::new(today.day().to_string()).strong().size(26.0));
                ui.weak(tomorrow.day().to_string());
            });
            ui.label(now.format("%I:%M").to_string());
            ui.weak(now.format("%A").to_string());
            if ui.small_button("⚙").clicked() {
                self.settings_open = !self.settings_open;
            }
        });
    }

    fn render_media(&mut self, ui: &mut egui::Ui) {
        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                self.render_artwork(ui);
                ui.vertical(|ui| {
                    ui.label(RichText::new(self.snapshot.title.clone()).strong());
                    if !self.snapshot.artist.is_empty() {
                        ui.weak(self.snapshot.artist.clone());
                    }
                });
            });

            let seek = ui.add(
                egui::Slider::new(&mut self.displayed_progress, 0.0..=100.0).show_value(false),
            );
            if seek.changed() {
                if let Some(percent) = self
                    .debouncer
                    .on_changed(SliderKind::Seek, self.displayed_progress)
                {
                    let duration = self.snapshot.duration_secs;
                    if duration > 0.0 {
                        self.send_media(MediaCommand::SeekTo(percent / 100.0 * duration));
                    }
                }
            }

            ui.horizontal(|ui| {
                if ui.small_button(PREV_GLYPH).clicked() && self.gate.attempt("previous_track") {
                    self.send_media(MediaCommand::PreviousTrack);
                }
                let play_glyph = if self.shows_pause_glyph {
                    PAUSE_GLYPH
                } else {
                    PLAY_GLYPH
                };
                if ui.button(play_glyph).clicked() {
                    self.toggle_play_pause();
                }
                if ui.small_button(NEXT_GLYPH).clicked() && self.gate.attempt("next_track") {
                    self.send_media(MediaCommand::NextTrack);
                }

                ui.add_space(10.0);
                ui.spacing_mut().slider_width = 80.0;
                let volume = ui.add(
                    egui::Slider::new(&mut self.displayed_volume, 0.0..=100.0).show_value(false),
                );
                if volume.changed() {
                    if let Some(value) = self
                        .debouncer
                        .on_changed(SliderKind::Volume, self.displayed_volume)
                    {
                        self.send_media(MediaCommand::SetVolume(value.round() as u8));
                    }
                }
            });
        });
    }

    fn render_artwork(&mut self, ui: &mut egui::Ui) {
        let size = egui::vec2(ARTWORK_POINTS, ARTWORK_POINTS);
        match self.artwork.texture() {
            Some(texture) => {
                ui.add(
                    egui::Image::from_texture(texture)
                        .fit_to_exact_size(size)
                        .corner_radius(CornerRadius::same(6)),
                );
            }
            None => {
                let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
                ui.painter()
                    .rect_filled(rect, CornerRadius::same(6), egui::Color32::DARK_GRAY);
            }
        }
    }

    fn show_settings_viewport(&mut self, ctx: &egui::Context) {
        let viewport_id = egui::ViewportId::from_hash_of("island_settings");
        let builder = ViewportBuilder::default()
            .with_title("Dynamic Island Settings")
            .with_inner_size(egui::vec2(560.0, 620.0));

        let mut close = false;
        ctx.show_viewport_immediate(viewport_id, builder, |ctx, _class| {
            egui::CentralPanel::default().show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    close |= self.render_settings(ui);
                });
            });
            if ctx.input(|i| i.viewport().close_requested()) {
                close = true;
            }
        });
        if close {
            self.settings_open = false;
        }
    }

    /// Returns true when the user asked to close the settings window.
    fn render_settings(&mut self, ui: &mut egui::Ui) -> bool {
        let mut close = false;

        ui.heading("Dynamic Island Settings");
        ui.weak("Configure your quick access applications and presets");
        ui.add_space(8.0);

        ui.label(RichText::new("Quick Access").strong());
        for index in 0..QUICK_SLOT_COUNT {
            ui.horizontal(|ui| {
                ui.label(format!("Slot {}", index + 1));
                ui.add(
                    egui::TextEdit::singleline(&mut self.slot_edits[index])
                        .hint_text("/Applications/Example.app")
                        .desired_width(300.0),
                );
                if ui.button("Set").clicked() {
                    let path = self.slot_edits[index].trim().to_string();
                    if self.settings.set_quick_slot(index, Some(path)) {
                        self.settings.save();
                    }
                }
                if ui.button("Clear").clicked() {
                    if self.settings.set_quick_slot(index, None) {
                        self.settings.save();
                    }
                    self.slot_edits[index].clear();
                }
            });
        }

        ui.add_space(8.0);
        ui.label(RichText::new("Presets").strong());
        for name in PRESET_NAMES {
            ui.group(|ui| {
                ui.label(RichText::new(name).strong());
                let apps = self.settings.preset_apps(name);
                if apps.is_empty() {
                    ui.weak("No apps configured");
                } else {
                    let joined = apps
                        .iter()
                        .map(|path| app_display_name(path))
                        .collect::<Vec<_>>()
                        .join(", ");
                    ui.label(joined);
                }

                ui.horizontal(|ui| {
                    let edit = self.preset_edits.entry(name.to_string()).or_default();
                    ui.add(
                        egui::TextEdit::singleline(edit)
                            .hint_text("/Applications/Example.app")
                            .desired_width(300.0),
                    );
                    let pending = edit.trim().to_string();
                    let add_clicked = ui.button("Add App").clicked();
                    let clear_clicked = ui.button("Clear All").clicked();
                    if add_clicked && !pending.is_empty() {
                        if self.settings.add_preset_app(name, pending) {
                            self.settings.save();
                        }
                        if let Some(edit) = self.preset_edits.get_mut(name) {
                            edit.clear();
                        }
                    }
                    if clear_clicked {
                        self.settings.clear_preset(name);
                        self.settings.save();
                    }
                });
            });
        }

        ui.add_space(12.0);
        ui.horizontal(|ui| {
            if ui.button("Close").clicked() {
                close = true;
            }
            if ui.button("Quit App").clicked() {
                info!("quit requested from settings");
                ui.ctx()
                    .send_viewport_cmd_to(egui::ViewportId::ROOT, ViewportCommand::Close);
            }
        });

        close
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        self.ensure_window_level(ctx);
        self.maintain_settings_watcher();
        self.drain_media();
        self.artwork.drain(ctx);

        self.handle_hover(ctx, now);
        self.drive_animation(ctx, now);
        self.monitor_position(ctx, now);

        self.paint_shell(ctx);
        if self.controls_visible(now) {
            self.render_control_panel(ctx);
        }
        if self.settings_open {
            self.show_settings_viewport(ctx);
        }

        self.maybe_request_poll();
        ctx.request_repaint_after(self.desired_repaint_interval());
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        // Fully transparent backdrop; the shell paints its own pill.
        [0.0, 0.0, 0.0, 0.0]
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(tx) = self.media_tx.take() {
            let _ = tx.send(MediaCommand::Shutdown);
        }
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("island_gui=info")),
        )
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %format!("{err:#}"), "failed to load config; using defaults");
            Config::default()
        }
    };
    info!("starting dynamic island");

    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_transparent(true)
            .with_decorations(false)
            .with_resizable(false)
            .with_inner_size(geometry::COLLAPSED_SIZE),
        ..Default::default()
    };
    let run_res = eframe::run_native(
        "Dynamic Island",
        native_options,
        Box::new(
            move |_cc| -> std::result::Result<
                Box<dyn eframe::App>,
                Box<dyn std::error::Error + Send + Sync>,
            > { Ok(Box::new(App::new(config))) },
        ),
    );
    if let Err(e) = run_res {
        return Err(Box::new(e));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_animation_interpolates_between_anchors() {
        let from = egui::Rect::from_min_size(egui::pos2(620.0, -12.0), geometry::COLLAPSED_SIZE);
        let to = egui::Rect::from_min_size(egui::pos2(370.0, -12.0), geometry::EXPANDED_SIZE);
        let start = Instant::now();
        let animation = FrameAnimation::new(from, to, start, Duration::from_millis(250));

        assert_eq!(animation.sample(start), from);
        assert!(!animation.finished(start));

        let halfway = animation.sample(start + Duration::from_millis(125));
        assert!(halfway.width() > from.width());
        assert!(halfway.width() < to.width());

        let end = start + Duration::from_millis(300);
        assert_eq!(animation.sample(end), to);
        assert!(animation.finished(end));
    }

    #[test]
    fn ease_is_monotonic_and_clamped() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(1.0), 1.0);
        let mut last = 0.0;
        for step in 0..=10 {
            let value = ease_in_out(step as f32 / 10.0);
            assert!(value >= last);
            last = value;
        }
    }

    #[test]
    fn app_display_name_strips_bundle_suffix() {
        assert_eq!(app_display_name("/Applications/Safari.app"), "Safari");
        assert_eq!(
            app_display_name("/Applications/Visual Studio Code.app"),
            "Visual Studio Code"
        );
        assert_eq!(app_display_name("plainname"), "plainname");
    }
}
