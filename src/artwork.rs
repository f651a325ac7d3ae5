use eframe::egui::{self, ColorImage, TextureOptions};
use std::{
    sync::mpsc::{self, Receiver, TryRecvError},
    thread,
    time::Duration,
};
use tracing::{debug, warn};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(3);

struct ArtworkMessage {
    request_id: u64,
    image: Option<ColorImage>,
    error: Option<String>,
}

/// Single-slot artwork cache keyed by the last requested URL.
///
/// A URL is fetched at most once: the key is recorded when the download is
/// dispatched, so a failed download is not retried until the resolved URL
/// changes again. Results for superseded requests are dropped by request id
/// rather than cancelled.
pub struct ArtworkCache {
    last_requested_url: Option<String>,
    next_request_id: u64,
    inflight_request: Option<u64>,
    rx: Option<Receiver<ArtworkMessage>>,
    texture: Option<egui::TextureHandle>,
}

impl ArtworkCache {
    pub fn new() -> Self {
        Self {
            last_requested_url: None,
            next_request_id: 1,
            inflight_request: None,
            rx: None,
            texture: None,
        }
    }

    pub fn texture(&self) -> Option<&egui::TextureHandle> {
        self.texture.as_ref()
    }

    /// Whether `url` differs from the one last dispatched.
    pub fn should_fetch(&self, url: &str) -> bool {
        self.last_requested_url.as_deref() != Some(url)
    }

    /// Feed the URL resolved by the current poll. `None` (no active track or
    /// no artwork) leaves the slot untouched.
    pub fn resolve(&mut self, url: Option<&str>) {
        let Some(url) = url else {
            return;
        };
        if !self.should_fetch(url) {
            return;
        }
        let request_id = self.begin_request(url);
        let url = url.to_string();

        let (tx, rx) = mpsc::channel();
        self.rx = Some(rx);

        thread::spawn(move || {
            let message = match fetch_artwork(&url) {
                Ok(image) => ArtworkMessage {
                    request_id,
                    image: Some(image),
                    error: None,
                },
                Err(err) => ArtworkMessage {
                    request_id,
                    image: None,
                    error: Some(err),
                },
            };
            let _ = tx.send(message);
        });
    }

    /// Apply any finished downloads. Failures keep the previous artwork.
    pub fn drain(&mut self, ctx: &egui::Context) {
        let mut messages = Vec::new();
        if let Some(rx) = self.rx.as_ref() {
            loop {
                match rx.try_recv() {
                    Ok(message) => messages.push(message),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        self.rx = None;
                        break;
                    }
                }
            }
        }

        for message in messages {
            if Some(message.request_id) != self.inflight_request {
                // A newer URL superseded this download while it ran.
                continue;
            }
            self.inflight_request = None;
            match (message.image, message.error) {
                (Some(image), _) => {
                    self.texture =
                        Some(ctx.load_texture("island.artwork", image, TextureOptions::LINEAR));
                }
                (None, Some(error)) => {
                    warn!(error = %error, "artwork download failed; keeping previous image");
                }
                (None, None) => {
                    debug!("artwork download returned nothing");
                }
            }
        }
    }

    fn begin_request(&mut self, url: &str) -> u64 {
        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        self.last_requested_url = Some(url.to_string());
        self.inflight_request = Some(request_id);
        debug!(url, request_id, "dispatching artwork download");
        request_id
    }
}

fn fetch_artwork(url: &str) -> Result<ColorImage, String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .map_err(|e| format!("Failed to build http client: {e}"))?;
    let response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| format!("Failed to download artwork: {e}"))?;
    let bytes = response
        .bytes()
        .map_err(|e| format!("Failed to read artwork body: {e}"))?;
    decode_artwork(&bytes)
}

fn decode_artwork(bytes: &[u8]) -> Result<ColorImage, String> {
    let image =
        image::load_from_memory(bytes).map_err(|e| format!("Failed to decode artwork: {e}"))?;
    let image = image.to_rgba8();
    let size = [image.width() as usize, image.height() as usize];
    let pixels = image.into_raw();
    Ok(ColorImage::from_rgba_unmultiplied(size, &pixels))
}
