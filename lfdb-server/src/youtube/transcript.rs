//! Caption transcript fetching
//!
//! Scrapes the watch page for the player's `captionTracks` list and
//! downloads the timed-text XML of the preferred track. Transcripts are a
//! best-effort enrichment: every failure degrades to `None`.

use async_trait::async_trait;
use htmlescape::decode_html;
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const CAPTION_TRACKS_MARKER: &str = "\"captionTracks\":";

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {0}")]
    Http(u16),

    #[error("No caption tracks")]
    NoCaptions,

    #[error("Caption track list malformed: {0}")]
    Parse(String),
}

/// Source of video transcripts
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Transcript text for a video, or `None` when unavailable
    async fn fetch(&self, youtube_id: &str) -> Option<String>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    #[serde(default)]
    language_code: Option<String>,
    #[serde(default)]
    vss_id: Option<String>,
}

impl CaptionTrack {
    fn is_english(&self) -> bool {
        // vssId looks like ".en", "a.en" (auto-generated) or ".en.<name>"
        let vss_language = self.vss_id.as_deref().and_then(|id| id.split('.').nth(1));
        self.language_code.as_deref().is_some_and(is_english_code)
            || vss_language.is_some_and(is_english_code)
    }
}

fn is_english_code(code: &str) -> bool {
    code == "en" || code.starts_with("en-")
}

/// Fetches transcripts from the public watch page
pub struct TranscriptFetcher {
    http: reqwest::Client,
    watch_base_url: String,
}

impl TranscriptFetcher {
    pub fn new(watch_base_url: impl Into<String>) -> Result<Self, TranscriptError> {
        let http = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)")
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TranscriptError::Network(e.to_string()))?;

        Ok(Self {
            http,
            watch_base_url: watch_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_text(&self, url: &str) -> Result<String, TranscriptError> {
        let response = self
            .http
            .get(url)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| TranscriptError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranscriptError::Http(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| TranscriptError::Network(e.to_string()))
    }

    /// Fetch a transcript, surfacing the failure reason
    pub async fn try_fetch(&self, youtube_id: &str) -> Result<String, TranscriptError> {
        let page_url = format!("{}/watch?v={}", self.watch_base_url, youtube_id);
        let page = self.get_text(&page_url).await?;

        let tracks = extract_caption_tracks(&page)?;
        let track = select_track(&tracks).ok_or(TranscriptError::NoCaptions)?;

        let track_url = if track.base_url.starts_with("http") {
            track.base_url.clone()
        } else {
            format!("{}{}", self.watch_base_url, track.base_url)
        };
        let xml = self.get_text(&track_url).await?;

        let transcript = parse_timed_text(&xml);
        if transcript.is_empty() {
            return Err(TranscriptError::NoCaptions);
        }

        Ok(transcript)
    }
}

#[async_trait]
impl TranscriptSource for TranscriptFetcher {
    async fn fetch(&self, youtube_id: &str) -> Option<String> {
        match self.try_fetch(youtube_id).await {
            Ok(transcript) => {
                debug!(youtube_id, chars = transcript.len(), "Fetched transcript");
                Some(transcript)
            }
            Err(TranscriptError::NoCaptions) => {
                debug!(youtube_id, "No transcript available");
                None
            }
            Err(e) => {
                warn!(youtube_id, error = %e, "Failed to fetch transcript");
                None
            }
        }
    }
}

/// Transcript source that never returns anything
pub struct NoTranscripts;

#[async_trait]
impl TranscriptSource for NoTranscripts {
    async fn fetch(&self, _youtube_id: &str) -> Option<String> {
        None
    }
}

fn extract_caption_tracks(page: &str) -> Result<Vec<CaptionTrack>, TranscriptError> {
    let start = page
        .find(CAPTION_TRACKS_MARKER)
        .ok_or(TranscriptError::NoCaptions)?
        + CAPTION_TRACKS_MARKER.len();

    // The stream deserializer stops after the array, ignoring the rest of the page
    serde_json::Deserializer::from_str(&page[start..])
        .into_iter::<Vec<CaptionTrack>>()
        .next()
        .ok_or(TranscriptError::NoCaptions)?
        .map_err(|e| TranscriptError::Parse(e.to_string()))
}

fn select_track(tracks: &[CaptionTrack]) -> Option<&CaptionTrack> {
    tracks
        .iter()
        .find(|track| track.is_english())
        .or_else(|| tracks.first())
}

/// Join every `<text>` segment of a timed-text document
///
/// Markup nested inside a segment is dropped at the XML level; only its
/// character data is kept and then entity-decoded.
pub fn parse_timed_text(xml: &str) -> String {
    let mut reader = Reader::from_str(xml);
    let mut segments: Vec<String> = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"text" => {
                current = Some(String::new());
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"text" => {
                if let Some(raw) = current.take() {
                    let text = decode_entities(&raw);
                    let text = WHITESPACE.replace_all(text.trim(), " ");
                    if !text.is_empty() {
                        segments.push(text.into_owned());
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(segment) = current.as_mut() {
                    segment.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(
                    error = %e,
                    position = reader.buffer_position(),
                    "Timed-text XML malformed; keeping segments read so far"
                );
                break;
            }
        }
    }

    segments.join(" ")
}

/// Decode XML/HTML entities, including the double-encoded `&amp;#39;` form
///
/// Text that fails to decode is kept as it was.
pub fn decode_entities(text: &str) -> String {
    let once = decode_html(text).unwrap_or_else(|_| text.to_string());
    if !once.contains('&') {
        return once;
    }
    decode_html(&once).unwrap_or(once)
}
