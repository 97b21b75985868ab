//! Connectivity checks for the YouTube and Gemini integrations
//!
//! Both endpoints answer 200 and report failures in the body as
//! `{"success": false, ...}` so an operator can read what went wrong.

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::ai::ExtractedRepairData;
use crate::AppState;

const SAMPLE_TITLE: &str = "Lenovo Yoga Pro 7 no power, not charging - a neat repair!";
const SAMPLE_DESCRIPTION: &str = "In this video, I repair a Lenovo Yoga Pro 7 laptop that has \
no power and is not charging. After troubleshooting the power circuit, I found a faulty MOSFET \
on the charging circuit. Replacing the component fixed the issue.";
const CONNECTIVITY_PROMPT: &str = "Say 'Hello! API is working!' in exactly those words.";
const SAMPLE_VIDEO_COUNT: u32 = 5;

fn step_failure(step: &str, error: impl Into<String>) -> Json<Value> {
    Json(json!({
        "success": false,
        "step": step,
        "error": error.into(),
    }))
}

/// GET /api/test/youtube
pub async fn test_youtube(State(state): State<AppState>) -> Json<Value> {
    let settings = &state.config.youtube;
    if settings.api_key.is_none() {
        return step_failure("env_check", "YOUTUBE_API_KEY is not set");
    }
    let Some(channel_id) = settings.channel_id.as_deref() else {
        return step_failure("env_check", "YOUTUBE_CHANNEL_ID is not set");
    };
    let youtube = match state.youtube() {
        Ok(client) => client,
        Err(e) => return step_failure("env_check", e.to_string()),
    };

    info!(channel_id, "Running YouTube API diagnostic");

    let channel = match youtube.get_channel_info(channel_id).await {
        Ok(Some(channel)) => channel,
        Ok(None) => {
            return Json(json!({
                "success": false,
                "step": "channel_lookup",
                "error": "Channel not found with the provided ID",
                "channelId": channel_id,
                "suggestion": "Double-check the channel ID. You can find it by going to the channel and looking at the URL.",
            }))
        }
        Err(e) => {
            warn!(error = %e, "YouTube diagnostic failed");
            return step_failure("api_call", e.to_string());
        }
    };

    let page = match youtube
        .get_channel_videos(channel_id, SAMPLE_VIDEO_COUNT, None)
        .await
    {
        Ok(page) => page,
        Err(e) => {
            warn!(error = %e, "YouTube diagnostic failed");
            return step_failure("api_call", e.to_string());
        }
    };

    let video_count = page.videos.len();
    let search_step = if video_count > 0 {
        format!("OK: found {} videos", video_count)
    } else {
        "FAIL: no videos found".to_string()
    };
    let sample_videos: Vec<Value> = page
        .videos
        .iter()
        .take(3)
        .map(|v| {
            json!({
                "id": v.youtube_id,
                "title": v.title,
                "publishedAt": v.published_at,
            })
        })
        .collect();

    Json(json!({
        "success": true,
        "message": "Diagnostic complete",
        "steps": {
            "1_api_key": "OK",
            "2_channel_found": format!("OK: {}", channel.title),
            "3_channel_stats": {
                "subscribers": channel.subscriber_count,
                "videos": channel.video_count,
                "views": channel.view_count,
            },
            "4_videos_search": search_step,
        },
        "data": {
            "channelInfo": {
                "title": channel.title,
                "description": channel.description,
                "customUrl": channel.custom_url,
            },
            "sampleVideos": sample_videos,
        },
    }))
}

fn gemini_help(message: &str) -> &'static str {
    if message.contains("API_KEY_INVALID") {
        "Your API key is invalid. Generate a new one in Google AI Studio."
    } else if message.to_lowercase().contains("quota") {
        "You've exceeded your API quota. Check your usage in Google AI Studio."
    } else if message.contains("PERMISSION_DENIED") {
        "Permission denied. Make sure the API key has access to the Gemini API."
    } else {
        "Check the server logs for more details"
    }
}

fn extraction_status(extraction: &ExtractedRepairData) -> &'static str {
    if extraction.brand.is_some() {
        "Pass"
    } else {
        "Low quality"
    }
}

/// GET /api/test/gemini
pub async fn test_gemini(State(state): State<AppState>) -> Json<Value> {
    if state.config.gemini.api_key.is_none() {
        return Json(json!({
            "success": false,
            "error": "GEMINI_API_KEY is not set in environment variables",
            "help": "Get an API key from Google AI Studio",
        }));
    }

    info!("Running Gemini API diagnostic");

    let greeting = match state.extractor.generator().generate(CONNECTIVITY_PROMPT).await {
        Ok(text) => text,
        Err(e) => {
            let message = e.to_string();
            warn!(error = %message, "Gemini diagnostic failed");
            return Json(json!({
                "success": false,
                "help": gemini_help(&message),
                "error": message,
            }));
        }
    };

    let extraction = state
        .extractor
        .extract_repair_data(SAMPLE_TITLE, Some(SAMPLE_DESCRIPTION), None)
        .await;

    Json(json!({
        "success": true,
        "message": "Gemini API is working correctly",
        "tests": {
            "1_basic_connectivity": {
                "status": "Pass",
                "response": greeting.chars().take(100).collect::<String>(),
            },
            "2_repair_extraction": {
                "status": extraction_status(&extraction),
                "extracted": {
                    "brand": extraction.brand,
                    "model": extraction.model,
                    "problemType": extraction.problem_type,
                    "confidence": extraction.confidence,
                    "hasTroubleshooting": !extraction.troubleshooting.is_empty(),
                    "hasSolution": !extraction.solution.is_empty(),
                },
                "reasoning": extraction.reasoning,
            },
        },
        "sampleExtraction": {
            "input": {
                "title": SAMPLE_TITLE,
                "description": SAMPLE_DESCRIPTION,
            },
            "output": extraction,
        },
    }))
}

pub fn diagnostics_routes() -> Router<AppState> {
    Router::new()
        .route("/api/test/youtube", get(test_youtube))
        .route("/api/test/gemini", get(test_gemini))
}
