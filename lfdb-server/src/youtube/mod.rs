//! YouTube integration: Data API client and caption transcripts

pub mod client;
pub mod transcript;

pub use client::{
    ChannelInfo, ChannelPage, VideoData, VideoStatusInfo, YouTubeClient, YouTubeError,
    MAX_PAGE_SIZE,
};
pub use transcript::{NoTranscripts, TranscriptFetcher, TranscriptSource};
