//! Background work shared by the HTTP handlers, the CLI and the scheduler

pub mod extraction;
pub mod health_check;
pub mod scheduler;
pub mod sync;

pub use extraction::{process_batch, process_video, BatchOutcome, ExtractionOutcome};
pub use health_check::{check_video_health, classify, HealthReport};
pub use sync::{sync_channel, sync_new_videos, SyncStats};
