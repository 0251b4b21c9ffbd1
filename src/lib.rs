//! Batch re-encoding of video files with normalized color metadata.
//!
//! Videos found under a root directory are re-encoded by ffmpeg into a sibling
//! `fixed/` directory with their color primaries, transfer characteristic and
//! matrix forced to one standard (BT.709 by default). Audio is copied as is.

pub mod args;
pub mod config;
pub mod discovery;
pub mod encoder;
pub mod failed;
pub mod metadata;
pub mod processor;
pub mod report;
pub mod task;

pub use config::{ColorStandard, Config};
pub use discovery::{find_video_files, VideoFile};
pub use encoder::{EncodeError, EncodeJob, Encoder, FfmpegEncoder};
pub use processor::{BatchSummary, Outcome, Processor};
pub use task::{ConversionTask, TaskStatus};
