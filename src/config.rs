use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_ROOT: &str = "Assets/Videos";
pub const DEFAULT_EXTENSIONS: &[&str] = &["mp4", "mov", "avi"];
pub const DEFAULT_OUTPUT_SUBDIR: &str = "fixed";
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
pub const COPY_CODEC: &str = "copy";
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Color standard written into the primaries, transfer and matrix tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorStandard {
    Bt709,
    Bt2020,
}

impl ColorStandard {
    /// ffmpeg `-color_primaries` value
    pub fn primaries(self) -> &'static str {
        match self {
            ColorStandard::Bt709 => "bt709",
            ColorStandard::Bt2020 => "bt2020",
        }
    }

    /// ffmpeg `-color_trc` value
    pub fn transfer(self) -> &'static str {
        match self {
            ColorStandard::Bt709 => "bt709",
            ColorStandard::Bt2020 => "bt2020-10",
        }
    }

    /// ffmpeg `-colorspace` value
    pub fn matrix(self) -> &'static str {
        match self {
            ColorStandard::Bt709 => "bt709",
            ColorStandard::Bt2020 => "bt2020nc",
        }
    }

    /// ISO/IEC 23091-2 code points as (primaries, transfer, matrix)
    pub fn code_points(self) -> (u64, u64, u64) {
        match self {
            ColorStandard::Bt709 => (1, 1, 1),
            ColorStandard::Bt2020 => (9, 14, 9),
        }
    }
}

impl fmt::Display for ColorStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorStandard::Bt709 => write!(f, "BT.709"),
            ColorStandard::Bt2020 => write!(f, "BT.2020"),
        }
    }
}

/// Everything discovery and conversion need to know about a run
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub extensions: Vec<String>,
    pub output_subdir: String,
    pub video_codec: String,
    pub audio_codec: String,
    pub color: ColorStandard,
    pub ffmpeg: PathBuf,
    pub jobs: usize,
    pub verify: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            root: PathBuf::from(DEFAULT_ROOT),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            output_subdir: DEFAULT_OUTPUT_SUBDIR.to_string(),
            video_codec: DEFAULT_VIDEO_CODEC.to_string(),
            audio_codec: COPY_CODEC.to_string(),
            color: ColorStandard::Bt709,
            ffmpeg: PathBuf::from(DEFAULT_FFMPEG),
            jobs: 1,
            verify: false,
        }
    }
}
