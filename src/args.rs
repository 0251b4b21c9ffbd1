use anyhow::{bail, Result};
use clap::Parser;
use std::path::{Component, Path, PathBuf};

use crate::config::{
    ColorStandard, Config, COPY_CODEC, DEFAULT_EXTENSIONS, DEFAULT_FFMPEG, DEFAULT_OUTPUT_SUBDIR,
    DEFAULT_ROOT, DEFAULT_VIDEO_CODEC,
};

/// Re-encode videos with normalized color metadata into a sibling `fixed/` directory.
///
/// Run without arguments to process `Assets/Videos` with the default settings.
#[derive(Debug, Parser)]
#[command(name = "fix_videos", version)]
pub struct Args {
    /// Directory to scan recursively for videos
    #[arg(default_value = DEFAULT_ROOT)]
    pub root: PathBuf,

    /// Video file extension to process, case-sensitive (repeatable; default: mp4, mov, avi)
    #[arg(short, long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Name of the directory created next to each input to hold its converted copy
    #[arg(long, default_value = DEFAULT_OUTPUT_SUBDIR)]
    pub output_subdir: String,

    /// Video encoder handed to ffmpeg
    #[arg(long, default_value = DEFAULT_VIDEO_CODEC)]
    pub video_codec: String,

    /// Color standard written into the output's color tags
    #[arg(long, value_enum, default_value_t = ColorStandard::Bt709)]
    pub color: ColorStandard,

    /// ffmpeg executable to invoke
    #[arg(long, env = "FIX_VIDEOS_FFMPEG", default_value = DEFAULT_FFMPEG)]
    pub ffmpeg: PathBuf,

    /// Number of files converted at once (0 = half the CPU cores)
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,

    /// Read the color tags back from each output with exiftool
    #[arg(long)]
    pub verify: bool,

    /// Write a JSON summary of the run to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Exit with status 1 when any file failed to convert
    #[arg(long)]
    pub fail_on_error: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Validate the arguments and turn them into a run configuration
    pub fn to_config(&self) -> Result<Config> {
        let extensions = if self.extensions.is_empty() {
            DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
        } else {
            let mut extensions = Vec::with_capacity(self.extensions.len());
            for ext in &self.extensions {
                let ext = ext.strip_prefix('.').unwrap_or(ext);
                if ext.is_empty() {
                    bail!("Extension must not be empty");
                }
                extensions.push(ext.to_string());
            }
            extensions
        };

        if !is_single_component(&self.output_subdir) {
            bail!(
                "Output subdirectory must be a plain directory name: {}",
                self.output_subdir
            );
        }

        if self.video_codec.trim().is_empty() {
            bail!("Video codec must not be empty");
        }

        let jobs = if self.jobs == 0 {
            (num_cpus::get() / 2).max(1)
        } else {
            self.jobs
        };

        Ok(Config {
            root: self.root.clone(),
            extensions,
            output_subdir: self.output_subdir.clone(),
            video_codec: self.video_codec.clone(),
            audio_codec: COPY_CODEC.to_string(),
            color: self.color,
            ffmpeg: self.ffmpeg.clone(),
            jobs,
            verify: self.verify,
        })
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_matches_defaults() {
        let args = Args::try_parse_from(["fix_videos"]).unwrap();
        let config = args.to_config().unwrap();
        let defaults = Config::default();

        assert_eq!(config.root, defaults.root);
        assert_eq!(config.extensions, defaults.extensions);
        assert_eq!(config.output_subdir, defaults.output_subdir);
        assert_eq!(config.video_codec, defaults.video_codec);
        assert_eq!(config.audio_codec, "copy");
        assert_eq!(config.color, ColorStandard::Bt709);
        assert_eq!(config.jobs, 1);
        assert!(!config.verify);
        assert!(!args.fail_on_error);
        assert!(args.report.is_none());
    }

    #[test]
    fn test_extensions_keep_case_and_drop_dot() {
        let args = Args::try_parse_from(["fix_videos", "-e", ".MP4", "--ext", "mkv"]).unwrap();
        let config = args.to_config().unwrap();
        assert_eq!(config.extensions, vec!["MP4", "mkv"]);
    }

    #[test]
    fn test_rejects_nested_output_subdir() {
        for bad in ["a/b", "..", ".", ""] {
            let args = Args::try_parse_from(["fix_videos", "--output-subdir", bad]).unwrap();
            assert!(args.to_config().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_zero_jobs_picks_worker_count() {
        let args = Args::try_parse_from(["fix_videos", "-j", "0"]).unwrap();
        assert!(args.to_config().unwrap().jobs >= 1);
    }

    #[test]
    fn test_color_flag() {
        let args = Args::try_parse_from(["fix_videos", "--color", "bt2020", "clips"]).unwrap();
        let config = args.to_config().unwrap();
        assert_eq!(config.color, ColorStandard::Bt2020);
        assert_eq!(config.root, PathBuf::from("clips"));
    }
}
