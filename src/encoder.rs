//! The external encoding collaborator.
//!
//! The converter only depends on the [`Encoder`] trait. [`FfmpegEncoder`] is
//! the production implementation and shells out to `ffmpeg` once per file.

use log::debug;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

use crate::config::ColorStandard;

/// Number of trailing stderr lines kept in an error message
const STDERR_TAIL_LINES: usize = 5;

/// Everything the encoder needs for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub video_codec: String,
    pub audio_codec: String,
    pub color: ColorStandard,
    pub overwrite: bool,
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("ffmpeg {status}: {message}")]
    Failed { status: ExitStatus, message: String },
}

pub trait Encoder: Send + Sync {
    /// Convert `job.input` into `job.output`, blocking until done
    fn encode(&self, job: &EncodeJob) -> Result<(), EncodeError>;
}

pub struct FfmpegEncoder {
    program: PathBuf,
}

impl FfmpegEncoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        FfmpegEncoder {
            program: program.into(),
        }
    }

    /// Command line arguments for `job`, without the program name
    pub fn build_args(job: &EncodeJob) -> Vec<OsString> {
        let overwrite = if job.overwrite { "-y" } else { "-n" };

        let mut args: Vec<OsString> =
            ["-hide_banner", "-nostdin", "-loglevel", "error", overwrite, "-i"]
                .into_iter()
                .map(OsString::from)
                .collect();
        args.push(job.input.as_os_str().to_owned());

        args.extend(
            [
                "-c:v",
                job.video_codec.as_str(),
                "-c:a",
                job.audio_codec.as_str(),
                "-color_primaries",
                job.color.primaries(),
                "-color_trc",
                job.color.transfer(),
                "-colorspace",
                job.color.matrix(),
            ]
            .into_iter()
            .map(OsString::from),
        );

        args.push(job.output.as_os_str().to_owned());
        args
    }

    fn command(&self, job: &EncodeJob) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(Self::build_args(job))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }
}

impl Encoder for FfmpegEncoder {
    fn encode(&self, job: &EncodeJob) -> Result<(), EncodeError> {
        let mut cmd = self.command(job);
        debug!("Running {:?}", cmd);

        let output = cmd.output().map_err(|source| EncodeError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(EncodeError::Failed {
            status: output.status,
            message: stderr_tail(&stderr, STDERR_TAIL_LINES),
        })
    }
}

/// Last `max_lines` non-empty lines of `stderr`, joined with "; "
pub fn stderr_tail(stderr: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    if lines.is_empty() {
        return "no error output".to_string();
    }

    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> EncodeJob {
        EncodeJob {
            input: PathBuf::from("Assets/Videos/a.mp4"),
            output: PathBuf::from("Assets/Videos/fixed/a.mp4"),
            video_codec: "libx264".to_string(),
            audio_codec: "copy".to_string(),
            color: ColorStandard::Bt709,
            overwrite: true,
        }
    }

    fn args_as_strings(job: &EncodeJob) -> Vec<String> {
        FfmpegEncoder::build_args(job)
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn value_after(args: &[String], flag: &str) -> Option<String> {
        let pos = args.iter().position(|a| a == flag)?;
        args.get(pos + 1).cloned()
    }

    #[test]
    fn test_build_args_forces_color_tags() {
        let args = args_as_strings(&job());
        assert_eq!(value_after(&args, "-color_primaries").as_deref(), Some("bt709"));
        assert_eq!(value_after(&args, "-color_trc").as_deref(), Some("bt709"));
        assert_eq!(value_after(&args, "-colorspace").as_deref(), Some("bt709"));
    }

    #[test]
    fn test_build_args_codecs_and_paths() {
        let args = args_as_strings(&job());
        assert_eq!(value_after(&args, "-i").as_deref(), Some("Assets/Videos/a.mp4"));
        assert_eq!(value_after(&args, "-c:v").as_deref(), Some("libx264"));
        assert_eq!(value_after(&args, "-c:a").as_deref(), Some("copy"));
        assert!(args.contains(&"-y".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("Assets/Videos/fixed/a.mp4"));
    }

    #[test]
    fn test_build_args_without_overwrite() {
        let mut job = job();
        job.overwrite = false;
        let args = args_as_strings(&job);
        assert!(args.contains(&"-n".to_string()));
        assert!(!args.contains(&"-y".to_string()));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let encoder = FfmpegEncoder::new("surely-not-an-ffmpeg-binary-42");
        match encoder.encode(&job()) {
            Err(EncodeError::Spawn { program, .. }) => {
                assert_eq!(program, "surely-not-an-ffmpeg-binary-42")
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_failure() {
        let encoder = FfmpegEncoder::new("false");
        match encoder.encode(&job()) {
            Err(EncodeError::Failed { status, message }) => {
                assert!(!status.success());
                assert_eq!(message, "no error output");
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_stderr_tail() {
        let stderr = "line one\n\n  line two  \nline three\n";
        assert_eq!(stderr_tail(stderr, 2), "line two; line three");
        assert_eq!(stderr_tail(stderr, 10), "line one; line two; line three");
        assert_eq!(stderr_tail("  \n", 3), "no error output");
    }
}
