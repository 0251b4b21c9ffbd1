use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::discovery::VideoFile;

/// Directory that receives the converted copy of `input`
pub fn output_dir_for(input: &VideoFile, output_subdir: &str) -> PathBuf {
    input.parent().join(output_subdir)
}

/// `<input_dir>/<output_subdir>/<input_filename>`
pub fn output_path_for(input: &VideoFile, output_subdir: &str) -> PathBuf {
    output_dir_for(input, output_subdir).join(input.file_name())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Skipped,
    Succeeded,
    Failed,
}

/// One input file and where its converted copy goes
#[derive(Debug, Clone, Serialize)]
pub struct ConversionTask {
    pub input: PathBuf,
    #[serde(skip)]
    pub output_dir: PathBuf,
    pub output: PathBuf,
    pub status: TaskStatus,
}

impl ConversionTask {
    pub fn new(input: &VideoFile, output_subdir: &str) -> Self {
        ConversionTask {
            input: input.path().to_path_buf(),
            output_dir: output_dir_for(input, output_subdir),
            output: output_path_for(input, output_subdir),
            status: TaskStatus::Pending,
        }
    }

    pub fn input(&self) -> &Path {
        &self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_is_sibling_fixed_dir() {
        let input = VideoFile::new("Assets/Videos/sub/a.mp4").unwrap();
        assert_eq!(
            output_path_for(&input, "fixed"),
            PathBuf::from("Assets/Videos/sub/fixed/a.mp4")
        );
        assert_eq!(
            output_dir_for(&input, "fixed"),
            PathBuf::from("Assets/Videos/sub/fixed")
        );
    }

    #[test]
    fn test_output_path_keeps_file_name() {
        let input = VideoFile::new("clip.final.MOV").unwrap();
        assert_eq!(
            output_path_for(&input, "converted"),
            PathBuf::from("converted/clip.final.MOV")
        );
    }

    #[test]
    fn test_new_task_is_pending() {
        let input = VideoFile::new("Assets/Videos/a.avi").unwrap();
        let task = ConversionTask::new(&input, "fixed");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.input(), Path::new("Assets/Videos/a.avi"));
        assert_eq!(task.output, PathBuf::from("Assets/Videos/fixed/a.avi"));
    }
}
