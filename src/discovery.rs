//! Recursive discovery of the video files a run will convert.

use log::{debug, warn};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// A discovered input file. The file name is always present.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct VideoFile {
    path: PathBuf,
}

impl VideoFile {
    /// Wrap a path, rejecting paths without a file name (`/`, `..`)
    pub fn new(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        path.file_name()?;
        Some(VideoFile { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn parent(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn file_name(&self) -> &OsStr {
        // Checked in `new`
        self.path.file_name().unwrap_or_default()
    }
}

/// Find every file under `root` whose extension exactly matches one of `extensions`.
///
/// Directories called `skip_dir` are not entered, so converted copies from an
/// earlier run are never picked up as inputs. Hidden files and directories are
/// ignored. A missing root yields an empty list. Results are sorted by path.
pub fn find_video_files(root: &Path, extensions: &[String], skip_dir: &str) -> Vec<VideoFile> {
    if !root.is_dir() {
        debug!("Root {} is not a directory, nothing to scan", root.display());
        return Vec::new();
    }

    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !should_prune(entry, skip_dir));

    for entry_result in walker {
        let entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                if let Some(path) = err.path() {
                    warn!("Failed to access {}: {}", path.display(), err);
                } else {
                    warn!("Directory walk error: {}", err);
                }
                continue;
            }
        };

        let path = entry.path();

        // Follows symlinks to files
        if !path.is_file() {
            continue;
        }

        if !has_extension(path, extensions) {
            continue;
        }

        if let Some(file) = VideoFile::new(path) {
            debug!("Found video: {}", path.display());
            files.push(file);
        }
    }

    files.sort();
    files
}

fn should_prune(entry: &DirEntry, skip_dir: &str) -> bool {
    let name = entry.file_name();
    if name.to_str().map_or(false, |n| n.starts_with('.')) {
        return true;
    }
    entry.file_type().is_dir() && name == OsStr::new(skip_dir)
}

/// Case-sensitive extension match
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |ext| extensions.iter().any(|candidate| candidate == ext))
}
