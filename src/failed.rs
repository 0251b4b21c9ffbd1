use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};

/// A file that could not be converted, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedConversion {
    pub path: PathBuf,
    pub message: String,
}

/// Report a failed file on the console and remember it for the summary
pub fn handle_failed_file(file_path: &Path, message: &str, failures: &mut Vec<FailedConversion>) {
    println!("Error processing {}: {}", file_path.display(), message);

    failures.push(FailedConversion {
        path: file_path.to_path_buf(),
        message: message.to_string(),
    });
}

/// Render an error with its whole source chain, `outer: inner: root`
pub fn describe_error(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        let cause_text = cause.to_string();
        // thiserror messages often already embed their source
        if !message.ends_with(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }

    message
}
