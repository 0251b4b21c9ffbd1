use anyhow::Result;
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, info, warn};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use crate::config::Config;
use crate::discovery::{find_video_files, VideoFile};
use crate::encoder::{EncodeJob, Encoder};
use crate::failed::{describe_error, handle_failed_file, FailedConversion};
use crate::metadata::{ExifToolVerifiers, Verifier, VerifierFactory};
use crate::task::{ConversionTask, TaskStatus};

/// Result of converting a single file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Skipped,
    Failed(String),
}

impl Outcome {
    pub fn status(&self) -> TaskStatus {
        match self {
            Outcome::Succeeded => TaskStatus::Succeeded,
            Outcome::Skipped => TaskStatus::Skipped,
            Outcome::Failed(_) => TaskStatus::Failed,
        }
    }
}

/// Counts and per-file results for one run
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub root: PathBuf,
    pub total_files: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<FailedConversion>,
    pub tasks: Vec<ConversionTask>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchSummary {
    pub fn new(root: &Path) -> Self {
        let now = Utc::now();
        BatchSummary {
            root: root.to_path_buf(),
            total_files: 0,
            succeeded: 0,
            skipped: 0,
            failed: 0,
            failures: Vec::new(),
            tasks: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    /// Count a finished task and print its status line
    pub fn record(&mut self, mut task: ConversionTask, outcome: Outcome) {
        task.status = outcome.status();

        match &outcome {
            Outcome::Succeeded => {
                self.succeeded += 1;
                println!("Successfully processed: {}", task.input().display());
            }
            Outcome::Skipped => {
                self.skipped += 1;
                println!("Skipping {} - already processed", task.input().display());
            }
            Outcome::Failed(message) => {
                self.failed += 1;
                handle_failed_file(task.input(), message, &mut self.failures);
            }
        }

        self.tasks.push(task);
    }

    /// Process exit status. Failures only count when the caller asks for it.
    pub fn exit_code(&self, fail_on_error: bool) -> i32 {
        if fail_on_error && self.failed > 0 {
            1
        } else {
            0
        }
    }

    fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    pub fn print(&self) {
        println!();
        println!("=== PROCESSING COMPLETE ===");
        println!("Total video files found: {}", self.total_files);
        println!("Successfully processed: {}", self.succeeded);
        println!("Skipped (already processed): {}", self.skipped);
        println!("Failed: {}", self.failed);

        let elapsed = self.finished_at - self.started_at;
        println!("Elapsed: {}s", elapsed.num_seconds());

        if !self.failures.is_empty() {
            println!();
            println!("=== FAILED FILES ===");
            for failure in &self.failures {
                println!("{}", failure.path.display());
                println!("   → {}", failure.message);
            }
        }
    }
}

/// Finds the videos under the configured root and converts each one
pub struct Processor {
    config: Config,
    encoder: Arc<dyn Encoder>,
    verifiers: Arc<dyn VerifierFactory>,
}

impl Processor {
    /// Outputs are checked with exiftool when `config.verify` is set
    pub fn new(config: Config, encoder: Arc<dyn Encoder>) -> Self {
        let verifiers = Arc::new(ExifToolVerifiers::new(config.color));
        Processor {
            config,
            encoder,
            verifiers,
        }
    }

    /// Replace the exiftool-backed verifiers used with `config.verify`
    pub fn with_verifiers(mut self, verifiers: Arc<dyn VerifierFactory>) -> Self {
        self.verifiers = verifiers;
        self
    }

    /// Convert everything under the root. Per-file failures end up in the
    /// summary; an error here means the batch could not start at all.
    pub fn run(&self) -> Result<BatchSummary> {
        let mut summary = BatchSummary::new(&self.config.root);

        debug!(
            "Scanning {} for {:?}",
            self.config.root.display(),
            self.config.extensions
        );
        let files = find_video_files(
            &self.config.root,
            &self.config.extensions,
            &self.config.output_subdir,
        );

        if files.is_empty() {
            println!(
                "No video files found in {} directory",
                self.config.root.display()
            );
            summary.finish();
            return Ok(summary);
        }

        summary.total_files = files.len();
        println!("Found {} video files to process", files.len());

        if self.config.jobs > 1 && files.len() > 1 {
            self.process_files_parallel(files, &mut summary);
        } else {
            self.process_files_sequential(files, &mut summary);
        }

        summary.finish();
        summary.print();
        Ok(summary)
    }

    /// Convert one file: create the output directory, skip if the output
    /// exists, otherwise encode (and verify when a verifier is given).
    /// A failed encode or verification leaves no output behind.
    pub fn convert(
        &self,
        file: &VideoFile,
        verifier: Option<&mut dyn Verifier>,
    ) -> (ConversionTask, Outcome) {
        let task = ConversionTask::new(file, &self.config.output_subdir);
        let outcome = self.convert_task(&task, verifier);
        (task, outcome)
    }

    fn convert_task(&self, task: &ConversionTask, verifier: Option<&mut dyn Verifier>) -> Outcome {
        if let Err(e) = fs::create_dir_all(&task.output_dir) {
            return Outcome::Failed(format!(
                "failed to create output directory {}: {}",
                task.output_dir.display(),
                e
            ));
        }

        if task.output.exists() {
            return Outcome::Skipped;
        }

        println!("Processing: {}", task.input().display());

        let job = EncodeJob {
            input: task.input.clone(),
            output: task.output.clone(),
            video_codec: self.config.video_codec.clone(),
            audio_codec: self.config.audio_codec.clone(),
            color: self.config.color,
            overwrite: true,
        };

        if let Err(e) = self.encoder.encode(&job) {
            discard_output(&task.output);
            return Outcome::Failed(describe_error(&e));
        }

        if let Some(verifier) = verifier {
            if let Err(e) = verifier.verify(&task.output) {
                discard_output(&task.output);
                return Outcome::Failed(format!("color check failed: {}", describe_error(&e)));
            }
            debug!("Verified color tags of {}", task.output.display());
        }

        Outcome::Succeeded
    }

    /// `Ok(None)` when verification is off; `Err` carries the per-file failure message
    fn start_verifier(&self, worker_id: usize) -> Result<Option<Box<dyn Verifier>>, String> {
        if !self.config.verify {
            return Ok(None);
        }

        match self.verifiers.create() {
            Ok(verifier) => Ok(Some(verifier)),
            Err(e) => {
                warn!("Worker {}: {}", worker_id, e);
                Err(format!("color check failed: {}", describe_error(&e)))
            }
        }
    }

    /// A file that is never encoded because its outputs could not be verified
    fn unverifiable(&self, file: &VideoFile, message: &str) -> (ConversionTask, Outcome) {
        let task = ConversionTask::new(file, &self.config.output_subdir);
        (task, Outcome::Failed(message.to_string()))
    }

    fn process_files_sequential(&self, files: Vec<VideoFile>, summary: &mut BatchSummary) {
        let mut verifier = match self.start_verifier(0) {
            Ok(verifier) => verifier,
            Err(message) => {
                for file in &files {
                    let (task, outcome) = self.unverifiable(file, &message);
                    summary.record(task, outcome);
                }
                return;
            }
        };

        for file in &files {
            let (task, outcome) = self.convert(file, borrow_verifier(&mut verifier));
            summary.record(task, outcome);
        }
    }

    fn process_files_parallel(&self, files: Vec<VideoFile>, summary: &mut BatchSummary) {
        let num_workers = self.config.jobs.min(files.len());
        info!("Starting {} worker threads", num_workers);

        let (work_sender, work_receiver) = bounded::<VideoFile>(num_workers * 2);
        let (result_sender, result_receiver) =
            bounded::<(ConversionTask, Outcome)>(num_workers * 2);

        thread::scope(|scope| {
            for worker_id in 0..num_workers {
                let work_rx = work_receiver.clone();
                let result_tx = result_sender.clone();
                scope.spawn(move || self.worker(worker_id, work_rx, result_tx));
            }

            // Only the workers hold these now
            drop(work_receiver);
            drop(result_sender);

            scope.spawn(move || {
                for file in files {
                    if work_sender.send(file).is_err() {
                        break;
                    }
                }
            });

            for (task, outcome) in result_receiver {
                summary.record(task, outcome);
            }
        });
    }

    fn worker(
        &self,
        worker_id: usize,
        work_receiver: Receiver<VideoFile>,
        result_sender: Sender<(ConversionTask, Outcome)>,
    ) {
        let mut verifier = match self.start_verifier(worker_id) {
            Ok(verifier) => verifier,
            Err(message) => {
                for file in work_receiver {
                    if result_sender.send(self.unverifiable(&file, &message)).is_err() {
                        break;
                    }
                }
                return;
            }
        };

        for file in work_receiver {
            debug!("Worker {}: {}", worker_id, file.path().display());
            let result = self.convert(&file, borrow_verifier(&mut verifier));
            if result_sender.send(result).is_err() {
                break;
            }
        }
    }
}

fn borrow_verifier(verifier: &mut Option<Box<dyn Verifier>>) -> Option<&mut dyn Verifier> {
    match verifier {
        Some(v) => {
            let v: &mut dyn Verifier = v.as_mut();
            Some(v)
        }
        None => None,
    }
}

/// Remove whatever a failed encode or verification left at `path`
fn discard_output(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed incomplete output {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove incomplete output {}: {}", path.display(), e),
    }
}
