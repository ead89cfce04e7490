// Upload orchestration: one file at a time, submit, wait, poll, report.

use serde::Serialize;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

use crate::api::{Athlete, AthleteApi, FileDataType, UploadApi, UploadRequest, UploadState, UploadSummary};
use crate::error::Error;
use crate::files::{activity_files, ActivityFile};
use crate::waiting::Wait;

/// What to do with the remaining files once one of them fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the run on the first failing file.
    #[default]
    Abort,
    /// Record the failure and move on to the next file.
    Continue,
}

/// How long to wait for the service to process an upload.
///
/// After `initial_wait` the status is queried up to `attempts` times; the
/// n-th retry waits `n * backoff` first. Polling stops on the first terminal
/// status. The default is a single query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSchedule {
    pub initial_wait: Duration,
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            initial_wait: Duration::from_secs(5),
            attempts: 1,
            backoff: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub data_type: FileDataType,
    pub private: bool,
    /// Base of the activity viewer URL, e.g. `https://www.strava.com`.
    pub web_url: String,
    pub poll: PollSchedule,
    /// Treat an upload without an activity after the last status query as a
    /// failed file. Off by default: the status is logged and the run moves on.
    pub wait_for_processing: bool,
    pub policy: FailurePolicy,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            data_type: FileDataType::Tcx,
            private: true,
            web_url: "https://www.strava.com".into(),
            poll: PollSchedule::default(),
            wait_for_processing: false,
            policy: FailurePolicy::Abort,
        }
    }
}

impl UploadOptions {
    pub fn activity_url(&self, activity_id: i64) -> String {
        format!("{}/activities/{activity_id}", self.web_url.trim_end_matches('/'))
    }
}

/// A file the service acknowledged. `activity_id` is unset when processing
/// hadn't finished by the last status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedUpload {
    pub file: String,
    pub upload_id: i64,
    pub activity_id: Option<i64>,
}

#[derive(Debug)]
pub struct FailedUpload {
    pub file: String,
    pub error: Error,
}

/// Outcome of a run over a directory.
#[derive(Debug, Default)]
pub struct RunReport {
    pub completed: Vec<CompletedUpload>,
    pub failed: Vec<FailedUpload>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Service handles and options, built once at startup and passed to every
/// step of the run.
pub struct Context<U, A, W> {
    pub options: UploadOptions,
    pub uploads: U,
    pub athlete: A,
    pub wait: W,
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}

impl<U: UploadApi, A: AthleteApi, W: Wait> Context<U, A, W> {
    pub fn new(options: UploadOptions, uploads: U, athlete: A, wait: W) -> Self {
        Self {
            options,
            uploads,
            athlete,
            wait,
        }
    }

    /// Look up the account the token belongs to.
    pub fn check_athlete(&self) -> Result<Athlete, Error> {
        let athlete = self.athlete.current_athlete()?;
        log::info!(
            "Uploading as athlete {} ({} {})",
            athlete.id,
            athlete.firstname.as_deref().unwrap_or_default(),
            athlete.lastname.as_deref().unwrap_or_default(),
        );
        Ok(athlete)
    }

    /// Enumerate `dir` and upload every matching file.
    pub fn upload_dir(&mut self, dir: &Path) -> Result<RunReport, Error> {
        let files = activity_files(dir, &self.options.data_type.extension())?;
        if files.is_empty() {
            log::info!("No {} files found in {dir:?}", self.options.data_type.extension());
        }
        self.run(&files)
    }

    /// Upload `files` in order, applying the failure policy to each error.
    pub fn run(&mut self, files: &[ActivityFile]) -> Result<RunReport, Error> {
        let mut report = RunReport::default();
        for file in files {
            match self.upload_file(file) {
                Ok(done) => report.completed.push(done),
                Err(error) => {
                    if let Some(hint) = error.hint() {
                        log::warn!("{hint}");
                    }
                    log::error!("{}: {error}", file.name);
                    match self.options.policy {
                        FailurePolicy::Abort => return Err(error),
                        FailurePolicy::Continue => report.failed.push(FailedUpload {
                            file: file.name.clone(),
                            error,
                        }),
                    }
                }
            }
        }
        Ok(report)
    }

    /// Submit one file, wait, query its status and report the activity.
    pub fn upload_file(&mut self, file: &ActivityFile) -> Result<CompletedUpload, Error> {
        log::info!("Uploading file {}", file.name);

        let path = file.path();
        let reader = File::open(&path).map_err(|source| Error::OpenFile {
            path: path.clone(),
            source,
        })?;
        let req = UploadRequest {
            data_type: self.options.data_type,
            name: &file.name,
            private: self.options.private,
        };
        let upload = self.uploads.create_upload(&req, reader)?;
        log::info!("Upload Complete...");
        log::info!("{}", to_json(&upload));

        let summary = self.poll_upload(upload.id)?;
        match summary.state() {
            UploadState::Ready(activity_id) => {
                log::info!("Your new activity is id {activity_id}");
                log::info!("You can view it at {}", self.options.activity_url(activity_id));
            }
            UploadState::Failed(message) if self.options.wait_for_processing => {
                return Err(Error::UploadRejected {
                    id: upload.id,
                    message,
                })
            }
            UploadState::Processing if self.options.wait_for_processing => {
                return Err(Error::PollTimeout {
                    id: upload.id,
                    attempts: self.options.poll.attempts.max(1),
                })
            }
            UploadState::Failed(message) => {
                log::warn!("Upload {} has no activity: {message}", upload.id);
            }
            UploadState::Processing => {
                log::warn!(
                    "Upload {} has no activity id yet ({})",
                    upload.id,
                    summary.status.as_deref().unwrap_or("no status")
                );
            }
        }

        Ok(CompletedUpload {
            file: file.name.clone(),
            upload_id: upload.id,
            activity_id: summary.activity_id,
        })
    }

    /// Wait, then query the status until it is terminal or attempts run out.
    /// Returns the last summary seen.
    pub fn poll_upload(&mut self, id: i64) -> Result<UploadSummary, Error> {
        let poll = self.options.poll.clone();
        log::info!(
            "Waiting {}s so the upload will finish (might not)",
            poll.initial_wait.as_secs()
        );
        self.wait.wait("waiting for upload processing", poll.initial_wait);

        let attempts = poll.attempts.max(1);
        let mut attempt = 1;
        loop {
            let summary = self.uploads.get_upload(id)?;
            log::info!("{}", to_json(&summary));
            if summary.state() != UploadState::Processing || attempt >= attempts {
                return Ok(summary);
            }
            log::info!(
                "Upload {id} still processing ({}), check {attempt} of {attempts}",
                summary.status.as_deref().unwrap_or("no status")
            );
            self.wait
                .wait("waiting for upload processing", poll.backoff.saturating_mul(attempt));
            attempt += 1;
        }
    }
}
