// Errors shared by enumeration, the API client and the upload loop.

use std::path::PathBuf;

use crate::api::ApiError;

/// Everything that can stop a file from being uploaded, or the whole run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No access token on the command line or in the environment.
    #[error("No access token provided")]
    MissingToken,
    /// The activities directory could not be listed.
    #[error("Activity files cannot be found in {path:?}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read file {path:?}: {source}")]
    OpenFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Error sending file: {0}")]
    Api(#[from] ApiError),
    /// Processing finished but the service refused the file.
    #[error("Upload {id} was rejected: {message}")]
    UploadRejected { id: i64, message: String },
    /// The upload was still being processed after the last status query.
    #[error("Upload {id} still processing after {attempts} status checks")]
    PollTimeout { id: i64, attempts: u32 },
}

impl Error {
    /// Remediation hint to log next to the error, if there is one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Api(e) if e.is_authorization() => Some(
                "Make sure your token has 'write' permissions. You'll need implement the oauth process to get one",
            ),
            Self::MissingToken => {
                Some("Please provide an access_token, one can be found at https://www.strava.com/settings/api")
            }
            _ => None,
        }
    }
}
