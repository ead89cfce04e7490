// Command line and environment configuration.

use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::time::Duration;

use crate::api::FileDataType;
use crate::error::Error;
use crate::upload::{FailurePolicy, PollSchedule, UploadOptions};

/// Upload activity files from a directory to Strava.
///
/// Every option can also be given as an environment variable, or in a
/// `.env` file in the working directory.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Config {
    /// User access_token from Strava (needs the activity:write scope)
    #[arg(long, env = "STRAVA_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Directory holding the activity files [default: ~/tcx]
    #[arg(long, env = "STRAVA_ACTIVITIES_DIR")]
    pub dir: Option<PathBuf>,

    /// Format of the files; also selects which file suffix is uploaded
    #[arg(long, value_enum, env = "STRAVA_DATA_TYPE", default_value_t = FileDataType::Tcx)]
    pub data_type: FileDataType,

    /// Make the new activities public instead of private
    #[arg(long)]
    pub public: bool,

    #[arg(long, env = "STRAVA_API_URL", default_value = "https://www.strava.com/api/v3")]
    pub api_url: String,

    /// Base of the activity viewer links that get logged
    #[arg(long, env = "STRAVA_WEB_URL", default_value = "https://www.strava.com")]
    pub web_url: String,

    /// Seconds to wait after an upload before the first status check
    #[arg(long, default_value_t = 5)]
    pub initial_wait_secs: u64,

    /// Keep checking the status until the activity exists, and count an
    /// upload that never gets one as a failed file
    #[arg(long)]
    pub wait_for_processing: bool,

    /// Maximum number of status checks per upload with --wait-for-processing
    #[arg(long, default_value_t = 5)]
    pub poll_attempts: u32,

    /// Backoff step in seconds between status checks
    #[arg(long, default_value_t = 2)]
    pub poll_backoff_secs: u64,

    /// Continue with the next file when one fails, and report at the end
    #[arg(long)]
    pub keep_going: bool,

    /// Look up the athlete the token belongs to before uploading
    #[arg(long)]
    pub check_athlete: bool,
}

/// Rewrite Go-style single-dash long flags (`-token abc`, `-dir=x`) to the
/// `--token` form clap expects. Only names of known long options are touched.
pub fn normalize_args<I, S>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let cmd = Config::command();
    let longs: Vec<&str> = cmd.get_arguments().filter_map(|a| a.get_long()).collect();
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            let Some(rest) = arg.strip_prefix('-') else {
                return arg;
            };
            if rest.starts_with('-') {
                return arg;
            }
            let name = rest.split('=').next().unwrap_or(rest);
            if longs.contains(&name) || matches!(name, "help" | "version") {
                format!("-{arg}")
            } else {
                arg
            }
        })
        .collect()
}

impl Config {
    /// Parse the process arguments; exits with usage on malformed input.
    pub fn from_args() -> Self {
        Self::parse_from(normalize_args(std::env::args()))
    }

    /// The access token, which must be present and non-blank.
    pub fn token(&self) -> Result<&str, Error> {
        match self.token.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => Ok(t),
            _ => Err(Error::MissingToken),
        }
    }

    pub fn activities_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("tcx")
        })
    }

    pub fn upload_options(&self) -> UploadOptions {
        UploadOptions {
            data_type: self.data_type,
            private: !self.public,
            web_url: self.web_url.clone(),
            poll: PollSchedule {
                initial_wait: Duration::from_secs(self.initial_wait_secs),
                attempts: if self.wait_for_processing {
                    self.poll_attempts
                } else {
                    1
                },
                backoff: Duration::from_secs(self.poll_backoff_secs),
            },
            wait_for_processing: self.wait_for_processing,
            policy: if self.keep_going {
                FailurePolicy::Continue
            } else {
                FailurePolicy::Abort
            },
        }
    }

    pub fn help() -> String {
        Config::command().render_help().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_dash_long_flags_are_normalized() {
        let args = normalize_args(["uploader", "-token", "abc", "-dir=/tmp/x", "-h", "--public", "-5"]);
        assert_eq!(
            args,
            vec!["uploader", "--token", "abc", "--dir=/tmp/x", "-h", "--public", "-5"]
        );
    }

    #[test]
    fn go_style_token_flag() {
        let config = Config::try_parse_from(normalize_args(["uploader", "-token", "abc"])).unwrap();
        assert_eq!(config.token().unwrap(), "abc");
        let opts = config.upload_options();
        assert!(opts.private);
        assert_eq!(opts.data_type, FileDataType::Tcx);
        assert_eq!(opts.policy, FailurePolicy::Abort);
        assert_eq!(opts.poll, PollSchedule::default());
        assert!(!opts.wait_for_processing);
    }

    #[test]
    fn empty_token_is_missing() {
        let config = Config::try_parse_from(["uploader", "--token", "  "]).unwrap();
        assert!(matches!(config.token(), Err(Error::MissingToken)));
    }

    #[test]
    fn options_are_mapped() {
        let config = Config::try_parse_from([
            "uploader",
            "--token",
            "abc",
            "--dir",
            "/data/runs",
            "--data-type",
            "fit.gz",
            "--public",
            "--keep-going",
            "--poll-attempts",
            "2",
        ])
        .unwrap();
        assert_eq!(config.activities_dir(), PathBuf::from("/data/runs"));
        let opts = config.upload_options();
        assert!(!opts.private);
        assert_eq!(opts.data_type, FileDataType::FitGz);
        assert_eq!(opts.policy, FailurePolicy::Continue);
        assert_eq!(opts.poll.attempts, 1);
    }

    #[test]
    fn poll_attempts_need_wait_for_processing() {
        let config = Config::try_parse_from([
            "uploader",
            "--token",
            "abc",
            "--wait-for-processing",
            "--poll-attempts",
            "2",
        ])
        .unwrap();
        let opts = config.upload_options();
        assert!(opts.wait_for_processing);
        assert_eq!(opts.poll.attempts, 2);
    }
}
