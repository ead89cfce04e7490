// Sleeping between remote calls, with a spinner on a terminal.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Pause between talking to the service. Tests swap in an implementation
/// that only records the requested durations.
pub trait Wait {
    fn wait(&mut self, reason: &str, duration: Duration);
}

/// Blocks the thread for the full duration, showing a spinner on a terminal.
#[derive(Debug, Default)]
pub struct SleepWait {
    pub spinner: bool,
}

impl Wait for SleepWait {
    fn wait(&mut self, reason: &str, duration: Duration) {
        log::debug!("[{reason}] wait {duration:?}");
        if !self.spinner {
            std::thread::sleep(duration);
            return;
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} ({elapsed})") {
            pb.set_style(style);
        }
        pb.set_message(reason.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        std::thread::sleep(duration);
        pb.finish_and_clear();
    }
}

/// Records every requested wait instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordedWait {
    pub waits: Vec<Duration>,
}

impl Wait for RecordedWait {
    fn wait(&mut self, _reason: &str, duration: Duration) {
        self.waits.push(duration);
    }
}
