use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// Spinner for long replays; hidden when stderr is not a terminal
pub struct Spinner {
    bar: ProgressBar,
    started: Instant,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let bar = if console::Term::stderr().is_term() {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} ({pos})") {
                bar.set_style(style);
            }
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            ProgressBar::hidden()
        };
        bar.set_message(message.to_string());

        Self {
            bar,
            started: Instant::now(),
        }
    }

    pub fn inc(&self) {
        self.bar.inc(1);
    }

    pub fn finish(&self, message: &str) -> String {
        let elapsed = format!("{} in {}", message, HumanDuration(self.started.elapsed()));
        self.bar.finish_and_clear();
        elapsed
    }
}
