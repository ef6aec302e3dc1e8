//! Console Presenter
//!
//! `Presenter` for headless use: alerts go to stderr, confirmations are
//! answered from a fixed policy, navigation is only logged.

use std::sync::Mutex;

use async_trait::async_trait;

use step_analysis_core::Presenter;

pub struct ConsolePresenter {
    assume_yes: bool,
    location: Mutex<Option<String>>,
}

impl ConsolePresenter {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            location: Mutex::new(None),
        }
    }

    /// Last page navigated to.
    pub fn location(&self) -> Option<String> {
        self.location.lock().ok().and_then(|location| location.clone())
    }
}

#[async_trait]
impl Presenter for ConsolePresenter {
    async fn alert(&self, message: &str) {
        tracing::warn!("[Presenter] Alert: {}", message);
        eprintln!("{}", message);
    }

    async fn confirm(&self, message: &str) -> bool {
        tracing::info!(answer = self.assume_yes, "[Presenter] Confirm: {}", message);
        self.assume_yes
    }

    async fn navigate(&self, path: &str, replace: bool) {
        tracing::info!(replace, "[Presenter] Navigate to {}", path);
        if let Ok(mut location) = self.location.lock() {
            *location = Some(path.to_string());
        }
    }
}
