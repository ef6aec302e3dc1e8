//! Presenter Trait
//!
//! The user-facing side effects coordinators may trigger: blocking alerts,
//! confirmation prompts and navigation.

use async_trait::async_trait;

/// Question asked before deleting a persisted analysis.
pub const DELETE_CONFIRMATION: &str =
    "Are you sure you want to delete this analysis? You will not be able to retrieve it later.";

#[async_trait]
pub trait Presenter: Send + Sync {
    /// Surface a write-path failure to the user.
    async fn alert(&self, message: &str);

    /// Ask the user a yes/no question.
    async fn confirm(&self, message: &str) -> bool;

    /// Move to an internal page, replacing the current history entry when
    /// `replace` is set.
    async fn navigate(&self, path: &str, replace: bool);
}

/// Internal page of a saved analysis.
pub fn analysis_page_path(strategy_id: i64, step_id: i64, analysis_id: i64) -> String {
    format!(
        "/workspace/strategies/{}/{}/analysis:{}",
        strategy_id, step_id, analysis_id
    )
}
