use crate::core::domain::model::repair_issue::RepairIssue;
use async_trait::async_trait;

/// The host platform's repair issue registry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueRegistry: Send + Sync {
    /// Creates the issue, replacing any issue with the same id.
    async fn create(&self, issue: RepairIssue);

    /// Deletes the issue; unknown ids are ignored.
    async fn delete(&self, issue_id: &str);

    async fn get(&self, issue_id: &str) -> Option<RepairIssue>;

    /// Every open issue, ordered by id.
    async fn list(&self) -> Vec<RepairIssue>;
}
