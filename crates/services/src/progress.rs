use std::sync::Arc;

use exam_core::model::{Attempt, ChartPoint, UserId, UserSummary};
use remote::AttemptStore;
use tracing::instrument;

use crate::error::ProgressError;

/// Read-only views over a user's past attempts.
#[derive(Clone)]
pub struct ProgressService {
    attempts: Arc<dyn AttemptStore>,
}

impl ProgressService {
    #[must_use]
    pub fn new(attempts: Arc<dyn AttemptStore>) -> Self {
        Self { attempts }
    }

    /// Attempt count, best score and average score.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Remote` if the lookup fails.
    #[instrument(skip(self))]
    pub async fn summary(&self, user_id: UserId) -> Result<UserSummary, ProgressError> {
        Ok(self.attempts.user_summary(user_id).await?)
    }

    /// Attempts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Remote` if the lookup fails.
    #[instrument(skip(self))]
    pub async fn attempts(&self, user_id: UserId) -> Result<Vec<Attempt>, ProgressError> {
        Ok(self.attempts.user_attempts(user_id).await?)
    }

    /// Scores in chronological order.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Remote` if the lookup fails.
    #[instrument(skip(self))]
    pub async fn chart(&self, user_id: UserId) -> Result<Vec<ChartPoint>, ProgressError> {
        Ok(self.attempts.chart_series(user_id).await?)
    }
}
