use exam_core::model::{Attempt, AttemptId, ChartPoint, TestCatalog, UserSummary};

use crate::vm::time_fmt::{format_average, format_datetime};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardVm {
    pub attempts: u32,
    pub best: String,
    pub average: String,
}

impl From<&UserSummary> for DashboardVm {
    fn from(summary: &UserSummary) -> Self {
        Self {
            attempts: summary.attempts,
            best: summary
                .best
                .map_or_else(|| "-".to_owned(), |b| b.to_string()),
            average: format_average(summary.average_score),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttemptRowVm {
    pub id: AttemptId,
    pub title: String,
    pub attempted_at: String,
    pub score: String,
}

impl AttemptRowVm {
    #[must_use]
    pub fn new(attempt: &Attempt, catalog: &TestCatalog) -> Self {
        Self {
            id: attempt.id,
            title: catalog.title(&attempt.test_id).to_owned(),
            attempted_at: format_datetime(attempt.attempted_at),
            score: format!("{} / {}", attempt.score, attempt.total_questions),
        }
    }
}

#[must_use]
pub fn map_attempt_rows(attempts: &[Attempt], catalog: &TestCatalog) -> Vec<AttemptRowVm> {
    attempts
        .iter()
        .map(|a| AttemptRowVm::new(a, catalog))
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartPointVm {
    pub label: String,
    pub score: u32,
}

/// Score series as labelled points; plotting is left to the front-end.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChartVm {
    pub points: Vec<ChartPointVm>,
    pub max_score: u32,
}

impl ChartVm {
    #[must_use]
    pub fn new(series: &[ChartPoint]) -> Self {
        let points = series
            .iter()
            .map(|p| ChartPointVm {
                label: format_datetime(p.attempted_at),
                score: p.score,
            })
            .collect();
        Self {
            points,
            max_score: series.iter().map(|p| p.score).max().unwrap_or(0),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
