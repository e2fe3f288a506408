mod answers;
mod attempt;
mod catalog;
mod cursor;
mod ids;
mod question;
mod review;
mod score;

pub use answers::{AnswerSheet, AnswerTracker};
pub use attempt::{Attempt, AttemptDetailEntry, ChartPoint, UserSummary, answers_match};
pub use catalog::{CatalogEntry, TestCatalog};
pub use cursor::{Cursor, Step};
pub use ids::{AttemptId, ParseIdError, QuestionId, TestId, UserId};
pub use question::{Question, QuestionError, Test, option_label};
pub use review::{
    AttemptReview, OptionMark, ReviewItem, ReviewOutcome, merge_attempt, merge_score,
};
pub use score::{QuestionResult, Score};
