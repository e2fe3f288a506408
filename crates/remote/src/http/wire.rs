use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDateTime, Utc};
use exam_core::model::{
    AnswerSheet, Attempt, AttemptDetailEntry, AttemptId, ChartPoint, Question, QuestionId,
    QuestionResult, Score, TestId, UserSummary,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::repository::RemoteError;

fn decode<E: core::fmt::Display>(e: E) -> RemoteError {
    RemoteError::Decode(e.to_string())
}

// ─── Requests ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct SubmitRequest {
    answers: BTreeMap<String, String>,
}

impl SubmitRequest {
    pub(crate) fn from_sheet(sheet: &AnswerSheet) -> Self {
        Self {
            answers: sheet
                .iter()
                .map(|(id, opt)| (id.to_string(), opt.to_owned()))
                .collect(),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct UpdateAnswerRequest<'a> {
    pub test_id: &'a str,
    pub new_answer: &'a str,
}

// ─── Responses ─────────────────────────────────────────────────────────────────

/// `{success, message?, user_id?}` acknowledgement used by login and updates.
#[derive(Deserialize)]
pub(crate) struct Ack {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user_id: Option<u64>,
}

/// `{error}` or `{message}` bodies returned with 4xx/5xx statuses.
#[derive(Deserialize, Default)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    pub(crate) fn into_message(self, fallback: &str) -> String {
        self.error
            .or(self.message)
            .unwrap_or_else(|| fallback.to_owned())
    }
}

#[derive(Deserialize)]
pub(crate) struct QuestionDto {
    id: u64,
    question: String,
    options: Vec<Option<String>>,
    #[serde(default)]
    answer: Option<String>,
}

impl QuestionDto {
    /// Null option slots stay in place as blank options so labels keep their
    /// server positions.
    pub(crate) fn into_question(self) -> Result<Question, RemoteError> {
        let options = self
            .options
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect();
        Question::new(QuestionId::new(self.id), self.question, options, self.answer)
            .map_err(decode)
    }
}

#[derive(Deserialize)]
struct ResultDto {
    #[serde(default)]
    user_answer: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    correct: Option<bool>,
    #[serde(default)]
    correct_answer: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct SubmitResponse {
    score: u32,
    #[serde(default)]
    total_questions: u32,
    #[serde(default)]
    results: HashMap<String, ResultDto>,
}

impl SubmitResponse {
    pub(crate) fn into_score(self) -> Result<Score, RemoteError> {
        let mut results = BTreeMap::new();
        for (key, dto) in self.results {
            let id: QuestionId = key.parse().map_err(decode)?;
            results.insert(
                id,
                QuestionResult {
                    user_answer: dto.user_answer,
                    correct_answer: dto.correct_answer,
                    correct: dto.correct.unwrap_or(false),
                },
            );
        }
        Ok(Score::new(self.score, self.total_questions, results))
    }
}

#[derive(Deserialize)]
pub(crate) struct SummaryDto {
    #[serde(default)]
    attempts: u32,
    #[serde(default, deserialize_with = "lenient_f64")]
    best: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    average_score: Option<f64>,
}

impl From<SummaryDto> for UserSummary {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from(dto: SummaryDto) -> Self {
        Self {
            attempts: dto.attempts,
            best: dto.best.map(|b| b.max(0.0).round() as u32),
            average_score: dto.average_score,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct ChartPointDto {
    #[serde(deserialize_with = "flexible_datetime")]
    attempt_time: DateTime<Utc>,
    score: u32,
}

impl From<ChartPointDto> for ChartPoint {
    fn from(dto: ChartPointDto) -> Self {
        Self {
            attempted_at: dto.attempt_time,
            score: dto.score,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct AttemptDto {
    id: u64,
    test_id: String,
    #[serde(deserialize_with = "flexible_datetime")]
    attempt_time: DateTime<Utc>,
    score: u32,
    total_questions: u32,
}

impl From<AttemptDto> for Attempt {
    fn from(dto: AttemptDto) -> Self {
        Self {
            id: AttemptId::new(dto.id),
            test_id: TestId::new(dto.test_id),
            attempted_at: dto.attempt_time,
            score: dto.score,
            total_questions: dto.total_questions,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct DetailDto {
    #[serde(deserialize_with = "lenient_u64")]
    question_id: u64,
    #[serde(default)]
    user_answer: Option<String>,
    #[serde(default)]
    correct_answer: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    is_correct: Option<bool>,
}

impl From<DetailDto> for AttemptDetailEntry {
    fn from(dto: DetailDto) -> Self {
        Self {
            question_id: QuestionId::new(dto.question_id),
            user_answer: dto.user_answer,
            correct_answer: dto.correct_answer,
            is_correct: dto.is_correct,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct AttemptInfoDto {
    pub test_id: String,
}

// ─── Lenient field decoding ────────────────────────────────────────────────────
//
// The server serializes decimals as strings, tinyint booleans as 0/1,
// question ids stored in varchar columns as strings, and datetimes as RFC 2822.

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected number, got {other}"
        ))),
    }
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(Value::Number(n)) => Ok(Some(n.as_i64().unwrap_or(0) != 0)),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected boolean, got {other}"
        ))),
    }
}

fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    match Value::deserialize(d)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom("negative id")),
        Value::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
        other => Err(serde::de::Error::custom(format!("expected id, got {other}"))),
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn flexible_datetime<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(d)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::time::fixed_now;

    #[test]
    fn parses_server_timestamp_formats() {
        let expected = fixed_now();
        assert_eq!(parse_timestamp("Tue, 14 Nov 2023 22:13:20 GMT"), Some(expected));
        assert_eq!(parse_timestamp("2023-11-14T22:13:20Z"), Some(expected));
        assert_eq!(parse_timestamp("2023-11-14 22:13:20"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn null_option_slots_keep_their_position() {
        let dto: QuestionDto = serde_json::from_str(
            r#"{"id": 4, "question": "Pick one", "options": ["w", "x", null, "z"]}"#,
        )
        .unwrap();
        let question = dto.into_question().unwrap();
        let labeled: Vec<_> = question.labeled_options().collect();
        assert_eq!(labeled.len(), 4);
        assert_eq!(labeled[2], ("c".to_owned(), ""));
        assert_eq!(labeled[3], ("d".to_owned(), "z"));
    }

    #[test]
    fn summary_accepts_decimal_strings_and_nulls() {
        let dto: SummaryDto =
            serde_json::from_str(r#"{"attempts": 3, "best": 7, "average_score": "5.3333"}"#)
                .unwrap();
        let summary = UserSummary::from(dto);
        assert_eq!(summary.best, Some(7));
        assert!((summary.average_score.unwrap() - 5.3333).abs() < 1e-9);

        let empty: SummaryDto =
            serde_json::from_str(r#"{"attempts": 0, "best": null, "average_score": null}"#)
                .unwrap();
        let summary = UserSummary::from(empty);
        assert_eq!(summary.best, None);
        assert_eq!(summary.average_score, None);
    }

    #[test]
    fn details_accept_tinyint_flags() {
        let rows: Vec<DetailDto> = serde_json::from_str(
            r#"[{"question_id": "4", "user_answer": "x", "correct_answer": "y", "is_correct": 0}]"#,
        )
        .unwrap();
        let entry = AttemptDetailEntry::from(rows.into_iter().next().unwrap());
        assert_eq!(entry.question_id, QuestionId::new(4));
        assert_eq!(entry.is_correct, Some(false));
    }

    #[test]
    fn submit_response_without_results_decodes() {
        let resp: SubmitResponse =
            serde_json::from_str(r#"{"score": 0, "message": "No questions answered."}"#).unwrap();
        let score = resp.into_score().unwrap();
        assert_eq!(score.score(), 0);
        assert!(score.results().is_empty());
    }
}
