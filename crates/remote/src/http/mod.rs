use std::time::Duration;

use async_trait::async_trait;
use exam_core::model::{
    AnswerSheet, Attempt, AttemptDetailEntry, AttemptId, ChartPoint, Question, QuestionId, Score,
    TestId, UserId, UserSummary,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::repository::{
    AttemptStore, Authenticator, QuestionBank, Remote, RemoteError, ScoringService,
};

mod wire;

use wire::{
    Ack, AttemptDto, AttemptInfoDto, ChartPointDto, DetailDto, ErrorBody, LoginRequest,
    QuestionDto, SubmitRequest, SubmitResponse, SummaryDto, UpdateAnswerRequest,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the exam backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HttpInitError {
    #[error("invalid base url {raw}: {reason}")]
    InvalidBaseUrl { raw: String, reason: String },
    #[error(transparent)]
    Client(#[from] reqwest::Error),
}

/// JSON-over-HTTP client for the exam backend.
#[derive(Clone)]
pub struct HttpBackend {
    base: Url,
    client: Client,
    timeout_secs: u64,
}

impl HttpBackend {
    /// Build a client for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `HttpInitError` if the base URL is not an absolute http(s) URL
    /// or the HTTP client cannot be created.
    pub fn new(config: &HttpConfig) -> Result<Self, HttpInitError> {
        let base = Url::parse(config.base_url.trim()).map_err(|e| {
            HttpInitError::InvalidBaseUrl {
                raw: config.base_url.clone(),
                reason: e.to_string(),
            }
        })?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(HttpInitError::InvalidBaseUrl {
                raw: config.base_url.clone(),
                reason: "expected an http(s) URL".into(),
            });
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            base,
            client,
            timeout_secs: config.timeout_secs,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::Connection("base url cannot take a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn transport(&self, e: &reqwest::Error) -> RemoteError {
        if e.is_timeout() {
            RemoteError::Timeout(self.timeout_secs)
        } else {
            RemoteError::Network(e.to_string())
        }
    }

    async fn read(&self, request: RequestBuilder) -> Result<(StatusCode, String), RemoteError> {
        let response = request.send().await.map_err(|e| self.transport(&e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport(&e))?;
        Ok((status, body))
    }

    /// Send a request and decode a successful JSON body.
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        let (status, body) = self.read(request).await?;
        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound);
        }
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .unwrap_or_default()
                .into_message(status.canonical_reason().unwrap_or("request failed"));
            warn!(status = status.as_u16(), %message, "backend returned an error");
            return Err(RemoteError::Http {
                status: status.as_u16(),
                message,
            });
        }
        serde_json::from_str(&body).map_err(|e| RemoteError::Decode(e.to_string()))
    }

    /// Send a request answered with `{success, message}`, whatever the status.
    async fn acknowledge(&self, request: RequestBuilder) -> Result<Ack, RemoteError> {
        let (status, body) = self.read(request).await?;
        match serde_json::from_str::<Ack>(&body) {
            Ok(ack) if ack.success => Ok(ack),
            Ok(ack) if status == StatusCode::NOT_FOUND => {
                debug!(message = ?ack.message, "backend reported not found");
                Err(RemoteError::NotFound)
            }
            Ok(ack) => Err(RemoteError::Rejected(
                ack.message.unwrap_or_else(|| "request rejected".into()),
            )),
            Err(_) if status == StatusCode::NOT_FOUND => Err(RemoteError::NotFound),
            Err(e) if status.is_success() => Err(RemoteError::Decode(e.to_string())),
            Err(_) => Err(RemoteError::Http {
                status: status.as_u16(),
                message: serde_json::from_str::<ErrorBody>(&body)
                    .unwrap_or_default()
                    .into_message("request failed"),
            }),
        }
    }
}

#[async_trait]
impl Authenticator for HttpBackend {
    #[instrument(skip(self, password))]
    async fn authenticate(&self, username: &str, password: &str) -> Result<UserId, RemoteError> {
        let url = self.endpoint(&["api", "login"])?;
        let ack = self
            .acknowledge(
                self.client
                    .post(url)
                    .json(&LoginRequest { username, password }),
            )
            .await?;
        ack.user_id
            .map(UserId::new)
            .ok_or_else(|| RemoteError::Decode("login succeeded without user_id".into()))
    }
}

#[async_trait]
impl QuestionBank for HttpBackend {
    #[instrument(skip(self), fields(test_id = %test_id))]
    async fn fetch_questions(&self, test_id: &TestId) -> Result<Vec<Question>, RemoteError> {
        let url = self.endpoint(&["api", test_id.as_str(), "questions"])?;
        let rows: Vec<QuestionDto> = self.fetch(self.client.get(url)).await?;
        let questions = rows
            .into_iter()
            .map(QuestionDto::into_question)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = questions.len(), "fetched questions");
        Ok(questions)
    }

    #[instrument(skip(self, new_answer), fields(test_id = %test_id, question_id = %question_id))]
    async fn update_canonical_answer(
        &self,
        question_id: QuestionId,
        new_answer: &str,
        test_id: &TestId,
    ) -> Result<(), RemoteError> {
        let id = question_id.to_string();
        let url = self.endpoint(&["api", "question", id.as_str(), "update_answer"])?;
        self.acknowledge(self.client.put(url).json(&UpdateAnswerRequest {
            test_id: test_id.as_str(),
            new_answer,
        }))
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ScoringService for HttpBackend {
    #[instrument(skip(self, answers), fields(test_id = %test_id, answered = answers.len()))]
    async fn submit_exam(
        &self,
        test_id: &TestId,
        answers: &AnswerSheet,
    ) -> Result<Score, RemoteError> {
        let url = self.endpoint(&["api", test_id.as_str(), "submit_exam"])?;
        let response: SubmitResponse = self
            .fetch(
                self.client
                    .post(url)
                    .json(&SubmitRequest::from_sheet(answers)),
            )
            .await?;
        response.into_score()
    }
}

#[async_trait]
impl AttemptStore for HttpBackend {
    #[instrument(skip(self))]
    async fn user_summary(&self, user_id: UserId) -> Result<UserSummary, RemoteError> {
        let id = user_id.to_string();
        let url = self.endpoint(&["api", "user", id.as_str(), "summary"])?;
        let dto: SummaryDto = self.fetch(self.client.get(url)).await?;
        Ok(dto.into())
    }

    #[instrument(skip(self))]
    async fn chart_series(&self, user_id: UserId) -> Result<Vec<ChartPoint>, RemoteError> {
        let id = user_id.to_string();
        let url = self.endpoint(&["api", "user", id.as_str(), "chart"])?;
        let rows: Vec<ChartPointDto> = self.fetch(self.client.get(url)).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn user_attempts(&self, user_id: UserId) -> Result<Vec<Attempt>, RemoteError> {
        let id = user_id.to_string();
        let url = self.endpoint(&["api", "user", id.as_str(), "attempts"])?;
        let rows: Vec<AttemptDto> = self.fetch(self.client.get(url)).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn attempt_details(
        &self,
        attempt_id: AttemptId,
    ) -> Result<Vec<AttemptDetailEntry>, RemoteError> {
        let id = attempt_id.to_string();
        let url = self.endpoint(&["api", "attempt", id.as_str(), "details"])?;
        let rows: Vec<DetailDto> = self.fetch(self.client.get(url)).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn attempt_info(&self, attempt_id: AttemptId) -> Result<TestId, RemoteError> {
        let id = attempt_id.to_string();
        let url = self.endpoint(&["api", "attempt", id.as_str(), "info"])?;
        let info: Option<AttemptInfoDto> = self.fetch(self.client.get(url)).await?;
        info.map(|i| TestId::new(i.test_id))
            .ok_or(RemoteError::NotFound)
    }
}

impl Remote {
    /// Build a `Remote` backed by the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `HttpInitError` if the client cannot be configured.
    pub fn http(config: &HttpConfig) -> Result<Self, HttpInitError> {
        let backend = Arc::new(HttpBackend::new(config)?);
        Ok(Self {
            auth: backend.clone(),
            questions: backend.clone(),
            scoring: backend.clone(),
            attempts: backend,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpBackend>();
    }

    #[test]
    fn endpoints_append_to_base_path() {
        let backend = HttpBackend::new(&HttpConfig {
            base_url: "http://exam.local:5000/".into(),
            timeout_secs: 5,
        })
        .unwrap();
        let url = backend.endpoint(&["api", "test1", "questions"]).unwrap();
        assert_eq!(url.as_str(), "http://exam.local:5000/api/test1/questions");
    }

    #[test]
    fn rejects_non_http_base() {
        let err = HttpBackend::new(&HttpConfig {
            base_url: "mailto:someone@example.com".into(),
            timeout_secs: 5,
        });
        assert!(matches!(err, Err(HttpInitError::InvalidBaseUrl { .. })));
    }
}
