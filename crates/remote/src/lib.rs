#![forbid(unsafe_code)]

pub mod http;
pub mod memory;
pub mod repository;

pub use http::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, HttpBackend, HttpConfig, HttpInitError};
pub use memory::{InMemoryBackend, Operation};
pub use repository::{
    AttemptStore, Authenticator, QuestionBank, Remote, RemoteError, ScoringService,
};
