use chrono::{DateTime, Utc};
use thiserror::Error;

/// ローカルストアの操作で発生するエラー。
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to prepare data directory {path}: {source}")]
    DataDir {
        path: String,
        source: std::io::Error,
    },
}

/// time entryの状態遷移で発生するエラー。
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("end {end} is before start {start}")]
    EndBeforeStart {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("time entry not found: {0}")]
    NotFound(String),

    #[error("there are no time entries")]
    Empty,
}

/// Clockifyとの同期で発生するエラー。
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("clockify is not configured, run `clockify config set <api-key> <workspace-id>` first")]
    NotConfigured,

    #[error("clockify {0} is not supported")]
    Unsupported(&'static str),

    #[error("failed to send request to clockify: {0}")]
    Http(#[from] reqwest::Error),

    #[error("clockify returned unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

/// 編集ファイルの内容が不正な場合のエラー。
#[derive(Debug, Error, PartialEq)]
pub enum EditError {
    #[error("the ID line must not be changed (expected {expected}, found {found})")]
    IdChanged { expected: String, found: String },

    #[error("invalid {field} timestamp: {value}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("end time is before start time")]
    EndBeforeStart,
}
