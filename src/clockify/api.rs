use async_trait::async_trait;
use chrono::SecondsFormat;
use log::{debug, info};
use reqwest::{header::CONTENT_TYPE, Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::store::ClockifyConfig;
use crate::error::SyncError;
use crate::store::Store;
use crate::time_entry::TimeEntry;

const API_URL: &str = "https://api.clockify.me/api/v1";
/// 設定でプロジェクトが指定されていない場合の登録先。
pub const DEFAULT_PROJECT_ID: &str = "65ba4da699f4432f69476fef";

/// Clockifyのtime entryを操作するためのtrait。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClockifyApi {
    /// time entryを登録し、ClockifyでのIDを返す。
    async fn create_time_entry(&self, entry: &TimeEntry) -> Result<String, SyncError>;

    /// ClockifyでのIDを指定してtime entryを削除する。
    async fn delete_time_entry(&self, clockify_id: &str) -> Result<(), SyncError>;
}

/// time entry登録時のリクエストボディ。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClockifyTimeEntryPayload<'a> {
    start: String,
    end: String,
    description: String,
    project_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_id: Option<&'a str>,
}

/// time entry登録時のレスポンス。
#[derive(Debug, Deserialize)]
struct ClockifyCreatedTimeEntry {
    id: String,
}

/// Clockify APIと通信するためのクライアント。
///
/// # Examples
///
/// ```
/// let client = ClockifyClient::from_store(&store)?;
/// let clockify_id = client.create_time_entry(&entry).await?;
/// ```
pub struct ClockifyClient {
    client: Client,
    api_url: String,
    config: ClockifyConfig,
}

impl ClockifyClient {
    /// 新しい`ClockifyClient`を返す。
    pub fn new(config: ClockifyConfig) -> Self {
        Self {
            client: Client::new(),
            api_url: API_URL.to_string(),
            config,
        }
    }

    /// ストアに保存された設定から`ClockifyClient`を作成する。
    ///
    /// 設定が保存されていない場合は`SyncError::NotConfigured`を返す。
    pub fn from_store(store: &Store) -> Result<Self, SyncError> {
        let config = store
            .get_clockify_config()?
            .ok_or(SyncError::NotConfigured)?;

        Ok(Self::new(config))
    }

    /// 接続先のURLを差し替える。
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    fn time_entries_url(&self) -> String {
        format!(
            "{}/workspaces/{}/time-entries",
            self.api_url, self.config.workspace_id
        )
    }

    fn project_id(&self) -> &str {
        self.config
            .project_id
            .as_deref()
            .unwrap_or(DEFAULT_PROJECT_ID)
    }
}

#[async_trait]
impl ClockifyApi for ClockifyClient {
    async fn create_time_entry(&self, entry: &TimeEntry) -> Result<String, SyncError> {
        let payload = ClockifyTimeEntryPayload {
            start: entry.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            end: entry.end.to_rfc3339_opts(SecondsFormat::Secs, true),
            description: format!("{} - {}", entry.project, entry.task),
            project_id: self.project_id(),
            task_id: None,
        };
        debug!("Creating clockify time entry: {:?}", payload);

        let response = self
            .client
            .post(self.time_entries_url())
            .header("X-Api-Key", &self.config.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await?;
        let response = expect_status(response, StatusCode::CREATED).await?;
        let created = response.json::<ClockifyCreatedTimeEntry>().await?;
        info!("Created clockify time entry {} for {}", created.id, entry.id);

        Ok(created.id)
    }

    async fn delete_time_entry(&self, clockify_id: &str) -> Result<(), SyncError> {
        let response = self
            .client
            .delete(format!("{}/{}", self.time_entries_url(), clockify_id))
            .header("X-Api-Key", &self.config.api_key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(unexpected_status(response).await);
        }
        info!("Deleted clockify time entry {}", clockify_id);

        Ok(())
    }
}

async fn expect_status(response: Response, expected: StatusCode) -> Result<Response, SyncError> {
    if response.status() == expected {
        Ok(response)
    } else {
        Err(unexpected_status(response).await)
    }
}

async fn unexpected_status(response: Response) -> SyncError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    SyncError::UnexpectedStatus { status, body }
}
