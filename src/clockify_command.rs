use anyhow::{Context, Result};
use clap::Subcommand;
use log::info;

use crate::clockify::{ClockifyApi, ClockifyConfig, ClockifySync, SyncReport};
use crate::datetime::DateRange;
use crate::store::{SortField, SortOrder, Store, TimeEntryQuery};

/// Clockifyと連携するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct ClockifyArgs {
    #[clap(subcommand)]
    pub subcommand: ClockifySubCommands,
}

#[derive(Debug, Subcommand)]
pub enum ClockifySubCommands {
    /// Manages the Clockify configuration
    Config(ConfigArgs),
    /// Uploads today's time entries to Clockify
    UploadToday,
    /// Uploads last week's time entries to Clockify
    UploadLastWeek,
}

/// サブコマンドを省略した場合は`get`として扱う。
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    #[clap(subcommand)]
    pub subcommand: Option<ConfigSubCommands>,
}

#[derive(Debug, Subcommand)]
pub enum ConfigSubCommands {
    /// Shows the Clockify configuration
    Get,
    /// Saves the Clockify configuration
    Set(SetConfigArgs),
    /// Deletes the Clockify configuration
    Delete,
}

#[derive(Debug, clap::Args)]
pub struct SetConfigArgs {
    #[clap(help = "Clockify API key")]
    api_key: String,
    #[clap(help = "Clockify workspace ID")]
    workspace_id: String,
    #[clap(long = "project-id", help = "Clockify project to upload time entries to")]
    project_id: Option<String>,
}

pub struct ClockifyCommand<'a> {
    store: &'a Store,
}

impl<'a> ClockifyCommand<'a> {
    /// 新しい`ClockifyCommand`を返す。
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn get_config(&self) -> Result<Option<ClockifyConfig>> {
        self.store
            .get_clockify_config()
            .context("Failed to read clockify config")
    }

    pub fn set_config(&self, args: SetConfigArgs) -> Result<ClockifyConfig> {
        let config = ClockifyConfig {
            api_key: args.api_key,
            workspace_id: args.workspace_id,
            project_id: args.project_id,
        };
        self.store
            .set_clockify_config(&config)
            .context("Failed to save clockify config")?;

        Ok(config)
    }

    pub fn delete_config(&self) -> Result<()> {
        self.store
            .delete_clockify_config()
            .context("Failed to delete clockify config")
    }

    /// 期間内に開始したtime entryを開始日時の順に送信し、削除済みのものをClockifyから削除する。
    ///
    /// 送信結果とClockifyから削除した件数を返す。
    ///
    /// # Arguments
    ///
    /// * `api` - Clockify APIと通信するためのクライアント
    /// * `range` - 送信する期間
    pub async fn upload<A: ClockifyApi>(
        &self,
        api: &A,
        range: &DateRange,
    ) -> Result<(SyncReport, usize)> {
        let query = TimeEntryQuery::new()
            .start_from(range.start.to_utc())
            .start_before(range.end.to_utc())
            .sort_by(SortField::Start, SortOrder::Ascending);
        let entries = self
            .store
            .get_time_entries(&query)
            .context("Failed to retrieve time entries")?;
        info!(
            "Uploading {} time entries from {} to {}",
            entries.len(),
            range.start,
            range.end
        );

        let sync = ClockifySync::new(api, self.store);
        let report = sync
            .upload(&entries)
            .await
            .context("Failed to upload time entries to clockify")?;
        let deletions = sync
            .push_deletions()
            .await
            .context("Failed to delete time entries from clockify")?;

        Ok((report, deletions))
    }
}
