use anyhow::{Context, Result};

use crate::store::Store;
use crate::time_entry::TimeEntry;
use crate::tracker;

/// time entryを削除するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct DeleteArgs {
    #[clap(help = "ID of the time entry", required_unless_present = "last")]
    id: Option<String>,
    #[clap(long = "last", help = "Deletes the latest time entry", conflicts_with = "id")]
    last: bool,
}

pub struct DeleteCommand<'a> {
    store: &'a Store,
}

impl<'a> DeleteCommand<'a> {
    /// 新しい`DeleteCommand`を返す。
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// `delete`サブコマンドの処理を行う。
    ///
    /// 削除したtime entryを返す。
    pub fn run(&self, args: DeleteArgs) -> Result<TimeEntry> {
        let deleted = match args.id {
            Some(id) if !args.last => tracker::delete_time_entry(self.store, &id),
            _ => tracker::delete_last_time_entry(self.store),
        };

        deleted.context("Failed to delete time entry")
    }
}
