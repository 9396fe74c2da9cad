use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::datetime::{self, parse_datetime};
use crate::store::Store;
use crate::time_entry::TimeEntry;
use crate::tracker;

/// 計測中のtime entryを終了するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct StopArgs {
    #[clap(
        long = "end",
        help = "Sets a custom end time in the format \"YYYY-MM-DD HH:MM:SS\"",
        parse(try_from_str = parse_datetime),
    )]
    end: Option<DateTime<Utc>>,
}

pub struct StopCommand<'a> {
    store: &'a Store,
}

impl<'a> StopCommand<'a> {
    /// 新しい`StopCommand`を返す。
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// `stop`サブコマンドの処理を行う。
    ///
    /// 計測中のtime entryがない場合は`None`を返す。
    pub fn run(&self, args: StopArgs) -> Result<Option<TimeEntry>> {
        let end = args.end.unwrap_or_else(datetime::now);

        tracker::stop_current(self.store, end).context("Failed to stop time entry")
    }
}
