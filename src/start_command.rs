use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;

use crate::datetime::{self, parse_datetime};
use crate::store::Store;
use crate::time_entry::CurrentTimeEntry;
use crate::tracker;

/// time entryの計測を開始するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct StartArgs {
    #[clap(help = "Project name")]
    project: String,
    #[clap(help = "Task name")]
    task: String,
    #[clap(
        short = 'f',
        long = "from",
        help = "Sets a custom start time in the format \"YYYY-MM-DD HH:MM:SS\"",
        parse(try_from_str = parse_datetime),
    )]
    from: Option<DateTime<Utc>>,
}

pub struct StartCommand<'a> {
    store: &'a Store,
}

impl<'a> StartCommand<'a> {
    /// 新しい`StartCommand`を返す。
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// `start`サブコマンドの処理を行う。
    ///
    /// 開始日時が指定されていない場合は、現在時刻の秒以下を切り捨てた時刻を利用する。
    /// 計測中のtime entryがある場合は、先に終了する。
    pub fn run(&self, args: StartArgs) -> Result<CurrentTimeEntry> {
        let at = args
            .from
            .unwrap_or_else(|| datetime::start_of_minute(datetime::now()));
        info!("Start {} - {} at {}", args.project, args.task, at);

        let current = tracker::start(self.store, &args.project, &args.task, at)
            .context("Failed to start time entry")?;

        Ok(current)
    }
}
