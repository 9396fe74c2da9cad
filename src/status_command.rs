use anyhow::{Context, Result};

use crate::store::Store;
use crate::time_entry::CurrentTimeEntry;
use crate::tracker;

/// 計測中のtime entryを表示するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct StatusArgs {
    #[clap(long = "raw", help = "Prints only the project and the task")]
    pub raw: bool,
}

pub struct StatusCommand<'a> {
    store: &'a Store,
}

impl<'a> StatusCommand<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn run(&self) -> Result<Option<CurrentTimeEntry>> {
        tracker::current(self.store).context("Failed to read current time entry")
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::StatusCommand;
    use crate::store::Store;
    use crate::time_entry::CurrentTimeEntry;

    #[test]
    fn test_status() {
        let store = Store::open_in_memory().unwrap();
        let command = StatusCommand::new(&store);
        assert_eq!(command.run().unwrap(), None);

        let current = CurrentTimeEntry::new(
            "project",
            "task",
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
        );
        store.insert_current_time_entry(&current).unwrap();

        assert_eq!(command.run().unwrap(), Some(current));
    }
}
