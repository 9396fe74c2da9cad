use anyhow::{Context, Result};
use chrono::Local;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use log::info;

use crate::edit::{self, EditOutcome};
use crate::error::TrackerError;
use crate::store::{SortField, SortOrder, Store, TimeEntryQuery};
use crate::time_entry::TimeEntry;

/// 選択肢として表示する最大件数。
const SELECT_LIMIT: usize = 100;

/// time entryをエディタで編集するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct EditArgs {
    #[clap(help = "ID of the time entry. Selects interactively when omitted")]
    id: Option<String>,
}

pub struct EditCommand<'a> {
    store: &'a Store,
}

impl<'a> EditCommand<'a> {
    /// 新しい`EditCommand`を返す。
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// `edit`サブコマンドの処理を行う。
    ///
    /// IDが指定されていない場合は、新しい順に最大100件から選択する。
    /// 選択が取り消された場合は`None`を返す。
    pub fn run(&self, args: EditArgs) -> Result<Option<EditOutcome>> {
        let entry = match args.id {
            Some(id) => self.find(&id)?,
            None => match self.select()? {
                Some(entry) => entry,
                None => return Ok(None),
            },
        };

        let outcome = edit::edit_in_editor(&entry)?;
        self.save(&outcome)?;

        Ok(Some(outcome))
    }

    fn find(&self, id: &str) -> Result<TimeEntry> {
        let entry = self
            .store
            .get_time_entry(id)
            .context("Failed to read time entry")?
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;

        Ok(entry)
    }

    fn select(&self) -> Result<Option<TimeEntry>> {
        let mut entries = self.candidates()?;
        if entries.is_empty() {
            return Err(TrackerError::Empty.into());
        }

        let items: Vec<String> = entries.iter().map(describe).collect();
        let selected = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Select a time entry to edit")
            .items(&items)
            .default(0)
            .interact_opt()
            .context("Failed to select time entry")?;

        Ok(selected.map(|index| entries.swap_remove(index)))
    }

    fn candidates(&self) -> Result<Vec<TimeEntry>> {
        let query = TimeEntryQuery::new()
            .sort_by(SortField::Start, SortOrder::Descending)
            .limit(SELECT_LIMIT);

        self.store
            .get_time_entries(&query)
            .context("Failed to retrieve time entries")
    }

    /// 変更がある場合のみ保存する。
    fn save(&self, outcome: &EditOutcome) -> Result<bool> {
        if outcome.changes.is_empty() {
            info!("No changes for time entry {}", outcome.entry.id);
            return Ok(false);
        }

        let updated = self
            .store
            .update_time_entry(&outcome.entry)
            .context("Failed to update time entry")?;
        if !updated {
            return Err(TrackerError::NotFound(outcome.entry.id.clone()).into());
        }
        info!(
            "Updated time entry {} ({} fields changed)",
            outcome.entry.id,
            outcome.changes.len()
        );

        Ok(true)
    }
}

fn describe(entry: &TimeEntry) -> String {
    format!(
        "{} ~ {}: {} - {}",
        entry.start.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
        entry.end.with_timezone(&Local).format("%H:%M"),
        entry.project,
        entry.task
    )
}
