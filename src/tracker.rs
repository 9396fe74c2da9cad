use chrono::{DateTime, Utc};
use log::info;

use crate::datetime;
use crate::error::TrackerError;
use crate::store::{SortField, SortOrder, Store, TimeEntryQuery};
use crate::time_entry::{CurrentTimeEntry, TimeEntry};

/// 計測中のtime entryを取得する。
pub fn current(store: &Store) -> Result<Option<CurrentTimeEntry>, TrackerError> {
    Ok(store.get_current_time_entry()?)
}

/// 新しいtime entryの計測を開始する。
///
/// 既に計測中のtime entryがある場合は、現在時刻で終了させてから開始する。
/// 終了時刻が開始時刻より前にならないよう、開始時刻で下限を取る。
///
/// # Arguments
///
/// * `store` - 保存先のストア
/// * `project` - プロジェクト名
/// * `task` - タスク名
/// * `at` - 開始日時
pub fn start(
    store: &Store,
    project: &str,
    task: &str,
    at: DateTime<Utc>,
) -> Result<CurrentTimeEntry, TrackerError> {
    let (project, task) = (project.trim(), task.trim());
    if project.is_empty() {
        return Err(TrackerError::EmptyField("project"));
    }
    if task.is_empty() {
        return Err(TrackerError::EmptyField("task"));
    }

    store.in_transaction(|store| {
        if let Some(running) = store.get_current_time_entry()? {
            let end = datetime::now().max(running.start);
            let stopped = finish(store, &running, end)?;
            info!(
                "Stopped running time entry {} ({} - {}) before starting a new one",
                stopped.id, stopped.project, stopped.task
            );
        }

        let current = CurrentTimeEntry::new(project, task, at);
        store.insert_current_time_entry(&current)?;
        info!("Started time entry {} at {}", current.id, current.start);

        Ok(current)
    })
}

/// 計測中のtime entryを終了し、`TimeEntry`として保存する。
///
/// `at`が開始日時より前の場合はエラーとし、何も変更しない。
/// `current`が保存されている計測中のtime entryと異なる場合は`TrackerError::NotFound`を返す。
pub fn stop(
    store: &Store,
    current: &CurrentTimeEntry,
    at: DateTime<Utc>,
) -> Result<TimeEntry, TrackerError> {
    store.in_transaction(|store| match store.get_current_time_entry()? {
        Some(running) if running.id == current.id => finish(store, &running, at),
        _ => Err(TrackerError::NotFound(current.id.clone())),
    })
}

/// 計測中のtime entryがあれば終了する。なければ何もしない。
pub fn stop_current(store: &Store, at: DateTime<Utc>) -> Result<Option<TimeEntry>, TrackerError> {
    match current(store)? {
        Some(running) => stop(store, &running, at).map(Some),
        None => {
            info!("No running time entry to stop");
            Ok(None)
        }
    }
}

fn finish(
    store: &Store,
    current: &CurrentTimeEntry,
    at: DateTime<Utc>,
) -> Result<TimeEntry, TrackerError> {
    if at < current.start {
        return Err(TrackerError::EndBeforeStart {
            start: current.start,
            end: at,
        });
    }

    let entry = current.finish(at);
    store.insert_time_entry(&entry)?;
    store.delete_current_time_entry()?;
    info!("Stopped time entry {} at {}", entry.id, entry.end);

    Ok(entry)
}

/// IDを指定してtime entryを削除する。
///
/// Clockifyへ送信済みの場合は、送信済みの記録に削除済みの印を付ける。
pub fn delete_time_entry(store: &Store, id: &str) -> Result<TimeEntry, TrackerError> {
    store.in_transaction(|store| {
        let entry = store
            .get_time_entry(id)?
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;
        remove(store, entry)
    })
}

/// 開始日時が最も新しいtime entryを削除する。
pub fn delete_last_time_entry(store: &Store) -> Result<TimeEntry, TrackerError> {
    store.in_transaction(|store| {
        let query = TimeEntryQuery::new()
            .sort_by(SortField::Start, SortOrder::Descending)
            .limit(1);
        let entry = store
            .get_time_entries(&query)?
            .pop()
            .ok_or(TrackerError::Empty)?;
        remove(store, entry)
    })
}

fn remove(store: &Store, entry: TimeEntry) -> Result<TimeEntry, TrackerError> {
    if !store.delete_time_entry(&entry.id)? {
        return Err(TrackerError::NotFound(entry.id));
    }
    let marked = store.mark_clockify_time_entry_deleted(&entry.id)?;
    info!(
        "Deleted time entry {} ({} clockify records marked deleted)",
        entry.id, marked
    );

    Ok(entry)
}

pub fn get_projects(store: &Store) -> Result<Vec<String>, TrackerError> {
    Ok(store.get_projects()?)
}

pub fn get_tasks(store: &Store, project: &str) -> Result<Vec<String>, TrackerError> {
    Ok(store.get_tasks(project)?)
}
