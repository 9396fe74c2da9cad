use log::{info, warn};

use super::api::ClockifyApi;
use crate::error::SyncError;
use crate::store::Store;
use crate::time_entry::TimeEntry;

/// 1件のtime entryを同期した結果。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    Created { clockify_id: String },
    Deleted { clockify_id: String },
}

/// `upload`の結果の集計。
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: Vec<String>,
    pub deleted: Vec<String>,
    /// 更新が必要だったが、未対応のため送信しなかったtime entryのID。
    pub unsupported: Vec<String>,
}

/// ローカルのtime entryをClockifyへ送信する。
///
/// 送信済みかどうかは`clockify_time_entries`の記録で判定する。
pub struct ClockifySync<'a, A: ClockifyApi> {
    api: &'a A,
    store: &'a Store,
}

impl<'a, A: ClockifyApi> ClockifySync<'a, A> {
    pub fn new(api: &'a A, store: &'a Store) -> Self {
        Self { api, store }
    }

    /// 1件のtime entryを同期する。
    ///
    /// - 未送信の場合は登録し、成功した場合のみ記録を保存する
    /// - 削除済みの印がある場合はClockifyから削除し、記録を消す
    /// - 送信済みの場合は更新が必要だが未対応のため`SyncError::Unsupported`を返す
    pub async fn sync_entry(&self, entry: &TimeEntry) -> Result<SyncOutcome, SyncError> {
        match self.store.get_clockify_time_entry(&entry.id)? {
            None => {
                info!("Creating time entry: {} {}", entry.project, entry.task);
                let clockify_id = self.api.create_time_entry(entry).await?;
                self.store
                    .insert_clockify_time_entry(&entry.id, &clockify_id)?;
                Ok(SyncOutcome::Created { clockify_id })
            }
            Some(tracked) if tracked.deleted => {
                info!("Deleting time entry: {}", entry.id);
                self.api.delete_time_entry(&tracked.clockify_id).await?;
                self.store.delete_clockify_time_entry(&tracked.id)?;
                Ok(SyncOutcome::Deleted {
                    clockify_id: tracked.clockify_id,
                })
            }
            Some(_) => Err(SyncError::Unsupported("update")),
        }
    }

    /// time entryを順番に同期する。
    ///
    /// 更新が必要なものは結果に記録して次へ進む。それ以外のエラーが発生した時点で中断する。
    /// 中断前に送信したものは取り消さない。
    pub async fn upload(&self, entries: &[TimeEntry]) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();

        for entry in entries {
            match self.sync_entry(entry).await {
                Ok(SyncOutcome::Created { .. }) => report.created.push(entry.id.clone()),
                Ok(SyncOutcome::Deleted { .. }) => report.deleted.push(entry.id.clone()),
                Err(SyncError::Unsupported(operation)) => {
                    warn!(
                        "Skipping time entry {}: clockify {} is not supported",
                        entry.id, operation
                    );
                    report.unsupported.push(entry.id.clone());
                }
                Err(err) => return Err(err),
            }
        }

        Ok(report)
    }

    /// ローカルで削除済みのtime entryをClockifyからも削除する。
    ///
    /// 削除した件数を返す。
    pub async fn push_deletions(&self) -> Result<usize, SyncError> {
        let deleted = self.store.get_deleted_clockify_time_entries()?;

        for tracked in &deleted {
            info!(
                "Deleting clockify time entry {} of deleted time entry {}",
                tracked.clockify_id, tracked.time_entry_id
            );
            self.api.delete_time_entry(&tracked.clockify_id).await?;
            self.store.delete_clockify_time_entry(&tracked.id)?;
        }

        Ok(deleted.len())
    }
}
