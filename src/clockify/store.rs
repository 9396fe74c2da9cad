use log::debug;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::Store;

/// Clockifyへの接続設定。ストアに高々1件保存される。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClockifyConfig {
    pub api_key: String,
    pub workspace_id: String,
    /// 未設定の場合は既定のプロジェクトに登録する。
    pub project_id: Option<String>,
}

/// ローカルのtime entryとClockify上のtime entryの対応。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClockifyTimeEntry {
    pub id: String,
    pub time_entry_id: String,
    pub clockify_id: String,
    pub deleted: bool,
}

fn clockify_time_entry_from_row(row: &Row) -> rusqlite::Result<ClockifyTimeEntry> {
    Ok(ClockifyTimeEntry {
        id: row.get(0)?,
        time_entry_id: row.get(1)?,
        clockify_id: row.get(2)?,
        deleted: row.get(3)?,
    })
}

impl Store {
    /// Clockifyへの送信が成功したtime entryを記録する。
    pub fn insert_clockify_time_entry(
        &self,
        time_entry_id: &str,
        clockify_id: &str,
    ) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.connection().execute(
            "INSERT INTO clockify_time_entries (id, time_entry_id, clockify_id, deleted)
             VALUES (?1, ?2, ?3, 0)",
            params![id, time_entry_id, clockify_id],
        )?;
        debug!("Tracked time entry {} as clockify {}", time_entry_id, clockify_id);

        Ok(id)
    }

    pub fn get_clockify_time_entry(
        &self,
        time_entry_id: &str,
    ) -> Result<Option<ClockifyTimeEntry>, StoreError> {
        let entry = self
            .connection()
            .query_row(
                "SELECT id, time_entry_id, clockify_id, deleted FROM clockify_time_entries
                 WHERE time_entry_id = ?1 LIMIT 1",
                params![time_entry_id],
                clockify_time_entry_from_row,
            )
            .optional()?;

        Ok(entry)
    }

    /// ローカルで削除されたtime entryの記録に削除済みの印を付ける。
    ///
    /// 印を付けた件数を返す。Clockifyには送信しない。
    pub fn mark_clockify_time_entry_deleted(&self, time_entry_id: &str) -> Result<usize, StoreError> {
        let updated = self.connection().execute(
            "UPDATE clockify_time_entries SET deleted = 1 WHERE time_entry_id = ?1",
            params![time_entry_id],
        )?;

        Ok(updated)
    }

    pub fn get_deleted_clockify_time_entries(&self) -> Result<Vec<ClockifyTimeEntry>, StoreError> {
        let mut stmt = self.connection().prepare(
            "SELECT id, time_entry_id, clockify_id, deleted FROM clockify_time_entries
             WHERE deleted = 1",
        )?;
        let entries = stmt
            .query_map([], clockify_time_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    pub fn delete_clockify_time_entry(&self, id: &str) -> Result<bool, StoreError> {
        let deleted = self
            .connection()
            .execute("DELETE FROM clockify_time_entries WHERE id = ?1", params![id])?;

        Ok(deleted > 0)
    }

    pub fn get_clockify_config(&self) -> Result<Option<ClockifyConfig>, StoreError> {
        let config = self
            .connection()
            .query_row(
                "SELECT api_key, workspace_id, project_id FROM clockify_config LIMIT 1",
                [],
                |row| {
                    Ok(ClockifyConfig {
                        api_key: row.get(0)?,
                        workspace_id: row.get(1)?,
                        project_id: row.get(2)?,
                    })
                },
            )
            .optional()?;

        Ok(config)
    }

    /// 既存の設定を削除してから保存する。
    pub fn set_clockify_config(&self, config: &ClockifyConfig) -> Result<(), StoreError> {
        self.in_transaction(|store| {
            store.delete_clockify_config()?;
            store.connection().execute(
                "INSERT INTO clockify_config (id, api_key, workspace_id, project_id)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    Uuid::new_v4().to_string(),
                    config.api_key,
                    config.workspace_id,
                    config.project_id
                ],
            )?;
            Ok(())
        })
    }

    pub fn delete_clockify_config(&self) -> Result<(), StoreError> {
        self.connection().execute("DELETE FROM clockify_config", [])?;
        Ok(())
    }
}
