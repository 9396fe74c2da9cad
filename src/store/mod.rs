use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info, warn};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::error::StoreError;
use crate::time_entry::{CurrentTimeEntry, TimeEntry};

mod query;
mod schema;

pub use query::{SortField, SortOrder, TimeEntryQuery};

/// `get_projects`で走査する最大件数。
const PROJECTS_LIMIT: usize = 100;
/// `get_tasks`で走査する最大件数。
const TASKS_LIMIT: usize = 10;
/// 別プロセスがロックを保持している場合に待つ時間。
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// time entryを保存するローカルストア。
///
/// 1プロセスにつき1つのハンドルを開き、終了前に`close`する。
/// `close`せずにdropした場合もコネクションは解放される。
pub struct Store {
    conn: Connection,
}

impl Store {
    /// 指定されたパスのデータベースを開き、スキーマを作成する。
    ///
    /// 親ディレクトリが存在しない場合は作成する。
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::DataDir {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        info!("Opened store at {}", path.display());

        Self::with_connection(conn)
    }

    /// メモリ上のデータベースを開く。
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn migrate(&self) -> Result<(), StoreError> {
        schema::migrate(&self.conn)
    }

    pub fn close(self) -> Result<(), StoreError> {
        self.conn.close().map_err(|(_, err)| StoreError::Database(err))
    }

    /// `f`を1つのトランザクション内で実行する。
    ///
    /// `f`がエラーを返した場合はロールバックする。
    /// 書き込みロックを先に取得するため、同じストアを開いた別プロセスとは直列化される。
    pub fn in_transaction<T, E>(&self, f: impl FnOnce(&Self) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(StoreError::from)?;

        match f(self) {
            Ok(value) => {
                self.conn
                    .execute_batch("COMMIT")
                    .map_err(StoreError::from)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.conn.execute_batch("ROLLBACK") {
                    warn!("Failed to roll back transaction: {}", rollback_err);
                }
                Err(err)
            }
        }
    }

    pub fn insert_current_time_entry(&self, entry: &CurrentTimeEntry) -> Result<String, StoreError> {
        self.conn.execute(
            r#"INSERT INTO "current-time-entry" (id, project, task, start_time)
               VALUES (?1, ?2, ?3, ?4)"#,
            params![
                entry.id,
                entry.project,
                entry.task,
                to_sql_timestamp(&entry.start)
            ],
        )?;
        debug!("Inserted current time entry {}", entry.id);

        Ok(entry.id.clone())
    }

    pub fn get_current_time_entry(&self) -> Result<Option<CurrentTimeEntry>, StoreError> {
        let entry = self
            .conn
            .query_row(
                r#"SELECT id, project, task, start_time FROM "current-time-entry" LIMIT 1"#,
                [],
                |row| {
                    Ok(CurrentTimeEntry {
                        id: row.get(0)?,
                        project: row.get(1)?,
                        task: row.get(2)?,
                        start: timestamp_column(row, 3)?,
                    })
                },
            )
            .optional()?;

        Ok(entry)
    }

    /// 計測中のtime entryをすべて削除する。
    pub fn delete_current_time_entry(&self) -> Result<(), StoreError> {
        let deleted = self
            .conn
            .execute(r#"DELETE FROM "current-time-entry""#, [])?;
        debug!("Deleted {} current time entries", deleted);

        Ok(())
    }

    pub fn insert_time_entry(&self, entry: &TimeEntry) -> Result<String, StoreError> {
        self.conn.execute(
            r#"INSERT INTO "time-entry" (id, project, task, start_time, end_time)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
            params![
                entry.id,
                entry.project,
                entry.task,
                to_sql_timestamp(&entry.start),
                to_sql_timestamp(&entry.end)
            ],
        )?;
        debug!("Inserted time entry {}", entry.id);

        Ok(entry.id.clone())
    }

    /// 条件に一致するtime entryを取得する。
    ///
    /// # Arguments
    ///
    /// * `query` - 絞り込み、並び替え、件数の条件
    pub fn get_time_entries(&self, query: &TimeEntryQuery) -> Result<Vec<TimeEntry>, StoreError> {
        let (clause, values) = query.to_sql();
        let sql = format!(
            r#"SELECT id, project, task, start_time, end_time FROM "time-entry"{}"#,
            clause
        );
        debug!("Querying time entries: {}", sql);

        let mut stmt = self.conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_from_iter(values.iter()), time_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    pub fn get_time_entry(&self, id: &str) -> Result<Option<TimeEntry>, StoreError> {
        let mut entries = self.get_time_entries(&TimeEntryQuery::new().id(id).limit(1))?;
        Ok(entries.pop())
    }

    /// IDが一致するtime entryを置き換える。一致するものがなければ`false`を返す。
    pub fn update_time_entry(&self, entry: &TimeEntry) -> Result<bool, StoreError> {
        let updated = self.conn.execute(
            r#"UPDATE "time-entry"
               SET project = ?2, task = ?3, start_time = ?4, end_time = ?5
               WHERE id = ?1"#,
            params![
                entry.id,
                entry.project,
                entry.task,
                to_sql_timestamp(&entry.start),
                to_sql_timestamp(&entry.end)
            ],
        )?;

        Ok(updated > 0)
    }

    /// IDが一致するtime entryを削除する。一致するものがなければ`false`を返す。
    pub fn delete_time_entry(&self, id: &str) -> Result<bool, StoreError> {
        let deleted = self
            .conn
            .execute(r#"DELETE FROM "time-entry" WHERE id = ?1"#, params![id])?;

        Ok(deleted > 0)
    }

    /// 記録済みのプロジェクト名を取得する。重複は取り除かない。
    pub fn get_projects(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(r#"SELECT project FROM "time-entry" LIMIT ?1"#)?;
        let projects = stmt
            .query_map(params![PROJECTS_LIMIT as i64], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(projects)
    }

    /// プロジェクトに記録済みのタスク名を取得する。重複は取り除かない。
    pub fn get_tasks(&self, project: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(r#"SELECT task FROM "time-entry" WHERE project = ?1 LIMIT ?2"#)?;
        let tasks = stmt
            .query_map(params![project, TASKS_LIMIT as i64], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(tasks)
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// 保存用の文字列に変換する。
///
/// 桁数固定のUTC表記にすることで、文字列の大小と時刻の前後を一致させる。
pub(crate) fn to_sql_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn timestamp_column(row: &Row, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(index)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|datetime| datetime.to_utc())
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err)))
}

fn time_entry_from_row(row: &Row) -> rusqlite::Result<TimeEntry> {
    Ok(TimeEntry {
        id: row.get(0)?,
        project: row.get(1)?,
        task: row.get(2)?,
        start: timestamp_column(row, 3)?,
        end: timestamp_column(row, 4)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rstest::rstest;

    use super::{SortField, SortOrder, Store, TimeEntryQuery};
    use crate::error::StoreError;
    use crate::time_entry::{CurrentTimeEntry, TimeEntry};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap()
    }

    fn entry(id: &str, project: &str, task: &str, start: DateTime<Utc>) -> TimeEntry {
        TimeEntry {
            id: id.to_string(),
            project: project.to_string(),
            task: task.to_string(),
            start,
            end: start + Duration::hours(1),
        }
    }

    #[test]
    fn test_current_time_entry_lifecycle() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.get_current_time_entry().unwrap(), None);

        let current = CurrentTimeEntry::new("project", "task", at(9, 0));
        let id = store.insert_current_time_entry(&current).unwrap();

        assert_eq!(id, current.id);
        assert_eq!(store.get_current_time_entry().unwrap(), Some(current));

        store.delete_current_time_entry().unwrap();
        assert_eq!(store.get_current_time_entry().unwrap(), None);
    }

    /// 保存して読み出した値が一致することを確認する。
    ///
    /// - ナノ秒まで保持されること
    #[test]
    fn test_insert_and_get_time_entry() {
        let store = Store::open_in_memory().unwrap();
        let start = at(9, 0) + Duration::nanoseconds(123_456_789);
        let original = TimeEntry {
            id: "id-1".to_string(),
            project: "project".to_string(),
            task: "task".to_string(),
            start,
            end: start + Duration::minutes(90),
        };

        store.insert_time_entry(&original).unwrap();

        assert_eq!(store.get_time_entry("id-1").unwrap(), Some(original));
        assert_eq!(store.get_time_entry("unknown").unwrap(), None);
    }

    #[test]
    fn test_insert_duplicate_id_fails() {
        let store = Store::open_in_memory().unwrap();
        store.insert_time_entry(&entry("id-1", "a", "t", at(9, 0))).unwrap();

        let result = store.insert_time_entry(&entry("id-1", "a", "t", at(10, 0)));

        assert!(matches!(result, Err(StoreError::Database(_))));
    }

    #[rstest]
    #[case::all(TimeEntryQuery::new().sort_by(SortField::Start, SortOrder::Ascending), &["1", "2", "3", "4"])]
    #[case::by_project(
        TimeEntryQuery::new().project("a").sort_by(SortField::Start, SortOrder::Ascending),
        &["1", "3"],
    )]
    #[case::by_project_and_task(TimeEntryQuery::new().project("a").task("y"), &["3"])]
    #[case::range(
        TimeEntryQuery::new()
            .start_from(at(10, 0))
            .start_before(at(12, 0))
            .sort_by(SortField::Start, SortOrder::Ascending),
        &["2", "3"],
    )]
    #[case::latest(
        TimeEntryQuery::new().sort_by(SortField::Start, SortOrder::Descending).limit(1),
        &["4"],
    )]
    #[case::by_id(TimeEntryQuery::new().id("2"), &["2"])]
    fn test_get_time_entries(#[case] query: TimeEntryQuery, #[case] expected: &[&str]) {
        let store = Store::open_in_memory().unwrap();
        store.insert_time_entry(&entry("1", "a", "x", at(9, 0))).unwrap();
        store.insert_time_entry(&entry("3", "a", "y", at(11, 0))).unwrap();
        store.insert_time_entry(&entry("2", "b", "x", at(10, 0))).unwrap();
        store.insert_time_entry(&entry("4", "b", "y", at(12, 0))).unwrap();

        let ids: Vec<String> = store
            .get_time_entries(&query)
            .unwrap()
            .into_iter()
            .map(|entry| entry.id)
            .collect();

        assert_eq!(ids, expected);
    }

    #[test]
    fn test_update_time_entry() {
        let store = Store::open_in_memory().unwrap();
        let original = entry("id-1", "a", "x", at(9, 0));
        store.insert_time_entry(&original).unwrap();

        let edited = TimeEntry {
            task: "changed".to_string(),
            ..original
        };
        assert!(store.update_time_entry(&edited).unwrap());
        assert_eq!(store.get_time_entry("id-1").unwrap(), Some(edited));

        let missing = entry("missing", "a", "x", at(9, 0));
        assert!(!store.update_time_entry(&missing).unwrap());
    }

    #[test]
    fn test_delete_time_entry_twice() {
        let store = Store::open_in_memory().unwrap();
        store.insert_time_entry(&entry("id-1", "a", "x", at(9, 0))).unwrap();

        assert!(store.delete_time_entry("id-1").unwrap());
        assert!(!store.delete_time_entry("id-1").unwrap());
    }

    #[test]
    fn test_get_projects_and_tasks_are_bounded() {
        let store = Store::open_in_memory().unwrap();
        for i in 0..120 {
            let project = if i % 2 == 0 { "even" } else { "odd" };
            store
                .insert_time_entry(&entry(&i.to_string(), project, "task", at(9, 0)))
                .unwrap();
        }

        assert_eq!(store.get_projects().unwrap().len(), 100);
        let tasks = store.get_tasks("even").unwrap();
        assert_eq!(tasks.len(), 10);
        assert!(tasks.iter().all(|task| task == "task"));
        assert!(store.get_tasks("none").unwrap().is_empty());
    }

    #[test]
    fn test_in_transaction_rolls_back_on_error() {
        let store = Store::open_in_memory().unwrap();

        let result: Result<(), StoreError> = store.in_transaction(|store| {
            store.insert_time_entry(&entry("id-1", "a", "x", at(9, 0)))?;
            store.insert_time_entry(&entry("id-1", "a", "x", at(10, 0)))?;
            Ok(())
        });

        assert!(result.is_err());
        assert_eq!(store.get_time_entry("id-1").unwrap(), None);
    }

    #[test]
    fn test_open_creates_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("time-tracker.db");

        let store = Store::open(&path).unwrap();
        store
            .insert_time_entry(&entry("id-1", "a", "x", at(9, 0)))
            .unwrap();
        store.close().unwrap();

        let reopened = Store::open(&path).unwrap();
        assert!(reopened.get_time_entry("id-1").unwrap().is_some());
    }
}
