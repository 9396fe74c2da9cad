use rusqlite::Connection;

use crate::error::StoreError;

/// テーブルとインデックスが存在しなければ作成する。
///
/// 起動のたびに呼び出してよい。
pub fn migrate(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS "current-time-entry" (
            id TEXT PRIMARY KEY,
            project TEXT NOT NULL,
            task TEXT NOT NULL,
            start_time TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS "time-entry" (
            id TEXT PRIMARY KEY,
            project TEXT NOT NULL,
            task TEXT NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS "idx_time-entry_project" ON "time-entry"(project);
        CREATE INDEX IF NOT EXISTS "idx_time-entry_start_time" ON "time-entry"(start_time);

        CREATE TABLE IF NOT EXISTS clockify_time_entries (
            id TEXT PRIMARY KEY,
            time_entry_id TEXT NOT NULL,
            clockify_id TEXT NOT NULL,
            deleted INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_clockify_time_entries_time_entry_id
            ON clockify_time_entries(time_entry_id);

        CREATE TABLE IF NOT EXISTS clockify_config (
            id TEXT PRIMARY KEY,
            api_key TEXT NOT NULL,
            workspace_id TEXT NOT NULL,
            project_id TEXT
        );
        "#,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::migrate;

    #[test]
    fn test_migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        migrate(&conn).unwrap();
        migrate(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 4);
    }

    #[test]
    fn test_migrate_creates_project_index() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        let indexes: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'idx_time-entry_project'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(indexes, 1);
    }
}
