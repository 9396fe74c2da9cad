use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

/// 計測中のtime entry。
///
/// 同時に存在できるのは高々1件。
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CurrentTimeEntry {
    pub id: String,
    pub project: String,
    pub task: String,
    pub start: DateTime<Utc>,
}

impl CurrentTimeEntry {
    /// 新しいIDを採番して`CurrentTimeEntry`を返す。
    pub fn new(project: &str, task: &str, start: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            project: project.to_string(),
            task: task.to_string(),
            start,
        }
    }

    /// 指定時刻で終了した`TimeEntry`に変換する。IDは引き継ぐ。
    pub fn finish(&self, end: DateTime<Utc>) -> TimeEntry {
        TimeEntry {
            id: self.id.clone(),
            project: self.project.clone(),
            task: self.task.clone(),
            start: self.start,
            end,
        }
    }
}

/// 終了済みのtime entry。
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimeEntry {
    pub id: String,
    pub project: String,
    pub task: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeEntry {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}
