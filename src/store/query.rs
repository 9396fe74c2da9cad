use chrono::{DateTime, Utc};

use super::to_sql_timestamp;

/// 並び替えに利用できるフィールド。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortField {
    Start,
}

impl SortField {
    fn column(self) -> &'static str {
        match self {
            SortField::Start => "start_time",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// `time-entry`に対する検索条件。
///
/// 並び順は`sort_by`を指定した場合のみ保証される。
///
/// # Examples
///
/// ```
/// let query = TimeEntryQuery::new()
///     .project("project")
///     .sort_by(SortField::Start, SortOrder::Descending)
///     .limit(1);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeEntryQuery {
    id: Option<String>,
    project: Option<String>,
    task: Option<String>,
    start_from: Option<DateTime<Utc>>,
    start_before: Option<DateTime<Utc>>,
    sort: Option<(SortField, SortOrder)>,
    limit: Option<usize>,
}

impl TimeEntryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn project(mut self, project: &str) -> Self {
        self.project = Some(project.to_string());
        self
    }

    pub fn task(mut self, task: &str) -> Self {
        self.task = Some(task.to_string());
        self
    }

    /// 開始日時がこの日時以降のものに絞り込む。
    pub fn start_from(mut self, from: DateTime<Utc>) -> Self {
        self.start_from = Some(from);
        self
    }

    /// 開始日時がこの日時より前のものに絞り込む。
    pub fn start_before(mut self, before: DateTime<Utc>) -> Self {
        self.start_before = Some(before);
        self
    }

    pub fn sort_by(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort = Some((field, order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// WHERE句以降のSQLとバインドするパラメータを組み立てる。
    pub(super) fn to_sql(&self) -> (String, Vec<String>) {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        let mut push = |condition: &str, value: String| {
            params.push(value);
            conditions.push(format!("{} ?{}", condition, params.len()));
        };
        if let Some(id) = &self.id {
            push("id =", id.clone());
        }
        if let Some(project) = &self.project {
            push("project =", project.clone());
        }
        if let Some(task) = &self.task {
            push("task =", task.clone());
        }
        if let Some(from) = &self.start_from {
            push("start_time >=", to_sql_timestamp(from));
        }
        if let Some(before) = &self.start_before {
            push("start_time <", to_sql_timestamp(before));
        }

        let mut sql = String::new();
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        if let Some((field, order)) = self.sort {
            let direction = match order {
                SortOrder::Ascending => "ASC",
                SortOrder::Descending => "DESC",
            };
            sql.push_str(&format!(" ORDER BY {} {}", field.column(), direction));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        (sql, params)
    }
}
