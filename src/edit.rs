use std::env;
use std::fs;
use std::io::Write;
use std::process::Command;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, Utc};
use log::debug;

use crate::datetime::parse_datetime;
use crate::error::EditError;
use crate::time_entry::TimeEntry;

const EDITOR: &str = "vim";
const ID_PREFIX: &str = "ID:";

/// 編集によって変更されたフィールド。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldChange {
    pub field: &'static str,
    pub before: String,
    pub after: String,
}

/// 編集結果。
#[derive(Clone, Debug, PartialEq)]
pub struct EditOutcome {
    pub entry: TimeEntry,
    pub changes: Vec<FieldChange>,
}

/// 編集用のテキストを作成する。
pub fn render(entry: &TimeEntry) -> String {
    [
        "# Modify this file to change the time entry".to_string(),
        "# Don't change the ID line".to_string(),
        String::new(),
        format!("ID: {} # Don't change this line", entry.id),
        format!("Project: {}", entry.project),
        format!("Task: {}", entry.task),
        format!("Start: {}", format_timestamp(&entry.start)),
        format!("End: {}", format_timestamp(&entry.end)),
        String::new(),
    ]
    .join("\n")
}

fn format_timestamp(datetime: &DateTime<Utc>) -> String {
    datetime
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// 編集後のテキストを元のtime entryに反映する。
///
/// 値が空、または行がない場合は元の値を使う。
/// 日時が元の表示と同じ場合は、秒未満を含めて元の値を使う。
pub fn apply(original: &TimeEntry, text: &str) -> Result<EditOutcome, EditError> {
    let id = find_value(text, ID_PREFIX).unwrap_or_else(|| original.id.clone());
    if id != original.id {
        return Err(EditError::IdChanged {
            expected: original.id.clone(),
            found: id,
        });
    }

    let project = find_value(text, "Project:").unwrap_or_else(|| original.project.clone());
    let task = find_value(text, "Task:").unwrap_or_else(|| original.task.clone());
    let start = parse_timestamp(text, "Start:", "start", &original.start)?;
    let end = parse_timestamp(text, "End:", "end", &original.end)?;
    if end < start {
        return Err(EditError::EndBeforeStart);
    }

    let entry = TimeEntry {
        id,
        project,
        task,
        start,
        end,
    };
    let changes = diff(original, &entry);

    Ok(EditOutcome { entry, changes })
}

fn parse_timestamp(
    text: &str,
    prefix: &str,
    field: &'static str,
    original: &DateTime<Utc>,
) -> Result<DateTime<Utc>, EditError> {
    match find_value(text, prefix) {
        None => Ok(*original),
        Some(value) if value == format_timestamp(original) => Ok(*original),
        Some(value) => parse_datetime(&value).map_err(|_| EditError::InvalidTimestamp {
            field,
            value,
        }),
    }
}

/// `prefix`で始まる最初の行の値を取得する。
///
/// `#`で始まる行はコメントとして読み飛ばす。
/// 値の途中の`#`はラベルの一部として扱い、`ID:`の行のみ`#`以降を取り除く。
fn find_value(text: &str, prefix: &str) -> Option<String> {
    text.lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .find(|line| line.starts_with(prefix))
        .map(|line| {
            let value = &line[prefix.len()..];
            let value = if prefix == ID_PREFIX {
                value.split('#').next().unwrap_or_default()
            } else {
                value
            };
            value.trim().to_string()
        })
        .filter(|value| !value.is_empty())
}

fn diff(before: &TimeEntry, after: &TimeEntry) -> Vec<FieldChange> {
    let fields = [
        ("project", before.project.clone(), after.project.clone()),
        ("task", before.task.clone(), after.task.clone()),
        (
            "start",
            format_timestamp(&before.start),
            format_timestamp(&after.start),
        ),
        (
            "end",
            format_timestamp(&before.end),
            format_timestamp(&after.end),
        ),
    ];

    fields
        .into_iter()
        .filter(|(_, before, after)| before != after)
        .map(|(field, before, after)| FieldChange {
            field,
            before,
            after,
        })
        .collect()
}

/// エディタでtime entryを編集する。
///
/// 環境変数`EDITOR`が設定されていない場合は`vim`を使う。
pub fn edit_in_editor(entry: &TimeEntry) -> Result<EditOutcome> {
    let mut file = tempfile::Builder::new()
        .prefix("time-tracker-entry-")
        .suffix(".txt")
        .tempfile()
        .context("Failed to create temporary file")?;
    file.write_all(render(entry).as_bytes())
        .context("Failed to write temporary file")?;
    file.flush().context("Failed to write temporary file")?;

    let editor = env::var("EDITOR").unwrap_or_else(|_| EDITOR.to_string());
    debug!("Opening {} with {}", file.path().display(), editor);
    let status = Command::new(&editor)
        .arg(file.path())
        .status()
        .with_context(|| format!("Failed to run editor: {}", editor))?;
    if !status.success() {
        bail!("Editor exited with {}", status);
    }

    let edited = fs::read_to_string(file.path()).context("Failed to read edited file")?;
    Ok(apply(entry, &edited)?)
}
