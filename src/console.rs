use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, Utc};

use crate::clockify::SyncReport;
use crate::datetime::DateRange;
use crate::edit::FieldChange;
use crate::report::{self, format_duration, Summary};
use crate::time_entry::{CurrentTimeEntry, TimeEntry};

/// Consoleにtime entryを表示するためのtrait。
pub trait ConsolePresenter {
    /// タイムエントリーを表示する。
    ///
    /// # Arguments
    ///
    /// * `time_entries` - 表示するタイムエントリー
    /// * `show_id` - IDを表示するかどうか
    fn show_time_entries(&mut self, time_entries: &[TimeEntry], show_id: bool) -> Result<()>;

    /// 計測中のタイムエントリーを表示する。
    fn show_status(
        &mut self,
        current: Option<&CurrentTimeEntry>,
        now: DateTime<Utc>,
        raw: bool,
    ) -> Result<()>;

    /// 期間の集計結果を表示する。
    fn show_report(&mut self, title: &str, range: &DateRange, entries: &[TimeEntry]) -> Result<()>;

    /// 値の一覧を表示する。重複は最初の1件のみ表示する。
    fn show_values(&mut self, values: &[String]) -> Result<()>;

    /// 編集で変更されたフィールドを表示する。
    fn show_changes(&mut self, changes: &[FieldChange]) -> Result<()>;

    /// Clockifyへの送信結果を表示する。
    fn show_sync_report(&mut self, report: &SyncReport, deletions: usize) -> Result<()>;
}

/// Markdownのlist形式で表示する。
pub struct ConsoleMarkdownList<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleMarkdownList<'a, W> {
    /// 新しい`ConsoleMarkdownList`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }

    fn line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{}", line).context("Failed to write to console")
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleMarkdownList<'a, W> {
    // time entryをlist形式で表示する。
    fn show_time_entries(&mut self, time_entries: &[TimeEntry], show_id: bool) -> Result<()> {
        let mut sorted_entries = time_entries.to_vec();
        sorted_entries.sort_by_key(|entry| entry.start);

        for entry in sorted_entries {
            let id = if show_id {
                format!("[{}] ", entry.id)
            } else {
                String::new()
            };
            self.line(&format!(
                "- {}{} ~ {}: {} - {} ({})",
                id,
                local(&entry.start, "%Y-%m-%d %H:%M"),
                local(&entry.end, "%H:%M"),
                entry.project,
                entry.task,
                format_duration(entry.duration())
            ))?;
        }

        Ok(())
    }

    fn show_status(
        &mut self,
        current: Option<&CurrentTimeEntry>,
        now: DateTime<Utc>,
        raw: bool,
    ) -> Result<()> {
        let current = match current {
            Some(current) => current,
            None => return self.line("No running time entry"),
        };
        if raw {
            return self.line(&format!("{} {}", current.project, current.task));
        }

        // 開始日時が未来の場合は0とする
        let duration = (now - current.start).max(Duration::zero());
        self.line(&format!("Task: {}, {}", current.project, current.task))?;
        self.line(&format!(
            "Started at: {}",
            local(&current.start, "%A, %Y-%m-%d %H:%M:%S")
        ))?;
        self.line(&format!(
            "Duration: {}h {:02}m",
            duration.num_hours(),
            duration.num_minutes() % 60
        ))
    }

    fn show_report(&mut self, title: &str, range: &DateRange, entries: &[TimeEntry]) -> Result<()> {
        let (first, last) = (range.first_day(), range.last_day());
        self.line(&format!("# Time Report: {} ({} - {})", title, first, last))?;
        if entries.is_empty() {
            return self.line("No time entries found for the selected period");
        }

        let summary = Summary::new(entries, first, last);
        self.line("")?;
        self.line("## Summary")?;
        self.line(&format!("- Total Hours: {}", format_duration(summary.total)))?;
        self.line(&format!("- Projects: {}", summary.projects))?;
        self.line(&format!("- Tasks: {}", summary.tasks))?;
        self.line(&format!("- Entries: {}", summary.entries))?;
        self.line(&format!("- Working Days: {}", summary.working_days))?;
        self.line(&format!(
            "- Avg. Working Hours: {:.1}h/day",
            summary.average_hours_per_working_day()
        ))?;

        self.line("")?;
        self.line("## Hours by Project")?;
        let mut by_project: Vec<_> = report::durations_by_project(entries).into_iter().collect();
        by_project.sort_by(|(_, left), (_, right)| right.cmp(left));
        for (project, duration) in by_project {
            self.line(&format!(
                "- {}: {} ({:.1}%)",
                project,
                format_duration(duration),
                report::percentage(duration, summary.total)
            ))?;
        }

        self.line("")?;
        self.line("## Hours by Day")?;
        for (date, duration) in report::durations_by_day(entries) {
            self.line(&format!(
                "- {} ({}): {} ({:.1}%)",
                date,
                date.format("%A"),
                format_duration(duration),
                report::percentage(duration, summary.total)
            ))?;
        }

        for (date, day_entries) in report::group_by_day(entries) {
            self.line("")?;
            self.line(&format!(
                "## {} ({}) - Total: {}",
                date,
                date.format("%A"),
                format_duration(report::total_duration(&day_entries))
            ))?;
            for entry in day_entries {
                self.line(&format!(
                    "- {} ~ {}: {} - {} ({})",
                    local(&entry.start, "%H:%M"),
                    local(&entry.end, "%H:%M"),
                    entry.project,
                    entry.task,
                    format_duration(entry.duration())
                ))?;
            }
        }

        for (project, project_entries) in report::group_by_project(entries) {
            self.line("")?;
            self.line(&format!(
                "## {} - Total: {}",
                project,
                format_duration(report::total_duration(&project_entries))
            ))?;
            let by_task: BTreeMap<&str, Vec<&TimeEntry>> =
                project_entries
                    .iter()
                    .fold(BTreeMap::new(), |mut accumulate, entry| {
                        accumulate.entry(entry.task.as_str()).or_default().push(entry);
                        accumulate
                    });
            for (task, task_entries) in by_task {
                self.line(&format!("- {}", task))?;
                for entry in task_entries {
                    self.line(&format!(
                        "  - {} ~ {}: {}",
                        local(&entry.start, "%m.%d. %H:%M (%a)"),
                        local(&entry.end, "%H:%M"),
                        format_duration(entry.duration())
                    ))?;
                }
            }
        }

        Ok(())
    }

    fn show_values(&mut self, values: &[String]) -> Result<()> {
        let mut shown: Vec<&String> = Vec::new();
        for value in values {
            if !shown.contains(&value) {
                self.line(value)?;
                shown.push(value);
            }
        }

        Ok(())
    }

    fn show_changes(&mut self, changes: &[FieldChange]) -> Result<()> {
        if changes.is_empty() {
            return self.line("No changes");
        }
        for change in changes {
            self.line(&format!(
                "- {}: {} -> {}",
                change.field, change.before, change.after
            ))?;
        }

        Ok(())
    }

    fn show_sync_report(&mut self, report: &SyncReport, deletions: usize) -> Result<()> {
        for id in &report.created {
            self.line(&format!("- created: {}", id))?;
        }
        for id in &report.deleted {
            self.line(&format!("- deleted: {}", id))?;
        }
        for id in &report.unsupported {
            self.line(&format!("- skipped (update is not supported): {}", id))?;
        }
        self.line(&format!(
            "Uploaded {} time entries, removed {} from clockify, skipped {}",
            report.created.len(),
            report.deleted.len() + deletions,
            report.unsupported.len()
        ))
    }
}

fn local(datetime: &DateTime<Utc>, format: &str) -> String {
    datetime.with_timezone(&Local).format(format).to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
    use rstest::rstest;

    use super::{ConsoleMarkdownList, ConsolePresenter};
    use crate::clockify::SyncReport;
    use crate::datetime::DateRange;
    use crate::edit::FieldChange;
    use crate::time_entry::{CurrentTimeEntry, TimeEntry};

    fn local(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(2024, 1, day, hour, minute, 0)
            .unwrap()
            .to_utc()
    }

    /// テスト用にダミーのTimeEntryを作成する。
    fn dummy_entry(pattern: u8) -> TimeEntry {
        match pattern {
            1 => TimeEntry {
                id: "id-1".to_string(),
                project: "project1".to_string(),
                task: "task1".to_string(),
                start: local(1, 9, 0),
                end: local(1, 10, 30),
            },
            2 => TimeEntry {
                id: "id-2".to_string(),
                project: "project2".to_string(),
                task: "task2".to_string(),
                start: local(1, 13, 0),
                end: local(1, 14, 0),
            },
            3 => TimeEntry {
                id: "id-3".to_string(),
                project: "project1".to_string(),
                task: "task1".to_string(),
                start: local(2, 9, 0),
                end: local(2, 9, 45),
            },
            _ => panic!("Invalid pattern: {}", pattern),
        }
    }

    fn output<F>(show: F) -> String
    where
        F: FnOnce(&mut ConsoleMarkdownList<Vec<u8>>),
    {
        let mut writer = Vec::new();
        let mut presenter = ConsoleMarkdownList::new(&mut writer);
        show(&mut presenter);
        String::from_utf8(writer).unwrap()
    }

    /// 正常系のテスト。
    #[rstest]
    #[case::no_entry(&[], false, "")]
    #[case::single(&[dummy_entry(1)], false, "- 2024-01-01 09:00 ~ 10:30: project1 - task1 (1h 30m)\n")]
    #[case::with_id(&[dummy_entry(2)], true, "- [id-2] 2024-01-01 13:00 ~ 14:00: project2 - task2 (1h)\n")]
    #[case::sort_with_start_time(
        &[dummy_entry(3), dummy_entry(1)],
        false,
        "- 2024-01-01 09:00 ~ 10:30: project1 - task1 (1h 30m)\n- 2024-01-02 09:00 ~ 09:45: project1 - task1 (45m)\n",
    )]
    fn test_show_time_entries(
        #[case] input: &[TimeEntry],
        #[case] show_id: bool,
        #[case] expected: &str,
    ) {
        let result = output(|presenter| presenter.show_time_entries(input, show_id).unwrap());

        assert_eq!(result, expected);
    }

    #[rstest]
    #[case::idle(None, false, "No running time entry\n")]
    #[case::raw(Some(CurrentTimeEntry::new("project", "task", local(1, 9, 0))), true, "project task\n")]
    fn test_show_status_short(
        #[case] current: Option<CurrentTimeEntry>,
        #[case] raw: bool,
        #[case] expected: &str,
    ) {
        let result =
            output(|presenter| presenter.show_status(current.as_ref(), local(1, 10, 0), raw).unwrap());

        assert_eq!(result, expected);
    }

    #[test]
    fn test_show_status_duration() {
        let current = CurrentTimeEntry::new("project", "task", local(1, 9, 0));

        let result = output(|presenter| {
            presenter
                .show_status(Some(&current), local(1, 9, 0) + Duration::minutes(125), false)
                .unwrap()
        });

        assert!(result.starts_with("Task: project, task\n"));
        assert!(result.ends_with("Duration: 2h 05m\n"));
    }

    #[test]
    fn test_show_status_future_start() {
        let current = CurrentTimeEntry::new("project", "task", local(1, 10, 30));

        let result = output(|presenter| {
            presenter
                .show_status(Some(&current), local(1, 9, 0), false)
                .unwrap()
        });

        assert!(result.ends_with("Duration: 0h 00m\n"));
    }

    #[test]
    fn test_show_report() {
        let range = DateRange::days(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
        )
        .unwrap();
        let entries = [dummy_entry(1), dummy_entry(2), dummy_entry(3)];

        let result = output(|presenter| presenter.show_report("This Week", &range, &entries).unwrap());

        assert!(result.starts_with("# Time Report: This Week (2024-01-01 - 2024-01-07)\n"));
        assert!(result.contains("- Total Hours: 3h 15m\n"));
        assert!(result.contains("- Working Days: 5\n"));
        assert!(result.contains("- project1: 2h 15m (69.2%)\n"));
        assert!(result.contains("## 2024-01-01 (Monday) - Total: 2h 30m\n"));
        assert!(result.contains("## project2 - Total: 1h\n"));
    }

    #[test]
    fn test_show_report_without_entries() {
        let range = DateRange::day(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).unwrap();

        let result = output(|presenter| presenter.show_report("Today", &range, &[]).unwrap());

        assert_eq!(
            result,
            "# Time Report: Today (2024-01-01 - 2024-01-01)\nNo time entries found for the selected period\n"
        );
    }

    #[test]
    fn test_show_values_skips_duplicates() {
        let values = vec!["a".to_string(), "b".to_string(), "a".to_string()];

        let result = output(|presenter| presenter.show_values(&values).unwrap());

        assert_eq!(result, "a\nb\n");
    }

    #[rstest]
    #[case::no_change(vec![], "No changes\n")]
    #[case::task(
        vec![FieldChange { field: "task", before: "a".to_string(), after: "b".to_string() }],
        "- task: a -> b\n",
    )]
    fn test_show_changes(#[case] changes: Vec<FieldChange>, #[case] expected: &str) {
        let result = output(|presenter| presenter.show_changes(&changes).unwrap());

        assert_eq!(result, expected);
    }

    #[test]
    fn test_show_sync_report() {
        let report = SyncReport {
            created: vec!["id-1".to_string()],
            deleted: vec![],
            unsupported: vec!["id-2".to_string()],
        };

        let result = output(|presenter| presenter.show_sync_report(&report, 2).unwrap());

        assert_eq!(
            result,
            "- created: id-1\n- skipped (update is not supported): id-2\nUploaded 1 time entries, removed 2 from clockify, skipped 1\n"
        );
    }
}
