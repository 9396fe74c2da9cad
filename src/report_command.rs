use anyhow::{Context, Result};
use log::info;

use crate::datetime::DateRange;
use crate::store::{SortField, SortOrder, Store, TimeEntryQuery};
use crate::time_entry::TimeEntry;

/// 期間の集計を表示するためのサブコマンド。
///
/// 期間を指定しない場合は今週の月曜日から今日までを集計する。
#[derive(Debug, Default, clap::Args)]
pub struct ReportArgs {
    #[clap(long = "today", help = "Shows the report for today", conflicts_with = "last-week")]
    today: bool,
    #[clap(long = "last-week", help = "Shows the report for last week")]
    last_week: bool,
    #[clap(short = 'p', long = "project", help = "Filters the report by project")]
    project: Option<String>,
    #[clap(short = 't', long = "task", help = "Filters the report by task")]
    task: Option<String>,
}

/// 集計対象の期間とtime entry。
#[derive(Debug)]
pub struct Report {
    pub title: String,
    pub range: DateRange,
    pub entries: Vec<TimeEntry>,
}

pub struct ReportCommand<'a> {
    store: &'a Store,
}

impl<'a> ReportCommand<'a> {
    /// 新しい`ReportCommand`を返す。
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// `report`サブコマンドの処理を行う。
    pub fn run(&self, args: ReportArgs) -> Result<Report> {
        let (mut title, range) = if args.last_week {
            ("Last Week".to_string(), DateRange::last_week()?)
        } else if args.today {
            ("Today".to_string(), DateRange::today()?)
        } else {
            ("This Week".to_string(), DateRange::this_week()?)
        };
        info!("Report from {} to {}", range.start, range.end);

        let mut query = TimeEntryQuery::new()
            .start_from(range.start.to_utc())
            .start_before(range.end.to_utc())
            .sort_by(SortField::Start, SortOrder::Ascending);
        if let Some(project) = &args.project {
            query = query.project(project);
            title.push_str(&format!(" (Project: {})", project));
        }
        if let Some(task) = &args.task {
            query = query.task(task);
            title.push_str(&format!(" (Task: {})", task));
        }

        let entries = self
            .store
            .get_time_entries(&query)
            .context("Failed to retrieve time entries")?;

        Ok(Report {
            title,
            range,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Local, TimeZone, Utc};
    use clap::Parser;

    use super::{ReportArgs, ReportCommand};
    use crate::datetime::{mock_datetime, DateRange};
    use crate::store::Store;
    use crate::time_entry::TimeEntry;

    fn insert(store: &Store, id: &str, project: &str, days_ago: i64) {
        let start = Local
            .with_ymd_and_hms(2024, 1, 10, 9, 0, 0)
            .unwrap()
            .to_utc()
            - Duration::days(days_ago);
        store
            .insert_time_entry(&TimeEntry {
                id: id.to_string(),
                project: project.to_string(),
                task: "task".to_string(),
                start,
                end: start + Duration::hours(1),
            })
            .unwrap();
    }

    /// 2024-01-10は水曜日。
    fn run(args: ReportArgs) -> (String, DateRange, Vec<String>) {
        let store = Store::open_in_memory().unwrap();
        insert(&store, "today", "alpha", 0);
        insert(&store, "monday", "beta", 2);
        insert(&store, "last-week", "alpha", 7);
        mock_datetime::set_mock_time(
            Local
                .with_ymd_and_hms(2024, 1, 10, 18, 0, 0)
                .unwrap()
                .with_timezone(&Utc),
        );

        let report = ReportCommand::new(&store).run(args);

        mock_datetime::clear_mock_time();
        let report = report.unwrap();
        let ids = report.entries.into_iter().map(|entry| entry.id).collect();
        (report.title, report.range, ids)
    }

    #[test]
    fn test_report_this_week_by_default() {
        let (title, range, ids) = run(ReportArgs::default());

        assert_eq!(title, "This Week");
        assert_eq!(range.first_day().to_string(), "2024-01-08");
        assert_eq!(range.last_day().to_string(), "2024-01-10");
        assert_eq!(ids, vec!["monday", "today"]);
    }

    #[test]
    fn test_report_today() {
        let (title, _, ids) = run(ReportArgs {
            today: true,
            ..Default::default()
        });

        assert_eq!(title, "Today");
        assert_eq!(ids, vec!["today"]);
    }

    #[test]
    fn test_today_conflicts_with_last_week() {
        let result = crate::Args::try_parse_from(["time-tracker", "report", "--today", "--last-week"]);

        assert!(result.is_err());
    }

    #[test]
    fn test_report_last_week_with_project() {
        let (title, range, ids) = run(ReportArgs {
            last_week: true,
            project: Some("alpha".to_string()),
            ..Default::default()
        });

        assert_eq!(title, "Last Week (Project: alpha)");
        assert_eq!(range.first_day().to_string(), "2024-01-01");
        assert_eq!(range.last_day().to_string(), "2024-01-07");
        assert_eq!(ids, vec!["last-week"]);
    }
}
