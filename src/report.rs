use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};

use crate::time_entry::TimeEntry;

/// 合計時間を計算する。
pub fn total_duration(entries: &[TimeEntry]) -> Duration {
    entries
        .iter()
        .fold(Duration::zero(), |total, entry| total + entry.duration())
}

/// Localタイムゾーンの開始日ごとに合計時間を計算する。
pub fn durations_by_day(entries: &[TimeEntry]) -> BTreeMap<NaiveDate, Duration> {
    entries.iter().fold(BTreeMap::new(), |mut accumulate, entry| {
        let total = accumulate
            .entry(local_day(entry))
            .or_insert_with(Duration::zero);
        *total = *total + entry.duration();
        accumulate
    })
}

/// プロジェクトごとに合計時間を計算する。
pub fn durations_by_project(entries: &[TimeEntry]) -> BTreeMap<String, Duration> {
    entries.iter().fold(BTreeMap::new(), |mut accumulate, entry| {
        let total = accumulate
            .entry(entry.project.clone())
            .or_insert_with(Duration::zero);
        *total = *total + entry.duration();
        accumulate
    })
}

/// Localタイムゾーンの開始日ごとにtime entryをまとめる。
pub fn group_by_day(entries: &[TimeEntry]) -> BTreeMap<NaiveDate, Vec<TimeEntry>> {
    entries.iter().fold(BTreeMap::new(), |mut accumulate, entry| {
        accumulate
            .entry(local_day(entry))
            .or_insert_with(Vec::new)
            .push(entry.clone());
        accumulate
    })
}

pub fn group_by_project(entries: &[TimeEntry]) -> BTreeMap<String, Vec<TimeEntry>> {
    entries.iter().fold(BTreeMap::new(), |mut accumulate, entry| {
        accumulate
            .entry(entry.project.clone())
            .or_insert_with(Vec::new)
            .push(entry.clone());
        accumulate
    })
}

fn local_day(entry: &TimeEntry) -> NaiveDate {
    entry.start.with_timezone(&Local).date_naive()
}

/// 合計に対する割合を百分率で返す。合計が0の場合は0とする。
pub fn percentage(part: Duration, total: Duration) -> f64 {
    if total <= Duration::zero() {
        return 0.0;
    }
    part.num_milliseconds() as f64 / total.num_milliseconds() as f64 * 100.0
}

/// 土日を除いた日数を数える。両端の日付を含む。
pub fn count_working_days(first: NaiveDate, last: NaiveDate) -> u32 {
    first
        .iter_days()
        .take_while(|date| *date <= last)
        .filter(|date| !matches!(date.weekday(), Weekday::Sat | Weekday::Sun))
        .count() as u32
}

/// 期間全体の集計。
#[derive(Debug, PartialEq)]
pub struct Summary {
    pub total: Duration,
    pub projects: usize,
    pub tasks: usize,
    pub entries: usize,
    pub working_days: u32,
}

impl Summary {
    pub fn new(entries: &[TimeEntry], first: NaiveDate, last: NaiveDate) -> Self {
        let projects: HashSet<&str> = entries.iter().map(|entry| entry.project.as_str()).collect();
        let tasks: HashSet<&str> = entries.iter().map(|entry| entry.task.as_str()).collect();

        Self {
            total: total_duration(entries),
            projects: projects.len(),
            tasks: tasks.len(),
            entries: entries.len(),
            working_days: count_working_days(first, last),
        }
    }

    /// 1営業日あたりの平均時間(時間単位)。営業日がない場合は0とする。
    pub fn average_hours_per_working_day(&self) -> f64 {
        if self.working_days == 0 {
            return 0.0;
        }
        hours(self.total) / self.working_days as f64
    }
}

/// 時間単位に変換する。
pub fn hours(duration: Duration) -> f64 {
    duration.num_seconds() as f64 / 3600.0
}

/// `2h 30m`の形式で表示する。
pub fn format_duration(duration: Duration) -> String {
    let hours = duration.num_hours();
    let minutes = duration.num_minutes() % 60;

    match (hours, minutes) {
        (0, 0) => "0h 0m".to_string(),
        (0, minutes) => format!("{}m", minutes),
        (hours, 0) => format!("{}h", hours),
        (hours, minutes) => format!("{}h {}m", hours, minutes),
    }
}
