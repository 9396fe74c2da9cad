use anyhow::{Context, Result};
use chrono::{
    DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc,
};

#[cfg(not(test))]
/// 現在のUTC時間を取得する。
pub fn now() -> DateTime<Utc> {
    Utc::now()
}


#[cfg(test)]
pub use mock_datetime::now;

/// 秒以下を切り捨てる。
pub fn start_of_minute(datetime: DateTime<Utc>) -> DateTime<Utc> {
    datetime
        .with_second(0)
        .and_then(|datetime| datetime.with_nanosecond(0))
        .unwrap_or(datetime)
}

/// 開始を含み終了を含まない期間。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

impl DateRange {
    /// Localタイムゾーンで指定された日付の1日。
    pub fn day(date: NaiveDate) -> Result<Self> {
        Self::days(date, date)
    }

    /// `first`から`last`までの日数分の期間。両端の日付を含む。
    pub fn days(first: NaiveDate, last: NaiveDate) -> Result<Self> {
        let next = last
            .succ_opt()
            .with_context(|| format!("Failed to get the day after {}", last))?;
        Ok(Self {
            start: local_midnight(first)?,
            end: local_midnight(next)?,
        })
    }

    pub fn today() -> Result<Self> {
        Self::day(local_today())
    }

    pub fn yesterday() -> Result<Self> {
        Self::day(local_today() - Duration::days(1))
    }

    /// 今週の月曜日から今日までの期間。
    pub fn this_week() -> Result<Self> {
        let today = local_today();
        Self::days(monday_of(today), today)
    }

    /// 先週の月曜日から日曜日までの期間。
    pub fn last_week() -> Result<Self> {
        let monday = monday_of(local_today()) - Duration::weeks(1);
        Self::days(monday, monday + Duration::days(6))
    }

    /// 期間に含まれる最初の日付。
    pub fn first_day(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// 期間に含まれる最後の日付。
    pub fn last_day(&self) -> NaiveDate {
        (self.end - Duration::nanoseconds(1)).date_naive()
    }
}

/// Localタイムゾーンでの今日の日付。
pub fn local_today() -> NaiveDate {
    now().with_timezone(&Local).date_naive()
}

/// 日付が属する週の月曜日。
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn local_midnight(date: NaiveDate) -> Result<DateTime<Local>> {
    let naive_datetime = date
        .and_hms_opt(0, 0, 0)
        .context("Failed to set hour, minute, and second")?;
    to_local(&naive_datetime)
}

fn to_local(naive_datetime: &NaiveDateTime) -> Result<DateTime<Local>> {
    Local
        .from_local_datetime(naive_datetime)
        .earliest()
        .with_context(|| format!("Failed to convert to DateTime<Local>: {}", naive_datetime))
}

/// 日付をパースする。
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("Failed to parse date: {}", s))
}

/// Localタイムゾーンの日時をパースする。
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    let naive_datetime = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("Failed to parse datetime: {}", s))?;

    Ok(to_local(&naive_datetime)?.to_utc())
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Local, NaiveDate, SecondsFormat, TimeZone, Timelike, Utc, Weekday};
    use rstest::rstest;

    use super::{mock_datetime, monday_of, parse_date, parse_datetime, start_of_minute, DateRange};

    /// モック時間の設定中はその時間を返し、解除後は現在時間に戻ることを確認する。
    ///
    /// 現在時間との比較は秒単位で行う。
    #[test]
    fn test_mock_clock() {
        let fixed = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap();

        mock_datetime::set_mock_time(fixed);
        let mocked = mock_datetime::now();
        mock_datetime::clear_mock_time();

        assert_eq!(mocked, fixed);
        assert_eq!(
            mock_datetime::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        );
    }

    #[test]
    fn test_start_of_minute() {
        let datetime = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 45).unwrap()
            + chrono::Duration::milliseconds(500);

        let truncated = start_of_minute(datetime);

        assert_eq!(truncated, Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap());
    }

    #[rstest]
    #[case::monday(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())]
    #[case::wednesday(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap())]
    #[case::sunday(NaiveDate::from_ymd_opt(2024, 1, 7).unwrap())]
    fn test_monday_of(#[case] date: NaiveDate) {
        assert_eq!(monday_of(date), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_day_range() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let range = DateRange::day(date).unwrap();

        assert_eq!(range.start, Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(range.end, Local.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
        assert_eq!(range.first_day(), date);
        assert_eq!(range.last_day(), date);
    }

    /// 2024-01-10(水)を今日とした場合の週の範囲を確認する。
    #[test]
    fn test_week_ranges() {
        mock_datetime::set_mock_time(Local.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap().to_utc());

        let this_week = DateRange::this_week().unwrap();
        let last_week = DateRange::last_week().unwrap();

        assert_eq!(this_week.first_day(), NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
        assert_eq!(this_week.last_day(), NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert_eq!(last_week.first_day(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(last_week.last_day(), NaiveDate::from_ymd_opt(2024, 1, 7).unwrap());
        assert_eq!(last_week.first_day().weekday(), Weekday::Mon);
        mock_datetime::clear_mock_time();
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("2024/02/29").is_err());
    }

    #[test]
    fn test_parse_datetime() {
        let parsed = parse_datetime("2024-01-01 09:15:30").unwrap();

        let local = parsed.with_timezone(&Local);
        assert_eq!((local.hour(), local.minute(), local.second()), (9, 15, 30));
        assert!(parse_datetime("2024-01-01").is_err());
    }
}
