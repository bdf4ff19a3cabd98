use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A calendar month, the unit budgets and summaries are computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMonthYear")]
pub struct MonthYear {
    // field order matters for the derived Ord: year first
    year: i32,
    month: u32,
}

#[derive(Deserialize)]
struct RawMonthYear {
    year: i32,
    month: u32,
}

impl TryFrom<RawMonthYear> for MonthYear {
    type Error = PeriodError;

    fn try_from(raw: RawMonthYear) -> Result<Self, Self::Error> {
        MonthYear::new(raw.month, raw.year)
    }
}

impl MonthYear {
    pub fn new(month: u32, year: i32) -> Result<Self, PeriodError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodError::InvalidMonth(month));
        }
        // Both bounds must exist as calendar dates.
        if NaiveDate::from_ymd_opt(year, month, 1).is_none()
            || NaiveDate::from_ymd_opt(year + 1, 1, 1).is_none()
        {
            return Err(PeriodError::InvalidYear(year));
        }
        Ok(Self { year, month })
    }

    /// The month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// The previous calendar month. January wraps to December of the year before.
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// First day of the month.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the month (inclusive upper bound).
    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day() - Duration::days(1)
    }

    /// The `count` months ending at (and including) `self`, oldest first.
    /// Fails once a month would fall outside the calendar chrono supports.
    pub fn trailing(&self, count: usize) -> Result<Vec<MonthYear>, PeriodError> {
        let mut months = Vec::new();
        let mut current = *self;
        for _ in 0..count {
            months.push(MonthYear::new(current.month, current.year)?);
            current = current.previous();
        }
        months.reverse();
        Ok(months)
    }

    /// Display label, e.g. "3/2024".
    pub fn label(&self) -> String {
        format!("{}/{}", self.month, self.year)
    }
}

impl std::fmt::Display for MonthYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for MonthYear {
    type Err = PeriodError;

    /// Accepts `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| PeriodError::InvalidFormat(s.to_string()))?;
        let year: i32 = year
            .parse()
            .map_err(|_| PeriodError::InvalidFormat(s.to_string()))?;
        let month: u32 = month
            .parse()
            .map_err(|_| PeriodError::InvalidFormat(s.to_string()))?;
        MonthYear::new(month, year)
    }
}

/// Date filter for ledger queries. Both bounds are inclusive; a missing bound
/// is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// An explicit `[start, end]` range. Fails when `end` is before `start`.
    pub fn between(start: NaiveDate, end: NaiveDate) -> Result<Self, PeriodError> {
        if end < start {
            return Err(PeriodError::EndBeforeStart { start, end });
        }
        Ok(Self {
            start: Some(start),
            end: Some(end),
        })
    }

    /// Everything on or after `start`.
    pub fn since(start: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// The whole calendar month.
    pub fn month(period: MonthYear) -> Self {
        Self {
            start: Some(period.first_day()),
            end: Some(period.last_day()),
        }
    }

    /// The `days` days before `today`, with no upper bound.
    pub fn trailing_days(today: NaiveDate, days: i64) -> Result<Self, PeriodError> {
        Ok(Self::since(days_before(today, days)?))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

/// `today` minus `days`. Negative windows and dates past chrono's range are
/// rejected.
pub fn days_before(today: NaiveDate, days: i64) -> Result<NaiveDate, PeriodError> {
    if days < 0 {
        return Err(PeriodError::WindowOutOfRange(days));
    }
    Duration::try_days(days)
        .and_then(|span| today.checked_sub_signed(span))
        .ok_or(PeriodError::WindowOutOfRange(days))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),
    #[error("year out of range: {0}")]
    InvalidYear(i32),
    #[error("invalid month '{0}', expected YYYY-MM")]
    InvalidFormat(String),
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("a window of {0} days is out of range")]
    WindowOutOfRange(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_previous_wraps_january() {
        let jan = MonthYear::new(1, 2024).unwrap();
        assert_eq!(jan.previous(), MonthYear::new(12, 2023).unwrap());
        let mar = MonthYear::new(3, 2024).unwrap();
        assert_eq!(mar.previous(), MonthYear::new(2, 2024).unwrap());
    }

    #[test]
    fn test_month_bounds() {
        let feb = MonthYear::new(2, 2024).unwrap();
        assert_eq!(feb.first_day(), date(2024, 2, 1));
        assert_eq!(feb.last_day(), date(2024, 2, 29));
        let dec = MonthYear::new(12, 2023).unwrap();
        assert_eq!(dec.last_day(), date(2023, 12, 31));
    }

    #[test]
    fn test_trailing_crosses_year() {
        let months = MonthYear::new(3, 2024).unwrap().trailing(6).unwrap();
        let labels: Vec<String> = months.iter().map(|m| m.label()).collect();
        assert_eq!(
            labels,
            vec!["10/2023", "11/2023", "12/2023", "1/2024", "2/2024", "3/2024"]
        );
        assert!(MonthYear::new(3, 2024).unwrap().trailing(0).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_month() {
        assert_eq!(MonthYear::new(0, 2024), Err(PeriodError::InvalidMonth(0)));
        assert_eq!(MonthYear::new(13, 2024), Err(PeriodError::InvalidMonth(13)));
    }

    #[test]
    fn test_parse_month_year() {
        let parsed: MonthYear = "2024-03".parse().unwrap();
        assert_eq!(parsed, MonthYear::new(3, 2024).unwrap());
        assert!("2024/03".parse::<MonthYear>().is_err());
        assert!("2024-13".parse::<MonthYear>().is_err());
    }

    #[test]
    fn test_date_range_rejects_reversed_bounds() {
        let result = DateRange::between(date(2024, 3, 10), date(2024, 3, 1));
        assert!(matches!(result, Err(PeriodError::EndBeforeStart { .. })));
        assert!(DateRange::between(date(2024, 3, 1), date(2024, 3, 1)).is_ok());
    }

    #[test]
    fn test_date_range_contains_is_inclusive() {
        let range = DateRange::month(MonthYear::new(3, 2024).unwrap());
        assert!(range.contains(date(2024, 3, 1)));
        assert!(range.contains(date(2024, 3, 31)));
        assert!(!range.contains(date(2024, 4, 1)));

        let window = DateRange::trailing_days(date(2024, 3, 31), 30).unwrap();
        assert!(window.contains(date(2024, 3, 1)));
        assert!(!window.contains(date(2024, 2, 29)));
        assert!(window.contains(date(2025, 1, 1)));
    }

    #[test]
    fn test_trailing_stops_at_calendar_limit() {
        let earliest = MonthYear::of(NaiveDate::MIN);
        assert_eq!(earliest.trailing(1).unwrap(), vec![earliest]);
        assert!(matches!(
            earliest.trailing(2),
            Err(PeriodError::InvalidYear(_))
        ));
    }

    #[test]
    fn test_days_before_rejects_out_of_range_windows() {
        let today = date(2024, 3, 31);
        assert_eq!(days_before(today, 0), Ok(today));
        assert_eq!(days_before(today, 31), Ok(date(2024, 2, 29)));
        assert_eq!(
            days_before(today, -1),
            Err(PeriodError::WindowOutOfRange(-1))
        );
        assert_eq!(
            days_before(today, 400_000_000),
            Err(PeriodError::WindowOutOfRange(400_000_000))
        );
        assert_eq!(
            days_before(today, i64::MAX),
            Err(PeriodError::WindowOutOfRange(i64::MAX))
        );
    }

    #[test]
    fn test_deserialize_validates_month() {
        let parsed: MonthYear = serde_json::from_str(r#"{"year": 2024, "month": 3}"#).unwrap();
        assert_eq!(parsed, MonthYear::new(3, 2024).unwrap());
        assert!(serde_json::from_str::<MonthYear>(r#"{"year": 2024, "month": 13}"#).is_err());
    }
}
