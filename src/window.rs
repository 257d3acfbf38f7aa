// Date-range resolution: (mode, anchor date) -> inclusive reporting window.
use crate::error::ReportError;
use chrono::{Datelike, Duration, NaiveDate};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Daily,
    Weekly,
    Monthly,
}

impl FromStr for Mode {
    type Err = ReportError;

    // Accepts the English and Spanish spellings used on the original panel.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "diario" => Ok(Mode::Daily),
            "weekly" | "semanal" => Ok(Mode::Weekly),
            "monthly" | "mensual" => Ok(Mode::Monthly),
            _ => Err(ReportError::InvalidMode(s.trim().to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Daily => "Diario",
            Mode::Weekly => "Semanal",
            Mode::Monthly => "Mensual",
        };
        write!(f, "{}", name)
    }
}

/// Inclusive `[start, end]` date range used to filter both datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Compute the reporting window for an anchor date. Pure and total.
///
/// - Daily: the anchor day itself.
/// - Weekly: the Monday of the anchor's week through Monday + 5 days
///   (Mon..Sat). The original panel used a six-day span, not a full week;
///   reproduced as-is since the intent is unverifiable.
/// - Monthly: first through last calendar day of the anchor's month.
pub fn resolve(mode: Mode, anchor: NaiveDate) -> DateWindow {
    match mode {
        Mode::Daily => DateWindow {
            start: anchor,
            end: anchor,
        },
        Mode::Weekly => {
            let start = anchor - Duration::days(anchor.weekday().num_days_from_monday() as i64);
            DateWindow {
                start,
                end: start + Duration::days(5),
            }
        }
        Mode::Monthly => {
            let start = NaiveDate::from_ymd_opt(anchor.year(), anchor.month(), 1)
                .unwrap_or(anchor);
            let next_month = if anchor.month() == 12 {
                NaiveDate::from_ymd_opt(anchor.year() + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(anchor.year(), anchor.month() + 1, 1)
            };
            let end = next_month
                .map(|d| d - Duration::days(1))
                .unwrap_or(anchor);
            DateWindow { start, end }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn daily_window_is_the_anchor() {
        let w = resolve(Mode::Daily, d(2024, 3, 7));
        assert_eq!(w.start, d(2024, 3, 7));
        assert_eq!(w.end, d(2024, 3, 7));
    }

    #[test]
    fn weekly_window_starts_monday_and_spans_six_days() {
        // Thursday 2024-03-07 resolves to Monday the 4th.
        let w = resolve(Mode::Weekly, d(2024, 3, 7));
        assert_eq!(w.start, d(2024, 3, 4));
        assert_eq!(w.start.weekday(), Weekday::Mon);
        assert_eq!(w.end - w.start, Duration::days(5));
        assert_eq!(w.end, d(2024, 3, 9));
    }

    #[test]
    fn weekly_window_from_monday_and_sunday_anchors() {
        let from_monday = resolve(Mode::Weekly, d(2024, 3, 4));
        assert_eq!(from_monday.start, d(2024, 3, 4));
        // A Sunday anchor belongs to the week that started six days earlier.
        let from_sunday = resolve(Mode::Weekly, d(2024, 3, 10));
        assert_eq!(from_sunday.start, d(2024, 3, 4));
        assert_eq!(from_sunday.end, d(2024, 3, 9));
    }

    #[test]
    fn monthly_window_covers_whole_month() {
        let w = resolve(Mode::Monthly, d(2024, 4, 17));
        assert_eq!(w.start, d(2024, 4, 1));
        assert_eq!(w.end, d(2024, 4, 30));
        let w = resolve(Mode::Monthly, d(2023, 12, 25));
        assert_eq!(w.end, d(2023, 12, 31));
    }

    #[test]
    fn monthly_window_handles_february() {
        assert_eq!(resolve(Mode::Monthly, d(2024, 2, 10)).end, d(2024, 2, 29));
        assert_eq!(resolve(Mode::Monthly, d(2023, 2, 10)).end, d(2023, 2, 28));
    }

    #[test]
    fn mode_parses_both_languages() {
        assert_eq!("Semanal".parse::<Mode>().unwrap(), Mode::Weekly);
        assert_eq!("WEEKLY".parse::<Mode>().unwrap(), Mode::Weekly);
        assert_eq!("diario".parse::<Mode>().unwrap(), Mode::Daily);
        assert_eq!("monthly".parse::<Mode>().unwrap(), Mode::Monthly);
        assert!(matches!(
            "quarterly".parse::<Mode>(),
            Err(ReportError::InvalidMode(_))
        ));
    }
}
