use anyhow::Context;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;

/// Which clock decides the calendar date of a forecast timestamp.
///
/// `Local` follows the timezone the process runs under. `City` uses the UTC
/// offset the forecast provider reports for the city itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayBoundary {
    #[default]
    Local,
    Utc,
    City,
}

impl DayBoundary {
    /// Calendar date of `unix_secs`. `city_offset_secs` is only consulted for
    /// `DayBoundary::City`; a missing offset there means UTC.
    pub fn date_of(
        self,
        unix_secs: i64,
        city_offset_secs: Option<i32>,
    ) -> anyhow::Result<NaiveDate> {
        let utc = DateTime::<Utc>::from_timestamp(unix_secs, 0)
            .with_context(|| format!("timestamp out of range: {unix_secs}"))?;

        let date = match self {
            DayBoundary::Local => utc.with_timezone(&Local).date_naive(),
            DayBoundary::Utc => utc.date_naive(),
            DayBoundary::City => {
                let secs = city_offset_secs.unwrap_or(0);
                let offset = FixedOffset::east_opt(secs)
                    .with_context(|| format!("invalid city UTC offset: {secs}s"))?;
                utc.with_timezone(&offset).date_naive()
            }
        };
        Ok(date)
    }
}

impl FromStr for DayBoundary {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "local" => Ok(DayBoundary::Local),
            "utc" => Ok(DayBoundary::Utc),
            "city" => Ok(DayBoundary::City),
            other => anyhow::bail!("unknown day boundary {other:?} (expected local, utc or city)"),
        }
    }
}

impl fmt::Display for DayBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DayBoundary::Local => "local",
            DayBoundary::Utc => "utc",
            DayBoundary::City => "city",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2026-07-14 22:00:00 UTC
    const LATE_EVENING_UTC: i64 = 1_784_066_400;

    #[test]
    fn utc_boundary_uses_utc_date() {
        let d = DayBoundary::Utc.date_of(LATE_EVENING_UTC, Some(3 * 3600)).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 7, 14).unwrap());
    }

    #[test]
    fn city_boundary_rolls_over_with_positive_offset() {
        // 22:00 UTC is 01:00 the next day at UTC+3.
        let d = DayBoundary::City.date_of(LATE_EVENING_UTC, Some(3 * 3600)).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 7, 15).unwrap());
    }

    #[test]
    fn city_boundary_without_offset_is_utc() {
        let d = DayBoundary::City.date_of(LATE_EVENING_UTC, None).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 7, 14).unwrap());
    }

    #[test]
    fn local_boundary_matches_chrono_local() {
        let expected = DateTime::<Utc>::from_timestamp(LATE_EVENING_UTC, 0)
            .unwrap()
            .with_timezone(&Local)
            .date_naive();
        assert_eq!(DayBoundary::Local.date_of(LATE_EVENING_UTC, None).unwrap(), expected);
    }

    #[test]
    fn rejects_out_of_range_timestamps() {
        assert!(DayBoundary::Utc.date_of(i64::MAX, None).is_err());
    }

    #[test]
    fn parses_names() {
        assert_eq!("LOCAL".parse::<DayBoundary>().unwrap(), DayBoundary::Local);
        assert_eq!(" utc ".parse::<DayBoundary>().unwrap(), DayBoundary::Utc);
        assert_eq!("city".parse::<DayBoundary>().unwrap(), DayBoundary::City);
        assert!("mars".parse::<DayBoundary>().is_err());
    }
}
