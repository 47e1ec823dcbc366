use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;

use crate::error::PppError;

/// Weeks and day-of-week elapsed since the GPS time origin, 1980-01-06.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpsWeekDay {
    pub week: u32,
    pub day: u8,
}

impl GpsWeekDay {
    pub fn from_date(date: NaiveDate) -> Result<Self, PppError> {
        let days = date.signed_duration_since(gps_epoch()).num_days();
        if days < 0 {
            return Err(PppError::PreEpochDate(date.to_string()));
        }
        Ok(Self {
            week: (days / 7) as u32,
            day: (days % 7) as u8,
        })
    }
}

impl fmt::Display for GpsWeekDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{}", self.week, self.day)
    }
}

fn gps_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1980, 1, 6).unwrap()
}

pub fn date_from_year_doy(year: i32, doy: u32) -> Result<NaiveDate, PppError> {
    if !(1..=366).contains(&doy) {
        return Err(PppError::InvalidEpoch(format!(
            "day-of-year {doy} outside 1-366"
        )));
    }
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| PppError::InvalidEpoch(format!("year {year} out of range")))?;
    jan1.checked_add_days(Days::new(u64::from(doy - 1)))
        .ok_or_else(|| PppError::InvalidEpoch(format!("{year} day {doy} out of range")))
}

/// The epoch encoded in an observation filename, resolved once per file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEpoch {
    pub station: String,
    pub year: i32,
    pub doy: u32,
    pub date: NaiveDate,
    pub directory_tag: String,
}

impl ResolvedEpoch {
    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }
}

impl FromStr for ResolvedEpoch {
    type Err = PppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let name = value.trim();
        if !name.is_ascii() {
            return Err(PppError::UnrecognizedFormat(value.to_string()));
        }
        if name.len() == 12 {
            parse_legacy(name)
        } else if name.contains("_R_") {
            parse_long(name)
        } else {
            Err(PppError::UnrecognizedFormat(value.to_string()))
        }
    }
}

// Legacy dialect, exactly 12 characters: ssssDDDs.YYt (e.g. abcd3330.23o).
fn parse_legacy(name: &str) -> Result<ResolvedEpoch, PppError> {
    let re = Regex::new(r"^([0-9A-Za-z]{4})(\d{3})[0-9A-Za-z]\.(\d{2})[A-Za-z]$").unwrap();
    let caps = re
        .captures(name)
        .ok_or_else(|| PppError::UnrecognizedFormat(name.to_string()))?;
    let station = caps[1].to_string();
    let doy: u32 = caps[2]
        .parse()
        .map_err(|_| PppError::UnrecognizedFormat(name.to_string()))?;
    let yy: i32 = caps[3]
        .parse()
        .map_err(|_| PppError::UnrecognizedFormat(name.to_string()))?;
    let year = 2000 + yy;
    let date = date_from_year_doy(year, doy)?;
    let directory_tag = format!("{}{}{}", station, &caps[3], &caps[2]);
    Ok(ResolvedEpoch {
        station,
        year,
        doy,
        date,
        directory_tag,
    })
}

// Long dialect: SSSS00XXX_R_YYYYDDDHHMM plus trailing fields that vary by
// producer. Year and day-of-year sit at fixed offsets 12-16 and 16-19.
fn parse_long(name: &str) -> Result<ResolvedEpoch, PppError> {
    let re = Regex::new(r"^([0-9A-Za-z]{4})[0-9A-Za-z]{5}_R_(\d{4})(\d{3})\d{4}").unwrap();
    let caps = re
        .captures(name)
        .ok_or_else(|| PppError::UnrecognizedFormat(name.to_string()))?;
    let station = caps[1].to_string();
    let year: i32 = caps[2]
        .parse()
        .map_err(|_| PppError::UnrecognizedFormat(name.to_string()))?;
    let doy: u32 = caps[3]
        .parse()
        .map_err(|_| PppError::UnrecognizedFormat(name.to_string()))?;
    let date = date_from_year_doy(year, doy)?;
    let directory_tag = format!("{}{}{}", station, &caps[2], &caps[3]);
    Ok(ResolvedEpoch {
        station,
        year,
        doy,
        date,
        directory_tag,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_legacy_name() {
        let epoch: ResolvedEpoch = "abcd3330.23o".parse().unwrap();
        assert_eq!(epoch.station, "abcd");
        assert_eq!(epoch.year, 2023);
        assert_eq!(epoch.doy, 333);
        assert_eq!(epoch.date, NaiveDate::from_ymd_opt(2023, 11, 29).unwrap());
        assert_eq!(epoch.directory_tag, "abcd23333");
    }

    #[test]
    fn parse_long_name() {
        let epoch: ResolvedEpoch = "ABCD00XXX_R_20233330000_01D_30S_MO.rnx".parse().unwrap();
        assert_eq!(epoch.station, "ABCD");
        assert_eq!(epoch.year, 2023);
        assert_eq!(epoch.doy, 333);
        assert_eq!(epoch.directory_tag, "ABCD2023333");
    }

    #[test]
    fn long_name_trailing_fields_do_not_matter() {
        let a: ResolvedEpoch = "ABCD00XXX_R_20233330000_01D_30S_MO.rnx".parse().unwrap();
        let b: ResolvedEpoch = "ABCD00XXX_R_20233330000".parse().unwrap();
        assert_eq!(a.date, b.date);
        assert_eq!(a.directory_tag, b.directory_tag);
    }

    #[test]
    fn reject_unknown_shapes() {
        assert_matches!(
            "station.rnx".parse::<ResolvedEpoch>(),
            Err(PppError::UnrecognizedFormat(_))
        );
        assert_matches!(
            "abcd333.23o".parse::<ResolvedEpoch>(),
            Err(PppError::UnrecognizedFormat(_))
        );
    }

    #[test]
    fn reject_out_of_range_doy() {
        assert_matches!(
            "abcd9990.23o".parse::<ResolvedEpoch>(),
            Err(PppError::InvalidEpoch(_))
        );
        assert_matches!(date_from_year_doy(2023, 0), Err(PppError::InvalidEpoch(_)));
    }

    #[test]
    fn doy_round_trips_through_date() {
        for (year, doy) in [(2023, 1), (2023, 365), (2024, 60), (2024, 366)] {
            let date = date_from_year_doy(year, doy).unwrap();
            assert_eq!(date.ordinal(), doy);
            assert_eq!(date.year(), year);
        }
    }

    #[test]
    fn doy_366_in_a_common_year_lands_on_the_next_new_year() {
        let date = date_from_year_doy(2023, 366).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn gps_week_day_known_values() {
        let origin = NaiveDate::from_ymd_opt(1980, 1, 6).unwrap();
        assert_eq!(
            GpsWeekDay::from_date(origin).unwrap(),
            GpsWeekDay { week: 0, day: 0 }
        );
        let rollover = NaiveDate::from_ymd_opt(1999, 8, 22).unwrap();
        assert_eq!(
            GpsWeekDay::from_date(rollover).unwrap(),
            GpsWeekDay { week: 1024, day: 0 }
        );
        let recent = NaiveDate::from_ymd_opt(2024, 10, 28).unwrap();
        assert_eq!(
            GpsWeekDay::from_date(recent).unwrap(),
            GpsWeekDay { week: 2338, day: 1 }
        );
    }

    #[test]
    fn gps_week_day_rejects_pre_epoch_dates() {
        let date = NaiveDate::from_ymd_opt(1979, 12, 31).unwrap();
        assert_matches!(GpsWeekDay::from_date(date), Err(PppError::PreEpochDate(_)));
    }

    #[test]
    fn gps_week_day_is_monotonic() {
        let mut previous = 0i64;
        for offset in [0u64, 1, 6, 7, 400, 10_000, 16_366] {
            let date = NaiveDate::from_ymd_opt(1980, 1, 6)
                .unwrap()
                .checked_add_days(Days::new(offset))
                .unwrap();
            let gwd = GpsWeekDay::from_date(date).unwrap();
            let elapsed = i64::from(gwd.week) * 7 + i64::from(gwd.day);
            assert!(elapsed >= previous);
            previous = elapsed;
        }
    }
}
