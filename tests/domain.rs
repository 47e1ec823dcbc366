use assert_matches::assert_matches;
use chrono::NaiveDate;

use ppp_product_manager::domain::{GpsWeekDay, ResolvedEpoch, date_from_year_doy};
use ppp_product_manager::error::PppError;

#[test]
fn legacy_names_resolve_to_2000_plus_yy() {
    let epoch: ResolvedEpoch = "hkcl0300.24o".parse().unwrap();
    assert_eq!(epoch.station, "hkcl");
    assert_eq!(epoch.year, 2024);
    assert_eq!(epoch.doy, 30);
    assert_eq!(epoch.directory_tag, "hkcl24030");
}

#[test]
fn long_names_resolve_from_fixed_offsets() {
    let epoch: ResolvedEpoch = "HKCL00HKG_R_20240300000_01D_30S_MO.rnx".parse().unwrap();
    assert_eq!(epoch.station, "HKCL");
    assert_eq!(epoch.year, 2024);
    assert_eq!(epoch.doy, 30);
    assert_eq!(epoch.directory_tag, "HKCL2024030");
    assert_eq!(epoch.date, NaiveDate::from_ymd_opt(2024, 1, 30).unwrap());
}

#[test]
fn doy_to_date_round_trip_on_leap_and_common_years() {
    use chrono::Datelike;
    // 2024 is leap, 2023 is not.
    for (year, last) in [(2023, 365u32), (2024, 366u32)] {
        for doy in [1, 59, 60, last] {
            let date = date_from_year_doy(year, doy).unwrap();
            assert_eq!(date.ordinal(), doy, "{year} day {doy}");
        }
    }
}

#[test]
fn unrecognized_and_invalid_inputs() {
    assert_matches!(
        "x".parse::<ResolvedEpoch>(),
        Err(PppError::UnrecognizedFormat(_))
    );
    assert_matches!(
        "SSSS00XXX_X_番号0000000".parse::<ResolvedEpoch>(),
        Err(PppError::UnrecognizedFormat(_))
    );
    assert_matches!(date_from_year_doy(2023, 367), Err(PppError::InvalidEpoch(_)));
    assert_matches!(
        GpsWeekDay::from_date(NaiveDate::from_ymd_opt(1979, 1, 1).unwrap()),
        Err(PppError::PreEpochDate(_))
    );
}

#[test]
fn gps_week_matches_published_anchors() {
    let cases = [
        ((1980, 1, 6), (0, 0)),
        ((1980, 1, 12), (0, 6)),
        ((1999, 8, 22), (1024, 0)),
        ((2019, 4, 7), (2048, 0)),
        ((2024, 10, 28), (2338, 1)),
    ];
    for ((y, m, d), (week, day)) in cases {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        let gwd = GpsWeekDay::from_date(date).unwrap();
        assert_eq!((gwd.week, gwd.day), (week, day), "{date}");
    }
}
