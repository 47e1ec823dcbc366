use regex::Regex;

use crate::domain::{GpsWeekDay, date_from_year_doy};
use crate::error::PppError;

const PRODUCT_MARKERS: [&str; 4] = ["ORB.SP3", "CLK.CLK", "OSB.BIA", "ERP.ERP"];

// Anything at or under 30 characters is already short-form (or not a
// product at all) and is left out of the batch.
const MIN_LONG_NAME_LEN: usize = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LongDialect {
    Observation,
    Product,
}

pub fn classify(name: &str) -> Option<LongDialect> {
    if name.len() < MIN_LONG_NAME_LEN || !name.is_ascii() {
        return None;
    }
    if name.ends_with(".rnx") {
        return Some(LongDialect::Observation);
    }
    if PRODUCT_MARKERS.iter().any(|marker| name.contains(marker)) {
        return Some(LongDialect::Product);
    }
    None
}

pub fn to_short_name(long_name: &str) -> Result<String, PppError> {
    if !long_name.is_ascii() {
        return Err(PppError::UnrecognizedLongFormat(long_name.to_string()));
    }
    if long_name.ends_with(".rnx") {
        observation_to_short(long_name)
    } else if PRODUCT_MARKERS.iter().any(|marker| long_name.contains(marker)) {
        product_to_short(long_name)
    } else {
        Err(PppError::UnrecognizedLongFormat(long_name.to_string()))
    }
}

// ABCD00XXX_R_20233330000_01D_30S_MO.rnx -> abcd3330.23o
// The single letter between the underscores is the data-source flag (R for
// receiver, S for stream); broadcast files like BRDM00DLR_S_... share the
// same field offsets.
fn observation_to_short(long_name: &str) -> Result<String, PppError> {
    let re = Regex::new(r"^([0-9A-Za-z]{4})[0-9A-Za-z]{5}_[A-Za-z]_(\d{4})(\d{3})").unwrap();
    let caps = re
        .captures(long_name)
        .ok_or_else(|| PppError::UnrecognizedLongFormat(long_name.to_string()))?;
    let station = caps[1].to_lowercase();
    let year = &caps[2];
    let doy = &caps[3];
    let type_char = long_name.as_bytes()[long_name.len() - 5].to_ascii_lowercase() as char;
    // Navigation messages keep the legacy 'p' extension.
    let type_char = if type_char == 'n' { 'p' } else { type_char };
    Ok(format!("{station}{doy}0.{}{type_char}", &year[2..]))
}

// WUM0MGXRAP_20243020000_01D_05M_ORB.SP3 -> wum23381.sp3
fn product_to_short(long_name: &str) -> Result<String, PppError> {
    let re = Regex::new(r"^([0-9A-Za-z]{3})[0-9A-Za-z]{7}_(\d{4})(\d{3})").unwrap();
    let caps = re
        .captures(long_name)
        .ok_or_else(|| PppError::UnrecognizedLongFormat(long_name.to_string()))?;
    let agency = caps[1].to_lowercase();
    let year: i32 = caps[2]
        .parse()
        .map_err(|_| PppError::UnrecognizedLongFormat(long_name.to_string()))?;
    let doy: u32 = caps[3]
        .parse()
        .map_err(|_| PppError::UnrecognizedLongFormat(long_name.to_string()))?;
    let ext = long_name[long_name.len() - 3..].to_lowercase();
    let gwd = GpsWeekDay::from_date(date_from_year_doy(year, doy)?)?;
    Ok(format!("{agency}{gwd}.{ext}"))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn classify_by_marker_and_length() {
        assert_eq!(
            classify("ABCD00XXX_R_20233330000_01D_30S_MO.rnx"),
            Some(LongDialect::Observation)
        );
        assert_eq!(
            classify("WUM0MGXRAP_20243020000_01D_05M_ORB.SP3"),
            Some(LongDialect::Product)
        );
        assert_eq!(
            classify("WUM0MGXRAP_20243020000_01D_30S_CLK.CLK"),
            Some(LongDialect::Product)
        );
        // Too short for the batch, even with a matching suffix.
        assert_eq!(classify("station.rnx"), None);
        assert_eq!(classify("abcd3330.23o"), None);
        assert_eq!(classify("WUM0MGXRAP_20243020000_README.txt"), None);
    }

    #[test]
    fn observation_short_name() {
        let short = to_short_name("ABCD00XXX_R_20233330000_01D_30S_MO.rnx").unwrap();
        assert_eq!(short, "abcd3330.23o");
    }

    #[test]
    fn navigation_extension_maps_to_p() {
        let short = to_short_name("BRDM00DLR_S_20233330000_01D_MN.rnx").unwrap();
        assert_eq!(short, "brdm3330.23p");

        let short = to_short_name("ABCD00XXX_R_20233330000_01D_MN.rnx").unwrap();
        assert_eq!(short, "abcd3330.23p");
    }

    #[test]
    fn product_short_name_uses_gps_week() {
        let short = to_short_name("WUM0MGXRAP_20243020000_01D_05M_ORB.SP3").unwrap();
        // 2024 day 302 is 2024-10-28, GPS week 2338 day 1.
        assert_eq!(short, "wum23381.sp3");

        let short = to_short_name("WUM0MGXRAP_20233330000_01D_30S_CLK.CLK").unwrap();
        assert_eq!(short, "wum22903.clk");
    }

    #[test]
    fn short_name_round_trips_week_and_day() {
        let short = to_short_name("WUM0MGXRAP_20243020000_01D_05M_ORB.SP3").unwrap();
        let week: u32 = short[3..7].parse().unwrap();
        let day: u8 = short[7..8].parse().unwrap();
        let direct =
            GpsWeekDay::from_date(date_from_year_doy(2024, 302).unwrap()).unwrap();
        assert_eq!((week, day), (direct.week, direct.day));
        assert_eq!(&short[..3], "wum");
        assert_eq!(&short[9..], "sp3");
    }

    #[test]
    fn unrecognized_long_names_fail() {
        assert_matches!(
            to_short_name("README.md"),
            Err(PppError::UnrecognizedLongFormat(_))
        );
        assert_matches!(
            to_short_name("___ORB.SP3"),
            Err(PppError::UnrecognizedLongFormat(_))
        );
    }
}
