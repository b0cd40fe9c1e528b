use crate::error::{AppError, AppResult};
use chrono::{NaiveDate, NaiveTime, SecondsFormat, TimeZone};
use chrono_tz::Tz;
use std::sync::OnceLock;
use tzf_rs::DefaultFinder;

const FALLBACK_TIMEZONE: &str = "UTC";

pub fn parse_birth_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::ValidationError("birth_date must be YYYY-MM-DD".to_string()))
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_birth_time(value: &str) -> AppResult<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| AppError::ValidationError("birth_time must be HH:MM or HH:MM:SS".to_string()))
}

pub fn parse_timezone(name: &str) -> AppResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| AppError::ValidationError(format!("Unknown timezone: {name}")))
}

/// IANA zone containing the coordinates, from the bundled boundary data.
/// Falls back to `UTC` when the finder has no answer chrono-tz knows.
pub fn timezone_at(latitude: f64, longitude: f64) -> String {
    static FINDER: OnceLock<DefaultFinder> = OnceLock::new();
    let finder = FINDER.get_or_init(DefaultFinder::new);
    let name = finder.get_tz_name(longitude, latitude);
    match name.parse::<Tz>() {
        Ok(tz) => tz.name().to_string(),
        Err(_) => {
            log::warn!("No timezone for {latitude},{longitude}, using {FALLBACK_TIMEZONE}");
            FALLBACK_TIMEZONE.to_string()
        }
    }
}

/// Local birth moment as ISO-8601 with the zone's offset, e.g.
/// `1990-05-15T14:30:00+05:30`.
pub fn birth_datetime_iso(date: NaiveDate, time: NaiveTime, timezone: &str) -> AppResult<String> {
    let tz = parse_timezone(timezone)?;
    // DST gaps have no valid local time; ambiguous folds take the earlier instant
    let local = tz
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .ok_or_else(|| {
            AppError::ValidationError("Birth time does not exist in that timezone".to_string())
        })?;
    Ok(local.to_rfc3339_opts(SecondsFormat::Secs, false))
}
