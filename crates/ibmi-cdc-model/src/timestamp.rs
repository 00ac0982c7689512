use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};

/// Length of the host `CYYMMDDHHMMSS` timestamp text.
pub const HOST_TIMESTAMP_LEN: usize = 13;

/// Parses a 13-character host timestamp (`CYYMMDDHHMMSS`).
///
/// The first digit is a century offset: `century = 19 + C`, so `0` is the
/// 1900s and `1` is the 2000s. Returns `None` for blank or malformed input;
/// callers degrade the field instead of failing the record.
pub fn parse_host_timestamp(text: &str) -> Option<NaiveDateTime> {
    if text.len() != HOST_TIMESTAMP_LEN || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let century = 19 + u32::from(text.as_bytes()[0] - b'0');
    let full = format!("{}{}", century, &text[1..]);
    NaiveDateTime::parse_from_str(&full, "%Y%m%d%H%M%S").ok()
}

/// Formats a timestamp in host `CYYMMDDHHMMSS` notation.
///
/// Returns `None` for years the century digit cannot express (before 1900 or
/// after 2899).
pub fn format_host_timestamp(value: &NaiveDateTime) -> Option<String> {
    let year = value.year();
    if !(1900..2900).contains(&year) {
        return None;
    }
    let century_digit = year / 100 - 19;
    Some(format!(
        "{}{}",
        century_digit,
        value.format("%y%m%d%H%M%S")
    ))
}

/// Origin of the `*DTS` system clock: 1928-08-23 12:03:06.314752 UTC.
fn dts_epoch() -> Option<DateTime<Utc>> {
    Some(
        NaiveDate::from_ymd_opt(1928, 8, 23)?
            .and_hms_micro_opt(12, 3, 6, 314_752)?
            .and_utc(),
    )
}

/// Bits below the microsecond unit in a `*DTS` value.
const DTS_SUBMICRO_BITS: u32 = 12;

/// Converts an 8-byte `*DTS` clock value to a UTC timestamp.
///
/// The upper 52 bits count microseconds since the `*DTS` epoch. A zero value
/// means the host left the field unset.
pub fn from_dts(raw: u64) -> Option<DateTime<Utc>> {
    if raw == 0 {
        return None;
    }
    let micros = i64::try_from(raw >> DTS_SUBMICRO_BITS).ok()?;
    dts_epoch()?.checked_add_signed(Duration::microseconds(micros))
}

/// Converts a UTC timestamp to an 8-byte `*DTS` clock value.
pub fn to_dts(value: &DateTime<Utc>) -> Option<u64> {
    let micros = value.signed_duration_since(dts_epoch()?).num_microseconds()?;
    let micros = u64::try_from(micros).ok()?;
    micros.checked_shl(DTS_SUBMICRO_BITS)
}
