//! Time encoding modes.
//!
//! Times are never tagged on the wire: each mode produces a plain text
//! string, integer, or float, and tags 0/1 remain rejected on decode.

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone, Utc};

use crate::encode::Encoder;
use crate::value::Int;
use crate::{Error, ErrorCode};

/// How to encode time values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeMode {
    /// A text string representing the time with 1-nanosecond precision in
    /// RFC 3339 format. A non-UTC offset is preserved as a numeric offset.
    ///
    /// This is the default.
    #[default]
    Rfc3339Nano,

    /// An integer counting seconds elapsed (1-second precision) since the
    /// Unix epoch. Location independent with a clear precision guarantee.
    Unix,

    /// A binary64 counting seconds since the Unix epoch with up to
    /// 1-microsecond precision.
    UnixMicro,

    /// [`TimeMode::Unix`] when the value has no fractional seconds,
    /// [`TimeMode::UnixMicro`] otherwise.
    UnixDynamic,

    /// A text string representing the time with 1-second precision in
    /// RFC 3339 format.
    Rfc3339,

    /// Fail with `UnsupportedType` instead of encoding a time.
    Reject,
}

/// RFC 3339 with nanosecond precision and trailing fractional zeros trimmed,
/// so whole-second times carry no fractional part at all.
fn rfc3339_nano(t: &DateTime<FixedOffset>) -> String {
    let mut s = t.to_rfc3339_opts(SecondsFormat::Nanos, true);
    if let Some(dot) = s.find('.') {
        let frac_end = s[dot..]
            .find(|c| c == 'Z' || c == '+' || c == '-')
            .map_or(s.len(), |i| dot + i);
        let mut keep = frac_end;
        while keep > dot + 1 && s.as_bytes()[keep - 1] == b'0' {
            keep -= 1;
        }
        if keep == dot + 1 {
            keep = dot;
        }
        s.replace_range(keep..frac_end, "");
    }
    s
}

pub(crate) fn encode_time(enc: &mut Encoder, t: &DateTime<FixedOffset>) -> Result<(), Error> {
    match enc.options().time {
        TimeMode::Rfc3339Nano => {
            enc.text(&rfc3339_nano(t));
            Ok(())
        }
        TimeMode::Rfc3339 => {
            enc.text(&t.to_rfc3339_opts(SecondsFormat::Secs, true));
            Ok(())
        }
        TimeMode::Unix => enc.int(Int::from(t.timestamp())),
        TimeMode::UnixMicro => enc.float(unix_micro(t)),
        TimeMode::UnixDynamic => {
            if t.timestamp_subsec_nanos() == 0 {
                enc.int(Int::from(t.timestamp()))
            } else {
                enc.float(unix_micro(t))
            }
        }
        TimeMode::Reject => Err(Error::new(ErrorCode::UnsupportedType, enc.len())),
    }
}

fn unix_micro(t: &DateTime<FixedOffset>) -> f64 {
    t.timestamp_micros() as f64 / 1e6
}

/// Bind a decoded wire value to a time target: text parses as RFC 3339,
/// integers and floats are Unix seconds.
pub(crate) fn time_from_text(s: &str, off: usize) -> Result<DateTime<FixedOffset>, Error> {
    DateTime::parse_from_rfc3339(s).map_err(|_| Error::new(ErrorCode::TypeMismatch, off))
}

pub(crate) fn time_from_unix(secs: i64, off: usize) -> Result<DateTime<FixedOffset>, Error> {
    match Utc.timestamp_opt(secs, 0) {
        chrono::offset::LocalResult::Single(t) => Ok(t.fixed_offset()),
        _ => Err(Error::new(ErrorCode::TypeMismatch, off)),
    }
}

pub(crate) fn time_from_unix_f64(secs: f64, off: usize) -> Result<DateTime<FixedOffset>, Error> {
    let micros = (secs * 1e6).round();
    if !micros.is_finite() || micros < i64::MIN as f64 || micros > i64::MAX as f64 {
        return Err(Error::new(ErrorCode::TypeMismatch, off));
    }
    match Utc.timestamp_micros(micros as i64) {
        chrono::offset::LocalResult::Single(t) => Ok(t.fixed_offset()),
        _ => Err(Error::new(ErrorCode::TypeMismatch, off)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64, nanos: u32) -> DateTime<FixedOffset> {
        Utc.timestamp_opt(secs, nanos).unwrap().fixed_offset()
    }

    #[test]
    fn nano_format_trims_trailing_zeros() {
        assert_eq!(
            rfc3339_nano(&at(1_234_567_890, 123_456_789)),
            "2009-02-13T23:31:30.123456789Z"
        );
        assert_eq!(
            rfc3339_nano(&at(1_234_567_890, 500_000_000)),
            "2009-02-13T23:31:30.5Z"
        );
        assert_eq!(rfc3339_nano(&at(1_234_567_890, 0)), "2009-02-13T23:31:30Z");
    }

    #[test]
    fn nano_format_preserves_offset() {
        let t = FixedOffset::east_opt(3600)
            .unwrap()
            .timestamp_opt(0, 250_000_000)
            .unwrap();
        assert_eq!(rfc3339_nano(&t), "1970-01-01T01:00:00.25+01:00");
    }

    #[test]
    fn unix_text_round_trips() {
        let t = at(1_234_567_890, 0);
        let parsed = time_from_text("2009-02-13T23:31:30Z", 0).unwrap();
        assert_eq!(parsed, t);
    }
}
