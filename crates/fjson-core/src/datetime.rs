//! ISO-8601 date/time codecs over the `chrono` value model
//!
//! Encoding is manual and allocation-free: components go through the same
//! exact-span digit writer as the integer codec. The wire subset is
//! `YYYY-MM-DDTHH:MM:SS[.fffffff][Z|±HH:MM]` with fractional seconds at
//! 100-nanosecond resolution, emitted only when non-zero. Parsing accepts
//! truncated forms (`YYYY`, `YYYY-MM`, `YYYY-MM-DD`) and a variable-length
//! fraction. Durations render `[-][days.]HH:MM:SS[.fffffff]`.

use chrono::{
    DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta,
    TimeZone, Timelike, Utc,
};

use crate::error::{Error, Result};
use crate::fmt::JsonFormat;
use crate::number::{write_padded, write_signed, write_unsigned};
use crate::reader::JsonReader;
use crate::writer::{ByteWriter, JsonWriter};

const TICKS_PER_SECOND: u64 = 10_000_000;
const TICKS_PER_MINUTE: u64 = 60 * TICKS_PER_SECOND;
const TICKS_PER_HOUR: u64 = 60 * TICKS_PER_MINUTE;
const TICKS_PER_DAY: u64 = 24 * TICKS_PER_HOUR;

/// `i64::MIN` ticks cannot be negated for component extraction; the
/// rendering is precomputed instead
const MIN_DURATION_LITERAL: &[u8] = b"-10675199.02:48:05.4775808";

/// Time zone suffix attached to a serialized timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZoneSuffix {
    /// No suffix: naive/unspecified values
    None,
    /// `Z`
    Utc,
    /// `±HH:MM`, seconds east of UTC
    Offset(i32),
}

fn write_fraction(out: &mut ByteWriter, ticks: u32) {
    if ticks == 0 {
        return;
    }
    out.push(b'.');
    let mut value = u64::from(ticks);
    let mut width = 7;
    while value % 10 == 0 {
        value /= 10;
        width -= 1;
    }
    write_padded(out, value, width);
}

fn write_timestamp(out: &mut ByteWriter, value: &NaiveDateTime, zone: ZoneSuffix) {
    let year = value.year();
    if (0..=9999).contains(&year) {
        write_padded(out, year as u64, 4);
    } else {
        write_signed(out, year as i128);
    }
    out.push(b'-');
    write_padded(out, u64::from(value.month()), 2);
    out.push(b'-');
    write_padded(out, u64::from(value.day()), 2);
    out.push(b'T');
    write_padded(out, u64::from(value.hour()), 2);
    out.push(b':');
    write_padded(out, u64::from(value.minute()), 2);
    out.push(b':');
    write_padded(out, u64::from(value.second()), 2);
    // leap-second nanoseconds saturate at the last representable tick
    let ticks = (value.nanosecond() / 100).min(9_999_999);
    write_fraction(out, ticks);
    match zone {
        ZoneSuffix::None => {}
        ZoneSuffix::Utc => out.push(b'Z'),
        ZoneSuffix::Offset(seconds) => write_zone_offset(out, seconds),
    }
}

fn write_zone_offset(out: &mut ByteWriter, seconds: i32) {
    out.push(if seconds < 0 { b'-' } else { b'+' });
    let minutes = seconds.unsigned_abs() / 60;
    write_padded(out, u64::from(minutes / 60), 2);
    out.push(b':');
    write_padded(out, u64::from(minutes % 60), 2);
}

/// Byte cursor over the contents of a quoted date/time string
struct Cursor<'a> {
    bytes: &'a [u8],
    at: usize,
    base: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8], base: usize) -> Self {
        Self { bytes, at: 0, base }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::structural(self.base + self.at, message)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.at).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.at += 1;
            return true;
        }
        false
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.eat(byte) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{}`", char::from(byte))))
        }
    }

    fn done(&self) -> bool {
        self.at == self.bytes.len()
    }

    fn fixed_digits(&mut self, width: usize, what: &str) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..width {
            let Some(byte) = self.peek().filter(u8::is_ascii_digit) else {
                return Err(self.error(format!("expected {width}-digit {what}")));
            };
            value = value * 10 + u32::from(byte - b'0');
            self.at += 1;
        }
        Ok(value)
    }

    fn digit_run(&mut self) -> (u64, usize) {
        let mut value = 0u64;
        let mut digits = 0usize;
        while let Some(byte) = self.peek().filter(u8::is_ascii_digit) {
            value = value.saturating_mul(10).saturating_add(u64::from(byte - b'0'));
            digits += 1;
            self.at += 1;
        }
        (value, digits)
    }

    /// Variable-length fractional seconds, normalized to 100ns ticks
    fn fraction_ticks(&mut self) -> Result<u32> {
        let mut value = 0u32;
        let mut digits = 0usize;
        while let Some(byte) = self.peek().filter(u8::is_ascii_digit) {
            if digits < 7 {
                value = value * 10 + u32::from(byte - b'0');
            }
            digits += 1;
            self.at += 1;
        }
        if digits == 0 {
            return Err(self.error("expected fractional digits"));
        }
        if digits > 9 {
            return Err(self.error("fractional seconds too long"));
        }
        while digits < 7 {
            value *= 10;
            digits += 1;
        }
        Ok(value)
    }

    fn zone(&mut self) -> Result<Option<i32>> {
        if self.eat(b'Z') {
            return Ok(Some(0));
        }
        let sign = match self.peek() {
            Some(b'+') => 1i32,
            Some(b'-') => -1i32,
            _ => return Ok(None),
        };
        self.at += 1;
        let hours = self.fixed_digits(2, "offset hour")?;
        self.expect(b':')?;
        let minutes = self.fixed_digits(2, "offset minute")?;
        if hours > 23 || minutes > 59 {
            return Err(self.error("offset out of range"));
        }
        Ok(Some(sign * (hours as i32 * 3600 + minutes as i32 * 60)))
    }
}

fn parse_timestamp(cursor: &mut Cursor<'_>) -> Result<(NaiveDateTime, Option<i32>)> {
    let year = cursor.fixed_digits(4, "year")? as i32;
    let mut month = 1;
    let mut day = 1;
    if cursor.eat(b'-') {
        month = cursor.fixed_digits(2, "month")?;
        if cursor.eat(b'-') {
            day = cursor.fixed_digits(2, "day")?;
        }
    }
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| cursor.error("date out of range"))?;

    let mut time = NaiveTime::MIN;
    if cursor.eat(b'T') {
        time = parse_time_of_day(cursor)?;
    }
    let offset = cursor.zone()?;
    if !cursor.done() {
        return Err(cursor.error("trailing characters in date-time"));
    }
    Ok((NaiveDateTime::new(date, time), offset))
}

fn parse_time_of_day(cursor: &mut Cursor<'_>) -> Result<NaiveTime> {
    let hour = cursor.fixed_digits(2, "hour")?;
    cursor.expect(b':')?;
    let minute = cursor.fixed_digits(2, "minute")?;
    cursor.expect(b':')?;
    let second = cursor.fixed_digits(2, "second")?;
    let ticks = if cursor.eat(b'.') {
        cursor.fraction_ticks()?
    } else {
        0
    };
    NaiveTime::from_hms_nano_opt(hour, minute, second, ticks * 100)
        .ok_or_else(|| cursor.error("time out of range"))
}

fn read_timestamp(reader: &mut JsonReader<'_>) -> Result<(NaiveDateTime, Option<i32>)> {
    let base = reader.position();
    let text = reader.read_string_ref()?;
    let mut cursor = Cursor::new(text.as_bytes(), base);
    parse_timestamp(&mut cursor)
}

fn serialize_quoted(
    writer: &mut JsonWriter<'_>,
    value: &NaiveDateTime,
    zone: ZoneSuffix,
) -> Result<()> {
    let out = writer.raw();
    out.push(b'"');
    write_timestamp(out, value, zone);
    out.push(b'"');
    Ok(())
}

impl JsonFormat for NaiveDateTime {
    fn serialize(&self, writer: &mut JsonWriter<'_>) -> Result<()> {
        serialize_quoted(writer, self, ZoneSuffix::None)
    }

    fn deserialize(reader: &mut JsonReader<'_>) -> Result<Self> {
        // an explicit offset on a naive target is accepted and dropped
        let (naive, _) = read_timestamp(reader)?;
        Ok(naive)
    }
}

impl JsonFormat for DateTime<Utc> {
    fn serialize(&self, writer: &mut JsonWriter<'_>) -> Result<()> {
        serialize_quoted(writer, &self.naive_utc(), ZoneSuffix::Utc)
    }

    fn deserialize(reader: &mut JsonReader<'_>) -> Result<Self> {
        let base = reader.position();
        let (naive, offset) = read_timestamp(reader)?;
        match offset {
            None | Some(0) => Ok(Utc.from_utc_datetime(&naive)),
            Some(seconds) => {
                let offset = FixedOffset::east_opt(seconds)
                    .ok_or_else(|| Error::structural(base, "offset out of range"))?;
                Ok(from_offset_parts(naive, offset, base)?.with_timezone(&Utc))
            }
        }
    }
}

impl JsonFormat for DateTime<FixedOffset> {
    fn serialize(&self, writer: &mut JsonWriter<'_>) -> Result<()> {
        let seconds = self.offset().local_minus_utc();
        let zone = if seconds == 0 {
            ZoneSuffix::Utc
        } else {
            ZoneSuffix::Offset(seconds)
        };
        serialize_quoted(writer, &self.naive_local(), zone)
    }

    fn deserialize(reader: &mut JsonReader<'_>) -> Result<Self> {
        let base = reader.position();
        let (naive, offset) = read_timestamp(reader)?;
        let offset = FixedOffset::east_opt(offset.unwrap_or(0))
            .ok_or_else(|| Error::structural(base, "offset out of range"))?;
        from_offset_parts(naive, offset, base)
    }
}

impl JsonFormat for DateTime<Local> {
    fn serialize(&self, writer: &mut JsonWriter<'_>) -> Result<()> {
        // the machine's offset for this instant, resolved by chrono
        let seconds = self.offset().fix().local_minus_utc();
        serialize_quoted(writer, &self.naive_local(), ZoneSuffix::Offset(seconds))
    }

    fn deserialize(reader: &mut JsonReader<'_>) -> Result<Self> {
        let base = reader.position();
        let (naive, offset) = read_timestamp(reader)?;
        match offset {
            Some(seconds) => {
                let offset = FixedOffset::east_opt(seconds)
                    .ok_or_else(|| Error::structural(base, "offset out of range"))?;
                Ok(from_offset_parts(naive, offset, base)?.with_timezone(&Local))
            }
            None => Local
                .from_local_datetime(&naive)
                .earliest()
                .ok_or_else(|| Error::structural(base, "nonexistent local time")),
        }
    }
}

fn from_offset_parts(
    naive: NaiveDateTime,
    offset: FixedOffset,
    base: usize,
) -> Result<DateTime<FixedOffset>> {
    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| Error::structural(base, "timestamp out of range"))
}

impl JsonFormat for NaiveDate {
    fn serialize(&self, writer: &mut JsonWriter<'_>) -> Result<()> {
        let out = writer.raw();
        out.push(b'"');
        let year = self.year();
        if (0..=9999).contains(&year) {
            write_padded(out, year as u64, 4);
        } else {
            write_signed(out, year as i128);
        }
        out.push(b'-');
        write_padded(out, u64::from(self.month()), 2);
        out.push(b'-');
        write_padded(out, u64::from(self.day()), 2);
        out.push(b'"');
        Ok(())
    }

    fn deserialize(reader: &mut JsonReader<'_>) -> Result<Self> {
        let (naive, _) = read_timestamp(reader)?;
        Ok(naive.date())
    }
}

impl JsonFormat for NaiveTime {
    fn serialize(&self, writer: &mut JsonWriter<'_>) -> Result<()> {
        let out = writer.raw();
        out.push(b'"');
        write_padded(out, u64::from(self.hour()), 2);
        out.push(b':');
        write_padded(out, u64::from(self.minute()), 2);
        out.push(b':');
        write_padded(out, u64::from(self.second()), 2);
        write_fraction(out, (self.nanosecond() / 100).min(9_999_999));
        out.push(b'"');
        Ok(())
    }

    fn deserialize(reader: &mut JsonReader<'_>) -> Result<Self> {
        let base = reader.position();
        let text = reader.read_string_ref()?;
        let mut cursor = Cursor::new(text.as_bytes(), base);
        let time = parse_time_of_day(&mut cursor)?;
        if !cursor.done() {
            return Err(cursor.error("trailing characters in time"));
        }
        Ok(time)
    }
}

/// Total 100ns ticks of a delta, saturating at the i64 tick range
fn delta_ticks(delta: &TimeDelta) -> i64 {
    let total = delta.num_seconds() as i128 * TICKS_PER_SECOND as i128
        + i128::from(delta.subsec_nanos()) / 100;
    total.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

fn write_duration(out: &mut ByteWriter, ticks: i64) {
    if ticks == i64::MIN {
        out.write_raw(MIN_DURATION_LITERAL);
        return;
    }
    if ticks < 0 {
        out.push(b'-');
    }
    let magnitude = ticks.unsigned_abs();
    let days = magnitude / TICKS_PER_DAY;
    if days > 0 {
        write_unsigned(out, u128::from(days));
        out.push(b'.');
    }
    write_padded(out, magnitude / TICKS_PER_HOUR % 24, 2);
    out.push(b':');
    write_padded(out, magnitude / TICKS_PER_MINUTE % 60, 2);
    out.push(b':');
    write_padded(out, magnitude / TICKS_PER_SECOND % 60, 2);
    write_fraction(out, (magnitude % TICKS_PER_SECOND) as u32);
}

fn parse_duration(cursor: &mut Cursor<'_>) -> Result<i64> {
    let negative = cursor.eat(b'-');
    let (first, digits) = cursor.digit_run();
    if digits == 0 {
        return Err(cursor.error("expected digits"));
    }
    let (days, hours) = if cursor.eat(b'.') {
        let hours = cursor.fixed_digits(2, "hour")?;
        (first, u64::from(hours))
    } else {
        (0, first)
    };
    cursor.expect(b':')?;
    let minutes = u64::from(cursor.fixed_digits(2, "minute")?);
    cursor.expect(b':')?;
    let seconds = u64::from(cursor.fixed_digits(2, "second")?);
    let fraction = if cursor.eat(b'.') {
        u64::from(cursor.fraction_ticks()?)
    } else {
        0
    };
    if !cursor.done() {
        return Err(cursor.error("trailing characters in duration"));
    }
    if hours > 23 || minutes > 59 || seconds > 59 {
        return Err(cursor.error("duration component out of range"));
    }

    let magnitude = days as i128 * TICKS_PER_DAY as i128
        + hours as i128 * TICKS_PER_HOUR as i128
        + minutes as i128 * TICKS_PER_MINUTE as i128
        + seconds as i128 * TICKS_PER_SECOND as i128
        + fraction as i128;
    let ticks = if negative { -magnitude } else { magnitude };
    i64::try_from(ticks).map_err(|_| cursor.error("duration out of range"))
}

impl JsonFormat for TimeDelta {
    fn serialize(&self, writer: &mut JsonWriter<'_>) -> Result<()> {
        let out = writer.raw();
        out.push(b'"');
        write_duration(out, delta_ticks(self));
        out.push(b'"');
        Ok(())
    }

    fn deserialize(reader: &mut JsonReader<'_>) -> Result<Self> {
        let base = reader.position();
        let text = reader.read_string_ref()?;
        let mut cursor = Cursor::new(text.as_bytes(), base);
        let ticks = parse_duration(&mut cursor)?;
        let seconds = ticks.div_euclid(TICKS_PER_SECOND as i64);
        let nanos = (ticks.rem_euclid(TICKS_PER_SECOND as i64) * 100) as u32;
        TimeDelta::new(seconds, nanos).ok_or_else(|| cursor.error("duration out of range"))
    }
}
