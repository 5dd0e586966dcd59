//! Parsing and formatting of primitive literals
//!
//! Two textual forms exist for every kind. The raw form (`value_of_string`,
//! `value_to_string`) is what a property value looks like on its own; the URI
//! literal form adds the quoting and type prefixes the URL grammar needs
//! (`'it''s'`, `duration'P1D'`, `binary'AQI='`, `geography'SRID=4326;Point(1 2)'`).

use crate::{
    EdmPrimitiveTypeKind, Facets, FromPrimitive, GeoDimension, GeoShape, GeoValue,
    PrimitiveResult, PrimitiveTypeError, PrimitiveValue,
};
use base64::Engine;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;
use uuid::Uuid;

const SECONDS_PER_DAY: u128 = 86_400;

impl EdmPrimitiveTypeKind {
    /// Parse the raw textual form of a value, enforcing `facets`
    pub fn value_of_string(&self, text: &str, facets: &Facets) -> PrimitiveResult<PrimitiveValue> {
        let value = self.parse_raw(text)?;
        self.check_facets(&value, text, facets)?;
        Ok(value)
    }

    /// Parse the raw textual form into a caller-chosen representation
    pub fn value_of_string_as<T: FromPrimitive>(
        &self,
        text: &str,
        facets: &Facets,
    ) -> PrimitiveResult<T> {
        let value = self.value_of_string(text, facets)?;
        T::from_primitive(value, *self)
    }

    /// Format a value in raw textual form, enforcing `facets`
    pub fn value_to_string(&self, value: &PrimitiveValue, facets: &Facets) -> PrimitiveResult<String> {
        let value = self.accept(value)?;
        let text = self.format_raw(&value)?;
        self.check_facets(&value, &text, facets)?;
        Ok(text)
    }

    /// Strip URI literal decoration, leaving the raw textual form
    pub fn from_uri_literal(&self, literal: &str) -> PrimitiveResult<String> {
        match self.uri_prefix() {
            Some(prefix) => {
                let quoted = strip_prefix_ignore_case(literal, prefix).ok_or_else(|| {
                    PrimitiveTypeError::content(*self, literal, format!("expected {prefix}'...'"))
                })?;
                unquote(*self, quoted)
            }
            None if *self == Self::String => unquote(*self, literal),
            None => Ok(literal.to_string()),
        }
    }

    /// Decorate a raw textual form for use inside a URI
    pub fn to_uri_literal(&self, text: &str) -> String {
        match self.uri_prefix() {
            Some(prefix) => format!("{prefix}{}", quote(text)),
            None if *self == Self::String => quote(text),
            None => text.to_string(),
        }
    }

    /// Parse a URI literal such as `'abc'` or `duration'PT1S'`
    pub fn parse_literal(&self, literal: &str, facets: &Facets) -> PrimitiveResult<PrimitiveValue> {
        let raw = self.from_uri_literal(literal)?;
        self.value_of_string(&raw, facets)
    }

    /// Format a value as a URI literal
    pub fn format_literal(&self, value: &PrimitiveValue, facets: &Facets) -> PrimitiveResult<String> {
        let raw = self.value_to_string(value, facets)?;
        Ok(self.to_uri_literal(&raw))
    }

    pub fn validate(&self, literal: &str, facets: &Facets) -> bool {
        self.parse_literal(literal, facets).is_ok()
    }

    const fn uri_prefix(&self) -> Option<&'static str> {
        match self {
            Self::Binary => Some("binary"),
            Self::Duration => Some("duration"),
            Self::Geography => Some("geography"),
            Self::Geometry => Some("geometry"),
            _ => None,
        }
    }

    fn parse_raw(&self, text: &str) -> PrimitiveResult<PrimitiveValue> {
        let bad = |reason: &str| PrimitiveTypeError::content(*self, text, reason);
        match self {
            Self::Binary => decode_binary(text).map(PrimitiveValue::Binary).ok_or_else(|| bad("not base64url")),
            Self::Boolean => match text.to_ascii_lowercase().as_str() {
                "true" => Ok(PrimitiveValue::Boolean(true)),
                "false" => Ok(PrimitiveValue::Boolean(false)),
                _ => Err(bad("expected true or false")),
            },
            Self::Byte | Self::SByte | Self::Int16 | Self::Int32 | Self::Int64 => {
                if !is_integer_text(text) {
                    return Err(bad("not an integer"));
                }
                let number = i64::from_str(text).map_err(|_| bad("value out of range"))?;
                self.integral_value(number).ok_or_else(|| bad("value out of range"))
            }
            Self::Decimal => parse_decimal(text).map(PrimitiveValue::Decimal).ok_or_else(|| bad("not a decimal")),
            Self::Single => {
                let value = parse_floating(text).ok_or_else(|| bad("not a number"))?;
                let single = value as f32;
                if single.is_infinite() && value.is_finite() {
                    return Err(bad("value out of range"));
                }
                Ok(PrimitiveValue::Single(single))
            }
            Self::Double => {
                let value = parse_floating(text).ok_or_else(|| bad("not a number"))?;
                Ok(PrimitiveValue::Double(value))
            }
            Self::Date => parse_date(text)
                .map(PrimitiveValue::Date)
                .ok_or_else(|| bad("expected [-]YYYY-MM-DD")),
            Self::DateTimeOffset => parse_date_time_offset(text)
                .map(PrimitiveValue::DateTimeOffset)
                .ok_or_else(|| bad("expected YYYY-MM-DDThh:mm[:ss[.fff]](Z|+hh:mm)")),
            Self::TimeOfDay => parse_time_of_day(text)
                .map(PrimitiveValue::TimeOfDay)
                .ok_or_else(|| bad("expected hh:mm[:ss[.fff]]")),
            Self::Duration => parse_duration(text)
                .map(PrimitiveValue::Duration)
                .ok_or_else(|| bad("expected [-]P[nD][T[nH][nM][n[.n]S]]")),
            Self::Guid => parse_guid(text).map(PrimitiveValue::Guid).ok_or_else(|| bad("not a GUID")),
            Self::String => Ok(PrimitiveValue::String(text.to_string())),
            Self::Stream => Err(PrimitiveTypeError::mismatch(*self, "literal")),
            Self::Geography => parse_geo(GeoDimension::Geography, text)
                .map(PrimitiveValue::Geo)
                .ok_or_else(|| bad("not a well-known-text shape")),
            Self::Geometry => parse_geo(GeoDimension::Geometry, text)
                .map(PrimitiveValue::Geo)
                .ok_or_else(|| bad("not a well-known-text shape")),
        }
    }

    /// Wrap an integer into this kind's representation if it fits
    pub fn integral_value(&self, number: i64) -> Option<PrimitiveValue> {
        match self {
            Self::Byte => u8::try_from(number).ok().map(PrimitiveValue::Byte),
            Self::SByte => i8::try_from(number).ok().map(PrimitiveValue::SByte),
            Self::Int16 => i16::try_from(number).ok().map(PrimitiveValue::Int16),
            Self::Int32 => i32::try_from(number).ok().map(PrimitiveValue::Int32),
            Self::Int64 => Some(PrimitiveValue::Int64(number)),
            _ => None,
        }
    }

    /// Normalise a supplied value into this kind's own representation
    fn accept(&self, value: &PrimitiveValue) -> PrimitiveResult<PrimitiveValue> {
        let mismatch = || PrimitiveTypeError::mismatch(*self, format!("{:?}", value.kind()));
        match (self, value) {
            (Self::Byte | Self::SByte | Self::Int16 | Self::Int32 | Self::Int64, v) => {
                let number = v.as_i64().ok_or_else(mismatch)?;
                self.integral_value(number).ok_or_else(|| {
                    PrimitiveTypeError::content(*self, number.to_string(), "value out of range")
                })
            }
            (Self::Decimal, PrimitiveValue::Decimal(_)) => Ok(value.clone()),
            (Self::Decimal, PrimitiveValue::Double(d)) => Decimal::try_from(*d)
                .map(PrimitiveValue::Decimal)
                .map_err(|_| PrimitiveTypeError::content(*self, d.to_string(), "not representable")),
            (Self::Decimal, PrimitiveValue::Single(s)) => Decimal::try_from(*s)
                .map(PrimitiveValue::Decimal)
                .map_err(|_| PrimitiveTypeError::content(*self, s.to_string(), "not representable")),
            (Self::Decimal | Self::Duration, v) if v.as_i64().is_some() => {
                let number = Decimal::from(v.as_i64().unwrap_or_default());
                Ok(if *self == Self::Decimal {
                    PrimitiveValue::Decimal(number)
                } else {
                    PrimitiveValue::Duration(number)
                })
            }
            (Self::Duration, PrimitiveValue::Duration(d) | PrimitiveValue::Decimal(d)) => {
                Ok(PrimitiveValue::Duration(*d))
            }
            (Self::Single, PrimitiveValue::Single(_)) => Ok(value.clone()),
            (Self::Single, PrimitiveValue::Double(d)) => {
                let single = *d as f32;
                if f64::from(single) == *d || d.is_nan() {
                    Ok(PrimitiveValue::Single(single))
                } else {
                    Err(PrimitiveTypeError::content(*self, d.to_string(), "loses precision as Single"))
                }
            }
            (Self::Single, PrimitiveValue::Byte(_) | PrimitiveValue::SByte(_) | PrimitiveValue::Int16(_)) => {
                f32::from_primitive(value.clone(), *self).map(PrimitiveValue::Single)
            }
            (Self::Double, PrimitiveValue::Double(_)) => Ok(value.clone()),
            (Self::Double, v) => f64::from_primitive(v.clone(), *self).map(PrimitiveValue::Double),
            (Self::Binary, PrimitiveValue::Binary(_))
            | (Self::Boolean, PrimitiveValue::Boolean(_))
            | (Self::Date, PrimitiveValue::Date(_))
            | (Self::DateTimeOffset, PrimitiveValue::DateTimeOffset(_))
            | (Self::TimeOfDay, PrimitiveValue::TimeOfDay(_))
            | (Self::Guid, PrimitiveValue::Guid(_))
            | (Self::String, PrimitiveValue::String(_)) => Ok(value.clone()),
            (Self::Geography | Self::Geometry, PrimitiveValue::Geo(geo)) if geo.dimension.kind() == *self => {
                Ok(value.clone())
            }
            _ => Err(mismatch()),
        }
    }

    fn format_raw(&self, value: &PrimitiveValue) -> PrimitiveResult<String> {
        let text = match value {
            PrimitiveValue::Binary(bytes) => URL_SAFE.encode(bytes),
            PrimitiveValue::Boolean(b) => b.to_string(),
            PrimitiveValue::Byte(v) => v.to_string(),
            PrimitiveValue::SByte(v) => v.to_string(),
            PrimitiveValue::Int16(v) => v.to_string(),
            PrimitiveValue::Int32(v) => v.to_string(),
            PrimitiveValue::Int64(v) => v.to_string(),
            PrimitiveValue::Decimal(d) => d.normalize().to_string(),
            PrimitiveValue::Single(s) => format_floating(f64::from(*s), || s.to_string(), || format!("{s:E}")),
            PrimitiveValue::Double(d) => format_floating(*d, || d.to_string(), || format!("{d:E}")),
            PrimitiveValue::Date(date) => format_date(date),
            PrimitiveValue::DateTimeOffset(dt) => format_date_time_offset(dt),
            PrimitiveValue::TimeOfDay(time) => {
                format!("{}{}", time.format("%H:%M:%S"), fraction_text(time.nanosecond()))
            }
            PrimitiveValue::Duration(seconds) => format_duration(*seconds)
                .ok_or_else(|| PrimitiveTypeError::content(*self, seconds.to_string(), "out of range"))?,
            PrimitiveValue::Guid(guid) => guid.hyphenated().to_string(),
            PrimitiveValue::String(s) => s.clone(),
            PrimitiveValue::Geo(geo) => geo.to_string(),
        };
        Ok(text)
    }

    fn check_facets(&self, value: &PrimitiveValue, text: &str, facets: &Facets) -> PrimitiveResult<()> {
        let violated = |reason: String| Err(PrimitiveTypeError::content(*self, text, reason));
        match value {
            PrimitiveValue::String(s) => {
                if let Some(max) = facets.max_length {
                    if s.chars().count() > max as usize {
                        return violated(format!("longer than maxLength {max}"));
                    }
                }
                if facets.unicode == Some(false) && !s.is_ascii() {
                    return violated("non-ASCII character in a non-unicode string".to_string());
                }
            }
            PrimitiveValue::Binary(bytes) => {
                if let Some(max) = facets.max_length {
                    if bytes.len() > max as usize {
                        return violated(format!("longer than maxLength {max}"));
                    }
                }
            }
            PrimitiveValue::Decimal(d) => {
                let normalized = d.normalize();
                let scale = normalized.scale();
                if let Some(max_scale) = facets.scale {
                    if scale > max_scale {
                        return violated(format!("more than {max_scale} fractional digits"));
                    }
                }
                if let Some(precision) = facets.precision {
                    let digits = normalized.mantissa().unsigned_abs().to_string().len() as u32;
                    let integral_digits = digits.saturating_sub(scale);
                    let allowed_integral = precision.saturating_sub(facets.scale.unwrap_or(0));
                    if integral_digits > allowed_integral || integral_digits + scale > precision {
                        return violated(format!("more than {precision} significant digits"));
                    }
                }
            }
            PrimitiveValue::DateTimeOffset(dt) => {
                check_fraction(fraction_digits(dt.nanosecond()), facets, text, *self)?;
            }
            PrimitiveValue::TimeOfDay(time) => {
                check_fraction(fraction_digits(time.nanosecond()), facets, text, *self)?;
            }
            PrimitiveValue::Duration(seconds) => {
                check_fraction(seconds.normalize().scale(), facets, text, *self)?;
            }
            PrimitiveValue::Geo(geo) => {
                if let Some(srid) = facets.srid {
                    if geo.srid != srid {
                        return violated(format!("SRID {} does not match {srid}", geo.srid));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn check_fraction(
    digits: u32,
    facets: &Facets,
    text: &str,
    kind: EdmPrimitiveTypeKind,
) -> PrimitiveResult<()> {
    match facets.precision {
        Some(precision) if digits > precision => Err(PrimitiveTypeError::content(
            kind,
            text,
            format!("more than {precision} fractional second digits"),
        )),
        _ => Ok(()),
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &text[prefix.len()..])
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn unquote(kind: EdmPrimitiveTypeKind, literal: &str) -> PrimitiveResult<String> {
    let inner = literal
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .ok_or_else(|| PrimitiveTypeError::content(kind, literal, "missing quotes"))?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.next() != Some('\'') {
                return Err(PrimitiveTypeError::content(kind, literal, "unescaped quote"));
            }
        }
        out.push(c);
    }
    Ok(out)
}

fn is_integer_text(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// `[sign] 1*DIGIT ["." 1*DIGIT] [("e"/"E") [sign] 1*DIGIT]`
fn is_number_text(text: &str) -> bool {
    let body = text.strip_prefix(['+', '-']).unwrap_or(text);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(at) => (&body[..at], Some(&body[at + 1..])),
        None => (body, None),
    };
    let mantissa_ok = match mantissa.split_once('.') {
        Some((int, frac)) => {
            !int.is_empty()
                && !frac.is_empty()
                && int.bytes().all(|b| b.is_ascii_digit())
                && frac.bytes().all(|b| b.is_ascii_digit())
        }
        None => !mantissa.is_empty() && mantissa.bytes().all(|b| b.is_ascii_digit()),
    };
    mantissa_ok && exponent.is_none_or(is_integer_text)
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    if !is_number_text(text) {
        return None;
    }
    if text.contains(['e', 'E']) {
        Decimal::from_scientific(text).ok()
    } else {
        Decimal::from_str_exact(text).ok()
    }
}

fn parse_floating(text: &str) -> Option<f64> {
    match text {
        "NaN" => Some(f64::NAN),
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        _ if is_number_text(text) => {
            let value = f64::from_str(text).ok()?;
            value.is_finite().then_some(value)
        }
        _ => None,
    }
}

/// Plain notation for magnitudes in `[1e-3, 1e7)`, `E` notation outside it
fn format_floating(
    value: f64,
    plain: impl FnOnce() -> String,
    scientific: impl FnOnce() -> String,
) -> String {
    let magnitude = value.abs();
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "INF".to_string()
    } else if value == f64::NEG_INFINITY {
        "-INF".to_string()
    } else if magnitude >= 1e7 || (magnitude != 0.0 && magnitude < 1e-3) {
        scientific()
    } else {
        plain()
    }
}

fn decode_binary(text: &str) -> Option<Vec<u8>> {
    let normalized: String = text
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    URL_SAFE_NO_PAD.decode(normalized).ok()
}

/// `[-]YYYY-MM-DD`; years past 9999 carry no leading zero
fn parse_date(text: &str) -> Option<NaiveDate> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let mut parts = rest.splitn(3, '-');
    let (year, month, day) = (parts.next()?, parts.next()?, parts.next()?);
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    let year_ok = year.len() == 4 || (year.len() > 4 && !year.starts_with('0'));
    if !year_ok || month.len() != 2 || day.len() != 2 || ![year, month, day].into_iter().all(all_digits) {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let year = if negative { -year } else { year };
    NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)
}

fn format_date(date: &NaiveDate) -> String {
    let sign = if date.year() < 0 { "-" } else { "" };
    format!(
        "{sign}{:04}-{:02}-{:02}",
        date.year().unsigned_abs(),
        date.month(),
        date.day()
    )
}

fn parse_offset(text: &str) -> Option<FixedOffset> {
    if text.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match text.split_at_checked(1)? {
        ("+", rest) => (1, rest),
        ("-", rest) => (-1, rest),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn parse_date_time_offset(text: &str) -> Option<DateTime<FixedOffset>> {
    let (date, time) = text.split_once('T')?;
    let offset_at = time.rfind(['Z', 'z', '+', '-'])?;
    let (clock, offset) = time.split_at(offset_at);
    let local = parse_date(date)?.and_time(parse_time_of_day(clock)?);
    parse_offset(offset)?.from_local_datetime(&local).single()
}

fn format_date_time_offset(dt: &DateTime<FixedOffset>) -> String {
    let offset = if dt.offset().local_minus_utc() == 0 {
        "Z".to_string()
    } else {
        dt.format("%:z").to_string()
    };
    format!(
        "{}T{}{}{}",
        format_date(&dt.date_naive()),
        dt.format("%H:%M:%S"),
        fraction_text(dt.nanosecond()),
        offset
    )
}

fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}

fn fraction_digits(nanos: u32) -> u32 {
    let nanos = nanos % 1_000_000_000;
    if nanos == 0 {
        return 0;
    }
    let mut digits = 9;
    let mut rest = nanos;
    while rest % 10 == 0 {
        rest /= 10;
        digits -= 1;
    }
    digits
}

fn fraction_text(nanos: u32) -> String {
    let digits = fraction_digits(nanos) as usize;
    if digits == 0 {
        return String::new();
    }
    let padded = format!("{:09}", nanos % 1_000_000_000);
    format!(".{}", &padded[..digits])
}

/// Parse `[-]P[nD][T[nH][nM][n[.n]S]]` into a number of seconds
fn parse_duration(text: &str) -> Option<Decimal> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let body = body.strip_prefix('P')?;
    let (days, time) = match body.split_once('T') {
        Some((days, time)) => (days, Some(time)),
        None => (body, None),
    };

    let mut total = Decimal::ZERO;
    let mut seen_component = false;

    if !days.is_empty() {
        let count = days.strip_suffix('D')?;
        if count.is_empty() || !count.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        total = Decimal::from_str(count).ok()?.checked_mul(Decimal::from(SECONDS_PER_DAY))?;
        seen_component = true;
    }

    if let Some(mut rest) = time {
        if rest.is_empty() {
            return None;
        }
        let units = [('H', 3600u32), ('M', 60), ('S', 1)];
        let mut next_unit = 0;
        while !rest.is_empty() {
            let end = rest.find(|c: char| !c.is_ascii_digit() && c != '.')?;
            let (number, tail) = rest.split_at(end);
            let unit = tail.chars().next()?;
            let position = units[next_unit..].iter().position(|(u, _)| *u == unit)? + next_unit;
            let (_, factor) = units[position];
            if number.is_empty() || (number.contains('.') && unit != 'S') || !is_number_text(number) {
                return None;
            }
            let amount = Decimal::from_str_exact(number).ok()?;
            total = total.checked_add(amount.checked_mul(Decimal::from(factor))?)?;
            next_unit = position + 1;
            rest = &tail[1..];
            seen_component = true;
        }
    }

    if !seen_component {
        return None;
    }
    Some(if negative { -total } else { total })
}

fn format_duration(seconds: Decimal) -> Option<String> {
    let sign = if seconds.is_sign_negative() && !seconds.is_zero() {
        "-"
    } else {
        ""
    };
    let magnitude = seconds.abs();
    let whole = magnitude.trunc();
    let fraction = (magnitude - whole).normalize();
    let whole = whole.to_u128()?;

    let days = whole / SECONDS_PER_DAY;
    let hours = (whole % SECONDS_PER_DAY) / 3600;
    let minutes = (whole % 3600) / 60;
    let secs = whole % 60;

    let mut out = format!("{sign}P");
    if days > 0 {
        out.push_str(&format!("{days}D"));
    }
    let has_time = hours > 0 || minutes > 0 || secs > 0 || !fraction.is_zero();
    if has_time || days == 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes > 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if secs > 0 || !fraction.is_zero() || !has_time {
            let secs = (Decimal::from(secs) + fraction).normalize();
            out.push_str(&format!("{secs}S"));
        }
    }
    Some(out)
}

fn parse_guid(text: &str) -> Option<Uuid> {
    let bytes = text.as_bytes();
    let hyphens_in_place = bytes.len() == 36
        && [8, 13, 18, 23].iter().all(|&i| bytes[i] == b'-');
    if !hyphens_in_place {
        return None;
    }
    Uuid::parse_str(text).ok()
}

/// Parse `[SRID=n;]Shape(...)` into a validated geo value
fn parse_geo(dimension: GeoDimension, text: &str) -> Option<GeoValue> {
    let (srid, shape_text) = match strip_prefix_ignore_case(text, "SRID=") {
        Some(rest) => {
            let (srid, shape) = rest.split_once(';')?;
            (u32::from_str(srid).ok()?, shape)
        }
        None => (dimension.default_srid(), text),
    };
    let open = shape_text.find('(')?;
    let shape = GeoShape::from_name(shape_text[..open].trim())?;
    let coordinates = &shape_text[open..];
    if !balanced_parentheses(coordinates) || !coordinates.ends_with(')') {
        return None;
    }
    let allowed = |c: char| {
        c.is_ascii_digit() || matches!(c, ' ' | ',' | '.' | '-' | '+' | '(' | ')' | 'e' | 'E')
            || (shape == GeoShape::Collection && c.is_ascii_alphabetic())
    };
    if !coordinates.chars().all(allowed) {
        return None;
    }
    Some(GeoValue {
        dimension,
        srid,
        shape,
        coordinates: coordinates.to_string(),
    })
}

fn balanced_parentheses(text: &str) -> bool {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = match depth.checked_sub(1) {
                    Some(d) => d,
                    None => return false,
                };
                if depth == 0 && i + 1 != text.len() {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
