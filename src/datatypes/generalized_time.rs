//! ASN.1 GeneralizedTime type

use crate::der::decoder::{Node, NodeContent};
use crate::der::encoder::DerEncoder;
use crate::der::traits::{DerDecode, DerEncode, ImplicitlyTaggable};
use crate::der::types::DerTag;
use crate::error::{Asn1Error, Asn1Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A calendar timestamp in the canonical DER GeneralizedTime form
///
/// The DER content is the UTC text `YYYYMMDDHHMMSSZ`, optionally with
/// fractional seconds between the seconds and the `Z` (a dot followed by
/// at least one digit, no trailing zeros).
///
/// Field ranges are enforced on construction and on every mutation:
/// year 0-9999, month 1-12, day within the month (Gregorian leap years),
/// hours 0-23, minutes 0-59, seconds 0-61 (leap seconds are representable),
/// fractional seconds in [0, 1). Fractional seconds are carried at
/// nanosecond resolution: a value that is not an exact multiple of one
/// nanosecond is rejected, so every accepted value serializes and parses
/// back unchanged.
///
/// Because seconds up to 61 are accepted, no total ordering is defined on
/// values; callers comparing timestamps bring their own calendar rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneralizedTime {
    year: u16,
    month: u8,
    day: u8,
    hours: u8,
    minutes: u8,
    seconds: u8,
    fractional_seconds: f64,
}

impl GeneralizedTime {
    /// Construct a timestamp from its components
    ///
    /// # Errors
    ///
    /// Returns [`Asn1Error::InvalidObject`] when any field is out of
    /// range.
    pub fn new(
        year: u16,
        month: u8,
        day: u8,
        hours: u8,
        minutes: u8,
        seconds: u8,
        fractional_seconds: f64,
    ) -> Asn1Result<Self> {
        let value = Self {
            year,
            month,
            day,
            hours,
            minutes,
            seconds,
            fractional_seconds,
        };
        value.validate()?;
        Ok(value)
    }

    fn validate(&self) -> Asn1Result<()> {
        if self.year > 9999 {
            return Err(Asn1Error::InvalidObject(format!(
                "year {} is out of range 0..=9999",
                self.year
            )));
        }
        if self.month < 1 || self.month > 12 {
            return Err(Asn1Error::InvalidObject(format!(
                "month {} is out of range 1..=12",
                self.month
            )));
        }
        let max_day = days_in_month(self.month, self.year);
        if self.day < 1 || self.day > max_day {
            return Err(Asn1Error::InvalidObject(format!(
                "day {} is out of range 1..={} for month {} of year {}",
                self.day, max_day, self.month, self.year
            )));
        }
        if self.hours > 23 {
            return Err(Asn1Error::InvalidObject(format!(
                "hours {} are out of range 0..=23",
                self.hours
            )));
        }
        if self.minutes > 59 {
            return Err(Asn1Error::InvalidObject(format!(
                "minutes {} are out of range 0..=59",
                self.minutes
            )));
        }
        if self.seconds > 61 {
            return Err(Asn1Error::InvalidObject(format!(
                "seconds {} are out of range 0..=61",
                self.seconds
            )));
        }
        if !(0.0..1.0).contains(&self.fractional_seconds) {
            return Err(Asn1Error::InvalidObject(format!(
                "fractional seconds {} are out of range [0, 1)",
                self.fractional_seconds
            )));
        }
        // values that are not whole nanosecond counts would shift when
        // rounded for emission, including rounding up to a full second
        let nanos = (self.fractional_seconds * 1e9).round();
        if nanos / 1e9 != self.fractional_seconds {
            return Err(Asn1Error::InvalidObject(format!(
                "fractional seconds {} cannot be represented at nanosecond resolution",
                self.fractional_seconds
            )));
        }
        Ok(())
    }

    /// Get the year
    pub fn year(&self) -> u16 {
        self.year
    }

    /// Get the month
    pub fn month(&self) -> u8 {
        self.month
    }

    /// Get the day of the month
    pub fn day(&self) -> u8 {
        self.day
    }

    /// Get the hours
    pub fn hours(&self) -> u8 {
        self.hours
    }

    /// Get the minutes
    pub fn minutes(&self) -> u8 {
        self.minutes
    }

    /// Get the seconds
    pub fn seconds(&self) -> u8 {
        self.seconds
    }

    /// Get the fractional seconds
    pub fn fractional_seconds(&self) -> f64 {
        self.fractional_seconds
    }

    /// Set the year, revalidating the whole timestamp
    ///
    /// All setters leave the value unchanged on error; a mutated value
    /// always serializes to valid DER.
    pub fn set_year(&mut self, year: u16) -> Asn1Result<()> {
        self.mutate(|value| value.year = year)
    }

    /// Set the month, revalidating the whole timestamp
    pub fn set_month(&mut self, month: u8) -> Asn1Result<()> {
        self.mutate(|value| value.month = month)
    }

    /// Set the day of the month, revalidating the whole timestamp
    pub fn set_day(&mut self, day: u8) -> Asn1Result<()> {
        self.mutate(|value| value.day = day)
    }

    /// Set the hours, revalidating the whole timestamp
    pub fn set_hours(&mut self, hours: u8) -> Asn1Result<()> {
        self.mutate(|value| value.hours = hours)
    }

    /// Set the minutes, revalidating the whole timestamp
    pub fn set_minutes(&mut self, minutes: u8) -> Asn1Result<()> {
        self.mutate(|value| value.minutes = minutes)
    }

    /// Set the seconds, revalidating the whole timestamp
    pub fn set_seconds(&mut self, seconds: u8) -> Asn1Result<()> {
        self.mutate(|value| value.seconds = seconds)
    }

    /// Set the fractional seconds, revalidating the whole timestamp
    pub fn set_fractional_seconds(&mut self, fractional_seconds: f64) -> Asn1Result<()> {
        self.mutate(|value| value.fractional_seconds = fractional_seconds)
    }

    fn mutate<F: FnOnce(&mut Self)>(&mut self, apply: F) -> Asn1Result<()> {
        let mut candidate = *self;
        apply(&mut candidate);
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }

    /// Parse the canonical DER content text
    fn parse_content(content: &[u8]) -> Asn1Result<Self> {
        // YYYYMMDDHHMMSS is 14 bytes, the Z terminator one more
        if content.len() < 15 {
            return Err(Asn1Error::InvalidObject(format!(
                "generalized time content of {} bytes is too short",
                content.len()
            )));
        }

        let year = read_digits(&content[0..4])? as u16;
        let month = read_digits(&content[4..6])? as u8;
        let day = read_digits(&content[6..8])? as u8;
        let hours = read_digits(&content[8..10])? as u8;
        let minutes = read_digits(&content[10..12])? as u8;
        let seconds = read_digits(&content[12..14])? as u8;

        let mut fractional_seconds = 0.0;
        let mut pos = 14;
        if content[pos] == b'.' {
            pos += 1;
            let start = pos;
            while pos < content.len() && content[pos].is_ascii_digit() {
                pos += 1;
            }
            if pos == start {
                return Err(Asn1Error::InvalidObject(
                    "fractional seconds need at least one digit".to_string(),
                ));
            }
            if content[pos - 1] == b'0' {
                return Err(Asn1Error::InvalidObject(
                    "fractional seconds must not carry trailing zeros".to_string(),
                ));
            }
            let digits = &content[start..pos];
            let mut value = 0.0f64;
            for &byte in digits {
                value = value * 10.0 + (byte - b'0') as f64;
            }
            fractional_seconds = value / 10f64.powi(digits.len() as i32);
        }

        if pos >= content.len() || content[pos] != b'Z' {
            return Err(Asn1Error::InvalidObject(
                "generalized time must end with Z".to_string(),
            ));
        }
        if pos + 1 != content.len() {
            return Err(Asn1Error::InvalidObject(
                "trailing bytes after the Z terminator".to_string(),
            ));
        }

        Self::new(year, month, day, hours, minutes, seconds, fractional_seconds)
    }

    /// Write the canonical DER content text
    ///
    /// `validate` guarantees the fraction is a whole nanosecond count
    /// below one second, so the digits are taken from that integer and
    /// never carry into the seconds field.
    fn write_content(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(
            format!(
                "{:04}{:02}{:02}{:02}{:02}{:02}",
                self.year, self.month, self.day, self.hours, self.minutes, self.seconds
            )
            .as_bytes(),
        );
        if self.fractional_seconds > 0.0 {
            let nanos = (self.fractional_seconds * 1e9).round() as u32;
            let formatted = format!("{:09}", nanos);
            buffer.push(b'.');
            buffer.extend_from_slice(formatted.trim_end_matches('0').as_bytes());
        }
        buffer.push(b'Z');
    }
}

/// Days of the given month, honoring Gregorian leap years
fn days_in_month(month: u8, year: u16) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Read a fixed-width run of ASCII digits as a number
fn read_digits(bytes: &[u8]) -> Asn1Result<u32> {
    let mut value = 0u32;
    for &byte in bytes {
        if !byte.is_ascii_digit() {
            return Err(Asn1Error::InvalidObject(format!(
                "expected an ASCII digit, got {:#04X}",
                byte
            )));
        }
        value = value * 10 + (byte - b'0') as u32;
    }
    Ok(value)
}

impl<'a> DerDecode<'a> for GeneralizedTime {
    fn from_der(node: Node<'a>) -> Asn1Result<Self> {
        Self::from_der_with_tag(node, Self::default_tag())
    }
}

impl DerEncode for GeneralizedTime {
    fn der_encode(&self, encoder: &mut DerEncoder) -> Asn1Result<()> {
        self.der_encode_with_tag(encoder, Self::default_tag())
    }
}

impl<'a> ImplicitlyTaggable<'a> for GeneralizedTime {
    fn default_tag() -> DerTag {
        DerTag::GENERALIZED_TIME
    }

    fn from_der_with_tag(node: Node<'a>, tag: DerTag) -> Asn1Result<Self> {
        if node.tag() != tag {
            return Err(Asn1Error::UnexpectedFieldType(format!(
                "expected {:?}, got {:?}",
                tag,
                node.tag()
            )));
        }
        match node.content() {
            NodeContent::Primitive(content) => Self::parse_content(content),
            NodeContent::Constructed(_) => Err(Asn1Error::UnexpectedFieldType(
                "generalized time content must be primitive".to_string(),
            )),
        }
    }

    fn der_encode_with_tag(&self, encoder: &mut DerEncoder, tag: DerTag) -> Asn1Result<()> {
        encoder.append_primitive(tag, |buffer| {
            self.write_content(buffer);
            Ok(())
        })
    }
}

impl fmt::Display for GeneralizedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}Z",
            self.year, self.month, self.day, self.hours, self.minutes, self.seconds
        )
    }
}
