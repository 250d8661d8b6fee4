//! DER encoding types (tag, length)

use crate::error::{Asn1Error, Asn1Result};

/// DER tag class
///
/// ASN.1 defines four tag classes:
/// - **Universal**: Standard ASN.1 types (BOOLEAN, BIT STRING, etc.)
/// - **Application**: Application-specific types
/// - **Context-specific**: Context-dependent types (used in SEQUENCE/SET)
/// - **Private**: Private/implementation-specific types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerTagClass {
    /// Universal class (00)
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10)
    ContextSpecific = 2,
    /// Private class (11)
    Private = 3,
}

impl DerTagClass {
    /// Get the tag class from a tag byte (bits 7-6)
    pub fn from_bits(bits: u8) -> Self {
        match (bits >> 6) & 0x03 {
            0 => DerTagClass::Universal,
            1 => DerTagClass::Application,
            2 => DerTagClass::ContextSpecific,
            3 => DerTagClass::Private,
            _ => unreachable!(), // only 2 bits
        }
    }

    /// Convert the tag class to its bit position in the leading tag byte
    pub fn to_bits(self) -> u8 {
        (self as u8) << 6
    }
}

/// DER tag (identifier octets)
///
/// A tag identifies the type of an ASN.1 value. It consists of:
/// - **Class**: Universal, Application, Context-specific, or Private
/// - **Constructed/Primitive**: Whether the value contains nested TLVs
/// - **Tag Number**: The actual tag number
///
/// # Encoding Format
///
/// Short form (tag number 0-30):
/// ```text
/// Bits: 8 7 6 5 4 3 2 1
///       C C P T T T T T
/// ```
///
/// Long form (tag number >= 31):
/// ```text
/// First byte:      C C P 1 1 1 1 1
/// Following bytes: 1 T T T T T T T  (last byte has bit 7 = 0)
/// ```
///
/// DER requires the minimal form: a tag number below 31 must use the
/// short form, so a long-form encoding of such a number is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerTag {
    /// Tag class
    class: DerTagClass,
    /// Whether this is a constructed type
    constructed: bool,
    /// Tag number
    number: u32,
}

impl DerTag {
    /// BOOLEAN (universal, primitive, tag 1)
    pub const BOOLEAN: DerTag = DerTag::universal(false, 1);
    /// BIT STRING (universal, primitive, tag 3)
    pub const BIT_STRING: DerTag = DerTag::universal(false, 3);
    /// SEQUENCE (universal, constructed, tag 16)
    pub const SEQUENCE: DerTag = DerTag::universal(true, 16);
    /// SET (universal, constructed, tag 17)
    pub const SET: DerTag = DerTag::universal(true, 17);
    /// GeneralizedTime (universal, primitive, tag 24)
    pub const GENERALIZED_TIME: DerTag = DerTag::universal(false, 24);

    /// Create a new DER tag
    pub const fn new(class: DerTagClass, constructed: bool, number: u32) -> Self {
        Self {
            class,
            constructed,
            number,
        }
    }

    /// Create a Universal class tag
    pub const fn universal(constructed: bool, number: u32) -> Self {
        Self::new(DerTagClass::Universal, constructed, number)
    }

    /// Create an Application class tag
    pub const fn application(constructed: bool, number: u32) -> Self {
        Self::new(DerTagClass::Application, constructed, number)
    }

    /// Create a Context-specific class tag
    pub const fn context_specific(constructed: bool, number: u32) -> Self {
        Self::new(DerTagClass::ContextSpecific, constructed, number)
    }

    /// Create a Private class tag
    pub const fn private(constructed: bool, number: u32) -> Self {
        Self::new(DerTagClass::Private, constructed, number)
    }

    /// Create the tag of an explicit wrapper for the given number and class
    ///
    /// Explicit tags always wrap the inner encoding in a constructed node.
    pub const fn explicit(number: u32, class: DerTagClass) -> Self {
        Self::new(class, true, number)
    }

    /// Get the tag class
    pub fn class(&self) -> DerTagClass {
        self.class
    }

    /// Check if the tag is constructed
    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    /// Get the tag number
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Encode the tag to bytes
    ///
    /// Always chooses the minimal form: a single byte for tag numbers
    /// 0-30, the base-128 long form otherwise.
    pub fn encode(&self) -> Vec<u8> {
        let mut result = Vec::new();

        let class_bits = self.class.to_bits();
        let constructed_bit = if self.constructed { 0x20 } else { 0x00 };

        if self.number < 31 {
            result.push(class_bits | constructed_bit | (self.number as u8 & 0x1F));
        } else {
            result.push(class_bits | constructed_bit | 0x1F);

            // Base-128 big-endian with continuation bit on all but the last byte
            let mut remaining = self.number;
            let mut bytes = Vec::new();
            while remaining > 0 {
                bytes.push((remaining & 0x7F) as u8);
                remaining >>= 7;
            }
            for (i, &byte) in bytes.iter().rev().enumerate() {
                if i < bytes.len() - 1 {
                    result.push(byte | 0x80);
                } else {
                    result.push(byte);
                }
            }
        }

        result
    }

    /// Decode a tag from bytes
    ///
    /// # Returns
    ///
    /// Returns `Ok((DerTag, bytes_consumed))` if successful.
    ///
    /// # Errors
    ///
    /// - [`Asn1Error::TruncatedField`] if the input ends inside the tag
    /// - [`Asn1Error::InvalidObject`] if a long-form tag number is below 31
    ///   (short form required) or overflows `u32`
    pub fn decode(data: &[u8]) -> Asn1Result<(Self, usize)> {
        let first_byte = *data.first().ok_or_else(|| {
            Asn1Error::TruncatedField("empty input where a tag was expected".to_string())
        })?;

        let class = DerTagClass::from_bits(first_byte);
        let constructed = (first_byte & 0x20) != 0;
        let tag_bits = first_byte & 0x1F;

        if tag_bits < 31 {
            return Ok((Self::new(class, constructed, tag_bits as u32), 1));
        }

        // Long form: base-128 big-endian until a byte without the continuation bit
        let mut number = 0u32;
        let mut pos = 1;
        loop {
            let byte = *data.get(pos).ok_or_else(|| {
                Asn1Error::TruncatedField(
                    "input ended inside a long form tag number".to_string(),
                )
            })?;
            number = number
                .checked_mul(128)
                .and_then(|n| n.checked_add((byte & 0x7F) as u32))
                .ok_or_else(|| {
                    Asn1Error::InvalidObject("tag number overflows 32 bits".to_string())
                })?;
            pos += 1;
            if byte & 0x80 == 0 {
                break;
            }
        }

        if number < 31 {
            return Err(Asn1Error::InvalidObject(format!(
                "tag number {} must use the short form",
                number
            )));
        }

        Ok((Self::new(class, constructed, number), pos))
    }
}

/// DER length octets
///
/// # Encoding Format
///
/// Short form (lengths 0-127):
/// ```text
/// Byte: 0 L L L L L L L
/// ```
///
/// Long form (lengths > 127):
/// ```text
/// First byte:      1 N N N N N N N  (N = number of length bytes)
/// Following bytes: big-endian length value
/// ```
///
/// DER additionally requires the minimal encoding: the short form whenever
/// the length fits in 7 bits, and no leading zero octets in the long form.
/// The indefinite form (first byte 0x80) belongs to BER and is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerLength {
    /// Short form: length 0-127
    Short(u8),
    /// Long form: length > 127
    Long(usize),
}

impl DerLength {
    /// Create a new DER length, choosing the minimal form
    pub fn new(length: usize) -> Self {
        if length < 128 {
            DerLength::Short(length as u8)
        } else {
            DerLength::Long(length)
        }
    }

    /// Get the length value
    pub fn value(&self) -> usize {
        match self {
            DerLength::Short(l) => *l as usize,
            DerLength::Long(l) => *l,
        }
    }

    /// Number of octets the minimal encoding of `length` occupies
    ///
    /// One octet for the short form, `1 + n` octets for the long form
    /// where `n` is the width of the big-endian value.
    pub fn encoded_len(length: usize) -> usize {
        if length < 128 {
            1
        } else {
            let mut n = 0;
            let mut remaining = length;
            while remaining > 0 {
                n += 1;
                remaining >>= 8;
            }
            1 + n
        }
    }

    /// Encode the length to bytes in the minimal form
    pub fn encode(&self) -> Vec<u8> {
        match self {
            DerLength::Short(length) => vec![*length],
            DerLength::Long(length) => {
                let mut num_bytes = 0;
                let mut remaining = *length;
                while remaining > 0 {
                    num_bytes += 1;
                    remaining >>= 8;
                }

                let mut result = vec![0x80 | (num_bytes as u8)];
                for i in (0..num_bytes).rev() {
                    result.push(((*length >> (i * 8)) & 0xFF) as u8);
                }
                result
            }
        }
    }

    /// Decode a length from bytes
    ///
    /// # Returns
    ///
    /// Returns `Ok((DerLength, bytes_consumed))` if successful.
    ///
    /// # Errors
    ///
    /// - [`Asn1Error::TruncatedField`] if the input ends inside the length
    /// - [`Asn1Error::UnsupportedFieldLength`] for the indefinite form and
    ///   for any non-minimal long form
    pub fn decode(data: &[u8]) -> Asn1Result<(Self, usize)> {
        let first_byte = *data.first().ok_or_else(|| {
            Asn1Error::TruncatedField("empty input where a length was expected".to_string())
        })?;

        if first_byte == 0x80 {
            return Err(Asn1Error::UnsupportedFieldLength(
                "indefinite length is not allowed in DER".to_string(),
            ));
        }

        if (first_byte & 0x80) == 0 {
            return Ok((DerLength::Short(first_byte & 0x7F), 1));
        }

        let num_bytes = (first_byte & 0x7F) as usize;
        if num_bytes > std::mem::size_of::<usize>() {
            return Err(Asn1Error::UnsupportedFieldLength(format!(
                "length encoded in {} bytes is not representable",
                num_bytes
            )));
        }
        if data.len() < 1 + num_bytes {
            return Err(Asn1Error::TruncatedField(format!(
                "long form length needs {} bytes, {} available",
                1 + num_bytes,
                data.len() - 1
            )));
        }

        if data[1] == 0 {
            return Err(Asn1Error::UnsupportedFieldLength(
                "long form length has a leading zero octet".to_string(),
            ));
        }

        let mut length = 0usize;
        for &byte in &data[1..1 + num_bytes] {
            length = (length << 8) | (byte as usize);
        }

        if length < 128 {
            return Err(Asn1Error::UnsupportedFieldLength(format!(
                "length {} must use the short form",
                length
            )));
        }

        Ok((DerLength::Long(length), 1 + num_bytes))
    }
}
