//! ASN.1 BIT STRING type

use crate::der::decoder::{Node, NodeContent};
use crate::der::encoder::DerEncoder;
use crate::der::traits::{DerDecode, DerEncode, ImplicitlyTaggable};
use crate::der::types::DerTag;
use crate::error::{Asn1Error, Asn1Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arbitrary string of bits. A bit string value can have any length
/// including zero.
///
/// The DER content is one leading octet holding the number of padding
/// bits (0-7) in the final value octet, followed by the value octets.
/// An empty value carries zero padding bits, and all padding bits must
/// be zero. These invariants hold at all times: they are checked on
/// decode and on every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitString {
    padding_bits: u8,
    bytes: Vec<u8>,
}

impl BitString {
    /// Construct a new bit string
    ///
    /// # Arguments
    ///
    /// * `bytes` - The value octets
    /// * `padding_bits` - How many low bits of the final octet are unused
    ///
    /// # Errors
    ///
    /// Returns [`Asn1Error::InvalidObject`] if `bytes` is empty while
    /// `padding_bits` is nonzero, or if any padding bit of the final
    /// octet is set.
    ///
    /// # Panics
    ///
    /// Panics if `padding_bits` is outside 0..=7.
    pub fn new(bytes: Vec<u8>, padding_bits: u8) -> Asn1Result<Self> {
        assert!(padding_bits <= 7, "padding_bits must be in 0..=7");
        let value = Self {
            padding_bits,
            bytes,
        };
        value.validate()?;
        Ok(value)
    }

    fn validate(&self) -> Asn1Result<()> {
        if self.bytes.is_empty() {
            if self.padding_bits != 0 {
                return Err(Asn1Error::InvalidObject(
                    "empty bit string must carry zero padding bits".to_string(),
                ));
            }
            return Ok(());
        }
        let mask = (1u8 << self.padding_bits) - 1;
        let last = self.bytes[self.bytes.len() - 1];
        if last & mask != 0 {
            return Err(Asn1Error::InvalidObject(format!(
                "the {} padding bits of the final octet must be zero",
                self.padding_bits
            )));
        }
        Ok(())
    }

    /// Get the value octets
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get the number of padding bits in the final octet
    pub fn padding_bits(&self) -> u8 {
        self.padding_bits
    }

    /// The number of bits in the string
    pub fn num_bits(&self) -> usize {
        self.bytes.len() * 8 - self.padding_bits as usize
    }

    /// Replace the value octets
    ///
    /// The current padding bit count is kept and revalidated against the
    /// new final octet. On error the value is unchanged.
    pub fn set_bytes(&mut self, bytes: Vec<u8>) -> Asn1Result<()> {
        let candidate = Self {
            padding_bits: self.padding_bits,
            bytes,
        };
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }

    /// Change the number of padding bits
    ///
    /// Revalidates against the current final octet. On error the value is
    /// unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `padding_bits` is outside 0..=7.
    pub fn set_padding_bits(&mut self, padding_bits: u8) -> Asn1Result<()> {
        assert!(padding_bits <= 7, "padding_bits must be in 0..=7");
        let candidate = Self {
            padding_bits,
            bytes: self.bytes.clone(),
        };
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }
}

impl<'a> DerDecode<'a> for BitString {
    fn from_der(node: Node<'a>) -> Asn1Result<Self> {
        Self::from_der_with_tag(node, Self::default_tag())
    }
}

impl DerEncode for BitString {
    fn der_encode(&self, encoder: &mut DerEncoder) -> Asn1Result<()> {
        self.der_encode_with_tag(encoder, Self::default_tag())
    }
}

impl<'a> ImplicitlyTaggable<'a> for BitString {
    fn default_tag() -> DerTag {
        DerTag::BIT_STRING
    }

    fn from_der_with_tag(node: Node<'a>, tag: DerTag) -> Asn1Result<Self> {
        if node.tag() != tag {
            return Err(Asn1Error::UnexpectedFieldType(format!(
                "expected {:?}, got {:?}",
                tag,
                node.tag()
            )));
        }
        let content = match node.content() {
            NodeContent::Primitive(content) => *content,
            NodeContent::Constructed(_) => {
                return Err(Asn1Error::UnexpectedFieldType(
                    "bit string content must be primitive".to_string(),
                ))
            }
        };
        let (&padding_bits, bytes) = content.split_first().ok_or_else(|| {
            Asn1Error::InvalidObject("bit string content is missing the padding octet".to_string())
        })?;
        if padding_bits > 7 {
            return Err(Asn1Error::InvalidObject(format!(
                "padding bit count {} is out of range 0..=7",
                padding_bits
            )));
        }
        Self::new(bytes.to_vec(), padding_bits)
    }

    fn der_encode_with_tag(&self, encoder: &mut DerEncoder, tag: DerTag) -> Asn1Result<()> {
        encoder.append_primitive(tag, |buffer| {
            buffer.push(self.padding_bits);
            buffer.extend_from_slice(&self.bytes);
            Ok(())
        })
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.bytes {
            write!(f, "{:02X} ", byte)?;
        }
        Ok(())
    }
}
