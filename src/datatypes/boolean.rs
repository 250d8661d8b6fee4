//! ASN.1 BOOLEAN codec for `bool`
//!
//! DER allows exactly two content encodings: `0x00` for false and `0xFF`
//! for true. Every other octet is a BER-only encoding and is rejected.

use crate::der::decoder::{Node, NodeContent};
use crate::der::encoder::DerEncoder;
use crate::der::traits::{DerDecode, DerEncode, ImplicitlyTaggable};
use crate::der::types::DerTag;
use crate::error::{Asn1Error, Asn1Result};

impl<'a> DerDecode<'a> for bool {
    fn from_der(node: Node<'a>) -> Asn1Result<Self> {
        Self::from_der_with_tag(node, Self::default_tag())
    }
}

impl DerEncode for bool {
    fn der_encode(&self, encoder: &mut DerEncoder) -> Asn1Result<()> {
        self.der_encode_with_tag(encoder, Self::default_tag())
    }
}

impl<'a> ImplicitlyTaggable<'a> for bool {
    fn default_tag() -> DerTag {
        DerTag::BOOLEAN
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
                    "boolean content must be primitive".to_string(),
                ))
            }
        };
        if content.len() != 1 {
            return Err(Asn1Error::InvalidObject(format!(
                "boolean content must be exactly one octet, got {}",
                content.len()
            )));
        }
        match content[0] {
            0x00 => Ok(false),
            0xFF => Ok(true),
            other => Err(Asn1Error::InvalidObject(format!(
                "boolean octet must be 0x00 or 0xFF, got {:#04X}",
                other
            ))),
        }
    }

    fn der_encode_with_tag(&self, encoder: &mut DerEncoder, tag: DerTag) -> Asn1Result<()> {
        encoder.append_primitive(tag, |buffer| {
            buffer.push(if *self { 0xFF } else { 0x00 });
            Ok(())
        })
    }
}
