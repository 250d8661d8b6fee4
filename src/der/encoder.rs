//! DER serializer with length back-patching
//!
//! The encoder never precomputes content lengths. Each append writes the
//! identifier octets and a one-byte length placeholder, streams the content
//! into the same buffer, measures it, and patches the length field in
//! place. When the measured content needs a long-form length, the content
//! is shifted right to open room for the extra length octets. Writes are
//! strictly linear, so no caller ever observes a half-patched buffer.

use crate::der::decoder::{Node, NodeContent};
use crate::der::traits::DerEncode;
use crate::der::types::{DerLength, DerTag, DerTagClass};
use crate::error::Asn1Result;

/// Reserved capacity of a fresh encoder buffer
const DEFAULT_CAPACITY: usize = 1024;

/// DER encoder for ASN.1 structures
///
/// Accumulates a concatenation of DER encodings in a single growing byte
/// buffer. Constructed nodes nest arbitrarily through
/// [`append_constructed`](DerEncoder::append_constructed), which hands the
/// encoder itself to the content writer.
pub struct DerEncoder {
    buffer: Vec<u8>,
}

impl DerEncoder {
    /// Create a new DER encoder
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new DER encoder with the given initial buffer capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Append a primitive TLV
    ///
    /// `write` receives the content buffer and appends the content octets
    /// directly.
    ///
    /// # Panics
    ///
    /// Panics if `tag` is constructed.
    pub fn append_primitive<F>(&mut self, tag: DerTag, write: F) -> Asn1Result<()>
    where
        F: FnOnce(&mut Vec<u8>) -> Asn1Result<()>,
    {
        assert!(
            !tag.is_constructed(),
            "append_primitive requires a primitive tag"
        );
        self.append_node(tag, |encoder| write(&mut encoder.buffer))
    }

    /// Append a constructed TLV
    ///
    /// `write` receives the encoder itself, so nested
    /// `append_primitive`/`append_constructed` calls build the children in
    /// place.
    ///
    /// # Panics
    ///
    /// Panics if `tag` is primitive.
    pub fn append_constructed<F>(&mut self, tag: DerTag, write: F) -> Asn1Result<()>
    where
        F: FnOnce(&mut DerEncoder) -> Asn1Result<()>,
    {
        assert!(
            tag.is_constructed(),
            "append_constructed requires a constructed tag"
        );
        self.append_node(tag, write)
    }

    fn append_node<F>(&mut self, tag: DerTag, write: F) -> Asn1Result<()>
    where
        F: FnOnce(&mut DerEncoder) -> Asn1Result<()>,
    {
        self.buffer.extend_from_slice(&tag.encode());

        // one-byte placeholder, patched once the content length is known
        let length_index = self.buffer.len();
        self.buffer.push(0x00);
        let content_start = self.buffer.len();

        write(self)?;

        let content_len = self.buffer.len() - content_start;
        if content_len <= 0x7F {
            self.buffer[length_index] = content_len as u8;
        } else {
            let extra = DerLength::encoded_len(content_len) - 1;
            self.move_range_right(content_start, extra);
            let length_octets = DerLength::new(content_len).encode();
            self.buffer[length_index..content_start + extra].copy_from_slice(&length_octets);
        }
        Ok(())
    }

    /// Shift `[start, end)` of the buffer right by `offset` bytes, growing
    /// the buffer first
    ///
    /// Supports positive offsets only.
    fn move_range_right(&mut self, start: usize, offset: usize) {
        assert!(offset > 0, "offset must be positive");
        let end = self.buffer.len();
        self.buffer.resize(end + offset, 0);
        self.buffer.copy_within(start..end, start + offset);
    }

    /// Serialize a value through its [`DerEncode`] implementation
    pub fn serialize<T: DerEncode + ?Sized>(&mut self, value: &T) -> Asn1Result<()> {
        value.der_encode(self)
    }

    /// Serialize a value wrapped in an explicit tag
    ///
    /// Emits one constructed node with the given tag number and class
    /// whose single child is the value's own encoding.
    pub fn serialize_explicitly_tagged<T: DerEncode>(
        &mut self,
        value: &T,
        number: u32,
        class: DerTagClass,
    ) -> Asn1Result<()> {
        self.append_constructed(DerTag::explicit(number, class), |encoder| {
            encoder.serialize(value)
        })
    }

    /// Serialize an optional value, emitting nothing when absent
    pub fn serialize_optional<T: DerEncode>(&mut self, value: Option<&T>) -> Asn1Result<()> {
        match value {
            Some(value) => self.serialize(value),
            None => Ok(()),
        }
    }

    /// Serialize a homogeneous sequence under the given constructed tag
    ///
    /// Callers encoding a plain SEQUENCE OF pass [`DerTag::SEQUENCE`].
    pub fn serialize_sequence_of<T: DerEncode>(
        &mut self,
        elements: &[T],
        tag: DerTag,
    ) -> Asn1Result<()> {
        self.append_constructed(tag, |encoder| {
            for element in elements {
                encoder.serialize(element)?;
            }
            Ok(())
        })
    }

    /// Re-emit an already parsed node by walking its tree
    pub fn serialize_node(&mut self, node: &Node<'_>) -> Asn1Result<()> {
        match node.content() {
            NodeContent::Primitive(content) => self.append_primitive(node.tag(), |buffer| {
                buffer.extend_from_slice(content);
                Ok(())
            }),
            NodeContent::Constructed(children) => {
                let children = children.clone();
                self.append_constructed(node.tag(), |encoder| {
                    for child in children {
                        encoder.serialize_node(&child)?;
                    }
                    Ok(())
                })
            }
        }
    }

    /// Get the encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get a reference to the encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Clear the encoder buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for DerEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::der::decoder::parse;

    #[test]
    fn test_append_primitive_short_length() {
        let mut encoder = DerEncoder::new();
        encoder
            .append_primitive(DerTag::universal(false, 4), |buffer| {
                buffer.extend_from_slice(b"hello");
                Ok(())
            })
            .unwrap();
        assert_eq!(encoder.as_bytes(), &[0x04, 0x05, b'h', b'e', b'l', b'l', b'o']);
    }

    #[test]
    fn test_append_primitive_empty_content() {
        let mut encoder = DerEncoder::new();
        encoder
            .append_primitive(DerTag::universal(false, 5), |_| Ok(()))
            .unwrap();
        assert_eq!(encoder.as_bytes(), &[0x05, 0x00]);
    }

    #[test]
    fn test_append_primitive_long_length() {
        let mut encoder = DerEncoder::new();
        encoder
            .append_primitive(DerTag::universal(false, 4), |buffer| {
                buffer.extend_from_slice(&[0xAB; 200]);
                Ok(())
            })
            .unwrap();
        let bytes = encoder.into_bytes();
        assert_eq!(&bytes[..3], &[0x04, 0x81, 200]);
        assert_eq!(bytes.len(), 3 + 200);
        assert!(bytes[3..].iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn test_append_primitive_two_length_octets() {
        let mut encoder = DerEncoder::new();
        encoder
            .append_primitive(DerTag::universal(false, 4), |buffer| {
                buffer.extend_from_slice(&[0xCD; 300]);
                Ok(())
            })
            .unwrap();
        let bytes = encoder.into_bytes();
        assert_eq!(&bytes[..4], &[0x04, 0x82, 0x01, 0x2C]);
        assert_eq!(bytes.len(), 4 + 300);
    }

    #[test]
    fn test_append_constructed_nested() {
        let mut encoder = DerEncoder::new();
        encoder
            .append_constructed(DerTag::SEQUENCE, |encoder| {
                encoder.append_primitive(DerTag::BOOLEAN, |buffer| {
                    buffer.push(0xFF);
                    Ok(())
                })?;
                encoder.append_primitive(DerTag::universal(false, 2), |buffer| {
                    buffer.push(0x05);
                    Ok(())
                })
            })
            .unwrap();
        assert_eq!(
            encoder.as_bytes(),
            &[0x30, 0x06, 0x01, 0x01, 0xFF, 0x02, 0x01, 0x05]
        );
    }

    #[test]
    fn test_nested_long_length_backpatch() {
        // inner content forces the outer node into the long form as well
        let mut encoder = DerEncoder::new();
        encoder
            .append_constructed(DerTag::SEQUENCE, |encoder| {
                encoder.append_primitive(DerTag::universal(false, 4), |buffer| {
                    buffer.extend_from_slice(&[0x11; 130]);
                    Ok(())
                })
            })
            .unwrap();
        let bytes = encoder.into_bytes();
        // inner: 04 81 82 <130 bytes> = 133 bytes of outer content
        assert_eq!(&bytes[..3], &[0x30, 0x81, 133]);
        assert_eq!(&bytes[3..6], &[0x04, 0x81, 130]);
        assert_eq!(bytes.len(), 3 + 133);

        // the result is parseable DER
        parse(&bytes).unwrap();
    }

    #[test]
    fn test_multiple_top_level_values() {
        let mut encoder = DerEncoder::new();
        encoder
            .append_primitive(DerTag::BOOLEAN, |buffer| {
                buffer.push(0x00);
                Ok(())
            })
            .unwrap();
        encoder
            .append_primitive(DerTag::BOOLEAN, |buffer| {
                buffer.push(0xFF);
                Ok(())
            })
            .unwrap();
        assert_eq!(encoder.as_bytes(), &[0x01, 0x01, 0x00, 0x01, 0x01, 0xFF]);
    }

    #[test]
    fn test_serialize_node_roundtrip() {
        let data = [0x30, 0x08, 0x30, 0x03, 0x01, 0x01, 0x00, 0x02, 0x01, 0x01];
        let result = parse(&data).unwrap();
        let mut encoder = DerEncoder::new();
        encoder.serialize_node(&result.root_node()).unwrap();
        assert_eq!(encoder.as_bytes(), &data);
    }

    #[test]
    fn test_serialize_node_long_form_roundtrip() {
        let mut source = DerEncoder::new();
        source
            .append_constructed(DerTag::SEQUENCE, |encoder| {
                encoder.append_primitive(DerTag::universal(false, 4), |buffer| {
                    buffer.extend_from_slice(&[0x77; 500]);
                    Ok(())
                })
            })
            .unwrap();
        let data = source.into_bytes();

        let result = parse(&data).unwrap();
        let mut encoder = DerEncoder::new();
        encoder.serialize_node(&result.root_node()).unwrap();
        assert_eq!(encoder.as_bytes(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "append_primitive requires a primitive tag")]
    fn test_append_primitive_rejects_constructed_tag() {
        let mut encoder = DerEncoder::new();
        let _ = encoder.append_primitive(DerTag::SEQUENCE, |_| Ok(()));
    }

    #[test]
    #[should_panic(expected = "append_constructed requires a constructed tag")]
    fn test_append_constructed_rejects_primitive_tag() {
        let mut encoder = DerEncoder::new();
        let _ = encoder.append_constructed(DerTag::BOOLEAN, |_| Ok(()));
    }
}
