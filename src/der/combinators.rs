//! Schema combinators over the parsed node tree
//!
//! Helpers for decoding the ASN.1 grammar constructs: SEQUENCE, SET,
//! SEQUENCE OF, explicitly and implicitly tagged fields, OPTIONAL and
//! DEFAULT. Node-level helpers are free functions; helpers that consume
//! children from an iterator are methods on [`Children`].
//!
//! The iterator methods that may or may not consume a child work by
//! copy-lookahead: they clone the iterator, attempt the read, and write
//! the clone back only when a tag-matching child was consumed. A failed
//! attempt leaves the caller's iterator untouched.

use crate::der::decoder::{Children, Node, NodeContent};
use crate::der::traits::{DerDecode, ImplicitlyTaggable};
use crate::der::types::{DerTag, DerTagClass};
use crate::error::{Asn1Error, Asn1Result};

/// Decode a SEQUENCE (or any constructed node) with the given identifier
///
/// `build` receives the child iterator and must consume every child;
/// unconsumed children fail the decode.
///
/// # Errors
///
/// - [`Asn1Error::UnexpectedFieldType`] if the identifier does not match
///   or the node is primitive
/// - [`Asn1Error::InvalidObject`] if children remain after `build`
pub fn sequence<'a, T, F>(node: Node<'a>, tag: DerTag, build: F) -> Asn1Result<T>
where
    F: FnOnce(&mut Children<'a>) -> Asn1Result<T>,
{
    if node.tag() != tag {
        return Err(Asn1Error::UnexpectedFieldType(format!(
            "expected {:?}, got {:?}",
            tag,
            node.tag()
        )));
    }
    let mut children = match node.into_content() {
        NodeContent::Constructed(children) => children,
        NodeContent::Primitive(_) => {
            return Err(Asn1Error::UnexpectedFieldType(format!(
                "expected a constructed {:?}, got a primitive node",
                tag
            )))
        }
    };

    let value = build(&mut children)?;

    if children.next().is_some() {
        return Err(Asn1Error::InvalidObject(
            "unconsumed children after the sequence body".to_string(),
        ));
    }
    Ok(value)
}

/// Decode a SET with the given identifier
///
/// Parses exactly like [`sequence`]. DER canonical SET ordering is not
/// enforced; callers that need it validate separately.
pub fn set<'a, T, F>(node: Node<'a>, tag: DerTag, build: F) -> Asn1Result<T>
where
    F: FnOnce(&mut Children<'a>) -> Asn1Result<T>,
{
    sequence(node, tag, build)
}

/// Decode a SEQUENCE OF homogeneous elements under the given identifier
pub fn sequence_of<'a, T: DerDecode<'a>>(node: Node<'a>, tag: DerTag) -> Asn1Result<Vec<T>> {
    sequence(node, tag, |children| {
        let mut elements = Vec::new();
        for child in children.by_ref() {
            elements.push(T::from_der(child)?);
        }
        Ok(elements)
    })
}

/// Unwrap an explicitly tagged node and decode its single inner value
///
/// # Errors
///
/// - [`Asn1Error::InvalidFieldIdentifier`] if the node does not carry the
///   explicit tag
/// - [`Asn1Error::InvalidObject`] unless there is exactly one inner value
pub fn explicitly_tagged<'a, T, F>(
    node: Node<'a>,
    number: u32,
    class: DerTagClass,
    build: F,
) -> Asn1Result<T>
where
    F: FnOnce(Node<'a>) -> Asn1Result<T>,
{
    let tag = DerTag::explicit(number, class);
    if node.tag() != tag {
        return Err(Asn1Error::InvalidFieldIdentifier(format!(
            "expected explicit tag {:?}, got {:?}",
            tag,
            node.tag()
        )));
    }
    let mut children = match node.into_content() {
        NodeContent::Constructed(children) => children,
        // a matching tag is constructed, so the content always is
        NodeContent::Primitive(_) => {
            return Err(Asn1Error::InvalidObject(
                "explicitly tagged node has primitive content".to_string(),
            ))
        }
    };

    let inner = children.next().ok_or_else(|| {
        Asn1Error::InvalidObject("explicitly tagged node has no inner value".to_string())
    })?;
    if children.next().is_some() {
        return Err(Asn1Error::InvalidObject(
            "explicitly tagged node has more than one inner value".to_string(),
        ));
    }
    build(inner)
}

impl<'a> Children<'a> {
    /// Decode the next child as a SEQUENCE OF under the given identifier
    ///
    /// The child must be present.
    pub fn sequence_of<T: DerDecode<'a>>(&mut self, tag: DerTag) -> Asn1Result<Vec<T>> {
        let node = self.next().ok_or_else(|| {
            Asn1Error::InvalidObject("expected a sequence, found no more children".to_string())
        })?;
        sequence_of(node, tag)
    }

    /// Unwrap the next child as an explicitly tagged value
    ///
    /// The child must be present.
    pub fn explicitly_tagged<T, F>(
        &mut self,
        number: u32,
        class: DerTagClass,
        build: F,
    ) -> Asn1Result<T>
    where
        F: FnOnce(Node<'a>) -> Asn1Result<T>,
    {
        let node = self.next().ok_or_else(|| {
            Asn1Error::InvalidObject(
                "expected an explicitly tagged value, found no more children".to_string(),
            )
        })?;
        explicitly_tagged(node, number, class, build)
    }

    /// Unwrap the next child as an explicitly tagged value, if it carries
    /// the tag
    ///
    /// Returns `None` without consuming anything when the iterator is
    /// empty or the next child carries a different tag.
    pub fn optional_explicitly_tagged<T, F>(
        &mut self,
        number: u32,
        class: DerTagClass,
        build: F,
    ) -> Asn1Result<Option<T>>
    where
        F: FnOnce(Node<'a>) -> Asn1Result<T>,
    {
        let mut lookahead = self.clone();
        let node = match lookahead.next() {
            Some(node) => node,
            None => return Ok(None),
        };
        if node.tag() != DerTag::explicit(number, class) {
            return Ok(None);
        }
        let value = explicitly_tagged(node, number, class, build)?;
        *self = lookahead;
        Ok(Some(value))
    }

    /// Decode the next child through an implicit tag, if it carries the tag
    ///
    /// Callers without an override pass `T::default_tag()`. Returns `None`
    /// without consuming anything on an empty iterator or a tag mismatch.
    pub fn optional_implicitly_tagged<T: ImplicitlyTaggable<'a>>(
        &mut self,
        tag: DerTag,
    ) -> Asn1Result<Option<T>> {
        let mut lookahead = self.clone();
        let node = match lookahead.next() {
            Some(node) => node,
            None => return Ok(None),
        };
        if node.tag() != tag {
            return Ok(None);
        }
        let value = T::from_der_with_tag(node, tag)?;
        *self = lookahead;
        Ok(Some(value))
    }

    /// Decode a DEFAULT field
    ///
    /// When the next child is absent or carries a different tag, the
    /// default is returned and nothing is consumed. A present value equal
    /// to the default is rejected: DER forbids encoding a DEFAULT field
    /// at its default state.
    pub fn decode_default<T, F>(&mut self, tag: DerTag, default: T, build: F) -> Asn1Result<T>
    where
        T: PartialEq,
        F: FnOnce(Node<'a>) -> Asn1Result<T>,
    {
        let mut lookahead = self.clone();
        let node = match lookahead.next() {
            Some(node) => node,
            None => return Ok(default),
        };
        if node.tag() != tag {
            return Ok(default);
        }
        let value = build(node)?;
        if value == default {
            return Err(Asn1Error::InvalidObject(
                "DEFAULT field encoded at its default value".to_string(),
            ));
        }
        *self = lookahead;
        Ok(value)
    }

    /// Decode a DEFAULT field wrapped in an explicit tag
    ///
    /// Combines [`optional_explicitly_tagged`](Children::optional_explicitly_tagged)
    /// with the DEFAULT rules of [`decode_default`](Children::decode_default).
    pub fn decode_default_explicitly_tagged<T, F>(
        &mut self,
        number: u32,
        class: DerTagClass,
        default: T,
        build: F,
    ) -> Asn1Result<T>
    where
        T: PartialEq,
        F: FnOnce(Node<'a>) -> Asn1Result<T>,
    {
        match self.optional_explicitly_tagged(number, class, build)? {
            Some(value) if value == default => Err(Asn1Error::InvalidObject(
                "DEFAULT field encoded at its default value".to_string(),
            )),
            Some(value) => Ok(value),
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::der::decoder::parse;
    use crate::der::encoder::DerEncoder;

    #[test]
    fn test_sequence_consumes_all_children() {
        let data = [0x30, 0x06, 0x01, 0x01, 0xFF, 0x01, 0x01, 0x00];
        let result = parse(&data).unwrap();
        let (first, second) = sequence(result.root_node(), DerTag::SEQUENCE, |children| {
            let first = bool::from_der(children.next().unwrap())?;
            let second = bool::from_der(children.next().unwrap())?;
            Ok((first, second))
        })
        .unwrap();
        assert!(first);
        assert!(!second);
    }

    #[test]
    fn test_sequence_rejects_leftover_children() {
        let data = [0x30, 0x06, 0x01, 0x01, 0xFF, 0x01, 0x01, 0x00];
        let result = parse(&data).unwrap();
        let outcome = sequence(result.root_node(), DerTag::SEQUENCE, |children| {
            bool::from_der(children.next().unwrap())
        });
        assert!(matches!(outcome, Err(Asn1Error::InvalidObject(_))));
    }

    #[test]
    fn test_sequence_rejects_wrong_tag() {
        let data = [0x31, 0x00];
        let result = parse(&data).unwrap();
        let outcome = sequence(result.root_node(), DerTag::SEQUENCE, |_| Ok(()));
        assert!(matches!(outcome, Err(Asn1Error::UnexpectedFieldType(_))));
    }

    #[test]
    fn test_set_parses_like_sequence() {
        let data = [0x31, 0x03, 0x01, 0x01, 0xFF];
        let result = parse(&data).unwrap();
        let value = set(result.root_node(), DerTag::SET, |children| {
            bool::from_der(children.next().unwrap())
        })
        .unwrap();
        assert!(value);
    }

    #[test]
    fn test_sequence_of_booleans() {
        let data = [0x30, 0x09, 0x01, 0x01, 0xFF, 0x01, 0x01, 0x00, 0x01, 0x01, 0xFF];
        let result = parse(&data).unwrap();
        let values: Vec<bool> = sequence_of(result.root_node(), DerTag::SEQUENCE).unwrap();
        assert_eq!(values, vec![true, false, true]);
    }

    #[test]
    fn test_sequence_of_propagates_element_errors() {
        // 0x01 is not a DER boolean octet
        let data = [0x30, 0x03, 0x01, 0x01, 0x01];
        let result = parse(&data).unwrap();
        let outcome: Asn1Result<Vec<bool>> = sequence_of(result.root_node(), DerTag::SEQUENCE);
        assert!(matches!(outcome, Err(Asn1Error::InvalidObject(_))));
    }

    #[test]
    fn test_explicitly_tagged() {
        // [2] EXPLICIT BOOLEAN true
        let data = [0xA2, 0x03, 0x01, 0x01, 0xFF];
        let result = parse(&data).unwrap();
        let value = explicitly_tagged(
            result.root_node(),
            2,
            DerTagClass::ContextSpecific,
            bool::from_der,
        )
        .unwrap();
        assert!(value);
    }

    #[test]
    fn test_explicitly_tagged_wrong_number() {
        let data = [0xA2, 0x03, 0x01, 0x01, 0xFF];
        let result = parse(&data).unwrap();
        let outcome = explicitly_tagged(
            result.root_node(),
            3,
            DerTagClass::ContextSpecific,
            bool::from_der,
        );
        assert!(matches!(outcome, Err(Asn1Error::InvalidFieldIdentifier(_))));
    }

    #[test]
    fn test_explicitly_tagged_child_count() {
        // empty wrapper
        let result = parse(&[0xA0, 0x00]).unwrap();
        let outcome = explicitly_tagged(
            result.root_node(),
            0,
            DerTagClass::ContextSpecific,
            bool::from_der,
        );
        assert!(matches!(outcome, Err(Asn1Error::InvalidObject(_))));

        // two inner values
        let data = [0xA0, 0x06, 0x01, 0x01, 0xFF, 0x01, 0x01, 0x00];
        let result = parse(&data).unwrap();
        let outcome = explicitly_tagged(
            result.root_node(),
            0,
            DerTagClass::ContextSpecific,
            bool::from_der,
        );
        assert!(matches!(outcome, Err(Asn1Error::InvalidObject(_))));
    }

    #[test]
    fn test_optional_explicitly_tagged_present() {
        // SEQUENCE { [0] EXPLICIT BOOLEAN true, BOOLEAN false }
        let data = [0x30, 0x08, 0xA0, 0x03, 0x01, 0x01, 0xFF, 0x01, 0x01, 0x00];
        let result = parse(&data).unwrap();
        sequence(result.root_node(), DerTag::SEQUENCE, |children| {
            let optional = children
                .optional_explicitly_tagged(0, DerTagClass::ContextSpecific, bool::from_der)?;
            assert_eq!(optional, Some(true));
            let trailing = bool::from_der(children.next().unwrap())?;
            assert!(!trailing);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_optional_explicitly_tagged_absent_leaves_iterator() {
        // SEQUENCE { BOOLEAN false }
        let data = [0x30, 0x03, 0x01, 0x01, 0x00];
        let result = parse(&data).unwrap();
        sequence(result.root_node(), DerTag::SEQUENCE, |children| {
            let optional = children
                .optional_explicitly_tagged(0, DerTagClass::ContextSpecific, bool::from_der)?;
            assert_eq!(optional, None);
            // the mismatching child is still there
            let value = bool::from_der(children.next().unwrap())?;
            assert!(!value);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_optional_explicitly_tagged_empty_iterator() {
        let result = parse(&[0x30, 0x00]).unwrap();
        sequence(result.root_node(), DerTag::SEQUENCE, |children| {
            let optional = children
                .optional_explicitly_tagged(1, DerTagClass::ContextSpecific, bool::from_der)?;
            assert_eq!(optional, None);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_optional_implicitly_tagged() {
        use crate::datatypes::BitString;

        // SEQUENCE { [5] IMPLICIT BIT STRING, BOOLEAN true }
        let data = [0x30, 0x07, 0x85, 0x02, 0x00, 0xFF, 0x01, 0x01, 0xFF];
        let result = parse(&data).unwrap();
        sequence(result.root_node(), DerTag::SEQUENCE, |children| {
            let tag = DerTag::context_specific(false, 5);
            let bits: Option<BitString> = children.optional_implicitly_tagged(tag)?;
            let bits = bits.expect("implicitly tagged bit string should match");
            assert_eq!(bits.bytes(), &[0xFF]);
            assert_eq!(bits.padding_bits(), 0);

            // a second attempt sees the boolean and declines
            let missing: Option<BitString> = children.optional_implicitly_tagged(tag)?;
            assert!(missing.is_none());

            let value = bool::from_der(children.next().unwrap())?;
            assert!(value);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_decode_default_absent() {
        let result = parse(&[0x30, 0x00]).unwrap();
        let value = sequence(result.root_node(), DerTag::SEQUENCE, |children| {
            children.decode_default(DerTag::BOOLEAN, false, bool::from_der)
        })
        .unwrap();
        assert!(!value);
    }

    #[test]
    fn test_decode_default_present_non_default() {
        let data = [0x30, 0x03, 0x01, 0x01, 0xFF];
        let result = parse(&data).unwrap();
        let value = sequence(result.root_node(), DerTag::SEQUENCE, |children| {
            children.decode_default(DerTag::BOOLEAN, false, bool::from_der)
        })
        .unwrap();
        assert!(value);
    }

    #[test]
    fn test_decode_default_rejects_default_state() {
        // BOOLEAN false encoded although false is the default
        let data = [0x30, 0x03, 0x01, 0x01, 0x00];
        let result = parse(&data).unwrap();
        let outcome = sequence(result.root_node(), DerTag::SEQUENCE, |children| {
            children.decode_default(DerTag::BOOLEAN, false, bool::from_der)
        });
        assert!(matches!(outcome, Err(Asn1Error::InvalidObject(_))));
    }

    #[test]
    fn test_decode_default_explicitly_tagged() {
        // absent
        let result = parse(&[0x30, 0x00]).unwrap();
        let value = sequence(result.root_node(), DerTag::SEQUENCE, |children| {
            children.decode_default_explicitly_tagged(
                0,
                DerTagClass::ContextSpecific,
                true,
                bool::from_der,
            )
        })
        .unwrap();
        assert!(value);

        // present at the default state
        let data = [0x30, 0x05, 0xA0, 0x03, 0x01, 0x01, 0xFF];
        let result = parse(&data).unwrap();
        let outcome = sequence(result.root_node(), DerTag::SEQUENCE, |children| {
            children.decode_default_explicitly_tagged(
                0,
                DerTagClass::ContextSpecific,
                true,
                bool::from_der,
            )
        });
        assert!(matches!(outcome, Err(Asn1Error::InvalidObject(_))));
    }

    #[test]
    fn test_roundtrip_through_combinators() {
        // build SEQUENCE { [1] EXPLICIT BOOLEAN true } and decode it back
        let mut encoder = DerEncoder::new();
        encoder
            .append_constructed(DerTag::SEQUENCE, |encoder| {
                encoder.serialize_explicitly_tagged(&true, 1, DerTagClass::ContextSpecific)
            })
            .unwrap();
        let bytes = encoder.into_bytes();

        let result = parse(&bytes).unwrap();
        let value = sequence(result.root_node(), DerTag::SEQUENCE, |children| {
            children.explicitly_tagged(1, DerTagClass::ContextSpecific, bool::from_der)
        })
        .unwrap();
        assert!(value);
    }
}
