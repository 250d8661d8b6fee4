//! Codec traits implemented by ASN.1 value types
//!
//! These three traits are the boundary toward primitive type
//! implementations. The crate ships BOOLEAN, BIT STRING and
//! GeneralizedTime; external types plug into the parser, the serializer
//! and the schema combinators the same way.

use crate::der::decoder::Node;
use crate::der::encoder::DerEncoder;
use crate::der::types::DerTag;
use crate::error::Asn1Result;

/// A type that can be decoded from a parsed DER node
pub trait DerDecode<'a>: Sized {
    /// Decode a value from a node
    fn from_der(node: Node<'a>) -> Asn1Result<Self>;
}

/// A type that can be serialized into a [`DerEncoder`]
pub trait DerEncode {
    /// Append the DER encoding of the value
    fn der_encode(&self, encoder: &mut DerEncoder) -> Asn1Result<()>;
}

/// A decodable and encodable type that can carry an implicit tag
///
/// An implicit tag replaces the type's default identifier in place,
/// keeping the constructed bit. Implementations route `from_der` and
/// `der_encode` through the tagged variants with
/// [`default_tag`](ImplicitlyTaggable::default_tag).
pub trait ImplicitlyTaggable<'a>: DerDecode<'a> + DerEncode {
    /// The identifier the type uses when no implicit tag overrides it
    fn default_tag() -> DerTag;

    /// Decode a value from a node carrying the given identifier
    fn from_der_with_tag(node: Node<'a>, tag: DerTag) -> Asn1Result<Self>;

    /// Append the value's encoding under the given identifier
    fn der_encode_with_tag(&self, encoder: &mut DerEncoder, tag: DerTag) -> Asn1Result<()>;
}
