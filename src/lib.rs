//! Strict DER parser and serializer for ASN.1
//!
//! This crate decodes and encodes ASN.1 values in the Distinguished
//! Encoding Rules, the canonical TLV format used throughout PKI and
//! cryptographic structures (certificates, keys, signatures).
//!
//! Decoding walks a fully buffered input into a flat, depth-tagged node
//! buffer and exposes it as a lazy tree of [`Node`] values. Encoding goes
//! through [`DerEncoder`], which back-patches length prefixes so nested
//! constructed values can be written without knowing their sizes up
//! front. Schema-bound types implement the [`DerDecode`], [`DerEncode`]
//! and [`ImplicitlyTaggable`] traits; the crate ships BOOLEAN,
//! [`BitString`] and [`GeneralizedTime`] as the built-in value types.
//!
//! Everything BER-only is rejected: indefinite lengths, non-minimal
//! length and tag forms, sloppy BOOLEAN octets, DEFAULT fields encoded at
//! their default value.

pub mod datatypes;
pub mod der;
pub mod error;

pub use datatypes::{BitString, GeneralizedTime};
pub use der::{
    explicitly_tagged, parse, sequence, sequence_of, set, Children, DerDecode, DerEncode,
    DerEncoder, DerLength, DerTag, DerTagClass, ImplicitlyTaggable, Node, NodeContent,
    ParseResult,
};
pub use error::{Asn1Error, Asn1Result};
