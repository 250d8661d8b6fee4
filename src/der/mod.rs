//! DER (Distinguished Encoding Rules) parser and serializer
//!
//! Each ASN.1 value is encoded as a TLV (Tag-Length-Value) triplet:
//!
//! ```text
//! [Tag] [Length] [Value]
//! ```
//!
//! ## Tag Encoding
//!
//! The tag identifies the type of the data:
//! - **Class** (2 bits): Universal (00), Application (01),
//!   Context-specific (10), Private (11)
//! - **Constructed/Primitive** (1 bit): 0 = Primitive, 1 = Constructed
//! - **Tag Number**: 0-30 in the leading byte, larger numbers in base-128
//!   continuation bytes
//!
//! ## Length Encoding
//!
//! - **Short form** (1 byte): for lengths 0-127
//! - **Long form**: first byte `0x80 | n`, then `n` big-endian bytes
//!
//! ## DER Restrictions
//!
//! DER is the canonical subset of BER: every value has exactly one
//! encoding. This module rejects everything BER-only on decode:
//! indefinite lengths, non-minimal length forms, long-form tag numbers
//! below 31. The encoder only ever produces the minimal forms.
//!
//! ## Structure
//!
//! [`parse`] walks a fully buffered input into a flat preorder node
//! buffer; [`Node`] and [`Children`] expose it as a lazy tree.
//! [`DerEncoder`] builds output with length back-patching, so nested
//! constructed values need no precomputed sizes. The combinators decode
//! the ASN.1 grammar constructs (SEQUENCE, SET, tagged, OPTIONAL,
//! DEFAULT) on top of the tree.

pub mod combinators;
pub mod decoder;
pub mod encoder;
pub mod traits;
pub mod types;

pub use combinators::{explicitly_tagged, sequence, sequence_of, set};
pub use decoder::{parse, Children, Node, NodeContent, ParseResult};
pub use encoder::DerEncoder;
pub use traits::{DerDecode, DerEncode, ImplicitlyTaggable};
pub use types::{DerLength, DerTag, DerTagClass};
