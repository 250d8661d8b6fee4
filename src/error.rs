//! Error types for DER parsing and serialization

use thiserror::Error;

/// Main error type for DER operations
///
/// The set of failure kinds is closed. Parsing and serialization surface
/// every failure to the caller; there is no retry and no local recovery.
/// Precondition violations (for example passing a constructed tag to
/// `append_primitive`) are programmer errors and panic instead.
#[derive(Error, Debug)]
pub enum Asn1Error {
    /// Input ended inside an identifier, a length, or a declared content region.
    #[error("Truncated ASN.1 field: {0}")]
    TruncatedField(String),

    /// Indefinite form (0x80) or a non-minimal long-form length was encountered.
    #[error("Unsupported field length: {0}")]
    UnsupportedFieldLength(String),

    /// Structural DER violation.
    ///
    /// Covers bad tag-number minimality, residual bytes at the top level,
    /// nesting beyond the depth limit, wrong child counts, unconsumed
    /// children after a sequence body, DEFAULT fields encoded at their
    /// default value, and primitive content validation failures.
    #[error("Invalid ASN.1 object: {0}")]
    InvalidObject(String),

    /// Identifier mismatch on an expected tag.
    #[error("Unexpected field type: {0}")]
    UnexpectedFieldType(String),

    /// Identifier mismatch where an explicit tag was required.
    #[error("Invalid field identifier: {0}")]
    InvalidFieldIdentifier(String),
}

/// Result type alias for DER operations
pub type Asn1Result<T> = Result<T, Asn1Error>;
