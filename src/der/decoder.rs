//! DER parser: flat node buffer and lazy tree view
//!
//! Parsing happens in two steps. [`parse`] walks the input once and fills a
//! flat buffer of depth-tagged records in preorder: for any constructed
//! node, all of its descendants occupy a contiguous run immediately after
//! it, each with a strictly greater depth. [`ParseResult::root_node`] then
//! exposes the buffer as a [`Node`] tree whose child collections are lazy
//! iterators over sub-ranges of the same buffer.
//!
//! Every record keeps the exact input slice it was decoded from, so the
//! encoded bytes of any node can be handed back byte-identical.

use crate::der::types::{DerLength, DerTag};
use crate::error::{Asn1Error, Asn1Result};

/// Maximum nesting depth accepted by the parser
const MAX_PARSE_DEPTH: usize = 50;

/// One record of the flat parse buffer
///
/// `data` is `Some` for primitive nodes and `None` for constructed ones,
/// whose children follow in the buffer at `depth + 1`.
#[derive(Debug, Clone)]
pub(crate) struct ParserNode<'a> {
    tag: DerTag,
    depth: usize,
    encoded: &'a [u8],
    data: Option<&'a [u8]>,
}

/// Parse a DER document into a flat node buffer
///
/// The input must contain exactly one top-level value; residual bytes are
/// rejected. The returned [`ParseResult`] owns the buffer, and
/// [`ParseResult::root_node`] borrows the tree view from it.
///
/// # Errors
///
/// - [`Asn1Error::TruncatedField`] if the input ends inside a tag, a
///   length, or a declared content region
/// - [`Asn1Error::UnsupportedFieldLength`] for indefinite or non-minimal
///   lengths
/// - [`Asn1Error::InvalidObject`] for residual top-level bytes, nesting
///   deeper than 50 levels, or non-minimal tag numbers
pub fn parse(data: &[u8]) -> Asn1Result<ParseResult<'_>> {
    ParseResult::parse(data)
}

/// Owner of the flat parse buffer
///
/// Created by [`parse`]; immutable afterwards. All [`Node`] and
/// [`Children`] values borrow from this buffer and stay cheap to clone.
#[derive(Debug)]
pub struct ParseResult<'a> {
    nodes: Vec<ParserNode<'a>>,
}

impl<'a> ParseResult<'a> {
    fn parse(data: &'a [u8]) -> Asn1Result<Self> {
        let mut nodes = Vec::with_capacity(16);
        let mut cursor = data;
        Self::parse_node(&mut cursor, 1, &mut nodes)?;
        if !cursor.is_empty() {
            return Err(Asn1Error::InvalidObject(format!(
                "{} residual bytes after the top level value",
                cursor.len()
            )));
        }
        Ok(Self { nodes })
    }

    /// Decode one TLV from the front of `*data`, appending its records
    ///
    /// Constructed nodes recurse over their content region at `depth + 1`
    /// until it is exhausted, which yields the preorder buffer layout.
    fn parse_node(
        data: &mut &'a [u8],
        depth: usize,
        nodes: &mut Vec<ParserNode<'a>>,
    ) -> Asn1Result<()> {
        if depth > MAX_PARSE_DEPTH {
            return Err(Asn1Error::InvalidObject(format!(
                "nesting exceeds {} levels",
                MAX_PARSE_DEPTH
            )));
        }

        let original = *data;
        let (tag, tag_len) = DerTag::decode(original)?;
        let (length, len_len) = DerLength::decode(&original[tag_len..])?;
        let header_len = tag_len + len_len;
        let content_len = length.value();

        if original.len() - header_len < content_len {
            return Err(Asn1Error::TruncatedField(format!(
                "content declares {} bytes, {} available",
                content_len,
                original.len() - header_len
            )));
        }

        let content = &original[header_len..header_len + content_len];
        let encoded = &original[..header_len + content_len];
        *data = &original[header_len + content_len..];

        if tag.is_constructed() {
            nodes.push(ParserNode {
                tag,
                depth,
                encoded,
                data: None,
            });
            let mut inner = content;
            while !inner.is_empty() {
                Self::parse_node(&mut inner, depth + 1, nodes)?;
            }
        } else {
            nodes.push(ParserNode {
                tag,
                depth,
                encoded,
                data: Some(content),
            });
        }

        Ok(())
    }

    /// Borrow the root node of the parsed document
    pub fn root_node(&self) -> Node<'_> {
        // the buffer holds at least the root record after a successful parse
        let (node, _) = Node::split_first(&self.nodes);
        node
    }
}

/// One node of the parsed tree
///
/// A node is either primitive, carrying its content octets, or
/// constructed, carrying a lazy [`Children`] collection. `encoded_bytes`
/// is always the exact input slice the node was decoded from, identifier
/// and length octets included.
#[derive(Debug, Clone)]
pub struct Node<'a> {
    tag: DerTag,
    content: NodeContent<'a>,
    encoded: &'a [u8],
}

/// Content of a [`Node`]
#[derive(Debug, Clone)]
pub enum NodeContent<'a> {
    /// Raw content octets of a primitive node
    Primitive(&'a [u8]),
    /// Lazy child collection of a constructed node
    Constructed(Children<'a>),
}

impl<'a> Node<'a> {
    /// Split the leading node off a record run
    ///
    /// For a constructed head this detaches the maximal following run of
    /// strictly deeper records as its descendant region and returns the
    /// rest.
    fn split_first(records: &'a [ParserNode<'a>]) -> (Node<'a>, &'a [ParserNode<'a>]) {
        let head = &records[0];
        let rest = &records[1..];
        match head.data {
            Some(content) => (
                Node {
                    tag: head.tag,
                    content: NodeContent::Primitive(content),
                    encoded: head.encoded,
                },
                rest,
            ),
            None => {
                let run = rest.iter().take_while(|n| n.depth > head.depth).count();
                (
                    Node {
                        tag: head.tag,
                        content: NodeContent::Constructed(Children {
                            nodes: &rest[..run],
                            parent_depth: head.depth,
                        }),
                        encoded: head.encoded,
                    },
                    &rest[run..],
                )
            }
        }
    }

    /// Get the tag
    pub fn tag(&self) -> DerTag {
        self.tag
    }

    /// Check whether the node is constructed
    pub fn is_constructed(&self) -> bool {
        matches!(self.content, NodeContent::Constructed(_))
    }

    /// Get the node content
    pub fn content(&self) -> &NodeContent<'a> {
        &self.content
    }

    /// Consume the node, returning its content
    pub fn into_content(self) -> NodeContent<'a> {
        self.content
    }

    /// The exact input slice this node was decoded from
    pub fn encoded_bytes(&self) -> &'a [u8] {
        self.encoded
    }
}

impl PartialEq for Node<'_> {
    /// Nodes are equal when their tags and encoded bytes match
    ///
    /// Equal encoded bytes imply structurally equal content, so the
    /// comparison does not need to walk child records (whose buffer
    /// depths may differ between documents).
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && self.encoded == other.encoded
    }
}

impl Eq for Node<'_> {}

/// Lazy iterator over the direct children of a constructed node
///
/// Backed by a sub-range of the flat parse buffer plus the parent depth.
/// Cloning is cheap (a slice and an index), which lets callers snapshot
/// the iterator, attempt a read, and discard the attempt.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    nodes: &'a [ParserNode<'a>],
    parent_depth: usize,
}

impl<'a> Iterator for Children<'a> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Node<'a>> {
        if self.nodes.is_empty() {
            return None;
        }
        // direct children sit exactly one level below the parent
        debug_assert_eq!(self.nodes[0].depth, self.parent_depth + 1);
        let (node, rest) = Node::split_first(self.nodes);
        self.nodes = rest;
        Some(node)
    }
}
