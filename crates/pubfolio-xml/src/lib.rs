//! Generic XML to object conversion.
//!
//! Turns an XML document into a nested `serde_json::Value` tree. Elements
//! become objects keyed by tag name, attributes are stored as string members
//! of the element's object, and non-blank text lands under [`TEXT_KEY`].
//! A tag that occurs more than once under the same parent is promoted to an
//! array on its second occurrence; tags listed in the converter's array-tag
//! set are arrays from the first occurrence.

mod convert;
pub mod node;

use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;

/// Reserved key under which element text is stored.
pub const TEXT_KEY: &str = "#text";

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("malformed XML at byte {position}: {message}")]
    Malformed { position: u64, message: String },
    #[error("unclosed element <{0}> at end of input")]
    Unclosed(String),
    #[error("document has no root element")]
    NoRoot,
    #[error("document has more than one root element (found <{0}>)")]
    MultipleRoots(String),
    #[error("text content outside the root element")]
    TextOutsideRoot,
}

/// Converts XML text into a generic object tree.
#[derive(Debug, Clone, Default)]
pub struct XmlConverter {
    array_tags: HashSet<String>,
}

impl XmlConverter {
    /// A converter with an empty array-tag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// A converter that always represents the given tags as arrays.
    pub fn with_array_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            array_tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_array_tag(&self, name: &str) -> bool {
        self.array_tags.contains(name)
    }

    /// The configured array tags, sorted.
    pub fn array_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.array_tags.iter().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Convert a complete XML document.
    ///
    /// The returned value is an object with a single member named after the
    /// document's root element.
    pub fn convert(&self, xml: &str) -> Result<Value, XmlError> {
        convert::convert(xml, self)
    }
}

/// Convenience wrapper around [`XmlConverter::convert`].
pub fn parse_xml(xml: &str, array_tags: &[&str]) -> Result<Value, XmlError> {
    XmlConverter::with_array_tags(array_tags.iter().copied()).convert(xml)
}
