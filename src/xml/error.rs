//! Error types for reading XML documents.

use thiserror::Error;

/// Errors that abort reading a document before compilation starts.
#[derive(Debug, Error)]
pub enum XmlError {
    /// The tokenizer rejected the input.
    #[error("XML parse error at position {position}: {message}")]
    Syntax { position: u64, message: String },

    /// A name or value could not be decoded.
    #[error("Invalid {kind}: {message}")]
    Invalid { kind: &'static str, message: String },

    /// The document ended while elements were still open.
    #[error("Unexpected end of document: element '{0}' is not closed")]
    Unclosed(String),

    /// The document contains no element at all.
    #[error("Document has no root element")]
    Empty,
}

impl XmlError {
    /// Create a syntax error at a byte position.
    pub fn syntax(position: u64, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }

    /// Create an invalid name error.
    pub fn invalid_name(message: impl Into<String>) -> Self {
        Self::Invalid {
            kind: "name",
            message: message.into(),
        }
    }

    /// Create an invalid attribute error.
    pub fn invalid_attribute(message: impl Into<String>) -> Self {
        Self::Invalid {
            kind: "attribute",
            message: message.into(),
        }
    }

    /// Create an invalid text error.
    pub fn invalid_text(message: impl Into<String>) -> Self {
        Self::Invalid {
            kind: "text",
            message: message.into(),
        }
    }
}
