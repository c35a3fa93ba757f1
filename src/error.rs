//! Error types for compiling BPMN resources.

use smol_str::SmolStr;
use thiserror::Error;

use crate::diagnostics::ParseErrors;
use crate::listener::ListenerError;
use crate::xml::XmlError;

/// Errors that end a compilation.
///
/// Document defects never surface one by one: they are collected and
/// returned together as [`CompileError::Parse`]. The other variants abort
/// immediately.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The resource is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    /// IO error while reading the resource.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document has at least one error.
    #[error(transparent)]
    Parse(#[from] ParseErrors),

    /// Two activities of one process share an id.
    #[error("duplicate activity id '{id}' in process '{process}'")]
    DuplicateActivityId { id: SmolStr, process: SmolStr },

    /// A parse listener failed.
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

impl CompileError {
    /// The collected document errors, if that is what ended the compilation.
    pub fn parse_errors(&self) -> Option<&ParseErrors> {
        match self {
            CompileError::Parse(errors) => Some(errors),
            _ => None,
        }
    }
}
