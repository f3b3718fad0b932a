//! Error taxonomy
//!
//! Two families of failures:
//! - `StructuralError`: an edit would break a tree invariant
//! - `AddressingError`: a character position or identifier does not resolve
//!
//! Both are raised at the point of violation, before any mutation happens.

use thiserror::Error;

/// An operation would violate the shape of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("cannot {op} the root element <{tag}>")]
    RootElement { op: &'static str, tag: String },

    #[error("element <{tag}> has no parent (root element?)")]
    NoParent { tag: String },

    #[error("element <{tag}> has no grandparent")]
    NoGrandparent { tag: String },

    #[error("element <{from}> is not before element <{to}> in document order")]
    NotInDocumentOrder { from: String, to: String },

    #[error("cannot move <{src}> onto <{target}>: one contains the other")]
    CyclicMove { src: String, target: String },

    #[error("cannot switch nested elements <{first}> and <{second}>")]
    NestedSwitch { first: String, second: String },

    #[error("start <{start}> and end <{end}> must be siblings")]
    NotSiblings { start: String, end: String },

    #[error("start <{start}> must come before end <{end}>")]
    ReversedOrder { start: String, end: String },

    #[error("target list must be a non-empty list of elements")]
    EmptyTargets,

    #[error("element <{tag}> is not inside container <{container}>")]
    NotInContainer { tag: String, container: String },

    #[error("cannot determine a path for an absent text run")]
    EmptyTextRun,

    #[error("text run no longer matches the tree")]
    StaleTextRun,
}

/// A position or identifier does not resolve to anything in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressingError {
    #[error("cannot go to position {requested} in element <{tag}>: only {available} characters available")]
    PositionOutOfRange {
        requested: usize,
        available: usize,
        tag: String,
    },

    #[error("id {0} not found")]
    UnknownId(String),
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Addressing(#[from] AddressingError),

    #[error("malformed markup: {0}")]
    Markup(#[from] quick_xml::Error),

    #[error("malformed attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("markup has no root element")]
    NoRootElement,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The structural failure behind this error, if any.
    pub fn as_structural(&self) -> Option<&StructuralError> {
        match self {
            Error::Structural(e) => Some(e),
            _ => None,
        }
    }

    /// The addressing failure behind this error, if any.
    pub fn as_addressing(&self) -> Option<&AddressingError> {
        match self {
            Error::Addressing(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_message_reports_available() {
        let err = AddressingError::PositionOutOfRange {
            requested: 12,
            available: 7,
            tag: "p".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot go to position 12 in element <p>: only 7 characters available"
        );
    }

    #[test]
    fn test_error_accessors() {
        let err: Error = StructuralError::EmptyTargets.into();
        assert_eq!(err.as_structural(), Some(&StructuralError::EmptyTargets));
        assert!(err.as_addressing().is_none());
    }
}
