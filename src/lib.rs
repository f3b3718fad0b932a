//! xmledit - Editing engine for XML trees in the text/tail model
//!
//! Every element owns the text before its first child ("text") and every
//! node owns the text after its end tag ("tail"). The modules build on
//! that model:
//! - dom: arena tree storage, markup loading and writing
//! - nav: text runs as first-class nodes, document-order axes
//! - text: character addressing across runs, skip sets
//! - edit: structural edits that keep the text stream intact
//! - transform: recursive tree-to-tree transformations with per-tag hooks
//! - indent: whitespace formatter honoring `xml:space`

pub mod dom;
pub mod edit;
pub mod error;
pub mod indent;
pub mod nav;
pub mod text;
pub mod transform;

pub use dom::{NodeId, NodeKind, XmlTree};
pub use error::{AddressingError, Error, Result, StructuralError};
pub use indent::{indent, IndentOptions, Indenter};
pub use nav::{Node, Slot, TextRun};
pub use text::{Location, SkipSet};
pub use transform::{Output, TransformOptions, Transformed, Transformer};
