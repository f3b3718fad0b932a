//! DOM Module - Arena-based mutable XML tree
//!
//! Storage layer behind the editing engine:
//! - Arena allocation for nodes
//! - NodeId (u32) indices with linked sibling structure
//! - String interning for element/attribute names
//! - Text kept as leading text (per element) and trailing text (per node)
//! - Markup loading (quick-xml events) and writing

pub mod document;
pub mod namespace;
pub mod node;
pub mod strings;
mod writer;

pub use document::{AncestorIter, ChildIter, DescendantIter, XmlTree};
pub use namespace::{local_name, well_known_namespace, XML_ID, XML_ID_CLARK, XML_SPACE};
pub use node::{NodeId, NodeKind, XmlAttribute, XmlNode};
pub use strings::StringPool;
