//! AST input layer for the Tern type inference engine.
//!
//! This crate provides:
//! - `Node` / `NodeData` - The ESTree-style node taxonomy, deserializable
//!   directly from the parser's JSON output
//! - `normalize` - The shim pipeline that regularizes parser output
//! - `index_nodes` - Per-build node uid assignment

pub mod node;
pub mod normalize;

pub use node::{Node, NodeData};
pub use normalize::{index_nodes, normalize};
