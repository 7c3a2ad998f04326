//! XML serialization.
//!
//! Turns a `Document`, or any single node of one, back into text.

pub mod xml;

pub use xml::{serialize, serialize_node};
