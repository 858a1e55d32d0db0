//! Schematic data model and geometry primitives.

pub mod geometry;
pub mod schema;

// Re-export for convenience
pub use geometry::*;
pub use schema::*;
