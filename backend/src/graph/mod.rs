//! Location topology of the apron.
//!
//! [`LocationGraph`] turns a list of stands/gates and directed road segments into
//! a dense table of shortest travel distances. The table is computed once at
//! startup and shared read-only by every generation cycle.

pub mod error;
pub mod location_graph;

pub use error::{GraphError, GraphResult};
pub use location_graph::{Edge, GraphConfig, LocationGraph};
