use crate::models::Location;

pub type GraphResult<T> = Result<T, GraphError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// An edge references a location that was not declared as a vertex.
    #[error("edge {from} -> {to} references unknown vertex '{vertex}'")]
    UnknownVertex {
        from: Location,
        to: Location,
        vertex: Location,
    },

    #[error("edge {from} -> {to} has negative weight {weight}")]
    NegativeWeight {
        from: Location,
        to: Location,
        weight: f64,
    },

    #[error("edge {from} -> {to} has invalid weight {weight}")]
    InvalidWeight {
        from: Location,
        to: Location,
        weight: f64,
    },

    /// Lookup for a location that is not part of the graph.
    #[error("unknown location '{0}'")]
    UnknownLocation(Location),
}
