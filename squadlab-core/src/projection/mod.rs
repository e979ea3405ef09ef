//! Projection table: player × gameweek expected points and minutes.
//!
//! The table is consumed as an already reconciled export. Ingest only reads
//! the fixed column layout; merging upstream sources happens elsewhere.

pub mod ingest;
pub mod noise;
pub mod table;

pub use ingest::{read_fixtures, read_projections, ProjectionError};
pub use noise::perturb;
pub use table::{Fixture, PlayerProjection, ProjectionTable};
