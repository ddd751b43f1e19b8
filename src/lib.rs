//! Connection and snapping geometry for toy-train track layouts.
//!
//! Pieces are plain values; every operation here is a pure function over a
//! piece or a piece list.

pub mod auto_layout;
pub mod connection;
pub mod flow;
pub mod geometry;
pub mod layout;
pub mod placement;
pub mod report;
pub mod snap;
pub mod topology;
pub mod types;
