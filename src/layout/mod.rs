//! Coordinate math for the grid.
//!
//! This module handles:
//! - Cumulative offset tables per axis with frozen bands
//! - Viewport state (scroll position, visible index windows)
//! - Header cells derived from the column tree
//! - The per-frame structural layout handed to the painter

mod frame;
mod geometry;
mod header;
mod viewport;

pub use frame::{
    BodyCell, BodyRow, CellRect, FooterCell, FrameLayout, MergeInfo, MergeMap, MergeRange,
    MergeSpec, PlacedHeader,
};
pub use geometry::{to_pixels, GeometryTable, MIN_SIZE};
pub use header::{HeaderCell, HeaderLayout};
pub use viewport::{Viewport, VisibleWindow};
