//! vgrid - virtualized data-grid core for canvas tables
//!
//! Owns everything a canvas grid needs besides the pixels:
//! - Offset tables mapping scroll pixels to row/column indices, with frozen bands
//! - Tree rows with expand/collapse, filtering and a flat visible row list
//! - Change tracking with undo/redo, per-cell validation (sync or async)
//! - Row and cell-range selection, merged cells
//! - Coalesced redraws producing a laid-out frame for the host to paint
//!
//! # Usage (Rust)
//!
//! ```
//! use vgrid::{Column, Grid, GridConfig};
//! use serde_json::json;
//!
//! let mut grid = Grid::new(GridConfig::default())?;
//! grid.load_columns(vec![Column::new("name", "Name"), Column::new("age", "Age")])?;
//! grid.load_data(&[json!({"name": "Ada", "age": 36})])?;
//! grid.set_item_value("0", "age", 37, true, true, false)?;
//! assert_eq!(grid.get_changed_data().len(), 1);
//! let frame = grid.flush_frame();
//! assert!(frame.is_some());
//! # Ok::<(), vgrid::GridError>(())
//! ```
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { VGrid } from 'vgrid';
//! await init();
//! const grid = new VGrid({ rowKeyField: 'id', viewportHeight: 600 });
//! grid.loadColumns(columns);
//! grid.loadData(rows);
//! grid.setPainter((frame) => paint(ctx, frame));
//! grid.on('selectionChange', (snapshot) => console.log(snapshot.keys));
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod grid;
pub mod layout;
pub mod ledger;
pub mod redraw;
pub mod selection;
pub mod store;
pub mod types;
pub mod validation;

#[cfg(target_arch = "wasm32")]
pub mod web;

use wasm_bindgen::prelude::*;

pub use config::GridConfig;
pub use error::{GridError, Result};
pub use events::{EventKind, GridEvent, ListenerId, SelectionSnapshot};
pub use grid::{ChangedCell, ChangedRow, EditingCell, FramePainter, Grid};
pub use layout::{FrameLayout, GeometryTable, MergeSpec, Viewport, VisibleWindow};
pub use validation::{
    sync_validator, ValidationContext, ValidationError, ValidationReport, Validator,
};
pub use types::*;

#[cfg(target_arch = "wasm32")]
pub use web::VGrid;

/// Get the library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
