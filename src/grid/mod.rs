//! The `Grid` facade - the primary entry point for hosts.
//!
//! `Grid` owns every component (data store, change ledger, validation
//! pipeline, viewport, event bus and redraw scheduler) and is the only place
//! where they are wired together. Every mutation follows the same order:
//! change state, invalidate derived state synchronously, then request a draw.
//!
//! Operations are split by concern:
//! - `editing`: cell writes, edit session, undo/redo, change queries, sizes, merges
//! - `scroll`: scroll commands and visible windows
//! - `selection`: row selection, cell ranges, expansion
//! - `validate`: validators and validation runs
//! - `frame`: frame layout and painting

mod editing;
mod frame;
mod scroll;
mod selection;
mod validate;

pub use editing::{ChangedCell, ChangedRow, EditingCell};
pub use frame::FramePainter;

use std::rc::Rc;

use crate::config::GridConfig;
use crate::error::Result;
use crate::events::{EventBus, EventKind, GridEvent, ListenerId};
use crate::layout::{to_pixels, FrameLayout, MergeSpec, Viewport};
use crate::ledger::{ChangeLedger, EditHistory};
use crate::redraw::{DrawRequest, RedrawScheduler};
use crate::store::{DataStore, RowFilter};
use crate::types::{CellValue, Column, Position, Row, RowKey};
use crate::validation::ValidationPipeline;

pub struct Grid {
    store: DataStore,
    ledger: ChangeLedger,
    history: EditHistory,
    validation: ValidationPipeline,
    viewport: Viewport,
    events: EventBus,
    redraw: RedrawScheduler,
    merges: Vec<MergeSpec>,
    editing: Option<EditingCell>,
    last_frame: Option<Rc<FrameLayout>>,
    /// Full widget size, header and footer included
    width: f32,
    height: f32,
}

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("store", &self.store)
            .field("viewport", &self.viewport)
            .field("events", &self.events)
            .field("editing", &self.editing)
            .finish_non_exhaustive()
    }
}

impl Grid {
    /// Create an empty grid.
    ///
    /// # Errors
    /// Returns `GridError::Config` if the configuration is invalid.
    pub fn new(config: GridConfig) -> Result<Self> {
        config.validate()?;
        let mut grid = Self {
            history: EditHistory::new(config.history_limit),
            width: config.viewport_width,
            height: config.viewport_height,
            store: DataStore::new(config),
            ledger: ChangeLedger::new(),
            validation: ValidationPipeline::new(),
            viewport: Viewport::new(),
            events: EventBus::new(),
            redraw: RedrawScheduler::new(),
            merges: Vec::new(),
            editing: None,
            last_frame: None,
        };
        grid.do_layout();
        grid.invalidate(false);
        Ok(grid)
    }

    // Lifecycle

    /// Replace the configuration and rebuild everything derived from it.
    ///
    /// Changing `rowKeyField` re-keys the loaded rows; edits, undo history,
    /// validation errors, selection and merges follow their rows to the new
    /// keys. Changing `childrenField` re-reads the last loaded data.
    pub fn load_config(&mut self, config: GridConfig) -> Result<()> {
        config.validate()?;
        let (limit, width, height) = (
            config.history_limit,
            config.viewport_width,
            config.viewport_height,
        );
        let selected_before = self.selected_keys();
        let renamed = self.store.set_config(config)?;
        self.done_edit();
        self.history.set_limit(limit);
        self.width = width;
        self.height = height;

        self.ledger.rename_rows(&renamed);
        self.history.rename_rows(&renamed);
        self.validation.rename_rows(&renamed);
        for merge in &mut self.merges {
            if let Some(key) = renamed.get(&merge.row_key) {
                merge.row_key = key.clone();
            }
        }
        self.retain_known_keys();
        self.do_layout();
        if self.selected_keys() != selected_before {
            self.emit_selection_change();
        }
        self.invalidate(false);
        Ok(())
    }

    fn selected_keys(&self) -> Vec<RowKey> {
        self.store
            .selection_rows()
            .iter()
            .map(|node| node.key.clone())
            .collect()
    }

    /// Replace the column definitions. Ledger, history and validation entries
    /// for vanished columns are dropped.
    pub fn load_columns(&mut self, columns: Vec<Column>) -> Result<()> {
        self.done_edit();
        self.store.set_columns(columns)?;
        self.retain_known_keys();
        self.do_layout();
        self.invalidate(false);
        Ok(())
    }

    /// Replace the dataset. Edits on keys that survive the reload are kept.
    pub fn load_data(&mut self, rows: &[serde_json::Value]) -> Result<()> {
        self.done_edit();
        let pruned = self.store.set_data(rows)?;
        self.retain_known_keys();
        self.do_layout();
        if pruned {
            self.emit_selection_change();
        }
        self.invalidate(false);
        Ok(())
    }

    pub fn load_footer_data(&mut self, rows: &[serde_json::Value]) -> Result<()> {
        self.store.set_footer_data(rows)?;
        self.do_layout();
        self.invalidate(false);
        Ok(())
    }

    pub fn set_loading(&mut self, loading: bool) {
        if self.store.set_loading(loading) {
            self.events.emit(&GridEvent::Loading(loading));
            self.invalidate(false);
        }
    }

    pub fn is_loading(&self) -> bool {
        self.store.is_loading()
    }

    /// Tear the instance down: listeners are removed, pending frames dropped
    /// and all data released.
    pub fn destroy(&mut self) {
        self.events.clear();
        self.redraw.reset();
        self.store = DataStore::new(self.store.config().clone());
        self.ledger.clear();
        self.history.clear();
        self.validation = ValidationPipeline::new();
        self.merges.clear();
        self.editing = None;
        self.last_frame = None;
        tracing::debug!("grid destroyed");
    }

    /// Resize the widget.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self.do_layout();
        self.invalidate(false);
    }

    /// Install (or remove, with `None`) the row filter. Scroll resets to the
    /// origin; selected rows the filter removes are deselected.
    pub fn filter_method(&mut self, filter: Option<RowFilter>) {
        let pruned = self.store.set_filter_method(filter);
        self.viewport.scroll_x = 0.0;
        self.viewport.scroll_y = 0.0;
        self.do_layout();
        if pruned {
            self.emit_selection_change();
        }
        self.invalidate(false);
    }

    /// Recompute the body viewport from the widget size and re-clamp scroll.
    pub fn do_layout(&mut self) {
        let header = self.header_height();
        let footer = self.footer_height();
        self.viewport
            .resize(self.width, (self.height - header - footer).max(0.0));
        self.viewport
            .clamp_scroll(self.store.col_geometry(), self.store.row_geometry());
    }

    fn retain_known_keys(&mut self) {
        let arena = self.store.arena();
        let columns = self.store.columns();
        let row_present = |k: &str| arena.contains(k);
        let column_present = |k: &str| columns.contains(k);
        self.ledger.retain_keys(row_present, column_present);
        self.history.retain_keys(row_present, column_present);
        self.validation.retain_keys(row_present, column_present);
    }

    pub(crate) fn header_height(&self) -> f32 {
        self.store
            .header()
            .height(self.store.config().header_row_height)
    }

    pub(crate) fn footer_height(&self) -> f32 {
        if self.store.config().show_footer {
            to_pixels(self.store.footer_geometry().total_size())
        } else {
            0.0
        }
    }

    // Queries

    pub fn config(&self) -> &GridConfig {
        self.store.config()
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn ledger(&self) -> &ChangeLedger {
        &self.ledger
    }

    pub fn get_cell_value(&self, row_key: &str, key: &str) -> Option<&CellValue> {
        self.store.get_item_value(row_key, key)
    }

    /// Cell value by visible row index and leaf column index.
    pub fn get_cell_value_by_index(&self, row_index: usize, col_index: usize) -> Option<&CellValue> {
        let column = self.store.columns().leaf(col_index)?;
        self.store.visible_node(row_index)?.row.get(column.key.as_str())
    }

    /// Content-space position of a visible row. Out-of-range indices clamp to
    /// the last row.
    pub fn get_position_for_row_index(&self, row_index: usize) -> Position {
        let rows = self.store.row_geometry();
        if rows.is_empty() {
            return Position::default();
        }
        let index = row_index.min(rows.len() - 1);
        Position {
            x: 0.0,
            y: to_pixels(rows.offset_of(index)),
            height: rows.size_of(index),
        }
    }

    /// Rows passing the filter, collapsed descendants included, in dataset order.
    pub fn get_all_rows_data(&self) -> Vec<&Row> {
        self.store.get_all_rows_data().map(|node| &node.row).collect()
    }

    pub fn get_row_key_by_item(&self, row: &Row) -> Option<RowKey> {
        self.store.get_row_key_by_item(row)
    }

    /// Number of rows in the visible row list.
    pub fn row_count(&self) -> usize {
        self.store.visible_len()
    }

    pub fn column_count(&self) -> usize {
        self.store.columns().len()
    }

    // Events

    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&GridEvent) + 'static,
    {
        self.events.on(kind, listener)
    }

    pub fn off(&mut self, kind: EventKind, id: ListenerId) -> bool {
        self.events.off(kind, id)
    }

    // Redraw

    /// Ask for a repaint on the next frame even if nothing changed.
    ///
    /// Returns `true` when this is the first request since the last frame.
    pub fn request_draw(&mut self, skip_overlay: bool) -> bool {
        self.redraw.request(DrawRequest {
            skip_overlay,
            force: true,
        })
    }

    /// Whether a frame is waiting to be flushed.
    pub fn draw_pending(&self) -> bool {
        self.redraw.is_pending()
    }

    /// Record a drawable state change and queue a frame.
    pub(crate) fn invalidate(&mut self, skip_overlay: bool) -> bool {
        self.redraw.invalidate();
        self.redraw.request(DrawRequest {
            skip_overlay,
            force: false,
        })
    }

    /// Record a state change without asking for a frame.
    pub(crate) fn touch(&mut self) {
        self.redraw.invalidate();
    }

    /// Frames produced so far.
    pub fn frame_count(&self) -> u64 {
        self.redraw.frames()
    }

    pub fn last_frame(&self) -> Option<&Rc<FrameLayout>> {
        self.last_frame.as_ref()
    }
}
