//! `VGrid` - the WASM-exported wrapper around [`Grid`].
//!
//! The grid lives in `Rc<RefCell<SharedState>>` so the animation-frame
//! closure and pending validation promises can reach it. JS callbacks are
//! never invoked while the grid is borrowed: grid events are queued by a Rust
//! listener and handed to JS listeners once the borrow is released, so a
//! listener may call back into `VGrid` freely. Row filters are the exception;
//! they run during the rebuild and must not touch the grid.
//!
//! Frames are driven by `requestAnimationFrame`. Any call that leaves a draw
//! pending schedules one frame; the frame is laid out, handed to the painter
//! (if one is set) and published as a `draw`/`drawView` event.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Function, Promise, Reflect};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, JsFuture};

use crate::config::GridConfig;
use crate::events::{EventKind, GridEvent};
use crate::grid::Grid;
use crate::layout::MergeSpec;
use crate::store::RowFilter;
use crate::types::{CellRange, CellValue, ChangeItem, Column, Row, ValidationErrorInput, ValueKind};
use crate::validation::{yield_now, ValidationContext, ValidationRun, Validator};

type EventQueue = Rc<RefCell<Vec<GridEvent>>>;

/// State shared between `VGrid`, the frame closure and validation promises.
struct SharedState {
    grid: Grid,
    listeners: Vec<(EventKind, Function)>,
    /// Called with every laid-out frame
    painter: Option<Function>,
    frame_handle: Option<i32>,
    frame_closure: Option<Closure<dyn FnMut()>>,
}

/// A cell write as sent by JS.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsChange {
    row_key: String,
    key: String,
    value: serde_json::Value,
}

// Timing helper for frame logs.
fn now_ms() -> f64 {
    if let Some(window) = web_sys::window() {
        if let Some(perf) = window.performance() {
            return perf.now();
        }
    }
    js_sys::Date::now()
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(JsValue::from)
}

fn cell_from_js(value: JsValue) -> Result<CellValue, JsValue> {
    let json: serde_json::Value = if value.is_undefined() {
        serde_json::Value::Null
    } else {
        from_js(value)?
    };
    ValueKind::Any
        .coerce_json(&json)
        .map_err(|found| JsValue::from_str(&format!("Unsupported cell value of kind {found}")))
}

fn js_message(error: &JsValue) -> String {
    if let Some(err) = error.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    error.as_string().unwrap_or_else(|| format!("{error:?}"))
}

/// Validator results may be a string, an array of strings, or an array of
/// objects with a `message` field.
fn messages_from_js(value: &JsValue) -> Vec<String> {
    if let Some(message) = value.as_string() {
        return vec![message];
    }
    if !Array::is_array(value) {
        return Vec::new();
    }
    Array::from(value)
        .iter()
        .filter_map(|item| {
            item.as_string().or_else(|| {
                Reflect::get(&item, &JsValue::from_str("message"))
                    .ok()
                    .and_then(|m| m.as_string())
            })
        })
        .collect()
}

/// Wrap a JS function as a validator. The function receives
/// `{rowKey, key, value, row}` and may return a promise. A throwing or
/// rejecting validator counts as one failure with the thrown message.
fn js_validator(callback: Function) -> Validator {
    Rc::new(move |context: ValidationContext| {
        let callback = callback.clone();
        Box::pin(async move {
            let argument = match to_js(&context) {
                Ok(argument) => argument,
                Err(e) => return vec![js_message(&e)],
            };
            let returned = match callback.call1(&JsValue::NULL, &argument) {
                Ok(value) => value,
                Err(e) => return vec![js_message(&e)],
            };
            let resolved = if returned.is_instance_of::<Promise>() {
                match JsFuture::from(Promise::from(returned)).await {
                    Ok(value) => value,
                    Err(e) => return vec![js_message(&e)],
                }
            } else {
                returned
            };
            messages_from_js(&resolved)
        })
    })
}

fn js_filter(callback: Function) -> RowFilter {
    Rc::new(move |row: &Row| {
        to_js(row)
            .and_then(|value| callback.call1(&JsValue::NULL, &value))
            .map(|keep| keep.is_truthy())
            .unwrap_or(true)
    })
}

/// Hand queued events to JS listeners. Runs until the queue stays empty, so
/// events raised by listeners are delivered too.
fn dispatch(state: &Rc<RefCell<SharedState>>, queue: &EventQueue) {
    loop {
        let events: Vec<GridEvent> = queue.borrow_mut().drain(..).collect();
        if events.is_empty() {
            break;
        }
        for event in events {
            let kind = event.kind();
            let targets: Vec<Function> = state
                .borrow()
                .listeners
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(_, f)| f.clone())
                .collect();
            if targets.is_empty() {
                continue;
            }
            let payload = match &event {
                GridEvent::Draw(frame) | GridEvent::DrawView(frame) => to_js(frame.as_ref()),
                other => other
                    .payload()
                    .map_err(|e| JsValue::from_str(&e.to_string()))
                    .and_then(|json| to_js(&json)),
            };
            let payload = match payload {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!(event = %kind, error = %js_message(&e), "event payload conversion failed");
                    continue;
                }
            };
            for listener in targets {
                if let Err(e) = listener.call1(&JsValue::NULL, &payload) {
                    tracing::warn!(event = %kind, error = %js_message(&e), "listener threw");
                }
            }
        }
    }
}

fn schedule_frame(state: &Rc<RefCell<SharedState>>, queue: &EventQueue) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let mut s = state.borrow_mut();
    if s.frame_handle.is_some() || !s.grid.draw_pending() {
        return;
    }
    if s.frame_closure.is_none() {
        let weak_state = Rc::downgrade(state);
        let weak_queue = Rc::downgrade(queue);
        let closure = Closure::wrap(Box::new(move || {
            if let (Some(state), Some(queue)) = (weak_state.upgrade(), weak_queue.upgrade()) {
                run_frame(&state, &queue);
            }
        }) as Box<dyn FnMut()>);
        s.frame_closure = Some(closure);
    }
    let Some(callback) = s.frame_closure.as_ref() else {
        return;
    };
    match window.request_animation_frame(callback.as_ref().unchecked_ref()) {
        Ok(handle) => s.frame_handle = Some(handle),
        Err(e) => tracing::warn!(error = %js_message(&e), "requestAnimationFrame failed"),
    }
}

fn run_frame(state: &Rc<RefCell<SharedState>>, queue: &EventQueue) {
    let start = now_ms();
    let (frame, painter) = {
        let mut s = state.borrow_mut();
        s.frame_handle = None;
        (s.grid.flush_frame(), s.painter.clone())
    };
    if let (Some(frame), Some(painter)) = (&frame, painter) {
        let painted = to_js(frame.as_ref()).and_then(|value| painter.call1(&JsValue::NULL, &value));
        if let Err(e) = painted {
            let _ = state
                .borrow_mut()
                .grid
                .paint_failed(frame.revision, js_message(&e));
        }
    }
    if let Some(frame) = &frame {
        tracing::trace!(revision = frame.revision, ms = now_ms() - start, "frame");
    }
    settle(state, queue);
}

fn settle(state: &Rc<RefCell<SharedState>>, queue: &EventQueue) {
    dispatch(state, queue);
    schedule_frame(state, queue);
}

/// The grid exported to JavaScript
#[wasm_bindgen]
pub struct VGrid {
    state: Rc<RefCell<SharedState>>,
    queue: EventQueue,
}

impl VGrid {
    fn with_grid<R>(&self, f: impl FnOnce(&mut Grid) -> R) -> R {
        let result = f(&mut self.state.borrow_mut().grid);
        settle(&self.state, &self.queue);
        result
    }

    fn read<R>(&self, f: impl FnOnce(&Grid) -> R) -> R {
        f(&self.state.borrow().grid)
    }

    fn forward_events(grid: &mut Grid, queue: &EventQueue) {
        for kind in EventKind::ALL {
            let queue = Rc::clone(queue);
            grid.on(kind, move |event| queue.borrow_mut().push(event.clone()));
        }
    }
}

#[wasm_bindgen]
impl VGrid {
    /// Create a grid. `config` is an optional plain object of `GridConfig` fields.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<VGrid, JsValue> {
        console_error_panic_hook::set_once();
        let config: GridConfig = if config.is_undefined() || config.is_null() {
            GridConfig::default()
        } else {
            from_js(config)?
        };
        let mut grid = Grid::new(config)?;
        let queue: EventQueue = Rc::new(RefCell::new(Vec::new()));
        Self::forward_events(&mut grid, &queue);
        let state = Rc::new(RefCell::new(SharedState {
            grid,
            listeners: Vec::new(),
            painter: None,
            frame_handle: None,
            frame_closure: None,
        }));
        settle(&state, &queue);
        Ok(VGrid { state, queue })
    }

    // Lifecycle

    #[wasm_bindgen(js_name = loadConfig)]
    pub fn load_config(&self, config: JsValue) -> Result<(), JsValue> {
        let config: GridConfig = from_js(config)?;
        self.with_grid(|grid| grid.load_config(config))?;
        Ok(())
    }

    #[wasm_bindgen(js_name = loadColumns)]
    pub fn load_columns(&self, columns: JsValue) -> Result<(), JsValue> {
        let columns: Vec<Column> = from_js(columns)?;
        self.with_grid(|grid| grid.load_columns(columns))?;
        Ok(())
    }

    #[wasm_bindgen(js_name = loadData)]
    pub fn load_data(&self, rows: JsValue) -> Result<(), JsValue> {
        let rows: Vec<serde_json::Value> = from_js(rows)?;
        self.with_grid(|grid| grid.load_data(&rows))?;
        Ok(())
    }

    #[wasm_bindgen(js_name = loadFooterData)]
    pub fn load_footer_data(&self, rows: JsValue) -> Result<(), JsValue> {
        let rows: Vec<serde_json::Value> = from_js(rows)?;
        self.with_grid(|grid| grid.load_footer_data(&rows))?;
        Ok(())
    }

    #[wasm_bindgen(js_name = setLoading)]
    pub fn set_loading(&self, loading: bool) {
        self.with_grid(|grid| grid.set_loading(loading));
    }

    /// Install (or remove, with `null`) the row filter. The filter receives
    /// each row object and keeps it when it returns a truthy value.
    #[wasm_bindgen(js_name = filterMethod)]
    pub fn filter_method(&self, filter: Option<Function>) {
        let filter = filter.map(js_filter);
        self.with_grid(|grid| grid.filter_method(filter));
    }

    pub fn resize(&self, width: f32, height: f32) {
        self.with_grid(|grid| grid.resize(width, height));
    }

    #[wasm_bindgen(js_name = doLayout)]
    pub fn do_layout(&self) {
        self.with_grid(|grid| {
            grid.do_layout();
            grid.request_draw(false);
        });
    }

    /// Request a repaint on the next animation frame.
    pub fn draw(&self, skip_overlay: Option<bool>) {
        self.with_grid(|grid| grid.request_draw(skip_overlay.unwrap_or(false)));
    }

    /// Set the function that paints laid-out frames. A throwing painter is
    /// reported through the `error` event.
    #[wasm_bindgen(js_name = setPainter)]
    pub fn set_painter(&self, painter: Option<Function>) {
        self.state.borrow_mut().painter = painter;
        self.with_grid(|grid| grid.request_draw(false));
    }

    /// Release everything. The instance must not be used afterwards.
    pub fn destroy(&self) {
        let handle = {
            let mut s = self.state.borrow_mut();
            s.listeners.clear();
            s.painter = None;
            s.grid.destroy();
            s.frame_handle.take()
        };
        self.queue.borrow_mut().clear();
        if let (Some(window), Some(handle)) = (web_sys::window(), handle) {
            let _ = window.cancel_animation_frame(handle);
        }
    }

    // Events

    /// Register a listener. Known events: draw, drawView, selectionChange,
    /// change, expandChange, validationChange, scroll, loading, error.
    pub fn on(&self, event: &str, callback: Function) -> Result<(), JsValue> {
        let kind = EventKind::from_name(event)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown event: {event}")))?;
        self.state.borrow_mut().listeners.push((kind, callback));
        Ok(())
    }

    /// Remove a listener registered with the same event name and function.
    pub fn off(&self, event: &str, callback: Function) -> bool {
        let Some(kind) = EventKind::from_name(event) else {
            return false;
        };
        let mut s = self.state.borrow_mut();
        let before = s.listeners.len();
        s.listeners
            .retain(|(k, f)| !(*k == kind && *f == callback));
        s.listeners.len() != before
    }

    // Mutation

    #[wasm_bindgen(js_name = setItemValue)]
    pub fn set_item_value(
        &self,
        row_key: &str,
        key: &str,
        value: JsValue,
        history: Option<bool>,
        redraw: Option<bool>,
        from_editor: Option<bool>,
    ) -> Result<bool, JsValue> {
        let value = cell_from_js(value)?;
        let written = self.with_grid(|grid| {
            grid.set_item_value(
                row_key,
                key,
                value,
                history.unwrap_or(true),
                redraw.unwrap_or(true),
                from_editor.unwrap_or(false),
            )
        })?;
        Ok(written)
    }

    #[wasm_bindgen(js_name = setItemValueByEditor)]
    pub fn set_item_value_by_editor(
        &self,
        row_key: &str,
        key: &str,
        value: JsValue,
        history: Option<bool>,
        redraw: Option<bool>,
    ) -> Result<bool, JsValue> {
        let value = cell_from_js(value)?;
        let written = self.with_grid(|grid| {
            grid.set_item_value_by_editor(
                row_key,
                key,
                value,
                history.unwrap_or(true),
                redraw.unwrap_or(true),
            )
        })?;
        Ok(written)
    }

    /// Apply `[{rowKey, key, value}]` as one undo step.
    #[wasm_bindgen(js_name = batchSetItemValue)]
    pub fn batch_set_item_value(
        &self,
        items: JsValue,
        history: Option<bool>,
        redraw: Option<bool>,
    ) -> Result<bool, JsValue> {
        let changes: Vec<JsChange> = from_js(items)?;
        let items = changes
            .into_iter()
            .map(|change| {
                let value = ValueKind::Any.coerce_json(&change.value).map_err(|found| {
                    JsValue::from_str(&format!("Unsupported cell value of kind {found}"))
                })?;
                Ok(ChangeItem::new(change.row_key, change.key, value))
            })
            .collect::<Result<Vec<_>, JsValue>>()?;
        let written = self.with_grid(|grid| {
            grid.batch_set_item_value(items, history.unwrap_or(true), redraw.unwrap_or(true))
        })?;
        Ok(written)
    }

    pub fn undo(&self) -> bool {
        self.with_grid(Grid::undo)
    }

    pub fn redo(&self) -> bool {
        self.with_grid(Grid::redo)
    }

    #[wasm_bindgen(js_name = revertChanges)]
    pub fn revert_changes(&self) -> usize {
        self.with_grid(Grid::revert_changes)
    }

    #[wasm_bindgen(js_name = revertCell)]
    pub fn revert_cell(&self, row_key: &str, key: &str) -> bool {
        self.with_grid(|grid| grid.revert_cell(row_key, key))
    }

    #[wasm_bindgen(js_name = clearChangeHistory)]
    pub fn clear_change_history(&self) {
        self.with_grid(Grid::clear_change_history);
    }

    #[wasm_bindgen(js_name = getChangedData)]
    pub fn get_changed_data(&self) -> Result<JsValue, JsValue> {
        self.read(|grid| to_js(&grid.get_changed_data()))
    }

    #[wasm_bindgen(js_name = getChangedRows)]
    pub fn get_changed_rows(&self) -> Result<JsValue, JsValue> {
        self.read(|grid| to_js(&grid.get_changed_rows()))
    }

    #[wasm_bindgen(js_name = beginEdit)]
    pub fn begin_edit(&self, row_index: usize, col_index: usize) -> bool {
        self.with_grid(|grid| grid.begin_edit(row_index, col_index))
    }

    #[wasm_bindgen(js_name = doneEdit)]
    pub fn done_edit(&self) -> bool {
        self.with_grid(Grid::done_edit)
    }

    #[wasm_bindgen(js_name = setRowHeight)]
    pub fn set_row_height(&self, row_key: &str, height: f32) -> bool {
        self.with_grid(|grid| grid.set_row_height(row_key, height))
    }

    #[wasm_bindgen(js_name = setColumnWidth)]
    pub fn set_column_width(&self, key: &str, width: f32) -> bool {
        self.with_grid(|grid| grid.set_column_width(key, width))
    }

    /// Replace merged regions: `[{rowKey, columnKey, rowSpan, colSpan}]`.
    #[wasm_bindgen(js_name = setMerges)]
    pub fn set_merges(&self, merges: JsValue) -> Result<(), JsValue> {
        let merges: Vec<MergeSpec> = from_js(merges)?;
        self.with_grid(|grid| grid.set_merges(merges));
        Ok(())
    }

    // Scrolling

    #[wasm_bindgen(js_name = scrollTo)]
    pub fn scroll_to(&self, x: f32, y: f32) -> bool {
        self.with_grid(|grid| grid.scroll_to(x, y))
    }

    #[wasm_bindgen(js_name = scrollXTo)]
    pub fn scroll_x_to(&self, x: f32) -> bool {
        self.with_grid(|grid| grid.scroll_x_to(x))
    }

    #[wasm_bindgen(js_name = scrollYTo)]
    pub fn scroll_y_to(&self, y: f32) -> bool {
        self.with_grid(|grid| grid.scroll_y_to(y))
    }

    /// Wheel-style relative scroll.
    #[wasm_bindgen(js_name = scrollBy)]
    pub fn scroll_by(&self, dx: f32, dy: f32) -> bool {
        self.with_grid(|grid| grid.scroll_by(dx, dy))
    }

    #[wasm_bindgen(js_name = scrollToRowIndex)]
    pub fn scroll_to_row_index(&self, row_index: usize) -> bool {
        self.with_grid(|grid| grid.scroll_to_row_index(row_index))
    }

    #[wasm_bindgen(js_name = scrollToColIndex)]
    pub fn scroll_to_col_index(&self, col_index: usize) -> bool {
        self.with_grid(|grid| grid.scroll_to_col_index(col_index))
    }

    #[wasm_bindgen(js_name = scrollToRowKey)]
    pub fn scroll_to_row_key(&self, row_key: &str) -> bool {
        self.with_grid(|grid| grid.scroll_to_row_key(row_key))
    }

    #[wasm_bindgen(js_name = scrollToColKey)]
    pub fn scroll_to_col_key(&self, key: &str) -> bool {
        self.with_grid(|grid| grid.scroll_to_col_key(key))
    }

    #[wasm_bindgen(js_name = getVisibleRows)]
    pub fn get_visible_rows(&self) -> Result<JsValue, JsValue> {
        self.read(|grid| to_js(&grid.visible_rows()))
    }

    #[wasm_bindgen(js_name = getVisibleCols)]
    pub fn get_visible_cols(&self) -> Result<JsValue, JsValue> {
        self.read(|grid| to_js(&grid.visible_cols()))
    }

    // Selection and expansion

    #[wasm_bindgen(js_name = toggleRowSelection)]
    pub fn toggle_row_selection(&self, row_key: &str) -> bool {
        self.with_grid(|grid| grid.toggle_row_selection(row_key))
    }

    #[wasm_bindgen(js_name = setRowSelection)]
    pub fn set_row_selection(&self, row_key: &str, selected: bool) -> bool {
        self.with_grid(|grid| grid.set_row_selection(row_key, selected))
    }

    #[wasm_bindgen(js_name = setSelectionByRows)]
    pub fn set_selection_by_rows(&self, rows: JsValue, selected: bool) -> Result<bool, JsValue> {
        let rows: Vec<serde_json::Value> = from_js(rows)?;
        let records = self.read(|grid| {
            let schema = grid.store().columns().schema();
            let children = grid.config().children_field.clone();
            rows.iter()
                .map(|value| Row::from_json(value, &schema, &children))
                .collect::<crate::error::Result<Vec<_>>>()
        })?;
        Ok(self.with_grid(|grid| grid.set_selection_by_rows(&records, selected)))
    }

    #[wasm_bindgen(js_name = setSelectionByRowKeys)]
    pub fn set_selection_by_row_keys(&self, keys: Vec<String>, selected: bool) -> bool {
        self.with_grid(|grid| {
            grid.set_selection_by_row_keys(keys.iter().map(String::as_str), selected)
        })
    }

    #[wasm_bindgen(js_name = toggleAllSelection)]
    pub fn toggle_all_selection(&self) -> bool {
        self.with_grid(Grid::toggle_all_selection)
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&self) -> bool {
        self.with_grid(Grid::clear_selection)
    }

    #[wasm_bindgen(js_name = getSelectionRows)]
    pub fn get_selection_rows(&self) -> Result<JsValue, JsValue> {
        self.read(|grid| to_js(&grid.get_selection_rows()))
    }

    #[wasm_bindgen(js_name = selectCell)]
    pub fn select_cell(&self, row: usize, col: usize) -> bool {
        self.with_grid(|grid| grid.select_cell(row, col))
    }

    #[wasm_bindgen(js_name = extendSelection)]
    pub fn extend_selection(&self, row: usize, col: usize) -> bool {
        self.with_grid(|grid| grid.extend_selection(row, col))
    }

    #[wasm_bindgen(js_name = selectRange)]
    pub fn select_range(
        &self,
        anchor_row: usize,
        anchor_col: usize,
        focus_row: usize,
        focus_col: usize,
    ) -> bool {
        let range = CellRange::cell_range(anchor_row, anchor_col, focus_row, focus_col);
        self.with_grid(|grid| grid.select_range(range))
    }

    #[wasm_bindgen(js_name = selectAllCells)]
    pub fn select_all_cells(&self) -> bool {
        self.with_grid(Grid::select_all_cells)
    }

    #[wasm_bindgen(js_name = clearCellSelection)]
    pub fn clear_cell_selection(&self) -> bool {
        self.with_grid(Grid::clear_cell_selection)
    }

    #[wasm_bindgen(js_name = getSelectedCells)]
    pub fn get_selected_cells(&self) -> Result<JsValue, JsValue> {
        self.read(|grid| to_js(&grid.selected_cells()))
    }

    #[wasm_bindgen(js_name = expandItem)]
    pub fn expand_item(&self, row_key: &str, expand: bool) -> bool {
        self.with_grid(|grid| grid.expand_item(row_key, expand))
    }

    #[wasm_bindgen(js_name = expandAll)]
    pub fn expand_all(&self, expand: bool) -> bool {
        self.with_grid(|grid| grid.expand_all(expand))
    }

    // Validation

    /// Install a validator for a column. See [`js_validator`] for the calling
    /// convention.
    #[wasm_bindgen(js_name = setValidator)]
    pub fn set_validator(&self, key: &str, validator: Function) {
        self.with_grid(|grid| grid.set_validator(key, js_validator(validator)));
    }

    #[wasm_bindgen(js_name = removeValidator)]
    pub fn remove_validator(&self, key: &str) -> bool {
        self.with_grid(|grid| grid.remove_validator(key))
    }

    /// Validate every cell. Resolves with `[]` or rejects with the error
    /// groups of every failing cell, row-major. Rejects right away while
    /// another run is in flight.
    pub fn validate(&self, scroll_error: Option<bool>) -> Result<Promise, JsValue> {
        let run = self.with_grid(Grid::begin_validation)?;
        let state = Rc::clone(&self.state);
        let queue = Rc::clone(&self.queue);
        Ok(future_to_promise(async move {
            let ValidationRun { tasks, guard } = run;
            let mut groups = Vec::new();
            for task in tasks {
                let (row_key, key) = (task.row_key().clone(), task.key().clone());
                let errors = task.run().await;
                state
                    .borrow_mut()
                    .grid
                    .apply_validation(&row_key, &key, &errors);
                if !errors.is_empty() {
                    groups.push(errors);
                }
                yield_now().await;
            }
            drop(guard);
            let outcome = state
                .borrow_mut()
                .grid
                .finish_validation(groups, scroll_error.unwrap_or(true));
            settle(&state, &queue);
            outcome
                .map(|()| JsValue::from(Array::new()))
                .map_err(JsValue::from)
        }))
    }

    /// Merge `[{rowIndex, key, message}]` and scroll to the first one.
    #[wasm_bindgen(js_name = setValidations)]
    pub fn set_validations(&self, errors: JsValue) -> Result<(), JsValue> {
        let errors: Vec<ValidationErrorInput> = from_js(errors)?;
        self.with_grid(|grid| grid.set_validations(errors));
        Ok(())
    }

    #[wasm_bindgen(js_name = setValidationErrorByRowIndex)]
    pub fn set_validation_error_by_row_index(&self, row_index: usize, key: &str, message: String) -> bool {
        self.with_grid(|grid| grid.set_validation_error_by_row_index(row_index, key, message))
    }

    #[wasm_bindgen(js_name = clearValidate)]
    pub fn clear_validate(&self) {
        self.with_grid(Grid::clear_validate);
    }

    /// Active validation errors, row-major.
    #[wasm_bindgen(js_name = getValidationErrors)]
    pub fn get_validation_errors(&self) -> Result<JsValue, JsValue> {
        self.read(|grid| to_js(&grid.active_errors()))
    }

    // Queries

    #[wasm_bindgen(js_name = getCellValue)]
    pub fn get_cell_value(&self, row_key: &str, key: &str) -> Result<JsValue, JsValue> {
        self.read(|grid| to_js(&grid.get_cell_value(row_key, key)))
    }

    /// Value at a visible row and leaf column index.
    #[wasm_bindgen(js_name = getCellValueByIndex)]
    pub fn get_cell_value_by_index(
        &self,
        row_index: usize,
        col_index: usize,
    ) -> Result<JsValue, JsValue> {
        self.read(|grid| to_js(&grid.get_cell_value_by_index(row_index, col_index)))
    }

    #[wasm_bindgen(js_name = getPositionForRowIndex)]
    pub fn get_position_for_row_index(&self, row_index: usize) -> Result<JsValue, JsValue> {
        self.read(|grid| to_js(&grid.get_position_for_row_index(row_index)))
    }

    #[wasm_bindgen(js_name = getAllRowsData)]
    pub fn get_all_rows_data(&self) -> Result<JsValue, JsValue> {
        self.read(|grid| to_js(&grid.get_all_rows_data()))
    }

    #[wasm_bindgen(js_name = getRowKeyByItem)]
    pub fn get_row_key_by_item(&self, row: JsValue) -> Result<Option<String>, JsValue> {
        let value: serde_json::Value = from_js(row)?;
        let key = self.read(|grid| {
            let schema = grid.store().columns().schema();
            Row::from_json(&value, &schema, &grid.config().children_field)
                .map(|record| grid.get_row_key_by_item(&record))
        })?;
        Ok(key.map(|k| k.to_string()))
    }

    #[wasm_bindgen(js_name = rowCount)]
    pub fn row_count(&self) -> usize {
        self.read(Grid::row_count)
    }

    #[wasm_bindgen(js_name = columnCount)]
    pub fn column_count(&self) -> usize {
        self.read(Grid::column_count)
    }
}
