//! Common test utilities: grid builders, datasets and event recorders.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_precision_loss
)]

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{json, Value};
use vgrid::{Column, EventKind, Grid, GridConfig, GridEvent, ValueKind};

// ============================================================================
// Configs
// ============================================================================

/// Config keyed by the `id` field with a 36px header and no footer.
pub fn keyed_config() -> GridConfig {
    GridConfig {
        row_key_field: Some("id".to_string()),
        show_footer: false,
        ..GridConfig::default()
    }
}

/// Config whose body viewport is exactly `body_height` pixels tall.
pub fn body_config(row_height: f32, body_height: f32) -> GridConfig {
    GridConfig {
        row_height,
        viewport_height: body_height + 36.0,
        ..keyed_config()
    }
}

// ============================================================================
// Columns and data
// ============================================================================

/// `name` (required text), `age` (number), `city` (read-only text).
pub fn people_columns() -> Vec<Column> {
    vec![
        Column::new("name", "Name").kind(ValueKind::Text).required(),
        Column::new("age", "Age").kind(ValueKind::Number),
        Column::new("city", "City").kind(ValueKind::Text).readonly(),
    ]
}

pub fn people() -> Vec<Value> {
    vec![
        json!({"id": "a", "name": "Ada", "age": 36, "city": "London"}),
        json!({"id": "b", "name": "Brian", "age": 41, "city": "Paris"}),
        json!({"id": "c", "name": "Cleo", "age": 29, "city": "Rome"}),
        json!({"id": "d", "name": "Dan", "age": 52, "city": "Oslo"}),
    ]
}

/// Three roots; `p1` has children `c1`, `c2` and `c2` has child `g1`.
///
/// ```text
/// p1
/// ├─ c1
/// └─ c2
///    └─ g1
/// p2
/// p3
/// ```
pub fn tree() -> Vec<Value> {
    vec![
        json!({
            "id": "p1", "name": "Parent 1", "age": 1,
            "children": [
                {"id": "c1", "name": "Child 1", "age": 2},
                {"id": "c2", "name": "Child 2", "age": 3, "children": [
                    {"id": "g1", "name": "Grandchild", "age": 4}
                ]}
            ]
        }),
        json!({"id": "p2", "name": "Parent 2", "age": 5}),
        json!({"id": "p3", "name": "Parent 3", "age": 6}),
    ]
}

/// `count` rows keyed `"0"..` with a single `value` column.
pub fn numbered_rows(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| json!({"id": i.to_string(), "value": i as f64}))
        .collect()
}

// ============================================================================
// Grid builders
// ============================================================================

pub fn people_grid() -> Grid {
    let mut grid = Grid::new(keyed_config()).unwrap();
    grid.load_columns(people_columns()).unwrap();
    grid.load_data(&people()).unwrap();
    grid
}

pub fn tree_grid() -> Grid {
    let mut grid = Grid::new(keyed_config()).unwrap();
    grid.load_columns(people_columns()).unwrap();
    grid.load_data(&tree()).unwrap();
    grid
}

/// `rows` uniform rows and `cols` 100px columns in a body of `body_height`.
pub fn uniform_grid(rows: usize, cols: usize, row_height: f32, body_height: f32) -> Grid {
    let mut grid = Grid::new(body_config(row_height, body_height)).unwrap();
    let columns = (0..cols)
        .map(|c| {
            let key = if c == 0 { "value".to_string() } else { format!("c{c}") };
            Column::new(key.as_str(), key.as_str()).width(100.0)
        })
        .collect();
    grid.load_columns(columns).unwrap();
    grid.load_data(&numbered_rows(rows)).unwrap();
    grid
}

// ============================================================================
// Event recording
// ============================================================================

/// Collects every event of one kind.
pub fn record(grid: &mut Grid, kind: EventKind) -> Rc<RefCell<Vec<GridEvent>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    grid.on(kind, move |event| sink.borrow_mut().push(event.clone()));
    seen
}

/// Keys of the visible row list, top to bottom.
pub fn visible_keys(grid: &Grid) -> Vec<String> {
    grid.store()
        .visible_nodes()
        .map(|node| node.key.to_string())
        .collect()
}
