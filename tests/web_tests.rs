//! Browser binding smoke tests
//!
//! Run with `wasm-pack test --headless --chrome`.

#![cfg(target_arch = "wasm32")]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::cell::Cell;
use std::rc::Rc;

use serde::Serialize;
use serde_json::json;
use vgrid::VGrid;
use wasm_bindgen::prelude::*;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn js(value: &serde_json::Value) -> JsValue {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap()
}

fn people() -> VGrid {
    let grid = VGrid::new(js(&json!({"rowKeyField": "id", "showFooter": false}))).unwrap();
    grid.load_columns(js(&json!([
        {"key": "name", "title": "Name", "kind": "text"},
        {"key": "age", "title": "Age", "kind": "number"}
    ])))
    .unwrap();
    grid.load_data(js(&json!([
        {"id": "a", "name": "Ada", "age": 36},
        {"id": "b", "name": "Brian", "age": 41}
    ])))
    .unwrap();
    grid
}

#[wasm_bindgen_test]
fn test_load_and_read() {
    let grid = people();
    assert_eq!(grid.row_count(), 2);
    assert_eq!(grid.column_count(), 2);
    assert_eq!(grid.get_cell_value("b", "name").unwrap(), JsValue::from_str("Brian"));
}

#[wasm_bindgen_test]
fn test_read_by_visible_index() {
    let grid = people();
    assert_eq!(grid.get_cell_value_by_index(1, 0).unwrap(), JsValue::from_str("Brian"));
    assert_eq!(grid.get_cell_value_by_index(0, 1).unwrap(), JsValue::from_f64(36.0));
    let missing = grid.get_cell_value_by_index(5, 0).unwrap();
    assert!(missing.is_undefined() || missing.is_null());
}

#[wasm_bindgen_test]
fn test_listener_called_after_mutation() {
    let grid = people();
    let hits = Rc::new(Cell::new(0));
    let counter = Rc::clone(&hits);
    let callback = Closure::<dyn Fn(JsValue)>::new(move |_payload: JsValue| {
        counter.set(counter.get() + 1);
    });
    let function: js_sys::Function = callback.as_ref().unchecked_ref::<js_sys::Function>().clone();
    grid.on("change", function).unwrap();

    assert!(grid.set_item_value("a", "age", JsValue::from_f64(37.0), None, None, None).unwrap());
    assert_eq!(hits.get(), 1);
    callback.forget();
}

#[wasm_bindgen_test]
fn test_unknown_event_rejected() {
    let grid = people();
    let noop = js_sys::Function::new_no_args("");
    assert!(grid.on("bogus", noop).is_err());
}

#[wasm_bindgen_test]
fn test_wrong_kind_surfaces_as_error() {
    let grid = people();
    assert!(grid
        .set_item_value("a", "age", JsValue::from_str("old"), None, None, None)
        .is_err());
}
