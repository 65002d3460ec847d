//! Frame layout and painting.
//!
//! A frame is always laid out in full (header, body and footer) before the
//! painter sees it. `skip_overlay` is passed through to the painter and never
//! shortens the structural pass.

use std::collections::HashSet;
use std::rc::Rc;

use super::Grid;
use crate::error::{GridError, Result};
use crate::events::GridEvent;
use crate::layout::{
    to_pixels, BodyCell, BodyRow, CellRect, FooterCell, FrameLayout, GeometryTable, MergeMap,
    MergeRange, PlacedHeader, VisibleWindow,
};
use crate::redraw::DrawRequest;

/// Receives laid-out frames. Implemented by the host's canvas code.
pub trait FramePainter {
    /// Paint one frame.
    ///
    /// # Errors
    /// A message describing why the frame could not be painted.
    fn paint(&mut self, frame: &FrameLayout) -> std::result::Result<(), String>;
}

impl Grid {
    /// Run the pending frame, if any: lay it out and emit `draw` (or
    /// `drawView` when the overlay is skipped).
    ///
    /// Returns `None` when nothing was pending or nothing changed since the
    /// last frame.
    pub fn flush_frame(&mut self) -> Option<Rc<FrameLayout>> {
        let request = self.redraw.take()?;
        let frame = Rc::new(self.compute_frame(request));
        tracing::trace!(
            revision = frame.revision,
            cells = frame.body.len(),
            skip_overlay = request.skip_overlay,
            "frame laid out"
        );
        self.last_frame = Some(Rc::clone(&frame));
        let event = if request.skip_overlay {
            GridEvent::DrawView(Rc::clone(&frame))
        } else {
            GridEvent::Draw(Rc::clone(&frame))
        };
        self.events.emit(&event);
        Some(frame)
    }

    /// Flush the pending frame into `painter`.
    ///
    /// Returns `Ok(false)` when there was nothing to paint.
    ///
    /// # Errors
    /// Returns `GridError::Paint` if the painter fails; an `error` event is
    /// emitted as well.
    pub fn paint_frame(&mut self, painter: &mut dyn FramePainter) -> Result<bool> {
        let Some(frame) = self.flush_frame() else {
            return Ok(false);
        };
        match painter.paint(&frame) {
            Ok(()) => Ok(true),
            Err(message) => Err(self.paint_failed(frame.revision, message)),
        }
    }

    /// Report a painter failure for a frame that was flushed elsewhere: logs
    /// it, emits an `error` event and returns the matching error.
    pub fn paint_failed(&mut self, revision: u64, message: String) -> GridError {
        tracing::error!(revision, %message, "painter failed");
        self.events.emit(&GridEvent::Error(message.clone()));
        GridError::Paint(message)
    }

    /// Merged regions resolved to the current visible index space. Merges
    /// whose origin row is not visible are left out.
    pub fn merge_map(&self) -> MergeMap {
        let rows = self.store.visible_len();
        let cols = self.store.columns().len();
        let ranges = self.merges.iter().filter_map(|spec| {
            let row = self.store.visible_index_of(spec.row_key.as_str())?;
            let col = self.store.columns().index_of(spec.column_key.as_str())?;
            Some(MergeRange {
                row,
                col,
                row_span: spec.row_span.min(rows - row),
                col_span: spec.col_span.min(cols - col),
            })
        });
        MergeMap::new(ranges)
    }

    pub(crate) fn compute_frame(&self, request: DrawRequest) -> FrameLayout {
        let config = self.store.config();
        let rows = self.store.row_geometry();
        let cols = self.store.col_geometry();
        let header_height = self.header_height();
        let row_window = self.viewport.visible_rows(rows);
        let col_window = self.viewport.visible_cols(cols);
        let merges = self.merge_map();

        let header = self
            .store
            .header()
            .cells()
            .iter()
            .filter(|cell| (cell.col_start..cell.col_end()).any(|c| col_window.contains(c)))
            .map(|cell| PlacedHeader {
                rect: CellRect {
                    x: self.viewport.screen_x(cell.col_start, cols),
                    y: config.header_row_height * cell.level as f32,
                    width: cell.width(cols),
                    height: config.header_row_height * cell.row_span as f32,
                    skip: false,
                },
                cell: cell.clone(),
            })
            .collect();

        let mut body_rows = Vec::new();
        let mut body = Vec::new();
        let mut placed_origins = HashSet::new();
        for row in row_window.indices() {
            let Some(node) = self.store.visible_node(row) else {
                continue;
            };
            body_rows.push(BodyRow {
                index: row,
                key: node.key.clone(),
                y: header_height + self.viewport.screen_y(row, rows),
                height: rows.size_of(row),
                depth: node.depth,
                has_children: !node.children.is_empty(),
                expanded: self.store.is_expanded(node.key.as_str()),
                selected: self.store.is_row_selected(node.key.as_str()),
            });
            for col in col_window.indices() {
                let (origin_row, origin_col) = match merges.get(row, col) {
                    Some(info) => (info.origin_row, info.origin_col),
                    None => (row, col),
                };
                if (origin_row, origin_col) != (row, col) {
                    // A covered cell stands in for an origin scrolled out of view
                    if row_window.contains(origin_row) && col_window.contains(origin_col) {
                        continue;
                    }
                    if !placed_origins.insert((origin_row, origin_col)) {
                        continue;
                    }
                }
                let rect = self.body_rect(origin_row, origin_col, &merges, header_height);
                if let Some(cell) = self.body_cell(origin_row, origin_col, rect) {
                    body.push(cell);
                }
            }
        }

        let footer = if config.show_footer {
            self.footer_cells(header_height + self.viewport.height, &col_window, cols)
        } else {
            Vec::new()
        };

        FrameLayout {
            revision: self.redraw.revision(),
            skip_overlay: request.skip_overlay,
            width: self.width,
            height: self.height,
            header_height,
            body_height: self.viewport.height,
            footer_height: self.footer_height(),
            scroll_x: self.viewport.scroll_x,
            scroll_y: self.viewport.scroll_y,
            rows: row_window,
            cols: col_window,
            header,
            body_rows,
            body,
            footer,
            selection: self.store.cell_range(),
        }
    }

    /// Get cell bounds in widget coordinates
    fn body_rect(&self, row: usize, col: usize, merges: &MergeMap, top: f32) -> CellRect {
        let rows = self.store.row_geometry();
        let cols = self.store.col_geometry();
        let x = self.viewport.screen_x(col, cols);
        let y = top + self.viewport.screen_y(row, rows);
        let mut width = cols.size_of(col);
        let mut height = rows.size_of(row);

        if let Some(merge) = merges.get(row, col) {
            if !merge.is_origin {
                return CellRect {
                    x,
                    y,
                    width,
                    height,
                    skip: true,
                };
            }
            width = to_pixels(cols.offset_of(col + merge.col_span) - cols.offset_of(col));
            height = to_pixels(rows.offset_of(row + merge.row_span) - rows.offset_of(row));
        }

        CellRect {
            x,
            y,
            width,
            height,
            skip: false,
        }
    }

    fn body_cell(&self, row: usize, col: usize, rect: CellRect) -> Option<BodyCell> {
        let node = self.store.visible_node(row)?;
        let column = self.store.columns().leaf(col)?;
        let (row_key, key) = (node.key.as_str(), column.key.as_str());
        Some(BodyCell {
            row,
            col,
            rect,
            text: node.row.get(key).map(ToString::to_string).unwrap_or_default(),
            changed: self.ledger.is_changed(row_key, key),
            error: self.validation.error(row_key, key).map(str::to_string),
            in_range: self
                .store
                .cell_range()
                .is_some_and(|range| range.contains(row, col)),
        })
    }

    fn footer_cells(
        &self,
        top: f32,
        visible_cols: &VisibleWindow,
        cols: &GeometryTable,
    ) -> Vec<FooterCell> {
        let geometry = self.store.footer_geometry();
        let mut cells = Vec::new();
        for (row, record) in self.store.footer().iter().enumerate() {
            let y = top + to_pixels(geometry.offset_of(row));
            for col in visible_cols.indices() {
                let Some(column) = self.store.columns().leaf(col) else {
                    continue;
                };
                cells.push(FooterCell {
                    row,
                    col,
                    rect: CellRect {
                        x: self.viewport.screen_x(col, cols),
                        y,
                        width: cols.size_of(col),
                        height: geometry.size_of(row),
                        skip: false,
                    },
                    text: record
                        .get(column.key.as_str())
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                });
            }
        }
        cells
    }
}
