//! Validators and validation runs.
//!
//! A run covers every row that passes the filter (collapsed descendants
//! included) times every leaf column, row-major. The first failing cell in
//! that order is the one scrolled to.

use super::Grid;
use crate::error::{GridError, Result};
use crate::events::GridEvent;
use crate::types::{ColumnKey, RowKey, ValidationErrorInput};
use crate::validation::{
    yield_now, ValidationContext, ValidationError, ValidationReport, ValidationRun,
    ValidationTask, Validator,
};

impl Grid {
    /// Install the validator for one column, replacing any previous one.
    pub fn set_validator(&mut self, key: impl Into<ColumnKey>, validator: Validator) {
        self.validation.set_validator(key.into(), validator);
    }

    pub fn remove_validator(&mut self, key: &str) -> bool {
        self.validation.remove_validator(key)
    }

    /// Validation of one cell as a detached task; `None` for unknown keys.
    pub fn get_validator(&self, row_key: &str, key: &str) -> Option<ValidationTask> {
        let row = self.store.row(row_key)?;
        let column = self.store.columns().get(key)?;
        let context = ValidationContext {
            row_key: RowKey::from(row_key),
            key: column.key.clone(),
            value: row.get(key).cloned().unwrap_or_default(),
            row: row.clone(),
        };
        Some(ValidationTask::new(
            context,
            column.required,
            self.validation.validator(key),
        ))
    }

    /// One task per cell of the run, row-major.
    pub fn validation_tasks(&self) -> Vec<ValidationTask> {
        let leaves = self.store.columns().leaves();
        self.store
            .get_all_rows_data()
            .flat_map(|node| {
                leaves.iter().map(move |column| {
                    let context = ValidationContext {
                        row_key: node.key.clone(),
                        key: column.key.clone(),
                        value: node
                            .row
                            .get(column.key.as_str())
                            .cloned()
                            .unwrap_or_default(),
                        row: node.row.clone(),
                    };
                    (context, column.required)
                })
            })
            .map(|(context, required)| {
                let validator = self.validation.validator(context.key.as_str());
                ValidationTask::new(context, required, validator)
            })
            .collect()
    }

    /// Plan a run without awaiting it. Closes the edit session first.
    ///
    /// # Errors
    /// Returns `GridError::ValidationInProgress` while another run holds its
    /// guard.
    pub fn begin_validation(&mut self) -> Result<ValidationRun> {
        if self.validation.is_running() {
            return Err(GridError::ValidationInProgress);
        }
        self.done_edit();
        let tasks = self.validation_tasks();
        tracing::debug!(cells = tasks.len(), "validation started");
        self.validation.begin(tasks)
    }

    /// Store the outcome of one task.
    pub fn apply_validation(&mut self, row_key: &RowKey, key: &ColumnKey, errors: &[ValidationError]) {
        self.validation.apply(row_key, key, errors);
    }

    /// Conclude a run: publish the active errors, scroll to the first failing
    /// cell when asked, and repaint in either outcome.
    ///
    /// # Errors
    /// Returns `GridError::ValidationFailed` carrying every failing cell's
    /// errors when `groups` is not empty.
    pub fn finish_validation(
        &mut self,
        groups: Vec<Vec<ValidationError>>,
        scroll_error: bool,
    ) -> Result<()> {
        let report = ValidationReport { groups };
        self.events
            .emit(&GridEvent::ValidationChange(self.active_errors()));
        if let (true, Some(first)) = (scroll_error, report.first()) {
            let (row_key, key) = (first.row_key.clone(), first.key.clone());
            self.scroll_to_row_key(row_key.as_str());
            self.scroll_to_col_key(key.as_str());
        }
        self.invalidate(false);
        if report.is_empty() {
            tracing::debug!("validation passed");
            Ok(())
        } else {
            tracing::debug!(failed = report.groups.len(), "validation failed");
            Err(GridError::ValidationFailed(report))
        }
    }

    /// Validate every cell, one at a time with a yield in between.
    ///
    /// # Errors
    /// Returns `GridError::ValidationFailed` with one group per failing cell
    /// in row-major order.
    pub async fn validate(&mut self, scroll_error: bool) -> Result<()> {
        let ValidationRun { tasks, guard } = self.begin_validation()?;
        let mut groups = Vec::new();
        for task in tasks {
            let (row_key, key) = (task.row_key().clone(), task.key().clone());
            let errors = task.run().await;
            self.apply_validation(&row_key, &key, &errors);
            if !errors.is_empty() {
                groups.push(errors);
            }
            yield_now().await;
        }
        drop(guard);
        self.finish_validation(groups, scroll_error)
    }

    /// Set an error on a visible row. Returns `false` (and logs) when the
    /// index or column is unknown.
    pub fn set_validation_error_by_row_index(
        &mut self,
        row_index: usize,
        key: &str,
        message: impl Into<String>,
    ) -> bool {
        let Some(row_key) = self.store.visible_node(row_index).map(|n| n.key.clone()) else {
            tracing::warn!(row_index, key, "validation error for unknown row index");
            return false;
        };
        let Some(column) = self.store.columns().get(key).map(|c| c.key.clone()) else {
            tracing::warn!(row_index, key, "validation error for unknown column");
            return false;
        };
        self.validation.set_error(row_key, column, message.into());
        self.invalidate(false);
        true
    }

    /// Merge externally supplied errors and scroll to the first one.
    pub fn set_validations(&mut self, errors: Vec<ValidationErrorInput>) {
        let first = errors.first().map(|e| (e.row_index, e.key.clone()));
        for error in errors {
            self.set_validation_error_by_row_index(error.row_index, error.key.as_str(), error.message);
        }
        if let Some((row_index, key)) = first {
            self.scroll_to_row_index(row_index);
            self.scroll_to_col_key(key.as_str());
        }
        self.events
            .emit(&GridEvent::ValidationChange(self.active_errors()));
    }

    /// Drop every active error. Validators stay installed.
    pub fn clear_validate(&mut self) {
        self.validation.clear();
        self.events.emit(&GridEvent::ValidationChange(Vec::new()));
        self.invalidate(false);
    }

    pub fn validation_error(&self, row_key: &str, key: &str) -> Option<&str> {
        self.validation.error(row_key, key)
    }

    pub fn is_validating(&self) -> bool {
        self.validation.is_running()
    }

    /// Active errors in row-major order.
    pub fn active_errors(&self) -> Vec<ValidationError> {
        if self.validation.error_count() == 0 {
            return Vec::new();
        }
        let leaves = self.store.columns().leaves();
        self.store
            .arena()
            .iter()
            .flat_map(|(_, node)| {
                leaves.iter().filter_map(move |column| {
                    let message = self
                        .validation
                        .error(node.key.as_str(), column.key.as_str())?;
                    Some(ValidationError {
                        row_key: node.key.clone(),
                        key: column.key.clone(),
                        message: message.to_string(),
                    })
                })
            })
            .collect()
    }
}
