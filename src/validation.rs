//! Per-cell validation.
//!
//! Validators are user-supplied and may be asynchronous. A validation run is
//! planned up front as a list of [`ValidationTask`]s in row-major order; the
//! tasks own everything they need, so a run can be awaited without holding a
//! borrow of the grid (the wasm binding relies on that). Tasks are awaited one
//! at a time with a yield between cells, so errors come back in row-major
//! order.
//!
//! Only one run may be in flight per pipeline: [`ValidationPipeline::begin`]
//! hands out a [`RunGuard`] and refuses a second one until the first is
//! dropped.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures_util::future::LocalBoxFuture;
use serde::Serialize;

use crate::error::{GridError, Result};
use crate::types::{CellValue, ColumnKey, Row, RowKey};

/// Message used by the built-in `required` rule.
pub const REQUIRED_MESSAGE: &str = "required";

/// What a validator sees for one cell.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationContext {
    pub row_key: RowKey,
    pub key: ColumnKey,
    pub value: CellValue,
    pub row: Row,
}

/// Future returned by a validator: zero or more error messages.
pub type ValidatorFuture = LocalBoxFuture<'static, Vec<String>>;

/// A per-column validator.
pub type Validator = Rc<dyn Fn(ValidationContext) -> ValidatorFuture>;

/// Wrap a synchronous check as a [`Validator`].
pub fn sync_validator<F>(check: F) -> Validator
where
    F: Fn(&ValidationContext) -> Vec<String> + 'static,
{
    Rc::new(move |ctx| {
        let messages = check(&ctx);
        Box::pin(async move { messages })
    })
}

/// One failing message for one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub row_key: RowKey,
    pub key: ColumnKey,
    pub message: String,
}

/// Errors of a failed run, one group per failing cell, in row-major order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub groups: Vec<Vec<ValidationError>>,
}

impl ValidationReport {
    /// The row-major-first failing cell.
    pub fn first(&self) -> Option<&ValidationError> {
        self.groups.first().and_then(|g| g.first())
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first() {
            Some(first) => write!(
                f,
                "{} cell(s) failed validation, first at row {} column {}: {}",
                self.groups.len(),
                first.row_key,
                first.key,
                first.message
            ),
            None => f.write_str("validation passed"),
        }
    }
}

/// Validation of one cell, detached from the grid.
pub struct ValidationTask {
    context: ValidationContext,
    required: bool,
    validator: Option<Validator>,
}

impl fmt::Debug for ValidationTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationTask")
            .field("row_key", &self.context.row_key)
            .field("key", &self.context.key)
            .field("required", &self.required)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

impl ValidationTask {
    pub fn new(context: ValidationContext, required: bool, validator: Option<Validator>) -> Self {
        Self {
            context,
            required,
            validator,
        }
    }

    pub fn row_key(&self) -> &RowKey {
        &self.context.row_key
    }

    pub fn key(&self) -> &ColumnKey {
        &self.context.key
    }

    /// Run the built-in rule, then the custom validator.
    pub async fn run(self) -> Vec<ValidationError> {
        let row_key = self.context.row_key.clone();
        let key = self.context.key.clone();
        let messages = if self.required && self.context.value.is_empty() {
            vec![REQUIRED_MESSAGE.to_string()]
        } else if let Some(validator) = self.validator {
            validator(self.context).await
        } else {
            Vec::new()
        };
        messages
            .into_iter()
            .filter(|m| !m.is_empty())
            .map(|message| ValidationError {
                row_key: row_key.clone(),
                key: key.clone(),
                message,
            })
            .collect()
    }
}

/// Held while a run is in flight; dropping it releases the pipeline.
#[derive(Debug)]
pub struct RunGuard {
    flag: Rc<Cell<bool>>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// A planned run: tasks in row-major order plus the in-flight guard.
#[derive(Debug)]
pub struct ValidationRun {
    pub tasks: Vec<ValidationTask>,
    pub guard: RunGuard,
}

/// Validators by column and the active error per cell.
#[derive(Default)]
pub struct ValidationPipeline {
    validators: HashMap<ColumnKey, Validator>,
    errors: HashMap<RowKey, HashMap<ColumnKey, String>>,
    running: Rc<Cell<bool>>,
}

impl fmt::Debug for ValidationPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationPipeline")
            .field("validators", &self.validators.keys().collect::<Vec<_>>())
            .field("errors", &self.errors)
            .field("running", &self.running.get())
            .finish()
    }
}

impl ValidationPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_validator(&mut self, key: ColumnKey, validator: Validator) {
        self.validators.insert(key, validator);
    }

    pub fn remove_validator(&mut self, key: &str) -> bool {
        self.validators.remove(key).is_some()
    }

    pub fn validator(&self, key: &str) -> Option<Validator> {
        self.validators.get(key).map(Rc::clone)
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Start a run over `tasks`. Fails if another run is still in flight.
    pub fn begin(&self, tasks: Vec<ValidationTask>) -> Result<ValidationRun> {
        if self.running.replace(true) {
            return Err(GridError::ValidationInProgress);
        }
        Ok(ValidationRun {
            tasks,
            guard: RunGuard {
                flag: Rc::clone(&self.running),
            },
        })
    }

    /// Store the outcome for one cell: the first message becomes the cell's
    /// active error, an empty result clears it.
    pub fn apply(&mut self, row_key: &RowKey, key: &ColumnKey, errors: &[ValidationError]) {
        match errors.first() {
            Some(first) => self.set_error(row_key.clone(), key.clone(), first.message.clone()),
            None => {
                self.clear_cell(row_key.as_str(), key.as_str());
            }
        }
    }

    pub fn set_error(&mut self, row_key: RowKey, key: ColumnKey, message: String) {
        self.errors.entry(row_key).or_default().insert(key, message);
    }

    pub fn error(&self, row_key: &str, key: &str) -> Option<&str> {
        self.errors.get(row_key)?.get(key).map(String::as_str)
    }

    pub fn clear_cell(&mut self, row_key: &str, key: &str) -> bool {
        let Some(cells) = self.errors.get_mut(row_key) else {
            return false;
        };
        let removed = cells.remove(key).is_some();
        if cells.is_empty() {
            self.errors.remove(row_key);
        }
        removed
    }

    /// Clear all active errors. Validators stay registered.
    pub fn clear(&mut self) {
        self.errors.clear();
    }

    pub fn error_count(&self) -> usize {
        self.errors.values().map(HashMap::len).sum()
    }

    /// Move errors to renamed row keys.
    pub fn rename_rows(&mut self, renamed: &HashMap<RowKey, RowKey>) {
        if renamed.is_empty() {
            return;
        }
        self.errors = std::mem::take(&mut self.errors)
            .into_iter()
            .map(|(row, cells)| (renamed.get(&row).cloned().unwrap_or(row), cells))
            .collect();
    }

    /// Drop errors and validators for keys that vanished.
    pub fn retain_keys(
        &mut self,
        row_present: impl Fn(&str) -> bool,
        column_present: impl Fn(&str) -> bool,
    ) {
        self.errors.retain(|row, cells| {
            if !row_present(row.as_str()) {
                return false;
            }
            cells.retain(|col, _| column_present(col.as_str()));
            !cells.is_empty()
        });
    }
}

/// Yield once to the executor before continuing.
pub(crate) fn yield_now() -> YieldNow {
    YieldNow { yielded: false }
}

pub(crate) struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn context(row: &str, key: &str, value: CellValue) -> ValidationContext {
        ValidationContext {
            row_key: row.into(),
            key: key.into(),
            value,
            row: Row::new(),
        }
    }

    #[test]
    fn test_required_rule_runs_first() {
        let never = sync_validator(|_| vec!["custom".to_string()]);
        let task = ValidationTask::new(context("r1", "name", CellValue::Empty), true, Some(never));
        let errors = pollster::block_on(task.run());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, REQUIRED_MESSAGE);
    }

    #[test]
    fn test_empty_messages_are_dropped() {
        let validator = sync_validator(|_| vec![String::new()]);
        let task = ValidationTask::new(context("r1", "name", "x".into()), false, Some(validator));
        assert!(pollster::block_on(task.run()).is_empty());
    }

    #[test]
    fn test_second_run_rejected_until_guard_dropped() {
        let pipeline = ValidationPipeline::new();
        let run = pipeline.begin(Vec::new()).unwrap();
        assert!(matches!(
            pipeline.begin(Vec::new()),
            Err(GridError::ValidationInProgress)
        ));
        drop(run);
        assert!(pipeline.begin(Vec::new()).is_ok());
    }

    #[test]
    fn test_apply_sets_and_clears() {
        let mut pipeline = ValidationPipeline::new();
        let (r, k) = (RowKey::from("r1"), ColumnKey::from("age"));
        let err = ValidationError {
            row_key: r.clone(),
            key: k.clone(),
            message: "too old".to_string(),
        };
        pipeline.apply(&r, &k, std::slice::from_ref(&err));
        assert_eq!(pipeline.error("r1", "age"), Some("too old"));
        pipeline.apply(&r, &k, &[]);
        assert_eq!(pipeline.error("r1", "age"), None);
        assert_eq!(pipeline.error_count(), 0);
    }

    #[test]
    fn test_yield_now_completes() {
        pollster::block_on(yield_now());
    }
}
