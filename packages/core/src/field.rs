//! Per-field state and the shared cell async work writes through.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use reform_path::Path;

use crate::value::Value;

/// Interaction mode of a field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FieldMode {
    /// Normal editable input.
    #[default]
    Editable,
    /// Value shown, input rejected.
    ReadOnly,
    /// Input disabled at the component level.
    Disabled,
    /// Rendered as static preview text.
    Preview,
}

/// One selectable option of a field's data source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataOption {
    pub label: String,
    pub value: Value,
    pub disabled: bool,
}

impl DataOption {
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        DataOption {
            label: label.into(),
            value: value.into(),
            disabled: false,
        }
    }
}

/// Mutable state of one registered field.
///
/// The field's value itself lives in the form's values tree; everything else
/// (flags, feedback, options) lives here.
#[derive(Clone, Debug)]
pub struct FieldState {
    /// Path of the field inside the values tree.
    pub path: Path,
    /// Human-readable label used in feedback messages.
    pub label: String,
    pub required: bool,
    pub visible: bool,
    pub disabled: bool,
    pub mode: FieldMode,
    /// True while a data-source load is in flight.
    pub loading: bool,
    /// Error-level validation feedback.
    pub errors: Vec<String>,
    /// Warning-level validation feedback. Never affects validity.
    pub warnings: Vec<String>,
    /// Resolved selectable options.
    pub data_source: Vec<DataOption>,
    /// Opaque props forwarded to the rendering layer.
    pub component_props: BTreeMap<String, Value>,
    /// Omit this field from submit payloads while it is hidden.
    pub exclude_when_hidden: bool,
}

impl FieldState {
    pub fn new(path: Path) -> Self {
        let label = path.to_string();
        FieldState {
            path,
            label,
            required: false,
            visible: true,
            disabled: false,
            mode: FieldMode::Editable,
            loading: false,
            errors: Vec::new(),
            warnings: Vec::new(),
            data_source: Vec::new(),
            component_props: BTreeMap::new(),
            exclude_when_hidden: false,
        }
    }

    /// Validity is solely "no error-level feedback".
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn clear_feedback(&mut self) {
        self.errors.clear();
        self.warnings.clear();
    }
}

/// Shared handle to one field's state plus its load generation counter.
///
/// The generation counter orders async results for the same field: every
/// load (and field disposal) bumps it, and a completion whose token no
/// longer matches is discarded without touching state. The mutex is never
/// held across an await point.
#[derive(Debug)]
pub struct FieldCell {
    state: Mutex<FieldState>,
    generation: AtomicU64,
}

impl FieldCell {
    pub fn new(state: FieldState) -> Self {
        FieldCell {
            state: Mutex::new(state),
            generation: AtomicU64::new(0),
        }
    }

    /// Snapshot the current state.
    pub fn snapshot(&self) -> FieldState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Run a closure against the locked state.
    pub fn update<R>(&self, f: impl FnOnce(&mut FieldState) -> R) -> R {
        f(&mut self.state.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Start a load: bump the generation, set `loading`, return the token
    /// the eventual result must present.
    pub fn begin_load(&self) -> u64 {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.update(|s| s.loading = true);
        token
    }

    /// Whether `token` still identifies the newest load.
    pub fn is_current(&self, token: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == token
    }

    /// Apply a successful load result. Returns false (mutating nothing) if
    /// a newer load superseded this token.
    pub fn complete_load(&self, token: u64, options: Vec<DataOption>) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.update(|s| {
            s.data_source = options;
            s.loading = false;
        });
        true
    }

    /// Record a failed load. Clears `loading` but leaves `data_source`
    /// untouched. Returns false if the token is stale.
    pub fn fail_load(&self, token: u64) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.update(|s| s.loading = false);
        true
    }

    /// Invalidate all outstanding tokens (field disposal). Late callbacks
    /// see a stale token and do nothing.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Current generation, for tests and diagnostics.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// A shareable cancellation flag for async validation runs.
///
/// Cloning shares the flag. A new validation run for the same field aborts
/// the previous run's signal; an aborted run must contribute no feedback.
/// The signal is both pollable (`is_aborted`) and awaitable (`aborted`), so
/// an engine can race a slow validator against its own cancellation.
#[derive(Clone, Debug, Default)]
pub struct AbortSignal {
    flag: std::sync::Arc<std::sync::atomic::AtomicBool>,
    notify: std::sync::Arc<tokio::sync::Notify>,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Resolve once the signal aborts. Never resolves for a signal that is
    /// never aborted.
    pub async fn aborted(&self) {
        // Register interest before the final flag check so an abort racing
        // this call cannot be missed.
        let mut notified = std::pin::pin!(self.notify.notified());
        loop {
            notified.as_mut().enable();
            if self.is_aborted() {
                return;
            }
            notified.as_mut().await;
            notified.set(self.notify.notified());
        }
    }
}
