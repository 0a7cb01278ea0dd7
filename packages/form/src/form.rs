//! The form store: values tree, field registry, reaction scheduling.
//!
//! All mutation funnels through here. A value write locks the state, runs
//! the reaction cascade to a fixed point (bounded by the configured pass
//! cap), and only then returns - so by the time `set_field_value` returns,
//! dependent field state reflects every reaction. Data-source loads that
//! reactions requested are spawned after the cascade settles and resolve
//! later under the target field's generation token.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use reform_core::{ops, AbortSignal, DataOption, FieldCell, FieldState, Registry, Value};
use reform_path::Path;
use reform_rules::{validate, Rule, Trigger, ValidatorContext, Verdict};
use reform_source::{DataSourceDescriptor, SourceLoader};

use crate::error::FormError;
use crate::reaction::{Effect, FieldOps, Reaction, ReactionBody, ReactionContext, StatePatch};
use crate::spec::FieldSpec;

/// Default bound on cascade passes before the scheduler declares a cycle.
pub const DEFAULT_MAX_CASCADE: usize = 32;

struct FieldEntry {
    path: Path,
    cell: Arc<FieldCell>,
    rules: Vec<Rule>,
    remote_source: Option<DataSourceDescriptor>,
    /// Signal of the newest validation run; replaced (and the old one
    /// aborted) whenever a new run starts.
    validation_signal: AbortSignal,
}

struct ReactionEntry {
    target: Path,
    watch: Vec<Path>,
    body: ReactionBody,
    /// Watched values as of the last evaluation (or registration). The
    /// reaction fires only when the freshly resolved values differ.
    last_seen: Vec<Value>,
}

struct FormState {
    values: Value,
    initial_values: Value,
    /// Registration order; validation and submission iterate in this order.
    fields: Vec<FieldEntry>,
    index: HashMap<Path, usize>,
    /// Registration order; the scheduler evaluates in this order.
    reactions: Vec<ReactionEntry>,
}

/// A load requested during a cascade. The generation token is reserved at
/// issuance, while the cascade still holds the state lock, so rapid
/// same-field loads stay ordered by issue order no matter when their
/// spawned tasks actually start running.
struct LoadRequest {
    cell: Arc<FieldCell>,
    descriptor: DataSourceDescriptor,
    token: u64,
}

struct FormInner {
    registry: Arc<Registry>,
    loader: Arc<SourceLoader>,
    state: Mutex<FormState>,
    max_cascade: usize,
}

/// Feedback for one field from a submit run.
#[derive(Clone, Debug)]
pub struct FieldFeedback {
    pub path: Path,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Outcome of [`Form::submit`].
#[derive(Clone, Debug)]
pub struct SubmitResult {
    /// The values payload, with hidden `exclude_when_hidden` fields omitted.
    pub values: Value,
    /// Feedback for every field that produced any, in registration order.
    pub errors: Vec<FieldFeedback>,
}

impl SubmitResult {
    pub fn is_valid(&self) -> bool {
        self.errors.iter().all(|f| f.errors.is_empty())
    }
}

/// A reactive form.
///
/// Cheap to clone (shared interior); all methods take `&self`.
#[derive(Clone)]
pub struct Form {
    inner: Arc<FormInner>,
}

impl Form {
    /// A form over the given registry with the default cascade bound.
    pub fn new(registry: Registry) -> Self {
        Self::with_max_cascade(registry, DEFAULT_MAX_CASCADE)
    }

    /// A form with an explicit cascade pass bound.
    pub fn with_max_cascade(registry: Registry, max_cascade: usize) -> Self {
        let registry = Arc::new(registry);
        Form {
            inner: Arc::new(FormInner {
                loader: Arc::new(SourceLoader::new(registry.clone())),
                registry,
                state: Mutex::new(FormState {
                    values: Value::map(),
                    initial_values: Value::map(),
                    fields: Vec::new(),
                    index: HashMap::new(),
                    reactions: Vec::new(),
                }),
                max_cascade,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The registry this form was constructed with.
    pub fn registry(&self) -> Arc<Registry> {
        self.inner.registry.clone()
    }

    /// Register a field. Re-registering a path disposes the previous field
    /// first. The initial value (if any) enters the values tree and may
    /// trigger existing reactions; a remote source starts loading.
    pub fn create_field(&self, spec: FieldSpec) -> Result<(), FormError> {
        let FieldSpec {
            path,
            label,
            initial_value,
            required,
            hidden,
            disabled,
            mode,
            exclude_when_hidden,
            component_props,
            rules,
            reactions,
            data_source,
            remote_source,
        } = spec;

        let mut state = self.lock();
        remove_entry(&mut state, &path);

        let mut field_state = FieldState::new(path.clone());
        if let Some(label) = label {
            field_state.label = label;
        }
        field_state.required = required;
        field_state.visible = !hidden;
        field_state.disabled = disabled;
        field_state.mode = mode;
        field_state.exclude_when_hidden = exclude_when_hidden;
        field_state.component_props = component_props;
        field_state.data_source = data_source;

        let cell = Arc::new(FieldCell::new(field_state));
        let slot = state.fields.len();
        state.index.insert(path.clone(), slot);
        state.fields.push(FieldEntry {
            path: path.clone(),
            cell: cell.clone(),
            rules,
            remote_source: remote_source.clone(),
            validation_signal: AbortSignal::new(),
        });

        if let Some(value) = initial_value {
            ops::set_in(&mut state.values, &path, value.clone());
            ops::set_in(&mut state.initial_values, &path, value);
        }

        // A reaction does not fire for the state it was registered under.
        for reaction in reactions {
            let last_seen = resolve_watched(&state.values, &reaction.watch);
            state.reactions.push(ReactionEntry {
                target: path.clone(),
                watch: reaction.watch,
                body: reaction.body,
                last_seen,
            });
        }

        let mut loads = run_cascade(&mut state, self.inner.max_cascade)?;
        if let Some(descriptor) = remote_source {
            let token = cell.begin_load();
            loads.push(LoadRequest {
                cell,
                descriptor,
                token,
            });
        }
        let snapshot = state.values.clone();
        drop(state);
        self.spawn_loads(loads, snapshot);
        Ok(())
    }

    /// Dispose a field: abort its pending validation, invalidate in-flight
    /// loads, and drop its reactions. The field's slot in the values tree
    /// is left as-is; use [`Form::delete_field_value`] to clear it.
    pub fn remove_field(&self, path: &Path) -> Result<(), FormError> {
        let mut state = self.lock();
        if remove_entry(&mut state, path) {
            Ok(())
        } else {
            Err(FormError::UnknownField { path: path.clone() })
        }
    }

    /// Attach another reaction to an existing field.
    pub fn add_reaction(&self, target: &Path, reaction: Reaction) -> Result<(), FormError> {
        let mut state = self.lock();
        if !state.index.contains_key(target) {
            return Err(FormError::UnknownField {
                path: target.clone(),
            });
        }
        let last_seen = resolve_watched(&state.values, &reaction.watch);
        state.reactions.push(ReactionEntry {
            target: target.clone(),
            watch: reaction.watch,
            body: reaction.body,
            last_seen,
        });
        Ok(())
    }

    /// Read one value from the tree (absent → `Null`).
    pub fn get_field_value(&self, path: &Path) -> Value {
        self.lock().values.get_or_null(path)
    }

    /// Snapshot the whole values tree.
    pub fn values(&self) -> Value {
        self.lock().values.clone()
    }

    /// Write a value and run the reaction cascade. By the time this
    /// returns, dependent field state reflects every (synchronous) reaction
    /// effect; requested data-source loads resolve in the background.
    pub fn set_field_value(&self, path: &Path, value: impl Into<Value>) -> Result<(), FormError> {
        let mut state = self.lock();
        ops::set_in(&mut state.values, path, value.into());
        let loads = run_cascade(&mut state, self.inner.max_cascade)?;
        let snapshot = state.values.clone();
        drop(state);
        self.spawn_loads(loads, snapshot);
        Ok(())
    }

    /// Delete a value (splicing arrays) and run the cascade.
    pub fn delete_field_value(&self, path: &Path) -> Result<(), FormError> {
        let mut state = self.lock();
        ops::delete_in(&mut state.values, path);
        let loads = run_cascade(&mut state, self.inner.max_cascade)?;
        let snapshot = state.values.clone();
        drop(state);
        self.spawn_loads(loads, snapshot);
        Ok(())
    }

    /// Snapshot one field's state.
    pub fn field_state(&self, path: &Path) -> Option<FieldState> {
        let state = self.lock();
        state
            .index
            .get(path)
            .map(|&i| state.fields[i].cell.snapshot())
    }

    /// Registered field paths, in registration order.
    pub fn field_paths(&self) -> Vec<Path> {
        self.lock().fields.iter().map(|f| f.path.clone()).collect()
    }

    /// Replace a field's options directly (e.g. from a rendering binding).
    pub fn set_data_source(
        &self,
        path: &Path,
        options: Vec<DataOption>,
    ) -> Result<(), FormError> {
        self.with_cell(path, |cell| cell.update(|s| s.data_source = options))
    }

    /// Replace a field's component props.
    pub fn set_component_props(
        &self,
        path: &Path,
        props: std::collections::BTreeMap<String, Value>,
    ) -> Result<(), FormError> {
        self.with_cell(path, |cell| cell.update(|s| s.component_props = props))
    }

    fn with_cell(
        &self,
        path: &Path,
        f: impl FnOnce(&FieldCell),
    ) -> Result<(), FormError> {
        let cell = {
            let state = self.lock();
            let i = *state.index.get(path).ok_or_else(|| FormError::UnknownField {
                path: path.clone(),
            })?;
            state.fields[i].cell.clone()
        };
        f(&cell);
        Ok(())
    }

    /// Write a value and then run Change-trigger validation for the field.
    /// This is the keystroke-shaped entry point.
    pub async fn input(
        &self,
        path: &Path,
        value: impl Into<Value>,
    ) -> Result<Verdict, FormError> {
        if !self.lock().index.contains_key(path) {
            return Err(FormError::UnknownField { path: path.clone() });
        }
        self.set_field_value(path, value)?;
        self.validate_field(path, Some(Trigger::Change)).await
    }

    /// Run Blur-trigger validation for the field.
    pub async fn blur(&self, path: &Path) -> Result<Verdict, FormError> {
        self.validate_field(path, Some(Trigger::Blur)).await
    }

    /// Validate one field now.
    ///
    /// Starting a run aborts the field's previous run; an aborted run
    /// writes no feedback. Invisible fields are skipped and report valid.
    pub async fn validate_field(
        &self,
        path: &Path,
        trigger: Option<Trigger>,
    ) -> Result<Verdict, FormError> {
        let (cell, rules, label, values, signal) = {
            let mut state = self.lock();
            let i = *state.index.get(path).ok_or_else(|| FormError::UnknownField {
                path: path.clone(),
            })?;
            state.fields[i].validation_signal.abort();
            let signal = AbortSignal::new();
            state.fields[i].validation_signal = signal.clone();
            let cell = state.fields[i].cell.clone();
            let rules = state.fields[i].rules.clone();
            let label = cell.snapshot().label;
            (cell, rules, label, state.values.clone(), signal)
        };

        if !cell.snapshot().visible {
            return Ok(Verdict::default());
        }

        let value = values.get_or_null(path);
        let context = ValidatorContext {
            values: &values,
            path,
            label: &label,
            registry: &self.inner.registry,
        };
        let verdict = validate(&value, &rules, &context, trigger, &signal).await;
        if signal.is_aborted() {
            // Superseded: the newer run owns the field's feedback.
            return Ok(Verdict::default());
        }
        cell.update(|s| {
            s.errors = verdict.errors.clone();
            s.warnings = verdict.warnings.clone();
        });
        Ok(verdict)
    }

    /// Validate every visible field with the Submit trigger and assemble
    /// the values payload, omitting hidden `exclude_when_hidden` fields.
    pub async fn submit(&self) -> Result<SubmitResult, FormError> {
        let (snapshot, fields) = {
            let mut state = self.lock();
            let snapshot = state.values.clone();
            let fields: Vec<_> = state
                .fields
                .iter_mut()
                .map(|entry| {
                    entry.validation_signal.abort();
                    let signal = AbortSignal::new();
                    entry.validation_signal = signal.clone();
                    (entry.path.clone(), entry.cell.clone(), entry.rules.clone(), signal)
                })
                .collect();
            (snapshot, fields)
        };

        let mut payload = snapshot.clone();
        let mut feedback = Vec::new();
        for (path, cell, rules, signal) in fields {
            let field = cell.snapshot();
            if !field.visible {
                if field.exclude_when_hidden {
                    ops::delete_in(&mut payload, &path);
                }
                // Hidden fields are skipped by validation regardless of
                // their own rules.
                continue;
            }
            let value = snapshot.get_or_null(&path);
            let context = ValidatorContext {
                values: &snapshot,
                path: &path,
                label: &field.label,
                registry: &self.inner.registry,
            };
            let verdict = validate(&value, &rules, &context, Some(Trigger::Submit), &signal).await;
            if signal.is_aborted() {
                continue;
            }
            cell.update(|s| {
                s.errors = verdict.errors.clone();
                s.warnings = verdict.warnings.clone();
            });
            if !verdict.errors.is_empty() || !verdict.warnings.is_empty() {
                feedback.push(FieldFeedback {
                    path,
                    errors: verdict.errors,
                    warnings: verdict.warnings,
                });
            }
        }
        Ok(SubmitResult {
            values: payload,
            errors: feedback,
        })
    }

    /// Restore initial values, clear all feedback, and re-run the cascade
    /// so dependent state tracks the restored values.
    pub fn reset(&self) -> Result<(), FormError> {
        let mut state = self.lock();
        state.values = state.initial_values.clone();
        for entry in &state.fields {
            entry.validation_signal.abort();
            // Stale any in-flight load so its completion cannot resurrect
            // the loading flag.
            entry.cell.invalidate();
            entry.cell.update(|s| {
                s.clear_feedback();
                s.loading = false;
            });
        }
        let loads = run_cascade(&mut state, self.inner.max_cascade)?;
        let snapshot = state.values.clone();
        drop(state);
        self.spawn_loads(loads, snapshot);
        Ok(())
    }

    /// Reload a field's remote options now, awaiting the result. Unlike
    /// reaction-requested loads this surfaces transport errors to the
    /// caller.
    pub async fn reload_data_source(&self, path: &Path) -> Result<(), FormError> {
        let (cell, descriptor, values) = {
            let state = self.lock();
            let i = *state.index.get(path).ok_or_else(|| FormError::UnknownField {
                path: path.clone(),
            })?;
            let descriptor = state.fields[i]
                .remote_source
                .clone()
                .ok_or_else(|| FormError::NoDataSource { path: path.clone() })?;
            (state.fields[i].cell.clone(), descriptor, state.values.clone())
        };
        self.inner.loader.load(&cell, &descriptor, &values).await?;
        Ok(())
    }

    fn spawn_loads(&self, loads: Vec<LoadRequest>, values: Value) {
        if loads.is_empty() {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                count = loads.len(),
                "data source loads requested outside an async runtime; dropped"
            );
            return;
        };
        for load in loads {
            let loader = self.inner.loader.clone();
            let values = values.clone();
            handle.spawn(async move {
                let outcome = loader
                    .load_with_token(&load.cell, &load.descriptor, &values, load.token)
                    .await;
                if let Err(e) = outcome {
                    tracing::warn!(error = %e, "background data source load failed");
                }
            });
        }
    }
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("Form")
            .field("fields", &state.fields.len())
            .field("reactions", &state.reactions.len())
            .finish()
    }
}

fn resolve_watched(values: &Value, watch: &[Path]) -> Vec<Value> {
    watch.iter().map(|p| values.get_or_null(p)).collect()
}

/// Dispose the field registered at `path`, if any.
fn remove_entry(state: &mut FormState, path: &Path) -> bool {
    let Some(i) = state.index.remove(path) else {
        return false;
    };
    let entry = state.fields.remove(i);
    entry.validation_signal.abort();
    entry.cell.invalidate();
    for (j, field) in state.fields.iter().enumerate().skip(i) {
        state.index.insert(field.path.clone(), j);
    }
    state.reactions.retain(|r| &r.target != path);
    true
}

/// Evaluate reactions to a fixed point.
///
/// Each pass walks the reactions in registration order and fires those
/// whose watched values differ from their last evaluation. Mutations made
/// by a body are visible to later reactions in the same pass and re-enter
/// the scheduler on the next pass. A pass with no firings settles the
/// cascade; `max_passes` firing passes without settling is a cycle.
fn run_cascade(state: &mut FormState, max_passes: usize) -> Result<Vec<LoadRequest>, FormError> {
    let mut loads = Vec::new();
    for pass in 0..max_passes {
        let mut fired = false;
        for i in 0..state.reactions.len() {
            let current = resolve_watched(&state.values, &state.reactions[i].watch);
            if current == state.reactions[i].last_seen {
                continue;
            }
            state.reactions[i].last_seen = current.clone();
            fired = true;
            let target = state.reactions[i].target.clone();
            let body = state.reactions[i].body.clone();
            tracing::trace!(target = %target, pass, "reaction fired");
            match body {
                ReactionBody::Declarative {
                    when,
                    fulfill,
                    otherwise,
                } => {
                    let patch = if when(&current) { fulfill } else { otherwise };
                    apply_patch(state, &target, patch);
                }
                ReactionBody::Imperative(run) => {
                    let context = ReactionContext::new(state.values.clone());
                    let mut surface = FieldOps::new(target.clone());
                    run(&mut surface, &context);
                    apply_effects(state, &target, surface.effects, &mut loads);
                }
            }
        }
        if !fired {
            return Ok(loads);
        }
    }
    Err(FormError::ReactionCycle { passes: max_passes })
}

fn apply_patch(state: &mut FormState, target: &Path, patch: StatePatch) {
    if patch.is_empty() {
        return;
    }
    if let Some(value) = patch.value {
        ops::set_in(&mut state.values, target, value);
    }
    let Some(&i) = state.index.get(target) else {
        tracing::warn!(target = %target, "reaction patch targets an unregistered field");
        return;
    };
    state.fields[i].cell.update(|s| {
        if let Some(required) = patch.required {
            s.required = required;
        }
        if let Some(visible) = patch.visible {
            s.visible = visible;
        }
        if let Some(disabled) = patch.disabled {
            s.disabled = disabled;
        }
        if let Some(mode) = patch.mode {
            s.mode = mode;
        }
        if let Some(options) = patch.data_source {
            s.data_source = options;
        }
        if let Some(props) = patch.component_props {
            s.component_props = props;
        }
    });
}

fn apply_effects(
    state: &mut FormState,
    target: &Path,
    effects: Vec<Effect>,
    loads: &mut Vec<LoadRequest>,
) {
    let entry_index = state.index.get(target).copied();
    for effect in effects {
        match effect {
            Effect::SetValue(value) => ops::set_in(&mut state.values, target, value),
            Effect::SetRules(rules) => {
                if let Some(i) = entry_index {
                    state.fields[i].rules = rules;
                }
            }
            Effect::LoadDataSource(descriptor) => {
                if let Some(i) = entry_index {
                    let cell = state.fields[i].cell.clone();
                    let token = cell.begin_load();
                    loads.push(LoadRequest {
                        cell,
                        descriptor,
                        token,
                    });
                } else {
                    tracing::warn!(target = %target, "load requested for an unregistered field");
                }
            }
            other => {
                let Some(i) = entry_index else {
                    tracing::warn!(target = %target, "reaction effect targets an unregistered field");
                    continue;
                };
                state.fields[i].cell.update(|s| match other {
                    Effect::SetRequired(v) => s.required = v,
                    Effect::SetVisible(v) => s.visible = v,
                    Effect::SetDisabled(v) => s.disabled = v,
                    Effect::SetLoading(v) => s.loading = v,
                    Effect::SetMode(v) => s.mode = v,
                    Effect::SetDataSource(v) => s.data_source = v,
                    Effect::SetComponentProps(v) => s.component_props = v,
                    Effect::SetValue(_) | Effect::SetRules(_) | Effect::LoadDataSource(_) => {}
                });
            }
        }
    }
}
