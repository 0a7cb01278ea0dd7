//! Reactions: dependency-driven recomputation of field state.
//!
//! A reaction watches one or more paths in the values tree. When a watched
//! path's resolved value changes, the scheduler evaluates the reaction's
//! body against the current values snapshot. Bodies come in two shapes:
//!
//! - **Declarative**: a `when` predicate over the watched values plus two
//!   pure-data [`StatePatch`]es, applied on true (`fulfill`) or false
//!   (`otherwise`). Patches being data keeps them inspectable.
//! - **Imperative**: a `run` callback over a bounded mutation-capability
//!   object ([`FieldOps`]). The callback records effects; the scheduler
//!   applies them afterwards, so every side effect stays enumerable.

use std::collections::BTreeMap;
use std::sync::Arc;

use reform_core::{DataOption, FieldMode, Value};
use reform_path::Path;
use reform_rules::Rule;
use reform_source::DataSourceDescriptor;

/// Predicate over the watched values, in watch-list order.
pub type WhenFn = Arc<dyn Fn(&[Value]) -> bool + Send + Sync>;

/// Imperative reaction body.
pub type RunFn = Arc<dyn Fn(&mut FieldOps, &ReactionContext) + Send + Sync>;

/// A partial update to one field's state. Unset members leave the current
/// state untouched.
#[derive(Clone, Debug, Default)]
pub struct StatePatch {
    pub value: Option<Value>,
    pub required: Option<bool>,
    pub visible: Option<bool>,
    pub disabled: Option<bool>,
    pub mode: Option<FieldMode>,
    pub data_source: Option<Vec<DataOption>>,
    pub component_props: Option<BTreeMap<String, Value>>,
}

impl StatePatch {
    pub fn new() -> Self {
        StatePatch::default()
    }

    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }

    pub fn mode(mut self, mode: FieldMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn data_source(mut self, options: Vec<DataOption>) -> Self {
        self.data_source = Some(options);
        self
    }

    pub fn component_prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.component_props
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// True when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
            && self.required.is_none()
            && self.visible.is_none()
            && self.disabled.is_none()
            && self.mode.is_none()
            && self.data_source.is_none()
            && self.component_props.is_none()
    }
}

/// One recorded mutation from a reaction body.
#[derive(Clone)]
pub(crate) enum Effect {
    SetValue(Value),
    SetRequired(bool),
    SetVisible(bool),
    SetDisabled(bool),
    SetLoading(bool),
    SetMode(FieldMode),
    SetDataSource(Vec<DataOption>),
    SetComponentProps(BTreeMap<String, Value>),
    SetRules(Vec<Rule>),
    LoadDataSource(DataSourceDescriptor),
}

/// The mutation surface an imperative reaction body gets for its field.
///
/// Calls record effects; the scheduler applies them when the body returns.
pub struct FieldOps {
    path: Path,
    pub(crate) effects: Vec<Effect>,
}

impl FieldOps {
    pub(crate) fn new(path: Path) -> Self {
        FieldOps {
            path,
            effects: Vec::new(),
        }
    }

    /// Path of the field this reaction belongs to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.effects.push(Effect::SetValue(value.into()));
    }

    pub fn set_required(&mut self, required: bool) {
        self.effects.push(Effect::SetRequired(required));
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.effects.push(Effect::SetVisible(visible));
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.effects.push(Effect::SetDisabled(disabled));
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.effects.push(Effect::SetLoading(loading));
    }

    pub fn set_mode(&mut self, mode: FieldMode) {
        self.effects.push(Effect::SetMode(mode));
    }

    pub fn set_data_source(&mut self, options: Vec<DataOption>) {
        self.effects.push(Effect::SetDataSource(options));
    }

    pub fn set_component_props(&mut self, props: BTreeMap<String, Value>) {
        self.effects.push(Effect::SetComponentProps(props));
    }

    /// Replace the field's validation rules.
    pub fn set_rules(&mut self, rules: Vec<Rule>) {
        self.effects.push(Effect::SetRules(rules));
    }

    /// Request a data-source load. The request is issued after the cascade
    /// settles and resolves under the field's generation token.
    pub fn load_data_source(&mut self, descriptor: DataSourceDescriptor) {
        self.effects.push(Effect::LoadDataSource(descriptor));
    }
}

/// Read-only surroundings of a reaction evaluation: a values snapshot taken
/// when the body runs.
pub struct ReactionContext {
    values: Value,
}

impl ReactionContext {
    pub(crate) fn new(values: Value) -> Self {
        ReactionContext { values }
    }

    /// The whole values tree at evaluation time.
    pub fn values(&self) -> &Value {
        &self.values
    }

    /// Resolve one field's value from the snapshot (absent → `Null`).
    pub fn get_field_value(&self, path: &Path) -> Value {
        self.values.get_or_null(path)
    }
}

/// A reaction body.
#[derive(Clone)]
pub enum ReactionBody {
    Declarative {
        when: WhenFn,
        fulfill: StatePatch,
        otherwise: StatePatch,
    },
    Imperative(RunFn),
}

/// A registered reaction: watched paths plus a body. The target field is
/// the field the reaction was attached to.
#[derive(Clone)]
pub struct Reaction {
    pub watch: Vec<Path>,
    pub body: ReactionBody,
}

impl Reaction {
    /// A declarative reaction: when `when` holds over the watched values,
    /// apply `fulfill`, else `otherwise`.
    pub fn declarative(
        watch: impl IntoIterator<Item = impl Into<Path>>,
        when: impl Fn(&[Value]) -> bool + Send + Sync + 'static,
        fulfill: StatePatch,
        otherwise: StatePatch,
    ) -> Self {
        Reaction {
            watch: watch.into_iter().map(Into::into).collect(),
            body: ReactionBody::Declarative {
                when: Arc::new(when),
                fulfill,
                otherwise,
            },
        }
    }

    /// An imperative reaction with full mutation access to its field.
    pub fn imperative(
        watch: impl IntoIterator<Item = impl Into<Path>>,
        run: impl Fn(&mut FieldOps, &ReactionContext) + Send + Sync + 'static,
    ) -> Self {
        Reaction {
            watch: watch.into_iter().map(Into::into).collect(),
            body: ReactionBody::Imperative(Arc::new(run)),
        }
    }
}

impl std::fmt::Debug for Reaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.body {
            ReactionBody::Declarative { .. } => "declarative",
            ReactionBody::Imperative(_) => "imperative",
        };
        f.debug_struct("Reaction")
            .field("watch", &self.watch.iter().map(Path::to_string).collect::<Vec<_>>())
            .field("body", &kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reform_path::path;

    #[test]
    fn patch_builder() {
        let patch = StatePatch::new()
            .value("x")
            .visible(false)
            .component_prop("placeholder", "pick one");
        assert_eq!(patch.value, Some(Value::from("x")));
        assert_eq!(patch.visible, Some(false));
        assert!(!patch.is_empty());
        assert!(StatePatch::new().is_empty());
    }

    #[test]
    fn field_ops_records_effects_in_order() {
        let mut ops = FieldOps::new(path!("a"));
        ops.set_visible(false);
        ops.set_value(1i64);
        ops.load_data_source(DataSourceDescriptor::new("http", "u"));
        assert_eq!(ops.effects.len(), 3);
        assert!(matches!(ops.effects[0], Effect::SetVisible(false)));
        assert!(matches!(ops.effects[1], Effect::SetValue(_)));
        assert!(matches!(ops.effects[2], Effect::LoadDataSource(_)));
    }

    #[test]
    fn context_reads_snapshot() {
        let ctx = ReactionContext::new(Value::from(serde_json::json!({"a": {"b": 1}})));
        assert_eq!(ctx.get_field_value(&path!("a.b")), Value::Integer(1));
        assert_eq!(ctx.get_field_value(&path!("missing")), Value::Null);
    }

    #[test]
    fn reaction_constructors() {
        let r = Reaction::declarative(
            ["a", "b"],
            |values| values[0] == Value::from("x"),
            StatePatch::new().visible(true),
            StatePatch::new().visible(false),
        );
        assert_eq!(r.watch.len(), 2);
        assert!(matches!(r.body, ReactionBody::Declarative { .. }));

        let r = Reaction::imperative(["a"], |ops, _ctx| ops.set_disabled(true));
        assert!(matches!(r.body, ReactionBody::Imperative(_)));
    }
}
