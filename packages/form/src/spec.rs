//! Declarative field registration.

use std::collections::BTreeMap;

use reform_core::{DataOption, FieldMode, Value};
use reform_path::Path;
use reform_rules::Rule;
use reform_source::DataSourceDescriptor;

use crate::reaction::Reaction;

/// Everything needed to register one field on a form.
///
/// Built fluently and handed to [`Form::create_field`](crate::Form::create_field):
///
/// ```rust
/// use reform_form::FieldSpec;
/// use reform_rules::Rule;
///
/// let spec = FieldSpec::new("user.email")
///     .label("Email")
///     .rule(Rule::new().required().format("email"));
/// ```
#[derive(Default)]
pub struct FieldSpec {
    pub path: Path,
    pub label: Option<String>,
    pub initial_value: Option<Value>,
    pub required: bool,
    pub hidden: bool,
    pub disabled: bool,
    pub mode: FieldMode,
    pub exclude_when_hidden: bool,
    pub component_props: BTreeMap<String, Value>,
    pub rules: Vec<Rule>,
    pub reactions: Vec<Reaction>,
    /// Static options available without a load.
    pub data_source: Vec<DataOption>,
    /// Remote option source; loaded when the field is created and on
    /// explicit reloads.
    pub remote_source: Option<DataSourceDescriptor>,
}

impl FieldSpec {
    pub fn new(path: impl Into<Path>) -> Self {
        FieldSpec {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn initial_value(mut self, value: impl Into<Value>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Start the field hidden.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn mode(mut self, mode: FieldMode) -> Self {
        self.mode = mode;
        self
    }

    /// Omit this field from submit payloads while it is hidden.
    pub fn exclude_when_hidden(mut self) -> Self {
        self.exclude_when_hidden = true;
        self
    }

    pub fn component_prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.component_props.insert(name.into(), value.into());
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn reaction(mut self, reaction: Reaction) -> Self {
        self.reactions.push(reaction);
        self
    }

    pub fn data_source(mut self, options: Vec<DataOption>) -> Self {
        self.data_source = options;
        self
    }

    pub fn remote_source(mut self, descriptor: DataSourceDescriptor) -> Self {
        self.remote_source = Some(descriptor);
        self
    }
}
