//! The validation rule model.
//!
//! A [`Rule`] bundles the declarative checks (required, format, bounds,
//! pattern, enum) with optional custom sync/async validators and the
//! metadata steering evaluation: severity level, triggers, debounce, and
//! stop-on-first-failure. Rules are built fluently:
//!
//! ```rust
//! use reform_rules::{Level, Rule, Trigger};
//!
//! let rule = Rule::new()
//!     .required()
//!     .min_length(8)
//!     .level(Level::Warning)
//!     .trigger(Trigger::Blur);
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use reform_core::{AbortSignal, Value};

use crate::engine::ValidatorContext;

/// Severity of a rule failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Level {
    /// Contributes to `errors` and flips validity.
    #[default]
    Error,
    /// Contributes to `warnings`; never affects validity.
    Warning,
}

/// The lifecycle moment that enables a rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Change,
    Blur,
    Submit,
}

/// A custom synchronous check. Returns a message on failure.
pub type SyncValidator =
    Arc<dyn Fn(&Value, &Rule, &ValidatorContext<'_>) -> Option<String> + Send + Sync>;

/// A custom asynchronous check.
///
/// Runs only after the rule's sync checks passed on a non-empty value. An
/// `Err` becomes one error-level feedback entry unless the signal aborted,
/// in which case the run contributes nothing.
#[async_trait]
pub trait AsyncValidator: Send + Sync {
    async fn validate(
        &self,
        value: &Value,
        rule: &Rule,
        context: &ValidatorContext<'_>,
        signal: &AbortSignal,
    ) -> Result<(), String>;
}

/// One validation rule for one field.
#[derive(Clone, Default)]
pub struct Rule {
    pub required: bool,
    /// Name of a registered format predicate. Unknown names are skipped.
    pub format: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub exclusive_min: Option<f64>,
    pub exclusive_max: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
    /// Allowed values.
    pub enum_values: Option<Vec<Value>>,
    pub validator: Option<SyncValidator>,
    pub async_validator: Option<Arc<dyn AsyncValidator>>,
    pub level: Level,
    /// Triggers this rule applies to. `None` means always.
    pub triggers: Option<Vec<Trigger>>,
    /// Delay before the async validator runs; a newer run cancels the wait.
    pub debounce: Option<Duration>,
    /// On failure, stop evaluating subsequent rules for this run.
    pub stop_on_first_failure: bool,
    /// Fixed feedback message overriding the locale bundle.
    pub message: Option<String>,
}

impl Rule {
    pub fn new() -> Self {
        Rule::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn format(mut self, name: impl Into<String>) -> Self {
        self.format = Some(name.into());
        self
    }

    pub fn min(mut self, bound: f64) -> Self {
        self.min = Some(bound);
        self
    }

    pub fn max(mut self, bound: f64) -> Self {
        self.max = Some(bound);
        self
    }

    pub fn exclusive_min(mut self, bound: f64) -> Self {
        self.exclusive_min = Some(bound);
        self
    }

    pub fn exclusive_max(mut self, bound: f64) -> Self {
        self.exclusive_max = Some(bound);
        self
    }

    pub fn min_length(mut self, bound: usize) -> Self {
        self.min_length = Some(bound);
        self
    }

    pub fn max_length(mut self, bound: usize) -> Self {
        self.max_length = Some(bound);
        self
    }

    /// Regex the string form of the value must match.
    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn one_of(mut self, values: Vec<Value>) -> Self {
        self.enum_values = Some(values);
        self
    }

    pub fn validator(
        mut self,
        f: impl Fn(&Value, &Rule, &ValidatorContext<'_>) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(Arc::new(f));
        self
    }

    pub fn async_validator(mut self, v: Arc<dyn AsyncValidator>) -> Self {
        self.async_validator = Some(v);
        self
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Add one trigger. Absent triggers mean "applies to every run".
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.get_or_insert_with(Vec::new).push(trigger);
        self
    }

    pub fn debounce(mut self, delay: Duration) -> Self {
        self.debounce = Some(delay);
        self
    }

    pub fn stop_on_first_failure(mut self) -> Self {
        self.stop_on_first_failure = true;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Whether this rule participates in a run for `trigger`.
    pub fn applies_to(&self, trigger: Option<Trigger>) -> bool {
        match (&self.triggers, trigger) {
            (None, _) => true,
            (Some(_), None) => true,
            (Some(set), Some(t)) => set.contains(&t),
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("required", &self.required)
            .field("format", &self.format)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("exclusive_min", &self.exclusive_min)
            .field("exclusive_max", &self.exclusive_max)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("enum_values", &self.enum_values)
            .field("has_validator", &self.validator.is_some())
            .field("has_async_validator", &self.async_validator.is_some())
            .field("level", &self.level)
            .field("triggers", &self.triggers)
            .field("debounce", &self.debounce)
            .field("stop_on_first_failure", &self.stop_on_first_failure)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates() {
        let rule = Rule::new()
            .required()
            .min(1.0)
            .max(10.0)
            .level(Level::Warning)
            .trigger(Trigger::Change)
            .trigger(Trigger::Submit)
            .stop_on_first_failure();
        assert!(rule.required);
        assert_eq!(rule.min, Some(1.0));
        assert_eq!(rule.level, Level::Warning);
        assert_eq!(rule.triggers.as_deref(), Some(&[Trigger::Change, Trigger::Submit][..]));
        assert!(rule.stop_on_first_failure);
    }

    #[test]
    fn trigger_filtering() {
        let untriggered = Rule::new().required();
        assert!(untriggered.applies_to(Some(Trigger::Change)));
        assert!(untriggered.applies_to(None));

        let on_blur = Rule::new().required().trigger(Trigger::Blur);
        assert!(on_blur.applies_to(Some(Trigger::Blur)));
        assert!(!on_blur.applies_to(Some(Trigger::Change)));
        // A run without a trigger applies every rule.
        assert!(on_blur.applies_to(None));
    }

    #[test]
    fn debug_does_not_panic() {
        let rule = Rule::new().pattern(Regex::new("[A-Z]").unwrap());
        let out = format!("{:?}", rule);
        assert!(out.contains("[A-Z]"));
    }
}
