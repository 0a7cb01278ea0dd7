//! Rule evaluation.
//!
//! [`validate_sync`] runs the synchronous checks only; [`validate`] runs the
//! full pipeline including cancellable async validators. Both walk the rules
//! in declared order and apply the fixed per-rule check precedence:
//! required → format → numeric bounds → length bounds → pattern → enum →
//! custom sync. The first failing check of a rule produces that rule's one
//! feedback message; warnings never affect validity.

use reform_core::{AbortSignal, Registry, RuleKind, Value};
use reform_path::Path;

use crate::rule::{Level, Rule, Trigger};

/// Read-only surroundings of one validation run.
pub struct ValidatorContext<'a> {
    /// Snapshot of the whole form values tree, for cross-field checks.
    pub values: &'a Value,
    /// Path of the field under validation.
    pub path: &'a Path,
    /// Label used in rendered feedback.
    pub label: &'a str,
    /// Formats and locale messages.
    pub registry: &'a Registry,
}

impl<'a> ValidatorContext<'a> {
    /// Resolve another field's value from the snapshot (absent → `Null`).
    pub fn get_value(&self, path: &Path) -> Value {
        self.values.get_or_null(path)
    }
}

/// The outcome of one validation run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Verdict {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Verdict {
    /// Validity is solely "no error-level feedback".
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn record(&mut self, level: Level, message: String) {
        match level {
            Level::Error => self.errors.push(message),
            Level::Warning => self.warnings.push(message),
        }
    }
}

/// One failed check: which kind, and the bound to interpolate.
struct Failure {
    kind: RuleKind,
    bound: Option<String>,
    /// Message produced by a custom validator, overriding the bundle.
    message: Option<String>,
}

/// Run the synchronous subset of `rules` against `value`.
pub fn validate_sync(
    value: &Value,
    rules: &[Rule],
    context: &ValidatorContext<'_>,
    trigger: Option<Trigger>,
) -> Verdict {
    let mut verdict = Verdict::default();
    for rule in rules.iter().filter(|r| r.applies_to(trigger)) {
        let failed = check_sync(value, rule, context, &mut verdict);
        if failed && rule.stop_on_first_failure {
            break;
        }
    }
    verdict
}

/// Run the full pipeline: sync checks, then (for rules that passed on a
/// non-empty value) the async validator, raced against `signal`.
///
/// An aborted run returns whatever was accumulated so far; callers must
/// check `signal.is_aborted()` and discard the verdict instead of applying
/// it as feedback.
pub async fn validate(
    value: &Value,
    rules: &[Rule],
    context: &ValidatorContext<'_>,
    trigger: Option<Trigger>,
    signal: &AbortSignal,
) -> Verdict {
    let mut verdict = Verdict::default();
    for rule in rules.iter().filter(|r| r.applies_to(trigger)) {
        let mut failed = check_sync(value, rule, context, &mut verdict);

        // Async validators never race a sync failure of their own rule and
        // never see empty values.
        if !failed && !value.is_empty_value() {
            if let Some(async_validator) = &rule.async_validator {
                if let Some(delay) = rule.debounce {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = signal.aborted() => return verdict,
                    }
                }
                tokio::select! {
                    result = async_validator.validate(value, rule, context, signal) => {
                        if signal.is_aborted() {
                            return verdict;
                        }
                        if let Err(cause) = result {
                            tracing::debug!(field = %context.path, %cause, "async validator failed");
                            // Async failures are error-level regardless of
                            // the rule's own level.
                            verdict.record(
                                Level::Error,
                                rule.message.clone().unwrap_or(cause),
                            );
                            failed = true;
                        }
                    }
                    _ = signal.aborted() => return verdict,
                }
            }
        }

        if failed && rule.stop_on_first_failure {
            break;
        }
    }
    verdict
}

/// Run one rule's sync checks; record at most one message. Returns whether
/// the rule failed.
fn check_sync(
    value: &Value,
    rule: &Rule,
    context: &ValidatorContext<'_>,
    verdict: &mut Verdict,
) -> bool {
    match first_failure(value, rule, context) {
        Some(failure) => {
            let message = rule
                .message
                .clone()
                .or(failure.message)
                .unwrap_or_else(|| {
                    context.registry.messages().render(
                        failure.kind,
                        context.label,
                        failure.bound.as_deref(),
                    )
                });
            verdict.record(rule.level, message);
            true
        }
        None => false,
    }
}

/// The fixed check precedence. Stops at the first failing check.
fn first_failure(value: &Value, rule: &Rule, context: &ValidatorContext<'_>) -> Option<Failure> {
    if rule.required && value.is_empty_value() {
        return Some(fail(RuleKind::Required, None));
    }
    // A non-required empty value passes every other check.
    if value.is_empty_value() {
        return None;
    }

    if let Some(name) = &rule.format {
        // Unknown format names are skipped: a configuration smell, not an
        // error.
        if let (Some(validator), Some(s)) = (context.registry.format(name), value.as_str()) {
            if !validator(s) {
                return Some(fail(RuleKind::Format, Some(name.clone())));
            }
        }
    }

    if let Some(n) = value.as_number() {
        if let Some(bound) = rule.min {
            if n < bound {
                return Some(fail(RuleKind::Min, Some(display_f64(bound))));
            }
        }
        if let Some(bound) = rule.max {
            if n > bound {
                return Some(fail(RuleKind::Max, Some(display_f64(bound))));
            }
        }
        if let Some(bound) = rule.exclusive_min {
            if n <= bound {
                return Some(fail(RuleKind::ExclusiveMin, Some(display_f64(bound))));
            }
        }
        if let Some(bound) = rule.exclusive_max {
            if n >= bound {
                return Some(fail(RuleKind::ExclusiveMax, Some(display_f64(bound))));
            }
        }
    }

    if let Some(len) = measurable_length(value) {
        if let Some(bound) = rule.min_length {
            if len < bound {
                return Some(fail(RuleKind::MinLength, Some(bound.to_string())));
            }
        }
        if let Some(bound) = rule.max_length {
            if len > bound {
                return Some(fail(RuleKind::MaxLength, Some(bound.to_string())));
            }
        }
    }

    if let (Some(pattern), Some(s)) = (&rule.pattern, value.as_str()) {
        if !pattern.is_match(s) {
            return Some(fail(RuleKind::Pattern, Some(pattern.as_str().to_string())));
        }
    }

    if let Some(allowed) = &rule.enum_values {
        if !allowed.contains(value) {
            return Some(fail(RuleKind::Enum, None));
        }
    }

    if let Some(validator) = &rule.validator {
        if let Some(message) = validator(value, rule, context) {
            return Some(Failure {
                kind: RuleKind::Custom,
                bound: None,
                message: Some(message),
            });
        }
    }

    None
}

/// Length bounds apply uniformly to strings (character count) and arrays
/// (element count), and to nothing else.
fn measurable_length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(a) => Some(a.len()),
        _ => None,
    }
}

fn fail(kind: RuleKind, bound: Option<String>) -> Failure {
    Failure {
        kind,
        bound,
        message: None,
    }
}

fn display_f64(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
