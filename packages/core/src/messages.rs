//! Locale message bundles for validation feedback.
//!
//! A [`MessageBundle`] maps a rule kind to a template with `{label}` and
//! `{bound}` placeholders. Swap the whole bundle on the registry to change
//! locale; individual rules can still carry a fixed message that bypasses
//! the bundle.

use std::collections::HashMap;

/// The kind of check a feedback message describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Required,
    Format,
    Min,
    Max,
    ExclusiveMin,
    ExclusiveMax,
    MinLength,
    MaxLength,
    Pattern,
    Enum,
    Custom,
}

/// A set of feedback templates for one locale.
#[derive(Clone, Debug)]
pub struct MessageBundle {
    templates: HashMap<RuleKind, String>,
}

impl MessageBundle {
    /// An empty bundle. Unset kinds render a bare fallback.
    pub fn empty() -> Self {
        MessageBundle {
            templates: HashMap::new(),
        }
    }

    /// The builtin English bundle.
    pub fn en() -> Self {
        let mut bundle = Self::empty();
        bundle.set(RuleKind::Required, "{label} is required");
        bundle.set(RuleKind::Format, "{label} is not a valid {bound}");
        bundle.set(RuleKind::Min, "{label} must be at least {bound}");
        bundle.set(RuleKind::Max, "{label} must be at most {bound}");
        bundle.set(RuleKind::ExclusiveMin, "{label} must be greater than {bound}");
        bundle.set(RuleKind::ExclusiveMax, "{label} must be less than {bound}");
        bundle.set(RuleKind::MinLength, "{label} must have at least {bound} items");
        bundle.set(RuleKind::MaxLength, "{label} must have at most {bound} items");
        bundle.set(RuleKind::Pattern, "{label} does not match the expected pattern");
        bundle.set(RuleKind::Enum, "{label} must be one of the allowed values");
        bundle.set(RuleKind::Custom, "{label} is invalid");
        bundle
    }

    /// Set the template for one rule kind.
    pub fn set(&mut self, kind: RuleKind, template: impl Into<String>) {
        self.templates.insert(kind, template.into());
    }

    /// Render the message for `kind`, interpolating the field label and an
    /// optional bound (a numeric limit, a format name, ...).
    pub fn render(&self, kind: RuleKind, label: &str, bound: Option<&str>) -> String {
        match self.templates.get(&kind) {
            Some(template) => {
                let msg = template.replace("{label}", label);
                msg.replace("{bound}", bound.unwrap_or(""))
            }
            None => format!("{} is invalid", label),
        }
    }
}

impl Default for MessageBundle {
    fn default() -> Self {
        MessageBundle::en()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_templates_render() {
        let b = MessageBundle::en();
        assert_eq!(
            b.render(RuleKind::Required, "Email", None),
            "Email is required"
        );
        assert_eq!(
            b.render(RuleKind::Min, "Age", Some("18")),
            "Age must be at least 18"
        );
        assert_eq!(
            b.render(RuleKind::Format, "Email", Some("email")),
            "Email is not a valid email"
        );
    }

    #[test]
    fn missing_template_falls_back() {
        let b = MessageBundle::empty();
        assert_eq!(b.render(RuleKind::Enum, "Color", None), "Color is invalid");
    }

    #[test]
    fn custom_locale_overrides() {
        let mut b = MessageBundle::en();
        b.set(RuleKind::Required, "{label}不能为空");
        assert_eq!(b.render(RuleKind::Required, "邮箱", None), "邮箱不能为空");
    }
}
