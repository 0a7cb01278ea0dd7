//! The injected registry: format validators, locale messages, transports.
//!
//! One explicit object instead of process-wide singletons, so tests get
//! isolated instances (`Registry::new()` / `Registry::bare()`). Registration
//! happens at setup time; afterwards the registry is only read, so the form
//! holds it behind a plain `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::formats;
use crate::messages::MessageBundle;
use crate::transport::Transport;

/// A named format predicate over string values.
pub type FormatValidator = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Process setup state a form is constructed with.
pub struct Registry {
    formats: HashMap<String, FormatValidator>,
    messages: MessageBundle,
    transports: HashMap<String, Arc<dyn Transport>>,
}

impl Registry {
    /// A registry seeded with the builtin formats and the English message
    /// bundle. No transports are pre-registered.
    pub fn new() -> Self {
        let mut registry = Self::bare();
        formats::install(&mut registry);
        registry
    }

    /// A completely empty registry, for tests that assert unknown-name
    /// behavior.
    pub fn bare() -> Self {
        Registry {
            formats: HashMap::new(),
            messages: MessageBundle::en(),
            transports: HashMap::new(),
        }
    }

    /// Register (or replace) a named format validator.
    pub fn register_format(
        &mut self,
        name: impl Into<String>,
        validator: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) {
        self.formats.insert(name.into(), Arc::new(validator));
    }

    /// Look up a format validator. `None` means the name is unregistered,
    /// which validation treats as "skip this check".
    pub fn format(&self, name: &str) -> Option<&FormatValidator> {
        self.formats.get(name)
    }

    /// Register (or replace) a named transport adapter.
    pub fn register_transport(&mut self, name: impl Into<String>, transport: Arc<dyn Transport>) {
        self.transports.insert(name.into(), transport);
    }

    /// Look up a transport adapter by name.
    pub fn transport(&self, name: &str) -> Option<Arc<dyn Transport>> {
        self.transports.get(name).cloned()
    }

    /// Replace the locale message bundle.
    pub fn set_messages(&mut self, bundle: MessageBundle) {
        self.messages = bundle;
    }

    /// The active locale message bundle.
    pub fn messages(&self) -> &MessageBundle {
        &self.messages
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("formats", &self.formats.keys().collect::<Vec<_>>())
            .field("transports", &self.transports.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::RuleKind;
    use crate::transport::{RequestConfig, TransportError};
    use crate::value::Value;
    use async_trait::async_trait;

    #[test]
    fn builtins_are_seeded() {
        let r = Registry::new();
        for name in [
            "email",
            "url",
            "phone",
            "idcard",
            "ip",
            "ipv4",
            "ipv6",
            "number",
            "integer",
            "positive",
            "positiveInteger",
        ] {
            assert!(r.format(name).is_some(), "missing builtin {:?}", name);
        }
    }

    #[test]
    fn bare_registry_has_no_formats() {
        let r = Registry::bare();
        assert!(r.format("email").is_none());
    }

    #[test]
    fn custom_format_registration() {
        let mut r = Registry::bare();
        r.register_format("even_len", |s| s.len() % 2 == 0);
        assert!(r.format("even_len").unwrap()("ab"));
        assert!(!r.format("even_len").unwrap()("abc"));
    }

    #[test]
    fn message_bundle_swap() {
        let mut r = Registry::new();
        let mut bundle = MessageBundle::en();
        bundle.set(RuleKind::Required, "need {label}");
        r.set_messages(bundle);
        assert_eq!(
            r.messages().render(RuleKind::Required, "name", None),
            "need name"
        );
    }

    struct Fixed;

    #[async_trait]
    impl Transport for Fixed {
        async fn request(&self, _: &RequestConfig) -> Result<Value, TransportError> {
            Ok(Value::Null)
        }
    }

    #[test]
    fn transport_lookup() {
        let mut r = Registry::new();
        assert!(r.transport("http").is_none());
        r.register_transport("http", Arc::new(Fixed));
        assert!(r.transport("http").is_some());
    }
}
