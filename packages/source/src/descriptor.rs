//! Declarative description of a remote option source.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reform_core::{DataOption, Method, Value};
use reform_path::Path;

/// Caching policy for a data source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CachePolicy {
    /// Every load hits the transport.
    #[default]
    Off,
    /// Cache forever per (url, resolved params).
    On,
    /// Cache with a time-to-live.
    Ttl(Duration),
}

/// Custom mapping from a raw response to options, overriding the
/// label/value field extraction.
pub type TransformFn = Arc<dyn Fn(&Value) -> Vec<DataOption> + Send + Sync>;

/// Where and how to load a field's options.
///
/// `params` values may be templates: a value of the form `$values.<path>`
/// is resolved against the current form values at load time, which is what
/// makes cascading selects declarative (`model` loads with
/// `brand = $values.vehicle.brand`).
#[derive(Clone, Default)]
pub struct DataSourceDescriptor {
    pub url: String,
    pub method: Method,
    pub params: BTreeMap<String, String>,
    /// Name of the transport adapter in the registry.
    pub adapter: String,
    /// Path of the label inside each response row.
    pub label_field: Path,
    /// Path of the value inside each response row.
    pub value_field: Path,
    pub transform: Option<TransformFn>,
    pub cache: CachePolicy,
    /// Wait before issuing the request; a newer load for the same field
    /// cancels the wait.
    pub debounce: Option<Duration>,
}

impl DataSourceDescriptor {
    pub fn new(adapter: impl Into<String>, url: impl Into<String>) -> Self {
        DataSourceDescriptor {
            url: url.into(),
            adapter: adapter.into(),
            label_field: Path::parse("label"),
            value_field: Path::parse("value"),
            ..Default::default()
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn label_field(mut self, path: impl Into<Path>) -> Self {
        self.label_field = path.into();
        self
    }

    pub fn value_field(mut self, path: impl Into<Path>) -> Self {
        self.value_field = path.into();
        self
    }

    pub fn transform(mut self, f: impl Fn(&Value) -> Vec<DataOption> + Send + Sync + 'static) -> Self {
        self.transform = Some(Arc::new(f));
        self
    }

    pub fn cache(mut self, policy: CachePolicy) -> Self {
        self.cache = policy;
        self
    }

    pub fn debounce(mut self, delay: Duration) -> Self {
        self.debounce = Some(delay);
        self
    }
}

impl std::fmt::Debug for DataSourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSourceDescriptor")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("params", &self.params)
            .field("adapter", &self.adapter)
            .field("label_field", &self.label_field.to_string())
            .field("value_field", &self.value_field.to_string())
            .field("has_transform", &self.transform.is_some())
            .field("cache", &self.cache)
            .field("debounce", &self.debounce)
            .finish()
    }
}
