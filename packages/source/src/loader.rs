//! The data-source loader.
//!
//! Each call runs one field's load through a fixed lifecycle:
//! `idle -> pending -> resolved | superseded | errored`. A generation token
//! from the target [`FieldCell`] decides which outcome applies: if a newer
//! load for the same field started while this one was in flight, the result
//! is discarded without touching field state, whatever order the network
//! answered in. `superseded` therefore needs no cancellation support from
//! the transport.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use reform_core::{DataOption, FieldCell, Registry, RequestConfig, Value};
use reform_path::Path;

use crate::descriptor::{CachePolicy, DataSourceDescriptor};
use crate::error::SourceError;

/// Prefix marking a param value as a path into the form values.
const VALUES_TEMPLATE: &str = "$values.";

struct CacheEntry {
    options: Vec<DataOption>,
    stored_at: Instant,
}

/// Loads remote option lists with caching and staleness rejection.
///
/// One loader serves a whole form; per-field ordering lives in the field's
/// generation counter, so loads for different fields are freely concurrent.
pub struct SourceLoader {
    registry: Arc<Registry>,
    cache: Mutex<HashMap<String, CacheEntry>>,
}

impl SourceLoader {
    pub fn new(registry: Arc<Registry>) -> Self {
        SourceLoader {
            registry,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Load options for `field` per `descriptor`, resolving param templates
    /// against `values`.
    ///
    /// Returns `Ok(())` both on success and when the result was superseded
    /// by a newer load; `Err` only for a failure that is still current, in
    /// which case `loading` is cleared and the previous `data_source` is
    /// left untouched.
    pub async fn load(
        &self,
        field: &FieldCell,
        descriptor: &DataSourceDescriptor,
        values: &Value,
    ) -> Result<(), SourceError> {
        let token = field.begin_load();
        self.load_with_token(field, descriptor, values, token).await
    }

    /// Like [`SourceLoader::load`], but with a generation token reserved
    /// earlier via [`FieldCell::begin_load`].
    ///
    /// Reserving at issuance pins the supersession order to the order the
    /// loads were requested in, even when their tasks are scheduled out of
    /// order. A token that is already stale on entry resolves `Ok` without
    /// touching the field or the transport.
    pub async fn load_with_token(
        &self,
        field: &FieldCell,
        descriptor: &DataSourceDescriptor,
        values: &Value,
        token: u64,
    ) -> Result<(), SourceError> {
        if !field.is_current(token) {
            return Ok(());
        }
        let params = resolve_params(descriptor, values);
        let cache_key = cache_key(&descriptor.url, &params);

        if let Some(options) = self.cache_probe(descriptor.cache, &cache_key) {
            tracing::trace!(url = %descriptor.url, "data source served from cache");
            field.complete_load(token, options);
            return Ok(());
        }

        if let Some(delay) = descriptor.debounce {
            tokio::time::sleep(delay).await;
            if !field.is_current(token) {
                // A newer load started during the debounce window.
                return Ok(());
            }
        }

        let Some(transport) = self.registry.transport(&descriptor.adapter) else {
            field.fail_load(token);
            return Err(SourceError::UnknownAdapter {
                name: descriptor.adapter.clone(),
            });
        };

        let config = RequestConfig {
            url: descriptor.url.clone(),
            method: descriptor.method,
            params,
        };
        let result = transport.request(&config).await;

        if !field.is_current(token) {
            tracing::debug!(url = %descriptor.url, token, "stale data source response discarded");
            return Ok(());
        }

        match result {
            Ok(body) => {
                let options = match &descriptor.transform {
                    Some(transform) => transform(&body),
                    None => map_rows(&body, &descriptor.label_field, &descriptor.value_field),
                };
                if descriptor.cache != CachePolicy::Off {
                    self.cache.lock().unwrap_or_else(|e| e.into_inner()).insert(
                        cache_key,
                        CacheEntry {
                            options: options.clone(),
                            stored_at: Instant::now(),
                        },
                    );
                }
                field.complete_load(token, options);
                Ok(())
            }
            Err(e) => {
                field.fail_load(token);
                Err(SourceError::Transport(e))
            }
        }
    }

    fn cache_probe(&self, policy: CachePolicy, key: &str) -> Option<Vec<DataOption>> {
        let ttl = match policy {
            CachePolicy::Off => return None,
            CachePolicy::On => None,
            CachePolicy::Ttl(ttl) => Some(ttl),
        };
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        match cache.get(key) {
            Some(entry) => {
                if let Some(ttl) = ttl {
                    if entry.stored_at.elapsed() > ttl {
                        cache.remove(key);
                        return None;
                    }
                }
                Some(entry.options.clone())
            }
            None => None,
        }
    }

    /// Drop every cached result (e.g. after registry reconfiguration).
    pub fn clear_cache(&self) {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

/// Substitute `$values.<path>` templates with the current form values.
fn resolve_params(
    descriptor: &DataSourceDescriptor,
    values: &Value,
) -> std::collections::BTreeMap<String, String> {
    descriptor
        .params
        .iter()
        .map(|(name, template)| {
            let resolved = match template.strip_prefix(VALUES_TEMPLATE) {
                Some(path) => values.get_or_null(&Path::parse(path)).to_display_string(),
                None => template.clone(),
            };
            (name.clone(), resolved)
        })
        .collect()
}

fn cache_key(url: &str, params: &std::collections::BTreeMap<String, String>) -> String {
    // BTreeMap iteration is sorted, so equal param sets key identically.
    let mut key = String::from(url);
    for (name, value) in params {
        key.push('\u{1}');
        key.push_str(name);
        key.push('\u{2}');
        key.push_str(value);
    }
    key
}

/// Extract option rows from a response body: a top-level array, or the
/// array under a `data` key. Anything else yields no options.
fn extract_rows(body: &Value) -> &[Value] {
    match body {
        Value::Array(rows) => rows,
        Value::Map(map) => match map.get("data") {
            Some(Value::Array(rows)) => rows,
            _ => &[],
        },
        _ => &[],
    }
}

/// Map rows into options. Map-shaped rows go through the label/value field
/// paths (plus an optional `disabled` flag); primitive rows serve as both
/// label and value.
fn map_rows(body: &Value, label_field: &Path, value_field: &Path) -> Vec<DataOption> {
    extract_rows(body)
        .iter()
        .map(|row| match row {
            Value::Map(_) => DataOption {
                label: row.get_or_null(label_field).to_display_string(),
                value: row.get_or_null(value_field),
                disabled: row
                    .get(&Path::parse("disabled"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            },
            primitive => DataOption {
                label: primitive.to_display_string(),
                value: primitive.clone(),
                disabled: false,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reform_core::{FieldState, Transport, TransportError};
    use reform_path::path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn field() -> FieldCell {
        FieldCell::new(FieldState::new(path!("vehicle.model")))
    }

    fn rows_body() -> Value {
        Value::from(serde_json::json!([
            {"label": "Alpha", "value": "a"},
            {"label": "Beta", "value": "b", "disabled": true}
        ]))
    }

    #[test]
    fn param_templates_resolve_against_values() {
        let values = Value::from(serde_json::json!({"vehicle": {"brand": "bmw"}}));
        let d = DataSourceDescriptor::new("http", "u")
            .with_param("brand", "$values.vehicle.brand")
            .with_param("limit", "10");
        let params = resolve_params(&d, &values);
        assert_eq!(params.get("brand").map(String::as_str), Some("bmw"));
        assert_eq!(params.get("limit").map(String::as_str), Some("10"));
    }

    #[test]
    fn missing_template_path_resolves_empty() {
        let values = Value::map();
        let d = DataSourceDescriptor::new("http", "u").with_param("brand", "$values.nope");
        assert_eq!(
            resolve_params(&d, &values).get("brand").map(String::as_str),
            Some("")
        );
    }

    #[test]
    fn row_extraction_shapes() {
        assert_eq!(extract_rows(&rows_body()).len(), 2);
        let wrapped = Value::from(serde_json::json!({"data": [1, 2, 3]}));
        assert_eq!(extract_rows(&wrapped).len(), 3);
        assert!(extract_rows(&Value::from("scalar")).is_empty());
        assert!(extract_rows(&Value::from(serde_json::json!({"items": []}))).is_empty());
    }

    #[test]
    fn row_mapping() {
        let options = map_rows(&rows_body(), &path!("label"), &path!("value"));
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].label, "Alpha");
        assert_eq!(options[0].value, Value::from("a"));
        assert!(!options[0].disabled);
        assert!(options[1].disabled);

        let primitives = Value::from(serde_json::json!(["x", "y"]));
        let options = map_rows(&primitives, &path!("label"), &path!("value"));
        assert_eq!(options[0].label, "x");
        assert_eq!(options[0].value, Value::from("x"));
    }

    /// Transport that sleeps for `delay_ms` then answers with labeled rows,
    /// counting how many requests it served.
    struct Scripted {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn request(&self, config: &RequestConfig) -> Result<Value, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = config.params.get("delay_ms") {
                let ms: u64 = delay.parse().unwrap();
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }
            if config.params.get("fail").is_some() {
                return Err(TransportError::Status { status: 500 });
            }
            let tag = config
                .params
                .get("tag")
                .cloned()
                .unwrap_or_else(|| "row".to_string());
            Ok(Value::from(serde_json::json!([
                {"label": tag, "value": tag}
            ])))
        }
    }

    fn loader_with_scripted() -> (SourceLoader, Arc<Scripted>) {
        let transport = Arc::new(Scripted {
            calls: AtomicUsize::new(0),
        });
        let mut registry = Registry::new();
        registry.register_transport("scripted", transport.clone());
        (SourceLoader::new(Arc::new(registry)), transport)
    }

    #[tokio::test]
    async fn successful_load_populates_options() {
        let (loader, _) = loader_with_scripted();
        let field = field();
        let d = DataSourceDescriptor::new("scripted", "u").with_param("tag", "one");
        loader.load(&field, &d, &Value::map()).await.unwrap();
        let s = field.snapshot();
        assert!(!s.loading);
        assert_eq!(s.data_source.len(), 1);
        assert_eq!(s.data_source[0].label, "one");
    }

    #[tokio::test]
    async fn late_first_response_is_discarded() {
        let (loader, _) = loader_with_scripted();
        let field = field();
        let slow = DataSourceDescriptor::new("scripted", "u")
            .with_param("tag", "stale")
            .with_param("delay_ms", "80");
        let fast = DataSourceDescriptor::new("scripted", "u").with_param("tag", "fresh");

        let values = Value::map();
        let slow_load = loader.load(&field, &slow, &values);
        let fast_load = async {
            // Let the slow request issue first.
            tokio::time::sleep(Duration::from_millis(10)).await;
            loader.load(&field, &fast, &Value::map()).await
        };
        let (slow_result, fast_result) = tokio::join!(slow_load, fast_load);
        slow_result.unwrap();
        fast_result.unwrap();

        let s = field.snapshot();
        assert_eq!(s.data_source.len(), 1);
        assert_eq!(s.data_source[0].label, "fresh");
        assert!(!s.loading);
    }

    #[tokio::test]
    async fn pre_reserved_tokens_order_loads_by_issue_order() {
        let (loader, transport) = loader_with_scripted();
        let field = field();
        let slow = DataSourceDescriptor::new("scripted", "u")
            .with_param("tag", "stale")
            .with_param("delay_ms", "80");
        let fast = DataSourceDescriptor::new("scripted", "u").with_param("tag", "fresh");

        // Both tokens reserved up front, in issue order, before either
        // request runs.
        let slow_token = field.begin_load();
        let fast_token = field.begin_load();

        // The later-issued load runs first; the earlier one must still lose.
        loader
            .load_with_token(&field, &fast, &Value::map(), fast_token)
            .await
            .unwrap();
        loader
            .load_with_token(&field, &slow, &Value::map(), slow_token)
            .await
            .unwrap();

        // The stale load bailed on entry without a transport call.
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        let s = field.snapshot();
        assert_eq!(s.data_source.len(), 1);
        assert_eq!(s.data_source[0].label, "fresh");
        assert!(!s.loading);
    }

    #[tokio::test]
    async fn transport_failure_keeps_previous_options() {
        let (loader, _) = loader_with_scripted();
        let field = field();
        let good = DataSourceDescriptor::new("scripted", "u").with_param("tag", "kept");
        loader.load(&field, &good, &Value::map()).await.unwrap();

        let bad = DataSourceDescriptor::new("scripted", "u").with_param("fail", "1");
        let err = loader.load(&field, &bad, &Value::map()).await.unwrap_err();
        assert!(matches!(err, SourceError::Transport(_)));

        let s = field.snapshot();
        assert!(!s.loading);
        assert_eq!(s.data_source[0].label, "kept");
    }

    #[tokio::test]
    async fn unknown_adapter_is_an_error() {
        let (loader, _) = loader_with_scripted();
        let field = field();
        let d = DataSourceDescriptor::new("nope", "u");
        let err = loader.load(&field, &d, &Value::map()).await.unwrap_err();
        assert!(matches!(err, SourceError::UnknownAdapter { .. }));
        assert!(!field.snapshot().loading);
    }

    #[tokio::test]
    async fn cache_hit_skips_transport() {
        let (loader, transport) = loader_with_scripted();
        let field = field();
        let d = DataSourceDescriptor::new("scripted", "u")
            .with_param("tag", "cached")
            .cache(CachePolicy::On);
        loader.load(&field, &d, &Value::map()).await.unwrap();
        loader.load(&field, &d, &Value::map()).await.unwrap();
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(field.snapshot().data_source[0].label, "cached");
    }

    #[tokio::test]
    async fn cache_keys_include_resolved_params() {
        let (loader, transport) = loader_with_scripted();
        let field = field();
        let d = DataSourceDescriptor::new("scripted", "u")
            .with_param("tag", "$values.brand")
            .cache(CachePolicy::On);
        let bmw = Value::from(serde_json::json!({"brand": "bmw"}));
        let audi = Value::from(serde_json::json!({"brand": "audi"}));
        loader.load(&field, &d, &bmw).await.unwrap();
        loader.load(&field, &d, &audi).await.unwrap();
        // Different resolved params are different cache entries.
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
        loader.load(&field, &d, &bmw).await.unwrap();
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
        assert_eq!(field.snapshot().data_source[0].label, "bmw");
    }

    #[tokio::test]
    async fn ttl_cache_expires() {
        let (loader, transport) = loader_with_scripted();
        let field = field();
        let d = DataSourceDescriptor::new("scripted", "u")
            .with_param("tag", "ttl")
            .cache(CachePolicy::Ttl(Duration::from_millis(30)));
        loader.load(&field, &d, &Value::map()).await.unwrap();
        loader.load(&field, &d, &Value::map()).await.unwrap();
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        loader.load(&field, &d, &Value::map()).await.unwrap();
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn debounced_load_superseded_during_wait() {
        let (loader, transport) = loader_with_scripted();
        let field = field();
        let debounced = DataSourceDescriptor::new("scripted", "u")
            .with_param("tag", "early")
            .debounce(Duration::from_millis(60));
        let immediate = DataSourceDescriptor::new("scripted", "u").with_param("tag", "late-call");

        let values = Value::map();
        let first = loader.load(&field, &debounced, &values);
        let second = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            loader.load(&field, &immediate, &Value::map()).await
        };
        let (first_result, second_result) = tokio::join!(first, second);
        first_result.unwrap();
        second_result.unwrap();

        // The debounced call never reached the transport.
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(field.snapshot().data_source[0].label, "late-call");
    }

    #[tokio::test]
    async fn transform_overrides_field_mapping() {
        let (loader, _) = loader_with_scripted();
        let field = field();
        let d = DataSourceDescriptor::new("scripted", "u")
            .with_param("tag", "raw")
            .transform(|body| {
                extract_rows(body)
                    .iter()
                    .map(|row| {
                        DataOption::new(
                            format!("#{}", row.get_or_null(&path!("label")).to_display_string()),
                            row.get_or_null(&path!("value")),
                        )
                    })
                    .collect()
            });
        loader.load(&field, &d, &Value::map()).await.unwrap();
        assert_eq!(field.snapshot().data_source[0].label, "#raw");
    }
}
