//! The transport seam between the loader and the network.
//!
//! The core never performs I/O itself; data-source loads go through a named
//! [`Transport`] looked up from the registry. `reform-source` ships an HTTP
//! implementation; tests plug in scripted ones.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// HTTP-ish method for a data-source request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
}

/// A fully-resolved request: url plus resolved (non-template) params.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestConfig {
    pub url: String,
    #[serde(default)]
    pub method: Method,
    /// Resolved key/value parameters. `BTreeMap` so cache keys are stable.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl RequestConfig {
    pub fn get(url: impl Into<String>) -> Self {
        RequestConfig {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

/// Errors a transport adapter can surface.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("request failed: {message}")]
    Failed { message: String },

    #[error("HTTP status {status}")]
    Status { status: u16 },

    #[error("invalid response body: {message}")]
    InvalidBody { message: String },
}

/// A pluggable request executor.
///
/// # Object Safety
///
/// This trait is object-safe: the registry stores `Arc<dyn Transport>`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute the request and return the parsed response body.
    async fn request(&self, config: &RequestConfig) -> Result<Value, TransportError>;
}
