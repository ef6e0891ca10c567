//! Request context attached to reports.
//!
//! # Responsibilities
//! - Hold arbitrary request values behind their `Debug` capability
//! - Carry an out-of-band fault recorded by the handler
//! - Render values for `_env_<key>` fields, one key at a time
//!
//! # Design Decisions
//! - Values are shared (`Arc`), so snapshots are cheap to clone into futures
//! - A value whose `Debug` impl fails or panics is skipped, never fatal

use std::collections::BTreeMap;
use std::fmt::{self, Write};
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::request::Parts;
use axum::http::Request;

use crate::report::fault::{clear_recorded_panic, Fault};

type EnvValue = Arc<dyn fmt::Debug + Send + Sync>;

/// Key/value context of one request.
#[derive(Clone, Default)]
pub struct RequestEnv {
    entries: BTreeMap<String, EnvValue>,
    fault: Option<Fault>,
}

impl RequestEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the reportable parts of an HTTP request.
    ///
    /// Entries of a `RequestEnv` found in the request extensions are merged
    /// in, so upstream middleware can contribute context.
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let mut env = Self::new();
        env.insert("method", request.method().clone());
        env.insert("uri", request.uri().clone());
        env.insert("version", request.version());
        env.insert("headers", request.headers().clone());
        env.absorb_extensions(request.extensions());
        env
    }

    /// Same as [`RequestEnv::from_request`] for already split requests.
    pub fn from_parts(parts: &Parts) -> Self {
        let mut env = Self::new();
        env.insert("method", parts.method.clone());
        env.insert("uri", parts.uri.clone());
        env.insert("version", parts.version);
        env.insert("headers", parts.headers.clone());
        env.absorb_extensions(&parts.extensions);
        env
    }

    fn absorb_extensions(&mut self, extensions: &axum::http::Extensions) {
        if let Some(ConnectInfo(addr)) = extensions.get::<ConnectInfo<SocketAddr>>() {
            self.insert("remote_addr", *addr);
        }
        if let Some(upstream) = extensions.get::<RequestEnv>() {
            for (key, value) in &upstream.entries {
                self.entries.insert(key.clone(), Arc::clone(value));
            }
        }
    }

    /// Insert or replace an entry.
    pub fn insert<V>(&mut self, key: impl Into<String>, value: V)
    where
        V: fmt::Debug + Send + Sync + 'static,
    {
        self.entries.insert(key.into(), Arc::new(value));
    }

    pub fn with<V>(mut self, key: impl Into<String>, value: V) -> Self
    where
        V: fmt::Debug + Send + Sync + 'static,
    {
        self.insert(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Record an error that was handled inside the pipeline but should still
    /// be reported.
    pub fn record_fault(&mut self, fault: Fault) {
        self.fault = Some(fault);
    }

    pub fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    pub fn take_fault(&mut self) -> Option<Fault> {
        self.fault.take()
    }

    /// Render every entry with its `Debug` impl.
    ///
    /// Entries that fail to render are left out; the second element counts
    /// them.
    pub fn render(&self) -> (Vec<(String, String)>, usize) {
        let mut rendered = Vec::with_capacity(self.entries.len());
        let mut skipped = 0;
        for (key, value) in &self.entries {
            match render_debug(&**value) {
                Some(text) => rendered.push((key.clone(), text)),
                None => {
                    tracing::debug!(key = %key, "Skipping request value that failed to render");
                    skipped += 1;
                }
            }
        }
        (rendered, skipped)
    }
}

impl fmt::Debug for RequestEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestEnv")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .field("fault", &self.fault)
            .finish()
    }
}

/// `Debug` rendering of one value, or `None` if its impl returns an error
/// or panics.
pub fn render_debug(value: &(dyn fmt::Debug + Send + Sync)) -> Option<String> {
    let rendered = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut text = String::new();
        write!(text, "{:?}", value).ok().map(|_| text)
    }));
    match rendered {
        Ok(text) => text,
        Err(_) => {
            clear_recorded_panic();
            None
        }
    }
}
