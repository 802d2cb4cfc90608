//! Typed fetch request descriptor
//!
//! A [`FetchRequest`] carries everything one logical fetch needs, so the
//! client can retry it from the start without re-deriving anything.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;
use staleguard_common::time::TimeWindow;
use staleguard_domain::{ClientError, Result};

/// Restrict a resource to a set of ids: `field=id1,id2`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdFilter {
    pub field: String,
    pub ids: Vec<String>,
}

impl IdFilter {
    pub fn new<I, S>(field: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { field: field.into(), ids: ids.into_iter().map(Into::into).collect() }
    }
}

impl FromStr for IdFilter {
    type Err = ClientError;

    /// Parse `field=a,b,c`
    fn from_str(s: &str) -> Result<Self> {
        let (field, ids) = s
            .split_once('=')
            .ok_or_else(|| ClientError::InvalidInput(format!("filter '{s}' must be field=id,...")))?;
        let field = field.trim();
        if field.is_empty() {
            return Err(ClientError::InvalidInput(format!("filter '{s}' has no field name")));
        }
        let ids = ids.split(',').map(str::trim).filter(|id| !id.is_empty());
        Ok(Self::new(field, ids))
    }
}

/// Ordered id filters appended to the query string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdFilters(Vec<IdFilter>);

impl IdFilters {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, filter: IdFilter) -> Self {
        self.push(filter);
        self
    }

    pub fn push(&mut self, filter: IdFilter) {
        self.0.push(filter);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IdFilter> {
        self.0.iter()
    }
}

impl FromIterator<IdFilter> for IdFilters {
    fn from_iter<T: IntoIterator<Item = IdFilter>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

type TransformFn = dyn Fn(Value) -> Value + Send + Sync;

/// Pure reshaping applied to every payload, live or cached
#[derive(Clone, Default)]
pub struct Transform(Option<Arc<TransformFn>>);

impl Transform {
    /// Return payloads unchanged
    pub fn identity() -> Self {
        Self(None)
    }

    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self(Some(Arc::new(f)))
    }

    /// Keep only `payload[field]`, `null` when absent
    pub fn pluck(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(move |mut payload| payload.get_mut(&field).map(Value::take).unwrap_or(Value::Null))
    }

    pub fn apply(&self, payload: Value) -> Value {
        match &self.0 {
            Some(f) => f(payload),
            None => payload,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_identity() { "Transform(identity)" } else { "Transform(fn)" })
    }
}

/// One logical fetch: where to go, where to cache, and how to reshape
#[derive(Debug, Clone)]
pub struct FetchRequest {
    resource_path: String,
    cache_key: String,
    filters: IdFilters,
    window: Option<TimeWindow>,
    transform: Transform,
}

impl FetchRequest {
    /// Fetch `resource_path`, caching under the path itself
    pub fn new(resource_path: impl Into<String>) -> Self {
        let resource_path = resource_path.into();
        Self {
            cache_key: resource_path.clone(),
            resource_path,
            filters: IdFilters::new(),
            window: None,
            transform: Transform::identity(),
        }
    }

    #[must_use]
    pub fn with_cache_key(mut self, cache_key: impl Into<String>) -> Self {
        self.cache_key = cache_key.into();
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: IdFilter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn with_filters(mut self, filters: IdFilters) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Restrict to an interval descriptor such as `P7D` or `today`
    ///
    /// # Errors
    /// [`ClientError::InvalidInput`] when the descriptor does not parse.
    pub fn with_interval(self, interval: &str) -> Result<Self> {
        let window = interval
            .parse::<TimeWindow>()
            .map_err(|e| ClientError::InvalidInput(e.to_string()))?;
        Ok(self.with_window(window))
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    pub fn filters(&self) -> &IdFilters {
        &self.filters
    }

    pub fn window(&self) -> Option<TimeWindow> {
        self.window
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }
}
