//! Context resolution
//!
//! Every record's context is built from three layers, later layers winning
//! on key conflicts:
//!
//! 1. the static context configured on the logger (a source name or a
//!    factory closure receiving the current request),
//! 2. fields derived from the current request, when there is one,
//! 3. the context passed to the logging call.
//!
//! Empty values are stripped from the result.

use super::log_context::{CallContext, LogContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Read-only view of the inbound request a record is logged for.
///
/// HTTP framework adapters fill this in; the logger never mutates it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub method: Option<String>,
    /// Original path plus query string
    pub url: Option<String>,
    /// Parsed query parameters
    pub query: Value,
    /// Parsed request body
    pub body: Value,
}

impl RequestInfo {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<Value>) -> Self {
        self.query = query.into();
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Value>) -> Self {
        self.body = body.into();
        self
    }

    /// The `ip`, `ua`, `method`, `url`, `query` and `body` fields
    pub fn to_context(&self) -> LogContext {
        let text = |v: &Option<String>| v.clone().map(Value::String).unwrap_or(Value::Null);

        LogContext::new()
            .with_field("ip", text(&self.ip))
            .with_field("ua", text(&self.user_agent))
            .with_field("method", text(&self.method))
            .with_field("url", text(&self.url))
            .with_field("query", self.query.clone())
            .with_field("body", self.body.clone())
    }
}

/// Builds base fields from the current request
pub type ContextFactory = Arc<dyn Fn(&RequestInfo) -> LogContext + Send + Sync>;

/// Context configured once on the logger
#[derive(Clone)]
pub enum StaticContext {
    Source(String),
    Factory(ContextFactory),
}

impl StaticContext {
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn(&RequestInfo) -> LogContext + Send + Sync + 'static,
    {
        StaticContext::Factory(Arc::new(f))
    }

    fn build(&self, request: Option<&RequestInfo>) -> LogContext {
        match self {
            StaticContext::Source(name) => LogContext::named(name.clone()),
            StaticContext::Factory(factory) => match request {
                Some(request) => factory(request),
                None => factory(&RequestInfo::default()),
            },
        }
    }
}

impl fmt::Debug for StaticContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaticContext::Source(name) => f.debug_tuple("Source").field(name).finish(),
            StaticContext::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

impl From<&str> for StaticContext {
    fn from(name: &str) -> Self {
        StaticContext::Source(name.to_string())
    }
}

impl From<String> for StaticContext {
    fn from(name: String) -> Self {
        StaticContext::Source(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContextResolver {
    static_context: Option<StaticContext>,
}

impl ContextResolver {
    pub fn new(static_context: Option<StaticContext>) -> Self {
        Self { static_context }
    }

    pub fn static_context(&self) -> Option<&StaticContext> {
        self.static_context.as_ref()
    }

    /// Merge static < request-derived < call context and strip empty values
    pub fn resolve(&self, call: impl Into<CallContext>, request: Option<&RequestInfo>) -> LogContext {
        let mut context = self
            .static_context
            .as_ref()
            .map(|s| s.build(request))
            .unwrap_or_default();

        if let Some(request) = request {
            context.merge(request.to_context());
        }

        context.merge(call.into().into_context());
        context.without_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> LogContext {
        match value {
            Value::Object(map) => map.into(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_call_context_wins() {
        let resolver = ContextResolver::new(Some(StaticContext::factory(|_| {
            LogContext::new().with_field("a", 1)
        })));

        let ctx = resolver.resolve(fields(json!({"a": 2})), None);
        assert_eq!(ctx, fields(json!({"a": 2})));
    }

    #[test]
    fn test_empty_values_are_stripped() {
        let resolver = ContextResolver::default();
        let ctx = resolver.resolve(fields(json!({"a": "", "b": 0, "c": []})), None);
        assert_eq!(ctx, fields(json!({"b": 0})));
    }

    #[test]
    fn test_string_call_context_is_source_name() {
        let resolver = ContextResolver::new(Some("App".into()));
        assert_eq!(resolver.resolve((), None).source(), Some("App"));
        assert_eq!(resolver.resolve("Users", None).source(), Some("Users"));
    }

    #[test]
    fn test_request_fields_are_added() {
        let request = RequestInfo::new("POST", "/orders?draft=1")
            .with_ip("10.0.0.7")
            .with_user_agent("curl/8.0")
            .with_query(json!({"draft": "1"}))
            .with_body(json!({"sku": "A-1"}));

        let ctx = ContextResolver::default().resolve((), Some(&request));

        assert_eq!(ctx.get("ip"), Some(&json!("10.0.0.7")));
        assert_eq!(ctx.get("ua"), Some(&json!("curl/8.0")));
        assert_eq!(ctx.get("method"), Some(&json!("POST")));
        assert_eq!(ctx.get("url"), Some(&json!("/orders?draft=1")));
        assert_eq!(ctx.get("query"), Some(&json!({"draft": "1"})));
        assert_eq!(ctx.get("body"), Some(&json!({"sku": "A-1"})));
    }

    #[test]
    fn test_missing_request_omits_request_fields() {
        let request = RequestInfo::new("GET", "/health");
        let ctx = ContextResolver::default().resolve((), Some(&request));

        assert!(!ctx.contains_key("ip"));
        assert!(!ctx.contains_key("body"));

        let ctx = ContextResolver::default().resolve((), None);
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_layer_precedence() {
        let resolver = ContextResolver::new(Some(StaticContext::factory(|req| {
            LogContext::new()
                .with_field("method", "static")
                .with_field("tenant", req.ip.clone().unwrap_or_default())
        })));
        let request = RequestInfo::new("GET", "/").with_ip("1.2.3.4");

        let ctx = resolver.resolve(LogContext::new().with_field("url", "/override"), Some(&request));

        // request beats static, call beats request
        assert_eq!(ctx.get("method"), Some(&json!("GET")));
        assert_eq!(ctx.get("url"), Some(&json!("/override")));
        assert_eq!(ctx.get("tenant"), Some(&json!("1.2.3.4")));
    }

    #[test]
    fn test_factory_without_request_gets_default() {
        let resolver = ContextResolver::new(Some(StaticContext::factory(|req| {
            LogContext::new().with_field("has_method", req.method.is_some())
        })));

        assert_eq!(resolver.resolve((), None).get("has_method"), Some(&json!(false)));
    }
}
