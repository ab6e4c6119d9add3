//! Main logger implementation

use super::{
    appender::Appender,
    context_resolver::{ContextResolver, RequestInfo, StaticContext},
    error::{LoggerError, Result},
    events::{self, DeliveryEvent},
    log_context::{is_empty_value, CallContext, LogContext, SOURCE_KEY},
    log_entry::{LogRecord, Message},
    log_level::{LevelFilter, LogLevel},
    output_format::{PayloadTransform, RecordFormatter},
};
use crate::appenders::{
    ConsoleAppender, DailyRotateFileAppender, DailyRotateOptions, HttpAppender, HttpOptions,
};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};

/// Logging facade: one method per severity, console plus structured sinks.
///
/// Calls below the threshold return without touching any sink. Calls at or
/// above it are written to the console synchronously and queued, fire and
/// forget, to every structured sink. Each sink receives records in call order.
pub struct Logger {
    filter: LevelFilter,
    base_context: LogContext,
    resolver: ContextResolver,
    console: Option<ConsoleAppender>,
    sinks: Vec<SinkWorker>,
    events: broadcast::Sender<DeliveryEvent>,
}

impl Logger {
    /// Console-only logger with the default `verbose` threshold
    #[must_use]
    pub fn new() -> Self {
        Self {
            filter: LevelFilter::default(),
            base_context: LogContext::new(),
            resolver: ContextResolver::default(),
            console: Some(ConsoleAppender::new()),
            sinks: Vec::new(),
            events: events::channel(),
        }
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use rust_context_logger::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .level(LogLevel::Debug)
    ///     .context("Bootstrap")
    ///     .build()
    ///     .unwrap();
    /// logger.log("ready", ());
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Update the threshold from a level name; unknown names are ignored
    pub fn set_level(&self, name: &str) {
        self.filter.set_level(name);
    }

    pub fn set_min_level(&self, level: LogLevel) {
        self.filter.set_min_level(level);
    }

    pub fn level(&self) -> LogLevel {
        self.filter.threshold()
    }

    /// Receive one [`DeliveryEvent`] per structured delivery attempt
    pub fn subscribe(&self) -> broadcast::Receiver<DeliveryEvent> {
        self.events.subscribe()
    }

    pub fn appender_count(&self) -> usize {
        self.sinks.len()
    }

    /// View of this logger bound to one inbound request
    pub fn for_request(&self, request: RequestInfo) -> RequestLogger<'_> {
        RequestLogger {
            logger: self,
            request: Some(request),
            default_source: None,
        }
    }

    /// View of this logger that fills in `source` when a call names none
    pub fn scoped(&self, source: impl Into<String>) -> RequestLogger<'_> {
        RequestLogger {
            logger: self,
            request: None,
            default_source: Some(source.into()),
        }
    }

    pub fn error(&self, message: impl Into<Message>, trace: Option<&str>, context: impl Into<CallContext>) {
        self.emit(LogLevel::Error, message.into(), trace, context.into(), None);
    }

    pub fn warn(&self, message: impl Into<Message>, context: impl Into<CallContext>) {
        self.emit(LogLevel::Warn, message.into(), None, context.into(), None);
    }

    pub fn log(&self, message: impl Into<Message>, context: impl Into<CallContext>) {
        self.emit(LogLevel::Log, message.into(), None, context.into(), None);
    }

    pub fn debug(&self, message: impl Into<Message>, context: impl Into<CallContext>) {
        self.emit(LogLevel::Debug, message.into(), None, context.into(), None);
    }

    pub fn verbose(&self, message: impl Into<Message>, context: impl Into<CallContext>) {
        self.emit(LogLevel::Verbose, message.into(), None, context.into(), None);
    }

    /// Log at an explicit level
    pub fn log_at(&self, level: LogLevel, message: impl Into<Message>, context: impl Into<CallContext>) {
        self.emit(level, message.into(), None, context.into(), None);
    }

    fn emit(
        &self,
        level: LogLevel,
        message: Message,
        trace: Option<&str>,
        context: CallContext,
        request: Option<&RequestInfo>,
    ) {
        if !self.filter.permits(level) {
            return;
        }

        let context = self
            .base_context
            .clone()
            .merged(self.resolver.resolve(context, request));

        if let Some(console) = &self.console {
            console.write(level, message.text(), context.source());
        }

        if self.sinks.is_empty() {
            return;
        }

        let record = LogRecord::new(level, message)
            .with_context(context)
            .with_trace(trace.map(str::to_string));
        self.dispatch(Arc::new(record));
    }

    fn dispatch(&self, record: Arc<LogRecord>) {
        for sink in &self.sinks {
            sink.send(Arc::clone(&record));
        }
    }
}

/// Queue in front of one structured sink.
///
/// A single task drains the queue, so deliveries to the same sink never
/// overlap and happen in the order the records were logged. Different sinks
/// still run independently. The task ends once the owning logger is dropped.
struct SinkWorker {
    name: String,
    queue: mpsc::UnboundedSender<Arc<LogRecord>>,
}

impl SinkWorker {
    fn spawn(runtime: &Handle, appender: Arc<dyn Appender>, events: broadcast::Sender<DeliveryEvent>) -> Self {
        let name = appender.name().to_string();
        let (queue, mut pending) = mpsc::unbounded_channel::<Arc<LogRecord>>();

        let sink = name.clone();
        runtime.spawn(async move {
            while let Some(record) = pending.recv().await {
                let event = match appender.append(&record).await {
                    Ok(()) => DeliveryEvent::Logged {
                        sink: sink.clone(),
                        record,
                    },
                    Err(error) => {
                        tracing::debug!(sink = %sink, error = %error, "log delivery failed");
                        DeliveryEvent::Warn {
                            sink: sink.clone(),
                            error: Arc::new(error),
                        }
                    }
                };
                // No subscriber is fine.
                let _ = events.send(event);
            }
        });

        Self { name, queue }
    }

    fn send(&self, record: Arc<LogRecord>) {
        if self.queue.send(record).is_err() {
            tracing::debug!(sink = %self.name, "sink worker stopped, record dropped");
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`Logger`] bound to one request and a default source name.
///
/// Request fields are merged into every record; when a call gives no
/// `context`, or an empty one, the default source is used.
pub struct RequestLogger<'a> {
    logger: &'a Logger,
    request: Option<RequestInfo>,
    default_source: Option<String>,
}

impl<'a> RequestLogger<'a> {
    #[must_use]
    pub fn with_request(mut self, request: RequestInfo) -> Self {
        self.request = Some(request);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.default_source = Some(source.into());
        self
    }

    pub fn request(&self) -> Option<&RequestInfo> {
        self.request.as_ref()
    }

    fn context(&self, context: impl Into<CallContext>) -> CallContext {
        let mut fields = context.into().into_context();
        if let Some(source) = &self.default_source {
            if fields.get(SOURCE_KEY).map_or(true, is_empty_value) {
                fields.insert(SOURCE_KEY, source.clone());
            }
        }
        CallContext::Fields(fields)
    }

    fn emit(&self, level: LogLevel, message: Message, trace: Option<&str>, context: impl Into<CallContext>) {
        let context = self.context(context);
        self.logger
            .emit(level, message, trace, context, self.request.as_ref());
    }

    pub fn error(&self, message: impl Into<Message>, trace: Option<&str>, context: impl Into<CallContext>) {
        self.emit(LogLevel::Error, message.into(), trace, context);
    }

    pub fn warn(&self, message: impl Into<Message>, context: impl Into<CallContext>) {
        self.emit(LogLevel::Warn, message.into(), None, context);
    }

    pub fn log(&self, message: impl Into<Message>, context: impl Into<CallContext>) {
        self.emit(LogLevel::Log, message.into(), None, context);
    }

    pub fn debug(&self, message: impl Into<Message>, context: impl Into<CallContext>) {
        self.emit(LogLevel::Debug, message.into(), None, context);
    }

    pub fn verbose(&self, message: impl Into<Message>, context: impl Into<CallContext>) {
        self.emit(LogLevel::Verbose, message.into(), None, context);
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```no_run
/// use rust_context_logger::prelude::*;
///
/// # async fn run() -> Result<()> {
/// let logger = Logger::builder()
///     .level(LogLevel::Log)
///     .http(HttpOptions::new("https://logs.example.com/ingest").with_auth(HttpAuth::bearer("T")))
///     .daily_file(DailyRotateOptions::new("app-%DATE%.log", "/var/log/app"))
///     .log_entries(["timestamp", "level", "context", "message"])
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct LoggerBuilder {
    level: LogLevel,
    static_context: Option<StaticContext>,
    base_context: LogContext,
    console: Option<ConsoleAppender>,
    file: Option<DailyRotateOptions>,
    http: Option<HttpOptions>,
    payload: Option<PayloadTransform>,
    log_entries: Vec<String>,
    appenders: Vec<Arc<dyn Appender>>,
    runtime: Option<Handle>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            level: LogLevel::Verbose,
            static_context: None,
            base_context: LogContext::new(),
            console: Some(ConsoleAppender::new()),
            file: None,
            http: None,
            payload: None,
            log_entries: Vec::new(),
            appenders: Vec::new(),
            runtime: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Static source name added to every record
    #[must_use = "builder methods return a new value"]
    pub fn context(mut self, context: impl Into<StaticContext>) -> Self {
        self.static_context = Some(context.into());
        self
    }

    /// Base fields computed from the current request
    #[must_use = "builder methods return a new value"]
    pub fn context_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&RequestInfo) -> LogContext + Send + Sync + 'static,
    {
        self.static_context = Some(StaticContext::factory(factory));
        self
    }

    /// Instance-level fields, overridden by everything else
    #[must_use = "builder methods return a new value"]
    pub fn base_context(mut self, context: LogContext) -> Self {
        self.base_context = context;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn console(mut self, console: ConsoleAppender) -> Self {
        self.console = Some(console);
        self
    }

    /// Silence the developer console
    #[must_use = "builder methods return a new value"]
    pub fn without_console(mut self) -> Self {
        self.console = None;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn daily_file(mut self, options: DailyRotateOptions) -> Self {
        self.file = Some(options);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn http(mut self, options: HttpOptions) -> Self {
        self.http = Some(options);
        self
    }

    /// Transform applied to the HTTP payload before serialization
    #[must_use = "builder methods return a new value"]
    pub fn payload<F>(mut self, transform: F) -> Self
    where
        F: Fn(serde_json::Map<String, serde_json::Value>) -> serde_json::Value + Send + Sync + 'static,
    {
        self.payload = Some(Arc::new(transform));
        self
    }

    /// Field names emitted first, in order, by every structured sink
    #[must_use = "builder methods return a new value"]
    pub fn log_entries<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.log_entries = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Add a custom structured sink
    #[must_use = "builder methods return a new value"]
    pub fn appender(mut self, appender: Arc<dyn Appender>) -> Self {
        self.appenders.push(appender);
        self
    }

    /// Runtime used for structured deliveries; defaults to the current one
    #[must_use = "builder methods return a new value"]
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Build the Logger
    ///
    /// # Errors
    ///
    /// Fails when a sink cannot be constructed, or when structured sinks are
    /// configured but no Tokio runtime is available.
    pub fn build(self) -> Result<Logger> {
        let formatter = RecordFormatter::new().with_allowlist(self.log_entries.iter().cloned());
        let mut appenders: Vec<Arc<dyn Appender>> = Vec::new();

        if let Some(options) = self.file {
            appenders.push(Arc::new(DailyRotateFileAppender::new(options, formatter.clone())?));
        }

        if let Some(options) = self.http {
            let formatter = match self.payload {
                Some(transform) => formatter.clone().with_transform(transform),
                None => formatter.clone(),
            };
            appenders.push(Arc::new(HttpAppender::new(options, formatter)?));
        }

        appenders.extend(self.appenders);

        let runtime = match self.runtime {
            Some(handle) => Some(handle),
            None if appenders.is_empty() => None,
            None => Some(Handle::try_current().map_err(|e| {
                LoggerError::config(
                    "LoggerBuilder",
                    format!("structured sinks need a Tokio runtime: {}", e),
                )
            })?),
        };

        let events = events::channel();
        let sinks = match runtime {
            Some(runtime) => appenders
                .into_iter()
                .map(|appender| SinkWorker::spawn(&runtime, appender, events.clone()))
                .collect(),
            None => Vec::new(),
        };

        Ok(Logger {
            filter: LevelFilter::new(self.level),
            base_context: self.base_context,
            resolver: ContextResolver::new(self.static_context),
            console: self.console,
            sinks,
            events,
        })
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::time::Duration;

    #[derive(Default)]
    struct Recording {
        records: Mutex<Vec<LogRecord>>,
    }

    #[async_trait]
    impl Appender for Recording {
        async fn append(&self, record: &LogRecord) -> Result<()> {
            self.records.lock().push(record.clone());
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    struct Failing;

    #[async_trait]
    impl Appender for Failing {
        async fn append(&self, _record: &LogRecord) -> Result<()> {
            Err(LoggerError::http_status(503))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    async fn next_event(rx: &mut broadcast::Receiver<DeliveryEvent>) -> DeliveryEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("delivery event in time")
            .expect("open event channel")
    }

    fn quiet() -> LoggerBuilder {
        Logger::builder().without_console()
    }

    #[test]
    fn test_builder_defaults() {
        let logger = Logger::builder().build().unwrap();
        assert_eq!(logger.level(), LogLevel::Verbose);
        assert_eq!(logger.appender_count(), 0);
    }

    #[test]
    fn test_structured_sinks_need_runtime() {
        let result = quiet().appender(Arc::new(Recording::default())).build();
        assert!(matches!(result, Err(LoggerError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_set_level() {
        let logger = Logger::builder().build().unwrap();
        logger.set_level("warn");
        assert_eq!(logger.level(), LogLevel::Warn);

        logger.set_level("loud");
        assert_eq!(logger.level(), LogLevel::Warn);
    }

    #[tokio::test]
    async fn test_structured_record_shape() {
        let sink = Arc::new(Recording::default());
        let logger = quiet()
            .context("App")
            .base_context(LogContext::new().with_field("service", "billing"))
            .appender(sink.clone())
            .build()
            .unwrap();
        let mut rx = logger.subscribe();

        logger.log("charged", LogContext::new().with_field("amount", 0));
        assert!(next_event(&mut rx).await.is_logged());

        let records = sink.records.lock();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.level, LogLevel::Log);
        assert_eq!(record.message, Message::Plain("charged".into()));
        assert_eq!(record.context.get("service"), Some(&json!("billing")));
        assert_eq!(record.context.source(), Some("App"));
        assert_eq!(record.context.get("amount"), Some(&json!(0)));
    }

    #[tokio::test]
    async fn test_below_threshold_touches_no_sink() {
        let sink = Arc::new(Recording::default());
        let logger = quiet().level(LogLevel::Warn).appender(sink.clone()).build().unwrap();
        let mut rx = logger.subscribe();

        logger.debug("x", ());
        logger.verbose("y", ());
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(sink.records.lock().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_error_keeps_trace() {
        let sink = Arc::new(Recording::default());
        let logger = quiet().appender(sink.clone()).build().unwrap();
        let mut rx = logger.subscribe();

        logger.error(Message::failure("boom"), Some("at handler"), "Orders");
        next_event(&mut rx).await;

        let record = sink.records.lock()[0].clone();
        assert_eq!(record.trace.as_deref(), Some("at handler"));
        assert_eq!(record.to_fields()["trace"], json!(["at handler"]));
        assert_eq!(record.context.source(), Some("Orders"));
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_affect_others() {
        let sink = Arc::new(Recording::default());
        let logger = quiet()
            .appender(Arc::new(Failing))
            .appender(sink.clone())
            .build()
            .unwrap();
        let mut rx = logger.subscribe();

        logger.warn("partial outage", ());

        let mut logged = 0;
        let mut warned = 0;
        for _ in 0..2 {
            match next_event(&mut rx).await {
                DeliveryEvent::Logged { sink, .. } => {
                    assert_eq!(sink, "recording");
                    logged += 1;
                }
                DeliveryEvent::Warn { sink, error } => {
                    assert_eq!(sink, "failing");
                    assert!(error.to_string().contains("503"));
                    warned += 1;
                }
            }
        }
        assert_eq!((logged, warned), (1, 1));
        assert_eq!(sink.records.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_request_logger_defaults_source() {
        let sink = Arc::new(Recording::default());
        let logger = quiet().appender(sink.clone()).build().unwrap();
        let mut rx = logger.subscribe();

        let request = RequestInfo::new("GET", "/users/7").with_ip("10.1.1.1");
        let scoped = logger.scoped("UsersController").with_request(request);
        scoped.log("found", ());
        next_event(&mut rx).await;
        scoped.log("explicit", "Other");
        next_event(&mut rx).await;

        let records = sink.records.lock();
        assert_eq!(records[0].context.source(), Some("UsersController"));
        assert_eq!(records[0].context.get("ip"), Some(&json!("10.1.1.1")));
        assert_eq!(records[0].context.get("url"), Some(&json!("/users/7")));
        assert_eq!(records[1].context.source(), Some("Other"));
    }

    #[tokio::test]
    async fn test_request_logger_replaces_empty_source() {
        let sink = Arc::new(Recording::default());
        let logger = quiet().appender(sink.clone()).build().unwrap();
        let mut rx = logger.subscribe();

        let scoped = logger.scoped("UsersController");
        scoped.log("blank", LogContext::new().with_field(SOURCE_KEY, ""));
        next_event(&mut rx).await;
        scoped.log("null", LogContext::new().with_field(SOURCE_KEY, json!(null)));
        next_event(&mut rx).await;

        let records = sink.records.lock();
        assert_eq!(records[0].context.source(), Some("UsersController"));
        assert_eq!(records[1].context.source(), Some("UsersController"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_sink_receives_records_in_call_order() {
        let sink = Arc::new(Recording::default());
        let logger = quiet().appender(sink.clone()).build().unwrap();
        let mut rx = logger.subscribe();

        for i in 0..100 {
            logger.log(i.to_string(), ());
        }
        for _ in 0..100 {
            assert!(next_event(&mut rx).await.is_logged());
        }

        let messages: Vec<String> = sink
            .records
            .lock()
            .iter()
            .map(|r| r.message.text().to_string())
            .collect();
        let expected: Vec<String> = (0..100).map(|i: i32| i.to_string()).collect();
        assert_eq!(messages, expected);
    }

    #[test]
    fn test_records_dropped_after_runtime_shutdown() {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let sink = Arc::new(Recording::default());
        let logger = quiet()
            .appender(sink.clone())
            .runtime(runtime.handle().clone())
            .build()
            .unwrap();
        drop(runtime);

        logger.log("late", ());
        assert!(sink.records.lock().is_empty());
    }
}
