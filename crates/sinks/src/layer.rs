//! `tracing` adapter
//!
//! [`HookLayer`] is a `tracing_subscriber` layer that turns every accepted
//! event into an [`Entry`] and hands it to a [`Hook`].
//!
//! Fields are merged in three tiers, later tiers winning on name clashes:
//!
//! 1. fixed fields configured on the layer (shared by every entry),
//! 2. fields of the enclosing spans, outermost first,
//! 3. fields of the event itself.
//!
//! Tiers 2 and 3 only apply to the entry being built; nothing leaks into
//! later events.
//!
//! # Example
//!
//! ```ignore
//! use tracing_subscriber::prelude::*;
//!
//! let hook = Arc::new(ClickHouseHook::connect(&config, table).await?);
//! tracing_subscriber::registry()
//!     .with(HookLayer::new(Arc::clone(&hook)).with_fixed_field("service", "billing"))
//!     .init();
//!
//! tracing::info!(id = 7, tag = "x", "hello");
//! ```

use std::collections::BTreeMap;
use std::fmt;

use chrono::Utc;
use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

use crate::entry::{Entry, Level};
use crate::hook::Hook;

/// Targets never forwarded: the sink's own diagnostics and the driver stack
/// underneath it. Forwarding those would feed inserts back into inserts.
pub const DEFAULT_EXCLUDED_TARGETS: &[&str] = &[
    "loghook_sinks",
    "clickhouse",
    "hyper",
    "hyper_util",
    "h2",
    "rustls",
];

/// Name of the field `tracing` uses for the formatted message
const MESSAGE_FIELD: &str = "message";

/// Layer forwarding `tracing` events to a [`Hook`]
pub struct HookLayer<H> {
    hook: H,
    fixed_fields: BTreeMap<String, Value>,
    excluded_targets: Vec<String>,
}

impl<H> fmt::Debug for HookLayer<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookLayer")
            .field("fixed_fields", &self.fixed_fields)
            .field("excluded_targets", &self.excluded_targets)
            .finish_non_exhaustive()
    }
}

impl<H: Hook> HookLayer<H> {
    /// Forward events to `hook`
    pub fn new(hook: H) -> Self {
        Self {
            hook,
            fixed_fields: BTreeMap::new(),
            excluded_targets: DEFAULT_EXCLUDED_TARGETS
                .iter()
                .map(|t| (*t).to_string())
                .collect(),
        }
    }

    /// Attach a field to every entry
    pub fn with_fixed_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fixed_fields.insert(name.into(), value.into());
        self
    }

    /// Attach several fields to every entry
    pub fn with_fixed_fields<I, K>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.fixed_fields
            .extend(fields.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    /// Never forward events whose target is `target` or below it
    pub fn with_excluded_target(mut self, target: impl Into<String>) -> Self {
        self.excluded_targets.push(target.into());
        self
    }

    fn is_excluded(&self, target: &str) -> bool {
        self.excluded_targets.iter().any(|excluded| {
            target
                .strip_prefix(excluded.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
        })
    }
}

/// Fields recorded on a span, kept in the span's extensions
struct SpanFields(BTreeMap<String, Value>);

/// Collects `tracing` field values as JSON values
struct FieldVisitor<'a>(&'a mut BTreeMap<String, Value>);

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.0
            .insert(field.name().to_string(), Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0
            .insert(field.name().to_string(), Value::from(format!("{value:?}")));
    }
}

impl<S, H> Layer<S> for HookLayer<H>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    H: Hook + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut fields = BTreeMap::new();
        attrs.record(&mut FieldVisitor(&mut fields));
        span.extensions_mut().insert(SpanFields(fields));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut extensions = span.extensions_mut();
        if let Some(SpanFields(fields)) = extensions.get_mut::<SpanFields>() {
            values.record(&mut FieldVisitor(fields));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if self.is_excluded(metadata.target()) {
            return;
        }

        let level = Level::from_tracing(metadata.level());
        if !self.hook.accepts(level) {
            return;
        }

        let mut fields = self.fixed_fields.clone();

        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(SpanFields(span_fields)) = span.extensions().get::<SpanFields>() {
                    fields.extend(span_fields.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
        }

        let mut event_fields = BTreeMap::new();
        event.record(&mut FieldVisitor(&mut event_fields));

        let message = match event_fields.remove(MESSAGE_FIELD) {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        fields.extend(event_fields);

        let entry = Entry {
            time: Utc::now(),
            level,
            message,
            fields,
        };
        self.hook.deliver(&entry);
    }
}
