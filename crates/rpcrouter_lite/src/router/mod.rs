//! Routers and router composition.
//!
//! A [`Router`] is built once, either from a [`RouterBuilder`] or by merging
//! other routers with [`merge_routers`], and is immutable afterwards.

mod builder;
mod caller;
mod config;
mod merge;
mod schema;

pub use builder::RouterBuilder;
pub use caller::Caller;
pub use config::{RootConfig, RouterFactory};
pub use merge::merge_routers;
pub use schema::RouterSchema;

use std::fmt;
use std::sync::Arc;

use crate::error::{CallError, ProcedureError};
use crate::procedure::{Procedure, ProcedureType};
use crate::record::ProcedureRecord;
use crate::settings::Setting;
use crate::settings::formatter::{DefaultErrorFormatter, ErrorFormatter, ErrorShape, FormatterInput};
use crate::settings::transformer::{DataTransformer, DefaultTransformer};

/// The pieces a router is assembled from.
pub struct RouterParts<Ctx> {
    pub queries: ProcedureRecord<Ctx>,
    pub mutations: ProcedureRecord<Ctx>,
    pub subscriptions: ProcedureRecord<Ctx>,
    pub error_formatter: Setting<dyn ErrorFormatter>,
    pub transformer: Setting<dyn DataTransformer>,
}

impl<Ctx> RouterParts<Ctx> {
    /// Parts with no procedures and default settings.
    pub fn empty() -> Self {
        Self {
            queries: ProcedureRecord::new(ProcedureType::Query),
            mutations: ProcedureRecord::new(ProcedureType::Mutation),
            subscriptions: ProcedureRecord::new(ProcedureType::Subscription),
            error_formatter: Setting::Default,
            transformer: Setting::Default,
        }
    }
}

/// A collection of procedures plus the settings that apply to all of them.
pub struct Router<Ctx> {
    queries: ProcedureRecord<Ctx>,
    mutations: ProcedureRecord<Ctx>,
    subscriptions: ProcedureRecord<Ctx>,
    error_formatter: Setting<dyn ErrorFormatter>,
    transformer: Setting<dyn DataTransformer>,
    config: Arc<RootConfig>,
    schema: RouterSchema,
}

impl<Ctx> Router<Ctx> {
    /// Define a router with the default configuration.
    pub fn builder() -> RouterBuilder<Ctx> {
        RouterFactory::default().router()
    }

    pub(crate) fn from_parts(parts: RouterParts<Ctx>, config: Arc<RootConfig>) -> Self {
        let schema = RouterSchema::from_parts(&parts);
        Self {
            queries: parts.queries,
            mutations: parts.mutations,
            subscriptions: parts.subscriptions,
            error_formatter: parts.error_formatter,
            transformer: parts.transformer,
            config,
            schema,
        }
    }

    pub fn queries(&self) -> &ProcedureRecord<Ctx> {
        &self.queries
    }

    pub fn mutations(&self) -> &ProcedureRecord<Ctx> {
        &self.mutations
    }

    pub fn subscriptions(&self) -> &ProcedureRecord<Ctx> {
        &self.subscriptions
    }

    /// The record holding procedures of `kind`.
    pub fn record(&self, kind: ProcedureType) -> &ProcedureRecord<Ctx> {
        match kind {
            ProcedureType::Query => &self.queries,
            ProcedureType::Mutation => &self.mutations,
            ProcedureType::Subscription => &self.subscriptions,
        }
    }

    pub fn procedure(&self, kind: ProcedureType, name: &str) -> Option<&Procedure<Ctx>> {
        self.record(kind).get(name)
    }

    pub fn error_formatter(&self) -> &Setting<dyn ErrorFormatter> {
        &self.error_formatter
    }

    pub fn transformer(&self) -> &Setting<dyn DataTransformer> {
        &self.transformer
    }

    pub fn config(&self) -> &RootConfig {
        &self.config
    }

    pub(crate) fn shared_config(&self) -> &Arc<RootConfig> {
        &self.config
    }

    /// Procedure names per category, computed when the router was built.
    pub fn schema(&self) -> &RouterSchema {
        &self.schema
    }

    /// Create a caller that invokes procedures with `ctx`.
    pub fn caller(&self, ctx: Ctx) -> Caller<'_, Ctx>
    where
        Ctx: Clone + Send + Sync + 'static,
    {
        Caller::new(self, ctx)
    }

    /// The transformer in effect, falling back to [`DefaultTransformer`].
    pub fn effective_transformer(&self) -> Arc<dyn DataTransformer> {
        match &self.transformer {
            Setting::Custom(transformer) => Arc::clone(transformer),
            Setting::Default => Arc::new(DefaultTransformer),
        }
    }

    /// The error formatter in effect, falling back to [`DefaultErrorFormatter`].
    pub fn effective_error_formatter(&self) -> Arc<dyn ErrorFormatter> {
        match &self.error_formatter {
            Setting::Custom(formatter) => Arc::clone(formatter),
            Setting::Default => Arc::new(DefaultErrorFormatter),
        }
    }

    /// Run a failed call through the effective error formatter.
    pub fn format_error(&self, kind: ProcedureType, path: &str, error: ProcedureError) -> CallError {
        format_error(
            self.error_formatter.get_or(&DefaultErrorFormatter),
            self.config.is_dev,
            kind,
            path,
            error,
        )
    }
}

pub(crate) fn format_error(
    formatter: &dyn ErrorFormatter,
    is_dev: bool,
    kind: ProcedureType,
    path: &str,
    error: ProcedureError,
) -> CallError {
    let mut shape = ErrorShape::from_error(&error, path);
    if is_dev {
        shape = shape.with_data("detail", format!("{error:?}"));
    }
    let shape = formatter.format(FormatterInput {
        error: &error,
        kind,
        path,
        shape,
    });
    CallError {
        kind,
        path: path.to_string(),
        shape,
        source: error,
    }
}

impl<Ctx> Clone for Router<Ctx> {
    fn clone(&self) -> Self {
        Self {
            queries: self.queries.clone(),
            mutations: self.mutations.clone(),
            subscriptions: self.subscriptions.clone(),
            error_formatter: self.error_formatter.clone(),
            transformer: self.transformer.clone(),
            config: Arc::clone(&self.config),
            schema: self.schema.clone(),
        }
    }
}

impl<Ctx> fmt::Debug for Router<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("queries", &self.queries)
            .field("mutations", &self.mutations)
            .field("subscriptions", &self.subscriptions)
            .field("error_formatter", &self.error_formatter)
            .field("transformer", &self.transformer)
            .field("config", &self.config)
            .finish()
    }
}
