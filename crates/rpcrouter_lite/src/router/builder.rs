use futures::Stream;
use std::future::Future;
use std::sync::Arc;
use tonic::Status;
use tracing::debug;

use crate::error::ComposeError;
use crate::procedure::{Procedure, ProcedureType};
use crate::router::{RootConfig, Router, RouterFactory, RouterParts};
use crate::settings::Setting;
use crate::settings::formatter::ErrorFormatter;
use crate::settings::transformer::DataTransformer;

/// Collects procedures and settings for a single router.
///
/// Name collisions within one category are reported by [`build`](Self::build).
///
/// # Example
/// ```ignore
/// let router = factory
///     .router()
///     .query("hello", |ctx: AppContext, req: HelloRequest| async move {
///         Ok(HelloReply { message: format!("hello {}", req.name) })
///     })
///     .procedure("post.add", add_post)
///     .build()?;
/// ```
pub struct RouterBuilder<Ctx> {
    config: Arc<RootConfig>,
    procedures: Vec<(String, Procedure<Ctx>)>,
    error_formatter: Setting<dyn ErrorFormatter>,
    transformer: Setting<dyn DataTransformer>,
}

impl<Ctx> RouterBuilder<Ctx> {
    pub(crate) fn new(config: Arc<RootConfig>) -> Self {
        Self {
            error_formatter: config.error_formatter.clone(),
            transformer: config.transformer.clone(),
            config,
            procedures: Vec::new(),
        }
    }

    /// Add a procedure under `name`; its category comes from the procedure.
    pub fn procedure(mut self, name: impl Into<String>, procedure: Procedure<Ctx>) -> Self {
        self.procedures.push((name.into(), procedure));
        self
    }

    /// Override the error formatter for this router.
    pub fn error_formatter(mut self, formatter: Arc<dyn ErrorFormatter>) -> Self {
        self.error_formatter = Setting::Custom(formatter);
        self
    }

    /// Override the data transformer for this router.
    pub fn transformer(mut self, transformer: Arc<dyn DataTransformer>) -> Self {
        self.transformer = Setting::Custom(transformer);
        self
    }

    /// Build the router.
    pub fn build(self) -> Result<Router<Ctx>, ComposeError> {
        let mut parts = RouterParts::empty();
        parts.error_formatter = self.error_formatter;
        parts.transformer = self.transformer;

        for (name, procedure) in self.procedures {
            let record = match procedure.kind() {
                ProcedureType::Query => &mut parts.queries,
                ProcedureType::Mutation => &mut parts.mutations,
                ProcedureType::Subscription => &mut parts.subscriptions,
            };
            debug!(kind = %procedure.kind(), name = %name, "Registered procedure");
            record.try_insert(name, procedure)?;
        }

        Ok(RouterFactory::from_shared(self.config).create(parts))
    }
}

impl<Ctx> RouterBuilder<Ctx>
where
    Ctx: Send + 'static,
{
    /// Shorthand for `.procedure(name, Procedure::query(resolver))`.
    pub fn query<Req, Resp, F, Fut>(self, name: impl Into<String>, resolver: F) -> Self
    where
        Req: prost::Message + Default + Send + 'static,
        Resp: prost::Message + Send + 'static,
        F: Fn(Ctx, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp, Status>> + Send + 'static,
    {
        self.procedure(name, Procedure::query(resolver))
    }

    /// Shorthand for `.procedure(name, Procedure::mutation(resolver))`.
    pub fn mutation<Req, Resp, F, Fut>(self, name: impl Into<String>, resolver: F) -> Self
    where
        Req: prost::Message + Default + Send + 'static,
        Resp: prost::Message + Send + 'static,
        F: Fn(Ctx, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp, Status>> + Send + 'static,
    {
        self.procedure(name, Procedure::mutation(resolver))
    }

    /// Shorthand for `.procedure(name, Procedure::subscription(resolver))`.
    pub fn subscription<Req, Resp, F, Fut, S>(self, name: impl Into<String>, resolver: F) -> Self
    where
        Req: prost::Message + Default + Send + 'static,
        Resp: prost::Message + Send + 'static,
        F: Fn(Ctx, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<S, Status>> + Send + 'static,
        S: Stream<Item = Result<Resp, Status>> + Send + 'static,
    {
        self.procedure(name, Procedure::subscription(resolver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procedure::tests::{Greeting, Name, greet, noop_mutation, ticks};

    #[test]
    fn test_build_sorts_by_kind() {
        let router = Router::<()>::builder()
            .procedure("hello", greet())
            .procedure("add", noop_mutation())
            .procedure("ticks", ticks())
            .build()
            .unwrap();

        assert!(router.queries().contains("hello"));
        assert!(router.mutations().contains("add"));
        assert!(router.subscriptions().contains("ticks"));
        assert!(router.procedure(ProcedureType::Query, "add").is_none());
    }

    #[test]
    fn test_duplicate_in_one_router() {
        let result = Router::<()>::builder()
            .procedure("hello", greet())
            .procedure("hello", greet())
            .build();
        assert!(matches!(
            result,
            Err(ComposeError::DuplicateProcedureName { kind: ProcedureType::Query, ref name }) if name == "hello"
        ));
    }

    #[test]
    fn test_same_name_across_kinds() {
        let router = Router::<()>::builder()
            .procedure("x", greet())
            .procedure("x", noop_mutation())
            .build()
            .unwrap();
        assert_eq!(router.schema().queries, vec!["x"]);
        assert_eq!(router.schema().mutations, vec!["x"]);
    }

    #[test]
    fn test_shorthands() {
        let router = Router::<()>::builder()
            .query("q", |_ctx: (), req: Name| async move {
                Ok(Greeting { message: req.name })
            })
            .mutation("m", |_ctx: (), _req: Name| async move { Ok(Greeting::default()) })
            .subscription("s", |_ctx: (), _req: Name| async move {
                Ok(futures::stream::empty::<Result<Greeting, Status>>())
            })
            .build()
            .unwrap();
        assert_eq!(router.schema().len(), 3);
        assert_eq!(
            router.procedure(ProcedureType::Subscription, "s").map(|p| p.kind()),
            Some(ProcedureType::Subscription)
        );
    }

    #[test]
    fn test_override_settings() {
        let formatter: Arc<dyn ErrorFormatter> =
            Arc::new(crate::settings::formatter::DefaultErrorFormatter);
        let router = Router::<()>::builder()
            .error_formatter(Arc::clone(&formatter))
            .build()
            .unwrap();
        assert!(!router.error_formatter().is_default());
        assert!(router.transformer().is_default());
    }
}
