use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use tracing::debug;

use crate::error::{CallError, ProcedureError};
use crate::procedure::{Procedure, ProcedureType};
use crate::router::{Router, format_error};
use crate::settings::transformer::DefaultTransformer;

/// Invokes a router's procedures in-process with a fixed context.
///
/// Requests pass through the router's transformer before decoding and
/// responses after encoding; failures are shaped by its error formatter.
pub struct Caller<'r, Ctx> {
    router: &'r Router<Ctx>,
    ctx: Ctx,
}

impl<'r, Ctx> Caller<'r, Ctx>
where
    Ctx: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(router: &'r Router<Ctx>, ctx: Ctx) -> Self {
        Self { router, ctx }
    }

    pub async fn query(&self, path: &str, input: Bytes) -> Result<Bytes, CallError> {
        self.call_unary(ProcedureType::Query, path, input).await
    }

    pub async fn mutation(&self, path: &str, input: Bytes) -> Result<Bytes, CallError> {
        self.call_unary(ProcedureType::Mutation, path, input).await
    }

    /// Start a subscription. Errors on individual messages are formatted the
    /// same way as errors starting the call.
    pub async fn subscription(
        &self,
        path: &str,
        input: Bytes,
    ) -> Result<BoxStream<'static, Result<Bytes, CallError>>, CallError> {
        let kind = ProcedureType::Subscription;
        let transformer = self.router.transformer().get_or(&DefaultTransformer);

        let result: Result<_, ProcedureError> = async {
            let procedure = self.lookup(kind, path)?;
            let input = transformer.deserialize(input)?;
            procedure.call_stream(self.ctx.clone(), input).await
        }
        .await;
        let stream = result.map_err(|e| self.router.format_error(kind, path, e))?;

        let transformer = self.router.effective_transformer();
        let formatter = self.router.effective_error_formatter();
        let is_dev = self.router.config().is_dev;
        let path = path.to_string();

        Ok(stream
            .map(move |item| {
                item.and_then(|payload| Ok(transformer.serialize(payload)?))
                    .map_err(|e| format_error(formatter.as_ref(), is_dev, kind, &path, e))
            })
            .boxed())
    }

    async fn call_unary(
        &self,
        kind: ProcedureType,
        path: &str,
        input: Bytes,
    ) -> Result<Bytes, CallError> {
        let transformer = self.router.transformer().get_or(&DefaultTransformer);

        let result: Result<Bytes, ProcedureError> = async {
            let procedure = self.lookup(kind, path)?;
            let input = transformer.deserialize(input)?;
            let output = procedure.call_unary(self.ctx.clone(), input).await?;
            Ok(transformer.serialize(output)?)
        }
        .await;

        result.map_err(|e| {
            debug!(kind = %kind, path = %path, error = %e, "Procedure call failed");
            self.router.format_error(kind, path, e)
        })
    }

    fn lookup(
        &self,
        kind: ProcedureType,
        path: &str,
    ) -> Result<&'r Procedure<Ctx>, ProcedureError> {
        self.router
            .procedure(kind, path)
            .ok_or_else(|| ProcedureError::NotFound {
                kind,
                path: path.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procedure::tests::{Greeting, Name, greet, ticks};
    use crate::router::{RootConfig, RouterFactory, merge_routers};
    use crate::settings::formatter::{ErrorFormatter, FormatterInput};
    use crate::settings::transformer::{DataTransformer, LengthDelimited};
    use prost::Message;
    use std::sync::Arc;
    use tonic::{Code, Status};

    fn name(value: &str) -> Bytes {
        Bytes::from(Name { name: value.into() }.encode_to_vec())
    }

    fn message(payload: Bytes) -> String {
        Greeting::decode(payload).unwrap().message
    }

    #[tokio::test]
    async fn test_query_roundtrip() {
        let router = Router::builder().procedure("hello", greet()).build().unwrap();
        let out = router.caller(()).query("hello", name("ada")).await.unwrap();
        assert_eq!(message(out), "hello ada");
    }

    #[tokio::test]
    async fn test_missing_procedure() {
        let router = Router::builder().procedure("hello", greet()).build().unwrap();
        let err = router.caller(()).mutation("hello", name("ada")).await.unwrap_err();
        assert_eq!(err.shape.code, Code::NotFound);
        assert_eq!(err.kind, ProcedureType::Mutation);
        assert!(matches!(err.source, ProcedureError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_context_reaches_resolver() {
        let router = Router::<String>::builder()
            .procedure(
                "whoami",
                Procedure::query(|ctx: String, _req: Name| async move {
                    Ok(Greeting { message: ctx })
                }),
            )
            .build()
            .unwrap();
        let out = router
            .caller("operator".to_string())
            .query("whoami", Bytes::new())
            .await
            .unwrap();
        assert_eq!(message(out), "operator");
    }

    #[tokio::test]
    async fn test_merged_transformer_applies() {
        let transformer: Arc<dyn DataTransformer> = Arc::new(LengthDelimited);
        let plain = Router::builder().procedure("hello", greet()).build().unwrap();
        let framed = Router::<()>::builder().transformer(transformer).build().unwrap();
        let app = merge_routers(&plain, &[&framed]).unwrap();

        let framed_input = LengthDelimited.serialize(name("bob")).unwrap();
        let out = app.caller(()).query("hello", framed_input).await.unwrap();
        let unframed = LengthDelimited.deserialize(out).unwrap();
        assert_eq!(message(unframed), "hello bob");

        // unframed input is rejected by the transformer
        let err = app.caller(()).query("hello", name("bob")).await.unwrap_err();
        assert_eq!(err.shape.code, Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_merged_formatter_applies() {
        let formatter: Arc<dyn ErrorFormatter> =
            Arc::new(|input: FormatterInput<'_>| input.shape.with_data("router", "app"));
        let failing = Router::builder()
            .procedure(
                "fail",
                Procedure::query(|_ctx: (), _req: Name| async move {
                    Err::<Greeting, _>(Status::failed_precondition("not ready"))
                }),
            )
            .build()
            .unwrap();
        let formatted = Router::<()>::builder().error_formatter(formatter).build().unwrap();
        let app = merge_routers(&failing, &[&formatted]).unwrap();

        let err = app.caller(()).query("fail", Bytes::new()).await.unwrap_err();
        assert_eq!(err.shape.code, Code::FailedPrecondition);
        assert_eq!(err.shape.message, "not ready");
        assert_eq!(err.shape.data.get("router").map(String::as_str), Some("app"));
        assert_eq!(err.to_string(), "query 'fail' failed: not ready");
    }

    #[tokio::test]
    async fn test_dev_mode_adds_detail() {
        let factory = RouterFactory::<()>::new(RootConfig::builder().is_dev(true).build());
        let router = factory.router().build().unwrap();
        let err = router.caller(()).query("nope", Bytes::new()).await.unwrap_err();
        assert!(err.shape.data.contains_key("detail"));
    }

    #[tokio::test]
    async fn test_subscription() {
        let transformer: Arc<dyn DataTransformer> = Arc::new(LengthDelimited);
        let router = Router::builder()
            .procedure("ticks", ticks())
            .transformer(transformer)
            .build()
            .unwrap();

        let input = LengthDelimited.serialize(name("t")).unwrap();
        let stream = router.caller(()).subscription("ticks", input).await.unwrap();
        let messages: Vec<String> = stream
            .map(|item| message(LengthDelimited.deserialize(item.unwrap()).unwrap()))
            .collect()
            .await;
        assert_eq!(messages, vec!["t 0", "t 1", "t 2"]);
    }

    #[tokio::test]
    async fn test_subscription_item_error_is_formatted() {
        let router = Router::builder()
            .procedure(
                "flaky",
                Procedure::subscription(|_ctx: (), _req: Name| async move {
                    Ok(async_stream::stream! {
                        yield Ok(Greeting { message: "first".into() });
                        yield Err(Status::unavailable("gone"));
                    })
                }),
            )
            .build()
            .unwrap();

        let items: Vec<Result<Bytes, CallError>> = router
            .caller(())
            .subscription("flaky", Bytes::new())
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(items.len(), 2);
        assert_eq!(message(items[0].as_ref().unwrap().clone()), "first");
        let err = items[1].as_ref().unwrap_err();
        assert_eq!(err.shape.code, Code::Unavailable);
        assert_eq!(err.path, "flaky");
    }
}
