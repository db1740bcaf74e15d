use bytes::Bytes;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, Stream, StreamExt};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tonic::Status;

use crate::error::ProcedureError;

/// The category a procedure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProcedureType {
    Query,
    Mutation,
    Subscription,
}

impl ProcedureType {
    pub const ALL: [ProcedureType; 3] = [
        ProcedureType::Query,
        ProcedureType::Mutation,
        ProcedureType::Subscription,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcedureType::Query => "query",
            ProcedureType::Mutation => "mutation",
            ProcedureType::Subscription => "subscription",
        }
    }

    /// Name of the router field holding procedures of this type.
    pub fn category(&self) -> &'static str {
        match self {
            ProcedureType::Query => "queries",
            ProcedureType::Mutation => "mutations",
            ProcedureType::Subscription => "subscriptions",
        }
    }
}

impl fmt::Display for ProcedureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Free-form metadata attached to a procedure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcedureMeta(BTreeMap<String, String>);

impl ProcedureMeta {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A stream of encoded subscription messages.
pub type ByteStream = BoxStream<'static, Result<Bytes, ProcedureError>>;

/// A type-erased resolver for queries and mutations.
///
/// Takes the raw request payload, decodes it, calls the typed resolver and
/// encodes the response.
pub type UnaryFn<Ctx> =
    Arc<dyn Fn(Ctx, Bytes) -> BoxFuture<'static, Result<Bytes, ProcedureError>> + Send + Sync>;

/// A type-erased resolver for subscriptions.
pub type StreamFn<Ctx> =
    Arc<dyn Fn(Ctx, Bytes) -> BoxFuture<'static, Result<ByteStream, ProcedureError>> + Send + Sync>;

enum Resolver<Ctx> {
    Unary(UnaryFn<Ctx>),
    Stream(StreamFn<Ctx>),
}

impl<Ctx> Clone for Resolver<Ctx> {
    fn clone(&self) -> Self {
        match self {
            Resolver::Unary(f) => Resolver::Unary(Arc::clone(f)),
            Resolver::Stream(f) => Resolver::Stream(Arc::clone(f)),
        }
    }
}

/// A single callable endpoint.
///
/// Cloning is cheap: the resolver is shared, so a procedure merged into a
/// composed router is the same procedure its source router holds.
pub struct Procedure<Ctx> {
    kind: ProcedureType,
    meta: ProcedureMeta,
    resolver: Resolver<Ctx>,
}

impl<Ctx> Clone for Procedure<Ctx> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            meta: self.meta.clone(),
            resolver: self.resolver.clone(),
        }
    }
}

impl<Ctx> fmt::Debug for Procedure<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Procedure")
            .field("kind", &self.kind)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

impl<Ctx> Procedure<Ctx>
where
    Ctx: Send + 'static,
{
    /// Create a query from an async resolver.
    ///
    /// # Example
    /// ```ignore
    /// let hello = Procedure::query(|ctx: AppContext, req: HelloRequest| async move {
    ///     Ok(HelloReply { message: format!("hello {}", req.name) })
    /// });
    /// ```
    pub fn query<Req, Resp, F, Fut>(resolver: F) -> Self
    where
        Req: prost::Message + Default + Send + 'static,
        Resp: prost::Message + Send + 'static,
        F: Fn(Ctx, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp, Status>> + Send + 'static,
    {
        Self::unary(ProcedureType::Query, make_unary(resolver))
    }

    /// Create a mutation from an async resolver.
    pub fn mutation<Req, Resp, F, Fut>(resolver: F) -> Self
    where
        Req: prost::Message + Default + Send + 'static,
        Resp: prost::Message + Send + 'static,
        F: Fn(Ctx, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp, Status>> + Send + 'static,
    {
        Self::unary(ProcedureType::Mutation, make_unary(resolver))
    }

    /// Create a subscription from an async resolver returning a message stream.
    pub fn subscription<Req, Resp, F, Fut, S>(resolver: F) -> Self
    where
        Req: prost::Message + Default + Send + 'static,
        Resp: prost::Message + Send + 'static,
        F: Fn(Ctx, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<S, Status>> + Send + 'static,
        S: Stream<Item = Result<Resp, Status>> + Send + 'static,
    {
        Self {
            kind: ProcedureType::Subscription,
            meta: ProcedureMeta::default(),
            resolver: Resolver::Stream(make_stream(resolver)),
        }
    }

    fn unary(kind: ProcedureType, resolver: UnaryFn<Ctx>) -> Self {
        Self {
            kind,
            meta: ProcedureMeta::default(),
            resolver: Resolver::Unary(resolver),
        }
    }
}

impl<Ctx> Procedure<Ctx> {
    /// Attach a metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key, value);
        self
    }

    pub fn kind(&self) -> ProcedureType {
        self.kind
    }

    pub fn meta(&self) -> &ProcedureMeta {
        &self.meta
    }

    /// Whether both handles share the same resolver.
    pub fn same_as(&self, other: &Self) -> bool {
        match (&self.resolver, &other.resolver) {
            (Resolver::Unary(a), Resolver::Unary(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            (Resolver::Stream(a), Resolver::Stream(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }

    /// Invoke a query or mutation with an encoded request.
    pub async fn call_unary(&self, ctx: Ctx, input: Bytes) -> Result<Bytes, ProcedureError> {
        match &self.resolver {
            Resolver::Unary(f) => f(ctx, input).await,
            Resolver::Stream(_) => Err(ProcedureError::KindMismatch {
                expected: ProcedureType::Query,
                found: self.kind,
            }),
        }
    }

    /// Invoke a subscription with an encoded request.
    pub async fn call_stream(&self, ctx: Ctx, input: Bytes) -> Result<ByteStream, ProcedureError> {
        match &self.resolver {
            Resolver::Stream(f) => f(ctx, input).await,
            Resolver::Unary(_) => Err(ProcedureError::KindMismatch {
                expected: ProcedureType::Subscription,
                found: self.kind,
            }),
        }
    }
}

fn encode<M: prost::Message>(msg: &M) -> Result<Bytes, ProcedureError> {
    let mut buf = Vec::with_capacity(msg.encoded_len());
    msg.encode(&mut buf)?;
    Ok(Bytes::from(buf))
}

/// Box a typed unary resolver behind the erased signature.
fn make_unary<Ctx, Req, Resp, F, Fut>(f: F) -> UnaryFn<Ctx>
where
    Ctx: Send + 'static,
    Req: prost::Message + Default + Send + 'static,
    Resp: prost::Message + Send + 'static,
    F: Fn(Ctx, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, Status>> + Send + 'static,
{
    Arc::new(move |ctx: Ctx, input: Bytes| {
        // decode before the future is built so the resolver never sees bad input
        let call = Req::decode(input).map(|req| f(ctx, req));
        async move {
            let response = call?.await?;
            encode(&response)
        }
        .boxed()
    })
}

/// Box a typed subscription resolver behind the erased signature.
fn make_stream<Ctx, Req, Resp, F, Fut, S>(f: F) -> StreamFn<Ctx>
where
    Ctx: Send + 'static,
    Req: prost::Message + Default + Send + 'static,
    Resp: prost::Message + Send + 'static,
    F: Fn(Ctx, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<S, Status>> + Send + 'static,
    S: Stream<Item = Result<Resp, Status>> + Send + 'static,
{
    Arc::new(move |ctx: Ctx, input: Bytes| {
        let call = Req::decode(input).map(|req| f(ctx, req));
        async move {
            let stream = call?.await?;
            let encoded = stream.map(|item| match item {
                Ok(msg) => encode(&msg),
                Err(status) => Err(ProcedureError::Resolver(status)),
            });
            Ok::<_, ProcedureError>(encoded.boxed())
        }
        .boxed()
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Clone, PartialEq, prost::Message)]
    pub(crate) struct Name {
        #[prost(string, tag = "1")]
        pub name: String,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub(crate) struct Greeting {
        #[prost(string, tag = "1")]
        pub message: String,
    }

    pub(crate) fn greet() -> Procedure<()> {
        Procedure::query(|_ctx: (), req: Name| async move {
            Ok(Greeting {
                message: format!("hello {}", req.name),
            })
        })
    }

    pub(crate) fn noop_mutation() -> Procedure<()> {
        Procedure::mutation(|_ctx: (), _req: Name| async move { Ok(Greeting::default()) })
    }

    pub(crate) fn ticks() -> Procedure<()> {
        Procedure::subscription(|_ctx: (), req: Name| async move {
            Ok(futures::stream::iter(
                (0..3).map(move |i| Ok(Greeting { message: format!("{} {i}", req.name) })),
            ))
        })
    }

    fn encoded<M: prost::Message>(msg: &M) -> Bytes {
        Bytes::from(msg.encode_to_vec())
    }

    #[test]
    fn test_procedure_kinds() {
        assert_eq!(greet().kind(), ProcedureType::Query);
        assert_eq!(noop_mutation().kind(), ProcedureType::Mutation);
        assert_eq!(ticks().kind(), ProcedureType::Subscription);
        assert_eq!(ProcedureType::Subscription.to_string(), "subscription");
        assert_eq!(ProcedureType::Mutation.category(), "mutations");
    }

    #[test]
    fn test_clone_shares_resolver() {
        let a = greet();
        let b = a.clone();
        assert!(a.same_as(&b));
        assert!(!a.same_as(&greet()));
    }

    #[test]
    fn test_meta() {
        let proc = greet().with_meta("auth", "required");
        assert_eq!(proc.meta().get("auth"), Some("required"));
        assert_eq!(proc.meta().get("missing"), None);
        assert!(greet().meta().is_empty());
    }

    #[tokio::test]
    async fn test_call_unary() {
        let out = greet()
            .call_unary((), encoded(&Name { name: "ada".into() }))
            .await
            .unwrap();
        let reply = <Greeting as prost::Message>::decode(out).unwrap();
        assert_eq!(reply.message, "hello ada");
    }

    #[tokio::test]
    async fn test_call_unary_decode_error() {
        let result = greet().call_unary((), Bytes::from_static(&[0xff, 0xff])).await;
        assert!(matches!(result, Err(ProcedureError::Decode(_))));
    }

    #[tokio::test]
    async fn test_resolver_status_propagates() {
        let failing = Procedure::query(|_ctx: (), _req: Name| async move {
            Err::<Greeting, _>(Status::permission_denied("nope"))
        });
        let result = failing.call_unary((), Bytes::new()).await;
        match result {
            Err(ProcedureError::Resolver(status)) => {
                assert_eq!(status.code(), tonic::Code::PermissionDenied)
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_call_stream() {
        let stream = ticks()
            .call_stream((), encoded(&Name { name: "tick".into() }))
            .await
            .unwrap();
        let messages: Vec<String> = stream
            .map(|item| <Greeting as prost::Message>::decode(item.unwrap()).unwrap().message)
            .collect()
            .await;
        assert_eq!(messages, vec!["tick 0", "tick 1", "tick 2"]);
    }

    #[tokio::test]
    async fn test_kind_mismatch() {
        let result = ticks().call_unary((), Bytes::new()).await;
        assert!(matches!(
            result,
            Err(ProcedureError::KindMismatch {
                found: ProcedureType::Subscription,
                ..
            })
        ));
        assert!(greet().call_stream((), Bytes::new()).await.is_err());
    }
}
