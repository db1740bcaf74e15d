use async_stream::stream;
use rpcrouter_lite::{ComposeError, Procedure, Router, RouterFactory};
use tokio::sync::broadcast::error::RecvError;
use tonic::Status;
use tracing::{info, warn};

use crate::context::AppContext;
use crate::proto::{AddPost, ById, Empty, PostList};

pub fn router(factory: &RouterFactory<AppContext>) -> Result<Router<AppContext>, ComposeError> {
    let add = Procedure::mutation(|ctx: AppContext, req: AddPost| async move {
        if req.title.trim().is_empty() {
            return Err(Status::invalid_argument("title must not be empty"));
        }
        if ctx.user(req.author_id).is_none() {
            return Err(Status::not_found(format!("user {} not found", req.author_id)));
        }
        let post = ctx.add_post(req.author_id, req.title).await;
        info!(post_id = post.id, author_id = post.author_id, "Added post");
        Ok(post)
    })
    .with_meta("auth", "required");

    factory
        .router()
        .query("post.byId", |ctx: AppContext, req: ById| async move {
            ctx.post(req.id)
                .await
                .ok_or_else(|| Status::not_found(format!("post {} not found", req.id)))
        })
        .query("post.list", |ctx: AppContext, _req: Empty| async move {
            Ok(PostList {
                posts: ctx.posts().await,
            })
        })
        .procedure("post.add", add)
        .subscription("post.onAdd", |ctx: AppContext, _req: Empty| async move {
            let mut events = ctx.subscribe_posts();
            Ok(stream! {
                loop {
                    match events.recv().await {
                        Ok(post) => {
                            yield Ok::<_, Status>(post);
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "post.onAdd subscriber lagged");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            })
        })
        .build()
}
