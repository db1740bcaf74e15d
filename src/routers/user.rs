use rpcrouter_lite::{ComposeError, Router, RouterFactory};
use tonic::Status;

use crate::context::AppContext;
use crate::proto::{ById, Empty, UserList};

pub fn router(factory: &RouterFactory<AppContext>) -> Result<Router<AppContext>, ComposeError> {
    factory
        .router()
        .query("user.byId", |ctx: AppContext, req: ById| async move {
            ctx.user(req.id)
                .cloned()
                .ok_or_else(|| Status::not_found(format!("user {} not found", req.id)))
        })
        .query("user.list", |ctx: AppContext, _req: Empty| async move {
            Ok(UserList {
                users: ctx.users().to_vec(),
            })
        })
        .build()
}
