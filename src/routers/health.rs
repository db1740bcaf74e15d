use rpcrouter_lite::{ComposeError, Router, RouterFactory};

use crate::context::AppContext;
use crate::proto::{Empty, Health};

pub fn router(factory: &RouterFactory<AppContext>) -> Result<Router<AppContext>, ComposeError> {
    factory
        .router()
        .query("health", |_ctx: AppContext, _req: Empty| async move {
            Ok(Health {
                status: "ok".to_string(),
            })
        })
        .build()
}
