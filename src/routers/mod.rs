//! The demo application's routers and how they are composed.

pub mod health;
pub mod post;
pub mod user;

use std::sync::Arc;
use tonic::Code;

use rpcrouter_lite::{
    ComposeError, DataTransformer, ErrorFormatter, ErrorShape, FormatterInput, LengthDelimited,
    RootConfig, Router, RouterFactory, Setting,
};

use crate::context::AppContext;

/// Tags every error with its procedure kind and hides internal messages
/// outside development mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppErrorFormatter {
    pub expose_internal: bool,
}

impl ErrorFormatter for AppErrorFormatter {
    fn format(&self, input: FormatterInput<'_>) -> ErrorShape {
        let mut shape = input.shape.with_data("kind", input.kind.as_str());
        if shape.code == Code::Internal && !self.expose_internal {
            shape.message = "internal server error".to_string();
        }
        shape
    }
}

/// The factory every application router is built from.
pub fn app_factory(is_dev: bool) -> RouterFactory<AppContext> {
    let formatter: Arc<dyn ErrorFormatter> = Arc::new(AppErrorFormatter {
        expose_internal: is_dev,
    });
    let transformer: Arc<dyn DataTransformer> = Arc::new(LengthDelimited);

    RouterFactory::new(
        RootConfig::builder()
            .error_formatter(Setting::Custom(formatter))
            .transformer(Setting::Custom(transformer))
            .is_dev(is_dev)
            .build(),
    )
}

/// Build the application router from its parts.
pub fn build_app(factory: &RouterFactory<AppContext>) -> Result<Router<AppContext>, ComposeError> {
    let health = health::router(factory)?;
    let users = user::router(factory)?;
    let posts = post::router(factory)?;

    factory.merge_routers(&health, &[&users, &posts])
}
