use bon::Builder;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::router::builder::RouterBuilder;
use crate::router::{Router, RouterParts};
use crate::settings::Setting;
use crate::settings::formatter::ErrorFormatter;
use crate::settings::transformer::DataTransformer;

/// Framework-wide configuration shared by every router built from one factory.
///
/// # Example
/// ```ignore
/// let config = RootConfig::builder()
///     .transformer(Setting::custom(Arc::new(LengthDelimited)))
///     .is_dev(true)
///     .build();
/// let factory = RouterFactory::<AppContext>::new(config);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct RootConfig {
    /// Error formatter given to routers built from this config.
    #[builder(default)]
    pub error_formatter: Setting<dyn ErrorFormatter>,

    /// Data transformer given to routers built from this config.
    #[builder(default)]
    pub transformer: Setting<dyn DataTransformer>,

    /// Whether routers run on the server side.
    #[builder(default = true)]
    pub is_server: bool,

    /// Development mode; error shapes keep internal details.
    #[builder(default)]
    pub is_dev: bool,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            error_formatter: Setting::Default,
            transformer: Setting::Default,
            is_server: true,
            is_dev: false,
        }
    }
}

/// Creates routers that share one [`RootConfig`] and one context type.
pub struct RouterFactory<Ctx> {
    config: Arc<RootConfig>,
    _ctx: PhantomData<fn() -> Ctx>,
}

impl<Ctx> RouterFactory<Ctx> {
    pub fn new(config: RootConfig) -> Self {
        Self::from_shared(Arc::new(config))
    }

    pub(crate) fn from_shared(config: Arc<RootConfig>) -> Self {
        Self {
            config,
            _ctx: PhantomData,
        }
    }

    pub fn config(&self) -> &RootConfig {
        &self.config
    }

    /// Start defining a router that inherits this factory's settings.
    pub fn router(&self) -> RouterBuilder<Ctx> {
        RouterBuilder::new(Arc::clone(&self.config))
    }

    /// Bundle already-merged parts into a router.
    ///
    /// This is a plain constructor: the parts are taken as they are and only
    /// the ambient configuration is attached.
    pub fn create(&self, parts: RouterParts<Ctx>) -> Router<Ctx> {
        Router::from_parts(parts, Arc::clone(&self.config))
    }
}

impl<Ctx> Default for RouterFactory<Ctx> {
    fn default() -> Self {
        Self::new(RootConfig::default())
    }
}

impl<Ctx> Clone for RouterFactory<Ctx> {
    fn clone(&self) -> Self {
        Self::from_shared(Arc::clone(&self.config))
    }
}

impl<Ctx> fmt::Debug for RouterFactory<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterFactory")
            .field("config", &self.config)
            .finish()
    }
}
