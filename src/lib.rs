pub mod codec;
pub mod context;
pub mod mode;
pub mod proto;
pub mod routers;

pub use context::AppContext;
pub use mode::Mode;
pub use routers::{app_factory, build_app};

/// Environment variable selecting what the `compose` binary does.
pub const MODE_ENV: &str = "RPC_COMPOSE_MODE";

/// Environment variable enabling development mode.
pub const DEV_ENV: &str = "RPC_COMPOSE_DEV";
