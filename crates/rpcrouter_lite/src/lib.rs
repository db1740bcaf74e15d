//! Typed RPC routers and router composition.
//!
//! Routers are defined independently, each holding its own queries,
//! mutations and subscriptions, and are then merged into one application
//! router with [`merge_routers`].
//!
//! # Example
//!
//! ```ignore
//! use rpcrouter_lite::{Router, merge_routers};
//!
//! let users = Router::builder()
//!     .query("user.byId", user_by_id)
//!     .build()?;
//! let posts = Router::builder()
//!     .query("post.byId", post_by_id)
//!     .mutation("post.add", add_post)
//!     .build()?;
//!
//! let app = merge_routers(&users, &[&posts])?;
//! println!("{}", app.schema());
//! ```

pub mod error;
pub mod procedure;
pub mod record;
pub mod router;
pub mod settings;

pub use error::{CallError, ComposeError, ProcedureError, TransformError};
pub use procedure::{Procedure, ProcedureMeta, ProcedureType};
pub use record::{ProcedureRecord, merge_without_overrides};
pub use router::{
    Caller, RootConfig, Router, RouterBuilder, RouterFactory, RouterParts, RouterSchema,
    merge_routers,
};
pub use settings::formatter::{DefaultErrorFormatter, ErrorFormatter, ErrorShape, FormatterInput};
pub use settings::transformer::{DataTransformer, DefaultTransformer, LengthDelimited};
pub use settings::{Setting, SettingKind, reconcile};
