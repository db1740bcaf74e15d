use std::iter;
use tracing::info;

use crate::error::ComposeError;
use crate::procedure::ProcedureType;
use crate::record::merge_without_overrides;
use crate::router::{Router, RouterFactory, RouterParts};
use crate::settings::{SettingKind, reconcile};

impl<Ctx> RouterFactory<Ctx> {
    /// Compose `main` and `rest` into a new router built by this factory.
    ///
    /// All routers are treated alike: procedures are merged per category
    /// without overrides and each setting is reconciled to its single
    /// non-default value. The first failure aborts the composition. With no
    /// `rest` the result is still a fresh router carrying `main`'s content.
    pub fn merge_routers(
        &self,
        main: &Router<Ctx>,
        rest: &[&Router<Ctx>],
    ) -> Result<Router<Ctx>, ComposeError> {
        let routers: Vec<&Router<Ctx>> = iter::once(main).chain(rest.iter().copied()).collect();

        let queries = merge_without_overrides(
            ProcedureType::Query,
            routers.iter().map(|r| r.queries()),
        )?;
        let mutations = merge_without_overrides(
            ProcedureType::Mutation,
            routers.iter().map(|r| r.mutations()),
        )?;
        let subscriptions = merge_without_overrides(
            ProcedureType::Subscription,
            routers.iter().map(|r| r.subscriptions()),
        )?;

        let error_formatter = reconcile(
            SettingKind::ErrorFormatter,
            routers.iter().map(|r| r.error_formatter()),
        )?;
        let transformer = reconcile(
            SettingKind::Transformer,
            routers.iter().map(|r| r.transformer()),
        )?;

        let router = self.create(RouterParts {
            queries,
            mutations,
            subscriptions,
            error_formatter,
            transformer,
        });

        info!(
            routers = routers.len(),
            queries = router.queries().len(),
            mutations = router.mutations().len(),
            subscriptions = router.subscriptions().len(),
            "Composed router"
        );

        Ok(router)
    }
}

/// Compose routers using `main`'s configuration.
///
/// # Example
/// ```ignore
/// let app = merge_routers(&user_router, &[&post_router, &admin_router])?;
/// ```
pub fn merge_routers<Ctx>(
    main: &Router<Ctx>,
    rest: &[&Router<Ctx>],
) -> Result<Router<Ctx>, ComposeError> {
    RouterFactory::from_shared(main.shared_config().clone()).merge_routers(main, rest)
}
