//! Ownership guard: second authorization pass for individually owned resources.
//!
//! Runs after [`super::access`], which has already put an [`AuthCtx`] into the request.
//! Administrators pass unconditionally. Everyone else must be the resource's owner:
//! collaborators on a project are not owners.
//!
//! Each resource type is one row of [`RULES`]: which path parameter carries the id and
//! how to read the owner. Adding a resource type means adding a row.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use axum::{
    Router,
    body::Body,
    extract::{Path, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::repos::CredentialStore;
use crate::repos::error::RepoResult;
use crate::services::auth::AuthError;
use crate::state::AppState;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Reads the owner id of the resource `id`; `None` when the resource does not exist.
pub type OwnerLookup =
    for<'a> fn(&'a dyn CredentialStore, i64) -> BoxFuture<'a, RepoResult<Option<i64>>>;

pub struct OwnershipRule {
    pub tag: &'static str,
    pub param: &'static str,
    pub resource: &'static str,
    pub owner_of: OwnerLookup,
}

pub const RULES: &[OwnershipRule] = &[
    OwnershipRule {
        tag: "user",
        param: "user_id",
        resource: "user",
        owner_of: self_owned,
    },
    OwnershipRule {
        tag: "project",
        param: "project_id",
        resource: "project",
        owner_of: project_owner,
    },
    OwnershipRule {
        tag: "task",
        param: "task_id",
        resource: "task",
        owner_of: task_owner,
    },
];

// A user "owns" their own account; no store read.
fn self_owned<'a>(_: &'a dyn CredentialStore, id: i64) -> BoxFuture<'a, RepoResult<Option<i64>>> {
    Box::pin(async move { Ok(Some(id)) })
}

fn project_owner<'a>(
    store: &'a dyn CredentialStore,
    id: i64,
) -> BoxFuture<'a, RepoResult<Option<i64>>> {
    store.project_owner_id(id)
}

fn task_owner<'a>(
    store: &'a dyn CredentialStore,
    id: i64,
) -> BoxFuture<'a, RepoResult<Option<i64>>> {
    store.task_owner_id(id)
}

pub fn rule(tag: &str) -> Option<&'static OwnershipRule> {
    RULES.iter().find(|r| r.tag == tag)
}

#[derive(Clone)]
struct OwnerPolicy {
    app: AppState,
    tag: &'static str,
}

/// Guard every route of `router` with the ownership rule named `tag`.
///
/// Must be applied before (inside) `access::apply` so that the identity is present.
/// An unknown tag is reported per request as 400, not at startup.
pub fn apply(router: Router<AppState>, state: AppState, tag: &'static str) -> Router<AppState> {
    let policy = OwnerPolicy { app: state, tag };
    router.route_layer(middleware::from_fn_with_state(policy, owner_middleware))
}

async fn owner_middleware(
    State(policy): State<OwnerPolicy>,
    Path(params): Path<HashMap<String, String>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = req.extensions().get::<AuthCtx>().cloned();

    if let Err(err) =
        check_ownership(policy.app.store.as_ref(), ctx.as_ref(), policy.tag, &params).await
    {
        tracing::warn!(
            error = %err,
            user_id = ?ctx.as_ref().map(|c| c.user_id),
            resource = policy.tag,
            "request rejected by ownership guard"
        );
        return Err(err.into());
    }

    Ok(next.run(req).await)
}

pub async fn check_ownership(
    store: &dyn CredentialStore,
    ctx: Option<&AuthCtx>,
    tag: &str,
    params: &HashMap<String, String>,
) -> Result<(), AuthError> {
    let ctx = ctx.ok_or(AuthError::Unauthenticated)?;

    if ctx.is_admin() {
        return Ok(());
    }

    let rule = rule(tag).ok_or_else(|| AuthError::BadGuardConfig(tag.to_string()))?;

    let id: i64 = params
        .get(rule.param)
        .and_then(|raw| raw.parse().ok())
        .ok_or(AuthError::InvalidResourceId)?;

    let owner_id = (rule.owner_of)(store, id)
        .await?
        .ok_or(AuthError::ResourceNotFound(rule.resource))?;

    if owner_id == ctx.user_id {
        Ok(())
    } else {
        Err(AuthError::NotOwner)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::repos::memory::MemoryStore;
    use crate::repos::store::ProjectStore;
    use crate::services::auth::roles;

    fn ctx(user_id: i64, role_names: &[&str]) -> AuthCtx {
        AuthCtx::new(
            user_id,
            role_names.iter().map(|r| r.to_string()).collect::<BTreeSet<_>>(),
        )
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.seed_user(5, "five@example.com", "x", &[roles::USER]);
        store.seed_user(7, "seven@example.com", "x", &[roles::USER]);
        store.seed_project(70, 7);
        store.seed_project(50, 5);
        store.seed_task(42, 7);
        store
    }

    #[tokio::test]
    async fn project_owner_only() {
        let store = store();
        let user5 = ctx(5, &[roles::USER]);

        assert!(matches!(
            check_ownership(&store, Some(&user5), "project", &params(&[("project_id", "70")]))
                .await,
            Err(AuthError::NotOwner)
        ));
        assert!(
            check_ownership(&store, Some(&user5), "project", &params(&[("project_id", "50")]))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn admin_bypasses_every_resource_type() {
        let store = store();
        let admin = ctx(1, &[roles::ADMIN]);

        for (tag, p) in [
            ("project", ("project_id", "70")),
            ("task", ("task_id", "42")),
            ("user", ("user_id", "7")),
            // even ids that do not exist
            ("task", ("task_id", "999")),
        ] {
            assert!(
                check_ownership(&store, Some(&admin), tag, &params(&[p]))
                    .await
                    .is_ok()
            );
        }
    }

    #[tokio::test]
    async fn user_rule_is_self_service() {
        let store = store();
        let user5 = ctx(5, &[roles::USER]);

        assert!(
            check_ownership(&store, Some(&user5), "user", &params(&[("user_id", "5")]))
                .await
                .is_ok()
        );
        assert!(matches!(
            check_ownership(&store, Some(&user5), "user", &params(&[("user_id", "7")])).await,
            Err(AuthError::NotOwner)
        ));
    }

    #[tokio::test]
    async fn collaborator_is_not_owner() {
        let store = store();
        store.add_project_user(70, 5).await.unwrap();

        assert!(matches!(
            check_ownership(
                &store,
                Some(&ctx(5, &[roles::USER])),
                "project",
                &params(&[("project_id", "70")])
            )
            .await,
            Err(AuthError::NotOwner)
        ));
    }

    #[tokio::test]
    async fn missing_resource_is_not_found_not_forbidden() {
        let store = store();

        assert!(matches!(
            check_ownership(
                &store,
                Some(&ctx(5, &[roles::USER])),
                "task",
                &params(&[("task_id", "404")])
            )
            .await,
            Err(AuthError::ResourceNotFound("task"))
        ));
    }

    #[tokio::test]
    async fn bad_inputs() {
        let store = store();
        let user5 = ctx(5, &[roles::USER]);

        assert!(matches!(
            check_ownership(&store, None, "task", &params(&[("task_id", "42")])).await,
            Err(AuthError::Unauthenticated)
        ));
        assert!(matches!(
            check_ownership(&store, Some(&user5), "comment", &params(&[("comment_id", "1")]))
                .await,
            Err(AuthError::BadGuardConfig(_))
        ));
        assert!(matches!(
            check_ownership(&store, Some(&user5), "task", &params(&[("task_id", "abc")])).await,
            Err(AuthError::InvalidResourceId)
        ));
    }

    #[test]
    fn every_rule_has_a_unique_tag() {
        let tags: BTreeSet<_> = RULES.iter().map(|r| r.tag).collect();
        assert_eq!(tags.len(), RULES.len());
        assert!(rule("user").is_some());
        assert!(rule("comment").is_none());
    }
}
