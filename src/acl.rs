//! Permission checks for collection routes.
//!
//! A collection mounted with both an ACL name and an [`Authorizer`] gets a
//! route layer per operation asking for `{acl_name}.{action}`, e.g.
//! `posts.edit`. Without either, routes are unguarded.

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::errors::ApiError;

/// Decides whether a request holds a named permission.
///
/// Return `Err` to reject the request; the error becomes the response, so
/// pick [`ApiError::unauthorized`] or [`ApiError::forbidden`] as fits.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn check(&self, permission: &str, parts: &Parts) -> Result<(), ApiError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AclAction {
    /// Covers both listing and reading a single document.
    List,
    Create,
    Edit,
    Delete,
}

impl AclAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }
}

#[must_use]
pub fn permission_name(acl_name: &str, action: AclAction) -> String {
    format!("{acl_name}.{}", action.as_str())
}

/// State for [`acl_gate`]: who decides, and what is asked for.
#[derive(Clone)]
pub struct AclGate {
    authorizer: Arc<dyn Authorizer>,
    permission: Arc<str>,
}

impl AclGate {
    #[must_use]
    pub fn new(authorizer: Arc<dyn Authorizer>, acl_name: &str, action: AclAction) -> Self {
        Self {
            authorizer,
            permission: permission_name(acl_name, action).into(),
        }
    }

    #[must_use]
    pub fn permission(&self) -> &str {
        &self.permission
    }
}

/// Route middleware, for use with `axum::middleware::from_fn_with_state`.
///
/// # Errors
///
/// Forwards the authorizer's rejection.
pub async fn acl_gate(
    State(gate): State<AclGate>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (parts, body) = request.into_parts();
    if let Err(err) = gate.authorizer.check(&gate.permission, &parts).await {
        tracing::debug!(permission = %gate.permission, "permission check failed");
        return Err(err);
    }
    Ok(next.run(Request::from_parts(parts, body)).await)
}
