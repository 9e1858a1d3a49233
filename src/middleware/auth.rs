//! Authorisation for every signed-in page.
//!
//! The session layer in front of this service puts the signed-in `User` and
//! the `SessionContext` into request extensions. `user_is_authorised` checks
//! them in a fixed order and stops at the first failure; when the route names
//! a service or gateway account it also checks the user holds a role there
//! and stores the result as an `AuthContext` for handlers.

use std::sync::Arc;

use axum::extract::{RawPathParams, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::errors::{AppError, DomainError};
use crate::models::gateway_account::{AccountType, GatewayAccount};
use crate::models::service::ServiceRole;
use crate::models::user::User;
use crate::state::AppState;

pub const SERVICE_EXTERNAL_ID: &str = "service_external_id";
pub const ACCOUNT_EXTERNAL_ID: &str = "account_external_id";
pub const ACCOUNT_TYPE: &str = "account_type";

/// What the session layer knows about the current browser session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub version: u32,
    /// Set once the user has entered their second factor code.
    pub second_factor: Option<String>,
}

/// Result of a successful authorisation, available to handlers via `Extension`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
    pub service_role: Option<ServiceRole>,
    pub account: Option<GatewayAccount>,
}

impl AuthContext {
    pub fn service_role(&self) -> Result<&ServiceRole, DomainError> {
        self.service_role.as_ref().ok_or_else(|| {
            DomainError::NotAuthorised("No service found for request".to_string())
        })
    }

    pub fn account(&self) -> Result<&GatewayAccount, DomainError> {
        self.account.as_ref().ok_or_else(|| {
            DomainError::NotFound("No gateway account found for request".to_string())
        })
    }

    /// The resolved service role must carry `permission`.
    pub fn require_permission(&self, permission: &str) -> Result<(), DomainError> {
        let role = self.service_role()?;
        if role.role.has_permission(permission) {
            return Ok(());
        }
        tracing::warn!(
            user_external_id = %self.user.external_id,
            service_external_id = %role.service.external_id,
            role = %role.role.name,
            permission,
            "permission denied"
        );
        Err(DomainError::PermissionDenied(format!(
            "User does not have permission {} for service {}",
            permission, role.service.external_id
        )))
    }
}

/// Session checks: user, session, session version, second factor, disabled flag.
pub fn check_user_session<'a>(
    user: Option<&'a User>,
    session: Option<&SessionContext>,
) -> Result<&'a User, DomainError> {
    let user = user.ok_or_else(|| DomainError::NotAuthenticated("no user on request".into()))?;
    let session =
        session.ok_or_else(|| DomainError::NotAuthenticated("no session on request".into()))?;

    if session.version != user.session_version {
        return Err(DomainError::NotAuthenticated(format!(
            "Invalid session version for user. User session_version: {}, session version {}",
            user.session_version, session.version
        )));
    }
    if session.second_factor.is_none() {
        return Err(DomainError::NotAuthenticated(
            "user has not completed second factor".into(),
        ));
    }
    if user.disabled {
        return Err(DomainError::UserAccountDisabled("User account is disabled".into()));
    }
    Ok(user)
}

pub fn check_service_role<'a>(
    user: &'a User,
    service_external_id: &str,
) -> Result<&'a ServiceRole, DomainError> {
    user.service_role_for(service_external_id).ok_or_else(|| {
        DomainError::NotAuthorised(format!(
            "User does not have service role for service {}",
            service_external_id
        ))
    })
}

pub fn check_account_role<'a>(
    user: &'a User,
    account: &GatewayAccount,
) -> Result<&'a ServiceRole, DomainError> {
    user.service_role_for_gateway_account(account.gateway_account_id)
        .ok_or_else(|| {
            DomainError::NotAuthorised(format!(
                "User does not have service role for gateway account {}",
                account.external_id
            ))
        })
}

/// Services on which the user holds `permission`, in role order.
pub fn services_with_permission<'a>(
    user: &'a User,
    permission: &str,
) -> Result<Vec<&'a ServiceRole>, DomainError> {
    let roles: Vec<_> = user
        .service_roles
        .iter()
        .filter(|sr| sr.role.has_permission(permission))
        .collect();
    if roles.is_empty() {
        return Err(DomainError::NoServicesWithPermission(format!(
            "User does not have any services with permission {}",
            permission
        )));
    }
    Ok(roles)
}

/// Middleware: authorise the signed-in user for the route's service / account.
/// Must be attached with `route_layer` so path parameters are available.
pub async fn user_is_authorised(
    State(state): State<Arc<AppState>>,
    params: RawPathParams,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = check_user_session(
        req.extensions().get::<User>(),
        req.extensions().get::<SessionContext>(),
    )?
    .clone();

    let mut service_id = None;
    let mut account_id = None;
    let mut account_type = None;
    for (key, value) in params.iter() {
        match key {
            SERVICE_EXTERNAL_ID => service_id = Some(value.to_string()),
            ACCOUNT_EXTERNAL_ID => account_id = Some(value.to_string()),
            ACCOUNT_TYPE => account_type = Some(value.to_string()),
            _ => {}
        }
    }

    let mut service_role = None;
    let mut account = None;

    if let Some(service_id) = &service_id {
        let role = check_service_role(&user, service_id)?;
        service_role = Some(role.clone());

        if let Some(account_type) = &account_type {
            let account_type = parse_account_type(account_type)?;
            let found = state
                .connector
                .get_account_by_service_and_type(service_id, account_type)
                .await?;
            if !role.service.owns_gateway_account(found.gateway_account_id) {
                return Err(DomainError::NotAuthorised(format!(
                    "Gateway account {} does not belong to service {}",
                    found.external_id, service_id
                ))
                .into());
            }
            account = Some(found);
        }
    }

    if let Some(account_id) = &account_id {
        let found = state.connector.get_account_by_external_id(account_id).await?;
        let role = check_account_role(&user, &found)?;
        service_role = Some(role.clone());
        account = Some(found);
    }

    tracing::debug!(
        user_external_id = %user.external_id,
        service_external_id = ?service_role.as_ref().map(|r| r.service.external_id.as_str()),
        "user authorised"
    );

    req.extensions_mut().insert(AuthContext {
        user,
        service_role,
        account,
    });
    Ok(next.run(req).await)
}

fn parse_account_type(value: &str) -> Result<AccountType, DomainError> {
    match value {
        "test" => Ok(AccountType::Test),
        "live" => Ok(AccountType::Live),
        other => Err(DomainError::NotFound(format!(
            "Unknown account type {}",
            other
        ))),
    }
}

// ── Tests ───────────────────────────────────────────────────────
