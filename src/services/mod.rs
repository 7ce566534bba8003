use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::repository::errors::RepositoryError;
use pushkind_common::routes::check_role;
use thiserror::Error;

use crate::ADMIN_ROLE;
use crate::domain::user::{NewUser, User};
use crate::repository::{UserReader, UserWriter};

pub mod delivery;
pub mod finance;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod stock;

/// Errors surfaced by the service layer to route handlers.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The user lacks the role required for the operation.
    #[error("unauthorized")]
    Unauthorized,
    /// The user has the role but does not own the record.
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    /// Invalid input; the message is safe to show to the user.
    #[error("{0}")]
    Form(String),
    /// The request clashes with existing data.
    #[error("{0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<RepositoryError> for ServiceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => ServiceError::NotFound,
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

/// Succeeds when the user holds any of `roles`. Admins pass every check.
pub(crate) fn ensure_any_role(user: &AuthenticatedUser, roles: &[&str]) -> ServiceResult<()> {
    if check_role(ADMIN_ROLE, &user.roles) || roles.iter().any(|role| check_role(role, &user.roles))
    {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized)
    }
}

/// Local record of the authenticated user, created on first use.
pub(crate) fn ensure_user<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<User>
where
    R: UserReader + UserWriter + ?Sized,
{
    if let Some(existing) = repo
        .get_user_by_email(&user.email, user.hub_id)
        .map_err(ServiceError::from)?
    {
        return Ok(existing);
    }

    log::info!("registering local user {} for hub {}", user.email, user.hub_id);
    repo.create_user(&NewUser::from(user))
        .map_err(ServiceError::from)
}
