use crate::error::AppError;
use crate::model::role::Role;
use crate::service::leave_policy::Actor;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

/// Caller identity placed in the request extensions by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| AppError::Unauthorized("Missing token".into())),
        )
    }
}

impl AuthUser {
    /// Leave and payroll operations act as an employee; accounts without an
    /// employee profile cannot use them.
    pub fn actor(&self) -> Result<Actor, AppError> {
        let employee_id = self
            .employee_id
            .ok_or_else(|| AppError::forbidden("No employee profile linked to this account"))?;
        Ok(Actor {
            employee_id,
            role: self.role,
        })
    }

    pub fn require_admin_level(&self) -> Result<(), AppError> {
        if self.role.is_admin_level() {
            Ok(())
        } else {
            Err(AppError::forbidden("Admin only"))
        }
    }

    pub fn require_superadmin(&self) -> Result<(), AppError> {
        if self.role == Role::Superadmin {
            Ok(())
        } else {
            Err(AppError::forbidden("Superadmin only"))
        }
    }

    pub fn is_admin_level(&self) -> bool {
        self.role.is_admin_level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn user(role: Role, employee_id: Option<u64>) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "asha".into(),
            role,
            employee_id,
        }
    }

    #[actix_web::test]
    async fn extracts_user_set_by_middleware() {
        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(user(Role::Manager, Some(7)));
        let extracted = AuthUser::extract(&req).await.unwrap();
        assert_eq!(extracted.role, Role::Manager);
        assert_eq!(extracted.employee_id, Some(7));
    }

    #[actix_web::test]
    async fn missing_identity_is_unauthorized() {
        let req = TestRequest::default().to_http_request();
        let err = AuthUser::extract(&req).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn actor_requires_employee_profile() {
        assert!(user(Role::Admin, None).actor().is_err());
        let actor = user(Role::Admin, Some(3)).actor().unwrap();
        assert_eq!(actor.employee_id, 3);
        assert_eq!(actor.role, Role::Admin);
    }

    #[test]
    fn role_guards() {
        assert!(user(Role::Superadmin, None).require_superadmin().is_ok());
        assert!(user(Role::Admin, None).require_superadmin().is_err());
        assert!(user(Role::Admin, None).require_admin_level().is_ok());
        assert!(user(Role::Manager, None).require_admin_level().is_err());
    }
}
