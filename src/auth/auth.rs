use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::model::role::Role;
use crate::models::{Claims, TokenType};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

use super::jwt::verify_token;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl AuthUser {
    pub fn from_claims(claims: Claims) -> ApiResult<Self> {
        if claims.token_type != TokenType::Access {
            return Err(ApiError::Unauthorized("Access token required".into()));
        }
        let role = Role::from_id(claims.role)
            .ok_or_else(|| ApiError::Unauthorized("Invalid role".into()))?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
            employee_id: claims.employee_id,
        })
    }

    fn from_header(req: &HttpRequest) -> ApiResult<Self> {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::Unauthorized("Missing token".into()))?;

        let config = req
            .app_data::<Data<Config>>()
            .ok_or_else(|| ApiError::Internal("Config missing".into()))?;

        let claims = verify_token(token, &config.jwt_secret)
            .map_err(|_| ApiError::Unauthorized("Invalid token".into()))?;

        Self::from_claims(claims)
    }
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // The auth middleware has usually decoded the token already.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }
        ready(Self::from_header(req))
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> ApiResult<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin only"))
        }
    }

    pub fn require_hr(&self) -> ApiResult<()> {
        if self.role.is_hr() {
            Ok(())
        } else {
            Err(ApiError::forbidden("You do not have permission to access this resource"))
        }
    }

    pub fn require_hr_manager(&self) -> ApiResult<()> {
        if self.role.is_hr_manager() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Only Admin or HR Manager can perform this action"))
        }
    }

    pub fn require_project_privileged(&self) -> ApiResult<()> {
        if self.role.is_project_privileged() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Not permitted"))
        }
    }

    pub fn is_hr(&self) -> bool {
        self.role.is_hr()
    }

    /// The caller's own employee record.
    pub fn employee_id(&self) -> ApiResult<u64> {
        self.employee_id
            .ok_or_else(|| ApiError::forbidden("No employee profile linked to this user"))
    }

    /// Employee a request acts on: the caller's own unless `requested` names
    /// someone else, which needs an HR role.
    pub fn target_employee(&self, requested: Option<u64>) -> ApiResult<u64> {
        match requested {
            Some(id) if Some(id) == self.employee_id => Ok(id),
            Some(id) => {
                self.require_hr()?;
                Ok(id)
            }
            None => self.employee_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, employee_id: Option<u64>) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "u".into(),
            role,
            employee_id,
        }
    }

    #[test]
    fn employees_act_only_for_themselves() {
        let emp = user(Role::Employee, Some(4));
        assert_eq!(emp.target_employee(None).unwrap(), 4);
        assert_eq!(emp.target_employee(Some(4)).unwrap(), 4);
        assert!(matches!(emp.target_employee(Some(5)), Err(ApiError::Forbidden(_))));
    }

    #[test]
    fn hr_may_act_for_others() {
        let hr = user(Role::HrUser, None);
        assert_eq!(hr.target_employee(Some(5)).unwrap(), 5);
        assert!(matches!(hr.target_employee(None), Err(ApiError::Forbidden(_))));
    }

    #[test]
    fn refresh_claims_are_not_accepted() {
        let claims = Claims {
            user_id: 1,
            sub: "u".into(),
            role: 5,
            exp: 0,
            jti: "j".into(),
            token_type: TokenType::Refresh,
            employee_id: None,
        };
        assert!(matches!(AuthUser::from_claims(claims), Err(ApiError::Unauthorized(_))));
    }
}
