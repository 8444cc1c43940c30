use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;

/// Elevated role: staff or superuser
pub fn is_admin(user: &AuthUser) -> bool {
    user.is_staff || user.is_superuser
}

/// Object rule for user records: the owner, or an elevated role, may mutate
pub fn can_edit_user(user: &AuthUser, target_id: Uuid) -> bool {
    user.id == target_id || is_admin(user)
}

/// Catalog write gate: reads are open to any authenticated user, every
/// create/update/delete of wine records requires an elevated role.
pub fn require_catalog_write(user: &AuthUser) -> Result<(), ApiError> {
    if is_admin(user) {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "You do not have permission to modify the wine catalog",
        ))
    }
}

pub fn require_user_edit(user: &AuthUser, target_id: Uuid) -> Result<(), ApiError> {
    if can_edit_user(user, target_id) {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "You do not have permission to modify this user",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_user(is_staff: bool, is_superuser: bool) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: "taster@example.com".to_string(),
            is_staff,
            is_superuser,
        }
    }

    #[test]
    fn owner_may_edit_self() {
        let user = auth_user(false, false);
        assert!(can_edit_user(&user, user.id));
    }

    #[test]
    fn plain_user_may_not_edit_others() {
        let user = auth_user(false, false);
        assert!(!can_edit_user(&user, Uuid::new_v4()));
        assert!(require_user_edit(&user, Uuid::new_v4()).is_err());
    }

    #[test]
    fn staff_and_superuser_may_edit_anyone() {
        assert!(can_edit_user(&auth_user(true, false), Uuid::new_v4()));
        assert!(can_edit_user(&auth_user(false, true), Uuid::new_v4()));
    }

    #[test]
    fn catalog_writes_require_elevated_role() {
        assert!(require_catalog_write(&auth_user(false, false)).is_err());
        assert!(require_catalog_write(&auth_user(true, false)).is_ok());
        assert!(require_catalog_write(&auth_user(false, true)).is_ok());
    }
}
