use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 3,
    "name": "Unpaid Leave",
    "is_paid": false,
    "default_entitlement": 10
}))]
pub struct LeaveType {
    pub id: u64,
    pub name: String,
    pub is_paid: bool,
    /// Annual quota seeded into a balance the first time it is used.
    pub default_entitlement: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LeaveTypeInput {
    #[schema(example = "Casual Leave")]
    pub name: String,
    #[schema(example = true)]
    pub is_paid: bool,
    #[schema(example = 12)]
    pub default_entitlement: i32,
}

impl LeaveTypeInput {
    /// Trimmed name, non-negative entitlement.
    pub fn validated(self) -> Result<Self, AppError> {
        let name = self.name.trim().to_string();
        if name.is_empty() || name.chars().count() > 50 {
            return Err(AppError::validation(
                "name must be between 1 and 50 characters",
            ));
        }
        if self.default_entitlement < 0 {
            return Err(AppError::validation(
                "default_entitlement cannot be negative",
            ));
        }
        Ok(Self { name, ..self })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, entitlement: i32) -> LeaveTypeInput {
        LeaveTypeInput {
            name: name.into(),
            is_paid: false,
            default_entitlement: entitlement,
        }
    }

    #[test]
    fn name_is_trimmed_and_required() {
        assert_eq!(input("  Sick Leave ", 10).validated().unwrap().name, "Sick Leave");
        assert!(input("   ", 10).validated().is_err());
        assert!(input(&"x".repeat(51), 10).validated().is_err());
    }

    #[test]
    fn entitlement_cannot_be_negative() {
        assert!(input("Unpaid Leave", -1).validated().is_err());
        assert_eq!(input("Unpaid Leave", 0).validated().unwrap().default_entitlement, 0);
    }
}
