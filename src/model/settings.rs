use serde::Serialize;
use utoipa::ToSchema;

pub const DEFAULT_WORKING_DAYS_PER_MONTH: i32 = 22;

/// Snapshot of company-wide settings, read once at the start of an
/// operation and passed down rather than re-read mid-transaction.
#[derive(Debug, Clone, Default, Serialize, sqlx::FromRow, ToSchema)]
pub struct CompanySettings {
    pub working_days_per_month: Option<i32>,
    /// Gates manager approval, manager withdrawal and manager admin-add.
    pub allow_manager_add_leave: bool,
}

impl CompanySettings {
    pub fn working_days_per_month(&self) -> i32 {
        match self.working_days_per_month {
            Some(days) if days > 0 => days,
            _ => DEFAULT_WORKING_DAYS_PER_MONTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn working_days_fall_back_to_22() {
        assert_eq!(CompanySettings::default().working_days_per_month(), 22);
        let zero = CompanySettings {
            working_days_per_month: Some(0),
            allow_manager_add_leave: true,
        };
        assert_eq!(zero.working_days_per_month(), 22);
        let set = CompanySettings {
            working_days_per_month: Some(20),
            allow_manager_add_leave: false,
        };
        assert_eq!(set.working_days_per_month(), 20);
    }
}
