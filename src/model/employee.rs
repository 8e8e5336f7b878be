use serde::Serialize;

use crate::model::role::Role;

/// What the leave and payroll flows need to know about an employee.
/// Profile maintenance lives elsewhere; this is read-only here.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EmployeeRecord {
    pub id: u64,
    pub full_name: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub manager_id: Option<u64>,
    pub salary: f64,
    /// active | inactive | suspended
    pub status: String,
    pub deleted: bool,
}

impl EmployeeRecord {
    pub fn is_active(&self) -> bool {
        !self.deleted && self.status.eq_ignore_ascii_case("active")
    }

    pub fn reports_to(&self, manager_id: u64) -> bool {
        self.manager_id == Some(manager_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(status: &str, deleted: bool) -> EmployeeRecord {
        EmployeeRecord {
            id: 1,
            full_name: "Asha Rao".into(),
            email: "asha@example.com".into(),
            role: Role::Employee,
            manager_id: Some(9),
            salary: 44000.0,
            status: status.into(),
            deleted,
        }
    }

    #[test]
    fn only_undeleted_active_employees_are_active() {
        assert!(employee("active", false).is_active());
        assert!(employee("ACTIVE", false).is_active());
        assert!(!employee("suspended", false).is_active());
        assert!(!employee("active", true).is_active());
    }

    #[test]
    fn reports_to_checks_direct_manager_only() {
        let e = employee("active", false);
        assert!(e.reports_to(9));
        assert!(!e.reports_to(1));
    }
}
