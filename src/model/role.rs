use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

/// Role ids as carried in the `role` claim of an access token.
/// The string form matches `roles.type` in the database.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Role {
    Superadmin = 1,
    Admin = 2,
    Manager = 3,
    Employee = 4,
}

impl TryFrom<String> for Role {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Superadmin),
            2 => Some(Role::Admin),
            3 => Some(Role::Manager),
            4 => Some(Role::Employee),
            _ => None,
        }
    }

    /// ADMIN and SUPERADMIN take binding decisions.
    pub fn is_admin_level(&self) -> bool {
        matches!(self, Role::Admin | Role::Superadmin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_ids_round_trip_through_claims() {
        for role in [Role::Superadmin, Role::Admin, Role::Manager, Role::Employee] {
            assert_eq!(Role::from_id(role as u8), Some(role));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(9), None);
    }

    #[test]
    fn role_parses_database_type_string() {
        assert_eq!(Role::from_str("SUPERADMIN").unwrap(), Role::Superadmin);
        assert_eq!(Role::from_str("MANAGER").unwrap(), Role::Manager);
        assert_eq!(Role::Admin.to_string(), "ADMIN");
        assert!(Role::from_str("hr").is_err());
    }

    #[test]
    fn only_admin_and_superadmin_are_admin_level() {
        assert!(Role::Admin.is_admin_level());
        assert!(Role::Superadmin.is_admin_level());
        assert!(!Role::Manager.is_admin_level());
        assert!(!Role::Employee.is_admin_level());
    }
}
