use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Role {
    Admin = 1,
    HrManager = 2,
    HrUser = 3,
    ProjectManager = 4,
    Employee = 5,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::HrManager),
            3 => Some(Role::HrUser),
            4 => Some(Role::ProjectManager),
            5 => Some(Role::Employee),
            _ => None,
        }
    }

    /// Admin, HR Manager and HR User may act on any employee's records.
    pub fn is_hr(self) -> bool {
        matches!(self, Role::Admin | Role::HrManager | Role::HrUser)
    }

    /// Destructive attendance changes and WFH eligibility are limited to these.
    pub fn is_hr_manager(self) -> bool {
        matches!(self, Role::Admin | Role::HrManager)
    }

    pub fn is_project_privileged(self) -> bool {
        matches!(self, Role::Admin | Role::HrManager | Role::ProjectManager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for id in 1..=5 {
            assert_eq!(Role::from_id(id).map(|r| r as u8), Some(id));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(6), None);
    }

    #[test]
    fn role_groups() {
        assert!(Role::HrUser.is_hr());
        assert!(!Role::HrUser.is_hr_manager());
        assert!(!Role::ProjectManager.is_hr());
        assert!(Role::ProjectManager.is_project_privileged());
        assert!(!Role::Employee.is_project_privileged());
    }
}
