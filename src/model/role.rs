use crate::workflow::ApproverRole;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Employee = 3,
    Supervisor = 4,
    DepartmentHead = 5,
    Cfo = 6,
    Ceo = 7,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            4 => Some(Role::Supervisor),
            5 => Some(Role::DepartmentHead),
            6 => Some(Role::Cfo),
            7 => Some(Role::Ceo),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// The approval step this role signs, if any. Admin signs none by
    /// default and has to name the step it acts for.
    pub fn approver_role(self) -> Option<ApproverRole> {
        match self {
            Role::Supervisor => Some(ApproverRole::Supervisor),
            Role::DepartmentHead => Some(ApproverRole::DepartmentHead),
            Role::Hr => Some(ApproverRole::Hr),
            Role::Cfo => Some(ApproverRole::Cfo),
            Role::Ceo => Some(ApproverRole::Ceo),
            Role::Admin | Role::Employee => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for id in 1..=7 {
            assert_eq!(Role::from_id(id).map(Role::id), Some(id));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(8), None);
    }

    #[test]
    fn only_approvers_sign_steps() {
        assert_eq!(Role::Cfo.approver_role(), Some(ApproverRole::Cfo));
        assert_eq!(Role::Employee.approver_role(), None);
        assert_eq!(Role::Admin.approver_role(), None);
    }
}
