pub mod attendance;
pub mod dashboard;
pub mod department;
pub mod employee;
pub mod holiday;
pub mod leave;
pub mod overtime;
pub mod overtime_plan;
pub mod payroll;
pub mod recruitment;
