pub mod employee;
pub mod holiday;
pub mod leave;
pub mod leave_balance;
pub mod leave_type;
pub mod payroll;
pub mod role;
pub mod settings;
