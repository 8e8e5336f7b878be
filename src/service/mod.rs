pub mod calendar;
pub mod leave_policy;
pub mod leave_workflow;
pub mod ledger;
pub mod payroll;
pub mod payroll_calc;
