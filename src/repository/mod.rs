//! SQL access. Every function takes a `&mut MySqlConnection` so callers can
//! pass a transaction (`&mut *tx`) and keep multi-step changes atomic.

pub mod audit;
pub mod balance;
pub mod employee;
pub mod holiday;
pub mod leave;
pub mod leave_type;
pub mod payroll;
pub mod settings;
