//! Query functions, one module per table.

pub mod clients;
pub mod monthly_plans;
pub mod team;
pub mod users;
