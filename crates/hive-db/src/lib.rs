//! PostgreSQL persistence for hive: schema migrations, row models, and
//! query functions for clients, users, team assignments, and monthly
//! content plans.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
