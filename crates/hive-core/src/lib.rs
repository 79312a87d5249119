//! Domain logic for hive: due-date status, recurring report cycles, monthly
//! content-plan rollover, team assignment, client search, calendar, and CSV
//! interchange. Persistence goes through the [`store::HiveStore`] trait.

pub mod calendar;
pub mod client;
pub mod csv;
pub mod dates;
pub mod error;
pub mod filter;
pub mod month;
pub mod recurrence;
pub mod rollover;
pub mod store;
pub mod team;
pub mod user;

pub use error::{HiveError, HiveResult, ValidationError};
pub use month::Month;
pub use store::{HiveStore, MemoryStore, PgStore};
