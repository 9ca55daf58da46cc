//! Data models
//!
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY); timestamps are Unix millis.

pub mod audit;
pub mod category;
pub mod dining_table;
pub mod discount;
pub mod modifier;
pub mod note;
pub mod order;
pub mod payment;
pub mod product;
pub mod report;
pub mod user;

pub use audit::*;
pub use category::*;
pub use dining_table::*;
pub use discount::*;
pub use modifier::*;
pub use note::*;
pub use order::*;
pub use payment::*;
pub use product::*;
pub use report::*;
pub use user::*;
