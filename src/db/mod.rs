//! Local picture store backed by SQLite.
//!
//! - `repo`: pool setup, migrations and the SQL for the `picture` table.
//! - `store`: `PictureStore`, which wraps the pool and turns queries into
//!   live streams that re-emit whenever a write changes the table.

pub mod repo;
pub mod store;

pub use repo::*;
pub use store::PictureStore;
