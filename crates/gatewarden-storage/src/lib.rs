//! Persistence for the gate controller.
//!
//! The access path sees only [`CodeLookup`] and [`EventSink`]. Two stores
//! implement them:
//!
//! - [`SqliteStore`]: the gate database (`account_code`, `contact`,
//!   `gate_log`), opened through [`Database`] with embedded migrations.
//! - [`InMemoryStore`]: vectors behind a lock, for tests and demos.
//!
//! [`AuditedSink`] wraps either sink and appends every recorded event to a
//! day-sharded CSV file under the logs directory.
//!
//! PIN lookups compare candidate codes in constant time via `subtle`.
//!
//! ```no_run
//! use gatewarden_storage::{CodeLookup, Database, SqliteStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::open("gatewarden.db").await?;
//! let store = SqliteStore::new(db.pool().clone());
//!
//! if let Some(code) = store.find_active_code("4821").await? {
//!     println!("{} ({})", code.label, code.masked());
//! }
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod connection;
pub mod error;
pub mod memory;
pub mod models;
pub mod sqlite;
pub mod traits;

pub use audit::{AuditedSink, CsvAuditLog};
pub use connection::Database;
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryStore;
pub use models::PruneReport;
pub use sqlite::SqliteStore;
pub use traits::{CodeLookup, EventSink};
