//! Job store implementations.
//!
//! Available backends:
//! - `MemoryJobStore` - In-memory storage (always available)
//! - `PostgresJobStore` - PostgreSQL storage (requires `postgres` feature)

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::MemoryJobStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresJobStore;
