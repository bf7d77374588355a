pub mod backends;
mod connection;
mod kv;
mod persisted;
pub(crate) mod schema;
pub mod traits;

pub use backends::libsql::LibSqlBackend;
pub use backends::memory::MemoryBackend;
pub use connection::Database;
pub use kv::KvRepository;
pub use persisted::PersistedValue;
pub use traits::*;
