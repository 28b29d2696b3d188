pub mod classify;
pub mod connection;
pub mod create;
pub mod executor;
pub mod operation;
pub mod payload;
pub mod schema;
pub mod session;
pub mod statement;
pub mod types;
pub mod value;

pub use connection::{Database, DbOptions, Handle};
pub use operation::{IdentifierPolicy, Operation, SelectArgs, UncheckedSql};
pub use session::Session;
pub use types::{ColumnMeta, Mutation, OperationResult, Record, Row, RowSet, SchemaDescription};
pub use value::SqlValue;
