pub mod gateway;
pub mod schema;
pub mod value;

pub use gateway::{ExecutionFailure, ExecutionGateway, ExecutionOutcome};
pub use schema::{ColumnInfo, SchemaDescription, SchemaIntrospector};
pub use value::{CellValue, QueryResult};
