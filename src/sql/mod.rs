pub mod generator;
pub mod prompts;
pub mod validator;

pub use generator::{clean_sql_response, GeneratedQuery, SqlGenerator, FAILURE_MARKER};
pub use validator::{QueryValidator, ValidationIssue};
