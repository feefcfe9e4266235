pub mod analysis;
pub mod config;
pub mod conversation;
pub mod error;
pub mod formatter;
pub mod intent;
pub mod llm;
pub mod router;
pub mod session;
pub mod sql;
pub mod store;

pub use config::AssistantConfig;
pub use error::{AssistantError, Result};
pub use llm::{CompletionProvider, ProviderKind, Providers};
pub use router::QuestionRouter;
pub use session::ChatSession;
