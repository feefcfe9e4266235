//! Chat session: owns the conversation history and records each exchange.

use crate::conversation::{ConversationHistory, Role, Turn};
use crate::llm::ProviderKind;
use crate::router::QuestionRouter;

pub struct ChatSession {
    router: QuestionRouter,
    history: ConversationHistory,
    provider: ProviderKind,
}

impl ChatSession {
    pub fn new(router: QuestionRouter, provider: ProviderKind) -> Self {
        let history = ConversationHistory::new(router.config().max_turns);
        Self {
            router,
            history,
            provider,
        }
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn set_provider(&mut self, provider: ProviderKind) {
        self.provider = provider;
    }

    pub fn history(&self) -> &[Turn] {
        self.history.turns()
    }

    pub fn router(&self) -> &QuestionRouter {
        &self.router
    }

    /// Record the question, answer it, and record the answer.
    /// Blank input is answered but not recorded.
    pub async fn ask(&mut self, question: &str) -> String {
        if question.trim().is_empty() {
            return self.router.answer(question, self.provider, &[]).await;
        }

        self.history.add(Role::User, question.trim());
        let answer = self
            .router
            .answer(question, self.provider, self.history.turns())
            .await;
        self.history.add(Role::Assistant, answer.clone());
        answer
    }

    pub fn transcript(&self) -> String {
        self.history.transcript()
    }
}
