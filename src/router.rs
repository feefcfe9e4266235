//! Question Router
//!
//! Single entry point for a question. Resolves follow-ups, classifies intent, and
//! drives the greeting, data, or advice path. `answer` always returns displayable
//! text; every failure is turned into a message here.

use crate::config::AssistantConfig;
use crate::conversation::{build_context, last_data_question, prior_turns, FollowupStrategy, KeywordFollowups, Turn};
use crate::error::Result;
use crate::formatter::ResultFormatter;
use crate::intent::{Intent, IntentStrategy, ProviderIntentClassifier};
use crate::llm::{CompletionProvider, ProviderKind, Providers};
use crate::sql::prompts::{build_insight_prompt, CONSULTANT_SYSTEM};
use crate::sql::{QueryValidator, SqlGenerator};
use crate::store::{ExecutionFailure, ExecutionGateway, SchemaDescription, SchemaIntrospector};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

pub const BLANK_QUESTION_TEXT: &str = "Please type a question about the HR dataset, or ask for HR advice.";

pub const GREETING_TEXT: &str = "Hello! I can answer questions about the HR employee dataset and offer general HR advice.\n\
Try asking:\n\
- How many employees are there?\n\
- What's the attrition rate among employees who work overtime?\n\
- What's the average monthly income by department?\n\
- How can we reduce attrition in Sales?";

pub const NO_RESULTS_TEXT: &str =
    "The query ran successfully but returned no results. Try widening your filters or checking the spelling of values.";

pub struct QuestionRouter {
    config: AssistantConfig,
    providers: Providers,
    intents: Arc<dyn IntentStrategy>,
    /// Set once a caller supplies its own intent strategy.
    custom_intents: bool,
    followups: Arc<dyn FollowupStrategy>,
    introspector: SchemaIntrospector,
    gateway: ExecutionGateway,
    validator: QueryValidator,
    formatter: ResultFormatter,
}

impl QuestionRouter {
    pub fn new(config: AssistantConfig, providers: Providers) -> Self {
        let followups: Arc<dyn FollowupStrategy> = Arc::new(KeywordFollowups);
        let intents: Arc<dyn IntentStrategy> = Arc::new(ProviderIntentClassifier::new(Arc::clone(&followups)));
        Self {
            introspector: SchemaIntrospector::new(&config.database_path, config.table_name.clone()),
            gateway: ExecutionGateway::new(&config.database_path),
            validator: QueryValidator::new(config.table_name.clone()),
            formatter: ResultFormatter::new(config.display_row_limit),
            config,
            providers,
            intents,
            custom_intents: false,
            followups,
        }
    }

    pub fn with_intent_strategy(mut self, intents: Arc<dyn IntentStrategy>) -> Self {
        self.intents = intents;
        self.custom_intents = true;
        self
    }

    /// Replace follow-up detection. The default intent classifier is rebuilt around the
    /// same strategy so rewriting and the data override agree.
    pub fn with_followup_strategy(mut self, followups: Arc<dyn FollowupStrategy>) -> Self {
        if !self.custom_intents {
            self.intents = Arc::new(ProviderIntentClassifier::new(Arc::clone(&followups)));
        }
        self.followups = followups;
        self
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn introspector(&self) -> &SchemaIntrospector {
        &self.introspector
    }

    pub fn provider(&self, kind: ProviderKind) -> Arc<dyn CompletionProvider> {
        self.providers.select(kind)
    }

    /// Release provider resources held between questions.
    pub async fn shutdown(&self) {
        self.providers.shutdown().await;
    }

    /// Answer `question` using the selected provider. `history` may already end with
    /// `question` as the newest user turn; that turn is ignored.
    pub async fn answer(&self, question: &str, kind: ProviderKind, history: &[Turn]) -> String {
        let request_id = Uuid::new_v4();
        let span = info_span!("answer", %request_id, provider = %kind);
        self.route(question, kind, history).instrument(span).await
    }

    async fn route(&self, question: &str, kind: ProviderKind, history: &[Turn]) -> String {
        let question = question.trim();
        if question.is_empty() {
            return BLANK_QUESTION_TEXT.to_string();
        }

        let prior = prior_turns(history, question);
        let context = build_context(prior, self.config.context_messages);
        let resolved = self.resolve_followup(question, prior);
        let provider = self.providers.select(kind);

        let intent = self
            .intents
            .classify(question, &context, prior, provider.as_ref())
            .await;
        info!("Intent: {} (question: {})", intent, resolved);

        match intent {
            Intent::Greeting => GREETING_TEXT.to_string(),
            Intent::Data => match self.answer_data(&resolved, &context, provider.as_ref()).await {
                Ok(answer) => answer,
                Err(e) => {
                    warn!("Data path failed: {}", e);
                    format!("Sorry, something went wrong while answering that question: {}", e)
                }
            },
            Intent::Advice => self.answer_advice(&resolved, provider.as_ref()).await,
        }
    }

    fn resolve_followup(&self, question: &str, prior: &[Turn]) -> String {
        if prior.is_empty() || !self.followups.is_followup(question) {
            return question.to_string();
        }
        match last_data_question(prior) {
            Some(previous) => {
                let rewritten = self.followups.rewrite(question, &previous);
                debug!("Rewrote follow-up '{}' as '{}'", question, rewritten);
                rewritten
            }
            None => question.to_string(),
        }
    }

    async fn answer_data(&self, question: &str, context: &str, provider: &dyn CompletionProvider) -> Result<String> {
        let schema = self.introspector.snapshot(self.config.sample_rows)?;

        let generated = SqlGenerator::new(provider, &self.validator)
            .generate_and_validate(question, &schema, context, self.config.max_retries)
            .await;
        if let Some(reason) = generated.failure_reason() {
            return Ok(generation_failure_message(reason));
        }

        let outcome = self.gateway.execute(&generated.sql);
        if let Some(failure) = &outcome.error {
            return Ok(execution_failure_message(failure, &schema));
        }
        if outcome.result.is_empty() {
            return Ok(NO_RESULTS_TEXT.to_string());
        }

        let formatted = self.formatter.format(&outcome.result, question);
        let mut answer = formatted.clone();
        if !generated.explanation.is_empty() {
            answer.push_str(&format!("\n\n**How I got this:** {}", generated.explanation));
        }
        answer.push_str(&format!("\n\n```sql\n{}\n```", generated.sql));

        match provider
            .complete(&build_insight_prompt(question, &formatted), Some(CONSULTANT_SYSTEM))
            .await
        {
            Ok(insight) if !insight.trim().is_empty() => {
                answer.push_str(&format!("\n\n**Insight:** {}", insight.trim()));
            }
            Ok(_) => {}
            Err(e) => warn!("Skipping insight, provider failed: {}", e),
        }

        Ok(answer)
    }

    async fn answer_advice(&self, question: &str, provider: &dyn CompletionProvider) -> String {
        match provider.complete(question, Some(CONSULTANT_SYSTEM)).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!("Advice request via {} failed: {}", provider.name(), e);
                format!(
                    "Sorry, I couldn't get an answer from the language model ({}). Please try again or switch providers.",
                    e
                )
            }
        }
    }
}

fn generation_failure_message(reason: &str) -> String {
    format!(
        "I couldn't build a valid query for that question ({}). Try rephrasing it, for example: \
         \"What's the attrition rate by department?\"",
        reason
    )
}

fn execution_failure_message(failure: &ExecutionFailure, schema: &SchemaDescription) -> String {
    match failure {
        ExecutionFailure::NotSelect => {
            "I can only run read-only SELECT queries, so that query was not executed.".to_string()
        }
        ExecutionFailure::UnknownColumn(column) => {
            let hint = schema
                .closest_column(column)
                .map(|name| format!(" Did you mean `{}`?", name))
                .unwrap_or_default();
            format!(
                "The query referenced a column that doesn't exist (`{}`).{} Try rephrasing with one of the dataset's field names.",
                column, hint
            )
        }
        ExecutionFailure::UnknownTable(table) => format!(
            "The query referenced an unknown table (`{}`). All employee data lives in the `{}` table.",
            table, schema.table
        ),
        ExecutionFailure::Syntax(message) => format!(
            "The generated query had a syntax error ({}). Please try rephrasing your question.",
            message
        ),
        ExecutionFailure::Other(message) => format!("The query could not be executed: {}", message),
    }
}
