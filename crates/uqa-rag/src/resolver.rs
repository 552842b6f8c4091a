//! Answer resolution
//!
//! Asks the completion API to pick one of the enumerated options and
//! reads the option number from the last word of the reply. Any failure
//! degrades to [`Answer::UNDETERMINED`].
//!
//! Author: hephaex@gmail.com

use std::sync::Arc;
use uqa_core::{Answer, ChatMessage, LlmClient, Result, UqaError};

/// Persona given to the model
pub const SYSTEM_PROMPT: &str =
    "Ты помощник, который выбирает правильный ответ на вопросы об Университете ИТМО.";

/// Build the two-message conversation for a question
pub fn build_messages(query: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Вопрос: {query}\nВыбери правильный ответ из предложенных вариантов и укажи только его номер (цифру от 1 до 10)."
        )),
    ]
}

/// Parse the option number from a completion
///
/// Takes the last whitespace-separated token and parses it as an integer.
/// Trailing punctuation (`"3."`) is not stripped.
pub fn parse_choice(text: &str) -> Result<i64> {
    let token = text
        .split_whitespace()
        .next_back()
        .ok_or_else(|| UqaError::LlmError("Empty completion".to_string()))?;

    token
        .parse()
        .map_err(|_| UqaError::LlmError(format!("Last token {token:?} is not an integer")))
}

/// Resolves the answer option for a question via an LLM
pub struct AnswerResolver {
    llm: Arc<dyn LlmClient>,
}

impl AnswerResolver {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Resolve the answer, degrading every failure to the sentinel
    pub async fn resolve(&self, query: &str) -> Answer {
        match self.try_resolve(query).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(model = self.llm.model(), error = %e, "Answer resolution failed");
                Answer::UNDETERMINED
            }
        }
    }

    async fn try_resolve(&self, query: &str) -> Result<Answer> {
        let completion = self.llm.chat(&build_messages(query)).await?;
        tracing::debug!(model = self.llm.model(), completion = %completion, "Completion received");

        let choice = parse_choice(&completion)?;
        Answer::try_from(choice)
    }
}
