//! lexitag Remote - Remote-assisted tagging
//!
//! For answers the regex cascades cannot structure, the assistant turn is
//! sent to a text-completion service and asked to come back in the canonical
//! tag vocabulary. Calls go through a [`RetryPolicy`]; once its attempts are
//! used up the original answer is kept, so a remote outage never fails a
//! batch.
//!
//! Author: hephaex@gmail.com

pub mod llm;
pub mod prompt;
pub mod retry;

pub use llm::{create_completion_client, AnthropicClient, OpenAiClient};
pub use prompt::MarkupPrompt;
pub use retry::RetryPolicy;

use std::sync::Arc;

use lexitag_core::{CompletionClient, Record, Result, SpanPolicy};
use lexitag_extractor::{validate_spans, TagVocabulary};

/// Result of remotely tagging one record
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteTagged {
    /// The completion replaced the assistant turn
    Completed(Record),
    /// Every attempt failed; only the question was tagged
    Fallback(Record),
}

impl RemoteTagged {
    pub fn record(&self) -> &Record {
        match self {
            Self::Completed(record) | Self::Fallback(record) => record,
        }
    }

    pub fn into_record(self) -> Record {
        match self {
            Self::Completed(record) | Self::Fallback(record) => record,
        }
    }
}

/// Tags records with the help of a completion service
pub struct RemoteTagger {
    client: Arc<dyn CompletionClient>,
    vocabulary: Arc<TagVocabulary>,
    prompt: MarkupPrompt,
    policy: RetryPolicy,
    span_policy: SpanPolicy,
}

impl RemoteTagger {
    pub fn new(client: Arc<dyn CompletionClient>, vocabulary: Arc<TagVocabulary>) -> Self {
        Self {
            client,
            prompt: MarkupPrompt::new(&vocabulary),
            vocabulary,
            policy: RetryPolicy::default(),
            span_policy: SpanPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_span_policy(mut self, span_policy: SpanPolicy) -> Self {
        self.span_policy = span_policy;
        self
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Ask the service to mark up one text.
    ///
    /// Under [`SpanPolicy::Reject`] a completion with malformed spans counts
    /// as a failed attempt.
    pub async fn markup(&self, text: &str) -> Result<String> {
        let prompt = self.prompt.render(text);
        let prompt = prompt.as_str();

        self.policy
            .execute(self.client.model(), move |attempt| async move {
                tracing::debug!(attempt, "sending completion request");
                let completion = self.client.complete(prompt).await?;
                let completion = completion.trim().to_string();
                if self.span_policy == SpanPolicy::Reject {
                    validate_spans(&completion, &self.vocabulary)?;
                }
                Ok(completion)
            })
            .await
    }

    /// Tag one record.
    ///
    /// Quoted words in the question become WORD spans; the answer is
    /// replaced by the remote markup. Only a record without a user/assistant
    /// pair is an error.
    pub async fn tag(&self, record: &Record) -> Result<RemoteTagged> {
        let (user, assistant) = record.turns()?;
        let question = self.vocabulary.wrap_quoted_words(user);

        match self.markup(assistant).await {
            Ok(answer) => Ok(RemoteTagged::Completed(record.with_turns(question, answer))),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "attempts exhausted, keeping original answer"
                );
                Ok(RemoteTagged::Fallback(record.with_turns(question, assistant)))
            }
        }
    }
}
