//! Tool-call dispatcher: decodes a model-emitted call and mutates the
//! memory context (C4).

use serde::Deserialize;

use mnemo_context::MemoryContext;
use mnemo_core::MemoryError;
use mnemo_pressure::PressureMonitor;

/// Dispatches the eight memory tools onto a [`MemoryContext`].
///
/// `archive_retention` is the "most-recent N stay current" count from
/// configuration (default 3).
pub struct Executor {
    pressure: PressureMonitor,
    archive_retention: usize,
}

#[derive(Deserialize)]
struct MemorizeArgs {
    summary: String,
}

#[derive(Deserialize)]
struct ReflectArgs {
    summary: String,
}

#[derive(Deserialize)]
struct RecallArgs {
    query: String,
    limit: usize,
    page: usize,
}

#[derive(Deserialize)]
struct ThinkArgs {
    thought: String,
}

#[derive(Deserialize)]
struct FinalOutputArgs {
    #[serde(rename = "finalOutput")]
    final_output: String,
}

fn decode<'a, T: Deserialize<'a>>(tool: &str, arguments: &'a str) -> Result<T, MemoryError> {
    serde_json::from_str(arguments)
        .map_err(|e| MemoryError::Argument(format!("{tool}: malformed arguments ({e})")))
}

impl Executor {
    /// Build an executor over the given pressure monitor (for primer
    /// maintenance on `Recall`) and archive retention count.
    pub fn new(pressure: PressureMonitor, archive_retention: usize) -> Self {
        Self {
            pressure,
            archive_retention,
        }
    }

    /// Dispatch one tool call by name. Returns the tool-response
    /// string on success. Errors that the model should react to
    /// (`Argument`, `MemoryOverflow`, `NotFound`) are returned as
    /// `Err` for the caller to convert to a tool response via
    /// [`MemoryError::as_tool_response`]; `Storage` errors should
    /// abort the turn instead (see [`MemoryError::aborts_turn`]).
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: &str,
        ctx: &mut MemoryContext,
    ) -> Result<String, MemoryError> {
        match name {
            "Load" => {
                ctx.load().await?;
                Ok("Memory context loaded".to_string())
            }
            "Save" => {
                ctx.save().await?;
                Ok("Memory context saved".to_string())
            }
            "Memorize" => self.memorize(arguments, ctx).await,
            "Reflect" => self.reflect(arguments, ctx).await,
            "Recall" => self.recall(arguments, ctx).await,
            "Think" => {
                let args: ThinkArgs = decode("Think", arguments)?;
                Ok(args.thought)
            }
            "InternalOutput" | "ExternalOutput" => {
                let args: FinalOutputArgs = decode(name, arguments)?;
                Ok(args.final_output)
            }
            other => Err(MemoryError::Argument(format!("unknown tool {other}"))),
        }
    }

    async fn memorize(&self, arguments: &str, ctx: &mut MemoryContext) -> Result<String, MemoryError> {
        let args: MemorizeArgs = decode("Memorize", arguments)?;

        // Persist the full current history before trimming it, so a
        // crash between archiving and trimming never loses a message.
        ctx.save().await?;
        let current = ctx.messages_excluding_primer().to_vec();
        ctx.storage()
            .archive_messages(&current, self.archive_retention)
            .await?;
        ctx.storage().save_working_context(&args.summary).await?;

        // The reload makes the in-memory view match persisted truth.
        ctx.load().await?;
        ctx.set_working_context(args.summary);

        Ok("Memory context memorized".to_string())
    }

    async fn reflect(&self, arguments: &str, ctx: &mut MemoryContext) -> Result<String, MemoryError> {
        let args: ReflectArgs = decode("Reflect", arguments)?;
        ctx.storage().save_working_context(&args.summary).await?;
        ctx.set_working_context(args.summary);
        Ok("Memory context reflected".to_string())
    }

    async fn recall(&self, arguments: &str, ctx: &mut MemoryContext) -> Result<String, MemoryError> {
        let args: RecallArgs = decode("Recall", arguments)?;
        let recalled = ctx
            .storage()
            .recall_messages(&args.query, args.limit, args.page)
            .await?;

        let recalled_tokens = ctx.token_count(&recalled);
        let current_tokens = ctx.token_size_messages();
        let budget = ctx.budgets().msgs_pressure_point();

        if (current_tokens + recalled_tokens) as f64 >= budget {
            return Err(MemoryError::MemoryOverflow);
        }

        let msg = mnemo_core::Message::text(mnemo_core::Role::System, recalled);
        self.pressure.append_message(ctx, msg);
        Ok("Conversation history recalled".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_context::{Budgets, WhitespaceTokenizer};
    use mnemo_core::{Message, Role};
    use mnemo_pressure::Instructions;
    use mnemo_storage::MemoryStorage;
    use std::sync::Arc;

    fn executor() -> Executor {
        Executor::new(PressureMonitor::new(Instructions::default()), 3)
    }

    fn ctx() -> MemoryContext {
        MemoryContext::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(WhitespaceTokenizer),
            Budgets::default(),
        )
    }

    #[tokio::test]
    async fn think_returns_thought_verbatim_no_mutation() {
        let exec = executor();
        let mut c = ctx();
        let result = exec
            .dispatch("Think", r#"{"thought":"considering options"}"#, &mut c)
            .await
            .unwrap();
        assert_eq!(result, "considering options");
        assert!(c.messages().is_empty());
    }

    #[tokio::test]
    async fn malformed_arguments_is_argument_error() {
        let exec = executor();
        let mut c = ctx();
        let err = exec.dispatch("Memorize", "{bad json", &mut c).await.unwrap_err();
        assert!(matches!(err, MemoryError::Argument(_)));
    }

    #[tokio::test]
    async fn reflect_overwrites_working_context_in_memory_and_storage() {
        let exec = executor();
        let mut c = ctx();
        let result = exec
            .dispatch("Reflect", r#"{"summary":"user wants help with rust"}"#, &mut c)
            .await
            .unwrap();
        assert_eq!(result, "Memory context reflected");
        assert_eq!(c.working_context(), "user wants help with rust");
        assert_eq!(
            c.storage().load_working_context().await.unwrap(),
            "user wants help with rust"
        );
    }

    #[tokio::test]
    async fn memorize_archives_all_but_most_recent_retention() {
        let exec = executor();
        let mut c = ctx();
        for i in 0..5 {
            let mut m = Message::text(Role::Human, format!("msg{i}"));
            m.created_at = chrono::Utc::now() + chrono::Duration::seconds(i);
            c.messages_mut().push(m);
        }
        let result = exec
            .dispatch("Memorize", r#"{"summary":"condensed"}"#, &mut c)
            .await
            .unwrap();
        assert_eq!(result, "Memory context memorized");
        assert_eq!(c.messages().len(), 3);
        assert_eq!(c.working_context(), "condensed");
    }

    #[tokio::test]
    async fn recall_not_found_surfaces_as_not_found() {
        let exec = executor();
        let mut c = ctx();
        let err = exec
            .dispatch("Recall", r#"{"query":"x","limit":10,"page":0}"#, &mut c)
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::NotFound));
    }

    #[tokio::test]
    async fn recall_overflow_when_result_would_breach_budget() {
        let exec = Executor::new(PressureMonitor::new(Instructions::default()), 3);
        let budgets = Budgets::try_new(100, 0.7, 0.3, 0.9).unwrap();
        let mut c = MemoryContext::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(WhitespaceTokenizer),
            budgets,
        );
        // Seed an archive entry long enough that recalling it alone
        // breaches 0.9 * 70 = 63 tokens.
        let long_text = (0..80).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
        let mut archived = Message::text(Role::Ai, long_text);
        archived.created_at = chrono::Utc::now();
        c.storage().archive_messages(&[archived], 0).await.unwrap();

        let err = exec
            .dispatch("Recall", r#"{"query":"word","limit":10,"page":0}"#, &mut c)
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::MemoryOverflow));
    }
}
