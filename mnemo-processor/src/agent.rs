//! Public entry point: spawns the processor loop and hands callers a
//! handle for submitting turns.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use mnemo_context::{Budgets, MemoryContext, Tokenizer};
use mnemo_pressure::{Instructions, PressureMonitor};
use mnemo_provider::Provider;
use mnemo_storage::Storage;
use mnemo_tool::{tool_schema, Executor};

use crate::processor::{Inbound, Processor, MIN_CHANNEL_CAPACITY};

/// Configuration for building an [`Agent`]. Every field has a
/// reasonable default except `storage`, `tokenizer`, and `provider`,
/// which have no sensible default to fall back to.
pub struct AgentConfig<S, T, P> {
    /// Backing store for messages, working context, and the archive.
    pub storage: Arc<S>,
    /// Tokenizer used for budget accounting.
    pub tokenizer: Arc<T>,
    /// Language-model client.
    pub provider: P,
    /// Token budgets. Defaults to the 4096/0.7/0.3/0.9 configuration.
    pub budgets: Budgets,
    /// Primer and pressure-warning templates. Defaults to the built-in
    /// English prompts.
    pub instructions: Instructions,
    /// How many of the most-recently-created messages `Memorize` keeps
    /// in the live queue. Defaults to 3.
    pub archive_retention: usize,
    /// `mainProc` channel capacity. Must be at least
    /// [`MIN_CHANNEL_CAPACITY`] to absorb one turn's worst-case
    /// self-enqueue fan-out (model response, N tool results, up to two
    /// pressure warnings per append).
    pub channel_capacity: usize,
}

impl<S, T, P> AgentConfig<S, T, P> {
    /// Build a config with default budgets, instructions, retention,
    /// and channel capacity.
    pub fn new(storage: Arc<S>, tokenizer: Arc<T>, provider: P) -> Self {
        Self {
            storage,
            tokenizer,
            provider,
            budgets: Budgets::default(),
            instructions: Instructions::default(),
            archive_retention: 3,
            channel_capacity: MIN_CHANNEL_CAPACITY,
        }
    }
}

/// A running memory-managed agent session.
///
/// Cloning an `Agent` shares the same processor loop — every clone
/// submits onto the same `mainProc` channel.
#[derive(Clone)]
pub struct Agent {
    tx: mpsc::Sender<Inbound>,
    cancel: CancellationToken,
}

/// Error returned when a turn cannot even be submitted (the processor
/// has already shut down).
#[derive(Debug, thiserror::Error)]
#[error("processor is no longer running")]
pub struct AgentStopped;

impl Agent {
    /// Spawn the processor loop and return a handle plus its
    /// [`JoinHandle`]. Waits for the loop to reach its receive point
    /// before returning, so a `call` issued immediately after cannot
    /// race the loop's startup.
    pub async fn new<S, T, P>(config: AgentConfig<S, T, P>) -> (Self, JoinHandle<()>)
    where
        S: Storage + 'static,
        T: Tokenizer + 'static,
        P: Provider + 'static,
    {
        let capacity = config.channel_capacity.max(MIN_CHANNEL_CAPACITY);
        let (tx, rx) = mpsc::channel(capacity);

        let mut ctx = MemoryContext::new(config.storage.clone(), config.tokenizer.clone(), config.budgets);
        if let Err(e) = ctx.load().await {
            tracing::warn!(error = %e, "initial load failed, starting from an empty context");
        }

        let pressure = PressureMonitor::new(config.instructions.clone());
        let executor = Executor::new(PressureMonitor::new(config.instructions), config.archive_retention);

        let processor = Processor::new(
            ctx,
            pressure,
            executor,
            config.provider,
            tool_schema(),
            rx,
            tx.clone(),
        );

        let cancel = CancellationToken::new();
        let (ready_tx, ready_rx) = oneshot::channel();
        let loop_cancel = cancel.clone();
        let handle = tokio::spawn(processor.run(ready_tx, loop_cancel));
        let _ = ready_rx.await;

        (Self { tx, cancel }, handle)
    }

    /// Submit one human turn and wait for its output.
    ///
    /// Resolves once the model delivers a final response — either
    /// plain text with no tool calls, or an `ExternalOutput` call.
    /// There is no internal timeout: a `ModelError` or storage failure
    /// aborts the turn without resolving this call, so callers that
    /// need a deadline must wrap it with their own (e.g.
    /// `tokio::time::timeout`) and, on expiry, drop the future and
    /// retry.
    pub async fn call(&self, input: impl Into<String>) -> Result<String, AgentStopped> {
        let (respond, recv) = oneshot::channel();
        self.tx
            .send(Inbound::Turn {
                text: input.into(),
                respond,
                sink: Arc::new(|_| {}),
            })
            .await
            .map_err(|_| AgentStopped)?;
        recv.await.map_err(|_| AgentStopped)
    }

    /// Submit one human turn, invoking `sink` with the output as soon
    /// as it's produced, in addition to resolving the returned future.
    /// Useful for streaming the result to a caller-side UI while still
    /// awaiting completion elsewhere.
    pub async fn call_with_sink(
        &self,
        input: impl Into<String>,
        sink: Arc<dyn Fn(String) + Send + Sync>,
    ) -> Result<String, AgentStopped> {
        let (respond, recv) = oneshot::channel();
        self.tx
            .send(Inbound::Turn {
                text: input.into(),
                respond,
                sink,
            })
            .await
            .map_err(|_| AgentStopped)?;
        recv.await.map_err(|_| AgentStopped)
    }

    /// Stop the processor loop. In-flight turns are abandoned; their
    /// `call` futures never resolve.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
