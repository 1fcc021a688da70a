//! The single-consumer event loop (C5): dequeues `mainProc`, drives
//! the model, and routes messages by role until the turn produces an
//! output.
//!
//! Exactly one task owns [`mnemo_context::MemoryContext`] — no lock
//! guards it. Producers (external input, the loop's own re-enqueues)
//! are serialized through the channel instead.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use mnemo_context::MemoryContext;
use mnemo_core::{Message, Part, Role};
use mnemo_pressure::PressureMonitor;
use mnemo_provider::{Provider, ProviderRequest};
use mnemo_tool::Executor;

use crate::convert::{ai_message_from_parts, to_provider_message};

/// One item on `mainProc`.
pub(crate) enum Inbound {
    /// A fresh human turn from `Agent::call`: not yet appended to the
    /// queue, and carrying the completion handshake for that call.
    Turn {
        text: String,
        respond: oneshot::Sender<String>,
        sink: Arc<dyn Fn(String) + Send + Sync>,
    },
    /// A message already appended to the queue by the loop itself
    /// (a model response, a tool result, or a pressure warning).
    Internal(Message),
}

/// Recommended minimum channel capacity — see the concurrency notes
/// on worst-case fan-out per turn.
pub const MIN_CHANNEL_CAPACITY: usize = 100;

/// The event loop itself. Build one with [`crate::agent::Agent::new`]
/// rather than constructing directly.
pub(crate) struct Processor<P: Provider> {
    ctx: MemoryContext,
    pressure: PressureMonitor,
    executor: Executor,
    provider: P,
    tool_schema: Vec<mnemo_provider::ToolSchema>,
    rx: mpsc::Receiver<Inbound>,
    tx: mpsc::Sender<Inbound>,
    current_respond: Option<oneshot::Sender<String>>,
    current_sink: Option<Arc<dyn Fn(String) + Send + Sync>>,
}

impl<P: Provider> Processor<P> {
    pub(crate) fn new(
        ctx: MemoryContext,
        pressure: PressureMonitor,
        executor: Executor,
        provider: P,
        tool_schema: Vec<mnemo_provider::ToolSchema>,
        rx: mpsc::Receiver<Inbound>,
        tx: mpsc::Sender<Inbound>,
    ) -> Self {
        Self {
            ctx,
            pressure,
            executor,
            provider,
            tool_schema,
            rx,
            tx,
            current_respond: None,
            current_sink: None,
        }
    }

    /// Run the loop until `cancel` fires or every sender is dropped.
    /// Signals `ready` the moment it starts waiting on the channel —
    /// before that, the first human input could race the loop and be
    /// dropped.
    pub(crate) async fn run(mut self, ready: oneshot::Sender<()>, cancel: CancellationToken) {
        let _ = ready.send(());
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!("processor cancelled, exiting");
                    return;
                }
                item = self.rx.recv() => {
                    match item {
                        Some(inbound) => self.handle(inbound).await,
                        None => return,
                    }
                }
            }
        }
    }

    async fn handle(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Turn { text, respond, sink } => {
                self.current_respond = Some(respond);
                self.current_sink = Some(sink);
                let msg = Message::text(Role::Human, text);
                self.append_in_place(msg).await;
                self.invoke_model().await;
            }
            Inbound::Internal(msg) => match msg.role {
                Role::Human => {
                    // Only ever produced synthetically by `Turn`; treat
                    // the same way in case a caller constructs one.
                    self.append_in_place(msg).await;
                    self.invoke_model().await;
                }
                Role::System => {
                    self.append_in_place(msg).await;
                    self.invoke_model().await;
                }
                Role::Ai => self.handle_ai(msg).await,
                Role::Tool => self.handle_tool(msg).await,
            },
        }
    }

    /// Append a message that arrived on the channel un-appended
    /// (human input, pressure warning) and run the resulting
    /// inspection.
    async fn append_in_place(&mut self, msg: Message) {
        self.pressure.append_message(&mut self.ctx, msg);
        self.enqueue_pressure_warnings().await;
    }

    /// Append a freshly synthesized message (model response, tool
    /// result), re-enqueue it as the parenthetical in the spec
    /// requires, then run the resulting inspection.
    async fn append_and_requeue(&mut self, msg: Message) {
        self.pressure.append_message(&mut self.ctx, msg.clone());
        let _ = self.tx.send(Inbound::Internal(msg)).await;
        self.enqueue_pressure_warnings().await;
    }

    async fn enqueue_pressure_warnings(&mut self) {
        for warning in self.pressure.inspect(&self.ctx) {
            let _ = self.tx.send(Inbound::Internal(warning)).await;
        }
    }

    async fn invoke_model(&mut self) {
        let request = ProviderRequest {
            messages: self.ctx.messages().iter().map(to_provider_message).collect(),
            tools: self.tool_schema.clone(),
        };

        match self.provider.complete(request).await {
            Ok(response) => {
                let ai_msg = ai_message_from_parts(&response.content);
                self.append_and_requeue(ai_msg).await;
            }
            Err(e) => {
                // ModelError: abort the turn. The queue is untouched
                // (nothing was appended) and the caller's respond/sink
                // are left pending — it must time out or retry.
                tracing::error!(error = %e, "model call failed, aborting turn");
            }
        }
    }

    async fn handle_ai(&mut self, msg: Message) {
        if !msg.has_tool_calls() {
            self.deliver(msg.text_content());
            return;
        }

        for part in &msg.parts {
            let Part::ToolCall { call_id, name, arguments } = part else {
                continue;
            };

            let result = self.executor.dispatch(name, arguments, &mut self.ctx).await;
            let (content, abort) = match result {
                Ok(text) => (text, false),
                Err(e) if e.aborts_turn() => {
                    tracing::error!(error = %e, tool = %name, "storage failure, aborting turn");
                    (String::new(), true)
                }
                Err(e) => (e.as_tool_response(), false),
            };

            if abort {
                return;
            }

            let is_terminal = name == "ExternalOutput";
            let tool_msg = Message {
                role: Role::Tool,
                parts: vec![Part::ToolResponse {
                    call_id: call_id.clone(),
                    name: name.clone(),
                    content,
                }],
                created_at: chrono::Utc::now(),
            };
            self.append_and_requeue(tool_msg).await;

            if is_terminal {
                // The tool dispatch for ExternalOutput already ran;
                // the `tool` handler delivers the output once this
                // message is dequeued.
            }
        }
    }

    async fn handle_tool(&mut self, msg: Message) {
        for part in &msg.parts {
            let Part::ToolResponse { name, content, .. } = part else {
                continue;
            };

            match name.as_str() {
                "InternalOutput" => {
                    // Ends the tool loop without user-visible output:
                    // append in place, no requeue (no further model
                    // invocation this cycle) and no sink delivery.
                    let ai_msg = Message::text(Role::Ai, content.clone());
                    self.pressure.append_message(&mut self.ctx, ai_msg);
                    self.enqueue_pressure_warnings().await;
                }
                "ExternalOutput" => {
                    let ai_msg = Message::text(Role::Ai, content.clone());
                    self.pressure.append_message(&mut self.ctx, ai_msg);
                    self.enqueue_pressure_warnings().await;
                    self.deliver(content.clone());
                }
                _ => self.invoke_model().await,
            }
        }
    }

    fn deliver(&mut self, text: String) {
        if let Some(sink) = self.current_sink.take() {
            sink(text.clone());
        }
        if let Some(respond) = self.current_respond.take() {
            let _ = respond.send(text);
        }
    }
}
