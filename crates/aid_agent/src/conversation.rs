use std::{fmt, sync::Arc};

use aid_conversation::{Content, Message, ToolCall};
use aid_llm::{Provider, ProviderStream, StreamEvent, Usage};
use aid_tool::{FunctionSchema, Runner, ToolResult, Toolbox};
use parking_lot::Mutex as SyncMutex;
use tokio::sync::{Mutex, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::{Snapshot, StepRecord, Update, error::Result};

/// The updates of one turn. Ends when the turn is over.
pub type Updates = ReceiverStream<Update>;

type SystemPrompt = Arc<dyn Fn() -> Content + Send + Sync>;

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    usage: Usage,
    cost: f64,
}

/// What one step produced, kept even if the step fails halfway.
#[derive(Debug, Default)]
struct StepOutput {
    received: Option<Message>,
    tool_messages: Vec<Message>,
    image_messages: Vec<Message>,
    usage: Usage,
    cost: f64,
}

/// A dialogue between the user and a model, with tools.
///
/// Clones share the same history.
pub struct Conversation<P> {
    provider: Arc<P>,
    toolbox: Arc<Toolbox>,
    system_prompt: Option<SystemPrompt>,
    snapshot: Option<Arc<dyn Snapshot>>,
    update_capacity: usize,

    /// Locked by the running turn for its whole duration.
    history: Arc<Mutex<Vec<Message>>>,
    totals: Arc<SyncMutex<Totals>>,
}

impl<P> Clone for Conversation<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            toolbox: Arc::clone(&self.toolbox),
            system_prompt: self.system_prompt.clone(),
            snapshot: self.snapshot.clone(),
            update_capacity: self.update_capacity,
            history: Arc::clone(&self.history),
            totals: Arc::clone(&self.totals),
        }
    }
}

impl<P> fmt::Debug for Conversation<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conversation")
            .field("toolbox", &self.toolbox)
            .field("update_capacity", &self.update_capacity)
            .finish_non_exhaustive()
    }
}

impl<P: Provider + 'static> Conversation<P> {
    pub fn new(provider: P, toolbox: Toolbox) -> Self {
        Self {
            provider: Arc::new(provider),
            toolbox: Arc::new(toolbox),
            system_prompt: None,
            snapshot: None,
            update_capacity: 1,
            history: Arc::new(Mutex::new(vec![])),
            totals: Arc::default(),
        }
    }

    /// Compute the system prompt before every step.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Fn() -> Content + Send + Sync + 'static) -> Self {
        self.system_prompt = Some(Arc::new(prompt));
        self
    }

    #[must_use]
    pub fn with_snapshot(mut self, snapshot: impl Snapshot + 'static) -> Self {
        self.snapshot = Some(Arc::new(snapshot));
        self
    }

    /// How many updates may be buffered before the turn waits for the
    /// consumer. At least one.
    #[must_use]
    pub fn with_update_capacity(mut self, capacity: usize) -> Self {
        self.update_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// A copy of the history. Waits for a running turn to end.
    pub async fn messages(&self) -> Vec<Message> {
        self.history.lock().await.clone()
    }

    /// Tokens used across all steps so far.
    #[must_use]
    pub fn usage(&self) -> Usage {
        self.totals.lock().usage
    }

    /// Cost in US dollars across all steps so far.
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.totals.lock().cost
    }

    /// Add a user message and run steps until the model stops calling tools.
    ///
    /// The turn runs on a background task. Turns submitted while another is
    /// running start after it ends. Cancelling `cancel` aborts the in-flight
    /// request and is passed on to running tools.
    pub fn submit(&self, content: impl Into<Content>, cancel: CancellationToken) -> Updates {
        let (tx, rx) = mpsc::channel(self.update_capacity);
        let content = content.into();
        let this = self.clone();

        tokio::spawn(async move { this.run(content, cancel, tx).await });

        ReceiverStream::new(rx)
    }

    async fn run(self, content: Content, cancel: CancellationToken, tx: mpsc::Sender<Update>) {
        let mut history = self.history.lock().await;
        history.push(Message::user(content));

        let mut step = 0_usize;
        loop {
            step += 1;
            debug!(step, "Starting step.");

            match self.step(&mut history, &cancel, &tx).await {
                Ok(0) => break,
                Ok(tools) => trace!(step, tools, "Step ran tools, continuing."),
                Err(error) => {
                    error!(step, %error, "Step failed.");
                    emit(&tx, Update::Error(error)).await;
                    break;
                }
            }
        }

        debug!(steps = step, "Turn finished.");
    }

    /// Run one step. Returns the number of tool messages it produced.
    async fn step(
        &self,
        history: &mut Vec<Message>,
        cancel: &CancellationToken,
        tx: &mpsc::Sender<Update>,
    ) -> Result<usize> {
        let system_prompt = self.system_prompt.as_ref().map(|prompt| prompt());
        let schemas = self.toolbox.schemas();

        let mut output = StepOutput::default();
        let result = self
            .exchange(system_prompt.as_ref(), history, &schemas, cancel, tx, &mut output)
            .await;

        {
            let mut totals = self.totals.lock();
            totals.usage += output.usage;
            totals.cost += output.cost;
        }

        if let Some(snapshot) = &self.snapshot {
            let record = StepRecord {
                sent: system_prompt
                    .map(Message::system)
                    .into_iter()
                    .chain(history.iter().cloned())
                    .collect(),
                received: output.received.clone(),
                tool_results: output
                    .tool_messages
                    .iter()
                    .chain(&output.image_messages)
                    .cloned()
                    .collect(),
                tools: schemas.iter().map(|&schema| schema.clone()).collect(),
                usage: output.usage,
                error: result.as_ref().err().map(ToString::to_string),
            };

            if let Err(error) = snapshot.write(&record) {
                warn!(%error, "Failed to write step snapshot.");
            }
        }

        result?;

        let tools = output.tool_messages.len();
        history.extend(output.received);

        // Tool messages must directly follow the assistant message, images
        // go in separate user messages after them.
        history.extend(output.tool_messages);
        history.extend(output.image_messages);

        Ok(tools)
    }

    async fn exchange(
        &self,
        system_prompt: Option<&Content>,
        history: &[Message],
        schemas: &[&FunctionSchema],
        cancel: &CancellationToken,
        tx: &mpsc::Sender<Update>,
        output: &mut StepOutput,
    ) -> Result<()> {
        let mut stream = self
            .provider
            .generate(system_prompt, history, schemas, cancel.clone())
            .await?;

        let result = self.drive(&mut stream, history, cancel, tx, output).await;

        output.received = Some(stream.message().clone());
        output.usage = stream.usage();
        output.cost = stream.cost();

        result
    }

    async fn drive(
        &self,
        stream: &mut P::Stream,
        history: &[Message],
        cancel: &CancellationToken,
        tx: &mpsc::Sender<Update>,
        output: &mut StepOutput,
    ) -> Result<()> {
        while let Some(event) = stream.next_event().await {
            match event? {
                StreamEvent::Text(text) => emit(tx, Update::TextDelta(text)).await,
                StreamEvent::ToolCallBegin(call) => {
                    let label = self
                        .toolbox
                        .get(&call.name)
                        .map_or_else(|| call.name.clone(), |tool| tool.label().to_owned());

                    emit(tx, Update::ToolStarted {
                        call_id: call.correlation_id().to_owned(),
                        name: call.name,
                        label,
                    })
                    .await;
                }
                StreamEvent::ToolCallData(_) => {}
                StreamEvent::ToolCallReady(call) => {
                    let duplicate = is_duplicate(history, &output.tool_messages, &call);
                    if duplicate {
                        warn!(id = %call.id, name = %call.name, "Tool call ID seen before, running it anyway.");
                    }

                    let result = self.execute(&call, cancel, tx).await;

                    match Message::tool(call.correlation_id(), result.tool_content()) {
                        Ok(message) => output.tool_messages.push(message),
                        Err(error) => {
                            warn!(%error, name = %call.name, "Cannot answer tool call, dropping its result.");
                        }
                    }

                    if let Some(content) = result.image_content() {
                        output.image_messages.push(Message::user(content));
                    }

                    emit(tx, Update::ToolFinished {
                        call_id: call.correlation_id().to_owned(),
                        name: call.name,
                        result,
                        duplicate,
                    })
                    .await;
                }
            }
        }

        Ok(())
    }

    /// Run a tool call to completion, forwarding its status reports.
    async fn execute(
        &self,
        call: &ToolCall,
        cancel: &CancellationToken,
        tx: &mpsc::Sender<Update>,
    ) -> ToolResult {
        let (status_tx, mut status_rx) = mpsc::unbounded_channel::<String>();
        let runner = Runner::new(cancel.clone(), move |status: &str| {
            status_tx.send(status.to_owned()).ok();
        });

        info!(id = %call.id, name = %call.name, "Executing tool call.");

        let run = self.toolbox.run(&call.name, &runner, &call.arguments);
        tokio::pin!(run);

        let result = loop {
            tokio::select! {
                result = &mut run => break result,
                Some(status) = status_rx.recv() => {
                    emit(tx, Update::ToolStatus { name: call.name.clone(), status }).await;
                }
            }
        };

        while let Ok(status) = status_rx.try_recv() {
            emit(tx, Update::ToolStatus {
                name: call.name.clone(),
                status,
            })
            .await;
        }

        result
    }
}

/// Whether the call's ID already appeared earlier in the conversation.
///
/// Providers without call IDs are never flagged.
fn is_duplicate(history: &[Message], earlier: &[Message], call: &ToolCall) -> bool {
    if call.id.is_empty() {
        return false;
    }

    history.iter().chain(earlier).any(|message| {
        message.tool_call_id.as_deref() == Some(call.id.as_str())
            || message.tool_calls.iter().any(|c| c.id == call.id)
    })
}

async fn emit(tx: &mpsc::Sender<Update>, update: Update) {
    if tx.send(update).await.is_err() {
        trace!("Update receiver is gone, dropping update.");
    }
}

#[cfg(test)]
#[path = "conversation_tests.rs"]
mod tests;
