//! Contexts running on their own tasks.
//!
//! Each context is owned by a tokio task and fed over a channel, so two
//! contexts never share an environment and units sent to one context are
//! transpiled in the order they were sent.

use std::collections::HashMap;
use std::sync::Arc;

use rhizome_tendril_codegen_js::{JsModule, ModuleLoader};
use rhizome_tendril_ir::{Block, Form};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc, oneshot};
use tracing::{info, warn};

use crate::context::{Context, ContextId};
use crate::loader::FsModuleLoader;
use crate::{ProvidedSymbols, RuntimeError};

type Responder<T> = oneshot::Sender<Result<T, RuntimeError>>;

enum Job {
    Form(Form, Responder<JsModule>),
    Block(Block, Responder<JsModule>),
}

/// A request from the host, as it arrives on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    InitContext { provided_symbols: ProvidedSymbols },
    EvalForm { context_id: ContextId, form: Form },
    EvalBlock { context_id: ContextId, block: Block },
    DropContext { context_id: ContextId },
}

/// The answer to a [`Command`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reply", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Reply {
    Initialized {
        context_id: ContextId,
        module: JsModule,
    },
    Evaluated {
        module: JsModule,
    },
    Dropped,
    Failed {
        message: String,
    },
}

pub struct ContextPool {
    contexts: RwLock<HashMap<ContextId, mpsc::UnboundedSender<Job>>>,
    loader: Option<Arc<dyn ModuleLoader>>,
}

impl Default for ContextPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextPool {
    /// Imports are read from disk, relative to each context's `from`.
    pub fn new() -> Self {
        Self {
            contexts: RwLock::new(HashMap::new()),
            loader: None,
        }
    }

    /// Every context loads its imports through `loader`.
    pub fn with_loader(loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            contexts: RwLock::new(HashMap::new()),
            loader: Some(loader),
        }
    }

    /// Creates a context and starts its task.
    ///
    /// Returns the new ID together with the JavaScript the implicit
    /// statements produced.
    pub async fn init_context(
        &self,
        provided: ProvidedSymbols,
    ) -> Result<(ContextId, JsModule), RuntimeError> {
        let loader = match &self.loader {
            Some(loader) => Arc::clone(loader),
            None => Arc::new(FsModuleLoader::for_source(&provided.from)),
        };
        let (context, js) = Context::new(&provided, loader)?;
        let id = context.id();

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_context(context, rx));
        self.contexts.write().await.insert(id, tx);

        info!("Started context {}", id);
        Ok((id, js))
    }

    pub async fn eval_form(&self, id: ContextId, form: Form) -> Result<JsModule, RuntimeError> {
        self.submit(id, |reply| Job::Form(form, reply)).await
    }

    pub async fn eval_block(&self, id: ContextId, block: Block) -> Result<JsModule, RuntimeError> {
        self.submit(id, |reply| Job::Block(block, reply)).await
    }

    /// Stops the context's task once the units already sent are done.
    pub async fn drop_context(&self, id: ContextId) -> Result<(), RuntimeError> {
        match self.contexts.write().await.remove(&id) {
            Some(_) => {
                info!("Dropped context {}", id);
                Ok(())
            }
            None => {
                warn!("Failed to drop unknown context {}", id);
                Err(RuntimeError::UnknownContext(id))
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.contexts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.contexts.read().await.is_empty()
    }

    /// Runs a wire command. Errors are folded into [`Reply::Failed`].
    pub async fn handle(&self, command: Command) -> Reply {
        let result = match command {
            Command::InitContext { provided_symbols } => self
                .init_context(provided_symbols)
                .await
                .map(|(context_id, module)| Reply::Initialized { context_id, module }),
            Command::EvalForm { context_id, form } => self
                .eval_form(context_id, form)
                .await
                .map(|module| Reply::Evaluated { module }),
            Command::EvalBlock { context_id, block } => self
                .eval_block(context_id, block)
                .await
                .map(|module| Reply::Evaluated { module }),
            Command::DropContext { context_id } => {
                self.drop_context(context_id).await.map(|()| Reply::Dropped)
            }
        };
        result.unwrap_or_else(|err| Reply::Failed {
            message: err.to_string(),
        })
    }

    async fn submit(
        &self,
        id: ContextId,
        job: impl FnOnce(Responder<JsModule>) -> Job,
    ) -> Result<JsModule, RuntimeError> {
        let tx = self
            .contexts
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(RuntimeError::UnknownContext(id))?;

        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(job(reply_tx))
            .map_err(|_| RuntimeError::ContextClosed(id))?;
        reply_rx
            .await
            .map_err(|_| RuntimeError::ContextClosed(id))?
    }
}

async fn run_context(mut context: Context, mut rx: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = rx.recv().await {
        // The requester may have gone away; its answer is simply dropped.
        match job {
            Job::Form(form, reply) => {
                let _ = reply.send(context.eval_form(&form));
            }
            Job::Block(block, reply) => {
                let _ = reply.send(context.eval_block(&block));
            }
        }
    }
}
