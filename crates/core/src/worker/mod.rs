//! Completion context worker.
//!
//! One long-lived task per open document. Requests go into a depth-1 slot
//! (the newest replaces whatever is pending) and every request bumps the
//! session's generation, cancelling the run in flight. A run checks its
//! token after the variable table step and after resolution, and once more
//! under the emission gate, so only the newest request's outcome ever
//! reaches the notification channel.

mod run;
mod session;

use crate::config::CompletionConfig;
use crate::error::{LuasenseError, Result};
use dashmap::DashMap;
use luasense_api::Catalog;
use luasense_api::models::{CompletionRequest, DocumentId, Notification};
use luasense_lua::VariableTable;
use session::DocumentSession;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Everything a run needs besides its session.
pub(crate) struct WorkerContext {
    pub catalog: Arc<dyn Catalog>,
    pub config: CompletionConfig,
    pub events: mpsc::UnboundedSender<Notification>,
}

pub struct CompletionService {
    ctx: Arc<WorkerContext>,
    sessions: DashMap<DocumentId, DocumentSession>,
    cancel_token: CancellationToken,
}

impl CompletionService {
    /// Creates the service and the receiving end of its notification
    /// channel. Must be called inside a tokio runtime before documents are
    /// opened.
    pub fn new(
        catalog: Arc<dyn Catalog>,
        config: CompletionConfig,
    ) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (events, rx) = mpsc::unbounded_channel();
        let service = Self {
            ctx: Arc::new(WorkerContext {
                catalog,
                config,
                events,
            }),
            sessions: DashMap::new(),
            cancel_token: CancellationToken::new(),
        };
        (service, rx)
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.ctx.config
    }

    pub fn catalog(&self) -> Arc<dyn Catalog> {
        self.ctx.catalog.clone()
    }

    /// Starts the document's worker task; a no-op if it is already open.
    pub fn open_document(&self, document: DocumentId) {
        self.sessions.entry(document.clone()).or_insert_with(|| {
            info!("Opening document {}", document);
            DocumentSession::spawn(document, self.ctx.clone(), &self.cancel_token)
        });
    }

    /// Queues a resolution for `document`, opening it if needed, and returns
    /// the generation its notifications will carry.
    pub fn request(&self, document: &DocumentId, request: CompletionRequest) -> u64 {
        if let Some(session) = self.sessions.get(document) {
            return session.submit(request);
        }
        self.open_document(document.clone());
        match self.sessions.get(document) {
            Some(session) => session.submit(request),
            None => 0,
        }
    }

    /// Stops the document's run in flight; nothing it computed is emitted.
    pub fn cancel(&self, document: &DocumentId) -> Result<()> {
        let session = self
            .sessions
            .get(document)
            .ok_or_else(|| LuasenseError::SessionClosed(document.to_string()))?;
        session.stop();
        Ok(())
    }

    /// Stops the document's task and forgets its variable table.
    pub fn close_document(&self, document: &DocumentId) -> bool {
        match self.sessions.remove(document) {
            Some(_) => {
                info!("Closed document {}", document);
                true
            }
            None => false,
        }
    }

    pub fn is_open(&self, document: &DocumentId) -> bool {
        self.sessions.contains_key(document)
    }

    pub fn open_documents(&self) -> Vec<DocumentId> {
        let mut documents: Vec<_> = self.sessions.iter().map(|e| e.key().clone()).collect();
        documents.sort();
        documents
    }

    /// Generation of the newest request (or cancellation) for `document`.
    pub fn generation(&self, document: &DocumentId) -> Option<u64> {
        self.sessions.get(document).map(|s| s.generation())
    }

    /// Point-in-time copy of the document's variable table.
    pub async fn variables_snapshot(&self, document: &DocumentId) -> Option<Arc<VariableTable>> {
        // Clone the handle's state out so no map guard is held across the await.
        let session = self.sessions.get(document)?;
        let state = session.state();
        drop(session);
        session::table_snapshot(&state).await
    }
}

impl Drop for CompletionService {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
