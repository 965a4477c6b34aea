use super::WorkerContext;
use super::run;
use luasense_api::models::{CompletionRequest, DocumentId};
use luasense_lua::VariableTable;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{RwLock, watch};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A request stamped with the generation it was issued under.
#[derive(Clone)]
pub(crate) struct RunTicket {
    pub generation: u64,
    pub token: CancellationToken,
    pub request: CompletionRequest,
    /// Cursor of the request issued before this one.
    pub previous_cursor: Option<usize>,
}

impl RunTicket {
    #[cfg(test)]
    pub(crate) fn detached(
        generation: u64,
        request: CompletionRequest,
        previous_cursor: Option<usize>,
    ) -> Self {
        Self {
            generation,
            token: CancellationToken::new(),
            request,
            previous_cursor,
        }
    }
}

#[derive(Clone)]
pub(crate) struct TableSnapshot {
    pub table: Arc<VariableTable>,
    pub line_count: usize,
}

pub(crate) struct Gate {
    pub generation: u64,
    current: CancellationToken,
    last_cursor: Option<usize>,
}

/// State shared between the session handle and its task.
pub(crate) struct SessionState {
    pub document: DocumentId,
    gate: Mutex<Gate>,
    pub table: RwLock<Option<TableSnapshot>>,
}

impl SessionState {
    pub(crate) fn lock_gate(&self) -> MutexGuard<'_, Gate> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to one document's long-lived worker task.
pub(crate) struct DocumentSession {
    state: Arc<SessionState>,
    slot: watch::Sender<Option<RunTicket>>,
    cancel_token: CancellationToken,
}

impl DocumentSession {
    pub(crate) fn spawn(
        document: DocumentId,
        ctx: Arc<WorkerContext>,
        parent: &CancellationToken,
    ) -> Self {
        let cancel_token = parent.child_token();
        let state = Arc::new(SessionState {
            document,
            gate: Mutex::new(Gate {
                generation: 0,
                current: cancel_token.child_token(),
                last_cursor: None,
            }),
            table: RwLock::new(None),
        });
        let (slot, rx) = watch::channel(None);

        tokio::spawn(session_loop(state.clone(), rx, ctx, cancel_token.clone()));

        Self {
            state,
            slot,
            cancel_token,
        }
    }

    /// Replaces whatever is pending and supersedes the run in flight.
    pub(crate) fn submit(&self, request: CompletionRequest) -> u64 {
        let mut gate = self.state.lock_gate();
        gate.generation += 1;
        gate.current.cancel();
        gate.current = self.cancel_token.child_token();
        let previous_cursor = gate.last_cursor.replace(request.cursor_offset);

        let ticket = RunTicket {
            generation: gate.generation,
            token: gate.current.clone(),
            request,
            previous_cursor,
        };
        // Published under the gate so slot order follows generation order.
        self.slot.send_replace(Some(ticket));
        gate.generation
    }

    /// Stops the run in flight without scheduling a new one.
    pub(crate) fn stop(&self) {
        let mut gate = self.state.lock_gate();
        gate.generation += 1;
        gate.current.cancel();
    }

    pub(crate) fn generation(&self) -> u64 {
        self.state.lock_gate().generation
    }

    pub(crate) fn state(&self) -> Arc<SessionState> {
        self.state.clone()
    }
}

pub(crate) async fn table_snapshot(state: &SessionState) -> Option<Arc<VariableTable>> {
    state
        .table
        .read()
        .await
        .as_ref()
        .map(|snapshot| snapshot.table.clone())
}

impl Drop for DocumentSession {
    fn drop(&mut self) {
        self.stop();
        self.cancel_token.cancel();
    }
}

async fn session_loop(
    state: Arc<SessionState>,
    mut rx: watch::Receiver<Option<RunTicket>>,
    ctx: Arc<WorkerContext>,
    cancel_token: CancellationToken,
) {
    info!("Completion session for {} started", state.document);
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let ticket = rx.borrow_and_update().clone();
                if let Some(ticket) = ticket {
                    run::execute(&state, &ctx, ticket).await;
                }
            }
        }
    }
    info!("Completion session for {} stopped", state.document);
}
