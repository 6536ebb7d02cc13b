//! Shared application state for the editor server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use cardflow::io::init::CardflowPaths;
use cardflow::session::Session;
use tokio::sync::{RwLock, broadcast};

/// Events broadcast to SSE clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A card was inserted, removed, edited, or the pipeline was imported.
    PipelineChanged,
    /// Base columns or filter state were reloaded from disk.
    InputsChanged,
    /// The pipeline was written to `pipeline.json`.
    PipelineSaved,
    /// An evaluation request was written.
    RequestWritten { path: PathBuf },
}

/// Shared state accessible from all request handlers.
///
/// The session is the single owner of the current pipeline. Handlers build
/// the next pipeline under the write lock and swap it in, so readers never
/// observe a half-applied edit.
#[derive(Clone)]
pub struct AppState {
    /// Root directory of the project (contains .cardflow/).
    pub project_dir: PathBuf,
    /// Resolved workspace paths.
    pub paths: Arc<CardflowPaths>,
    pub session: Arc<RwLock<Session>>,
    /// Broadcast sender for change events.
    pub event_tx: Arc<broadcast::Sender<ChangeEvent>>,
}

impl AppState {
    /// Open the workspace under `project_dir`.
    pub fn open(project_dir: &Path) -> Result<Self> {
        let session = Session::open(project_dir)?;
        let (event_tx, _) = broadcast::channel(64);
        Ok(Self {
            project_dir: project_dir.to_path_buf(),
            paths: Arc::new(session.paths().clone()),
            session: Arc::new(RwLock::new(session)),
            event_tx: Arc::new(event_tx),
        })
    }

    /// Broadcast `event`; having no subscribers is fine.
    pub fn notify(&self, event: ChangeEvent) {
        let _ = self.event_tx.send(event);
    }
}
