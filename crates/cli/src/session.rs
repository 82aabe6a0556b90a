use crate::upload::uploaded_file;
use anyhow::Result;
use lanshare_core::annotator::AnnotationClient;
use lanshare_core::coordinator::{AnalysisCoordinator, AnalysisOutcome};
use lanshare_core::models::{FileId, FileItem, StoreEvent};
use lanshare_core::store::{FileStore, SharedStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct SessionPlan {
    pub demo: bool,
    pub uploads: Vec<PathBuf>,
    pub renames: Vec<(FileId, String)>,
    pub deletes: Vec<FileId>,
    pub analyze: bool,
    pub query: Option<String>,
}

pub struct SessionReport {
    pub store: SharedStore,
    pub analyzed: Vec<(FileId, AnalysisOutcome)>,
    pub query: Option<String>,
}

impl SessionReport {
    /// Items matching the session query, newest first.
    pub fn visible(&self) -> Vec<FileItem> {
        let store = self.store.lock();
        store
            .search(self.query.as_deref().unwrap_or(""))
            .into_iter()
            .cloned()
            .collect()
    }
}

/// Plays one share session: seed, upload, rename, delete, then analyze.
pub async fn run_session(plan: SessionPlan, client: AnnotationClient) -> Result<SessionReport> {
    let store = if plan.demo {
        FileStore::with_demo_files(chrono::Utc::now())
    } else {
        FileStore::new()
    };
    tokio::spawn(log_events(store.subscribe()));
    let store = store.into_shared();

    let mut uploads = Vec::with_capacity(plan.uploads.len());
    for path in &plan.uploads {
        uploads.push(uploaded_file(path)?);
    }
    if !uploads.is_empty() {
        let ids = store.lock().add_many(uploads);
        info!(count = ids.len(), "files uploaded");
    }

    for (id, name) in &plan.renames {
        if let Err(e) = store.lock().rename(id, name) {
            warn!(%id, error = %e, "rename skipped");
        }
    }
    for id in &plan.deletes {
        if store.lock().delete(id).is_none() {
            warn!(%id, "delete skipped: no such file");
        }
    }

    let analyzed = if plan.analyze {
        if !client.is_configured() {
            warn!("no API key configured; annotations will carry the missing-key placeholder");
        }
        AnalysisCoordinator::new(store.clone(), Arc::new(client))
            .analyze_all()
            .await
    } else {
        Vec::new()
    };

    Ok(SessionReport {
        store,
        analyzed,
        query: plan.query,
    })
}

async fn log_events(mut rx: broadcast::Receiver<StoreEvent>) {
    loop {
        match rx.recv().await {
            Ok(StoreEvent::Added(id)) => info!(%id, "added"),
            Ok(StoreEvent::Renamed { id, name }) => info!(%id, %name, "renamed"),
            Ok(StoreEvent::Removed(id)) => info!(%id, "removed"),
            Ok(StoreEvent::AnalysisStarted(id)) => info!(%id, "analyzing"),
            Ok(StoreEvent::Annotated(id)) => info!(%id, "annotated"),
            Err(broadcast::error::RecvError::Lagged(n)) => warn!(skipped = n, "event log lagged"),
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
