//! Sequences the analyzing flag around an annotation call.
//!
//! The flag is set synchronously by [`AnalysisCoordinator::trigger`]. The
//! result is applied through the store by identifier after the call returns,
//! because the item may have been renamed or deleted in the meantime.

use crate::annotator::AnnotationClient;
use crate::models::FileId;
use crate::store::SharedStore;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOutcome {
    /// Description and tags were written to the item.
    Applied,
    /// The item was deleted while the call was pending.
    Discarded,
}

pub type PendingAnalysis = Pin<Box<dyn Future<Output = AnalysisOutcome> + Send + 'static>>;

#[derive(Clone)]
pub struct AnalysisCoordinator {
    store: SharedStore,
    client: Arc<AnnotationClient>,
}

impl AnalysisCoordinator {
    pub fn new(store: SharedStore, client: Arc<AnnotationClient>) -> Self {
        Self { store, client }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Marks the item as analyzing and returns the call still to be awaited.
    /// `None` when no item has this id.
    pub fn trigger(&self, id: &FileId) -> Option<PendingAnalysis> {
        let request = self.store.lock().begin_analysis(id)?;
        let store = self.store.clone();
        let client = self.client.clone();
        let id = id.clone();
        debug!(%id, name = %request.name, "analysis started");

        Some(Box::pin(async move {
            let result = client
                .analyze(&request.name, &request.mime, &request.size_label)
                .await;
            let applied = store.lock().complete_analysis(&id, result);
            if applied {
                info!(%id, "annotation applied");
                AnalysisOutcome::Applied
            } else {
                debug!(%id, "item removed during analysis, result discarded");
                AnalysisOutcome::Discarded
            }
        }))
    }

    /// Triggers the analysis and drives it on the runtime.
    pub fn spawn(&self, id: &FileId) -> Option<JoinHandle<AnalysisOutcome>> {
        self.trigger(id).map(tokio::spawn)
    }

    /// Analyzes every listed item concurrently.
    pub async fn analyze_all(&self) -> Vec<(FileId, AnalysisOutcome)> {
        let ids = self.store.lock().ids();
        let handles: Vec<_> = ids
            .into_iter()
            .filter_map(|id| self.spawn(&id).map(|h| (id, h)))
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push((id, outcome)),
                Err(e) => warn!(%id, error = %e, "analysis task failed"),
            }
        }
        outcomes
    }
}
