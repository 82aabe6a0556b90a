//! In-memory, identifier-keyed store of the files on the share.
//!
//! Items are kept newest first. Every mutation is announced on a broadcast
//! channel so renderers can follow along without polling.

use crate::format::size_label;
use crate::models::{
    AnnotationRequest, AnnotationResult, FileId, FileItem, StoreEvent, UploadedFile, DEFAULT_MIME,
};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

pub type SharedStore = Arc<Mutex<FileStore>>;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no file with id {0}")]
    NotFound(FileId),
    #[error("file name cannot be empty")]
    EmptyName,
}

pub struct FileStore {
    items: HashMap<FileId, FileItem>,
    order: Vec<FileId>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FileStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            items: HashMap::new(),
            order: Vec::new(),
            events,
        }
    }

    /// The demo share shown on first start.
    pub fn with_demo_files(now: DateTime<Utc>) -> Self {
        let mut store = Self::new();
        let demo = [
            FileItem {
                id: FileId::new("1"),
                name: "项目需求说明书_v2.pdf".into(),
                size: 2_450_000,
                mime: "application/pdf".into(),
                uploaded_at: now - Duration::milliseconds(10_000_000),
                description: Some("2025年Q1核心项目业务需求详述，包含UI规范。".into()),
                tags: Some(vec!["需求".into(), "文档".into(), "Q1".into()]),
                analyzing: false,
            },
            FileItem {
                id: FileId::new("2"),
                name: "首页设计稿_Final.png".into(),
                size: 5_600_000,
                mime: "image/png".into(),
                uploaded_at: now - Duration::milliseconds(5_000_000),
                description: None,
                tags: None,
                analyzing: false,
            },
            FileItem {
                id: FileId::new("3"),
                name: "demo_video_preview.mp4".into(),
                size: 45_000_000,
                mime: "video/mp4".into(),
                uploaded_at: now - Duration::milliseconds(2_000_000),
                description: None,
                tags: None,
                analyzing: false,
            },
            FileItem {
                id: FileId::new("4"),
                name: "utils.js".into(),
                size: 1200,
                mime: "application/javascript".into(),
                uploaded_at: now - Duration::hours(24),
                description: None,
                tags: None,
                analyzing: false,
            },
        ];
        for item in demo {
            store.order.push(item.id.clone());
            store.items.insert(item.id.clone(), item);
        }
        store
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: &FileId) -> Option<&FileItem> {
        self.items.get(id)
    }

    /// All items, newest first.
    pub fn list(&self) -> Vec<&FileItem> {
        self.order.iter().filter_map(|id| self.items.get(id)).collect()
    }

    pub fn ids(&self) -> Vec<FileId> {
        self.order.clone()
    }

    pub fn add(&mut self, file: UploadedFile) -> FileId {
        self.add_many(vec![file]).remove(0)
    }

    /// Adds a batch in front of the existing items, keeping batch order.
    pub fn add_many(&mut self, files: Vec<UploadedFile>) -> Vec<FileId> {
        let now = Utc::now();
        let mut ids = Vec::with_capacity(files.len());
        for file in files {
            let id = FileId::generate();
            let mime = file
                .mime
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MIME.to_string());
            debug!(%id, name = %file.name, size = file.size, "file added");
            self.items.insert(
                id.clone(),
                FileItem {
                    id: id.clone(),
                    name: file.name,
                    size: file.size,
                    mime,
                    uploaded_at: now,
                    description: None,
                    tags: None,
                    analyzing: false,
                },
            );
            ids.push(id);
        }
        self.order.splice(0..0, ids.iter().cloned());
        for id in &ids {
            self.emit(StoreEvent::Added(id.clone()));
        }
        ids
    }

    pub fn rename(&mut self, id: &FileId, new_name: &str) -> Result<(), StoreError> {
        let name = new_name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        let item = self
            .items
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        item.name = name.to_string();
        self.emit(StoreEvent::Renamed {
            id: id.clone(),
            name: name.to_string(),
        });
        Ok(())
    }

    pub fn delete(&mut self, id: &FileId) -> Option<FileItem> {
        let removed = self.items.remove(id)?;
        self.order.retain(|o| o != id);
        self.emit(StoreEvent::Removed(id.clone()));
        Some(removed)
    }

    /// Case-insensitive match on name, description or any tag.
    pub fn search(&self, query: &str) -> Vec<&FileItem> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return self.list();
        }
        self.list()
            .into_iter()
            .filter(|f| {
                f.name.to_lowercase().contains(&q)
                    || f
                        .description
                        .as_deref()
                        .map(|d| d.to_lowercase().contains(&q))
                        .unwrap_or(false)
                    || f
                        .tags
                        .as_ref()
                        .map(|tags| tags.iter().any(|t| t.to_lowercase().contains(&q)))
                        .unwrap_or(false)
            })
            .collect()
    }

    /// Flags the item as analyzing and captures what the model is told about it.
    pub fn begin_analysis(&mut self, id: &FileId) -> Option<AnnotationRequest> {
        let item = self.items.get_mut(id)?;
        item.analyzing = true;
        let request = AnnotationRequest {
            name: item.name.clone(),
            mime: item.mime.clone(),
            size_label: size_label(item.size),
        };
        self.emit(StoreEvent::AnalysisStarted(id.clone()));
        Some(request)
    }

    /// Applies a finished analysis. Returns false when the item is gone.
    pub fn complete_analysis(&mut self, id: &FileId, result: AnnotationResult) -> bool {
        let Some(item) = self.items.get_mut(id) else {
            return false;
        };
        item.analyzing = false;
        item.description = Some(result.description);
        item.tags = Some(result.tags);
        self.emit(StoreEvent::Annotated(id.clone()));
        true
    }
}
