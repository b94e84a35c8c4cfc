//! In-memory record of generated results for one client session.
//!
//! Entries are only ever appended; the list is emptied by an explicit
//! [`History::clear`]. Nothing here is persisted.

use super::{GenerationParams, UploadedImage};
use crate::dtos::{GenerateResponse, ResponseMetadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub prompt: String,
    pub text: String,
    /// Base64 image payloads, in the order returned.
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub params: GenerationParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_image: Option<UploadedImage>,
}

impl HistoryEntry {
    pub fn from_response(
        prompt: &str,
        params: GenerationParams,
        response: GenerateResponse,
        input_image: Option<UploadedImage>,
    ) -> Self {
        let mut images = response.images;
        if images.is_empty() {
            if let Some(image) = response.image {
                images.push(image);
            }
        }

        Self {
            id: Uuid::new_v4().to_string(),
            prompt: prompt.to_string(),
            text: response.text,
            images,
            created_at: Utc::now(),
            params,
            metadata: Some(response.metadata),
            input_image,
        }
    }
}

/// Append-only list of entries, oldest first in storage.
#[derive(Debug, Default, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    /// Entries with the most recently completed first.
    pub fn newest_first(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev()
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
