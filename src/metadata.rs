//! Metadata value objects for chunks, documents, and libraries

use crate::error::{ChunkDbError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Open string-keyed map carried alongside the fixed metadata schema.
pub type CustomFields = HashMap<String, serde_json::Value>;

/// Metadata attached to a single chunk.
///
/// `created_at` is fixed at construction; `updated_at` is refreshed on every
/// mutation of the owning chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub page_number: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub custom_fields: CustomFields,
}

impl ChunkMetadata {
    pub fn new(source: impl Into<String>, page_number: Option<u32>) -> Self {
        let now = Utc::now();
        Self {
            source: source.into(),
            page_number,
            created_at: now,
            updated_at: now,
            custom_fields: CustomFields::new(),
        }
    }

    pub fn with_custom_fields(mut self, custom_fields: CustomFields) -> Self {
        self.custom_fields = custom_fields;
        self
    }

    /// Return a new metadata instance with selective updates.
    ///
    /// Provided fields override; custom fields shallow-merge onto the
    /// existing map; `created_at` is always carried forward unchanged and
    /// `updated_at` is refreshed.
    pub fn updated(&self, update: &ChunkMetadataUpdate) -> Self {
        let mut custom_fields = self.custom_fields.clone();
        if let Some(extra) = &update.custom_fields {
            custom_fields.extend(extra.clone());
        }
        Self {
            source: update.source.clone().unwrap_or_else(|| self.source.clone()),
            page_number: update.page_number.or(self.page_number),
            created_at: self.created_at,
            updated_at: Utc::now(),
            custom_fields,
        }
    }

    /// Return a copy with only `updated_at` refreshed.
    pub fn touched(&self) -> Self {
        Self {
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Check whether this metadata matches the given filter.
    ///
    /// `source` and `page_number` require exact equality; `created_after`
    /// and `created_before` are strict timestamp comparisons.
    pub fn matches_filter(&self, filter: &ChunkFilter) -> bool {
        if let Some(source) = &filter.source {
            if &self.source != source {
                return false;
            }
        }
        if let Some(page) = filter.page_number {
            if self.page_number != Some(page) {
                return false;
            }
        }
        if let Some(after) = filter.created_after {
            if self.created_at <= after {
                return false;
            }
        }
        if let Some(before) = filter.created_before {
            if self.created_at >= before {
                return false;
            }
        }
        true
    }
}

/// Partial update for [`ChunkMetadata`]; unset fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkMetadataUpdate {
    pub source: Option<String>,
    pub page_number: Option<u32>,
    pub custom_fields: Option<CustomFields>,
}

/// Metadata predicate applied during similarity search.
///
/// Deserialization ignores unrecognized keys, so a filter with a typo'd key
/// matches everything that the recognized keys allow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkFilter {
    pub source: Option<String>,
    pub page_number: Option<u32>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

/// Metadata shared by all chunks of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub custom_fields: CustomFields,
}

impl DocumentMetadata {
    pub fn new(title: impl Into<String>, author: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            title: title.into(),
            author,
            created_at: now,
            updated_at: now,
            custom_fields: CustomFields::new(),
        }
    }

    pub fn with_custom_fields(mut self, custom_fields: CustomFields) -> Self {
        self.custom_fields = custom_fields;
        self
    }

    /// Return a new metadata instance with selective updates, preserving
    /// `created_at`.
    pub fn updated(&self, update: &DocumentMetadataUpdate) -> Self {
        let mut custom_fields = self.custom_fields.clone();
        if let Some(extra) = &update.custom_fields {
            custom_fields.extend(extra.clone());
        }
        Self {
            title: update.title.clone().unwrap_or_else(|| self.title.clone()),
            author: update.author.clone().or_else(|| self.author.clone()),
            created_at: self.created_at,
            updated_at: Utc::now(),
            custom_fields,
        }
    }

    /// Return a copy with only `updated_at` refreshed.
    pub fn touched(&self) -> Self {
        Self {
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}

/// Partial update for [`DocumentMetadata`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentMetadataUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub custom_fields: Option<CustomFields>,
}

/// Metadata describing a library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryMetadata {
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub custom_fields: CustomFields,
}

impl LibraryMetadata {
    /// Create library metadata. Fails on an empty or blank name.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ChunkDbError::invalid("Library name cannot be empty"));
        }
        let now = Utc::now();
        Ok(Self {
            name,
            description: description.into(),
            created_at: now,
            updated_at: now,
            custom_fields: CustomFields::new(),
        })
    }

    pub fn with_custom_fields(mut self, custom_fields: CustomFields) -> Self {
        self.custom_fields = custom_fields;
        self
    }

    /// Return a new metadata instance with selective updates, preserving
    /// `created_at`. Fails if the update renames the library to a blank name.
    pub fn updated(&self, update: &LibraryMetadataUpdate) -> Result<Self> {
        let name = update.name.clone().unwrap_or_else(|| self.name.clone());
        if name.trim().is_empty() {
            return Err(ChunkDbError::invalid("Library name cannot be empty"));
        }
        let mut custom_fields = self.custom_fields.clone();
        if let Some(extra) = &update.custom_fields {
            custom_fields.extend(extra.clone());
        }
        Ok(Self {
            name,
            description: update
                .description
                .clone()
                .unwrap_or_else(|| self.description.clone()),
            created_at: self.created_at,
            updated_at: Utc::now(),
            custom_fields,
        })
    }

    /// Return a copy with only `updated_at` refreshed.
    pub fn touched(&self) -> Self {
        Self {
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}

/// Partial update for [`LibraryMetadata`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibraryMetadataUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub custom_fields: Option<CustomFields>,
}
