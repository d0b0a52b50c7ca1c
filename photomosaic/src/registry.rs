//! Session and resource ownership boundary.
//!
//! The engine and scheduler never deal with sessions directly; callers
//! (an HTTP layer, the CLI, tests) resolve session-owned bytes through a
//! [`ResourceRegistry`] and hand the engine plain buffers. The registry
//! enforces the one rule the pipeline depends on: a job may only
//! reference resources owned by the submitting session.
//!
//! [`InMemoryRegistry`] is the process-local implementation used by the
//! CLI and the test suite. Persistent storage backends implement the same
//! trait.

use crate::error::MosaicError;
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static RESOURCE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Opaque session identity, issued by an outer layer.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a stored resource.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a unique auto-generated resource id (`resource-{counter}`).
    pub fn auto() -> Self {
        let counter = RESOURCE_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("resource-{}", counter))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({})", self.0)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a stored byte blob represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    /// A target photograph to reconstruct.
    Target,

    /// An uploaded material archive, kept until ingested.
    MaterialArchive,

    /// A finished mosaic result image.
    MosaicResult,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Target => write!(f, "target"),
            Self::MaterialArchive => write!(f, "material archive"),
            Self::MosaicResult => write!(f, "mosaic result"),
        }
    }
}

/// Listing entry returned by [`ResourceRegistry::resolve`].
#[derive(Clone, Debug)]
pub struct ResourceEntry {
    pub id: ResourceId,
    pub kind: ResourceKind,
    pub len: usize,
}

/// Storage and ownership contract between sessions and the pipeline.
///
/// Implementations must be safe to share across worker tasks.
pub trait ResourceRegistry: Send + Sync {
    /// Stores bytes on behalf of a session and returns their id.
    fn store(&self, session: &SessionId, kind: ResourceKind, bytes: Vec<u8>) -> ResourceId;

    /// Lists every resource the session owns.
    fn resolve(&self, session: &SessionId) -> Vec<ResourceEntry>;

    /// Returns a resource's bytes, checking ownership.
    ///
    /// # Errors
    ///
    /// [`MosaicError::PreconditionFailed`] when the resource does not
    /// exist or belongs to a different session. The two cases are not
    /// distinguished, so a session cannot probe for foreign ids.
    fn fetch_owned(
        &self,
        session: &SessionId,
        id: &ResourceId,
    ) -> Result<Arc<Vec<u8>>, MosaicError>;

    /// Deletes a resource. Returns false when the id is unknown.
    fn delete(&self, id: &ResourceId) -> bool;
}

struct StoredResource {
    owner: SessionId,
    kind: ResourceKind,
    bytes: Arc<Vec<u8>>,
}

/// Process-local registry backed by a concurrent map.
#[derive(Default)]
pub struct InMemoryRegistry {
    resources: DashMap<ResourceId, StoredResource>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResourceRegistry for InMemoryRegistry {
    fn store(&self, session: &SessionId, kind: ResourceKind, bytes: Vec<u8>) -> ResourceId {
        let id = ResourceId::auto();
        self.resources.insert(
            id.clone(),
            StoredResource {
                owner: session.clone(),
                kind,
                bytes: Arc::new(bytes),
            },
        );
        id
    }

    fn resolve(&self, session: &SessionId) -> Vec<ResourceEntry> {
        self.resources
            .iter()
            .filter(|entry| entry.value().owner == *session)
            .map(|entry| ResourceEntry {
                id: entry.key().clone(),
                kind: entry.value().kind,
                len: entry.value().bytes.len(),
            })
            .collect()
    }

    fn fetch_owned(
        &self,
        session: &SessionId,
        id: &ResourceId,
    ) -> Result<Arc<Vec<u8>>, MosaicError> {
        let resource = self.resources.get(id).ok_or_else(|| {
            MosaicError::PreconditionFailed(format!("resource {} is not available", id))
        })?;
        if resource.owner != *session {
            return Err(MosaicError::PreconditionFailed(format!(
                "resource {} is not available",
                id
            )));
        }
        Ok(Arc::clone(&resource.bytes))
    }

    fn delete(&self, id: &ResourceId) -> bool {
        self.resources.remove(id).is_some()
    }
}
