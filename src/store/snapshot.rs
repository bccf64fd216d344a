// src/store/snapshot.rs
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing;
use uuid::Uuid;

use crate::errors::AcikResult;
use crate::models::child::Child;
use crate::models::trip::Trip;

/// On-disk layout: the full trip list plus the passenger roster, under the
/// fixed logical names "trips" and "children".
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Snapshot {
    pub trips: Vec<Trip>,
    pub children: Vec<Child>,
}

/// Receives the full trip list after every mutation batch. Implementations
/// must never fail the triggering mutation.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn write(&self, trips: Vec<Trip>);
}

/// JSON snapshot on local disk, rewritten after every mutation. The child
/// roster is read-only from the core's perspective, so the copy captured at
/// startup is written back verbatim.
pub struct SnapshotFile {
    path: PathBuf,
    children: Vec<Child>,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>, children: Vec<Child>) -> Self {
        Self {
            path: path.into(),
            children,
        }
    }

    /// Load a snapshot from disk. A missing file is a clean first start, not
    /// an error.
    pub async fn load(path: impl AsRef<Path>) -> AcikResult<Option<Snapshot>> {
        match tokio::fs::read(path.as_ref()).await {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
                Ok(Some(snapshot))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn persist(&self, trips: Vec<Trip>) -> AcikResult<()> {
        let snapshot = Snapshot {
            trips,
            children: self.children.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        // Write-then-rename so a crash mid-write never corrupts the snapshot.
        let tmp = self.path.with_extension(format!("{}.tmp", Uuid::new_v4()));
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotSink for SnapshotFile {
    async fn write(&self, trips: Vec<Trip>) {
        if let Err(err) = self.persist(trips).await {
            tracing::warn!("Snapshot write failed: {}", err);
        }
    }
}
