// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File delivery: move a finished artifact somewhere the user can reach.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from upload operations.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Adapter for uploading a file and returning a shareable URL.
#[async_trait]
pub trait FileDelivery: Clone + Send + Sync + 'static {
    async fn upload(&self, path: &Path) -> Result<String, DeliveryError>;
}

/// Delivery into a local exports directory, for hosts without cloud
/// credentials. "Upload" is a copy; the URL is a `file://` path.
#[derive(Debug, Clone)]
pub struct LocalFileDelivery {
    exports_dir: PathBuf,
}

impl LocalFileDelivery {
    pub fn new(exports_dir: impl Into<PathBuf>) -> Self {
        Self {
            exports_dir: exports_dir.into(),
        }
    }
}

#[async_trait]
impl FileDelivery for LocalFileDelivery {
    async fn upload(&self, path: &Path) -> Result<String, DeliveryError> {
        let name = path
            .file_name()
            .ok_or_else(|| DeliveryError::UploadFailed(format!("not a file: {}", path.display())))?;
        tokio::fs::create_dir_all(&self.exports_dir).await?;
        let dest = self.exports_dir.join(name);
        tokio::fs::copy(path, &dest).await?;
        Ok(format!("file://{}", dest.display()))
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake {
    #![cfg_attr(coverage_nightly, coverage(off))]

    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Fake delivery recording uploads and minting predictable URLs.
    #[derive(Clone, Default)]
    pub struct FakeFileDelivery {
        uploads: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl FakeFileDelivery {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn uploads(&self) -> Vec<PathBuf> {
            self.uploads.lock().clone()
        }
    }

    #[async_trait]
    impl FileDelivery for FakeFileDelivery {
        async fn upload(&self, path: &Path) -> Result<String, DeliveryError> {
            self.uploads.lock().push(path.to_path_buf());
            Ok(format!("https://delivery.invalid/{}", self.uploads.lock().len()))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeFileDelivery;

#[cfg(test)]
#[path = "delivery_tests.rs"]
mod tests;
