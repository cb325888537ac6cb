//! JSON document persistence shared by the file-backed stores.

use rootcause::Report;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::StoreError;

/// A JSON document on disk. A missing or blank file reads as `T::default()`.
#[derive(Debug, Clone)]
pub(crate) struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) async fn read<T>(&self) -> Result<T, Report<StoreError>>
    where
        T: DeserializeOwned + Default,
    {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "file not found, using empty document");
                return Ok(T::default());
            }
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    reason: e.to_string(),
                }
                .into());
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            StoreError::Decode {
                path: self.path.clone(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Replaces the document atomically: write a sibling temp file, then rename.
    pub(crate) async fn write<T>(&self, data: &T) -> Result<(), Report<StoreError>>
    where
        T: Serialize,
    {
        let bytes = serde_json::to_vec_pretty(data).map_err(|e| StoreError::Encode {
            reason: e.to_string(),
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.write_error(&e))?;
            }
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes)
            .await
            .map_err(|e| self.write_error(&e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.write_error(&e))?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn write_error(&self, e: &std::io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn missing_file_reads_as_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = JsonFile::new(dir.path().join("absent.json"));
        let data: BTreeMap<String, u32> = file.read().await.expect("read");
        assert!(data.is_empty());
    }

    #[tokio::test]
    async fn blank_file_reads_as_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("blank.json");
        std::fs::write(&path, "\n  ").expect("write fixture");
        let data: Vec<String> = JsonFile::new(&path).read().await.expect("read");
        assert!(data.is_empty());
    }

    #[tokio::test]
    async fn write_creates_parent_dirs_and_reads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = JsonFile::new(dir.path().join("nested/data/doc.json"));
        let mut data = BTreeMap::new();
        data.insert("a".to_string(), 1u32);

        file.write(&data).await.expect("write");
        let read: BTreeMap<String, u32> = file.read().await.expect("read");
        assert_eq!(read, data);
        assert!(!file.temp_path().exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_decode_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("corrupt.json");
        std::fs::write(&path, "{not json").expect("write fixture");
        let result: Result<Vec<String>, _> = JsonFile::new(&path).read().await;
        assert!(result.is_err());
    }
}
