// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Knowledge base: key→value CRUD over a user-editable YAML file.
//!
//! Agents read durable operator preferences from here (style notes,
//! channel conventions, crop defaults). The file is owned by the user as
//! much as by the daemon, so writes go through the same read-modify-write
//! cycle a human editing the file would perform, and unknown structure is
//! preserved.

use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from knowledge-base operations.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("knowledge base root is not a mapping: {0}")]
    NotAMapping(PathBuf),
}

/// Adapter for key→value CRUD over the knowledge base.
pub trait KnowledgeBase: Clone + Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<String>, KnowledgeError>;
    fn set(&self, key: &str, value: &str) -> Result<(), KnowledgeError>;
    fn remove(&self, key: &str) -> Result<bool, KnowledgeError>;
    fn entries(&self) -> Result<Vec<(String, String)>, KnowledgeError>;
}

/// YAML-file knowledge base.
#[derive(Debug, Clone)]
pub struct YamlKnowledgeBase {
    path: PathBuf,
}

impl YamlKnowledgeBase {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Mapping, KnowledgeError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Mapping::new()),
            Err(err) => return Err(err.into()),
        };
        if text.trim().is_empty() {
            return Ok(Mapping::new());
        }
        match serde_yaml::from_str::<Value>(&text)? {
            Value::Mapping(mapping) => Ok(mapping),
            Value::Null => Ok(Mapping::new()),
            _ => Err(KnowledgeError::NotAMapping(self.path.clone())),
        }
    }

    fn store(&self, mapping: &Mapping) -> Result<(), KnowledgeError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_yaml::to_string(&Value::Mapping(mapping.clone()))?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }

    fn value_to_string(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => serde_yaml::to_string(other)
                .unwrap_or_default()
                .trim_end()
                .to_string(),
        }
    }
}

impl KnowledgeBase for YamlKnowledgeBase {
    fn get(&self, key: &str) -> Result<Option<String>, KnowledgeError> {
        let mapping = self.load()?;
        Ok(mapping
            .get(Value::String(key.to_string()))
            .map(Self::value_to_string))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KnowledgeError> {
        let mut mapping = self.load()?;
        mapping.insert(
            Value::String(key.to_string()),
            Value::String(value.to_string()),
        );
        self.store(&mapping)
    }

    fn remove(&self, key: &str) -> Result<bool, KnowledgeError> {
        let mut mapping = self.load()?;
        let removed = mapping.remove(Value::String(key.to_string())).is_some();
        if removed {
            self.store(&mapping)?;
        }
        Ok(removed)
    }

    fn entries(&self) -> Result<Vec<(String, String)>, KnowledgeError> {
        let mapping = self.load()?;
        Ok(mapping
            .iter()
            .filter_map(|(k, v)| {
                k.as_str()
                    .map(|key| (key.to_string(), Self::value_to_string(v)))
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "knowledge_tests.rs"]
mod tests;
