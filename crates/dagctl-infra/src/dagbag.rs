//! File-backed DAG registry.
//!
//! Loads every definition from the DAG folder into a `DashMap` keyed by
//! `dag_id`. Cloning the registry is cheap; clones share the same map, so a
//! `reload` is seen by every service holding one.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dagctl_core::dagbag::{DagFileError, discover_dags};
use dagctl_core::repository::dag::DagRegistry;
use dagctl_types::dag::WorkflowDefinition;
use dagctl_types::error::RepositoryError;
use dashmap::DashMap;

#[derive(Clone, Default)]
pub struct FileDagRegistry {
    folder: Option<PathBuf>,
    dags: Arc<DashMap<String, WorkflowDefinition>>,
}

impl FileDagRegistry {
    /// Load every definition under `folder`.
    pub fn load(folder: &Path) -> Result<Self, DagFileError> {
        let registry = Self {
            folder: Some(folder.to_path_buf()),
            dags: Arc::new(DashMap::new()),
        };
        registry.reload()?;
        Ok(registry)
    }

    /// A registry over fixed, in-memory definitions.
    pub fn from_definitions(defs: impl IntoIterator<Item = WorkflowDefinition>) -> Self {
        let dags = DashMap::new();
        for def in defs {
            dags.insert(def.dag_id.clone(), def);
        }
        Self {
            folder: None,
            dags: Arc::new(dags),
        }
    }

    /// Re-scan the folder, replacing the current contents.
    ///
    /// When two files declare the same `dag_id` the first path in sorted
    /// order wins. Returns the number of definitions loaded.
    pub fn reload(&self) -> Result<usize, DagFileError> {
        let Some(folder) = &self.folder else {
            return Ok(self.dags.len());
        };

        let mut loaded: HashMap<String, WorkflowDefinition> = HashMap::new();
        for (path, def) in discover_dags(folder)? {
            match loaded.entry(def.dag_id.clone()) {
                Entry::Occupied(existing) => tracing::warn!(
                    dag_id = %def.dag_id,
                    ?path,
                    kept = ?existing.get().fileloc,
                    "duplicate dag_id, ignoring file"
                ),
                Entry::Vacant(slot) => {
                    slot.insert(def);
                }
            }
        }

        // Readers never see an empty registry mid-reload.
        self.dags.retain(|dag_id, _| loaded.contains_key(dag_id));
        for (dag_id, def) in loaded {
            self.dags.insert(dag_id, def);
        }

        tracing::info!(folder = %folder.display(), dags = self.dags.len(), "loaded DAG folder");
        Ok(self.dags.len())
    }

    pub fn len(&self) -> usize {
        self.dags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dags.is_empty()
    }
}

impl DagRegistry for FileDagRegistry {
    async fn get_dag(&self, dag_id: &str) -> Result<Option<WorkflowDefinition>, RepositoryError> {
        Ok(self.dags.get(dag_id).map(|r| r.value().clone()))
    }

    async fn list_dags(&self) -> Result<Vec<WorkflowDefinition>, RepositoryError> {
        let mut dags: Vec<_> = self.dags.iter().map(|r| r.value().clone()).collect();
        dags.sort_by(|a, b| a.dag_id.cmp(&b.dag_id));
        Ok(dags)
    }
}
