//! DAG file parsing, validation, and discovery.
//!
//! Definitions live as YAML files in the DAG folder. Each file holds one
//! `WorkflowDefinition`; its steps must form an acyclic graph over known ids.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use dagctl_types::dag::WorkflowDefinition;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use thiserror::Error;

/// Errors raised while loading a DAG file.
#[derive(Debug, Error)]
pub enum DagFileError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unknown dependency: {0}")]
    UnknownDependency(String),

    #[error("cycle detected: {0}")]
    CycleDetected(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse and validate one YAML definition.
///
/// Step back-references (`dag_id`, default owner, downstream lists) are
/// filled in before the value is returned.
pub fn parse_dag_yaml(yaml: &str) -> Result<WorkflowDefinition, DagFileError> {
    let mut def: WorkflowDefinition =
        serde_yaml_ng::from_str(yaml).map_err(|e| DagFileError::Parse(e.to_string()))?;
    validate_definition(&def)?;
    def.link_tasks();
    Ok(def)
}

/// Structural checks: non-empty id, unique step ids, known upstream ids, no cycles.
pub fn validate_definition(def: &WorkflowDefinition) -> Result<(), DagFileError> {
    if def.dag_id.trim().is_empty() {
        return Err(DagFileError::Validation(
            "dag_id must not be empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for task in &def.tasks {
        if task.task_id.trim().is_empty() {
            return Err(DagFileError::Validation(format!(
                "dag '{}' has a task with an empty task_id",
                def.dag_id
            )));
        }
        if !seen.insert(task.task_id.as_str()) {
            return Err(DagFileError::Validation(format!(
                "duplicate task id '{}' in dag '{}'",
                task.task_id, def.dag_id
            )));
        }
    }

    let mut graph = DiGraph::<&str, ()>::new();
    let index: HashMap<&str, _> = def
        .tasks
        .iter()
        .map(|t| (t.task_id.as_str(), graph.add_node(t.task_id.as_str())))
        .collect();

    for task in &def.tasks {
        let to = index[task.task_id.as_str()];
        for up in &task.upstream {
            let from = index.get(up.as_str()).ok_or_else(|| {
                DagFileError::UnknownDependency(format!(
                    "task '{}' depends on unknown task '{}'",
                    task.task_id, up
                ))
            })?;
            graph.add_edge(*from, to, ());
        }
    }

    toposort(&graph, None).map_err(|cycle| {
        DagFileError::CycleDetected(format!(
            "cycle involving task '{}' in dag '{}'",
            graph[cycle.node_id()],
            def.dag_id
        ))
    })?;

    Ok(())
}

/// Load one definition from disk, remembering where it came from.
pub fn load_dag_file(path: &Path) -> Result<WorkflowDefinition, DagFileError> {
    let content = std::fs::read_to_string(path)?;
    let mut def = parse_dag_yaml(&content)?;
    def.fileloc = Some(path.to_path_buf());
    Ok(def)
}

/// Find every `.yaml`/`.yml` definition under `folder`, recursively.
///
/// Files that fail to load are logged and skipped. A missing folder yields
/// an empty list.
pub fn discover_dags(folder: &Path) -> Result<Vec<(PathBuf, WorkflowDefinition)>, DagFileError> {
    let mut results = Vec::new();
    if !folder.exists() {
        return Ok(results);
    }
    discover_recursive(folder, &mut results)?;
    results.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(results)
}

fn discover_recursive(
    dir: &Path,
    results: &mut Vec<(PathBuf, WorkflowDefinition)>,
) -> Result<(), DagFileError> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        // Symlinked directories are not followed.
        if entry.file_type()?.is_dir() {
            discover_recursive(&path, results)?;
        } else if path
            .extension()
            .is_some_and(|ext| ext == "yaml" || ext == "yml")
        {
            match load_dag_file(&path) {
                Ok(def) => results.push((path, def)),
                Err(e) => tracing::warn!(?path, error = %e, "skipping invalid DAG file"),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ETL: &str = r#"
dag_id: etl_daily
owner: data
schedule_interval: "@daily"
tasks:
  - task_id: extract
    operator: bash
  - task_id: transform
    operator: python
    upstream: [extract]
  - task_id: load
    operator: sql
    owner: dba
    upstream: [transform]
"#;

    #[test]
    fn test_parse_links_tasks() {
        let def = parse_dag_yaml(ETL).unwrap();
        assert_eq!(def.dag_id, "etl_daily");
        assert_eq!(def.task_ids(), vec!["extract", "transform", "load"]);

        let extract = def.task("extract").unwrap();
        assert_eq!(extract.dag_id, "etl_daily");
        assert_eq!(extract.owner.as_deref(), Some("data"));
        assert_eq!(extract.downstream, vec!["transform"]);
        assert_eq!(def.task("load").unwrap().owner.as_deref(), Some("dba"));
    }

    #[test]
    fn test_parse_rejects_bad_yaml() {
        assert!(matches!(
            parse_dag_yaml("dag_id: [unclosed"),
            Err(DagFileError::Parse(_))
        ));
    }

    #[test]
    fn test_duplicate_task_ids() {
        let yaml = r#"
dag_id: dup
tasks:
  - task_id: a
    operator: bash
  - task_id: a
    operator: bash
"#;
        assert!(matches!(
            parse_dag_yaml(yaml),
            Err(DagFileError::Validation(msg)) if msg.contains("duplicate task id 'a'")
        ));
    }

    #[test]
    fn test_unknown_upstream() {
        let yaml = r#"
dag_id: broken
tasks:
  - task_id: a
    operator: bash
    upstream: [ghost]
"#;
        assert!(matches!(
            parse_dag_yaml(yaml),
            Err(DagFileError::UnknownDependency(_))
        ));
    }

    #[test]
    fn test_cycle_detected() {
        let yaml = r#"
dag_id: loop
tasks:
  - task_id: a
    operator: bash
    upstream: [b]
  - task_id: b
    operator: bash
    upstream: [a]
"#;
        assert!(matches!(
            parse_dag_yaml(yaml),
            Err(DagFileError::CycleDetected(_))
        ));
    }

    #[test]
    fn test_empty_dag_id() {
        let yaml = "dag_id: ''\ntasks: []\n";
        assert!(matches!(
            parse_dag_yaml(yaml),
            Err(DagFileError::Validation(_))
        ));
    }

    #[test]
    fn test_discover_skips_invalid_files() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(dir.join("etl.yaml"), ETL).unwrap();
        std::fs::write(
            dir.join("nested/hello.yml"),
            "dag_id: hello\ntasks:\n  - task_id: say\n    operator: bash\n",
        )
        .unwrap();
        std::fs::write(dir.join("broken.yaml"), "dag_id: [").unwrap();
        std::fs::write(dir.join("notes.txt"), "not a dag").unwrap();

        let found = discover_dags(dir).unwrap();
        let mut ids: Vec<_> = found.iter().map(|(_, d)| d.dag_id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["etl_daily", "hello"]);
        for (path, def) in &found {
            assert_eq!(def.fileloc.as_deref(), Some(path.as_path()));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_ignores_directory_symlink_loop() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        std::fs::write(dir.join("etl.yaml"), ETL).unwrap();
        std::os::unix::fs::symlink(dir, dir.join("loop")).unwrap();

        let found = discover_dags(dir).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1.dag_id, "etl_daily");
    }

    #[test]
    fn test_discover_missing_folder() {
        let found = discover_dags(Path::new("/nonexistent/dagctl/dags")).unwrap();
        assert!(found.is_empty());
    }
}
