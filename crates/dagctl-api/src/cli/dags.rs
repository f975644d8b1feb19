//! DAG listing command.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use dagctl_core::repository::dag::DagRegistry;
use dagctl_types::dag::WorkflowDefinition;

use crate::state::AppState;

/// Print every DAG the registry loaded, with its running-run count.
pub async fn list_dags(state: &AppState, json: bool) -> Result<()> {
    let dags = state.registry.list_dags().await?;

    if json {
        let mut rows = Vec::with_capacity(dags.len());
        for dag in &dags {
            let active = state.lookup.active_run_dates(&dag.dag_id).await?;
            rows.push(serde_json::json!({
                "dag_id": dag.dag_id,
                "owner": dag.owner,
                "schedule_interval": dag.schedule_interval,
                "is_paused": dag.is_paused,
                "tasks": dag.task_ids(),
                "active_runs": active.len(),
            }));
        }
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if dags.is_empty() {
        println!(
            "\n  No DAGs found in {}\n",
            style(
                dagctl_infra::filesystem::dags_folder(&state.data_dir, &state.config.dags.folder)
                    .display()
            )
            .dim()
        );
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("DAG").fg(Color::White),
        Cell::new("Owner").fg(Color::White),
        Cell::new("Schedule").fg(Color::White),
        Cell::new("Tasks").fg(Color::White),
        Cell::new("Active Runs").fg(Color::White),
        Cell::new("Status").fg(Color::White),
    ]);

    for dag in &dags {
        let active = state.lookup.active_run_dates(&dag.dag_id).await?;
        table.add_row(vec![
            Cell::new(&dag.dag_id),
            Cell::new(&dag.owner),
            Cell::new(dag.schedule_interval.as_deref().unwrap_or("-")),
            Cell::new(dag.tasks.len()),
            Cell::new(active.len()),
            status_cell(dag),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn status_cell(dag: &WorkflowDefinition) -> Cell {
    if dag.is_paused {
        Cell::new("○ paused").fg(Color::Yellow)
    } else {
        Cell::new("● active").fg(Color::Green)
    }
}
