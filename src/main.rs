use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use tracing::info;
use tracing_subscriber::EnvFilter;

use admin_grid::infra::import::csv::import_csv_to_sqlite;
use admin_grid::infra::sqlite::filter::SqliteFilterCriteria;
use admin_grid::infra::sqlite::preferences::SqlitePreferenceStore;
use admin_grid::infra::sqlite::queries::{delete_rows, ROW_ID_KEY};
use admin_grid::{
    load_config, Action, ActionRegistry, BatchPlan, BatchRun, Column, ColumnRegistry,
    EntrySource, FailurePolicy, GridConfig, GridController, GridOutcome, GridRegistry, GridView,
    QueryParams, RowId,
};

const DEFAULT_GRID_ID: &str = "data";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "admin-grid",
    version,
    about = "Drive a data grid over an imported CSV dataset",
    long_about = "Runs one grid request against a SQLite-backed dataset and, when the request\nselects every filtered row, plays the client side of the batch protocol.\n\nExamples:\n  admin-grid --csv people.csv\n  admin-grid --dataset 3 --query 'data_sort=name&data_dir=desc'\n  admin-grid --dataset 3 --query 'data_action=delete&data_select_all=1'"
)]
struct CliArgs {
    #[arg(long, value_name = "FILE", help = "Import this CSV as a new dataset.")]
    csv: Option<PathBuf>,

    #[arg(long, value_name = "ID", conflicts_with = "csv", help = "Use an imported dataset.")]
    dataset: Option<i64>,

    #[arg(long, value_name = "FILE", help = "SQLite file (defaults to the user data dir).")]
    db: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Grid config (YAML).")]
    config: Option<PathBuf>,

    #[arg(short, long, default_value = "", help = "Request parameters, e.g. 'data_page=2'.")]
    query: String,

    #[arg(short, long, help = "Only rows containing this text.")]
    search: Option<String>,

    #[arg(long, value_name = "N", help = "Stop the batch loop after N chunks.")]
    cancel_after: Option<usize>,

    #[arg(long, help = "Keep sending chunks after one fails.")]
    keep_going: bool,

    #[arg(long, help = "Address chunks by their first row ID instead of listing every ID.")]
    window_chunks: bool,
}

fn default_db_path() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("com", "hellhbbd", "admin-grid")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))?;
    Ok(project_dirs.data_local_dir().join("grid.sqlite"))
}

fn grid_config(path: Option<&Path>) -> Result<GridConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => GridConfig::new(DEFAULT_GRID_ID),
    };
    if config.primary_key_name.is_none() {
        config.primary_key_name = Some(ROW_ID_KEY.to_string());
    }
    Ok(config)
}

fn actions(db_path: &Path, dataset_id: i64) -> Result<ActionRegistry> {
    let delete_db = db_path.to_path_buf();
    let mut registry = ActionRegistry::new();
    registry
        .register(
            Action::new("export", "Export")
                .select_all()
                .on_execute(|ids: &[RowId]| {
                    for id in ids {
                        println!("export {id}");
                    }
                    Ok(())
                }),
        )?
        .register(
            Action::new("delete", "Delete")
                .confirm("Delete the selected rows?")
                .select_all()
                .on_execute(move |ids: &[RowId]| {
                    let row_ids = ids
                        .iter()
                        .map(|id| id.as_str().parse::<i64>())
                        .collect::<Result<Vec<_>, _>>()
                        .context("row ids must be numeric")?;
                    let removed = delete_rows(&delete_db, dataset_id, &row_ids)?;
                    info!(removed, "deleted rows");
                    Ok(())
                }),
        )?
        .register(Action::separator())?
        .register(Action::new("highlight", "Highlight").client_script("grid.highlight(ids)"))?;
    Ok(registry)
}

struct GridSetup<'a> {
    db_path: &'a Path,
    dataset_id: i64,
    config: &'a GridConfig,
    search: Option<&'a str>,
}

impl GridSetup<'_> {
    fn build(&self) -> Result<GridController> {
        let mut filter = SqliteFilterCriteria::open(self.db_path, self.dataset_id)?;
        if let Some(term) = self.search {
            filter = filter.search(term);
        }

        let mut columns = ColumnRegistry::new();
        for name in filter.columns() {
            columns.add(Column::new(name.clone(), name.clone()).sortable());
        }
        columns.add(Column::action("ops", ""));

        let mut registry = GridRegistry::new();
        let controller = GridController::new(
            &mut registry,
            self.config.clone(),
            columns,
            actions(self.db_path, self.dataset_id)?,
            EntrySource::Filter(Box::new(filter)),
        )?;
        Ok(controller)
    }
}

fn print_view(view: &GridView) {
    let state = &view.state;
    let headers: Vec<&str> = view
        .columns
        .iter()
        .filter(|c| !c.hidden && !c.is_action)
        .map(|c| c.data_key.as_str())
        .collect();

    println!("{}", headers.join("\t"));
    for entry in &view.entries.entries {
        let cells: Vec<&str> = headers
            .iter()
            .map(|key| entry.value(key).unwrap_or(""))
            .collect();
        println!("{}", cells.join("\t"));
    }
    if view.show_duplicate_header {
        println!("{}", headers.join("\t"));
    }
    println!(
        "page {}/{} ({} rows of {}), sort: {}",
        state.page,
        state.page_count.max(1),
        view.entries.total,
        view.entries.unfiltered_total,
        state
            .sort
            .as_ref()
            .map(|s| format!("{} {}", s.order_key, s.direction.as_str()))
            .unwrap_or_else(|| "none".to_string())
    );
}

fn run_batches(
    setup: &GridSetup<'_>,
    store: &mut SqlitePreferenceStore,
    plan: BatchPlan,
    args: &CliArgs,
) -> Result<()> {
    let grid_id = setup.config.grid_id.clone();
    let action = plan.action_name.clone();
    let steps = plan.step_count();
    let policy = if args.keep_going {
        FailurePolicy::Continue
    } else {
        FailurePolicy::StopOnFailure
    };

    let report = BatchRun::new(plan).policy(policy).drive(
        |chunk| {
            let pairs = if args.window_chunks {
                chunk.window_params(&grid_id, &action)
            } else {
                chunk.request_params(&grid_id, &action)
            };
            let mut controller = setup.build()?;
            controller.handle(&QueryParams::from_pairs(pairs), &mut *store)?;
            println!("[{}/{}] {} rows", chunk.index + 1, steps, chunk.len());
            Ok(())
        },
        |report| {
            args.cancel_after
                .is_some_and(|limit| report.outcomes.len() >= limit)
        },
    );

    for outcome in report.outcomes.iter().filter(|o| !o.succeeded()) {
        eprintln!(
            "chunk {} failed: {}",
            outcome.index + 1,
            outcome.error.as_deref().unwrap_or("")
        );
    }
    println!(
        "{}: {}/{} rows processed{}",
        action,
        report.succeeded_rows(),
        report.total_rows,
        if report.cancelled { " (cancelled)" } else { "" }
    );
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = CliArgs::parse();
    let db_path = match &args.db {
        Some(path) => path.clone(),
        None => default_db_path()?,
    };

    let dataset_id = match (&args.csv, args.dataset) {
        (Some(csv_path), _) => {
            let imported = import_csv_to_sqlite(&db_path, csv_path)?;
            println!(
                "imported dataset #{} ({} rows)",
                imported.dataset_id, imported.row_count
            );
            imported.dataset_id
        }
        (None, Some(dataset_id)) => dataset_id,
        (None, None) => anyhow::bail!("either --csv or --dataset is required"),
    };

    let config = grid_config(args.config.as_deref())?;
    let setup = GridSetup {
        db_path: &db_path,
        dataset_id,
        config: &config,
        search: args.search.as_deref(),
    };
    let mut store = SqlitePreferenceStore::open(&db_path)?;

    let mut controller = setup.build()?;
    let view = controller.handle(&QueryParams::parse(&args.query), &mut store)?;
    print_view(view);

    match view.outcome.clone() {
        GridOutcome::Rendered => {}
        GridOutcome::Executed { action, rows } => println!("{action}: {rows} rows processed"),
        GridOutcome::BatchPlanned(plan) => {
            println!(
                "{}: {} rows in {} batches of {}",
                plan.action_name,
                plan.total(),
                plan.step_count(),
                plan.batch_size
            );
            run_batches(&setup, &mut store, plan, &args)?;
        }
    }

    Ok(())
}
