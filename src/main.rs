mod settings;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nodeforge_config::{ExecutionType, WorkflowDef};
use nodeforge_orchestrator::{Orchestrator, OrchestratorError, WorkflowExecutionResult};
use nodeforge_processor::{GeminiClient, HttpMediaService, ProcessorRegistry};
use nodeforge_store::{RunMetadata, SqliteStore, Store, node_types};
use nodeforge_workflow::{Workflow, validate_structure};

use crate::settings::{DATABASE_FILE, Settings};

/// Exit code for a graph that cannot run at all (cycle, duplicate ids).
const EXIT_STRUCTURAL: u8 = 2;

/// nodeforge - run node-based content generation workflows
#[derive(Parser)]
#[command(name = "nodeforge")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.nodeforge)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Settings file (default: <data-dir>/settings.json when present)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Execute nodes of a workflow file
  Run {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    /// Node to execute; repeat for several. Defaults to every node.
    #[arg(long = "node")]
    nodes: Vec<String>,

    /// Run label recorded in the result (inferred from the node count when omitted)
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Maximum number of nodes running at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Record the run in the history database
    #[arg(long)]
    record: bool,

    /// Write successful outputs back into the workflow file
    #[arg(long)]
    write_back: bool,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    #[arg(long, env = "NODEFORGE_MEDIA_ENDPOINT")]
    media_endpoint: Option<String>,
  },

  /// Check a workflow file for cycles and connection problems
  Validate {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
  },

  /// List recorded runs
  History {
    /// Only runs started from this saved workflow
    #[arg(long)]
    workflow_id: Option<String>,
  },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
  Full,
  Partial,
  Single,
}

impl From<Mode> for ExecutionType {
  fn from(mode: Mode) -> Self {
    match mode {
      Mode::Full => ExecutionType::Full,
      Mode::Partial => ExecutionType::Partial,
      Mode::Single => ExecutionType::Single,
    }
  }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();

  let cli = Cli::parse();

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".nodeforge"),
  };
  let mut settings = Settings::load(cli.config.as_deref(), &data_dir)?;

  match cli.command {
    Some(Commands::Run {
      workflow_file,
      nodes,
      mode,
      concurrency,
      record,
      write_back,
      gemini_api_key,
      media_endpoint,
    }) => {
      if let Some(concurrency) = concurrency {
        settings.orchestrator.max_concurrency = concurrency;
      }
      if gemini_api_key.is_some() {
        settings.llm.api_key = gemini_api_key;
      }
      if media_endpoint.is_some() {
        settings.media.endpoint = media_endpoint;
      }
      let options = RunOptions {
        nodes,
        mode: mode.map(ExecutionType::from),
        record,
        write_back,
      };
      run_workflow(&workflow_file, options, settings, &data_dir).await
    }
    Some(Commands::Validate { workflow_file }) => validate_workflow(&workflow_file).await,
    Some(Commands::History { workflow_id }) => {
      show_history(&settings, &data_dir, workflow_id.as_deref()).await?;
      Ok(ExitCode::SUCCESS)
    }
    None => {
      println!("nodeforge - use --help to see available commands");
      Ok(ExitCode::SUCCESS)
    }
  }
}

struct RunOptions {
  nodes: Vec<String>,
  mode: Option<ExecutionType>,
  record: bool,
  write_back: bool,
}

async fn load_workflow_def(workflow_file: &Path) -> Result<WorkflowDef> {
  let content = tokio::fs::read_to_string(workflow_file)
    .await
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;

  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))
}

/// Pick a run label from how much of the graph is requested.
fn infer_mode(requested: usize, total: usize) -> ExecutionType {
  if requested == 1 && total != 1 {
    ExecutionType::Single
  } else if requested >= total {
    ExecutionType::Full
  } else {
    ExecutionType::Partial
  }
}

async fn run_workflow(
  workflow_file: &Path,
  options: RunOptions,
  settings: Settings,
  data_dir: &Path,
) -> Result<ExitCode> {
  let mut def = load_workflow_def(workflow_file).await?;
  let targets = if options.nodes.is_empty() {
    def.node_ids()
  } else {
    options.nodes
  };
  let mode = options
    .mode
    .unwrap_or_else(|| infer_mode(targets.len(), def.nodes.len()));

  let registry = ProcessorRegistry::builtin(
    Arc::new(GeminiClient::new(settings.llm.clone())),
    Arc::new(HttpMediaService::new(settings.media.clone())),
  );
  let orchestrator = Orchestrator::new(registry, settings.orchestrator.clone());

  let cancel = CancellationToken::new();
  let ctrl_c = {
    let cancel = cancel.clone();
    tokio::spawn(async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        warn!("interrupt received, cancelling run");
        cancel.cancel();
      }
    })
  };

  let outcome = orchestrator
    .execute_with_cancel(&def.nodes, &def.edges, &targets, mode, cancel)
    .await;
  ctrl_c.abort();

  let result = match outcome {
    Ok(result) => result,
    Err(e) => return Ok(report_structural_error(&e)),
  };

  println!("{}", serde_json::to_string_pretty(&result)?);

  if options.record {
    record_run(&settings, data_dir, &def, &result).await?;
  }

  if options.write_back {
    result.apply_outputs(&mut def.nodes);
    let content = serde_json::to_string_pretty(&def)?;
    tokio::fs::write(workflow_file, content)
      .await
      .with_context(|| format!("failed to write workflow file: {}", workflow_file.display()))?;
    info!(path = %workflow_file.display(), "outputs_written");
  }

  Ok(ExitCode::SUCCESS)
}

fn report_structural_error(error: &OrchestratorError) -> ExitCode {
  if error.is_cycle() {
    eprintln!("error: cannot run workflow, {error}");
  } else {
    eprintln!("error: invalid workflow: {error}");
  }
  ExitCode::from(EXIT_STRUCTURAL)
}

async fn open_store(data_dir: &Path) -> Result<SqliteStore> {
  tokio::fs::create_dir_all(data_dir)
    .await
    .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;
  let path = data_dir.join(DATABASE_FILE);
  SqliteStore::open(&path)
    .await
    .with_context(|| format!("failed to open history database: {}", path.display()))
}

async fn record_run(
  settings: &Settings,
  data_dir: &Path,
  def: &WorkflowDef,
  result: &WorkflowExecutionResult,
) -> Result<()> {
  let store = open_store(data_dir).await?;
  let meta = RunMetadata {
    user_id: settings.user_id.clone(),
    workflow_id: def.id.clone(),
  };
  let run = store
    .record_run(&meta, result, &node_types(&def.nodes))
    .await
    .context("failed to record run")?;
  info!(run_id = %run.id, "run_recorded");
  Ok(())
}

async fn validate_workflow(workflow_file: &Path) -> Result<ExitCode> {
  let def = load_workflow_def(workflow_file).await?;
  let workflow = match Workflow::from_def(def) {
    Ok(workflow) => workflow,
    Err(e) => return Ok(report_structural_error(&OrchestratorError::from(e))),
  };

  let all: Vec<String> = workflow.nodes().iter().map(|n| n.id.clone()).collect();
  if let Err(e) = workflow.graph().topological_order(&all) {
    return Ok(report_structural_error(&OrchestratorError::from(e)));
  }

  let issues = validate_structure(&workflow);
  for issue in &issues {
    println!("warning: {issue}");
  }
  println!(
    "{} nodes, {} edges, {} warnings",
    workflow.nodes().len(),
    workflow.edges().len(),
    issues.len()
  );
  Ok(ExitCode::SUCCESS)
}

async fn show_history(settings: &Settings, data_dir: &Path, workflow_id: Option<&str>) -> Result<()> {
  let store = open_store(data_dir).await?;
  let runs = store
    .list_runs(&settings.user_id, workflow_id)
    .await
    .context("failed to list runs")?;

  if runs.is_empty() {
    println!("no recorded runs");
    return Ok(());
  }

  for run in runs {
    println!(
      "{}  {}  {:<7}  {:<7}  {:>6}ms  {} nodes",
      run.id,
      run.created_at.format("%Y-%m-%d %H:%M:%S"),
      run.execution_type,
      run.status,
      run.duration,
      run.node_ids.0.len()
    );
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_infer_mode() {
    assert_eq!(infer_mode(3, 3), ExecutionType::Full);
    assert_eq!(infer_mode(1, 3), ExecutionType::Single);
    assert_eq!(infer_mode(1, 1), ExecutionType::Full);
    assert_eq!(infer_mode(2, 3), ExecutionType::Partial);
  }

  #[test]
  fn test_cli_parses_run_flags() {
    let cli = Cli::try_parse_from([
      "nodeforge",
      "run",
      "wf.json",
      "--node",
      "a",
      "--node",
      "b",
      "--mode",
      "partial",
      "--concurrency",
      "4",
      "--record",
    ])
    .unwrap();

    match cli.command {
      Some(Commands::Run {
        nodes,
        mode,
        concurrency,
        record,
        write_back,
        ..
      }) => {
        assert_eq!(nodes, vec!["a".to_string(), "b".to_string()]);
        assert!(matches!(mode, Some(Mode::Partial)));
        assert_eq!(concurrency, Some(4));
        assert!(record);
        assert!(!write_back);
      }
      _ => panic!("expected run command"),
    }
  }
}
