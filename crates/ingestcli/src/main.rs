use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use ingestclient::{
    ApiClient, ClientError, ExecutionTracker, TrackerEvent, TrackerState, WorkflowSession,
};
use ingestcore::{FormDraft, GraphModel, GraphSnapshot, InputKind, NodeTypeRegistry, Position};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ingest")]
#[command(about = "Document-ingestion workflow builder CLI", long_about = None)]
struct Cli {
    /// Backend base URL
    #[arg(long, global = true, default_value_t = default_server())]
    server: String,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

fn default_server() -> String {
    std::env::var("INGESTFLOW_SERVER").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

#[derive(Subcommand)]
enum Commands {
    /// Create an example ingestion pipeline graph
    Init {
        /// Output file path
        #[arg(short, long, default_value = "pipeline.json")]
        output: PathBuf,
    },

    /// Validate a pipeline graph file
    Validate {
        /// Path to graph JSON file
        file: PathBuf,
    },

    /// List available node types and their fields
    Nodes,

    /// Upload a document to the backend
    Upload {
        /// Path to the document
        file: PathBuf,
    },

    /// Save a pipeline graph as a workflow
    Save {
        /// Path to graph JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Workflow name
        #[arg(short, long)]
        name: String,

        /// Workflow description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Execute a workflow and watch progress until it finishes
    Run {
        /// Id of a previously saved workflow
        #[arg(short, long, conflicts_with = "file")]
        workflow: Option<String>,

        /// Graph file to save and execute in one step
        #[arg(short, long, requires = "name")]
        file: Option<PathBuf>,

        /// Workflow name when saving from a file
        #[arg(short, long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Commands::Init { output } => create_example_graph(output),
        Commands::Validate { file } => validate_graph(file),
        Commands::Nodes => {
            list_nodes();
            Ok(())
        }
        Commands::Upload { file } => upload_document(&cli.server, file).await,
        Commands::Save {
            file,
            name,
            description,
        } => {
            save_workflow(&cli.server, file, &name, &description).await?;
            Ok(())
        }
        Commands::Run {
            workflow,
            file,
            name,
        } => run_workflow(&cli.server, workflow, file, name).await,
    }
}

fn load_graph(file: &PathBuf) -> Result<GraphModel> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let snapshot: GraphSnapshot = serde_json::from_str(&json)?;
    GraphModel::from_snapshot(snapshot).map_err(|e| anyhow!("invalid graph: {e}"))
}

fn create_example_graph(output: PathBuf) -> Result<()> {
    let mut graph = GraphModel::new();

    let source = graph.add_node("data-source", Position::new(100.0, 100.0));
    let chunking = graph.add_node("chunking", Position::new(300.0, 100.0));
    let embedding = graph.add_node("embedding", Position::new(500.0, 100.0));
    let connector = graph.add_node("connector", Position::new(700.0, 100.0));

    for (from, to) in [
        (&source, &chunking),
        (&chunking, &embedding),
        (&embedding, &connector),
    ] {
        graph
            .add_edge(from, to)
            .map_err(|e| anyhow!("failed to wire example pipeline: {e}"))?;
    }

    let json = serde_json::to_string_pretty(&graph.snapshot())?;
    std::fs::write(&output, json)?;

    println!("✨ Created example pipeline: {}", output.display());
    println!();
    println!("Save and run it with:");
    println!("  ingest save --file {} --name my-pipeline", output.display());
    println!("  ingest run --workflow <id>");

    Ok(())
}

fn validate_graph(file: PathBuf) -> Result<()> {
    println!("🔍 Validating graph: {}", file.display());

    let graph = load_graph(&file)?;
    graph
        .validate()
        .map_err(|e| anyhow!("invalid graph: {e}"))?;

    println!("✅ Graph is valid:");
    println!("   Nodes: {}", graph.nodes().len());
    println!("   Edges: {}", graph.edges().len());

    Ok(())
}

fn list_nodes() {
    let registry = NodeTypeRegistry::builtin();

    println!("📦 Available node types:");
    println!();

    for def in registry.kinds() {
        println!("  • {} — {} ({})", def.kind, def.label, def.category);
        let draft = FormDraft::new(def, &Default::default());
        for field in draft.visible_fields() {
            let default = field
                .default
                .as_ref()
                .map(|v| format!(" [default: {v}]"))
                .unwrap_or_default();
            let widget = match &field.input {
                InputKind::Text => "text".to_string(),
                InputKind::Secret => "secret".to_string(),
                InputKind::MultilineText => "multiline".to_string(),
                InputKind::Boolean => "boolean".to_string(),
                InputKind::Number { min, max, .. } => format!("number {min}..{max}"),
                InputKind::Select { options } => format!("select {}", options.join("|")),
            };
            println!("      {}: {}{}", field.name, widget, default);
        }
    }
}

async fn upload_document(server: &str, file: PathBuf) -> Result<()> {
    let api = ApiClient::new(server)?;
    let bytes = std::fs::read(&file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("bad file name"))?;

    let uploaded = api.upload(filename, bytes).await?;

    println!("📤 Uploaded {}:", uploaded.filename);
    println!("   file_id: {}", uploaded.file_id);
    println!("   file_path: {}", uploaded.file_path);
    println!("   file_type: {}", uploaded.file_type);
    println!();
    println!("Attach it to a data-source node's config before saving.");

    Ok(())
}

async fn save_workflow(
    server: &str,
    file: PathBuf,
    name: &str,
    description: &str,
) -> Result<String> {
    let graph = load_graph(&file)?;
    graph
        .validate()
        .map_err(|e| anyhow!("refusing to save an invalid graph: {e}"))?;

    let api = Arc::new(ApiClient::new(server)?);
    let mut session = WorkflowSession::new(api);
    let saved = session.save(name, description, graph.snapshot()).await?;

    println!("💾 Saved workflow \"{}\" as {}", saved.name, saved.id);
    Ok(saved.id.clone())
}

async fn run_workflow(
    server: &str,
    workflow: Option<String>,
    file: Option<PathBuf>,
    name: Option<String>,
) -> Result<()> {
    let workflow_id = match (workflow, file, name) {
        (Some(id), _, _) => id,
        (None, Some(file), Some(name)) => save_workflow(server, file, &name, "").await?,
        _ => {
            return Err(anyhow!(
                "pass --workflow <id>, or --file and --name to save first"
            ))
        }
    };

    let api = Arc::new(ApiClient::new(server)?);
    let tracker = ExecutionTracker::new(api);
    let mut events = tracker.subscribe();

    let mut handle = tracker.start(Some(&workflow_id)).await?;
    println!("🚀 Execution {} started", handle.execution_id);

    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                TrackerEvent::Progress { progress, .. } => {
                    println!("  📊 {progress}%");
                }
                TrackerEvent::PollAborted { error, .. } => {
                    println!("  ⚠️  Lost track of execution: {error}");
                }
                _ => {}
            }
        }
    });

    let terminal = handle.wait().await;
    printer.abort();

    match terminal {
        TrackerState::Completed { results, .. } => {
            println!("✨ Execution completed");
            if let Some(results) = results {
                println!("{}", serde_json::to_string_pretty(&results)?);
            }
            Ok(())
        }
        TrackerState::Failed { error_message, .. } => {
            Err(ClientError::ExecutionFailed(error_message).into())
        }
        TrackerState::PollFailed { error, .. } => Err(anyhow!(
            "lost track of the execution (it may still be running): {error}"
        )),
        other => Err(anyhow!("unexpected tracker state: {other:?}")),
    }
}
