use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use umbra_app::wire::AnalyzePayload;
use umbra_app::{
    ActivationTarget, AnalyzerClient, AppController, AppSettings, HttpAnalyzer, Poller,
    RefreshOutcome,
};
use umbra_core::{GraphSnapshot, LayoutDirection, NodeId};
use umbra_events::Event;
use umbra_graph::{
    HighlightState, PathKind, build_tree, classify, dependency_names, edge_styles,
    highlight::promoted_edges, layout_with, resolve_global, visible_rows,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Code map for an analyzer-backed codebase", long_about = None)]
struct Args {
    /// Settings file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Analyzer base URL, overrides the settings file
    #[arg(long, global = true)]
    analyzer: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lay out a snapshot and print the positioned diagram as JSON
    Layout {
        /// Snapshot file; fetched from the analyzer when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Rank top-to-bottom instead of left-to-right
        #[arg(long)]
        vertical: bool,
        /// Emit absolute rectangles instead of parent-local positions
        #[arg(long)]
        global: bool,
    },
    /// Print the file explorer tree and the dependency list
    Tree {
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Expand every folder
        #[arg(long)]
        all: bool,
    },
    /// Show which edges light up when hovering a node
    Highlight {
        #[arg(short, long)]
        input: Option<PathBuf>,
        node: String,
    },
    /// Open a file, graph node or `module:` dependency in the code panel
    Open { target: String },
    /// Poll the analyzer and report snapshot changes until interrupted
    Watch,
}

fn load_settings(args: &Args) -> Result<AppSettings> {
    let mut settings = match &args.config {
        Some(path) => AppSettings::load_from(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => AppSettings::load(),
    };
    if let Some(url) = &args.analyzer {
        settings.analyzer.base_url = url.clone();
    }
    Ok(settings)
}

fn analyzer(settings: &AppSettings) -> Result<HttpAnalyzer> {
    HttpAnalyzer::new(
        settings.analyzer.base_url.clone(),
        settings.analyzer.request_timeout(),
        settings.analyzer.health_timeout(),
    )
    .context("Failed to create analyzer client")
}

/// Accepts both the analyzer's own payload and a plain snapshot.
fn decode_snapshot(text: &str) -> Result<GraphSnapshot> {
    let value: serde_json::Value = serde_json::from_str(text).context("Snapshot is not JSON")?;
    let is_wire = value["nodes"]
        .as_array()
        .and_then(|nodes| nodes.first())
        .is_some_and(|n| n.get("data").is_some() || n.get("parentNode").is_some());

    if is_wire {
        let payload: AnalyzePayload =
            serde_json::from_value(value).context("Malformed analyzer payload")?;
        Ok(payload.into())
    } else {
        serde_json::from_value(value).context("Malformed snapshot")
    }
}

async fn read_snapshot(input: Option<&Path>, settings: &AppSettings) -> Result<GraphSnapshot> {
    match input {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            decode_snapshot(&text)
        }
        None => {
            let client = analyzer(settings)?;
            client
                .fetch_snapshot()
                .await
                .with_context(|| format!("Failed to fetch snapshot from {}", client.base_url()))
        }
    }
}

fn print_tree(snapshot: &GraphSnapshot, all: bool) {
    let nodes = classify(snapshot.nodes.iter().cloned());
    let tree = build_tree(
        nodes
            .iter()
            .filter(|n| n.kind.is_container())
            .map(|n| n.id.as_str()),
    );

    let mut expanded = HashSet::new();
    if all {
        let mut stack: Vec<_> = tree.iter().collect();
        while let Some(node) = stack.pop() {
            if node.is_folder() {
                expanded.insert(node.path.clone());
                stack.extend(node.children());
            }
        }
    }

    for row in visible_rows(&tree, &expanded) {
        let marker = match (row.kind, row.expanded) {
            (PathKind::Folder, true) => "v ",
            (PathKind::Folder, false) => "> ",
            (PathKind::File, _) => "  ",
        };
        println!("{}{}{}", "  ".repeat(row.depth), marker, row.name);
    }

    let deps = dependency_names(
        snapshot.identifiers().chain(
            snapshot
                .edges
                .iter()
                .flat_map(|e| [e.source.as_str(), e.target.as_str()]),
        ),
    );
    if !deps.is_empty() {
        println!();
        println!("Dependencies:");
        for dep in deps {
            println!("  {}", dep);
        }
    }
}

fn open_target(target: &str) -> ActivationTarget {
    if let Some(name) = umbra_core::naming::dependency_name(target) {
        ActivationTarget::Dependency(name.to_string())
    } else if target.contains(umbra_core::MEMBER_SEPARATOR) {
        ActivationTarget::GraphNode(NodeId::from(target))
    } else {
        ActivationTarget::TreeFile(target.to_string())
    }
}

async fn open(settings: &AppSettings, target: &str) -> Result<()> {
    let client = analyzer(settings)?;
    let controller = AppController::new(settings.layout);

    if !controller.check_health(&client).await.backend_online {
        bail!("Analyzer at {} is offline", client.base_url());
    }
    if let RefreshOutcome::Failed(err) = controller.refresh(&client).await {
        tracing::warn!("Continuing without a snapshot: {}", err);
    }

    controller.activate(open_target(target));
    for event in controller.events().drain() {
        controller.follow(&client, &event).await;
    }

    match controller.content() {
        Some(view) => {
            if let Some(focus) = &view.focus {
                eprintln!("{} (focus: {})", view.path, focus);
            } else {
                eprintln!("{}", view.path);
            }
            println!("{}", view.text);
            Ok(())
        }
        None => bail!("Nothing to show for {}", target),
    }
}

async fn watch(settings: &AppSettings) -> Result<()> {
    let client: Arc<dyn AnalyzerClient> = Arc::new(analyzer(settings)?);
    let controller = AppController::new(settings.layout);
    let events = controller.events().receiver();

    std::thread::spawn(move || {
        for event in events {
            match event {
                Event::AnalyzerStatus {
                    backend_online,
                    llm_online,
                } => println!("analyzer online: {backend_online}, assistant online: {llm_online}"),
                Event::SnapshotApplied {
                    generation,
                    node_count,
                    edge_count,
                } => println!("snapshot {generation}: {node_count} nodes, {edge_count} edges"),
                Event::SnapshotUnavailable { reason } => println!("snapshot unavailable: {reason}"),
                _ => {}
            }
        }
    });

    let poller = Poller::new(controller, client, settings.polling.clone());
    poller
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
            }
        })
        .await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so JSON output stays clean.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let args = Args::parse();
    let mut settings = load_settings(&args)?;

    match &args.command {
        Command::Layout {
            input,
            vertical,
            global,
        } => {
            if *vertical {
                settings.layout.direction = LayoutDirection::Vertical;
            }
            let snapshot = read_snapshot(input.as_deref(), &settings).await?;
            let nodes = classify(snapshot.nodes);
            let result = layout_with(&settings.layout, &nodes, &snapshot.edges);
            let json = if *global {
                serde_json::to_string_pretty(&resolve_global(&result))?
            } else {
                serde_json::to_string_pretty(&result)?
            };
            println!("{}", json);
        }
        Command::Tree { input, all } => {
            let snapshot = read_snapshot(input.as_deref(), &settings).await?;
            print_tree(&snapshot, *all);
        }
        Command::Highlight { input, node } => {
            let snapshot = read_snapshot(input.as_deref(), &settings).await?;
            let state = HighlightState::Focused(NodeId::from(node.as_str()));
            let styles = edge_styles(&snapshot.edges, &state);
            for index in promoted_edges(&snapshot.edges, &state) {
                let edge = &snapshot.edges[index];
                println!(
                    "{} -> {} (stroke {}, width {})",
                    edge.source,
                    edge.target,
                    styles[index].stroke.to_hex(),
                    styles[index].width
                );
            }
        }
        Command::Open { target } => open(&settings, target).await?,
        Command::Watch => watch(&settings).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_detects_wire_payload() {
        let wire = r#"{"nodes": [{"id": "a.py::f", "data": {"label": "f"}, "parentNode": "a.py"}], "edges": []}"#;
        let snapshot = decode_snapshot(wire).unwrap();
        assert_eq!(snapshot.nodes[0].parent, Some(NodeId::from("a.py")));
        assert_eq!(snapshot.nodes[0].label, "f");

        let plain = r#"{"nodes": [{"id": "a.py::f", "label": "f", "parent": "a.py"}]}"#;
        let snapshot = decode_snapshot(plain).unwrap();
        assert_eq!(snapshot.nodes[0].parent, Some(NodeId::from("a.py")));
        assert!(snapshot.edges.is_empty());
    }

    #[test]
    fn test_open_target_routing() {
        assert_eq!(
            open_target("module:numpy"),
            ActivationTarget::Dependency("numpy".to_string())
        );
        assert_eq!(
            open_target("src/a.py::run"),
            ActivationTarget::GraphNode(NodeId::from("src/a.py::run"))
        );
        assert_eq!(
            open_target("src/a.py"),
            ActivationTarget::TreeFile("src/a.py".to_string())
        );
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["umbra", "layout", "--input", "snap.json", "--global"]);
        match args.command {
            Command::Layout { input, global, vertical } => {
                assert_eq!(input, Some(PathBuf::from("snap.json")));
                assert!(global);
                assert!(!vertical);
            }
            other => panic!("Expected layout command, got {:?}", other),
        }
    }
}
