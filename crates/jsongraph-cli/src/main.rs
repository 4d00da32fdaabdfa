use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use jsongraph_core::Graph;
use jsongraph_graph::{
    BuildOutput, EngineSettings, LayoutAlgorithm, LayoutSettings, TreeBuilder, layout_with,
    reconstruct_with_diagnostics,
};
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Engine settings file (JSON). Defaults to the user config directory
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Turn a JSON document into a node/edge graph
    Build {
        /// JSON document, or `-` for stdin
        path: PathBuf,
        /// Layout pass to run on the built graph
        #[arg(short, long, value_enum)]
        layout: Option<LayoutArg>,
        #[arg(long)]
        pretty: bool,
    },
    /// Turn a graph produced by `build` back into a JSON document
    Reconstruct {
        /// Graph file, or `-` for stdin
        path: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
    /// Build and reconstruct a document, failing if the result differs
    Check {
        /// JSON document, or `-` for stdin
        path: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LayoutArg {
    Level,
    Traversal,
    Off,
}

fn read_source(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let source = read_source(path)?;
    serde_json::from_str(&source).with_context(|| format!("{:?} is not valid JSON", path))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", text);
    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<EngineSettings> {
    match path {
        Some(path) => {
            let settings = EngineSettings::load_from(path)?;
            tracing::info!("Settings loaded from {:?}", path);
            Ok(settings)
        }
        None => Ok(EngineSettings::load()),
    }
}

fn run_build(
    settings: &EngineSettings,
    path: &Path,
    layout: Option<LayoutArg>,
    pretty: bool,
) -> Result<()> {
    let doc: Value = read_json(path)?;
    let mut out = TreeBuilder::new(settings.build.clone()).build(&doc);

    let algorithm = match layout {
        Some(LayoutArg::Off) => None,
        Some(LayoutArg::Level) => Some(LayoutAlgorithm::Level),
        Some(LayoutArg::Traversal) => Some(LayoutAlgorithm::Traversal),
        None => Some(settings.layout.algorithm),
    };
    if let Some(algorithm) = algorithm {
        let layout_settings = LayoutSettings {
            algorithm,
            ..settings.layout.clone()
        };
        let layouter = layout_settings.layouter();
        out.nodes = layout_with(layouter.as_ref(), &out.nodes, &out.edges);
    }

    for diagnostic in &out.diagnostics {
        tracing::warn!(
            "{} ({})",
            diagnostic.issue,
            diagnostic.path.as_deref().unwrap_or("-")
        );
    }
    print_json(&out, pretty)
}

fn run_reconstruct(path: &Path, pretty: bool) -> Result<()> {
    let graph: Graph = read_json(path)?;
    let result = reconstruct_with_diagnostics(&graph.nodes, &graph.edges);
    for diagnostic in &result.diagnostics {
        tracing::warn!("{}", diagnostic.issue);
    }
    print_json(&result.value, pretty)
}

fn run_check(settings: &EngineSettings, path: &Path) -> Result<()> {
    let doc: Value = read_json(path)?;
    let out: BuildOutput = TreeBuilder::new(settings.build.clone()).build(&doc);
    let build_issues = out.diagnostics.len();
    let graph = out.into_graph();
    let result = reconstruct_with_diagnostics(&graph.nodes, &graph.edges);

    println!(
        "{} nodes, {} edges, {} build diagnostics, {} reconstruction diagnostics",
        graph.node_count(),
        graph.edge_count(),
        build_issues,
        result.diagnostics.len()
    );

    if result.value != doc {
        bail!("round-trip mismatch for {:?}", path);
    }
    println!("Round-trip OK");
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    let settings = load_settings(args.config.as_deref())?;

    match args.command {
        Command::Build {
            path,
            layout,
            pretty,
        } => run_build(&settings, &path, layout, pretty),
        Command::Reconstruct { path, pretty } => run_reconstruct(&path, pretty),
        Command::Check { path } => run_check(&settings, &path),
    }
}
