use std::env;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::config::resolve::{load_settings, resolve_config_path};
use crate::config::{RepoMode, Settings};
use crate::core::PackageId;
use crate::error::{DepvizError, Result};
use crate::graph::builder::{build_graph, manifest_path};
use crate::graph::order::resolve;
use crate::graph::traverse::{traverse, TraversalLimits, Visit};
use crate::graph::viz::{self, DiagramFormat};
use crate::loader::MavenLoader;
use crate::render::{invoke_renderer, write_diagram, DiagramTarget, RenderOutcome};
use crate::util::output;

#[derive(Parser, Debug)]
#[command(name = "depviz")]
#[command(about = "Dependency graph inspector", long_about = None)]
pub struct Cli {
    /// Config file; `DEPVIZ_CONFIG` is consulted when this is absent.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
    #[arg(short, long, global = true)]
    pub quiet: bool,
    #[arg(long, global = true)]
    pub no_color: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the validated configuration.
    Config(ConfigArgs),
    /// List direct dependencies declared in the Maven manifest.
    Deps(DepsArgs),
    /// Print the loaded adjacency lists.
    Graph(GraphArgs),
    /// Breadth-first walk from the configured package.
    Traverse(TraverseArgs),
    /// Dependency-first load order from the configured package.
    Order(OrderArgs),
    /// Write a diagram of the reachable subgraph and render it.
    Diagram(DiagramArgs),
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DepsArgs {
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct GraphArgs {
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct TraverseArgs {
    #[arg(long)]
    pub max_depth: Option<usize>,
    #[arg(long)]
    pub filter: Option<String>,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct OrderArgs {
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DiagramArgs {
    /// Root package; repeat for several diagrams. Defaults to `package_name`.
    #[arg(short = 'p', long = "package")]
    pub packages: Vec<String>,
    #[arg(long, default_value = "mermaid")]
    pub format: String,
    /// Print the diagram text instead of writing files.
    #[arg(long)]
    pub stdout: bool,
    #[arg(long)]
    pub no_render: bool,
}

pub fn run() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    output::configure(cli.quiet, !cli.no_color);

    if let Err(err) = dispatch(cli) {
        output::error(&err.to_string());
        let code = match err {
            DepvizError::Config(_) => 2,
            _ => 1,
        };
        std::process::exit(code);
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn dispatch(cli: Cli) -> Result<()> {
    let settings = load_config(cli.config)?;
    match cli.command {
        Commands::Config(args) => handle_config(args, &settings),
        Commands::Deps(args) => handle_deps(args, &settings),
        Commands::Graph(args) => handle_graph(args, &settings),
        Commands::Traverse(args) => handle_traverse(args, &settings),
        Commands::Order(args) => handle_order(args, &settings),
        Commands::Diagram(args) => handle_diagram(args, &settings),
    }
}

fn load_config(config_path: Option<PathBuf>) -> Result<Settings> {
    let cwd = env::current_dir()?;
    let path = resolve_config_path(&cwd, config_path)?;
    Ok(load_settings(&path)?)
}

fn handle_config(args: ConfigArgs, settings: &Settings) -> Result<()> {
    if args.json {
        println!("{}", to_json(settings)?);
        return Ok(());
    }

    println!("configuration (key: value):");
    for (key, value) in settings.display_pairs() {
        println!("- {}: {}", key, value);
    }
    Ok(())
}

fn handle_deps(args: DepsArgs, settings: &Settings) -> Result<()> {
    if settings.test_repo_mode != RepoMode::Off {
        return Err(DepvizError::Other(anyhow::anyhow!(
            "deps reads a Maven manifest and needs test_repo_mode 'off' (current: '{}')",
            settings.test_repo_mode
        )));
    }
    let path = manifest_path(settings)?;
    let content = std::fs::read_to_string(&path)?;
    let project = MavenLoader::parse_project(&path, &content)?;

    if args.json {
        println!("{}", to_json(&project)?);
        return Ok(());
    }

    output::artifact("using manifest", &path);
    if project.dependencies.is_empty() {
        println!("no direct dependencies found");
        return Ok(());
    }
    println!("direct dependencies (groupId : artifactId : version [scope]):");
    for dep in &project.dependencies {
        println!("- {}", dep);
    }
    Ok(())
}

fn handle_graph(args: GraphArgs, settings: &Settings) -> Result<()> {
    let (graph, source) = build_graph(settings)?;

    if args.json {
        println!("{}", to_json(&graph.edges)?);
        return Ok(());
    }

    if source.path.as_os_str().is_empty() {
        output::info(&format!("{} graph, nothing loaded", source.loader));
    } else {
        output::artifact(&format!("{} graph from", source.loader), &source.path);
    }
    if graph.is_empty() {
        println!("no packages found in {}", source.path.display());
        return Ok(());
    }
    for package in graph.packages() {
        let deps: Vec<&str> = graph
            .neighbors(package.as_str())
            .iter()
            .map(PackageId::as_str)
            .collect();
        println!("{}: {}", package, deps.join(", "));
    }
    Ok(())
}

fn handle_traverse(args: TraverseArgs, settings: &Settings) -> Result<()> {
    let (graph, _) = build_graph(settings)?;
    let limits = TraversalLimits::new(
        Some(args.max_depth.unwrap_or(settings.max_depth)),
        args.filter
            .unwrap_or_else(|| settings.filter_substring.clone()),
    );
    let start = PackageId::new(settings.package_name.as_str());
    let traversal = traverse(&graph, &start, &limits);

    if args.json {
        println!("{}", to_json(&traversal.visits)?);
        return Ok(());
    }

    if traversal.visits.is_empty() {
        println!("no packages found (the filter may have excluded every package)");
        return Ok(());
    }
    println!("packages visited breadth-first (package : depth):");
    for Visit { package, depth } in &traversal.visits {
        println!("- {} : {}", package, depth);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct OrderJson {
    order: Vec<PackageId>,
    cycle: Option<PackageId>,
}

fn handle_order(args: OrderArgs, settings: &Settings) -> Result<()> {
    let (graph, _) = build_graph(settings)?;
    let start = PackageId::new(settings.package_name.as_str());
    let report = match resolve(&graph, &start) {
        Ok(order) => OrderJson { order, cycle: None },
        Err(cycle) => {
            output::warn(&format!(
                "{}; the order below is partial and not a valid load order",
                cycle
            ));
            OrderJson {
                order: cycle.completed,
                cycle: Some(cycle.package),
            }
        }
    };

    if args.json {
        println!("{}", to_json(&report)?);
        return Ok(());
    }

    if report.cycle.is_none() {
        println!("load order (dependencies first):");
    } else {
        println!("completed before the cycle was found:");
    }
    for package in &report.order {
        println!("{}", package);
    }
    Ok(())
}

fn handle_diagram(args: DiagramArgs, settings: &Settings) -> Result<()> {
    let format: DiagramFormat = args
        .format
        .parse()
        .map_err(|err: String| DepvizError::Other(anyhow::anyhow!(err)))?;
    let (graph, _) = build_graph(settings)?;
    let roots: Vec<PackageId> = if args.packages.is_empty() {
        vec![PackageId::new(settings.package_name.as_str())]
    } else {
        args.packages.iter().map(|p| PackageId::new(p.as_str())).collect()
    };
    let renderer = settings
        .renderer
        .clone()
        .unwrap_or_else(|| format.default_renderer().to_string());

    for root in &roots {
        if !graph.contains(root.as_str()) {
            output::info(&format!(
                "package {} has no entry in the graph; its diagram has no edges",
                root
            ));
        }
        let text = viz::render(&graph, root, format);

        if args.stdout {
            println!("{}", text.trim_end());
            continue;
        }

        let suffix = (roots.len() > 1).then(|| root.as_str());
        let target = DiagramTarget::for_image(&settings.output_image, format, suffix);
        write_diagram(&text, &target.text)?;
        output::artifact("diagram", &target.text);
        if args.no_render {
            continue;
        }

        match invoke_renderer(&renderer, &target.text, &target.image, format) {
            RenderOutcome::Rendered(path) => output::artifact("rendered", &path),
            RenderOutcome::Missing(program) => output::warn(&format!(
                "renderer '{}' not found; install it or set 'renderer' to render {}",
                program,
                target.image.display()
            )),
            RenderOutcome::Failed(message) => {
                output::warn(&format!("rendering {} failed: {}", target.image.display(), message))
            }
        }
    }
    Ok(())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|err| DepvizError::Other(anyhow::Error::new(err)))
}
