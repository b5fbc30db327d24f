use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use anyhow::Result;
use bmssp::Attachment;
use bmssp::INF;
use bmssp::SolverOptions;
use bmssp::TransformOptions;
use bmssp::baseline::dijkstra;
use bmssp::degree_bound::transform_with;
use bmssp::dimacs;
use clap::Parser;
use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AttachmentArg {
    Distributed,
    FirstVirtual,
}

impl From<AttachmentArg> for Attachment {
    fn from(arg: AttachmentArg) -> Self {
        match arg {
            AttachmentArg::Distributed => Attachment::Distributed,
            AttachmentArg::FirstVirtual => Attachment::FirstVirtual,
        }
    }
}

#[derive(Parser)]
#[command(name = "bmssp")]
#[command(about = "Single-source shortest paths on DIMACS road networks", long_about = None)]
struct Cli {
    /// Arc list (`.gr`)
    #[arg(long)]
    graph: PathBuf,
    /// Coordinates (`.co`)
    #[arg(long)]
    coords: Option<PathBuf>,
    /// Source node id
    #[arg(long, default_value_t = 1)]
    source: usize,
    /// Node to print a route for; defaults to the middle node
    #[arg(long)]
    target: Option<usize>,
    /// Solve without the repair pass and compare every distance against plain Dijkstra
    #[arg(long)]
    check: bool,
    /// How cross edges enter a node's cycle
    #[arg(long, value_enum, default_value_t = AttachmentArg::Distributed)]
    attachment: AttachmentArg,
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let start = Instant::now();
    let graph = dimacs::load(&cli.graph, cli.coords.as_deref())
        .with_context(|| format!("loading {}", cli.graph.display()))?;
    println!(
        "Loaded {} nodes, {} edges in {:.2}s",
        graph.node_count(),
        graph.edge_count(),
        start.elapsed().as_secs_f64()
    );

    let transform_start = Instant::now();
    let bounded = transform_with(
        &graph,
        TransformOptions {
            attachment: cli.attachment.into(),
        },
    );
    println!(
        "Degree-bound transform ({:?}): {} virtual nodes, {} edges in {:.2}s",
        bounded.attachment(),
        bounded.graph().node_count(),
        bounded.graph().edge_count(),
        transform_start.elapsed().as_secs_f64()
    );

    let options = SolverOptions {
        audit: !cli.check,
        ..SolverOptions::default()
    };
    let solve_start = Instant::now();
    let routes = bounded
        .solve_with(cli.source, &options)
        .with_context(|| format!("solving from node {}", cli.source))?;
    let solve_ms = solve_start.elapsed().as_secs_f64() * 1e3;
    let paths = routes.virtual_paths();
    let params = paths.params();
    let stats = paths.stats();
    println!(
        "BMSSP: {:.2} ms (k={}, t={}, levels={}; {} calls, {} base cases, {} pulls, {} stall breaks, {} repaired)",
        solve_ms,
        params.k,
        params.t,
        params.max_level,
        stats.recursive_calls,
        stats.base_cases,
        stats.pulls,
        stats.stall_breaks,
        stats.repaired
    );
    let source = routes.source();

    let target = cli.target.unwrap_or(graph.node_count().div_ceil(2));
    let route = routes
        .route(target)
        .with_context(|| format!("routing to node {target}"))?;
    if route.distance >= INF {
        println!("Node {target} is unreachable from {source}");
    } else {
        println!("Distance {source} -> {target}: {}", route.distance);
        println!("Route has {} nodes", route.nodes.len());
        if route.truncated {
            println!("Route is partial: parent walk was cut off");
        }
        if let (Some(from), Some(to)) = (graph.coordinate(source), graph.coordinate(target)) {
            println!(
                "From ({:.6}, {:.6}) to ({:.6}, {:.6})",
                from.lat, from.lon, to.lat, to.lon
            );
        }
    }

    if cli.check {
        let dijkstra_start = Instant::now();
        let expected = dijkstra(&graph, source);
        let dijkstra_ms = dijkstra_start.elapsed().as_secs_f64() * 1e3;
        println!("Dijkstra: {dijkstra_ms:.2} ms");

        let got = routes.distances();
        let mismatches: Vec<usize> = graph.nodes().filter(|&v| got[v] != expected[v]).collect();
        for &v in mismatches.iter().take(5) {
            tracing::error!(node = v, bmssp = got[v], dijkstra = expected[v], "distance mismatch");
        }
        if !mismatches.is_empty() {
            anyhow::bail!("{} nodes disagree with Dijkstra", mismatches.len());
        }
        println!("All {} distances match Dijkstra", graph.node_count());
    }

    Ok(())
}
