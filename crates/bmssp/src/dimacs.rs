//! Reader for the 9th DIMACS challenge road networks.
//!
//! `.gr` files carry `p sp <nodes> <arcs>` followed by `a <from> <to> <weight>`
//! lines. `.co` files carry `v <id> <lon> <lat>` lines with coordinates in
//! millionths of a degree. Lines starting with `c` are comments.

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;

use thiserror::Error;

use crate::graph::Coordinate;
use crate::graph::Graph;
use crate::graph::GraphBuilder;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read graph data")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("arc list has no `p sp` problem line before its first arc")]
    MissingProblemLine,
}

fn parse_field<T: std::str::FromStr>(
    field: Option<&str>,
    line: usize,
    what: &str,
) -> Result<T, LoadError> {
    let raw = field.ok_or_else(|| LoadError::Parse {
        line,
        message: format!("missing {what}"),
    })?;
    raw.parse().map_err(|_| LoadError::Parse {
        line,
        message: format!("invalid {what} `{raw}`"),
    })
}

fn read_arcs<R: BufRead>(gr: R) -> Result<GraphBuilder, LoadError> {
    let mut builder: Option<GraphBuilder> = None;

    for (idx, line) in gr.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("p") => {
                let kind: String = parse_field(fields.next(), line_no, "problem kind")?;
                if kind != "sp" {
                    return Err(LoadError::Parse {
                        line: line_no,
                        message: format!("expected problem kind `sp`, found `{kind}`"),
                    });
                }
                let nodes: usize = parse_field(fields.next(), line_no, "node count")?;
                builder = Some(GraphBuilder::new(nodes));
            }
            Some("a") => {
                let Some(builder) = builder.as_mut() else {
                    return Err(LoadError::MissingProblemLine);
                };
                let from: u32 = parse_field(fields.next(), line_no, "arc tail")?;
                let to: u32 = parse_field(fields.next(), line_no, "arc head")?;
                let weight: u64 = parse_field(fields.next(), line_no, "arc weight")?;
                builder.add_edge(from, to, weight);
            }
            _ => {}
        }
    }

    builder.ok_or(LoadError::MissingProblemLine)
}

fn read_coordinates<R: BufRead>(co: R, builder: &mut GraphBuilder) -> Result<(), LoadError> {
    let mut unknown = 0_usize;
    for (idx, line) in co.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let mut fields = line.split_whitespace();
        if fields.next() != Some("v") {
            continue;
        }
        let id: u32 = parse_field(fields.next(), line_no, "node id")?;
        let lon: i64 = parse_field(fields.next(), line_no, "longitude")?;
        let lat: i64 = parse_field(fields.next(), line_no, "latitude")?;
        let coordinate = Coordinate {
            lat: lat as f64 / 1_000_000.0,
            lon: lon as f64 / 1_000_000.0,
        };
        if !builder.set_coordinate(id, coordinate) {
            unknown += 1;
        }
    }
    if unknown > 0 {
        tracing::debug!(unknown, "coordinates for unknown nodes ignored");
    }
    Ok(())
}

/// Parses a `.gr` arc list.
pub fn read_graph<R: BufRead>(gr: R) -> Result<Graph, LoadError> {
    Ok(read_arcs(gr)?.build())
}

/// Parses a `.gr` arc list and attaches coordinates from a `.co` file.
pub fn read_graph_with_coordinates<R: BufRead, C: BufRead>(
    gr: R,
    co: C,
) -> Result<Graph, LoadError> {
    let mut builder = read_arcs(gr)?;
    read_coordinates(co, &mut builder)?;
    Ok(builder.build())
}

/// Loads a graph from disk, with coordinates when `co_path` is given.
pub fn load(gr_path: &Path, co_path: Option<&Path>) -> Result<Graph, LoadError> {
    let gr = BufReader::new(File::open(gr_path)?);
    let graph = match co_path {
        Some(co_path) => {
            let co = BufReader::new(File::open(co_path)?);
            read_graph_with_coordinates(gr, co)?
        }
        None => read_graph(gr)?,
    };
    tracing::info!(
        path = %gr_path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "loaded graph"
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::LoadError;
    use super::read_graph;
    use super::read_graph_with_coordinates;
    use crate::graph::Coordinate;

    const GR: &str = "\
c tiny network
p sp 4 5
a 1 2 4
a 1 3 1
a 3 2 1
a 2 4 1
a 2 9 7
";

    #[test]
    fn parses_arcs_and_drops_unknown_heads() {
        let g = read_graph(GR.as_bytes()).unwrap();
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.edge_count(), 4);
        assert_eq!(g.edges_vec(), vec![(1, 2, 4), (1, 3, 1), (2, 4, 1), (3, 2, 1)]);
    }

    #[test]
    fn attaches_microdegree_coordinates() {
        let co = "c coords\np aux sp co 4\nv 1 -73500000 40250000\nv 7 0 0\n";
        let g = read_graph_with_coordinates(GR.as_bytes(), co.as_bytes()).unwrap();
        assert_eq!(
            g.coordinate(1),
            Some(Coordinate {
                lat: 40.25,
                lon: -73.5
            })
        );
        assert_eq!(g.coordinate(2), None);
    }

    #[test]
    fn arcs_before_problem_line_are_rejected() {
        let err = read_graph("a 1 2 3\np sp 2 1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingProblemLine));
        let err = read_graph("c nothing here\n".as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingProblemLine));
    }

    #[test]
    fn malformed_weight_reports_its_line() {
        let err = read_graph("p sp 2 1\na 1 2 heavy\n".as_bytes()).unwrap_err();
        match err {
            LoadError::Parse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("heavy"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
