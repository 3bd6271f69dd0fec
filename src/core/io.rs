/*!
# Input/Output (I/O) Routines

This module reads and writes graphs in the METIS adjacency format and clusterings
in the one-id-per-line partition format.

A METIS file starts with a header line `n m [fmt]` where `n` is the number of
nodes, `m` the number of undirected edges, and the optional `fmt` code declares
weights: `0` none, `1` edge weights, `10` node weights, `11` both. Each of the
following `n` lines lists the (1-indexed) neighbors of a node, each neighbor
optionally followed by its edge weight. Lines starting with `%` are comments.

A partition file contains one cluster id per line; node `i` is on line `i`.
*/

use crate::core::error::{EvoclusError, Result};
use crate::core::graph::{Clustering, CsrGraph};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Reads a graph in METIS adjacency format.
pub fn read_metis_graph<P: AsRef<Path>>(path: P) -> Result<CsrGraph> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    let mut lines = reader
        .lines()
        .collect::<std::io::Result<Vec<String>>>()?
        .into_iter()
        .filter(|l| !l.trim_start().starts_with('%'));

    let header = lines
        .next()
        .ok_or_else(|| EvoclusError::bad_graph("missing METIS header line"))?;
    let fields: Vec<&str> = header.split_whitespace().collect();
    if fields.len() < 2 {
        return Err(EvoclusError::bad_graph("METIS header must be 'n m [fmt]'"));
    }
    let n: usize = parse_token(fields[0], "node count")?;
    let m: usize = parse_token(fields[1], "edge count")?;
    let fmt = if fields.len() > 2 { fields[2] } else { "0" };
    let has_node_weights = fmt == "10" || fmt == "11";
    let has_edge_weights = fmt == "1" || fmt == "11";

    let mut xadj = Vec::with_capacity(n + 1);
    let mut adjncy = Vec::with_capacity(2 * m);
    let mut edge_weights = Vec::with_capacity(2 * m);
    let mut node_weights = Vec::with_capacity(n);
    xadj.push(0);

    for node in 0..n {
        let line = lines.next().unwrap_or_default();
        let mut tokens = line.split_whitespace();

        if has_node_weights {
            let weight = tokens
                .next()
                .ok_or_else(|| {
                    EvoclusError::bad_graph(format!("node {} is missing its weight", node))
                })
                .and_then(|t| parse_token(t, "node weight"))?;
            node_weights.push(weight);
        }

        while let Some(token) = tokens.next() {
            let neighbor: usize = parse_token(token, "neighbor id")?;
            if neighbor == 0 || neighbor > n {
                return Err(EvoclusError::bad_graph(format!(
                    "node {} lists neighbor {} outside [1, {}]",
                    node, neighbor, n
                )));
            }
            adjncy.push(neighbor - 1);
            if has_edge_weights {
                let weight = tokens
                    .next()
                    .ok_or_else(|| {
                        EvoclusError::bad_graph(format!(
                            "node {} has a neighbor without an edge weight",
                            node
                        ))
                    })
                    .and_then(|t| parse_token(t, "edge weight"))?;
                edge_weights.push(weight);
            }
        }
        xadj.push(adjncy.len());
    }

    if adjncy.len() != 2 * m {
        return Err(EvoclusError::bad_graph(format!(
            "header declares {} edges but {} directed slots were read",
            m,
            adjncy.len()
        )));
    }

    debug!(n, m, "read METIS graph");
    CsrGraph::from_csr(
        xadj,
        adjncy,
        if has_node_weights { Some(node_weights) } else { None },
        if has_edge_weights { Some(edge_weights) } else { None },
    )
}

/// Writes a graph in METIS adjacency format, with edge weights.
pub fn write_metis_graph<P: AsRef<Path>>(path: P, graph: &CsrGraph) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    let n = graph.number_of_nodes();
    writeln!(writer, "{} {} 1", n, graph.number_of_edges() / 2)?;
    for node in 0..n {
        let mut line = String::new();
        for edge in graph.out_edges(node) {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&format!(
                "{} {}",
                graph.edge_target(edge) + 1,
                graph.edge_weight(edge)
            ));
        }
        writeln!(writer, "{}", line)?;
    }
    Ok(())
}

/// Writes a clustering, one cluster id per line.
pub fn write_partition<P: AsRef<Path>>(path: P, clustering: &[usize]) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    for &cluster in clustering {
        writeln!(writer, "{}", cluster)?;
    }
    Ok(())
}

/// Reads a clustering written by [`write_partition`].
pub fn read_partition<P: AsRef<Path>>(path: P) -> Result<Clustering> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    let mut clustering = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        clustering.push(parse_token(trimmed, "cluster id")?);
    }
    Ok(clustering)
}

fn parse_token<T: std::str::FromStr>(token: &str, what: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| EvoclusError::bad_graph(format!("cannot parse {} '{}'", what, token)))
}
