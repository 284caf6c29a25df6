//! `graph` command: summarise a saved knowledge graph as an edge list.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{ensure, Context, Result};

use crate::kg::{KnowledgeStore, TripleGraph};

/// Relations listed in the summary.
pub const TOP_RELATIONS: usize = 10;

/// Summary of `graph`; with `entity`, also its outgoing edges.
pub fn render(graph: &TripleGraph, entity: Option<&str>) -> Result<String> {
    let mut out = String::new();
    let data = graph.to_graph_data();
    ensure!(data.validate(), "edge index refers to missing nodes");

    let _ = writeln!(out, "{}", data);
    let _ = writeln!(out, "nodes: {}", graph.nodes().len());
    let _ = writeln!(out, "edges: {}", graph.num_edges());

    let top = graph.top_relations(TOP_RELATIONS);
    if !top.is_empty() {
        let _ = writeln!(out, "top relations:");
        for (relation, count) in top {
            let _ = writeln!(out, "  {:>5}  {}", count, relation);
        }
    }

    if let Some(entity) = entity {
        let edges = graph.neighbors(entity);
        let _ = writeln!(out, "{} ({} outgoing):", entity, edges.len());
        for (relation, object) in edges {
            let _ = writeln!(out, "  -[{}]-> {}", relation, object);
        }
    }
    Ok(out)
}

pub fn run(kg: &Path, entity: Option<&str>) -> Result<()> {
    let store = KnowledgeStore::from_file(kg)
        .with_context(|| format!("failed to load {}", kg.display()))?;
    let graph = TripleGraph::from_store(&store);
    print!("{}", render(&graph, entity)?);
    Ok(())
}
