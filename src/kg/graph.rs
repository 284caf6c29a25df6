//! Graph view over extracted triples.
//!
//! Entities become nodes, triples become directed `subject -> object` edges
//! labelled with their relation. The layout follows the usual COO
//! convention: `edge_index[0]` holds sources, `edge_index[1]` targets.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use super::store::KnowledgeStore;
use super::triples::Triple;

/// Where graph tensors live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Cpu,
    Cuda,
}

impl Device {
    /// CUDA if an NVIDIA driver is loaded on this host.
    pub fn detect() -> Self {
        if cuda_available() {
            Device::Cuda
        } else {
            Device::Cpu
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda => write!(f, "cuda"),
        }
    }
}

/// Whether the NVIDIA kernel driver is present.
pub fn cuda_available() -> bool {
    Path::new("/proc/driver/nvidia/version").exists()
}

/// Node features plus COO connectivity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphData {
    /// One feature row per node
    pub x: Vec<Vec<f32>>,
    /// `[sources, targets]`
    pub edge_index: [Vec<usize>; 2],
    pub device: Device,
}

impl GraphData {
    pub fn new(x: Vec<Vec<f32>>, edge_index: [Vec<usize>; 2]) -> Self {
        Self {
            x,
            edge_index,
            device: Device::Cpu,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.x.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edge_index[0].len()
    }

    pub fn num_node_features(&self) -> usize {
        self.x.first().map(Vec::len).unwrap_or(0)
    }

    /// Move the graph to another device.
    pub fn to(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// True when every edge endpoint refers to an existing node.
    pub fn validate(&self) -> bool {
        self.edge_index[0].len() == self.edge_index[1].len()
            && self.edge_index.iter().flatten().all(|&n| n < self.num_nodes())
    }
}

impl fmt::Display for GraphData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Data(x=[{}, {}], edge_index=[2, {}])",
            self.num_nodes(),
            self.num_node_features(),
            self.num_edges()
        )
    }
}

/// Entity/relation graph built from a knowledge store.
#[derive(Debug, Clone, Default)]
pub struct TripleGraph {
    nodes: Vec<String>,
    node_ids: HashMap<String, usize>,
    relations: Vec<String>,
    edge_index: [Vec<usize>; 2],
}

impl TripleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten every document of the store, in key order.
    pub fn from_store(store: &KnowledgeStore) -> Self {
        let mut graph = Self::new();
        for (_, triples) in store.iter() {
            graph.add_triples(triples);
        }
        graph
    }

    pub fn add_triples(&mut self, triples: &[Triple]) {
        for triple in triples {
            let src = self.node_id(&triple.subject);
            let dst = self.node_id(&triple.object);
            self.edge_index[0].push(src);
            self.edge_index[1].push(dst);
            self.relations.push(triple.relation.clone());
        }
    }

    fn node_id(&mut self, name: &str) -> usize {
        if let Some(&id) = self.node_ids.get(name) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(name.to_string());
        self.node_ids.insert(name.to_string(), id);
        id
    }

    /// Entity names, indexed by node id.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Relation label per edge.
    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    pub fn edge_index(&self) -> &[Vec<usize>; 2] {
        &self.edge_index
    }

    pub fn num_edges(&self) -> usize {
        self.relations.len()
    }

    /// Relations sorted by frequency, descending, ties by name.
    pub fn top_relations(&self, top_k: usize) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for rel in &self.relations {
            *counts.entry(rel.as_str()).or_insert(0) += 1;
        }

        let mut ranked: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(rel, n)| (rel.to_string(), n))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(top_k);
        ranked
    }

    /// Outgoing `(relation, object)` pairs of an entity.
    pub fn neighbors(&self, entity: &str) -> Vec<(&str, &str)> {
        let Some(&id) = self.node_ids.get(entity) else {
            return Vec::new();
        };

        self.edge_index[0]
            .iter()
            .zip(&self.edge_index[1])
            .zip(&self.relations)
            .filter(|((src, _), _)| **src == id)
            .map(|((_, dst), rel)| (rel.as_str(), self.nodes[*dst].as_str()))
            .collect()
    }

    /// Plain tensor view with a single constant feature per node.
    pub fn to_graph_data(&self) -> GraphData {
        GraphData::new(vec![vec![1.0]; self.nodes.len()], self.edge_index.clone())
    }
}
