#![forbid(unsafe_code)]

//! Document graph model used by `barnacle`.
//!
//! Documents come in as descriptors (`id`, `title`, `tags`, optional explicit
//! links) and are stored as point masses in a dense node arena, with
//! undirected edges held as index pairs. The layout simulator mutates only
//! position and velocity; everything else is fixed at construction time.

use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Serialize};

pub mod error;
pub mod infer;

pub use error::{GraphError, Result};
pub use infer::{EdgePolicy, SharedTagPolicy};

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

/// Input descriptor for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub links: Vec<DocumentLink>,
    /// Repulsion/attraction weight; uniform (1.0) when absent.
    #[serde(default)]
    pub mass: Option<f64>,
}

/// Explicit relationship carried on a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentLink {
    pub target: String,
    #[serde(rename = "type", default)]
    pub link_type: Option<String>,
}

/// One document as a point mass.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: String,
    /// Dense index into the node arena; edges refer to nodes by this.
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub mass: f64,
    pub title: String,
    pub tags: Vec<String>,
}

/// Undirected relationship between two nodes, by dense index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphEdge {
    pub source: usize,
    pub target: usize,
    /// Scales spring attraction along this edge.
    pub weight: f64,
}

/// Construction-time options for `build_from_documents`.
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    /// Initial-placement bounds.
    pub width: f64,
    pub height: f64,
    /// Seed for the placement generator; identical seeds reproduce the
    /// same starting positions.
    pub seed: u64,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            seed: 1,
        }
    }
}

/// Diagnostics snapshot; no side effects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub min_degree: usize,
    pub max_degree: usize,
    pub mean_degree: f64,
    pub isolated_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    id_to_idx: HashMap<String, usize>,
}

impl DocumentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all nodes and edges from the given documents.
    ///
    /// Node topology is deterministic for identical input: edges come from
    /// the inference policy plus explicit links, with at most one edge per
    /// unordered pair (the largest weight wins). Links to unknown documents
    /// and self-links are dropped here rather than surfacing mid-simulation.
    pub fn build_from_documents(
        &mut self,
        docs: &[Document],
        policy: &dyn EdgePolicy,
        opts: &BuildOptions,
    ) -> Result<()> {
        let mut id_to_idx: HashMap<String, usize> = HashMap::default();
        id_to_idx.reserve(docs.len());
        for (index, doc) in docs.iter().enumerate() {
            if id_to_idx.insert(doc.id.clone(), index).is_some() {
                return Err(GraphError::DuplicateDocument { id: doc.id.clone() });
            }
        }

        self.nodes.clear();
        self.nodes.reserve(docs.len());
        for (index, doc) in docs.iter().enumerate() {
            let mass = doc
                .mass
                .filter(|m| m.is_finite() && *m > 0.0)
                .unwrap_or(1.0);
            self.nodes.push(GraphNode {
                id: doc.id.clone(),
                index,
                x: 0.0,
                y: 0.0,
                vx: 0.0,
                vy: 0.0,
                mass,
                title: doc.title.clone(),
                tags: doc.tags.clone(),
            });
        }
        self.id_to_idx = id_to_idx;
        self.scatter(opts.width, opts.height, opts.seed);

        self.edges.clear();
        let mut pair_to_edge: HashMap<(usize, usize), usize> = HashMap::default();
        for (a, b, weight) in policy.infer_edges(&self.nodes) {
            self.add_edge(&mut pair_to_edge, a, b, weight);
        }
        for (source, doc) in docs.iter().enumerate() {
            for link in &doc.links {
                match self.id_to_idx.get(link.target.as_str()) {
                    Some(&target) if target != source => {
                        self.add_edge(&mut pair_to_edge, source, target, 1.0);
                    }
                    Some(_) => {
                        tracing::debug!(id = %doc.id, "dropping self-link");
                    }
                    None => {
                        tracing::debug!(
                            id = %doc.id,
                            target = %link.target,
                            "dropping link to unknown document"
                        );
                    }
                }
            }
        }

        Ok(())
    }

    fn add_edge(
        &mut self,
        pair_to_edge: &mut HashMap<(usize, usize), usize>,
        a: usize,
        b: usize,
        weight: f64,
    ) {
        if a == b || a >= self.nodes.len() || b >= self.nodes.len() {
            return;
        }
        let weight = if weight.is_finite() && weight > 0.0 {
            weight
        } else {
            1.0
        };
        let key = if a < b { (a, b) } else { (b, a) };
        match pair_to_edge.get(&key) {
            Some(&idx) => {
                let edge = &mut self.edges[idx];
                edge.weight = edge.weight.max(weight);
            }
            None => {
                pair_to_edge.insert(key, self.edges.len());
                self.edges.push(GraphEdge {
                    source: key.0,
                    target: key.1,
                    weight,
                });
            }
        }
    }

    /// Re-randomizes every node's position within the given bounds and zeroes
    /// velocities. Used to restart a layout; topology is untouched.
    pub fn scatter(&mut self, width: f64, height: f64, seed: u64) {
        let mut rng = XorShift64Star::new(seed);
        for node in &mut self.nodes {
            node.x = rng.next_f64_unit() * width.max(0.0);
            node.y = rng.next_f64_unit() * height.max(0.0);
            node.vx = 0.0;
            node.vy = 0.0;
        }
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Mutable node access for the simulation hot loop. Indices and ids are
    /// fixed; only kinematic state is expected to change.
    pub fn nodes_mut(&mut self) -> &mut [GraphNode] {
        &mut self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.id_to_idx.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.id_to_idx.get(id).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Last-writer-wins position update; `false` for unknown ids.
    pub fn set_position(&mut self, id: &str, x: f64, y: f64) -> bool {
        match self.id_to_idx.get(id) {
            Some(&idx) => {
                self.nodes[idx].x = x;
                self.nodes[idx].y = y;
                true
            }
            None => false,
        }
    }

    /// Last-writer-wins velocity update; `false` for unknown ids.
    pub fn set_velocity(&mut self, id: &str, vx: f64, vy: f64) -> bool {
        match self.id_to_idx.get(id) {
            Some(&idx) => {
                self.nodes[idx].vx = vx;
                self.nodes[idx].vy = vy;
                true
            }
            None => false,
        }
    }

    pub fn stats(&self) -> GraphStats {
        let mut degrees = vec![0usize; self.nodes.len()];
        for edge in &self.edges {
            degrees[edge.source] += 1;
            degrees[edge.target] += 1;
        }

        let node_count = self.nodes.len();
        let edge_count = self.edges.len();
        let min_degree = degrees.iter().copied().min().unwrap_or(0);
        let max_degree = degrees.iter().copied().max().unwrap_or(0);
        let mean_degree = if node_count == 0 {
            0.0
        } else {
            (2 * edge_count) as f64 / node_count as f64
        };
        let isolated_count = degrees.iter().filter(|&&d| d == 0).count();

        GraphStats {
            node_count,
            edge_count,
            min_degree,
            max_degree,
            mean_degree,
            isolated_count,
        }
    }
}

/// Small deterministic generator for initial placement; keeps rebuilds
/// reproducible without pulling in an RNG dependency.
#[derive(Debug, Clone)]
struct XorShift64Star {
    state: u64,
}

impl XorShift64Star {
    fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D_u64)
    }

    fn next_f64_unit(&mut self) -> f64 {
        // Map to [0, 1) with 53 bits of precision.
        let u = self.next_u64() >> 11;
        (u as f64) / ((1u64 << 53) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::XorShift64Star;

    #[test]
    fn xorshift64star_unit_floats_stay_in_range_and_reproduce() {
        let mut a = XorShift64Star::new(42);
        let mut b = XorShift64Star::new(42);
        for _ in 0..100 {
            let v = a.next_f64_unit();
            assert!((0.0..1.0).contains(&v), "out of range: {v}");
            assert_eq!(v, b.next_f64_unit());
        }
    }

    #[test]
    fn xorshift64star_zero_seed_is_usable() {
        let mut rng = XorShift64Star::new(0);
        assert_ne!(rng.next_u64(), 0);
    }
}
