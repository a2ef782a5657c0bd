//! Edge inference policies.
//!
//! The rule that turns a set of documents into edges is deliberately a seam:
//! callers can swap in their own correlation heuristic without touching the
//! graph container or the simulator.

use crate::GraphNode;
use rustc_hash::FxBuildHasher;

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

/// Proposes undirected edges as `(source, target, weight)` dense-index
/// triples. Implementations only see construction-time node payloads;
/// kinematic state is not meaningful at this point.
pub trait EdgePolicy {
    fn infer_edges(&self, nodes: &[GraphNode]) -> Vec<(usize, usize, f64)>;
}

/// Default policy: connect every pair of documents sharing at least
/// `min_shared` tags.
///
/// With `weighted` set, the edge weight is the shared-tag count (a stronger
/// topical overlap pulls harder); otherwise every inferred edge weighs 1.0.
#[derive(Debug, Clone, Copy)]
pub struct SharedTagPolicy {
    pub min_shared: usize,
    pub weighted: bool,
}

impl Default for SharedTagPolicy {
    fn default() -> Self {
        Self {
            min_shared: 1,
            weighted: true,
        }
    }
}

impl EdgePolicy for SharedTagPolicy {
    fn infer_edges(&self, nodes: &[GraphNode]) -> Vec<(usize, usize, f64)> {
        let mut by_tag: HashMap<&str, Vec<usize>> = HashMap::default();
        for node in nodes {
            for tag in &node.tags {
                let members = by_tag.entry(tag.as_str()).or_default();
                // A document listing the same tag twice is still one member.
                if members.last() != Some(&node.index) {
                    members.push(node.index);
                }
            }
        }

        let mut overlap: HashMap<(usize, usize), usize> = HashMap::default();
        for members in by_tag.values() {
            for (i, &a) in members.iter().enumerate() {
                for &b in &members[i + 1..] {
                    let key = if a < b { (a, b) } else { (b, a) };
                    *overlap.entry(key).or_insert(0) += 1;
                }
            }
        }

        let min_shared = self.min_shared.max(1);
        let mut edges: Vec<(usize, usize, f64)> = overlap
            .into_iter()
            .filter(|&(_, shared)| shared >= min_shared)
            .map(|((a, b), shared)| {
                let weight = if self.weighted { shared as f64 } else { 1.0 };
                (a, b, weight)
            })
            .collect();

        // Hash-map iteration order is not part of the contract; keep the
        // proposed edge list deterministic for identical input.
        edges.sort_by_key(|&(a, b, _)| (a, b));
        edges
    }
}
