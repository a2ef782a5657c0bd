//! Discrete-step force simulation with Barnes-Hut repulsion, spring
//! attraction along edges, damped integration under a cooling schedule, and
//! soft boundary reflection.
//!
//! The simulator is synchronous and single-threaded: state between steps
//! lives entirely in the graph's positions/velocities plus the scalar
//! temperature, so callers chunk work across frames by invoking
//! [`LayoutSimulator::simulate`] with a small budget or calling
//! [`LayoutSimulator::step`] directly.

use crate::graph::DocumentGraph;
use crate::quadtree::{QuadTree, Region};

/// Fully-populated simulation parameters; every field has an explicit
/// default and nothing is merged at runtime.
#[derive(Debug, Clone, Copy)]
pub struct LayoutConfig {
    /// Step budget per `simulate` call.
    pub iterations: usize,
    pub repulsion_strength: f64,
    pub attraction_strength: f64,
    /// Edge distance at which spring force is zero.
    pub rest_length: f64,
    /// Barnes-Hut accuracy threshold; 0.0 is the exact pairwise sum.
    pub theta: f64,
    /// Fraction of velocity bled off each step.
    pub damping: f64,
    pub initial_alpha: f64,
    /// Linear temperature decrement per step.
    pub alpha_decay: f64,
    pub min_alpha: f64,
    /// Velocity magnitude ceiling, units per step.
    pub max_velocity: f64,
    /// Nodes are reflected once they come this close to the bounds.
    pub boundary_margin: f64,
    /// Velocity retained (and inverted) by a boundary reflection.
    pub restitution: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            iterations: 300,
            repulsion_strength: 1000.0,
            attraction_strength: 0.01,
            rest_length: 100.0,
            theta: 0.5,
            damping: 0.1,
            initial_alpha: 1.0,
            alpha_decay: 0.01,
            min_alpha: 0.001,
            max_velocity: 10.0,
            boundary_margin: 50.0,
            restitution: 0.5,
        }
    }
}

/// Edges shorter than this contribute no spring force.
const EDGE_EPSILON: f64 = 1e-6;

/// Convergence is never declared before this many steps of a `simulate`
/// call have run, even once the temperature floor is reached.
const MIN_STEPS_BEFORE_CONVERGENCE: usize = 50;

#[derive(Debug, Clone)]
pub struct LayoutSimulator {
    config: LayoutConfig,
    width: f64,
    height: f64,
    alpha: f64,
    tree: QuadTree,
    /// Per-node force accumulator, reused across steps.
    forces: Vec<(f64, f64)>,
}

impl LayoutSimulator {
    pub fn new(width: f64, height: f64, config: LayoutConfig) -> Self {
        let alpha = config.initial_alpha.max(config.min_alpha);
        Self {
            config,
            width,
            height,
            alpha,
            tree: QuadTree::new(Region::new(0.0, 0.0, width, height)),
            forces: Vec::new(),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Current temperature; callers poll this to decide whether to keep
    /// stepping.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Re-heats to the configured initial temperature without touching node
    /// positions.
    pub fn reset(&mut self) {
        self.alpha = self.config.initial_alpha.max(self.config.min_alpha);
    }

    /// Re-heats to an explicit temperature (clamped at the floor) without
    /// touching node positions.
    pub fn reset_to(&mut self, alpha: f64) {
        self.alpha = alpha.max(self.config.min_alpha);
    }

    /// Replaces the boundary-reflection rectangle. Existing positions are
    /// left alone; a resize by itself does not re-layout anything.
    pub fn update_bounds(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Runs up to `config.iterations` steps. Returns the number of steps
    /// actually run.
    pub fn simulate(&mut self, graph: &mut DocumentGraph) -> usize {
        self.simulate_with(graph, |_, _| {})
    }

    /// Runs up to `config.iterations` steps, invoking `on_progress(step,
    /// alpha)` synchronously after each one. Stops early once the
    /// temperature floor is reached and at least
    /// `MIN_STEPS_BEFORE_CONVERGENCE` steps have elapsed.
    pub fn simulate_with(
        &mut self,
        graph: &mut DocumentGraph,
        mut on_progress: impl FnMut(usize, f64),
    ) -> usize {
        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            alpha = self.alpha,
            iterations = self.config.iterations,
            "starting layout simulation"
        );

        let mut steps = 0;
        for i in 0..self.config.iterations {
            let alpha = self.step(graph);
            steps = i + 1;
            on_progress(i, alpha);

            if alpha <= self.config.min_alpha && steps >= MIN_STEPS_BEFORE_CONVERGENCE {
                tracing::trace!(step = i, "layout converged");
                break;
            }
        }
        steps
    }

    /// One discrete simulation step followed by cooling; returns the new
    /// temperature. This is the resumable entry point for callers driving
    /// the layout frame by frame.
    pub fn step(&mut self, graph: &mut DocumentGraph) -> f64 {
        self.step_once(graph);
        self.alpha = (self.alpha - self.config.alpha_decay).max(self.config.min_alpha);
        self.alpha
    }

    fn step_once(&mut self, graph: &mut DocumentGraph) {
        let node_count = graph.node_count();
        if node_count == 0 {
            return;
        }

        // Rebuild the spatial index from current positions; the arena is
        // pooled so this settles into zero allocations.
        self.tree
            .reset(Region::new(0.0, 0.0, self.width, self.height));
        for node in graph.nodes() {
            self.tree.insert(node.x, node.y, node.mass);
        }

        self.forces.clear();
        self.forces.resize(node_count, (0.0, 0.0));

        // Approximate repulsion, one query per node.
        for (i, node) in graph.nodes().iter().enumerate() {
            self.forces[i] = self.tree.calculate_force(
                node.x,
                node.y,
                node.mass,
                self.config.theta,
                self.config.repulsion_strength,
            );
        }

        // Spring attraction along edges, equal and opposite on both
        // endpoints. Degenerate (near-zero-length) edges are skipped.
        for edge in graph.edges() {
            let a = &graph.nodes()[edge.source];
            let b = &graph.nodes()[edge.target];
            let dx = b.x - a.x;
            let dy = b.y - a.y;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist < EDGE_EPSILON {
                continue;
            }

            let force =
                self.config.attraction_strength * (dist - self.config.rest_length) * edge.weight;
            let fx = force * dx / dist;
            let fy = force * dy / dist;
            self.forces[edge.source].0 += fx;
            self.forces[edge.source].1 += fy;
            self.forces[edge.target].0 -= fx;
            self.forces[edge.target].1 -= fy;
        }

        // Integrate: alpha scales force application (cooling), damping
        // bleeds kinetic energy every step regardless of alpha, the ceiling
        // caps numerical blow-up. Then reflect softly off the bounds.
        let keep = 1.0 - self.config.damping;
        let margin = self.config.boundary_margin;
        let max_x = (self.width - margin).max(margin);
        let max_y = (self.height - margin).max(margin);

        for (i, node) in graph.nodes_mut().iter_mut().enumerate() {
            let (fx, fy) = self.forces[i];
            let mut vx = (node.vx + fx * self.alpha) * keep;
            let mut vy = (node.vy + fy * self.alpha) * keep;

            let speed = (vx * vx + vy * vy).sqrt();
            if speed > self.config.max_velocity {
                let scale = self.config.max_velocity / speed;
                vx *= scale;
                vy *= scale;
            }

            let mut x = node.x + vx;
            let mut y = node.y + vy;

            if x < margin {
                x = margin;
                vx = -vx * self.config.restitution;
            } else if x > max_x {
                x = max_x;
                vx = -vx * self.config.restitution;
            }
            if y < margin {
                y = margin;
                vy = -vy * self.config.restitution;
            } else if y > max_y {
                y = max_y;
                vy = -vy * self.config.restitution;
            }

            node.x = x;
            node.y = y;
            node.vx = vx;
            node.vy = vy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LayoutConfig, LayoutSimulator};

    #[test]
    fn defaults_are_fully_populated_and_sane() {
        let config = LayoutConfig::default();
        assert!(config.theta >= 0.0);
        assert!(config.min_alpha > 0.0);
        assert!(config.min_alpha < config.initial_alpha);
        assert!((0.0..1.0).contains(&config.damping));
        assert!(config.max_velocity > 0.0);
    }

    #[test]
    fn initial_alpha_is_clamped_at_the_floor() {
        let config = LayoutConfig {
            initial_alpha: 0.0,
            min_alpha: 0.001,
            ..Default::default()
        };
        let sim = LayoutSimulator::new(800.0, 600.0, config);
        assert!((sim.alpha() - 0.001).abs() < 1e-12);
    }
}
