#![forbid(unsafe_code)]

//! Barnes-Hut force-directed layout engine for document graphs.
//!
//! The engine is headless and self-contained: it positions the nodes of a
//! [`graph::DocumentGraph`] by repeatedly rebuilding a quadtree spatial
//! index, approximating pairwise repulsion through it, applying spring
//! attraction along edges, and integrating with damping under a cooling
//! schedule. Rendering, resize handling, and scheduling belong to callers.

pub use barnacle_graph as graph;

pub mod quadtree;
pub mod simulator;

pub use quadtree::{QuadTree, Region};
pub use simulator::{LayoutConfig, LayoutSimulator};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
