use barnacle::graph::{BuildOptions, Document, DocumentGraph, SharedTagPolicy};
use barnacle::{LayoutConfig, LayoutSimulator};

fn doc(id: &str, tags: &[&str]) -> Document {
    Document {
        id: id.to_string(),
        title: id.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        links: Vec::new(),
        mass: None,
    }
}

fn build(docs: &[Document], width: f64, height: f64) -> DocumentGraph {
    let opts = BuildOptions {
        width,
        height,
        seed: 42,
    };
    let mut g = DocumentGraph::new();
    g.build_from_documents(docs, &SharedTagPolicy::default(), &opts)
        .expect("build should succeed");
    g
}

#[test]
fn alpha_cools_linearly_and_floors_at_min() {
    let config = LayoutConfig {
        initial_alpha: 1.0,
        alpha_decay: 0.3,
        min_alpha: 0.05,
        ..Default::default()
    };
    let mut sim = LayoutSimulator::new(800.0, 600.0, config);
    let mut graph = build(&[doc("a", &[]), doc("b", &[])], 800.0, 600.0);

    assert!((sim.step(&mut graph) - 0.7).abs() < 1e-12);
    assert!((sim.step(&mut graph) - 0.4).abs() < 1e-12);
    assert!((sim.step(&mut graph) - 0.1).abs() < 1e-12);
    // Would go negative; clamps at the floor and stays there.
    assert!((sim.step(&mut graph) - 0.05).abs() < 1e-12);
    assert!((sim.step(&mut graph) - 0.05).abs() < 1e-12);
}

#[test]
fn simulate_reports_each_step_through_the_progress_callback() {
    let config = LayoutConfig {
        iterations: 40,
        alpha_decay: 0.0, // never reaches the floor, so no early exit
        ..Default::default()
    };
    let mut sim = LayoutSimulator::new(800.0, 600.0, config);
    let mut graph = build(&[doc("a", &["t"]), doc("b", &["t"])], 800.0, 600.0);

    let mut seen = Vec::new();
    let steps = sim.simulate_with(&mut graph, |step, alpha| seen.push((step, alpha)));

    assert_eq!(steps, 40);
    assert_eq!(seen.len(), steps);
    assert_eq!(seen.first().map(|&(s, _)| s), Some(0));
    assert_eq!(seen.last().map(|&(s, _)| s), Some(39));
    for window in seen.windows(2) {
        assert!(window[1].1 <= window[0].1, "alpha increased mid-run");
    }
}

#[test]
fn convergence_is_never_declared_before_fifty_steps() {
    // The floor is hit after ten steps, but the minimum-step gate holds the
    // loop open until step fifty.
    let config = LayoutConfig {
        iterations: 500,
        initial_alpha: 1.0,
        alpha_decay: 0.1,
        min_alpha: 0.001,
        ..Default::default()
    };
    let mut sim = LayoutSimulator::new(800.0, 600.0, config);
    let mut graph = build(&[doc("a", &[]), doc("b", &[])], 800.0, 600.0);

    assert_eq!(sim.simulate(&mut graph), 50);
}

#[test]
fn default_schedule_converges_after_one_hundred_steps() {
    let mut sim = LayoutSimulator::new(800.0, 600.0, LayoutConfig::default());
    let mut graph = build(&[doc("a", &["t"]), doc("b", &["t"])], 800.0, 600.0);

    // (1.0 - 0.001) / 0.01 rounds up to 100 steps to reach the floor.
    assert_eq!(sim.simulate(&mut graph), 100);
    assert!((sim.alpha() - 0.001).abs() < 1e-12);
}

#[test]
fn nodes_stay_inside_the_margin_under_strong_repulsion() {
    let config = LayoutConfig {
        iterations: 200,
        repulsion_strength: 50_000.0,
        alpha_decay: 0.0,
        ..Default::default()
    };
    let width = 400.0;
    let height = 300.0;
    let mut sim = LayoutSimulator::new(width, height, config);

    let docs: Vec<Document> = (0..30).map(|i| doc(&format!("d{i}"), &[])).collect();
    let mut graph = build(&docs, width, height);
    sim.simulate(&mut graph);

    let margin = sim.config().boundary_margin;
    for node in graph.nodes() {
        assert!(
            (margin..=width - margin).contains(&node.x),
            "{}: x escaped the bounds: {}",
            node.id,
            node.x
        );
        assert!(
            (margin..=height - margin).contains(&node.y),
            "{}: y escaped the bounds: {}",
            node.id,
            node.y
        );
    }
}

#[test]
fn a_linked_pair_settles_near_the_rest_length() {
    let config = LayoutConfig {
        iterations: 2000,
        repulsion_strength: 0.0,
        attraction_strength: 0.01,
        rest_length: 100.0,
        alpha_decay: 0.0, // hold the temperature so the spring fully relaxes
        ..Default::default()
    };
    let mut sim = LayoutSimulator::new(800.0, 600.0, config);
    let mut graph = build(&[doc("a", &["t"]), doc("b", &["t"])], 800.0, 600.0);
    graph.set_position("a", 300.0, 300.0);
    graph.set_position("b", 350.0, 300.0);

    sim.simulate(&mut graph);

    let a = graph.node("a").unwrap();
    let b = graph.node("b").unwrap();
    let dist = ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt();
    assert!(
        (dist - 100.0).abs() < 5.0,
        "pair settled at distance {dist}, expected ~100"
    );
    assert!(a.vx.abs() < 0.1 && a.vy.abs() < 0.1, "a still moving");
    assert!(b.vx.abs() < 0.1 && b.vy.abs() < 0.1, "b still moving");
}

#[test]
fn velocity_never_exceeds_the_configured_ceiling() {
    let config = LayoutConfig {
        iterations: 100,
        repulsion_strength: 1_000_000.0,
        max_velocity: 4.0,
        alpha_decay: 0.0,
        ..Default::default()
    };
    let mut sim = LayoutSimulator::new(800.0, 600.0, config);
    let docs: Vec<Document> = (0..10).map(|i| doc(&format!("d{i}"), &[])).collect();
    let mut graph = build(&docs, 800.0, 600.0);

    for _ in 0..100 {
        sim.step(&mut graph);
        for node in graph.nodes() {
            let speed = (node.vx * node.vx + node.vy * node.vy).sqrt();
            // Reflection scales speed down, never up, so the ceiling holds.
            assert!(speed <= 4.0 + 1e-9, "{}: speed {speed}", node.id);
        }
    }
}

#[test]
fn reset_reheats_without_touching_positions() {
    let mut sim = LayoutSimulator::new(800.0, 600.0, LayoutConfig::default());
    let mut graph = build(&[doc("a", &["t"]), doc("b", &["t"])], 800.0, 600.0);

    sim.simulate(&mut graph);
    assert!((sim.alpha() - 0.001).abs() < 1e-12);
    let positions: Vec<(f64, f64)> = graph.nodes().iter().map(|n| (n.x, n.y)).collect();

    sim.reset();
    assert!((sim.alpha() - 1.0).abs() < 1e-12);

    sim.reset_to(0.3);
    assert!((sim.alpha() - 0.3).abs() < 1e-12);

    // Re-heating below the floor clamps up to it.
    sim.reset_to(0.0);
    assert!((sim.alpha() - 0.001).abs() < 1e-12);

    let after: Vec<(f64, f64)> = graph.nodes().iter().map(|n| (n.x, n.y)).collect();
    assert_eq!(positions, after);
}

#[test]
fn shrinking_the_bounds_pulls_strays_back_inside() {
    let mut sim = LayoutSimulator::new(800.0, 600.0, LayoutConfig::default());
    let mut graph = build(&[doc("a", &[]), doc("b", &[])], 800.0, 600.0);
    graph.set_position("a", 700.0, 500.0);
    graph.set_position("b", 100.0, 100.0);

    sim.update_bounds(300.0, 300.0);
    sim.step(&mut graph);

    let margin = sim.config().boundary_margin;
    for node in graph.nodes() {
        assert!(node.x <= 300.0 - margin, "{}: x {}", node.id, node.x);
        assert!(node.y <= 300.0 - margin, "{}: y {}", node.id, node.y);
        assert!(node.x >= margin && node.y >= margin);
    }
}

#[test]
fn an_empty_graph_simulates_without_incident() {
    let mut sim = LayoutSimulator::new(800.0, 600.0, LayoutConfig::default());
    let mut graph = DocumentGraph::new();
    let steps = sim.simulate(&mut graph);
    assert!(steps > 0);
}

#[test]
fn a_single_node_drifts_nowhere() {
    let mut sim = LayoutSimulator::new(800.0, 600.0, LayoutConfig::default());
    let mut graph = build(&[doc("only", &[])], 800.0, 600.0);
    graph.set_position("only", 400.0, 300.0);

    sim.simulate(&mut graph);

    let node = graph.node("only").unwrap();
    assert_eq!((node.x, node.y), (400.0, 300.0));
    assert_eq!((node.vx, node.vy), (0.0, 0.0));
}
