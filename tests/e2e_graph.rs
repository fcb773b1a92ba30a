//! End-to-end tests for k-NN graph conversion.

use nanoaod_convert::{pipeline, EventBatch, EventGraph, GraphConfig, GraphEngine, MemorySource};
use pretty_assertions::assert_eq;

// ============================================================================
// Helper: PFCands batch from per-event (pt, eta, phi) lists
// ============================================================================

fn pfcands(events: &[Vec<(f64, f64, f64)>]) -> EventBatch {
    let column = |f: fn(&(f64, f64, f64)) -> f64| -> Vec<Vec<f64>> {
        events.iter().map(|cands| cands.iter().map(f).collect()).collect()
    };
    let counts: Vec<u32> = events.iter().map(|cands| cands.len() as u32).collect();
    let mass: Vec<Vec<f64>> = events.iter().map(|c| vec![0.13957; c.len()]).collect();
    let pdg: Vec<Vec<f64>> = events.iter().map(|c| vec![211.0; c.len()]).collect();

    EventBatch::new(events.len())
        .with_column("nPFCands", counts).unwrap()
        .with_column("PFCands_pt", column(|c| c.0)).unwrap()
        .with_column("PFCands_eta", column(|c| c.1)).unwrap()
        .with_column("PFCands_phi", column(|c| c.2)).unwrap()
        .with_column("PFCands_mass", mass).unwrap()
        .with_column("PFCands_pdgId", pdg).unwrap()
}

fn run(batches: Vec<EventBatch>) -> (Vec<EventGraph>, pipeline::RunSummary) {
    let engine = GraphEngine::new(&GraphConfig::default()).unwrap();
    pipeline::run(&mut MemorySource::new(batches), &engine, None).unwrap()
}

// ============================================================================
// 1. Five candidates: 5 nodes, 15 edges, out-degree 3
// ============================================================================

#[test]
fn test_five_candidate_event() {
    let event: Vec<_> = (0..5).map(|i| (10.0 - i as f64, i as f64 * 0.4, -0.2 * i as f64)).collect();
    let (graphs, summary) = run(vec![pfcands(&[event])]);

    assert_eq!(graphs.len(), 1);
    assert_eq!(summary.produced, 1);
    let graph = &graphs[0];
    assert_eq!(graph.node_count(), 5);
    assert_eq!(graph.edge_count(), 15);
    for node in 0..5 {
        assert_eq!(graph.out_degree(node), 3, "node {} should have 3 neighbors", node);
    }
    assert!(graph.nodes.iter().all(|n| n[4] == 211.0));
}

// ============================================================================
// 2. Events with 1, 2, 3 candidates use min(n, k+1) - 1 neighbors
// ============================================================================

#[test]
fn test_small_events() {
    let events: Vec<Vec<_>> = (1..=3).map(|n| (0..n).map(|i| (1.0 + i as f64, i as f64, 0.0)).collect()).collect();
    let (graphs, _) = run(vec![pfcands(&events)]);

    let edge_counts: Vec<usize> = graphs.iter().map(EventGraph::edge_count).collect();
    assert_eq!(edge_counts, vec![0, 2, 6]);
}

// ============================================================================
// 3. Sixty candidates: the 40 hardest are kept, ascending by pt
// ============================================================================

#[test]
fn test_sixty_candidates_truncated_to_forty() {
    let event: Vec<_> = (0..60).map(|i| (((i * 37) % 60) as f64 + 1.0, (i % 7) as f64 * 0.3, (i % 11) as f64 * 0.2)).collect();
    let (graphs, summary) = run(vec![pfcands(&[event])]);

    let graph = &graphs[0];
    assert_eq!(graph.node_count(), 40);
    assert_eq!(graph.edge_count(), 120);
    assert_eq!(summary.nodes, 40);

    let pts: Vec<f64> = graph.nodes.iter().map(|n| n[0]).collect();
    assert!(pts.windows(2).all(|w| w[0] <= w[1]), "nodes must be ordered by ascending pt");
    assert_eq!(pts.first(), Some(&21.0));
    assert_eq!(pts.last(), Some(&60.0));
}

// ============================================================================
// 4. Empty events produce no graph and are counted as skipped
// ============================================================================

#[test]
fn test_empty_events_skipped() {
    let events = vec![
        vec![(5.0, 0.0, 0.0), (3.0, 0.1, 0.1)],
        vec![],
        vec![(8.0, -1.0, 2.0)],
    ];
    let (graphs, summary) = run(vec![pfcands(&events)]);

    assert_eq!(graphs.len(), 2);
    assert_eq!(summary.events, 3);
    assert_eq!(summary.skipped, 1);
    assert_eq!(graphs[1].nodes[0][0], 8.0);
    assert_eq!(summary.mean_nodes(), Some(1.5));
}

// ============================================================================
// 5. Edges point to the geometrically nearest candidates
// ============================================================================

#[test]
fn test_edges_follow_eta_phi_distance() {
    // Two tight clusters far apart; k = 1 keeps every edge inside its cluster.
    let event = vec![
        (1.0, 0.0, 0.0),
        (2.0, 0.05, 0.0),
        (3.0, 2.5, 2.5),
        (4.0, 2.55, 2.5),
    ];
    let config = GraphConfig { k: 1, ..GraphConfig::default() };
    let engine = GraphEngine::new(&config).unwrap();
    let (graphs, _) = pipeline::run(&mut MemorySource::new([pfcands(&[event])]), &engine, None).unwrap();

    let pairs: Vec<(usize, usize)> = graphs[0].edges.pairs().collect();
    assert_eq!(pairs, vec![(0, 1), (1, 0), (2, 3), (3, 2)]);
}

// ============================================================================
// 6. Missing id branch is fatal
// ============================================================================

#[test]
fn test_missing_pdg_id_branch() {
    let batch = EventBatch::new(1)
        .with_column("nPFCands", vec![1u32]).unwrap()
        .with_column("PFCands_pt", vec![vec![1.0]]).unwrap()
        .with_column("PFCands_eta", vec![vec![0.0]]).unwrap()
        .with_column("PFCands_phi", vec![vec![0.0]]).unwrap()
        .with_column("PFCands_mass", vec![vec![0.0]]).unwrap();
    let engine = GraphEngine::new(&GraphConfig::default()).unwrap();
    assert!(pipeline::run(&mut MemorySource::new([batch]), &engine, None).is_err());
}
