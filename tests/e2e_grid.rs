//! End-to-end tests for grid conversion.
//!
//! Each test builds an `EventBatch` by hand, runs it through the driver
//! with a `MemorySource`, and inspects the stacked `(N, 16, 16, 5)` output.

use nanoaod_convert::{pipeline, EventBatch, GridConfig, GridEngine, MemorySource, ObjectType};
use pretty_assertions::assert_eq;

// ============================================================================
// Helper: one-event batch with explicit per-type particle lists.
// ============================================================================

type Kinematics = (f64, f64, f64, f64); // (pt, eta, phi, mass)

fn event_batch(lists: &[(&str, Vec<Kinematics>)]) -> EventBatch {
    let mut batch = EventBatch::new(1);
    for object in ObjectType::standard_order() {
        let particles = lists
            .iter()
            .find(|(name, _)| *name == object.name)
            .map(|(_, p)| p.clone())
            .unwrap_or_default();
        batch.insert(object.count_column(), vec![particles.len() as u32]).unwrap();
        batch.insert(object.column("pt"), vec![particles.iter().map(|p| p.0).collect::<Vec<_>>()]).unwrap();
        batch.insert(object.column("eta"), vec![particles.iter().map(|p| p.1).collect::<Vec<_>>()]).unwrap();
        batch.insert(object.column("phi"), vec![particles.iter().map(|p| p.2).collect::<Vec<_>>()]).unwrap();
        batch.insert(object.column("mass"), vec![particles.iter().map(|p| p.3).collect::<Vec<_>>()]).unwrap();
    }
    batch
}

fn convert(batches: Vec<EventBatch>) -> nanoaod_convert::GridStack {
    let engine = GridEngine::new(&GridConfig::default()).unwrap();
    let (grids, _) = pipeline::run(&mut MemorySource::new(batches), &engine, None).unwrap();
    grids
}

// ============================================================================
// 1. A lone jet at the origin fills exactly the center cell
// ============================================================================

#[test]
fn test_single_jet_center_cell() {
    let grids = convert(vec![event_batch(&[("Jet", vec![(50.0, 0.0, 0.0, 10.0)])])]);

    assert_eq!(grids.shape(), vec![1, 16, 16, 5]);
    assert_eq!(grids.cell(0, 8, 8), Some(&[50.0, 0.0, 0.0, 10.0, 1.0][..]));

    let nonzero = grids.data().iter().filter(|&&v| v != 0.0).count();
    assert_eq!(nonzero, 3, "only pt, mass and type_id of one cell are non-zero");
}

// ============================================================================
// 2. Same-cell jets: the larger pt wins regardless of order
// ============================================================================

#[test]
fn test_same_cell_jets_keep_highest_pt() {
    let rising = event_batch(&[("Jet", vec![(30.0, 0.1, 0.1, 1.0), (45.0, 0.2, 0.2, 2.0)])]);
    let falling = event_batch(&[("Jet", vec![(45.0, 0.1, 0.1, 1.0), (30.0, 0.2, 0.2, 2.0)])]);
    let grids = convert(vec![rising, falling]);

    assert_eq!(grids.cell(0, 8, 8), Some(&[45.0, 0.2, 0.2, 2.0, 1.0][..]));
    assert_eq!(grids.cell(1, 8, 8), Some(&[45.0, 0.1, 0.1, 1.0, 1.0][..]));
}

// ============================================================================
// 3. Tie-break: earlier type in processing order wins equal pt
// ============================================================================

#[test]
fn test_tie_goes_to_earlier_object_type() {
    let batch = event_batch(&[
        ("Photon", vec![(20.0, -1.0, 1.0, 0.0)]),
        ("Tau", vec![(20.0, -1.01, 1.01, 1.7)]),
        ("Electron", vec![(20.0, -0.99, 0.99, 0.0005)]),
    ]);
    let grids = convert(vec![batch]);
    let (phi_bin, eta_bin) = (10, 5);
    let cell = grids.cell(0, phi_bin, eta_bin).unwrap();
    assert_eq!(cell[4], 2.0, "electron (type 2) is processed before photon and tau");
}

#[test]
fn test_custom_order_changes_tie_winner() {
    let batch = event_batch(&[
        ("Jet", vec![(20.0, 0.1, 0.1, 5.0)]),
        ("Muon", vec![(20.0, 0.1, 0.1, 0.1)]),
    ]);
    let config = GridConfig {
        objects: vec![
            ObjectType::new("Muon", 4),
            ObjectType::new("Jet", 1),
            ObjectType::new("Electron", 2),
            ObjectType::new("Photon", 3),
            ObjectType::new("Tau", 5),
        ],
        ..GridConfig::default()
    };
    let engine = GridEngine::new(&config).unwrap();
    let (grids, _) = pipeline::run(&mut MemorySource::new([batch]), &engine, None).unwrap();
    assert_eq!(grids.cell(0, 8, 8).unwrap()[4], 4.0);
}

// ============================================================================
// 4. Acceptance: eta outside [-3, 3] leaves no trace, phi is clamped
// ============================================================================

#[test]
fn test_forward_particles_do_not_touch_grid() {
    let with_forward = event_batch(&[("Jet", vec![(50.0, 0.0, 0.0, 10.0), (500.0, 4.2, 0.0, 30.0)])]);
    let without = event_batch(&[("Jet", vec![(50.0, 0.0, 0.0, 10.0)])]);
    let grids = convert(vec![with_forward, without]);
    assert_eq!(grids.event(0), grids.event(1));
}

#[test]
fn test_phi_beyond_edges_is_clamped() {
    let batch = event_batch(&[("Muon", vec![(12.0, 0.0, 3.14159, 0.1), (9.0, 0.0, -3.14159, 0.1)])]);
    let grids = convert(vec![batch]);
    assert_eq!(grids.cell(0, 15, 8).unwrap()[0], 12.0);
    assert_eq!(grids.cell(0, 0, 8).unwrap()[0], 9.0);
}

// ============================================================================
// 5. Missing branch aborts the run
// ============================================================================

#[test]
fn test_missing_collection_is_fatal() {
    let batch = EventBatch::new(1).with_column("nJet", vec![0u32]).unwrap();
    let engine = GridEngine::new(&GridConfig::default()).unwrap();
    let result = pipeline::run(&mut MemorySource::new([batch]), &engine, None);
    assert!(result.is_err());
}
