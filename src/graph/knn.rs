//! Brute-force k-nearest-neighbor search in the `(eta, phi)` plane.
//!
//! Events hold at most a few dozen nodes, so an all-pairs scan beats any
//! index structure here. Distance is plain Euclidean; phi is not wrapped.

use smallvec::SmallVec;

/// Neighbor indices of one point, nearest first. Inline up to the default
/// fan-out.
pub type Neighbors = SmallVec<[usize; 4]>;

/// Number of neighbors each of `n` points gets: `min(n, k + 1) - 1`.
///
/// A self-inclusive search asking for `k + 1` neighbors and discarding the
/// zero-distance self match produces exactly this fan-out.
pub fn fan_out(n: usize, k: usize) -> usize {
    n.min(k.saturating_add(1)).saturating_sub(1)
}

fn squared_distance(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    let d0 = a[0] - b[0];
    let d1 = a[1] - b[1];
    d0 * d0 + d1 * d1
}

/// For every point, the indices of its nearest other points in increasing
/// distance.
///
/// Equal distances keep ascending index order. That order is an artifact of
/// the stable sort, not a guarantee callers should depend on.
pub fn nearest_neighbors(points: &[[f64; 2]], k: usize) -> Vec<Neighbors> {
    let take = fan_out(points.len(), k);
    let mut scratch: Vec<(f64, usize)> = Vec::with_capacity(points.len());

    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            scratch.clear();
            scratch.extend(
                points
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .map(|(j, q)| (squared_distance(p, q), j)),
            );
            scratch.sort_by(|a, b| a.0.total_cmp(&b.0));
            scratch.iter().take(take).map(|&(_, j)| j).collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_out() {
        assert_eq!(fan_out(0, 3), 0);
        assert_eq!(fan_out(1, 3), 0);
        assert_eq!(fan_out(2, 3), 1);
        assert_eq!(fan_out(3, 3), 2);
        assert_eq!(fan_out(4, 3), 3);
        assert_eq!(fan_out(40, 3), 3);
        assert_eq!(fan_out(5, usize::MAX), 4);
    }

    #[test]
    fn test_neighbors_in_distance_order() {
        let points = [[0.0, 0.0], [0.1, 0.0], [0.5, 0.0], [2.0, 0.0], [-0.2, 0.0]];
        let nn = nearest_neighbors(&points, 3);
        assert_eq!(nn[0].as_slice(), &[1, 4, 2]);
        assert_eq!(nn[3].as_slice(), &[2, 1, 0]);
        assert!(nn.iter().enumerate().all(|(i, n)| !n.contains(&i)));
    }

    #[test]
    fn test_exact_ties_keep_index_order() {
        let points = [[0.0, 0.0], [1.0, 0.0], [-1.0, 0.0], [0.0, 1.0]];
        let nn = nearest_neighbors(&points, 3);
        assert_eq!(nn[0].as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_single_point_has_no_neighbors() {
        let nn = nearest_neighbors(&[[0.3, 0.3]], 3);
        assert_eq!(nn.len(), 1);
        assert!(nn[0].is_empty());
    }
}
