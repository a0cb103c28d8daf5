//! Agglomerative (bottom-up) hierarchical clustering.
//!
//! Starting from one cluster per observation, the two closest clusters are
//! merged until one remains. Distances between a merged cluster and the rest
//! are updated with the Lance-Williams recurrence for the chosen [`Linkage`].
//!
//! The resulting [`Dendrogram`] is a diagnostic for inspecting how many
//! clusters the data suggests; k-means model selection never reads it.

use crate::error::{Error, Result};
use crate::ml::classic::distance::DistanceMatrix;

/// Rule for the distance between two clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Linkage {
    /// Closest pair of members.
    Single,
    /// Farthest pair of members.
    #[default]
    Complete,
    /// Mean over all member pairs (UPGMA).
    Average,
}

impl Linkage {
    /// Distance from the union of clusters `a` and `b` to a third cluster,
    /// given the distances from `a` and `b` to it and their sizes.
    fn update(&self, d_a: f64, d_b: f64, size_a: usize, size_b: usize) -> f64 {
        match self {
            Linkage::Single => d_a.min(d_b),
            Linkage::Complete => d_a.max(d_b),
            Linkage::Average => {
                (size_a as f64 * d_a + size_b as f64 * d_b) / (size_a + size_b) as f64
            }
        }
    }
}

/// A child of a merge: either an original observation or an earlier merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Leaf(usize),
    Merge(usize),
}

/// One agglomeration step.
#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    pub left: Node,
    pub right: Node,
    /// Linkage distance at which the two children were joined.
    pub height: f64,
    /// Number of observations under this merge.
    pub size: usize,
}

/// Binary merge tree over `n` observations, stored as `n - 1` merges in the
/// order they happened. Merge `i` may only reference merges before it.
#[derive(Debug, Clone, PartialEq)]
pub struct Dendrogram {
    merges: Vec<Merge>,
    n_leaves: usize,
    linkage: Linkage,
}

impl Dendrogram {
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    pub fn n_leaves(&self) -> usize {
        self.n_leaves
    }

    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    /// Merge heights from the first merge to the root.
    pub fn heights(&self) -> Vec<f64> {
        self.merges.iter().map(|m| m.height).collect()
    }

    /// Leaves in left-to-right order, as they would be drawn under the tree.
    pub fn leaf_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.n_leaves);
        let mut stack = vec![Node::Merge(self.merges.len() - 1)];
        while let Some(node) = stack.pop() {
            match node {
                Node::Leaf(i) => order.push(i),
                Node::Merge(m) => {
                    stack.push(self.merges[m].right);
                    stack.push(self.merges[m].left);
                }
            }
        }
        order
    }

    /// Flat labels obtained by undoing the last `k - 1` merges.
    ///
    /// Labels are numbered by first appearance in observation order, so
    /// observation 0 is always in cluster 0.
    pub fn cut(&self, k: usize) -> Result<Vec<usize>> {
        if k == 0 || k > self.n_leaves {
            return Err(Error::InvalidClusterCount {
                k,
                observations: self.n_leaves,
            });
        }

        let mut uf = UnionFind::new(self.n_leaves);
        let mut representative = Vec::with_capacity(self.merges.len());
        for merge in &self.merges[..self.n_leaves - k] {
            let a = leaf_of(merge.left, &representative);
            let b = leaf_of(merge.right, &representative);
            uf.union(a, b);
            representative.push(a.min(b));
        }

        let mut label_of_root = vec![usize::MAX; self.n_leaves];
        let mut next = 0;
        Ok((0..self.n_leaves)
            .map(|i| {
                let root = uf.find(i);
                if label_of_root[root] == usize::MAX {
                    label_of_root[root] = next;
                    next += 1;
                }
                label_of_root[root]
            })
            .collect())
    }
}

fn leaf_of(node: Node, representative: &[usize]) -> usize {
    match node {
        Node::Leaf(i) => i,
        Node::Merge(m) => representative[m],
    }
}

/// Disjoint-set over leaf indices; the lower index always becomes the root.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, x: usize, y: usize) {
        let rx = self.find(x);
        let ry = self.find(y);
        if rx < ry {
            self.parent[ry] = rx;
        } else if ry < rx {
            self.parent[rx] = ry;
        }
    }
}

/// Builds the full merge tree for `distances` under `linkage`.
///
/// Each active cluster lives in the slot of its smallest observation index.
/// Slots are scanned in ascending `(i, j)` order and only a strictly smaller
/// distance replaces the current best, so ties go to the lowest index pair.
///
/// # Errors
///
/// Returns [`Error::TooFewObservations`] if there are fewer than two observations.
pub fn build_dendrogram(distances: &DistanceMatrix, linkage: Linkage) -> Result<Dendrogram> {
    let n = distances.len();
    if n < 2 {
        return Err(Error::TooFewObservations {
            required: 2,
            found: n,
        });
    }

    let mut d = distances.as_array().clone();
    let mut active = vec![true; n];
    let mut sizes = vec![1_usize; n];
    let mut nodes: Vec<Node> = (0..n).map(Node::Leaf).collect();
    let mut merges = Vec::with_capacity(n - 1);

    for step in 0..n - 1 {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in (0..n).filter(|&i| active[i]) {
            for j in ((i + 1)..n).filter(|&j| active[j]) {
                let dij = d[[i, j]];
                if best.map_or(true, |(_, _, b)| dij < b) {
                    best = Some((i, j, dij));
                }
            }
        }
        let Some((a, b, height)) = best else {
            return Err(Error::invalid_input("no pair left to merge"));
        };

        for k in (0..n).filter(|&k| active[k] && k != a && k != b) {
            let updated = linkage.update(d[[a, k]], d[[b, k]], sizes[a], sizes[b]);
            d[[a, k]] = updated;
            d[[k, a]] = updated;
        }
        active[b] = false;

        merges.push(Merge {
            left: nodes[a],
            right: nodes[b],
            height,
            size: sizes[a] + sizes[b],
        });
        log::trace!("merge {step}: slots ({a}, {b}) at height {height}");
        nodes[a] = Node::Merge(step);
        sizes[a] += sizes[b];
    }

    Ok(Dendrogram {
        merges,
        n_leaves: n,
        linkage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::classic::distance::{compute_distances, Metric};
    use crate::ml::classic::matrix::ObservationMatrix;
    use approx::assert_relative_eq;

    /// Points on a line: 0, 1, 4, 10.
    fn line() -> DistanceMatrix {
        let data =
            ObservationMatrix::from_rows(&[vec![0.0], vec![1.0], vec![4.0], vec![10.0]]).unwrap();
        compute_distances(&data, Metric::Euclidean).unwrap()
    }

    #[test]
    fn test_single_linkage_heights() {
        let tree = build_dendrogram(&line(), Linkage::Single).unwrap();
        assert_eq!(tree.merges().len(), 3);
        assert_eq!(tree.heights(), vec![1.0, 3.0, 6.0]);
        assert_eq!(tree.merges()[0].left, Node::Leaf(0));
        assert_eq!(tree.merges()[0].right, Node::Leaf(1));
        assert_eq!(tree.merges()[1].left, Node::Merge(0));
        assert_eq!(tree.merges()[1].right, Node::Leaf(2));
        assert_eq!(tree.merges()[2].size, 4);
    }

    #[test]
    fn test_complete_linkage_heights() {
        let tree = build_dendrogram(&line(), Linkage::Complete).unwrap();
        assert_eq!(tree.heights(), vec![1.0, 4.0, 10.0]);
    }

    #[test]
    fn test_average_linkage_heights() {
        let tree = build_dendrogram(&line(), Linkage::Average).unwrap();
        let heights = tree.heights();
        assert_relative_eq!(heights[0], 1.0);
        // mean(|4-0|, |4-1|)
        assert_relative_eq!(heights[1], 3.5);
        // mean(10, 9, 6)
        assert_relative_eq!(heights[2], 25.0 / 3.0);
    }

    #[test]
    fn test_heights_non_decreasing() {
        let data = ObservationMatrix::from_rows(&[
            vec![0.0, 0.0],
            vec![0.3, 0.1],
            vec![5.0, 5.0],
            vec![5.2, 4.9],
            vec![9.0, 0.5],
            vec![2.5, 2.5],
        ])
        .unwrap();
        let d = compute_distances(&data, Metric::Euclidean).unwrap();
        for linkage in [Linkage::Single, Linkage::Complete, Linkage::Average] {
            let tree = build_dendrogram(&d, linkage).unwrap();
            assert_eq!(tree.merges().len(), 5);
            for w in tree.heights().windows(2) {
                assert!(w[0] <= w[1], "{linkage:?}: {} > {}", w[0], w[1]);
            }
        }
    }

    #[test]
    fn test_ties_merge_lowest_pair_first() {
        // Equidistant points: every pair is at distance 1.
        let data = ObservationMatrix::from_rows(&[
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ])
        .unwrap();
        let d = compute_distances(&data, Metric::Manhattan).unwrap();
        let tree = build_dendrogram(&d, Linkage::Single).unwrap();
        assert_eq!(tree.merges()[0].left, Node::Leaf(0));
        assert_eq!(tree.merges()[0].right, Node::Leaf(1));
        assert_eq!(tree.merges()[1].right, Node::Leaf(2));
    }

    #[test]
    fn test_leaf_order_and_cut() {
        let tree = build_dendrogram(&line(), Linkage::Complete).unwrap();
        assert_eq!(tree.leaf_order(), vec![0, 1, 2, 3]);
        assert_eq!(tree.cut(1).unwrap(), vec![0, 0, 0, 0]);
        assert_eq!(tree.cut(2).unwrap(), vec![0, 0, 0, 1]);
        assert_eq!(tree.cut(3).unwrap(), vec![0, 0, 1, 2]);
        assert_eq!(tree.cut(4).unwrap(), vec![0, 1, 2, 3]);
        assert!(tree.cut(0).is_err());
        assert!(tree.cut(5).is_err());
    }

    #[test]
    fn test_cut_separates_blobs() {
        let data = ObservationMatrix::from_rows(&[
            vec![10.0, 10.0],
            vec![0.0, 0.0],
            vec![10.2, 9.9],
            vec![0.1, 0.2],
        ])
        .unwrap();
        let d = compute_distances(&data, Metric::Euclidean).unwrap();
        let tree = build_dendrogram(&d, Linkage::Average).unwrap();
        assert_eq!(tree.cut(2).unwrap(), vec![0, 1, 0, 1]);
        assert_eq!(tree.leaf_order().len(), 4);
    }

    #[test]
    fn test_two_observations() {
        let data = ObservationMatrix::from_rows(&[vec![0.0], vec![2.0]]).unwrap();
        let d = compute_distances(&data, Metric::Euclidean).unwrap();
        let tree = build_dendrogram(&d, Linkage::Single).unwrap();
        assert_eq!(tree.heights(), vec![2.0]);
        assert_eq!(tree.n_leaves(), 2);
    }
}
