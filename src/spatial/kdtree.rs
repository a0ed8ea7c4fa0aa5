//! Static k-d tree over three-dimensional color points
//!
//! The tree is built once by recursive median splits along the axis of
//! widest spread and never modified afterwards. Points keep their input
//! positions; the tree only stores a permutation of those positions, so a
//! returned index always refers to the caller's original ordering.

use crate::color::point::ColorPoint;
use crate::io::error::{MosaicError, Result, invalid_parameter};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

const DIMENSIONS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
enum Node {
    /// Range `start..end` of the permutation
    Leaf { start: usize, end: usize },
    /// Left subtree holds coordinates `<= value`, right subtree `>= value`
    Split {
        axis: usize,
        value: f32,
        left: usize,
        right: usize,
    },
}

/// One query result: a position in the build sequence and its distance
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    /// Position of the matched point in the sequence the tree was built from
    pub index: usize,
    /// Euclidean distance from the query point
    pub distance: f32,
}

/// Immutable nearest-neighbour structure over CIELAB points
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KdTree {
    points: Vec<[f32; DIMENSIONS]>,
    order: Vec<usize>,
    nodes: Vec<Node>,
    leaf_size: usize,
}

impl KdTree {
    /// Build a tree over `points`, preserving their order as index positions
    ///
    /// # Errors
    ///
    /// Returns `EmptyIndex` if `points` is empty, or `InvalidParameter`
    /// if `leaf_size` is zero
    pub fn build(points: &[ColorPoint], leaf_size: usize) -> Result<Self> {
        if points.is_empty() {
            return Err(MosaicError::EmptyIndex);
        }
        if leaf_size == 0 {
            return Err(invalid_parameter(
                "leaf_size",
                &leaf_size,
                &"leaves must hold at least one point",
            ));
        }

        let mut tree = Self {
            points: points.iter().map(|point| point.to_array()).collect(),
            order: (0..points.len()).collect(),
            nodes: Vec::with_capacity(2 * points.len() / leaf_size + 1),
            leaf_size,
        };
        tree.build_node(0, points.len());
        Ok(tree)
    }

    /// Number of indexed points
    pub const fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the tree holds no points (never true for a built tree)
    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Maximum number of points stored in one leaf
    pub const fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    /// Total number of nodes, leaves included
    pub const fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Point stored at a build position
    pub fn point(&self, index: usize) -> Option<ColorPoint> {
        self.points.get(index).copied().map(ColorPoint::from)
    }

    /// Structural sanity check used after deserialization
    ///
    /// Verifies the permutation covers every point exactly once, that the
    /// nodes reachable from the root form a tree using every node exactly
    /// once, and that its leaves, visited left to right, tile `0..len`.
    pub fn is_consistent(&self) -> bool {
        let n = self.points.len();
        if self.order.len() != n || self.nodes.is_empty() || self.leaf_size == 0 {
            return false;
        }

        let mut seen = vec![false; n];
        for &position in &self.order {
            match seen.get_mut(position) {
                Some(flag) if !*flag => *flag = true,
                _ => return false,
            }
        }

        let mut visited = vec![false; self.nodes.len()];
        let mut covered = 0;
        let mut pending = vec![0];
        while let Some(id) = pending.pop() {
            match visited.get_mut(id) {
                Some(flag) if !*flag => *flag = true,
                _ => return false,
            }
            match self.nodes.get(id) {
                Some(&Node::Leaf { start, end }) => {
                    if start != covered || end < start || end > n {
                        return false;
                    }
                    covered = end;
                }
                Some(&Node::Split {
                    axis, left, right, ..
                }) => {
                    if axis >= DIMENSIONS {
                        return false;
                    }
                    // Left subtree is walked first
                    pending.push(right);
                    pending.push(left);
                }
                None => return false,
            }
        }

        covered == n && visited.iter().all(|&flag| flag)
    }

    /// Single closest point to `query`
    ///
    /// Ties are broken arbitrarily.
    pub fn nearest(&self, query: &ColorPoint) -> Option<Neighbor> {
        self.nearest_k(query, 1).into_iter().next()
    }

    /// Up to `k` closest points to `query`, by ascending distance
    pub fn nearest_k(&self, query: &ColorPoint, k: usize) -> Vec<Neighbor> {
        if k == 0 || self.nodes.is_empty() {
            return Vec::new();
        }

        let mut heap = NeighborHeap::new(k);
        self.search(0, &query.to_array(), &mut heap);
        heap.into_sorted()
    }

    fn build_node(&mut self, start: usize, end: usize) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { start, end });

        let len = end - start;
        if len <= self.leaf_size {
            return id;
        }

        let (axis, spread) = self.widest_axis(start, end);
        if spread <= 0.0 {
            // Identical points cannot be separated
            return id;
        }

        let half = len / 2;
        let points = &self.points;
        let Some(slice) = self.order.get_mut(start..end) else {
            return id;
        };
        slice.select_nth_unstable_by(half, |&i, &j| {
            coordinate(points, i, axis).total_cmp(&coordinate(points, j, axis))
        });
        let value = slice
            .get(half)
            .map_or(0.0, |&pivot| coordinate(points, pivot, axis));

        let mid = start + half;
        let left = self.build_node(start, mid);
        let right = self.build_node(mid, end);
        if let Some(node) = self.nodes.get_mut(id) {
            *node = Node::Split {
                axis,
                value,
                left,
                right,
            };
        }
        id
    }

    fn widest_axis(&self, start: usize, end: usize) -> (usize, f32) {
        let mut lower = [f32::INFINITY; DIMENSIONS];
        let mut upper = [f32::NEG_INFINITY; DIMENSIONS];
        for &position in self.order.get(start..end).unwrap_or(&[]) {
            if let Some(point) = self.points.get(position) {
                for ((lo, hi), &value) in lower.iter_mut().zip(upper.iter_mut()).zip(point) {
                    *lo = lo.min(value);
                    *hi = hi.max(value);
                }
            }
        }

        lower
            .iter()
            .zip(&upper)
            .map(|(lo, hi)| hi - lo)
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((0, 0.0))
    }

    fn search(&self, node: usize, query: &[f32; DIMENSIONS], heap: &mut NeighborHeap) {
        match self.nodes.get(node) {
            Some(&Node::Leaf { start, end }) => {
                for &position in self.order.get(start..end).unwrap_or(&[]) {
                    if let Some(point) = self.points.get(position) {
                        heap.offer(position, squared_distance(point, query));
                    }
                }
            }
            Some(&Node::Split {
                axis,
                value,
                left,
                right,
            }) => {
                let diff = query.get(axis).copied().unwrap_or(value) - value;
                let (near, far) = if diff < 0.0 {
                    (left, right)
                } else {
                    (right, left)
                };
                self.search(near, query, heap);
                if diff * diff <= heap.bound() {
                    self.search(far, query, heap);
                }
            }
            None => {}
        }
    }
}

fn coordinate(points: &[[f32; DIMENSIONS]], position: usize, axis: usize) -> f32 {
    points
        .get(position)
        .and_then(|point| point.get(axis))
        .copied()
        .unwrap_or(0.0)
}

fn squared_distance(a: &[f32; DIMENSIONS], b: &[f32; DIMENSIONS]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    distance_squared: f32,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_squared
            .total_cmp(&other.distance_squared)
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Bounded max-heap holding the `k` best candidates seen so far
struct NeighborHeap {
    capacity: usize,
    heap: BinaryHeap<Candidate>,
}

impl NeighborHeap {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity + 1),
        }
    }

    // Squared distance a candidate must beat to be admitted
    fn bound(&self) -> f32 {
        if self.heap.len() < self.capacity {
            f32::INFINITY
        } else {
            self.heap
                .peek()
                .map_or(f32::INFINITY, |worst| worst.distance_squared)
        }
    }

    fn offer(&mut self, index: usize, distance_squared: f32) {
        if self.heap.len() < self.capacity {
            self.heap.push(Candidate {
                distance_squared,
                index,
            });
        } else if let Some(mut worst) = self.heap.peek_mut()
            && distance_squared < worst.distance_squared
        {
            *worst = Candidate {
                distance_squared,
                index,
            };
        }
    }

    fn into_sorted(self) -> Vec<Neighbor> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|candidate| Neighbor {
                index: candidate.index,
                distance: candidate.distance_squared.sqrt(),
            })
            .collect()
    }
}
