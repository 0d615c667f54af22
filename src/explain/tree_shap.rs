//! Path-dependent TreeSHAP
//!
//! Exact Shapley values for one tree in polynomial time. Each leaf value is
//! shared among the features gating its root path, weighted by the share of
//! training samples (cover) flowing down each branch. Repeated splits on the
//! same feature are merged into one path element.

use crate::classifier::tree::{Node, Tree};

#[derive(Debug, Clone, Copy, Default)]
struct PathElement {
    /// `None` for the synthetic root element
    feature: Option<usize>,
    /// Fraction of cover kept when the feature is unknown
    zero_fraction: f64,
    /// 1.0 if `x` follows this branch, else 0.0
    one_fraction: f64,
    /// Permutation weight
    pweight: f64,
}

fn extend_path(path: &mut [PathElement], depth: usize, zero_fraction: f64, one_fraction: f64, feature: Option<usize>) {
    path[depth] = PathElement {
        feature,
        zero_fraction,
        one_fraction,
        pweight: if depth == 0 { 1.0 } else { 0.0 },
    };
    let scale = (depth + 1) as f64;
    for i in (0..depth).rev() {
        path[i + 1].pweight += one_fraction * path[i].pweight * (i + 1) as f64 / scale;
        path[i].pweight = zero_fraction * path[i].pweight * (depth - i) as f64 / scale;
    }
}

fn unwind_path(path: &mut [PathElement], depth: usize, path_index: usize) {
    let one_fraction = path[path_index].one_fraction;
    let zero_fraction = path[path_index].zero_fraction;
    let scale = (depth + 1) as f64;
    let mut next_one_portion = path[depth].pweight;

    for i in (0..depth).rev() {
        if one_fraction != 0.0 {
            let tmp = path[i].pweight;
            path[i].pweight = next_one_portion * scale / ((i + 1) as f64 * one_fraction);
            next_one_portion = tmp - path[i].pweight * zero_fraction * (depth - i) as f64 / scale;
        } else {
            path[i].pweight = path[i].pweight * scale / (zero_fraction * (depth - i) as f64);
        }
    }

    for i in path_index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
}

/// Total permutation weight of the path with element `path_index` removed.
fn unwound_path_sum(path: &[PathElement], depth: usize, path_index: usize) -> f64 {
    let one_fraction = path[path_index].one_fraction;
    let zero_fraction = path[path_index].zero_fraction;
    let mut next_one_portion = path[depth].pweight;
    let mut total = 0.0;

    if one_fraction != 0.0 {
        for i in (0..depth).rev() {
            let tmp = next_one_portion / ((i + 1) as f64 * one_fraction);
            total += tmp;
            next_one_portion = path[i].pweight - tmp * zero_fraction * (depth - i) as f64;
        }
    } else {
        for i in (0..depth).rev() {
            total += path[i].pweight / (zero_fraction * (depth - i) as f64);
        }
    }
    total * (depth + 1) as f64
}

struct Walker<'a> {
    tree: &'a Tree,
    x: &'a [f64],
    phi: &'a mut [f64],
}

impl Walker<'_> {
    fn recurse(
        &mut self,
        node: usize,
        mut depth: usize,
        parent_path: &[PathElement],
        zero_fraction: f64,
        one_fraction: f64,
        feature: Option<usize>,
    ) {
        let mut path = Vec::with_capacity(depth + 1);
        path.extend_from_slice(&parent_path[..depth]);
        path.push(PathElement::default());
        extend_path(&mut path, depth, zero_fraction, one_fraction, feature);

        let tree = self.tree;
        match &tree.nodes[node] {
            Node::Leaf { value, .. } => {
                for i in 1..=depth {
                    let weight = unwound_path_sum(&path, depth, i);
                    let el = path[i];
                    if let Some(f) = el.feature {
                        self.phi[f] += weight * (el.one_fraction - el.zero_fraction) * value;
                    }
                }
            }
            Node::Split { feature: split, threshold, default_left, left, right, cover } => {
                let (hot, cold) = if Tree::route(*threshold, *default_left, self.x[*split]) {
                    (*left, *right)
                } else {
                    (*right, *left)
                };
                let hot_zero_fraction = tree.nodes[hot].cover() / cover;
                let cold_zero_fraction = tree.nodes[cold].cover() / cover;
                let mut incoming_zero = 1.0;
                let mut incoming_one = 1.0;

                // Undo an earlier split on the same feature so it can be redone here.
                if let Some(path_index) = (0..=depth).find(|&i| path[i].feature == Some(*split)) {
                    incoming_zero = path[path_index].zero_fraction;
                    incoming_one = path[path_index].one_fraction;
                    unwind_path(&mut path, depth, path_index);
                    depth -= 1;
                }

                self.recurse(hot, depth + 1, &path, hot_zero_fraction * incoming_zero, incoming_one, Some(*split));
                self.recurse(cold, depth + 1, &path, cold_zero_fraction * incoming_zero, 0.0, Some(*split));
            }
        }
    }
}

/// Add the Shapley values of `tree` at `x` into `phi` (margin space).
/// The values sum to `tree.predict(x) - tree.expected_value()`.
pub fn accumulate(tree: &Tree, x: &[f64], phi: &mut [f64]) {
    let mut walker = Walker { tree, x, phi };
    walker.recurse(0, 0, &[], 1.0, 1.0, None);
}
