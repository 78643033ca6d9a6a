//! CART decision trees used as forest members.
//!
//! Splits are axis-aligned thresholds chosen among `mtry` randomly sampled
//! features. Regression trees minimize the children's summed squared error;
//! classification trees minimize the size-weighted Gini impurity.

use nalgebra::DMatrix;
use rand::Rng;
use rand::seq::index::sample;

/// Impurity measure used when choosing splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    Variance,
    Gini { n_classes: usize },
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    /// Features considered at each split.
    pub mtry: usize,
    /// Minimum number of rows on each side of a split.
    pub min_node_size: usize,
    /// Cap on terminal nodes (unbounded when `None`).
    pub max_leaf_nodes: Option<usize>,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

struct SplitChoice {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

struct Grower<'a, R: Rng> {
    x: &'a DMatrix<f64>,
    y: &'a [f64],
    criterion: Criterion,
    params: TreeParams,
    rng: &'a mut R,
    nodes: Vec<Node>,
    leaves: usize,
}

impl Tree {
    /// Grow a tree on the rows listed in `rows` (duplicates allowed, as in a bootstrap).
    pub fn grow<R: Rng>(
        x: &DMatrix<f64>,
        y: &[f64],
        rows: Vec<usize>,
        criterion: Criterion,
        params: TreeParams,
        rng: &mut R,
    ) -> Tree {
        let mut grower = Grower {
            x,
            y,
            criterion,
            params,
            rng,
            nodes: Vec::new(),
            leaves: 1,
        };
        grower.grow_node(rows);
        Tree {
            nodes: grower.nodes,
        }
    }

    /// Predict a single row.
    pub fn predict_row(&self, x: &DMatrix<f64>, row: usize) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[(row, *feature)] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }
}

impl<R: Rng> Grower<'_, R> {
    fn grow_node(&mut self, rows: Vec<usize>) -> usize {
        let idx = self.nodes.len();
        let value = leaf_value(self.criterion, self.y, &rows);
        self.nodes.push(Node::Leaf { value });

        let can_split = rows.len() >= 2 * self.params.min_node_size.max(1)
            && self.params.max_leaf_nodes.is_none_or(|max| self.leaves < max);
        if !can_split {
            return idx;
        }

        let parent = impurity(self.criterion, self.y, &rows);
        if parent <= 1e-12 {
            return idx;
        }

        let Some(choice) = self.best_split(&rows) else {
            return idx;
        };
        if choice.impurity >= parent - 1e-12 {
            return idx;
        }

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&r| self.x[(r, choice.feature)] <= choice.threshold);

        self.leaves += 1;
        let left = self.grow_node(left_rows);
        let right = self.grow_node(right_rows);
        self.nodes[idx] = Node::Split {
            feature: choice.feature,
            threshold: choice.threshold,
            left,
            right,
        };
        idx
    }

    fn best_split(&mut self, rows: &[usize]) -> Option<SplitChoice> {
        let p = self.x.ncols();
        let mtry = self.params.mtry.clamp(1, p);
        let features = sample(&mut *self.rng, p, mtry);

        let mut best: Option<SplitChoice> = None;
        for feature in features.iter() {
            let Some(choice) = self.best_split_on(rows, feature) else {
                continue;
            };
            if best.as_ref().is_none_or(|b| choice.impurity < b.impurity) {
                best = Some(choice);
            }
        }
        best
    }

    fn best_split_on(&self, rows: &[usize], feature: usize) -> Option<SplitChoice> {
        let mut sorted: Vec<(f64, f64)> = rows
            .iter()
            .map(|&r| (self.x[(r, feature)], self.y[r]))
            .collect();
        sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let n = sorted.len();
        let min_side = self.params.min_node_size.max(1);
        let mut acc = SweepAcc::new(self.criterion, &sorted);
        let mut best: Option<SplitChoice> = None;

        for i in 0..n - 1 {
            acc.move_left(sorted[i].1);
            let n_left = i + 1;
            if n_left < min_side || n - n_left < min_side {
                continue;
            }
            // Only split between distinct values.
            if sorted[i].0 >= sorted[i + 1].0 {
                continue;
            }
            let impurity = acc.children_impurity();
            if best.as_ref().is_none_or(|b| impurity < b.impurity) {
                best = Some(SplitChoice {
                    feature,
                    threshold: 0.5 * (sorted[i].0 + sorted[i + 1].0),
                    impurity,
                });
            }
        }
        best
    }
}

/// Running left/right sufficient statistics for a sorted sweep.
enum SweepAcc {
    Variance {
        n_left: f64,
        sum_left: f64,
        sq_left: f64,
        n_total: f64,
        sum_total: f64,
        sq_total: f64,
    },
    Gini {
        left: Vec<f64>,
        total: Vec<f64>,
    },
}

impl SweepAcc {
    fn new(criterion: Criterion, sorted: &[(f64, f64)]) -> Self {
        match criterion {
            Criterion::Variance => {
                let sum_total = sorted.iter().map(|(_, y)| y).sum();
                let sq_total = sorted.iter().map(|(_, y)| y * y).sum();
                SweepAcc::Variance {
                    n_left: 0.0,
                    sum_left: 0.0,
                    sq_left: 0.0,
                    n_total: sorted.len() as f64,
                    sum_total,
                    sq_total,
                }
            }
            Criterion::Gini { n_classes } => {
                let mut total = vec![0.0; n_classes];
                for (_, y) in sorted {
                    if let Some(c) = total.get_mut(*y as usize) {
                        *c += 1.0;
                    }
                }
                SweepAcc::Gini {
                    left: vec![0.0; n_classes],
                    total,
                }
            }
        }
    }

    fn move_left(&mut self, y: f64) {
        match self {
            SweepAcc::Variance {
                n_left,
                sum_left,
                sq_left,
                ..
            } => {
                *n_left += 1.0;
                *sum_left += y;
                *sq_left += y * y;
            }
            SweepAcc::Gini { left, .. } => {
                if let Some(c) = left.get_mut(y as usize) {
                    *c += 1.0;
                }
            }
        }
    }

    fn children_impurity(&self) -> f64 {
        match self {
            SweepAcc::Variance {
                n_left,
                sum_left,
                sq_left,
                n_total,
                sum_total,
                sq_total,
            } => {
                let n_right = n_total - n_left;
                let sum_right = sum_total - sum_left;
                let sq_right = sq_total - sq_left;
                (sq_left - sum_left * sum_left / n_left) + (sq_right - sum_right * sum_right / n_right)
            }
            SweepAcc::Gini { left, total } => {
                let right: Vec<f64> = total.iter().zip(left).map(|(t, l)| t - l).collect();
                weighted_gini(left) + weighted_gini(&right)
            }
        }
    }
}

/// `n * gini(counts)`; summing this over children gives the size-weighted impurity.
fn weighted_gini(counts: &[f64]) -> f64 {
    let n: f64 = counts.iter().sum();
    if n <= 0.0 {
        return 0.0;
    }
    let sum_sq: f64 = counts.iter().map(|c| c * c).sum();
    n - sum_sq / n
}

fn impurity(criterion: Criterion, y: &[f64], rows: &[usize]) -> f64 {
    match criterion {
        Criterion::Variance => {
            let n = rows.len() as f64;
            let sum: f64 = rows.iter().map(|&r| y[r]).sum();
            let sq: f64 = rows.iter().map(|&r| y[r] * y[r]).sum();
            sq - sum * sum / n
        }
        Criterion::Gini { n_classes } => weighted_gini(&class_counts(n_classes, y, rows)),
    }
}

fn leaf_value(criterion: Criterion, y: &[f64], rows: &[usize]) -> f64 {
    match criterion {
        Criterion::Variance => rows.iter().map(|&r| y[r]).sum::<f64>() / rows.len().max(1) as f64,
        Criterion::Gini { n_classes } => {
            let counts = class_counts(n_classes, y, rows);
            majority(&counts) as f64
        }
    }
}

fn class_counts(n_classes: usize, y: &[f64], rows: &[usize]) -> Vec<f64> {
    let mut counts = vec![0.0; n_classes];
    for &r in rows {
        if let Some(c) = counts.get_mut(y[r] as usize) {
            *c += 1.0;
        }
    }
    counts
}

/// Index of the largest count; ties go to the lowest index.
pub(crate) fn majority(counts: &[f64]) -> usize {
    let mut best = 0;
    for (i, &c) in counts.iter().enumerate() {
        if c > counts[best] {
            best = i;
        }
    }
    best
}
