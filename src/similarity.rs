use rayon::prelude::*;

use crate::{
    config::SimilarityMetric,
    error::{MetaNmfError, Result},
    math::{jaccard_index, sparse_dot},
    program::Program,
};

/// Symmetric program-by-program similarity matrix stored in condensed
/// upper-triangle form.
///
/// For `n` programs the condensed vector has `n * (n - 1) / 2` entries.
/// The diagonal is 1 by convention and is not stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    condensed: Vec<f64>,
    n: usize,
}

/// Per-program view prepared once before the pairwise sweep: gene-sorted
/// filtered weights, their norm, and the sorted top-N gene set.
struct ProgramView<'a> {
    weights: Vec<(&'a str, f64)>,
    norm: f64,
    top: Vec<&'a str>,
}

impl<'a> ProgramView<'a> {
    fn build(program: &'a Program, metric: SimilarityMetric, min_weight: f64) -> Self {
        let mut weights: Vec<(&str, f64)> = program
            .genes
            .iter()
            .filter(|(_, w)| *w >= min_weight)
            .map(|(g, w)| (g.as_str(), *w))
            .collect();

        let top = match metric {
            SimilarityMetric::Cosine => Vec::new(),
            SimilarityMetric::Jaccard { top_n } => {
                // `weights` is still in program order here, i.e. sorted
                // descending by weight.
                let mut top: Vec<&str> =
                    weights.iter().take(top_n).map(|(g, _)| *g).collect();
                top.sort_unstable();
                top
            }
        };

        weights.sort_by(|a, b| a.0.cmp(b.0));
        let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();

        Self { weights, norm, top }
    }
}

fn pair_similarity(a: &ProgramView, b: &ProgramView, metric: SimilarityMetric) -> f64 {
    match metric {
        SimilarityMetric::Cosine => {
            if a.norm == 0.0 || b.norm == 0.0 {
                return 0.0;
            }
            // Clamp to absorb floating-point drift; non-negative inputs
            // keep the true value in [0, 1].
            (sparse_dot(&a.weights, &b.weights) / (a.norm * b.norm)).clamp(0.0, 1.0)
        }
        SimilarityMetric::Jaccard { .. } => jaccard_index(&a.top, &b.top),
    }
}

impl SimilarityMatrix {
    /// Compute all pairwise similarities between the given programs.
    ///
    /// Genes below `min_weight` are excluded from each program before
    /// comparison; similarities below `cutoff` are zeroed. Rows are
    /// computed in parallel and merged in index order, so the result is
    /// deterministic for fixed inputs.
    pub fn from_programs(
        programs: &[Program],
        metric: SimilarityMetric,
        cutoff: f64,
        min_weight: f64,
    ) -> Result<Self> {
        let n = programs.len();
        if n == 0 {
            return Err(MetaNmfError::invalid_input(
                "cannot build a similarity matrix from zero programs",
            ));
        }

        let views: Vec<ProgramView> = programs
            .iter()
            .map(|p| ProgramView::build(p, metric, min_weight))
            .collect();

        let condensed: Vec<f64> = (0..n)
            .into_par_iter()
            .map(|i| {
                ((i + 1)..n)
                    .map(|j| {
                        let sim = pair_similarity(&views[i], &views[j], metric);
                        if sim < cutoff {
                            0.0
                        } else {
                            sim
                        }
                    })
                    .collect::<Vec<f64>>()
            })
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();

        Ok(Self { condensed, n })
    }

    /// Create from a precomputed condensed similarity vector.
    pub fn from_condensed(condensed: Vec<f64>, n: usize) -> Result<Self> {
        let expected = n * n.saturating_sub(1) / 2;
        if condensed.len() != expected {
            return Err(MetaNmfError::invalid_input(format!(
                "condensed length {} does not match n={} (expected {})",
                condensed.len(),
                n,
                expected
            )));
        }
        if condensed.iter().any(|s| !s.is_finite() || !(0.0..=1.0).contains(s)) {
            return Err(MetaNmfError::invalid_input(
                "similarities must be finite values in [0, 1]",
            ));
        }
        Ok(Self { condensed, n })
    }

    /// Similarity between programs `i` and `j`; 1.0 when `i == j`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i == j {
            return 1.0;
        }
        let (a, b) = if i < j { (i, j) } else { (j, i) };
        self.condensed[self.index(a, b)]
    }

    /// Number of programs.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Raw condensed upper-triangle storage.
    pub fn condensed(&self) -> &[f64] {
        &self.condensed
    }

    /// True if any off-diagonal similarity is positive.
    pub(crate) fn has_structure(&self) -> bool {
        self.condensed.is_empty() || self.condensed.iter().any(|&s| s > 0.0)
    }

    /// Map (i, j) with i < j to the condensed index.
    fn index(&self, i: usize, j: usize) -> usize {
        i * self.n - i * (i + 1) / 2 + (j - i - 1)
    }
}
