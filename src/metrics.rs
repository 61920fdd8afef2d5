use itertools::Itertools;

use crate::{math::arithmetic_mean, program::Program, similarity::SimilarityMatrix};

/// Fraction of distinct input samples contributing at least one member
/// program.
pub fn sample_coverage(members: &[usize], programs: &[Program], n_samples_total: usize) -> f64 {
    if n_samples_total == 0 {
        return 0.0;
    }
    let covered = members
        .iter()
        .map(|&m| programs[m].key.sample.as_str())
        .unique()
        .count();
    covered as f64 / n_samples_total as f64
}

/// Average pairwise similarity among the members.
///
/// A singleton cluster scores 1.0, consistent with the unit diagonal.
pub fn mean_pairwise_similarity(members: &[usize], similarity: &SimilarityMatrix) -> f64 {
    if members.len() < 2 {
        return 1.0;
    }
    let pairwise: Vec<f64> = members
        .iter()
        .tuple_combinations::<(_, _)>()
        .map(|(&a, &b)| similarity.get(a, b))
        .collect();
    arithmetic_mean(&pairwise)
}

/// Per-program silhouette scores computed directly on similarities.
///
/// For program `i` in cluster `c`, `a` is the mean similarity to the other
/// members of `c` and `b` is the highest mean similarity to any other
/// cluster; the score is `(a - b) / max(a, b)`. Singleton members,
/// unassigned programs, and partitions with a single cluster score 0.
pub fn silhouette_scores(
    assignments: &[Option<usize>],
    n_clusters: usize,
    similarity: &SimilarityMatrix,
) -> Vec<f64> {
    let n = assignments.len();
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); n_clusters];
    for (i, assignment) in assignments.iter().enumerate() {
        if let Some(c) = assignment {
            members[*c].push(i);
        }
    }

    let mut scores = vec![0.0; n];
    for i in 0..n {
        let own = match assignments[i] {
            Some(c) => c,
            None => continue,
        };
        if members[own].len() < 2 {
            continue;
        }

        let a = mean_similarity_to(i, &members[own], similarity);

        let mut b = f64::NEG_INFINITY;
        for (c, cluster) in members.iter().enumerate() {
            if c == own || cluster.is_empty() {
                continue;
            }
            let mean = mean_similarity_to(i, cluster, similarity);
            if mean > b {
                b = mean;
            }
        }
        if b == f64::NEG_INFINITY {
            continue; // no other cluster to compare against
        }

        let denom = a.max(b);
        scores[i] = if denom == 0.0 { 0.0 } else { (a - b) / denom };
    }
    scores
}

fn mean_similarity_to(i: usize, cluster: &[usize], similarity: &SimilarityMatrix) -> f64 {
    let sims: Vec<f64> = cluster
        .iter()
        .filter(|&&j| j != i)
        .map(|&j| similarity.get(i, j))
        .collect();
    if sims.is_empty() {
        0.0
    } else {
        arithmetic_mean(&sims)
    }
}
