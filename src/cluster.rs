use crate::{
    config::Linkage,
    error::{MetaNmfError, Result},
    similarity::SimilarityMatrix,
};

/// One agglomeration step of the dendrogram.
///
/// `cluster_b` is merged into `cluster_a`; both are identified by the
/// original program index representing the cluster at merge time.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeStep {
    pub cluster_a: usize,
    pub cluster_b: usize,
    /// Merge height on the distance scale (1 - similarity).
    pub height: f64,
    /// Size of the merged cluster.
    pub size: usize,
}

/// Hard partition of programs plus the full merge history.
#[derive(Debug, Clone)]
pub struct ClusterResult {
    /// Cluster label per program, in `0..n_clusters`.
    pub labels: Vec<usize>,
    pub n_clusters: usize,
    /// All `n - 1` merges, in agglomeration order.
    pub merges: Vec<MergeStep>,
}

/// Agglomerative clustering of programs cut into exactly `n_clusters`
/// groups.
///
/// Runs the nearest-neighbor-chain algorithm with Lance-Williams distance
/// updates on distance = 1 - similarity, builds the full dendrogram, then
/// cuts it at the height yielding the requested cluster count. All three
/// supported linkages are reducible, so the chain invariant holds and the
/// recorded heights are monotone along tree paths.
pub fn cluster_programs(
    similarity: &SimilarityMatrix,
    n_clusters: usize,
    linkage: Linkage,
) -> Result<ClusterResult> {
    let n = similarity.n();
    if n_clusters == 0 {
        return Err(MetaNmfError::degenerate("requested zero clusters"));
    }
    if n_clusters > n {
        return Err(MetaNmfError::degenerate(format!(
            "requested {n_clusters} clusters from {n} programs"
        )));
    }
    if !similarity.has_structure() {
        return Err(MetaNmfError::degenerate(
            "similarity matrix is all-zero, nothing to cluster",
        ));
    }

    let merges = build_dendrogram(similarity, linkage);
    let labels = cut_dendrogram(&merges, n, n_clusters);

    Ok(ClusterResult {
        labels,
        n_clusters,
        merges,
    })
}

fn build_dendrogram(similarity: &SimilarityMatrix, linkage: Linkage) -> Vec<MergeStep> {
    let n = similarity.n();
    let mut dist = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = 1.0 - similarity.get(i, j);
            dist[i][j] = d;
            dist[j][i] = d;
        }
    }

    let mut size = vec![1usize; n];
    let mut active = vec![true; n];
    let mut n_active = n;
    let mut merges = Vec::with_capacity(n.saturating_sub(1));
    let mut chain: Vec<usize> = Vec::new();

    while n_active > 1 {
        if chain.is_empty() {
            // Restart from the lowest-index active cluster.
            let start = (0..n).find(|&i| active[i]);
            match start {
                Some(start) => chain.push(start),
                None => break,
            }
        }

        loop {
            let current = match chain.last() {
                Some(&c) => c,
                None => break,
            };
            let prev = chain.len().checked_sub(2).map(|i| chain[i]);

            // Nearest active neighbor; ties prefer the previous chain
            // element so reciprocal pairs are detected, then the lowest
            // index for determinism.
            let mut nearest = usize::MAX;
            let mut nearest_d = f64::INFINITY;
            for j in 0..n {
                if !active[j] || j == current {
                    continue;
                }
                let d = dist[current][j];
                if d < nearest_d || (d == nearest_d && Some(j) == prev) {
                    nearest_d = d;
                    nearest = j;
                }
            }

            if Some(nearest) != prev {
                chain.push(nearest);
                continue;
            }

            // Reciprocal nearest neighbors: merge `current` and `nearest`.
            chain.pop();
            chain.pop();
            let (a, b) = if current < nearest {
                (current, nearest)
            } else {
                (nearest, current)
            };

            let size_a = size[a] as f64;
            let size_b = size[b] as f64;
            for j in 0..n {
                if !active[j] || j == a || j == b {
                    continue;
                }
                let d_aj = dist[a][j];
                let d_bj = dist[b][j];
                let updated = match linkage {
                    Linkage::Single => d_aj.min(d_bj),
                    Linkage::Complete => d_aj.max(d_bj),
                    Linkage::Average => (size_a * d_aj + size_b * d_bj) / (size_a + size_b),
                };
                dist[a][j] = updated;
                dist[j][a] = updated;
            }

            active[b] = false;
            size[a] += size[b];
            n_active -= 1;
            merges.push(MergeStep {
                cluster_a: a,
                cluster_b: b,
                height: nearest_d,
                size: size[a],
            });
            break;
        }
    }

    merges
}

/// Apply the `n - n_clusters` lowest merges and label the resulting
/// components by first appearance in program order.
fn cut_dendrogram(merges: &[MergeStep], n: usize, n_clusters: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..merges.len()).collect();
    order.sort_by(|&x, &y| merges[x].height.total_cmp(&merges[y].height).then(x.cmp(&y)));

    let mut parent: Vec<usize> = (0..n).collect();
    for &m in order.iter().take(n - n_clusters) {
        let ra = find(&mut parent, merges[m].cluster_a);
        let rb = find(&mut parent, merges[m].cluster_b);
        parent[rb.max(ra)] = rb.min(ra);
    }

    let mut labels = vec![usize::MAX; n];
    let mut next_label = 0;
    for i in 0..n {
        let root = find(&mut parent, i);
        if labels[root] == usize::MAX {
            labels[root] = next_label;
            next_label += 1;
        }
        labels[i] = labels[root];
    }
    labels
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}
