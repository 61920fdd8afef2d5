use std::collections::BTreeMap;

use crate::{
    config::MetaNmfConfig,
    error::{MetaNmfError, Result},
    program::Program,
};

/// Ranked consensus gene list with aggregated (penalty-adjusted) weights.
pub type Signature = Vec<(String, f64)>;

struct GeneStat {
    /// Mean weight across the cluster's members, missing treated as zero.
    mean: f64,
    /// Fraction of members carrying the gene with non-zero weight.
    presence: f64,
}

/// Build one consensus signature per cluster.
///
/// Per-gene weights are aggregated as the mean over member programs, then
/// penalized by the gene's best mean in any other cluster
/// (`w / (1 + specificity_weight * max_other)`), filtered by
/// `min_confidence`, ranked, and truncated at the `weight_explained`
/// cumulative fraction subject to `max_genes`. A cluster whose filtered
/// gene set is empty yields `EmptySignature` so the caller can drop and
/// record it.
pub(crate) fn build_signatures(
    programs: &[Program],
    labels: &[usize],
    n_clusters: usize,
    config: &MetaNmfConfig,
) -> Vec<Result<Signature>> {
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); n_clusters];
    for (i, &label) in labels.iter().enumerate() {
        members[label].push(i);
    }

    let aggregated: Vec<BTreeMap<&str, GeneStat>> = members
        .iter()
        .map(|m| aggregate_cluster(programs, m))
        .collect();

    (0..n_clusters)
        .map(|c| build_one(c, &aggregated, config))
        .collect()
}

fn aggregate_cluster<'a>(programs: &'a [Program], members: &[usize]) -> BTreeMap<&'a str, GeneStat> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for &m in members {
        for (gene, weight) in &programs[m].genes {
            let entry = sums.entry(gene.as_str()).or_insert((0.0, 0));
            entry.0 += weight;
            entry.1 += 1;
        }
    }
    let n = members.len() as f64;
    sums.into_iter()
        .map(|(gene, (sum, count))| {
            (
                gene,
                GeneStat {
                    mean: sum / n,
                    presence: count as f64 / n,
                },
            )
        })
        .collect()
}

fn build_one(
    cluster: usize,
    aggregated: &[BTreeMap<&str, GeneStat>],
    config: &MetaNmfConfig,
) -> Result<Signature> {
    let mut ranked: Vec<(String, f64)> = aggregated[cluster]
        .iter()
        .filter(|(_, stat)| stat.presence >= config.min_confidence)
        .map(|(gene, stat)| {
            let max_other = aggregated
                .iter()
                .enumerate()
                .filter(|(c, _)| *c != cluster)
                .filter_map(|(_, other)| other.get(gene).map(|s| s.mean))
                .fold(0.0, f64::max);
            let penalized = stat.mean / (1.0 + config.specificity_weight * max_other);
            (gene.to_string(), penalized)
        })
        .collect();

    if ranked.is_empty() {
        return Err(MetaNmfError::EmptySignature { cluster });
    }

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let total: f64 = ranked.iter().map(|(_, w)| w).sum();
    let cap = config.max_genes.unwrap_or(ranked.len());
    let mut signature = Vec::new();
    let mut cumulative = 0.0;
    for (gene, weight) in ranked {
        if signature.len() == cap {
            break;
        }
        cumulative += weight;
        signature.push((gene, weight));
        if cumulative / total >= config.weight_explained {
            break;
        }
    }

    Ok(signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::ProgramKey;
    use approx::assert_relative_eq;

    fn program(sample: &str, factor: usize, genes: &[(&str, f64)]) -> Program {
        let mut genes: Vec<(String, f64)> =
            genes.iter().map(|(g, w)| (g.to_string(), *w)).collect();
        genes.sort_by(|a, b| b.1.total_cmp(&a.1));
        Program {
            key: ProgramKey::new(sample.to_string(), genes.len(), factor),
            genes,
            n_cells: 100,
        }
    }

    fn config() -> MetaNmfConfig {
        MetaNmfConfig::builder()
            .n_meta_programs(2)
            .min_confidence(0.0)
            .weight_explained(1.0)
            .build()
    }

    fn names(signature: &Signature) -> Vec<&str> {
        signature.iter().map(|(g, _)| g.as_str()).collect()
    }

    #[test]
    fn test_mean_aggregation_missing_is_zero() {
        let programs = vec![
            program("s1", 0, &[("g1", 4.0), ("g2", 2.0)]),
            program("s2", 0, &[("g1", 2.0)]),
        ];
        let sigs = build_signatures(&programs, &[0, 0], 1, &config());
        let sig = sigs[0].as_ref().unwrap();
        assert_eq!(names(sig), vec!["g1", "g2"]);
        assert_relative_eq!(sig[0].1, 3.0); // (4 + 2) / 2
        assert_relative_eq!(sig[1].1, 1.0); // (2 + 0) / 2
    }

    #[test]
    fn test_weight_explained_boundary() {
        // Ten genes of equal weight: threshold 0.7 keeps exactly seven,
        // and removing the last one falls below the threshold.
        let genes: Vec<(String, f64)> = (0..10).map(|i| (format!("g{i:02}"), 1.0)).collect();
        let refs: Vec<(&str, f64)> = genes.iter().map(|(g, w)| (g.as_str(), *w)).collect();
        let programs = vec![program("s1", 0, &refs)];
        let mut cfg = config();
        cfg.weight_explained = 0.7;

        let sigs = build_signatures(&programs, &[0], 1, &cfg);
        let sig = sigs[0].as_ref().unwrap();
        assert_eq!(sig.len(), 7);
        let kept: f64 = sig.iter().map(|(_, w)| w).sum();
        assert!(kept / 10.0 >= 0.7);
        assert!((kept - sig.last().unwrap().1) / 10.0 < 0.7);
    }

    #[test]
    fn test_max_genes_cap() {
        let genes: Vec<(String, f64)> = (0..10).map(|i| (format!("g{i:02}"), 1.0)).collect();
        let refs: Vec<(&str, f64)> = genes.iter().map(|(g, w)| (g.as_str(), *w)).collect();
        let programs = vec![program("s1", 0, &refs)];
        let mut cfg = config();
        cfg.max_genes = Some(3);

        let sigs = build_signatures(&programs, &[0], 1, &cfg);
        assert_eq!(sigs[0].as_ref().unwrap().len(), 3);
    }

    #[test]
    fn test_confidence_filter_drops_rare_genes() {
        let programs = vec![
            program("s1", 0, &[("g1", 2.0), ("rare", 1.0)]),
            program("s2", 0, &[("g1", 2.0)]),
            program("s3", 0, &[("g1", 2.0)]),
        ];
        let mut cfg = config();
        cfg.min_confidence = 0.5;

        let sigs = build_signatures(&programs, &[0, 0, 0], 1, &cfg);
        assert_eq!(names(sigs[0].as_ref().unwrap()), vec!["g1"]);
    }

    #[test]
    fn test_empty_signature_reported() {
        // Each member carries a private gene, so nothing survives a
        // full-presence requirement.
        let programs = vec![
            program("s1", 0, &[("g1", 1.0)]),
            program("s2", 0, &[("g2", 1.0)]),
        ];
        let mut cfg = config();
        cfg.min_confidence = 1.0;

        let sigs = build_signatures(&programs, &[0, 0], 1, &cfg);
        assert!(matches!(
            sigs[0],
            Err(MetaNmfError::EmptySignature { cluster: 0 })
        ));
    }

    #[test]
    fn test_specificity_penalty_demotes_shared_genes() {
        // "shared" scores high in both clusters; with the penalty on it
        // ranks below each cluster's private gene.
        let programs = vec![
            program("s1", 0, &[("a", 3.0), ("shared", 4.0)]),
            program("s2", 0, &[("b", 3.0), ("shared", 4.0)]),
        ];
        let labels = vec![0, 1];

        let plain = build_signatures(&programs, &labels, 2, &config());
        assert_eq!(names(plain[0].as_ref().unwrap())[0], "shared");

        let mut cfg = config();
        cfg.specificity_weight = 5.0;
        let penalized = build_signatures(&programs, &labels, 2, &cfg);
        let sig = penalized[0].as_ref().unwrap();
        assert_eq!(names(sig)[0], "a");
        // shared: 4 / (1 + 5 * 4)
        let shared = sig.iter().find(|(g, _)| g == "shared").unwrap();
        assert_relative_eq!(shared.1, 4.0 / 21.0);
    }

    #[test]
    fn test_rank_ties_broken_by_gene_id() {
        let programs = vec![program("s1", 0, &[("zz", 1.0), ("aa", 1.0), ("mm", 1.0)])];
        let sigs = build_signatures(&programs, &[0], 1, &config());
        assert_eq!(names(sigs[0].as_ref().unwrap()), vec!["aa", "mm", "zz"]);
    }
}
