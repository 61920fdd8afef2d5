use bon::Builder;

use crate::error::{MetaNmfError, Result};

/// Pairwise similarity metric between two gene programs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimilarityMetric {
    /// Cosine similarity of the weight vectors, aligned by gene id with
    /// missing genes treated as zero weight. Range [0, 1] for
    /// non-negative inputs.
    Cosine,
    /// Jaccard index over each program's top-N gene set.
    Jaccard { top_n: usize },
}

/// Linkage rule for agglomerative clustering on distance = 1 - similarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    Single,
    Complete,
    Average,
}

/// Parameters for one consensus meta-program extraction run.
///
/// Built with the derived builder; only `n_meta_programs` is required.
///
/// ```
/// use metanmf::MetaNmfConfig;
///
/// let config = MetaNmfConfig::builder()
///     .n_meta_programs(5)
///     .weight_explained(0.8)
///     .max_genes(100)
///     .build();
/// ```
#[derive(Debug, Clone, Builder)]
pub struct MetaNmfConfig {
    /// Target number of meta-programs; the realized count can be lower if
    /// clusters are dropped for empty signatures.
    pub n_meta_programs: usize,
    #[builder(default = SimilarityMetric::Cosine)]
    pub metric: SimilarityMetric,
    #[builder(default = Linkage::Complete)]
    pub linkage: Linkage,
    /// Similarities below this bound are treated as zero.
    #[builder(default = 0.0)]
    pub similarity_cutoff: f64,
    /// Genes with weight below this bound are ignored during similarity
    /// computation.
    #[builder(default = 0.0)]
    pub min_weight: f64,
    /// Cumulative weight fraction a consensus signature must explain.
    #[builder(default = 0.7)]
    pub weight_explained: f64,
    /// Hard cap on consensus signature length.
    pub max_genes: Option<usize>,
    /// A gene enters a consensus signature only if it has non-zero weight
    /// in at least this fraction of the cluster's member programs.
    #[builder(default = 0.5)]
    pub min_confidence: f64,
    /// Penalty discouraging genes that also score highly in other
    /// clusters; 0 disables the penalty.
    #[builder(default = 0.0)]
    pub specificity_weight: f64,
}

impl MetaNmfConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.n_meta_programs == 0 {
            return Err(MetaNmfError::invalid_input(
                "n_meta_programs must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.similarity_cutoff) {
            return Err(MetaNmfError::invalid_input(format!(
                "similarity_cutoff must be in [0, 1], got {}",
                self.similarity_cutoff
            )));
        }
        if !(self.weight_explained > 0.0 && self.weight_explained <= 1.0) {
            return Err(MetaNmfError::invalid_input(format!(
                "weight_explained must be in (0, 1], got {}",
                self.weight_explained
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(MetaNmfError::invalid_input(format!(
                "min_confidence must be in [0, 1], got {}",
                self.min_confidence
            )));
        }
        if self.specificity_weight < 0.0 {
            return Err(MetaNmfError::invalid_input(format!(
                "specificity_weight must be non-negative, got {}",
                self.specificity_weight
            )));
        }
        if self.min_weight < 0.0 {
            return Err(MetaNmfError::invalid_input(format!(
                "min_weight must be non-negative, got {}",
                self.min_weight
            )));
        }
        if self.max_genes == Some(0) {
            return Err(MetaNmfError::invalid_input("max_genes must be at least 1"));
        }
        if let SimilarityMetric::Jaccard { top_n } = self.metric {
            if top_n == 0 {
                return Err(MetaNmfError::invalid_input(
                    "Jaccard top_n must be at least 1",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MetaNmfConfig::builder().n_meta_programs(4).build();
        assert_eq!(config.metric, SimilarityMetric::Cosine);
        assert_eq!(config.linkage, Linkage::Complete);
        assert_eq!(config.weight_explained, 0.7);
        assert_eq!(config.min_confidence, 0.5);
        assert_eq!(config.specificity_weight, 0.0);
        assert_eq!(config.max_genes, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_target_rejected() {
        let config = MetaNmfConfig::builder().n_meta_programs(0).build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_weight_explained_bounds() {
        let config = MetaNmfConfig::builder()
            .n_meta_programs(2)
            .weight_explained(0.0)
            .build();
        assert!(config.validate().is_err());

        let config = MetaNmfConfig::builder()
            .n_meta_programs(2)
            .weight_explained(1.0)
            .build();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_jaccard_top_n_rejected_when_zero() {
        let config = MetaNmfConfig::builder()
            .n_meta_programs(2)
            .metric(SimilarityMetric::Jaccard { top_n: 0 })
            .build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_genes_zero_rejected() {
        let config = MetaNmfConfig::builder()
            .n_meta_programs(2)
            .max_genes(0)
            .build();
        assert!(config.validate().is_err());
    }
}
