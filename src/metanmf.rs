use rayon::prelude::*;

use crate::{
    cluster::cluster_programs,
    config::MetaNmfConfig,
    error::{MetaNmfError, Result},
    math::arithmetic_mean,
    metrics::{mean_pairwise_similarity, sample_coverage, silhouette_scores},
    program::{extract_programs, FactorMatrix, Program},
    results::{DroppedCluster, MetaNmfResults, MetaProgram},
    signature::{build_signatures, Signature},
    similarity::SimilarityMatrix,
    utils::{distinct_sample_count, indices_with_assignment},
};

/// Consensus meta-program extraction across NMF runs.
///
/// Borrows the externally produced factor matrices and owns one
/// configuration; [`MetaNmf::run`] executes the whole pipeline.
pub struct MetaNmf<'a> {
    factors: &'a [FactorMatrix],
    config: MetaNmfConfig,
}

impl<'a> MetaNmf<'a> {
    pub fn new(factors: &'a [FactorMatrix], config: MetaNmfConfig) -> Self {
        Self { factors, config }
    }

    /// Run the pipeline end to end.
    ///
    /// The stages are strictly linear with no retries:
    /// 1. Extract one program per factor column (parallel per run)
    /// 2. Compute the pairwise similarity matrix
    /// 3. Cluster programs and cut to the target meta-program count
    /// 4. Build consensus signatures, dropping empty clusters
    /// 5. Compute per-meta-program diagnostics
    ///
    /// Deterministic for fixed inputs and parameters: re-running yields
    /// identical partitions, signatures, and metrics.
    pub fn run(&self) -> Result<MetaNmfResults> {
        self.config.validate()?;
        if self.factors.is_empty() {
            return Err(MetaNmfError::invalid_input("no factor matrices supplied"));
        }

        let programs: Vec<Program> = self
            .factors
            .par_iter()
            .map(extract_programs)
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect();
        let n_samples = distinct_sample_count(&programs);

        if self.config.n_meta_programs > programs.len() {
            return Err(MetaNmfError::degenerate(format!(
                "requested {} meta-programs from {} programs",
                self.config.n_meta_programs,
                programs.len()
            )));
        }

        let similarity = SimilarityMatrix::from_programs(
            &programs,
            self.config.metric,
            self.config.similarity_cutoff,
            self.config.min_weight,
        )?;

        let clustering =
            cluster_programs(&similarity, self.config.n_meta_programs, self.config.linkage)?;

        let signatures =
            build_signatures(&programs, &clustering.labels, clustering.n_clusters, &self.config);

        // Drop clusters with empty signatures and relabel the survivors.
        let mut remap: Vec<Option<usize>> = Vec::with_capacity(clustering.n_clusters);
        let mut kept: Vec<Signature> = Vec::new();
        let mut dropped = Vec::new();
        for (cluster, signature) in signatures.into_iter().enumerate() {
            match signature {
                Ok(signature) => {
                    remap.push(Some(kept.len()));
                    kept.push(signature);
                }
                Err(MetaNmfError::EmptySignature { .. }) => {
                    remap.push(None);
                    let members = clustering
                        .labels
                        .iter()
                        .enumerate()
                        .filter(|(_, &label)| label == cluster)
                        .map(|(i, _)| programs[i].key.clone())
                        .collect();
                    dropped.push(DroppedCluster { cluster, members });
                }
                Err(other) => return Err(other),
            }
        }

        let assignments: Vec<Option<usize>> =
            clustering.labels.iter().map(|&label| remap[label]).collect();
        let silhouettes = silhouette_scores(&assignments, kept.len(), &similarity);

        let meta_programs = kept
            .into_iter()
            .enumerate()
            .map(|(mp, signature)| {
                let members = indices_with_assignment(&assignments, mp);
                let member_silhouettes: Vec<f64> =
                    members.iter().map(|&i| silhouettes[i]).collect();
                MetaProgram {
                    members: members.iter().map(|&i| programs[i].key.clone()).collect(),
                    signature,
                    sample_coverage: sample_coverage(&members, &programs, n_samples),
                    mean_similarity: mean_pairwise_similarity(&members, &similarity),
                    silhouette: arithmetic_mean(&member_silhouettes),
                }
            })
            .collect();

        Ok(MetaNmfResults {
            programs,
            similarity,
            merges: clustering.merges,
            assignments,
            meta_programs,
            dropped,
            n_samples,
        })
    }
}
