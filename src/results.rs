use crate::{
    cluster::MergeStep,
    program::{Program, ProgramKey},
    signature::Signature,
    similarity::SimilarityMatrix,
};

/// One consensus cluster of programs with its signature and diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaProgram {
    /// Keys of the member programs.
    pub members: Vec<ProgramKey>,
    /// Ranked consensus gene list with aggregated weights.
    pub signature: Signature,
    /// Fraction of distinct input samples represented among the members.
    pub sample_coverage: f64,
    /// Mean pairwise similarity among the members.
    pub mean_similarity: f64,
    /// Mean member silhouette against the final partition.
    pub silhouette: f64,
}

/// A cluster removed for producing an empty signature after confidence
/// filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedCluster {
    /// Index of the cluster in the original cut.
    pub cluster: usize,
    pub members: Vec<ProgramKey>,
}

/// Full output of one consensus extraction run.
///
/// Besides the meta-programs themselves this keeps the raw program list,
/// the similarity matrix, and the merge history so callers can build
/// dendrograms, heatmaps, or custom filtering on top.
#[derive(Debug, Clone)]
pub struct MetaNmfResults {
    pub programs: Vec<Program>,
    pub similarity: SimilarityMatrix,
    pub merges: Vec<MergeStep>,
    /// Per-program index into `meta_programs`; `None` for members of
    /// dropped clusters.
    pub assignments: Vec<Option<usize>>,
    pub meta_programs: Vec<MetaProgram>,
    pub dropped: Vec<DroppedCluster>,
    /// Distinct samples across all input decompositions.
    pub n_samples: usize,
}

impl MetaNmfResults {
    pub fn pprint(&self) {
        println!("MP\tPrograms\tGenes\tCoverage\tMeanSimilarity\tSilhouette");
        for (i, mp) in self.meta_programs.iter().enumerate() {
            println!(
                "MP{}\t{}\t{}\t{}\t{}\t{}",
                i + 1,
                mp.members.len(),
                mp.signature.len(),
                mp.sample_coverage,
                mp.mean_similarity,
                mp.silhouette
            );
        }
    }
}
