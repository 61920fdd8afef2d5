//! MetaNMF: Consensus Meta-Program Extraction Across NMF Runs
//!
//! This library takes the factor matrices produced by many non-negative
//! matrix factorization runs (several biological samples, several choices
//! of rank), clusters the resulting gene programs by similarity, and emits
//! consensus meta-programs: ranked gene signatures with sample coverage
//! and separation diagnostics.
//!
//! The main components of this library are:
//! - `MetaNmf`: the pipeline driver, from factor matrices to meta-programs
//! - `MetaNmfConfig`: metric, linkage, and signature parameters
//! - `SimilarityMatrix`: pairwise program similarities (cosine or Jaccard)
//! - `MetaNmfResults`: meta-programs, raw programs, and clustering output

mod cluster;
mod config;
mod error;
mod math;
mod metanmf;
mod metrics;
mod program;
mod results;
mod signature;
mod similarity;
mod utils;

pub use cluster::{cluster_programs, ClusterResult, MergeStep};
pub use config::{Linkage, MetaNmfConfig, SimilarityMetric};
pub use error::{MetaNmfError, Result};
pub use metanmf::MetaNmf;
pub use program::{extract_programs, FactorMatrix, Program, ProgramKey};
pub use results::{DroppedCluster, MetaNmfResults, MetaProgram};
pub use signature::Signature;
pub use similarity::SimilarityMatrix;
