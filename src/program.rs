use derive_new::new;

use crate::error::{MetaNmfError, Result};

/// Identity of one factor within one decomposition run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, new)]
pub struct ProgramKey {
    /// Biological sample the decomposition was run on.
    pub sample: String,
    /// Factorization rank k of the run.
    pub rank: usize,
    /// Zero-based column index of the factor within the loading matrix.
    pub factor: usize,
}

/// One gene program: a single factor from one NMF run, represented as a
/// ranked gene-weight list.
///
/// The gene list holds every gene with non-zero loading, sorted descending
/// by weight with ties preserving input order. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub key: ProgramKey,
    pub genes: Vec<(String, f64)>,
    /// Number of cells the decomposition observed, carried through as
    /// metadata for downstream reporting.
    pub n_cells: usize,
}

impl Program {
    /// Gene identifiers of the `n` highest-weighted genes.
    pub fn top_genes(&self, n: usize) -> Vec<&str> {
        self.genes
            .iter()
            .take(n)
            .map(|(gene, _)| gene.as_str())
            .collect()
    }
}

/// One non-negative gene x factor loading matrix produced by an external
/// NMF run on a single (sample, rank) pair.
///
/// `columns` holds one weight vector per factor, each aligned with `genes`.
#[derive(Debug, Clone, new)]
pub struct FactorMatrix {
    pub sample: String,
    pub rank: usize,
    pub genes: Vec<String>,
    pub columns: Vec<Vec<f64>>,
    pub n_cells: usize,
}

/// Turn one factor matrix into one [`Program`] per column.
///
/// Rejects matrices with no columns, column/gene length mismatches,
/// negative or non-finite loadings, and all-zero columns (a zero-norm
/// program is undefined under cosine similarity).
pub fn extract_programs(matrix: &FactorMatrix) -> Result<Vec<Program>> {
    if matrix.columns.is_empty() {
        return Err(MetaNmfError::invalid_input(format!(
            "factor matrix for sample {} (k={}) has zero columns",
            matrix.sample, matrix.rank
        )));
    }

    let mut programs = Vec::with_capacity(matrix.columns.len());
    for (factor, column) in matrix.columns.iter().enumerate() {
        if column.len() != matrix.genes.len() {
            return Err(MetaNmfError::invalid_input(format!(
                "factor {} of sample {} (k={}) has {} loadings for {} genes",
                factor,
                matrix.sample,
                matrix.rank,
                column.len(),
                matrix.genes.len()
            )));
        }

        let mut genes = Vec::new();
        for (gene, &weight) in matrix.genes.iter().zip(column) {
            if !weight.is_finite() || weight < 0.0 {
                return Err(MetaNmfError::invalid_input(format!(
                    "gene {gene} in factor {} of sample {} (k={}) has loading {weight}",
                    factor, matrix.sample, matrix.rank
                )));
            }
            if weight > 0.0 {
                genes.push((gene.clone(), weight));
            }
        }
        if genes.is_empty() {
            return Err(MetaNmfError::invalid_input(format!(
                "factor {} of sample {} (k={}) has all-zero loadings",
                factor, matrix.sample, matrix.rank
            )));
        }

        // Stable sort keeps input order on ties.
        genes.sort_by(|a, b| b.1.total_cmp(&a.1));

        programs.push(Program {
            key: ProgramKey::new(matrix.sample.clone(), matrix.rank, factor),
            genes,
            n_cells: matrix.n_cells,
        });
    }

    Ok(programs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gene_names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("g{i}")).collect()
    }

    #[test]
    fn test_extract_sorted_descending() {
        let matrix = FactorMatrix::new(
            "s1".to_string(),
            2,
            gene_names(4),
            vec![vec![0.5, 2.0, 1.0, 0.0], vec![1.0, 1.0, 1.0, 1.0]],
            100,
        );
        let programs = extract_programs(&matrix).unwrap();
        assert_eq!(programs.len(), 2);

        let first = &programs[0];
        assert_eq!(first.key, ProgramKey::new("s1".to_string(), 2, 0));
        assert_eq!(first.genes.len(), 3); // zero-weight gene dropped
        for pair in first.genes.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
        assert_eq!(first.genes[0].0, "g1");
    }

    #[test]
    fn test_ties_preserve_input_order() {
        let matrix = FactorMatrix::new(
            "s1".to_string(),
            1,
            gene_names(3),
            vec![vec![1.0, 1.0, 1.0]],
            10,
        );
        let programs = extract_programs(&matrix).unwrap();
        let names: Vec<&str> = programs[0].genes.iter().map(|(g, _)| g.as_str()).collect();
        assert_eq!(names, vec!["g0", "g1", "g2"]);
    }

    #[test]
    fn test_negative_loading_rejected() {
        let matrix = FactorMatrix::new(
            "s1".to_string(),
            1,
            gene_names(2),
            vec![vec![1.0, -0.5]],
            10,
        );
        let err = extract_programs(&matrix).unwrap_err();
        assert!(matches!(err, MetaNmfError::InvalidInput { .. }));
    }

    #[test]
    fn test_zero_columns_rejected() {
        let matrix = FactorMatrix::new("s1".to_string(), 1, gene_names(2), vec![], 10);
        assert!(extract_programs(&matrix).is_err());
    }

    #[test]
    fn test_all_zero_column_rejected() {
        let matrix = FactorMatrix::new(
            "s1".to_string(),
            2,
            gene_names(2),
            vec![vec![1.0, 1.0], vec![0.0, 0.0]],
            10,
        );
        let err = extract_programs(&matrix).unwrap_err();
        assert!(matches!(err, MetaNmfError::InvalidInput { .. }));
    }

    #[test]
    fn test_column_length_mismatch_rejected() {
        let matrix = FactorMatrix::new("s1".to_string(), 1, gene_names(3), vec![vec![1.0]], 10);
        assert!(extract_programs(&matrix).is_err());
    }

    #[test]
    fn test_top_genes() {
        let matrix = FactorMatrix::new(
            "s1".to_string(),
            1,
            gene_names(4),
            vec![vec![0.1, 4.0, 2.0, 3.0]],
            10,
        );
        let programs = extract_programs(&matrix).unwrap();
        assert_eq!(programs[0].top_genes(2), vec!["g1", "g3"]);
    }
}
