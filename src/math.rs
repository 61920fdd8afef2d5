use std::cmp::Ordering;

/// Dot product of two sparse weight vectors stored as gene-sorted slices.
///
/// Both inputs must be sorted ascending by gene id; genes absent from one
/// side contribute zero.
pub fn sparse_dot(a: &[(&str, f64)], b: &[(&str, f64)]) -> f64 {
    let mut dot = 0.0;
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(b[j].0) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot
}

/// Jaccard index of two gene sets stored as sorted slices.
///
/// Returns 0.0 when both sets are empty.
pub fn jaccard_index(a: &[&str], b: &[&str]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let mut intersection = 0usize;
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                intersection += 1;
                i += 1;
                j += 1;
            }
        }
    }
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

pub fn arithmetic_mean(x: &[f64]) -> f64 {
    x.iter().sum::<f64>() / x.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sparse_dot_aligned() {
        let a = vec![("a", 1.0), ("b", 2.0), ("c", 3.0)];
        let b = vec![("a", 2.0), ("c", 4.0)];
        assert_relative_eq!(sparse_dot(&a, &b), 14.0);
    }

    #[test]
    fn test_sparse_dot_disjoint() {
        let a = vec![("a", 1.0), ("b", 2.0)];
        let b = vec![("c", 2.0), ("d", 4.0)];
        assert_relative_eq!(sparse_dot(&a, &b), 0.0);
    }

    #[test]
    fn test_jaccard_index_partial_overlap() {
        let a = vec!["a", "b", "c"];
        let b = vec!["b", "c", "d"];
        assert_relative_eq!(jaccard_index(&a, &b), 0.5);
    }

    #[test]
    fn test_jaccard_index_identical() {
        let a = vec!["a", "b", "c"];
        assert_relative_eq!(jaccard_index(&a, &a), 1.0);
    }

    #[test]
    fn test_jaccard_index_disjoint() {
        let a = vec!["a", "b"];
        let b = vec!["c", "d"];
        assert_relative_eq!(jaccard_index(&a, &b), 0.0);
    }

    #[test]
    fn test_jaccard_index_both_empty() {
        let a: Vec<&str> = vec![];
        assert_relative_eq!(jaccard_index(&a, &a), 0.0);
    }

    #[test]
    fn test_arithmetic_mean() {
        let x = vec![1., 2., 3.];
        assert_relative_eq!(arithmetic_mean(&x), 2.0);
    }
}
