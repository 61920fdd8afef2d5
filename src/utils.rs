use itertools::Itertools;

use crate::program::Program;

/// Number of distinct biological samples across all programs.
pub fn distinct_sample_count(programs: &[Program]) -> usize {
    programs
        .iter()
        .map(|p| p.key.sample.as_str())
        .unique()
        .count()
}

/// Program indices assigned to the given meta-program.
pub fn indices_with_assignment(assignments: &[Option<usize>], target: usize) -> Vec<usize> {
    assignments
        .iter()
        .enumerate()
        .filter(|(_, a)| **a == Some(target))
        .map(|(i, _)| i)
        .collect()
}
