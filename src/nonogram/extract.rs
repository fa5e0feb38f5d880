//! Reading grids back out of solved models.

use crate::nonogram::compiler::CompiledInstance;
use crate::nonogram::puzzle::{Dim, Grid};

/// Whether some run of line `line` in `dim` covers offset `cell` under
/// `values`, indexed by variable.
///
/// # Panics
/// If `values` is shorter than the instance's variable count.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn covers(instance: &CompiledInstance, dim: Dim, line: usize, cell: usize, values: &[i32]) -> bool {
    let offset = cell as i32;
    instance.line_vars(dim, line).any(|var| {
        let run = instance.extents()[var.index()].run;
        let pos = values[var.index()];
        pos <= offset && offset < pos + run
    })
}

/// The grid described by a solved assignment.
///
/// Only row coverage is consulted; the coverage equivalences make the columns
/// agree with it in every solution.
#[must_use]
pub fn extract(instance: &CompiledInstance, values: &[i32]) -> Grid {
    let mut grid = Grid::new(instance.height(), instance.width());
    for row in 0..instance.height() {
        for col in 0..instance.width() {
            if covers(instance, Dim::Row, row, col, values) {
                grid.set(row, col, true);
            }
        }
    }
    grid
}

/// Checks that row and column coverage agree on every cell.
#[must_use]
pub fn is_consistent(instance: &CompiledInstance, values: &[i32]) -> bool {
    (0..instance.height()).all(|row| {
        (0..instance.width()).all(|col| {
            covers(instance, Dim::Row, row, col, values) == covers(instance, Dim::Col, col, row, values)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nonogram::compiler::compile;
    use crate::nonogram::puzzle::Puzzle;

    #[test]
    fn test_extract_assignment() {
        // ##.#
        // .#..
        let puzzle = Puzzle::new(
            vec![vec![2, 1], vec![1]],
            vec![vec![1], vec![2], vec![], vec![1]],
        );
        let instance = compile(&puzzle).unwrap();
        let values = [0, 3, 1, 0, 0, 0];

        let grid = extract(&instance, &values);
        assert_eq!(
            grid.to_rows(),
            vec![vec![true, true, false, true], vec![false, true, false, false]]
        );
        assert!(is_consistent(&instance, &values));
        assert!(instance.constraints().iter().all(|c| c.holds(&values)));
    }

    #[test]
    fn test_inconsistent_assignment() {
        let puzzle = Puzzle::new(vec![vec![1], vec![1]], vec![vec![1], vec![1]]);
        let instance = compile(&puzzle).unwrap();
        // Both rows fill column 0, both columns fill row 0.
        let values = [0, 0, 0, 0];

        assert!(!is_consistent(&instance, &values));
        assert!(covers(&instance, Dim::Col, 1, 0, &values));
        assert!(!covers(&instance, Dim::Row, 0, 1, &values));
    }

    #[test]
    fn test_extract_empty_puzzle() {
        let instance = compile(&Puzzle::new(vec![vec![], vec![]], vec![vec![]])).unwrap();
        assert_eq!(extract(&instance, &[]), Grid::new(2, 1));
    }
}
