//! Compiles a [`Puzzle`] into an integer model.
//!
//! Every run of every clue becomes an *extent* variable holding the offset
//! of its first cell along its line, with domain `[0, L - h]` for a run of
//! length `h` on a line of length `L`. Consecutive runs of a line are kept
//! apart by `pos_i + h_i < pos_{i+1}`. Rows and columns are tied together
//! cell by cell: for cell `(r, c)` the disjunction "some run of row `r`
//! covers column `c`" must be equivalent to "some run of column `c` covers
//! row `r`", where a run of length `h` covers offset `p` exactly when its
//! extent lies in `[p - h + 1, p]`.
//!
//! When the puzzle carries a solution, the run starts read off that grid are
//! attached as search hints. They never constrain the model.

use crate::csp::{Backend, Constraint, Difference, Domain, EngineError, Span, VarId};
use crate::errors::StructuralError;
use crate::nonogram::puzzle::{Dim, Puzzle, run_starts};
use itertools::Itertools;
use log::{debug, warn};
use std::ops::Range;

/// One run of one clue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent {
    /// Dimension of the line.
    pub dim: Dim,
    /// Line index.
    pub line: usize,
    /// Position of the run within its clue.
    pub index: usize,
    /// Run length.
    pub run: i32,
    /// Allowed start offsets.
    pub domain: Domain,
}

impl Extent {
    /// The values of this extent for which its run covers `offset`.
    #[must_use]
    pub fn covering(&self, var: VarId, offset: i32) -> Span {
        Span {
            var,
            lo: offset - self.run + 1,
            hi: offset,
        }
    }
}

/// The integer model of a puzzle.
///
/// Extents are stored rows first, then columns, each line's runs in clue
/// order; [`VarId::new`] of a position in that order is the id the extent
/// receives when the instance is loaded into a [`Backend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstance {
    height: usize,
    width: usize,
    extents: Vec<Extent>,
    line_starts: [Vec<usize>; 2],
    constraints: Vec<Constraint>,
    search_hints: Vec<(VarId, i32)>,
}

impl CompiledInstance {
    /// Rows in a solution grid.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Columns in a solution grid.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of lines in `dim`.
    #[must_use]
    pub fn lines(&self, dim: Dim) -> usize {
        self.line_starts[dim.index()].len() - 1
    }

    /// Number of extent variables.
    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.extents.len()
    }

    /// All extents in variable order.
    #[must_use]
    pub fn extents(&self) -> &[Extent] {
        &self.extents
    }

    /// The extent of `var`.
    #[must_use]
    pub fn extent(&self, var: VarId) -> Option<&Extent> {
        self.extents.get(var.index())
    }

    /// Variables of line `line` in `dim`, in clue order.
    ///
    /// # Panics
    /// If the line does not exist.
    pub fn line_vars(&self, dim: Dim, line: usize) -> impl Iterator<Item = VarId> + use<> {
        let starts = &self.line_starts[dim.index()];
        let range: Range<usize> = starts[line]..starts[line + 1];
        range.map(VarId::new)
    }

    /// The variable of run `index` of line `line` in `dim`.
    #[must_use]
    pub fn var(&self, dim: Dim, line: usize, index: usize) -> Option<VarId> {
        let starts = &self.line_starts[dim.index()];
        let (start, end) = (*starts.get(line)?, *starts.get(line + 1)?);
        (start + index < end).then(|| VarId::new(start + index))
    }

    /// Every constraint, ordering constraints first.
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Suggested extent values read from the reference solution.
    #[must_use]
    pub fn search_hints(&self) -> &[(VarId, i32)] {
        &self.search_hints
    }

    /// Creates the variables, constraints and hints in `backend`.
    ///
    /// # Errors
    /// Whatever the backend reports, or [`EngineError::VariableOrder`] if it
    /// does not number variables densely.
    pub fn load<B: Backend + ?Sized>(&self, backend: &mut B) -> Result<(), EngineError> {
        for (idx, extent) in self.extents.iter().enumerate() {
            let expected = VarId::new(idx);
            let got = backend.new_int_var(extent.domain.lo, extent.domain.hi)?;
            if got != expected {
                return Err(EngineError::VariableOrder { expected, got });
            }
        }

        for constraint in &self.constraints {
            backend.add_constraint(constraint)?;
        }

        if !self.search_hints.is_empty() {
            backend.add_search_hint(&self.search_hints)?;
        }

        Ok(())
    }
}

/// Builds a [`CompiledInstance`] from a puzzle.
///
/// # Errors
/// A [`StructuralError`] if the puzzle fails [`Puzzle::validate`]. Nothing is
/// compiled in that case.
pub fn compile(puzzle: &Puzzle) -> Result<CompiledInstance, StructuralError> {
    puzzle.validate()?;

    let instance = Compiler::new(puzzle).finish();
    debug!(
        "compiled {}x{} puzzle: {} extents, {} constraints, {} hints",
        instance.height,
        instance.width,
        instance.extents.len(),
        instance.constraints.len(),
        instance.search_hints.len()
    );

    Ok(instance)
}

struct Compiler<'a> {
    puzzle: &'a Puzzle,
    extents: Vec<Extent>,
    line_starts: [Vec<usize>; 2],
}

impl<'a> Compiler<'a> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn new(puzzle: &'a Puzzle) -> Self {
        let mut extents = Vec::new();
        let mut line_starts = [Vec::new(), Vec::new()];

        for dim in Dim::ALL {
            let len = puzzle.size(dim) as i32;
            for (line, clue) in puzzle.hints(dim).iter().enumerate() {
                line_starts[dim.index()].push(extents.len());
                extents.extend(clue.iter().enumerate().map(|(index, &run)| Extent {
                    dim,
                    line,
                    index,
                    run: run as i32,
                    domain: Domain::new(0, len - run as i32),
                }));
            }
            line_starts[dim.index()].push(extents.len());
        }

        Self {
            puzzle,
            extents,
            line_starts,
        }
    }

    fn line(&self, dim: Dim, line: usize) -> Range<usize> {
        let starts = &self.line_starts[dim.index()];
        starts[line]..starts[line + 1]
    }

    fn ordering(&self) -> impl Iterator<Item = Constraint> + '_ {
        Dim::ALL.into_iter().flat_map(move |dim| {
            (0..self.puzzle.hints(dim).len()).flat_map(move |line| {
                self.line(dim, line).tuple_windows().map(move |(a, b)| {
                    Constraint::Linear(Difference {
                        x: VarId::new(a),
                        y: VarId::new(b),
                        k: -(self.extents[a].run + 1),
                    })
                })
            })
        })
    }

    /// Spans under which some run of line `line` covers `offset`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn covers(&self, dim: Dim, line: usize, offset: usize) -> Vec<Span> {
        self.line(dim, line)
            .map(|idx| self.extents[idx].covering(VarId::new(idx), offset as i32))
            .collect()
    }

    fn coverage(&self) -> impl Iterator<Item = Constraint> + '_ {
        let (height, width) = (self.puzzle.height(), self.puzzle.width());
        (0..height).cartesian_product(0..width).map(move |(row, col)| Constraint::Equivalence {
            left: self.covers(Dim::Row, row, col),
            right: self.covers(Dim::Col, col, row),
        })
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn search_hints(&self) -> Vec<(VarId, i32)> {
        let Some(grid) = self.puzzle.solution() else {
            return Vec::new();
        };

        let mut hints = Vec::new();
        for dim in Dim::ALL {
            for line in 0..self.puzzle.hints(dim).len() {
                let starts = run_starts(grid.line(dim, line));
                let vars = self.line(dim, line);
                if starts.len() != vars.len() {
                    warn!("reference solution disagrees with the clue of {dim} {line}; not hinting it");
                    continue;
                }
                hints.extend(vars.zip(starts).map(|(idx, start)| (VarId::new(idx), start as i32)));
            }
        }
        hints
    }

    fn finish(self) -> CompiledInstance {
        let constraints = self.ordering().chain(self.coverage()).collect();
        let search_hints = self.search_hints();

        CompiledInstance {
            height: self.puzzle.height(),
            width: self.puzzle.width(),
            extents: self.extents,
            line_starts: self.line_starts,
            constraints,
            search_hints,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nonogram::puzzle::Grid;

    fn small() -> Puzzle {
        // .##.#
        // #....
        Puzzle::new(
            vec![vec![2, 1], vec![1]],
            vec![vec![1], vec![1], vec![1], vec![], vec![1]],
        )
    }

    #[test]
    fn test_variables() {
        let instance = compile(&small()).unwrap();

        assert_eq!(instance.num_vars(), 3 + 4);
        assert_eq!((instance.height(), instance.width()), (2, 5));
        assert_eq!(instance.lines(Dim::Row), 2);
        assert_eq!(instance.lines(Dim::Col), 5);

        let first = instance.extents()[0];
        assert_eq!((first.dim, first.line, first.index, first.run), (Dim::Row, 0, 0, 2));
        assert_eq!(first.domain, Domain::new(0, 3));
        assert_eq!(instance.extents()[3].domain, Domain::new(0, 1));
    }

    #[test]
    fn test_line_lookup() {
        let instance = compile(&small()).unwrap();

        assert_eq!(instance.line_vars(Dim::Row, 0).collect::<Vec<_>>(), vec![VarId::new(0), VarId::new(1)]);
        assert_eq!(instance.line_vars(Dim::Col, 3).count(), 0);
        assert_eq!(instance.var(Dim::Col, 4, 0), Some(VarId::new(6)));
        assert_eq!(instance.var(Dim::Col, 3, 0), None);
        assert_eq!(instance.var(Dim::Row, 9, 0), None);
    }

    #[test]
    fn test_constraints() {
        let instance = compile(&small()).unwrap();
        let constraints = instance.constraints();

        assert_eq!(constraints.len(), 1 + 2 * 5);
        assert_eq!(
            constraints[0],
            Constraint::Linear(Difference {
                x: VarId::new(0),
                y: VarId::new(1),
                k: -3
            })
        );
        // Cell (0, 3): row 0 covers it through either run, column 3 has none.
        let Constraint::Equivalence { left, right } = &constraints[1 + 3] else {
            panic!("expected coverage constraint");
        };
        assert_eq!(
            left,
            &vec![
                Span { var: VarId::new(0), lo: 2, hi: 3 },
                Span { var: VarId::new(1), lo: 3, hi: 3 },
            ]
        );
        assert!(right.is_empty());
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(compile(&small()).unwrap(), compile(&small()).unwrap());
    }

    #[test]
    fn test_hints_from_solution() {
        let grid = Grid::from_rows(vec![
            vec![false, true, true, false, true],
            vec![true, false, false, false, false],
        ])
        .unwrap();
        let instance = compile(&Puzzle::from_grid(&grid)).unwrap();

        assert_eq!(
            instance.search_hints(),
            &[
                (VarId::new(0), 1),
                (VarId::new(1), 4),
                (VarId::new(2), 0),
                (VarId::new(3), 1),
                (VarId::new(4), 0),
                (VarId::new(5), 0),
                (VarId::new(6), 0),
            ]
        );
    }

    #[test]
    fn test_stale_solution_is_not_hinted() {
        let stale = Grid::from_rows(vec![vec![true, true, false, false, false], vec![false; 5]]).unwrap();
        let instance = compile(&small().with_solution(stale)).unwrap();

        // Only columns 0 and 1 still match their clues.
        assert_eq!(instance.search_hints(), &[(VarId::new(3), 0), (VarId::new(4), 0)]);
    }

    #[test]
    fn test_longest_runs() {
        let longest = i32::MAX as u32 - 1;
        let instance = compile(&Puzzle::new(vec![vec![longest, 1]], vec![vec![1]])).unwrap();

        assert!(instance.extents()[0].domain.is_empty());
        assert_eq!(
            instance.constraints()[0],
            Constraint::Linear(Difference {
                x: VarId::new(0),
                y: VarId::new(1),
                k: -i32::MAX
            })
        );

        let puzzle = Puzzle::new(vec![vec![longest + 1, 1]], vec![vec![1]]);
        assert!(matches!(compile(&puzzle), Err(StructuralError::RunTooLong { index: 0, .. })));
    }

    #[test]
    fn test_structural_error_before_compiling() {
        let puzzle = Puzzle::new(vec![vec![0]], vec![vec![1]]);
        assert!(compile(&puzzle).is_err());
    }
}
