//! Puzzle and grid representations.
//!
//! Clues are kept per [`Dim`]: `hints(Dim::Row)[i]` lists the runs of row
//! `i` from left to right, `hints(Dim::Col)[j]` those of column `j` from top
//! to bottom. The length of a line in one dimension is the number of clues in
//! the other, so `size(Dim::Row)`, the length of every row, is the number of
//! column clues and `size(Dim::Col)` is the number of row clues. Grids are
//! indexed `[row][column]`: `height()` rows of `width()` cells.

use crate::errors::StructuralError;
use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// The two line directions of a puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dim {
    /// Horizontal lines.
    Row,
    /// Vertical lines.
    Col,
}

impl Dim {
    /// Both dimensions, rows first.
    pub const ALL: [Self; 2] = [Self::Row, Self::Col];

    /// The perpendicular dimension.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Row => Self::Col,
            Self::Col => Self::Row,
        }
    }

    /// Position in [`Dim::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Row => 0,
            Self::Col => 1,
        }
    }
}

impl Display for Dim {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Row => write!(f, "row"),
            Self::Col => write!(f, "column"),
        }
    }
}

/// The run lengths of one line, in order. Empty for a blank line.
pub type Clue = Vec<u32>;

/// Run lengths of a line of cells.
pub fn run_lengths(line: impl IntoIterator<Item = bool>) -> Clue {
    line.into_iter()
        .dedup_with_count()
        .filter(|&(_, filled)| filled)
        .map(|(len, _)| u32::try_from(len).unwrap_or(u32::MAX))
        .collect()
}

/// Offsets at which the runs of a line start.
pub fn run_starts(line: impl IntoIterator<Item = bool>) -> Vec<usize> {
    let mut prev = false;
    line.into_iter()
        .enumerate()
        .filter_map(|(idx, cell)| {
            let starts = cell && !prev;
            prev = cell;
            starts.then_some(idx)
        })
        .collect()
}

/// A rectangular Boolean grid. `true` cells are filled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Grid {
    height: usize,
    width: usize,
    cells: Vec<bool>,
}

impl Grid {
    /// An empty `height` by `width` grid.
    #[must_use]
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            cells: vec![false; height * width],
        }
    }

    /// Builds a grid from its rows.
    ///
    /// # Errors
    /// [`StructuralError::RaggedGrid`] when the rows differ in length.
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Result<Self, StructuralError> {
        let width = rows.first().map_or(0, Vec::len);
        if let Some((row, cells)) = rows.iter().find_position(|cells| cells.len() != width) {
            return Err(StructuralError::RaggedGrid {
                row,
                len: cells.len(),
                expected: width,
            });
        }

        Ok(Self {
            height: rows.len(),
            width,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Whether cell `(row, col)` is filled.
    ///
    /// # Panics
    /// If the cell lies outside the grid.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> bool {
        assert!(row < self.height && col < self.width);
        self.cells[row * self.width + col]
    }

    /// Fills or clears cell `(row, col)`.
    ///
    /// # Panics
    /// If the cell lies outside the grid.
    pub fn set(&mut self, row: usize, col: usize, filled: bool) {
        assert!(row < self.height && col < self.width);
        self.cells[row * self.width + col] = filled;
    }

    /// The rows of the grid, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        (0..self.height).map(|row| &self.cells[row * self.width..(row + 1) * self.width])
    }

    /// Line `idx` of dimension `dim`.
    pub fn line(&self, dim: Dim, idx: usize) -> Box<dyn Iterator<Item = bool> + '_> {
        match dim {
            Dim::Row => Box::new((0..self.width).map(move |col| self.get(idx, col))),
            Dim::Col => Box::new((0..self.height).map(move |row| self.get(row, idx))),
        }
    }

    /// The grid as nested row vectors.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<bool>> {
        self.rows().map(<[bool]>::to_vec).collect()
    }

    /// Number of filled cells.
    #[must_use]
    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}

impl Display for Grid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for row in self.rows() {
            let line: String = row.iter().map(|&c| if c { '#' } else { '.' }).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// A nonogram: clues for every row and column, and optionally a known
/// solution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Puzzle {
    hints: [Vec<Clue>; 2],
    solution: Option<Grid>,
}

impl Puzzle {
    /// A puzzle from its row clues (top to bottom) and column clues (left to
    /// right).
    #[must_use]
    pub const fn new(rows: Vec<Clue>, cols: Vec<Clue>) -> Self {
        Self {
            hints: [rows, cols],
            solution: None,
        }
    }

    /// The puzzle whose unique reading of clues is `grid`'s run lengths,
    /// carrying `grid` as its solution.
    #[must_use]
    pub fn from_grid(grid: &Grid) -> Self {
        let clues = |dim: Dim, count: usize| -> Vec<Clue> {
            (0..count).map(|idx| run_lengths(grid.line(dim, idx))).collect()
        };

        Self {
            hints: [clues(Dim::Row, grid.height()), clues(Dim::Col, grid.width())],
            solution: Some(grid.clone()),
        }
    }

    /// Attaches a reference solution.
    #[must_use]
    pub fn with_solution(mut self, solution: Grid) -> Self {
        self.solution = Some(solution);
        self
    }

    /// Clues of every line in `dim`.
    #[must_use]
    pub fn hints(&self, dim: Dim) -> &[Clue] {
        &self.hints[dim.index()]
    }

    /// Length of every line in `dim`: the number of clues of the other
    /// dimension.
    #[must_use]
    pub fn size(&self, dim: Dim) -> usize {
        self.hints(dim.other()).len()
    }

    /// Number of rows in a solution grid.
    #[must_use]
    pub fn height(&self) -> usize {
        self.size(Dim::Col)
    }

    /// Number of columns in a solution grid.
    #[must_use]
    pub fn width(&self) -> usize {
        self.size(Dim::Row)
    }

    /// The reference solution, if known.
    #[must_use]
    pub const fn solution(&self) -> Option<&Grid> {
        self.solution.as_ref()
    }

    /// Checks that the clues and solution describe a well-formed grid.
    ///
    /// Unsatisfiable clues, such as a run longer than its line, are
    /// well-formed.
    ///
    /// # Errors
    /// The first [`StructuralError`] found.
    pub fn validate(&self) -> Result<(), StructuralError> {
        let max = i32::MAX as usize;

        for dim in Dim::ALL {
            for (line, clue) in self.hints(dim).iter().enumerate() {
                if self.size(dim) > max {
                    return Err(StructuralError::LineTooLong { dim, line });
                }
                // A run and the gap after it must fit in an `i32`.
                if let Some(index) = clue.iter().position(|&run| run as usize >= max) {
                    return Err(StructuralError::RunTooLong { dim, line, index });
                }
                if let Some(index) = clue.iter().position(|&run| run == 0) {
                    return Err(StructuralError::ZeroRun { dim, line, index });
                }
            }
        }

        if let Some(grid) = &self.solution {
            if grid.height() != self.height() || grid.width() != self.width() {
                return Err(StructuralError::SolutionShape {
                    expected_height: self.height(),
                    expected_width: self.width(),
                    height: grid.height(),
                    width: grid.width(),
                });
            }
        }

        Ok(())
    }
}
