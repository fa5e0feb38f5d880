//! Text rendering of a grid next to its clues.

use crate::nonogram::puzzle::{Clue, Dim, Grid, Puzzle};
use itertools::Itertools;
use std::fmt::Write;

/// Renders `grid` with the row clues on the left and the column clues
/// stacked above, bottom aligned. Filled cells are `#`, empty ones `.`.
#[must_use]
pub fn render(puzzle: &Puzzle, grid: &Grid) -> String {
    let no_clue = Clue::new();
    let clue = |dim: Dim, idx: usize| puzzle.hints(dim).get(idx).unwrap_or(&no_clue);

    let row_labels: Vec<String> = (0..grid.height())
        .map(|row| clue(Dim::Row, row).iter().join(" "))
        .collect();
    let label_width = row_labels.iter().map(String::len).max().unwrap_or(0);

    let columns: Vec<&Clue> = (0..grid.width()).map(|col| clue(Dim::Col, col)).collect();
    let cell_width = columns
        .iter()
        .flat_map(|runs| runs.iter())
        .map(|run| run.to_string().len())
        .max()
        .unwrap_or(1);
    let depth = columns.iter().map(|runs| runs.len()).max().unwrap_or(0);

    let mut out = String::new();
    for level in 0..depth {
        let cells = columns.iter().map(|runs| {
            (level + runs.len())
                .checked_sub(depth)
                .map_or_else(String::new, |idx| runs[idx].to_string())
        });
        line(&mut out, "", label_width, cell_width, cells);
    }
    for (label, row) in row_labels.iter().zip(grid.rows()) {
        let cells = row.iter().map(|&filled| if filled { "#" } else { "." });
        line(&mut out, label, label_width, cell_width, cells);
    }
    out
}

fn line<T: std::fmt::Display>(
    out: &mut String,
    label: &str,
    label_width: usize,
    cell_width: usize,
    cells: impl Iterator<Item = T>,
) {
    let mut text = format!("{label:>label_width$}");
    for cell in cells {
        let _ = write!(text, " {cell:>cell_width$}");
    }
    out.push_str(text.trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_glider() {
        let grid = Grid::from_rows(vec![
            vec![false, true, false],
            vec![false, false, true],
            vec![true, true, true],
        ])
        .unwrap();
        let puzzle = Puzzle::from_grid(&grid);

        assert_eq!(render(&puzzle, &grid), "    1\n  1 1 2\n1 . # .\n1 . . #\n3 # # #\n");
    }

    #[test]
    fn test_render_wide_runs() {
        let grid = Grid::from_rows(vec![vec![true; 12]]).unwrap();
        let puzzle = Puzzle::new(vec![vec![12]], vec![vec![1]; 12]);

        let rendered = render(&puzzle, &grid);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("12 #"));
    }

    #[test]
    fn test_render_empty_clues() {
        let grid = Grid::new(1, 2);
        let puzzle = Puzzle::new(vec![vec![]], vec![vec![], vec![]]);

        assert_eq!(render(&puzzle, &grid), " . .\n");
    }
}
