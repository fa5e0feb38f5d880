//! A reader for the `.non` puzzle format.
//!
//! The format is line oriented:
//!
//! ```text
//! title "glider"
//! width 3
//! height 3
//!
//! rows
//! 1
//! 1
//! 3
//!
//! columns
//! 1
//! 1,1
//! 2
//!
//! goal "010001111"
//! ```
//!
//! `rows` and `columns` are followed by one comma-separated clue per line, and
//! end at a blank line or the next keyword. A clue of `0` is an empty line.
//! `goal` is the reference solution, row by row, `1` for filled cells. Other
//! keywords (`title`, `catalogue`, `by`, ...) are ignored, `color` is
//! rejected, and lines starting with `#` are comments.

use crate::errors::{Error, ParseError, StructuralError};
use crate::nonogram::puzzle::{Clue, Dim, Grid, Puzzle};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Header,
    Clues(Dim),
}

#[derive(Debug)]
struct Parser {
    line: usize,
    mode: Mode,
    width: Option<usize>,
    height: Option<usize>,
    hints: [Option<Vec<Clue>>; 2],
    goal: Option<Vec<bool>>,
}

impl Parser {
    const fn new() -> Self {
        Self {
            line: 0,
            mode: Mode::Header,
            width: None,
            height: None,
            hints: [None, None],
            goal: None,
        }
    }

    fn syntax(&self, message: impl Into<String>) -> ParseError {
        ParseError::Syntax {
            line: self.line,
            message: message.into(),
        }
    }

    fn feed(&mut self, line: &str) -> Result<(), ParseError> {
        self.line += 1;
        let line = line.trim();
        if line.starts_with('#') {
            return Ok(());
        }

        match self.mode {
            Mode::Clues(_) if line.is_empty() => {
                self.mode = Mode::Header;
                Ok(())
            }
            Mode::Clues(dim) if !line.starts_with(|c: char| c.is_ascii_alphabetic()) => {
                let clue = self.clue(line)?;
                if let Some(clues) = self.hints[dim.index()].as_mut() {
                    clues.push(clue);
                }
                Ok(())
            }
            _ => {
                self.mode = Mode::Header;
                self.header(line)
            }
        }
    }

    fn header(&mut self, line: &str) -> Result<(), ParseError> {
        let (keyword, args) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let args = args.trim();

        match keyword {
            "" => {}
            "width" => self.width = Some(self.count(keyword, args)?),
            "height" => self.height = Some(self.count(keyword, args)?),
            "rows" => self.start(Dim::Row)?,
            "columns" => self.start(Dim::Col)?,
            "goal" => self.goal = Some(self.goal(args)?),
            "color" => {
                return Err(ParseError::Unsupported {
                    line: self.line,
                    feature: keyword.to_string(),
                });
            }
            _ => {}
        }
        Ok(())
    }

    fn start(&mut self, dim: Dim) -> Result<(), ParseError> {
        if self.hints[dim.index()].is_some() {
            return Err(self.syntax(format!("second `{}` section", section(dim))));
        }
        self.hints[dim.index()] = Some(Vec::new());
        self.mode = Mode::Clues(dim);
        Ok(())
    }

    fn count(&self, keyword: &str, args: &str) -> Result<usize, ParseError> {
        args.parse()
            .map_err(|_| self.syntax(format!("cannot parse {keyword} `{args}`")))
    }

    fn clue(&self, line: &str) -> Result<Clue, ParseError> {
        let runs: Vec<u32> = line
            .split(',')
            .map(str::trim)
            .map(|run| {
                run.parse()
                    .map_err(|_| self.syntax(format!("cannot parse run `{run}`")))
            })
            .collect::<Result<_, _>>()?;

        // A lone 0 marks an empty line; zeros elsewhere are left for validation.
        Ok(if runs == [0] { Vec::new() } else { runs })
    }

    fn goal(&self, args: &str) -> Result<Vec<bool>, ParseError> {
        let cells = args.trim_matches('"');
        cells
            .chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                _ => Err(self.syntax(format!("unexpected `{c}` in goal"))),
            })
            .collect()
    }

    fn finish(self) -> Result<Puzzle, Error> {
        let width = self.width.ok_or(ParseError::MissingSection("width"))?;
        let height = self.height.ok_or(ParseError::MissingSection("height"))?;
        let [rows, cols] = self.hints;
        let rows = rows.ok_or(ParseError::MissingSection("rows"))?;
        let cols = cols.ok_or(ParseError::MissingSection("columns"))?;

        for (dim, declared, actual) in [(Dim::Row, height, rows.len()), (Dim::Col, width, cols.len())] {
            if declared != actual {
                return Err(StructuralError::DeclaredCount { dim, declared, actual }.into());
            }
        }

        let puzzle = Puzzle::new(rows, cols);
        let Some(goal) = self.goal else {
            return Ok(puzzle);
        };

        if goal.len() != width * height {
            return Err(ParseError::Syntax {
                line: self.line,
                message: format!("goal has {} cells, expected {}", goal.len(), width * height),
            }
            .into());
        }
        let grid = Grid::from_rows(goal.chunks(width.max(1)).map(<[bool]>::to_vec).collect())?;
        Ok(puzzle.with_solution(grid))
    }
}

const fn section(dim: Dim) -> &'static str {
    match dim {
        Dim::Row => "rows",
        Dim::Col => "columns",
    }
}

/// Reads a puzzle from the text of a `.non` file.
///
/// # Errors
/// A [`ParseError`] for malformed or coloured input, or a
/// [`StructuralError`] when the declared size disagrees with the clues or
/// the clues are malformed.
pub fn parse(source: &str) -> Result<Puzzle, Error> {
    let mut parser = Parser::new();
    for line in source.lines() {
        parser.feed(line)?;
    }

    let puzzle = parser.finish()?;
    puzzle.validate()?;
    Ok(puzzle)
}

/// Reads a puzzle from a `.non` file.
///
/// # Errors
/// [`Error::Io`] if the file cannot be read, otherwise as [`parse`].
pub fn parse_file(path: impl AsRef<Path>) -> Result<Puzzle, Error> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse(&source)
}
