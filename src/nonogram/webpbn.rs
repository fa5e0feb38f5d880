//! A reader for webpbn XML puzzles.
//!
//! ```xml
//! <puzzleset>
//! <puzzle type="grid" defaultcolor="black">
//! <color name="white" char=".">fff</color>
//! <color name="black" char="X">000</color>
//! <clues type="columns"><line><count>1</count></line>...</clues>
//! <clues type="rows"><line><count>2</count><count>1</count></line>...</clues>
//! <solution type="goal"><image>
//! |X.X|
//! </image></solution>
//! </puzzle>
//! </puzzleset>
//! ```
//!
//! Only the first `puzzle` of a set is read. A `line` without counts is an
//! empty clue. Counts carrying a `color` attribute are rejected.

use crate::errors::{Error, ParseError};
use crate::nonogram::puzzle::{Clue, Dim, Grid, Puzzle};
use roxmltree::{Document, Node, ParsingOptions};
use std::path::Path;

fn line_of(node: Node<'_, '_>) -> usize {
    node.document().text_pos_at(node.range().start).row as usize
}

fn syntax(node: Node<'_, '_>, message: impl Into<String>) -> ParseError {
    ParseError::Syntax {
        line: line_of(node),
        message: message.into(),
    }
}

fn count(node: Node<'_, '_>) -> Result<u32, ParseError> {
    if node.attribute("color").is_some() {
        return Err(ParseError::Unsupported {
            line: line_of(node),
            feature: "color".to_string(),
        });
    }
    let text = node.text().unwrap_or("").trim();
    text.parse()
        .map_err(|_| syntax(node, format!("cannot parse count `{text}`")))
}

fn clues(node: Node<'_, '_>) -> Result<Vec<Clue>, ParseError> {
    node.children()
        .filter(|child| child.has_tag_name("line"))
        .map(|line| {
            line.children()
                .filter(|child| child.has_tag_name("count"))
                .map(count)
                .collect()
        })
        .collect()
}

/// The character the goal image uses for unfilled cells.
fn background(puzzle: Node<'_, '_>) -> char {
    let name = puzzle.attribute("backgroundcolor").unwrap_or("white");
    puzzle
        .children()
        .filter(|child| child.has_tag_name("color") && child.attribute("name") == Some(name))
        .find_map(|color| color.attribute("char")?.chars().next())
        .unwrap_or('.')
}

fn goal(puzzle: Node<'_, '_>) -> Result<Option<Grid>, Error> {
    let image = puzzle
        .children()
        .filter(|child| child.has_tag_name("solution"))
        .find(|solution| solution.attribute("type").is_none_or(|kind| kind == "goal"))
        .and_then(|solution| solution.children().find(|child| child.has_tag_name("image")));
    let Some(image) = image else {
        return Ok(None);
    };

    let empty = background(puzzle);
    let rows = image
        .text()
        .unwrap_or("")
        .lines()
        .map(str::trim)
        .filter(|row| !row.is_empty())
        .map(|row| row.trim_matches('|').chars().map(|c| c != empty).collect())
        .collect();
    Ok(Some(Grid::from_rows(rows)?))
}

/// Reads the first puzzle of a webpbn XML document.
///
/// # Errors
/// A [`ParseError`] for malformed XML, missing clues or coloured counts, or
/// a [`StructuralError`](crate::errors::StructuralError) when the clues or
/// goal are malformed.
pub fn parse(source: &str) -> Result<Puzzle, Error> {
    // webpbn exports start with a `<!DOCTYPE pbn ...>` declaration.
    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    let doc = Document::parse_with_options(source, options).map_err(|e| ParseError::Syntax {
        line: e.pos().row as usize,
        message: e.to_string(),
    })?;

    let puzzle = doc
        .descendants()
        .find(|node| node.has_tag_name("puzzle"))
        .ok_or(ParseError::MissingSection("puzzle"))?;

    let mut hints: [Option<Vec<Clue>>; 2] = [None, None];
    for node in puzzle.children().filter(|child| child.has_tag_name("clues")) {
        let dim = match node.attribute("type") {
            Some("columns") => Dim::Col,
            Some("rows") | None => Dim::Row,
            Some(other) => return Err(syntax(node, format!("unknown clue type `{other}`")).into()),
        };
        if hints[dim.index()].is_some() {
            return Err(syntax(node, format!("second {dim} clue list")).into());
        }
        hints[dim.index()] = Some(clues(node)?);
    }

    let [rows, cols] = hints;
    let rows = rows.ok_or(ParseError::MissingSection("rows"))?;
    let cols = cols.ok_or(ParseError::MissingSection("columns"))?;

    let mut result = Puzzle::new(rows, cols);
    if let Some(grid) = goal(puzzle)? {
        result = result.with_solution(grid);
    }
    result.validate()?;
    Ok(result)
}

/// Reads a webpbn XML file.
///
/// # Errors
/// [`Error::Io`] if the file cannot be read, otherwise as [`parse`].
pub fn parse_file(path: impl AsRef<Path>) -> Result<Puzzle, Error> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse(&source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StructuralError;

    const GLIDER: &str = r#"<?xml version="1.0"?>
<!DOCTYPE pbn SYSTEM "https://webpbn.com/pbn-0.3.dtd">
<puzzleset>
<puzzle type="grid" defaultcolor="black">
<source>test</source>
<color name="white" char=".">fff</color>
<color name="black" char="X">000</color>
<clues type="columns">
<line><count>1</count></line>
<line><count>1</count><count>1</count></line>
<line><count>2</count></line>
</clues>
<clues type="rows">
<line><count>1</count></line>
<line><count>1</count></line>
<line><count>3</count></line>
</clues>
<solution type="goal">
<image>
|.X.|
|..X|
|XXX|
</image>
</solution>
</puzzle>
</puzzleset>
"#;

    #[test]
    fn test_parse() {
        let puzzle = parse(GLIDER).unwrap();

        let rows: Vec<Clue> = vec![vec![1], vec![1], vec![3]];
        let cols: Vec<Clue> = vec![vec![1], vec![1, 1], vec![2]];
        assert_eq!(puzzle.hints(Dim::Row), rows.as_slice());
        assert_eq!(puzzle.hints(Dim::Col), cols.as_slice());
        assert_eq!(
            puzzle.solution().map(Grid::to_string).as_deref(),
            Some(".#.\n..#\n###\n")
        );
    }

    #[test]
    fn test_empty_line_without_goal() {
        let source = r#"<puzzle><clues type="rows"><line/><line><count>1</count></line></clues>
<clues type="columns"><line><count>1</count></line></clues></puzzle>"#;
        let puzzle = parse(source).unwrap();

        assert_eq!(puzzle.hints(Dim::Row), &[Clue::new(), vec![1]]);
        assert_eq!(puzzle.solution(), None);
    }

    #[test]
    fn test_coloured_count_rejected() {
        let source = "<puzzle>\n<clues type=\"rows\">\n<line><count color=\"red\">1</count></line>\n</clues>\n</puzzle>";
        let err = parse(source).unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ParseError::Unsupported { line: 3, ref feature }) if feature == "color"
        ));
    }

    #[test]
    fn test_bad_count() {
        let source = "<puzzle>\n<clues type=\"rows\"><line><count>x</count></line></clues>\n</puzzle>";
        let err = parse(source).unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::Syntax { line: 2, .. })));
    }

    #[test]
    fn test_missing_columns() {
        let source = r#"<puzzle><clues type="rows"><line><count>1</count></line></clues></puzzle>"#;
        let err = parse(source).unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::MissingSection("columns"))));
    }

    #[test]
    fn test_malformed_xml() {
        let err = parse("<puzzle><clues>").unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::Syntax { .. })));
    }

    #[test]
    fn test_goal_shape_checked() {
        let source = r#"<puzzle><clues type="rows"><line><count>1</count></line></clues>
<clues type="columns"><line><count>1</count></line></clues>
<solution type="goal"><image>
|XX|
</image></solution></puzzle>"#;
        let err = parse(source).unwrap_err();
        assert!(matches!(err, Error::Structural(StructuralError::SolutionShape { .. })));
    }
}
