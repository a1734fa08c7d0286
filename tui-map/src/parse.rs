use std::fmt;

use crate::core::{MapSize, TileIndex, TileLayer};

/// How the values of a row are separated in the source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellFormat {
    /// One decimal digit per cell, no separators (`0011100`).
    Digits,
    /// Comma separated integers, the shape tile editors export (`0,0,1025,0`).
    Csv,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    pub format: CellFormat,
    /// When set, all values are read as one flat stream and chunked into rows of this width.
    pub columns: Option<u16>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            format: CellFormat::Digits,
            columns: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    EmptyLayer,
    InvalidCell { row: usize, token: String },
    RaggedRow { row: usize, expected: usize, actual: usize },
    TooLarge { width: usize, height: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::EmptyLayer => write!(f, "layer contains no cells"),
            ParseError::InvalidCell { row, token } => {
                write!(f, "row {} contains an invalid cell: {:?}", row, token)
            }
            ParseError::RaggedRow {
                row,
                expected,
                actual,
            } => write!(
                f,
                "row {} has {} cells, expected {}",
                row, actual, expected
            ),
            ParseError::TooLarge { width, height } => {
                write!(f, "layer of {}x{} cells does not fit a u16 grid", width, height)
            }
        }
    }
}

impl std::error::Error for ParseError {}

fn parse_row(row: usize, line: &str, format: CellFormat) -> Result<Vec<TileIndex>, ParseError> {
    match format {
        CellFormat::Digits => line
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .map(|ch| {
                ch.to_digit(10)
                    .map(|digit| digit as TileIndex)
                    .ok_or_else(|| ParseError::InvalidCell {
                        row,
                        token: ch.to_string(),
                    })
            })
            .collect(),
        CellFormat::Csv => line
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| {
                token
                    .parse::<TileIndex>()
                    .map_err(|_| ParseError::InvalidCell {
                        row,
                        token: token.to_string(),
                    })
            })
            .collect(),
    }
}

/// Parses a tile-index layer. Blank lines are skipped; every row must have the same width.
pub fn parse_index_layer(
    layer_name: &str,
    text: &str,
    options: &ParseOptions,
) -> Result<TileLayer, ParseError> {
    let mut rows = Vec::new();
    for (row, line) in text.lines().filter(|line| !line.trim().is_empty()).enumerate() {
        rows.push(parse_row(row, line, options.format)?);
    }

    if let Some(columns) = options.columns {
        let columns = columns as usize;
        if columns == 0 {
            return Err(ParseError::EmptyLayer);
        }
        let flat: Vec<TileIndex> = rows.into_iter().flatten().collect();
        rows = flat.chunks(columns).map(|chunk| chunk.to_vec()).collect();
    }

    let width = rows.first().map(Vec::len).unwrap_or(0);
    if width == 0 {
        return Err(ParseError::EmptyLayer);
    }
    for (row, cells) in rows.iter().enumerate() {
        if cells.len() != width {
            return Err(ParseError::RaggedRow {
                row,
                expected: width,
                actual: cells.len(),
            });
        }
    }

    let height = rows.len();
    let (Ok(w), Ok(h)) = (u16::try_from(width), u16::try_from(height)) else {
        return Err(ParseError::TooLarge { width, height });
    };

    let tiles: Vec<TileIndex> = rows.into_iter().flatten().collect();
    TileLayer::new(layer_name, MapSize::new(w, h), tiles)
        .map_err(|_| ParseError::TooLarge { width, height })
}
