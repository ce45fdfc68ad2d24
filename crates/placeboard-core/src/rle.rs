//! Run-length encoding of board tiles.
//!
//! # Wire format
//!
//! A tile string is a sequence of `Z`-terminated segments:
//!
//! ```text
//! tile    := segment*
//! segment := token+ repeat? 'Z'
//! token   := digits? letter
//! repeat  := digits
//! ```
//!
//! Each segment describes one row, duplicated `repeat` times (default 1).
//! Within a segment the rightmost run of digits before `Z` is the repeat
//! count; everything before it is the run-length row. A token's count
//! defaults to 1. Text after the final `Z` is not part of any segment and is
//! ignored.
//!
//! Example: `"3A2B10Z"` is the row `AAABB` repeated ten times.

use crate::board::{Tile, TILE_SIZE};
use crate::color::ColorCode;
use thiserror::Error;

/// Largest run or repeat count that can occur in a well-formed tile.
const MAX_COUNT: usize = TILE_SIZE;

/// Errors produced while decoding a tile string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RleError {
    #[error("Repeat count {0:?} is out of range")]
    RepeatOutOfRange(String),
    #[error("Expected {expected} rows, decoded {found}")]
    RowCount { expected: usize, found: usize },
    #[error("Row {row} has {found} pixels, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Encode one row as `<count><code>` tokens.
///
/// Runs of one or two are written literally (`A`, `AA`), longer runs with a
/// count prefix (`3A`).
pub fn encode_line(row: &[ColorCode]) -> String {
    let mut out = String::with_capacity(row.len());
    let mut iter = row.iter().copied().peekable();

    while let Some(code) = iter.next() {
        let mut run = 1usize;
        while iter.peek() == Some(&code) {
            iter.next();
            run += 1;
        }
        match run {
            1 => out.push(code.as_char()),
            2 => {
                out.push(code.as_char());
                out.push(code.as_char());
            }
            n => {
                out.push_str(&n.to_string());
                out.push(code.as_char());
            }
        }
    }

    out
}

/// Encode a whole tile, collapsing consecutive identical rows into one segment.
pub fn encode_tile(tile: &Tile) -> String {
    let mut out = String::new();
    let rows = tile.rows();
    let mut i = 0;

    while i < rows.len() {
        let mut repeat = 1;
        while i + repeat < rows.len() && rows[i + repeat] == rows[i] {
            repeat += 1;
        }
        out.push_str(&encode_line(&rows[i]));
        if repeat > 1 {
            out.push_str(&repeat.to_string());
        }
        out.push(ColorCode::SEPARATOR);
        i += repeat;
    }

    out
}

/// Expand a run-length row.
///
/// Characters that do not form a `digits? letter` token are skipped. A run
/// count that does not fit in a tile marks the whole line as malformed and
/// yields an empty row.
pub fn decode_line(rle: &str) -> Vec<ColorCode> {
    let mut out = Vec::new();
    let mut digits = String::new();

    for c in rle.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }

        if let Some(code) = ColorCode::from_char(c) {
            let count = if digits.is_empty() {
                1
            } else {
                match digits.parse::<usize>() {
                    Ok(n) if n <= MAX_COUNT => n,
                    _ => {
                        log::warn!("Run count {:?} out of range in line {:?}", digits, rle);
                        return Vec::new();
                    }
                }
            };
            out.extend(std::iter::repeat_n(code, count));
        }
        digits.clear();
    }

    out
}

/// Decode a tile string into its raw rows without checking the tile shape.
///
/// Every repeat of a segment is an independent copy of the row.
pub fn decode_rows(cell: &str) -> Result<Vec<Vec<ColorCode>>, RleError> {
    let cell = cell.trim();
    let mut segments: Vec<&str> = cell.split(ColorCode::SEPARATOR).collect();

    // Whatever follows the last separator is unterminated.
    if let Some(tail) = segments.pop() {
        if !tail.is_empty() {
            log::warn!("Ignoring unterminated segment {:?} in tile {:?}", tail, cell);
        }
    }

    let mut rows = Vec::new();
    for segment in segments {
        if segment.is_empty() {
            continue;
        }

        let content_len = segment.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        let (rle, repeat_str) = segment.split_at(content_len);

        let repeat = if repeat_str.is_empty() {
            1
        } else {
            match repeat_str.parse::<usize>() {
                Ok(n) if n <= MAX_COUNT => n,
                _ => return Err(RleError::RepeatOutOfRange(repeat_str.to_string())),
            }
        };

        let row = decode_line(rle);
        for _ in 0..repeat {
            rows.push(row.clone());
        }
    }

    Ok(rows)
}

/// Decode a tile string and check that it is exactly `TILE_SIZE` square.
pub fn decode_tile(cell: &str) -> Result<Tile, RleError> {
    Tile::from_rows(decode_rows(cell)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(s: &str) -> Vec<ColorCode> {
        s.chars().filter_map(ColorCode::from_char).collect()
    }

    #[test]
    fn test_decode_line_counts() {
        assert_eq!(decode_line("3A2B"), codes("AAABB"));
        assert_eq!(decode_line("ABC"), codes("ABC"));
        assert_eq!(decode_line("12P"), vec![ColorCode::P; 12]);
    }

    #[test]
    fn test_decode_line_skips_garbage() {
        assert_eq!(decode_line("2A-b?C"), codes("AAC"));
        // Digits not followed by a letter are dropped.
        assert_eq!(decode_line("4-A"), codes("A"));
        assert_eq!(decode_line("A7"), codes("A"));
        assert!(decode_line("").is_empty());
    }

    #[test]
    fn test_decode_line_oversized_run_is_empty() {
        assert!(decode_line("AB101C").is_empty());
        assert!(decode_line("99999999999999999999999A").is_empty());
    }

    #[test]
    fn test_encode_line_short_runs_literal() {
        assert_eq!(encode_line(&codes("ABBCCC")), "ABB3C");
        assert_eq!(encode_line(&vec![ColorCode::A; 100]), "100A");
        assert_eq!(encode_line(&[]), "");
    }

    #[test]
    fn test_decode_rows_two_segments() {
        let rows = decode_rows("3A2B10Z7A93Z").unwrap();
        assert_eq!(rows.len(), 103);
        for row in &rows[..10] {
            assert_eq!(row, &codes("AAABB"));
            assert_eq!(row.len(), 5);
        }
        for row in &rows[10..] {
            assert_eq!(row, &vec![ColorCode::A; 7]);
        }
        // Not a full tile, so strict decoding refuses it.
        assert_eq!(
            decode_tile("3A2B10Z7A93Z"),
            Err(RleError::RowCount { expected: 100, found: 103 })
        );
    }

    #[test]
    fn test_decode_rows_are_not_aliased() {
        let mut rows = decode_rows("2A3Z").unwrap();
        rows[0][0] = ColorCode::C;
        assert_eq!(rows[1][0], ColorCode::A);
        assert_eq!(rows[2][0], ColorCode::A);
    }

    #[test]
    fn test_decode_rows_default_repeat_and_tail() {
        let rows = decode_rows("AZBBZ3C").unwrap();
        assert_eq!(rows, vec![codes("A"), codes("BB")]);
    }

    #[test]
    fn test_decode_rows_repeat_out_of_range() {
        assert!(matches!(
            decode_rows("A1000Z"),
            Err(RleError::RepeatOutOfRange(_))
        ));
    }

    #[test]
    fn test_decode_tile_uniform() {
        let tile = decode_tile("100B100Z").unwrap();
        assert_eq!(tile.get(0, 0), ColorCode::B);
        assert_eq!(tile.get(99, 99), ColorCode::B);
    }

    #[test]
    fn test_decode_tile_bad_width() {
        let err = decode_tile("99B100Z").unwrap_err();
        assert_eq!(
            err,
            RleError::RowWidth { row: 0, expected: 100, found: 99 }
        );
    }

    #[test]
    fn test_tile_roundtrip() {
        let mut tile = Tile::filled(ColorCode::B);
        for i in 0..TILE_SIZE {
            tile.set(i, i, ColorCode::C);
            tile.set(TILE_SIZE - 1 - i, i, ColorCode::A);
        }
        for y in 40..60 {
            for x in 10..90 {
                tile.set(x, y, ColorCode::P);
            }
        }
        tile.set(3, 41, ColorCode::from_char('X').unwrap());

        let encoded = encode_tile(&tile);
        assert_eq!(decode_tile(&encoded).unwrap(), tile);
    }

    #[test]
    fn test_encode_tile_collapses_rows() {
        let tile = Tile::filled(ColorCode::B);
        assert_eq!(encode_tile(&tile), "100B100Z");
    }
}
