//! Readers for network inputs
//!
//! The CSV dataset has one image per row: a single-character label followed by
//! `IMAGE_LEN * IMAGE_LEN` integer intensities in row-major order. Each row becomes a
//! zero-padded [`LabeledInputGrid`] ready for inference.

use crate::error::DatasetError;
use crate::grid::{Grid, LabeledInputGrid, IMAGE_LEN, INPUT_LEN};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Number of pixel fields expected after the label in a CSV record.
pub const RECORD_PIXELS: usize = IMAGE_LEN * IMAGE_LEN;

/// Label given to images loaded without one.
pub const NO_LABEL: char = '\0';

/// Parse one CSV record. `line` is the 1-based line number used in errors.
pub fn parse_record(record: &str, line: usize) -> Result<LabeledInputGrid, DatasetError> {
    let invalid = |reason: String| DatasetError::InvalidRecord { line, reason };

    let mut fields = record.trim_end().split(',');
    let label = fields
        .next()
        .and_then(|field| field.trim().chars().next())
        .ok_or_else(|| invalid("missing label".to_string()))?;

    let pixels = fields
        .map(|field| parse_pixel(field).map_err(&invalid))
        .collect::<Result<Vec<u8>, _>>()?;

    LabeledInputGrid::from_pixels(label, &pixels).map_err(|err| invalid(err.to_string()))
}

/// Read every non-empty row of a CSV dataset.
pub fn read_dataset(path: impl AsRef<Path>) -> Result<Vec<LabeledInputGrid>, DatasetError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let images = contents
        .lines()
        .enumerate()
        .filter(|(_, record)| !record.trim().is_empty())
        .map(|(i, record)| parse_record(record, i + 1))
        .collect::<Result<Vec<_>, _>>()?;

    debug!("read {} images from '{}'", images.len(), path.display());
    Ok(images)
}

/// Read a full-size (already padded) image: `INPUT_LEN` lines of `INPUT_LEN`
/// comma-separated intensities. The result carries [`NO_LABEL`].
pub fn load_image(path: impl AsRef<Path>) -> Result<LabeledInputGrid, DatasetError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut grid = Grid::new(INPUT_LEN);
    let mut rows = 0;
    for (i, record) in contents.lines().filter(|l| !l.trim().is_empty()).enumerate() {
        let invalid = |reason: String| DatasetError::InvalidRecord { line: i + 1, reason };
        if i >= INPUT_LEN {
            return Err(invalid(format!("more than {} rows", INPUT_LEN)));
        }
        let values = record
            .trim_end()
            .split(',')
            .map(|field| parse_pixel(field).map_err(&invalid))
            .collect::<Result<Vec<u8>, _>>()?;
        if values.len() != INPUT_LEN {
            return Err(invalid(format!(
                "expected {} values, found {}",
                INPUT_LEN,
                values.len()
            )));
        }
        for (j, value) in values.into_iter().enumerate() {
            grid.set_cell(value, i, j);
        }
        rows += 1;
    }

    if rows != INPUT_LEN {
        return Err(DatasetError::InvalidRecord {
            line: rows,
            reason: format!("expected {} rows, found {}", INPUT_LEN, rows),
        });
    }
    Ok(LabeledInputGrid::new(grid, NO_LABEL))
}

fn parse_pixel(field: &str) -> Result<u8, String> {
    let field = field.trim();
    field
        .parse::<u8>()
        .map_err(|_| format!("'{}' is not a pixel intensity in 0..=255", field))
}
