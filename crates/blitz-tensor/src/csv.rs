//! CSV Output - Debug Dumps of Tensor Contents
//!
//! Backends gather their elements into host memory and hand them to
//! [`write_csv`], which prints one line per outermost index (or everything on
//! one line). With column-major ordering the buffer is read as a Fortran
//! matrix of `outermost x inner_size`, so each printed line is still one
//! logical row.
//!
//! @version 0.1.0
//! @author Blitz Development Team

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use blitz_core::dtype::Element;
use blitz_core::error::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::shape::Shape;
use crate::tensor::Tensor;

// =============================================================================
// Format Options
// =============================================================================

/// Formatting options for CSV dumps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvFormat {
    /// Separator between values.
    pub delimiter: char,
    /// Whether each line ends with a separator.
    pub trailing_delimiter: bool,
    /// Digits after the decimal point for floating point values; `None`
    /// prints the shortest exact representation. Ignored for integers.
    pub precision: Option<usize>,
    /// One line per outermost index when true, one line in total otherwise.
    pub rows: bool,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            delimiter: ',',
            trailing_delimiter: false,
            precision: None,
            rows: true,
        }
    }
}

// =============================================================================
// Writers
// =============================================================================

/// Writes `values` laid out as `shape` to `writer`.
///
/// `values` must hold at least `shape.size()` elements.
pub fn write_csv<T: Element>(
    values: &[T],
    shape: &Shape,
    row_major: bool,
    writer: &mut dyn Write,
    format: &CsvFormat,
) -> Result<()> {
    let size = shape.size();
    if values.len() < size {
        return Err(Error::BufferTooSmall {
            required: size,
            capacity: values.len(),
        });
    }
    if size == 0 {
        return Ok(());
    }

    let outer = shape.outermost();
    let inner = shape.inner_size();
    let mut delim = [0u8; 4];
    let delim = format.delimiter.encode_utf8(&mut delim).as_bytes();

    for i in 0..outer {
        for j in 0..inner {
            let index = if row_major { i * inner + j } else { j * outer + i };
            write_value(writer, values[index], format.precision)?;

            let last_in_line = j + 1 == inner && (format.rows || i + 1 == outer);
            if !last_in_line || format.trailing_delimiter {
                writer.write_all(delim)?;
            }
        }
        if format.rows {
            writer.write_all(b"\n")?;
        }
    }
    if !format.rows {
        writer.write_all(b"\n")?;
    }

    tracing::debug!(
        elements = size,
        lines = if format.rows { outer } else { 1 },
        row_major,
        "wrote tensor csv"
    );
    Ok(())
}

fn write_value<T: Element>(writer: &mut dyn Write, value: T, precision: Option<usize>) -> Result<()> {
    match precision {
        Some(digits) if T::DTYPE.is_float() => write!(writer, "{value:.digits$}")?,
        _ => write!(writer, "{value}")?,
    }
    Ok(())
}

/// Dumps `tensor` to a new file at `path` with the default format.
pub fn write_csv_file<T, X>(tensor: &X, path: impl AsRef<Path>) -> Result<()>
where
    T: Element,
    X: Tensor<T> + ?Sized,
{
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    tensor.output_csv(&mut writer)?;
    writer.flush()?;
    tracing::debug!(path = %path.display(), "tensor csv written to file");
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn render<T: Element>(values: &[T], dims: &[usize], row_major: bool, format: &CsvFormat) -> String {
        let mut out = Vec::new();
        write_csv(values, &Shape::new(dims), row_major, &mut out, format).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_row_major_lines() {
        let values: Vec<i32> = (0..6).collect();
        let text = render(&values, &[2, 3], true, &CsvFormat::default());
        assert_eq!(text, "0,1,2\n3,4,5\n");
    }

    #[test]
    fn test_column_major_lines() {
        let values: Vec<i32> = (0..6).collect();
        let text = render(&values, &[2, 3], false, &CsvFormat::default());
        assert_eq!(text, "0,2,4\n1,3,5\n");
    }

    #[test]
    fn test_single_line_with_trailing_delimiter() {
        let values: Vec<usize> = (0..4).collect();
        let format = CsvFormat {
            delimiter: ';',
            trailing_delimiter: true,
            rows: false,
            ..CsvFormat::default()
        };
        let text = render(&values, &[2, 2], true, &format);
        assert_eq!(text, "0;1;2;3;\n");
    }

    #[test]
    fn test_float_precision() {
        let values = [0.5_f64, 1.0, 2.25];
        let format = CsvFormat {
            precision: Some(2),
            ..CsvFormat::default()
        };
        let text = render(&values, &[3], true, &format);
        assert_eq!(text, "0.50\n1.00\n2.25\n");
    }

    #[test]
    fn test_precision_ignored_for_integers() {
        let values = [7_i16, -3];
        let format = CsvFormat {
            precision: Some(3),
            rows: false,
            ..CsvFormat::default()
        };
        assert_eq!(render(&values, &[2], true, &format), "7,-3\n");
    }

    #[test]
    fn test_empty_shape_writes_nothing() {
        let values: [f32; 0] = [];
        assert_eq!(render(&values, &[0, 4], true, &CsvFormat::default()), "");
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        let mut out = Vec::new();
        let result = write_csv(&[1.0_f32; 3], &Shape::new(&[2, 2]), true, &mut out, &CsvFormat::default());
        assert_eq!(
            result,
            Err(Error::BufferTooSmall {
                required: 4,
                capacity: 3
            })
        );
    }

    #[test]
    fn test_format_config_from_json() {
        let format: CsvFormat = serde_json::from_str(r#"{"delimiter":"\t","precision":4}"#).unwrap();
        assert_eq!(format.delimiter, '\t');
        assert_eq!(format.precision, Some(4));
        assert!(format.rows);
        assert!(!format.trailing_delimiter);
    }
}
