//! SExtractor-style ASCII object catalogs.
//!
//! The catalogs consumed and produced here use the plain-text SExtractor
//! layout: one `# <number> <NAME> [description]` header line per column,
//! followed by one whitespace-separated row per object. Only the three
//! positional columns are interpreted; every other cell passes through
//! byte-for-byte so downstream extraction tools see their columns
//! untouched.
//!
//! ```text
//! #   1 NUMBER          Running object number
//! #   2 X_IMAGE         Object position along x    [pixel]
//! #   3 Y_IMAGE         Object position along y    [pixel]
//! #   4 THETA_IMAGE     Position angle             [deg]
//! 1 100.523 200.144 45.000
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PrepError;

/// Column holding the object x position (1-based pixels).
pub const X_IMAGE: &str = "X_IMAGE";
/// Column holding the object y position (1-based pixels).
pub const Y_IMAGE: &str = "Y_IMAGE";
/// Column holding the object position angle (degrees).
pub const THETA_IMAGE: &str = "THETA_IMAGE";

/// One object: raw cells, one per catalog column.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRow {
    cells: Vec<String>,
}

impl CatalogRow {
    /// Raw cell values in column order.
    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}

/// An object catalog with positional columns and arbitrary pass-through
/// columns.
#[derive(Debug, Clone)]
pub struct Catalog {
    path: PathBuf,
    /// Raw `#` header lines, replayed verbatim on write.
    header: Vec<String>,
    columns: Vec<String>,
    rows: Vec<CatalogRow>,
    x_col: usize,
    y_col: usize,
    theta_col: usize,
}

impl Catalog {
    /// Read a catalog file.
    pub fn read(path: &Path) -> Result<Self, PrepError> {
        let text = fs::read_to_string(path).map_err(|e| PrepError::io(path, e))?;
        Self::parse(&text, path)
    }

    /// Parse catalog text. `path` is used for error messages only.
    pub fn parse(text: &str, path: &Path) -> Result<Self, PrepError> {
        let mut header = Vec::new();
        let mut columns = Vec::new();
        let mut rows = Vec::new();

        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(rest) = line.strip_prefix('#') {
                header.push(line.to_string());
                // Column declaration: "# <number> <NAME> [description]"
                let mut fields = rest.split_whitespace();
                if let (Some(index), Some(name)) = (fields.next(), fields.next()) {
                    if index.parse::<usize>().ok() == Some(columns.len() + 1) {
                        columns.push(name.to_string());
                    }
                }
                continue;
            }

            let cells: Vec<String> = line.split_whitespace().map(str::to_string).collect();
            if cells.len() != columns.len() {
                return Err(PrepError::format(
                    path,
                    format!(
                        "line {} has {} entries, expected {} (one per column)",
                        line_no + 1,
                        cells.len(),
                        columns.len()
                    ),
                ));
            }
            rows.push(CatalogRow { cells });
        }

        let find = |name: &str| -> Result<usize, PrepError> {
            columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| PrepError::format(path, format!("required column {name} is missing")))
        };
        let x_col = find(X_IMAGE)?;
        let y_col = find(Y_IMAGE)?;
        let theta_col = find(THETA_IMAGE)?;

        Ok(Self {
            path: path.to_path_buf(),
            header,
            columns,
            rows,
            x_col,
            y_col,
            theta_col,
        })
    }

    /// Write the catalog, overwriting any existing file.
    pub fn write(&self, path: &Path) -> Result<(), PrepError> {
        let mut out = String::new();
        for line in &self.header {
            out.push_str(line);
            out.push('\n');
        }
        for row in &self.rows {
            out.push_str(&row.cells.join(" "));
            out.push('\n');
        }
        fs::write(path, out).map_err(|e| PrepError::io(path, e))
    }

    /// The file this catalog was read from (error-message context).
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[CatalogRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Object position (`X_IMAGE`, `Y_IMAGE`) of row `index`.
    pub fn position(&self, index: usize) -> Result<(f64, f64), PrepError> {
        Ok((
            self.numeric_cell(index, self.x_col)?,
            self.numeric_cell(index, self.y_col)?,
        ))
    }

    /// Object position angle (`THETA_IMAGE`, degrees) of row `index`.
    pub fn theta(&self, index: usize) -> Result<f64, PrepError> {
        self.numeric_cell(index, self.theta_col)
    }

    /// Overwrite the position of row `index`.
    pub fn set_position(&mut self, index: usize, x: f64, y: f64) {
        self.rows[index].cells[self.x_col] = format!("{x:.3}");
        self.rows[index].cells[self.y_col] = format!("{y:.3}");
    }

    /// Overwrite the position angle of row `index`.
    pub fn set_theta(&mut self, index: usize, theta_deg: f64) {
        self.rows[index].cells[self.theta_col] = format!("{theta_deg:.3}");
    }

    /// Keep only the rows flagged in `keep` (one flag per row).
    pub fn retain_rows(&mut self, keep: &[bool]) {
        assert_eq!(keep.len(), self.rows.len(), "one flag per row");
        let mut index = 0;
        self.rows.retain(|_| {
            let kept = keep[index];
            index += 1;
            kept
        });
    }

    fn numeric_cell(&self, row: usize, col: usize) -> Result<f64, PrepError> {
        let cell = &self.rows[row].cells[col];
        cell.parse::<f64>().map_err(|_| {
            PrepError::format(
                &self.path,
                format!(
                    "column {} of object {} is not a number: '{}'",
                    self.columns[col],
                    row + 1,
                    cell
                ),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
#   1 NUMBER          Running object number
#   2 X_IMAGE         Object position along x    [pixel]
#   3 Y_IMAGE         Object position along y    [pixel]
#   4 THETA_IMAGE     Position angle             [deg]
#   5 MAG_AUTO        Kron-like magnitude        [mag]
1 100.523 200.144 45.000 18.22
2 512.000 512.000 -10.500 21.07
";

    fn sample() -> Catalog {
        Catalog::parse(SAMPLE, Path::new("test.cat")).unwrap()
    }

    #[test]
    fn parse_columns_and_rows() {
        let cat = sample();
        assert_eq!(
            cat.columns(),
            ["NUMBER", "X_IMAGE", "Y_IMAGE", "THETA_IMAGE", "MAG_AUTO"]
        );
        assert_eq!(cat.len(), 2);
        assert_eq!(cat.position(0).unwrap(), (100.523, 200.144));
        assert_eq!(cat.theta(1).unwrap(), -10.5);
    }

    #[test]
    fn missing_required_column_is_format_error() {
        let text = "#   1 NUMBER\n#   2 X_IMAGE\n#   3 Y_IMAGE\n1 2.0 3.0\n";
        let err = Catalog::parse(text, Path::new("bad.cat")).unwrap_err();
        assert!(matches!(err, PrepError::Format { .. }));
        assert!(err.to_string().contains("THETA_IMAGE"), "{}", err);
    }

    #[test]
    fn short_row_is_format_error() {
        let text = format!("{SAMPLE}3 1.0 2.0\n");
        let err = Catalog::parse(&text, Path::new("bad.cat")).unwrap_err();
        assert!(err.to_string().contains("line 8"), "{}", err);
    }

    #[test]
    fn non_numeric_position_is_format_error() {
        let text = "\
# 1 X_IMAGE
# 2 Y_IMAGE
# 3 THETA_IMAGE
abc 2.0 3.0
";
        let cat = Catalog::parse(text, Path::new("bad.cat")).unwrap();
        let err = cat.position(0).unwrap_err();
        assert!(err.to_string().contains("X_IMAGE"), "{}", err);
    }

    #[test]
    fn update_and_retain() {
        let mut cat = sample();
        cat.set_position(0, 50.1234, 60.5);
        cat.set_theta(0, 33.3333);
        cat.retain_rows(&[true, false]);

        assert_eq!(cat.len(), 1);
        assert_eq!(cat.position(0).unwrap(), (50.123, 60.5));
        assert_eq!(cat.theta(0).unwrap(), 33.333);
        // Pass-through cells untouched
        assert_eq!(cat.rows()[0].cells()[4], "18.22");
    }

    #[test]
    fn write_replays_header_and_filtered_rows() {
        let mut cat = sample();
        cat.retain_rows(&[false, true]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.cat");
        cat.write(&path).unwrap();

        let reread = Catalog::read(&path).unwrap();
        assert_eq!(reread.len(), 1);
        assert_eq!(reread.columns(), cat.columns());
        assert_eq!(reread.position(0).unwrap(), (512.0, 512.0));
    }

    #[test]
    fn empty_catalog_parses() {
        let text = "# 1 X_IMAGE\n# 2 Y_IMAGE\n# 3 THETA_IMAGE\n";
        let cat = Catalog::parse(text, Path::new("empty.cat")).unwrap();
        assert!(cat.is_empty());
    }
}
