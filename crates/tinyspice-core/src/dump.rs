//! Human-readable dumps of assembled systems.
//!
//! ```text
//!              in           out          i_V1
//! ╭                                               ╮
//! │ in    1.000e-3+0.000e0j ...                   │
//! ╰                                               ╯
//! ```

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;

/// A matrix entry that can be rendered in a dump.
pub trait DumpEntry {
    fn render(&self) -> String;
}

impl DumpEntry for f64 {
    fn render(&self) -> String {
        format!("{self:.4e}")
    }
}

impl DumpEntry for Complex64 {
    fn render(&self) -> String {
        format!("{:.3e}{:+.3e}j", self.re, self.im)
    }
}

/// Render a matrix with row and column labels.
///
/// `names` labels rows and columns in order; missing names fall back to the
/// numeric index.
pub fn format_matrix<T, I, S>(matrix: &DMatrix<T>, names: I) -> String
where
    T: DumpEntry + nalgebra::Scalar,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let labels = labels(names, matrix.nrows().max(matrix.ncols()));
    let cells: Vec<Vec<String>> = matrix
        .row_iter()
        .map(|row| row.iter().map(DumpEntry::render).collect())
        .collect();

    let label_width = labels.iter().map(String::len).max().unwrap_or(1);
    let cell_width = cells
        .iter()
        .flatten()
        .map(String::len)
        .chain(labels.iter().map(String::len))
        .max()
        .unwrap_or(1);
    let inner = label_width + 1 + matrix.ncols() * (cell_width + 1);

    let mut out = String::new();
    out.push_str(&format!("  {:label_width$} ", ""));
    for label in labels.iter().take(matrix.ncols()) {
        out.push_str(&format!("{label:>cell_width$} "));
    }
    out.push('\n');
    out.push_str(&format!("╭{}╮\n", " ".repeat(inner + 1)));
    for (label, row) in labels.iter().zip(&cells) {
        out.push_str(&format!("│ {label:<label_width$}"));
        for cell in row {
            out.push_str(&format!(" {cell:>cell_width$}"));
        }
        out.push_str(" │\n");
    }
    out.push_str(&format!("╰{}╯\n", " ".repeat(inner + 1)));
    out
}

/// Render a right-hand-side vector with row labels.
pub fn format_rhs<T, I, S>(rhs: &DVector<T>, names: I) -> String
where
    T: DumpEntry + nalgebra::Scalar,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let labels = labels(names, rhs.len());
    let cells: Vec<String> = rhs.iter().map(DumpEntry::render).collect();

    let label_width = labels.iter().map(String::len).max().unwrap_or(1);
    let cell_width = cells.iter().map(String::len).max().unwrap_or(1);
    let inner = label_width + cell_width + 2;

    let mut out = String::new();
    out.push_str(&format!("╭{}╮\n", " ".repeat(inner + 1)));
    for (label, cell) in labels.iter().zip(&cells) {
        out.push_str(&format!("│ {label:<label_width$} {cell:>cell_width$} │\n"));
    }
    out.push_str(&format!("╰{}╯\n", " ".repeat(inner + 1)));
    out
}

fn labels<I, S>(names: I, len: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut labels: Vec<String> = names
        .into_iter()
        .take(len)
        .map(|s| s.as_ref().to_string())
        .collect();
    for i in labels.len()..len {
        labels.push(i.to_string());
    }
    labels
}
