//! Text renderings of matrices and vectors: TeX `bmatrix` expressions for the scene, Python
//! list literals for the numeric data the scene computes with, and a plain grid for the console.

use crate::matrix::Matrix;

/// How a number is printed inside TeX expressions and console grids.
///
/// Both variants round to two decimals; `Trimmed` then drops trailing zeros and a dangling
/// decimal point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberFormat {
    Fixed,
    #[default]
    Trimmed,
}

impl NumberFormat {
    pub fn number(self, v: f64) -> String {
        let mut s = format!("{v:.2}");
        if self == NumberFormat::Trimmed {
            let keep = s.trim_end_matches('0').trim_end_matches('.').len();
            s.truncate(keep);
        }
        // `-0.001` rounds to "-0.00"; never show a signed zero.
        if s.starts_with('-') && s[1..].chars().all(|c| c == '0' || c == '.') {
            s.remove(0);
        }
        s
    }
}

const ROW_SEP: &str = r" \\ ";
const COL_SEP: &str = " & ";

pub fn matrix_tex(m: &Matrix, fmt: NumberFormat) -> String {
    let rows: Vec<String> = m
        .iter_rows()
        .map(|row| join_numbers(row, fmt, COL_SEP))
        .collect();
    bmatrix(&rows.join(ROW_SEP))
}

/// Column-vector `bmatrix`.
pub fn vector_tex(v: &[f64], fmt: NumberFormat) -> String {
    bmatrix(&join_numbers(v, fmt, ROW_SEP))
}

fn bmatrix(body: &str) -> String {
    format!(r"\begin{{bmatrix}} {body} \end{{bmatrix}}")
}

fn join_numbers(values: &[f64], fmt: NumberFormat, sep: &str) -> String {
    values
        .iter()
        .map(|&v| fmt.number(v))
        .collect::<Vec<_>>()
        .join(sep)
}

/// Python float literal. `Debug` for `f64` always keeps a decimal point or exponent, which
/// Python reads back as the same float.
pub fn float_literal(v: f64) -> String {
    format!("{v:?}")
}

pub fn vector_literal(v: &[f64]) -> String {
    let items: Vec<String> = v.iter().map(|&x| float_literal(x)).collect();
    format!("[{}]", items.join(", "))
}

pub fn matrix_literal(m: &Matrix) -> String {
    let rows: Vec<String> = m.iter_rows().map(vector_literal).collect();
    format!("[{}]", rows.join(", "))
}

/// Right-aligned grid, one row per line.
pub fn matrix_grid(m: &Matrix, fmt: NumberFormat) -> String {
    let cells: Vec<Vec<String>> = m
        .iter_rows()
        .map(|row| row.iter().map(|&v| fmt.number(v)).collect())
        .collect();
    let width = cells
        .iter()
        .flatten()
        .map(String::len)
        .max()
        .unwrap_or(0);

    cells
        .iter()
        .map(|row| {
            let padded: Vec<String> = row.iter().map(|c| format!("{c:>width$}")).collect();
            format!("[ {} ]", padded.join("  "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale2() -> Matrix {
        Matrix::from_rows(vec![vec![2.0, 0.0], vec![0.0, 2.0]]).unwrap()
    }

    #[test]
    fn trimmed_drops_trailing_zeros() {
        let f = NumberFormat::Trimmed;
        assert_eq!(f.number(2.0), "2");
        assert_eq!(f.number(2.5), "2.5");
        assert_eq!(f.number(-0.126), "-0.13");
        assert_eq!(f.number(10.0), "10");
        assert_eq!(f.number(100.004), "100");
    }

    #[test]
    fn fixed_keeps_two_decimals() {
        let f = NumberFormat::Fixed;
        assert_eq!(f.number(2.0), "2.00");
        assert_eq!(f.number(-1.5), "-1.50");
    }

    #[test]
    fn negative_zero_is_unsigned() {
        assert_eq!(NumberFormat::Fixed.number(-0.001), "0.00");
        assert_eq!(NumberFormat::Trimmed.number(-0.0), "0");
    }

    #[test]
    fn matrix_tex_is_deterministic() {
        assert_eq!(
            matrix_tex(&scale2(), NumberFormat::Trimmed),
            r"\begin{bmatrix} 2 & 0 \\ 0 & 2 \end{bmatrix}"
        );
        assert_eq!(
            matrix_tex(&scale2(), NumberFormat::Fixed),
            r"\begin{bmatrix} 2.00 & 0.00 \\ 0.00 & 2.00 \end{bmatrix}"
        );
    }

    #[test]
    fn vector_tex_is_a_column() {
        assert_eq!(
            vector_tex(&[1.0, 2.5, -3.0], NumberFormat::Trimmed),
            r"\begin{bmatrix} 1 \\ 2.5 \\ -3 \end{bmatrix}"
        );
    }

    #[test]
    fn literals_are_python_floats() {
        assert_eq!(float_literal(1.0), "1.0");
        assert_eq!(float_literal(-0.5), "-0.5");
        assert_eq!(matrix_literal(&scale2()), "[[2.0, 0.0], [0.0, 2.0]]");
    }

    #[test]
    fn grid_aligns_columns() {
        let m = Matrix::from_rows(vec![vec![1.0, -12.5], vec![100.0, 0.0]]).unwrap();
        assert_eq!(
            matrix_grid(&m, NumberFormat::Trimmed),
            "[     1  -12.5 ]\n[   100      0 ]"
        );
    }
}
