use crate::error::{MatvizError, MatvizResult};

/// Dense row-major matrix of finite `f64` entries.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Build a matrix from nested rows. Every row must have the same, non-zero length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> MatvizResult<Self> {
        let r = rows.len();
        let c = rows.first().map(Vec::len).unwrap_or(0);
        if r == 0 || c == 0 {
            return Err(MatvizError::dimension("matrix must have at least one row and column"));
        }

        let mut data = Vec::with_capacity(r * c);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != c {
                return Err(MatvizError::dimension(format!(
                    "row {} has {} entries, expected {}",
                    i + 1,
                    row.len(),
                    c
                )));
            }
            data.extend(row);
        }

        Ok(Self {
            rows: r,
            cols: c,
            data,
        })
    }

    pub fn identity(n: usize) -> Self {
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            data[i * n + i] = 1.0;
        }
        Self {
            rows: n,
            cols: n,
            data,
        }
    }

    /// Parse `rows` non-blank lines of `cols` whitespace-separated numbers.
    ///
    /// Blank lines anywhere in `text` are ignored before the row count is checked.
    pub fn parse(text: &str, rows: usize, cols: usize) -> MatvizResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(MatvizError::parse(format!(
                "matrix shape must be non-zero, got {rows}x{cols}"
            )));
        }

        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if lines.len() != rows {
            return Err(MatvizError::parse(format!(
                "expected {rows} rows, got {}",
                lines.len()
            )));
        }

        // `cols` is unchecked until the first row is split, so no up-front reservation.
        let mut data = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() != cols {
                return Err(MatvizError::parse(format!(
                    "expected {cols} columns in row {}, got {}",
                    i + 1,
                    tokens.len()
                )));
            }
            for tok in tokens {
                data.push(parse_entry(tok, i + 1)?);
            }
        }

        Ok(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.cols)
    }

    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.rows).map(|r| self.get(r, col)).collect()
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.iter_rows().map(<[f64]>::to_vec).collect()
    }

    /// Matrix-vector product `self · v`.
    pub fn apply(&self, v: &[f64]) -> MatvizResult<Vec<f64>> {
        if v.len() != self.cols {
            return Err(MatvizError::dimension(format!(
                "cannot apply a {}x{} matrix to a vector of length {}",
                self.rows,
                self.cols,
                v.len()
            )));
        }
        Ok(self
            .iter_rows()
            .map(|row| row.iter().zip(v).map(|(a, b)| a * b).sum::<f64>())
            .collect())
    }
}

/// Composite transformation "apply `first`, then `second`", i.e. `second · first`.
pub fn multiply(first: &Matrix, second: &Matrix) -> MatvizResult<Matrix> {
    if second.cols != first.rows {
        return Err(MatvizError::dimension(format!(
            "cannot compose: second is {}x{} but first is {}x{} (second.cols must equal first.rows)",
            second.rows, second.cols, first.rows, first.cols
        )));
    }

    let (n, m, inner) = (second.rows, first.cols, second.cols);
    let mut data = vec![0.0; n * m];
    for i in 0..n {
        for k in 0..inner {
            let s = second.get(i, k);
            for j in 0..m {
                data[i * m + j] += s * first.get(k, j);
            }
        }
    }

    Ok(Matrix {
        rows: n,
        cols: m,
        data,
    })
}

/// Parse a non-empty vector of numbers separated by any whitespace, newlines included.
///
/// The length is checked by whoever applies the vector.
pub fn parse_vector(text: &str) -> MatvizResult<Vec<f64>> {
    let v = text
        .split_whitespace()
        .map(|t| parse_entry(t, 1))
        .collect::<MatvizResult<Vec<f64>>>()?;
    if v.is_empty() {
        return Err(MatvizError::parse("expected at least one coordinate, got 0"));
    }
    Ok(v)
}

fn parse_entry(tok: &str, row: usize) -> MatvizResult<f64> {
    let v: f64 = tok
        .parse()
        .map_err(|_| MatvizError::parse(format!("invalid number '{tok}' in row {row}")))?;
    if !v.is_finite() {
        return Err(MatvizError::parse(format!(
            "non-finite number '{tok}' in row {row}"
        )));
    }
    Ok(v)
}
