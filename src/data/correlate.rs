use thiserror::Error;

use super::model::{Dataset, Value};

// ---------------------------------------------------------------------------
// Pairwise Pearson correlation over a fixed set of numeric columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CorrelateError {
    /// Fewer than two records: no coefficient is defined.
    #[error("correlation needs at least 2 records, subset has {rows}")]
    InsufficientData { rows: usize },

    /// A column with zero variance has no defined coefficient.
    #[error("column '{column}' has zero variance; correlation is undefined")]
    ZeroVariance { column: String },

    /// A correlation column holds something other than numbers.
    #[error("column '{column}' contains a non-numeric value; cannot correlate")]
    NonNumeric { column: String },
}

/// A symmetric matrix of Pearson coefficients, row-major over `columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    coefficients: Vec<f64>,
}

impl CorrelationMatrix {
    /// Coefficient for the pair at `(row, col)` in column order.
    pub fn coefficient(&self, row: usize, col: usize) -> f64 {
        self.coefficients[row * self.columns.len() + col]
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Compute the Pearson correlation matrix for the given columns over the
/// subset. Signals [`CorrelateError`] instead of producing placeholder 0/NaN
/// entries when the statistic is undefined.
pub fn correlate(
    dataset: &Dataset,
    indices: &[usize],
    columns: &[String],
) -> Result<CorrelationMatrix, CorrelateError> {
    if indices.len() < 2 {
        return Err(CorrelateError::InsufficientData {
            rows: indices.len(),
        });
    }

    let series: Vec<Vec<f64>> = columns
        .iter()
        .map(|col| column_values(dataset, indices, col))
        .collect::<Result<_, _>>()?;

    // Mean-centered residuals per column; reject zero variance up front.
    let mut centered: Vec<Vec<f64>> = Vec::with_capacity(series.len());
    for (col, xs) in columns.iter().zip(&series) {
        let mean = xs.iter().sum::<f64>() / xs.len() as f64;
        let resid: Vec<f64> = xs.iter().map(|x| x - mean).collect();
        let var: f64 = resid.iter().map(|r| r * r).sum();
        if var == 0.0 {
            return Err(CorrelateError::ZeroVariance {
                column: col.clone(),
            });
        }
        centered.push(resid);
    }

    let n = columns.len();
    let mut coefficients = vec![0.0; n * n];
    for i in 0..n {
        coefficients[i * n + i] = 1.0;
        for j in (i + 1)..n {
            let r = pearson(&centered[i], &centered[j]);
            coefficients[i * n + j] = r;
            coefficients[j * n + i] = r;
        }
    }

    Ok(CorrelationMatrix {
        columns: columns.to_vec(),
        coefficients,
    })
}

/// Pearson coefficient from two mean-centered series of equal length.
fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let cov: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let var_a: f64 = a.iter().map(|x| x * x).sum();
    let var_b: f64 = b.iter().map(|y| y * y).sum();
    (cov / (var_a * var_b).sqrt()).clamp(-1.0, 1.0)
}

fn column_values(
    dataset: &Dataset,
    indices: &[usize],
    column: &str,
) -> Result<Vec<f64>, CorrelateError> {
    indices
        .iter()
        .map(|&i| {
            match dataset.records[i].get(column) {
                // No missing-data policy here: null cells are non-numeric.
                None | Some(Value::Null) => None,
                Some(val) => val.as_f64(),
            }
            .ok_or_else(|| CorrelateError::NonNumeric {
                column: column.to_string(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Ordinary least squares trend line for scatter charts
// ---------------------------------------------------------------------------

/// Fit `y = slope * x + intercept` by least squares. Returns `None` when the
/// fit is undefined (fewer than 2 points or zero variance in x).
pub fn trend_line(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    if xs.len() < 2 || xs.len() != ys.len() {
        return None;
    }
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let var_x: f64 = xs.iter().map(|x| (x - mean_x).powi(2)).sum();
    if var_x == 0.0 {
        return None;
    }
    let cov: f64 = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();
    let slope = cov / var_x;
    Some((slope, mean_y - slope * mean_x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;
    use std::collections::BTreeMap;

    fn numeric_dataset(rows: &[(f64, f64, f64)]) -> Dataset {
        let records = rows
            .iter()
            .map(|(a, b, c)| {
                let mut values = BTreeMap::new();
                values.insert("a".to_string(), Value::Float(*a));
                values.insert("b".to_string(), Value::Float(*b));
                values.insert("c".to_string(), Value::Float(*c));
                Record { values }
            })
            .collect();
        Dataset::from_records(records)
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_record_is_insufficient() {
        let ds = numeric_dataset(&[(1.0, 2.0, 3.0)]);
        assert_eq!(
            correlate(&ds, &[0], &cols(&["a", "b"])),
            Err(CorrelateError::InsufficientData { rows: 1 })
        );
    }

    #[test]
    fn zero_variance_column_is_rejected() {
        let ds = numeric_dataset(&[(1.0, 5.0, 1.0), (2.0, 5.0, 2.0)]);
        let err = correlate(&ds, &[0, 1], &cols(&["a", "b"])).unwrap_err();
        assert_eq!(
            err,
            CorrelateError::ZeroVariance {
                column: "b".to_string()
            }
        );
    }

    #[test]
    fn matrix_is_symmetric_with_unit_diagonal() {
        let ds = numeric_dataset(&[(1.0, 2.0, 9.0), (2.0, 1.0, 4.0), (3.0, 5.0, 1.0)]);
        let m = correlate(&ds, &[0, 1, 2], &cols(&["a", "b", "c"])).unwrap();
        for i in 0..3 {
            assert_eq!(m.coefficient(i, i), 1.0);
            for j in 0..3 {
                assert_eq!(m.coefficient(i, j), m.coefficient(j, i));
            }
        }
    }

    #[test]
    fn perfect_linear_relation_is_plus_minus_one() {
        // b = 2a, c = -a
        let ds = numeric_dataset(&[(1.0, 2.0, -1.0), (2.0, 4.0, -2.0), (3.0, 6.0, -3.0)]);
        let m = correlate(&ds, &[0, 1, 2], &cols(&["a", "b", "c"])).unwrap();
        assert!((m.coefficient(0, 1) - 1.0).abs() < 1e-12);
        assert!((m.coefficient(0, 2) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn coefficients_stay_in_range() {
        let ds = numeric_dataset(&[(1.0, 9.0, 2.0), (4.0, 1.0, 8.0), (2.0, 3.0, 5.0)]);
        let m = correlate(&ds, &[0, 1, 2], &cols(&["a", "b", "c"])).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let r = m.coefficient(i, j);
                assert!((-1.0..=1.0).contains(&r));
            }
        }
    }

    #[test]
    fn trend_line_fits_exact_line() {
        let xs = [1.0, 2.0, 3.0];
        let ys = [3.0, 5.0, 7.0];
        let (slope, intercept) = trend_line(&xs, &ys).unwrap();
        assert!((slope - 2.0).abs() < 1e-12);
        assert!((intercept - 1.0).abs() < 1e-12);
    }

    #[test]
    fn trend_line_undefined_cases() {
        assert_eq!(trend_line(&[1.0], &[2.0]), None);
        assert_eq!(trend_line(&[2.0, 2.0], &[1.0, 3.0]), None);
    }
}
