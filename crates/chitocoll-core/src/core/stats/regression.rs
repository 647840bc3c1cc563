use super::StatsError;
use nalgebra::{DMatrix, DVector};

const SVD_EPSILON: f64 = 1e-10;

/// Ordinary least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn fit(xs: &[f64], ys: &[f64]) -> Result<Self, StatsError> {
        if xs.len() != ys.len() {
            return Err(StatsError::LengthMismatch {
                x: xs.len(),
                y: ys.len(),
            });
        }
        if xs.is_empty() {
            return Err(StatsError::EmptySample);
        }
        let n = xs.len() as f64;
        let x_mean = xs.iter().sum::<f64>() / n;
        let y_mean = ys.iter().sum::<f64>() / n;

        let sxx: f64 = xs.iter().map(|x| (x - x_mean).powi(2)).sum();
        if sxx == 0.0 {
            return Err(StatsError::DegenerateFit);
        }
        let sxy: f64 = xs
            .iter()
            .zip(ys)
            .map(|(x, y)| (x - x_mean) * (y - y_mean))
            .sum();

        let slope = sxy / sxx;
        Ok(Self {
            slope,
            intercept: y_mean - slope * x_mean,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    pub fn equation(&self) -> String {
        format!("Y = {:.2}X + {:.2}", self.slope, self.intercept)
    }
}

/// Coefficient of determination of `predicted` against `observed`.
///
/// A constant `observed` scores 1.0 when predicted exactly and 0.0 otherwise.
pub fn r_squared(observed: &[f64], predicted: &[f64]) -> Result<f64, StatsError> {
    if observed.len() != predicted.len() {
        return Err(StatsError::LengthMismatch {
            x: observed.len(),
            y: predicted.len(),
        });
    }
    if observed.is_empty() {
        return Err(StatsError::EmptySample);
    }
    let mean = observed.iter().sum::<f64>() / observed.len() as f64;
    let ss_tot: f64 = observed.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_res: f64 = observed
        .iter()
        .zip(predicted)
        .map(|(y, p)| (y - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}

/// Multiple linear regression with intercept, solved through an SVD so that
/// collinear or constant feature columns do not break the fit.
#[derive(Debug, Clone, PartialEq)]
pub struct LeastSquares {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LeastSquares {
    /// `rows` are feature vectors of equal length; `targets` one value per row.
    pub fn fit(rows: &[Vec<f64>], targets: &[f64]) -> Result<Self, StatsError> {
        if rows.len() != targets.len() {
            return Err(StatsError::LengthMismatch {
                x: rows.len(),
                y: targets.len(),
            });
        }
        if rows.is_empty() {
            return Err(StatsError::EmptySample);
        }
        let width = rows[0].len();
        if let Some(bad) = rows.iter().find(|r| r.len() != width) {
            return Err(StatsError::LengthMismatch {
                x: width,
                y: bad.len(),
            });
        }

        let design = DMatrix::from_fn(rows.len(), width + 1, |r, c| {
            if c == 0 { 1.0 } else { rows[r][c - 1] }
        });
        let y = DVector::from_column_slice(targets);

        let solution = design
            .svd(true, true)
            .solve(&y, SVD_EPSILON)
            .map_err(|e| StatsError::Solve(e.to_string()))?;

        Ok(Self {
            intercept: solution[0],
            coefficients: solution.iter().skip(1).copied().collect(),
        })
    }

    pub fn predict(&self, features: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }
}
