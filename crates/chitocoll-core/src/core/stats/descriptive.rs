use super::StatsError;

pub fn mean(values: &[f64]) -> Result<f64, StatsError> {
    if values.is_empty() {
        return Err(StatsError::EmptySample);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator); zero for a single value.
pub fn sample_std(values: &[f64]) -> Result<f64, StatsError> {
    let m = mean(values)?;
    if values.len() < 2 {
        return Ok(0.0);
    }
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Ok((ss / (values.len() - 1) as f64).sqrt())
}

/// Summary of one sample, the way a column description reports it.
///
/// `sem` is the standard error of the mean, `std / sqrt(count)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub sem: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    pub fn of(values: &[f64]) -> Result<Self, StatsError> {
        let mean = mean(values)?;
        let std = sample_std(values)?;
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });
        Ok(Self {
            count: values.len(),
            mean,
            std,
            sem: std / (values.len() as f64).sqrt(),
            min,
            max,
        })
    }
}
