use arrow::array::Float64Array;

/// Mean, sample variance and sample standard deviation of a series.
///
/// `None` marks a statistic that is not computable: no values for the mean,
/// fewer than two for variance and standard deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dispersion {
    pub count: u64,
    pub mean: Option<f64>,
    pub variance: Option<f64>,
    pub std_dev: Option<f64>,
}

/// Welford accumulator over the non-missing values.
#[derive(Debug, Clone, Copy, Default)]
struct Moments {
    count: u64,
    mean: f64,
    m2: f64,
}

impl Moments {
    fn add(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    fn finish(self) -> Dispersion {
        let mean = (self.count > 0).then_some(self.mean);
        // m2 can dip a hair below zero on near-constant input
        let variance = (self.count > 1).then(|| (self.m2 / (self.count - 1) as f64).max(0.0));
        Dispersion {
            count: self.count,
            mean,
            variance,
            std_dev: variance.map(f64::sqrt),
        }
    }
}

pub fn dispersion(values: &Float64Array) -> Dispersion {
    let mut moments = Moments::default();
    for v in values.iter().flatten() {
        moments.add(v);
    }
    moments.finish()
}
