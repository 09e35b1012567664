use serde::{Deserialize, Serialize};

/// Summary of a set of episode rewards (or any other scalar series).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub mean: f32,
    /// Population standard deviation
    pub std: f32,
    pub min: f32,
    pub max: f32,
    pub count: usize,
}

impl Default for Statistics {
    fn default() -> Self {
        Statistics {
            mean: 0.0,
            std: 0.0,
            min: 0.0,
            max: 0.0,
            count: 0,
        }
    }
}

impl Statistics {
    /// Single pass (Welford) over `values`; all zeros when empty.
    pub fn from_slice(values: &[f32]) -> Self {
        let Some(&first) = values.first() else {
            return Statistics::default();
        };

        let mut acc = Statistics {
            mean: 0.0,
            std: 0.0,
            min: first,
            max: first,
            count: 0,
        };
        // `std` holds the running sum of squared deviations until the end
        for &value in values {
            acc.count += 1;
            let delta = value - acc.mean;
            acc.mean += delta / acc.count as f32;
            acc.std += delta * (value - acc.mean);
            acc.min = acc.min.min(value);
            acc.max = acc.max.max(value);
        }
        acc.std = (acc.std / acc.count as f32).max(0.0).sqrt();
        acc
    }
}
