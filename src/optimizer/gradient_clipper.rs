use crate::value_function::Parameters;

/// Gradient clipping methods
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GradientClipper {
    /// Clip each gradient element into `[min, max]`
    ClipByValue { min: f32, max: f32 },

    /// Rescale every tensor together when their joint L2 norm exceeds `max_norm`
    ClipByGlobalNorm { max_norm: f32 },

    /// No clipping
    None,
}

impl GradientClipper {
    pub fn from_max_norm(max_norm: Option<f32>) -> Self {
        match max_norm {
            Some(max_norm) => GradientClipper::ClipByGlobalNorm { max_norm },
            None => GradientClipper::None,
        }
    }

    /// Clip `gradients` in place and return the global norm measured before clipping.
    pub fn clip(&self, gradients: &mut Parameters) -> f32 {
        let global_norm = gradients.global_norm();
        match self {
            GradientClipper::ClipByValue { min, max } => {
                for (_, tensor) in gradients.iter_mut() {
                    tensor.mapv_inplace(|g| g.max(*min).min(*max));
                }
            }

            GradientClipper::ClipByGlobalNorm { max_norm } => {
                if global_norm > *max_norm {
                    gradients.scale(max_norm / global_norm);
                }
            }

            GradientClipper::None => {}
        }
        global_norm
    }
}
