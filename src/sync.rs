//! # Target Synchronization
//!
//! The target estimator only ever changes through this module: either a hard
//! copy of the online parameters, or a Polyak blend
//! `target = tau * online + (1 - tau) * target`.

use serde::{Deserialize, Serialize};

use crate::error::{DqnError, Result};
use crate::value_function::{Parameters, ValueFunction};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Overwrite the target with the online parameters.
    Hard,
    /// Blend a fraction `tau` of the online parameters into the target.
    Soft { tau: f32 },
}

impl SyncMode {
    pub fn from_flag(soft_update: bool, tau: f32) -> Self {
        if soft_update {
            SyncMode::Soft { tau }
        } else {
            SyncMode::Hard
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let SyncMode::Soft { tau } = self {
            if !(*tau > 0.0 && *tau <= 1.0) {
                return Err(DqnError::invalid_hyperparameter(
                    "tau".to_string(),
                    format!("must lie in (0, 1], got {}", tau),
                ));
            }
        }
        Ok(())
    }
}

/// Update `target` from `online` in place.
///
/// Both maps must carry the same keys with the same shapes, otherwise this
/// fails with `ParameterMismatch` and leaves `target` untouched.
pub fn sync(online: &Parameters, target: &mut Parameters, mode: SyncMode) -> Result<()> {
    mode.validate()?;
    online.check_compatible(target)?;

    match mode {
        SyncMode::Hard => {
            for (name, tensor) in target.iter_mut() {
                if let Some(source) = online.get(name) {
                    tensor.assign(source);
                }
            }
        }
        SyncMode::Soft { tau } => {
            for (name, tensor) in target.iter_mut() {
                if let Some(source) = online.get(name) {
                    tensor.zip_mut_with(source, |t, &o| *t = tau * o + (1.0 - tau) * *t);
                }
            }
        }
    }
    Ok(())
}

/// Pull parameters out of both estimators, sync, and write the target back.
pub fn sync_networks<O, T>(online: &O, target: &mut T, mode: SyncMode) -> Result<()>
where
    O: ValueFunction + ?Sized,
    T: ValueFunction + ?Sized,
{
    let online_params = online.parameters();
    let mut target_params = target.parameters();
    sync(&online_params, &mut target_params, mode)?;
    target.set_parameters(&target_params)
}
