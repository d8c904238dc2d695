//! Plot configuration.
//!
//! The defaults plot the domain `[0, 1]` with 100 steps into an 800 x 600 viewport.

use serde::{Deserialize, Serialize};

use crate::Real;
use crate::error::{SampleError, StateError};

/// Domain, resolution and viewport of a plot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub min_x: Real,
    pub max_x: Real,
    pub steps: usize,
    pub width: Real,
    pub height: Real,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            max_x: 1.0,
            steps: 100,
            width: 800.0,
            height: 600.0,
        }
    }
}

impl PlotConfig {
    /// Parse a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, StateError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check the values the sampler would reject.
    pub fn validate(&self) -> Result<(), SampleError> {
        if self.steps == 0 {
            return Err(SampleError::ZeroSteps);
        }
        if !(self.width.is_finite() && self.width > 0.0)
            || !(self.height.is_finite() && self.height > 0.0)
        {
            return Err(SampleError::InvalidViewport {
                width: self.width,
                height: self.height,
            });
        }
        if !(self.min_x.is_finite() && self.max_x.is_finite()) {
            return Err(SampleError::InvalidDomain {
                min_x: self.min_x,
                max_x: self.max_x,
            });
        }
        Ok(())
    }
}
