use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub mod dff;

/// Post-processing applied to a block outline after tiling.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Keep the tiled outline.
    #[default]
    None,
    /// Reshape the outline into a square of the same area.
    Magic,
    /// Force the outline to the assigned height and width.
    Override,
}

/// Outline of a tiled block. Lengths in meters.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Floorplan {
    pub rows: usize,
    pub cols: usize,
    pub height: f64,
    pub width: f64,
    pub area: f64,
}

impl Floorplan {
    pub fn aspect_ratio(&self) -> f64 {
        self.height / self.width
    }

    pub(crate) fn apply(
        mut self,
        mode: LayoutMode,
        new_height: f64,
        new_width: f64,
    ) -> Result<Self> {
        match mode {
            LayoutMode::None => {}
            LayoutMode::Magic => {
                self.height = self.area.sqrt();
                self.width = self.area / self.height;
            }
            LayoutMode::Override => {
                if !(new_height > 0.0 && new_width > 0.0) {
                    return Err(Error::config(
                        "override layout requires both a height and a width",
                    ));
                }
                self.height = new_height;
                self.width = new_width;
            }
        }
        Ok(self)
    }
}

/// Normalized switching threshold used for delay and ramp estimates.
const SWITCHING_VOLTAGE: f64 = 0.5;

/// Horowitz delay of an RC stage with time constant `tr` driven by an input
/// ramp of slope `ramp_input`. Returns the delay and the output ramp.
pub fn horowitz(tr: f64, beta: f64, ramp_input: f64) -> (f64, f64) {
    let vs = SWITCHING_VOLTAGE;
    let alpha = 1.0 / ramp_input / tr;
    let delay = tr * (vs.ln().powi(2) + 2.0 * alpha * beta * (1.0 - vs)).sqrt();
    (delay, (1.0 - vs) / delay)
}
