//! Closed-form transistor formulas.
//!
//! Every function here takes planar-equivalent widths and heights in meters.
//! FinFET geometry correction is applied by [`crate::tech::Technology`]
//! before calling into this module.

use serde::{Deserialize, Serialize};

use super::table::ProcessParams;
use super::MosType;
use crate::error::{Error, Result};

// Layout rules, in units of feature size.
pub const MIN_NMOS_SIZE: f64 = 1.5;
pub const MIN_GAP_BET_P_AND_N_DIFFS: f64 = 3.5;
pub const MIN_GAP_BET_CONTACT_POLY: f64 = 0.7;
pub const CONTACT_SIZE: f64 = 1.3;
pub const MIN_WIDTH_POWER_RAIL: f64 = 3.4;
pub const POLY_WIDTH: f64 = 1.0;
pub const MAX_TRANSISTOR_HEIGHT: f64 = 28.0;
pub const MAX_TRANSISTOR_HEIGHT_FINFET: f64 = 34.0;

pub const NOMINAL_TEMPERATURE: f64 = 300.0;
pub const MAX_TEMPERATURE: f64 = 400.0;
/// Off current doubles every this many kelvin.
const LEAKAGE_DOUBLING_TEMPERATURE: f64 = 20.0;

/// Which devices of a gate leak, and how.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum GateKind {
    /// Exactly one of the two devices is off in either input state.
    Inverter,
    /// Both devices are off while the gate is open.
    TransmissionGate,
    /// A lone NMOS device, e.g. a cell access transistor.
    Nmos,
}

/// Layout outline of a single gate.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Footprint {
    pub height: f64,
    pub width: f64,
}

impl Footprint {
    pub fn area(&self) -> f64 {
        self.height * self.width
    }
}

pub fn validate_temperature(temperature: f64) -> Result<()> {
    if (NOMINAL_TEMPERATURE..=MAX_TEMPERATURE).contains(&temperature) {
        Ok(())
    } else {
        Err(Error::config(format!(
            "temperature {temperature} K is outside the characterized range \
             {NOMINAL_TEMPERATURE}-{MAX_TEMPERATURE} K"
        )))
    }
}

pub fn on_current(p: &ProcessParams, mos: MosType, temperature: f64) -> f64 {
    let base = match mos {
        MosType::Nmos => p.current_on_nmos,
        MosType::Pmos => p.current_on_pmos,
    };
    base * (temperature / NOMINAL_TEMPERATURE).powf(-1.5)
}

pub fn off_current(p: &ProcessParams, mos: MosType, temperature: f64) -> f64 {
    let base = match mos {
        MosType::Nmos => p.current_off_nmos,
        MosType::Pmos => p.current_off_pmos,
    };
    base * 2f64.powf((temperature - NOMINAL_TEMPERATURE) / LEAKAGE_DOUBLING_TEMPERATURE)
}

pub fn gate_capacitance(p: &ProcessParams, width: f64) -> f64 {
    (p.cap_ideal_gate + p.cap_overlap + 3.0 * p.cap_fringe) * width
        + p.phy_gate_length * p.cap_polywire
}

/// Splits `width` into equal fingers no wider than `max_width`.
fn fold(width: f64, max_width: f64) -> (usize, f64) {
    if width <= max_width {
        (1, width)
    } else {
        let folds = (width / max_width).ceil() as usize;
        (folds, width / folds as f64)
    }
}

/// Drain regions of a folded device with shared diffusion.
fn drain_regions(folds: usize) -> usize {
    if folds % 2 == 0 {
        folds / 2
    } else {
        (folds + 1) / 2
    }
}

/// Share of the transistor region height given to each device type.
fn height_share(p: &ProcessParams, mos: MosType) -> f64 {
    match mos {
        MosType::Nmos => 1.0 / (1.0 + p.pn_size_ratio),
        MosType::Pmos => p.pn_size_ratio / (1.0 + p.pn_size_ratio),
    }
}

pub fn drain_capacitance(p: &ProcessParams, width: f64, mos: MosType, height: f64) -> f64 {
    let f = p.feature_size;
    let available =
        (height_share(p, mos) * (height - MIN_GAP_BET_P_AND_N_DIFFS * f)).max(MIN_NMOS_SIZE * f);
    let (folds, finger_width) = fold(width, available);
    let drain_length = (CONTACT_SIZE + 2.0 * MIN_GAP_BET_CONTACT_POLY) * f;

    let per_region = p.cap_junction * finger_width * drain_length
        + p.cap_sidewall * (2.0 * drain_length + finger_width);
    drain_regions(folds) as f64 * per_region + p.cap_drain_to_channel * width
}

pub fn on_resistance(p: &ProcessParams, width: f64, mos: MosType, temperature: f64) -> f64 {
    p.effective_resistance_multiplier * p.vdd / (on_current(p, mos, temperature) * width)
}

pub fn transconductance(p: &ProcessParams, width: f64, mos: MosType, temperature: f64) -> f64 {
    2.0 * on_current(p, mos, temperature) * width / (p.vdd - p.vth)
}

/// Average sub-threshold leakage current of a gate, in amperes.
pub fn gate_leakage(
    p: &ProcessParams,
    kind: GateKind,
    width_nmos: f64,
    width_pmos: f64,
    temperature: f64,
) -> f64 {
    let leak_n = width_nmos * off_current(p, MosType::Nmos, temperature);
    let leak_p = width_pmos * off_current(p, MosType::Pmos, temperature);
    match kind {
        GateKind::Inverter => (leak_n + leak_p) / 2.0,
        GateKind::TransmissionGate => leak_n + leak_p,
        GateKind::Nmos => leak_n,
    }
}

/// Lays out a complementary pair (either width may be zero) in a region
/// of height `height_region`, folding devices that do not fit.
pub fn gate_area(
    p: &ProcessParams,
    width_nmos: f64,
    width_pmos: f64,
    height_region: f64,
) -> Result<Footprint> {
    let f = p.feature_size;
    let gap = MIN_GAP_BET_P_AND_N_DIFFS * f;
    let rail = MIN_WIDTH_POWER_RAIL * f;
    let usable = height_region - gap;
    let total = width_nmos + width_pmos;

    if !(usable > 0.0) {
        return Err(Error::config(format!(
            "transistor region of {height_region:e} m cannot contain the P/N diffusion gap"
        )));
    }
    if !(total > 0.0) || width_nmos < 0.0 || width_pmos < 0.0 {
        return Err(Error::config("gate must contain at least one device"));
    }

    let folds = |width: f64| {
        if width > 0.0 {
            fold(width, usable * width / total).0
        } else {
            0
        }
    };
    let fingers = folds(width_nmos).max(folds(width_pmos));
    let contact_region = (CONTACT_SIZE + 2.0 * MIN_GAP_BET_CONTACT_POLY) * f;

    let width = fingers as f64 * POLY_WIDTH * f + (fingers + 1) as f64 * contact_region;
    let diffusion = if fingers > 1 { usable } else { total };

    Ok(Footprint {
        height: diffusion + gap + 2.0 * rail,
        width,
    })
}
