//! Area, latency and power model of an array of master/slave D flip-flops.
//!
//! Each flip-flop is two transmission-gate latches (two transmission gates
//! and two inverters each) plus a local clock inverter. When the storage cell
//! is transistor accessed, every flip-flop also carries one access transistor
//! for its non-volatile shadow cell.
//!
//! The estimator is a four-stage state machine:
//! [`Dff::initialize`], [`Dff::calculate_area`], [`Dff::calculate_latency`]
//! and [`Dff::calculate_power`] must run in that order.

use std::fmt::{Display, Formatter};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::{horowitz, Floorplan, LayoutMode};
use crate::cell::MemCell;
use crate::config::InputParameter;
use crate::error::{ensure_positive, Error, Result, Stage};
use crate::tech::formula::MIN_NMOS_SIZE;
use crate::tech::{Footprint, GateKind, MosType, Technology};

pub const INVERTERS_PER_FLIP_FLOP: usize = 5;
pub const TRANSMISSION_GATES_PER_FLIP_FLOP: usize = 4;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DffState {
    Uninitialized,
    Initialized,
    AreaComputed,
    LatencyComputed,
    PowerComputed,
}

impl Display for DffState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DffState::Uninitialized => write!(f, "uninitialized"),
            DffState::Initialized => write!(f, "initialized"),
            DffState::AreaComputed => write!(f, "area computed"),
            DffState::LatencyComputed => write!(f, "latency computed"),
            DffState::PowerComputed => write!(f, "power computed"),
        }
    }
}

/// Device sizing chosen at initialization. Widths in meters.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct DffSizing {
    pub num_bits: usize,
    pub clock_frequency: f64,
    pub width_inv_n: f64,
    pub width_inv_p: f64,
    pub width_tg_n: f64,
    pub width_tg_p: f64,
    pub width_access: Option<f64>,
}

/// Node capacitances of one flip-flop (F).
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct NodeCapacitance {
    pub inv_input: f64,
    pub inv_output: f64,
    pub tg_gate_n: f64,
    pub tg_gate_p: f64,
    pub tg_drain: f64,
    pub access_drain: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct DffArea {
    pub floorplan: Floorplan,
    pub inv: Footprint,
    pub tg: Footprint,
    pub access: Option<Footprint>,
    pub cap: NodeCapacitance,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct DffLatency {
    /// Clock-to-Q delay (s).
    pub read_latency: f64,
    pub ramp_output: f64,
    /// Capacitance on the output node (F).
    pub load_cap: f64,
    /// Total capacitance switched along the D to Q path (F).
    pub data_path_cap: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct DffPower {
    /// Dynamic energy per operation (J).
    pub read_dynamic_energy: f64,
    /// Leakage current (A).
    pub leakage: f64,
}

/// Results of a completed estimation in reporting units.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct DffReport {
    pub area_um2: f64,
    pub height_um: f64,
    pub width_um: f64,
    pub read_latency_ns: f64,
    pub read_dynamic_energy_nj: f64,
    pub leakage_na: f64,
    pub leakage_power_uw: f64,
    pub meets_timing: bool,
}

#[derive(Debug)]
pub struct Dff<'a> {
    input: &'a InputParameter,
    tech: &'a Technology,
    cell: &'a MemCell,
    state: DffState,
    sizing: Option<DffSizing>,
    area: Option<DffArea>,
    latency: Option<DffLatency>,
    power: Option<DffPower>,
}

impl<'a> Dff<'a> {
    pub fn new(input: &'a InputParameter, tech: &'a Technology, cell: &'a MemCell) -> Result<Self> {
        input.validate()?;
        if input.key() != tech.key() {
            return Err(Error::config(format!(
                "operating conditions select {}, but the technology is {}",
                input.key(),
                tech.key()
            )));
        }
        if cell.technology() != tech.key() || cell.process_params() != tech.params() {
            return Err(Error::config(format!(
                "memory cell was characterized for {}, not {}",
                cell.technology(),
                tech.key()
            )));
        }
        if cell.temperature() != input.temperature {
            return Err(Error::config(format!(
                "memory cell was characterized at {} K, not {} K",
                cell.temperature(),
                input.temperature
            )));
        }
        Ok(Self {
            input,
            tech,
            cell,
            state: DffState::Uninitialized,
            sizing: None,
            area: None,
            latency: None,
            power: None,
        })
    }

    #[inline]
    pub fn state(&self) -> DffState {
        self.state
    }

    fn expect_state(&self, stage: Stage, required: DffState) -> Result<()> {
        if self.state == required {
            Ok(())
        } else {
            Err(Error::Sequence {
                stage,
                state: self.state,
            })
        }
    }

    pub fn initialize(&mut self, num_bits: usize, clock_frequency: f64) -> Result<()> {
        self.expect_state(Stage::Initialize, DffState::Uninitialized)?;
        if num_bits < 1 {
            return Err(Error::config("a flip-flop array needs at least one bit"));
        }
        ensure_positive("clock frequency", clock_frequency)?;

        let f = self.tech.feature_size();
        let width_n = MIN_NMOS_SIZE * f;
        let width_p = self.tech.pn_size_ratio() * width_n;

        let sizing = DffSizing {
            num_bits,
            clock_frequency,
            width_inv_n: width_n,
            width_inv_p: width_p,
            width_tg_n: width_n,
            width_tg_p: width_p,
            width_access: self.cell.access_transistor_width().map(|w| w * f),
        };
        debug!("dff sizing: {sizing:?}");

        self.sizing = Some(sizing);
        self.state = DffState::Initialized;
        Ok(())
    }

    /// Tiles the flip-flops under an optional height and/or width constraint.
    ///
    /// A constraint of zero leaves that dimension free.
    pub fn calculate_area(&mut self, height: f64, width: f64, mode: LayoutMode) -> Result<()> {
        self.expect_state(Stage::CalculateArea, DffState::Initialized)?;
        let sizing = self.sizing(Stage::CalculateArea)?;
        for (name, value) in [("height", height), ("width", width)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::config(format!(
                    "assigned {name} must be non-negative, got {value}"
                )));
            }
        }

        let tech = self.tech;
        let region = tech.max_transistor_height();
        let inv = tech.gate_area(sizing.width_inv_n, sizing.width_inv_p, region)?;
        let tg = tech.gate_area(sizing.width_tg_n, sizing.width_tg_p, region)?;
        let access = sizing
            .width_access
            .map(|w| tech.gate_area(w, 0.0, region))
            .transpose()?;

        let access_fp = access.unwrap_or_default();
        let ff_height = inv.height.max(tg.height).max(access_fp.height);
        let ff_width = INVERTERS_PER_FLIP_FLOP as f64 * inv.width
            + TRANSMISSION_GATES_PER_FLIP_FLOP as f64 * tg.width
            + access_fp.width;

        let floorplan =
            tile(sizing.num_bits, ff_height, ff_width, height, width)?.apply(mode, height, width)?;

        let cap = NodeCapacitance {
            inv_input: tech.gate_capacitance(sizing.width_inv_n)
                + tech.gate_capacitance(sizing.width_inv_p),
            inv_output: tech.drain_capacitance(sizing.width_inv_n, MosType::Nmos, inv.height)
                + tech.drain_capacitance(sizing.width_inv_p, MosType::Pmos, inv.height),
            tg_gate_n: tech.gate_capacitance(sizing.width_tg_n),
            tg_gate_p: tech.gate_capacitance(sizing.width_tg_p),
            tg_drain: tech.drain_capacitance(sizing.width_tg_n, MosType::Nmos, tg.height)
                + tech.drain_capacitance(sizing.width_tg_p, MosType::Pmos, tg.height),
            access_drain: match (sizing.width_access, access) {
                (Some(w), Some(fp)) => tech.drain_capacitance(w, MosType::Nmos, fp.height),
                _ => 0.0,
            },
        };
        debug!("dff floorplan: {floorplan:?}, node capacitance: {cap:?}");

        self.area = Some(DffArea {
            floorplan,
            inv,
            tg,
            access,
            cap,
        });
        self.state = DffState::AreaComputed;
        Ok(())
    }

    /// Clock-to-Q latency for a clock edge of slope `ramp_input`, with the
    /// output loaded by `load_factor` minimum inverter inputs.
    pub fn calculate_latency(&mut self, ramp_input: f64, load_factor: f64) -> Result<()> {
        self.expect_state(Stage::CalculateLatency, DffState::AreaComputed)?;
        ensure_positive("input ramp", ramp_input)?;
        if !(load_factor.is_finite() && load_factor >= 0.0) {
            return Err(Error::config(format!(
                "load factor must be non-negative, got {load_factor}"
            )));
        }

        let sizing = self.sizing(Stage::CalculateLatency)?;
        let cap = self.area_stage(Stage::CalculateLatency)?.cap;
        let tech = self.tech;
        let t = self.input.temperature;

        let r_inv_n = tech.on_resistance(sizing.width_inv_n, MosType::Nmos, t);
        let r_inv_p = tech.on_resistance(sizing.width_inv_p, MosType::Pmos, t);
        let r_tg_n = tech.on_resistance(sizing.width_tg_n, MosType::Nmos, t);
        let r_tg_p = tech.on_resistance(sizing.width_tg_p, MosType::Pmos, t);
        let r_tg = r_tg_n * r_tg_p / (r_tg_n + r_tg_p);

        let gm_inv_n = tech.transconductance(sizing.width_inv_n, MosType::Nmos, t);
        let gm_inv_p = tech.transconductance(sizing.width_inv_p, MosType::Pmos, t);
        let gm_tg = tech.transconductance(sizing.width_tg_n, MosType::Nmos, t)
            + tech.transconductance(sizing.width_tg_p, MosType::Pmos, t);

        let load_cap = load_factor * cap.inv_input + cap.access_drain;
        let clock_cap = cap.inv_output + 2.0 * (cap.tg_gate_n + cap.tg_gate_p);
        let data_path = [
            // master transmission gate into the master latch
            (r_tg, gm_tg, 2.0 * cap.tg_drain + cap.inv_input),
            // master latch inverter
            (r_inv_p, gm_inv_p, cap.inv_output + cap.tg_drain + cap.inv_input),
            // slave transmission gate
            (r_tg, gm_tg, 2.0 * cap.tg_drain + cap.inv_input),
            // output inverter
            (r_inv_n, gm_inv_n, cap.inv_output + load_cap),
        ];

        let mut ramp = ramp_input;
        let mut read_latency = 0.0;
        for (r, gm, c) in std::iter::once((r_inv_n, gm_inv_n, clock_cap)).chain(data_path) {
            let (delay, ramp_output) = horowitz(r * c, 1.0 / (r * gm), ramp);
            read_latency += delay;
            ramp = ramp_output;
        }

        let period = 1.0 / sizing.clock_frequency;
        if read_latency > period {
            warn!(
                "flip-flop latency {:.3e} s exceeds the clock period {:.3e} s",
                read_latency, period
            );
        }
        debug!("dff read latency: {read_latency:e} s");

        self.latency = Some(DffLatency {
            read_latency,
            ramp_output: ramp,
            load_cap,
            data_path_cap: data_path.iter().map(|(_, _, c)| c).sum(),
        });
        self.state = DffState::LatencyComputed;
        Ok(())
    }

    /// Energy of one operation in which `toggle_count` flip-flops change
    /// state, scaled by `activity`.
    ///
    /// A flip-flop toggles at most once per operation, so `toggle_count` is
    /// clamped to the number of bits.
    pub fn calculate_power(
        &mut self,
        activity: f64,
        toggle_count: usize,
        include_leakage: bool,
    ) -> Result<()> {
        self.expect_state(Stage::CalculatePower, DffState::LatencyComputed)?;
        if !(activity.is_finite() && activity >= 0.0) {
            return Err(Error::config(format!(
                "activity factor must be non-negative, got {activity}"
            )));
        }

        let sizing = self.sizing(Stage::CalculatePower)?;
        let cap = self.area_stage(Stage::CalculatePower)?.cap;
        let latency = self.latency_stage(Stage::CalculatePower)?;
        let tech = self.tech;
        let vdd = tech.vdd();
        let num_bits = sizing.num_bits as f64;

        // The clock nets charge and discharge once per cycle in every flip-flop.
        let clock_cap = cap.inv_input
            + cap.inv_output
            + TRANSMISSION_GATES_PER_FLIP_FLOP as f64 * (cap.tg_gate_n + cap.tg_gate_p);
        let clock_energy = num_bits * clock_cap * vdd * vdd;

        let toggling = toggle_count.min(sizing.num_bits) as f64;
        let data_energy = toggling * 0.5 * latency.data_path_cap * vdd * vdd;

        let read_dynamic_energy = activity * (clock_energy + data_energy);

        let leakage = if include_leakage {
            let t = self.input.temperature;
            let per_flip_flop = INVERTERS_PER_FLIP_FLOP as f64
                * tech.gate_leakage(GateKind::Inverter, sizing.width_inv_n, sizing.width_inv_p, t)
                + TRANSMISSION_GATES_PER_FLIP_FLOP as f64
                    * tech.gate_leakage(
                        GateKind::TransmissionGate,
                        sizing.width_tg_n,
                        sizing.width_tg_p,
                        t,
                    )
                + sizing
                    .width_access
                    .map(|w| tech.gate_leakage(GateKind::Nmos, w, 0.0, t))
                    .unwrap_or(0.0);
            num_bits * per_flip_flop
        } else {
            0.0
        };
        debug!("dff dynamic energy: {read_dynamic_energy:e} J, leakage: {leakage:e} A");

        self.power = Some(DffPower {
            read_dynamic_energy,
            leakage,
        });
        self.state = DffState::PowerComputed;
        Ok(())
    }

    fn sizing(&self, stage: Stage) -> Result<DffSizing> {
        self.sizing.ok_or(Error::Sequence {
            stage,
            state: self.state,
        })
    }

    fn area_stage(&self, stage: Stage) -> Result<DffArea> {
        self.area.ok_or(Error::Sequence {
            stage,
            state: self.state,
        })
    }

    fn latency_stage(&self, stage: Stage) -> Result<DffLatency> {
        self.latency.ok_or(Error::Sequence {
            stage,
            state: self.state,
        })
    }

    #[inline]
    pub fn sizing_details(&self) -> Option<&DffSizing> {
        self.sizing.as_ref()
    }

    #[inline]
    pub fn area_details(&self) -> Option<&DffArea> {
        self.area.as_ref()
    }

    #[inline]
    pub fn latency_details(&self) -> Option<&DffLatency> {
        self.latency.as_ref()
    }

    /// Area in m².
    pub fn area(&self) -> Option<f64> {
        self.area.map(|a| a.floorplan.area)
    }

    pub fn height(&self) -> Option<f64> {
        self.area.map(|a| a.floorplan.height)
    }

    pub fn width(&self) -> Option<f64> {
        self.area.map(|a| a.floorplan.width)
    }

    /// Read latency in seconds.
    pub fn read_latency(&self) -> Option<f64> {
        self.latency.map(|l| l.read_latency)
    }

    /// Read dynamic energy in joules.
    pub fn read_dynamic_energy(&self) -> Option<f64> {
        self.power.map(|p| p.read_dynamic_energy)
    }

    /// Leakage current in amperes.
    pub fn leakage(&self) -> Option<f64> {
        self.power.map(|p| p.leakage)
    }

    /// Leakage power in watts.
    pub fn leakage_power(&self) -> Option<f64> {
        self.leakage().map(|i| i * self.tech.vdd())
    }

    pub fn meets_timing(&self) -> Option<bool> {
        let sizing = self.sizing.as_ref()?;
        self.read_latency()
            .map(|latency| latency <= 1.0 / sizing.clock_frequency)
    }

    pub fn report(&self) -> Option<DffReport> {
        if self.state != DffState::PowerComputed {
            return None;
        }
        Some(DffReport {
            area_um2: self.area()? * 1e12,
            height_um: self.height()? * 1e6,
            width_um: self.width()? * 1e6,
            read_latency_ns: self.read_latency()? * 1e9,
            read_dynamic_energy_nj: self.read_dynamic_energy()? * 1e9,
            leakage_na: self.leakage()? * 1e9,
            leakage_power_uw: self.leakage_power()? * 1e6,
            meets_timing: self.meets_timing()?,
        })
    }
}

/// Arranges `n` flip-flops of `ff_height` × `ff_width` in a grid.
fn tile(n: usize, ff_height: f64, ff_width: f64, height: f64, width: f64) -> Result<Floorplan> {
    let (rows, cols, h, w) = if height > 0.0 {
        let per_col = (height / ff_height).floor() as usize;
        if per_col < 1 {
            return Err(Error::config(format!(
                "flip-flop height {ff_height:e} m exceeds the assigned height {height:e} m"
            )));
        }
        let rows = per_col.min(n);
        let cols = n.div_ceil(rows);
        let w = cols as f64 * ff_width;
        if width > 0.0 && w > width {
            return Err(Error::config(format!(
                "{n} flip-flops do not fit in {height:e} m × {width:e} m"
            )));
        }
        (rows, cols, height, w)
    } else if width > 0.0 {
        let per_row = (width / ff_width).floor() as usize;
        if per_row < 1 {
            return Err(Error::config(format!(
                "flip-flop width {ff_width:e} m exceeds the assigned width {width:e} m"
            )));
        }
        let cols = per_row.min(n);
        let rows = n.div_ceil(cols);
        (rows, cols, rows as f64 * ff_height, width)
    } else {
        let cols = (n as f64).sqrt().ceil() as usize;
        let rows = n.div_ceil(cols);
        (rows, cols, rows as f64 * ff_height, cols as f64 * ff_width)
    };

    Ok(Floorplan {
        rows,
        cols,
        height: h,
        width: w,
        area: h * w,
    })
}
