use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use super::DeviceRoadmap;
use crate::error::{ensure_positive, Error, Result};

/// Process parameters of one technology node and roadmap.
///
/// Capacitances are per unit width (F/m), per unit area (F/m²) or
/// per unit perimeter (F/m). Currents are per unit width (A/m) at 300 K.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessParams {
    /// Feature size (m).
    pub feature_size: f64,
    /// Supply voltage (V).
    pub vdd: f64,
    /// Threshold voltage (V).
    pub vth: f64,
    /// Physical gate length (m).
    pub phy_gate_length: f64,
    pub cap_ideal_gate: f64,
    pub cap_fringe: f64,
    pub cap_overlap: f64,
    pub cap_junction: f64,
    pub cap_sidewall: f64,
    pub cap_drain_to_channel: f64,
    pub cap_polywire: f64,
    pub current_on_nmos: f64,
    pub current_on_pmos: f64,
    pub current_off_nmos: f64,
    pub current_off_pmos: f64,
    pub effective_resistance_multiplier: f64,
    /// PMOS to NMOS width ratio of a balanced gate.
    pub pn_size_ratio: f64,
}

impl ProcessParams {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("feature_size", self.feature_size),
            ("vdd", self.vdd),
            ("vth", self.vth),
            ("phy_gate_length", self.phy_gate_length),
            ("cap_ideal_gate", self.cap_ideal_gate),
            ("cap_fringe", self.cap_fringe),
            ("cap_overlap", self.cap_overlap),
            ("cap_junction", self.cap_junction),
            ("cap_sidewall", self.cap_sidewall),
            ("cap_drain_to_channel", self.cap_drain_to_channel),
            ("cap_polywire", self.cap_polywire),
            ("current_on_nmos", self.current_on_nmos),
            ("current_on_pmos", self.current_on_pmos),
            ("current_off_nmos", self.current_off_nmos),
            ("current_off_pmos", self.current_off_pmos),
            (
                "effective_resistance_multiplier",
                self.effective_resistance_multiplier,
            ),
            ("pn_size_ratio", self.pn_size_ratio),
        ] {
            ensure_positive(name, value)?;
        }
        if self.vth >= self.vdd {
            return Err(Error::config(format!(
                "threshold voltage {} V must be below supply voltage {} V",
                self.vth, self.vdd
            )));
        }
        Ok(())
    }
}

const FF_PER_UM: f64 = 1e-9;
const FF_PER_UM2: f64 = 1e-3;
const UA_PER_UM: f64 = 1.0;
const NA_PER_UM: f64 = 1e-3;
const EFFECTIVE_RESISTANCE_MULTIPLIER: f64 = 1.54;

/// One table row in the customary datasheet units:
/// nm, V, fF/um, fF/um², uA/um, nA/um.
struct Row {
    node: u32,
    vdd: f64,
    vth: f64,
    lg: f64,
    cg: f64,
    cf: f64,
    cov: f64,
    cj: f64,
    csw: f64,
    cdc: f64,
    ion_n: f64,
    ion_p: f64,
    ioff_n: f64,
    ioff_p: f64,
    pn: f64,
}

impl Row {
    fn params(&self) -> ProcessParams {
        ProcessParams {
            feature_size: self.node as f64 * 1e-9,
            vdd: self.vdd,
            vth: self.vth,
            phy_gate_length: self.lg * 1e-9,
            cap_ideal_gate: self.cg * FF_PER_UM,
            cap_fringe: self.cf * FF_PER_UM,
            cap_overlap: self.cov * FF_PER_UM,
            cap_junction: self.cj * FF_PER_UM2,
            cap_sidewall: self.csw * FF_PER_UM,
            cap_drain_to_channel: self.cdc * FF_PER_UM,
            cap_polywire: 0.1 * FF_PER_UM,
            current_on_nmos: self.ion_n * UA_PER_UM,
            current_on_pmos: self.ion_p * UA_PER_UM,
            current_off_nmos: self.ioff_n * NA_PER_UM,
            current_off_pmos: self.ioff_p * NA_PER_UM,
            effective_resistance_multiplier: EFFECTIVE_RESISTANCE_MULTIPLIER,
            pn_size_ratio: self.pn,
        }
    }
}

macro_rules! rows {
    ( $( $node:literal => [$vdd:expr, $vth:expr, $lg:expr, $cg:expr, $cf:expr, $cov:expr, $cj:expr, $csw:expr, $cdc:expr, $ion_n:expr, $ion_p:expr, $ioff_n:expr, $ioff_p:expr, $pn:expr] ),* $(,)? ) => {
        vec![ $( Row {
            node: $node, vdd: $vdd, vth: $vth, lg: $lg, cg: $cg, cf: $cf, cov: $cov,
            cj: $cj, csw: $csw, cdc: $cdc, ion_n: $ion_n, ion_p: $ion_p,
            ioff_n: $ioff_n, ioff_p: $ioff_p, pn: $pn,
        } ),* ]
    };
}

fn hp_rows() -> Vec<Row> {
    rows![
        130 => [1.30, 0.25, 65.0, 1.05, 0.23, 0.21, 1.00, 0.25, 0.40, 1020.0, 465.0, 20.0, 12.0, 2.1],
        90  => [1.20, 0.23, 37.0, 0.98, 0.21, 0.20, 1.00, 0.25, 0.38, 1080.0, 525.0, 50.0, 30.0, 2.0],
        65  => [1.10, 0.20, 25.0, 0.80, 0.20, 0.16, 1.00, 0.22, 0.36, 1200.0, 590.0, 100.0, 65.0, 2.0],
        45  => [1.00, 0.18, 18.0, 0.70, 0.18, 0.14, 1.00, 0.20, 0.33, 1290.0, 650.0, 150.0, 100.0, 1.9],
        32  => [0.90, 0.16, 13.0, 0.62, 0.17, 0.12, 1.00, 0.18, 0.30, 1340.0, 700.0, 200.0, 130.0, 1.8],
        28  => [0.90, 0.16, 12.0, 0.60, 0.16, 0.12, 1.00, 0.17, 0.29, 1380.0, 730.0, 210.0, 140.0, 1.8],
        22  => [0.85, 0.15, 10.0, 0.55, 0.15, 0.11, 1.00, 0.16, 0.27, 1420.0, 760.0, 230.0, 160.0, 1.7],
        14  => [0.80, 0.15, 16.0, 0.50, 0.15, 0.10, 1.00, 0.15, 0.26, 1600.0, 1100.0, 100.0, 80.0, 1.4],
        10  => [0.75, 0.15, 14.0, 0.47, 0.14, 0.09, 1.00, 0.14, 0.25, 1650.0, 1200.0, 100.0, 80.0, 1.3],
        7   => [0.70, 0.15, 12.0, 0.45, 0.13, 0.09, 1.00, 0.13, 0.24, 1700.0, 1300.0, 100.0, 80.0, 1.2],
    ]
}

fn lstp_rows() -> Vec<Row> {
    rows![
        130 => [1.50, 0.50, 75.0, 1.05, 0.23, 0.21, 1.00, 0.25, 0.40, 460.0, 200.0, 0.010, 0.006, 2.1],
        90  => [1.30, 0.48, 45.0, 0.98, 0.21, 0.20, 1.00, 0.25, 0.38, 500.0, 230.0, 0.015, 0.009, 2.0],
        65  => [1.20, 0.45, 32.0, 0.80, 0.20, 0.16, 1.00, 0.22, 0.36, 550.0, 260.0, 0.020, 0.012, 2.0],
        45  => [1.10, 0.43, 28.0, 0.70, 0.18, 0.14, 1.00, 0.20, 0.33, 580.0, 290.0, 0.030, 0.018, 1.9],
        32  => [1.00, 0.41, 22.0, 0.62, 0.17, 0.12, 1.00, 0.18, 0.30, 610.0, 310.0, 0.040, 0.025, 1.8],
        28  => [1.00, 0.41, 20.0, 0.60, 0.16, 0.12, 1.00, 0.17, 0.29, 620.0, 320.0, 0.045, 0.028, 1.8],
        22  => [0.95, 0.40, 18.0, 0.55, 0.15, 0.11, 1.00, 0.16, 0.27, 640.0, 340.0, 0.050, 0.030, 1.7],
        14  => [0.85, 0.38, 18.0, 0.50, 0.15, 0.10, 1.00, 0.15, 0.26, 780.0, 560.0, 0.050, 0.035, 1.4],
        10  => [0.80, 0.37, 16.0, 0.47, 0.14, 0.09, 1.00, 0.14, 0.25, 810.0, 600.0, 0.050, 0.035, 1.3],
        7   => [0.75, 0.36, 14.0, 0.45, 0.13, 0.09, 1.00, 0.13, 0.24, 840.0, 650.0, 0.050, 0.035, 1.2],
    ]
}

lazy_static! {
    static ref PROCESS_TABLE: HashMap<(u32, DeviceRoadmap), ProcessParams> = {
        let mut table = HashMap::new();
        for (roadmap, rows) in [
            (DeviceRoadmap::Hp, hp_rows()),
            (DeviceRoadmap::Lstp, lstp_rows()),
        ] {
            for row in rows {
                table.insert((row.node, roadmap), row.params());
            }
        }
        table
    };
}

pub(crate) fn lookup(process_node: u32, roadmap: DeviceRoadmap) -> Option<ProcessParams> {
    PROCESS_TABLE.get(&(process_node, roadmap)).copied()
}

/// Process nodes with built-in parameter tables, in nanometers.
pub fn supported_nodes() -> Vec<u32> {
    let mut nodes = hp_rows().iter().map(|row| row.node).collect::<Vec<_>>();
    nodes.sort_unstable();
    nodes
}
