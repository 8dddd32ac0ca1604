use std::fmt::Display;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub mod formula;
pub mod table;

#[cfg(test)]
mod tests;

pub use formula::{Footprint, GateKind};
pub use table::{supported_nodes, ProcessParams};

use formula::{MAX_TRANSISTOR_HEIGHT, MAX_TRANSISTOR_HEIGHT_FINFET};

/// Nodes at or below this process node (nm) use a FinFET device structure.
pub const FINFET_MAX_NODE: u32 = 14;

/// MOSFET types
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MosType {
    /// An n-channel transistor
    #[default]
    Nmos,
    /// A p-channel transistor
    Pmos,
}

impl Display for MosType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            MosType::Nmos => write!(f, "nmos"),
            MosType::Pmos => write!(f, "pmos"),
        }
    }
}

/// Device roadmap flavor of a technology node.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceRoadmap {
    /// High performance
    #[default]
    Hp,
    /// Low standby power
    Lstp,
}

impl FromStr for DeviceRoadmap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hp" => Ok(Self::Hp),
            "lstp" => Ok(Self::Lstp),
            _ => Err(Error::config(format!("unrecognized device roadmap `{s}`"))),
        }
    }
}

impl Display for DeviceRoadmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Hp => write!(f, "hp"),
            Self::Lstp => write!(f, "lstp"),
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransistorType {
    #[default]
    Conventional,
}

impl FromStr for TransistorType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "conventional" => Ok(Self::Conventional),
            _ => Err(Error::config(format!("unrecognized transistor type `{s}`"))),
        }
    }
}

impl Display for TransistorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Conventional => write!(f, "conventional"),
        }
    }
}

/// The selectors a [`Technology`] was initialized from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TechnologyKey {
    /// Process node in nanometers.
    pub process_node: u32,
    pub roadmap: DeviceRoadmap,
    pub transistor_type: TransistorType,
}

impl Display for TechnologyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}nm {} {}",
            self.process_node, self.roadmap, self.transistor_type
        )
    }
}

/// Width and height scaling applied to planar-equivalent device geometry.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryCorrection {
    pub width: f64,
    pub height: f64,
}

impl GeometryCorrection {
    pub const PLANAR: Self = Self {
        width: 1.0,
        height: 1.0,
    };

    pub const FINFET: Self = Self {
        width: 2.0,
        height: MAX_TRANSISTOR_HEIGHT / MAX_TRANSISTOR_HEIGHT_FINFET,
    };

    pub fn for_node(process_node: u32) -> Self {
        if process_node <= FINFET_MAX_NODE {
            Self::FINFET
        } else {
            Self::PLANAR
        }
    }
}

/// An initialized transistor technology.
#[derive(Debug, Clone, PartialEq)]
pub struct Technology {
    key: TechnologyKey,
    params: ProcessParams,
}

impl Technology {
    pub fn new(
        process_node: u32,
        roadmap: DeviceRoadmap,
        transistor_type: TransistorType,
    ) -> Result<Self> {
        let key = TechnologyKey {
            process_node,
            roadmap,
            transistor_type,
        };
        let params = Self::lookup(&key)?;
        debug!("initialized technology {key}");
        Ok(Self { key, params })
    }

    /// Builds a technology from explicit process parameters.
    pub fn with_params(key: TechnologyKey, params: ProcessParams) -> Result<Self> {
        if key.process_node == 0 {
            return Err(Error::config("process node must be positive"));
        }
        params.validate()?;
        Ok(Self { key, params })
    }

    /// Re-initializes this technology.
    ///
    /// Returns `true` if the parameters changed, in which case every
    /// [`crate::cell::MemCell`] derived from the previous state is stale.
    pub fn initialize(
        &mut self,
        process_node: u32,
        roadmap: DeviceRoadmap,
        transistor_type: TransistorType,
    ) -> Result<bool> {
        let key = TechnologyKey {
            process_node,
            roadmap,
            transistor_type,
        };
        if key == self.key {
            return Ok(false);
        }
        self.params = Self::lookup(&key)?;
        self.key = key;
        debug!("re-initialized technology {key}");
        Ok(true)
    }

    fn lookup(key: &TechnologyKey) -> Result<ProcessParams> {
        if key.process_node == 0 {
            return Err(Error::config("process node must be positive"));
        }
        table::lookup(key.process_node, key.roadmap).ok_or_else(|| {
            Error::config(format!(
                "no parameter table for {}nm (supported: {:?})",
                key.process_node,
                supported_nodes()
            ))
        })
    }

    #[inline]
    pub fn key(&self) -> TechnologyKey {
        self.key
    }

    #[inline]
    pub fn params(&self) -> &ProcessParams {
        &self.params
    }

    #[inline]
    pub fn feature_size(&self) -> f64 {
        self.params.feature_size
    }

    #[inline]
    pub fn vdd(&self) -> f64 {
        self.params.vdd
    }

    #[inline]
    pub fn pn_size_ratio(&self) -> f64 {
        self.params.pn_size_ratio
    }

    pub fn is_finfet(&self) -> bool {
        self.key.process_node <= FINFET_MAX_NODE
    }

    pub fn geometry(&self) -> GeometryCorrection {
        GeometryCorrection::for_node(self.key.process_node)
    }

    /// Height of the region a standard gate is drawn in (m).
    pub fn max_transistor_height(&self) -> f64 {
        let units = if self.is_finfet() {
            MAX_TRANSISTOR_HEIGHT_FINFET
        } else {
            MAX_TRANSISTOR_HEIGHT
        };
        units * self.params.feature_size
    }

    pub fn gate_capacitance(&self, width: f64) -> f64 {
        formula::gate_capacitance(&self.params, width * self.geometry().width)
    }

    pub fn drain_capacitance(&self, width: f64, mos: MosType, height: f64) -> f64 {
        let g = self.geometry();
        formula::drain_capacitance(&self.params, width * g.width, mos, height * g.height)
    }

    pub fn on_resistance(&self, width: f64, mos: MosType, temperature: f64) -> f64 {
        formula::on_resistance(
            &self.params,
            width * self.geometry().width,
            mos,
            temperature,
        )
    }

    pub fn transconductance(&self, width: f64, mos: MosType, temperature: f64) -> f64 {
        formula::transconductance(
            &self.params,
            width * self.geometry().width,
            mos,
            temperature,
        )
    }

    pub fn gate_leakage(
        &self,
        kind: GateKind,
        width_nmos: f64,
        width_pmos: f64,
        temperature: f64,
    ) -> f64 {
        let g = self.geometry();
        formula::gate_leakage(
            &self.params,
            kind,
            width_nmos * g.width,
            width_pmos * g.width,
            temperature,
        )
    }

    /// Footprint of a gate drawn in a region of `height_region` meters.
    ///
    /// The region height is not corrected; use [`Technology::max_transistor_height`].
    pub fn gate_area(
        &self,
        width_nmos: f64,
        width_pmos: f64,
        height_region: f64,
    ) -> Result<Footprint> {
        let g = self.geometry();
        formula::gate_area(
            &self.params,
            width_nmos * g.width,
            width_pmos * g.width,
            height_region,
        )
    }
}
