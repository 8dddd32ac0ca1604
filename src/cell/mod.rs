//! Storage cell electrical models.
//!
//! A [`MemCell`] turns raw, technology-independent device parameters into the
//! equivalent resistance or capacitance of a single cell. The derivation
//! depends on the cell family: static cells are characterized by their
//! parasitic capacitance, resistive devices by their series resistance with
//! or without an access transistor.

use derive_builder::Builder;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, Error, Result};
use crate::tech::formula::validate_temperature;
use crate::tech::{MosType, ProcessParams, Technology, TechnologyKey};

/// Fraction of the read/write voltage allowed to drop across the access transistor.
pub const IR_DROP_TOLERANCE: f64 = 0.25;
/// Ratio of linear-region to saturation on-resistance of the access transistor.
pub const LINEAR_REGION_RATIO: f64 = 0.20;

/// Cell outline in units of feature size.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellGeometry {
    pub height_in_feature_size: f64,
    pub width_in_feature_size: f64,
}

impl CellGeometry {
    pub const SRAM: Self = Self {
        height_in_feature_size: 10.0,
        width_in_feature_size: 28.0,
    };
    pub const ONE_TRANSISTOR_ONE_RESISTOR: Self = Self {
        height_in_feature_size: 4.0,
        width_in_feature_size: 12.0,
    };
    pub const CROSS_POINT: Self = Self {
        height_in_feature_size: 2.0,
        width_in_feature_size: 2.0,
    };

    fn validate(&self) -> Result<()> {
        ensure_positive("cell height", self.height_in_feature_size)?;
        ensure_positive("cell width", self.width_in_feature_size)
    }
}

/// Static (6T) cell sizing. Transistor widths are in units of feature size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct SramCellParams {
    #[builder(default = "CellGeometry::SRAM")]
    pub geometry: CellGeometry,
    #[builder(default = "2.0")]
    pub width_nmos: f64,
    #[builder(default = "1.0")]
    pub width_pmos: f64,
    #[builder(default = "1.0")]
    pub width_access: f64,
    /// Minimum bitline voltage swing the sense amplifier can resolve (V).
    #[builder(default = "0.1")]
    pub min_sense_voltage: f64,
}

impl SramCellParams {
    #[inline]
    pub fn builder() -> SramCellParamsBuilder {
        SramCellParamsBuilder::default()
    }
}

impl Default for SramCellParams {
    fn default() -> Self {
        Self {
            geometry: CellGeometry::SRAM,
            width_nmos: 2.0,
            width_pmos: 1.0,
            width_access: 1.0,
            min_sense_voltage: 0.1,
        }
    }
}

/// Raw parameters of a two-terminal non-volatile device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct NvmDeviceParams {
    /// Low resistance state (ohm).
    #[builder(default = "6e3")]
    pub resistance_on: f64,
    /// High resistance state (ohm).
    #[builder(default = "6e3 * 17.0")]
    pub resistance_off: f64,
    #[builder(default = "0.5")]
    pub read_voltage: f64,
    #[builder(default = "10e-9")]
    pub read_pulse_width: f64,
    #[builder(default = "2.0")]
    pub write_voltage: f64,
    /// Gate voltage of the access transistor (V).
    #[builder(default = "1.1")]
    pub access_voltage: f64,
}

impl NvmDeviceParams {
    #[inline]
    pub fn builder() -> NvmDeviceParamsBuilder {
        NvmDeviceParamsBuilder::default()
    }

    #[inline]
    pub fn resistance_avg(&self) -> f64 {
        (self.resistance_on + self.resistance_off) / 2.0
    }

    fn validate(&self) -> Result<()> {
        ensure_positive("resistance_on", self.resistance_on)?;
        ensure_positive("resistance_off", self.resistance_off)?;
        ensure_positive("read_voltage", self.read_voltage)?;
        ensure_positive("read_pulse_width", self.read_pulse_width)?;
        ensure_positive("write_voltage", self.write_voltage)?;
        ensure_positive("access_voltage", self.access_voltage)?;
        if self.resistance_on >= self.resistance_off {
            return Err(Error::config(format!(
                "resistance_on ({} ohm) must be below resistance_off ({} ohm)",
                self.resistance_on, self.resistance_off
            )));
        }
        Ok(())
    }
}

impl Default for NvmDeviceParams {
    fn default() -> Self {
        Self {
            resistance_on: 6e3,
            resistance_off: 6e3 * 17.0,
            read_voltage: 0.5,
            read_pulse_width: 10e-9,
            write_voltage: 2.0,
            access_voltage: 1.1,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NvmFamily {
    Rram,
    FeFet,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellAccess {
    /// One access transistor in series with the device (1T1R).
    #[default]
    Cmos,
    /// No series access device.
    CrossPoint,
}

impl CellAccess {
    pub fn default_geometry(&self) -> CellGeometry {
        match self {
            CellAccess::Cmos => CellGeometry::ONE_TRANSISTOR_ONE_RESISTOR,
            CellAccess::CrossPoint => CellGeometry::CROSS_POINT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellTechnology {
    Sram(SramCellParams),
    Nvm {
        family: NvmFamily,
        access: CellAccess,
        device: NvmDeviceParams,
        geometry: CellGeometry,
    },
}

impl CellTechnology {
    /// A non-volatile cell with the default outline of its access scheme.
    pub fn nvm(family: NvmFamily, access: CellAccess, device: NvmDeviceParams) -> Self {
        Self::Nvm {
            family,
            access,
            device,
            geometry: access.default_geometry(),
        }
    }

    pub fn geometry(&self) -> CellGeometry {
        match self {
            CellTechnology::Sram(params) => params.geometry,
            CellTechnology::Nvm { geometry, .. } => *geometry,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemCellParams {
    /// Cell feature size (m).
    pub feature_size: f64,
    pub technology: CellTechnology,
}

/// Cell resistance in each storage state (ohm).
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResistanceSet {
    pub on: f64,
    pub off: f64,
    pub avg: f64,
}

impl ResistanceSet {
    fn of(device: &NvmDeviceParams) -> Self {
        Self {
            on: device.resistance_on,
            off: device.resistance_off,
            avg: device.resistance_avg(),
        }
    }

    fn in_series(self, resistance: f64) -> Self {
        Self {
            on: resistance + self.on,
            off: resistance + self.off,
            avg: resistance + self.avg,
        }
    }
}

/// Derived electrical model of one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellElectrical {
    StaticCell {
        /// Parasitic capacitance seen from the bitline (F).
        cap_cell: f64,
    },
    TransistorAccessed {
        /// Budgeted on-resistance of the access transistor (ohm).
        res_cell_access: f64,
        /// Access transistor width, in units of feature size.
        access_transistor_width: f64,
        res_mem_cell: ResistanceSet,
    },
    CrossPoint {
        res_mem_cell: ResistanceSet,
        at_half_vw: ResistanceSet,
        at_vw: ResistanceSet,
    },
}

/// A storage cell characterized for one technology and temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct MemCell {
    params: MemCellParams,
    technology: TechnologyKey,
    process: ProcessParams,
    temperature: f64,
    electrical: CellElectrical,
}

impl MemCell {
    pub fn derive(params: MemCellParams, tech: &Technology, temperature: f64) -> Result<Self> {
        ensure_positive("cell feature size", params.feature_size)?;
        validate_temperature(temperature)?;
        params.technology.geometry().validate()?;

        let electrical = match &params.technology {
            CellTechnology::Sram(sram) => static_cell(sram, tech)?,
            CellTechnology::Nvm {
                access: CellAccess::Cmos,
                device,
                ..
            } => transistor_accessed(device, tech, temperature)?,
            CellTechnology::Nvm {
                access: CellAccess::CrossPoint,
                device,
                ..
            } => cross_point(device)?,
        };
        debug!("derived cell model for {}: {:?}", tech.key(), electrical);

        Ok(Self {
            params,
            technology: tech.key(),
            process: *tech.params(),
            temperature,
            electrical,
        })
    }

    #[inline]
    pub fn params(&self) -> &MemCellParams {
        &self.params
    }

    #[inline]
    pub fn electrical(&self) -> &CellElectrical {
        &self.electrical
    }

    /// The technology this cell was characterized for.
    #[inline]
    pub fn technology(&self) -> TechnologyKey {
        self.technology
    }

    /// Process parameters of the technology this cell was characterized for.
    #[inline]
    pub fn process_params(&self) -> &ProcessParams {
        &self.process
    }

    #[inline]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Cell area in m².
    pub fn area(&self) -> f64 {
        let g = self.params.technology.geometry();
        g.height_in_feature_size * g.width_in_feature_size * self.params.feature_size.powi(2)
    }

    pub fn cap_cell(&self) -> Option<f64> {
        match self.electrical {
            CellElectrical::StaticCell { cap_cell } => Some(cap_cell),
            _ => None,
        }
    }

    pub fn access_transistor_width(&self) -> Option<f64> {
        match self.electrical {
            CellElectrical::TransistorAccessed {
                access_transistor_width,
                ..
            } => Some(access_transistor_width),
            _ => None,
        }
    }

    pub fn res_mem_cell(&self) -> Option<ResistanceSet> {
        match self.electrical {
            CellElectrical::StaticCell { .. } => None,
            CellElectrical::TransistorAccessed { res_mem_cell, .. }
            | CellElectrical::CrossPoint { res_mem_cell, .. } => Some(res_mem_cell),
        }
    }
}

fn static_cell(sram: &SramCellParams, tech: &Technology) -> Result<CellElectrical> {
    ensure_positive("SRAM NMOS width", sram.width_nmos)?;
    ensure_positive("SRAM PMOS width", sram.width_pmos)?;
    ensure_positive("SRAM access width", sram.width_access)?;
    ensure_positive("minimum sense voltage", sram.min_sense_voltage)?;

    let f = tech.feature_size();
    let height = sram.geometry.width_in_feature_size * f;
    let (w_access, w_n, w_p) = (
        sram.width_access * f,
        sram.width_nmos * f,
        sram.width_pmos * f,
    );

    let cap_cell = tech.drain_capacitance(w_access, MosType::Nmos, height)
        + tech.drain_capacitance(w_n, MosType::Nmos, height)
        + tech.drain_capacitance(w_p, MosType::Pmos, height)
        + tech.gate_capacitance(w_n)
        + tech.gate_capacitance(w_p);

    Ok(CellElectrical::StaticCell { cap_cell })
}

fn transistor_accessed(
    device: &NvmDeviceParams,
    tech: &Technology,
    temperature: f64,
) -> Result<CellElectrical> {
    device.validate()?;

    let res_cell_access = device.resistance_on * IR_DROP_TOLERANCE;
    let access_transistor_width =
        tech.on_resistance(tech.feature_size(), MosType::Nmos, temperature) * LINEAR_REGION_RATIO
            / res_cell_access;

    Ok(CellElectrical::TransistorAccessed {
        res_cell_access,
        access_transistor_width,
        res_mem_cell: ResistanceSet::of(device).in_series(res_cell_access),
    })
}

fn cross_point(device: &NvmDeviceParams) -> Result<CellElectrical> {
    device.validate()?;
    let res = ResistanceSet::of(device);
    Ok(CellElectrical::CrossPoint {
        res_mem_cell: res,
        at_half_vw: res,
        at_vw: res,
    })
}
