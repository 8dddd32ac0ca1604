use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::blocks::LayoutMode;
use crate::cell::{
    CellAccess, CellGeometry, CellTechnology, MemCell, MemCellParams, NvmDeviceParams, NvmFamily,
    SramCellParams,
};
use crate::tech::formula::{validate_temperature, NOMINAL_TEMPERATURE};
use crate::tech::{DeviceRoadmap, ProcessParams, Technology, TechnologyKey, TransistorType};

/// Operating conditions shared by every block of one evaluation.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputParameter {
    /// Process node in nanometers.
    pub process_node: u32,
    pub roadmap: DeviceRoadmap,
    pub transistor_type: TransistorType,
    /// Operating temperature (K).
    pub temperature: f64,
}

impl Default for InputParameter {
    fn default() -> Self {
        Self {
            process_node: 22,
            roadmap: DeviceRoadmap::Hp,
            transistor_type: TransistorType::Conventional,
            temperature: NOMINAL_TEMPERATURE,
        }
    }
}

impl InputParameter {
    pub fn validate(&self) -> crate::Result<()> {
        validate_temperature(self.temperature)
    }

    pub fn key(&self) -> TechnologyKey {
        TechnologyKey {
            process_node: self.process_node,
            roadmap: self.roadmap,
            transistor_type: self.transistor_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnologyConfig {
    #[serde(flatten)]
    pub input: InputParameter,
    /// Replaces the built-in parameter table of the selected node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<ProcessParams>,
}

impl TechnologyConfig {
    pub fn technology(&self) -> crate::Result<Technology> {
        let InputParameter {
            process_node,
            roadmap,
            transistor_type,
            ..
        } = self.input;
        match self.params {
            Some(params) => Technology::with_params(self.input.key(), params),
            None => Technology::new(process_node, roadmap, transistor_type),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SramCellConfig {
    pub feature_size: f64,
    pub height_in_feature_size: f64,
    pub width_in_feature_size: f64,
    pub width_nmos: f64,
    pub width_pmos: f64,
    pub width_access: f64,
    pub min_sense_voltage: f64,
}

impl Default for SramCellConfig {
    fn default() -> Self {
        let sram = SramCellParams::default();
        Self {
            feature_size: DEFAULT_CELL_FEATURE_SIZE,
            height_in_feature_size: sram.geometry.height_in_feature_size,
            width_in_feature_size: sram.geometry.width_in_feature_size,
            width_nmos: sram.width_nmos,
            width_pmos: sram.width_pmos,
            width_access: sram.width_access,
            min_sense_voltage: sram.min_sense_voltage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NvmCellConfig {
    pub feature_size: f64,
    pub access: CellAccess,
    pub resistance_on: f64,
    pub resistance_off: f64,
    pub read_voltage: f64,
    pub read_pulse_width: f64,
    pub write_voltage: f64,
    pub access_voltage: f64,
    /// Defaults to the outline of the access scheme.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_in_feature_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_in_feature_size: Option<f64>,
}

impl Default for NvmCellConfig {
    fn default() -> Self {
        let device = NvmDeviceParams::default();
        Self {
            feature_size: DEFAULT_CELL_FEATURE_SIZE,
            access: CellAccess::default(),
            resistance_on: device.resistance_on,
            resistance_off: device.resistance_off,
            read_voltage: device.read_voltage,
            read_pulse_width: device.read_pulse_width,
            write_voltage: device.write_voltage,
            access_voltage: device.access_voltage,
            height_in_feature_size: None,
            width_in_feature_size: None,
        }
    }
}

impl NvmCellConfig {
    fn params(&self, family: NvmFamily) -> MemCellParams {
        let outline = self.access.default_geometry();
        MemCellParams {
            feature_size: self.feature_size,
            technology: CellTechnology::Nvm {
                family,
                access: self.access,
                device: NvmDeviceParams {
                    resistance_on: self.resistance_on,
                    resistance_off: self.resistance_off,
                    read_voltage: self.read_voltage,
                    read_pulse_width: self.read_pulse_width,
                    write_voltage: self.write_voltage,
                    access_voltage: self.access_voltage,
                },
                geometry: CellGeometry {
                    height_in_feature_size: self
                        .height_in_feature_size
                        .unwrap_or(outline.height_in_feature_size),
                    width_in_feature_size: self
                        .width_in_feature_size
                        .unwrap_or(outline.width_in_feature_size),
                },
            },
        }
    }
}

const DEFAULT_CELL_FEATURE_SIZE: f64 = 40e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CellConfig {
    Sram(SramCellConfig),
    Rram(NvmCellConfig),
    #[serde(rename = "fefet")]
    FeFet(NvmCellConfig),
}

impl Default for CellConfig {
    fn default() -> Self {
        Self::Sram(SramCellConfig::default())
    }
}

impl CellConfig {
    pub fn params(&self) -> MemCellParams {
        match self {
            CellConfig::Sram(c) => MemCellParams {
                feature_size: c.feature_size,
                technology: CellTechnology::Sram(SramCellParams {
                    geometry: CellGeometry {
                        height_in_feature_size: c.height_in_feature_size,
                        width_in_feature_size: c.width_in_feature_size,
                    },
                    width_nmos: c.width_nmos,
                    width_pmos: c.width_pmos,
                    width_access: c.width_access,
                    min_sense_voltage: c.min_sense_voltage,
                }),
            },
            CellConfig::Rram(c) => c.params(NvmFamily::Rram),
            CellConfig::FeFet(c) => c.params(NvmFamily::FeFet),
        }
    }
}

/// Arguments of the four flip-flop estimation stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DffConfig {
    pub num_bits: usize,
    /// Clock frequency (Hz).
    pub clock_frequency: f64,
    /// Assigned height (m); zero leaves it unconstrained.
    pub height: f64,
    /// Assigned width (m); zero leaves it unconstrained.
    pub width: f64,
    pub layout: LayoutMode,
    /// Slope of the driving clock edge.
    pub ramp_input: f64,
    /// Output load in units of a minimum inverter input.
    pub load_factor: f64,
    pub activity: f64,
    pub toggle_count: usize,
    pub include_leakage: bool,
}

impl Default for DffConfig {
    fn default() -> Self {
        Self {
            num_bits: 2,
            clock_frequency: 1e9,
            height: 1e-5,
            width: 0.0,
            layout: LayoutMode::None,
            ramp_input: 1e20,
            load_factor: 1.0,
            activity: 1.0,
            toggle_count: 2,
            include_leakage: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub technology: TechnologyConfig,
    pub cell: CellConfig,
    pub dff: DffConfig,
}

impl RunConfig {
    pub fn from_toml(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    #[inline]
    pub fn input(&self) -> InputParameter {
        self.technology.input
    }

    /// Initializes the technology and characterizes the storage cell.
    pub fn build(&self) -> crate::Result<(Technology, MemCell)> {
        let input = self.input();
        input.validate()?;
        let tech = self.technology.technology()?;
        let cell = MemCell::derive(self.cell.params(), &tech, input.temperature)?;
        Ok((tech, cell))
    }
}

pub fn parse_run_config(path: impl AsRef<Path>) -> Result<RunConfig> {
    let path = path.as_ref();
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {path:?}"))?;
    RunConfig::from_toml(&contents).with_context(|| format!("failed to parse {path:?}"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::cell::CellElectrical;

    #[test]
    fn test_empty_config_is_reference_run() {
        let config = RunConfig::from_toml("").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.input().process_node, 22);
        assert_eq!(config.dff.num_bits, 2);
        assert_eq!(config.dff.layout, LayoutMode::None);
    }

    #[test]
    fn test_sample_config_is_reference_run() {
        let config = RunConfig::from_toml(include_str!("../../memcost.toml")).unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn test_parse_rram_config() {
        let config = RunConfig::from_toml(
            r#"
            [technology]
            process_node = 7
            roadmap = "lstp"
            temperature = 350

            [cell]
            type = "rram"
            access = "cross_point"
            resistance_on = 1e4
            resistance_off = 1e6

            [dff]
            num_bits = 16
            layout = "magic"
            "#,
        )
        .unwrap();

        assert_eq!(config.input().roadmap, DeviceRoadmap::Lstp);
        assert_eq!(config.input().temperature, 350.0);
        assert_eq!(config.dff.num_bits, 16);
        assert_eq!(config.dff.clock_frequency, 1e9);

        let (tech, cell) = config.build().unwrap();
        assert!(tech.is_finfet());
        assert!(matches!(cell.electrical(), CellElectrical::CrossPoint { .. }));
        assert_eq!(
            cell.params().technology.geometry(),
            CellGeometry::CROSS_POINT
        );
    }

    #[test]
    fn test_parse_fefet_config() {
        let config = RunConfig::from_toml(
            r#"
            [cell]
            type = "fefet"
            height_in_feature_size = 5
            "#,
        )
        .unwrap();
        let params = config.cell.params();
        let CellTechnology::Nvm {
            family,
            access,
            geometry,
            ..
        } = params.technology
        else {
            panic!("expected an nvm cell");
        };
        assert_eq!(family, NvmFamily::FeFet);
        assert_eq!(access, CellAccess::Cmos);
        assert_eq!(geometry.height_in_feature_size, 5.0);
        assert_eq!(geometry.width_in_feature_size, 12.0);
    }

    #[test]
    fn test_rejects_unknown_selectors() {
        assert!(RunConfig::from_toml("[technology]\ntransistor_type = \"tfet\"\n").is_err());
        assert!(RunConfig::from_toml("[cell]\ntype = \"pcm\"\n").is_err());
    }

    #[test]
    fn test_custom_process_params() {
        let mut config = RunConfig::default();
        let mut params = *Technology::new(22, DeviceRoadmap::Hp, TransistorType::Conventional)
            .unwrap()
            .params();
        params.vdd = 0.7;
        config.technology.params = Some(params);
        let (tech, _) = config.build().unwrap();
        assert_eq!(tech.vdd(), 0.7);
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let mut config = RunConfig::default();
        config.cell = CellConfig::Rram(NvmCellConfig::default());
        config.dff.layout = LayoutMode::Override;
        config.dff.width = 2e-5;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_toml().unwrap().as_bytes()).unwrap();

        let parsed = parse_run_config(file.path()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_run_config(dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn test_invalid_temperature() {
        let config = RunConfig::from_toml("[technology]\ntemperature = 250\n").unwrap();
        assert!(config.build().unwrap_err().is_configuration());
    }
}
