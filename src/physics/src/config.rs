use wasm_bindgen::prelude::*;
use serde::{ Serialize, Deserialize };

use crate::error::Result;

pub const DETAIL_KEY: &str = "fluid-detail";
pub const INERTIA_KEY: &str = "fluid-inertia";
pub const SWIRL_KEY: &str = "fluid-swirl";
pub const FLOW_KEY: &str = "fluid-flow";

/// Tunables read once per step. Owned and persisted by the host.
#[wasm_bindgen]
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Grid density, 1 (coarse) and up.
    pub detail_level: u32,
    /// Velocity retention per step, 0..100.
    pub inertia: f32,
    /// Vorticity confinement strength, 0..100.
    pub swirl: f32,
    /// Pointer impulse gain, 0..100.
    pub flow: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            detail_level: 3,
            inertia: 70.0,
            swirl: 60.0,
            flow: 50.0,
        }
    }
}

#[wasm_bindgen]
impl SimulationConfig {
    #[wasm_bindgen(constructor)]
    pub fn new(detail_level: u32, inertia: f32, swirl: f32, flow: f32) -> Self {
        Self { detail_level, inertia, swirl, flow }
    }

    /// Range-limited copy for hosts that accept raw slider input.
    /// The simulation itself never clamps.
    pub fn clamped(&self) -> SimulationConfig {
        let pct = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, 100.0) };
        SimulationConfig {
            detail_level: self.detail_level.max(1),
            inertia: pct(self.inertia),
            swirl: pct(self.swirl),
            flow: pct(self.flow),
        }
    }
}

impl SimulationConfig {
    /// Fields whose values differ between `self` and `other`.
    pub fn changed_fields(&self, other: &SimulationConfig) -> Vec<ConfigField> {
        let mut out = Vec::new();
        if self.detail_level != other.detail_level {
            out.push(ConfigField::DetailLevel);
        }
        if self.inertia != other.inertia {
            out.push(ConfigField::Inertia);
        }
        if self.swirl != other.swirl {
            out.push(ConfigField::Swirl);
        }
        if self.flow != other.flow {
            out.push(ConfigField::Flow);
        }
        out
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigField {
    DetailLevel,
    Inertia,
    Swirl,
    Flow,
}

impl ConfigField {
    /// Detail changes the grid shape, so the whole state is rebuilt.
    /// The other knobs are read live on the next step.
    pub fn requires_reseed(&self) -> bool {
        matches!(self, ConfigField::DetailLevel)
    }

    pub fn storage_key(&self) -> &'static str {
        match self {
            ConfigField::DetailLevel => DETAIL_KEY,
            ConfigField::Inertia => INERTIA_KEY,
            ConfigField::Swirl => SWIRL_KEY,
            ConfigField::Flow => FLOW_KEY,
        }
    }
}

/// String key/value persistence, e.g. `localStorage`.
pub trait ConfigStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

fn parse_or<T: std::str::FromStr>(store: &dyn ConfigStore, key: &str, fallback: T) -> T {
    store
        .get(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(fallback)
}

/// Read each field independently; anything missing or unparsable keeps its default.
pub fn load_config(store: &dyn ConfigStore) -> SimulationConfig {
    let d = SimulationConfig::default();
    SimulationConfig {
        detail_level: parse_or(store, DETAIL_KEY, d.detail_level),
        inertia: parse_or(store, INERTIA_KEY, d.inertia),
        swirl: parse_or(store, SWIRL_KEY, d.swirl),
        flow: parse_or(store, FLOW_KEY, d.flow),
    }
}

pub fn save_field(store: &mut dyn ConfigStore, config: &SimulationConfig, field: ConfigField) -> Result<()> {
    let value = match field {
        ConfigField::DetailLevel => config.detail_level.to_string(),
        ConfigField::Inertia => config.inertia.to_string(),
        ConfigField::Swirl => config.swirl.to_string(),
        ConfigField::Flow => config.flow.to_string(),
    };
    store.set(field.storage_key(), &value)
}

pub fn save_config(store: &mut dyn ConfigStore, config: &SimulationConfig) -> Result<()> {
    for field in [ConfigField::DetailLevel, ConfigField::Inertia, ConfigField::Swirl, ConfigField::Flow] {
        save_field(store, config, field)?;
    }
    Ok(())
}

/// Persist and return the defaults.
pub fn reset_config(store: &mut dyn ConfigStore) -> Result<SimulationConfig> {
    let config = SimulationConfig::default();
    save_config(store, &config)?;
    Ok(config)
}
