//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. PARKING_CONFIG environment variable
//! 3. Default: config/dev.toml
//!
//! Zones get their IDs from their position in the `[[zones]]` list (1-based).

use crate::domain::types::{
    Penalties, Vehicle, ZoneId, DEFAULT_CROSS_ZONE_PENALTY, DEFAULT_NON_ADJACENT_PENALTY,
};
use crate::domain::zone::Zone;
use anyhow::{bail, Context};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Unique site identifier (e.g., "airport", "mall")
    #[serde(default = "default_site_id")]
    pub id: String,
}

fn default_site_id() -> String {
    "parking".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self { id: default_site_id() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PenaltiesConfig {
    #[serde(default = "default_cross_zone")]
    pub cross_zone: f64,
    #[serde(default = "default_non_adjacent")]
    pub non_adjacent: f64,
}

fn default_cross_zone() -> f64 {
    DEFAULT_CROSS_ZONE_PENALTY
}

fn default_non_adjacent() -> f64 {
    DEFAULT_NON_ADJACENT_PENALTY
}

impl Default for PenaltiesConfig {
    fn default() -> Self {
        Self { cross_zone: default_cross_zone(), non_adjacent: default_non_adjacent() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TopologyConfig {
    /// Mirror every adjacency declaration (A lists B implies B lists A)
    #[serde(default)]
    pub symmetric_adjacency: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneConfig {
    pub name: String,
    /// Slot capacity of each area, in area order
    pub areas: Vec<u32>,
    /// Zone IDs reachable from this zone, in preference order
    #[serde(default)]
    pub adjacent: Vec<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleConfig {
    pub id: String,
    pub preferred_zone: u32,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ReportConfig {
    /// JSONL file for status snapshots (unset disables file output)
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: default_metrics_enabled() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub penalties: PenaltiesConfig,
    #[serde(default)]
    pub topology: TopologyConfig,
    pub zones: Vec<ZoneConfig>,
    #[serde(default)]
    pub vehicles: Vec<VehicleConfig>,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    site_id: String,
    penalties: Penalties,
    symmetric_adjacency: bool,
    zones: Vec<ZoneConfig>,
    vehicles: Vec<Vehicle>,
    report_file: Option<String>,
    metrics_enabled: bool,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_id: default_site_id(),
            penalties: Penalties::default(),
            symmetric_adjacency: false,
            zones: Self::default_zones(),
            vehicles: Vec::new(),
            report_file: None,
            metrics_enabled: true,
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Three zones in a line: 1 <-> 2 <-> 3
    fn default_zones() -> Vec<ZoneConfig> {
        vec![
            ZoneConfig { name: "North".to_string(), areas: vec![10, 5], adjacent: vec![2] },
            ZoneConfig { name: "Central".to_string(), areas: vec![8, 8], adjacent: vec![1, 3] },
            ZoneConfig { name: "South".to_string(), areas: vec![6], adjacent: vec![2] },
        ]
    }

    /// Determine config file path from the CLI value or environment
    pub fn resolve_config_path(cli_path: Option<&str>) -> String {
        if let Some(path) = cli_path {
            return path.to_string();
        }

        if let Ok(path) = env::var("PARKING_CONFIG") {
            return path;
        }

        "config/dev.toml".to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::parse(&content, &path.display().to_string())
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Parse and validate TOML content; `source` is recorded as the config file name
    pub fn parse(content: &str, source: &str) -> anyhow::Result<Self> {
        let toml_config: TomlConfig = toml::from_str(content)?;

        let Some(penalties) =
            Penalties::new(toml_config.penalties.cross_zone, toml_config.penalties.non_adjacent)
        else {
            bail!(
                "penalties must satisfy 0 <= cross_zone < non_adjacent (got {} and {})",
                toml_config.penalties.cross_zone,
                toml_config.penalties.non_adjacent
            );
        };

        Self::validate_zones(&toml_config.zones)?;

        let zone_count = toml_config.zones.len() as u32;
        let vehicles = toml_config
            .vehicles
            .into_iter()
            .map(|v| {
                // Out-of-range preferences are legal; they go to the global tier
                if v.preferred_zone == 0 || v.preferred_zone > zone_count {
                    tracing::debug!(
                        vehicle_id = %v.id,
                        preferred_zone = %v.preferred_zone,
                        "preferred_zone_out_of_range"
                    );
                }
                Vehicle::new(v.id, ZoneId(v.preferred_zone))
            })
            .collect();

        Ok(Self {
            site_id: toml_config.site.id,
            penalties,
            symmetric_adjacency: toml_config.topology.symmetric_adjacency,
            zones: toml_config.zones,
            vehicles,
            report_file: toml_config.report.file,
            metrics_enabled: toml_config.metrics.enabled,
            config_file: source.to_string(),
        })
    }

    fn validate_zones(zones: &[ZoneConfig]) -> anyhow::Result<()> {
        if zones.is_empty() {
            bail!("at least one zone is required");
        }
        let zone_count = zones.len() as u32;
        for (zone, id) in zones.iter().zip(1u32..) {
            for (i, &adj) in zone.adjacent.iter().enumerate() {
                if adj == 0 || adj > zone_count {
                    bail!("zone {} ({}) lists adjacent zone {} outside 1..={}", id, zone.name, adj, zone_count);
                }
                if adj == id {
                    bail!("zone {} ({}) lists itself as adjacent", id, zone.name);
                }
                if zone.adjacent[..i].contains(&adj) {
                    bail!("zone {} ({}) lists adjacent zone {} twice", id, zone.name, adj);
                }
            }
        }
        Ok(())
    }

    /// Load configuration from a path, falling back to defaults on any error
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "config_fallback_to_defaults");
                Self::default()
            }
        }
    }

    /// Load configuration - tries TOML file first, falls back to defaults
    pub fn load(cli_path: Option<&str>) -> Self {
        Self::load_from_path(&Self::resolve_config_path(cli_path))
    }

    /// Construct the zone topology described by this config
    ///
    /// Adjacency is applied as declared; with `symmetric_adjacency` every
    /// declaration is mirrored unless the reverse edge already exists.
    pub fn build_zones(&self) -> Vec<Zone> {
        let limit = self.zones.len().saturating_sub(1);
        let mut zones: Vec<Zone> = self
            .zones
            .iter()
            .zip(1u32..)
            .map(|(zc, id)| Zone::new(ZoneId(id), zc.name.clone(), &zc.areas, limit))
            .collect();

        for (zc, id) in self.zones.iter().zip(1u32..) {
            for &adj in &zc.adjacent {
                Self::link(&mut zones, ZoneId(id), ZoneId(adj));
                if self.symmetric_adjacency {
                    Self::link(&mut zones, ZoneId(adj), ZoneId(id));
                }
            }
        }
        zones
    }

    fn link(zones: &mut [Zone], from: ZoneId, to: ZoneId) {
        let Some(idx) = from.index(zones.len()) else {
            return;
        };
        if !zones[idx].adjacent_zones().contains(&to) {
            zones[idx].add_adjacent_zone(to);
        }
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn penalties(&self) -> Penalties {
        self.penalties
    }

    pub fn symmetric_adjacency(&self) -> bool {
        self.symmetric_adjacency
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    pub fn zone_configs(&self) -> &[ZoneConfig] {
        &self.zones
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn report_file(&self) -> Option<&str> {
        self.report_file.as_deref()
    }

    pub fn metrics_enabled(&self) -> bool {
        self.metrics_enabled
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }
}
