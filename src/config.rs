//! Run configuration, loadable from YAML.
//!
//! Every field has a default, so a scenario file only needs to name what it
//! changes:
//!
//! ```yaml
//! extent: 800.0
//! dt: 0.1
//! gravity:
//!   opening_angle: 0.3
//! spawn:
//!   num_bodies: 2000
//!   seed: 7
//! ```
//!
//! The whole configuration is fixed for the lifetime of a [`Simulation`](crate::Simulation).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

/// Top-level configuration for a run.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Side length of the square domain `[0, extent]²`.
    pub extent: f64,
    /// Fixed time step per tick.
    pub dt: f64,
    /// Pacing hint for a presentation layer. The core never sleeps.
    pub tick_interval_ms: u64,
    pub gravity: GravityParameters,
    pub tree: QuadTreeConfig,
    pub spawn: SpawnConfig,
}

/// Constants of the force law and of the tree walk.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GravityParameters {
    /// Gravitational constant.
    pub g: f64,
    /// During the tree walk, an internal node whose side length divided by
    /// its distance is below this threshold is approximated by its mass and
    /// center of mass instead of being opened. Zero opens every node.
    pub opening_angle: f64,
    /// Added in quadrature to the separation in the denominator of the
    /// force law, so close encounters stay bounded.
    pub softening_length: f64,
}

/// Parameters controlling the construction of a tree.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuadTreeConfig {
    /// The maximum depth of the tree. A leaf at this depth is never
    /// subdivided; further bodies landing in it are chained into the same
    /// leaf. Prevents unbounded subdivision for coincident bodies.
    pub max_depth: usize,
}

/// How bodies are created, both at start-up and on external insertion.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpawnConfig {
    pub num_bodies: usize,
    /// Seed for the initial distribution. `None` draws a fresh one.
    pub seed: Option<u64>,
    /// Initial masses are uniform in `[min_mass, max_mass)`.
    pub min_mass: f64,
    pub max_mass: f64,
    /// Each initial velocity component is uniform in `[-max_speed, max_speed)`.
    pub max_speed: f64,
    /// Mass of bodies queued through [`Simulation::queue_body`](crate::Simulation::queue_body).
    pub inserted_mass: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            extent: 800.0,
            dt: 0.1,
            tick_interval_ms: 16,
            gravity: GravityParameters::default(),
            tree: QuadTreeConfig::default(),
            spawn: SpawnConfig::default(),
        }
    }
}

impl Default for GravityParameters {
    fn default() -> Self {
        Self {
            g: 1.0,
            opening_angle: 0.5,
            softening_length: 3.0,
        }
    }
}

impl QuadTreeConfig {
    /// Deepest tree a configuration may ask for. Cells of an f64 domain stop
    /// separating distinct positions long before this.
    pub const MAX_DEPTH: usize = 64;
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self { max_depth: 32 }
    }
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            num_bodies: 500,
            seed: None,
            min_mass: 1.0,
            max_mass: 11.0,
            max_speed: 1.0,
            inserted_mass: 20.0,
        }
    }
}

impl SimulationConfig {
    /// Reads and validates a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text).context("failed to parse YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.extent.is_finite() && self.extent > 0.0,
            "extent must be positive and finite, got {}",
            self.extent
        );
        ensure!(
            self.dt.is_finite() && self.dt > 0.0,
            "dt must be positive and finite, got {}",
            self.dt
        );
        self.gravity.validate()?;
        ensure!(
            (1..=QuadTreeConfig::MAX_DEPTH).contains(&self.tree.max_depth),
            "tree.max_depth must be between 1 and {}, got {}",
            QuadTreeConfig::MAX_DEPTH,
            self.tree.max_depth
        );
        self.spawn.validate()
    }
}

impl GravityParameters {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.g.is_finite() && self.g >= 0.0,
            "gravity.g must be non-negative and finite, got {}",
            self.g
        );
        ensure!(
            self.opening_angle.is_finite() && self.opening_angle >= 0.0,
            "gravity.opening_angle must be non-negative and finite, got {}",
            self.opening_angle
        );
        ensure!(
            self.softening_length.is_finite() && self.softening_length >= 0.0,
            "gravity.softening_length must be non-negative and finite, got {}",
            self.softening_length
        );
        Ok(())
    }
}

impl SpawnConfig {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.min_mass.is_finite() && self.max_mass.is_finite(),
            "spawn masses must be finite"
        );
        ensure!(
            0.0 < self.min_mass && self.min_mass <= self.max_mass,
            "spawn masses must satisfy 0 < min_mass <= max_mass, got [{}, {}]",
            self.min_mass,
            self.max_mass
        );
        ensure!(
            self.max_speed.is_finite() && self.max_speed >= 0.0,
            "spawn.max_speed must be non-negative and finite, got {}",
            self.max_speed
        );
        ensure!(
            self.inserted_mass.is_finite() && self.inserted_mass > 0.0,
            "spawn.inserted_mass must be positive and finite, got {}",
            self.inserted_mass
        );
        Ok(())
    }
}
