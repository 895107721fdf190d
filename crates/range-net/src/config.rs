//! Run configuration.

use std::fs;
use std::path::Path;

use range_core::errors::{ErrorInfo, RangeError};
use range_core::rng::DEFAULT_SEED;
use serde::{Deserialize, Serialize};

use crate::distribution::{PowerLaw, BACKBONE_CONSTANT};

/// Smallest network the generator accepts.
pub const MIN_NODES: usize = 32;
/// Largest network the generator accepts.
pub const MAX_NODES: usize = 16_000;

const CONSTANT_RANGE: (f64, f64) = (0.65, 1.0);

/// Parameters of a single generation run, loadable from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Number of nodes in the network, `[MIN_NODES, MAX_NODES]`.
    #[serde(default = "default_node_count")]
    pub node_count: usize,
    /// Seed of the single RNG stream.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Normalisation constant of `P(d) = c / d²`.
    #[serde(default = "default_constant")]
    pub constant: f64,
    /// Motifs are considered for every `motif_stride`-th regulated gene.
    #[serde(default = "default_motif_stride")]
    pub motif_stride: usize,
    /// Re-parse the document and cross-check degrees before returning it.
    #[serde(default)]
    pub verify: bool,
}

fn default_node_count() -> usize {
    100
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_constant() -> f64 {
    BACKBONE_CONSTANT
}

fn default_motif_stride() -> usize {
    2
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            node_count: default_node_count(),
            seed: default_seed(),
            constant: default_constant(),
            motif_stride: default_motif_stride(),
            verify: false,
        }
    }
}

impl GeneratorConfig {
    /// Default configuration for `node_count` nodes.
    pub fn with_nodes(node_count: usize) -> Self {
        Self {
            node_count,
            ..Self::default()
        }
    }

    /// Parses a YAML document. Missing fields take their defaults.
    pub fn from_yaml_str(contents: &str) -> Result<Self, RangeError> {
        serde_yaml::from_str(contents).map_err(|err| {
            RangeError::Configuration(ErrorInfo::new("config-parse", err.to_string()))
        })
    }

    /// Reads and parses a YAML configuration file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, RangeError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|err| {
            RangeError::Configuration(
                ErrorInfo::new("config-read", err.to_string())
                    .with_context("path", path.display()),
            )
        })?;
        Self::from_yaml_str(&contents).map_err(|err| match err {
            RangeError::Configuration(info) => {
                RangeError::Configuration(info.with_context("path", path.display()))
            }
            other => other,
        })
    }

    /// Checks every parameter against its accepted range.
    pub fn validate(&self) -> Result<(), RangeError> {
        if !(MIN_NODES..=MAX_NODES).contains(&self.node_count) {
            return Err(RangeError::Configuration(
                ErrorInfo::new("node-count-range", "node count out of range")
                    .with_context("node_count", self.node_count)
                    .with_context("min", MIN_NODES)
                    .with_context("max", MAX_NODES)
                    .with_hint(format!(
                        "choose a number of genes between {MIN_NODES} and {MAX_NODES}"
                    )),
            ));
        }
        let (low, high) = CONSTANT_RANGE;
        if !self.constant.is_finite() || self.constant < low || self.constant > high {
            return Err(RangeError::Configuration(
                ErrorInfo::new("constant-range", "distribution constant out of range")
                    .with_context("constant", self.constant)
                    .with_context("min", low)
                    .with_context("max", high),
            ));
        }
        let law = PowerLaw::new(self.node_count, self.constant);
        if !law.covers_node_count() {
            return Err(RangeError::Configuration(
                ErrorInfo::new("constant-coverage", "bin capacities do not cover every node")
                    .with_context("node_count", self.node_count)
                    .with_context("constant", self.constant)
                    .with_context("capacity", law.total_capacity())
                    .with_hint("raise the distribution constant"),
            ));
        }
        if self.motif_stride == 0 {
            return Err(RangeError::Configuration(
                ErrorInfo::new("motif-stride", "motif stride must be at least 1")
                    .with_hint("use 1 to consider every regulated gene"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = GeneratorConfig::default();
        assert_eq!(config.seed, 123_456_789);
        assert_eq!(config.motif_stride, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn node_count_bounds_are_inclusive() {
        assert!(GeneratorConfig::with_nodes(MIN_NODES).validate().is_ok());
        assert!(GeneratorConfig::with_nodes(MAX_NODES).validate().is_ok());
        let err = GeneratorConfig::with_nodes(MIN_NODES - 1)
            .validate()
            .unwrap_err();
        assert!(err.is_user_error());
        assert_eq!(err.info().code, "node-count-range");
        assert!(GeneratorConfig::with_nodes(MAX_NODES + 1).validate().is_err());
    }

    #[test]
    fn constant_and_stride_are_checked() {
        let mut config = GeneratorConfig::default();
        config.constant = 1.5;
        assert_eq!(config.validate().unwrap_err().info().code, "constant-range");
        config.constant = f64::NAN;
        assert!(config.validate().is_err());
        config.constant = 0.62;
        assert_eq!(config.validate().unwrap_err().info().code, "constant-range");
        config.constant = 0.65;
        config.motif_stride = 0;
        assert_eq!(config.validate().unwrap_err().info().code, "motif-stride");
    }

    #[test]
    fn every_accepted_configuration_has_room_for_all_nodes() {
        let (low, _) = CONSTANT_RANGE;
        for node_count in MIN_NODES..=MAX_NODES {
            let law = PowerLaw::new(node_count, low);
            assert!(law.covers_node_count(), "N = {node_count}");
        }
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config = GeneratorConfig::from_yaml_str("node_count: 250\nseed: 7\n").unwrap();
        assert_eq!(config.node_count, 250);
        assert_eq!(config.seed, 7);
        assert_eq!(config.constant, BACKBONE_CONSTANT);
        assert!(!config.verify);
    }

    #[test]
    fn malformed_yaml_is_a_configuration_error() {
        let err = GeneratorConfig::from_yaml_str("node_count: [1, 2").unwrap_err();
        assert!(matches!(err, RangeError::Configuration(_)));
    }
}
