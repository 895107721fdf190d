#![deny(missing_docs)]
#![doc = include_str!("../docs/grammar.md")]

//! Power-law transcription network synthesis emitting the NEMO motif grammar.

pub mod audit;
pub mod bins;
pub mod cluster;
pub mod config;
pub mod context;
pub mod distribution;
pub mod finalize;
pub mod grammar;
mod generator;
mod hash;
pub mod motifs;
pub mod pool;
pub mod report;

pub use bins::BinTracker;
pub use cluster::{ClusterBuilder, ClusterOutcome};
pub use config::{GeneratorConfig, MAX_NODES, MIN_NODES};
pub use context::{GenerationContext, RunStats};
pub use distribution::{PowerLaw, BACKBONE_CONSTANT};
pub use generator::{generate, Network};
pub use grammar::{BlockKind, GrammarWriter};
pub use hash::document_digest;
pub use motifs::{MotifOutcome, MotifShape};
pub use pool::NodePool;
pub use report::{DegreeHistogram, NodeDegreeListing, RunSummary};
