#![deny(missing_docs)]
#![doc = "Core data types shared by the RANGE transcription-network generator."]

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod errors;
pub mod rng;

pub use errors::{ErrorInfo, RangeError};
pub use rng::RngHandle;

/// Identifier for a node of the generated network.
///
/// Every node has two views in the emitted grammar: the gene view `G<id>`
/// (the regulated entity) and the protein view `P<id>` (the regulator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a new identifier from its raw integer representation.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw integer representation of the identifier.
    pub const fn as_raw(&self) -> u32 {
        self.0
    }

    /// Returns the identifier as an index into node-indexed arrays.
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Renders the gene view of the node (`G<id>`).
    pub fn gene(&self) -> View {
        View {
            prefix: 'G',
            id: self.0,
        }
    }

    /// Renders the protein/regulator view of the node (`P<id>`).
    pub fn protein(&self) -> View {
        View {
            prefix: 'P',
            id: self.0,
        }
    }
}

impl From<usize> for NodeId {
    fn from(value: usize) -> Self {
        Self(value as u32)
    }
}

/// Display adapter for one of the two grammar views of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct View {
    prefix: char,
    id: u32,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.id)
    }
}

/// Sign carried by every regulatory edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sign {
    /// Activation.
    Plus,
    /// Repression.
    Minus,
}

impl Sign {
    /// Returns the grammar character for the sign.
    pub const fn as_char(&self) -> char {
        match self {
            Sign::Plus => '+',
            Sign::Minus => '-',
        }
    }

    /// Parses a grammar sign character.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Sign::Plus),
            '-' => Some(Sign::Minus),
            _ => None,
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
