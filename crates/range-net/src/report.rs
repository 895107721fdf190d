//! Human readable degree reports and the machine readable run summary.

use std::fmt;
use std::fs;
use std::path::Path;

use range_core::errors::{ErrorInfo, RangeError};
use serde::{Deserialize, Serialize};

use crate::context::RunStats;

/// Node counts per degree, `1..=max_degree`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegreeHistogram {
    /// Counts indexed by degree; index 0 holds nodes never placed.
    pub counts: Vec<usize>,
    /// Highest degree the report covers.
    pub max_degree: usize,
}

impl DegreeHistogram {
    /// Builds the histogram from per-node degrees.
    pub fn from_degrees(degrees: &[usize], max_degree: usize) -> Self {
        let top = degrees.iter().copied().max().unwrap_or(0).max(max_degree);
        let mut counts = vec![0; top + 1];
        for degree in degrees {
            counts[*degree] += 1;
        }
        Self { counts, max_degree }
    }

    /// Nodes at `degree`.
    pub fn count(&self, degree: usize) -> usize {
        self.counts.get(degree).copied().unwrap_or(0)
    }
}

impl fmt::Display for DegreeHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\nNode Degree Distribution:\n\n")?;
        for degree in 1..=self.max_degree {
            writeln!(f, "{degree:>3} = {:>4}", self.count(degree))?;
        }
        Ok(())
    }
}

/// Degree of every node, five to a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDegreeListing<'a> {
    degrees: &'a [usize],
}

impl<'a> NodeDegreeListing<'a> {
    /// Wraps per-node degrees.
    pub fn new(degrees: &'a [usize]) -> Self {
        Self { degrees }
    }
}

impl fmt::Display for NodeDegreeListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\nNode Degrees:\n")?;
        for (id, degree) in self.degrees.iter().enumerate() {
            if id % 5 == 0 {
                writeln!(f)?;
            }
            write!(f, "{id:>7} = {degree:>3}")?;
        }
        writeln!(f)
    }
}

/// JSON summary of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Nodes in the network.
    pub node_count: usize,
    /// Seed the run was generated from.
    pub seed: u64,
    /// Distribution constant.
    pub constant: f64,
    /// Highest degree the distribution allows.
    pub max_degree: usize,
    /// SHA-256 of the document.
    pub digest: String,
    /// Largest excess of any bin over its capacity.
    pub max_overshoot: i64,
    /// What the run built.
    pub stats: RunStats,
    /// Final degree histogram.
    pub histogram: DegreeHistogram,
}

impl RunSummary {
    /// Pretty printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, RangeError> {
        serde_json::to_string_pretty(self).map_err(|err| serde_error("summary-serialize", err))
    }

    /// Writes the summary as JSON to `path`.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), RangeError> {
        let path = path.as_ref();
        let json = self.to_json_pretty()?;
        fs::write(path, json).map_err(|err| {
            RangeError::Serde(
                ErrorInfo::new("summary-write", err.to_string()).with_context("path", path.display()),
            )
        })
    }

    /// Reads a summary back from JSON.
    pub fn from_json(json: &str) -> Result<Self, RangeError> {
        serde_json::from_str(json).map_err(|err| serde_error("summary-deserialize", err))
    }
}

fn serde_error(code: &str, err: serde_json::Error) -> RangeError {
    RangeError::Serde(ErrorInfo::new(code, err.to_string()))
}
