use std::fmt;
use std::time::Duration;

use crate::utils::time::format_secs;
use crate::Table;

/// Row count observed on one node; `None` when the node could not answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCount {
    pub node: String,
    pub count: Option<u64>,
}

/// Per-node row counts of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub table: Table,
    pub counts: Vec<NodeCount>,
}

impl ConsistencyReport {
    /// Every node produced a count and all counts are equal.
    pub fn is_consistent(&self) -> bool {
        let mut counts = self.counts.iter().map(|c| c.count);
        match counts.next() {
            Some(Some(first)) => counts.all(|c| c == Some(first)),
            _ => false,
        }
    }

    pub fn count_of(
        &self,
        node: &str,
    ) -> Option<u64> {
        self.counts.iter().find(|c| c.node == node).and_then(|c| c.count)
    }

    pub fn unavailable_nodes(&self) -> Vec<&str> {
        self.counts
            .iter()
            .filter(|c| c.count.is_none())
            .map(|c| c.node.as_str())
            .collect()
    }
}

impl fmt::Display for ConsistencyReport {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        for c in &self.counts {
            match c.count {
                Some(n) => writeln!(f, "  {}: {} rows", c.node, n)?,
                None => writeln!(f, "  {}: unavailable", c.node)?,
            }
        }
        write!(
            f,
            "  {}: {}",
            self.table,
            if self.is_consistent() { "consistent" } else { "INCONSISTENT" }
        )
    }
}

/// Outcome of reading one payload row back from one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadReport {
    Match,
    /// Bytes differ; index of the first differing byte (or the shorter
    /// length when one side is a prefix of the other)
    Mismatch {
        first_difference: usize,
        observed_len: usize,
    },
    /// Node answered but the row does not exist there
    Missing,
    /// Node could not be read
    Unavailable,
}

impl PayloadReport {
    pub fn is_match(&self) -> bool {
        matches!(self, PayloadReport::Match)
    }
}

impl fmt::Display for PayloadReport {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            PayloadReport::Match => write!(f, "match"),
            PayloadReport::Mismatch {
                first_difference,
                observed_len,
            } => write!(f, "MISMATCH at byte {first_difference} ({observed_len} bytes read)"),
            PayloadReport::Missing => write!(f, "missing"),
            PayloadReport::Unavailable => write!(f, "unavailable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePayload {
    pub node: String,
    pub report: PayloadReport,
}

/// Payload comparison across every node for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadCheck {
    pub id: u64,
    pub expected_len: usize,
    pub results: Vec<NodePayload>,
}

impl PayloadCheck {
    /// Every node returned the exact bytes.
    pub fn all_match(&self) -> bool {
        !self.results.is_empty() && self.results.iter().all(|r| r.report.is_match())
    }
}

impl fmt::Display for PayloadCheck {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(f, "  payload #{} ({} bytes)", self.id, self.expected_len)?;
        for r in &self.results {
            writeln!(f, "    {}: {}", r.node, r.report)?;
        }
        write!(f, "    verdict: {}", if self.all_match() { "identical" } else { "DIVERGED" })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLag {
    pub node: String,
    /// Time until the row became visible; `None` if it never did in time
    pub lag: Option<Duration>,
}

/// Replication lag of one freshly written row, per secondary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LagReport {
    pub primary: String,
    pub entries: Vec<NodeLag>,
}

impl LagReport {
    pub fn max_lag(&self) -> Option<Duration> {
        self.entries.iter().filter_map(|e| e.lag).max()
    }

    pub fn all_replicated(&self) -> bool {
        self.entries.iter().all(|e| e.lag.is_some())
    }
}

impl fmt::Display for LagReport {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "  replication lag from {}:", self.primary)?;
        for e in &self.entries {
            match e.lag {
                Some(lag) => write!(f, "\n    {}: {}", e.node, format_secs(lag))?,
                None => write!(f, "\n    {}: not replicated in time", e.node)?,
            }
        }
        Ok(())
    }
}
