use std::fmt;
use std::str::FromStr;

use tokio::time::Instant;

use crate::constants::COL_MEMBER_HOST;
use crate::constants::COL_MEMBER_ID;
use crate::constants::COL_MEMBER_PORT;
use crate::constants::COL_MEMBER_ROLE;
use crate::constants::COL_MEMBER_STATE;
use crate::Row;
use crate::TopologyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberState {
    Online,
    Recovering,
    Offline,
    Error,
    Unreachable,
}

impl MemberState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberState::Online => "ONLINE",
            MemberState::Recovering => "RECOVERING",
            MemberState::Offline => "OFFLINE",
            MemberState::Error => "ERROR",
            MemberState::Unreachable => "UNREACHABLE",
        }
    }
}

impl FromStr for MemberState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONLINE" => Ok(MemberState::Online),
            "RECOVERING" => Ok(MemberState::Recovering),
            "OFFLINE" => Ok(MemberState::Offline),
            "ERROR" => Ok(MemberState::Error),
            "UNREACHABLE" => Ok(MemberState::Unreachable),
            other => Err(format!("unknown member state '{other}'")),
        }
    }
}

impl fmt::Display for MemberState {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberRole {
    Primary,
    Secondary,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Primary => "PRIMARY",
            MemberRole::Secondary => "SECONDARY",
        }
    }
}

impl FromStr for MemberRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRIMARY" => Ok(MemberRole::Primary),
            "SECONDARY" => Ok(MemberRole::Secondary),
            other => Err(format!("unknown member role '{other}'")),
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the group membership table at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberStatus {
    pub member_id: String,
    pub host: String,
    pub port: u16,
    pub state: MemberState,
    pub role: MemberRole,
}

impl MemberStatus {
    pub fn is_primary(&self) -> bool {
        self.role == MemberRole::Primary
    }

    /// Parses one membership row; `node` only labels the error.
    pub fn from_row(
        node: &str,
        row: &Row,
    ) -> Result<Self, TopologyError> {
        let malformed = |reason: String| TopologyError::MalformedRow {
            node: node.to_string(),
            reason,
        };
        let text = |column: &str| {
            row.get_text(column)
                .map(str::to_string)
                .ok_or_else(|| malformed(format!("missing column {column}")))
        };

        let port = row
            .get_u64(COL_MEMBER_PORT)
            .and_then(|p| u16::try_from(p).ok())
            .ok_or_else(|| malformed(format!("missing or invalid column {COL_MEMBER_PORT}")))?;

        Ok(Self {
            member_id: text(COL_MEMBER_ID)?,
            host: text(COL_MEMBER_HOST)?,
            port,
            state: text(COL_MEMBER_STATE)?.parse().map_err(malformed)?,
            role: text(COL_MEMBER_ROLE)?.parse().map_err(malformed)?,
        })
    }
}

/// All members reported by one node for one probe. Immutable once returned.
#[derive(Debug, Clone)]
pub struct TopologySnapshot {
    /// Logical name of the node that answered
    pub source: String,
    pub taken_at: Instant,
    pub members: Vec<MemberStatus>,
}

impl TopologySnapshot {
    pub fn primary(&self) -> Option<&MemberStatus> {
        self.members.iter().find(|m| m.is_primary())
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_by_host(
        &self,
        host: &str,
    ) -> Option<&MemberStatus> {
        self.members.iter().find(|m| m.host == host)
    }
}
