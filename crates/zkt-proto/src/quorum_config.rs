//! Textual cluster-configuration parsing.
//!
//! Election notifications from reconfig-aware servers embed the membership
//! as text, one entry per line:
//!
//! ```text
//! server.<sid>=<host>:<zab_port>:<fle_port>[:<role>][;<client_host>:<client_port>]
//! version=<hex>
//! ```
//!
//! The client section may omit its host (`;2181`), which means "bound on
//! all interfaces". Lines that are neither `server.` nor `version=` are
//! preserved verbatim as [`ConfigEntry::Unsupported`].

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("bad config line {line:?}: {reason}")]
    BadConfig { line: String, reason: &'static str },
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Voting vs. non-voting membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LearnerRole {
    #[default]
    Participant,
    Observer,
}

impl fmt::Display for LearnerRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LearnerRole::Participant => f.write_str("participant"),
            LearnerRole::Observer => f.write_str("observer"),
        }
    }
}

/// The client-port section of a server line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddr {
    pub host: String,
    pub port: u16,
}

/// One `server.N=` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEntry {
    pub sid: i64,
    /// Host carrying both the broadcast and the election listener.
    pub zab_fle_host: String,
    pub zab_port: u16,
    pub fle_port: u16,
    pub role: LearnerRole,
    /// Absent when the line carries no `;client` section.
    pub client: Option<ClientAddr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEntry {
    Server(ServerEntry),
    Version(i64),
    Unsupported(String),
}

/// An ordered cluster configuration as found in a notification trailer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuorumConfig {
    pub entries: Vec<ConfigEntry>,
}

impl QuorumConfig {
    pub fn servers(&self) -> impl Iterator<Item = &ServerEntry> {
        self.entries.iter().filter_map(|entry| match entry {
            ConfigEntry::Server(server) => Some(server),
            _ => None,
        })
    }

    pub fn version(&self) -> Option<i64> {
        self.entries.iter().find_map(|entry| match entry {
            ConfigEntry::Version(version) => Some(*version),
            _ => None,
        })
    }

    // -----------------------------------------------------------------------
    // Parsing
    // -----------------------------------------------------------------------

    pub fn parse(text: &str) -> Result<QuorumConfig, ConfigError> {
        let mut entries = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with("server.") {
                entries.push(ConfigEntry::Server(parse_server_line(line)?));
            } else if let Some(version) = line.strip_prefix("version=") {
                let version = i64::from_str_radix(version.trim_start_matches("0x"), 16).map_err(
                    |_| ConfigError::BadConfig {
                        line: line.to_owned(),
                        reason: "version is not a hex integer",
                    },
                )?;
                entries.push(ConfigEntry::Version(version));
            } else {
                entries.push(ConfigEntry::Unsupported(line.to_owned()));
            }
        }
        Ok(QuorumConfig { entries })
    }
}

fn parse_server_line(line: &str) -> Result<ServerEntry, ConfigError> {
    let bad = |reason: &'static str| ConfigError::BadConfig {
        line: line.to_owned(),
        reason,
    };

    let Some(rest) = line.strip_prefix("server.") else {
        return Err(bad("not a server line"));
    };
    let (sid, spec) = rest.split_once('=').ok_or_else(|| bad("missing '='"))?;
    let sid = sid.parse::<i64>().map_err(|_| bad("server id is not an integer"))?;

    let (main, client) = match spec.split_once(';') {
        Some((main, client)) => (main, Some(client)),
        None => (spec, None),
    };

    let mut parts: Vec<&str> = main.split(':').collect();
    let role = match parts.last() {
        Some(&"participant") => {
            parts.pop();
            LearnerRole::Participant
        }
        Some(&"observer") => {
            parts.pop();
            LearnerRole::Observer
        }
        _ => LearnerRole::Participant,
    };
    let (zab_fle_host, zab_port, fle_port) = match parts.as_slice() {
        [host, zab, fle] => (*host, *zab, *fle),
        _ => return Err(bad("expected host:zab_port:fle_port")),
    };
    if zab_fle_host.is_empty() {
        return Err(bad("empty host"));
    }
    let zab_port = zab_port.parse::<u16>().map_err(|_| bad("bad zab port"))?;
    let fle_port = fle_port.parse::<u16>().map_err(|_| bad("bad fle port"))?;

    let client = match client {
        None => None,
        Some(client) => {
            let (host, port) = match client.rsplit_once(':') {
                Some((host, port)) => (host, port),
                None => ("0.0.0.0", client),
            };
            let port = port.parse::<u16>().map_err(|_| bad("bad client port"))?;
            Some(ClientAddr {
                host: host.to_owned(),
                port,
            })
        }
    };

    Ok(ServerEntry {
        sid,
        zab_fle_host: zab_fle_host.to_owned(),
        zab_port,
        fle_port,
        role,
        client,
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
