//! Consensus documents nested inside the `Orderer/ConsensusType` value
//!
//! The value payload is an encoded [`ConsensusType`]; its `metadata` field is
//! itself an encoded [`RaftMetadata`] carrying the consenter list.

use crate::error::{ConfigUpdateError, ConfigUpdateResult};
use serde::{Deserialize, Serialize};
use shared_types::codec;
use std::fmt;

/// Operating state of the ordering service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusState {
    #[default]
    Normal,
    Maintenance,
}

/// Payload of the `ConsensusType` value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusType {
    /// Consensus implementation, e.g. `etcdraft`.
    pub kind: String,
    /// Implementation-specific metadata, opaque at this level.
    pub metadata: Vec<u8>,
    #[serde(default)]
    pub state: ConsensusState,
}

impl ConsensusType {
    pub fn new(kind: impl Into<String>, metadata: Vec<u8>) -> Self {
        Self {
            kind: kind.into(),
            metadata,
            state: ConsensusState::Normal,
        }
    }

    pub fn to_bytes(&self) -> ConfigUpdateResult<Vec<u8>> {
        codec::encode(self).map_err(|e| ConfigUpdateError::serialization("ConsensusType", e))
    }

    pub fn from_bytes(bytes: &[u8]) -> ConfigUpdateResult<Self> {
        codec::decode(bytes).map_err(|e| ConfigUpdateError::decode("ConsensusType", e))
    }
}

/// One consensus participant.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consenter {
    pub host: String,
    pub port: u16,
    pub client_tls_cert: Vec<u8>,
    pub server_tls_cert: Vec<u8>,
}

impl Consenter {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        client_tls_cert: Vec<u8>,
        server_tls_cert: Vec<u8>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            client_tls_cert,
            server_tls_cert,
        }
    }

    /// Byte-for-byte match on either certificate.
    pub fn has_certificate(&self, certificate: &[u8]) -> bool {
        self.client_tls_cert == certificate || self.server_tls_cert == certificate
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Certificates are long; show lengths only.
impl fmt::Debug for Consenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consenter")
            .field("endpoint", &self.endpoint())
            .field("client_tls_cert_len", &self.client_tls_cert.len())
            .field("server_tls_cert_len", &self.server_tls_cert.len())
            .finish()
    }
}

/// Raft tuning knobs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaftOptions {
    pub tick_interval_ms: u64,
    pub election_tick: u32,
    pub heartbeat_tick: u32,
    pub max_inflight_blocks: u32,
    pub snapshot_interval_size: u32,
}

impl Default for RaftOptions {
    fn default() -> Self {
        Self {
            tick_interval_ms: 500,
            election_tick: 10,
            heartbeat_tick: 1,
            max_inflight_blocks: 5,
            snapshot_interval_size: 16 * 1024 * 1024,
        }
    }
}

/// Raft metadata: the consenter set plus options.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaftMetadata {
    pub consenters: Vec<Consenter>,
    #[serde(default)]
    pub options: RaftOptions,
}

impl RaftMetadata {
    pub fn new(consenters: Vec<Consenter>) -> Self {
        Self {
            consenters,
            options: RaftOptions::default(),
        }
    }

    pub fn to_bytes(&self) -> ConfigUpdateResult<Vec<u8>> {
        codec::encode(self).map_err(|e| ConfigUpdateError::serialization("RaftMetadata", e))
    }

    pub fn from_bytes(bytes: &[u8]) -> ConfigUpdateResult<Self> {
        codec::decode(bytes).map_err(|e| ConfigUpdateError::decode("RaftMetadata", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certificate_match_either_side() {
        let c = Consenter::new("orderer1", 7050, b"client".to_vec(), b"server".to_vec());
        assert!(c.has_certificate(b"client"));
        assert!(c.has_certificate(b"server"));
        assert!(!c.has_certificate(b"clien"));
    }

    #[test]
    fn test_metadata_rejects_garbage() {
        let err = RaftMetadata::from_bytes(&[0xff; 3]).unwrap_err();
        assert!(matches!(err, ConfigUpdateError::Decode { .. }));
    }

    #[test]
    fn test_debug_hides_certificates() {
        let c = Consenter::new("orderer1", 7050, vec![7; 900], vec![8; 900]);
        let rendered = format!("{:?}", c);
        assert!(rendered.contains("orderer1:7050"));
        assert!(rendered.contains("900"));
        assert!(!rendered.contains("7, 7"));
    }

    #[test]
    fn test_consensus_type_nests_metadata() {
        let meta = RaftMetadata::new(vec![Consenter::new("o1", 7050, vec![1], vec![2])]);
        let ct = ConsensusType::new("etcdraft", meta.to_bytes().unwrap());
        let decoded = ConsensusType::from_bytes(&ct.to_bytes().unwrap()).unwrap();
        assert_eq!(RaftMetadata::from_bytes(&decoded.metadata).unwrap(), meta);
    }
}
