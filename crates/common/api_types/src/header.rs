use serde::{Deserialize, Serialize};

/// Payload of `GET /eth/v1/beacon/headers/head`, reduced to the fields the
/// monitor reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadHeaderData {
    pub header: SignedHeaderView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedHeaderView {
    pub message: HeaderMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderMessage {
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub proposer_index: u64,
}
