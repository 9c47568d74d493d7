use serde::{Deserialize, Serialize};

/// An attestation as found in a block body. The participation bitfields stay
/// in their hex wire form here; `vigil_participation` turns them into
/// validator indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttestationView {
    pub aggregation_bits: String,
    pub data: AttestationDataView,
    /// Present on post-Electra blocks only (EIP-7549 aggregates).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committee_bits: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttestationDataView {
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub index: u64,
}
