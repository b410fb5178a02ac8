//! Signed document payloads and issuer identity proofs.

use serde::{Deserialize, Serialize};
use shared_types::hash::normalize_hash;

/// How an issuer proves its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum IdentityProof {
    /// A decentralized identifier, resolved through a DID method.
    Did { did: String },
    /// A DNS domain publishing a TXT record binding it to the document.
    DnsTxt { location: String },
}

/// One issuer entry in a signed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
    pub name: Option<String>,
    pub identity_proof: Option<IdentityProof>,
}

/// The signed wrapper a caller submits for payload verification.
///
/// Carries the content fingerprint the signature commits to plus the
/// issuer list with their identity proofs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPayload {
    /// Schema version marker.
    pub version: String,
    pub issuers: Vec<Issuer>,
    /// Content fingerprint the signature targets (hex, 0x optional).
    pub target_hash: String,
}

impl SignedPayload {
    /// The normalized content fingerprint.
    #[must_use]
    pub fn normalized_hash(&self) -> String {
        normalize_hash(&self.target_hash)
    }

    /// The first identity proof of each kind present across issuers.
    #[must_use]
    pub fn identity_proofs(&self) -> Vec<&IdentityProof> {
        self.issuers
            .iter()
            .filter_map(|i| i.identity_proof.as_ref())
            .collect()
    }
}

/// The TXT record content a binding domain is expected to publish.
#[must_use]
pub fn expected_txt_record(network_id: u64, document_hash: &str) -> String {
    format!(
        "openatts net=ethereum netId={network_id} addr=0x{}",
        normalize_hash(document_hash)
    )
}

/// Substring match of the expected record over all published TXT records.
///
/// Records are flattened before matching because resolvers split long TXT
/// values into multiple strings.
#[must_use]
pub fn txt_records_match(records: &[String], expected: &str) -> bool {
    records.join(" ").contains(expected)
}
