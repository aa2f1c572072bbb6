//! Deterministic name hashing for the registry hierarchy
//!
//! Names are dot-separated label sequences. Each name maps to a 32-byte node
//! identifier: the root is all zeros, and every other node is the Keccak-256
//! hash of its parent node and its label hash, folded from the top-level label
//! down. Sibling names therefore share hashed ancestors, which is what makes
//! the registry hierarchical.
//!
//! A label may also be supplied in "encoded" form, `[<64 hex chars>]`, when
//! only its hash is known; such labels decode directly and are never
//! normalized or re-hashed.

use sha3::{Digest, Keccak256};

use crate::{LabelHash, NodeId, TnsError, TnsResult};

/// Literal label naming the registry root node
pub const ROOT_SENTINEL: &str = "[root]";

/// Keccak-256 digest of arbitrary bytes
pub(crate) fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Check whether a label is an encoded labelhash (`[<64 hex chars>]`)
pub fn is_encoded_labelhash(label: &str) -> bool {
    let bytes = label.as_bytes();
    bytes.len() == 66
        && bytes[0] == b'['
        && bytes[65] == b']'
        && label[1..65].chars().all(|c| c.is_ascii_hexdigit())
}

/// Decode an encoded labelhash into its 32-byte hash
pub fn decode_labelhash(label: &str) -> TnsResult<LabelHash> {
    if !is_encoded_labelhash(label) {
        return Err(TnsError::InvalidName(format!(
            "{label:?} is not an encoded labelhash"
        )));
    }
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(label[1..65].to_lowercase(), &mut bytes)
        .map_err(|e| TnsError::Encoding(e.to_string()))?;
    Ok(LabelHash::from_bytes(bytes))
}

/// Encode a label hash into its bracketed hex form
pub fn encode_labelhash(hash: LabelHash) -> String {
    format!("[{}]", hex::encode(hash.as_bytes()))
}

/// Normalize a plain label before hashing.
///
/// Folding is ASCII-style case folding over the label's characters; two
/// labels that differ only by case hash identically. Empty labels are
/// rejected, as is a stray dot inside what should be a single label.
pub fn normalize_label(label: &str) -> TnsResult<String> {
    if label.is_empty() {
        return Err(TnsError::InvalidName("name cannot have empty labels".to_string()));
    }
    if label.contains('.') {
        return Err(TnsError::InvalidName(format!("{label:?} is not a single label")));
    }
    Ok(label.to_lowercase())
}

/// Hash a single label to its 32-byte label hash.
///
/// Encoded labels decode directly: the caller already holds the hash and the
/// preimage is unknown or irrelevant. Plain labels are normalized and their
/// UTF-8 bytes hashed with Keccak-256.
pub fn label_hash(label: &str) -> TnsResult<LabelHash> {
    if is_encoded_labelhash(label) {
        return decode_labelhash(label);
    }
    let normalized = normalize_label(label)?;
    Ok(LabelHash::from_bytes(keccak256(normalized.as_bytes())))
}

/// Hash a dotted name to its node identifier.
///
/// `[root]` maps to the zero node. Otherwise labels are folded from the
/// rightmost (top-level) label to the leftmost:
/// `node = keccak256(node || label_hash(label))`, starting from the zero node.
pub fn namehash(name: &str) -> TnsResult<NodeId> {
    if name == ROOT_SENTINEL {
        return Ok(NodeId::zero());
    }
    if name.is_empty() {
        return Err(TnsError::InvalidName("name cannot be empty".to_string()));
    }
    let mut node = [0u8; 32];
    for label in name.split('.').rev() {
        let label_sha = label_hash(label)?;
        let mut input = [0u8; 64];
        input[..32].copy_from_slice(&node);
        input[32..].copy_from_slice(label_sha.as_bytes());
        node = keccak256(&input);
    }
    Ok(NodeId::from_bytes(node))
}

/// Validate a dotted name and return its normalized form.
///
/// Every label must be nonempty; encoded labels and the root sentinel pass
/// through unchanged, plain labels are case-folded.
pub fn validate_name(name: &str) -> TnsResult<String> {
    if name.is_empty() {
        return Err(TnsError::InvalidName("name cannot be empty".to_string()));
    }
    let normalized: Vec<String> = name
        .split('.')
        .map(|label| {
            if label == ROOT_SENTINEL || is_encoded_labelhash(label) {
                Ok(label.to_string())
            } else {
                normalize_label(label)
            }
        })
        .collect::<TnsResult<_>>()?;
    Ok(normalized.join("."))
}

/// Whether a string is usable as a single registrable label
pub fn is_label_valid(label: &str) -> bool {
    !label.contains('.') && validate_name(label).is_ok()
}
