use sha2::{Digest, Sha256};

/// SHA-256 of the document text, lowercase hex.
pub fn document_digest(document: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document.as_bytes());
    format!("{:x}", hasher.finalize())
}
