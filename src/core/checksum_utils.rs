/*
 * Checksums and content-derived identifiers for uploaded blobs. SHA256 is used
 * both to record a content checksum in the file metadata and to mint file ids.
 */
use sha2::{Digest, Sha256};

/* Hex-encoded SHA256 of `content`. */
pub fn calculate_sha256_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/*
 * Derives a short file id from the upload's name, its content checksum and the
 * upload instant, so re-uploading identical content still yields a new id.
 */
pub fn derive_file_id(name: &str, checksum: &str, uploaded_at_nanos: i128) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(checksum.as_bytes());
    hasher.update(uploaded_at_nanos.to_le_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("f-{}", &digest[..16])
}
