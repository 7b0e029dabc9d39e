use md5::{Digest, Md5};

/// Request signature: lowercase hex MD5 of `payload + timestamp + app_key`.
///
/// The vendor protocol fixes the algorithm; it is an authenticity tag, not
/// a secure MAC.
pub fn sign(payload: &str, timestamp: i64, app_key: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(payload.as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(app_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// A payload ready to post: JSON text, the timestamp it was signed with and
/// the signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub payload: String,
    pub timestamp: i64,
    pub signature: String,
}

impl SignedRequest {
    pub fn new(payload: String, timestamp: i64, app_key: &str) -> Self {
        let signature = sign(&payload, timestamp, app_key);
        Self {
            payload,
            timestamp,
            signature,
        }
    }

    /// Form fields in the order the vendor documents them.
    pub fn form_fields(&self, tax_id: &str) -> [(&'static str, String); 4] {
        [
            ("invoice", tax_id.to_string()),
            ("data", self.payload.clone()),
            ("time", self.timestamp.to_string()),
            ("sign", self.signature.clone()),
        ]
    }
}
