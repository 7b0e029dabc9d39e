//! Response envelopes shared by the operation groups.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

use crate::core::AmegoError;

/// `{code, msg, data}` envelope. The envelope code has already been checked
/// by the dispatcher, so only `data` is kept.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    data: Option<T>,
}

impl<T> DataEnvelope<T> {
    pub(crate) fn into_option(self) -> Option<T> {
        self.data
    }

    /// The payload, or [`AmegoError::InvalidResponse`] when it is missing.
    pub(crate) fn require(self, endpoint: &str) -> Result<T, AmegoError> {
        self.data
            .ok_or_else(|| AmegoError::InvalidResponse(format!("{endpoint}: response has no data")))
    }
}

impl<T> DataEnvelope<Vec<T>> {
    /// First element of a list payload.
    pub(crate) fn first(self, endpoint: &str) -> Result<T, AmegoError> {
        self.require(endpoint)?
            .into_iter()
            .next()
            .ok_or_else(|| AmegoError::InvalidResponse(format!("{endpoint}: empty result list")))
    }
}

/// Body of the file and print endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct FileEnvelope {
    base64_data: Option<String>,
}

impl FileEnvelope {
    pub(crate) fn into_base64(self, endpoint: &str) -> Result<String, AmegoError> {
        self.base64_data
            .filter(|data| !data.is_empty())
            .ok_or_else(|| AmegoError::InvalidResponse(format!("{endpoint}: no file data returned")))
    }

    pub(crate) fn into_bytes(self, endpoint: &str) -> Result<Vec<u8>, AmegoError> {
        let encoded = self.into_base64(endpoint)?;
        STANDARD.decode(encoded.trim()).map_err(|e| {
            AmegoError::InvalidResponse(format!("{endpoint}: invalid base64 payload: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(body: &str) -> FileEnvelope {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn file_payload_is_decoded() {
        let bytes = file(r#"{"code":0,"base64_data":"JVBERi0="}"#)
            .into_bytes("/json/invoice_file")
            .unwrap();
        assert_eq!(bytes, b"%PDF-");
    }

    #[test]
    fn missing_or_empty_file_data_is_invalid_response() {
        for body in [r#"{"code":0}"#, r#"{"code":0,"base64_data":""}"#] {
            let err = file(body).into_base64("/json/invoice_file").unwrap_err();
            assert!(matches!(err, AmegoError::InvalidResponse(_)));
        }
    }

    #[test]
    fn garbage_base64_is_invalid_response() {
        let err = file(r#"{"base64_data":"***"}"#)
            .into_bytes("/json/invoice_file")
            .unwrap_err();
        assert!(err.to_string().contains("invalid base64"));
    }

    #[test]
    fn data_envelope_helpers() {
        let list: DataEnvelope<Vec<u32>> = serde_json::from_str(r#"{"code":0,"data":[4,5]}"#).unwrap();
        assert_eq!(list.first("/x").unwrap(), 4);

        let empty: DataEnvelope<Vec<u32>> = serde_json::from_str(r#"{"code":0,"data":[]}"#).unwrap();
        assert!(empty.first("/x").is_err());

        let absent: DataEnvelope<u32> = serde_json::from_str(r#"{"code":0,"msg":""}"#).unwrap();
        assert_eq!(absent.into_option(), None);
    }
}
