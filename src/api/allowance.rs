//! Allowance (折讓) endpoints.

use serde::Serialize;

use super::wire::{DataEnvelope, FileEnvelope};
use crate::core::{
    AllowanceDetail, AllowanceList, AllowanceStatus, AmegoError, ApiResponse,
    CreateAllowanceRequest, CreateAllowanceResponse, ListOptions, PrintData, PrintOptions,
    PrinterEncoding, validate_allowance_request,
};
use crate::transport::Dispatcher;

const CREATE: &str = "/json/g0401";
const CANCEL: &str = "/json/g0501";
const STATUS: &str = "/json/allowance_status";
const DETAIL: &str = "/json/allowance_query";
const LIST: &str = "/json/allowance_list";
const FILE: &str = "/json/allowance_file";
const PRINT: &str = "/json/allowance_print";

#[derive(Serialize)]
struct AllowanceNumber<'a> {
    #[serde(rename = "AllowanceNumber")]
    number: &'a str,
}

#[derive(Serialize)]
struct CancelAllowance<'a> {
    #[serde(rename = "CancelAllowanceNumber")]
    number: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PrintRequest<'a> {
    allowance_number: &'a str,
    printer_type: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    printer_lang: Option<PrinterEncoding>,
}

/// Allowance operations, obtained from [`AmegoClient::allowance`](super::AmegoClient::allowance).
#[derive(Debug, Clone, Copy)]
pub struct AllowanceOperations<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> AllowanceOperations<'a> {
    pub(crate) fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Issue an allowance against one or more invoices.
    pub async fn create(
        &self,
        request: &CreateAllowanceRequest,
    ) -> Result<CreateAllowanceResponse, AmegoError> {
        let errors = validate_allowance_request(request);
        if !errors.is_empty() {
            return Err(AmegoError::validation("Invalid allowance request", errors));
        }
        self.dispatcher.send(CREATE, request).await
    }

    pub async fn cancel(&self, allowance_number: &str) -> Result<ApiResponse, AmegoError> {
        self.cancel_many(&[allowance_number]).await
    }

    pub async fn cancel_many(
        &self,
        allowance_numbers: &[&str],
    ) -> Result<ApiResponse, AmegoError> {
        let payload: Vec<_> = allowance_numbers
            .iter()
            .map(|&number| CancelAllowance { number })
            .collect();
        self.dispatcher.send(CANCEL, &payload).await
    }

    pub async fn status(&self, allowance_number: &str) -> Result<AllowanceStatus, AmegoError> {
        let payload = [AllowanceNumber {
            number: allowance_number,
        }];
        let envelope: DataEnvelope<Vec<AllowanceStatus>> =
            self.dispatcher.send(STATUS, &payload).await?;
        envelope.first(STATUS)
    }

    pub async fn status_many(
        &self,
        allowance_numbers: &[&str],
    ) -> Result<Vec<AllowanceStatus>, AmegoError> {
        let payload: Vec<_> = allowance_numbers
            .iter()
            .map(|&number| AllowanceNumber { number })
            .collect();
        let envelope: DataEnvelope<Vec<AllowanceStatus>> =
            self.dispatcher.send(STATUS, &payload).await?;
        Ok(envelope.into_option().unwrap_or_default())
    }

    pub async fn detail(&self, allowance_number: &str) -> Result<AllowanceDetail, AmegoError> {
        let payload = AllowanceNumber {
            number: allowance_number,
        };
        let envelope: DataEnvelope<AllowanceDetail> =
            self.dispatcher.send(DETAIL, &payload).await?;
        envelope.require(DETAIL)
    }

    /// `date_select` only applies to invoice lists and is left out here.
    pub async fn list(&self, options: &ListOptions) -> Result<AllowanceList, AmegoError> {
        let options = ListOptions {
            date_select: None,
            ..options.clone()
        };
        self.dispatcher.send(LIST, &options).await
    }

    pub async fn download_pdf(&self, allowance_number: &str) -> Result<Vec<u8>, AmegoError> {
        self.fetch_file(allowance_number).await?.into_bytes(FILE)
    }

    pub async fn pdf_base64(&self, allowance_number: &str) -> Result<String, AmegoError> {
        self.fetch_file(allowance_number).await?.into_base64(FILE)
    }

    async fn fetch_file(&self, allowance_number: &str) -> Result<FileEnvelope, AmegoError> {
        let payload = AllowanceNumber {
            number: allowance_number,
        };
        self.dispatcher.send(FILE, &payload).await
    }

    pub async fn print_data(
        &self,
        allowance_number: &str,
        options: PrintOptions,
    ) -> Result<PrintData, AmegoError> {
        let payload = PrintRequest {
            allowance_number,
            printer_type: options.printer_type,
            printer_lang: options.encoding,
        };
        self.dispatcher.send(PRINT, &payload).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn print_request_without_encoding() {
        let value = serde_json::to_value(PrintRequest {
            allowance_number: "AL0001",
            printer_type: 1,
            printer_lang: None,
        })
        .unwrap();
        assert_eq!(value, json!({"AllowanceNumber": "AL0001", "PrinterType": 1}));
    }

    #[test]
    fn cancel_payload_uses_vendor_key() {
        let value = serde_json::to_value([CancelAllowance { number: "AL0001" }]).unwrap();
        assert_eq!(value, json!([{"CancelAllowanceNumber": "AL0001"}]));
    }
}
