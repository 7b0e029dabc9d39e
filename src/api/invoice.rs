//! Invoice endpoints (發票).

use serde::Serialize;

use super::wire::{DataEnvelope, FileEnvelope};
use crate::core::{
    AmegoError, ApiResponse, CreateInvoiceRequest, CreateInvoiceResponse,
    CreateInvoiceWithNumberRequest, DownloadStyle, InvoiceDetail, InvoiceList, InvoiceStatus,
    ListOptions, PrintData, PrintOptions, PrinterEncoding, validate_invoice_request,
};
use crate::transport::{BatchConfig, BatchExecutor, BatchResult, Dispatcher};

const CREATE: &str = "/json/f0401";
const CREATE_WITH_NUMBER: &str = "/json/f0401_custom";
const CANCEL: &str = "/json/f0501";
const STATUS: &str = "/json/invoice_status";
const DETAIL: &str = "/json/invoice_query";
const LIST: &str = "/json/invoice_list";
const FILE: &str = "/json/invoice_file";
const PRINT: &str = "/json/invoice_print";

#[derive(Serialize)]
struct InvoiceNumber<'a> {
    #[serde(rename = "InvoiceNumber")]
    number: &'a str,
}

#[derive(Serialize)]
struct CancelInvoice<'a> {
    #[serde(rename = "CancelInvoiceNumber")]
    number: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct FileRequest<'a> {
    invoice_number: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    download_style: Option<DownloadStyle>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PrintRequest<'a> {
    invoice_number: &'a str,
    printer_type: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    printer_lang: Option<PrinterEncoding>,
}

/// Invoice operations, obtained from [`AmegoClient::invoice`](super::AmegoClient::invoice).
#[derive(Debug, Clone, Copy)]
pub struct InvoiceOperations<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> InvoiceOperations<'a> {
    pub(crate) fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Issue an invoice. The request is validated locally first; a request
    /// with violations never reaches the network.
    pub async fn create(
        &self,
        request: &CreateInvoiceRequest,
    ) -> Result<CreateInvoiceResponse, AmegoError> {
        ensure_valid(request)?;
        self.dispatcher.send(CREATE, request).await
    }

    /// Issue an invoice under a caller-chosen invoice number.
    pub async fn create_with_number(
        &self,
        invoice_number: &str,
        request: &CreateInvoiceRequest,
    ) -> Result<CreateInvoiceResponse, AmegoError> {
        ensure_valid(request)?;
        let payload = CreateInvoiceWithNumberRequest {
            invoice: request.clone(),
            invoice_number: invoice_number.to_string(),
        };
        self.dispatcher.send(CREATE_WITH_NUMBER, &payload).await
    }

    /// Issue many invoices through a [`BatchExecutor`]. Items are labelled
    /// by order ID in progress reports.
    pub async fn create_many(
        &self,
        requests: Vec<CreateInvoiceRequest>,
        config: BatchConfig,
    ) -> BatchResult<CreateInvoiceRequest, CreateInvoiceResponse> {
        BatchExecutor::new(config)
            .run(
                requests,
                |request| async move { self.create(&request).await },
                |request| request.order_id.clone(),
            )
            .await
    }

    pub async fn cancel(&self, invoice_number: &str) -> Result<ApiResponse, AmegoError> {
        self.cancel_many(&[invoice_number]).await
    }

    pub async fn cancel_many(&self, invoice_numbers: &[&str]) -> Result<ApiResponse, AmegoError> {
        let payload: Vec<_> = invoice_numbers
            .iter()
            .map(|&number| CancelInvoice { number })
            .collect();
        self.dispatcher.send(CANCEL, &payload).await
    }

    pub async fn status(&self, invoice_number: &str) -> Result<InvoiceStatus, AmegoError> {
        let payload = [InvoiceNumber {
            number: invoice_number,
        }];
        let envelope: DataEnvelope<Vec<InvoiceStatus>> =
            self.dispatcher.send(STATUS, &payload).await?;
        envelope.first(STATUS)
    }

    pub async fn status_many(
        &self,
        invoice_numbers: &[&str],
    ) -> Result<Vec<InvoiceStatus>, AmegoError> {
        let payload: Vec<_> = invoice_numbers
            .iter()
            .map(|&number| InvoiceNumber { number })
            .collect();
        let envelope: DataEnvelope<Vec<InvoiceStatus>> =
            self.dispatcher.send(STATUS, &payload).await?;
        Ok(envelope.into_option().unwrap_or_default())
    }

    pub async fn detail(&self, invoice_number: &str) -> Result<InvoiceDetail, AmegoError> {
        let payload = InvoiceNumber {
            number: invoice_number,
        };
        let envelope: DataEnvelope<InvoiceDetail> = self.dispatcher.send(DETAIL, &payload).await?;
        envelope.require(DETAIL)
    }

    pub async fn list(&self, options: &ListOptions) -> Result<InvoiceList, AmegoError> {
        self.dispatcher.send(LIST, options).await
    }

    /// PDF of an issued invoice.
    pub async fn download_pdf(
        &self,
        invoice_number: &str,
        style: Option<DownloadStyle>,
    ) -> Result<Vec<u8>, AmegoError> {
        self.fetch_file(invoice_number, style)
            .await?
            .into_bytes(FILE)
    }

    /// PDF of an issued invoice, still base64 encoded.
    pub async fn pdf_base64(
        &self,
        invoice_number: &str,
        style: Option<DownloadStyle>,
    ) -> Result<String, AmegoError> {
        self.fetch_file(invoice_number, style)
            .await?
            .into_base64(FILE)
    }

    async fn fetch_file(
        &self,
        invoice_number: &str,
        style: Option<DownloadStyle>,
    ) -> Result<FileEnvelope, AmegoError> {
        let payload = FileRequest {
            invoice_number,
            download_style: style,
        };
        self.dispatcher.send(FILE, &payload).await
    }

    /// Thermal printer payload for an issued invoice.
    pub async fn print_data(
        &self,
        invoice_number: &str,
        options: PrintOptions,
    ) -> Result<PrintData, AmegoError> {
        let payload = PrintRequest {
            invoice_number,
            printer_type: options.printer_type,
            printer_lang: options.encoding,
        };
        self.dispatcher.send(PRINT, &payload).await
    }
}

fn ensure_valid(request: &CreateInvoiceRequest) -> Result<(), AmegoError> {
    let errors = validate_invoice_request(request);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AmegoError::validation("Invalid invoice request", errors))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn file_request_omits_unset_style() {
        let value = serde_json::to_value(FileRequest {
            invoice_number: "AB12345678",
            download_style: None,
        })
        .unwrap();
        assert_eq!(value, json!({"InvoiceNumber": "AB12345678"}));

        let value = serde_json::to_value(FileRequest {
            invoice_number: "AB12345678",
            download_style: Some(DownloadStyle(2)),
        })
        .unwrap();
        assert_eq!(value["DownloadStyle"], 2);
    }

    #[test]
    fn print_request_carries_encoding_code() {
        let value = serde_json::to_value(PrintRequest {
            invoice_number: "AB12345678",
            printer_type: 2,
            printer_lang: Some(PrinterEncoding::Utf8),
        })
        .unwrap();
        assert_eq!(
            value,
            json!({"InvoiceNumber": "AB12345678", "PrinterType": 2, "PrinterLang": 3})
        );
    }

    #[test]
    fn cancel_payload_is_a_list() {
        let payload: Vec<_> = ["AB00000001", "AB00000002"]
            .iter()
            .map(|&number| CancelInvoice { number })
            .collect();
        assert_eq!(
            serde_json::to_value(payload).unwrap(),
            json!([{"CancelInvoiceNumber": "AB00000001"}, {"CancelInvoiceNumber": "AB00000002"}])
        );
    }
}
