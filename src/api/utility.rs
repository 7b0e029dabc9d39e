//! Lookup endpoints: carriers, companies, lottery, number tracks and server time.

use serde::{Deserialize, Serialize};

use super::wire::DataEnvelope;
use crate::core::{
    AmegoError, BarcodeValidation, CompanyInfo, LotteryPeriod, LotteryStatus, NumberStatus,
    ServerTime, TrackInfo,
};
use crate::transport::Dispatcher;
use crate::transport::time_sync::{TIME_ENDPOINT, measure_offset};

const BARCODE: &str = "/json/barcode";
const BAN_QUERY: &str = "/json/ban_query";
const LOTTERY_STATUS: &str = "/json/lottery_status";
const LOTTERY_TYPE: &str = "/json/lottery_type";
const TRACK_ALL: &str = "/json/track_all";
const TRACK_GET: &str = "/json/track_get";
const TRACK_STATUS: &str = "/json/track_status";

#[derive(Serialize)]
struct BarcodeRequest<'a> {
    #[serde(rename = "Barcode")]
    barcode: &'a str,
}

#[derive(Serialize)]
struct BanRequest<'a> {
    ban: &'a str,
}

#[derive(Serialize)]
struct InvoiceNumber<'a> {
    #[serde(rename = "InvoiceNumber")]
    number: &'a str,
}

#[derive(Serialize)]
struct PeriodRequest<'a> {
    #[serde(rename = "Period", skip_serializing_if = "Option::is_none")]
    period: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct TrackGetRequest<'a> {
    count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    track_api_code: Option<&'a str>,
}

#[derive(Deserialize)]
struct BarcodeBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(rename = "carrierId1", alias = "CarrierId1")]
    carrier_id1: Option<String>,
    #[serde(rename = "carrierId2", alias = "CarrierId2")]
    carrier_id2: Option<String>,
}

#[derive(Deserialize)]
struct BanEntry {
    ban: String,
    name: Option<String>,
}

impl From<BanEntry> for CompanyInfo {
    fn from(entry: BanEntry) -> Self {
        let name = entry.name.filter(|name| !name.is_empty());
        Self {
            found: name.is_some(),
            name,
            tax_id: entry.ban,
        }
    }
}

/// Utility operations, obtained from [`AmegoClient::utility`](super::AmegoClient::utility).
#[derive(Debug, Clone, Copy)]
pub struct UtilityOperations<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> UtilityOperations<'a> {
    pub(crate) fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Check a mobile barcode against the registry.
    ///
    /// A rejection of the barcode comes back as `valid: false` with the
    /// vendor's code and message. Signature and clock errors (codes 2, 3, 15)
    /// and codes in the retry allow-list are failures of the call itself and
    /// propagate.
    pub async fn validate_barcode(&self, barcode: &str) -> Result<BarcodeValidation, AmegoError> {
        let payload = BarcodeRequest { barcode };
        match self.dispatcher.send::<_, BarcodeBody>(BARCODE, &payload).await {
            Ok(body) => Ok(BarcodeValidation {
                valid: body.code == 0,
                code: body.code,
                message: body.msg,
                carrier_id1: body.carrier_id1,
                carrier_id2: body.carrier_id2,
            }),
            Err(err) if !self.is_barcode_rejection(&err) => Err(err),
            Err(AmegoError::Api { code, message, .. }) => Ok(BarcodeValidation {
                valid: false,
                code,
                message,
                carrier_id1: None,
                carrier_id2: None,
            }),
            Err(err) => Err(err),
        }
    }

    fn is_barcode_rejection(&self, err: &AmegoError) -> bool {
        match err {
            AmegoError::Api { code, .. } => {
                let transient = self
                    .dispatcher
                    .config()
                    .retry
                    .as_ref()
                    .is_some_and(|retry| retry.retryable_codes.contains(code));
                !err.is_signature_error() && !transient
            }
            _ => false,
        }
    }

    /// Company name registered for a tax ID. Unknown IDs come back with
    /// `found: false`.
    pub async fn query_company(&self, tax_id: &str) -> Result<CompanyInfo, AmegoError> {
        let found = self.query_company_many(&[tax_id]).await?;
        Ok(found.into_iter().next().unwrap_or_else(|| CompanyInfo {
            found: false,
            name: None,
            tax_id: tax_id.to_string(),
        }))
    }

    pub async fn query_company_many(
        &self,
        tax_ids: &[&str],
    ) -> Result<Vec<CompanyInfo>, AmegoError> {
        let payload: Vec<_> = tax_ids.iter().map(|&ban| BanRequest { ban }).collect();
        let envelope: DataEnvelope<Vec<BanEntry>> =
            self.dispatcher.send(BAN_QUERY, &payload).await?;
        Ok(envelope
            .into_option()
            .unwrap_or_default()
            .into_iter()
            .map(CompanyInfo::from)
            .collect())
    }

    pub async fn check_lottery(&self, invoice_number: &str) -> Result<LotteryStatus, AmegoError> {
        let payload = InvoiceNumber {
            number: invoice_number,
        };
        let envelope: DataEnvelope<LotteryStatus> =
            self.dispatcher.send(LOTTERY_STATUS, &payload).await?;
        Ok(envelope.into_option().unwrap_or_default())
    }

    /// Prize tables, for one period (e.g. `"11312"`) or the latest ones.
    pub async fn lottery_prizes(
        &self,
        period: Option<&str>,
    ) -> Result<Vec<LotteryPeriod>, AmegoError> {
        let envelope: DataEnvelope<Vec<LotteryPeriod>> = self
            .dispatcher
            .send(LOTTERY_TYPE, &PeriodRequest { period })
            .await?;
        Ok(envelope.into_option().unwrap_or_default())
    }

    /// Number tracks assigned to the merchant.
    pub async fn track_info(&self, period: Option<&str>) -> Result<Vec<TrackInfo>, AmegoError> {
        let envelope: DataEnvelope<Vec<TrackInfo>> = self
            .dispatcher
            .send(TRACK_ALL, &PeriodRequest { period })
            .await?;
        Ok(envelope.into_option().unwrap_or_default())
    }

    pub async fn server_time(&self) -> Result<ServerTime, AmegoError> {
        self.dispatcher.get(TIME_ENDPOINT).await
    }

    /// Seconds the server clock is ahead of the local one. Always measured
    /// fresh; the signing offset cache is neither read nor updated.
    pub async fn time_offset(&self) -> Result<i64, AmegoError> {
        Ok(measure_offset(self.dispatcher.transport()).await?.0)
    }

    /// Reserve `count` invoice numbers.
    pub async fn invoice_numbers(
        &self,
        count: u32,
        track_api_code: Option<&str>,
    ) -> Result<Vec<String>, AmegoError> {
        let payload = TrackGetRequest {
            count,
            track_api_code,
        };
        let envelope: DataEnvelope<Vec<String>> =
            self.dispatcher.send(TRACK_GET, &payload).await?;
        Ok(envelope.into_option().unwrap_or_default())
    }

    pub async fn number_status(&self, invoice_number: &str) -> Result<NumberStatus, AmegoError> {
        let payload = InvoiceNumber {
            number: invoice_number,
        };
        let envelope: DataEnvelope<NumberStatus> =
            self.dispatcher.send(TRACK_STATUS, &payload).await?;
        Ok(envelope.into_option().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn company_found_only_with_a_name() {
        let entries: Vec<BanEntry> = serde_json::from_value(json!([
            {"ban": "28080623", "name": "光貿科技有限公司"},
            {"ban": "12345678", "name": ""},
            {"ban": "87654321"}
        ]))
        .unwrap();
        let infos: Vec<CompanyInfo> = entries.into_iter().map(CompanyInfo::from).collect();
        assert!(infos[0].found);
        assert_eq!(infos[0].tax_id, "28080623");
        assert!(!infos[1].found);
        assert_eq!(infos[1].name, None);
        assert!(!infos[2].found);
    }

    #[test]
    fn period_is_omitted_when_unset() {
        assert_eq!(
            serde_json::to_value(PeriodRequest { period: None }).unwrap(),
            json!({})
        );
        assert_eq!(
            serde_json::to_value(PeriodRequest {
                period: Some("11312")
            })
            .unwrap(),
            json!({"Period": "11312"})
        );
    }

    #[test]
    fn track_get_payload() {
        let value = serde_json::to_value(TrackGetRequest {
            count: 50,
            track_api_code: Some("AB"),
        })
        .unwrap();
        assert_eq!(value, json!({"Count": 50, "TrackApiCode": "AB"}));
    }
}
