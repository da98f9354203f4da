//! GBDBS registry client.
//!
//! Sends a `GetParcelsByIdRequest` (GBDBS 2.1) for one EGRID and extracts
//! the lookup tables from the response.

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use crate::config::{validate_egrid, OwnerConfig};
use crate::error::Result;
use crate::extract::parse_registry_response;
use crate::http::send_text;
use crate::resolver::ParcelSource;
use crate::types::RegistryRecords;

/// Service name used in logs and errors.
pub const GBDBS_SERVICE: &str = "GBDBS";

/// Client for the GBDBS registry endpoint.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    service_url: String,
    transaction_prefix: String,
    hide_owner_addresses: bool,
}

impl RegistryClient {
    /// Create a registry client on top of a shared HTTP client.
    pub fn new(client: Client, config: &OwnerConfig) -> Self {
        Self {
            client,
            service_url: config.gbdbs_service_url.clone(),
            transaction_prefix: config.transaction_prefix.clone(),
            hide_owner_addresses: config.hide_owner_addresses,
        }
    }

    /// Fetch the raw registry document for `egrid`.
    ///
    /// Single attempt; a timeout, connection failure or non-success status
    /// is returned as an error.
    pub fn fetch_parcel_document(&self, egrid: &str) -> Result<String> {
        validate_egrid(egrid)?;

        let transaction_id = transaction_id(&self.transaction_prefix, Utc::now());
        tracing::info!(
            url = %self.service_url,
            egrid,
            transaction_id = %transaction_id,
            "POST GBDBS request"
        );

        let request = self
            .client
            .post(&self.service_url)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header(ACCEPT, "application/xml")
            .body(build_request(&transaction_id, egrid));

        send_text(request, GBDBS_SERVICE)
    }

    /// Fetch and extract the registry records for `egrid`.
    pub fn fetch_records(&self, egrid: &str) -> Result<RegistryRecords> {
        let xml = self.fetch_parcel_document(egrid)?;
        let records = parse_registry_response(&xml, egrid, self.hide_owner_addresses)?;

        tracing::debug!(
            egrid,
            parcels = records.parcels.len(),
            persons = records.persons.len(),
            rights = records.rights.len(),
            "extracted registry records"
        );
        Ok(records)
    }
}

impl ParcelSource for RegistryClient {
    fn parcel_records(&self, egrid: &str) -> Result<RegistryRecords> {
        self.fetch_records(egrid)
    }
}

/// Build a transaction id like `SOMAP-20240131-142501-123456`.
pub fn transaction_id(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{prefix}-{}", now.format("%Y%m%d-%H%M%S-%6f"))
}

/// Build the SOAP request body. `egrid` must already be validated.
pub fn build_request(transaction_id: &str, egrid: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<soapenv:Envelope
    xmlns:ns="http://schemas.geo.admin.ch/BJ/TGBV/GBDBS/2.1"
    xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
    <soapenv:Header/>
    <soapenv:Body>
        <ns:GetParcelsByIdRequest>
            <ns:version>2.1</ns:version>
            <ns:transactionId>{transaction_id}</ns:transactionId>
            <ns:BezugInhalt>IndexMitEigentum</ns:BezugInhalt>
            <ns:includeHistory>false</ns:includeHistory>
            <ns:Id>{egrid}::::</ns:Id>
        </ns:GetParcelsByIdRequest>
    </soapenv:Body>
</soapenv:Envelope>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{find_by_path, node_value};
    use chrono::TimeZone;
    use roxmltree::Document;

    #[test]
    fn test_transaction_id_format() {
        let now = Utc
            .with_ymd_and_hms(2024, 1, 31, 14, 25, 1)
            .single()
            .unwrap()
            + chrono::Duration::microseconds(42);
        assert_eq!(transaction_id("SOMAP", now), "SOMAP-20240131-142501-000042");
    }

    #[test]
    fn test_build_request_is_valid_soap() {
        let body = build_request("SOMAP-1", "CH207506973252");
        let doc = Document::parse(&body).unwrap();

        let request = find_by_path(doc.root(), "Envelope/Body/GetParcelsByIdRequest").unwrap();
        assert_eq!(node_value(request, "version"), Some("2.1"));
        assert_eq!(node_value(request, "transactionId"), Some("SOMAP-1"));
        assert_eq!(node_value(request, "BezugInhalt"), Some("IndexMitEigentum"));
        assert_eq!(node_value(request, "includeHistory"), Some("false"));
        assert_eq!(node_value(request, "Id"), Some("CH207506973252::::"));
    }

    #[test]
    fn test_fetch_rejects_invalid_egrid_without_request() {
        let config = OwnerConfig::new("http://127.0.0.1:9/gbdbs");
        let client = RegistryClient::new(Client::new(), &config);

        let result = client.fetch_parcel_document("CH1</ns:Id>");
        assert!(matches!(result, Err(crate::error::OwnerError::InvalidEgrid(_))));
    }
}
