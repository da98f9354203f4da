//! Plot owner service: captcha-gated ownership lookup for one EGRID.

use serde::{Deserialize, Serialize};

use crate::captcha::CaptchaVerifier;
use crate::config::{validate_egrid, OwnerConfig};
use crate::error::{OwnerError, Result};
use crate::format::ownership_form_label;
use crate::http::create_client;
use crate::registry::RegistryClient;
use crate::resolver::OwnershipResolver;
use crate::types::{BeneficiaryEntry, Classification, OwnershipSummary};

/// Ownership of a parcel as presented to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipDisplay {
    /// Parcel label, e.g. `GB-Nr. 575 Solothurn`.
    pub grundstueck: String,
    /// Display ownership form, `"Miteigentum (Stockwerkeigentum)"` for condominiums.
    pub eigentumsform: Option<String>,
    pub eigentuemer: Vec<OwnerDisplay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beschreibung: Option<String>,
}

/// One owner line of an [`OwnershipDisplay`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OwnerDisplay {
    Parcel {
        grundstueck: String,
        berechtigte: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        beschreibung: Option<String>,
    },
    Persons {
        berechtigte: Vec<String>,
    },
}

/// Result of an owner info request, serialized as
/// `{"eigentum": ..., "success": true}` or `{"error": ..., "success": false}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OwnerInfoResponse {
    Success {
        eigentum: OwnershipDisplay,
        success: bool,
    },
    Failure {
        error: String,
        success: bool,
    },
}

impl OwnerInfoResponse {
    pub fn success(eigentum: OwnershipDisplay) -> Self {
        Self::Success {
            eigentum,
            success: true,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
            success: false,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl From<&OwnershipSummary> for OwnershipDisplay {
    fn from(summary: &OwnershipSummary) -> Self {
        Self {
            grundstueck: summary.parcel.clone(),
            eigentumsform: display_ownership_form(
                summary.ownership_form.as_deref(),
                summary.classification,
            ),
            eigentuemer: summary.beneficiaries.iter().map(OwnerDisplay::from).collect(),
            beschreibung: summary.description.clone(),
        }
    }
}

impl From<&BeneficiaryEntry> for OwnerDisplay {
    fn from(entry: &BeneficiaryEntry) -> Self {
        match entry {
            BeneficiaryEntry::Persons { addresses } => Self::Persons {
                berechtigte: addresses.clone(),
            },
            BeneficiaryEntry::NestedParcel {
                label,
                beneficiaries,
                description,
            } => Self::Parcel {
                grundstueck: label.clone(),
                berechtigte: beneficiaries.clone(),
                beschreibung: description.clone(),
            },
        }
    }
}

/// Display text for the ownership form, marking condominium ownership.
///
/// # Examples
/// ```
/// use plotinfo_owner::service::display_ownership_form;
/// use plotinfo_owner::types::Classification;
///
/// assert_eq!(
///     display_ownership_form(Some("MitEigentum"), Some(Classification::StockwerksEinheit)),
///     Some("Miteigentum (Stockwerkeigentum)".to_string())
/// );
/// assert_eq!(display_ownership_form(Some("AlleinEigentum"), None), Some("Alleineigentum".to_string()));
/// ```
#[must_use]
pub fn display_ownership_form(
    ownership_form: Option<&str>,
    classification: Option<Classification>,
) -> Option<String> {
    let form = ownership_form.map(ownership_form_label);
    match classification {
        Some(Classification::StockwerksEinheit) => {
            let unit = ownership_form_label(Classification::StockwerksEinheit.as_str());
            Some(match form {
                Some(form) => format!("{form} ({unit})"),
                None => unit.to_string(),
            })
        }
        _ => form.map(String::from),
    }
}

/// Captcha-gated plot owner lookups.
#[derive(Debug, Clone)]
pub struct PlotOwnerService {
    registry: RegistryClient,
    captcha: CaptchaVerifier,
}

impl PlotOwnerService {
    /// Create the service with one HTTP client shared by all upstream calls.
    pub fn new(config: &OwnerConfig) -> Result<Self> {
        let client = create_client(config.timeout)?;
        Ok(Self {
            registry: RegistryClient::new(client.clone(), config),
            captcha: CaptchaVerifier::new(client, config.captcha.clone()),
        })
    }

    /// Resolve the ownership of `egrid` after verifying `captcha_token`.
    ///
    /// Parcels holding a right are loaded one level deep; a failure there
    /// only marks that entry.
    pub fn owner_info(&self, egrid: &str, captcha_token: &str) -> Result<OwnershipSummary> {
        validate_egrid(egrid)?;
        self.captcha.verify(captcha_token)?;

        let records = self.registry.fetch_records(egrid)?;
        let parcel = records
            .parcel_by_egrid(egrid)
            .ok_or_else(|| OwnerError::NotFound(egrid.to_string()))?;

        Ok(OwnershipResolver::new(&self.registry).resolve(parcel, &records, true))
    }

    /// Like [`Self::owner_info`], but as a response for clients. Never fails.
    pub fn info(&self, egrid: &str, captcha_token: &str) -> OwnerInfoResponse {
        match self.owner_info(egrid, captcha_token) {
            Ok(summary) => OwnerInfoResponse::success(OwnershipDisplay::from(&summary)),
            Err(e) => {
                tracing::error!(egrid, error = %e, "owner info request failed");
                OwnerInfoResponse::failure(public_message(&e, egrid))
            }
        }
    }
}

/// Client-facing message for a failed request.
///
/// Upstream details stay in the log.
fn public_message(error: &OwnerError, egrid: &str) -> String {
    let unreadable = matches!(
        error,
        OwnerError::XmlParse(_) | OwnerError::MissingElement { .. }
    );
    if error.is_upstream_unavailable() || unreadable {
        format!("Could not load XML for EGRID {egrid}")
    } else {
        error.to_string()
    }
}
