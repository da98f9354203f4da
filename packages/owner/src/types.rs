//! Core data types for the plot owner service.
//!
//! Records are extracted once from a GBDBS response and never mutated. They
//! reference each other through the composite record key exactly as the
//! registry emits it (e.g. `CH207506973252:575::2407:`).

use indexmap::IndexMap;

/// Kind of a parcel record, taken from the first child element of a
/// `Grundstueck`.
///
/// The registry controls this list, so unknown values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParcelKind {
    Liegenschaft,
    StockwerksEinheit,
    GewoehnlichesMiteigentum,
    GesamtEigentum,
    AlleinEigentum,
    MitEigentum,
    Other(String),
}

impl ParcelKind {
    /// Parse from the local tag name of the record's first child element.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Liegenschaft" => Self::Liegenschaft,
            "StockwerksEinheit" => Self::StockwerksEinheit,
            "GewoehnlichesMiteigentum" => Self::GewoehnlichesMiteigentum,
            "GesamtEigentum" => Self::GesamtEigentum,
            "AlleinEigentum" => Self::AlleinEigentum,
            "MitEigentum" => Self::MitEigentum,
            other => Self::Other(other.to_string()),
        }
    }

    /// Get the registry tag name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Liegenschaft => "Liegenschaft",
            Self::StockwerksEinheit => "StockwerksEinheit",
            Self::GewoehnlichesMiteigentum => "GewoehnlichesMiteigentum",
            Self::GesamtEigentum => "GesamtEigentum",
            Self::AlleinEigentum => "AlleinEigentum",
            Self::MitEigentum => "MitEigentum",
            Self::Other(tag) => tag,
        }
    }
}

/// A parcel (`Grundstueck`) record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parcel {
    /// Composite record key as emitted by the registry.
    pub record_key: String,
    pub egrid: String,
    /// Land register number (GB-Nr.).
    pub number: String,
    /// Number suffix, empty for most parcels.
    pub suffix: String,
    /// Municipality code (BFS-Nr.).
    pub municipality_code: String,
    pub kind: ParcelKind,
    pub municipality_name: Option<String>,
    /// Free-text description, only kept for `StockwerksEinheit`.
    pub description: Option<String>,
}

impl Parcel {
    /// Numeric sort key `(number, suffix)`; non-numeric parts count as 0.
    #[must_use]
    pub fn sort_key(&self) -> (u64, u64) {
        (parse_sort_number(&self.number), parse_sort_number(&self.suffix))
    }
}

fn parse_sort_number(value: &str) -> u64 {
    if value.is_empty() {
        return 0;
    }
    value.parse().unwrap_or_else(|_| {
        tracing::warn!(value, "non-numeric parcel number, sorting as 0");
        0
    })
}

/// Postal address of an individual owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub street: Option<String>,
    pub house_number: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// Natural person or legal entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Individual {
    pub name: Option<String>,
    pub given_names: Option<String>,
    /// `None` when the registry sent no address or addresses are hidden.
    pub address: Option<Address>,
}

impl Individual {
    /// Sort key `(given names, name, street)`.
    #[must_use]
    pub fn sort_key(&self) -> (Option<&str>, Option<&str>, Option<&str>) {
        (
            self.given_names.as_deref(),
            self.name.as_deref(),
            self.address.as_ref().and_then(|a| a.street.as_deref()),
        )
    }
}

/// A community of owners (`Gemeinschaft`), e.g. a marital community.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collective {
    pub name: Option<String>,
    pub kind: Option<String>,
    /// Record keys of members; each is an individual or another collective.
    pub members: Vec<String>,
}

/// A `Person` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Person {
    Individual(Individual),
    Collective(Collective),
}

/// A currently valid ownership right (`Recht` with `EigentumAnteil`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Right {
    pub number: Option<String>,
    /// Eigentumsform, e.g. `AlleinEigentum` or `MitEigentum`.
    pub ownership_form: Option<String>,
    pub share_numerator: Option<String>,
    pub share_denominator: Option<String>,
    /// Record key of the holder, either a person or a parcel.
    pub beneficiary_id: Option<String>,
}

/// Lookup tables extracted from one registry response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryRecords {
    /// EGRID the rights were filtered for.
    pub egrid: String,
    pub parcels: IndexMap<String, Parcel>,
    pub persons: IndexMap<String, Person>,
    pub rights: Vec<Right>,
}

impl RegistryRecords {
    /// First parcel (in document order) with the given EGRID.
    ///
    /// A response may contain several related parcels besides the requested one.
    #[must_use]
    pub fn parcel_by_egrid(&self, egrid: &str) -> Option<&Parcel> {
        self.parcels.values().find(|p| p.egrid == egrid)
    }
}

/// Ownership classification derived from the parcels holding the rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    StockwerksEinheit,
    GewoehnlichesMiteigentum,
}

impl Classification {
    /// Classification for a single parcel kind, if it has one.
    #[must_use]
    pub fn from_kind(kind: &ParcelKind) -> Option<Self> {
        match kind {
            ParcelKind::StockwerksEinheit => Some(Self::StockwerksEinheit),
            ParcelKind::GewoehnlichesMiteigentum => Some(Self::GewoehnlichesMiteigentum),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StockwerksEinheit => "StockwerksEinheit",
            Self::GewoehnlichesMiteigentum => "GewoehnlichesMiteigentum",
        }
    }
}

/// One owner line of an ownership summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeneficiaryEntry {
    /// An individual, or the flattened members of a collective.
    Persons { addresses: Vec<String> },
    /// A parcel holding the right, with its own resolved beneficiaries.
    NestedParcel {
        label: String,
        beneficiaries: Vec<String>,
        description: Option<String>,
    },
}

impl BeneficiaryEntry {
    /// Beneficiary lines of this entry.
    #[must_use]
    pub fn beneficiaries(&self) -> &[String] {
        match self {
            Self::Persons { addresses } => addresses,
            Self::NestedParcel { beneficiaries, .. } => beneficiaries,
        }
    }
}

/// Resolved ownership of one parcel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipSummary {
    /// Formatted parcel label, e.g. `GB-Nr. 575 Solothurn`.
    pub parcel: String,
    /// Raw Eigentumsform of the last processed right.
    pub ownership_form: Option<String>,
    pub classification: Option<Classification>,
    pub description: Option<String>,
    pub beneficiaries: Vec<BeneficiaryEntry>,
}
