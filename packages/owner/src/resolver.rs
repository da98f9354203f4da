//! Ownership resolution over extracted registry records.
//!
//! Rights can be held by individuals, by communities of persons
//! (`Gemeinschaft`, possibly nested) or by other parcels. Parcel holders are
//! expanded by loading their own registry records, one level deep only.
//!
//! # Composition of parcel holders
//!
//! After resolving a holder parcel without further recursion:
//! - a holder owned by condominium units (`StockwerksEinheit`) or by
//!   separated co-ownership shares (`GewoehnlichesMiteigentum`) is shown as
//!   that ownership form only,
//! - a `GewoehnlichesMiteigentum` holder lists its own parcel holders (after
//!   a form line) followed by its persons,
//! - any other holder lists the addresses of its persons.
//!
//! A holder whose records cannot be loaded is shown as [`ERROR_SENTINEL`].

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::error::{OwnerError, Result};
use crate::format::{format_address, format_parcel_label, ownership_form_label};
use crate::types::{
    BeneficiaryEntry, Classification, Collective, Individual, OwnershipSummary, Parcel,
    ParcelKind, Person, RegistryRecords,
};

/// Beneficiary line used when a holder parcel could not be loaded.
pub const ERROR_SENTINEL: &str = "ERROR";

/// Source of registry records for a single parcel.
///
/// Implemented by the registry client; tests substitute in-memory records.
pub trait ParcelSource {
    /// Load the records of the parcel `egrid`, with rights filtered for it.
    fn parcel_records(&self, egrid: &str) -> Result<RegistryRecords>;
}

/// Resolves the owners of a parcel from its registry records.
pub struct OwnershipResolver<'s, S: ?Sized> {
    source: &'s S,
}

/// Beneficiary entry together with its sort key.
struct SortableEntry {
    sort_number: u64,
    sort_suffix: u64,
    label: String,
    entry: BeneficiaryEntry,
}

impl SortableEntry {
    fn persons(addresses: Vec<String>) -> Self {
        Self {
            sort_number: 0,
            sort_suffix: 0,
            label: String::new(),
            entry: BeneficiaryEntry::Persons { addresses },
        }
    }

    fn parcel(holder: &Parcel, beneficiaries: Vec<String>) -> Self {
        let (sort_number, sort_suffix) = holder.sort_key();
        let label = format_parcel_label(holder);
        Self {
            sort_number,
            sort_suffix,
            label: label.clone(),
            entry: BeneficiaryEntry::NestedParcel {
                label,
                beneficiaries,
                description: holder.description.clone(),
            },
        }
    }

    fn key(&self) -> (u64, u64, &str, &str) {
        let first = self
            .entry
            .beneficiaries()
            .first()
            .map(String::as_str)
            .unwrap_or_default();
        (self.sort_number, self.sort_suffix, self.label.as_str(), first)
    }
}

impl<'s, S: ParcelSource + ?Sized> OwnershipResolver<'s, S> {
    pub fn new(source: &'s S) -> Self {
        Self { source }
    }

    /// Resolve the ownership of `parcel`.
    ///
    /// # Arguments
    /// * `parcel` - Parcel the rights belong to
    /// * `records` - Rights, persons and parcels from the parcel's registry response
    /// * `recurse` - Load and resolve parcels that hold a right
    ///
    /// Unresolvable rights and members are logged and left out; this never fails.
    pub fn resolve(
        &self,
        parcel: &Parcel,
        records: &RegistryRecords,
        recurse: bool,
    ) -> OwnershipSummary {
        let mut ownership_form = None;
        let mut holder_kinds: HashSet<&ParcelKind> = HashSet::new();
        let mut entries = Vec::new();

        for right in &records.rights {
            // single-valued upstream: the last right wins
            ownership_form = right.ownership_form.clone();

            let Some(id) = right.beneficiary_id.as_deref() else {
                tracing::warn!(right = ?right.number, "skipping right without Berechtigte");
                continue;
            };

            if let Some(person) = records.persons.get(id) {
                let addresses = match person {
                    Person::Individual(individual) => vec![format_address(individual)],
                    Person::Collective(collective) => {
                        collective_addresses(id, collective, &records.persons)
                    }
                };
                entries.push(SortableEntry::persons(addresses));
            } else if let Some(holder) = records.parcels.get(id) {
                holder_kinds.insert(&holder.kind);
                let beneficiaries = if recurse {
                    self.expand_holder(holder)
                } else {
                    Vec::new()
                };
                entries.push(SortableEntry::parcel(holder, beneficiaries));
            } else {
                let error = OwnerError::ReferenceNotFound {
                    kind: "Berechtigte",
                    id: id.to_string(),
                };
                tracing::error!(egrid = %records.egrid, error = %error, "skipping right");
            }
        }

        entries.sort_by(|a, b| a.key().cmp(&b.key()));

        let classification = if holder_kinds.len() == 1 {
            holder_kinds
                .iter()
                .next()
                .and_then(|kind| Classification::from_kind(kind))
        } else {
            None
        };

        OwnershipSummary {
            parcel: format_parcel_label(parcel),
            ownership_form,
            classification,
            description: parcel.description.clone(),
            beneficiaries: entries.into_iter().map(|e| e.entry).collect(),
        }
    }

    /// Resolve the beneficiaries of a parcel that holds a right.
    fn expand_holder(&self, holder: &Parcel) -> Vec<String> {
        let records = match self.source.parcel_records(&holder.egrid) {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(egrid = %holder.egrid, error = %e, "could not load holder parcel");
                return vec![ERROR_SENTINEL.to_string()];
            }
        };

        let sub = self.resolve(holder, &records, false);

        if let Some(classification) = sub.classification {
            return vec![ownership_form_label(classification.as_str()).to_string()];
        }

        if holder.kind == ParcelKind::GewoehnlichesMiteigentum {
            let mut labels = Vec::new();
            let mut addresses = Vec::new();
            for entry in sub.beneficiaries {
                match entry {
                    BeneficiaryEntry::NestedParcel { label, .. } => labels.push(label),
                    BeneficiaryEntry::Persons { addresses: a } => addresses.extend(a),
                }
            }

            let mut beneficiaries = Vec::new();
            if !labels.is_empty() {
                beneficiaries.push(
                    ownership_form_label(ParcelKind::GewoehnlichesMiteigentum.as_str()).to_string(),
                );
                beneficiaries.extend(labels);
            }
            beneficiaries.extend(addresses);
            return beneficiaries;
        }

        sub.beneficiaries
            .into_iter()
            .flat_map(|entry| match entry {
                BeneficiaryEntry::Persons { addresses } => addresses,
                BeneficiaryEntry::NestedParcel { .. } => Vec::new(),
            })
            .collect()
    }
}

/// Formatted, sorted addresses of all individuals in a community.
///
/// Members are sorted by `(given names, name, street)`; identical addresses
/// are collapsed only when adjacent after sorting.
pub fn collective_addresses(
    collective_id: &str,
    collective: &Collective,
    persons: &IndexMap<String, Person>,
) -> Vec<String> {
    let mut members = flatten_members(collective_id, collective, persons);
    members.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    let mut addresses: Vec<String> = members.into_iter().map(format_address).collect();
    addresses.dedup();
    addresses
}

/// Collect the individuals of a community, descending into nested
/// communities.
///
/// Every id is followed at most once per call, so cyclic memberships
/// terminate. Ids that are missing or already visited are logged and skipped.
pub fn flatten_members<'p>(
    collective_id: &'p str,
    collective: &'p Collective,
    persons: &'p IndexMap<String, Person>,
) -> Vec<&'p Individual> {
    let mut visited = HashSet::from([collective_id]);
    let mut members = Vec::new();
    collect_members(collective, persons, &mut visited, &mut members);
    members
}

fn collect_members<'p>(
    collective: &'p Collective,
    persons: &'p IndexMap<String, Person>,
    visited: &mut HashSet<&'p str>,
    members: &mut Vec<&'p Individual>,
) {
    for id in &collective.members {
        if !visited.insert(id.as_str()) {
            tracing::warn!(member = %id, "skipping Mitglied already visited");
            continue;
        }

        match persons.get(id) {
            Some(Person::Individual(individual)) => members.push(individual),
            Some(Person::Collective(nested)) => collect_members(nested, persons, visited, members),
            None => {
                let error = OwnerError::ReferenceNotFound {
                    kind: "Mitglied",
                    id: id.clone(),
                };
                tracing::error!(error = %error, "skipping member");
            }
        }
    }
}
