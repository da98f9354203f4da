//! Display formatting for owners, parcels and ownership forms.

use crate::types::{Individual, Parcel};

/// Country omitted from addresses.
const DEFAULT_COUNTRY: &str = "Schweiz";

/// Display text for an Eigentumsform or parcel kind. Unknown keys pass through.
///
/// # Examples
/// ```
/// use plotinfo_owner::format::ownership_form_label;
///
/// assert_eq!(ownership_form_label("StockwerksEinheit"), "Stockwerkeigentum");
/// assert_eq!(ownership_form_label("Baurecht"), "Baurecht");
/// ```
#[must_use]
pub fn ownership_form_label(key: &str) -> &str {
    match key {
        "AlleinEigentum" => "Alleineigentum",
        "GesamtEigentum" => "Gesamteigentum",
        "MitEigentum" => "Miteigentum",
        "GewoehnlichesMiteigentum" => "Verselbständigtes Miteigentum",
        "StockwerksEinheit" => "Stockwerkeigentum",
        other => other,
    }
}

/// Format an owner as `"Vornamen Name, Strasse Nr, PLZ Ort, Land"`.
///
/// Missing parts are left out, as is the country when it is Switzerland.
#[must_use]
pub fn format_address(person: &Individual) -> String {
    let address = person.address.as_ref();
    let name = join_present(&[person.given_names.as_deref(), person.name.as_deref()], " ");
    let street = join_present(
        &[
            address.and_then(|a| a.street.as_deref()),
            address.and_then(|a| a.house_number.as_deref()),
        ],
        " ",
    );
    let city = join_present(
        &[
            address.and_then(|a| a.postal_code.as_deref()),
            address.and_then(|a| a.city.as_deref()),
        ],
        " ",
    );
    let country = address
        .and_then(|a| a.country.as_deref())
        .filter(|c| *c != DEFAULT_COUNTRY);

    join_present(
        &[
            Some(name.as_str()),
            Some(street.as_str()),
            Some(city.as_str()),
            country,
        ],
        ", ",
    )
}

/// Format a parcel as `"GB-Nr. <Nummer>[-<Zusatz>] <Gemeinde>"`.
#[must_use]
pub fn format_parcel_label(parcel: &Parcel) -> String {
    let number = join_present(&[Some(parcel.number.as_str()), Some(parcel.suffix.as_str())], "-");
    format!(
        "GB-Nr. {} {}",
        number,
        parcel.municipality_name.as_deref().unwrap_or_default()
    )
}

fn join_present(parts: &[Option<&str>], separator: &str) -> String {
    parts
        .iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Address, ParcelKind};

    fn hans() -> Individual {
        Individual {
            name: Some("Muster".into()),
            given_names: Some("Hans".into()),
            address: Some(Address {
                street: Some("Hauptstrasse".into()),
                house_number: Some("12a".into()),
                postal_code: Some("4500".into()),
                city: Some("Solothurn".into()),
                country: Some("Schweiz".into()),
            }),
        }
    }

    fn parcel(number: &str, suffix: &str, municipality: Option<&str>) -> Parcel {
        Parcel {
            record_key: String::new(),
            egrid: "CH207506973252".into(),
            number: number.into(),
            suffix: suffix.into(),
            municipality_code: "2601".into(),
            kind: ParcelKind::Liegenschaft,
            municipality_name: municipality.map(String::from),
            description: None,
        }
    }

    #[test]
    fn test_ownership_form_label() {
        assert_eq!(ownership_form_label("AlleinEigentum"), "Alleineigentum");
        assert_eq!(ownership_form_label("GesamtEigentum"), "Gesamteigentum");
        assert_eq!(ownership_form_label("MitEigentum"), "Miteigentum");
        assert_eq!(
            ownership_form_label("GewoehnlichesMiteigentum"),
            "Verselbständigtes Miteigentum"
        );
        assert_eq!(ownership_form_label("Liegenschaft"), "Liegenschaft");
    }

    #[test]
    fn test_format_address_full_swiss() {
        assert_eq!(
            format_address(&hans()),
            "Hans Muster, Hauptstrasse 12a, 4500 Solothurn"
        );
    }

    #[test]
    fn test_format_address_foreign_country() {
        let mut person = hans();
        if let Some(address) = person.address.as_mut() {
            address.country = Some("Deutschland".into());
        }
        assert_eq!(
            format_address(&person),
            "Hans Muster, Hauptstrasse 12a, 4500 Solothurn, Deutschland"
        );
    }

    #[test]
    fn test_format_address_partial() {
        let person = Individual {
            name: Some("Einwohnergemeinde Solothurn".into()),
            given_names: None,
            address: Some(Address {
                street: None,
                house_number: Some("3".into()),
                postal_code: None,
                city: Some("Solothurn".into()),
                country: None,
            }),
        };
        assert_eq!(format_address(&person), "Einwohnergemeinde Solothurn, 3, Solothurn");
    }

    #[test]
    fn test_format_address_hidden() {
        let mut person = hans();
        person.address = None;
        assert_eq!(format_address(&person), "Hans Muster");
    }

    #[test]
    fn test_format_parcel_label() {
        assert_eq!(
            format_parcel_label(&parcel("575", "", Some("Solothurn"))),
            "GB-Nr. 575 Solothurn"
        );
        assert_eq!(
            format_parcel_label(&parcel("1023", "1", Some("Grenchen"))),
            "GB-Nr. 1023-1 Grenchen"
        );
    }

    #[test]
    fn test_format_parcel_label_without_municipality() {
        assert_eq!(format_parcel_label(&parcel("7", "", None)), "GB-Nr. 7 ");
    }
}
