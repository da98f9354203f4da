//! Extraction of parcel, person and right records from GBDBS responses.
//!
//! A single bad record never fails the extraction: it is logged and left
//! out of the resulting tables.

use indexmap::IndexMap;
use roxmltree::{Document, Node};

use crate::error::{OwnerError, Result};
use crate::types::{Address, Collective, Individual, Parcel, ParcelKind, Person, RegistryRecords, Right};
use crate::xml::{
    descendants_named, find_by_path, find_child, find_descendant, first_element_child,
    get_tag_name, has_attribute, node_value,
};

/// Path of the response payload inside the SOAP envelope.
pub const RESPONSE_PATH: &str = "Envelope/Body/GetParcelsByIdResponse";

/// Wrappers of individual owners, in order of preference.
const INDIVIDUAL_WRAPPERS: [&str; 4] = [
    "NatuerlichePerson",
    "SchweizerischeJuristischePerson",
    "OeffentlicheKoerperschaft",
    "AuslaendischeRechtsform",
];

/// Attribute marking a right as ended.
const END_VALIDITY_ATTRIBUTE: &str = "bisEGBTBID";

/// Parse a raw GBDBS response and extract the lookup tables for `egrid`.
///
/// # Arguments
/// * `xml` - Raw SOAP response body
/// * `egrid` - EGRID the rights are filtered for
/// * `hide_addresses` - Drop owner addresses from person records
pub fn parse_registry_response(
    xml: &str,
    egrid: &str,
    hide_addresses: bool,
) -> Result<RegistryRecords> {
    let doc = Document::parse(xml)?;
    let response = response_node(&doc)?;

    Ok(RegistryRecords {
        egrid: egrid.to_string(),
        parcels: extract_parcels(response),
        persons: extract_persons(response, hide_addresses),
        rights: extract_rights(response, egrid),
    })
}

/// Locate the `GetParcelsByIdResponse` node.
pub fn response_node<'a, 'input>(doc: &'a Document<'input>) -> Result<Node<'a, 'input>> {
    find_by_path(doc.root(), RESPONSE_PATH).ok_or_else(|| OwnerError::MissingElement {
        element: "GetParcelsByIdResponse".to_string(),
        context: "GBDBS response".to_string(),
    })
}

/// Collect all resolvable `Grundstueck` records by record key.
///
/// Records without a `Nummer` only appear in easement context and are
/// skipped silently.
pub fn extract_parcels(response: Node<'_, '_>) -> IndexMap<String, Parcel> {
    let mut parcels = IndexMap::new();

    for node in descendants_named(response, "Grundstueck") {
        let Some(record_key) = node_value(node, "//Nummer") else {
            continue;
        };

        match parse_parcel(node, record_key) {
            Ok(parcel) => {
                parcels.insert(record_key.to_string(), parcel);
            }
            Err(e) => tracing::warn!(error = %e, "skipping Grundstueck"),
        }
    }

    parcels
}

/// Build a parcel from its record key `<egrid>:<nr>:<zusatz>:<bfsnr>:<reserved>`,
/// e.g. `CH210678328270:1023:1:2581:`.
fn parse_parcel(node: Node<'_, '_>, record_key: &str) -> Result<Parcel> {
    let fields: Vec<&str> = record_key.split(':').collect();
    let [egrid, number, suffix, municipality_code, _reserved] = fields.as_slice() else {
        return Err(OwnerError::MalformedRecordNumber(record_key.to_string()));
    };

    let kind = ParcelKind::from_tag(first_element_child(node).map(get_tag_name).unwrap_or_default());
    let description = match kind {
        ParcelKind::StockwerksEinheit => node_value(node, "//Beschreibung").map(String::from),
        _ => None,
    };

    Ok(Parcel {
        record_key: record_key.to_string(),
        egrid: egrid.to_string(),
        number: number.to_string(),
        suffix: suffix.to_string(),
        municipality_code: municipality_code.to_string(),
        kind,
        municipality_name: node_value(node, "//municipalityName").map(String::from),
        description,
    })
}

/// Collect all `Person` records by record key.
pub fn extract_persons(response: Node<'_, '_>, hide_addresses: bool) -> IndexMap<String, Person> {
    let mut persons = IndexMap::new();

    for node in descendants_named(response, "Person") {
        let Some(record_key) = node_value(node, "//Nummer") else {
            tracing::warn!("skipping Person without Nummer");
            continue;
        };

        let individual = INDIVIDUAL_WRAPPERS
            .iter()
            .find_map(|wrapper| find_descendant(node, *wrapper));

        let person = if let Some(info) = individual {
            Person::Individual(parse_individual(info, hide_addresses))
        } else if let Some(community) = find_descendant(node, "Gemeinschaft") {
            Person::Collective(parse_collective(community, record_key))
        } else {
            let children: Vec<&str> = node
                .children()
                .filter(|c| c.is_element())
                .map(get_tag_name)
                .collect();
            tracing::error!(record = record_key, ?children, "unknown Person type");
            continue;
        };

        persons.insert(record_key.to_string(), person);
    }

    persons
}

fn parse_individual(info: Node<'_, '_>, hide_addresses: bool) -> Individual {
    let address = if hide_addresses {
        None
    } else {
        find_by_path(info, "//Adresse").map(|adresse| Address {
            street: node_value(adresse, "Strasse").map(String::from),
            house_number: node_value(adresse, "Hausnummer").map(String::from),
            postal_code: node_value(adresse, "PLZ").map(String::from),
            city: node_value(adresse, "Ort").map(String::from),
            country: node_value(adresse, "Land").map(String::from),
        })
    };

    Individual {
        name: node_value(info, "Name").map(String::from),
        given_names: node_value(info, "Vornamen").map(String::from),
        address,
    }
}

fn parse_collective(community: Node<'_, '_>, record_key: &str) -> Collective {
    let mut members = Vec::new();
    for member in descendants_named(community, "Mitglieder") {
        match node_value(member, "ref") {
            Some(id) => members.push(id.to_string()),
            None => tracing::warn!(record = record_key, "Gemeinschaft member without ref"),
        }
    }

    Collective {
        name: node_value(community, "//Name").map(String::from),
        kind: node_value(community, "//Art").map(String::from),
        members,
    }
}

/// Collect the currently valid ownership rights on `egrid`, in document order.
///
/// Kept are rights with an `EigentumAnteil` whose encumbered parcel starts
/// with `egrid` and whose `InhaltEigentumAnteil` has no end marker.
pub fn extract_rights(response: Node<'_, '_>, egrid: &str) -> Vec<Right> {
    let mut rights = Vec::new();

    for node in descendants_named(response, "Recht") {
        if find_child(node, "EigentumAnteil").is_none() {
            continue;
        }

        let Some(encumbered) = node_value(node, "//belastetesGrundstueck") else {
            tracing::warn!("skipping Recht without belastetesGrundstueck");
            continue;
        };
        if !encumbered.starts_with(egrid) {
            continue;
        }

        let Some(share) = find_descendant(node, "InhaltEigentumAnteil") else {
            continue;
        };
        if has_attribute(share, END_VALIDITY_ATTRIBUTE) {
            // obsolete right
            continue;
        }

        rights.push(Right {
            number: node_value(node, "//Nummer").map(String::from),
            ownership_form: node_value(share, "//Eigentumsform").map(String::from),
            share_numerator: node_value(share, "//AnteilZaehler").map(String::from),
            share_denominator: node_value(share, "//AnteilNenner").map(String::from),
            beneficiary_id: node_value(node, "//Berechtigte").map(String::from),
        });
    }

    rights
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn wrap(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
  <soapenv:Body>
    <ns:GetParcelsByIdResponse xmlns:ns="http://schemas.geo.admin.ch/BJ/TGBV/GBDBS/2.1">
{body}
    </ns:GetParcelsByIdResponse>
  </soapenv:Body>
</soapenv:Envelope>"#
        )
    }

    fn with_response<T>(body: &str, f: impl FnOnce(Node<'_, '_>) -> T) -> T {
        let xml = wrap(body);
        let doc = Document::parse(&xml).unwrap();
        let response = response_node(&doc).unwrap();
        f(response)
    }

    const PARCELS: &str = r#"
      <ns:Grundstueck>
        <ns:Liegenschaft>
          <ns:Nummer>CH207506973252:575::2407:</ns:Nummer>
          <ns:municipalityName>Solothurn</ns:municipalityName>
        </ns:Liegenschaft>
      </ns:Grundstueck>
      <ns:Grundstueck>
        <ns:StockwerksEinheit>
          <ns:Nummer>CH210678328270:1023:1:2581:</ns:Nummer>
          <ns:municipalityName>Grenchen</ns:municipalityName>
          <ns:Beschreibung>4.5-Zimmerwohnung im 2. OG</ns:Beschreibung>
        </ns:StockwerksEinheit>
      </ns:Grundstueck>
      <ns:Grundstueck>
        <ns:Liegenschaft>
          <ns:Nummer>CH999:1:2581</ns:Nummer>
        </ns:Liegenschaft>
      </ns:Grundstueck>
      <ns:Grundstueck>
        <ns:Liegenschaft>
          <ns:EGRID>CH000000000001</ns:EGRID>
        </ns:Liegenschaft>
      </ns:Grundstueck>"#;

    #[test]
    fn test_extract_parcels() {
        let parcels = with_response(PARCELS, extract_parcels);

        assert_eq!(parcels.len(), 2);

        let plain = &parcels["CH207506973252:575::2407:"];
        assert_eq!(plain.egrid, "CH207506973252");
        assert_eq!(plain.number, "575");
        assert_eq!(plain.suffix, "");
        assert_eq!(plain.municipality_code, "2407");
        assert_eq!(plain.kind, ParcelKind::Liegenschaft);
        assert_eq!(plain.municipality_name.as_deref(), Some("Solothurn"));
        assert_eq!(plain.description, None);

        let unit = &parcels["CH210678328270:1023:1:2581:"];
        assert_eq!(unit.kind, ParcelKind::StockwerksEinheit);
        assert_eq!(unit.suffix, "1");
        assert_eq!(unit.description.as_deref(), Some("4.5-Zimmerwohnung im 2. OG"));
    }

    #[test]
    fn test_malformed_record_number_is_skipped() {
        let parcels = with_response(PARCELS, extract_parcels);
        assert!(parcels.keys().all(|k| !k.starts_with("CH999")));
    }

    #[test]
    fn test_description_only_kept_for_units() {
        let body = r#"
          <ns:Grundstueck>
            <ns:Liegenschaft>
              <ns:Nummer>CH1:1::1:</ns:Nummer>
              <ns:Beschreibung>Wald</ns:Beschreibung>
            </ns:Liegenschaft>
          </ns:Grundstueck>"#;
        let parcels = with_response(body, extract_parcels);
        assert_eq!(parcels["CH1:1::1:"].description, None);
    }

    const PERSONS: &str = r#"
      <ns:Person>
        <ns:NatuerlichePerson>
          <ns:Nummer>P1</ns:Nummer>
          <ns:Name>Muster</ns:Name>
          <ns:Vornamen>Hans</ns:Vornamen>
          <ns:Adresse>
            <ns:Strasse>Hauptstrasse</ns:Strasse>
            <ns:Hausnummer>1</ns:Hausnummer>
            <ns:PLZ>4500</ns:PLZ>
            <ns:Ort>Solothurn</ns:Ort>
            <ns:Land>Schweiz</ns:Land>
          </ns:Adresse>
        </ns:NatuerlichePerson>
      </ns:Person>
      <ns:Person>
        <ns:SchweizerischeJuristischePerson>
          <ns:Nummer>P2</ns:Nummer>
          <ns:Name>Muster AG</ns:Name>
        </ns:SchweizerischeJuristischePerson>
      </ns:Person>
      <ns:Person>
        <ns:NatuerlichePerson>
          <ns:Name>Ohne Nummer</ns:Name>
          <ns:Vornamen>Fritz</ns:Vornamen>
        </ns:NatuerlichePerson>
      </ns:Person>
      <ns:Person>
        <ns:Gemeinschaft>
          <ns:Nummer>G1</ns:Nummer>
          <ns:Name>Erbengemeinschaft Muster</ns:Name>
          <ns:Art>Erbengemeinschaft</ns:Art>
          <ns:Mitglieder><ns:ref>P1</ns:ref></ns:Mitglieder>
          <ns:Mitglieder><ns:ref>P2</ns:ref></ns:Mitglieder>
          <ns:Mitglieder/>
        </ns:Gemeinschaft>
      </ns:Person>
      <ns:Person>
        <ns:Unbekannt><ns:Nummer>X1</ns:Nummer></ns:Unbekannt>
      </ns:Person>"#;

    #[test]
    fn test_person_without_number_is_omitted() {
        let persons = with_response(PERSONS, |r| extract_persons(r, false));

        assert_eq!(persons.len(), 3);
        assert!(!persons.values().any(|person| matches!(
            person,
            Person::Individual(individual) if individual.name.as_deref() == Some("Ohne Nummer")
        )));
    }

    #[test]
    fn test_extract_persons() {
        let persons = with_response(PERSONS, |r| extract_persons(r, false));

        assert_eq!(persons.keys().collect::<Vec<_>>(), vec!["P1", "P2", "G1"]);

        let Person::Individual(hans) = &persons["P1"] else {
            panic!("P1 should be an individual");
        };
        assert_eq!(hans.name.as_deref(), Some("Muster"));
        assert_eq!(hans.given_names.as_deref(), Some("Hans"));
        let address = hans.address.as_ref().unwrap();
        assert_eq!(address.street.as_deref(), Some("Hauptstrasse"));
        assert_eq!(address.postal_code.as_deref(), Some("4500"));
        assert_eq!(address.country.as_deref(), Some("Schweiz"));

        let Person::Individual(company) = &persons["P2"] else {
            panic!("P2 should be an individual");
        };
        assert_eq!(company.given_names, None);
        assert_eq!(company.address, None);

        assert_eq!(
            persons["G1"],
            Person::Collective(Collective {
                name: Some("Erbengemeinschaft Muster".into()),
                kind: Some("Erbengemeinschaft".into()),
                members: vec!["P1".into(), "P2".into()],
            })
        );
    }

    #[test]
    fn test_extract_persons_hides_addresses() {
        let persons = with_response(PERSONS, |r| extract_persons(r, true));
        let Person::Individual(hans) = &persons["P1"] else {
            panic!("P1 should be an individual");
        };
        assert_eq!(hans.address, None);
        assert_eq!(hans.name.as_deref(), Some("Muster"));
    }

    const RIGHTS: &str = r#"
      <ns:Recht>
        <ns:EigentumAnteil>
          <ns:Nummer>R1</ns:Nummer>
          <ns:belastetesGrundstueck>CH207506973252:575::2407:</ns:belastetesGrundstueck>
          <ns:InhaltEigentumAnteil vonEGBTBID="10">
            <ns:Eigentumsform>MitEigentum</ns:Eigentumsform>
            <ns:AnteilZaehler>1</ns:AnteilZaehler>
            <ns:AnteilNenner>2</ns:AnteilNenner>
          </ns:InhaltEigentumAnteil>
          <ns:Berechtigte>P1</ns:Berechtigte>
        </ns:EigentumAnteil>
      </ns:Recht>
      <ns:Recht>
        <ns:EigentumAnteil>
          <ns:Nummer>R2</ns:Nummer>
          <ns:belastetesGrundstueck>CH207506973252:575::2407:</ns:belastetesGrundstueck>
          <ns:InhaltEigentumAnteil vonEGBTBID="3" bisEGBTBID="10">
            <ns:Eigentumsform>AlleinEigentum</ns:Eigentumsform>
          </ns:InhaltEigentumAnteil>
          <ns:Berechtigte>P9</ns:Berechtigte>
        </ns:EigentumAnteil>
      </ns:Recht>
      <ns:Recht>
        <ns:EigentumAnteil>
          <ns:Nummer>R3</ns:Nummer>
          <ns:belastetesGrundstueck>CH210678328270:1023:1:2581:</ns:belastetesGrundstueck>
          <ns:InhaltEigentumAnteil>
            <ns:Eigentumsform>MitEigentum</ns:Eigentumsform>
          </ns:InhaltEigentumAnteil>
          <ns:Berechtigte>P2</ns:Berechtigte>
        </ns:EigentumAnteil>
      </ns:Recht>
      <ns:Recht>
        <ns:Dienstbarkeit>
          <ns:belastetesGrundstueck>CH207506973252:575::2407:</ns:belastetesGrundstueck>
        </ns:Dienstbarkeit>
      </ns:Recht>
      <ns:Recht>
        <ns:EigentumAnteil>
          <ns:Nummer>R4</ns:Nummer>
          <ns:belastetesGrundstueck>CH207506973252:575::2407:</ns:belastetesGrundstueck>
          <ns:InhaltEigentumAnteil>
            <ns:Eigentumsform>MitEigentum</ns:Eigentumsform>
            <ns:AnteilZaehler>1</ns:AnteilZaehler>
            <ns:AnteilNenner>2</ns:AnteilNenner>
          </ns:InhaltEigentumAnteil>
          <ns:Berechtigte>G1</ns:Berechtigte>
        </ns:EigentumAnteil>
      </ns:Recht>"#;

    #[test]
    fn test_extract_rights_filters_target_and_validity() {
        let rights = with_response(RIGHTS, |r| extract_rights(r, "CH207506973252"));

        let numbers: Vec<_> = rights.iter().filter_map(|r| r.number.as_deref()).collect();
        assert_eq!(numbers, vec!["R1", "R4"]);

        assert_eq!(
            rights[0],
            Right {
                number: Some("R1".into()),
                ownership_form: Some("MitEigentum".into()),
                share_numerator: Some("1".into()),
                share_denominator: Some("2".into()),
                beneficiary_id: Some("P1".into()),
            }
        );
    }

    #[test]
    fn test_extract_rights_is_idempotent() {
        let (first, second) = with_response(RIGHTS, |r| {
            (extract_rights(r, "CH207506973252"), extract_rights(r, "CH207506973252"))
        });
        assert_eq!(first, second);
    }

    #[test]
    fn test_extract_rights_other_target() {
        let rights = with_response(RIGHTS, |r| extract_rights(r, "CH210678328270"));
        assert_eq!(rights.len(), 1);
        assert_eq!(rights[0].beneficiary_id.as_deref(), Some("P2"));
    }

    #[test]
    fn test_parse_registry_response_combines_tables() {
        let xml = wrap(&format!("{PARCELS}{PERSONS}{RIGHTS}"));
        let records = parse_registry_response(&xml, "CH207506973252", false).unwrap();

        assert_eq!(records.egrid, "CH207506973252");
        assert_eq!(records.parcels.len(), 2);
        assert_eq!(records.persons.len(), 3);
        assert_eq!(records.rights.len(), 2);
    }

    #[test]
    fn test_parse_registry_response_without_payload() {
        let xml = r#"<soapenv:Envelope xmlns:soapenv="urn:soap"><soapenv:Body/></soapenv:Envelope>"#;
        let err = parse_registry_response(xml, "CH207506973252", false).unwrap_err();
        assert!(matches!(err, OwnerError::MissingElement { .. }));
    }

    #[test]
    fn test_parse_registry_response_invalid_xml() {
        let err = parse_registry_response("<unclosed>", "CH207506973252", false).unwrap_err();
        assert!(matches!(err, OwnerError::XmlParse(_)));
    }
}
