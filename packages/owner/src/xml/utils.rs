//! Namespace-insensitive navigation over registry XML documents.
//!
//! Registry responses mix several namespace prefixes and omit optional
//! elements freely, so every lookup here compares local names only and
//! accepts a missing starting node.

use roxmltree::Node;

/// Get the tag name without namespace prefix.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use plotinfo_owner::xml::get_tag_name;
///
/// let xml = r#"<ns:Grundstueck xmlns:ns="urn:gbdbs"/>"#;
/// let doc = Document::parse(xml).unwrap();
/// assert_eq!(get_tag_name(doc.root_element()), "Grundstueck");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Find the first child element with the given local name.
///
/// # Arguments
/// * `node` - Parent node to search in
/// * `tag` - Local name to search for
///
/// # Returns
/// First matching child element, or `None` if there is none
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use plotinfo_owner::xml::find_child;
///
/// let xml = r#"<ns:Grundstueck xmlns:ns="urn:gbdbs"><ns:Nummer/><ns:Art/></ns:Grundstueck>"#;
/// let doc = Document::parse(xml).unwrap();
/// let parcel = doc.root_element();
///
/// assert!(find_child(parcel, "Nummer").is_some());
/// assert!(find_child(parcel, "Beschreibung").is_none());
/// ```
pub fn find_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && get_tag_name(*child) == tag)
}

/// Iterate over all descendant elements with the given local name, in
/// document order. The node itself is never included.
///
/// # Arguments
/// * `node` - Node whose subtree is searched
/// * `tag` - Local name to search for
///
/// # Returns
/// Iterator over matching elements at any depth below `node`
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use plotinfo_owner::xml::descendants_named;
///
/// let xml = r#"<Person><Person><Nummer>P1</Nummer></Person><Nummer>P2</Nummer></Person>"#;
/// let doc = Document::parse(xml).unwrap();
/// let root = doc.root_element();
///
/// let numbers: Vec<_> = descendants_named(root, "Nummer")
///     .filter_map(|n| n.text())
///     .collect();
/// assert_eq!(numbers, vec!["P1", "P2"]);
/// assert_eq!(descendants_named(root, "Person").count(), 1);
/// ```
pub fn descendants_named<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.descendants()
        .skip(1)
        .filter(move |n| n.is_element() && get_tag_name(*n) == tag)
}

/// Find the first descendant element (at any depth) with the given local name.
///
/// # Arguments
/// * `node` - Node whose subtree is searched
/// * `tag` - Local name to search for
///
/// # Returns
/// First match in document order, or `None`; `node` itself never matches
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use plotinfo_owner::xml::find_descendant;
///
/// let xml = r#"<Recht><Inhalt><EigentumAnteil/></Inhalt></Recht>"#;
/// let doc = Document::parse(xml).unwrap();
/// let right = doc.root_element();
///
/// assert!(find_descendant(right, "EigentumAnteil").is_some());
/// assert!(find_descendant(right, "Recht").is_none());
/// ```
pub fn find_descendant<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> Option<Node<'a, 'input>> {
    descendants_named(node, tag).next()
}

/// Get the first element child of a node.
///
/// # Arguments
/// * `node` - Parent node
///
/// # Returns
/// First child that is an element, skipping text and comments
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use plotinfo_owner::xml::{first_element_child, get_tag_name};
///
/// let xml = "<Grundstueck>\n  <!-- kind -->\n  <Liegenschaft/>\n</Grundstueck>";
/// let doc = Document::parse(xml).unwrap();
///
/// let kind = first_element_child(doc.root_element()).unwrap();
/// assert_eq!(get_tag_name(kind), "Liegenschaft");
/// ```
pub fn first_element_child<'a, 'input>(node: Node<'a, 'input>) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.is_element())
}

/// Check for an attribute by local name, ignoring its namespace.
///
/// # Arguments
/// * `node` - Element to inspect
/// * `name` - Local attribute name
///
/// # Returns
/// `true` if any attribute with that local name is present
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use plotinfo_owner::xml::has_attribute;
///
/// let xml = r#"<Recht xmlns:g="urn:gbdbs" g:bisEGBTBID="42"/>"#;
/// let doc = Document::parse(xml).unwrap();
/// let right = doc.root_element();
///
/// assert!(has_attribute(right, "bisEGBTBID"));
/// assert!(!has_attribute(right, "vonEGBTBID"));
/// ```
pub fn has_attribute(node: Node<'_, '_>, name: &str) -> bool {
    node.attributes().any(|attr| attr.name() == name)
}

/// Find the first element matching a slash-separated path.
///
/// Plain segments match immediate children only. An empty segment (a
/// leading `//` or an embedded `//`) makes the next segment match at any
/// descendant depth. A missing starting node yields `None`.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use plotinfo_owner::xml::find_by_path;
///
/// let xml = r#"<a:Envelope xmlns:a="urn:x"><a:Body><Wrap><Id>1</Id></Wrap></a:Body></a:Envelope>"#;
/// let doc = Document::parse(xml).unwrap();
///
/// assert!(find_by_path(doc.root(), "Envelope/Body").is_some());
/// assert!(find_by_path(doc.root(), "Envelope/Id").is_none());
/// assert!(find_by_path(doc.root(), "Envelope//Id").is_some());
///
/// let missing: Option<roxmltree::Node> = None;
/// assert!(find_by_path(missing, "Envelope").is_none());
/// ```
pub fn find_by_path<'a, 'input: 'a>(
    node: impl Into<Option<Node<'a, 'input>>>,
    path: &str,
) -> Option<Node<'a, 'input>> {
    let mut current = node.into()?;
    let mut any_level = false;

    for part in path.split('/') {
        if part.is_empty() {
            any_level = true;
            continue;
        }

        current = if any_level {
            current
                .descendants()
                .skip(1)
                .find(|n| n.is_element() && get_tag_name(*n) == part)?
        } else {
            find_child(current, part)?
        };
        any_level = false;
    }

    Some(current)
}

/// Get the text of the element matching `path`.
///
/// Returns the first child text node of the matched element, so empty
/// elements and elements starting with a child element yield `None`.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use plotinfo_owner::xml::node_value;
///
/// let xml = r#"<Person><Name>Muster</Name><Vornamen/></Person>"#;
/// let doc = Document::parse(xml).unwrap();
/// let person = doc.root_element();
///
/// assert_eq!(node_value(person, "Name"), Some("Muster"));
/// assert_eq!(node_value(person, "Vornamen"), None);
/// assert_eq!(node_value(person, "//Name"), Some("Muster"));
/// ```
pub fn node_value<'a, 'input: 'a>(
    node: impl Into<Option<Node<'a, 'input>>>,
    path: &str,
) -> Option<&'a str> {
    let found = find_by_path(node, path)?;
    let first = found.first_child()?;
    if first.is_text() {
        first.text()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    const NESTED: &str = r#"<ns:Grundstueck xmlns:ns="urn:gbdbs">
        <ns:Liegenschaft>
            <ns:Nummer>CH207506973252:575::2407:</ns:Nummer>
            <ns:Detail><ns:municipalityName>Solothurn</ns:municipalityName></ns:Detail>
        </ns:Liegenschaft>
    </ns:Grundstueck>"#;

    #[test]
    fn test_get_tag_name_with_namespace() {
        let xml = r#"<ns:root xmlns:ns="http://example.com"><ns:child/></ns:root>"#;
        let doc = Document::parse(xml).unwrap();
        assert_eq!(get_tag_name(doc.root_element()), "root");
    }

    #[test]
    fn test_find_child_is_not_recursive() {
        let doc = Document::parse(NESTED).unwrap();
        let root = doc.root_element();

        assert!(find_child(root, "Liegenschaft").is_some());
        assert!(find_child(root, "Nummer").is_none());
    }

    #[test]
    fn test_find_by_path_immediate_children() {
        let doc = Document::parse(NESTED).unwrap();
        let root = doc.root_element();

        let nummer = find_by_path(root, "Liegenschaft/Nummer");
        assert_eq!(nummer.and_then(|n| n.text()), Some("CH207506973252:575::2407:"));
        assert!(find_by_path(root, "Liegenschaft/municipalityName").is_none());
    }

    #[test]
    fn test_find_by_path_any_level() {
        let doc = Document::parse(NESTED).unwrap();
        let root = doc.root_element();

        assert_eq!(node_value(root, "//municipalityName"), Some("Solothurn"));
        assert_eq!(
            node_value(root, "Liegenschaft//municipalityName"),
            Some("Solothurn")
        );
        assert_eq!(node_value(root, "//Detail/municipalityName"), Some("Solothurn"));
        assert_eq!(node_value(root, "//Missing"), None);
    }

    #[test]
    fn test_any_level_excludes_self() {
        let xml = r#"<Nummer><Inner>x</Inner></Nummer>"#;
        let doc = Document::parse(xml).unwrap();
        assert!(find_by_path(doc.root_element(), "//Nummer").is_none());
    }

    #[test]
    fn test_find_by_path_from_document_root() {
        let xml = r#"<soap:Envelope xmlns:soap="urn:soap"><soap:Body><r:Resp xmlns:r="urn:r"/></soap:Body></soap:Envelope>"#;
        let doc = Document::parse(xml).unwrap();

        let resp = find_by_path(doc.root(), "Envelope/Body/Resp");
        assert!(resp.is_some());
    }

    #[test]
    fn test_absent_input_propagates() {
        let doc = Document::parse(NESTED).unwrap();
        let missing = find_by_path(doc.root_element(), "Nope");

        assert!(find_by_path(missing, "Nummer").is_none());
        assert_eq!(node_value(missing, "//Nummer"), None);
    }

    #[test]
    fn test_trailing_separator_returns_current() {
        let doc = Document::parse(NESTED).unwrap();
        let root = doc.root_element();
        let found = find_by_path(root, "Liegenschaft/");
        assert_eq!(found.map(get_tag_name), Some("Liegenschaft"));
    }

    #[test]
    fn test_node_value_requires_leading_text() {
        let xml = r#"<r><a><b>x</b>tail</a><c></c></r>"#;
        let doc = Document::parse(xml).unwrap();
        let root = doc.root_element();

        assert_eq!(node_value(root, "a"), None);
        assert_eq!(node_value(root, "c"), None);
        assert_eq!(node_value(root, "a/b"), Some("x"));
    }

    #[test]
    fn test_descendants_named_in_document_order() {
        let xml = r#"<r><Person id="1"/><x><Person id="2"/></x><Person id="3"/></r>"#;
        let doc = Document::parse(xml).unwrap();
        let ids: Vec<_> = descendants_named(doc.root_element(), "Person")
            .filter_map(|n| n.attribute("id"))
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_first_element_child_skips_text() {
        let xml = "<r>\n  <StockwerksEinheit/><Other/></r>";
        let doc = Document::parse(xml).unwrap();
        let first = first_element_child(doc.root_element());
        assert_eq!(first.map(get_tag_name), Some("StockwerksEinheit"));
    }

    #[test]
    fn test_has_attribute_ignores_namespace() {
        let xml = r#"<r xmlns:g="urn:g"><a g:bisEGBTBID="1"/><b vonEGBTBID="2"/></r>"#;
        let doc = Document::parse(xml).unwrap();
        let root = doc.root_element();

        assert!(has_attribute(find_child(root, "a").unwrap(), "bisEGBTBID"));
        assert!(!has_attribute(find_child(root, "b").unwrap(), "bisEGBTBID"));
    }
}
