//! Namespace and name handling
//!
//! Names are stored as written in the source: either prefixed (`tei:p`)
//! or in Clark notation (`{http://www.tei-c.org/ns/1.0}p`). No prefix
//! resolution happens here; callers that need the local part strip it.

use memchr::memchr;

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
}

/// Attribute carrying the identifier indexed by the transformer
pub const XML_ID: &str = "xml:id";

/// `xml:id` in Clark notation
pub const XML_ID_CLARK: &str = "{http://www.w3.org/XML/1998/namespace}id";

/// Attribute controlling whitespace handling in the indenter
pub const XML_SPACE: &str = "xml:space";

/// Prefixes of commonly used vocabularies and their namespace URIs.
const WELL_KNOWN: &[(&str, &str)] = &[
    ("dc", "http://purl.org/dc/elements/1.1/"),
    ("dcterms", "http://purl.org/dc/terms/"),
    ("fo", "http://www.w3.org/1999/XSL/Format"),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("html", "http://www.w3.org/1999/xhtml"),
    ("m", "http://www.w3.org/1998/Math/MathML"),
    ("marc", "http://www.loc.gov/MARC21/slim"),
    ("mets", "http://www.loc.gov/METS/"),
    ("mods", "http://www.loc.gov/mods/v3"),
    ("oai", "http://www.openarchives.org/OAI/2.0/"),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("skos", "http://www.w3.org/2004/02/skos/core#"),
    ("svg", "http://www.w3.org/2000/svg"),
    ("tei", "http://www.tei-c.org/ns/1.0"),
    ("w", "http://schemas.openxmlformats.org/wordprocessingml/2006/main"),
    ("xlink", "http://www.w3.org/1999/xlink"),
    ("xml", ns::XML),
    ("xs", "http://www.w3.org/2001/XMLSchema"),
    ("xsi", "http://www.w3.org/2001/XMLSchema-instance"),
    ("xsl", "http://www.w3.org/1999/XSL/Transform"),
];

/// Look up the namespace URI of a well-known prefix
pub fn well_known_namespace(prefix: &str) -> Option<&'static str> {
    WELL_KNOWN
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, uri)| *uri)
}

/// Strip a namespace from a tag name, in either Clark or prefixed form
#[inline]
pub fn local_name(name: &str) -> &str {
    let bytes = name.as_bytes();
    if bytes.first() == Some(&b'{') {
        return match memchr(b'}', bytes) {
            Some(end) => &name[end + 1..],
            None => name,
        };
    }
    match memchr(b':', bytes) {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// The namespace part of a name: the URI in Clark notation or the prefix otherwise
pub fn namespace_part(name: &str) -> Option<&str> {
    let bytes = name.as_bytes();
    if bytes.first() == Some(&b'{') {
        return memchr(b'}', bytes).map(|end| &name[1..end]);
    }
    memchr(b':', bytes).map(|pos| &name[..pos])
}

/// Whether an attribute name declares a namespace (`xmlns` or `xmlns:p`)
#[inline]
pub fn is_namespace_declaration(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}
