//! Concept identifier repair and validation.
//!
//! Repair ([`normalize_iri`]) is total: it always returns a string. Whether
//! the result may be handed to the extraction tool is a separate check,
//! [`is_valid_iri`].

use tracing::debug;

use crate::domain::{OntoGuideError, SeedTerm, SeedTermEntry};

/// The universal root concept.
pub const OWL_THING: &str = "http://www.w3.org/2002/07/owl#Thing";

/// Namespace used for prefixes outside [`KNOWN_PREFIXES`].
pub const SYNTHETIC_NAMESPACE: &str = "http://purl.org/ontology/";

const OBO_PREFIX: &str = "obo";

/// Closed prefix table for CURIE expansion.
pub const KNOWN_PREFIXES: [(&str, &str); 8] = [
    ("obo", "http://purl.obolibrary.org/obo/"),
    ("go", "http://purl.obolibrary.org/obo/GO_"),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ("dc", "http://purl.org/dc/elements/1.1/"),
    ("skos", "http://www.w3.org/2004/02/skos/core#"),
];

const QUALIFIED_SCHEMES: [&str; 3] = ["http://", "https://", "urn:"];

fn is_qualified(iri: &str) -> bool {
    QUALIFIED_SCHEMES.iter().any(|s| iri.starts_with(s))
}

/// Base identifier for a known prefix (case-insensitive).
pub fn namespace_for(prefix: &str) -> Option<&'static str> {
    let prefix = prefix.to_ascii_lowercase();
    KNOWN_PREFIXES
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, ns)| *ns)
}

/// OBO identifiers are spelled `GO_0008150` in IRIs but often written
/// `GO:0008150` in term lists.
fn obo_local_part(local: &str) -> String {
    if local.contains('_') {
        return local.to_string();
    }
    match local.split_once(':') {
        Some((idspace, id)) => format!("{idspace}_{id}"),
        None => local.to_string(),
    }
}

/// Repair a raw identifier.
///
/// Strips surrounding quotes, passes qualified identifiers through, and
/// expands `prefix:local` shorthand through [`KNOWN_PREFIXES`]. Unknown
/// prefixes expand into [`SYNTHETIC_NAMESPACE`]. Anything else is returned
/// unchanged (and will fail validation).
pub fn normalize_iri(raw: &str) -> String {
    let iri = raw.trim().trim_matches(|c| c == '"' || c == '\'');

    if is_qualified(iri) {
        return iri.to_string();
    }

    let Some((prefix, local)) = iri.split_once(':') else {
        return iri.to_string();
    };

    let prefix = prefix.to_ascii_lowercase();
    match namespace_for(&prefix) {
        Some(ns) if prefix == OBO_PREFIX => format!("{ns}{}", obo_local_part(local)),
        Some(ns) => format!("{ns}{local}"),
        None => format!("{SYNTHETIC_NAMESPACE}{prefix}/{local}"),
    }
}

/// A usable identifier is scheme- or urn-qualified and has no whitespace.
pub fn is_valid_iri(iri: &str) -> bool {
    is_qualified(iri) && !iri.chars().any(char::is_whitespace)
}

/// Repair and validate in one step, reporting why an identifier is unusable.
pub fn validate_iri(raw: &str) -> Result<String, OntoGuideError> {
    let iri = normalize_iri(raw);
    if !is_qualified(&iri) {
        return Err(OntoGuideError::InvalidIdentifier {
            iri,
            reason: "not scheme- or urn-qualified".to_string(),
        });
    }
    if iri.chars().any(char::is_whitespace) {
        return Err(OntoGuideError::InvalidIdentifier {
            iri,
            reason: "contains whitespace".to_string(),
        });
    }
    Ok(iri)
}

/// Turn a seed-term document entry into a [`SeedTerm`] with validity set.
pub fn seed_term_from_entry(entry: &SeedTermEntry) -> SeedTerm {
    let label = entry.term.clone().unwrap_or_default();
    let raw = entry.iri.as_deref().map(str::trim).filter(|s| !s.is_empty());

    match raw {
        None => SeedTerm {
            label,
            iri: None,
            valid: false,
        },
        Some(raw) => match validate_iri(raw) {
            Ok(iri) => SeedTerm {
                label,
                iri: Some(iri),
                valid: true,
            },
            Err(e) => {
                debug!(term = %label, error = %e, "Excluding seed term");
                SeedTerm {
                    label,
                    iri: Some(normalize_iri(raw)),
                    valid: false,
                }
            }
        },
    }
}

/// Display label for an identifier: its last fragment or path segment.
pub fn local_name(iri: &str) -> &str {
    iri.rsplit(['#', '/']).next().unwrap_or(iri)
}
