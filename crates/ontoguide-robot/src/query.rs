//! Top-level class SPARQL query and its JSON results.

use serde::Deserialize;

use ontoguide_core::ToolInvocationFailure;

/// Named classes whose only declared parent is `owl:Thing` (or themselves).
pub fn top_level_classes_query(limit: usize) -> String {
    format!(
        "PREFIX owl: <http://www.w3.org/2002/07/owl#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
SELECT DISTINCT ?class WHERE {{
    ?class a owl:Class .
    FILTER NOT EXISTS {{ ?class rdfs:subClassOf ?parent .
                        FILTER(?parent != owl:Thing && ?parent != ?class) }}
    FILTER(!isBlank(?class))
    FILTER(?class != owl:Thing && ?class != owl:Nothing)
}}
LIMIT {limit}
"
    )
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    #[serde(default)]
    results: Bindings,
}

#[derive(Debug, Default, Deserialize)]
struct Bindings {
    #[serde(default)]
    bindings: Vec<Binding>,
}

#[derive(Debug, Deserialize)]
struct Binding {
    class: Option<Term>,
}

#[derive(Debug, Deserialize)]
struct Term {
    #[serde(default)]
    value: String,
}

/// Class identifiers from a SPARQL JSON results document, in result order.
pub fn parse_class_bindings(raw: &str) -> Result<Vec<String>, ToolInvocationFailure> {
    let results: SparqlResults = serde_json::from_str(raw)
        .map_err(|e| ToolInvocationFailure::InvalidResponse(format!("query results: {e}")))?;

    Ok(results
        .results
        .bindings
        .into_iter()
        .filter_map(|b| b.class)
        .map(|t| t.value)
        .filter(|v| !v.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_limit() {
        let q = top_level_classes_query(10);
        assert!(q.contains("LIMIT 10"));
        assert!(q.contains("FILTER(!isBlank(?class))"));
    }

    #[test]
    fn test_parse_bindings() {
        let raw = r#"{
            "head": {"vars": ["class"]},
            "results": {"bindings": [
                {"class": {"type": "uri", "value": "http://example.org/Food"}},
                {"other": {"type": "uri", "value": "http://example.org/X"}},
                {"class": {"type": "uri", "value": ""}},
                {"class": {"type": "uri", "value": "http://example.org/Drink"}}
            ]}
        }"#;
        assert_eq!(
            parse_class_bindings(raw).unwrap(),
            vec!["http://example.org/Food", "http://example.org/Drink"]
        );
    }

    #[test]
    fn test_missing_results_is_empty() {
        assert!(parse_class_bindings(r#"{"head": {}}"#).unwrap().is_empty());
        assert!(parse_class_bindings("not json").is_err());
    }
}
