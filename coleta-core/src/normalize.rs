//! Street text normalization ahead of geocoder queries.
//!
//! Users type addresses as "Rua Carlos de Carvalho, 1555", "1555 carlos de
//! carvalho" or "Av. Prof. Pedro Viriato 200". The provider matches best on
//! the bare street name, so the house number is split off and leading
//! street types and honorifics are removed.

use std::sync::LazyLock;

use regex::Regex;

/// Street text followed by a house number, optionally comma separated.
static TRAILING_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)[,\s]+(\d+)\s*$").expect("valid regex"));

/// House number followed by street text.
static LEADING_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)[,\s]+(.+)$").expect("valid regex"));

/// Leading street-type token.
static STREET_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:rua|r\.|av\.|avenida|alameda|al\.|travessa|tv\.|praça|pç\.|rodovia|rod\.|estrada|est\.)\s+",
    )
    .expect("valid regex")
});

/// Leading honorific or title token.
static HONORIFIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:professor|prof\.|professora|profa\.|doutor|doutora|dr\.|dra\.|presidente|pres\.|senador|sen\.|deputado|dep\.|general|gen\.|marechal|mal\.|coronel|cel\.|capitão|cap\.|tenente|ten\.|engenheiro|eng\.|padre|pe\.|frei|dom|santa|santo|são|nossa senhora de|nossa senhora)\s+",
    )
    .expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of normalizing a raw address query.
pub struct NormalizedAddress {
    /// Street terms to query, raw form first, stripped form second when different.
    pub candidate_terms: Vec<String>,
    /// Street with number, street type and honorifics removed.
    pub extracted_street: String,
    /// House number found in the query.
    pub house_number: Option<String>,
}

impl NormalizedAddress {
    /// Candidate terms with the house number prefixed, as sent to the provider.
    #[must_use]
    pub fn search_terms(&self) -> Vec<String> {
        match &self.house_number {
            Some(number) => self
                .candidate_terms
                .iter()
                .map(|term| format!("{number} {term}"))
                .collect(),
            None => self.candidate_terms.clone(),
        }
    }
}

/// Split a raw query into street candidates and an optional house number.
///
/// Never fails: unrecognized input normalizes to itself.
#[must_use]
pub fn normalize(raw: &str) -> NormalizedAddress {
    let (street, house_number) = split_house_number(raw.trim());
    let stripped = strip_street(&street);

    let mut candidate_terms = Vec::with_capacity(2);
    if !street.is_empty() {
        candidate_terms.push(street.clone());
    }
    if stripped != street {
        candidate_terms.push(stripped.clone());
    }

    NormalizedAddress {
        candidate_terms,
        extracted_street: stripped,
        house_number,
    }
}

/// Separate a trailing or leading house number from the street text.
#[must_use]
pub fn split_house_number(query: &str) -> (String, Option<String>) {
    if let Some(caps) = TRAILING_NUMBER_RE.captures(query)
        && let (Some(street), Some(number)) = (caps.get(1), caps.get(2))
    {
        return (street.as_str().trim().to_owned(), Some(number.as_str().to_owned()));
    }

    if let Some(caps) = LEADING_NUMBER_RE.captures(query)
        && let (Some(number), Some(street)) = (caps.get(1), caps.get(2))
    {
        return (street.as_str().trim().to_owned(), Some(number.as_str().to_owned()));
    }

    (query.trim().to_owned(), None)
}

/// Remove leading street types and honorifics until nothing more matches.
#[must_use]
pub fn strip_street(street: &str) -> String {
    let mut current = street.trim().to_owned();
    loop {
        let without_type = STREET_TYPE_RE.replace(&current, "");
        let next = HONORIFIC_RE.replace(&without_type, "").trim().to_owned();
        if next == current || next.is_empty() {
            return current;
        }
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_trailing_number_after_comma() {
        let address = normalize("Rua Carlos de Carvalho, 1555");
        assert_eq!(address.extracted_street, "Carlos de Carvalho");
        assert_eq!(address.house_number.as_deref(), Some("1555"));
        assert_eq!(
            address.candidate_terms,
            vec!["Rua Carlos de Carvalho", "Carlos de Carvalho"]
        );
    }

    #[test]
    fn splits_trailing_number_after_space() {
        let address = normalize("Carlos de Carvalho 1555");
        assert_eq!(address.extracted_street, "Carlos de Carvalho");
        assert_eq!(address.house_number.as_deref(), Some("1555"));
        assert_eq!(address.candidate_terms, vec!["Carlos de Carvalho"]);
    }

    #[test]
    fn splits_leading_number() {
        let address = normalize("1555 Carlos de Carvalho");
        assert_eq!(address.extracted_street, "Carlos de Carvalho");
        assert_eq!(address.house_number.as_deref(), Some("1555"));
    }

    #[test]
    fn strips_honorific() {
        let address = normalize("Professor Pedro Viriato 200");
        assert_eq!(address.extracted_street, "Pedro Viriato");
        assert_eq!(address.house_number.as_deref(), Some("200"));
        assert_eq!(
            address.candidate_terms,
            vec!["Professor Pedro Viriato", "Pedro Viriato"]
        );
    }

    #[test]
    fn strips_abbreviated_type_and_title_case_insensitively() {
        assert_eq!(strip_street("AV. PROF. Pedro Viriato"), "Pedro Viriato");
        assert_eq!(strip_street("r. dr. Faivre"), "Faivre");
        assert_eq!(strip_street("Praça Nossa Senhora de Salette"), "Salette");
        assert_eq!(strip_street("Rua São Francisco"), "Francisco");
    }

    #[test]
    fn keeps_text_without_prefix() {
        let address = normalize("Marechal");
        assert_eq!(address.extracted_street, "Marechal");
        assert_eq!(address.candidate_terms, vec!["Marechal"]);
        assert!(address.house_number.is_none());
    }

    #[test]
    fn normalization_is_a_fixed_point() {
        for raw in [
            "Rua Professor Doutor Pedro Viriato, 200",
            "Av. Marechal Floriano Peixoto",
            "Alameda Dom Pedro II",
            "Travessa Nestor de Castro",
        ] {
            let once = normalize(raw);
            let twice = normalize(&once.extracted_street);
            assert_eq!(twice.extracted_street, once.extracted_street, "input {raw}");
            assert_eq!(twice.candidate_terms, vec![once.extracted_street.clone()]);
        }
    }

    #[test]
    fn prefixes_house_number_to_every_term() {
        let address = normalize("Rua Carlos de Carvalho, 1555");
        assert_eq!(
            address.search_terms(),
            vec!["1555 Rua Carlos de Carvalho", "1555 Carlos de Carvalho"]
        );
    }

    #[test]
    fn blank_input_has_no_terms() {
        let address = normalize("   ");
        assert!(address.candidate_terms.is_empty());
        assert!(address.search_terms().is_empty());
    }
}
