//! Insurer registry and identity resolution.
//!
//! The premium tables only carry numeric insurer codes. Several codes can
//! belong to the same commercial brand (mergers leave the old legal entities
//! behind), so lookups go through a static code table and a small table of
//! primary codes per brand.

use std::collections::{BTreeSet, HashSet};

/// Insurer code to display name. Order matters for containment lookups.
const INSURERS: &[(&str, &str)] = &[
    ("0008", "CSS"),
    ("1507", "CSS"),
    ("1577", "Arcosana (CSS)"),
    ("1562", "Helsana"),
    ("1322", "Helsana"),
    ("1568", "Helsana"),
    ("0312", "Helsana"),
    ("1479", "Groupe Mutuel"),
    ("0134", "Groupe Mutuel"),
    ("0360", "Groupe Mutuel"),
    ("0780", "Groupe Mutuel"),
    ("1503", "Groupe Mutuel"),
    ("1535", "Groupe Mutuel"),
    ("1384", "SWICA"),
    ("1509", "Sanitas"),
    ("1555", "Visana"),
    ("1570", "Visana"),
    ("1542", "Assura"),
    ("0290", "Concordia"),
    ("0376", "KPT"),
    ("1529", "Atupri"),
    ("0062", "Sympany"),
    ("0057", "Sympany"),
    ("1401", "Sympany"),
    ("0455", "ÖKK"),
    ("0881", "EGK"),
    ("1560", "Agrisano"),
    ("0032", "Aquilana"),
    ("0941", "sodalis"),
    ("1386", "Galenos"),
    ("0923", "SLKK"),
    ("0343", "Sumiswalder"),
    ("0194", "Provita"),
    ("0558", "Rhenusana"),
    ("0774", "Birchmeier"),
    ("0829", "KLuG"),
    ("0901", "Krankenkasse Steffisburg"),
    ("0966", "Einsiedler Krankenkasse"),
    ("0994", "Glarner Krankenversicherung"),
    ("1040", "Krankenkasse Luzerner Hinterland"),
    ("1142", "Krankenkasse Institut Ingenbohl"),
    ("0182", "Krankenkasse Simplon"),
    ("0246", "vita surselva"),
    ("0216", "Kolping Krankenkasse"),
    ("0762", "Stiftung Krankenkasse Wädenswil"),
    ("0820", "Lumneziana"),
    ("1331", "Krankenkasse Visperterminen"),
    ("1318", "Mutuel Assurance"),
];

/// Brand to the single code used when one representative is needed.
const PRIMARY: &[(&str, &str)] = &[
    ("css", "0008"),
    ("helsana", "1562"),
    ("groupe mutuel", "1479"),
    ("swica", "1384"),
    ("sanitas", "1509"),
    ("visana", "1555"),
    ("assura", "1542"),
    ("concordia", "0290"),
    ("kpt", "0376"),
    ("atupri", "1529"),
    ("sympany", "0062"),
    ("ökk", "0455"),
    ("egk", "0881"),
    ("agrisano", "1560"),
    ("aquilana", "0032"),
    ("sodalis", "0941"),
    ("galenos", "1386"),
    ("slkk", "0923"),
];

/// Normalize a code to its 4-digit zero-padded form.
pub fn normalize_code(code: &str) -> String {
    format!("{:0>4}", code.trim())
}

/// Display name for a code, or a synthesized label for unknown codes.
pub fn name_of(code: &str) -> String {
    let code = normalize_code(code);
    INSURERS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("Insurer {}", code))
}

fn contains_either(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

fn search_term(name: &str) -> Option<String> {
    let term = name.trim().to_lowercase();
    (!term.is_empty()).then_some(term)
}

/// Resolve a free-text insurer name to one representative code.
///
/// Tried in order, first hit wins:
/// 1. exact match in the primary table
/// 2. containment match (either direction) in the primary table
/// 3. exact match against registry display names
/// 4. containment match against registry display names
pub fn primary_code_for(name: &str) -> Option<String> {
    let term = search_term(name)?;

    if let Some((_, code)) = PRIMARY.iter().find(|(brand, _)| *brand == term) {
        return Some(code.to_string());
    }
    if let Some((_, code)) = PRIMARY
        .iter()
        .find(|(brand, _)| contains_either(brand, &term))
    {
        return Some(code.to_string());
    }
    if let Some((code, _)) = INSURERS
        .iter()
        .find(|(_, display)| display.to_lowercase() == term)
    {
        return Some(code.to_string());
    }
    INSURERS
        .iter()
        .find(|(_, display)| contains_either(&display.to_lowercase(), &term))
        .map(|(code, _)| code.to_string())
}

/// Every code whose display name contains the term, or is contained in it.
///
/// Matching is plain substring containment, so short terms can pull in
/// unrelated brands.
pub fn all_codes_for(name: &str) -> BTreeSet<String> {
    let Some(term) = search_term(name) else {
        return BTreeSet::new();
    };
    INSURERS
        .iter()
        .filter(|(_, display)| contains_either(&display.to_lowercase(), &term))
        .map(|(code, _)| code.to_string())
        .collect()
}

/// Sorted, de-duplicated display names, used as a hint on failed lookups.
pub fn known_names() -> Vec<&'static str> {
    let mut seen = HashSet::new();
    let mut names: Vec<&'static str> = INSURERS
        .iter()
        .map(|(_, name)| *name)
        .filter(|name| seen.insert(*name))
        .collect();
    names.sort_by_key(|name| name.to_lowercase());
    names
}
