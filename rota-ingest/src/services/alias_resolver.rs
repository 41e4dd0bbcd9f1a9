//! Alias Resolver
//!
//! Maps free-text name spellings to a stable person identity.
//!
//! # Lookup key
//! 1. Trim leading/trailing whitespace (including full-width U+3000)
//! 2. Collapse internal whitespace runs to a single space
//! 3. Lowercase (lookup key only; display names keep their casing)
//!
//! # Fallback
//! Names with no alias entry are not an error. A deterministic identity is
//! synthesized from a slug of the cleaned name (`person_<slug>`) and the
//! fallback is logged; callers surface it as a row warning.
//!
//! The table is built once per run and is immutable afterwards.

use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::models::{Person, PersonAlias};
use crate::services::field_cleaner::{self, clean_text};

/// Prefix of synthesized fallback ids
pub const FALLBACK_ID_PREFIX: &str = "person_";

/// How a name was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// Matched an alias table entry
    Alias,
    /// No alias matched; identity synthesized from the name
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub person: Person,
    pub source: ResolutionSource,
    /// Whitespace-normalized input text
    pub cleaned_input: String,
}

impl Resolution {
    pub fn is_fallback(&self) -> bool {
        self.source == ResolutionSource::Fallback
    }
}

pub struct AliasResolver {
    /// lookup key → person_id
    by_key: HashMap<String, String>,
    /// person_id → display_name (first alias row seen for the id wins)
    display_names: HashMap<String, String>,
    placeholders: Vec<String>,
}

impl AliasResolver {
    /// Build with the default placeholder tokens
    pub fn new(aliases: Vec<PersonAlias>) -> Self {
        Self::with_placeholders(aliases, field_cleaner::default_placeholders())
    }

    /// Build the lookup table
    ///
    /// Entries with an empty alias or person id are ignored. An alias key
    /// already present keeps its first entry; the later one is logged and dropped.
    pub fn with_placeholders(aliases: Vec<PersonAlias>, placeholders: Vec<String>) -> Self {
        let mut by_key = HashMap::new();
        let mut display_names: HashMap<String, String> = HashMap::new();

        for alias in aliases {
            let key = alias_key(&alias.alias_text);
            let person_id = alias.person_id.trim().to_string();
            if key.is_empty() || person_id.is_empty() {
                warn!(
                    alias = %alias.alias_text,
                    person_id = %alias.person_id,
                    "Ignoring alias entry with empty alias or person id"
                );
                continue;
            }

            let display = {
                let cleaned = field_cleaner::normalize_whitespace(&alias.display_name);
                if cleaned.is_empty() {
                    field_cleaner::normalize_whitespace(&alias.alias_text)
                } else {
                    cleaned
                }
            };
            display_names.entry(person_id.clone()).or_insert(display);

            match by_key.get(&key) {
                Some(existing) if existing != &person_id => {
                    warn!(
                        alias = %alias.alias_text,
                        kept = %existing,
                        ignored = %person_id,
                        "Duplicate alias maps to a different person; keeping first entry"
                    );
                }
                Some(_) => {}
                None => {
                    by_key.insert(key, person_id);
                }
            }
        }

        debug!(
            aliases = by_key.len(),
            persons = display_names.len(),
            "Alias table built"
        );

        Self {
            by_key,
            display_names,
            placeholders,
        }
    }

    /// Number of distinct alias keys
    pub fn alias_count(&self) -> usize {
        self.by_key.len()
    }

    /// Number of distinct person ids
    pub fn person_count(&self) -> usize {
        self.display_names.len()
    }

    /// Table lookup only; `None` is NOT_FOUND (no fallback)
    pub fn lookup(&self, raw_name: &str) -> Option<Person> {
        let person_id = self.by_key.get(&alias_key(raw_name))?;
        let name = self
            .display_names
            .get(person_id)
            .cloned()
            .unwrap_or_else(|| field_cleaner::normalize_whitespace(raw_name));
        Some(Person::new(person_id.clone(), name))
    }

    /// Resolve one name; `None` only for empty or placeholder input
    pub fn resolve(&self, raw_name: &str) -> Option<Resolution> {
        let cleaned = clean_text(raw_name, &self.placeholders);
        if cleaned.is_empty() {
            return None;
        }

        if let Some(person) = self.lookup(&cleaned) {
            return Some(Resolution {
                person,
                source: ResolutionSource::Alias,
                cleaned_input: cleaned,
            });
        }

        let person = Person::new(fallback_person_id(&cleaned), cleaned.clone());
        warn!(
            name = %cleaned,
            person_id = %person.id,
            "Unresolved alias, using synthesized identity"
        );
        Some(Resolution {
            person,
            source: ResolutionSource::Fallback,
            cleaned_input: cleaned,
        })
    }

    /// Resolve many names: empty/placeholder entries dropped, duplicate
    /// person ids removed, first-occurrence order kept
    pub fn resolve_list<S: AsRef<str>>(&self, raw_names: &[S]) -> Vec<Resolution> {
        let mut seen = HashSet::new();
        raw_names
            .iter()
            .filter_map(|name| self.resolve(name.as_ref()))
            .filter(|r| seen.insert(r.person.id.clone()))
            .collect()
    }
}

/// Case- and whitespace-insensitive lookup key
pub fn alias_key(raw: &str) -> String {
    field_cleaner::normalize_whitespace(raw).to_lowercase()
}

/// Deterministic id for a name with no alias entry
///
/// Alphanumeric characters (any script) are kept lowercased; every other run
/// of characters becomes one `_`. A name with no alphanumerics at all gets a
/// short content hash instead.
pub fn fallback_person_id(cleaned_name: &str) -> String {
    let mut slug = String::new();
    let mut pending_sep = false;
    for c in cleaned_name.chars() {
        if c.is_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }

    if slug.is_empty() {
        let digest = Sha256::digest(cleaned_name.as_bytes());
        let hex: String = digest.iter().take(4).map(|b| format!("{:02x}", b)).collect();
        return format!("{}unknown_{}", FALLBACK_ID_PREFIX, hex);
    }

    format!("{}{}", FALLBACK_ID_PREFIX, slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> AliasResolver {
        AliasResolver::new(vec![
            PersonAlias::new("Zoey", "person_zoey", "Zoey"),
            PersonAlias::new("张牧师", "preacher_zhang", "张牧师"),
            PersonAlias::new("Pastor Zhang", "preacher_zhang", "Pastor Zhang"),
            PersonAlias::new("陈明", "person_chenming", "陈明"),
            PersonAlias::new("Ming Chen", "person_chenming", ""),
        ])
    }

    #[test]
    fn test_lookup_is_case_and_whitespace_insensitive() {
        let r = resolver();
        let ids: Vec<String> = ["  Zoey  ", "ZOEY", "Zoey", "zoey\u{3000}"]
            .iter()
            .map(|n| r.resolve(n).unwrap().person.id)
            .collect();
        assert!(ids.iter().all(|id| id == "person_zoey"));
    }

    #[test]
    fn test_many_aliases_one_person_share_display_name() {
        let r = resolver();
        let a = r.resolve("Pastor  Zhang").unwrap();
        let b = r.resolve("张牧师").unwrap();
        assert_eq!(a.person, b.person);
        assert_eq!(a.person.name, "张牧师");
        assert_eq!(r.person_count(), 3);
        assert_eq!(r.alias_count(), 5);
    }

    #[test]
    fn test_unknown_name_gets_deterministic_fallback() {
        let r = resolver();
        let first = r.resolve(" Mary  Ann ").unwrap();
        let second = r.resolve("mary ann").unwrap();
        assert!(first.is_fallback());
        assert_eq!(first.person.id, "person_mary_ann");
        assert_eq!(first.person.id, second.person.id);
        assert_eq!(first.person.name, "Mary Ann");
        assert!(r.lookup("Mary Ann").is_none());
    }

    #[test]
    fn test_empty_and_placeholder_resolve_to_none() {
        let r = resolver();
        assert!(r.resolve("").is_none());
        assert!(r.resolve("  ").is_none());
        assert!(r.resolve("-").is_none());
    }

    #[test]
    fn test_resolve_list_dedups_by_person_in_order() {
        let r = AliasResolver::new(vec![
            PersonAlias::new("A", "1", "A"),
            PersonAlias::new("B", "2", "B"),
            PersonAlias::new("A2", "1", "A"),
        ]);
        let ids: Vec<String> = r
            .resolve_list(&["A", "B", "A", "", "A2"])
            .into_iter()
            .map(|res| res.person.id)
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_duplicate_alias_keeps_first_entry() {
        let r = AliasResolver::new(vec![
            PersonAlias::new("Sam", "person_sam_a", "Sam A"),
            PersonAlias::new("SAM", "person_sam_b", "Sam B"),
        ]);
        assert_eq!(r.resolve("sam").unwrap().person.id, "person_sam_a");
    }

    #[test]
    fn test_fallback_slug_handles_scripts_and_punctuation() {
        assert_eq!(fallback_person_id("陈 明"), "person_陈_明");
        assert_eq!(fallback_person_id("O'Brien, Pat"), "person_o_brien_pat");
        let symbolic = fallback_person_id("???");
        assert!(symbolic.starts_with("person_unknown_"));
        assert_eq!(symbolic, fallback_person_id("???"));
    }
}
