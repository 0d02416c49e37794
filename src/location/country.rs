// 🌍 Country vocabulary - names, aliases and ISO codes → Country
//
// "Deutschland", "germany", "DE", "DEU" → all the same country.
// Lookups ignore case, accents, spaces and punctuation.

use crate::error::{Error, Result};
use crate::issues::ParsedField;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::io::Read;
use std::path::Path;

const BUILTIN_COUNTRIES: &str = include_str!("../../data/countries.csv");

// ============================================================================
// COUNTRY
// ============================================================================

/// A country, identified by its ISO 3166-1 alpha-2 code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    pub iso2: String,
    pub iso3: String,
    pub name: String,
}

impl Country {
    pub fn new(iso2: &str, iso3: &str, name: &str) -> Self {
        Country {
            iso2: iso2.to_ascii_uppercase(),
            iso3: iso3.to_ascii_uppercase(),
            name: name.to_string(),
        }
    }
}

// Identity is the code; the display name may differ between tables
impl PartialEq for Country {
    fn eq(&self, other: &Self) -> bool {
        self.iso2 == other.iso2
    }
}

impl Eq for Country {}

impl Hash for Country {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.iso2.hash(state);
    }
}

// ============================================================================
// LOOKUP CAPABILITY
// ============================================================================

/// Resolves one raw country value. A miss is a failed field, never an error.
pub trait VocabularyLookup: Send + Sync {
    fn lookup(&self, raw: &str) -> ParsedField<Country>;
}

// ============================================================================
// COUNTRY VOCABULARY
// ============================================================================

#[derive(Debug, Deserialize)]
struct CountryRow {
    iso2: String,
    iso3: String,
    name: String,
    #[serde(default)]
    aliases: String,
}

/// In-memory vocabulary, loaded once and never mutated
#[derive(Debug, Clone, Default)]
pub struct CountryVocabulary {
    countries: Vec<Country>,
    /// Normalized name/alias/code → index into `countries`
    index: HashMap<String, usize>,
}

impl CountryVocabulary {
    /// Built-in ISO table
    pub fn builtin() -> Result<Self> {
        Self::from_reader(BUILTIN_COUNTRIES.as_bytes())
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open country table: {:?}", path))?;
        let vocabulary = Self::from_reader(file)
            .with_context(|| format!("Failed to load country table: {:?}", path))?;
        tracing::info!(countries = vocabulary.len(), file = ?path, "loaded country table");
        Ok(vocabulary)
    }

    /// CSV with header `iso2,iso3,name,aliases`; aliases are `|`-separated
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut vocabulary = CountryVocabulary::default();

        for result in rdr.deserialize::<CountryRow>() {
            let row = result?;
            if row.iso2.trim().len() != 2 || row.iso3.trim().len() != 3 {
                tracing::warn!(iso2 = %row.iso2, iso3 = %row.iso3, "skipping country row with bad codes");
                continue;
            }
            let country = Country::new(row.iso2.trim(), row.iso3.trim(), row.name.trim());
            let aliases: Vec<String> = row
                .aliases
                .split('|')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(String::from)
                .collect();
            vocabulary.register(country, &aliases);
        }

        if vocabulary.is_empty() {
            return Err(Error::ReferenceData("country table has no usable rows".to_string()));
        }
        Ok(vocabulary)
    }

    fn register(&mut self, country: Country, aliases: &[String]) {
        let position = self.countries.len();
        let keys = [country.iso2.clone(), country.iso3.clone(), country.name.clone()]
            .into_iter()
            .chain(aliases.iter().cloned());

        for key in keys {
            // First registration of a key wins
            self.index.entry(normalize(&key)).or_insert(position);
        }
        self.countries.push(country);
    }

    pub fn find(&self, raw: &str) -> Option<&Country> {
        let key = normalize(raw);
        if key.is_empty() {
            return None;
        }
        self.index.get(&key).map(|&i| &self.countries[i])
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

impl VocabularyLookup for CountryVocabulary {
    fn lookup(&self, raw: &str) -> ParsedField<Country> {
        match self.find(raw) {
            Some(country) => ParsedField::success(country.clone(), Vec::new()),
            None => ParsedField::fail_with(Vec::new()),
        }
    }
}

/// Lowercase ASCII letters and digits only, common accents folded
fn normalize(raw: &str) -> String {
    raw.chars()
        .map(fold_accent)
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => 'a',
        'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' | 'Í' | 'Ì' | 'Î' | 'Ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ø' | 'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' | 'Ø' => 'o',
        'ú' | 'ù' | 'û' | 'ü' | 'Ú' | 'Ù' | 'Û' | 'Ü' => 'u',
        'ç' | 'Ç' => 'c',
        'ñ' | 'Ñ' => 'n',
        _ => c,
    }
}

// ============================================================================
// TESTS
// ============================================================================
