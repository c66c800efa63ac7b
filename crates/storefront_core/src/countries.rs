//! Country lookup for the address forms.
//!
//! Loaded from the same `[{name, dial_code, code}]` list the storefront ships
//! as a static asset.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub name: String,
    #[serde(default)]
    pub dial_code: String,
    pub code: String,
}

#[derive(Debug, Clone, Default)]
pub struct CountryDirectory {
    countries: Vec<Country>,
}

impl CountryDirectory {
    pub fn new(countries: Vec<Country>) -> Self {
        Self { countries }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let countries: Vec<Country> =
            serde_json::from_str(raw).context("invalid country list")?;
        Ok(Self::new(countries))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read country list {}", path.display()))?;
        Self::from_json(&raw)
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    /// Resolves free text to a country code. First entry whose name or code
    /// starts with `input`, ignoring case, in list order.
    pub fn resolve(&self, input: &str) -> Option<&str> {
        let needle = input.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.countries
            .iter()
            .find(|country| {
                country.name.to_lowercase().starts_with(&needle)
                    || country.code.to_lowercase().starts_with(&needle)
            })
            .map(|country| country.code.as_str())
    }
}
