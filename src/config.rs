//! Search configuration: defaults, optional CONL file, command-line overrides

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::types::SearchCriteria;

pub const DEFAULT_SEARCH_URL: &str = "http://www.tauntondeeds.com/Searches/ImageSearch.aspx";
const DEFAULT_START_DATE: &str = "2020-01-01";
const DEFAULT_END_DATE: &str = "2020-12-31";
const DEFAULT_DOCUMENT_TYPE: &str = "DEED";

/// Settings as written in a config file or passed as flags; anything unset falls through
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigValues {
    pub search_url: Option<String>,
    /// YYYY-MM-DD
    pub start_date: Option<String>,
    /// YYYY-MM-DD
    pub end_date: Option<String>,
    pub document_type: Option<String>,
}

impl ConfigValues {
    /// Values from `self` win over `fallback`
    fn or(self, fallback: ConfigValues) -> ConfigValues {
        ConfigValues {
            search_url: self.search_url.or(fallback.search_url),
            start_date: self.start_date.or(fallback.start_date),
            end_date: self.end_date.or(fallback.end_date),
            document_type: self.document_type.or(fallback.document_type),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub search_url: String,
    pub criteria: SearchCriteria,
}

impl Config {
    /// Resolve flags over the config file (if any) over the defaults
    pub fn load(path: Option<&Path>, overrides: ConfigValues) -> Result<Self> {
        let file_values = match path {
            Some(path) => load_file(path)?,
            None => ConfigValues::default(),
        };
        Self::resolve(overrides.or(file_values))
    }

    fn resolve(values: ConfigValues) -> Result<Self> {
        let start_date = parse_date(
            "start_date",
            values.start_date.as_deref().unwrap_or(DEFAULT_START_DATE),
        )?;
        let end_date = parse_date(
            "end_date",
            values.end_date.as_deref().unwrap_or(DEFAULT_END_DATE),
        )?;
        if start_date > end_date {
            bail!(
                "start_date {} is after end_date {}",
                start_date,
                end_date
            );
        }

        let document_type = values
            .document_type
            .unwrap_or_else(|| DEFAULT_DOCUMENT_TYPE.to_string());
        if document_type.trim().is_empty() {
            bail!("document_type must not be empty");
        }

        Ok(Self {
            search_url: values
                .search_url
                .unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string()),
            criteria: SearchCriteria {
                start_date,
                end_date,
                document_type,
            },
        })
    }
}

fn load_file(path: &Path) -> Result<ConfigValues> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_conl::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid {} '{}', expected YYYY-MM-DD", field, value))
}
