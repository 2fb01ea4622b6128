//! Search criteria and deed record types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format the remote form's date inputs expect (Telerik `dateInput` value)
const FORM_DATE_FORMAT: &str = "%Y-%m-%d-00-00-00";

/// What to search for. Fixed for the whole session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Human-readable label, e.g. "DEED". Resolved to the server's option id per request.
    pub document_type: String,
}

impl SearchCriteria {
    pub fn start_date_param(&self) -> String {
        self.start_date.format(FORM_DATE_FORMAT).to_string()
    }

    pub fn end_date_param(&self) -> String {
        self.end_date.format(FORM_DATE_FORMAT).to_string()
    }
}

/// Position in the results grid, read off the pager row of a single response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub current_page: u32,
    pub has_next_page: bool,
}

/// One row of the search results grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeedRecord {
    pub date: String,
    #[serde(rename = "type")]
    pub document_type: String,
    pub book: String,
    #[serde(rename = "page_num")]
    pub page_number: String,
    #[serde(rename = "doc_num")]
    pub document_number: String,
    pub city: String,
    /// Description cell exactly as rendered
    #[serde(rename = "description")]
    pub raw_description: String,
    pub cost: Option<f64>,
    pub street_address: Option<String>,
    /// Filled by downstream enrichment, never by the scraper
    pub state: Option<String>,
    pub zip: Option<String>,
}

/// Totals reported once pagination reaches its terminal state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub pages_visited: u32,
    pub records_written: usize,
    pub submissions: usize,
}
