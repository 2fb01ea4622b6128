//! Postback form state for the registry's ASP.NET search page
//!
//! WebForms reissues `__VIEWSTATE` and `__VIEWSTATEGENERATOR` on every
//! response and rejects a postback that echoes stale values, so a fresh
//! [`FormState`] is extracted from each response and used for exactly one
//! submission.

use scraper::{Html, Selector};
use std::sync::LazyLock;

use crate::error::ScrapeError;
use crate::types::SearchCriteria;

pub const VIEWSTATE: &str = "__VIEWSTATE";
pub const VIEWSTATE_GENERATOR: &str = "__VIEWSTATEGENERATOR";
pub const EVENT_TARGET: &str = "__EVENTTARGET";
pub const EVENT_ARGUMENT: &str = "__EVENTARGUMENT";

/// Control whose postback runs the recorded-land search
pub const SEARCH_BUTTON_TARGET: &str = "ctl00$cphMainContent$btnSearchRL";
/// Results grid; its postback with `Page$N` turns the page
pub const RESULTS_GRID_TARGET: &str = "ctl00$cphMainContent$gvSearchResults";

const DOCUMENT_TYPE_FIELD: &str = "ctl00$cphMainContent$ddlRLDocumentType$vddlDropDown";
const START_DATE_FIELD: &str = "ctl00$cphMainContent$txtRLStartDate$dateInput";
const END_DATE_FIELD: &str = "ctl00$cphMainContent$txtRLEndDate$dateInput";

/// Ordered form fields for one POST
pub type Payload = Vec<(String, String)>;

/// Hidden tokens and resolved search parameters read from one response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub viewstate: String,
    pub viewstate_generator: String,
    pub document_type_id: String,
}

impl FormState {
    pub fn extract(html: &Html, criteria: &SearchCriteria) -> Result<Self, ScrapeError> {
        Ok(Self {
            viewstate: hidden_input_value(html, VIEWSTATE)?,
            viewstate_generator: hidden_input_value(html, VIEWSTATE_GENERATOR)?,
            document_type_id: resolve_document_type(html, &criteria.document_type)?,
        })
    }

    /// Postback that runs the search and returns page 1
    pub fn search_submission(&self, criteria: &SearchCriteria) -> Payload {
        let mut payload = self.base_payload(criteria);
        payload.push((EVENT_TARGET.to_string(), SEARCH_BUTTON_TARGET.to_string()));
        payload
    }

    /// Postback that asks the results grid for `page`
    pub fn page_submission(&self, criteria: &SearchCriteria, page: u32) -> Payload {
        let mut payload = self.base_payload(criteria);
        payload.push((EVENT_TARGET.to_string(), RESULTS_GRID_TARGET.to_string()));
        payload.push((EVENT_ARGUMENT.to_string(), format!("Page${}", page)));
        payload
    }

    fn base_payload(&self, criteria: &SearchCriteria) -> Payload {
        vec![
            (VIEWSTATE.to_string(), self.viewstate.clone()),
            (VIEWSTATE_GENERATOR.to_string(), self.viewstate_generator.clone()),
            (DOCUMENT_TYPE_FIELD.to_string(), self.document_type_id.clone()),
            (START_DATE_FIELD.to_string(), criteria.start_date_param()),
            (END_DATE_FIELD.to_string(), criteria.end_date_param()),
        ]
    }
}

static INPUTS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input").expect("invalid selector: input"));

static OPTIONS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("option").expect("invalid selector: option"));

fn hidden_input_value(html: &Html, field: &'static str) -> Result<String, ScrapeError> {
    html.select(&INPUTS)
        .find(|input| input.value().id() == Some(field))
        .and_then(|input| input.value().attr("value"))
        .map(str::to_string)
        .ok_or(ScrapeError::MissingStateToken { field })
}

fn resolve_document_type(html: &Html, label: &str) -> Result<String, ScrapeError> {
    let wanted = label.trim();

    html.select(&OPTIONS)
        .find(|option| option.text().collect::<String>().trim() == wanted)
        .and_then(|option| option.value().attr("value"))
        .map(str::to_string)
        .ok_or_else(|| ScrapeError::UnknownDocumentType {
            label: label.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn criteria(document_type: &str) -> SearchCriteria {
        SearchCriteria {
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
            document_type: document_type.to_string(),
        }
    }

    const LANDING: &str = r#"<html><body><form>
        <input type="hidden" name="__VIEWSTATE" id="__VIEWSTATE" value="dDwtMTI3OTMzNDM4NDs7Pg==" />
        <input type="hidden" name="__VIEWSTATEGENERATOR" id="__VIEWSTATEGENERATOR" value="C2EE9ABB" />
        <select name="ctl00$cphMainContent$ddlRLDocumentType$vddlDropDown">
            <option value="">(any)</option>
            <option value="100002">DEED</option>
            <option value="100017">MORTGAGE</option>
            <option value="100030"> DISCHARGE </option>
        </select>
    </form></body></html>"#;

    fn value<'a>(payload: &'a Payload, name: &str) -> Option<&'a str> {
        payload
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_extract_tokens_and_document_type() {
        let html = Html::parse_document(LANDING);
        let state = FormState::extract(&html, &criteria("DEED")).unwrap();
        assert_eq!(state.viewstate, "dDwtMTI3OTMzNDM4NDs7Pg==");
        assert_eq!(state.viewstate_generator, "C2EE9ABB");
        assert_eq!(state.document_type_id, "100002");
    }

    #[test]
    fn test_document_type_label_is_trimmed() {
        let html = Html::parse_document(LANDING);
        let state = FormState::extract(&html, &criteria("DISCHARGE")).unwrap();
        assert_eq!(state.document_type_id, "100030");
    }

    #[test]
    fn test_extract_is_repeatable() {
        let html = Html::parse_document(LANDING);
        let first = FormState::extract(&html, &criteria("MORTGAGE")).unwrap();
        let second = FormState::extract(&html, &criteria("MORTGAGE")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_viewstate() {
        let html = Html::parse_document(
            r#"<input type="hidden" id="__VIEWSTATEGENERATOR" value="C2EE9ABB" />
               <option value="1">DEED</option>"#,
        );
        let err = FormState::extract(&html, &criteria("DEED")).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::MissingStateToken { field: VIEWSTATE }
        ));
    }

    #[test]
    fn test_missing_generator() {
        let html = Html::parse_document(
            r#"<input type="hidden" id="__VIEWSTATE" value="abc" />
               <option value="1">DEED</option>"#,
        );
        let err = FormState::extract(&html, &criteria("DEED")).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::MissingStateToken {
                field: VIEWSTATE_GENERATOR
            }
        ));
    }

    #[test]
    fn test_unknown_document_type() {
        let html = Html::parse_document(LANDING);
        let err = FormState::extract(&html, &criteria("LIEN")).unwrap_err();
        match err {
            ScrapeError::UnknownDocumentType { label } => assert_eq!(label, "LIEN"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_search_submission() {
        let html = Html::parse_document(LANDING);
        let criteria = criteria("DEED");
        let payload = FormState::extract(&html, &criteria)
            .unwrap()
            .search_submission(&criteria);

        assert_eq!(value(&payload, EVENT_TARGET), Some(SEARCH_BUTTON_TARGET));
        assert_eq!(value(&payload, EVENT_ARGUMENT), None);
        assert_eq!(value(&payload, VIEWSTATE), Some("dDwtMTI3OTMzNDM4NDs7Pg=="));
        assert_eq!(value(&payload, VIEWSTATE_GENERATOR), Some("C2EE9ABB"));
        assert_eq!(value(&payload, DOCUMENT_TYPE_FIELD), Some("100002"));
        assert_eq!(value(&payload, START_DATE_FIELD), Some("2020-01-01-00-00-00"));
        assert_eq!(value(&payload, END_DATE_FIELD), Some("2020-12-31-00-00-00"));
    }

    #[test]
    fn test_page_submission() {
        let html = Html::parse_document(LANDING);
        let criteria = criteria("DEED");
        let payload = FormState::extract(&html, &criteria)
            .unwrap()
            .page_submission(&criteria, 3);

        assert_eq!(value(&payload, EVENT_TARGET), Some(RESULTS_GRID_TARGET));
        assert_eq!(value(&payload, EVENT_ARGUMENT), Some("Page$3"));
        assert_eq!(value(&payload, DOCUMENT_TYPE_FIELD), Some("100002"));
    }
}
