//! Result grid rows to [`DeedRecord`]s

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use crate::description::parse_description;
use crate::error::ScrapeError;
use crate::types::DeedRecord;

/// Data rows carry `gridRow` / `gridAltRow` classes; header and pager rows don't
pub const RESULT_ROWS_SELECTOR: &str = r#"table#ctl00_cphMainContent_gvSearchResults tr[class*="Row"]"#;

static RESULT_ROWS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(RESULT_ROWS_SELECTOR).expect("invalid selector: result rows")
});

static DESCRIPTION_SPAN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span").expect("invalid selector: description span"));

/// Row selector cell, six data cells, two action cells
const MIN_TEXT_CELLS: usize = 9;
const LEADING_CELLS: usize = 1;

/// Parse every result row on a page, in document order
pub fn parse_results(html: &Html) -> Vec<Result<DeedRecord, ScrapeError>> {
    html.select(&RESULT_ROWS).map(parse_row).collect()
}

pub fn parse_row(row: ElementRef) -> Result<DeedRecord, ScrapeError> {
    let cells = text_cells(row);
    if cells.len() < MIN_TEXT_CELLS {
        return Err(ScrapeError::MalformedRow {
            reason: format!(
                "expected at least {} text cells, found {}",
                MIN_TEXT_CELLS,
                cells.len()
            ),
            raw: row.html(),
        });
    }

    let raw_description = row
        .select(&DESCRIPTION_SPAN)
        .next()
        .map(|span| span.text().collect::<String>())
        .ok_or_else(|| ScrapeError::MalformedRow {
            reason: "no description span".to_string(),
            raw: row.html(),
        })?;

    let fields = &cells[LEADING_CELLS..];
    let parsed = parse_description(&raw_description);

    Ok(DeedRecord {
        date: fields[0].clone(),
        document_type: fields[1].clone(),
        book: fields[2].clone(),
        page_number: fields[3].clone(),
        document_number: fields[4].clone(),
        city: fields[5].clone(),
        raw_description,
        cost: parsed.cost,
        street_address: parsed.street_address,
        state: None,
        zip: None,
    })
}

/// Direct text children of the row's own cells, trimmed. Cells holding only
/// markup (the description span, links) contribute nothing.
fn text_cells(row: ElementRef) -> Vec<String> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| cell.value().name() == "td")
        .flat_map(|cell| {
            cell.children()
                .filter_map(|node| node.value().as_text().map(|text| text.trim().to_string()))
                .collect::<Vec<_>>()
        })
        .collect()
}
