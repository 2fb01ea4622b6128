//! Pager row inspection
//!
//! The GridView pager renders the current page as a bare `<span>` and every
//! other reachable page (or a `...` jump) as a link in its own `<td>`. More
//! results exist iff some cell follows the one holding the span.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use crate::error::ScrapeError;
use crate::types::PageCursor;

pub const PAGER_ROW_SELECTOR: &str = "table#ctl00_cphMainContent_gvSearchResults tr.gridPager";

static PAGER_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(PAGER_ROW_SELECTOR).expect("invalid selector: pager row"));

static CURRENT_PAGE_MARKER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span").expect("invalid selector: current page marker"));

/// Read the cursor off the pager row. `None` when the grid has no pager,
/// which the GridView does when all results fit on one page.
pub fn inspect_pager(html: &Html) -> Result<Option<PageCursor>, ScrapeError> {
    let Some(pager) = html.select(&PAGER_ROW).next() else {
        return Ok(None);
    };
    cursor_from_pager(pager).map(Some)
}

fn cursor_from_pager(pager: ElementRef) -> Result<PageCursor, ScrapeError> {
    let marker = pager
        .select(&CURRENT_PAGE_MARKER)
        .next()
        .ok_or_else(|| ScrapeError::MalformedPager {
            reason: "no current page marker".to_string(),
        })?;

    let text = marker.text().collect::<String>();
    let text = text.trim();
    if text.is_empty() {
        return Err(ScrapeError::MalformedPager {
            reason: "current page marker has no page number".to_string(),
        });
    }
    let current_page: u32 = text.parse().map_err(|_| ScrapeError::MalformedPager {
        reason: format!("current page marker '{}' is not a page number", text),
    })?;

    let has_next_page = marker
        .parent()
        .map(|cell| {
            cell.next_siblings()
                .filter_map(ElementRef::wrap)
                .any(|sibling| sibling.value().name() == "td")
        })
        .unwrap_or(false);

    Ok(PageCursor {
        current_page,
        has_next_page,
    })
}
