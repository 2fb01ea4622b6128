//! Search-then-page-through state machine
//!
//! ```text
//! Start --fetch landing--> Searching --submit search--> Listing(1)
//! Listing(n) --pager has next, submit Page$n+1--> Listing(n+1)
//! Listing(n) --no next--> Done
//! ```
//!
//! Every submission is built from the response immediately before it. The
//! only thing carried from page to page is the page number.

use anyhow::{Context, Result};
use scraper::Html;
use tracing::{debug, error, info};

use crate::error::ScrapeError;
use crate::form::{FormState, Payload};
use crate::pager::inspect_pager;
use crate::record::parse_results;
use crate::sink::OutputSink;
use crate::transport::Transport;
use crate::types::{PageCursor, ScrapeSummary, SearchCriteria};

enum State {
    Start,
    Searching(Payload),
    Listing { html: Html, page: u32 },
    Done,
}

pub struct PaginationController<'a> {
    search_url: &'a str,
    criteria: &'a SearchCriteria,
    resume_page: u32,
}

impl<'a> PaginationController<'a> {
    pub fn new(search_url: &'a str, criteria: &'a SearchCriteria) -> Self {
        Self {
            search_url,
            criteria,
            resume_page: 1,
        }
    }

    /// Walk pages before `page` without emitting their rows. The token chain
    /// still has to be followed from page 1 to get there.
    pub fn resume_from(mut self, page: u32) -> Self {
        self.resume_page = page.max(1);
        self
    }

    /// Run to completion. Records appended before a failure stay appended.
    pub fn run<T, S>(&self, transport: &mut T, sink: &mut S) -> Result<ScrapeSummary>
    where
        T: Transport + ?Sized,
        S: OutputSink + ?Sized,
    {
        let mut summary = ScrapeSummary::default();
        let mut state = State::Start;

        loop {
            state = match state {
                State::Start => {
                    let body = transport.fetch(self.search_url)?;
                    let landing = Html::parse_document(&body);
                    let form = FormState::extract(&landing, self.criteria)?;
                    State::Searching(form.search_submission(self.criteria))
                }
                State::Searching(payload) => {
                    let html = self.submit(transport, &payload, &mut summary)?;
                    State::Listing { html, page: 1 }
                }
                State::Listing { html, page } => {
                    self.list_page(html, page, transport, sink, &mut summary)?
                }
                State::Done => break,
            };
        }

        info!(
            pages = summary.pages_visited,
            records = summary.records_written,
            "Pagination done"
        );
        Ok(summary)
    }

    fn list_page<T, S>(
        &self,
        html: Html,
        page: u32,
        transport: &mut T,
        sink: &mut S,
        summary: &mut ScrapeSummary,
    ) -> Result<State>
    where
        T: Transport + ?Sized,
        S: OutputSink + ?Sized,
    {
        summary.pages_visited += 1;

        // A wrong or unreadable page must fail before any of its rows are stored
        let cursor = inspect_pager(&html)?;
        if let Some(cursor) = cursor {
            if cursor.current_page != page {
                return Err(ScrapeError::PageOutOfSequence {
                    expected: page,
                    found: cursor.current_page,
                }
                .into());
            }
        }

        if page >= self.resume_page {
            let mut written = 0;
            for row in parse_results(&html) {
                let record = match row {
                    Ok(record) => record,
                    Err(e) => {
                        if let ScrapeError::MalformedRow { reason, raw } = &e {
                            error!(page, reason = %reason, raw = %raw, "Malformed result row");
                        }
                        return Err(e.into());
                    }
                };
                sink.append(&record).with_context(|| {
                    format!(
                        "Failed to write record {} from page {}",
                        record.document_number, page
                    )
                })?;
                written += 1;
            }
            summary.records_written += written;
            info!(page, records = written, "Listed page");
        } else {
            debug!(page, resume_page = self.resume_page, "Skipping rows before resume page");
        }

        match cursor {
            Some(PageCursor {
                has_next_page: true,
                ..
            }) => {
                let next = page + 1;
                let form = FormState::extract(&html, self.criteria)?;
                let payload = form.page_submission(self.criteria, next);
                debug!(page = next, "Requesting next page");
                let html = self.submit(transport, &payload, summary)?;
                Ok(State::Listing { html, page: next })
            }
            _ => Ok(State::Done),
        }
    }

    fn submit<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        payload: &Payload,
        summary: &mut ScrapeSummary,
    ) -> Result<Html> {
        summary.submissions += 1;
        let body = transport.submit(self.search_url, payload)?;
        Ok(Html::parse_document(&body))
    }
}
