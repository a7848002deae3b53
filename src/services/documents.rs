// src/services/documents.rs

//! Document table extraction.
//!
//! Parses a case detail page's tables into the most recent activity date and
//! the set of documents published within a lookback window. Layout tables
//! are filtered out by shape: a document table has a header row of at least
//! three columns and at least one data row. Column 0 carries the publication
//! date, column 2 the document name and link.

use chrono::NaiveDate;
use scraper::{ElementRef, Html};

use crate::error::Result;
use crate::models::{CaseActivity, DocumentRecord};
use crate::services::parse_selector;

/// Date formats accepted in the date column, tried in order.
const DATE_FORMATS: [&str; 2] = ["%d %B %Y", "%d %b %Y"];

/// Extract activity from a detail page.
///
/// `today` is the reference date for the lookback window; it is passed in so
/// every case in a run shares one window and the extraction is deterministic
/// under test. Rows whose date text parses under neither accepted format are
/// skipped and contribute to neither output.
pub fn extract(
    html: &str,
    case_url: &str,
    today: NaiveDate,
    lookback_days: i64,
) -> Result<CaseActivity> {
    let document = Html::parse_document(html);
    let table_sel = parse_selector("table")?;
    let row_sel = parse_selector("tr")?;
    let cell_sel = parse_selector("td, th")?;
    let anchor_sel = parse_selector("a[href]")?;

    let mut activity = CaseActivity::empty(case_url);

    for table in document.select(&table_sel) {
        let rows: Vec<ElementRef> = table.select(&row_sel).collect();
        if rows.len() < 2 {
            continue;
        }
        if rows[0].select(&cell_sel).count() < 3 {
            continue;
        }

        for row in &rows[1..] {
            let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
            if cells.len() < 3 {
                continue;
            }

            let date_text = cell_text(&cells[0]);
            let Some(published) = parse_row_date(&date_text) else {
                log::debug!("Skipping row with unparseable date: {:?}", date_text);
                continue;
            };

            if activity.most_recent.map_or(true, |d| published > d) {
                activity.most_recent = Some(published);
            }

            if (today - published).num_days() <= lookback_days {
                let name = cell_text(&cells[2]);
                let url = cells[2]
                    .select(&anchor_sel)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .map(str::to_string);
                activity
                    .recent_documents
                    .push(DocumentRecord { name, url, published });
            }
        }
    }

    Ok(activity)
}

fn parse_row_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

fn cell_text(cell: &ElementRef) -> String {
    let raw: String = cell.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
