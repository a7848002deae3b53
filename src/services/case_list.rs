// src/services/case_list.rs

//! Case listing extraction.
//!
//! Parses the registry's listing page into the ordered set of cases under
//! the "Open files:" section. The section is delimited by text markers, not
//! by structural markup, so extraction walks the parsed tree: find the label
//! text node, take its enclosing block, then scan following siblings for
//! list elements until the "Closed files:" marker appears.

use scraper::{ElementRef, Html, Node};

use crate::error::Result;
use crate::models::CaseLink;
use crate::services::parse_selector;

const OPEN_LABEL: &str = "Open files:";
const CLOSED_LABEL: &str = "Closed files:";

/// Extract (case name, case URL) pairs from the listing page markup.
///
/// Returns an empty vector when the "Open files:" label is missing; the
/// registry restructures its pages occasionally and that is not an error.
pub fn extract(html: &str) -> Result<Vec<CaseLink>> {
    let document = Html::parse_document(html);
    let anchor_sel = parse_selector("a[href]")?;

    let Some(label) = document
        .tree
        .root()
        .descendants()
        .find(|node| matches!(node.value(), Node::Text(text) if text.contains(OPEN_LABEL)))
    else {
        log::debug!("{:?} label not found in listing page", OPEN_LABEL);
        return Ok(Vec::new());
    };

    // The label text sits inside an inline emphasis tag, so the enclosing
    // block is the label's parent's parent.
    let Some(container) = label.parent().and_then(|p| p.parent()) else {
        return Ok(Vec::new());
    };

    let mut links = Vec::new();
    for sibling in container.next_siblings() {
        match sibling.value() {
            Node::Text(text) => {
                if text.contains(CLOSED_LABEL) {
                    break;
                }
            }
            Node::Element(element) => {
                let Some(elem) = ElementRef::wrap(sibling) else {
                    continue;
                };
                let rendered: String = elem.text().collect();
                if rendered.contains(CLOSED_LABEL) {
                    break;
                }
                if element.name() == "ul" {
                    for anchor in elem.select(&anchor_sel) {
                        let Some(href) = anchor.value().attr("href") else {
                            continue;
                        };
                        let name = anchor.text().collect::<String>().trim().to_string();
                        log::debug!("Found case link: {} -> {}", name, href);
                        links.push(CaseLink {
                            name,
                            url: href.to_string(),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
        <div id="content">
            <p><strong>Open files:</strong></p>
            <ul>
                <li><a href="/files/nsd1-2024">Smith v Jones</a></li>
                <li><a href="/files/nsd2-2024">Re Acme Pty Ltd</a></li>
            </ul>
            <ul>
                <li><a href="/files/vid3-2023">Doe v Roe</a></li>
            </ul>
            <p><strong>Closed files:</strong></p>
            <ul>
                <li><a href="/files/old1-2020">Archived One</a></li>
                <li><a href="/files/old2-2019">Archived Two</a></li>
            </ul>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_extract_stops_at_closed_marker() {
        let links = extract(LISTING).unwrap();
        assert_eq!(links.len(), 3);
        assert_eq!(links[0].name, "Smith v Jones");
        assert_eq!(links[0].url, "/files/nsd1-2024");
        assert_eq!(links[1].name, "Re Acme Pty Ltd");
        assert_eq!(links[2].name, "Doe v Roe");
    }

    #[test]
    fn test_extract_preserves_document_order() {
        let links = extract(LISTING).unwrap();
        let urls: Vec<&str> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["/files/nsd1-2024", "/files/nsd2-2024", "/files/vid3-2023"]
        );
    }

    #[test]
    fn test_missing_label_yields_empty() {
        let html = "<html><body><p>Nothing of interest here.</p></body></html>";
        assert!(extract(html).unwrap().is_empty());
    }

    #[test]
    fn test_non_list_siblings_are_ignored() {
        let html = r#"
            <div>
            <p><strong>Open files:</strong></p>
            <p>Some explanatory prose with <a href="/ignored">a link</a>.</p>
            <ul><li><a href="/files/a">Case A</a></li></ul>
            </div>
        "#;
        let links = extract(html).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "/files/a");
    }

    #[test]
    fn test_anchor_without_href_is_skipped() {
        let html = r#"
            <div>
            <p><strong>Open files:</strong></p>
            <ul><li><a>No target</a></li><li><a href="/files/b">Case B</a></li></ul>
            </div>
        "#;
        let links = extract(html).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].name, "Case B");
    }

    #[test]
    fn test_anchor_text_is_trimmed() {
        let html = r#"
            <div>
            <p><strong>Open files:</strong></p>
            <ul><li><a href="/files/c">
                Padded Case
            </a></li></ul>
            </div>
        "#;
        let links = extract(html).unwrap();
        assert_eq!(links[0].name, "Padded Case");
    }
}
