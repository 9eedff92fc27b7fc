use crawler::PageRecord;
use scraper::{ElementRef, Html, Node, Selector};

use crate::issue::Issue;

// Parsed, read-only view of one fetched page. Built synchronously right
// before analysis; the parsed document never crosses an await point.
pub struct PageView<'a> {
    pub record: &'a PageRecord,
    doc: Option<Html>,
    text: String,
    pub parse_issue: Option<Issue>,
}

impl<'a> PageView<'a> {
    pub fn build(record: &'a PageRecord) -> Self {
        let mut parse_issue = None;

        let html_like = match record.headers.get("content-type") {
            Some(ct) => ct.contains("html") || ct.contains("xhtml"),
            // No declared type: assume HTML and let parsing sort it out.
            None => true,
        };
        if !html_like {
            parse_issue = Some(Issue::warning(
                "parse_error",
                format!(
                    "Content type {:?} is not HTML, analysis is partial",
                    record.headers.get("content-type").map(String::as_str).unwrap_or("")
                ),
            ));
        }

        let doc = match &record.body {
            Some(body) if !body.trim().is_empty() => Some(Html::parse_document(body)),
            _ => {
                if parse_issue.is_none() {
                    parse_issue = Some(Issue::warning(
                        "parse_error",
                        "Response body is empty, analysis is partial",
                    ));
                }
                None
            }
        };

        let text = doc.as_ref().map(extract_text).unwrap_or_default();
        Self {
            record,
            doc,
            text,
            parse_issue,
        }
    }

    pub fn select(&self, selector: &str) -> Vec<ElementRef<'_>> {
        let Some(doc) = &self.doc else {
            return Vec::new();
        };
        match Selector::parse(selector) {
            Ok(selector) => doc.select(&selector).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn count(&self, selector: &str) -> usize {
        self.select(selector).len()
    }

    pub fn select_text(&self, selector: &str) -> Vec<String> {
        self.select(selector)
            .into_iter()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .collect()
    }

    pub fn select_attr(&self, selector: &str, attr: &str) -> Vec<String> {
        self.select(selector)
            .into_iter()
            .filter_map(|el| el.value().attr(attr).map(str::to_string))
            .collect()
    }

    pub fn first_text(&self, selector: &str) -> Option<String> {
        self.select_text(selector).into_iter().next()
    }

    pub fn first_attr(&self, selector: &str, attr: &str) -> Option<String> {
        self.select_attr(selector, attr).into_iter().next()
    }

    pub fn title(&self) -> Option<String> {
        self.first_text("head title").filter(|t| !t.is_empty())
    }

    // Visible text with scripts and styles stripped, whitespace folded.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    // Response header lookup; names are already lower-cased.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.record.headers.get(name).map(String::as_str)
    }

    pub fn is_https(&self) -> bool {
        self.record.final_url.scheme() == "https"
    }

    pub fn load_time_secs(&self) -> f64 {
        self.record.fetch_time.as_secs_f64()
    }

    pub fn raw_body(&self) -> &str {
        self.record.body.as_deref().unwrap_or("")
    }
}

fn extract_text(doc: &Html) -> String {
    let mut out = String::new();
    collect_text(&doc.root_element(), &mut out);
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(node: &ElementRef, out: &mut String) {
    if matches!(node.value().name(), "script" | "style" | "noscript") {
        return;
    }
    for child in node.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    collect_text(&element, out);
                }
            }
            _ => {}
        }
    }
}
