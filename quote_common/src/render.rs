//! HTML fragment rendering for a single quote.
//!
//! Used by the server for `created`/`updated` broadcasts and by clients for the
//! initial list, so both produce identical markup.
use crate::model::Quote;

/// Renders the list item for `quote`.
///
/// The root element carries the `quote_<id>` DOM id that `replace` and
/// `remove` directives target.
pub fn render_quote(quote: &Quote) -> String {
    format!(
        concat!(
            r#"<div id="{dom_id}" class="quote">"#,
            r#"<a class="quote__name" href="/quotes/{id}">{name}</a></div>"#,
        ),
        dom_id = quote.dom_id(),
        id = quote.id,
        name = escape_html(&quote.name),
    )
}

/// Escapes the five characters significant in HTML text and attributes.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CompanyId, QuoteId};
    use chrono::Utc;

    #[test]
    fn fragment_targets_dom_id_and_escapes_name() {
        let now = Utc::now();
        let quote = Quote {
            id: QuoteId(7),
            name: "<b>Tom & Jerry</b>".to_string(),
            company_id: CompanyId(1),
            created_at: now,
            updated_at: now,
        };
        let html = render_quote(&quote);
        assert!(html.starts_with(r#"<div id="quote_7" class="quote">"#));
        assert!(html.contains(r#"href="/quotes/7""#));
        assert!(html.contains("&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;"));
        assert!(!html.contains("<b>"));
    }
}
