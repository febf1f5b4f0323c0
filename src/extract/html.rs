//! Selector helpers over parsed markup
//!
//! Thin wrappers around the `scraper` crate covering the recurring lookup
//! shapes of the site recipes: first-match text, label/value tables, text
//! following a label element, and a four-digit year scan. A selector miss is
//! always `None` or empty, never an error.

use scraper::{ElementRef, Html, Selector};

/// Collected text of the first element matching `selector`, if non-empty
pub fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(collect_text)
        .filter(|t| !t.is_empty())
}

/// Collected text of every element matching `selector`
pub fn all_text(document: &Html, selector: &str) -> Vec<String> {
    let selector = match Selector::parse(selector) {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    document.select(&selector).map(collect_text).collect()
}

/// Attribute value of the first element matching `selector`
pub fn attr(document: &Html, selector: &str, name: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr(name))
        .map(|v| v.to_string())
}

/// True when at least one element matches `selector`
pub fn exists(document: &Html, selector: &str) -> bool {
    Selector::parse(selector)
        .map(|s| document.select(&s).next().is_some())
        .unwrap_or(false)
}

/// Value of a quick-facts style key/value panel
///
/// Finds the `<dt>` under `dt_selector` whose text contains `label` and
/// returns the text of its following `<dd>`.
pub fn quick_fact(document: &Html, dt_selector: &str, label: &str) -> Option<String> {
    let selector = Selector::parse(dt_selector).ok()?;
    for dt in document.select(&selector) {
        if !collect_text(dt).contains(label) {
            continue;
        }
        for sibling in dt.next_siblings() {
            if let Some(element) = ElementRef::wrap(sibling) {
                if element.value().name() == "dd" {
                    let text = collect_text(element);
                    if text.is_empty() {
                        return None;
                    }
                    return Some(text);
                }
            }
        }
    }
    None
}

/// Zips the `<dt>` labels and `<dd>` values of a description list
pub fn label_value_pairs(document: &Html, dl_selector: &str) -> Vec<(String, String)> {
    let dt_selector = match Selector::parse(&format!("{} dt", dl_selector)) {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    let dd_selector = match Selector::parse(&format!("{} dd", dl_selector)) {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let labels = document.select(&dt_selector).map(collect_text);
    let values = document.select(&dd_selector).map(collect_text);
    labels.zip(values).collect()
}

/// Text immediately following the first element matching `selector` whose
/// text contains `label`
///
/// Covers the `<strong>Make</strong> Porsche` essentials layout: the value is
/// either a bare text node or a following element such as a link.
pub fn text_after_label(document: &Html, selector: &str, label: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    for element in document.select(&selector) {
        if !collect_text(element).contains(label) {
            continue;
        }
        for sibling in element.next_siblings() {
            if let Some(text) = sibling.value().as_text() {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
            if let Some(element) = ElementRef::wrap(sibling) {
                let text = collect_text(element);
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
        return None;
    }
    None
}

/// First run of four consecutive ASCII digits in `text`, e.g. the model year
/// in a page title
pub fn first_year(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut run = 0;
    for (i, b) in bytes.iter().enumerate() {
        if b.is_ascii_digit() {
            run += 1;
            if run == 4 {
                // Reject longer digit runs (VINs, ids)
                if i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit() {
                    run = 0;
                    continue;
                }
                return Some(text[i - 3..=i].to_string());
            }
        } else {
            run = 0;
        }
    }
    None
}

/// Strips markup out of an HTML fragment, leaving its text content
pub fn strip_tags(markup: &str) -> String {
    let fragment = Html::parse_fragment(markup);
    fragment.root_element().text().collect::<String>()
}

fn collect_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_text() {
        let doc = Html::parse_document("<div class='price'><span>$42,000</span></div>");
        assert_eq!(first_text(&doc, "div.price"), Some("$42,000".to_string()));
        assert_eq!(first_text(&doc, "div.absent"), None);
    }

    #[test]
    fn test_attr() {
        let doc = Html::parse_document("<div class='badge' data-payload='{\"a\":1}'></div>");
        assert_eq!(
            attr(&doc, "div.badge", "data-payload"),
            Some("{\"a\":1}".to_string())
        );
        assert_eq!(attr(&doc, "div.badge", "data-missing"), None);
    }

    #[test]
    fn test_quick_fact_lookup() {
        let doc = Html::parse_document(
            r#"<div class="quick-facts"><dl>
                <dt>Engine</dt><dd>3.0L Flat-6</dd>
                <dt>Mileage</dt><dd>42,000</dd>
            </dl></div>"#,
        );
        assert_eq!(
            quick_fact(&doc, "div.quick-facts dl dt", "Engine"),
            Some("3.0L Flat-6".to_string())
        );
        assert_eq!(
            quick_fact(&doc, "div.quick-facts dl dt", "Mileage"),
            Some("42,000".to_string())
        );
        assert_eq!(quick_fact(&doc, "div.quick-facts dl dt", "VIN"), None);
    }

    #[test]
    fn test_label_value_pairs() {
        let doc = Html::parse_document(
            r#"<dl class="fancy-description-list">
                <dt>Drivetrain</dt><dd>AWD</dd>
                <dt>Exterior color</dt><dd>Silver</dd>
            </dl>"#,
        );
        let pairs = label_value_pairs(&doc, "dl.fancy-description-list");
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], ("Drivetrain".to_string(), "AWD".to_string()));
        assert_eq!(pairs[1].1, "Silver");
    }

    #[test]
    fn test_text_after_label_text_node() {
        let doc = Html::parse_document("<p><strong>Make</strong> Porsche</p>");
        assert_eq!(
            text_after_label(&doc, "strong", "Make"),
            Some("Porsche".to_string())
        );
    }

    #[test]
    fn test_text_after_label_element() {
        let doc =
            Html::parse_document("<p><strong>Seller:</strong> <a href='/u/1'>garage99</a></p>");
        assert_eq!(
            text_after_label(&doc, "strong", "Seller"),
            Some("garage99".to_string())
        );
    }

    #[test]
    fn test_first_year() {
        assert_eq!(
            first_year("1987 Porsche 911 Carrera"),
            Some("1987".to_string())
        );
        assert_eq!(first_year("Sold for $20,500 on 2/3/23"), None);
        // Five-digit runs are not years
        assert_eq!(first_year("lot 12345 no year"), None);
        assert_eq!(first_year("lot 12345 from 1996"), Some("1996".to_string()));
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_tags("<p>Great <b>car</b>, clean title</p>"),
            "Great car, clean title"
        );
    }
}
