//! Locating JSON payloads embedded in markup
//!
//! Several sites ship their listing data inside script-tag text, introduced
//! by a literal prefix (`Data = `, `VMS =`, `DATA__=`). The payload is sliced
//! out by that convention and parsed independently of the surrounding
//! document. A parse failure yields `None` for the entire payload.

use serde_json::Value;

/// A site's literal delimiter convention for an embedded payload
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedJson {
    /// Literal text immediately preceding the payload; the last occurrence wins
    prefix: &'static str,

    /// Optional cut point with the text to restore after cutting
    ///
    /// bringatrailer's listing array ends in `];` followed by more script, so
    /// the slice cuts at `];` and restores the `]` the cut removed.
    terminator: Option<(&'static str, &'static str)>,
}

impl EmbeddedJson {
    /// A payload running from `prefix` to the end of the script text
    pub const fn after(prefix: &'static str) -> Self {
        Self {
            prefix,
            terminator: None,
        }
    }

    /// A payload cut at `cut`, with `restore` re-appended
    pub const fn between(prefix: &'static str, cut: &'static str, restore: &'static str) -> Self {
        Self {
            prefix,
            terminator: Some((cut, restore)),
        }
    }

    /// Slices the raw payload text out of `text`, or `None` if the prefix
    /// (or terminator) convention is not present
    pub fn slice(&self, text: &str) -> Option<String> {
        let start = text.rfind(self.prefix)? + self.prefix.len();
        let rest = &text[start..];
        match self.terminator {
            Some((cut, restore)) => {
                let end = rest.find(cut)?;
                Some(format!("{}{}", &rest[..end], restore))
            }
            None => Some(rest.trim().trim_end_matches(';').to_string()),
        }
    }

    /// Slices and decodes the payload; any decode failure is `None`
    pub fn parse(&self, text: &str) -> Option<Value> {
        let payload = self.slice(text)?;
        serde_json::from_str(&payload).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_after_prefix_to_end() {
        let script = "window.__DATA__={\"id\": 7}";
        let located = EmbeddedJson::after("DATA__=");
        assert_eq!(located.parse(script), Some(json!({"id": 7})));
    }

    #[test]
    fn test_trailing_semicolon_stripped() {
        let script = "var VMS ={\"comments\": []}  ;  ";
        let located = EmbeddedJson::after("VMS =");
        // trailing whitespace then semicolon
        assert_eq!(
            located.slice(script).as_deref().map(str::trim),
            Some("{\"comments\": []}")
        );
    }

    #[test]
    fn test_cut_and_restore() {
        let script = "var auctionsData = [{\"url\": \"https://x/1\"}];\nvar other = 1;";
        let located = EmbeddedJson::between("Data = ", "];", "]");
        assert_eq!(
            located.parse(script),
            Some(json!([{"url": "https://x/1"}]))
        );
    }

    #[test]
    fn test_last_occurrence_of_prefix_wins() {
        let script = "// Data = bogus\nvar listData = [1, 2];";
        let located = EmbeddedJson::between("Data = ", "];", "]");
        assert_eq!(located.parse(script), Some(json!([1, 2])));
    }

    #[test]
    fn test_missing_prefix_is_none() {
        let located = EmbeddedJson::after("DATA__=");
        assert_eq!(located.parse("no payload here"), None);
    }

    #[test]
    fn test_malformed_payload_is_none() {
        let located = EmbeddedJson::after("DATA__=");
        assert_eq!(located.parse("DATA__={not json"), None);
    }
}
