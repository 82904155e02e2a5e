//! Feature presenter
//!
//! Turns a feature's attributes into the HTML fragment shown in the popup
//! and the feature panel. Attribute values come from downloaded documents,
//! so every one of them is escaped before it is placed into markup.

use crate::{data::geojson::Properties, layers::kind::LayerKind};
use serde_json::Value;

/// Escapes the five markup-significant characters
pub fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// HTML fragment describing one feature of `kind`
pub fn feature_html(kind: LayerKind, properties: &Properties) -> String {
    let attr = |key: &str| html_escape(&display_value(properties.get(key)));
    let either = |key: &str, fallback: &str| {
        let value = properties.get(key).filter(|v| is_truthy(v));
        html_escape(&display_value(value.or_else(|| properties.get(fallback))))
    };

    match kind {
        LayerKind::Counties => format!(
            "<b>County:</b> {}<br/><b>ID:</b> {}",
            attr("name"),
            attr("county_id")
        ),
        LayerKind::Precincts => format!(
            "<b>Precinct:</b> {}<br/><b>ID:</b> {}<br/><b>County:</b> {} ({})",
            either("name", "enr_desc"),
            attr("prec_id"),
            attr("county_name"),
            attr("county_id")
        ),
        LayerKind::House | LayerKind::Senate | LayerKind::Congress => format!(
            "<b>{} District:</b> {}",
            capitalize(kind.id()),
            either("name", "district")
        ),
    }
}

/// Plain-text rendering of a presenter fragment.
///
/// `<br/>` becomes a line break, other tags are dropped and the escapes
/// produced by [`html_escape`] are decoded.
pub fn html_to_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(start) = rest.find('<') {
        text.push_str(&rest[..start]);
        let Some(len) = rest[start..].find('>') else {
            rest = &rest[start..];
            break;
        };
        let tag = &rest[start + 1..start + len];
        if tag.trim_end_matches('/').trim().eq_ignore_ascii_case("br") {
            text.push('\n');
        }
        rest = &rest[start + len + 1..];
    }
    text.push_str(rest);

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// String form of an attribute; missing and null render empty
fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                // Whole floats print without a fraction, 92.0 -> "92"
                n.as_f64().map(|f| f.to_string()).unwrap_or_default()
            }
        }
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| display_value(Some(item)))
            .collect::<Vec<_>>()
            .join(","),
        Some(object @ Value::Object(_)) => object.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Properties {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_escape_all_special_characters() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
        assert_eq!(html_escape("Wake"), "Wake");
    }

    #[test]
    fn test_county_template() {
        let html = feature_html(
            LayerKind::Counties,
            &props(json!({"name": "Wake", "county_id": "92"})),
        );
        assert_eq!(html, "<b>County:</b> Wake<br/><b>ID:</b> 92");

        let text = html_to_text(&html);
        assert!(text.contains("County: Wake"));
        assert!(text.contains("ID: 92"));
    }

    #[test]
    fn test_numbers_render_like_script_values() {
        let html = feature_html(
            LayerKind::Counties,
            &props(json!({"name": "Wake", "county_id": 92.0})),
        );
        assert!(html.ends_with("<b>ID:</b> 92"));

        let html = feature_html(LayerKind::Counties, &props(json!({"county_id": 92.5})));
        assert!(html.ends_with("<b>ID:</b> 92.5"));
    }

    #[test]
    fn test_missing_and_null_render_empty() {
        let html = feature_html(LayerKind::Counties, &props(json!({"name": null})));
        assert_eq!(html, "<b>County:</b> <br/><b>ID:</b> ");
    }

    #[test]
    fn test_precinct_falls_back_to_description() {
        let html = feature_html(
            LayerKind::Precincts,
            &props(json!({
                "name": "",
                "enr_desc": "01-07",
                "prec_id": "01-07",
                "county_name": "WAKE",
                "county_id": 92
            })),
        );
        assert_eq!(
            html,
            "<b>Precinct:</b> 01-07<br/><b>ID:</b> 01-07<br/><b>County:</b> WAKE (92)"
        );
    }

    #[test]
    fn test_district_templates() {
        let html = feature_html(LayerKind::House, &props(json!({"district": 0})));
        assert_eq!(html, "<b>House District:</b> 0");

        let html = feature_html(
            LayerKind::Congress,
            &props(json!({"name": "District 4", "district": 4})),
        );
        assert_eq!(html, "<b>Congress District:</b> District 4");

        let html = feature_html(LayerKind::Senate, &props(json!({"district": 16})));
        assert_eq!(html, "<b>Senate District:</b> 16");
    }

    #[test]
    fn test_markup_in_attributes_stays_literal() {
        let html = feature_html(
            LayerKind::Counties,
            &props(json!({"name": "<script>alert(1)</script>", "county_id": "1"})),
        );
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html_to_text(&html).contains("County: <script>alert(1)</script>"));
    }

    #[test]
    fn test_html_to_text_decodes_ampersand_last() {
        assert_eq!(html_to_text("a &amp;lt; b"), "a &lt; b");
        assert_eq!(html_to_text("<b>x</b><br/>y<br>z"), "x\ny\nz");
    }
}
