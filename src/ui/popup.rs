use crate::{core::geo::LatLng, ui::present::html_to_text};

/// Feature details bubble anchored at a map position.
///
/// `content` holds the escaped HTML fragment produced by the presenter;
/// front ends that cannot render HTML use [`Popup::text`].
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub position: LatLng,
    pub content: String,
    /// Maximum rendered width in pixels
    pub max_width: f64,
}

impl Popup {
    pub fn new(position: LatLng, content: String, max_width: f64) -> Self {
        Self {
            position,
            content,
            max_width,
        }
    }

    /// Content as plain text, one line per `<br/>`
    pub fn text(&self) -> String {
        html_to_text(&self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_popup_text_strips_markup() {
        let popup = Popup::new(
            LatLng::new(35.8, -78.6),
            "<b>County:</b> Wake<br/><b>ID:</b> 92".to_string(),
            320.0,
        );
        assert_eq!(popup.text(), "County: Wake\nID: 92");
    }
}
