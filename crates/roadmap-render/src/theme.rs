//! Colours and fonts for the SVG chart

use std::collections::HashMap;

/// Fill per status token, palette names first, badge outcomes last
const STATUS_FILLS: [(&str, &str); 38] = [
    ("blue", "#3572b0"),
    ("red", "#d04437"),
    ("green", "#14892c"),
    ("yellow", "#f6c342"),
    ("gray", "#999999"),
    ("ash-gray", "#cccccc"),
    ("silver", "#e0e0e0"),
    ("brown", "#815b3a"),
    ("orange", "#f79232"),
    ("tan", "#d2b48c"),
    ("light-brown", "#b38867"),
    ("bright-blue-2", "#59afe1"),
    ("slate", "#4a6785"),
    ("lime-green", "#8eb021"),
    ("emerald", "#3b7d3b"),
    ("violet", "#654982"),
    ("mauve", "#ac707a"),
    ("bright-pink", "#f15c75"),
    ("pink", "#f691b2"),
    ("black", "#333333"),
    ("dark-red", "#a13426"),
    ("light-red", "#ea9384"),
    ("dark-green", "#0e5c21"),
    ("light-green", "#a6d49a"),
    ("dark-blue", "#205081"),
    ("light-blue", "#9bc1e5"),
    ("dark-orange", "#c9611a"),
    ("light-orange", "#fbc17f"),
    ("dark-pink", "#c3527a"),
    ("light-pink", "#f9c6d7"),
    ("dark-purple", "#4b2f63"),
    ("light-purple", "#b7a2cd"),
    ("dark-yellow", "#cf9e1c"),
    ("light-yellow", "#fbe4a6"),
    ("error", "#d04437"),
    ("success", "#14892c"),
    ("current", "#4a6785"),
    ("complete", "#3572b0"),
];

/// Visual theme of the roadmap
#[derive(Clone, Debug, PartialEq)]
pub struct RoadmapTheme {
    pub status_fills: HashMap<String, String>,
    /// Fill for events without a status colour
    pub default_fill: String,
    pub background_color: String,
    pub text_color: String,
    /// Label colour inside bars
    pub bar_text_color: String,
    pub band_colors: (String, String),
    pub divider_color: String,
    pub axis_color: String,
    pub today_color: String,
    pub font_family: String,
    pub font_size: f64,
    /// Corner radius of duration bars
    pub bar_radius: f64,
}

impl Default for RoadmapTheme {
    fn default() -> Self {
        Self::light()
    }
}

impl RoadmapTheme {
    pub fn light() -> Self {
        Self {
            status_fills: STATUS_FILLS
                .iter()
                .map(|(token, fill)| (token.to_string(), fill.to_string()))
                .collect(),
            default_fill: "#707070".into(),
            background_color: "#ffffff".into(),
            text_color: "#333333".into(),
            bar_text_color: "#ffffff".into(),
            band_colors: ("#ffffff".into(), "#f5f5f5".into()),
            divider_color: "#cccccc".into(),
            axis_color: "#707070".into(),
            today_color: "#d04437".into(),
            font_family: "Arial, sans-serif".into(),
            font_size: 12.0,
            bar_radius: 4.0,
        }
    }

    /// Fill for a status token, falling back to the default fill
    pub fn status_fill(&self, token: &str) -> &str {
        self.status_fills
            .get(token)
            .map(String::as_str)
            .unwrap_or(&self.default_fill)
    }

    pub fn with_status_fill(mut self, token: &str, fill: &str) -> Self {
        self.status_fills.insert(token.to_string(), fill.to_string());
        self
    }
}
