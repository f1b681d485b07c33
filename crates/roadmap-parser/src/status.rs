//! Status cell classification

use std::sync::OnceLock;

use regex::Regex;
use roadmap_core::{is_palette_color, BADGE_OUTCOMES};

use crate::dom::Element;

const BADGE_CLASS: &str = "aui-lozenge";
const INLINE_MACRO_CLASS: &str = "editor-inline-macro";

fn colour_param_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"colour=([a-zA-Z]+)").expect("valid colour regex"))
}

/// Lower-case, trim, spaces to hyphens
fn format_color(text: &str) -> String {
    text.trim().to_lowercase().replace(' ', "-")
}

/// Map a status cell to a colour token, or an empty string.
///
/// Precedence: status badge outcome, then an inline status macro's
/// `colour=` parameter, then the cell text against the palette.
pub fn parse_status(cell: Option<&Element>) -> String {
    let Some(cell) = cell else {
        return String::new();
    };

    let badges = cell.find_all(|e| e.has_class(BADGE_CLASS));
    for outcome in BADGE_OUTCOMES {
        let class = format!("{}-{}", BADGE_CLASS, outcome);
        if badges.iter().any(|b| b.has_class(&class)) {
            return outcome.to_string();
        }
    }

    if let Some(first) = cell.child_elements().next() {
        if first.is("img") && first.has_class(INLINE_MACRO_CLASS) {
            let colour = first
                .attr("data-macro-parameters")
                .and_then(|params| colour_param_regex().captures(params));
            if let Some(caps) = colour {
                return caps[1].to_lowercase();
            }
        }
    }

    let formatted = format_color(&cell.text());
    if is_palette_color(&formatted) {
        formatted
    } else {
        String::new()
    }
}
