//! Status colour tokens
//!
//! A status cell is reduced to one token from a fixed set so the renderer
//! can style it. Tokens come either from the colour palette below or from
//! a status badge outcome.

/// Colour names accepted from plain status text
pub const STATUS_PALETTE: [&str; 34] = [
    "blue",
    "red",
    "green",
    "yellow",
    "gray",
    "ash-gray",
    "silver",
    "brown",
    "orange",
    "tan",
    "light-brown",
    "bright-blue-2",
    "slate",
    "lime-green",
    "emerald",
    "violet",
    "mauve",
    "bright-pink",
    "pink",
    "black",
    "dark-red",
    "light-red",
    "dark-green",
    "light-green",
    "dark-blue",
    "light-blue",
    "dark-orange",
    "light-orange",
    "dark-pink",
    "light-pink",
    "dark-purple",
    "light-purple",
    "dark-yellow",
    "light-yellow",
];

/// Outcomes a status badge can carry, in match precedence
pub const BADGE_OUTCOMES: [&str; 4] = ["error", "success", "current", "complete"];

pub fn is_palette_color(token: &str) -> bool {
    STATUS_PALETTE.contains(&token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_no_duplicates() {
        let mut sorted = STATUS_PALETTE.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), STATUS_PALETTE.len());
    }

    #[test]
    fn palette_lookup() {
        assert!(is_palette_color("bright-blue-2"));
        assert!(!is_palette_color("Bright Blue 2"));
        assert!(!is_palette_color("success"));
    }
}
