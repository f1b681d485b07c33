//! Text fitting and path helpers

use roadmap_core::TextMetrics;

/// Space kept free around a label inside its bar
pub const TRUNCATE_PADDING: f64 = 12.0;

/// Split `text` into lines no wider than `width`.
///
/// A single word wider than `width` gets a line of its own.
pub fn wrap_words(text: &str, width: f64, font_size: f64, metrics: &dyn TextMetrics) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", line, word)
        };
        if !line.is_empty() && metrics.text_width(&candidate, font_size) > width {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        } else {
            line = candidate;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Drop trailing characters until the label fits `width` with padding
pub fn truncate_to_width(text: &str, width: f64, font_size: f64, metrics: &dyn TextMetrics) -> String {
    let mut label = text.to_string();
    while !label.is_empty() && metrics.text_width(&label, font_size) + TRUNCATE_PADDING > width {
        label.pop();
    }
    label
}

/// Rectangle path with optional rounding of the left and right corners
pub fn bar_path(x: f64, y: f64, width: f64, height: f64, radius: f64, round_left: bool, round_right: bool) -> String {
    let left = if round_left { radius } else { 0.0 };
    let right = if round_right { radius } else { 0.0 };
    let flat = width - left - right;

    let mut d = format!("M{},{}h{}", x + left, y, flat);
    if right > 0.0 {
        d.push_str(&format!("a{r},{r} 0 0 1 {r},{r}", r = right));
    }
    d.push_str(&format!("v{}", height - right * 2.0));
    if right > 0.0 {
        d.push_str(&format!("a{r},{r} 0 0 1 {},{r}", -right, r = right));
    }
    d.push_str(&format!("h{}", -flat));
    if left > 0.0 {
        d.push_str(&format!("a{r},{r} 0 0 1 {},{}", -left, -left, r = left));
    }
    d.push_str(&format!("v{}", -(height - left * 2.0)));
    if left > 0.0 {
        d.push_str(&format!("a{r},{r} 0 0 1 {r},{}", -left, r = left));
    }
    d.push('z');
    d
}
