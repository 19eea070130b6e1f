//! Inline `style` attribute handling for popup images.

use std::fmt;

/// Ordered CSS declarations, as found in an element's `style` attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineStyle {
    declarations: Vec<(String, String)>,
}

impl InlineStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `width:500px; height:375px; object-fit:fill;`.
    /// Entries without a colon are dropped; later duplicates overwrite earlier ones.
    pub fn parse(css_text: &str) -> Self {
        let mut style = Self::new();
        for decl in css_text.split(';') {
            if let Some((name, value)) = decl.split_once(':') {
                let name = name.trim();
                let value = value.trim();
                if !name.is_empty() {
                    style.set(name, value);
                }
            }
        }
        style
    }

    /// The pixel placeholder style used for photo popups.
    pub fn sized(width: f64, height: f64) -> Self {
        let mut style = Self::new();
        style.set_px("width", width);
        style.set_px("height", height);
        style.set("object-fit", "fill");
        style
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .declarations
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some((_, v)) => *v = value,
            None => self.declarations.push((name.to_ascii_lowercase(), value)),
        }
    }

    /// Numeric value of a length such as `375px` or `412.5px`.
    pub fn px(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(parse_px)
    }

    pub fn set_px(&mut self, name: &str, value: f64) {
        self.set(name, format!("{}px", value));
    }

    pub fn css_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for InlineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in &self.declarations {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}: {};", name, value)?;
            first = false;
        }
        Ok(())
    }
}

/// Reads the leading number of a CSS length, whatever its digit count.
pub fn parse_px(value: &str) -> Option<f64> {
    let value = value.trim();
    let end = value
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(value.len());
    let number = &value[..end];
    number.parse::<f64>().ok().filter(|n| n.is_finite())
}
