use crate::constants::{SMALL_SCREEN_MESSAGE, SMALL_SCREEN_WIDTH};

/// One-shot startup check: warns once through `notify` when the screen is too
/// narrow for the popups. Returns the message that was shown, if any.
pub fn small_screen_advisory(screen_width: f64, notify: impl FnOnce(&str)) -> Option<&'static str> {
    if screen_width < SMALL_SCREEN_WIDTH {
        notify(SMALL_SCREEN_MESSAGE);
        Some(SMALL_SCREEN_MESSAGE)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warns_only_below_threshold() {
        let mut shown = Vec::new();
        assert_eq!(
            small_screen_advisory(499.0, |m| shown.push(m.to_string())),
            Some("This map works best on large screens.")
        );
        assert_eq!(small_screen_advisory(500.0, |m| shown.push(m.to_string())), None);
        assert_eq!(small_screen_advisory(1920.0, |m| shown.push(m.to_string())), None);
        assert_eq!(shown.len(), 1);
    }
}
