//! Keyword patterns for classifying block instances and layers

/// Block-name keywords that mark a door
pub const DOOR_NAME_KEYWORDS: &[&str] = &["DOOR", "Door", "door", "A-DOOR", "D-", "BAB", "باب"];

/// Layer-name keywords that mark a door
pub const DOOR_LAYER_KEYWORDS: &[&str] = &["DOOR", "A-DOOR", "Doors", "A-Doors", "باب", "A-BAB"];

/// Substring a room layer name must contain
pub const ROOM_LAYER_MUST_INCLUDE: &str = "tent";

/// Layer holding the site (office plot) boundary polylines
pub const SITE_BOUNDARY_LAYER: &str = "حد المكتب";

/// Layer of secondary entrance markers
pub const EXIT_LAYER: &str = "01Arc-Site-1-4-6-Exit";

/// Layer of main entrance markers
pub const ENTER_LAYER: &str = "01Arc-Site-1-4-5-Enter Arrow";

/// True if `text` contains any keyword, ignoring case
pub fn matches_any<S: AsRef<str>>(text: &str, keywords: &[S]) -> bool {
    let text_upper = text.to_uppercase();
    keywords
        .iter()
        .any(|k| text_upper.contains(&k.as_ref().to_uppercase()))
}

/// True if `layer` contains `needle`, ignoring case
pub fn layer_contains(layer: &str, needle: &str) -> bool {
    layer.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_any_ignores_case() {
        assert!(matches_any("single-door-900", DOOR_NAME_KEYWORDS));
        assert!(matches_any("a-doors", DOOR_LAYER_KEYWORDS));
        assert!(!matches_any("WINDOW-1200", DOOR_NAME_KEYWORDS));
    }

    #[test]
    fn test_matches_any_arabic_keyword() {
        assert!(matches_any("باب رئيسي", DOOR_NAME_KEYWORDS));
    }

    #[test]
    fn test_matches_any_empty_inputs() {
        assert!(!matches_any("", DOOR_NAME_KEYWORDS));
        let none: &[&str] = &[];
        assert!(!matches_any("DOOR", none));
    }

    #[test]
    fn test_layer_contains_is_case_insensitive() {
        assert!(layer_contains("Room1-TENT", ROOM_LAYER_MUST_INCLUDE));
        assert!(layer_contains("Room1-tent", "Tent"));
        assert!(!layer_contains("Room1", ROOM_LAYER_MUST_INCLUDE));
    }
}
