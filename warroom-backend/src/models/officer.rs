use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Fallback embed color when nothing more specific applies (grey)
pub const DEFAULT_COLOR: u32 = 0x95A5A6;

/// Capability classes officers are grouped into
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumString, AsRefStr,
    Display,
)]
#[strum(ascii_case_insensitive)]
pub enum CapabilityClass {
    Strategic,
    Operational,
    Tactical,
    Support,
}

impl CapabilityClass {
    /// Embed color for the class
    pub fn color(&self) -> u32 {
        match self {
            CapabilityClass::Strategic => 0x9B59B6,   // purple
            CapabilityClass::Operational => 0x3498DB, // blue
            CapabilityClass::Tactical => 0x2ECC71,    // green
            CapabilityClass::Support => 0xF39C12,     // orange
        }
    }

    /// Color for a free-form class filter, grey when it names no known class
    pub fn color_for_filter(filter: Option<&str>) -> u32 {
        filter
            .and_then(|f| f.parse::<CapabilityClass>().ok())
            .map(|c| c.color())
            .unwrap_or(DEFAULT_COLOR)
    }

    /// Lowercase form used as a slash-command choice value
    pub fn choice_value(&self) -> String {
        self.as_ref().to_lowercase()
    }
}

/// A council member, as defined by the roster file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Officer {
    pub id: String,
    pub title: String,
    pub model: String,
    pub capability_class: CapabilityClass,
    pub specialty: String,
    pub system_prompt: String,
    /// Explicit display color; overrides the class color when set
    pub color: Option<u32>,
}

impl Officer {
    pub fn display_color(&self) -> u32 {
        self.color.unwrap_or_else(|| self.capability_class.color())
    }

    /// "O1 - Chief of Staff"
    pub fn label(&self) -> String {
        format!("{} - {}", self.id, self.title)
    }
}

/// Parse a hex color string. Accepts `0x`, `#` or bare hex digits.
pub fn parse_hex_color(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .or_else(|| trimmed.strip_prefix('#'))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn officer(class: CapabilityClass, color: Option<u32>) -> Officer {
        Officer {
            id: "T1".to_string(),
            title: "Test Officer Alpha".to_string(),
            model: "anthropic/claude-3-haiku".to_string(),
            capability_class: class,
            specialty: "Unit Testing".to_string(),
            system_prompt: "You are Test Officer Alpha.".to_string(),
            color,
        }
    }

    #[test]
    fn test_class_parse_is_case_insensitive() {
        assert_eq!("strategic".parse::<CapabilityClass>().unwrap(), CapabilityClass::Strategic);
        assert_eq!("SUPPORT".parse::<CapabilityClass>().unwrap(), CapabilityClass::Support);
        assert!("logistics".parse::<CapabilityClass>().is_err());
    }

    #[test]
    fn test_class_colors() {
        assert_eq!(officer(CapabilityClass::Strategic, None).display_color(), 0x9B59B6);
        assert_eq!(officer(CapabilityClass::Operational, None).display_color(), 0x3498DB);
        assert_eq!(officer(CapabilityClass::Tactical, None).display_color(), 0x2ECC71);
        assert_eq!(officer(CapabilityClass::Support, None).display_color(), 0xF39C12);
    }

    #[test]
    fn test_explicit_color_overrides_class() {
        assert_eq!(officer(CapabilityClass::Support, Some(0x123456)).display_color(), 0x123456);
    }

    #[test]
    fn test_filter_color_falls_back_to_grey() {
        assert_eq!(CapabilityClass::color_for_filter(Some("tactical")), 0x2ECC71);
        assert_eq!(CapabilityClass::color_for_filter(Some("unknown")), DEFAULT_COLOR);
        assert_eq!(CapabilityClass::color_for_filter(None), DEFAULT_COLOR);
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("0xaabbcc"), Some(0xAABBCC));
        assert_eq!(parse_hex_color("#FF0000"), Some(0xFF0000));
        assert_eq!(parse_hex_color("123456"), Some(0x123456));
        assert_eq!(parse_hex_color("0x"), None);
        assert_eq!(parse_hex_color("purple"), None);
    }
}
