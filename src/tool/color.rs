use egui::Color32;

/// Parses `#rrggbb` or `#rrggbbaa` (leading `#` optional).
pub fn parse_hex(text: &str) -> Option<Color32> {
    let hex = text.trim().trim_start_matches('#');
    if !hex.is_ascii() || !(hex.len() == 6 || hex.len() == 8) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let (r, g, b) = (channel(0)?, channel(2)?, channel(4)?);
    let a = if hex.len() == 8 { channel(6)? } else { 255 };
    Some(Color32::from_rgba_unmultiplied(r, g, b, a))
}

/// Formats as `#rrggbb`, or `#rrggbbaa` when not opaque.
pub fn to_hex(color: Color32) -> String {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    if a == 255 {
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    } else {
        format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
    }
}

/// Serde adapter storing colours as hex strings.
pub mod hex {
    use egui::Color32;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(color: &Color32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_hex(*color))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color32, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_hex(&text).ok_or_else(|| D::Error::custom(format!("invalid colour: {text}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#000000"), Some(Color32::BLACK));
        assert_eq!(parse_hex("00ff00"), Some(Color32::from_rgb(0, 255, 0)));
        assert_eq!(
            parse_hex("#0000ff80"),
            Some(Color32::from_rgba_unmultiplied(0, 0, 255, 128))
        );
        assert_eq!(parse_hex("#12345"), None);
        assert_eq!(parse_hex("#gg0000"), None);
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(Color32::from_rgb(255, 16, 0)), "#ff1000");
        assert_eq!(to_hex(Color32::TRANSPARENT), "#00000000");
    }
}
