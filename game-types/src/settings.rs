use serde::{Deserialize, Serialize};

/// Size of the corridor in which objects in front of the player fade out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum XRaySize {
    Off = 0,
    Small = 1,
    #[default]
    Medium = 2,
    Large = 3,
}

impl XRaySize {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Off,
            1 => Self::Small,
            3 => Self::Large,
            _ => Self::Medium,
        }
    }

    /// Scale applied to the corridor tolerance. Zero disables the corridor.
    pub fn corridor_multiplier(self) -> f32 {
        match self {
            Self::Off => 0.0,
            Self::Small => 1.0,
            Self::Medium => 1.5,
            Self::Large => 2.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Small => "Small",
            Self::Medium => "Medium",
            Self::Large => "Large",
        }
    }
}

/// RGBA color stored as `0xRRGGBBAA`, written as a `#rrggbbaa` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HexColor(pub u32);

impl HexColor {
    pub const WHITE: HexColor = HexColor(0xffff_ffff);

    pub fn rgba(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl Serialize for HexColor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&format!("#{:08x}", self.0))
    }
}

impl<'de> Deserialize<'de> for HexColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let hex = s.strip_prefix('#').unwrap_or(&s);
        let value = match hex.len() {
            6 => u32::from_str_radix(hex, 16).map(|rgb| (rgb << 8) | 0xff),
            8 => u32::from_str_radix(hex, 16),
            _ => return Err(serde::de::Error::custom("Invalid color length")),
        };
        value
            .map(HexColor)
            .map_err(|_| serde::de::Error::custom("Invalid hex in color"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsSettings {
    pub xray_size: XRaySize,
    pub scale: f32,
    pub show_names: bool,
    pub name_color: HexColor,
    pub fog: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for GraphicsSettings {
    fn default() -> Self {
        Self {
            xray_size: XRaySize::default(),
            scale: 1.0,
            show_names: false,
            name_color: HexColor::WHITE,
            fog: true,
            viewport_width: 800,
            viewport_height: 600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_size_is_medium() {
        assert_eq!(XRaySize::from_u8(42), XRaySize::Medium);
        assert_eq!(XRaySize::from_u8(0).corridor_multiplier(), 0.0);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let settings: GraphicsSettings = toml::from_str("show_names = true").unwrap();
        assert!(settings.show_names);
        assert_eq!(settings.xray_size, XRaySize::Medium);
        assert_eq!(settings.viewport_width, 800);
    }

    #[test]
    fn colors_accept_short_form() {
        let settings: GraphicsSettings = toml::from_str("name_color = \"#ff8000\"").unwrap();
        assert_eq!(settings.name_color, HexColor(0xff80_00ff));
        assert_eq!(settings.name_color.rgba(), [0xff, 0x80, 0x00, 0xff]);
    }

    #[test]
    fn settings_survive_toml() {
        let settings = GraphicsSettings {
            xray_size: XRaySize::Large,
            name_color: HexColor(0x1020_30ff),
            ..Default::default()
        };
        let text = toml::to_string(&settings).unwrap();
        assert!(text.contains("name_color = \"#102030ff\""));
        let back: GraphicsSettings = toml::from_str(&text).unwrap();
        assert_eq!(back, settings);
    }
}
