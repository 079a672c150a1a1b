use std::path::Path;

use crate::color::Rgb;

/// Value written to or read from a named option
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Color(Rgb),
}

impl ConfigValue {
    /// Get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as non-negative integer
    pub fn as_u64(&self) -> Option<u64> {
        self.as_i64().and_then(|v| u64::try_from(v).ok())
    }

    /// Get as float; integers widen
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(v) => Some(*v),
            ConfigValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get as color
    pub fn as_color(&self) -> Option<Rgb> {
        match self {
            ConfigValue::Color(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        ConfigValue::Bool(v)
    }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        ConfigValue::Integer(v)
    }
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self {
        ConfigValue::Float(v)
    }
}

impl From<Rgb> for ConfigValue {
    fn from(v: Rgb) -> Self {
        ConfigValue::Color(v)
    }
}

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(ConfigFormat::Json),
            Some("toml") => Some(ConfigFormat::Toml),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ConfigFormat::Json => "JSON",
            ConfigFormat::Toml => "TOML",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_value() {
        let bool_val = ConfigValue::Bool(true);
        assert_eq!(bool_val.as_bool(), Some(true));
        assert_eq!(bool_val.as_i64(), None);

        let int_val = ConfigValue::Integer(42);
        assert_eq!(int_val.as_i64(), Some(42));
        assert_eq!(int_val.as_u64(), Some(42));
        assert_eq!(int_val.as_f64(), Some(42.0));

        assert_eq!(ConfigValue::Integer(-1).as_u64(), None);
        assert_eq!(ConfigValue::Float(0.5).as_i64(), None);
        assert_eq!(ConfigValue::Color(Rgb::BLACK).as_color(), Some(Rgb::BLACK));
    }

    #[test]
    fn test_config_format_detection() {
        assert_eq!(ConfigFormat::from_path(Path::new("power.json")), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_path(Path::new("power.toml")), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_path(Path::new("power.yaml")), None);
        assert_eq!(ConfigFormat::from_path(Path::new("power")), None);
    }
}
