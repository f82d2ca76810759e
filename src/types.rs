//! Core value types shared by the manager, the tray and the display backends

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use crate::constants::resolutions::DISPLAY_REFRESH_FALLBACK;
use crate::error::{ManagerError, ManagerResult};

/// `WxH` or `WxH@R`, the canonical identity of a resolution
static SIGNATURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)x(\d+)(?:@(\d+))?$").expect("SIGNATURE_RE is a valid static regex pattern")
});

/// A display mode. Two resolutions are the same entity iff their signatures match,
/// so `1920x1080` and `1920x1080@60` are distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ResolutionInput")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_rate: Option<u32>,
}

impl Resolution {
    /// Validated constructor. A refresh rate of 0 means "unspecified".
    pub fn new(width: u32, height: u32, refresh_rate: Option<u32>) -> ManagerResult<Self> {
        if width == 0 {
            return Err(ManagerError::validation("width must be a positive integer"));
        }
        if height == 0 {
            return Err(ManagerError::validation("height must be a positive integer"));
        }
        Ok(Self {
            width,
            height,
            refresh_rate: refresh_rate.filter(|r| *r > 0),
        })
    }

    /// Parse raw form fields. An empty refresh field means "unspecified".
    pub fn from_form(width: &str, height: &str, refresh_rate: &str) -> ManagerResult<Self> {
        ResolutionInput {
            width: LooseNumber::Text(width.to_string()),
            height: LooseNumber::Text(height.to_string()),
            refresh_rate: Some(LooseNumber::Text(refresh_rate.to_string())),
        }
        .try_into()
    }

    /// Parse a `WxH` / `WxH@R` signature
    pub fn from_signature(signature: &str) -> ManagerResult<Self> {
        let caps = SIGNATURE_RE.captures(signature).ok_or_else(|| {
            ManagerError::validation(format!("'{signature}' is not a resolution signature"))
        })?;
        let number = |idx: usize| -> ManagerResult<Option<u32>> {
            caps.get(idx)
                .map(|m| {
                    m.as_str().parse::<u32>().map_err(|_| {
                        ManagerError::validation(format!("'{signature}' is out of range"))
                    })
                })
                .transpose()
        };
        let width = number(1)?.unwrap_or_default();
        let height = number(2)?.unwrap_or_default();
        Self::new(width, height, number(3)?)
    }

    /// Canonical identity string
    pub fn signature(&self) -> String {
        match self.refresh_rate {
            Some(rate) => format!("{}x{}@{}", self.width, self.height, rate),
            None => format!("{}x{}", self.width, self.height),
        }
    }

    /// Label used for tray menu items, e.g. `1920x1080 @ 60Hz`
    pub fn menu_label(&self) -> String {
        format!(
            "{}x{} @ {}Hz",
            self.width,
            self.height,
            self.refresh_rate.unwrap_or(DISPLAY_REFRESH_FALLBACK)
        )
    }

    /// (width, height, refresh-or-0)
    pub fn sort_key(&self) -> (u32, u32, u32) {
        (self.width, self.height, self.refresh_rate.unwrap_or(0))
    }

    /// Catalog ordering: width, height, then refresh rate, all descending
    pub fn cmp_descending(&self, other: &Self) -> Ordering {
        other.sort_key().cmp(&self.sort_key())
    }

    /// Same width and height, ignoring the refresh rate
    pub fn same_size(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.refresh_rate {
            Some(rate) => write!(f, "{}x{}@{}Hz", self.width, self.height, rate),
            None => write!(f, "{}x{}", self.width, self.height),
        }
    }
}

/// True when `signature` names a valid resolution
pub fn is_valid_signature(signature: &str) -> bool {
    Resolution::from_signature(signature).is_ok()
}

/// Canonical form of a signature: no leading zeros, a zero refresh rate dropped.
/// `None` when the signature is invalid.
pub fn canonical_signature(signature: &str) -> Option<String> {
    Resolution::from_signature(signature)
        .ok()
        .map(|resolution| resolution.signature())
}

/// Number that may arrive as an integer, a float or a numeric string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LooseNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

impl LooseNumber {
    /// `Ok(None)` for an empty string, `Err` for anything non-numeric
    fn value(&self) -> Result<Option<u32>, String> {
        match self {
            LooseNumber::Int(i) => u32::try_from(*i)
                .map(Some)
                .map_err(|_| format!("{i} is out of range")),
            LooseNumber::Float(f) => {
                if f.fract() == 0.0 && *f >= 0.0 && *f <= f64::from(u32::MAX) {
                    Ok(Some(*f as u32))
                } else {
                    Err(format!("{f} is not a whole number"))
                }
            }
            LooseNumber::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    Ok(None)
                } else if let Ok(v) = s.parse::<u32>() {
                    Ok(Some(v))
                } else if let Ok(f) = s.parse::<f64>() {
                    LooseNumber::Float(f).value()
                } else {
                    Err(format!("'{s}' is not a number"))
                }
            }
        }
    }
}

/// Unvalidated resolution as found in JSON files and IPC payloads
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionInput {
    pub width: LooseNumber,
    pub height: LooseNumber,
    #[serde(default)]
    pub refresh_rate: Option<LooseNumber>,
}

impl TryFrom<ResolutionInput> for Resolution {
    type Error = ManagerError;

    fn try_from(input: ResolutionInput) -> Result<Self, Self::Error> {
        let dimension = |name: &str, n: &LooseNumber| -> ManagerResult<u32> {
            match n.value() {
                Ok(Some(v)) if v > 0 => Ok(v),
                Ok(_) => Err(ManagerError::validation(format!(
                    "{name} must be a positive integer"
                ))),
                Err(reason) => Err(ManagerError::validation(format!("{name}: {reason}"))),
            }
        };
        let width = dimension("width", &input.width)?;
        let height = dimension("height", &input.height)?;
        let refresh_rate = match &input.refresh_rate {
            Some(n) => n
                .value()
                .map_err(|reason| ManagerError::validation(format!("refresh rate: {reason}")))?,
            None => None,
        };
        Resolution::new(width, height, refresh_rate)
    }
}

/// Mode a monitor is currently driven with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentMode {
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
    pub refresh_rate: u32,
}

impl CurrentMode {
    pub fn resolution(&self) -> Option<Resolution> {
        Resolution::new(self.width, self.height, Some(self.refresh_rate)).ok()
    }
}

/// A monitor as reported by the display backend. Read-only input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitor {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_mode: Option<CurrentMode>,
    #[serde(default)]
    pub is_primary: bool,
}

impl Monitor {
    /// System-provided name, marked when primary
    pub fn system_name(&self) -> String {
        if self.is_primary {
            format!("{} (Primary)", self.name)
        } else {
            self.name.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_with_and_without_refresh() {
        let plain = Resolution::new(1920, 1080, None).unwrap();
        let rated = Resolution::new(1920, 1080, Some(60)).unwrap();

        assert_eq!(plain.signature(), "1920x1080");
        assert_eq!(rated.signature(), "1920x1080@60");
        assert_ne!(plain, rated);
    }

    #[test]
    fn test_zero_refresh_is_unspecified() {
        let res = Resolution::new(1280, 720, Some(0)).unwrap();
        assert_eq!(res.refresh_rate, None);
        assert_eq!(res.signature(), "1280x720");
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(
            Resolution::new(0, 1080, None),
            Err(ManagerError::Validation(_))
        ));
        assert!(matches!(
            Resolution::new(1920, 0, None),
            Err(ManagerError::Validation(_))
        ));
    }

    #[test]
    fn test_from_signature() {
        assert_eq!(
            Resolution::from_signature("2560x1440@144").unwrap(),
            Resolution::new(2560, 1440, Some(144)).unwrap()
        );
        assert_eq!(
            Resolution::from_signature("800x600").unwrap(),
            Resolution::new(800, 600, None).unwrap()
        );
    }

    #[test]
    fn test_from_signature_rejects_garbage() {
        for bad in ["abcx123", "1920x", "x1080", "1920x1080@", "1920 x 1080", "0x0", "99999999999x1"] {
            assert!(Resolution::from_signature(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_form_input_coercion() {
        let res = Resolution::from_form(" 1920 ", "1080", "").unwrap();
        assert_eq!(res, Resolution::new(1920, 1080, None).unwrap());

        let res = Resolution::from_form("2560", "1440", "144").unwrap();
        assert_eq!(res.refresh_rate, Some(144));
    }

    #[test]
    fn test_form_input_rejects_non_numeric() {
        let err = Resolution::from_form("wide", "1080", "").unwrap_err();
        assert!(matches!(err, ManagerError::Validation(_)));

        let err = Resolution::from_form("1920", "1080", "fast").unwrap_err();
        assert!(matches!(err, ManagerError::Validation(_)));
    }

    #[test]
    fn test_deserialize_accepts_numeric_strings_and_floats() {
        let res: Resolution =
            serde_json::from_str(r#"{"width": "1920", "height": 1080.0, "refreshRate": "60"}"#)
                .unwrap();
        assert_eq!(res, Resolution::new(1920, 1080, Some(60)).unwrap());

        let res: Resolution =
            serde_json::from_str(r#"{"width": 1280, "height": 720, "refreshRate": null}"#).unwrap();
        assert_eq!(res.refresh_rate, None);
    }

    #[test]
    fn test_deserialize_rejects_negative_and_fractional() {
        assert!(serde_json::from_str::<Resolution>(r#"{"width": -1, "height": 720}"#).is_err());
        assert!(serde_json::from_str::<Resolution>(r#"{"width": 1280.5, "height": 720}"#).is_err());
    }

    #[test]
    fn test_serialize_omits_missing_refresh() {
        let json = serde_json::to_string(&Resolution::new(1024, 768, None).unwrap()).unwrap();
        assert_eq!(json, r#"{"width":1024,"height":768}"#);
    }

    #[test]
    fn test_menu_label_defaults_refresh() {
        assert_eq!(
            Resolution::new(1920, 1080, None).unwrap().menu_label(),
            "1920x1080 @ 60Hz"
        );
        assert_eq!(
            Resolution::new(2560, 1440, Some(144)).unwrap().menu_label(),
            "2560x1440 @ 144Hz"
        );
    }

    #[test]
    fn test_cmp_descending_treats_missing_refresh_as_zero() {
        let plain = Resolution::new(1920, 1080, None).unwrap();
        let rated = Resolution::new(1920, 1080, Some(60)).unwrap();
        assert_eq!(rated.cmp_descending(&plain), Ordering::Less);
    }

    #[test]
    fn test_system_name_marks_primary() {
        let monitor = Monitor {
            id: "DP-1".to_string(),
            name: "DELL U2720Q".to_string(),
            current_mode: None,
            is_primary: true,
        };
        assert_eq!(monitor.system_name(), "DELL U2720Q (Primary)");
    }
}
