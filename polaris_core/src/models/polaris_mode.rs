//! Which observing domains the deployment supports.

use std::fmt;

/// Backend mode as reported by `GET /polarisMode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolarisMode {
    Radio,
    Optical,
    Both,
}

impl PolarisMode {
    pub fn code(&self) -> i64 {
        match self {
            Self::Radio => 0,
            Self::Optical => 1,
            Self::Both => 2,
        }
    }

    /// Whether the optical telescope form should be offered.
    pub fn includes_optical(&self) -> bool {
        matches!(self, Self::Optical | Self::Both)
    }

    pub fn includes_radio(&self) -> bool {
        matches!(self, Self::Radio | Self::Both)
    }
}

impl TryFrom<i64> for PolarisMode {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Radio),
            1 => Ok(Self::Optical),
            2 => Ok(Self::Both),
            other => Err(format!("Unknown polaris mode: {}", other)),
        }
    }
}

impl fmt::Display for PolarisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Radio => "radio",
            Self::Optical => "optical",
            Self::Both => "both",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        for mode in [PolarisMode::Radio, PolarisMode::Optical, PolarisMode::Both] {
            assert_eq!(PolarisMode::try_from(mode.code()).unwrap(), mode);
        }
        assert!(PolarisMode::try_from(7).is_err());
    }

    #[test]
    fn test_optical_gate() {
        assert!(!PolarisMode::Radio.includes_optical());
        assert!(PolarisMode::Optical.includes_optical());
        assert!(PolarisMode::Both.includes_optical());
    }
}
