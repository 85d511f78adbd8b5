use std::fmt;

/// Output size target selected by the `device` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceProfile {
    /// Mobile portrait
    MobilePortrait,
    /// Mobile landscape
    MobileLandscape,
    /// Desktop / laptop
    Desktop,
    #[default]
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl DeviceProfile {
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("mp") => DeviceProfile::MobilePortrait,
            Some("ml") => DeviceProfile::MobileLandscape,
            Some("pc") => DeviceProfile::Desktop,
            _ => DeviceProfile::Default,
        }
    }

    pub fn resolution(self) -> Resolution {
        match self {
            DeviceProfile::MobilePortrait => Resolution::new(720, 1280),
            DeviceProfile::MobileLandscape => Resolution::new(1280, 720),
            DeviceProfile::Desktop => Resolution::new(1920, 1080),
            DeviceProfile::Default => Resolution::new(1280, 720),
        }
    }
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Map a device token straight to its resolution
pub fn resolve(token: Option<&str>) -> Resolution {
    DeviceProfile::from_token(token).resolution()
}
