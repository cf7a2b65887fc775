//! SSD distance value

/// Sum of squared differences as held in the 32-bit result register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Distance(u32);

impl Distance {
    /// Largest representable distance; the "no match yet" sentinel.
    pub const MAX: Self = Self(u32::MAX);

    /// Exact match.
    pub const ZERO: Self = Self(0);

    /// Wrap a raw register value.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw register value.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for Distance {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<Distance> for u32 {
    fn from(d: Distance) -> Self {
        d.0
    }
}

impl std::fmt::Display for Distance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
