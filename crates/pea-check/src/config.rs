//! Session configuration.

use std::fmt;

use crate::import::{Loader, SourceLoader};

/// Bit width of the universal `Int` and `UInt` aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IntSize {
    I8,
    I16,
    I32,
    #[default]
    I64,
}

impl IntSize {
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            IntSize::I8 => 8,
            IntSize::I16 => 16,
            IntSize::I32 => 32,
            IntSize::I64 => 64,
        }
    }

    #[must_use]
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(IntSize::I8),
            16 => Some(IntSize::I16),
            32 => Some(IntSize::I32),
            64 => Some(IntSize::I64),
            _ => None,
        }
    }
}

/// Bit width of the universal `Float` alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FloatSize {
    F32,
    #[default]
    F64,
}

impl FloatSize {
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            FloatSize::F32 => 32,
            FloatSize::F64 => 64,
        }
    }

    #[must_use]
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            32 => Some(FloatSize::F32),
            64 => Some(FloatSize::F64),
            _ => None,
        }
    }
}

/// Settings for a checking [`Session`](crate::Session).
///
/// # Examples
///
/// ```
/// use pea_check::{Config, IntSize, MemLoader};
///
/// let config = Config::default()
///     .with_int_size(IntSize::I32)
///     .with_loader(MemLoader::new().with_module("geo", &[("geo.pea", "type Point { x: Int y: Int }")]));
///
/// assert_eq!(config.int_size.bits(), 32);
/// assert!(!config.trace);
/// ```
pub struct Config {
    pub int_size: IntSize,
    pub float_size: FloatSize,
    /// Trace gathering, instantiation and imports of the checked module.
    pub trace: bool,
    /// Source of imported modules.
    pub loader: Box<dyn Loader>,
}

impl Config {
    #[must_use]
    pub fn with_int_size(mut self, size: IntSize) -> Self {
        self.int_size = size;
        self
    }

    #[must_use]
    pub fn with_float_size(mut self, size: FloatSize) -> Self {
        self.float_size = size;
        self
    }

    #[must_use]
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    #[must_use]
    pub fn with_loader(mut self, loader: impl Loader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            int_size: IntSize::default(),
            float_size: FloatSize::default(),
            trace: false,
            loader: Box::new(SourceLoader::new(".")),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("int_size", &self.int_size)
            .field("float_size", &self.float_size)
            .field("trace", &self.trace)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_from_bits() {
        assert_eq!(IntSize::from_bits(16), Some(IntSize::I16));
        assert_eq!(IntSize::from_bits(12), None);
        assert_eq!(FloatSize::from_bits(32).map(FloatSize::bits), Some(32));
        assert_eq!(FloatSize::from_bits(16), None);
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.int_size, IntSize::I64);
        assert_eq!(config.float_size, FloatSize::F64);
        assert!(format!("{config:?}").starts_with("Config { int_size: I64"));
    }
}
