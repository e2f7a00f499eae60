//! Format descriptors for Gerber and Excellon coordinate encodings
//!
//! A [`FormatDescriptor`] is produced once per file by the sniffers and is
//! immutable afterwards. Gerber files carry a fixed-point [`CoordinateFormat`];
//! Excellon coordinates are literal decimals and need no digit model.

use crate::error::OffsetError;
use std::fmt;
use std::str::FromStr;

/// Millimetres per inch
pub const MM_PER_INCH: f64 = 25.4;

/// Measurement unit of a file or of a user-supplied offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    #[default]
    Metric,
    Imperial,
}

impl Unit {
    /// Express a value given in this unit in millimetres
    pub fn to_mm(self, value: f64) -> f64 {
        match self {
            Unit::Metric => value,
            Unit::Imperial => value * MM_PER_INCH,
        }
    }

    /// Express a millimetre value in this unit
    pub fn from_mm(self, mm: f64) -> f64 {
        match self {
            Unit::Metric => mm,
            Unit::Imperial => mm / MM_PER_INCH,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Metric => "MM",
            Unit::Imperial => "IN",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = OffsetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MM" | "METRIC" => Ok(Unit::Metric),
            "IN" | "INCH" => Ok(Unit::Imperial),
            other => Err(OffsetError::InvalidUnit {
                unit: other.to_string(),
            }),
        }
    }
}

/// Which zeros a Gerber file omits from its coordinate fields
///
/// `Leading` renders fixed-width zero-padded fields and is what a file
/// without a format parameter gets. `Trailing` renders the plain integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroOmission {
    Leading,
    Trailing,
}

impl ZeroOmission {
    /// Map the zero-omission letter of a `%FSL` parameter; only `L` pads
    pub fn from_letter(letter: &str) -> Self {
        match letter {
            "L" => ZeroOmission::Leading,
            _ => ZeroOmission::Trailing,
        }
    }
}

/// Whether Gerber X/Y fields are positions or deltas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notation {
    Absolute,
    Incremental,
}

/// Fixed-point layout of a Gerber coordinate
///
/// A coordinate is an integer count of `10^-decimal_digits` native units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateFormat {
    pub zero_omission: ZeroOmission,
    pub notation: Notation,
    pub integer_digits: u8,
    pub decimal_digits: u8,
}

impl Default for CoordinateFormat {
    fn default() -> Self {
        Self {
            zero_omission: ZeroOmission::Leading,
            notation: Notation::Absolute,
            integer_digits: 3,
            decimal_digits: 6,
        }
    }
}

impl CoordinateFormat {
    /// Zero-padded field width used under leading-zero omission
    pub fn width(&self) -> usize {
        usize::from(self.integer_digits) + usize::from(self.decimal_digits)
    }

    /// Render an integer coordinate in this file's convention
    pub fn format_coordinate(&self, value: i64) -> String {
        match self.zero_omission {
            ZeroOmission::Leading => {
                let digits = format!("{:0width$}", value.unsigned_abs(), width = self.width());
                if value < 0 {
                    format!("-{}", digits)
                } else {
                    digits
                }
            }
            ZeroOmission::Trailing => value.to_string(),
        }
    }

    /// Parse the numeric text of a coordinate field (axis letter removed)
    pub fn parse_coordinate(&self, raw: &str) -> Result<i64, OffsetError> {
        raw.parse::<i64>()
            .map_err(|e| OffsetError::LineParseFailure {
                line: 0,
                reason: format!("invalid coordinate '{}': {}", raw, e),
            })
    }
}

impl fmt::Display for CoordinateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let omission = match self.zero_omission {
            ZeroOmission::Leading => "leading",
            ZeroOmission::Trailing => "trailing",
        };
        let notation = match self.notation {
            Notation::Absolute => "absolute",
            Notation::Incremental => "incremental",
        };
        write!(
            f,
            "{}.{} ({} zeros omitted, {})",
            self.integer_digits, self.decimal_digits, omission, notation
        )
    }
}

/// Numeric encoding of coordinate fields, per dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericEncoding {
    Gerber(CoordinateFormat),
    /// Literal decimal values carrying their own decimal point
    Excellon,
}

/// Everything the transformer needs to know about one file's geometry encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub unit: Unit,
    pub encoding: NumericEncoding,
}

impl FormatDescriptor {
    pub fn gerber_format(&self) -> Option<&CoordinateFormat> {
        match &self.encoding {
            NumericEncoding::Gerber(format) => Some(format),
            NumericEncoding::Excellon => None,
        }
    }
}

impl fmt::Display for FormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.encoding {
            NumericEncoding::Gerber(format) => write!(f, "Gerber {}, unit {}", format, self.unit),
            NumericEncoding::Excellon => write!(f, "Excellon decimal, unit {}", self.unit),
        }
    }
}

/// Accumulates attributes discovered while scanning a header
#[derive(Debug, Default)]
pub struct FormatBuilder {
    unit: Option<Unit>,
    coordinate_format: Option<CoordinateFormat>,
}

impl FormatBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unit(&mut self, unit: Unit) {
        self.unit = Some(unit);
    }

    pub fn set_coordinate_format(&mut self, format: CoordinateFormat) {
        self.coordinate_format = Some(format);
    }

    pub fn has_coordinate_format(&self) -> bool {
        self.coordinate_format.is_some()
    }

    /// Finish a Gerber descriptor, filling anything undiscovered with defaults
    pub fn build_gerber(self) -> FormatDescriptor {
        FormatDescriptor {
            unit: self.unit.unwrap_or_default(),
            encoding: NumericEncoding::Gerber(self.coordinate_format.unwrap_or_default()),
        }
    }

    pub fn build_excellon(self) -> FormatDescriptor {
        FormatDescriptor {
            unit: self.unit.unwrap_or_default(),
            encoding: NumericEncoding::Excellon,
        }
    }
}
