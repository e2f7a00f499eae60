//! Offset conversion into a file's native unit and coordinate space

use crate::format::{CoordinateFormat, Unit};
use tracing::debug;

/// User-supplied translation, constant for a whole run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetSpec {
    pub dx: f64,
    pub dy: f64,
    pub input_unit: Unit,
}

/// Offset expressed in a file's own unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeOffset {
    pub dx: f64,
    pub dy: f64,
}

/// Offset expressed in a Gerber file's fixed-point integer units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateOffset {
    pub dx: i64,
    pub dy: i64,
}

/// Convert a value from the input unit to the file unit.
///
/// Always pivots through millimetres, even when both units agree.
pub fn convert(value: f64, input_unit: Unit, file_unit: Unit) -> f64 {
    let mm = input_unit.to_mm(value);
    file_unit.from_mm(mm)
}

/// Scale a native-unit value into integer coordinate steps.
///
/// Rounds half away from zero.
pub fn to_coordinate_units(native: f64, decimal_digits: u8) -> i64 {
    let multiplier = 10f64.powi(i32::from(decimal_digits));
    (native * multiplier).round() as i64
}

impl OffsetSpec {
    pub fn new(dx: f64, dy: f64, input_unit: Unit) -> Self {
        Self { dx, dy, input_unit }
    }

    pub fn to_native(&self, file_unit: Unit) -> NativeOffset {
        let native = NativeOffset {
            dx: convert(self.dx, self.input_unit, file_unit),
            dy: convert(self.dy, self.input_unit, file_unit),
        };
        debug!(
            "Offset {}/{} {} -> {:.6}/{:.6} {}",
            self.dx, self.dy, self.input_unit, native.dx, native.dy, file_unit
        );
        native
    }

    pub fn to_coordinate(&self, file_unit: Unit, format: &CoordinateFormat) -> CoordinateOffset {
        let native = self.to_native(file_unit);
        let offset = CoordinateOffset {
            dx: to_coordinate_units(native.dx, format.decimal_digits),
            dy: to_coordinate_units(native.dy, format.decimal_digits),
        };
        debug!("Coordinate offset: X {} Y {}", offset.dx, offset.dy);
        offset
    }
}
