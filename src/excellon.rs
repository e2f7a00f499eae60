//! Excellon drill coordinate offsetting
//!
//! Drill coordinates are handled as literal decimals: the native-unit offset
//! is added and the result re-rendered without padding or trailing zeros.

use crate::error::OffsetError;
use crate::offset::NativeOffset;
use crate::transform::{parse_decimal, Disposition, LineStats, LineTransformer, ShapeMatcher};
use lazy_static::lazy_static;
use regex::Regex;

const PROGRAM_END: &[&str] = &["M30", "M00", "M02"];

lazy_static! {
    static ref TOOL_SELECT: Regex = Regex::new(r"^T\d+").expect("valid tool regex");
    static ref XY_FIELDS: Regex =
        Regex::new(r"^(.*?)(X[-+\d.]+)(.*?)(Y[-+\d.]+)(.*)$").expect("valid XY regex");
    static ref X_FIELD: Regex = Regex::new(r"^(.*?)(X[-+\d.]+)(.*)$").expect("valid X regex");
    static ref Y_FIELD: Regex = Regex::new(r"^(.*?)(Y[-+\d.]+)(.*)$").expect("valid Y regex");
}

/// Render a drill coordinate with six decimals, trailing zeros and point removed
pub fn format_decimal(value: f64) -> String {
    let fixed = format!("{:.6}", value);
    match fixed.trim_end_matches('0').trim_end_matches('.') {
        "-0" => "0".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Rewrites one Excellon file
#[derive(Debug)]
pub struct DrillTransformer {
    offset: NativeOffset,
    stats: LineStats,
}

impl DrillTransformer {
    pub fn new(offset: NativeOffset) -> Self {
        Self {
            offset,
            stats: LineStats::default(),
        }
    }

    fn shift_field(field: &str, delta: f64) -> Result<String, OffsetError> {
        let value = parse_decimal(field)?;
        Ok(format!("{}{}", &field[..1], format_decimal(value + delta)))
    }
}

fn blank_or_end(_: &mut DrillTransformer, body: &str) -> Result<Disposition, OffsetError> {
    if body.is_empty() || body.starts_with(';') || PROGRAM_END.iter().any(|end| *end == body) {
        Ok(Disposition::Verbatim)
    } else {
        Ok(Disposition::Declined)
    }
}

fn tool_select(_: &mut DrillTransformer, body: &str) -> Result<Disposition, OffsetError> {
    if TOOL_SELECT.is_match(body) {
        Ok(Disposition::Verbatim)
    } else {
        Ok(Disposition::Declined)
    }
}

fn xy_fields(t: &mut DrillTransformer, body: &str) -> Result<Disposition, OffsetError> {
    let Some(caps) = XY_FIELDS.captures(body) else {
        return Ok(Disposition::Declined);
    };
    let x = DrillTransformer::shift_field(&caps[2], t.offset.dx)?;
    let y = DrillTransformer::shift_field(&caps[4], t.offset.dy)?;
    Ok(Disposition::Rewritten(format!(
        "{}{}{}{}{}",
        &caps[1], x, &caps[3], y, &caps[5]
    )))
}

fn x_field(t: &mut DrillTransformer, body: &str) -> Result<Disposition, OffsetError> {
    let Some(caps) = X_FIELD.captures(body) else {
        return Ok(Disposition::Declined);
    };
    let x = DrillTransformer::shift_field(&caps[2], t.offset.dx)?;
    Ok(Disposition::Rewritten(format!("{}{}{}", &caps[1], x, &caps[3])))
}

fn y_field(t: &mut DrillTransformer, body: &str) -> Result<Disposition, OffsetError> {
    let Some(caps) = Y_FIELD.captures(body) else {
        return Ok(Disposition::Declined);
    };
    let y = DrillTransformer::shift_field(&caps[2], t.offset.dy)?;
    Ok(Disposition::Rewritten(format!("{}{}{}", &caps[1], y, &caps[3])))
}

const SHAPES: &[ShapeMatcher<DrillTransformer>] =
    &[blank_or_end, tool_select, xy_fields, x_field, y_field];

impl LineTransformer for DrillTransformer {
    const DIALECT: &'static str = "Excellon";

    fn shapes() -> &'static [ShapeMatcher<Self>] {
        SHAPES
    }

    fn stats(&self) -> &LineStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut LineStats {
        &mut self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transformer(dx: f64, dy: f64) -> DrillTransformer {
        DrillTransformer::new(NativeOffset { dx, dy })
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(2.0), "2");
        assert_eq!(format_decimal(2.25), "2.25");
        assert_eq!(format_decimal(-0.125), "-0.125");
        assert_eq!(format_decimal(100.0), "100");
        assert_eq!(format_decimal(0.0), "0");
        assert_eq!(format_decimal(1.0000004), "1");
        assert_eq!(format_decimal(-0.0000001), "0");
        assert_eq!(format_decimal(-0.0), "0");
    }

    #[test]
    fn test_offsets_compose() {
        let mut first = transformer(0.5, 0.25);
        let mut second = transformer(1.25, -0.75);
        let mut combined = transformer(1.75, -0.5);
        let line = "G81X1.5Y2.25\n";
        let stepped = second.transform_line(1, &first.transform_line(1, line));
        assert_eq!(stepped, combined.transform_line(1, line));
        assert_eq!(stepped, "G81X3.25Y1.75\n");
    }

    #[test]
    fn test_xy_line() {
        let mut t = transformer(0.5, 0.0);
        assert_eq!(t.transform_line(1, "X1.5Y2.25\n"), "X2Y2.25\n");
        assert_eq!(t.stats().coordinates_modified, 1);
    }

    #[test]
    fn test_xy_with_prefix_and_suffix() {
        let mut t = transformer(1.0, -1.0);
        assert_eq!(t.transform_line(1, "G81X10.0Y-5.5T2\r\n"), "G81X11Y-6.5T2\r\n");
    }

    #[test]
    fn test_single_axis_lines() {
        let mut t = transformer(1.0, 2.0);
        assert_eq!(t.transform_line(1, "X3.5\n"), "X4.5\n");
        assert_eq!(t.transform_line(2, "Y3.5\n"), "Y5.5\n");
        assert_eq!(t.stats().coordinates_modified, 2);
    }

    #[test]
    fn test_verbatim_lines() {
        let mut t = transformer(1.0, 1.0);
        let lines = [
            "\n",
            "M30\n",
            "M48\n",
            "T1C0.800\n",
            "T01\n",
            "METRIC,TZ\n",
            "%\n",
            "; X1 comment\n",
        ];
        for line in lines {
            assert_eq!(t.transform_line(1, line), line);
        }
        assert_eq!(t.stats().coordinates_modified, 0);
    }

    #[test]
    fn test_malformed_number_is_counted() {
        let mut t = transformer(1.0, 1.0);
        let line = "X1.2.3Y4\n";
        assert_eq!(t.transform_line(1, line), line);
        assert_eq!(t.stats().line_errors, 1);
    }

    #[test]
    fn test_whole_file() {
        let mut t = transformer(0.5, 0.5);
        let input = "M48\nMETRIC\nT1C0.8\n%\nT1\nX1Y1\nX2.5Y-1\nM30\n";
        let output = t.transform(input);
        assert_eq!(output, "M48\nMETRIC\nT1C0.8\n%\nT1\nX1.5Y1.5\nX3Y-0.5\nM30\n");
        assert_eq!(t.stats().lines, 8);
    }
}
