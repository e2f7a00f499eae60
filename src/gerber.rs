//! Gerber coordinate offsetting
//!
//! Gerber coordinates are integers in the file's fixed-point units. Linear
//! motion lines have both X and Y shifted. Arc lines additionally carry I/J,
//! the arc centre relative to the start point, which must never be shifted.
//! Whether a line is an arc depends on the most recent interpolation mode
//! command, so the transformer carries an [`InterpolationState`] across lines.

use crate::error::OffsetError;
use crate::format::CoordinateFormat;
use crate::offset::CoordinateOffset;
use crate::transform::{Disposition, LineStats, LineTransformer, ShapeMatcher};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use tracing::debug;

lazy_static! {
    static ref INLINE_LINEAR: Regex = Regex::new(r"^G0?1\D").expect("valid inline G01 regex");
    static ref APERTURE_SELECT: Regex =
        Regex::new(r"D[1-9]\d+\*").expect("valid aperture select regex");
    static ref LINEAR_MOTION: Regex =
        Regex::new(r"^(.*?)(X[+-]?\d+)(Y[+-]?\d+)(D0[123]\*.*)$").expect("valid linear regex");
    static ref ARC_XYIJ: Regex =
        Regex::new(r"^(.*?)(X[+-]?\d+)(Y[+-]?\d+)(I[+-]?\d+)(J[+-]?\d+)(D0[123]\*.*)$")
            .expect("valid XYIJ arc regex");
    static ref ARC_XIJ: Regex = Regex::new(r"^(.*?)(X[+-]?\d+)(I[+-]?\d+)(J[+-]?\d+)(D0[123]\*.*)$")
        .expect("valid XIJ arc regex");
    static ref ARC_YIJ: Regex = Regex::new(r"^(.*?)(Y[+-]?\d+)(I[+-]?\d+)(J[+-]?\d+)(D0[123]\*.*)$")
        .expect("valid YIJ arc regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    #[default]
    Linear,
    ClockwiseArc,
    CounterClockwiseArc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuadrantMode {
    #[default]
    Single,
    Multi,
}

/// Interpolation mode carried from line to line within one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterpolationState {
    pub mode: InterpolationMode,
    pub quadrant: QuadrantMode,
}

impl InterpolationState {
    /// Apply a bare mode command such as `G02*`. Returns false for anything else.
    pub fn apply_token(&mut self, token: &str) -> bool {
        match token {
            "G01*" => self.mode = InterpolationMode::Linear,
            "G02*" => self.mode = InterpolationMode::ClockwiseArc,
            "G03*" => self.mode = InterpolationMode::CounterClockwiseArc,
            "G74*" => self.quadrant = QuadrantMode::Single,
            "G75*" => self.quadrant = QuadrantMode::Multi,
            _ => return false,
        }
        true
    }

    /// A `G01` prefixed to a motion line ends any carried arc mode.
    /// Inline `G02`/`G03` only affect their own line.
    pub fn apply_inline(&mut self, line: &str) {
        if INLINE_LINEAR.is_match(line) {
            self.mode = InterpolationMode::Linear;
        }
    }

    pub fn is_arc(&self) -> bool {
        matches!(
            self.mode,
            InterpolationMode::ClockwiseArc | InterpolationMode::CounterClockwiseArc
        )
    }
}

/// Whether a line names an arc command itself
pub fn is_arc_command(line: &str) -> bool {
    let upper = line.to_ascii_uppercase();
    upper.contains("G02") || upper.contains("G03") || upper.contains("G75")
}

/// Rewrites one Gerber file
#[derive(Debug)]
pub struct GerberTransformer {
    format: CoordinateFormat,
    offset: CoordinateOffset,
    state: InterpolationState,
    stats: LineStats,
}

impl GerberTransformer {
    pub fn new(format: CoordinateFormat, offset: CoordinateOffset) -> Self {
        Self {
            format,
            offset,
            state: InterpolationState::default(),
            stats: LineStats::default(),
        }
    }

    pub fn state(&self) -> InterpolationState {
        self.state
    }

    /// Shift an absolute field such as `X001000` by `delta` and re-encode it
    fn shift_field(&mut self, field: &str, delta: i64) -> Result<(String, bool), OffsetError> {
        let (axis, digits) = field.split_at(1);
        let value = self.format.parse_coordinate(digits)?;
        let shifted = value
            .checked_add(delta)
            .ok_or_else(|| OffsetError::LineParseFailure {
                line: 0,
                reason: format!("coordinate {} overflows when shifted", field),
            })?;
        Ok((
            format!("{}{}", axis, self.format.format_coordinate(shifted)),
            shifted < 0,
        ))
    }

    fn note_negative(&mut self, negative: bool, body: &str) {
        if negative {
            self.stats.negative_coordinates += 1;
            debug!("Offset produced a negative coordinate: {}", body);
        }
    }

    fn rewrite_arc(&mut self, body: &str) -> Result<Disposition, OffsetError> {
        if let Some(caps) = ARC_XYIJ.captures(body) {
            let (x, x_neg) = self.shift_field(&caps[2], self.offset.dx)?;
            let (y, y_neg) = self.shift_field(&caps[3], self.offset.dy)?;
            self.note_negative(x_neg || y_neg, body);
            return Ok(Disposition::Rewritten(format!(
                "{}{}{}{}{}{}",
                &caps[1], x, y, &caps[4], &caps[5], &caps[6]
            )));
        }

        if let Some(caps) = ARC_XIJ.captures(body) {
            let (x, negative) = self.shift_field(&caps[2], self.offset.dx)?;
            self.note_negative(negative, body);
            return Ok(rebuild_single_axis(&caps, &x));
        }

        if let Some(caps) = ARC_YIJ.captures(body) {
            let (y, negative) = self.shift_field(&caps[2], self.offset.dy)?;
            self.note_negative(negative, body);
            return Ok(rebuild_single_axis(&caps, &y));
        }

        Ok(Disposition::Verbatim)
    }
}

fn rebuild_single_axis(caps: &Captures<'_>, shifted: &str) -> Disposition {
    Disposition::Rewritten(format!(
        "{}{}{}{}{}",
        &caps[1], shifted, &caps[3], &caps[4], &caps[5]
    ))
}

fn mode_token(t: &mut GerberTransformer, body: &str) -> Result<Disposition, OffsetError> {
    if t.state.apply_token(body) {
        debug!("Interpolation state: {:?}", t.state);
        return Ok(Disposition::Verbatim);
    }
    t.state.apply_inline(body);
    Ok(Disposition::Declined)
}

fn parameter_or_aperture(
    _: &mut GerberTransformer,
    body: &str,
) -> Result<Disposition, OffsetError> {
    if body.starts_with('%') || APERTURE_SELECT.is_match(body) {
        Ok(Disposition::Verbatim)
    } else {
        Ok(Disposition::Declined)
    }
}

fn arc_motion(t: &mut GerberTransformer, body: &str) -> Result<Disposition, OffsetError> {
    if !is_arc_command(body) && !t.state.is_arc() {
        return Ok(Disposition::Declined);
    }
    t.stats.arc_lines += 1;
    t.rewrite_arc(body)
}

fn linear_motion(t: &mut GerberTransformer, body: &str) -> Result<Disposition, OffsetError> {
    let Some(caps) = LINEAR_MOTION.captures(body) else {
        return Ok(Disposition::Declined);
    };
    let (x, x_neg) = t.shift_field(&caps[2], t.offset.dx)?;
    let (y, y_neg) = t.shift_field(&caps[3], t.offset.dy)?;
    t.note_negative(x_neg || y_neg, body);
    Ok(Disposition::Rewritten(format!("{}{}{}{}", &caps[1], x, y, &caps[4])))
}

const SHAPES: &[ShapeMatcher<GerberTransformer>] =
    &[mode_token, parameter_or_aperture, arc_motion, linear_motion];

impl LineTransformer for GerberTransformer {
    const DIALECT: &'static str = "Gerber";

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
    use crate::format::{Notation, ZeroOmission};

    fn leading(int: u8, dec: u8) -> CoordinateFormat {
        CoordinateFormat {
            zero_omission: ZeroOmission::Leading,
            notation: Notation::Absolute,
            integer_digits: int,
            decimal_digits: dec,
        }
    }

    fn transformer(format: CoordinateFormat, dx: i64, dy: i64) -> GerberTransformer {
        GerberTransformer::new(format, CoordinateOffset { dx, dy })
    }

    #[test]
    fn test_default_format_pads_to_full_width() {
        let mut t = transformer(leading(3, 6), 1_000_000, -500_000);
        let out = t.transform_line(1, "X001000Y002000D02*\n");
        assert_eq!(out, "X001001000Y-000498000D02*\n");
        assert_eq!(t.stats().coordinates_modified, 1);
        assert_eq!(t.stats().negative_coordinates, 1);
    }

    #[test]
    fn test_linear_keeps_prefix_and_suffix() {
        let mut t = transformer(leading(2, 4), 100, 200);
        let out = t.transform_line(1, "G01X010000Y020000D01*\r\n");
        assert_eq!(out, "G01X010100Y020200D01*\r\n");
    }

    #[test]
    fn test_arc_keeps_center_offsets() {
        let mut t = transformer(leading(2, 4), 5000, 0);
        t.transform_line(1, "G02*\n");
        let out = t.transform_line(2, "X010000Y020000I000100J000200D01*\n");
        assert_eq!(out, "X015000Y020000I000100J000200D01*\n");
        assert_eq!(t.stats().arc_lines, 1);
    }

    #[test]
    fn test_arc_center_text_is_untouched_in_trailing_mode() {
        let format = CoordinateFormat {
            zero_omission: ZeroOmission::Trailing,
            ..leading(2, 4)
        };
        let mut t = transformer(format, 10, 10);
        t.transform_line(1, "G03*\n");
        let out = t.transform_line(2, "X0100Y0200I-0050J0000D01*\n");
        assert_eq!(out, "X110Y210I-0050J0000D01*\n");
    }

    #[test]
    fn test_arc_with_omitted_axis() {
        let mut t = transformer(leading(2, 4), 1000, 2000);
        t.transform_line(1, "G75*\n");
        t.transform_line(2, "G02*\n");
        assert_eq!(
            t.transform_line(3, "X005000I000100J000000D01*\n"),
            "X006000I000100J000000D01*\n"
        );
        assert_eq!(
            t.transform_line(4, "Y005000I000100J000000D01*\n"),
            "Y007000I000100J000000D01*\n"
        );
    }

    #[test]
    fn test_arc_mode_without_layout_passes_through() {
        let mut t = transformer(leading(2, 4), 1000, 1000);
        t.transform_line(1, "G02*\n");
        let line = "X005000Y005000D02*\n";
        assert_eq!(t.transform_line(2, line), line);
        assert_eq!(t.stats().coordinates_modified, 0);
    }

    #[test]
    fn test_inline_arc_command_is_recognised() {
        let mut t = transformer(leading(2, 4), 1000, 0);
        let out = t.transform_line(1, "G03X001000Y001000I000500J000000D01*\n");
        assert_eq!(out, "G03X002000Y001000I000500J000000D01*\n");
        assert_eq!(t.stats().arc_lines, 1);
        assert!(!t.state().is_arc());
    }

    #[test]
    fn test_moves_after_inline_arc_are_shifted() {
        let mut t = transformer(leading(2, 4), 1000, 1000);
        t.transform_line(1, "G03X001000Y001000I000500J000000D01*\n");
        assert_eq!(
            t.transform_line(2, "X005000Y005000D02*\n"),
            "X006000Y006000D02*\n"
        );
        assert_eq!(
            t.transform_line(3, "X006000Y006000D03*\n"),
            "X007000Y007000D03*\n"
        );
        assert_eq!(t.stats().coordinates_modified, 3);
        assert_eq!(t.stats().arc_lines, 1);
    }

    #[test]
    fn test_mode_state_carries_until_changed() {
        let mut t = transformer(leading(2, 4), 1000, 1000);
        t.transform_line(1, "G02*\n");
        t.transform_line(2, "G04 comment*\n");
        assert_eq!(t.state().mode, InterpolationMode::ClockwiseArc);
        t.transform_line(3, "G01*\n");
        assert_eq!(t.state().mode, InterpolationMode::Linear);
        assert_eq!(
            t.transform_line(4, "X001000Y001000D01*\n"),
            "X002000Y002000D01*\n"
        );
    }

    #[test]
    fn test_inline_linear_leaves_arc_mode() {
        let mut t = transformer(leading(2, 4), 1000, 1000);
        t.transform_line(1, "G02*\n");
        assert_eq!(
            t.transform_line(2, "G01X001000Y001000D01*\n"),
            "G01X002000Y002000D01*\n"
        );
    }

    #[test]
    fn test_inline_modes_only_reset_to_linear() {
        let mut state = InterpolationState::default();
        state.apply_inline("G02X1Y1I1J0D01*");
        assert!(!state.is_arc());
        assert!(state.apply_token("G03*"));
        state.apply_inline("G1X1Y1D01*");
        assert_eq!(state.mode, InterpolationMode::Linear);
    }

    #[test]
    fn test_quadrant_mode_tracking() {
        let mut state = InterpolationState::default();
        assert!(state.apply_token("G75*"));
        assert_eq!(state.quadrant, QuadrantMode::Multi);
        assert!(state.apply_token("G74*"));
        assert_eq!(state.quadrant, QuadrantMode::Single);
        assert!(!state.apply_token("G04*"));
        assert!(!state.is_arc());
    }

    #[test]
    fn test_parameters_and_aperture_selects_pass_through() {
        let mut t = transformer(leading(2, 4), 1000, 1000);
        let lines = ["%FSLAX24Y24*%\n", "%ADD10C,0.1*%\n", "G54D10*\n", "D11*\n", "M02*\n"];
        for line in lines {
            assert_eq!(t.transform_line(1, line), line);
        }
        assert_eq!(t.stats().coordinates_modified, 0);
    }

    #[test]
    fn test_single_axis_linear_line_is_untouched() {
        let mut t = transformer(leading(2, 4), 1000, 1000);
        let line = "X001000D01*\n";
        assert_eq!(t.transform_line(1, line), line);
    }

    #[test]
    fn test_bad_digits_count_as_error() {
        let mut t = transformer(leading(2, 4), 1, 1);
        let line = "X99999999999999999999Y1D01*\n";
        assert_eq!(t.transform_line(7, line), line);
        assert_eq!(t.stats().line_errors, 1);
    }

    #[test]
    fn test_offset_linearity() {
        let format = leading(3, 6);
        let mut first = transformer(format, 1000, -2000);
        let mut second = transformer(format, 300, 400);
        let mut combined = transformer(format, 1300, -1600);
        let line = "X005000Y005000D01*\n";
        let stepped = second.transform_line(1, &first.transform_line(1, line));
        assert_eq!(stepped, combined.transform_line(1, line));
    }
}
