//! Format sniffing for Gerber and Excellon files
//!
//! Sniffing never fails: malformed Gerber headers fall back to defaults and
//! unrecognised drill candidates are reported as not being drill files.

use crate::error::OffsetError;
use crate::format::{
    CoordinateFormat, FormatBuilder, FormatDescriptor, Notation, Unit, ZeroOmission,
};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Header parameters are expected within this many bytes of the file start
pub const GERBER_SNIFF_LIMIT: usize = 2000;

/// Distinct indicator tokens required to accept a file as Excellon
pub const DRILL_INDICATOR_THRESHOLD: usize = 2;

const DRILL_INDICATORS: &[&str] = &[
    "M48", "M72", "M71", "INCH", "METRIC", "FMAT", "T01C", "T02C", "T1C", "T2C",
];

const INCH_INDICATORS: &[&str] = &["INCH", "M72"];

lazy_static! {
    static ref FORMAT_SPEC: Regex =
        Regex::new(r"^%FSL([AIT])X(\d)(\d)Y(\d)(\d)\*%").expect("valid format-spec regex");
    static ref APERTURE_DEF: Regex =
        Regex::new(r"^%ADD(\d+)([CROP]),(.*?)\*%").expect("valid aperture regex");
}

/// Standard aperture shape letter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApertureShape {
    Circle,
    Rectangle,
    Obround,
    Polygon,
}

impl ApertureShape {
    fn from_letter(letter: &str) -> Option<Self> {
        match letter {
            "C" => Some(ApertureShape::Circle),
            "R" => Some(ApertureShape::Rectangle),
            "O" => Some(ApertureShape::Obround),
            "P" => Some(ApertureShape::Polygon),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aperture {
    pub shape: ApertureShape,
    pub parameters: String,
}

/// Aperture definitions keyed by D-code number
pub type ApertureTable = BTreeMap<u32, Aperture>;

/// Result of scanning a Gerber header
#[derive(Debug, Clone)]
pub struct GerberHeader {
    pub descriptor: FormatDescriptor,
    pub apertures: ApertureTable,
    /// Whether a `%FS` parameter was found, as opposed to defaults
    pub format_declared: bool,
}

impl GerberHeader {
    pub fn coordinate_format(&self) -> CoordinateFormat {
        self.descriptor.gerber_format().copied().unwrap_or_default()
    }
}

fn parse_format_spec(line: &str) -> Result<Option<CoordinateFormat>, OffsetError> {
    let Some(caps) = FORMAT_SPEC.captures(line) else {
        return Ok(None);
    };

    let digit = |index: usize| -> Result<u8, OffsetError> {
        caps[index]
            .parse::<u8>()
            .map_err(|e| OffsetError::FormatSniffFailure {
                reason: format!("bad digit count in '{}': {}", line, e),
            })
    };

    // The letter after `%FSL` is the zero-omission letter; `I` marks deltas
    let (zero_omission, notation) = match &caps[1] {
        "I" => (ZeroOmission::Trailing, Notation::Incremental),
        letter => (ZeroOmission::from_letter(letter), Notation::Absolute),
    };
    let (x_int, x_dec) = (digit(2)?, digit(3)?);
    let (y_int, y_dec) = (digit(4)?, digit(5)?);

    if (x_int, x_dec) != (y_int, y_dec) {
        warn!(
            "Format X{}{} differs from Y{}{}; using X precision for both axes",
            x_int, x_dec, y_int, y_dec
        );
    }

    Ok(Some(CoordinateFormat {
        zero_omission,
        notation,
        integer_digits: x_int,
        decimal_digits: x_dec,
    }))
}

fn parse_unit(line: &str) -> Option<Unit> {
    if line.contains("MM") {
        Some(Unit::Metric)
    } else if line.contains("IN") {
        Some(Unit::Imperial)
    } else {
        None
    }
}

fn parse_aperture(line: &str) -> Option<(u32, Aperture)> {
    let caps = APERTURE_DEF.captures(line)?;
    let code = caps[1].parse::<u32>().ok()?;
    let shape = ApertureShape::from_letter(&caps[2])?;
    Some((
        code,
        Aperture {
            shape,
            parameters: caps[3].to_string(),
        },
    ))
}

/// Scan the start of a Gerber file for its format, unit and apertures
pub fn sniff_gerber(content: &str) -> GerberHeader {
    let mut builder = FormatBuilder::new();
    let mut apertures = ApertureTable::new();
    let mut consumed = 0usize;

    for raw in content.split_inclusive('\n') {
        consumed += raw.len();
        let line = raw.trim();

        if line.starts_with("%FS") {
            match parse_format_spec(line) {
                Ok(Some(format)) => {
                    debug!("Coordinate format: {}", format);
                    builder.set_coordinate_format(format);
                }
                Ok(None) => warn!("Unrecognised format parameter: {}", line),
                Err(e) => warn!("{}, using default format", e),
            }
        } else if line.starts_with("%MO") {
            if let Some(unit) = parse_unit(line) {
                debug!("File unit: {}", unit);
                builder.set_unit(unit);
            }
        } else if line.starts_with("%ADD") {
            match parse_aperture(line) {
                Some((code, aperture)) => {
                    apertures.insert(code, aperture);
                }
                None => debug!("Skipping aperture definition: {}", line),
            }
        }

        if consumed > GERBER_SNIFF_LIMIT {
            break;
        }
    }

    let format_declared = builder.has_coordinate_format();
    if !format_declared {
        info!("No format specification found, using defaults");
    }

    GerberHeader {
        descriptor: builder.build_gerber(),
        apertures,
        format_declared,
    }
}

/// Verdict of the Excellon indicator scan
#[derive(Debug, Clone)]
pub struct DrillProbe {
    pub descriptor: FormatDescriptor,
    pub is_drill_file: bool,
    pub indicators: Vec<&'static str>,
}

/// Scan a whole drill candidate for Excellon indicator tokens
pub fn sniff_excellon(content: &str) -> DrillProbe {
    let upper = content.to_uppercase();
    let indicators: Vec<&'static str> = DRILL_INDICATORS
        .iter()
        .copied()
        .filter(|token| upper.contains(token))
        .collect();
    let is_drill_file = indicators.len() >= DRILL_INDICATOR_THRESHOLD;

    let mut builder = FormatBuilder::new();
    if is_drill_file {
        let unit = if INCH_INDICATORS.iter().any(|token| upper.contains(token)) {
            Unit::Imperial
        } else {
            Unit::Metric
        };
        builder.set_unit(unit);
        info!(
            "Recognised drill file ({} indicators: {}), unit {}",
            indicators.len(),
            indicators.join(", "),
            unit
        );
    } else {
        warn!(
            "Not recognised as a drill file ({} indicator(s) found)",
            indicators.len()
        );
    }

    DrillProbe {
        descriptor: builder.build_excellon(),
        is_drill_file,
        indicators,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::NumericEncoding;

    const KICAD_HEADER: &str = "G04 #@! TF.GenerationSoftware,KiCad,Pcbnew*\n\
        %FSLAX46Y46*%\n\
        G04 Gerber Fmt 4.6, Leading zero omitted, Abs format (unit mm)*\n\
        %MOMM*%\n\
        %LPD*%\n\
        %ADD10C,0.150000*%\n\
        %ADD11R,1.700000X1.700000*%\n\
        %ADD12O,1.700000X1.700000*%\n\
        %AMRoundRect*\n\
        1,1,0.2,0,0*%\n\
        %ADD13RoundRect,0.25X0.5*%\n";

    #[test]
    fn test_kicad_header() {
        let header = sniff_gerber(KICAD_HEADER);
        assert!(header.format_declared);
        assert_eq!(header.descriptor.unit, Unit::Metric);
        assert_eq!(
            header.descriptor.encoding,
            NumericEncoding::Gerber(CoordinateFormat {
                zero_omission: ZeroOmission::Trailing,
                notation: Notation::Absolute,
                integer_digits: 4,
                decimal_digits: 6,
            })
        );
        assert_eq!(header.apertures.len(), 3);
        assert_eq!(header.apertures[&11].shape, ApertureShape::Rectangle);
        assert_eq!(header.apertures[&10].parameters, "0.150000");
        assert!(!header.apertures.contains_key(&13));
    }

    #[test]
    fn test_inch_trailing_header() {
        let header = sniff_gerber("%FSLTX24Y24*%\n%MOIN*%\n");
        let format = header.coordinate_format();
        assert_eq!(header.descriptor.unit, Unit::Imperial);
        assert_eq!(format.zero_omission, ZeroOmission::Trailing);
        assert_eq!((format.integer_digits, format.decimal_digits), (2, 4));
    }

    #[test]
    fn test_incremental_notation() {
        let header = sniff_gerber("%FSLIX35Y35*%\n");
        assert_eq!(header.coordinate_format().notation, Notation::Incremental);
    }

    #[test]
    fn test_unsupported_format_letters_use_defaults() {
        let header = sniff_gerber("%FSTAX24Y24*%\n%MOIN*%\n");
        assert!(!header.format_declared);
        assert_eq!(header.coordinate_format().zero_omission, ZeroOmission::Leading);
        assert_eq!(header.descriptor.unit, Unit::Imperial);
    }

    #[test]
    fn test_missing_header_uses_defaults() {
        let header = sniff_gerber("G04 nothing here*\nX100Y100D02*\n");
        assert!(!header.format_declared);
        assert_eq!(header.coordinate_format(), CoordinateFormat::default());
        assert_eq!(header.descriptor.unit, Unit::Metric);
    }

    #[test]
    fn test_scan_stops_after_byte_limit() {
        let filler = "G04 padding comment line for the header scan*\n".repeat(60);
        let content = format!("{}%FSLAX24Y24*%\n%MOIN*%\n", filler);
        let header = sniff_gerber(&content);
        assert!(!header.format_declared);
        assert_eq!(header.descriptor.unit, Unit::Metric);
    }

    #[test]
    fn test_drill_file_metric() {
        let probe = sniff_excellon("M48\nMETRIC,TZ\nT1C0.800\n%\nT1\nX1.5Y2.25\nM30\n");
        assert!(probe.is_drill_file);
        assert_eq!(probe.descriptor.unit, Unit::Metric);
        assert!(probe.indicators.contains(&"M48"));
        assert!(probe.indicators.contains(&"T1C"));
    }

    #[test]
    fn test_drill_file_inch() {
        let probe = sniff_excellon("M48\nINCH,LZ\nT01C0.0320\n%\nM30\n");
        assert!(probe.is_drill_file);
        assert_eq!(probe.descriptor.unit, Unit::Imperial);
    }

    #[test]
    fn test_single_indicator_is_rejected() {
        let probe = sniff_excellon("Readme: this board is METRIC\nX1Y1\n");
        assert!(!probe.is_drill_file);
        assert_eq!(probe.indicators, vec!["METRIC"]);
    }

    #[test]
    fn test_drill_without_unit_defaults_to_metric() {
        let probe = sniff_excellon("M48\nFMAT,2\nT1C0.8\n%\n");
        assert!(probe.is_drill_file);
        assert_eq!(probe.descriptor.unit, Unit::Metric);
    }
}
