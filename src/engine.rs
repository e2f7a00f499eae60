//! Text-level entry points: sniff a decoded file, convert the offset, rewrite
//!
//! Nothing here touches the filesystem, so callers decide how content is read
//! and where results go.

use crate::excellon::DrillTransformer;
use crate::format::Notation;
use crate::gerber::GerberTransformer;
use crate::offset::OffsetSpec;
use crate::sniff::{sniff_excellon, sniff_gerber, DrillProbe, GerberHeader};
use crate::transform::{LineStats, LineTransformer};
use tracing::{info, warn};

/// What happened to a file's text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    /// Coordinates were offset
    Transformed { text: String, stats: LineStats },
    /// The file must be copied unchanged
    Passthrough { reason: String },
}

impl Rewrite {
    pub fn stats(&self) -> LineStats {
        match self {
            Rewrite::Transformed { stats, .. } => *stats,
            Rewrite::Passthrough { .. } => LineStats::default(),
        }
    }
}

/// Offset every absolute coordinate of a decoded Gerber file
pub fn offset_gerber(content: &str, offset: &OffsetSpec) -> (GerberHeader, Rewrite) {
    let header = sniff_gerber(content);
    let format = header.coordinate_format();

    if format.notation == Notation::Incremental {
        warn!("Incremental coordinate notation; file left unchanged");
        return (
            header,
            Rewrite::Passthrough {
                reason: "incremental notation".to_string(),
            },
        );
    }

    let coordinate_offset = offset.to_coordinate(header.descriptor.unit, &format);
    info!(
        "Gerber format {}, unit {}, offset X {} Y {} (coordinate units)",
        format, header.descriptor.unit, coordinate_offset.dx, coordinate_offset.dy
    );

    let mut transformer = GerberTransformer::new(format, coordinate_offset);
    let text = transformer.transform(content);
    let stats = *transformer.stats();

    if stats.arc_lines > 0 {
        info!("Handled {} arc lines", stats.arc_lines);
    }
    if stats.negative_coordinates > 0 {
        warn!(
            "{} lines produced negative coordinates",
            stats.negative_coordinates
        );
    }

    (header, Rewrite::Transformed { text, stats })
}

/// Offset every coordinate of a decoded drill file, if it is one
pub fn offset_excellon(content: &str, offset: &OffsetSpec) -> (DrillProbe, Rewrite) {
    let probe = sniff_excellon(content);

    if !probe.is_drill_file {
        return (
            probe,
            Rewrite::Passthrough {
                reason: "not recognised as a drill file".to_string(),
            },
        );
    }

    let native = offset.to_native(probe.descriptor.unit);
    info!(
        "Drill unit {}, offset X {:.6} Y {:.6}",
        probe.descriptor.unit, native.dx, native.dy
    );

    let mut transformer = DrillTransformer::new(native);
    let text = transformer.transform(content);
    let stats = *transformer.stats();

    if stats.coordinates_modified == 0 {
        warn!("No coordinates found to modify");
    }

    (probe, Rewrite::Transformed { text, stats })
}
