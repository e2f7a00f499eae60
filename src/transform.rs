//! Line-at-a-time rewriting shared by the Gerber and Excellon transformers
//!
//! Each dialect supplies an ordered table of shape matchers. A matcher either
//! declines the line or consumes it, emitting it verbatim or rewritten. Only
//! the trimmed body of a physical line is offered to the matchers; leading and
//! trailing whitespace and the original line terminator are put back as-is.

use crate::error::OffsetError;
use tracing::{debug, warn};

/// Number of rewrites echoed at debug level per file
const PREVIEW_REWRITES: usize = 3;

/// What a shape matcher decided for one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Not this shape; try the next matcher
    Declined,
    /// Consumed; emit the original text
    Verbatim,
    /// Consumed; emit this body instead
    Rewritten(String),
}

/// A shape matcher: inspect a trimmed line body and decide its fate
pub type ShapeMatcher<T> = fn(&mut T, &str) -> Result<Disposition, OffsetError>;

/// Per-file counters reported to the caller
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LineStats {
    pub lines: usize,
    pub coordinates_modified: usize,
    pub line_errors: usize,
    pub negative_coordinates: usize,
    pub arc_lines: usize,
}

/// One physical line split into its untouched framing and its body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalLine<'a> {
    pub leading: &'a str,
    pub body: &'a str,
    pub trailing: &'a str,
    pub ending: &'a str,
}

impl<'a> PhysicalLine<'a> {
    pub fn split(raw: &'a str) -> Self {
        let (content, ending) = if let Some(stripped) = raw.strip_suffix("\r\n") {
            (stripped, &raw[stripped.len()..])
        } else if let Some(stripped) = raw.strip_suffix('\n') {
            (stripped, &raw[stripped.len()..])
        } else {
            (raw, "")
        };

        let start = content.len() - content.trim_start().len();
        let end = content.trim_end().len().max(start);

        Self {
            leading: &content[..start],
            body: &content[start..end],
            trailing: &content[end..],
            ending,
        }
    }

    pub fn rebuild(&self, body: &str) -> String {
        format!("{}{}{}{}", self.leading, body, self.trailing, self.ending)
    }
}

/// A dialect-specific line rewriter
pub trait LineTransformer: Sized + 'static {
    /// Human-readable dialect name for diagnostics
    const DIALECT: &'static str;

    /// Ordered shape matchers; the first that does not decline wins
    fn shapes() -> &'static [ShapeMatcher<Self>];

    fn stats(&self) -> &LineStats;

    fn stats_mut(&mut self) -> &mut LineStats;

    /// Classify and rewrite a single physical line
    fn transform_line(&mut self, line_number: usize, raw: &str) -> String {
        let line = PhysicalLine::split(raw);
        self.stats_mut().lines += 1;

        for shape in Self::shapes() {
            match (*shape)(&mut *self, line.body) {
                Ok(Disposition::Declined) => continue,
                Ok(Disposition::Verbatim) => return raw.to_string(),
                Ok(Disposition::Rewritten(body)) => {
                    let stats = self.stats_mut();
                    stats.coordinates_modified += 1;
                    if stats.coordinates_modified <= PREVIEW_REWRITES {
                        debug!("{} line {}: {} -> {}", Self::DIALECT, line_number, line.body, body);
                    }
                    return line.rebuild(&body);
                }
                Err(e) => {
                    self.stats_mut().line_errors += 1;
                    let e = match e {
                        OffsetError::LineParseFailure { reason, .. } => {
                            OffsetError::LineParseFailure {
                                line: line_number,
                                reason,
                            }
                        }
                        other => other,
                    };
                    warn!("{} {}; kept original: {}", Self::DIALECT, e, line.body);
                    return raw.to_string();
                }
            }
        }

        raw.to_string()
    }

    /// Rewrite a whole decoded file
    fn transform(&mut self, content: &str) -> String {
        let mut output = String::with_capacity(content.len() + content.len() / 8);
        for (index, raw) in content.split_inclusive('\n').enumerate() {
            output.push_str(&self.transform_line(index + 1, raw));
        }
        output
    }
}

/// Parse the numeric part of a field like `X-1.25`, with the axis letter stripped
pub fn parse_decimal(field: &str) -> Result<f64, OffsetError> {
    let raw = field.get(1..).unwrap_or_default();
    raw.parse::<f64>().map_err(|e| OffsetError::LineParseFailure {
        line: 0,
        reason: format!("invalid number '{}': {}", field, e),
    })
}
