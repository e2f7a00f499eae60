// SPDX-FileCopyrightText: 2025 HalfSweet
// SPDX-License-Identifier: Apache-2.0

//! pcb-offset - Shift Gerber and Excellon fabrication files by a constant offset
//!
//! Every absolute X/Y coordinate is translated and re-encoded in the source
//! file's own numeric convention; everything else is left byte-for-byte as it
//! was. Arc centre offsets (I/J) are relative and never shifted.

pub mod config;
pub mod converter;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod excellon;
pub mod format;
pub mod gerber;
pub mod offset;
pub mod patterns;
pub mod progress;
pub mod sniff;
pub mod transform;

pub use engine::{offset_excellon, offset_gerber, Rewrite};
pub use format::{CoordinateFormat, FormatDescriptor, Unit, ZeroOmission};
pub use offset::OffsetSpec;
