//! pcb-offset - Shift Gerber and Excellon coordinates by a constant offset
//!
//! Results are written to an `output` directory inside the input directory.

use pcb_offset::{
    config::Config,
    converter::{Converter, FileOutcome},
    error::Result,
};
use tracing::{error, info};

fn main() -> Result<()> {
    // Parse configuration and initialize logging
    let config = Config::from_args().unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    println!(
        "Offset: X={} {}, Y={} {}",
        config.offset_x, config.input_unit, config.offset_y, config.input_unit
    );

    let analyze = config.analyze;
    let output_dir = config.output_dir();
    let converter = Converter::new(config)?;

    if analyze {
        return match converter.analyze() {
            Ok(analyses) => {
                for analysis in analyses {
                    println!(
                        "{} [{}] {} (encoding {}, {})",
                        analysis.path.display(),
                        analysis.kind.as_str(),
                        analysis.descriptor,
                        analysis.encoding.name(),
                        if analysis.recognized {
                            "recognised"
                        } else {
                            "defaults / not recognised"
                        }
                    );
                    if analysis.apertures > 0 {
                        println!("  {} aperture definitions", analysis.apertures);
                    }
                    if !analysis.indicators.is_empty() {
                        println!("  drill indicators: {}", analysis.indicators.join(", "));
                    }
                }
                Ok(())
            }
            Err(e) => {
                error!("Analysis failed: {:#}", e);
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        };
    }

    match converter.run() {
        Ok(summary) => {
            for report in &summary.reports {
                match &report.outcome {
                    FileOutcome::Transformed => println!(
                        "  {} {}: {} coordinates modified, {} errors",
                        report.kind.as_str(),
                        report.file_name(),
                        report.stats.coordinates_modified,
                        report.stats.line_errors
                    ),
                    FileOutcome::Copied { reason } => println!(
                        "  {} {}: copied unchanged ({})",
                        report.kind.as_str(),
                        report.file_name(),
                        reason
                    ),
                    FileOutcome::Failed { reason } => println!(
                        "  {} {}: FAILED ({})",
                        report.kind.as_str(),
                        report.file_name(),
                        reason
                    ),
                }
            }

            let (drills_ok, drills) = summary.recognized_drill_files();
            if drills > 0 {
                println!("Valid drill files: {}/{}", drills_ok, drills);
            }
            println!("Total coordinates modified: {}", summary.total_modified());
            println!("Total errors: {}", summary.total_errors());
            println!("Output written to: {}", output_dir.display());
            info!("Processed {} files", summary.reports.len());
            Ok(())
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
