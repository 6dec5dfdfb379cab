//! Record assembly for county jail book-in reports.
//!
//! The input is an ordered stream of text lines recovered from a report
//! (native PDF text or OCR, produced upstream); the output is a list of
//! structured inmate records with name, identifier, CID, book-in date,
//! street lines and charges. Extraction never fails on malformed input:
//! whatever cannot be recovered turns into per-record parse warnings.
//!
//! The pipeline has two stages. [`assembler::Assembler`] runs a
//! finite-state pass over the lines and builds records in document order;
//! [`postprocess::post_process`] then repairs records that bled into each
//! other and scrubs names, addresses and charge descriptions. Both stages
//! share one compiled [`patterns::Patterns`] set so live parsing and
//! cleanup cannot drift apart.

pub mod assembler;
pub mod config;
pub mod lift;
pub mod model;
pub mod normalize;
pub mod patterns;
pub mod postprocess;

pub use assembler::Assembler;
pub use config::ParserConfig;
pub use model::{Charge, MAX_STREET_LINES, Record};
pub use patterns::Patterns;
pub use postprocess::post_process;

use anyhow::Result;

/// Runs the full pipeline over `lines`: pattern compilation, assembly,
/// post-processing. `source_file` and `ocr_used` are carried onto every
/// record unchanged. Fails only when the configuration holds an invalid
/// regex; malformed report text degrades to warnings instead.
pub fn extract_records(
    lines: &[String],
    source_file: &str,
    ocr_used: bool,
    config: &ParserConfig,
) -> Result<Vec<Record>> {
    let patterns = Patterns::compile(config)?;
    let assembler = Assembler::new(&patterns, config);
    let records = assembler.assemble(lines, source_file, ocr_used);
    Ok(post_process(records, &patterns))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn full_pipeline_extracts_a_clean_record() {
        let input = lines(&[
            "Inmates Booked In During the Past 24 Hours",
            "Page: 1 of 1",
            "SMITH, JOHN",
            "123 MAIN ST",
            "FTW TX 76104",
            "12345678 01/02/2025",
            "25-0123456 NO VALID DL",
        ]);

        let records = extract_records(&input, "report.pdf", false, &ParserConfig::default())
            .expect("extraction should succeed");

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.name, "SMITH, JOHN");
        assert_eq!(record.name_normalized, "John Smith");
        assert_eq!(record.street, vec!["123 MAIN ST", "FORT WORTH TX 76104"]);
        assert_eq!(record.identifier.as_deref(), Some("12345678"));
        assert_eq!(record.book_in_date.as_deref(), Some("2025-01-02"));
        assert_eq!(record.charges, vec![Charge::new("25-0123456", "NO VALID DL")]);
        assert!(record.parse_warnings.is_empty());
        assert!(!record.ocr_used);
    }

    #[test]
    fn full_pipeline_splits_records_absorbed_into_charge_text() {
        let input = lines(&[
            "SMITH, JOHN",
            "123 MAIN ST",
            "1234567 01/02/2025",
            "25-0123456 EVADING ARREST WYATT, JOSH 7654321 10/15/2025",
        ]);

        let records = extract_records(&input, "report.pdf", false, &ParserConfig::default())
            .expect("extraction should succeed");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "SMITH, JOHN");
        assert_eq!(
            records[0].charges,
            vec![Charge::new("25-0123456", "EVADING ARREST")]
        );
        assert_eq!(records[1].name, "WYATT, JOSH");
        assert_eq!(records[1].identifier.as_deref(), Some("7654321"));
        assert_eq!(records[1].book_in_date.as_deref(), Some("2025-10-15"));
    }

    #[test]
    fn invalid_header_pattern_is_a_configuration_error() {
        let config = ParserConfig {
            header_patterns: vec!["([unclosed".to_string()],
            ..ParserConfig::default()
        };

        let result = extract_records(&lines(&["SMITH, JOHN"]), "report.pdf", false, &config);
        assert!(result.is_err());
    }
}
