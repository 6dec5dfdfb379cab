use serde::{Deserialize, Serialize};

/// Maximum number of street lines a record may carry. Overflow is dropped,
/// not an error; book-in reports never print more than three address lines
/// per inmate, so anything beyond that is cross-field bleed.
pub const MAX_STREET_LINES: usize = 3;

/// A single booking charge. Two charges with the same booking number are
/// never merged; keeping them separate preserves the granularity of the
/// source report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charge {
    /// Format: NN-NNNNNNN (two digits, dash, six or seven digits).
    pub booking_no: String,
    /// Free-text offense description.
    pub description: String,
}

impl Charge {
    pub fn new(booking_no: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            booking_no: booking_no.into(),
            description: description.into().trim().to_string(),
        }
    }
}

/// One extracted inmate booking record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// As printed: "LASTNAME, FIRST MIDDLE".
    pub name: String,
    /// Title-cased "First Middle Last"; empty when the name was malformed.
    pub name_normalized: String,
    /// Up to [`MAX_STREET_LINES`] street/address lines.
    pub street: Vec<String>,
    /// Person-level 5-8 digit identifier; takes priority over `cid`.
    pub identifier: Option<String>,
    /// Secondary numeric person id, only kept when `identifier` is set.
    pub cid: Option<String>,
    /// ISO-8601 date (YYYY-MM-DD) when it could be normalized.
    pub book_in_date: Option<String>,
    pub charges: Vec<Charge>,
    pub source_file: String,
    /// [first_page, last_page] the record spans in the source document.
    pub source_page_span: [u32; 2],
    /// Distinct best-effort parse warnings, in the order they were raised.
    pub parse_warnings: Vec<String>,
    /// Whether the upstream extraction fell back to OCR.
    pub ocr_used: bool,
}

impl Record {
    /// Records a warning at most once, preserving insertion order.
    pub fn add_warning(&mut self, warning: &str) {
        if !self.parse_warnings.iter().any(|existing| existing == warning) {
            self.parse_warnings.push(warning.to_string());
        }
    }

    /// Appends a street line unless the cap is already reached.
    pub fn push_street(&mut self, line: impl Into<String>) {
        if self.street.len() < MAX_STREET_LINES {
            self.street.push(line.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_warning_deduplicates_but_keeps_order() {
        let mut record = sample_record();
        record.add_warning("Missing street");
        record.add_warning("Missing identifier");
        record.add_warning("Missing street");
        assert_eq!(
            record.parse_warnings,
            vec!["Missing street".to_string(), "Missing identifier".to_string()]
        );
    }

    #[test]
    fn push_street_drops_overflow_silently() {
        let mut record = sample_record();
        for line in ["123 MAIN ST", "APT 4B", "ANYTOWN, TX 12345", "EXTRA LINE"] {
            record.push_street(line);
        }
        assert_eq!(record.street.len(), MAX_STREET_LINES);
        assert_eq!(record.street[2], "ANYTOWN, TX 12345");
    }

    #[test]
    fn record_serializes_with_page_span_as_array() {
        let record = sample_record();
        let value = serde_json::to_value(&record).expect("record should serialize");
        assert_eq!(value["source_page_span"], serde_json::json!([1, 1]));
        assert_eq!(value["identifier"], serde_json::Value::Null);
    }

    fn sample_record() -> Record {
        Record {
            name: "SMITH, JOHN".to_string(),
            name_normalized: "John Smith".to_string(),
            street: Vec::new(),
            identifier: None,
            cid: None,
            book_in_date: None,
            charges: Vec::new(),
            source_file: "report.pdf".to_string(),
            source_page_span: [1, 1],
            parse_warnings: Vec::new(),
            ocr_used: false,
        }
    }
}
