use tracing::{debug, info, warn};

use crate::config::ParserConfig;
use crate::lift::{FieldSlots, collapse_whitespace, lift_id_date_tokens};
use crate::model::{Charge, MAX_STREET_LINES, Record};
use crate::normalize::{normalize_date, normalize_name};
use crate::patterns::Patterns;

/// Visits allowed at one cursor position before the watchdog forces the
/// cursor forward. The transition table itself never loops; this is a
/// last-resort safety net.
const STALL_LIMIT: u32 = 1000;

/// A record under construction. Owns the append-only charge vector plus
/// the index of the charge that continuation lines fold into, so there is
/// no aliasing between "current record" and "last charge".
struct RecordBuilder {
    name: String,
    name_normalized: String,
    street: Vec<String>,
    identifier: Option<String>,
    cid: Option<String>,
    book_in_date: Option<String>,
    charges: Vec<Charge>,
    active_charge: Option<usize>,
    source_file: String,
    page_start: u32,
    warnings: Vec<String>,
}

impl RecordBuilder {
    fn new(source_file: &str, page: u32, name: &str) -> Self {
        Self {
            name: name.to_string(),
            name_normalized: normalize_name(name),
            street: Vec::new(),
            identifier: None,
            cid: None,
            book_in_date: None,
            charges: Vec::new(),
            active_charge: None,
            source_file: source_file.to_string(),
            page_start: page,
            warnings: Vec::new(),
        }
    }

    fn slots(&mut self) -> FieldSlots<'_> {
        FieldSlots {
            identifier: &mut self.identifier,
            cid: &mut self.cid,
            book_in_date: &mut self.book_in_date,
        }
    }

    fn add_warning(&mut self, warning: &str) {
        if !self.warnings.iter().any(|existing| existing == warning) {
            self.warnings.push(warning.to_string());
        }
    }

    fn push_street(&mut self, line: &str) {
        if self.street.len() < MAX_STREET_LINES {
            self.street.push(line.to_string());
        }
    }

    /// Lifts identifier/date tokens out of the line, then appends whatever
    /// text is left under the street cap.
    fn append_street_lifted(&mut self, patterns: &Patterns, line: &str) {
        let cleaned = lift_id_date_tokens(patterns, self.slots(), line);
        if !cleaned.is_empty() {
            self.push_street(&cleaned);
        }
    }

    fn push_charge(&mut self, booking_no: &str, description: &str) {
        self.charges.push(Charge::new(booking_no, description));
        self.active_charge = Some(self.charges.len() - 1);
    }

    fn has_active_charge(&self) -> bool {
        self.active_charge.is_some()
    }

    fn extend_active_charge(&mut self, text: &str) {
        if let Some(index) = self.active_charge {
            let charge = &mut self.charges[index];
            if charge.description.is_empty() {
                charge.description = text.to_string();
            } else {
                charge.description = format!("{} {}", charge.description, text);
            }
        }
    }

    /// Closes the record: the page span is frozen and warnings for missing
    /// fields are computed, each at most once.
    fn finalize(mut self, page_end: u32, ocr_used: bool) -> Record {
        if self.identifier.is_none() && self.cid.is_none() {
            self.add_warning("Missing identifier");
        }
        if self.book_in_date.is_none() {
            self.add_warning("Missing book-in date");
        }
        if self.charges.is_empty() {
            self.add_warning("No charges found");
        }
        if self.street.is_empty() {
            self.add_warning("Missing street");
        }

        Record {
            name: self.name,
            name_normalized: self.name_normalized,
            street: self.street,
            identifier: self.identifier,
            cid: self.cid,
            book_in_date: self.book_in_date,
            charges: self.charges,
            source_file: self.source_file,
            source_page_span: [self.page_start, page_end],
            parse_warnings: self.warnings,
            ocr_used,
        }
    }
}

/// Assembler state. Each capture state owns the record it is building, so
/// SEEK_NAME can never touch a half-built record.
enum State {
    SeekName,
    CaptureAddress(RecordBuilder),
    CaptureCharges(RecordBuilder),
}

/// Finite-state line classifier/assembler. Turns an ordered stream of raw
/// report lines into structured records; synchronous, deterministic, and
/// infallible (malformed input degrades to warnings, never errors).
pub struct Assembler<'a> {
    patterns: &'a Patterns,
    config: &'a ParserConfig,
}

impl<'a> Assembler<'a> {
    pub fn new(patterns: &'a Patterns, config: &'a ParserConfig) -> Self {
        Self { patterns, config }
    }

    pub fn assemble(&self, lines: &[String], source_file: &str, ocr_used: bool) -> Vec<Record> {
        info!(lines = lines.len(), source = source_file, "assembling records");

        let mut records = Vec::new();
        let mut state = State::SeekName;
        let mut page = 1_u32;
        let mut cursor = 0_usize;
        let mut last_cursor = usize::MAX;
        let mut stall_hits = 0_u32;

        while cursor < lines.len() {
            if cursor == last_cursor {
                stall_hits += 1;
                if stall_hits > STALL_LIMIT {
                    warn!(
                        line = cursor + 1,
                        "assembler made no progress; forcing advance"
                    );
                    cursor += 1;
                    stall_hits = 0;
                    continue;
                }
            } else {
                stall_hits = 0;
            }
            last_cursor = cursor;

            let line = lines[cursor].trim();
            if self.patterns.is_header_or_footer(line) {
                if let Some(number) = self.patterns.page_marker_number(line) {
                    page = number;
                } else if line.to_uppercase().starts_with("PAGE") && cursor + 1 < lines.len() {
                    // Tokenized footer: "Page:" on one line, "N of M" next.
                    if let Some(number) = self.patterns.page_fragment_number(&lines[cursor + 1]) {
                        page = number;
                        cursor += 1;
                    }
                }
                cursor += 1;
                continue;
            }

            state = match state {
                State::SeekName => self.seek_name(lines, &mut cursor, page, source_file),
                State::CaptureAddress(builder) => self.capture_address(
                    builder,
                    lines,
                    &mut cursor,
                    page,
                    source_file,
                    ocr_used,
                    &mut records,
                ),
                State::CaptureCharges(builder) => self.capture_charges(
                    builder,
                    lines,
                    &mut cursor,
                    page,
                    source_file,
                    ocr_used,
                    &mut records,
                ),
            };
        }

        // Input exhausted: close any open record as if a new name followed.
        match state {
            State::SeekName => {}
            State::CaptureAddress(builder) | State::CaptureCharges(builder) => {
                records.push(builder.finalize(page, ocr_used));
            }
        }

        info!(records = records.len(), source = source_file, "assembly finished");
        records
    }

    fn seek_name(&self, lines: &[String], cursor: &mut usize, page: u32, source_file: &str) -> State {
        let line = lines[*cursor].trim();

        if let Some(captures) = self.patterns.name_id_date.captures(line) {
            debug!(line, "name with id and date on one line");
            let mut builder = RecordBuilder::new(source_file, page, &captures["name"]);
            builder.identifier = Some(captures["id"].to_string());
            builder.book_in_date = Some(normalize_date(&captures["date"]));
            *cursor += 1;
            return State::CaptureAddress(builder);
        }

        if self.patterns.name_anchored.is_match(line) {
            // The id/date pair sometimes prints on the line above the name.
            if *cursor > 0 {
                if let Some(captures) = self.patterns.id_date.captures(lines[*cursor - 1].trim()) {
                    debug!(line, "name preceded by id/date line");
                    let mut builder = RecordBuilder::new(source_file, page, line);
                    builder.identifier = Some(captures["id"].to_string());
                    if let Some(cid) = captures.name("cid") {
                        builder.cid = Some(cid.as_str().to_string());
                    }
                    builder.book_in_date = Some(normalize_date(&captures["date"]));
                    *cursor += 1;
                    return State::CaptureAddress(builder);
                }
            }

            debug!(line, "name line");
            let builder = RecordBuilder::new(source_file, page, line);
            *cursor += 1;
            return State::CaptureAddress(builder);
        }

        *cursor += 1;
        State::SeekName
    }

    #[allow(clippy::too_many_arguments)]
    fn capture_address(
        &self,
        mut builder: RecordBuilder,
        lines: &[String],
        cursor: &mut usize,
        page: u32,
        source_file: &str,
        ocr_used: bool,
        records: &mut Vec<Record>,
    ) -> State {
        let line = lines[*cursor].trim();

        // Identifier/CID/date capture runs before any booking handling, but
        // only while both slots are still open.
        if builder.identifier.is_none() && builder.book_in_date.is_none() {
            let id_date = self
                .patterns
                .id_date
                .captures(line)
                .or_else(|| self.patterns.id_date_labelled.captures(line));
            if let Some(captures) = id_date {
                debug!(line, "id and date on one line");
                let whole = captures.get(0).expect("match has a group 0");
                builder.identifier = Some(captures["id"].to_string());
                if let Some(cid) = captures.name("cid") {
                    builder.cid = Some(cid.as_str().to_string());
                }
                builder.book_in_date = Some(normalize_date(&captures["date"]));

                let prefix = line[..whole.start()].trim();
                if !prefix.is_empty() {
                    builder.append_street_lifted(self.patterns, prefix);
                }

                let suffix = line[whole.end()..].trim();
                let mut charges_started = false;
                if !suffix.is_empty() {
                    if let Some(booking) = self.patterns.booking_flex.captures(suffix) {
                        let description = booking
                            .name("desc")
                            .map(|m| m.as_str().trim().to_string())
                            .unwrap_or_default();
                        let description =
                            lift_id_date_tokens(self.patterns, builder.slots(), &description);
                        builder.push_charge(&booking["booking"], &description);
                        charges_started = true;
                    } else {
                        builder.append_street_lifted(self.patterns, suffix);
                    }
                }

                *cursor += 1;
                return if charges_started {
                    State::CaptureCharges(builder)
                } else {
                    State::CaptureAddress(builder)
                };
            }

            // Split form: bare identifier line, optional CID line, date line.
            if self.config.allow_two_line_id_date {
                if let Some(captures) = self.patterns.bare_identifier.captures(line) {
                    let id_value = captures["id"].to_string();
                    let next = lines.get(*cursor + 1).map(|l| l.trim()).unwrap_or("");
                    let next2 = lines.get(*cursor + 2).map(|l| l.trim()).unwrap_or("");

                    let cid_from_next = self
                        .patterns
                        .cid_inline
                        .captures(next)
                        .or_else(|| self.patterns.bare_cid.captures(next))
                        .map(|c| c["cid"].to_string());
                    let date_from_next = self
                        .patterns
                        .bare_date
                        .captures(next)
                        .map(|c| c["date"].to_string());
                    let date_from_next2 = self
                        .patterns
                        .bare_date
                        .captures(next2)
                        .map(|c| c["date"].to_string());

                    if let Some(cid_value) = cid_from_next {
                        if let Some(date_value) =
                            date_from_next.as_ref().or(date_from_next2.as_ref())
                        {
                            debug!(line, "identifier, cid and date split across lines");
                            builder.identifier = Some(id_value);
                            builder.cid = Some(cid_value);
                            builder.book_in_date = Some(normalize_date(date_value));
                            *cursor += if date_from_next.is_some() { 2 } else { 3 };
                            return State::CaptureAddress(builder);
                        }
                    } else if let Some(date_value) = date_from_next {
                        debug!(line, "identifier and date split across lines");
                        builder.identifier = Some(id_value);
                        builder.book_in_date = Some(normalize_date(&date_value));
                        *cursor += 1;
                        return State::CaptureAddress(builder);
                    }
                }
            }

            // Loose fallbacks for CID values stranded in address text.
            if builder.cid.is_none() {
                if let Some(captures) = self.patterns.cid_inline.captures(line) {
                    builder.cid = Some(captures["cid"].to_string());
                } else if let Some(captures) = self.patterns.state_cid_tail.captures(line) {
                    builder.cid = Some(captures["cid"].to_string());
                }
            }
        }

        // Exact standalone booking number: the next line is its description
        // when it reads like charge text.
        if self.patterns.booking_exact.is_match(line) && *cursor + 1 < lines.len() {
            let next = lines[*cursor + 1].trim();
            if self.patterns.looks_like_charge_text(next) {
                debug!(line, next, "booking number with description on next line");
                builder.push_charge(line, next);
                *cursor += 2;
            } else {
                debug!(line, "booking number without description");
                builder.push_charge(line, "");
                *cursor += 1;
            }
            return State::CaptureCharges(builder);
        }

        // Booking number embedded anywhere in the line.
        if let Some(captures) = self.patterns.booking_flex.captures(line) {
            debug!(line, "booking line");
            let booking = captures["booking"].to_string();
            let before = captures["prefix"].trim().to_string();
            let after = captures
                .name("desc")
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();

            if !before.is_empty() && self.patterns.looks_like_charge_text(&before) {
                builder.push_charge(&booking, &before);
                if !after.is_empty() {
                    builder.push_charge(&booking, &after);
                }
            } else {
                let mut description = collapse_whitespace(&format!("{before} {after}"));
                if description.is_empty() {
                    // A charge line may already have been mistaken for
                    // street noise; fold it back in.
                    if let Some(previous) = builder.street.last() {
                        if self.patterns.looks_like_charge_text(previous) {
                            description = builder.street.pop().unwrap_or_default();
                        }
                    }
                }
                // An embedded name means the description swallowed the next
                // inmate's block; split before lifting so that inmate's
                // tokens are not stolen into this record.
                if self.patterns.find_embedded_name(&description).is_some() {
                    builder.push_charge(&booking, "");
                    return self.split_embedded(
                        builder,
                        &description,
                        cursor,
                        page,
                        source_file,
                        ocr_used,
                        records,
                    );
                }
                let description = lift_id_date_tokens(self.patterns, builder.slots(), &description);
                builder.push_charge(&booking, &description);
            }
            *cursor += 1;
            return State::CaptureCharges(builder);
        }

        // Lookahead: charge text now, booking-only line next.
        if self.patterns.looks_like_charge_text(line) && *cursor + 1 < lines.len() {
            let next = lines[*cursor + 1].trim();
            if self.patterns.booking_exact.is_match(next) {
                debug!(line, next, "charge text followed by bare booking number");
                builder.push_charge(next, line);
                *cursor += 2;
                return State::CaptureCharges(builder);
            }
        }

        // A new name before this record completed.
        if self.patterns.name_anchored.is_match(line) {
            debug!(line, "new name before record completed");
            builder.add_warning("Incomplete record (missing ID/Date)");
            records.push(builder.finalize(page, ocr_used));
            let next_builder = RecordBuilder::new(source_file, page, line);
            *cursor += 1;
            return State::CaptureAddress(next_builder);
        }

        // Recognized address shapes.
        if self.patterns.city_state_zip.is_match(line)
            || self.patterns.street_address.is_match(line)
            || self.patterns.apt_unit.is_match(line)
        {
            builder.append_street_lifted(self.patterns, line);
            *cursor += 1;
            return State::CaptureAddress(builder);
        }

        // A booking number hiding in what looked like an address line.
        if self.patterns.booking_anywhere.is_match(line) {
            if let Some(captures) = self.patterns.booking_with_desc.captures(line) {
                debug!(line, "booking number inside address-looking line");
                builder.push_charge(&captures["booking"], captures["desc"].trim());
                *cursor += 1;
                return State::CaptureCharges(builder);
            }
            builder.push_street(line);
            *cursor += 1;
            return State::CaptureAddress(builder);
        }

        // Fallback: keep lines carrying address tokens, lift stray id/date
        // tokens from the rest, discard what remains.
        if self.patterns.has_address_tokens(line) {
            builder.append_street_lifted(self.patterns, line);
        } else {
            let residual = lift_id_date_tokens(self.patterns, builder.slots(), line);
            if !residual.is_empty() && self.patterns.looks_like_charge_text(&residual) {
                debug!(line, "charge-like residue outside charge capture");
            } else {
                debug!(line, "discarding unrecognized line");
            }
        }
        *cursor += 1;
        State::CaptureAddress(builder)
    }

    #[allow(clippy::too_many_arguments)]
    fn capture_charges(
        &self,
        mut builder: RecordBuilder,
        lines: &[String],
        cursor: &mut usize,
        page: u32,
        source_file: &str,
        ocr_used: bool,
        records: &mut Vec<Record>,
    ) -> State {
        let line = lines[*cursor].trim();

        // A new anchored name closes this record.
        if self.patterns.name_anchored.is_match(line) {
            debug!(line, "new name; finalizing record");
            records.push(builder.finalize(page, ocr_used));
            let next_builder = RecordBuilder::new(source_file, page, line);
            *cursor += 1;
            return State::CaptureAddress(next_builder);
        }

        // A booking anywhere starts a new charge; text before it continues
        // the previous one.
        if let Some(captures) = self.patterns.booking_flex.captures(line) {
            let booking = captures["booking"].to_string();
            let before = captures["prefix"].trim().to_string();
            let after = captures
                .name("desc")
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();

            if builder.has_active_charge() && !before.is_empty() {
                let continuation = lift_id_date_tokens(self.patterns, builder.slots(), &before);
                if !continuation.is_empty() {
                    builder.extend_active_charge(&continuation);
                }
            }
            // Same boundary hazard as in address capture: a name inside the
            // description marks the start of the next record.
            if self.patterns.find_embedded_name(&after).is_some() {
                builder.push_charge(&booking, "");
                return self.split_embedded(
                    builder, &after, cursor, page, source_file, ocr_used, records,
                );
            }
            let description = lift_id_date_tokens(self.patterns, builder.slots(), &after);
            if before.is_empty() && description.is_empty() {
                // Booking-only line with nothing to attach.
                *cursor += 1;
                return State::CaptureCharges(builder);
            }
            debug!(line, booking = %booking, "new charge");
            builder.push_charge(&booking, &description);
            *cursor += 1;
            return State::CaptureCharges(builder);
        }

        // Charge-ish continuation, possibly hiding one or more embedded
        // names marking record boundaries.
        if builder.has_active_charge() && self.patterns.looks_like_charge_text(line) {
            if self.patterns.find_embedded_name(line).is_some() {
                return self.split_embedded(builder, line, cursor, page, source_file, ocr_used, records);
            }
            let continuation = lift_id_date_tokens(self.patterns, builder.slots(), line);
            if !continuation.is_empty() {
                builder.extend_active_charge(&continuation);
            }
            *cursor += 1;
            return State::CaptureCharges(builder);
        }

        // Address-shaped lines: street for the open record, unless the
        // previous charge hides the name of the person they belong to.
        if self.patterns.city_state_zip.is_match(line) || self.patterns.street_address.is_match(line)
        {
            return self.recover_or_push_street(builder, line, cursor, page, ocr_used, source_file, records);
        }

        // Embedded name in otherwise unclassified text.
        if self.patterns.find_embedded_name(line).is_some() {
            return self.split_embedded(builder, line, cursor, page, source_file, ocr_used, records);
        }

        // Default: continuation of the active charge.
        if builder.has_active_charge() {
            let continuation = lift_id_date_tokens(self.patterns, builder.slots(), line);
            if !continuation.is_empty() {
                builder.extend_active_charge(&continuation);
            }
        } else {
            debug!(line, "text after id with no booking number");
            builder.add_warning("Text after ID with no booking number");
        }
        *cursor += 1;
        State::CaptureCharges(builder)
    }

    /// Splits a line at embedded names: text before the first name extends
    /// the active charge, every name starts a new record, and trailing text
    /// is re-run through the id/date/booking logic. Terminates because each
    /// fragment consumes one name token.
    #[allow(clippy::too_many_arguments)]
    fn split_embedded(
        &self,
        builder: RecordBuilder,
        line: &str,
        cursor: &mut usize,
        page: u32,
        source_file: &str,
        ocr_used: bool,
        records: &mut Vec<Record>,
    ) -> State {
        let fragments = self.patterns.split_on_embedded_names(line);
        debug!(line, fragments = fragments.len(), "splitting on embedded names");

        let mut current = builder;
        let mut charges_started = false;
        for fragment in fragments {
            match fragment.name {
                None => {
                    let text = lift_id_date_tokens(self.patterns, current.slots(), &fragment.text);
                    if !text.is_empty() && current.has_active_charge() {
                        current.extend_active_charge(&text);
                    }
                }
                Some(name) => {
                    records.push(current.finalize(page, ocr_used));
                    let mut next = RecordBuilder::new(source_file, page, &name.raw);
                    charges_started = self.apply_fragment_text(&mut next, &fragment.text);
                    current = next;
                }
            }
        }

        *cursor += 1;
        if charges_started {
            State::CaptureCharges(current)
        } else {
            State::CaptureAddress(current)
        }
    }

    /// Text following an embedded name: lift id/date tokens, then treat
    /// what is left as either the first charge or a street line.
    fn apply_fragment_text(&self, builder: &mut RecordBuilder, text: &str) -> bool {
        let residual = lift_id_date_tokens(self.patterns, builder.slots(), text);
        if residual.is_empty() {
            return false;
        }
        if let Some(captures) = self.patterns.booking_with_desc.captures(&residual) {
            builder.push_charge(&captures["booking"], captures["desc"].trim());
            return true;
        }
        builder.push_street(&residual);
        false
    }

    /// An address-shaped line in charge capture usually means the assembler
    /// missed a record boundary; try to recover the name from the previous
    /// charge description before treating the line as street.
    #[allow(clippy::too_many_arguments)]
    fn recover_or_push_street(
        &self,
        mut builder: RecordBuilder,
        line: &str,
        cursor: &mut usize,
        page: u32,
        ocr_used: bool,
        source_file: &str,
        records: &mut Vec<Record>,
    ) -> State {
        if let Some(last) = builder.charges.last() {
            if let Some(capture) = self.patterns.find_embedded_name(&last.description) {
                debug!(line, name = %capture.raw, "recovered name from previous charge");
                let index = builder.charges.len() - 1;
                let truncated = last.description[..capture.start].trim().to_string();
                builder.charges[index].description = truncated;
                records.push(builder.finalize(page, ocr_used));

                let mut next_builder = RecordBuilder::new(source_file, page, &capture.raw);
                next_builder.push_street(line);
                *cursor += 1;
                return State::CaptureAddress(next_builder);
            }
        }

        builder.push_street(line);
        *cursor += 1;
        State::CaptureCharges(builder)
    }
}
