use tracing::{debug, info};

use crate::lift::{FieldSlots, collapse_whitespace, lift_id_date_tokens, remove_span};
use crate::model::{Charge, MAX_STREET_LINES, Record};
use crate::normalize::normalize_name;
use crate::patterns::{NameCapture, Patterns};

/// Cleans up assembled records: splits off records absorbed into charge
/// text, scrubs names, street lines and charge descriptions, and validates
/// every record. Running the pass twice yields the same output.
pub fn post_process(records: Vec<Record>, patterns: &Patterns) -> Vec<Record> {
    let before = records.len();
    let mut repaired = Vec::with_capacity(records.len());
    for record in records {
        split_absorbed_records(record, patterns, &mut repaired);
    }

    for record in &mut repaired {
        clean_name(record, patterns);
        clean_address(&mut record.street, &record.charges, patterns);
        clean_charges(&mut record.charges, &record.street, patterns);
        validate(record);
    }

    info!(before, after = repaired.len(), "post-processing finished");
    repaired
}

fn slots(record: &mut Record) -> FieldSlots<'_> {
    FieldSlots {
        identifier: &mut record.identifier,
        cid: &mut record.cid,
        book_in_date: &mut record.book_in_date,
    }
}

/// A charge description that swallowed the start of the next inmate's
/// block still carries that inmate's name. Split such descriptions on the
/// embedded names and spawn one record per name, placed right after the
/// parent so document order is preserved.
fn split_absorbed_records(mut record: Record, patterns: &Patterns, out: &mut Vec<Record>) {
    let mut spawned = Vec::new();

    for index in 0..record.charges.len() {
        let description = record.charges[index].description.clone();
        if patterns.find_embedded_name(&description).is_none() {
            continue;
        }

        debug!(description = %description, "splitting absorbed record out of charge text");
        let mut kept = String::new();
        for fragment in patterns.split_on_embedded_names(&description) {
            match fragment.name {
                None => kept = fragment.text,
                Some(name) => {
                    spawned.push(record_from_fragment(&name, &fragment.text, &record, patterns));
                }
            }
        }
        record.charges[index].description = kept;
    }

    out.push(record);
    out.append(&mut spawned);
}

fn record_from_fragment(
    name: &NameCapture,
    trailing: &str,
    parent: &Record,
    patterns: &Patterns,
) -> Record {
    let last_page = parent.source_page_span[1];
    let mut record = Record {
        name: name.raw.clone(),
        name_normalized: normalize_name(&name.raw),
        street: Vec::new(),
        identifier: None,
        cid: None,
        book_in_date: None,
        charges: Vec::new(),
        source_file: parent.source_file.clone(),
        source_page_span: [last_page, last_page],
        parse_warnings: Vec::new(),
        ocr_used: parent.ocr_used,
    };

    let residual = lift_id_date_tokens(patterns, slots(&mut record), trailing);
    if !residual.is_empty() {
        if let Some(captures) = patterns.booking_with_desc.captures(&residual) {
            record
                .charges
                .push(Charge::new(&captures["booking"], captures["desc"].trim()));
        } else {
            record.push_street(&residual);
        }
    }
    record
}

/// Strips charge residue and other non-name junk that leaked in front of
/// the last name ("EVADING ARREST 25-0123456 SMITH, JOHN").
fn clean_name(record: &mut Record, patterns: &Patterns) {
    let Some((last_part, first_part)) = record.name.split_once(',') else {
        return;
    };
    if !patterns.charge_description_hint.is_match(last_part) {
        return;
    }

    if let Some(captures) = patterns.trailing_name.captures(last_part.trim()) {
        let cleaned = format!("{}, {}", captures["last"].trim(), first_part.trim());
        if cleaned != record.name {
            debug!(from = %record.name, to = %cleaned, "cleaned name");
            record.name = cleaned;
            record.name_normalized = normalize_name(&record.name);
        }
    }
}

/// Drops street lines that are really dates, charge text or booking
/// numbers, normalizes city spellings, and re-joins fragments the source
/// layout broke apart.
fn clean_address(street: &mut Vec<String>, charges: &[Charge], patterns: &Patterns) {
    let mut kept = Vec::new();

    for line in street.iter() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // A booking number means the tail is charge data; only the prefix
        // can still be address text.
        if let Some(matched) = patterns.booking_anywhere.find(line) {
            let prefix = line[..matched.start()].trim();
            if !prefix.is_empty() && is_valid_address_line(prefix, charges, patterns) {
                kept.push(prefix.to_string());
            }
            continue;
        }

        if patterns.date_anywhere.is_match(line) {
            continue;
        }
        if patterns.charge_description_hint.is_match(line) {
            continue;
        }

        if patterns.city_state_zip.is_match(line)
            || patterns.street_address.is_match(line)
            || patterns.apt_unit.is_match(line)
            || patterns.plain_address_charset.is_match(line)
        {
            kept.push(line.to_string());
            continue;
        }

        if let Some(matched) = patterns.name_loose.find(line) {
            let prefix = line[..matched.start()].trim();
            if !prefix.is_empty() && is_valid_address_line(prefix, charges, patterns) {
                kept.push(prefix.to_string());
            }
        } else if is_valid_address_line(line, charges, patterns) {
            kept.push(line.to_string());
        }
    }

    for line in &mut kept {
        *line = patterns
            .fort_worth_variant
            .replace_all(line, "FORT WORTH")
            .into_owned();
    }

    let mut coalesced = coalesce_address_lines(&kept, patterns);
    coalesced.truncate(MAX_STREET_LINES);
    *street = coalesced;
}

fn is_valid_address_line(line: &str, charges: &[Charge], patterns: &Patterns) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return false;
    }
    if patterns.date_anywhere.is_match(line) {
        return false;
    }
    if patterns.charge_description_hint.is_match(line) {
        return false;
    }
    // A line quoted verbatim inside a charge description is charge data.
    if charges
        .iter()
        .any(|charge| !charge.description.is_empty() && charge.description.contains(line))
    {
        return false;
    }

    if patterns.has_address_tokens(line) || patterns.digit_run.is_match(line) {
        return true;
    }
    // Short leftovers ("ANYTOWN") are more likely address than not.
    line.split_whitespace().count() <= 5
}

/// Re-joins address fragments the layout split across lines: an "APT"
/// marker followed by its unit code, or short pieces of one street line.
/// Lines already carrying a street token or a city/state/zip tail stay as
/// they are.
fn coalesce_address_lines(lines: &[String], patterns: &Patterns) -> Vec<String> {
    fn flush(buffer: &mut Vec<String>, out: &mut Vec<String>) {
        if !buffer.is_empty() {
            out.push(collapse_whitespace(&buffer.join(" ")));
            buffer.clear();
        }
    }

    let mut out = Vec::new();
    let mut buffer: Vec<String> = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        let trimmed = lines[index].trim();
        if trimmed.is_empty() {
            flush(&mut buffer, &mut out);
            index += 1;
            continue;
        }

        if patterns.apt_marker.is_match(trimmed)
            && index + 1 < lines.len()
            && patterns.unit_code.is_match(lines[index + 1].trim())
        {
            buffer.push(format!("{} {}", trimmed, lines[index + 1].trim()));
            index += 2;
            continue;
        }

        let complete = (patterns.state_code.is_match(trimmed) && patterns.zip.is_match(trimmed))
            || patterns.street_abbrev.is_match(trimmed)
            || patterns.unit_hint.is_match(trimmed);
        if complete {
            buffer.push(trimmed.to_string());
            flush(&mut buffer, &mut out);
        } else if trimmed.split_whitespace().count() <= 4 {
            buffer.push(trimmed.to_string());
        } else {
            buffer.push(trimmed.to_string());
            flush(&mut buffer, &mut out);
        }
        index += 1;
    }

    flush(&mut buffer, &mut out);
    out
}

/// Scrubs charge descriptions: embedded addresses, names of other inmates,
/// dates, stray identifiers, foreign booking numbers, and verbatim copies
/// of the record's own street lines all come out.
fn clean_charges(charges: &mut Vec<Charge>, street: &[String], patterns: &Patterns) {
    let valid_street: Vec<&String> = street
        .iter()
        .filter(|line| {
            patterns.city_state_zip.is_match(line)
                || patterns.street_address.is_match(line)
                || patterns.apt_unit.is_match(line)
                || patterns.has_address_tokens(line)
                || patterns.digit_run.is_match(line)
        })
        .collect();

    for charge in charges.iter_mut() {
        let mut description = charge.description.clone();

        while let Some(matched) = patterns.embedded_address.find(&description) {
            description = remove_span(&description, matched.start(), matched.end());
        }
        while let Some(matched) = patterns.embedded_street.find(&description) {
            description = remove_span(&description, matched.start(), matched.end());
        }

        // Anything after an embedded name belongs to another record; the
        // splitting pass ran first, so this is just the final trim.
        if let Some(matched) = patterns.name_loose.find(&description) {
            description = description[..matched.start()].trim().to_string();
        }

        while let Some(matched) = patterns.date_anywhere.find(&description) {
            description = remove_span(&description, matched.start(), matched.end());
        }
        while let Some((start, end)) = next_bare_identifier(&description, patterns) {
            description = remove_span(&description, start, end);
        }
        loop {
            let foreign = patterns
                .booking_anywhere
                .find_iter(&description)
                .find(|matched| matched.as_str() != charge.booking_no)
                .map(|matched| (matched.start(), matched.end()));
            let Some((start, end)) = foreign else { break };
            description = remove_span(&description, start, end);
        }

        for line in &valid_street {
            while let Some(position) = description.find(line.as_str()) {
                description.replace_range(position..position + line.len(), "");
            }
        }

        charge.description = collapse_whitespace(&description);
    }
}

/// Identifier-sized digit run that is not part of a dash-delimited booking
/// number.
fn next_bare_identifier(text: &str, patterns: &Patterns) -> Option<(usize, usize)> {
    patterns
        .id_run
        .find_iter(text)
        .find(|matched| {
            !text[..matched.start()].ends_with('-') && !text[matched.end()..].starts_with('-')
        })
        .map(|matched| (matched.start(), matched.end()))
}

fn validate(record: &mut Record) {
    if record.name.is_empty() {
        record.add_warning("Missing name");
    }
    if record.identifier.is_none() && record.cid.is_none() {
        record.add_warning("Missing identifier");
    }
    if record.book_in_date.is_none() {
        record.add_warning("Missing book-in date");
    }
    if record.street.is_empty() {
        record.add_warning("Missing street");
    }
    if record.charges.is_empty() {
        record.add_warning("No charges found");
    }

    let empty_bookings: Vec<String> = record
        .charges
        .iter()
        .filter(|charge| charge.description.is_empty())
        .map(|charge| charge.booking_no.clone())
        .collect();
    for booking in empty_bookings {
        record.add_warning(&format!("Empty description for booking {booking}"));
    }
}
