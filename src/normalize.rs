use chrono::NaiveDate;

/// Converts `"LAST, FIRST MIDDLE"` into title-cased `"First Middle Last"`.
/// Malformed input (no comma, empty halves, unexpected characters) is
/// returned unchanged rather than failing; the raw name field keeps the
/// original either way.
pub fn normalize_name(raw: &str) -> String {
    let Some((last, first_middle)) = raw.split_once(',') else {
        return raw.to_string();
    };

    let last = last.trim();
    let first_middle = first_middle.trim();
    if last.is_empty()
        || first_middle.is_empty()
        || !is_name_text(last)
        || !is_name_text(first_middle)
    {
        return raw.to_string();
    }

    format!("{} {}", title_case(first_middle), title_case(last))
}

fn is_name_text(value: &str) -> bool {
    value
        .chars()
        .all(|character| character.is_ascii_alphabetic() || " -.'".contains(character))
}

/// Title-cases a run of words: the first letter after any non-letter is
/// uppercased, the rest lowercased. Handles hyphenated and apostrophe
/// names ("O'BRIEN" becomes "O'Brien").
pub fn title_case(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut at_word_start = true;

    for character in value.chars() {
        if character.is_ascii_alphabetic() {
            if at_word_start {
                output.push(character.to_ascii_uppercase());
            } else {
                output.push(character.to_ascii_lowercase());
            }
            at_word_start = false;
        } else {
            output.push(character);
            at_word_start = true;
        }
    }

    output
}

/// Normalizes `M/D/YYYY` to ISO-8601 `YYYY-MM-DD`. Out-of-range values
/// ("13/45/2025") and anything that does not split into three numeric
/// parts come back unchanged.
pub fn normalize_date(raw: &str) -> String {
    let mut parts = raw.split('/');
    let (Some(month), Some(day), Some(year), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return raw.to_string();
    };

    let (Ok(month), Ok(day), Ok(year)) = (
        month.trim().parse::<u32>(),
        day.trim().parse::<u32>(),
        year.trim().parse::<i32>(),
    ) else {
        return raw.to_string();
    };

    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => raw.to_string(),
    }
}
