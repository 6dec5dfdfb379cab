use crate::normalize::normalize_date;
use crate::patterns::Patterns;

/// Mutable views of the three fields the lifter may fill. Both the
/// assembler's builder and finished records hand these out, so the same
/// lifting pass runs live and during post-processing.
pub struct FieldSlots<'a> {
    pub identifier: &'a mut Option<String>,
    pub cid: &'a mut Option<String>,
    pub book_in_date: &'a mut Option<String>,
}

impl FieldSlots<'_> {
    /// Identifier wins; a second number only lands in `cid` once the
    /// identifier is taken.
    fn store_number(&mut self, value: &str) {
        if self.identifier.is_none() {
            *self.identifier = Some(value.to_string());
        } else if self.cid.is_none() {
            *self.cid = Some(value.to_string());
        }
    }
}

/// Strips identifier/CID/date tokens from `text`, storing them through
/// `slots`, and returns the residual text with whitespace collapsed.
///
/// Priority order (downstream behavior depends on it):
/// 1. explicitly labelled tokens ("IDENTIFIER:", "CID:") win outright;
/// 2. a city/state-plus-number tail ("FORT WORTH TX 1063442") counts when
///    it reaches the end of the residual text;
/// 3. otherwise the last bare 6-10 digit run, skipping 5-digit ZIPs and
///    the digits of dash-delimited booking numbers;
/// 4. the last date-shaped token anywhere, independent of 1-3.
///
/// Each step only assigns a field that is still unset.
pub fn lift_id_date_tokens(patterns: &Patterns, mut slots: FieldSlots<'_>, text: &str) -> String {
    let mut residual = text.trim().to_string();

    if let Some(captures) = patterns.id_token_labelled.captures(&residual) {
        if slots.identifier.is_none() {
            let whole = captures.get(0).expect("match has a group 0");
            *slots.identifier = Some(captures["id"].to_string());
            residual = remove_span(&residual, whole.start(), whole.end());
        }
    }

    if let Some(captures) = patterns.cid_token_labelled.captures(&residual) {
        let whole = captures.get(0).expect("match has a group 0");
        let value = captures["id"].to_string();
        slots.store_number(&value);
        residual = remove_span(&residual, whole.start(), whole.end());
    }

    if let Some(captures) = patterns.city_state_cid_tail.captures(&residual) {
        let whole = captures.get(0).expect("match has a group 0");
        if whole.end() + 1 >= residual.len() {
            let value = captures["id"].to_string();
            slots.store_number(&value);
            residual = remove_span(&residual, whole.start(), whole.end());
        }
    }

    if let Some((start, end)) = last_bare_number(patterns, &residual) {
        let value = residual[start..end].to_string();
        slots.store_number(&value);
        residual = remove_span(&residual, start, end);
    }

    if slots.book_in_date.is_none() {
        if let Some(captures) = patterns.date_anywhere.captures_iter(&residual).last() {
            let whole = captures.get(0).expect("match has a group 0");
            *slots.book_in_date = Some(normalize_date(&captures["date"]));
            residual = remove_span(&residual, whole.start(), whole.end());
        }
    }

    collapse_whitespace(&residual)
}

/// Last 6-10 digit run that is neither a ZIP (5 digits) nor part of a
/// dash-delimited booking number.
fn last_bare_number(patterns: &Patterns, text: &str) -> Option<(usize, usize)> {
    let mut found = None;
    for matched in patterns.digit_run.find_iter(text) {
        let length = matched.end() - matched.start();
        if !(6..=10).contains(&length) {
            continue;
        }
        let preceded_by_dash = text[..matched.start()].ends_with('-');
        let followed_by_dash = text[matched.end()..].starts_with('-');
        if preceded_by_dash || followed_by_dash {
            continue;
        }
        found = Some((matched.start(), matched.end()));
    }
    found
}

/// Removes `text[start..end]` and rejoins the halves with a single space.
pub(crate) fn remove_span(text: &str, start: usize, end: usize) -> String {
    let mut joined = String::with_capacity(text.len());
    joined.push_str(text[..start].trim_end());
    joined.push(' ');
    joined.push_str(text[end..].trim_start());
    joined.trim().to_string()
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;

    struct Target {
        identifier: Option<String>,
        cid: Option<String>,
        book_in_date: Option<String>,
    }

    impl Target {
        fn empty() -> Self {
            Self {
                identifier: None,
                cid: None,
                book_in_date: None,
            }
        }

        fn slots(&mut self) -> FieldSlots<'_> {
            FieldSlots {
                identifier: &mut self.identifier,
                cid: &mut self.cid,
                book_in_date: &mut self.book_in_date,
            }
        }
    }

    fn patterns() -> Patterns {
        Patterns::compile(&ParserConfig::default()).expect("patterns should compile")
    }

    #[test]
    fn labelled_tokens_win_over_bare_numbers() {
        let patterns = patterns();
        let mut target = Target::empty();
        let residual = lift_id_date_tokens(
            &patterns,
            target.slots(),
            "IDENTIFIER: 1234567 SOME TEXT 9988776",
        );
        assert_eq!(target.identifier.as_deref(), Some("1234567"));
        assert_eq!(target.cid.as_deref(), Some("9988776"));
        assert_eq!(residual, "SOME TEXT");
    }

    #[test]
    fn city_state_tail_counts_only_at_end_of_text() {
        let patterns = patterns();
        let mut target = Target::empty();
        let residual =
            lift_id_date_tokens(&patterns, target.slots(), "FORT WORTH TX 1063442");
        assert_eq!(target.identifier.as_deref(), Some("1063442"));
        assert_eq!(residual, "");
    }

    #[test]
    fn last_bare_number_is_taken_and_zips_are_skipped() {
        let patterns = patterns();
        let mut target = Target::empty();
        let residual = lift_id_date_tokens(
            &patterns,
            target.slots(),
            "ANYTOWN 76104 111222 333444 TRAILING",
        );
        // 76104 is a ZIP; of the two 6-digit runs the last one wins.
        assert_eq!(target.identifier.as_deref(), Some("333444"));
        assert_eq!(residual, "ANYTOWN 76104 111222 TRAILING");
    }

    #[test]
    fn booking_number_digits_are_not_lifted() {
        let patterns = patterns();
        let mut target = Target::empty();
        let residual =
            lift_id_date_tokens(&patterns, target.slots(), "25-0123456 NO VALID DL");
        assert_eq!(target.identifier, None);
        assert_eq!(residual, "25-0123456 NO VALID DL");
    }

    #[test]
    fn last_date_is_taken_independently() {
        let patterns = patterns();
        let mut target = Target::empty();
        let residual = lift_id_date_tokens(
            &patterns,
            target.slots(),
            "SEEN 01/01/2025 BOOKED 10/15/2025",
        );
        assert_eq!(target.book_in_date.as_deref(), Some("2025-10-15"));
        assert_eq!(residual, "SEEN 01/01/2025 BOOKED");
    }

    #[test]
    fn set_fields_are_never_overwritten() {
        let patterns = patterns();
        let mut target = Target::empty();
        target.identifier = Some("1111111".to_string());
        target.book_in_date = Some("2025-01-01".to_string());
        let residual =
            lift_id_date_tokens(&patterns, target.slots(), "2223334 10/15/2025");
        assert_eq!(target.identifier.as_deref(), Some("1111111"));
        assert_eq!(target.cid.as_deref(), Some("2223334"));
        assert_eq!(target.book_in_date.as_deref(), Some("2025-01-01"));
        assert_eq!(residual, "10/15/2025");
    }
}
