use anyhow::{Context, Result};
use regex::Regex;

use crate::config::ParserConfig;

/// Keywords that mark free text as a probable charge description. Matched
/// as substrings, case-insensitively, the way the source reports print
/// truncated offense codes ("MAN DEL", "POSS CS PG1").
pub const CHARGE_WORDS: &[&str] = &[
    "ASSAULT",
    "THEFT",
    "BURGLARY",
    "ROBBERY",
    "MURDER",
    "POSS",
    "POSS CS",
    "MARIJ",
    "CONTROLLED SUBSTANCE",
    "DWI",
    "INTERFER",
    "HARASSMENT",
    "PROTECTIVE ORDER",
    "FAMILY VIOLENCE",
    "TAMPER",
    "UNAUTH USE OF VEHICLE",
    "INDECENCY",
    "EVADING",
    "STALKING",
    "CONTEMPT",
    "MAN DEL",
    "FAIL TO IDENTIFY",
    "UNLAWFUL RESTRAINT",
    "AGG",
    "VIOL",
    "UNL",
    "RESIST",
    "FRAUD",
    "FORGERY",
    "PAROLE",
    "BOND",
    "PROH",
    "OBSTRUCTION",
    "RETALIATION",
    "DEADLY CONDUCT",
    "INTOXICATED",
    "WEAPON",
    "FIREARM",
    "CRIMINAL",
    "TRESPASS",
    "WARRANT",
    "PROBATION",
];

/// Wider offense vocabulary used by the post-processor to tell charge
/// residue apart from address text. Substring matches, like the source
/// reports' truncated spellings; deliberately broader than [`CHARGE_WORDS`]
/// because by cleanup time false positives only cost an address line.
pub const CHARGE_DESCRIPTION_WORDS: &[&str] = &[
    "ASSAULT",
    "DRIVING WHILE INTOXICATED",
    "DWI",
    "THEFT",
    "BURGLARY",
    "ROBBERY",
    "MURDER",
    "POSSESSION",
    "TRESPASS",
    "FAILURE TO APPEAR",
    "VIOLATION",
    "WARRANT",
    "PROBATION",
    "PAROLE",
    "BAIL",
    "BOND",
    "PROTECTIVE ORDER",
    "FAMILY VIOLENCE",
    "BODILY INJURY",
    "WEAPON",
    "FIREARM",
    "DEADLY",
    "CONDUCT",
    "DISCHARGE",
    "SPEEDING",
    "NO VALID DL",
    "LICENSE",
    "REGISTRATION",
    "INSURANCE",
    "EXPIRED",
    "RECKLESS",
    "ALCOHOL",
    "DRUG",
    "CONTROLLED SUBSTANCE",
    "MARIJUANA",
    "COCAINE",
    "METHAMPHETAMINE",
    "HEROIN",
    "OPIOID",
    "PRESCRIPTION",
    "FRAUD",
    "FORGERY",
    "IDENTITY",
    "CREDIT CARD",
    "STOLEN",
    "VANDALISM",
    "CRIMINAL",
    "MISDEMEANOR",
    "FELONY",
    "RESISTING",
    "EVADING",
];

/// Column-header fragments that some extractions split onto their own
/// lines. Compared uppercased against the whole trimmed line.
const SPLIT_HEADER_TOKENS: &[&str] = &[
    "INMATE NAME",
    "IDENTIFIER",
    "CID",
    "BOOK IN DATE",
    "BOOKING NO.",
    "DESCRIPTION",
    "INMATE",
    "NAME",
    "BOOK",
    "IN",
    "DATE",
    "BOOKING",
    "NO.",
];

/// Classification outcomes for one line. A line can carry several classes
/// at once; the assembler resolves overlaps by its own priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineClass {
    Header,
    Name,
    NameWithIdDate,
    IdentifierDate,
    BareIdentifier,
    BareDate,
    Booking,
    Address,
    AptUnit,
    ChargeKeyword,
    EmbeddedName,
}

/// Where in the document the line under classification sits. Embedded-name
/// detection is only meaningful inside charge/description text; applying
/// it everywhere would shred legitimate anchored name lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyContext {
    General,
    Charges,
}

/// A `LAST, FIRST` token found inside a longer line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCapture {
    pub raw: String,
    pub last: String,
    pub first_middle: String,
    pub start: usize,
    pub end: usize,
}

/// One piece of a line split at embedded names. The leading fragment (if
/// any) has no name; every later fragment starts at a name and carries the
/// text up to the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub name: Option<NameCapture>,
    pub text: String,
}

/// Immutable set of compiled matchers. Built once per configuration and
/// passed by reference into the assembler and post-processor.
pub struct Patterns {
    // Names.
    pub name_anchored: Regex,
    pub name_embedded: Regex,
    pub name_id_date: Regex,
    pub name_loose: Regex,
    pub trailing_name: Regex,
    // Identifier / CID / date combinations.
    pub id_date: Regex,
    pub id_date_labelled: Regex,
    pub bare_identifier: Regex,
    pub bare_cid: Regex,
    pub bare_date: Regex,
    pub cid_inline: Regex,
    pub id_token_labelled: Regex,
    pub cid_token_labelled: Regex,
    pub city_state_cid_tail: Regex,
    pub state_cid_tail: Regex,
    pub digit_run: Regex,
    pub date_anywhere: Regex,
    // Booking numbers.
    pub booking_exact: Regex,
    pub booking_flex: Regex,
    pub booking_anywhere: Regex,
    pub booking_with_desc: Regex,
    // Addresses.
    pub city_state_zip: Regex,
    pub street_address: Regex,
    pub apt_unit: Regex,
    pub apt_marker: Regex,
    pub unit_code: Regex,
    pub directional: Regex,
    pub street_abbrev: Regex,
    pub street_word: Regex,
    pub unit_hint: Regex,
    pub zip: Regex,
    pub state_code: Regex,
    pub plain_address_charset: Regex,
    pub embedded_address: Regex,
    pub embedded_street: Regex,
    pub fort_worth_variant: Regex,
    pub id_run: Regex,
    // Charge keywords.
    pub charge_hint: Regex,
    pub charge_description_hint: Regex,
    // Header / footer noise and page markers.
    pub page_marker: Regex,
    pub page_fragment: Regex,
    header_noise: Vec<Regex>,
}

impl Patterns {
    pub fn compile(config: &ParserConfig) -> Result<Self> {
        // Strict matching expects the all-caps names the reports print;
        // tolerant matching accepts mixed case from degraded OCR output.
        let (name_head, name_tail, name_word) = if config.name_regex_strict {
            ("[A-Z]", r"[A-Z\-\.' ]", "[A-Z]+")
        } else {
            ("[A-Za-z]", r"[A-Za-z\-\.' ]", "[A-Za-z]+")
        };
        let name_part = format!("{name_head}{name_tail}+");

        let mut header_noise = vec![
            compiled(r"^Daily Booked In Report$", "daily report header")?,
            compiled(
                r"^Inmates Booked In During the Past 24 Hours\b",
                "booked-in header",
            )?,
            compiled(
                r"^Inmate Name\s+Identifier\s+CID\s+Book In Date\s+Booking No\.\s+Description$",
                "column header",
            )?,
            compiled(r"^Page:\s*\d+\s+of\s+\d+$", "page footer")?,
            compiled(r"^[-\s]{5,}$", "column underline")?,
            compiled(r"^Report Date:", "report date header")?,
        ];
        for pattern in &config.header_patterns {
            header_noise.push(
                Regex::new(pattern)
                    .with_context(|| format!("failed to compile header pattern: {pattern}"))?,
            );
        }

        let charge_alternation = CHARGE_WORDS
            .iter()
            .map(|word| regex::escape(word))
            .collect::<Vec<String>>()
            .join("|");
        // The description vocabulary also carries two non-literal shapes:
        // offense class markers ("CLASS B") and penalty group codes ("PG1").
        let description_alternation = CHARGE_DESCRIPTION_WORDS
            .iter()
            .map(|word| regex::escape(word))
            .chain([r"CLASS [A-Z]\b".to_string(), r"PG\d+".to_string()])
            .collect::<Vec<String>>()
            .join("|");

        Ok(Self {
            name_anchored: compiled(
                &format!(r"^(?P<last>{name_part}),\s+(?P<firstmid>{name_part})$"),
                "anchored name",
            )?,
            name_embedded: compiled(
                &format!(r"\b(?P<last>{name_word}),\s+(?P<firstmid>{name_word})"),
                "embedded name",
            )?,
            name_id_date: compiled(
                &format!(
                    r"^(?P<name>(?P<last>{name_part}),\s+(?P<firstmid>{name_part}))\s+(?P<id>\d{{5,8}})\s+(?P<date>\d{{1,2}}/\d{{1,2}}/\d{{4}})$"
                ),
                "name with id and date",
            )?,
            name_loose: compiled(
                r"[A-Z][A-Z\-\.' ]+,\s+[A-Z][A-Z\-\.' ]+",
                "loose name",
            )?,
            trailing_name: compiled(r"(?P<last>[A-Z][A-Z\-\.' ]+)$", "trailing name")?,
            id_date: compiled(
                r"(?P<id>\b\d{5,8}\b)(?:\s+(?P<cid>\b\d{4,10}\b))?\s+(?P<date>\b\d{1,2}/\d{1,2}/\d{4}\b)",
                "id and date",
            )?,
            id_date_labelled: compiled(
                r"(?i)(?:IDENTIFIER\s*)?(?P<id>\d{5,8})(?:\s*(?:CID|C\.?I\.?D\.?)\s*(?P<cid>\d{4,10}))?\s*(?P<date>\d{1,2}/\d{1,2}/\d{4})",
                "labelled id and date",
            )?,
            bare_identifier: compiled(r"^\s*(?P<id>\d{5,8})\s*$", "bare identifier")?,
            bare_cid: compiled(r"^\s*(?P<cid>\d{4,10})\s*$", "bare cid")?,
            bare_date: compiled(r"^\s*(?P<date>\d{1,2}/\d{1,2}/\d{4})\s*$", "bare date")?,
            cid_inline: compiled(r"(?i)\bCID\b\s*(?P<cid>\d{4,10})\b", "inline cid")?,
            id_token_labelled: compiled(
                r"(?i)\b(?:IDENTIFIER|ID)\s*[:\-]?\s*(?P<id>\d{6,10})\b",
                "labelled identifier token",
            )?,
            cid_token_labelled: compiled(
                r"(?i)\b(?:CID|C\.?I\.?D\.?)\s*[:\-]?\s*(?P<id>\d{6,10})\b",
                "labelled cid token",
            )?,
            city_state_cid_tail: compiled(
                r"\b[A-Z][A-Za-z]+(?:\s+[A-Z][A-Za-z]+)*\s+(?:TX|OK|LA)\s+(?P<id>\d{6,10})\b",
                "city/state numeric tail",
            )?,
            state_cid_tail: compiled(
                r"(?i)\b(?:TX|OK|LA)\b\s+(?P<cid>\d{6,10})\b",
                "state numeric tail",
            )?,
            digit_run: compiled(r"\d+", "digit run")?,
            date_anywhere: compiled(
                r"\b(?P<date>\d{1,2}/\d{1,2}/\d{4})\b",
                "date anywhere",
            )?,
            booking_exact: compiled(r"^\d{2}-\d{6,7}$", "exact booking")?,
            booking_flex: compiled(
                r"(?P<prefix>.*?)(?P<booking>\b\d{2}-\d{6,7}\b)(?:\s+(?P<desc>.*))?$",
                "flexible booking",
            )?,
            booking_anywhere: compiled(r"\b\d{2}-\d{6,7}\b", "booking anywhere")?,
            booking_with_desc: compiled(
                r"\b(?P<booking>\d{2}-\d{6,7})\b\s*(?P<desc>.*)",
                "booking with description",
            )?,
            city_state_zip: compiled(
                r"^[A-Za-z0-9\s\.,#\-']+\s+[A-Z]{2}\s+\d{5}(?:-\d{4})?$",
                "city/state/zip address",
            )?,
            street_address: compiled(r"^[0-9]+\s+[A-Za-z0-9\s\.,#\-']+$", "street address")?,
            apt_unit: compiled(r"(?i)^(?:APT|UNIT|#|APT#)\s*[A-Z0-9\-]+$", "apartment line")?,
            apt_marker: compiled(r"(?i)^(?:APT|UNIT|SUITE|#|APT#)\b\.?$", "apartment marker")?,
            unit_code: compiled(r"^[A-Z0-9\-]+$", "unit code")?,
            directional: compiled(r"\b(?:N|S|E|W|NE|NW|SE|SW)\b", "directional")?,
            street_abbrev: compiled(
                r"(?i)\b(?:ST|AVE|BLVD|DR|LN|RD|CT|WAY|CIR|TRL|PKWY|HWY|FWY)\b",
                "street abbreviation",
            )?,
            street_word: compiled(
                r"(?i)\b(?:STREET|AVENUE|BOULEVARD|DRIVE|LANE|ROAD|COURT|WAY|CIRCLE|TRAIL|PARKWAY|HIGHWAY|FREEWAY)\b",
                "street word",
            )?,
            unit_hint: compiled(r"(?i)\b(?:APT|UNIT|#|SUITE)\b", "unit hint")?,
            zip: compiled(r"\b\d{5}(?:-\d{4})?\b", "zip code")?,
            state_code: compiled(r"\b[A-Z]{2}\b", "state code")?,
            plain_address_charset: compiled(r"^[A-Za-z0-9\s\.,#\-']+$", "plain address charset")?,
            embedded_address: compiled(
                r"\b[0-9]+\s+[A-Za-z0-9\s\.,#\-']+\s+[A-Z]{2}\s+\d{5}(?:-\d{4})?\b",
                "embedded full address",
            )?,
            embedded_street: compiled(
                r"(?i)\b\d+\s+[A-Za-z0-9\s\.,#\-']+\s+(?:ST|AVE|BLVD|DR|LN|RD|CT|WAY|CIR|TRL|PKWY|HWY|FWY)\b",
                "embedded street fragment",
            )?,
            fort_worth_variant: compiled(
                r"(?i)\b(?:FT\s+WORTH|FTW|FORTH\s+WORTH|FW)\b",
                "fort worth variant",
            )?,
            id_run: compiled(r"\b\d{5,8}\b", "identifier run")?,
            charge_hint: compiled(&format!("(?i){charge_alternation}"), "charge keyword")?,
            charge_description_hint: compiled(
                &format!("(?i){description_alternation}"),
                "charge description keyword",
            )?,
            page_marker: compiled(r"Page:\s*(?P<page>\d+)\s+of\s+\d+", "page marker")?,
            page_fragment: compiled(r"(?i)^(?P<page>\d+)\s+of\s+\d+$", "page fragment")?,
            header_noise,
        })
    }

    /// All classes a line belongs to, in registry order. Pure lookup; the
    /// assembler applies its own first-match priority on top of this.
    pub fn classify(&self, line: &str, context: ClassifyContext) -> Vec<LineClass> {
        if self.is_header_or_footer(line) {
            return vec![LineClass::Header];
        }

        let mut classes = Vec::new();
        if self.name_id_date.is_match(line) {
            classes.push(LineClass::NameWithIdDate);
        }
        if self.name_anchored.is_match(line) {
            classes.push(LineClass::Name);
        }
        if self.id_date.is_match(line) || self.id_date_labelled.is_match(line) {
            classes.push(LineClass::IdentifierDate);
        }
        if self.bare_identifier.is_match(line) {
            classes.push(LineClass::BareIdentifier);
        }
        if self.bare_date.is_match(line) {
            classes.push(LineClass::BareDate);
        }
        if self.booking_anywhere.is_match(line) {
            classes.push(LineClass::Booking);
        }
        if self.city_state_zip.is_match(line) || self.street_address.is_match(line) {
            classes.push(LineClass::Address);
        }
        if self.apt_unit.is_match(line) {
            classes.push(LineClass::AptUnit);
        }
        if self.looks_like_charge_text(line) {
            classes.push(LineClass::ChargeKeyword);
        }
        if context == ClassifyContext::Charges && self.find_embedded_name(line).is_some() {
            classes.push(LineClass::EmbeddedName);
        }
        classes
    }

    /// Header/footer noise, including blank lines, split column-header
    /// tokens, and both halves of the tokenized "Page:" / "N of M" footer.
    pub fn is_header_or_footer(&self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return true;
        }
        if self.page_marker.is_match(trimmed) {
            return true;
        }

        let upper = trimmed.to_uppercase();
        if SPLIT_HEADER_TOKENS.contains(&upper.as_str()) {
            return true;
        }
        if upper.starts_with("PAGE") {
            return true;
        }
        if self.page_fragment.is_match(trimmed) {
            return true;
        }

        self.header_noise.iter().any(|pattern| pattern.is_match(trimmed))
    }

    /// Page number from a full "Page: N of M" marker, if present.
    pub fn page_marker_number(&self, line: &str) -> Option<u32> {
        self.page_marker
            .captures(line)
            .and_then(|captures| captures["page"].parse().ok())
    }

    /// Page number from a bare "N of M" fragment (the second half of the
    /// tokenized footer).
    pub fn page_fragment_number(&self, line: &str) -> Option<u32> {
        self.page_fragment
            .captures(line.trim())
            .and_then(|captures| captures["page"].parse().ok())
    }

    /// Charge keyword present and the line is not a city/state/zip line.
    pub fn looks_like_charge_text(&self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.charge_hint.is_match(trimmed) && !self.city_state_zip.is_match(trimmed)
    }

    /// Any of the loose address token families: directionals, street-type
    /// abbreviations and full words, unit markers, ZIP codes.
    pub fn has_address_tokens(&self, line: &str) -> bool {
        self.directional.is_match(line)
            || self.street_abbrev.is_match(line)
            || self.street_word.is_match(line)
            || self.unit_hint.is_match(line)
            || self.zip.is_match(line)
    }

    /// First embedded `LAST, FIRST` token at a word boundary preceded by
    /// start-of-text or whitespace.
    pub fn find_embedded_name(&self, text: &str) -> Option<NameCapture> {
        for captures in self.name_embedded.captures_iter(text) {
            let whole = captures.get(0).expect("match has a group 0");
            let preceded_ok = whole.start() == 0
                || text[..whole.start()]
                    .chars()
                    .next_back()
                    .is_some_and(char::is_whitespace);
            if !preceded_ok {
                continue;
            }
            return Some(NameCapture {
                raw: whole.as_str().to_string(),
                last: captures["last"].to_string(),
                first_middle: captures["firstmid"].to_string(),
                start: whole.start(),
                end: whole.end(),
            });
        }
        None
    }

    /// Splits text at every embedded name. Returns a single nameless
    /// fragment when no name is present. Used both live in the assembler's
    /// charge capture and post hoc by the cross-record repair, so the two
    /// stages cannot drift apart.
    pub fn split_on_embedded_names(&self, text: &str) -> Vec<Fragment> {
        let mut names = Vec::new();
        let mut cursor = 0;
        while let Some(capture) = self.find_embedded_name(&text[cursor..]) {
            let start = cursor + capture.start;
            let end = cursor + capture.end;
            names.push(NameCapture {
                start,
                end,
                ..capture
            });
            cursor = end;
        }

        if names.is_empty() {
            return vec![Fragment {
                name: None,
                text: text.trim().to_string(),
            }];
        }

        let mut fragments = Vec::new();
        let leading = text[..names[0].start].trim();
        if !leading.is_empty() {
            fragments.push(Fragment {
                name: None,
                text: leading.to_string(),
            });
        }
        for index in 0..names.len() {
            let trailing_end = names
                .get(index + 1)
                .map_or(text.len(), |next| next.start);
            let trailing = text[names[index].end..trailing_end].trim().to_string();
            fragments.push(Fragment {
                name: Some(names[index].clone()),
                text: trailing,
            });
        }
        fragments
    }
}

fn compiled(pattern: &str, what: &str) -> Result<Regex> {
    Regex::new(pattern).with_context(|| format!("failed to compile {what} regex"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> Patterns {
        Patterns::compile(&ParserConfig::default()).expect("patterns should compile")
    }

    #[test]
    fn classify_flags_name_and_id_date_combinations() {
        let patterns = patterns();
        assert_eq!(
            patterns.classify("SMITH, JOHN", ClassifyContext::General),
            vec![LineClass::Name]
        );
        let classes =
            patterns.classify("SMITH, JOHN 1234567 10/15/2025", ClassifyContext::General);
        assert!(classes.contains(&LineClass::NameWithIdDate));
        assert!(classes.contains(&LineClass::IdentifierDate));
        assert!(!classes.contains(&LineClass::Name));
    }

    #[test]
    fn classify_reports_embedded_names_only_in_charge_context() {
        let patterns = patterns();
        let line = "POSS CS PG1 WYATT, JOSH 1234567";
        assert!(
            patterns
                .classify(line, ClassifyContext::Charges)
                .contains(&LineClass::EmbeddedName)
        );
        assert!(
            !patterns
                .classify(line, ClassifyContext::General)
                .contains(&LineClass::EmbeddedName)
        );
    }

    #[test]
    fn header_detection_covers_tokenized_page_footer() {
        let patterns = patterns();
        assert!(patterns.is_header_or_footer("Page: 2 of 5"));
        assert!(patterns.is_header_or_footer("Page:"));
        assert!(patterns.is_header_or_footer("2 of 5"));
        assert!(patterns.is_header_or_footer("BOOKING"));
        assert!(patterns.is_header_or_footer("   "));
        assert!(patterns.is_header_or_footer("Report Date: 10/15/2025"));
        assert!(!patterns.is_header_or_footer("SMITH, JOHN"));
    }

    #[test]
    fn page_numbers_come_from_both_marker_forms() {
        let patterns = patterns();
        assert_eq!(patterns.page_marker_number("Page: 3 of 7"), Some(3));
        assert_eq!(patterns.page_fragment_number("4 of 7"), Some(4));
        assert_eq!(patterns.page_fragment_number("SMITH, JOHN"), None);
    }

    #[test]
    fn charge_text_excludes_city_state_zip_lines() {
        let patterns = patterns();
        assert!(patterns.looks_like_charge_text("ASSAULT CAUSES BODILY INJ"));
        assert!(patterns.looks_like_charge_text("POSS MARIJ <2OZ"));
        assert!(!patterns.looks_like_charge_text("FORT WORTH TX 76104"));
        assert!(!patterns.looks_like_charge_text("123 MAIN ST"));
    }

    #[test]
    fn embedded_name_requires_word_start() {
        let patterns = patterns();
        let capture = patterns
            .find_embedded_name("POSS CS WYATT, JOSH 1234567")
            .expect("name should be found");
        assert_eq!(capture.raw, "WYATT, JOSH");
        assert_eq!(capture.last, "WYATT");
        assert_eq!(capture.first_middle, "JOSH");
    }

    #[test]
    fn split_on_embedded_names_returns_single_fragment_without_names() {
        let patterns = patterns();
        let fragments = patterns.split_on_embedded_names("POSS CS PG1 <1G");
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].name.is_none());
        assert_eq!(fragments[0].text, "POSS CS PG1 <1G");
    }

    #[test]
    fn split_on_embedded_names_handles_chained_names() {
        let patterns = patterns();
        let fragments = patterns.split_on_embedded_names(
            "EVADING ARREST WYATT, JOSH 1234567 10/15/2025 JOHNSON, MIKE 7654321 10/16/2025",
        );
        assert_eq!(fragments.len(), 3);
        assert!(fragments[0].name.is_none());
        assert_eq!(fragments[0].text, "EVADING ARREST");
        assert_eq!(
            fragments[1].name.as_ref().map(|name| name.raw.as_str()),
            Some("WYATT, JOSH")
        );
        assert_eq!(fragments[1].text, "1234567 10/15/2025");
        assert_eq!(
            fragments[2].name.as_ref().map(|name| name.raw.as_str()),
            Some("JOHNSON, MIKE")
        );
        assert_eq!(fragments[2].text, "7654321 10/16/2025");
    }

    #[test]
    fn tolerant_configuration_accepts_mixed_case_names() {
        let tolerant = Patterns::compile(&ParserConfig {
            name_regex_strict: false,
            ..ParserConfig::default()
        })
        .expect("patterns should compile");
        assert!(tolerant.name_anchored.is_match("Smith, John"));
        assert!(!patterns().name_anchored.is_match("Smith, John"));
    }

    #[test]
    fn address_token_families_match_loosely() {
        let patterns = patterns();
        assert!(patterns.has_address_tokens("1400 N MAIN"));
        assert!(patterns.has_address_tokens("SOMEWHERE 76104"));
        assert!(patterns.has_address_tokens("APT 4B EXTRA"));
        assert!(!patterns.has_address_tokens("EVADING ARREST DETENTION"));
    }
}
