//! # Veil PII Redaction
//!
//! Pattern-based scrubbing of personally identifiable information. Every
//! prompt is passed through [`redact`] before it reaches a local session or
//! the remote fallback endpoint.
//!
//! Patterns are applied in a fixed order, each replacing all occurrences:
//!
//! | Kind  | Example          | Marker    |
//! |-------|------------------|-----------|
//! | Email | `a@b.com`        | `[EMAIL]` |
//! | Phone | `555-123-4567`   | `[PHONE]` |
//! | SSN   | `123-45-6789`    | `[SSN]`   |
//!
//! This is a best-effort local guard. Names, addresses and free-form
//! identifiers are not detected.
//!
//! ## Usage
//!
//! ```
//! let safe = veil_redact::redact("Contact me at a@b.com or 555-123-4567");
//! assert_eq!(safe, "Contact me at [EMAIL] or [PHONE]");
//! ```

use regex::{NoExpand, Regex};
use serde::Serialize;
use std::fmt;

lazy_static::lazy_static! {
    static ref DEFAULT_REDACTOR: Redactor = Redactor::new();
}

/// Redact PII from `text` using the default pattern set.
pub fn redact(text: &str) -> String {
    DEFAULT_REDACTOR.redact(text)
}

/// Kind of PII a pattern detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PiiKind {
    Email,
    Phone,
    Ssn,
}

impl PiiKind {
    /// All kinds, in the order they are applied.
    pub const ALL: [PiiKind; 3] = [PiiKind::Email, PiiKind::Phone, PiiKind::Ssn];

    /// Replacement text for a match of this kind.
    pub fn marker(&self) -> &'static str {
        match self {
            PiiKind::Email => "[EMAIL]",
            PiiKind::Phone => "[PHONE]",
            PiiKind::Ssn => "[SSN]",
        }
    }

    // Digits are spelled `[0-9]` so that non-ASCII digits are left alone.
    fn pattern(&self) -> &'static str {
        match self {
            PiiKind::Email => r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}",
            PiiKind::Phone => r"\b[0-9]{3}[-.]?[0-9]{3}[-.]?[0-9]{4}\b",
            PiiKind::Ssn => r"\b[0-9]{3}-[0-9]{2}-[0-9]{4}\b",
        }
    }
}

impl fmt::Display for PiiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PiiKind::Email => write!(f, "email"),
            PiiKind::Phone => write!(f, "phone"),
            PiiKind::Ssn => write!(f, "ssn"),
        }
    }
}

/// A compiled pattern bound to its kind.
#[derive(Debug, Clone)]
struct PiiPattern {
    kind: PiiKind,
    regex: Regex,
}

/// Ordered set of PII patterns.
#[derive(Debug, Clone)]
pub struct Redactor {
    patterns: Vec<PiiPattern>,
}

/// How many matches of each kind were replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RedactionReport {
    pub emails: usize,
    pub phones: usize,
    pub ssns: usize,
}

impl RedactionReport {
    fn record(&mut self, kind: PiiKind, count: usize) {
        match kind {
            PiiKind::Email => self.emails += count,
            PiiKind::Phone => self.phones += count,
            PiiKind::Ssn => self.ssns += count,
        }
    }

    /// Total number of replacements.
    pub fn total(&self) -> usize {
        self.emails + self.phones + self.ssns
    }

    /// True when nothing was replaced.
    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }
}

impl Redactor {
    /// Create a redactor with every known pattern.
    pub fn new() -> Self {
        Self::with_kinds(&PiiKind::ALL)
    }

    /// Create a redactor restricted to `kinds`.
    ///
    /// Patterns always run in the canonical order regardless of the order
    /// given here, so emails are consumed before their digits could be
    /// mistaken for a phone number.
    pub fn with_kinds(kinds: &[PiiKind]) -> Self {
        let patterns = PiiKind::ALL
            .iter()
            .filter(|kind| kinds.contains(kind))
            .map(|&kind| PiiPattern {
                kind,
                regex: Regex::new(kind.pattern()).expect("Invalid PII pattern"),
            })
            .collect();

        Self { patterns }
    }

    /// Kinds this redactor detects, in application order.
    pub fn kinds(&self) -> impl Iterator<Item = PiiKind> + '_ {
        self.patterns.iter().map(|p| p.kind)
    }

    /// Replace every match of every pattern with its marker.
    pub fn redact(&self, text: &str) -> String {
        self.redact_with_report(text).0
    }

    /// Redact and report how many matches of each kind were replaced.
    pub fn redact_with_report(&self, text: &str) -> (String, RedactionReport) {
        let mut report = RedactionReport::default();
        let mut current = text.to_string();

        for pattern in &self.patterns {
            let count = pattern.regex.find_iter(&current).count();
            if count == 0 {
                continue;
            }
            report.record(pattern.kind, count);
            current = pattern
                .regex
                .replace_all(&current, NoExpand(pattern.kind.marker()))
                .into_owned();
        }

        (current, report)
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_and_phone() {
        assert_eq!(
            redact("Contact me at a@b.com or 555-123-4567"),
            "Contact me at [EMAIL] or [PHONE]"
        );
    }

    #[test]
    fn test_every_email_replaced() {
        let text = "cc jane.doe+news@mail.example.org, bob_99@corp.io and ops@x.dev";
        assert_eq!(redact(text), "cc [EMAIL], [EMAIL] and [EMAIL]");
    }

    #[test]
    fn test_phone_separators() {
        assert_eq!(redact("call 555-123-4567"), "call [PHONE]");
        assert_eq!(redact("call 555.123.4567"), "call [PHONE]");
        assert_eq!(redact("call 5551234567"), "call [PHONE]");
        assert_eq!(redact("call 555-123.4567 now"), "call [PHONE] now");
    }

    #[test]
    fn test_ssn() {
        assert_eq!(redact("ssn 123-45-6789."), "ssn [SSN].");
    }

    #[test]
    fn test_non_matching_text_untouched() {
        let text = "Order #12345 shipped on 2024-01-15 to user@localhost";
        assert_eq!(redact(text), text);

        // Longer digit runs are not phone numbers.
        assert_eq!(redact("id 15551234567"), "id 15551234567");
    }

    #[test]
    fn test_email_digits_not_phone() {
        assert_eq!(redact("5551234567@example.com"), "[EMAIL]");
    }

    #[test]
    fn test_non_ascii_digits_ignored() {
        let text = "\u{FF15}\u{FF15}\u{FF15}-\u{FF11}\u{FF12}\u{FF13}-\u{FF14}\u{FF15}\u{FF16}\u{FF17}";
        assert_eq!(redact(text), text);
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "Contact me at a@b.com or 555-123-4567",
            "ssn 123-45-6789 phone 555.123.4567",
            "nothing to see here",
            "",
        ];
        for input in inputs {
            let once = redact(input);
            assert_eq!(redact(&once), once, "input: {input}");
        }
    }

    #[test]
    fn test_report_counts() {
        let redactor = Redactor::new();
        let (text, report) =
            redactor.redact_with_report("a@b.com c@d.org 555-123-4567 123-45-6789");

        assert_eq!(text, "[EMAIL] [EMAIL] [PHONE] [SSN]");
        assert_eq!(
            report,
            RedactionReport {
                emails: 2,
                phones: 1,
                ssns: 1,
            }
        );
        assert_eq!(report.total(), 4);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_with_kinds_keeps_canonical_order() {
        let redactor = Redactor::with_kinds(&[PiiKind::Phone, PiiKind::Email]);
        let kinds: Vec<_> = redactor.kinds().collect();
        assert_eq!(kinds, vec![PiiKind::Email, PiiKind::Phone]);

        assert_eq!(redactor.redact("123-45-6789"), "123-45-6789");
    }

    #[test]
    fn test_markers() {
        assert_eq!(PiiKind::Email.marker(), "[EMAIL]");
        assert_eq!(PiiKind::Phone.marker(), "[PHONE]");
        assert_eq!(PiiKind::Ssn.marker(), "[SSN]");
        assert_eq!(PiiKind::Ssn.to_string(), "ssn");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Segment {
            Email(String),
            Phone(String),
            Ssn(String),
            Filler(String),
        }

        fn segment() -> impl Strategy<Value = Segment> {
            prop_oneof![
                "[a-z0-9._%+-]{1,8}@[a-z0-9-]{1,8}\\.[a-z]{2,4}".prop_map(Segment::Email),
                "[0-9]{3}[-.]?[0-9]{3}[-.]?[0-9]{4}".prop_map(Segment::Phone),
                "[0-9]{3}-[0-9]{2}-[0-9]{4}".prop_map(Segment::Ssn),
                "[a-zA-Z,;:!?()]{1,12}".prop_map(Segment::Filler),
            ]
        }

        impl Segment {
            fn as_str(&self) -> &str {
                match self {
                    Segment::Email(s)
                    | Segment::Phone(s)
                    | Segment::Ssn(s)
                    | Segment::Filler(s) => s,
                }
            }
        }

        fn expected_report(segments: &[Segment]) -> RedactionReport {
            let mut report = RedactionReport::default();
            for segment in segments {
                match segment {
                    Segment::Email(_) => report.emails += 1,
                    Segment::Phone(_) => report.phones += 1,
                    Segment::Ssn(_) => report.ssns += 1,
                    Segment::Filler(_) => {}
                }
            }
            report
        }

        proptest! {
            #[test]
            fn test_mixed_pii_fully_replaced(segments in prop::collection::vec(segment(), 0..12)) {
                let input = segments.iter().map(Segment::as_str).collect::<Vec<_>>().join(" ");
                let (output, report) = Redactor::new().redact_with_report(&input);
                prop_assert_eq!(report, expected_report(&segments));

                // Filler carries no digits or '@', so any left over is leaked PII.
                prop_assert!(!output.contains('@'), "{:?} -> {:?}", input, output);
                prop_assert!(
                    !output.chars().any(|c| c.is_ascii_digit()),
                    "{:?} -> {:?}",
                    input,
                    output
                );
                prop_assert_eq!(redact(&output), output);
            }

            #[test]
            fn test_idempotent_on_noisy_text(input in "[a-c0-9@. -]{0,48}") {
                let once = redact(&input);
                prop_assert_eq!(redact(&once), once);
            }

            #[test]
            fn test_text_without_digits_or_at_untouched(input in "[^0-9@]{0,64}") {
                prop_assert_eq!(redact(&input), input);
            }
        }
    }
}
