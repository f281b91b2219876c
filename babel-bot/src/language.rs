//! Languages, language pairs, and the menu-label selector.

use std::fmt;

/// Supported languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    En,
    Es,
}

impl Language {
    /// ISO 639-1 code understood by the translation provider.
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }

    /// English name for user-facing text.
    pub const fn name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Es => "Spanish",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A translation direction. Source and target always differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LanguagePair {
    source: Language,
    target: Language,
}

impl LanguagePair {
    /// Build a pair; `None` when both sides are the same language.
    pub fn new(source: Language, target: Language) -> Option<Self> {
        (source != target).then_some(Self { source, target })
    }

    pub const fn source(&self) -> Language {
        self.source
    }

    pub const fn target(&self) -> Language {
        self.target
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}

/// The submitted text matched no menu label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized language choice: {0:?}")]
pub struct SelectionRejected(pub String);

/// One menu entry.
#[derive(Debug, Clone, Copy)]
struct LanguageOption {
    label: &'static str,
    source: Language,
    target: Language,
}

const OPTIONS: &[LanguageOption] = &[
    LanguageOption {
        label: "Translate to Spanish",
        source: Language::En,
        target: Language::Es,
    },
    LanguageOption {
        label: "Translate to English",
        source: Language::Es,
        target: Language::En,
    },
];

/// Maps menu labels to language pairs.
///
/// Matching is exact after trimming surrounding whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageSelector;

impl LanguageSelector {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a label to a pair.
    pub fn select(&self, text: &str) -> Result<LanguagePair, SelectionRejected> {
        let text = text.trim();
        OPTIONS
            .iter()
            .find(|opt| opt.label == text)
            .and_then(|opt| LanguagePair::new(opt.source, opt.target))
            .ok_or_else(|| SelectionRejected(text.to_string()))
    }

    /// Whether the text is one of the menu labels.
    pub fn is_label(&self, text: &str) -> bool {
        self.select(text).is_ok()
    }

    /// Menu labels in display order.
    pub fn labels(&self) -> impl Iterator<Item = &'static str> {
        OPTIONS.iter().map(|opt| opt.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Translate to Spanish", Language::En, Language::Es ; "to spanish")]
    #[test_case("Translate to English", Language::Es, Language::En ; "to english")]
    #[test_case("  Translate to English\n", Language::Es, Language::En ; "surrounding whitespace")]
    fn selects_pair(label: &str, source: Language, target: Language) {
        let pair = LanguageSelector::new().select(label).unwrap();
        assert_eq!(pair.source(), source);
        assert_eq!(pair.target(), target);
    }

    #[test_case("translate to spanish" ; "wrong case")]
    #[test_case("Spanish" ; "partial")]
    #[test_case("" ; "empty")]
    fn rejects_other_text(text: &str) {
        let err = LanguageSelector::new().select(text).unwrap_err();
        assert_eq!(err.0, text.trim());
    }

    #[test]
    fn pair_requires_distinct_languages() {
        assert!(LanguagePair::new(Language::En, Language::En).is_none());
        let pair = LanguagePair::new(Language::En, Language::Es).unwrap();
        assert_eq!(pair.to_string(), "en->es");
    }

    #[test]
    fn every_label_resolves() {
        let selector = LanguageSelector::new();
        let labels: Vec<_> = selector.labels().collect();
        assert_eq!(labels.len(), 2);
        assert!(labels.iter().all(|l| selector.is_label(l)));
    }
}
