//! Supported translation target languages.

/// The set of languages the translation UI offers as targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    Portuguese,
    Spanish,
    Russian,
    Turkish,
    French,
}

impl Language {
    /// All supported languages, in display order.
    pub const ALL: [Language; 6] = [
        Language::English,
        Language::Portuguese,
        Language::Spanish,
        Language::Russian,
        Language::Turkish,
        Language::French,
    ];

    /// BCP-47 primary language subtag.
    pub fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Portuguese => "pt",
            Self::Spanish => "es",
            Self::Russian => "ru",
            Self::Turkish => "tr",
            Self::French => "fr",
        }
    }

    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Portuguese => "Portuguese",
            Self::Spanish => "Spanish",
            Self::Russian => "Russian",
            Self::Turkish => "Turkish",
            Self::French => "French",
        }
    }

    /// Parse a language code. Unknown codes yield `None`.
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Self::English),
            "pt" => Some(Self::Portuguese),
            "es" => Some(Self::Spanish),
            "ru" => Some(Self::Russian),
            "tr" => Some(Self::Turkish),
            "fr" => Some(Self::French),
            _ => None,
        }
    }
}

impl std::str::FromStr for Language {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or(())
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_and_parse_agree() {
        for lang in Language::ALL {
            assert_eq!(Language::parse(lang.code()), Some(lang));
        }
    }

    #[test]
    fn unknown_code_rejected() {
        assert_eq!(Language::parse("de"), None);
        assert_eq!(Language::parse(""), None);
    }

    #[test]
    fn labels_are_distinct() {
        let labels: std::collections::HashSet<_> =
            Language::ALL.iter().map(|l| l.label()).collect();
        assert_eq!(labels.len(), Language::ALL.len());
    }
}
