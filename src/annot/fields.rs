/// Placeholder sample identifier; rows without sample information are
/// attributed to it and it participates in links like any real sample.
pub const MISSING_SAMPLE: &str = "NA";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationMode {
    Full,
    Split,
}

impl AnnotationMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "full" => Some(Self::Full),
            "split" => Some(Self::Split),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Split => "split",
        }
    }
}

/// Splits a comma-separated sample list. Tokens are trimmed; empty tokens
/// (and an absent or empty field) become the `NA` placeholder, so the result
/// is never empty and never contains an empty string.
pub fn split_samples(raw: Option<&str>) -> Vec<String> {
    let raw = raw.map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return vec![MISSING_SAMPLE.to_string()];
    }
    raw.split(',')
        .map(|token| {
            let token = token.trim();
            if token.is_empty() {
                MISSING_SAMPLE.to_string()
            } else {
                token.to_string()
            }
        })
        .collect()
}

pub fn text(raw: Option<&str>) -> &str {
    raw.map(str::trim).unwrap_or("")
}

pub fn optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
}

pub fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
}

pub fn parse_float(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parse_trims_and_lowercases() {
        assert_eq!(AnnotationMode::parse(" FULL "), Some(AnnotationMode::Full));
        assert_eq!(AnnotationMode::parse("split"), Some(AnnotationMode::Split));
        assert_eq!(AnnotationMode::parse("Split\t"), Some(AnnotationMode::Split));
        assert_eq!(AnnotationMode::parse(""), None);
        assert_eq!(AnnotationMode::parse("weird"), None);
        assert_eq!(AnnotationMode::parse("fullsplit"), None);
    }

    #[test]
    fn split_samples_trims_every_token() {
        assert_eq!(split_samples(Some("S1, S2 ,S3")), vec!["S1", "S2", "S3"]);
        assert_eq!(split_samples(Some(" S1 ")), vec!["S1"]);
    }

    #[test]
    fn empty_tokens_become_the_placeholder() {
        assert_eq!(split_samples(Some("S1,,S2")), vec!["S1", "NA", "S2"]);
        assert_eq!(split_samples(Some(",")), vec!["NA", "NA"]);
    }

    #[test]
    fn absent_or_empty_field_yields_exactly_na() {
        assert_eq!(split_samples(None), vec!["NA"]);
        assert_eq!(split_samples(Some("")), vec!["NA"]);
        assert_eq!(split_samples(Some("   ")), vec!["NA"]);
    }

    #[test]
    fn numeric_fields_parse_or_fall_through() {
        assert_eq!(parse_int(Some(" 42 ")), Some(42));
        assert_eq!(parse_int(Some("-7")), Some(-7));
        assert_eq!(parse_int(Some("")), None);
        assert_eq!(parse_int(Some("12.5")), None);
        assert_eq!(parse_int(Some("abc")), None);
        assert_eq!(parse_int(None), None);

        assert_eq!(parse_float(Some("66.6")), Some(66.6));
        assert_eq!(parse_float(Some("100")), Some(100.0));
        assert_eq!(parse_float(Some("n/a")), None);
    }

    #[test]
    fn optional_text_distinguishes_absent_from_empty() {
        assert_eq!(optional_text(None), None);
        assert_eq!(optional_text(Some("")), Some(String::new()));
        assert_eq!(optional_text(Some(" yes ")), Some("yes".to_string()));
    }
}
