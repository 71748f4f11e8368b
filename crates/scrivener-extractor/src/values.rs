//! Normalise raw reply values according to their field kind

use chrono::NaiveDate;
use scrivener_domain::{FieldIssue, FieldKind, FieldSpec, FieldValue, SourceId};
use tracing::warn;

/// Turn a raw reply value into a validated field value
///
/// `raw` is `None` when the reply omitted the field or left it blank.
pub fn normalize(spec: &FieldSpec, raw: Option<&str>, source: &SourceId) -> FieldValue {
    if let FieldKind::FileStem = spec.kind {
        return FieldValue::ok(source.file_stem());
    }

    let raw = match raw.map(clean_text) {
        Some(text) if !text.is_empty() => text,
        _ if spec.required => return FieldValue::flagged("", FieldIssue::MissingRequired),
        _ => return FieldValue::ok(""),
    };

    match &spec.kind {
        FieldKind::Text => FieldValue::ok(raw),
        FieldKind::Title => {
            if fold(&raw) == fold(source.file_stem()) {
                FieldValue::ok("")
            } else {
                FieldValue::ok(raw)
            }
        }
        FieldKind::Date => match parse_date(&raw) {
            Some(date) => FieldValue::ok(date.format("%Y-%m-%d").to_string()),
            None => FieldValue::flagged(raw, FieldIssue::InvalidDate),
        },
        FieldKind::Number => match parse_number(&raw) {
            Some(number) => FieldValue::ok(number),
            None => FieldValue::flagged(raw, FieldIssue::InvalidNumber),
        },
        FieldKind::Choice { options, fallback } => match match_choice(options, &raw, fallback.is_some()) {
            Some(option) => FieldValue::ok(option),
            None => match fallback {
                Some(fallback) => {
                    warn!(field = %spec.name, value = %raw, fallback = %fallback, "Value outside vocabulary, using fallback");
                    FieldValue::ok(fallback.clone())
                }
                None => FieldValue::flagged(raw, FieldIssue::OutOfVocabulary),
            },
        },
        FieldKind::FileStem => FieldValue::ok(source.file_stem()),
    }
}

fn clean_text(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

/// Comparison key: whitespace, enumeration commas and bracket width ignored
fn fold(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && *c != '、')
        .map(|c| match c {
            '（' => '(',
            '）' => ')',
            other => other,
        })
        .collect()
}

/// Parse the date shapes documents and models commonly produce
///
/// `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYY.MM.DD`, `YYYYMMDD` and
/// `YYYY年M月D日`, with optional whitespace. A trailing time of day
/// (`2024-01-15T08:30:00`, `2024-01-15 08:30`) is dropped.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let compact: String = strip_time(raw.trim()).chars().filter(|c| !c.is_whitespace()).collect();

    if compact.len() == 8 && compact.chars().all(|c| c.is_ascii_digit()) {
        let year = compact[0..4].parse().ok()?;
        let month = compact[4..6].parse().ok()?;
        let day = compact[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let parts: Vec<&str> = compact
        .split(|c| matches!(c, '-' | '/' | '.' | '年' | '月' | '日'))
        .filter(|part| !part.is_empty())
        .collect();
    if parts.len() != 3 || !parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }
    if parts[0].len() != 4 || parts[1].len() > 2 || parts[2].len() > 2 {
        return None;
    }
    // Separators must be consistent with one of the accepted shapes
    let ok_shape = compact.contains('年') && compact.contains('月')
        || ['-', '/', '.'].iter().any(|sep| compact.matches(*sep).count() == 2);
    if !ok_shape {
        return None;
    }

    NaiveDate::from_ymd_opt(parts[0].parse().ok()?, parts[1].parse().ok()?, parts[2].parse().ok()?)
}

fn strip_time(raw: &str) -> &str {
    let is_time = |rest: &str| {
        let rest = rest.trim();
        rest.starts_with(|c: char| c.is_ascii_digit())
            && rest.contains(':')
            && rest.chars().all(|c| c.is_ascii_digit() || matches!(c, ':' | '.' | '+' | '-' | 'Z'))
    };
    match raw.split_once(['T', ' ']) {
        Some((date, time)) if is_time(time) => date,
        _ => raw,
    }
}

/// Parse a number with optional thousands separators
pub fn parse_number(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && *c != '，')
        .collect();
    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        Some(format!("{}", value as i64))
    } else {
        Some(value.to_string())
    }
}

const MIN_PARTIAL_CHARS: usize = 2;

/// Snap a value onto a closed vocabulary
///
/// Exact match first, then folded equality. With `loose`, folded
/// containment in either direction is also accepted, taking the first
/// option in declared order; a value must be at least two characters to
/// match as part of a longer option.
pub fn match_choice(options: &[String], raw: &str, loose: bool) -> Option<String> {
    if let Some(option) = options.iter().find(|o| o.as_str() == raw) {
        return Some(option.clone());
    }
    let needle = fold(raw);
    if needle.is_empty() {
        return None;
    }
    let exact = options.iter().find(|o| fold(o) == needle);
    if exact.is_some() || !loose {
        return exact.cloned();
    }
    let partial = needle.chars().count() >= MIN_PARTIAL_CHARS;
    options
        .iter()
        .find(|o| {
            let option = fold(o);
            needle.contains(&option) || (partial && option.contains(&needle))
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrivener_domain::FieldSpec;

    fn source() -> SourceId {
        SourceId::new("2024/关于印发（实施方案）的通知.docx")
    }

    #[test]
    fn test_parse_date_shapes() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5);
        for raw in [
            "2024-03-05",
            "2024/3/5",
            "2024.03.05",
            "20240305",
            "2024年3月5日",
            " 2024 年 03 月 05 日 ",
            "2024-03-05T00:00:00",
            "2024-03-05T08:30:00+08:00",
            "2024-03-05 08:30",
        ] {
            assert_eq!(parse_date(raw), expected, "{}", raw);
        }
    }

    #[test]
    fn test_parse_date_rejects() {
        for raw in [
            "2024-02-30",
            "March 5, 2024",
            "24-03-05",
            "2024-03",
            "2024-03/05",
            "soon",
            "2024年3月",
            "2024-03-05Tnoon",
        ] {
            assert_eq!(parse_date(raw), None, "{}", raw);
        }
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("1,234"), Some("1234".to_string()));
        assert_eq!(parse_number(" 12.50 "), Some("12.5".to_string()));
        assert_eq!(parse_number("-3"), Some("-3".to_string()));
        assert_eq!(parse_number("三"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn test_match_choice() {
        let options: Vec<String> = ["教育", "卫生健康与医疗", "其他"].iter().map(|s| s.to_string()).collect();
        assert_eq!(match_choice(&options, "教育", true), Some("教育".to_string()));
        assert_eq!(match_choice(&options, "卫生 健康与医疗", true), Some("卫生健康与医疗".to_string()));
        assert_eq!(match_choice(&options, "卫生健康", true), Some("卫生健康与医疗".to_string()));
        assert_eq!(match_choice(&options, "教育培训", true), Some("教育".to_string()));
        assert_eq!(match_choice(&options, "商务", true), None);
        assert_eq!(match_choice(&options, "卫", true), None);
    }

    #[test]
    fn test_strict_choice_needs_whole_option() {
        let levels: Vec<String> = ["省部级", "厅局级", "科级"].iter().map(|s| s.to_string()).collect();
        assert_eq!(match_choice(&levels, "省部级", false), Some("省部级".to_string()));
        assert_eq!(match_choice(&levels, "科 级", false), Some("科级".to_string()));
        assert_eq!(match_choice(&levels, "部级", false), None);
        assert_eq!(match_choice(&levels, "级", false), None);
        assert_eq!(match_choice(&levels, "正科级", false), None);

        let position = FieldSpec::new("Position", FieldKind::choice(&["省部级", "科级"], None), "");
        assert_eq!(
            normalize(&position, Some("部级"), &source()),
            FieldValue::flagged("部级", FieldIssue::OutOfVocabulary)
        );
    }

    #[test]
    fn test_datetime_reply_keeps_date() {
        let date = FieldSpec::new("EffectiveDate", FieldKind::Date, "");
        assert_eq!(normalize(&date, Some("2024-01-15T00:00:00"), &source()), FieldValue::ok("2024-01-15"));
    }

    #[test]
    fn test_file_stem_ignores_reply() {
        let spec = FieldSpec::new("PolicyFileName", FieldKind::FileStem, "");
        assert_eq!(normalize(&spec, Some("whatever"), &source()).value, "关于印发（实施方案）的通知");
    }

    #[test]
    fn test_title_repeating_file_name_is_cleared() {
        let spec = FieldSpec::new("Remarks", FieldKind::Title, "");
        assert_eq!(normalize(&spec, Some("关于印发(实施方案)的通知"), &source()).value, "");
        assert_eq!(normalize(&spec, Some("关于印发 实施方案 的通知 "), &source()).value, "关于印发 实施方案 的通知");
    }

    #[test]
    fn test_missing_values() {
        let required = FieldSpec::new("IssuingAuthority", FieldKind::Text, "").required();
        let optional = FieldSpec::new("Refrence", FieldKind::Text, "");
        assert_eq!(
            normalize(&required, None, &source()),
            FieldValue::flagged("", FieldIssue::MissingRequired)
        );
        assert_eq!(
            normalize(&required, Some("  "), &source()),
            FieldValue::flagged("", FieldIssue::MissingRequired)
        );
        assert_eq!(normalize(&optional, None, &source()), FieldValue::ok(""));
    }

    #[test]
    fn test_invalid_values_keep_raw_text() {
        let date = FieldSpec::new("EffectiveDate", FieldKind::Date, "");
        assert_eq!(
            normalize(&date, Some("下周一"), &source()),
            FieldValue::flagged("下周一", FieldIssue::InvalidDate)
        );
        let number = FieldSpec::new("Count", FieldKind::Number, "");
        assert_eq!(
            normalize(&number, Some("many"), &source()),
            FieldValue::flagged("many", FieldIssue::InvalidNumber)
        );
    }

    #[test]
    fn test_choice_fallback_and_flag() {
        let topic = FieldSpec::new("Topic", FieldKind::choice(&["教育", "其他"], Some("其他")), "");
        assert_eq!(normalize(&topic, Some("航天"), &source()), FieldValue::ok("其他"));

        let position = FieldSpec::new("Position", FieldKind::choice(&["科级", "处级"], None), "");
        assert_eq!(
            normalize(&position, Some("部级"), &source()),
            FieldValue::flagged("部级", FieldIssue::OutOfVocabulary)
        );
    }
}
