use serde_json::Value;

use crate::data::DataPoint;
use crate::geometry::Feature;

/// Fraction digits shown for a data value in the default tooltip.
pub const TOOLTIP_FRACTION_DIGITS: usize = 3;

/// Default tooltip text for the active feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TooltipContent {
    pub title: String,
    /// `"{label}: {value}"`, only when the feature has a data point.
    pub detail: Option<String>,
}

impl TooltipContent {
    pub fn for_feature(feature: &Feature, property_key: &str, point: Option<&DataPoint>) -> Self {
        let title = ["name", "NAME"]
            .into_iter()
            .find_map(|key| feature.property(key).and_then(truthy_text))
            .or_else(|| feature.key(property_key))
            .unwrap_or_default();
        let detail = point.map(|point| {
            let label = point
                .label
                .as_deref()
                .filter(|label| !label.is_empty())
                .unwrap_or("Value");
            format!(
                "{label}: {}",
                format_number(point.value, TOOLTIP_FRACTION_DIGITS)
            )
        });
        Self { title, detail }
    }
}

// Empty strings, zero and false don't count as a name.
fn truthy_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// Locale-style formatting: thousands grouped with commas, at most `max_fraction_digits`
/// decimals, trailing zeros dropped.
pub fn format_number(value: f64, max_fraction_digits: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "∞" } else { "-∞" }.to_string();
    }

    let fixed = format!("{:.*}", max_fraction_digits, value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = group_thousands(int_part);
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    if value < 0.0 && out != "0" {
        out.insert(0, '-');
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::geometry::fixtures::square_at;

    #[test]
    fn formats_like_locale_strings() {
        assert_eq!(format_number(0.0, 3), "0");
        assert_eq!(format_number(1234.5, 1), "1,234.5");
        assert_eq!(format_number(1234567.0, 3), "1,234,567");
        assert_eq!(format_number(-9876.54321, 3), "-9,876.543");
        assert_eq!(format_number(0.12345, 1), "0.1");
        assert_eq!(format_number(999.96, 1), "1,000");
        assert_eq!(format_number(-0.01, 1), "0");
        assert_eq!(format_number(12.0, 0), "12");
        assert_eq!(format_number(f64::NAN, 1), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY, 1), "-∞");
    }

    #[test]
    fn title_prefers_name_then_upper_name_then_key() {
        let feature = square_at("fr", 0.0, 0.0, 1.0);
        let content = TooltipContent::for_feature(&feature, "id", None);
        assert_eq!(content.title, "FR");
        assert_eq!(content.detail, None);

        let mut feature = square_at("de", 0.0, 0.0, 1.0);
        feature.properties = json!({ "name": "", "NAME": "Germany" })
            .as_object()
            .cloned();
        assert_eq!(TooltipContent::for_feature(&feature, "id", None).title, "Germany");

        feature.properties = None;
        assert_eq!(TooltipContent::for_feature(&feature, "id", None).title, "de");
    }

    #[test]
    fn detail_uses_label_or_value_caption() {
        let feature = square_at("us", 0.0, 0.0, 1.0);
        let point = DataPoint::new("us", 331_002_651.25);
        let content = TooltipContent::for_feature(&feature, "id", Some(&point));
        assert_eq!(content.detail.as_deref(), Some("Value: 331,002,651.25"));

        let point = point.with_label("Population");
        let content = TooltipContent::for_feature(&feature, "id", Some(&point));
        assert_eq!(content.detail.as_deref(), Some("Population: 331,002,651.25"));
    }
}
