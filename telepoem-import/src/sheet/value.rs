//! Cell value representation for the source workbook

use chrono::{NaiveDateTime, NaiveTime, Timelike};

/// A single spreadsheet cell after blank normalization.
///
/// Empty strings, whitespace-only strings and error cells are all folded into
/// `Value::Null` when the grid is built, so consumers only ever test for one
/// blank marker.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Null/empty cell
    #[default]
    Null,
    /// Text cell (never blank)
    String(String),
    /// Whole number
    Int(i64),
    /// Fractional number
    Float(f64),
    /// Boolean cell (TRUE/FALSE)
    Bool(bool),
    /// Date or date and time
    DateTime(NaiveDateTime),
    /// Time of day or short duration
    Time(NaiveTime),
}

impl Value {
    /// Build a text value, folding blank strings into `Null`
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            Value::Null
        } else {
            Value::String(s)
        }
    }

    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render the cell the way it reads in the sheet, trimmed.
    ///
    /// Returns `None` for null cells. Whole floats drop their fractional part
    /// so numeric cells like phone numbers keep their digits intact.
    pub fn to_text(&self) -> Option<String> {
        let text = match self {
            Value::Null => return None,
            Value::String(s) => s.trim().to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Value::Bool(b) => b.to_string(),
            Value::DateTime(dt) => {
                if dt.time().num_seconds_from_midnight() == 0 {
                    dt.format("%Y-%m-%d").to_string()
                } else {
                    dt.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
            Value::Time(t) => t.format("%H:%M:%S").to_string(),
        };

        if text.is_empty() { None } else { Some(text) }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_text() {
            Some(text) => write!(f, "{}", text),
            None => write!(f, "(null)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_blank_text_is_null() {
        assert_eq!(Value::text(""), Value::Null);
        assert_eq!(Value::text("   "), Value::Null);
        assert_eq!(Value::text("\u{a0}"), Value::Null);
        assert_eq!(Value::default(), Value::Null);
        assert_eq!(Value::text("Boston"), Value::String("Boston".to_string()));
    }

    #[test]
    fn test_to_text_numbers() {
        assert_eq!(Value::Int(42).to_text().as_deref(), Some("42"));
        assert_eq!(Value::Float(6175550100.0).to_text().as_deref(), Some("6175550100"));
        assert_eq!(Value::Float(1.5).to_text().as_deref(), Some("1.5"));
        assert_eq!(Value::Null.to_text(), None);
    }

    #[test]
    fn test_to_text_dates_and_times() {
        let date = NaiveDate::from_ymd_opt(2023, 4, 9).unwrap();
        let midnight = date.and_hms_opt(0, 0, 0).unwrap();
        let afternoon = date.and_hms_opt(14, 30, 0).unwrap();
        assert_eq!(Value::DateTime(midnight).to_text().as_deref(), Some("2023-04-09"));
        assert_eq!(
            Value::DateTime(afternoon).to_text().as_deref(),
            Some("2023-04-09 14:30:00")
        );

        let time = NaiveTime::from_hms_opt(0, 5, 30).unwrap();
        assert_eq!(Value::Time(time).to_text().as_deref(), Some("00:05:30"));
    }

    #[test]
    fn test_to_text_trims_strings() {
        assert_eq!(Value::String("  Jane ".into()).to_text().as_deref(), Some("Jane"));
    }
}
