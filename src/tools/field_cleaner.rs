use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{HashMap, HashSet};

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

const FALSE_VALUES: [&str; 5] = ["f", "false", "no", "0", "n"];
const TRUE_VALUES: [&str; 5] = ["t", "true", "yes", "1", "y"];

/// A single cleaned CSV value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Date(NaiveDate),
    Bool(bool),
}

/// One CSV row after header normalisation and field cleaning
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanRecord {
    fields: HashMap<String, FieldValue>,
    order: Vec<String>,
}

impl CleanRecord {
    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        let key = key.into();
        if self.fields.insert(key.clone(), value).is_none() {
            self.order.push(key);
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Keys in their original column order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn text(&self, key: &str) -> Option<String> {
        match self.fields.get(key) {
            Some(FieldValue::Text(value)) => Some(value.clone()),
            Some(FieldValue::Bool(value)) => Some(value.to_string()),
            Some(FieldValue::Date(value)) => Some(value.format(DEFAULT_DATE_FORMAT).to_string()),
            _ => None,
        }
    }

    /// Text that is present and not blank
    pub fn non_empty(&self, key: &str) -> Option<String> {
        self.text(key).filter(|value| !value.trim().is_empty())
    }

    pub fn date(&self, key: &str) -> Option<NaiveDate> {
        match self.fields.get(key) {
            Some(FieldValue::Date(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        match self.fields.get(key) {
            Some(FieldValue::Text(value)) => parse_int(value),
            _ => None,
        }
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        match self.fields.get(key) {
            Some(FieldValue::Text(value)) => value.trim().replace(',', "").parse().ok(),
            _ => None,
        }
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.fields.get(key) {
            Some(FieldValue::Bool(value)) => Some(*value),
            _ => None,
        }
    }
}

/// Integers as published: thousands separators, currency symbols and a trailing `.0` are tolerated
pub fn parse_int(value: &str) -> Option<i64> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '£' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned
        .parse::<i64>()
        .ok()
        .or_else(|| cleaned.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i64))
}

/// Trim a header, drop any byte-order mark and turn `.` separators into `_`
pub fn normalise_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .trim()
        .replace('.', "_")
}

/// Parse `value` with the first matching format, accepting date-only and date-time formats
pub fn parse_date(value: &str, formats: &[&str]) -> Option<NaiveDate> {
    formats.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(value, format)
            .map(|dt| dt.date())
            .or_else(|_| NaiveDate::parse_from_str(value, format))
            .ok()
    })
}

/// Per-dataset cleaning rules for date and boolean columns
#[derive(Debug, Clone, Default)]
pub struct FieldCleaner {
    date_fields: HashSet<String>,
    bool_fields: HashSet<String>,
    date_formats: Vec<String>,
    field_date_formats: HashMap<String, Vec<String>>,
}

impl FieldCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_fields(mut self, fields: &[&str]) -> Self {
        self.date_fields.extend(fields.iter().map(|f| f.to_string()));
        self
    }

    pub fn with_bool_fields(mut self, fields: &[&str]) -> Self {
        self.bool_fields.extend(fields.iter().map(|f| f.to_string()));
        self
    }

    /// Formats tried for every date field without its own override
    pub fn with_date_formats(mut self, formats: &[&str]) -> Self {
        self.date_formats = formats.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_field_date_format(mut self, field: &str, formats: &[&str]) -> Self {
        self.field_date_formats
            .insert(field.to_string(), formats.iter().map(|f| f.to_string()).collect());
        self
    }

    fn formats_for(&self, field: &str) -> Vec<&str> {
        let formats = self
            .field_date_formats
            .get(field)
            .filter(|formats| !formats.is_empty())
            .unwrap_or(&self.date_formats);
        if formats.is_empty() {
            vec![DEFAULT_DATE_FORMAT]
        } else {
            formats.iter().map(String::as_str).collect()
        }
    }

    /// Clean one value according to the rules for `field`
    pub fn clean_value(&self, field: &str, raw: &str) -> FieldValue {
        if raw.is_empty() {
            return FieldValue::Null;
        }

        if self.date_fields.contains(field) {
            return match parse_date(raw.trim(), &self.formats_for(field)) {
                Some(date) => FieldValue::Date(date),
                None => FieldValue::Null,
            };
        }

        if self.bool_fields.contains(field) {
            let value = raw.trim().to_lowercase();
            if FALSE_VALUES.contains(&value.as_str()) {
                return FieldValue::Bool(false);
            }
            if TRUE_VALUES.contains(&value.as_str()) {
                return FieldValue::Bool(true);
            }
            return FieldValue::Text(raw.to_string());
        }

        FieldValue::Text(raw.trim().replace('\0', ""))
    }

    /// Clean a whole row; `headers` must already be normalised
    pub fn clean(&self, headers: &[String], values: &[String]) -> CleanRecord {
        let mut record = CleanRecord::default();
        for (index, header) in headers.iter().enumerate() {
            let raw = values.get(index).map(String::as_str).unwrap_or("");
            record.insert(header.clone(), self.clean_value(header, raw));
        }
        record
    }
}
