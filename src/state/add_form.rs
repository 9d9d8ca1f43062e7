use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use crate::state::data_model::{self, Row};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Date,
    Combobox,
    File,
}

impl FieldType {
    pub fn input_type(self) -> &'static str {
        match self {
            Self::Text | Self::Combobox => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::File => "file",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadata {
    pub field_name: String,
    #[serde(default)]
    pub field_label: String,
    #[serde(default, deserialize_with = "lenient_field_type")]
    pub field_type: FieldType,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub mandatory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_sql: Option<String>,
}

impl FieldMetadata {
    pub fn label(&self) -> &str {
        if self.field_label.trim().is_empty() {
            &self.field_name
        } else {
            &self.field_label
        }
    }
}

// The backend sends MySQL flags as "1"/"0" and type names in any case.
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(data_model::value_as_bool(&value).unwrap_or(false))
}

fn lenient_field_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FieldType, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let name = value.as_str().unwrap_or("").trim().to_ascii_lowercase();
    Ok(match name.as_str() {
        "number" | "int" | "integer" | "decimal" => FieldType::Number,
        "date" => FieldType::Date,
        "combobox" | "select" | "lookup" => FieldType::Combobox,
        "file" => FieldType::File,
        _ => FieldType::Text,
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(Option<PathBuf>),
}

impl FormValue {
    fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::File(path) => path.is_none(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowSubmission {
    pub values: Row,
    pub files: BTreeMap<String, PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldError {
    Missing { field: String, label: String },
    InvalidNumber { field: String, label: String },
}

impl FieldError {
    pub fn field(&self) -> &str {
        match self {
            Self::Missing { field, .. } | Self::InvalidNumber { field, .. } => field,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { label, .. } => write!(f, "{label} is required"),
            Self::InvalidNumber { label, .. } => write!(f, "{label} must be a number"),
        }
    }
}

/// Every validation failure of one submission, not just the first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormErrors(pub Vec<FieldError>);

impl FormErrors {
    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field() == field)
    }

    pub fn missing_labels(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter_map(|e| match e {
                FieldError::Missing { label, .. } => Some(label.as_str()),
                FieldError::InvalidNumber { .. } => None,
            })
            .collect()
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&messages.join("; "))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RowForm {
    pub mode: FormMode,
    pub fields: Vec<FieldMetadata>,
    values: BTreeMap<String, FormValue>,
    original: Option<Row>,
}

impl RowForm {
    pub fn new(fields: Vec<FieldMetadata>) -> Self {
        let values = fields
            .iter()
            .map(|f| (f.field_name.clone(), empty_value(f.field_type)))
            .collect();
        Self {
            mode: FormMode::Add,
            fields,
            values,
            original: None,
        }
    }

    pub fn for_edit(fields: Vec<FieldMetadata>, row: &Row) -> Self {
        let mut form = Self::new(fields);
        form.mode = FormMode::Edit;
        for field in &form.fields {
            if field.field_type == FieldType::File {
                continue;
            }
            if let Some(value) = row.get(&field.field_name) {
                form.values.insert(
                    field.field_name.clone(),
                    FormValue::Text(data_model::display_value(value)),
                );
            }
        }
        form.original = Some(row.clone());
        form
    }

    pub fn original(&self) -> Option<&Row> {
        self.original.as_ref()
    }

    pub fn text(&self, field: &str) -> &str {
        match self.values.get(field) {
            Some(FormValue::Text(s)) => s,
            _ => "",
        }
    }

    pub fn file(&self, field: &str) -> Option<&PathBuf> {
        match self.values.get(field) {
            Some(FormValue::File(path)) => path.as_ref(),
            _ => None,
        }
    }

    pub fn set_text(&mut self, field: &str, value: String) {
        self.values
            .insert(field.to_string(), FormValue::Text(value));
    }

    pub fn set_file(&mut self, field: &str, path: Option<PathBuf>) {
        self.values
            .insert(field.to_string(), FormValue::File(path));
    }

    /// Validates every field and splits scalar values from file uploads.
    /// Blank optional values become `null`.
    pub fn submit(&self) -> Result<RowSubmission, FormErrors> {
        let mut errors = Vec::new();
        let mut submission = RowSubmission::default();

        for field in &self.fields {
            let value = self
                .values
                .get(&field.field_name)
                .cloned()
                .unwrap_or_else(|| empty_value(field.field_type));

            if value.is_blank() {
                if field.mandatory {
                    errors.push(FieldError::Missing {
                        field: field.field_name.clone(),
                        label: field.label().to_string(),
                    });
                } else if field.field_type != FieldType::File {
                    submission.values.insert(field.field_name.clone(), Value::Null);
                }
                continue;
            }

            match value {
                FormValue::File(Some(path)) => {
                    submission.files.insert(field.field_name.clone(), path);
                }
                FormValue::File(None) => {}
                FormValue::Text(text) => {
                    let text = text.trim().to_string();
                    if field.field_type == FieldType::Number {
                        match data_model::parse_number(&text).and_then(json_number) {
                            Some(n) => {
                                submission
                                    .values
                                    .insert(field.field_name.clone(), Value::Number(n));
                            }
                            None => errors.push(FieldError::InvalidNumber {
                                field: field.field_name.clone(),
                                label: field.label().to_string(),
                            }),
                        }
                    } else {
                        submission
                            .values
                            .insert(field.field_name.clone(), Value::String(text));
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(submission)
        } else {
            Err(FormErrors(errors))
        }
    }
}

fn empty_value(field_type: FieldType) -> FormValue {
    match field_type {
        FieldType::File => FormValue::File(None),
        _ => FormValue::Text(String::new()),
    }
}

fn json_number(value: f64) -> Option<Number> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        return Some((value as i64).into());
    }
    Number::from_f64(value)
}

/// Lookup values fetched per lookup identifier, fetched at most once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LookupCache {
    entries: HashMap<String, Vec<String>>,
}

impl LookupCache {
    pub fn get(&self, lookup: &str) -> Option<&[String]> {
        self.entries.get(lookup).map(Vec::as_slice)
    }

    pub fn contains(&self, lookup: &str) -> bool {
        self.entries.contains_key(lookup)
    }

    pub fn insert(&mut self, lookup: String, values: Vec<String>) {
        self.entries.insert(lookup, values);
    }

    pub fn missing(&self, fields: &[FieldMetadata]) -> Vec<String> {
        let mut out: Vec<String> = fields
            .iter()
            .filter(|f| f.field_type == FieldType::Combobox)
            .filter_map(|f| f.lookup_sql.clone())
            .filter(|lookup| !self.contains(lookup))
            .collect();
        out.sort();
        out.dedup();
        out
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Suggestion {
    pub value: String,
    pub before: String,
    pub matched: String,
    pub after: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComboKey {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Combobox {
    options: Vec<String>,
    pub input: String,
    pub open: bool,
    pub highlighted: Option<usize>,
}

impl Combobox {
    pub fn new(options: Vec<String>) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Swaps in a fresh option list, keeping the typed input. The highlight
    /// is dropped only when the list actually changed.
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        if self.options != options {
            self.options = options;
            self.highlighted = None;
        }
        self
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn set_options(&mut self, options: Vec<String>) {
        self.options = options;
        self.highlighted = None;
    }

    pub fn type_text(&mut self, input: String) {
        self.input = input;
        self.open = true;
        self.highlighted = None;
    }

    pub fn suggestions(&self) -> Vec<Suggestion> {
        let needle = self.input.trim().to_lowercase();
        self.options
            .iter()
            .filter_map(|option| split_match(option, &needle))
            .collect()
    }

    /// Handles a navigation key; returns the accepted value on Enter.
    pub fn key(&mut self, key: ComboKey) -> Option<String> {
        let count = self.suggestions().len();
        match key {
            ComboKey::ArrowDown if count > 0 => {
                self.open = true;
                self.highlighted = Some(match self.highlighted {
                    Some(i) if i + 1 < count => i + 1,
                    _ => 0,
                });
                None
            }
            ComboKey::ArrowUp if count > 0 => {
                self.open = true;
                self.highlighted = Some(match self.highlighted {
                    Some(i) if i > 0 => i - 1,
                    _ => count - 1,
                });
                None
            }
            ComboKey::Enter => {
                let picked = self
                    .highlighted
                    .and_then(|i| self.suggestions().into_iter().nth(i))
                    .map(|s| s.value)?;
                self.select(picked.clone());
                Some(picked)
            }
            ComboKey::Escape => {
                self.open = false;
                self.highlighted = None;
                None
            }
            _ => None,
        }
    }

    pub fn select(&mut self, value: String) {
        self.input = value;
        self.open = false;
        self.highlighted = None;
    }
}

fn split_match(option: &str, needle: &str) -> Option<Suggestion> {
    if needle.is_empty() {
        return Some(Suggestion {
            value: option.to_string(),
            before: option.to_string(),
            matched: String::new(),
            after: String::new(),
        });
    }
    let lower = option.to_lowercase();
    let start = lower.find(needle)?;
    let end = start + needle.len();
    // Lowercasing can shift byte offsets for some scripts.
    if !option.is_char_boundary(start) || !option.is_char_boundary(end) || lower.len() != option.len() {
        return Some(Suggestion {
            value: option.to_string(),
            before: String::new(),
            matched: option.to_string(),
            after: String::new(),
        });
    }
    Some(Suggestion {
        value: option.to_string(),
        before: option[..start].to_string(),
        matched: option[start..end].to_string(),
        after: option[end..].to_string(),
    })
}
