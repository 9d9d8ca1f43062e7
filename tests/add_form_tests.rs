use std::path::PathBuf;

use serde_json::{json, Value};

use admingrid::io::api::RowAction;
use admingrid::state::add_form::{
    ComboKey, Combobox, FieldError, FieldMetadata, FieldType, FormMode, LookupCache, RowForm,
};
use admingrid::state::column::RawColumn;
use admingrid::state::data_model;
use admingrid::state::table_state::{TableEvent, TableState};

fn field(name: &str, label: &str, field_type: FieldType, mandatory: bool) -> FieldMetadata {
    FieldMetadata {
        field_name: name.to_string(),
        field_label: label.to_string(),
        field_type,
        mandatory,
        lookup_sql: None,
    }
}

fn customer_fields() -> Vec<FieldMetadata> {
    let mut role = field("role", "Role", FieldType::Combobox, false);
    role.lookup_sql = Some("roles".to_string());
    vec![
        field("name", "Name", FieldType::Text, true),
        field("age", "Age", FieldType::Number, true),
        role,
        field("note", "", FieldType::Text, false),
        field("cv", "CV", FieldType::File, false),
    ]
}

#[test]
fn test_field_metadata_lenient_decode() {
    let fields: Vec<FieldMetadata> = serde_json::from_value(json!([
        {"field_name": "role", "field_type": "SELECT", "mandatory": "1", "lookup_sql": "roles"},
        {"field_name": "born", "field_label": "Born", "field_type": "date", "mandatory": 0},
        {"field_name": "misc", "field_type": 7}
    ]))
    .unwrap();

    assert_eq!(fields[0].field_type, FieldType::Combobox);
    assert!(fields[0].mandatory);
    assert_eq!(fields[0].label(), "role");
    assert_eq!(fields[1].field_type, FieldType::Date);
    assert!(!fields[1].mandatory);
    assert_eq!(fields[1].label(), "Born");
    assert_eq!(fields[2].field_type, FieldType::Text);
}

#[test]
fn test_submit_collects_every_error() {
    let form = RowForm::new(customer_fields());
    let errors = form.submit().unwrap_err();

    assert_eq!(errors.0.len(), 2);
    assert_eq!(errors.missing_labels(), vec!["Name", "Age"]);
    assert!(errors.for_field("role").is_none());
    assert_eq!(errors.to_string(), "Name is required; Age is required");
}

#[test]
fn test_submit_rejects_non_numeric_number() {
    let mut form = RowForm::new(customer_fields());
    form.set_text("name", "Ann".to_string());
    form.set_text("age", "forty".to_string());

    let errors = form.submit().unwrap_err();
    assert_eq!(
        errors.0,
        vec![FieldError::InvalidNumber {
            field: "age".to_string(),
            label: "Age".to_string(),
        }]
    );
    assert_eq!(errors.0[0].to_string(), "Age must be a number");
}

#[test]
fn test_submit_builds_values_and_files() {
    let mut form = RowForm::new(customer_fields());
    form.set_text("name", "  Ann ".to_string());
    form.set_text("age", "42".to_string());
    form.set_file("cv", Some(PathBuf::from("/tmp/cv.pdf")));

    let submission = form.submit().unwrap();
    assert_eq!(submission.values["name"], json!("Ann"));
    assert_eq!(submission.values["age"], json!(42));
    assert_eq!(submission.values["role"], Value::Null);
    assert_eq!(submission.values["note"], Value::Null);
    assert!(!submission.values.contains_key("cv"));
    assert_eq!(submission.files["cv"], PathBuf::from("/tmp/cv.pdf"));
}

#[test]
fn test_edit_form_prefills_and_merges_original() {
    let original = data_model::row_from_value(json!({"id": 7, "name": "Bob", "age": 30})).unwrap();
    let mut form = RowForm::for_edit(customer_fields(), &original);
    assert_eq!(form.mode, FormMode::Edit);
    assert_eq!(form.text("name"), "Bob");
    assert_eq!(form.text("age"), "30");
    assert_eq!(form.text("role"), "");

    form.set_text("name", "Robert".to_string());
    let table = TableState::new("customers", "customers");
    let event = table.submit_form(&form).unwrap();
    assert!(matches!(event, TableEvent::EditSubmit { .. }));

    let action = RowAction::from_event("customers", event).unwrap();
    assert_eq!(action.name(), "update");
    let body = serde_json::to_value(&action).unwrap();
    assert_eq!(body["action"], json!("update"));
    assert_eq!(body["formName"], json!("customers"));
    assert_eq!(body["rowData"]["id"], json!(7));
    assert_eq!(body["rowData"]["name"], json!("Robert"));
    assert_eq!(body["rowData"]["age"], json!(30));
}

#[test]
fn test_add_submit_and_delete_actions() {
    let mut table = TableState::new("customers", "customers");
    table.set_data(
        vec![RawColumn::code("id", "integer"), RawColumn::code("name", "string")],
        vec![data_model::row_from_value(json!({"id": 1, "name": "Ann"})).unwrap()],
    );

    let mut form = RowForm::new(vec![field("name", "Name", FieldType::Text, true)]);
    form.set_text("name", "Zed".to_string());
    let event = table.submit_form(&form).unwrap();
    let action = RowAction::from_event("customers", event).unwrap();
    assert_eq!(
        serde_json::to_value(&action).unwrap(),
        json!({"action": "add", "formName": "customers", "rowData": {"name": "Zed"}})
    );

    table.select_all_displayed();
    let action = RowAction::from_event("customers", table.request_delete().unwrap()).unwrap();
    assert_eq!(
        serde_json::to_value(&action).unwrap(),
        json!({"action": "delete", "formName": "customers", "rows": [{"id": 1, "name": "Ann"}]})
    );
    assert!(action.files().is_none());

    assert!(RowAction::from_event("customers", TableEvent::Add).is_none());
}

#[test]
fn test_combobox_filters_and_highlights() {
    let mut combo = Combobox::new(vec![
        "Engineer".to_string(),
        "Designer".to_string(),
        "Manager".to_string(),
    ]);
    combo.type_text("eng".to_string());
    assert!(combo.open);

    let suggestions = combo.suggestions();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].value, "Engineer");
    assert_eq!(suggestions[0].before, "");
    assert_eq!(suggestions[0].matched, "Eng");
    assert_eq!(suggestions[0].after, "ineer");

    assert_eq!(combo.key(ComboKey::ArrowDown), None);
    assert_eq!(combo.highlighted, Some(0));
    assert_eq!(combo.key(ComboKey::Enter), Some("Engineer".to_string()));
    assert_eq!(combo.input, "Engineer");
    assert!(!combo.open);
}

#[test]
fn test_combobox_keyboard_wraps_and_escapes() {
    let mut combo = Combobox::new(vec![
        "Engineer".to_string(),
        "Designer".to_string(),
        "Manager".to_string(),
    ]);
    combo.type_text("er".to_string());
    assert_eq!(combo.suggestions().len(), 3);

    combo.key(ComboKey::ArrowUp);
    assert_eq!(combo.highlighted, Some(2));
    combo.key(ComboKey::ArrowDown);
    assert_eq!(combo.highlighted, Some(0));

    combo.key(ComboKey::Escape);
    assert!(!combo.open);
    assert_eq!(combo.highlighted, None);
    assert_eq!(combo.key(ComboKey::Enter), None);
}

#[test]
fn test_combobox_option_refresh_keeps_highlight_when_unchanged() {
    let options = vec!["Alpha".to_string(), "Beta".to_string()];
    let mut combo = Combobox::new(options.clone());
    combo.type_text("a".to_string());
    combo.key(ComboKey::ArrowDown);

    let combo = combo.with_options(options);
    assert_eq!(combo.highlighted, Some(0));

    let combo = combo.with_options(vec!["Gamma".to_string()]);
    assert_eq!(combo.highlighted, None);
    assert_eq!(combo.options(), &["Gamma".to_string()]);
}

#[test]
fn test_lookup_cache_reports_missing_once() {
    let mut fields = customer_fields();
    let mut second = field("manager_role", "Manager role", FieldType::Combobox, false);
    second.lookup_sql = Some("roles".to_string());
    fields.push(second);

    let mut cache = LookupCache::default();
    assert_eq!(cache.missing(&fields), vec!["roles".to_string()]);

    cache.insert("roles".to_string(), vec!["Engineer".to_string()]);
    assert!(cache.missing(&fields).is_empty());
    assert_eq!(cache.get("roles"), Some(&["Engineer".to_string()][..]));
}
