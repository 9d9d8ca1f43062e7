use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use admingrid::io::api::{ActionOutcome, FormFields, RowAction, TableData};
use admingrid::io::backend::{BackendError, GridBackend};
use admingrid::io::file_backend::FileBackend;
use admingrid::io::pattern_store::{PatternManager, SaveOutcome};
use admingrid::io::state_store::{self, AutoSaver, StateStore};
use admingrid::state::column::RawColumn;
use admingrid::state::data_model;
use admingrid::state::patterns::{PatternData, PatternKind, PatternSummary};
use admingrid::state::table_state::TableState;
use admingrid::state::view_state::ViewState;

/// Records grid-state writes; every call fails while `failing` is set.
/// A view whose `name` width equals `slow_failure` fails after 100 ms.
#[derive(Default)]
struct RecordingBackend {
    failing: AtomicBool,
    slow_failure: Mutex<Option<u32>>,
    stored_state: Mutex<Option<Value>>,
    saves: Mutex<Vec<(String, ViewState)>>,
}

impl RecordingBackend {
    fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), BackendError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(BackendError::Status(500))
        } else {
            Ok(())
        }
    }

    fn saves(&self) -> Vec<(String, ViewState)> {
        self.saves.lock().unwrap().clone()
    }
}

#[async_trait]
impl GridBackend for RecordingBackend {
    async fn fetch_fields(&self, _form_name: &str) -> Result<FormFields, BackendError> {
        self.check()?;
        Ok(FormFields::default())
    }

    async fn fetch_table(&self, _form_name: &str) -> Result<TableData, BackendError> {
        Ok(TableData {
            columns: vec![RawColumn::code("name", "string"), RawColumn::code("age", "integer")],
            data: vec![
                data_model::row_from_value(json!({"name": "Ann", "age": 41})).unwrap(),
                data_model::row_from_value(json!({"name": "Ben", "age": 19})).unwrap(),
            ],
        })
    }

    async fn submit_rows(&self, _action: RowAction) -> Result<ActionOutcome, BackendError> {
        self.check()?;
        Ok(ActionOutcome::default())
    }

    async fn load_grid_state(&self, _table_name: &str) -> Result<Option<Value>, BackendError> {
        self.check()?;
        Ok(self.stored_state.lock().unwrap().clone())
    }

    async fn save_grid_state(&self, table_name: &str, state: &ViewState) -> Result<(), BackendError> {
        self.check()?;
        let slow_failure = *self.slow_failure.lock().unwrap();
        if slow_failure.is_some() && state.layout.widths.get("name").copied() == slow_failure {
            tokio::time::sleep(Duration::from_millis(100)).await;
            return Err(BackendError::Status(503));
        }
        self.saves
            .lock()
            .unwrap()
            .push((table_name.to_string(), state.clone()));
        Ok(())
    }

    async fn list_patterns(
        &self,
        _kind: PatternKind,
        _table_name: &str,
    ) -> Result<Vec<PatternSummary>, BackendError> {
        self.check()?;
        Ok(vec![PatternSummary {
            id: 1,
            name: "Existing".to_string(),
        }])
    }

    async fn load_pattern(
        &self,
        _kind: PatternKind,
        _table_name: &str,
        _id: i64,
    ) -> Result<Value, BackendError> {
        Err(BackendError::NotFound("pattern".to_string()))
    }

    async fn save_pattern(
        &self,
        _kind: PatternKind,
        _table_name: &str,
        _name: &str,
        _data: Value,
        _id: Option<i64>,
    ) -> Result<i64, BackendError> {
        self.check()?;
        Ok(1)
    }

    async fn delete_pattern(
        &self,
        _kind: PatternKind,
        _table_name: &str,
        _id: i64,
    ) -> Result<(), BackendError> {
        self.check()
    }

    async fn lookup_values(&self, _lookup: &str) -> Result<Vec<String>, BackendError> {
        self.check()?;
        Ok(Vec::new())
    }
}

fn view_with_width(width: u32) -> ViewState {
    let mut view = ViewState::default();
    view.layout.widths.insert("name".to_string(), width);
    view
}

fn file_backend(dir: &Path) -> Arc<FileBackend> {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let source = manifest_dir.join("tests").join("data").join("admin.json");
    let target = dir.join("admin.json");
    std::fs::copy(source, &target).unwrap();
    Arc::new(FileBackend::open(target).unwrap())
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_changes_saves_once() {
    let backend = Arc::new(RecordingBackend::default());
    let saver = AutoSaver::new(backend.clone(), "customers", Duration::from_millis(2500));

    let first = tokio::spawn(saver.schedule(view_with_width(100)));
    assert!(saver.has_unsaved_changes());
    tokio::time::sleep(Duration::from_millis(1000)).await;
    let second = tokio::spawn(saver.schedule(view_with_width(200)));
    tokio::time::sleep(Duration::from_millis(1000)).await;
    let third = tokio::spawn(saver.schedule(view_with_width(300)));

    first.await.unwrap();
    second.await.unwrap();
    third.await.unwrap();

    let saves = backend.saves();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].0, "customers");
    assert_eq!(saves[0].1, view_with_width(300));
    assert_eq!(saver.write_count(), 1);
    assert!(!saver.has_unsaved_changes());
}

#[tokio::test(start_paused = true)]
async fn test_flush_supersedes_pending_save() {
    let backend = Arc::new(RecordingBackend::default());
    let saver = AutoSaver::new(backend.clone(), "customers", Duration::from_millis(2500));

    let pending = tokio::spawn(saver.schedule(view_with_width(100)));
    saver.flush(&view_with_width(400)).await.unwrap();
    pending.await.unwrap();

    let saves = backend.saves();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].1, view_with_width(400));
}

#[tokio::test(start_paused = true)]
async fn test_stale_failure_does_not_undo_newer_save() {
    let backend = Arc::new(RecordingBackend::default());
    *backend.slow_failure.lock().unwrap() = Some(100);
    let saver = AutoSaver::new(backend.clone(), "customers", Duration::from_millis(10));

    let older = tokio::spawn(saver.schedule(view_with_width(100)));
    tokio::time::sleep(Duration::from_millis(20)).await;
    saver.flush(&view_with_width(200)).await.unwrap();
    older.await.unwrap();

    assert!(!saver.has_unsaved_changes());
    assert!(saver.last_error().is_none());
    assert_eq!(saver.write_count(), 2);
    assert_eq!(backend.saves().len(), 1);
    assert_eq!(backend.saves()[0].1, view_with_width(200));
}

#[tokio::test(start_paused = true)]
async fn test_flush_pending_writes_latest_scheduled_view() {
    let backend = Arc::new(RecordingBackend::default());
    let saver = AutoSaver::new(backend.clone(), "customers", Duration::from_millis(2500));

    let pending = tokio::spawn(saver.schedule(view_with_width(100)));
    let _ = tokio::spawn(saver.schedule(view_with_width(150)));
    saver.flush_pending().await.unwrap();
    assert!(!saver.has_unsaved_changes());
    assert_eq!(backend.saves().len(), 1);
    assert_eq!(backend.saves()[0].1, view_with_width(150));

    pending.await.unwrap();
    saver.flush_pending().await.unwrap();
    assert_eq!(backend.saves().len(), 1);
    assert_eq!(saver.write_count(), 1);
}

#[tokio::test]
async fn test_flush_pending_without_changes_is_a_no_op() {
    let backend = Arc::new(RecordingBackend::default());
    let saver = AutoSaver::new(backend.clone(), "customers", Duration::from_millis(10));
    saver.flush_pending().await.unwrap();
    assert_eq!(saver.write_count(), 0);
    assert!(backend.saves().is_empty());
}

#[tokio::test]
async fn test_failed_save_stays_unsaved_until_retry() {
    let backend = Arc::new(RecordingBackend::default());
    let saver = AutoSaver::new(backend.clone(), "customers", Duration::from_millis(10));

    backend.fail(true);
    assert!(saver.flush(&view_with_width(120)).await.is_err());
    assert!(saver.has_unsaved_changes());
    assert!(saver.last_error().is_some());

    backend.fail(false);
    saver.flush(&view_with_width(120)).await.unwrap();
    assert!(!saver.has_unsaved_changes());
    assert!(saver.last_error().is_none());
    assert_eq!(saver.write_count(), 2);
    assert_eq!(backend.saves().len(), 1);
}

#[tokio::test]
async fn test_view_state_load_is_total() {
    let backend = Arc::new(RecordingBackend::default());
    let store = StateStore::new(backend.clone(), Duration::from_millis(10));

    *backend.stored_state.lock().unwrap() = Some(json!("{not json"));
    assert_eq!(store.load("customers").await, ViewState::default());

    *backend.stored_state.lock().unwrap() = Some(json!([1, 2, 3]));
    assert_eq!(store.load("customers").await, ViewState::default());

    backend.fail(true);
    assert_eq!(store.load("customers").await, ViewState::default());
}

#[test]
fn test_view_state_drops_malformed_pieces_only() {
    let view = ViewState::from_value(&json!({
        "layout": {
            "widths": {"a": 10, "b": 200, "c": "wide", "d": 180.4},
            "order": [1, "x"],
            "visibility": {"a": false, "b": "no"}
        },
        "searchpattern": {
            "sortColumn": "2",
            "sortDirection": "DESC",
            "searchValues": {"a": "x", "b": 5, "c": [1]},
            "filterOperations": {"a": "contains", "b": "bogus"}
        }
    }));

    assert_eq!(view.layout.widths.len(), 2);
    assert_eq!(view.layout.widths["b"], 200);
    assert_eq!(view.layout.widths["d"], 180);
    assert!(view.layout.order.is_empty());
    assert_eq!(view.layout.visibility.len(), 1);
    assert_eq!(view.layout.visibility["a"], false);

    let search = &view.searchpattern;
    assert_eq!(search.sort_column, Some(2));
    assert_eq!(search.sort_direction, admingrid::state::sorter::SortDirection::Desc);
    assert_eq!(search.search_values.len(), 2);
    assert_eq!(search.search_values["b"], "5");
    assert_eq!(search.filter_operations.len(), 1);
}

#[test]
fn test_view_state_unwraps_json_text() {
    let view = ViewState::from_value(&json!(r#"{"layout":{"order":[1,0]}}"#));
    assert_eq!(view.layout.order, vec![1, 0]);
    assert!(ViewState::from_value(&json!(null)).is_empty());
}

#[tokio::test]
async fn test_load_grid_applies_stored_view() {
    let dir = tempfile::tempdir().unwrap();
    let backend = file_backend(dir.path());
    backend
        .save_grid_state(
            "customers",
            &ViewState::from_value(&json!({
                "layout": {"order": [0, 1], "visibility": {"role": false}},
                "searchpattern": {
                    "sortColumn": 2,
                    "sortDirection": "desc",
                    "searchValues": {"age": "25"},
                    "filterOperations": {"age": "greater_than"}
                }
            })),
        )
        .await
        .unwrap();

    let loaded = state_store::load_grid(backend.as_ref(), "customers", None)
        .await
        .unwrap();
    let table = loaded.table;
    assert_eq!(loaded.fields.len(), 4);
    assert_eq!(table.table_name(), "customers");
    assert_eq!(table.effective_order(), vec![0, 1, 2, 3]);

    let keys: Vec<String> = table.visible_columns().into_iter().map(|c| c.key).collect();
    assert_eq!(keys, vec!["id", "name", "age"]);
    let ages: Vec<i64> = table
        .displayed_rows()
        .iter()
        .map(|r| r["age"].as_i64().unwrap())
        .collect();
    assert_eq!(ages, vec![40, 35, 30]);
}

#[tokio::test]
async fn test_load_grid_prefers_given_view() {
    let dir = tempfile::tempdir().unwrap();
    let backend = file_backend(dir.path());
    let mut view = ViewState::default();
    view.searchpattern
        .search_values
        .insert("name".to_string(), "bo".to_string());

    let loaded = state_store::load_grid(backend.as_ref(), "customers", Some(view))
        .await
        .unwrap();
    assert_eq!(loaded.table.row_count(), 1);
}

#[tokio::test]
async fn test_load_grid_survives_missing_fields() {
    let backend = RecordingBackend::default();
    *backend.stored_state.lock().unwrap() = Some(json!({"searchpattern": {"sortColumn": 9}}));

    let loaded = state_store::load_grid(&backend, "people", None).await.unwrap();
    assert_eq!(loaded.table.table_name(), "people");
    assert!(loaded.fields.is_empty());
    assert!(loaded.table.sort_spec().is_none());
    assert_eq!(loaded.table.row_count(), 2);
}

#[tokio::test]
async fn test_load_grid_fails_without_rows() {
    let dir = tempfile::tempdir().unwrap();
    let backend = file_backend(dir.path());
    assert!(state_store::load_grid(backend.as_ref(), "nope", None).await.is_err());
}

#[tokio::test]
async fn test_layout_pattern_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let backend = file_backend(dir.path());
    let data = backend.fetch_table("customers").await.unwrap();

    let mut arranged = TableState::new("customers", "customers");
    arranged.set_data(data.columns.clone(), data.data.clone());
    arranged.set_column_width("name", 220.0);
    arranged.set_column_visibility("age", false);
    arranged.move_column(0, 2);

    let mut manager = PatternManager::new(backend.clone(), PatternKind::Layout, "customers");
    let layout = PatternData::capture(PatternKind::Layout, &arranged).unwrap();
    let id = match manager.save("Compact", &layout).await.unwrap() {
        SaveOutcome::Saved { id } => id,
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(manager.matching("comp").len(), 1);

    let mut fresh = TableState::new("customers", "customers");
    fresh.set_data(data.columns, data.data);
    let loaded = manager.load(id).await.unwrap();
    assert!(loaded.apply_to(&mut fresh));

    assert_eq!(fresh.layout_state(), arranged.layout_state());
    assert_eq!(fresh.column_width("name"), 220);
    let keys: Vec<String> = fresh.visible_columns().into_iter().map(|c| c.key).collect();
    assert_eq!(keys, vec!["name", "role", "id"]);
}

#[tokio::test]
async fn test_pattern_name_conflict_needs_confirmation() {
    let dir = tempfile::tempdir().unwrap();
    let backend = file_backend(dir.path());
    let mut manager = PatternManager::new(backend.clone(), PatternKind::Searchpattern, "customers");
    manager.refresh().await;

    let mut table = TableState::new("customers", "customers");
    table.set_search_value("name", "a".to_string());
    let first = PatternData::capture(PatternKind::Searchpattern, &table).unwrap();
    let SaveOutcome::Saved { id } = manager.save("Adults", &first).await.unwrap() else {
        panic!("first save should succeed");
    };

    table.set_search_value("name", "b".to_string());
    let second = PatternData::capture(PatternKind::Searchpattern, &table).unwrap();
    assert_eq!(
        manager.save("  Adults ", &second).await.unwrap(),
        SaveOutcome::NameExists { id }
    );
    assert_eq!(manager.load(id).await.unwrap(), first);

    assert_eq!(manager.save_overwrite(id, "Adults", &second).await.unwrap(), id);
    assert_eq!(manager.load(id).await.unwrap(), second);
    assert_eq!(manager.patterns().len(), 1);

    assert_eq!(manager.save("   ", &second).await.unwrap(), SaveOutcome::EmptyName);
    let layout = PatternData::capture(PatternKind::Layout, &table).unwrap();
    assert!(manager.save("Wrong kind", &layout).await.is_err());

    manager.delete(id).await.unwrap();
    assert!(manager.patterns().is_empty());
}

#[tokio::test]
async fn test_session_load_reports_errors() {
    let backend = Arc::new(RecordingBackend::default());
    let sessions = PatternManager::new(backend, PatternKind::Session, "_session");
    assert!(matches!(
        sessions.load_session(1).await,
        Err(BackendError::NotFound(_))
    ));

    let dir = tempfile::tempdir().unwrap();
    let backend = file_backend(dir.path());
    let mut layouts = PatternManager::new(backend, PatternKind::Layout, "customers");
    let table = TableState::new("customers", "customers");
    let layout = PatternData::capture(PatternKind::Layout, &table).unwrap();
    let SaveOutcome::Saved { id } = layouts.save("Plain", &layout).await.unwrap() else {
        panic!("save should succeed");
    };
    let err = layouts.load_session(id).await.unwrap_err();
    assert!(err.to_string().contains("not a session"));
}

#[tokio::test]
async fn test_pattern_list_is_empty_when_backend_is_down() {
    let backend = Arc::new(RecordingBackend::default());
    let mut manager = PatternManager::new(backend.clone(), PatternKind::Layout, "customers");
    assert_eq!(manager.refresh().await.len(), 1);

    backend.fail(true);
    assert!(manager.refresh().await.is_empty());
}

#[test]
fn test_session_snapshot_decode() {
    let data = PatternData::from_value(
        PatternKind::Session,
        &json!({
            "open_tabs": ["customers", "orders", 3],
            "active_tab": "invoices",
            "grids": {"customers": {"layout": {"order": [1, 0]}}}
        }),
    );
    let PatternData::Session(snapshot) = data else {
        panic!("expected a session");
    };
    assert_eq!(snapshot.open_tabs, vec!["customers", "orders"]);
    assert_eq!(snapshot.active_tab, None);
    assert_eq!(snapshot.grids["customers"].layout.order, vec![1, 0]);
    assert!(PatternData::capture(PatternKind::Session, &TableState::default()).is_none());
}
