//! End-to-end flows over a real temp-dir database and photo store.

use chrono::{Duration, Utc};
use chrono_tz::America::Belem;
use image::{DynamicImage, RgbImage};
use tempfile::TempDir;

use ponto::checkin::{submit_checkin, CheckinError};
use ponto::config::{CheckinConfig, StorageConfig};
use ponto::db::{Database, Registration};
use ponto::grouping::group_records;
use ponto::selection::DeletionSelection;
use ponto::storage::PhotoStore;

fn fixtures() -> (TempDir, Database, PhotoStore) {
    let dir = TempDir::new().unwrap();
    let db = Database::open(&dir.path().join("ponto.db")).unwrap();
    db.initialize().unwrap();
    let store = PhotoStore::open(&StorageConfig {
        root: dir.path().join("photos"),
        public_base_url: None,
    })
    .unwrap();
    (dir, db, store)
}

fn register(db: &Database, name: &str, email: Option<&str>) -> ponto::db::User {
    db.upsert_user(&Registration {
        name: name.to_string(),
        role: None,
        phone: None,
        email: email.map(|e| e.to_string()),
    })
    .unwrap()
}

fn capture() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::new(320, 240))
}

#[test]
fn register_checkin_and_grouped_admin_view() {
    let (_dir, db, store) = fixtures();
    let config = CheckinConfig::default();

    let ana = register(&db, "Ana Silva", Some("ana@x.com"));
    let now_local = Utc::now().with_timezone(&Belem);

    let record = submit_checkin(&db, &store, &config, ana.id, &capture(), now_local).unwrap();
    assert!(store.exists(&record.photo_path));
    assert!(record.photo_path.starts_with(&format!("{}/", ana.id)));

    // The admin view shows exactly one record, one user, one day.
    let records = db.recent_checkins_with_users(100).unwrap();
    let view = group_records(&records, Belem, Utc::now());
    assert_eq!(view.users.len(), 1);
    assert_eq!(view.users[0].name, "Ana Silva");
    assert_eq!(view.users[0].days.len(), 1);
    assert_eq!(view.users[0].days[0].entries.len(), 1);
    assert_eq!(view.users[0].days[0].entries[0].photo_path, record.photo_path);
}

#[test]
fn cooldown_blocks_immediate_second_checkin() {
    let (_dir, db, store) = fixtures();
    let config = CheckinConfig::default();
    let ana = register(&db, "Ana Silva", None);
    let now_local = Utc::now().with_timezone(&Belem);

    submit_checkin(&db, &store, &config, ana.id, &capture(), now_local).unwrap();
    match submit_checkin(&db, &store, &config, ana.id, &capture(), now_local) {
        Err(CheckinError::NotAdmissible(decision)) => assert!(!decision.is_allowed()),
        other => panic!("expected NotAdmissible, got {:?}", other.map(|r| r.photo_path)),
    }

    // Past the cooldown window the same user may check in again.
    let later = now_local + Duration::minutes(30);
    submit_checkin(&db, &store, &config, ana.id, &capture(), later).unwrap();
    assert_eq!(db.checkin_count().unwrap(), 2);
}

#[test]
fn reregistering_same_email_updates_one_row() {
    let (_dir, db, _store) = fixtures();

    register(&db, "Ana Silva", Some("ana@x.com"));
    let second = register(&db, "Ana S. Oliveira", Some("ana@x.com"));

    assert_eq!(db.user_count().unwrap(), 1);
    assert_eq!(second.name, "Ana S. Oliveira");
    let found = db.find_user_by_email("ana@x.com").unwrap().unwrap();
    assert_eq!(found.name, "Ana S. Oliveira");
}

#[test]
fn admin_deletes_marked_records_and_photos() {
    let (_dir, db, store) = fixtures();
    let config = CheckinConfig::default();
    let ana = register(&db, "Ana Silva", None);
    let now_local = Utc::now().with_timezone(&Belem);

    let first = submit_checkin(&db, &store, &config, ana.id, &capture(), now_local).unwrap();
    let second = submit_checkin(
        &db,
        &store,
        &config,
        ana.id,
        &capture(),
        now_local + Duration::minutes(31),
    )
    .unwrap();

    let mut selection = DeletionSelection::new();
    selection.toggle(first.id, &first.photo_path);
    selection.toggle(second.id, &second.photo_path);

    let outcome = selection.commit(&db, &store).unwrap();
    assert_eq!(outcome.rows_deleted, 2);
    assert_eq!(outcome.objects_removed, 2);
    assert!(selection.is_empty());

    assert_eq!(db.checkin_count().unwrap(), 0);
    assert!(store.list("").unwrap().is_empty());
    // The user directory is untouched by record deletion.
    assert_eq!(db.user_count().unwrap(), 1);
}
