use acdms_core::db::open_db_in_memory;
use acdms_core::{
    AgniveerField, AgniveerRecord, AgniveerRepository, AgniveerService, RepoError, ServiceError,
    SqliteAgniveerRepository,
};

fn recruit(name: &str, number: &str, district: &str) -> AgniveerRecord {
    AgniveerRecord::new()
        .with(AgniveerField::BatchNo, "B-2023-07")
        .with(AgniveerField::Number, number)
        .with(AgniveerField::Rank, "Agniveer")
        .with(AgniveerField::Name, name)
        .with(AgniveerField::DateOfBirth, "2002-05-10")
        .with(AgniveerField::DateOfEnrolment, "2022-12-01")
        .with(AgniveerField::MedicalCategory, "SHAPE-1")
        .with(AgniveerField::Village, "Mawlai")
        .with(AgniveerField::District, district)
        .with(AgniveerField::State, "Meghalaya")
        .with(AgniveerField::PinCode, "793008")
        .with(AgniveerField::NokName, "Shyam Kumar")
        .with(AgniveerField::NokRelationship, "Father")
}

#[test]
fn insert_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAgniveerRepository::new(&conn);

    let record = recruit("Ram Kumar", "AGV1001", "East Khasi Hills")
        .with(AgniveerField::Hobbies, "Football, reading");
    let id = repo.insert(&record).unwrap();

    let loaded = repo.get(id).unwrap().unwrap();
    assert_eq!(loaded.id, Some(id));
    assert_eq!(loaded.name.as_deref(), Some("Ram Kumar"));
    assert_eq!(loaded.hobbies.as_deref(), Some("Football, reading"));
    assert_eq!(loaded.street, None);

    let mut expected = record;
    expected.id = Some(id);
    assert_eq!(loaded, expected);
}

#[test]
fn insert_ignores_caller_supplied_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAgniveerRepository::new(&conn);

    let mut record = recruit("Ram Kumar", "AGV1001", "East Khasi Hills");
    record.id = Some(42);
    let id = repo.insert(&record).unwrap();

    assert_eq!(id, 1);
    assert!(repo.get(42).unwrap().is_none());
}

#[test]
fn identities_are_distinct_and_list_is_ordered() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAgniveerRepository::new(&conn);

    let first = repo.insert(&recruit("A One", "1", "X")).unwrap();
    let second = repo.insert(&recruit("B Two", "2", "Y")).unwrap();
    let third = repo.insert(&recruit("C Three", "3", "Z")).unwrap();
    assert!(first < second && second < third);

    let ids = repo
        .list_all()
        .unwrap()
        .into_iter()
        .map(|record| record.id.unwrap())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![first, second, third]);
    assert_eq!(repo.count().unwrap(), 3);
}

#[test]
fn identities_are_not_reused_after_delete() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAgniveerRepository::new(&conn);

    let first = repo.insert(&recruit("A One", "1", "X")).unwrap();
    assert_eq!(repo.delete(first).unwrap(), 1);
    let second = repo.insert(&recruit("B Two", "2", "Y")).unwrap();
    assert_ne!(first, second);
}

#[test]
fn blank_insert_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAgniveerRepository::new(&conn);

    let err = repo.insert(&AgniveerRecord::new()).unwrap_err();
    assert!(matches!(err, RepoError::EmptyRecord));
    assert_eq!(err.to_string(), "no valid fields provided");
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn partial_update_keeps_untouched_columns() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAgniveerRepository::new(&conn);
    let id = repo
        .insert(&recruit("Ram Kumar", "AGV1001", "East Khasi Hills"))
        .unwrap();

    let patch = AgniveerRecord::new()
        .with(AgniveerField::District, "Shillong Cantt")
        .with(AgniveerField::Street, "");
    assert_eq!(repo.update(id, &patch).unwrap(), 1);

    let loaded = repo.get(id).unwrap().unwrap();
    assert_eq!(loaded.district.as_deref(), Some("Shillong Cantt"));
    assert_eq!(loaded.street.as_deref(), Some(""));
    assert_eq!(loaded.name.as_deref(), Some("Ram Kumar"));
    assert_eq!(loaded.pin_code.as_deref(), Some("793008"));
}

#[test]
fn update_and_delete_report_zero_for_missing_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAgniveerRepository::new(&conn);

    let patch = AgniveerRecord::new().with(AgniveerField::Name, "Nobody");
    assert_eq!(repo.update(99, &patch).unwrap(), 0);
    assert_eq!(repo.delete(99).unwrap(), 0);
    assert!(matches!(
        repo.update(99, &AgniveerRecord::new()),
        Err(RepoError::EmptyRecord)
    ));
}

#[test]
fn delete_removes_row_permanently() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAgniveerRepository::new(&conn);
    let id = repo
        .insert(&recruit("Ram Kumar", "AGV1001", "East Khasi Hills"))
        .unwrap();

    assert_eq!(repo.delete(id).unwrap(), 1);
    assert!(repo.get(id).unwrap().is_none());
    assert_eq!(repo.delete(id).unwrap(), 0);
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn values_are_stored_verbatim() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAgniveerRepository::new(&conn);

    let hostile = "'); DROP TABLE agniveers; --";
    let id = repo
        .insert(&AgniveerRecord::new().with(AgniveerField::Hobbies, hostile))
        .unwrap();

    assert_eq!(
        repo.get(id).unwrap().unwrap().hobbies.as_deref(),
        Some(hostile)
    );
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn non_text_column_value_surfaces_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute("INSERT INTO agniveers (name) VALUES (x'00ff');", [])
        .unwrap();
    let repo = SqliteAgniveerRepository::new(&conn);

    let err = repo.list_all().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn service_add_rejects_invalid_record_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let service = AgniveerService::new(SqliteAgniveerRepository::new(&conn));

    let invalid = recruit("Ram Kumar", "AGV1001", "East Khasi Hills")
        .with(AgniveerField::PinCode, "11000");
    match service.add(&invalid).unwrap_err() {
        ServiceError::Validation(errors) => {
            assert_eq!(
                errors.get(AgniveerField::PinCode),
                Some("PIN Code must be 6 digits")
            );
            assert_eq!(errors.len(), 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(service.count().unwrap(), 0);
}

#[test]
fn service_add_then_list() {
    let conn = open_db_in_memory().unwrap();
    let service = AgniveerService::new(SqliteAgniveerRepository::new(&conn));

    let id = service
        .add(&recruit("Ram Kumar", "AGV1001", "East Khasi Hills"))
        .unwrap();
    let records = service.list().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, Some(id));
}

#[test]
fn service_edit_validates_merged_record() {
    let conn = open_db_in_memory().unwrap();
    let service = AgniveerService::new(SqliteAgniveerRepository::new(&conn));
    let id = service
        .add(&recruit("Ram Kumar", "AGV1001", "East Khasi Hills"))
        .unwrap();

    // A patch touching one field is fine as long as the merged record is valid.
    let updated = service
        .edit(id, &AgniveerRecord::new().with(AgniveerField::Village, "Laitumkhrah"))
        .unwrap();
    assert_eq!(updated.village.as_deref(), Some("Laitumkhrah"));
    assert_eq!(updated.name.as_deref(), Some("Ram Kumar"));

    // Clearing a required field fails and leaves the row untouched.
    let err = service
        .edit(id, &AgniveerRecord::new().with(AgniveerField::Name, "  "))
        .unwrap_err();
    match err {
        ServiceError::Validation(errors) => {
            assert_eq!(errors.get(AgniveerField::Name), Some("Name is required"));
        }
        other => panic!("unexpected error: {other}"),
    }
    let stored = service.get(id).unwrap().unwrap();
    assert_eq!(stored.name.as_deref(), Some("Ram Kumar"));
}

#[test]
fn service_edit_and_remove_missing_record_report_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = AgniveerService::new(SqliteAgniveerRepository::new(&conn));

    let patch = AgniveerRecord::new().with(AgniveerField::Village, "Mawlai");
    assert!(matches!(
        service.edit(7, &patch),
        Err(ServiceError::NotFound(7))
    ));
    assert!(matches!(service.remove(7), Err(ServiceError::NotFound(7))));
}

#[test]
fn service_remove_then_get_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let service = AgniveerService::new(SqliteAgniveerRepository::new(&conn));
    let id = service
        .add(&recruit("Ram Kumar", "AGV1001", "East Khasi Hills"))
        .unwrap();

    service.remove(id).unwrap();
    assert!(service.get(id).unwrap().is_none());
    assert!(matches!(service.remove(id), Err(ServiceError::NotFound(_))));
}
