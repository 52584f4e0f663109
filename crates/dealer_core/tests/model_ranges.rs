use dealer_core::db::open_db_in_memory;
use dealer_core::{
    AssociationError, AssociationService, Dao, ItemModel, ItemModelTemplate, OverlapCandidate,
    OverlapCheck, ProductModel, RepoError, SqliteDao, YearRange,
};
use rusqlite::Connection;

fn years(start: i32, end: i32) -> YearRange {
    YearRange::new(start, end).unwrap()
}

fn save_item_model(conn: &Connection, item_id: i64, model_id: i64, range: YearRange) -> ItemModel {
    let dao = SqliteDao::<ItemModel>::try_new(conn).unwrap();
    let mut association = ItemModel::new(item_id, model_id, range);
    dao.save(&mut association).unwrap();
    association
}

#[test]
fn overlapping_range_for_same_pair_is_reported() {
    let conn = open_db_in_memory().unwrap();
    let existing = save_item_model(&conn, 7, 9, years(2000, 2005));
    let dao = SqliteDao::<ItemModel>::try_new(&conn).unwrap();

    let conflicts = dao
        .find_overlaps(&OverlapCandidate::new(7, 9, years(2001, 2004)))
        .unwrap();
    assert_eq!(conflicts, vec![existing]);
}

#[test]
fn other_model_never_conflicts() {
    let conn = open_db_in_memory().unwrap();
    save_item_model(&conn, 7, 9, years(2000, 2005));
    let dao = SqliteDao::<ItemModel>::try_new(&conn).unwrap();

    let conflicts = dao
        .find_overlaps(&OverlapCandidate::new(7, 10, years(2001, 2004)))
        .unwrap();
    assert!(conflicts.is_empty());

    let other_item = dao
        .find_overlaps(&OverlapCandidate::new(8, 9, years(2001, 2004)))
        .unwrap();
    assert!(other_item.is_empty());
}

#[test]
fn bounds_are_inclusive() {
    let conn = open_db_in_memory().unwrap();
    save_item_model(&conn, 7, 9, years(2000, 2005));
    let dao = SqliteDao::<ItemModel>::try_new(&conn).unwrap();

    let touching_end = dao
        .find_overlaps(&OverlapCandidate::new(7, 9, YearRange::year(2005)))
        .unwrap();
    assert_eq!(touching_end.len(), 1);

    let touching_start = dao
        .find_overlaps(&OverlapCandidate::new(7, 9, years(1995, 2000)))
        .unwrap();
    assert_eq!(touching_start.len(), 1);

    let after = dao
        .find_overlaps(&OverlapCandidate::new(7, 9, YearRange::year(2006)))
        .unwrap();
    assert!(after.is_empty());

    let before = dao
        .find_overlaps(&OverlapCandidate::new(7, 9, years(1990, 1999)))
        .unwrap();
    assert!(before.is_empty());
}

#[test]
fn enclosing_candidate_reports_every_conflict_in_id_order() {
    let conn = open_db_in_memory().unwrap();
    let first = save_item_model(&conn, 7, 9, years(2000, 2002));
    let second = save_item_model(&conn, 7, 9, years(2004, 2006));
    save_item_model(&conn, 7, 9, years(2010, 2012));
    let dao = SqliteDao::<ItemModel>::try_new(&conn).unwrap();

    let conflicts = dao
        .find_overlaps(&OverlapCandidate::new(7, 9, years(1999, 2008)))
        .unwrap();
    assert_eq!(conflicts, vec![first, second]);
}

#[test]
fn excluded_row_does_not_conflict_with_itself() {
    let conn = open_db_in_memory().unwrap();
    let existing = save_item_model(&conn, 7, 9, years(2000, 2005));
    let dao = SqliteDao::<ItemModel>::try_new(&conn).unwrap();

    let candidate =
        OverlapCandidate::new(7, 9, years(2001, 2006)).excluding(existing.id.unwrap());
    assert!(dao.find_overlaps(&candidate).unwrap().is_empty());

    let mut widened = existing.clone();
    widened.year_end = 2008;
    assert_eq!(OverlapCandidate::of(&widened).exclude_id, existing.id);
    assert!(dao.find_overlaps(&OverlapCandidate::of(&widened)).unwrap().is_empty());
}

#[test]
fn product_models_are_checked_in_their_own_table() {
    let conn = open_db_in_memory().unwrap();
    save_item_model(&conn, 7, 9, years(2000, 2005));

    let products = SqliteDao::<ProductModel>::try_new(&conn).unwrap();
    let candidate = OverlapCandidate::new(7, 9, years(2001, 2004));
    assert!(products.find_overlaps(&candidate).unwrap().is_empty());

    let mut product = ProductModel::new(7, 9, years(2003, 2003));
    products.save(&mut product).unwrap();
    assert_eq!(products.find_overlaps(&candidate).unwrap(), vec![product]);
}

#[test]
fn storage_rejects_inverted_ranges() {
    let conn = open_db_in_memory().unwrap();
    let dao = SqliteDao::<ItemModel>::try_new(&conn).unwrap();

    let mut inverted = ItemModel::new(7, 9, years(2000, 2005));
    inverted.year_start = 2006;
    assert!(matches!(
        dao.save(&mut inverted).unwrap_err(),
        RepoError::Validation(_)
    ));

    let err = conn
        .execute(
            "INSERT INTO item_models (item_id, model_id, year_start, year_end) VALUES (1, 1, 2006, 2005);",
            [],
        )
        .unwrap_err();
    assert_eq!(
        err.sqlite_error_code(),
        Some(rusqlite::ErrorCode::ConstraintViolation)
    );
}

#[test]
fn service_rejects_overlap_and_keeps_store_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let existing = save_item_model(&conn, 7, 9, years(2000, 2005));
    let service = AssociationService::new(SqliteDao::<ItemModel>::try_new(&conn).unwrap());

    let mut overlapping = ItemModel::new(7, 9, years(2001, 2004));
    match service.add(&mut overlapping) {
        Err(AssociationError::Overlap(conflicts)) => assert_eq!(conflicts, vec![existing]),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(overlapping.id, None);

    let mut adjacent = ItemModel::new(7, 9, years(2006, 2010));
    let id = service.add(&mut adjacent).unwrap();
    assert_eq!(adjacent.id, Some(id));

    let dao = SqliteDao::<ItemModel>::try_new(&conn).unwrap();
    let stored = dao
        .find(
            &ItemModelTemplate {
                item_id: Some(7),
                ..ItemModelTemplate::default()
            },
            None,
        )
        .unwrap();
    assert_eq!(stored.len(), 2);
}

#[test]
fn service_can_save_overlap_with_warnings() {
    let conn = open_db_in_memory().unwrap();
    let existing = save_item_model(&conn, 7, 9, years(2000, 2005));
    let service = AssociationService::new(SqliteDao::<ItemModel>::try_new(&conn).unwrap());

    let mut overlapping = ItemModel::new(7, 9, YearRange::year(2005));
    let saved = service.add_allowing_overlap(&mut overlapping).unwrap();
    assert_eq!(saved.overlaps, vec![existing]);
    assert_eq!(overlapping.id, Some(saved.id));

    let check = service
        .check(&OverlapCandidate::new(7, 9, YearRange::year(2005)))
        .unwrap();
    assert_eq!(check.len(), 2);
}

#[test]
fn service_change_excludes_the_row_being_updated() {
    let conn = open_db_in_memory().unwrap();
    let mut first = save_item_model(&conn, 7, 9, years(2000, 2005));
    let second = save_item_model(&conn, 7, 9, years(2010, 2012));
    let service = AssociationService::new(SqliteDao::<ItemModel>::try_new(&conn).unwrap());

    first.year_end = 2007;
    service.change(&first).unwrap();

    first.year_end = 2010;
    match service.change(&first) {
        Err(AssociationError::Overlap(conflicts)) => assert_eq!(conflicts, vec![second]),
        other => panic!("unexpected result: {other:?}"),
    }

    service.remove(first.id.unwrap()).unwrap();
    let err = service.remove(first.id.unwrap()).unwrap_err();
    assert!(matches!(err, AssociationError::Repo(ref repo) if repo.is_not_found()));
}

#[test]
fn service_validates_range_before_checking() {
    let conn = open_db_in_memory().unwrap();
    let service = AssociationService::new(SqliteDao::<ItemModel>::try_new(&conn).unwrap());

    let mut inverted = ItemModel::new(7, 9, years(2000, 2005));
    inverted.year_end = 1999;
    assert!(matches!(
        service.add(&mut inverted),
        Err(AssociationError::Repo(RepoError::Validation(_)))
    ));
}
