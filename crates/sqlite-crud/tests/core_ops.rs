use serde_json::json;
use sqlite_crud::{
    core::{
        create::create_database, payload, Database, DbOptions, IdentifierPolicy, Operation,
        Record, SelectArgs, SqlValue, UncheckedSql,
    },
    AppError,
};
use tempfile::tempdir;

async fn users_db(dir: &tempfile::TempDir) -> Database {
    let db = Database::new(dir.path().join("users.sqlite"), DbOptions::default());
    db.execute(Operation::raw(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, age INTEGER)",
    ))
    .await
    .unwrap();
    db
}

fn users() -> UncheckedSql {
    UncheckedSql::new("users")
}

fn record(v: serde_json::Value) -> Record {
    Record::from_json_object(v.as_object().cloned().unwrap())
}

#[tokio::test]
async fn insert_then_filtered_select() {
    let dir = tempdir().unwrap();
    let db = users_db(&dir).await;

    let inserted = db
        .execute(Operation::Insert { table: users(), data: record(json!({"name": "Ann", "age": 30})) })
        .await
        .unwrap();
    let m = inserted.mutation().unwrap();
    assert_eq!(m.changes, 1);
    assert_eq!(m.inserted_id, Some(1));

    db.execute(Operation::Insert { table: users(), data: record(json!({"name": "Kid", "age": 9})) })
        .await
        .unwrap();

    let op = Operation::Select(SelectArgs::new(users()).filter("age > 18"));
    let result = db.execute(op.clone()).await.unwrap();
    let rows = result.rows().unwrap();
    assert_eq!(rows.total, Some(1));
    assert_eq!(rows.rows[0].get("name"), Some(&SqlValue::Text("Ann".into())));
    assert_eq!(rows.rows[0].get("age"), Some(&SqlValue::Integer(30)));

    let body = payload::shape(&op, &result).unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["limit"], 100);
    assert_eq!(body["offset"], 0);
}

#[tokio::test]
async fn select_pages_but_total_counts_everything() {
    let dir = tempdir().unwrap();
    let db = users_db(&dir).await;
    for name in ["a", "b", "c", "d", "e"] {
        db.execute(Operation::Insert { table: users(), data: record(json!({"name": name})) })
            .await
            .unwrap();
    }
    let op = Operation::Select(SelectArgs::new(users()).limit(2).offset(1).order_by("id DESC"));
    let result = db.execute(op).await.unwrap();
    let rows = result.rows().unwrap();
    assert_eq!(rows.row_count, 2);
    assert_eq!(rows.total, Some(5));
    assert_eq!(rows.rows[0].get("name"), Some(&SqlValue::Text("d".into())));
}

#[tokio::test]
async fn update_and_delete_of_missing_id_change_nothing() {
    let dir = tempdir().unwrap();
    let db = users_db(&dir).await;

    let op = Operation::Update {
        table: users(),
        id: SqlValue::Integer(999),
        data: record(json!({"name": "Nobody"})),
    };
    let result = db.execute(op.clone()).await.unwrap();
    assert_eq!(result.mutation().unwrap().changes, 0);
    assert_eq!(payload::shape(&op, &result).unwrap()["message"], payload::NO_RECORD);

    let op = Operation::Delete { table: users(), id: SqlValue::Integer(999) };
    let result = db.execute(op).await.unwrap();
    assert_eq!(result.mutation().unwrap().changes, 0);
}

#[tokio::test]
async fn update_then_delete_round_trip() {
    let dir = tempdir().unwrap();
    let db = users_db(&dir).await;
    db.execute(Operation::Insert { table: users(), data: record(json!({"name": "Ann", "age": 30})) })
        .await
        .unwrap();

    let update = Operation::Update {
        table: users(),
        id: SqlValue::Text("1".into()),
        data: record(json!({"age": 31})),
    };
    assert_eq!(db.execute(update).await.unwrap().mutation().unwrap().changes, 1);

    let read = db
        .execute(Operation::raw_with_params(
            "SELECT age FROM users WHERE name = ?",
            vec![SqlValue::from("Ann")],
        ))
        .await
        .unwrap();
    assert_eq!(read.rows().unwrap().rows[0].get("age"), Some(&SqlValue::Integer(31)));

    let delete = Operation::Delete { table: users(), id: SqlValue::Integer(1) };
    assert_eq!(db.execute(delete).await.unwrap().mutation().unwrap().changes, 1);

    let count = db.execute(Operation::raw("select count(*) AS n from users")).await.unwrap();
    assert_eq!(count.rows().unwrap().rows[0].get("n"), Some(&SqlValue::Integer(0)));
}

#[tokio::test]
async fn empty_insert_is_rejected() {
    let dir = tempdir().unwrap();
    let db = users_db(&dir).await;
    let err = db
        .execute(Operation::Insert { table: users(), data: Record::new() })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ValidationError");
}

#[tokio::test]
async fn engine_errors_keep_the_engine_message() {
    let dir = tempdir().unwrap();
    let db = users_db(&dir).await;
    let err = db.execute(Operation::raw("SELECT * FROM missing")).await.unwrap_err();
    assert_eq!(err.kind(), "SqlError");
    assert!(err.to_string().contains("no such table: missing"));
}

#[tokio::test]
async fn strict_identifiers_reject_injection_in_names() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("strict.sqlite");
    let permissive = Database::new(&path, DbOptions::default());
    permissive
        .execute(Operation::raw("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)"))
        .await
        .unwrap();

    let strict = Database::new(
        &path,
        DbOptions { identifier_policy: IdentifierPolicy::Strict, ..DbOptions::default() },
    );
    let err = strict
        .execute(Operation::Select(SelectArgs::new(UncheckedSql::new("t; DROP TABLE t"))))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UnsafeIdentifier(_)));

    let ok = strict.execute(Operation::Select(SelectArgs::new(UncheckedSql::new("main.t")))).await;
    assert!(ok.is_ok());
}

#[tokio::test]
async fn empty_database_has_empty_schema() {
    let dir = tempdir().unwrap();
    let db = Database::new(dir.path().join("empty.sqlite"), DbOptions::default());
    let schema = db.describe().await.unwrap();
    assert_eq!(schema.table_count(), 0);
    assert_eq!(schema.tables_json(), json!({}));
}

#[tokio::test]
async fn created_database_shows_up_in_schema() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a/b/new.sqlite");
    let created = create_database(
        &path,
        vec![
            "CREATE TABLE notes (id INTEGER PRIMARY KEY AUTOINCREMENT, body TEXT NOT NULL)".into(),
            "CREATE TABLE tags (name TEXT)".into(),
        ],
        DbOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!(created.statements_executed, 2);
    assert!(path.exists());

    let schema = Database::new(&created.db_path, DbOptions::default()).describe().await.unwrap();
    assert_eq!(schema.table_count(), 2);
    let notes = schema.table("notes").unwrap();
    assert_eq!(notes.columns[1].name, "body");
    assert!(!notes.columns[1].nullable());
    assert_eq!(notes.columns[0].pk, 1);
    assert_eq!(notes.columns[1].notnull, 1);
}

#[tokio::test]
async fn raw_writes_report_the_engine_rowid() {
    let dir = tempdir().unwrap();
    let db = Database::new(dir.path().join("rowid.sqlite"), DbOptions::default());
    db.execute(Operation::raw("CREATE TABLE z (id INTEGER PRIMARY KEY, v TEXT)"))
        .await
        .unwrap();

    let op = Operation::raw("INSERT INTO z (id, v) VALUES (0, 'x')");
    let result = db.execute(op.clone()).await.unwrap();
    assert_eq!(result.mutation().unwrap().inserted_id, Some(0));
    assert_eq!(payload::shape(&op, &result).unwrap()["lastID"], 0);

    let op = Operation::raw("UPDATE z SET v = 'y' WHERE id = 0");
    let result = db.execute(op.clone()).await.unwrap();
    let body = payload::shape(&op, &result).unwrap();
    assert_eq!(body["changes"], 1);
    assert_eq!(body["lastID"], 0);
}
