//! Update clauses built from `#[derive(Record)]` types.

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use sqlpatch::{
    BoxError, Column, MapDirection, MySql, OrmError, Record, ScalarValue, SqlType, ToDb,
    UpdateContext, UpdatePolicy, Value, build_update_clause,
};

#[derive(Record)]
#[orm(table = "users")]
struct User {
    #[orm(id)]
    code: String,
    name: String,
    age: i32,
    #[orm(deleted)]
    deleted_at: Option<DateTime<Utc>>,
    #[orm(version)]
    version: i32,
    #[orm(updated)]
    updated_at: DateTime<Utc>,
}

impl User {
    fn bob() -> Self {
        Self {
            code: "C1".into(),
            name: "bob".into(),
            age: 0,
            deleted_at: None,
            version: 3,
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }
}

#[derive(Record, Serialize)]
#[orm(table = "teams")]
struct Team {
    #[orm(id)]
    id: i64,
    name: String,
}

#[derive(Record, Serialize)]
#[orm(table = "grants")]
struct Grant {
    #[orm(id)]
    user_id: i64,
    #[orm(id)]
    role_id: i64,
}

#[derive(Serialize, Default, PartialEq)]
struct Prefs {
    theme: String,
}

#[derive(Record)]
struct Member {
    #[orm(id)]
    id: i64,
    #[orm(reference, column = "team_id")]
    team: Team,
    #[orm(json)]
    prefs: Prefs,
    avatar: Vec<u8>,
    digest: [u8; 4],
    tags: Vec<String>,
    nickname: Option<String>,
    #[orm(read_only)]
    score: i64,
    #[orm(skip)]
    cache: String,
}

impl Member {
    fn sample() -> Self {
        Self {
            id: 9,
            team: Team {
                id: 4,
                name: "core".into(),
            },
            prefs: Prefs {
                theme: "dark".into(),
            },
            avatar: vec![0xff, 0xd8],
            digest: [1, 2, 3, 4],
            tags: vec!["a".into(), "b".into()],
            nickname: Some("bobby".into()),
            score: 77,
            cache: "ignored".into(),
        }
    }
}

#[derive(Record)]
#[orm(table = "memberships")]
struct Membership {
    #[orm(id)]
    id: i64,
    #[orm(reference)]
    grant: Grant,
}

/// Cents, stored as a decimal string.
struct Money(i64);

impl ToDb for Money {
    fn to_db(&self) -> Result<Value, BoxError> {
        if self.0 < 0 {
            return Err(format!("negative amount: {}", self.0).into());
        }
        Ok(Value::Text(format!("{}.{:02}", self.0 / 100, self.0 % 100)))
    }
}

struct Sku(Option<String>);

impl ScalarValue for Sku {
    fn scalar(&self) -> Option<Value> {
        self.0.clone().map(Value::Text)
    }
}

#[derive(Record)]
#[orm(table = "products")]
struct Product {
    #[orm(id)]
    id: i64,
    #[orm(convert)]
    price: Money,
    #[orm(scalar)]
    sku: Sku,
    #[orm(sql_type = "date")]
    launched: NaiveDate,
    active: bool,
}

#[derive(Record)]
#[orm(table = "counters")]
struct Counter {
    #[orm(id)]
    id: i64,
    hits: i64,
    #[orm(not_null)]
    quota: i64,
}

fn build(record: &dyn Record, policy: &UpdatePolicy) -> sqlpatch::OrmResult<sqlpatch::UpdateClause> {
    build_update_clause(record, policy, &UpdateContext::new(&MySql))
}

#[test]
fn derive_builds_catalog() {
    let table = User::table_def();
    assert_eq!(table.name, "users");
    let names: Vec<&str> = table.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        ["code", "name", "age", "deleted_at", "version", "updated_at"]
    );

    let code = table.get("code").unwrap();
    assert!(code.is_primary_key);
    assert!(!code.nullable);
    assert_eq!(table.get("age").unwrap().sql_type, SqlType::Int);
    assert!(table.get("deleted_at").unwrap().is_deleted);
    assert_eq!(table.get("updated_at").unwrap().sql_type, SqlType::DateTime);
}

#[test]
fn derived_columns_default_to_nullable() {
    assert!(User::table_def().get("age").unwrap().nullable);
    let table = Counter::table_def();
    assert!(!table.get("id").unwrap().nullable);
    assert!(table.get("hits").unwrap().nullable);
    assert!(!table.get("quota").unwrap().nullable);

    let counter = Counter {
        id: 1,
        hits: 0,
        quota: 0,
    };
    let clause = build(&counter, &UpdatePolicy::new().nullable(["hits", "quota"])).unwrap();
    assert_eq!(clause.fragments(), vec!["`hits` = ?"]);
    assert_eq!(clause.values(), vec![Value::Int(1), Value::Null]);
}

#[test]
fn derive_respects_field_attributes() {
    let table = Member::table_def();
    assert_eq!(table.name, "member");
    assert!(table.get("cache").is_none());
    assert!(table.get("team_id").is_some());
    assert_eq!(table.get("prefs").unwrap().sql_type, SqlType::Json);
    assert_eq!(table.get("avatar").unwrap().sql_type, SqlType::Blob);
    assert_eq!(table.get("tags").unwrap().sql_type, SqlType::Text);
    assert_eq!(
        table.get("score").unwrap().map_direction,
        MapDirection::ReadOnly
    );
}

#[test]
fn unknown_column_is_a_field_access_error() {
    let user = User::bob();
    let err = user.field(&Column::new("missing")).unwrap_err();
    assert!(err.is_field_access());
}

#[test]
fn zero_age_is_left_out() {
    let clause = build(&User::bob(), &UpdatePolicy::new()).unwrap();
    assert_eq!(clause.fragments(), vec!["`name` = ?"]);
    assert_eq!(clause.values(), vec![Value::from("C1"), Value::from("bob")]);
}

#[test]
fn all_cols_writes_zero_age() {
    let clause = build(&User::bob(), &UpdatePolicy::new().all_cols()).unwrap();
    assert_eq!(clause.fragments(), vec!["`name` = ?", "`age` = ?"]);
    assert_eq!(
        clause.values(),
        vec![Value::from("C1"), Value::from("bob"), Value::Int(0)]
    );
}

#[test]
fn soft_deleted_marker_is_scoped_out() {
    let mut user = User::bob();
    user.deleted_at = Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());

    let clause = build(&user, &UpdatePolicy::new()).unwrap();
    assert_eq!(clause.fragments(), vec!["`name` = ?"]);
    assert_eq!(clause.values(), vec![Value::from("C1"), Value::from("bob")]);

    let clause = build(&user, &UpdatePolicy::new().unscoped()).unwrap();
    assert_eq!(clause.fragments(), vec!["`name` = ?", "`deleted_at` = ?"]);
    assert_eq!(clause.values()[2], Value::from("2024-05-01 12:00:00"));
}

#[test]
fn version_and_updated_on_request() {
    let policy = UpdatePolicy::new()
        .include_version(true)
        .include_updated(true);
    let clause = build(&User::bob(), &policy).unwrap();
    assert_eq!(
        clause.fragments(),
        vec!["`name` = ?", "`version` = ?", "`updated_at` = ?"]
    );
}

#[test]
fn column_names_match_case_insensitively() {
    let clause = build(&User::bob(), &UpdatePolicy::new().omit(["NAME"])).unwrap();
    assert!(clause.fragments().is_empty());
    assert_eq!(clause.values(), vec![Value::from("C1")]);

    let policy = UpdatePolicy::new().cols(["Age"]).must_cols(["AGE"]);
    let clause = build(&User::bob(), &policy).unwrap();
    assert_eq!(clause.fragments(), vec!["`age` = ?"]);
    assert_eq!(clause.values(), vec![Value::Int(0)]);
}

#[test]
fn nullable_override_on_zero_age() {
    let clause = build(&User::bob(), &UpdatePolicy::new().nullable(["age"])).unwrap();
    assert_eq!(clause.fragments(), vec!["`name` = ?", "`age` = ?"]);
    assert_eq!(clause.values()[2], Value::Null);
}

#[test]
fn member_encodes_every_kind() {
    let clause = build(&Member::sample(), &UpdatePolicy::new()).unwrap();
    assert_eq!(
        clause.fragments(),
        vec![
            "`team_id` = ?",
            "`prefs` = ?",
            "`avatar` = ?",
            "`digest` = ?",
            "`tags` = ?",
            "`nickname` = ?",
        ]
    );
    assert_eq!(
        clause.values(),
        vec![
            Value::Int(9),
            Value::Int(4),
            Value::from(r#"{"theme":"dark"}"#),
            Value::Bytes(vec![0xff, 0xd8]),
            Value::Bytes(Vec::new()),
            Value::from(r#"["a","b"]"#),
            Value::from("bobby"),
        ]
    );
}

#[test]
fn member_zero_values_are_left_out() {
    let member = Member {
        id: 9,
        team: Team {
            id: 0,
            name: String::new(),
        },
        prefs: Prefs::default(),
        avatar: Vec::new(),
        digest: [0; 4],
        tags: Vec::new(),
        nickname: None,
        score: 0,
        cache: String::new(),
    };
    let clause = build(&member, &UpdatePolicy::new()).unwrap();
    assert!(clause.fragments().is_empty());
    assert_eq!(clause.values(), vec![Value::Int(9)]);

    // Required, but an empty byte sequence is still never written.
    let clause = build(&member, &UpdatePolicy::new().all_cols()).unwrap();
    assert!(!clause.fragments().contains(&"`avatar` = ?".to_string()));
    assert!(clause.fragments().contains(&"`nickname` = ?".to_string()));
}

#[test]
fn reference_to_composite_key_fails() {
    let membership = Membership {
        id: 1,
        grant: Grant {
            user_id: 2,
            role_id: 3,
        },
    };
    let err = build(&membership, &UpdatePolicy::new()).unwrap_err();
    assert!(matches!(
        err,
        OrmError::CompositeKey { ref table, count: 2 } if table == "grants"
    ));
}

#[test]
fn custom_conversion_and_scalars() {
    let product = Product {
        id: 1,
        price: Money(1250),
        sku: Sku(None),
        launched: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        active: false,
    };
    let clause = build(&product, &UpdatePolicy::new()).unwrap();
    assert_eq!(clause.fragments(), vec!["`price` = ?", "`launched` = ?"]);
    assert_eq!(
        clause.values(),
        vec![
            Value::Int(1),
            Value::from("12.50"),
            Value::from("2024-02-29")
        ]
    );

    let clause = build(&product, &UpdatePolicy::new().all_cols()).unwrap();
    assert_eq!(
        clause.set_values(),
        vec![
            Value::from("12.50"),
            Value::Null,
            Value::from("2024-02-29"),
            Value::Bool(false)
        ]
    );
}

#[test]
fn conversion_failure_aborts() {
    let product = Product {
        id: 1,
        price: Money(-1),
        sku: Sku(Some("X".into())),
        launched: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        active: true,
    };
    let err = build(&product, &UpdatePolicy::new()).unwrap_err();
    assert!(matches!(err, OrmError::Conversion(_)));
    assert_eq!(err.to_string(), "negative amount: -1");
}

#[test]
fn use_bool_writes_false() {
    let product = Product {
        id: 1,
        price: Money(0),
        sku: Sku(None),
        launched: NaiveDate::default(),
        active: false,
    };
    let clause = build(&product, &UpdatePolicy::new().use_bool()).unwrap();
    assert_eq!(clause.fragments(), vec!["`price` = ?", "`active` = ?"]);
}

#[test]
fn repeated_builds_are_identical() {
    let member = Member::sample();
    let policy = UpdatePolicy::new().all_cols().use_bool();
    let first = build(&member, &policy).unwrap();
    let second = build(&member, &policy).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.values().len() - first.fragments().len(), 1);
}
