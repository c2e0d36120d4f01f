//! Repository implementations for database access
//!
//! Each repository borrows the pool and follows these patterns:
//! - Aggregates with JOINs for list operations (no N+1)
//! - Maps constraint violations onto [`StoreError`] variants
//! - Uses transactions for multi-step operations

pub mod memberships;
pub mod segments;
pub mod users;

pub use memberships::MembershipRepo;
pub use segments::SegmentRepo;
pub use users::UserRepo;

use sqlx::postgres::PgDatabaseError;

use crate::store::StoreError;

/// Turn a unique violation into `AlreadyExists`, pass anything else through.
pub(crate) fn conflict_as_exists(
    err: sqlx::Error,
    resource: &'static str,
    id: &str,
) -> StoreError {
    let unique = matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation());
    if unique {
        StoreError::AlreadyExists {
            resource,
            id: id.to_owned(),
        }
    } else {
        StoreError::Unavailable(err)
    }
}

/// Name of the foreign key a statement violated, if that is what failed.
pub(crate) fn violated_foreign_key(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => db.constraint(),
        _ => None,
    }
}

/// Key value named in a Postgres foreign-key violation detail.
pub(crate) fn violating_key(err: &sqlx::Error) -> Option<String> {
    let sqlx::Error::Database(db) = err else {
        return None;
    };
    let detail = db.try_downcast_ref::<PgDatabaseError>()?.detail()?;
    key_value(detail).map(str::to_owned)
}

/// `Key (segment_name)=(promo) is not present in table "segments".` -> `promo`
fn key_value(detail: &str) -> Option<&str> {
    let start = detail.find(")=(")? + 3;
    let end = detail.rfind(") is not present")?;
    (start <= end).then(|| &detail[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_value_from_foreign_key_detail() {
        assert_eq!(
            key_value(r#"Key (segment_name)=(promo) is not present in table "segments"."#),
            Some("promo")
        );
        assert_eq!(
            key_value(r#"Key (segment_name)=(a(b)) is not present in table "segments"."#),
            Some("a(b)")
        );
        assert_eq!(key_value("unrelated"), None);
    }

    #[test]
    fn non_database_errors_have_no_key() {
        assert_eq!(violating_key(&sqlx::Error::PoolTimedOut), None);
    }

    #[sqlx::test(migrator = "crate::db::MIGRATOR")]
    #[ignore = "requires database"]
    async fn foreign_key_violation_names_the_missing_segment(pool: sqlx::PgPool) {
        let user_id: i64 = sqlx::query_scalar(
            "INSERT INTO users (firstname, lastname, username) VALUES ('T', 'U', 'tu') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO segments (name) VALUES ('a')")
            .execute(&pool)
            .await
            .unwrap();

        let err = sqlx::query(
            "INSERT INTO user_segments (user_id, segment_name) \
             SELECT $1, name FROM UNNEST($2::text[]) AS t(name)",
        )
        .bind(user_id)
        .bind(vec!["a".to_string(), "zz".to_string()])
        .execute(&pool)
        .await
        .unwrap_err();

        assert_eq!(violated_foreign_key(&err), Some("user_segments_segment_fk"));
        assert_eq!(violating_key(&err).as_deref(), Some("zz"));
    }
}
