//! User lookup for the auth layer.

use crate::StoreError;
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

/// A trainee account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub active: bool,
}

/// Retrieves a user by public ID.
///
/// Returns `NotFound` for unknown users; the auth middleware treats any
/// failure here as unauthorized.
pub fn get_user(conn: &Connection, user_id: &str) -> Result<User, StoreError> {
    conn.query_row(
        "SELECT id, user_id, display_name, active FROM users WHERE user_id = ?1",
        [user_id],
        |row| {
            Ok(User {
                id: row.get(0)?,
                user_id: row.get(1)?,
                display_name: row.get(2)?,
                active: row.get(3)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| StoreError::NotFound(user_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rehearse_db::{create_pool, run_migrations, DbRuntimeSettings};

    #[test]
    fn lookup_known_and_unknown_users() {
        let pool = create_pool(":memory:", DbRuntimeSettings::default()).unwrap();
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO users (user_id, display_name, active) VALUES ('u1', 'Trainee', 1)",
            [],
        )
        .unwrap();

        let user = get_user(&conn, "u1").unwrap();
        assert_eq!(user.display_name, "Trainee");
        assert!(user.active);

        assert!(matches!(
            get_user(&conn, "ghost"),
            Err(StoreError::NotFound(_))
        ));
    }
}
