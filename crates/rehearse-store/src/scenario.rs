//! Scenario catalog reads.

use crate::StoreError;
use rehearse_types::{Scenario, Track};
use rusqlite::{params, Connection};

/// Lists catalog scenarios, optionally filtered by track.
///
/// Unavailable scenarios are included (the dashboard greys them out);
/// filtering to available-only is the caller's choice.
pub fn list_scenarios(conn: &Connection, track: Option<Track>) -> Result<Vec<Scenario>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, track, title, description, available, role_pairings_json
         FROM scenarios
         WHERE (?1 IS NULL OR track = ?1)
         ORDER BY track ASC, title ASC",
    )?;

    let rows = stmt.query_map(params![track.map(|t| t.as_str())], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, bool>(4)?,
            row.get::<_, String>(5)?,
        ))
    })?;

    let mut scenarios = Vec::new();
    for row in rows {
        let (id, track_label, title, description, available, role_pairings_json) = row?;
        let track = track_label
            .parse::<Track>()
            .map_err(|e| StoreError::CorruptColumn(e.to_string()))?;
        scenarios.push(Scenario {
            id,
            track,
            title,
            description,
            available,
            role_pairings_json,
        });
    }
    Ok(scenarios)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rehearse_db::{create_pool, run_migrations, DbRuntimeSettings};

    #[test]
    fn seeded_catalog_lists_and_filters() {
        let pool = create_pool(":memory:", DbRuntimeSettings::default()).unwrap();
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();

        let all = list_scenarios(&conn, None).unwrap();
        assert!(all.len() >= 4);

        let sales = list_scenarios(&conn, Some(Track::Sales)).unwrap();
        assert!(!sales.is_empty());
        assert!(sales.iter().all(|s| s.track == Track::Sales));
    }
}
