//! Settings key-value store, values kept as JSON text

use sqlx::{Row, SqlitePool};

use canopy_types::prelude::*;

use crate::utils::db_err;

pub(crate) async fn read(db: &SqlitePool, name: &str) -> ClResult<Option<serde_json::Value>> {
	let row = sqlx::query("SELECT value FROM settings WHERE name = ?")
		.bind(name)
		.fetch_optional(db)
		.await
		.map_err(db_err)?;

	Ok(row.and_then(|r| {
		let value: Option<String> = r.get("value");
		value.and_then(|v| serde_json::from_str(&v).ok())
	}))
}

/// `None` removes the stored value
pub(crate) async fn update(
	db: &SqlitePool,
	name: &str,
	value: Option<serde_json::Value>,
) -> ClResult<()> {
	if let Some(val) = value {
		sqlx::query("INSERT OR REPLACE INTO settings (name, value) VALUES (?, ?)")
			.bind(name)
			.bind(val.to_string())
			.execute(db)
			.await
			.map_err(db_err)?;
	} else {
		sqlx::query("DELETE FROM settings WHERE name = ?")
			.bind(name)
			.execute(db)
			.await
			.map_err(db_err)?;
	}
	Ok(())
}

// vim: ts=4
