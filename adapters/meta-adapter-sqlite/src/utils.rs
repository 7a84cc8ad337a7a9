//! Error mapping helpers shared by the table modules

use canopy_types::prelude::*;
use sqlx::sqlite::SqliteRow;

/// Log database error for debugging
pub(crate) fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

/// Collapse any sqlx error into `DbError` after logging it
pub(crate) fn db_err(err: sqlx::Error) -> Error {
	inspect(&err);
	Error::DbError
}

/// Map a single-row query result; a missing row is `NotFound`
pub(crate) fn map_res<T, F>(row: Result<SqliteRow, sqlx::Error>, f: F) -> ClResult<T>
where
	F: FnOnce(SqliteRow) -> Result<T, sqlx::Error>,
{
	match row {
		Ok(row) => f(row).inspect_err(inspect).map_err(|_| Error::DbError),
		Err(sqlx::Error::RowNotFound) => Err(Error::NotFound),
		Err(err) => {
			inspect(&err);
			Err(Error::DbError)
		}
	}
}

/// Collect an iterator of row mapping results, translating errors
pub(crate) fn collect_res<T>(
	iter: impl Iterator<Item = Result<T, sqlx::Error>> + Unpin,
) -> ClResult<Vec<T>> {
	let mut items = Vec::new();
	for item in iter {
		items.push(item.inspect_err(inspect).map_err(|_| Error::DbError)?);
	}
	Ok(items)
}

/// Row ids are stored as SQLite integers; anything outside `u32` is corrupt data
pub(crate) fn to_u32(value: i64) -> Result<u32, sqlx::Error> {
	u32::try_from(value).map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

pub(crate) fn to_u32_id(value: i64) -> ClResult<u32> {
	u32::try_from(value).map_err(|_| Error::DbError)
}

// vim: ts=4
