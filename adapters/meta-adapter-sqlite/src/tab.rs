//! Control-panel tabs

use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use canopy_types::meta_adapter::{NewTab, Tab};
use canopy_types::prelude::*;
use canopy_types::types::TabId;

use crate::utils::{collect_res, db_err, map_res, to_u32, to_u32_id};

const TAB_COLUMNS: &str =
	"tab_id, title, link, tab_order, itemname, link_title, secure, strict";

fn map_tab(row: SqliteRow) -> Result<Tab, sqlx::Error> {
	let tab_order: Option<i64> = row.try_get("tab_order")?;
	let link_title: Option<String> = row.try_get("link_title")?;
	Ok(Tab {
		id: TabId(to_u32(row.try_get("tab_id")?)?),
		title: row.try_get::<String, _>("title")?.into(),
		link: row.try_get::<String, _>("link")?.into(),
		tab_order: tab_order.map(to_u32).transpose()?,
		itemname: row.try_get::<String, _>("itemname")?.into(),
		link_title: link_title.map(Into::into),
		secure: row.try_get("secure")?,
		strict: row.try_get("strict")?,
	})
}

pub(crate) async fn list(db: &SqlitePool) -> ClResult<Vec<Tab>> {
	let rows = sqlx::query(&format!(
		"SELECT {} FROM tabs ORDER BY tab_order IS NULL, tab_order, tab_id",
		TAB_COLUMNS
	))
	.fetch_all(db)
	.await
	.map_err(db_err)?;
	collect_res(rows.into_iter().map(map_tab))
}

pub(crate) async fn read(db: &SqlitePool, tab_id: TabId) -> ClResult<Tab> {
	let res = sqlx::query(&format!("SELECT {} FROM tabs WHERE tab_id = ?", TAB_COLUMNS))
		.bind(tab_id.0)
		.fetch_one(db)
		.await;
	map_res(res, map_tab)
}

/// Insert at the end of the order. The insert only happens while `tab.tab_order` is
/// still one past the highest stored order.
pub(crate) async fn create(db: &SqlitePool, tab: &NewTab) -> ClResult<Tab> {
	let res = sqlx::query(
		"INSERT INTO tabs (title, link, tab_order, itemname, link_title, secure, strict)
		SELECT ?, ?, ?, ?, ?, ?, ?
		WHERE (SELECT IFNULL(max(tab_order), 0) + 1 FROM tabs) = ?",
	)
	.bind(&*tab.title)
	.bind(&*tab.link)
	.bind(tab.tab_order)
	.bind(&*tab.itemname)
	.bind(tab.link_title.as_deref())
	.bind(tab.secure)
	.bind(tab.strict)
	.bind(tab.tab_order)
	.execute(db)
	.await
	.map_err(db_err)?;
	if res.rows_affected() == 0 {
		return Err(Error::Conflict("Tab order changed concurrently".into()));
	}

	read(db, TabId(to_u32_id(res.last_insert_rowid())?)).await
}

/// Compare-and-swap rewrite of the tab order. Every row must still hold its expected
/// order and no tab may have been added or removed meanwhile.
pub(crate) async fn update_orders(
	db: &SqlitePool,
	expected: &[(TabId, u32)],
	orders: &[(TabId, u32)],
) -> ClResult<()> {
	let mut tx = db.begin().await.map_err(db_err)?;

	for (tab_id, order) in expected {
		let current = orders.iter().find(|(id, _)| id == tab_id).map(|(_, o)| *o);
		let Some(new_order) = current else {
			return Err(Error::Internal(format!("no new order for tab {}", tab_id)));
		};
		let res = sqlx::query("UPDATE tabs SET tab_order = ? WHERE tab_id = ? AND IFNULL(tab_order, 0) = ?")
			.bind(new_order)
			.bind(tab_id.0)
			.bind(*order)
			.execute(&mut *tx)
			.await
			.map_err(db_err)?;
		if res.rows_affected() != 1 {
			return Err(Error::Conflict("Tab order changed concurrently".into()));
		}
	}

	let count: i64 = sqlx::query_scalar("SELECT count(*) FROM tabs")
		.fetch_one(&mut *tx)
		.await
		.map_err(db_err)?;
	if usize::try_from(count).ok() != Some(expected.len()) {
		return Err(Error::Conflict("Tab list changed concurrently".into()));
	}

	tx.commit().await.map_err(db_err)?;
	Ok(())
}

pub(crate) async fn delete(db: &SqlitePool, tab_id: TabId) -> ClResult<()> {
	let res = sqlx::query("DELETE FROM tabs WHERE tab_id = ?")
		.bind(tab_id.0)
		.execute(db)
		.await
		.map_err(db_err)?;
	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	Ok(())
}

// vim: ts=4
