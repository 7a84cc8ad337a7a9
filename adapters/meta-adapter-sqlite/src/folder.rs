//! File-cabinet folders and the documents filed in them

use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use canopy_types::meta_adapter::{Document, Folder, FolderKind, NewDocument};
use canopy_types::prelude::*;
use canopy_types::types::{DocumentId, FolderId};

use crate::utils::{collect_res, db_err, map_res, to_u32, to_u32_id};

fn map_folder(row: SqliteRow) -> Result<Folder, sqlx::Error> {
	let kind = FolderKind::from_code(row.try_get("ftype")?)
		.map_err(|_| sqlx::Error::Decode("invalid folder type".into()))?;
	Ok(Folder {
		id: FolderId(to_u32(row.try_get("folder_id")?)?),
		title: row.try_get::<String, _>("title")?.into(),
		kind,
		directory: row.try_get::<String, _>("directory")?.into(),
		created_at: Timestamp(row.try_get("created_at")?),
	})
}

fn map_document(row: SqliteRow) -> Result<Document, sqlx::Error> {
	let size: i64 = row.try_get("size")?;
	Ok(Document {
		id: DocumentId(to_u32(row.try_get("document_id")?)?),
		folder_id: FolderId(to_u32(row.try_get("folder_id")?)?),
		file_name: row.try_get::<String, _>("file_name")?.into(),
		title: row.try_get::<String, _>("title")?.into(),
		file_type: row.try_get::<String, _>("file_type")?.into(),
		size: u64::try_from(size).map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
		created_at: Timestamp(row.try_get("created_at")?),
	})
}

pub(crate) async fn list(db: &SqlitePool, kind: Option<FolderKind>) -> ClResult<Vec<Folder>> {
	let mut query = sqlx::QueryBuilder::<sqlx::Sqlite>::new(
		"SELECT folder_id, title, ftype, directory, created_at FROM folders",
	);
	if let Some(kind) = kind {
		query.push(" WHERE ftype = ").push_bind(kind.code());
	}
	query.push(" ORDER BY title");

	let rows = query.build().fetch_all(db).await.map_err(db_err)?;
	collect_res(rows.into_iter().map(map_folder))
}

pub(crate) async fn read(db: &SqlitePool, folder_id: FolderId) -> ClResult<Folder> {
	let res = sqlx::query(
		"SELECT folder_id, title, ftype, directory, created_at FROM folders WHERE folder_id = ?",
	)
	.bind(folder_id.0)
	.fetch_one(db)
	.await;
	map_res(res, map_folder)
}

pub(crate) async fn create(
	db: &SqlitePool,
	title: &str,
	kind: FolderKind,
	directory: &str,
) -> ClResult<FolderId> {
	let res = sqlx::query("INSERT INTO folders (title, ftype, directory) VALUES (?, ?, ?)")
		.bind(title)
		.bind(kind.code())
		.bind(directory)
		.execute(db)
		.await
		.map_err(db_err)?;
	Ok(FolderId(to_u32_id(res.last_insert_rowid())?))
}

pub(crate) async fn list_documents(db: &SqlitePool, folder_id: FolderId) -> ClResult<Vec<Document>> {
	let rows = sqlx::query(
		"SELECT document_id, folder_id, file_name, title, file_type, size, created_at
		FROM documents WHERE folder_id = ? ORDER BY title",
	)
	.bind(folder_id.0)
	.fetch_all(db)
	.await
	.map_err(db_err)?;
	collect_res(rows.into_iter().map(map_document))
}

pub(crate) async fn create_document(db: &SqlitePool, doc: &NewDocument<'_>) -> ClResult<DocumentId> {
	let size = i64::try_from(doc.size).map_err(|_| Error::ValidationError("File size too large".into()))?;
	let res = sqlx::query(
		"INSERT INTO documents (folder_id, file_name, title, file_type, size) VALUES (?, ?, ?, ?, ?)",
	)
	.bind(doc.folder_id.0)
	.bind(doc.file_name)
	.bind(doc.title)
	.bind(doc.file_type)
	.bind(size)
	.execute(db)
	.await
	.map_err(db_err)?;
	Ok(DocumentId(to_u32_id(res.last_insert_rowid())?))
}

// vim: ts=4
