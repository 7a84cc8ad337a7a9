use std::{env, path, sync::Arc};

use canopy::error::ClResult;
use canopy_meta_adapter_sqlite::MetaAdapterSqlite;

pub struct Config {
	pub listen: String,
	pub db_dir: path::PathBuf,
	pub files_dir: path::PathBuf,
	pub admin_password: Option<String>,
}

impl Config {
	fn from_env() -> Self {
		let db_dir = path::PathBuf::from(env::var("DB_DIR").unwrap_or_else(|_| "./data".to_string()));
		Config {
			listen: env::var("LISTEN").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
			files_dir: env::var("FILES_DIR").map_or_else(|_| db_dir.join("files"), path::PathBuf::from),
			admin_password: env::var("ADMIN_PASSWORD").ok().filter(|p| !p.is_empty()),
			db_dir,
		}
	}
}

#[tokio::main]
async fn main() -> ClResult<()> {
	let config = Config::from_env();
	tokio::fs::create_dir_all(&config.db_dir).await?;

	let meta_adapter = Arc::new(MetaAdapterSqlite::new(&config.db_dir).await?);

	let mut builder = canopy::AppBuilder::new();
	builder
		.listen(config.listen)
		.files_dir(config.files_dir)
		.tmp_dir(config.db_dir.join("tmp"))
		.meta_adapter(meta_adapter);
	if let Some(password) = config.admin_password {
		builder.admin_password(password);
	}
	builder.run().await
}

// vim: ts=4
