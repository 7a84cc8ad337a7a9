//! App state type

use std::path::Path;
use std::sync::Arc;

use canopy_types::meta_adapter::MetaAdapter;

use crate::dispatch::ModuleRegistry;
use crate::settings::service::SettingsService;
use crate::settings::types::FrozenSettingsRegistry;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct AppState {
	pub opts: AppBuilderOpts,
	pub meta_adapter: Arc<dyn MetaAdapter>,

	// Settings subsystem
	pub settings: Arc<SettingsService>,
	pub settings_registry: Arc<FrozenSettingsRegistry>,

	pub modules: ModuleRegistry,
}

pub type App = Arc<AppState>;

#[derive(Debug, Clone)]
pub struct AppBuilderOpts {
	pub listen: Box<str>,
	/// Root of the file-cabinet folders
	pub files_dir: Box<Path>,
	pub tmp_dir: Box<Path>,
	/// Session lifetime in seconds
	pub session_ttl: i64,
	/// Largest request body the dispatcher reads, in bytes
	pub max_body_size: usize,
	/// Password of the first deity account; generated and logged when unset
	pub admin_password: Option<Box<str>>,
}

impl Default for AppBuilderOpts {
	fn default() -> Self {
		Self {
			listen: "127.0.0.1:8080".into(),
			files_dir: Path::new("./data/files").into(),
			tmp_dir: Path::new("./data/tmp").into(),
			session_ttl: 8 * 3600,
			max_body_size: 64 * 1024 * 1024,
			admin_password: None,
		}
	}
}

// vim: ts=4
