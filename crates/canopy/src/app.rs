//! App builder - constructs and runs the Canopy application

use axum::Router;
use std::sync::Arc;

use crate::meta_adapter::MetaAdapter;
use crate::prelude::*;
use crate::settings::SettingsRegistry;
use crate::settings::service::SettingsService;
use crate::{bootstrap, routes};
pub use canopy_core::app::{App, AppBuilderOpts, AppState, VERSION};
use canopy_core::dispatch::ModuleRegistry;

const SETTINGS_CACHE_SIZE: usize = 256;

pub struct AppBuilder {
	opts: AppBuilderOpts,
	meta_adapter: Option<Arc<dyn MetaAdapter>>,
}

impl AppBuilder {
	pub fn new() -> Self {
		// tests build several apps in one process
		let _ = tracing_subscriber::fmt()
			.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
			.with_target(false)
			.try_init();
		AppBuilder { opts: AppBuilderOpts::default(), meta_adapter: None }
	}

	// Opts
	pub fn listen(&mut self, listen: impl Into<Box<str>>) -> &mut Self {
		self.opts.listen = listen.into();
		self
	}
	pub fn files_dir(&mut self, files_dir: impl Into<Box<std::path::Path>>) -> &mut Self {
		self.opts.files_dir = files_dir.into();
		self
	}
	pub fn tmp_dir(&mut self, tmp_dir: impl Into<Box<std::path::Path>>) -> &mut Self {
		self.opts.tmp_dir = tmp_dir.into();
		self
	}
	pub fn session_ttl(&mut self, seconds: i64) -> &mut Self {
		self.opts.session_ttl = seconds;
		self
	}
	pub fn max_body_size(&mut self, bytes: usize) -> &mut Self {
		self.opts.max_body_size = bytes;
		self
	}
	pub fn admin_password(&mut self, password: impl Into<Box<str>>) -> &mut Self {
		self.opts.admin_password = Some(password.into());
		self
	}

	// Adapters
	pub fn meta_adapter(&mut self, meta_adapter: Arc<dyn MetaAdapter>) -> &mut Self {
		self.meta_adapter = Some(meta_adapter);
		self
	}

	/// Assemble the app state and its router without serving
	pub async fn build(self) -> ClResult<(App, Router)> {
		let Some(meta_adapter) = self.meta_adapter else {
			error!("FATAL: No meta adapter configured");
			return Err(Error::Internal("No meta adapter configured".to_string()));
		};

		// Register settings from all modules
		let mut settings_registry = SettingsRegistry::new();
		canopy_users::register_settings(&mut settings_registry)?;
		canopy_filecabinet::register_settings(&mut settings_registry)?;
		info!("Registered {} settings", settings_registry.len());

		let frozen_registry = Arc::new(settings_registry.freeze());
		let settings_service = Arc::new(SettingsService::new(
			frozen_registry.clone(),
			meta_adapter.clone(),
			SETTINGS_CACHE_SIZE,
		));

		let mut modules = ModuleRegistry::new();
		modules.register(Arc::new(canopy_users::UsersModule))?;
		modules.register(Arc::new(canopy_controlpanel::ControlPanelModule))?;
		modules.register(Arc::new(canopy_filecabinet::FileCabinetModule))?;
		info!("Modules: {:?}", modules);

		let app: App = Arc::new(AppState {
			opts: self.opts,
			meta_adapter,
			settings: settings_service,
			settings_registry: frozen_registry,
			modules,
		});

		for dir in [&app.opts.tmp_dir, &app.opts.files_dir] {
			tokio::fs::create_dir_all(dir).await.map_err(|e| {
				error!("FATAL: Cannot create directory {}: {}", dir.display(), e);
				Error::Internal(format!("Cannot create directory: {}", e))
			})?;
		}

		let router = routes::init(app.clone());
		Ok((app, router))
	}

	pub async fn run(self) -> ClResult<()> {
		info!("  ___ __ _ _ __   ___  _ __  _   _");
		info!(" / __/ _` | '_ \\ / _ \\| '_ \\| | | |");
		info!("| (_| (_| | | | | (_) | |_) | |_| |");
		info!(" \\___\\__,_|_| |_|\\___/| .__/ \\__, |");
		info!("                      |_|    |___/");
		info!("V{}", VERSION);

		let (app, router) = self.build().await?;

		bootstrap::bootstrap(&app).await.map_err(|e| {
			error!("FATAL: Bootstrap failed: {}", e);
			e
		})?;

		let listener = tokio::net::TcpListener::bind(app.opts.listen.as_ref()).await?;
		info!("Listening on HTTP {}", app.opts.listen);
		axum::serve(listener, router).await?;

		Ok(())
	}
}

impl Default for AppBuilder {
	fn default() -> Self {
		Self::new()
	}
}

// vim: ts=4
