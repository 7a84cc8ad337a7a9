//! Settings service: stored value, else registered default, behind an LRU cache.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

use canopy_types::meta_adapter::MetaAdapter;

use super::types::{FrozenSettingsRegistry, SettingValue};
use crate::prelude::*;

const DEFAULT_CACHE_SIZE: NonZeroUsize = NonZeroUsize::MIN.saturating_add(99);

pub struct SettingsCache {
	cache: parking_lot::Mutex<LruCache<String, SettingValue>>,
}

impl SettingsCache {
	pub fn new(capacity: usize) -> Self {
		let capacity = NonZeroUsize::new(capacity).unwrap_or(DEFAULT_CACHE_SIZE);
		Self { cache: parking_lot::Mutex::new(LruCache::new(capacity)) }
	}

	pub fn get(&self, key: &str) -> Option<SettingValue> {
		self.cache.lock().get(key).cloned()
	}

	pub fn put(&self, key: &str, value: SettingValue) {
		self.cache.lock().put(key.to_string(), value);
	}

	pub fn invalidate(&self, key: &str) {
		self.cache.lock().pop(key);
	}
}

pub struct SettingsService {
	registry: Arc<FrozenSettingsRegistry>,
	cache: SettingsCache,
	meta: Arc<dyn MetaAdapter>,
}

impl SettingsService {
	pub fn new(
		registry: Arc<FrozenSettingsRegistry>,
		meta: Arc<dyn MetaAdapter>,
		cache_size: usize,
	) -> Self {
		Self { registry, cache: SettingsCache::new(cache_size), meta }
	}

	pub async fn get(&self, key: &str) -> ClResult<SettingValue> {
		if let Some(value) = self.cache.get(key) {
			return Ok(value);
		}

		let def = self
			.registry
			.get(key)
			.ok_or_else(|| Error::ValidationError(format!("Unknown setting: {}", key)))?;

		let value = match self.meta.read_setting(key).await? {
			Some(json_value) => serde_json::from_value::<SettingValue>(json_value)
				.map_err(|e| Error::ValidationError(format!("Invalid setting value: {}", e)))?,
			None => def.default.clone().ok_or_else(|| {
				Error::ConfigError(format!("Setting '{}' has no default and is not configured", key))
			})?,
		};
		self.cache.put(key, value.clone());
		Ok(value)
	}

	/// Store a new value. Only deities may write, and never `System` settings.
	pub async fn set(&self, key: &str, value: SettingValue, deity: bool) -> ClResult<()> {
		let def = self
			.registry
			.get(key)
			.ok_or_else(|| Error::ValidationError(format!("Unknown setting: {}", key)))?;

		if !def.access.check(deity) {
			warn!("Permission denied for setting '{}': requires {:?}", key, def.access);
			return Err(Error::PermissionDenied);
		}

		if let Some(default) = &def.default {
			if !value.matches_type(default) {
				return Err(Error::ValidationError(format!(
					"Type mismatch for setting '{}': expected {}, got {}",
					key,
					default.type_name(),
					value.type_name()
				)));
			}
		}
		if let Some(validator) = &def.validator {
			validator(&value)?;
		}

		self.meta.update_setting(key, Some(serde_json::to_value(&value)?)).await?;
		self.cache.invalidate(key);
		info!("Setting '{}' updated", key);
		Ok(())
	}

	/// Drop the stored value so the default applies again
	pub async fn reset(&self, key: &str, deity: bool) -> ClResult<()> {
		let def = self
			.registry
			.get(key)
			.ok_or_else(|| Error::ValidationError(format!("Unknown setting: {}", key)))?;
		if !def.access.check(deity) {
			return Err(Error::PermissionDenied);
		}
		self.meta.update_setting(key, None).await?;
		self.cache.invalidate(key);
		info!("Setting '{}' reset", key);
		Ok(())
	}

	pub async fn get_string(&self, key: &str) -> ClResult<String> {
		match self.get(key).await? {
			SettingValue::String(s) => Ok(s),
			v => Err(Error::ConfigError(format!(
				"Setting '{}' is not a string, got {}",
				key,
				v.type_name()
			))),
		}
	}

	pub async fn get_int(&self, key: &str) -> ClResult<i64> {
		match self.get(key).await? {
			SettingValue::Int(i) => Ok(i),
			v => Err(Error::ConfigError(format!(
				"Setting '{}' is not an integer, got {}",
				key,
				v.type_name()
			))),
		}
	}

	pub async fn get_bool(&self, key: &str) -> ClResult<bool> {
		match self.get(key).await? {
			SettingValue::Bool(b) => Ok(b),
			v => Err(Error::ConfigError(format!(
				"Setting '{}' is not a boolean, got {}",
				key,
				v.type_name()
			))),
		}
	}

	pub fn registry(&self) -> &Arc<FrozenSettingsRegistry> {
		&self.registry
	}
}

// vim: ts=4
