//! Module dispatch.
//!
//! Every request that no dedicated route claims is turned into a [`Request`] and handed
//! to the module it addresses: the `module` variable when present, otherwise the first
//! path segment.

use async_trait::async_trait;
use axum::{
	body::{Body, to_bytes},
	extract::State,
	http::{HeaderMap, Request as HttpRequest, header},
	response::Response,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::extract::OptionalAuth;
use crate::perm::Identity;
use crate::prelude::*;
use crate::request::{Method, Request, Vars, parse_form, parse_json};

#[async_trait]
pub trait Module: Send + Sync {
	fn name(&self) -> &'static str;

	async fn handle(
		&self,
		app: &App,
		auth: Option<&Identity>,
		req: &mut Request,
	) -> ClResult<Response>;
}

#[derive(Default, Clone)]
pub struct ModuleRegistry {
	modules: HashMap<&'static str, Arc<dyn Module>>,
}

impl ModuleRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, module: Arc<dyn Module>) -> ClResult<()> {
		let name = module.name();
		if self.modules.contains_key(name) {
			return Err(Error::ConfigError(format!("Module '{}' is already registered", name)));
		}
		debug!("Registering module: {}", name);
		self.modules.insert(name, module);
		Ok(())
	}

	pub fn get(&self, name: &str) -> Option<&Arc<dyn Module>> {
		self.modules.get(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.modules.keys().copied()
	}
}

impl std::fmt::Debug for ModuleRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list().entries(self.modules.keys()).finish()
	}
}

fn body_vars(headers: &HeaderMap, body: &str) -> ClResult<Vars> {
	if body.is_empty() {
		return Ok(Vars::new());
	}
	let content_type = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or_default();
	if content_type.starts_with("application/json") {
		parse_json(&serde_json::from_str(body)?)
	} else if content_type.starts_with("application/x-www-form-urlencoded") {
		parse_form(body)
	} else {
		Ok(Vars::new())
	}
}

/// Build the normalised request. GET variables come from the query string, the body
/// fills the bag of the request method, and the merged bag lets body values win.
pub fn build_request(
	method: &str,
	path: &str,
	query: Option<&str>,
	headers: &HeaderMap,
	body: String,
) -> ClResult<Request> {
	let method: Method = method.parse()?;
	let mut req = Request::new(path, method);

	let get_vars = match query {
		Some(query) => parse_form(query)?,
		None => Vars::new(),
	};
	let mut merged = get_vars.clone();
	req.set_source_vars(crate::request::VarSource::Get, get_vars);

	if let Some(source) = method.body_source() {
		let vars = body_vars(headers, &body)?;
		merged.extend(vars.clone());
		req.set_source_vars(source, vars);
	}

	req.set_ajax(
		headers
			.get("x-requested-with")
			.and_then(|v| v.to_str().ok())
			.is_some_and(|v| v == "XMLHttpRequest"),
	);
	req.set_data((!body.is_empty()).then_some(body));
	req.set_vars(merged);

	if req.module().is_none() && req.current_token() != "/" {
		let token = req.current_token().to_string();
		req.set_module(&token);
	}
	Ok(req)
}

/// Catch-all handler
pub async fn dispatch(
	State(app): State<App>,
	OptionalAuth(auth): OptionalAuth,
	http_req: HttpRequest<Body>,
) -> ClResult<Response> {
	let (parts, body) = http_req.into_parts();
	let bytes = to_bytes(body, app.opts.max_body_size).await.map_err(|_| Error::Parse)?;
	let body = String::from_utf8(bytes.to_vec()).map_err(|_| Error::Parse)?;

	let mut req =
		build_request(parts.method.as_str(), parts.uri.path(), parts.uri.query(), &parts.headers, body)?;

	let name = req.module().ok_or(Error::NotFound)?.to_string();
	let module = app.modules.get(&name).cloned().ok_or_else(|| {
		debug!(module = %name, "unknown module");
		Error::NotFound
	})?;

	module.handle(&app, auth.as_ref(), &mut req).await
}


// vim: ts=4
