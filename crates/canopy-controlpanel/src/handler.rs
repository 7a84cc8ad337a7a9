//! Command handler of the control-panel module

use async_trait::async_trait;
use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use serde::Serialize;

use canopy_core::dispatch::Module;
use canopy_core::filter::{filter_boolean, filter_integer};
use canopy_core::middleware::require_auth_key;
use canopy_core::perm::{self, Identity};
use canopy_core::request::Request;
use canopy_types::meta_adapter::Tab;
use canopy_types::types::{ApiResponse, TabId};

use crate::order::Direction;
use crate::prelude::*;
use crate::tab;

const MODULE: &str = "controlpanel";

#[derive(Debug, Default)]
pub struct ControlPanelModule;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TabView {
	#[serde(flatten)]
	tab: Tab,
	href: String,
}

fn views(tabs: Vec<Tab>, auth_key: &str) -> Vec<TabView> {
	tabs.into_iter()
		.map(|t| {
			let href = tab::href(&t, auth_key);
			TabView { tab: t, href }
		})
		.collect()
}

fn respond<T: Serialize>(status: StatusCode, data: T) -> ClResult<Response> {
	Ok((status, Json(ApiResponse::new(data))).into_response())
}

fn var<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
	req.vars().get(name).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

fn tab_id(req: &Request) -> ClResult<TabId> {
	var(req, "tab_id")
		.and_then(filter_integer)
		.and_then(|n| u32::try_from(n).ok())
		.map(TabId)
		.ok_or_else(|| Error::ValidationError("\"tab_id\" must be a positive integer".into()))
}

#[async_trait]
impl Module for ControlPanelModule {
	fn name(&self) -> &'static str {
		MODULE
	}

	async fn handle(
		&self,
		app: &App,
		auth: Option<&Identity>,
		req: &mut Request,
	) -> ClResult<Response> {
		let identity = auth.ok_or(Error::Unauthorized)?;
		let command = match req.shift_command() {
			Some(command) => command,
			None => var(req, "command").unwrap_or("list").to_string(),
		};
		debug!(command = %command, "controlpanel command");

		if command == "list" {
			let tabs = tab::list_tabs(app).await?;
			return respond(StatusCode::OK, views(tabs, &identity.auth_key));
		}

		perm::check(app, identity, MODULE, Some("tabs"), None).await?;
		require_auth_key(identity, req)?;

		match command.as_str() {
			"post_tab" => {
				let title = var(req, "title").unwrap_or_default();
				let link = var(req, "link").unwrap_or_default();
				let itemname = var(req, "itemname").unwrap_or(MODULE);
				let secure = var(req, "secure").and_then(filter_boolean).unwrap_or(true);
				let strict = var(req, "strict").and_then(filter_boolean).unwrap_or(false);
				let created =
					tab::create_tab(app, title, link, itemname, var(req, "link_title"), secure, strict)
						.await?;
				let href = tab::href(&created, &identity.auth_key);
				respond(StatusCode::CREATED, TabView { tab: created, href })
			}
			"move_up" | "move_down" => {
				let direction = if command == "move_up" { Direction::Up } else { Direction::Down };
				let tabs = tab::move_tab(app, tab_id(req)?, direction).await?;
				respond(StatusCode::OK, views(tabs, &identity.auth_key))
			}
			"delete_tab" => {
				let tabs = tab::delete_tab(app, tab_id(req)?).await?;
				respond(StatusCode::OK, views(tabs, &identity.auth_key))
			}
			_ => Err(Error::NotFound),
		}
	}
}

// vim: ts=4
