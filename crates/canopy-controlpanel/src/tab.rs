//! Tab records: links, creation, reordering and removal

use canopy_core::filter::strip_tags;
use canopy_types::meta_adapter::{NewTab, Tab};
use canopy_types::types::TabId;

use crate::order::{self, Direction};
use crate::prelude::*;

/// Link of a tab. Strict tabs are returned verbatim; others get `tab=<id>`, and secure
/// ones the session auth key too.
pub fn href(tab: &Tab, auth_key: &str) -> String {
	if tab.strict {
		return tab.link.to_string();
	}
	let sep = if tab.link.contains('?') { '&' } else { '?' };
	if tab.secure {
		format!("{}{}tab={}&authkey={}", tab.link, sep, tab.id, auth_key)
	} else {
		format!("{}{}tab={}", tab.link, sep, tab.id)
	}
}

pub async fn list_tabs(app: &App) -> ClResult<Vec<Tab>> {
	let mut tabs = app.meta_adapter.list_tabs().await?;
	order::sort(&mut tabs);
	Ok(tabs)
}

pub async fn create_tab(
	app: &App,
	title: &str,
	link: &str,
	itemname: &str,
	link_title: Option<&str>,
	secure: bool,
	strict: bool,
) -> ClResult<Tab> {
	let title = strip_tags(title).trim().to_string();
	if title.is_empty() {
		return Err(Error::ValidationError("Tab title is required".into()));
	}
	if link.is_empty() {
		return Err(Error::ValidationError("Tab link is required".into()));
	}
	let tab_order = order::next_order(&app.meta_adapter.list_tabs().await?);
	let tab = NewTab {
		title: title.into(),
		tab_order,
		link: link.into(),
		itemname: itemname.into(),
		link_title: link_title.map(strip_tags).filter(|t| !t.is_empty()).map(Into::into),
		secure,
		strict,
	};
	let tab = app.meta_adapter.create_tab(&tab).await?;
	info!(tab_id = %tab.id, order = ?tab.tab_order, "tab created");
	Ok(tab)
}

/// Move a tab one step and persist the renumbered list. Fails with `Conflict` when the
/// stored order changed since it was read.
pub async fn move_tab(app: &App, tab_id: TabId, direction: Direction) -> ClResult<Vec<Tab>> {
	let mut tabs = list_tabs(app).await?;
	let expected = order::snapshot(&tabs);
	order::apply(&mut tabs, tab_id, direction)?;
	app.meta_adapter.update_tab_orders(&expected, &order::snapshot(&tabs)).await?;
	debug!(tab_id = %tab_id, ?direction, "tab moved");
	Ok(tabs)
}

/// Remove a tab and close the gap it leaves
pub async fn delete_tab(app: &App, tab_id: TabId) -> ClResult<Vec<Tab>> {
	app.meta_adapter.delete_tab(tab_id).await?;

	let mut tabs = list_tabs(app).await?;
	let expected = order::snapshot(&tabs);
	order::renumber(&mut tabs);
	if expected != order::snapshot(&tabs) {
		app.meta_adapter.update_tab_orders(&expected, &order::snapshot(&tabs)).await?;
	}
	info!(tab_id = %tab_id, "tab deleted");
	Ok(tabs)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tab(secure: bool, strict: bool) -> Tab {
		Tab {
			id: TabId(7),
			title: "Content".into(),
			link: "index.php?module=controlpanel&command=panel".into(),
			tab_order: Some(1),
			itemname: "controlpanel".into(),
			link_title: None,
			secure,
			strict,
		}
	}

	#[test]
	fn test_secure_href_carries_auth_key() {
		assert_eq!(
			href(&tab(true, false), "abc"),
			"index.php?module=controlpanel&command=panel&tab=7&authkey=abc"
		);
	}

	#[test]
	fn test_insecure_href() {
		assert_eq!(href(&tab(false, false), "abc"), "index.php?module=controlpanel&command=panel&tab=7");
	}

	#[test]
	fn test_strict_href_is_verbatim() {
		assert_eq!(href(&tab(true, true), "abc"), "index.php?module=controlpanel&command=panel");
	}

	#[test]
	fn test_href_without_query() {
		let mut t = tab(false, false);
		t.link = "/controlpanel".into();
		assert_eq!(href(&t, ""), "/controlpanel?tab=7");
	}
}

// vim: ts=4
