//! Tab ordering.
//!
//! The tab list is handled as a sequence sorted by order. Moves swap neighbours, with
//! wrap-around at both ends, and the list is renumbered 1..N afterwards.

use canopy_types::meta_adapter::Tab;
use canopy_types::types::TabId;

use crate::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
	Up,
	Down,
}

/// Order a new tab gets: one past the highest existing order, 1 for an empty list
pub fn next_order(tabs: &[Tab]) -> u32 {
	tabs.iter().filter_map(|t| t.tab_order).max().map_or(1, |max| max.saturating_add(1))
}

/// Display order. Tabs never saved with an order go last.
pub fn sort(tabs: &mut [Tab]) {
	tabs.sort_by_key(|t| (t.tab_order.is_none(), t.tab_order, t.id));
}

pub fn renumber(tabs: &mut [Tab]) {
	for (order, tab) in (1u32..).zip(tabs.iter_mut()) {
		tab.tab_order = Some(order);
	}
}

fn position(tabs: &[Tab], tab_id: TabId) -> ClResult<usize> {
	tabs.iter().position(|t| t.id == tab_id).ok_or(Error::NotFound)
}

/// Swap with the previous tab. The first tab goes to the end.
pub fn move_up(tabs: &mut Vec<Tab>, tab_id: TabId) -> ClResult<()> {
	let pos = position(tabs, tab_id)?;
	if pos == 0 {
		let tab = tabs.remove(0);
		tabs.push(tab);
	} else {
		tabs.swap(pos - 1, pos);
	}
	renumber(tabs);
	Ok(())
}

/// Swap with the next tab. The last tab goes to the front.
pub fn move_down(tabs: &mut Vec<Tab>, tab_id: TabId) -> ClResult<()> {
	let pos = position(tabs, tab_id)?;
	if pos + 1 == tabs.len() {
		let tab = tabs.remove(pos);
		tabs.insert(0, tab);
	} else {
		tabs.swap(pos, pos + 1);
	}
	renumber(tabs);
	Ok(())
}

pub fn apply(tabs: &mut Vec<Tab>, tab_id: TabId, direction: Direction) -> ClResult<()> {
	match direction {
		Direction::Up => move_up(tabs, tab_id),
		Direction::Down => move_down(tabs, tab_id),
	}
}

/// `(id, order)` pairs as persisted; an unset order is stored as 0
pub fn snapshot(tabs: &[Tab]) -> Vec<(TabId, u32)> {
	tabs.iter().map(|t| (t.id, t.tab_order.unwrap_or(0))).collect()
}


// vim: ts=4
