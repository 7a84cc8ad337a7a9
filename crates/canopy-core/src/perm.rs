//! Permission resolution over the group graph.
//!
//! A user's effective permissions are the grants of every group reachable from its
//! personal group through "is member of" edges. Levels never add up: the highest
//! matching grant wins.

use std::collections::{BTreeSet, HashMap, VecDeque};

use canopy_types::meta_adapter::{Group, Membership, PermissionGrant, PermissionLevel};
use canopy_types::types::{GroupId, UserId};

use crate::prelude::*;

// GroupGraph //
//************//
/// Group records plus, for every group, the groups it is a direct member of
#[derive(Debug, Default)]
pub struct GroupGraph {
	groups: HashMap<GroupId, Group>,
	containers: HashMap<GroupId, Vec<GroupId>>,
}

impl GroupGraph {
	pub fn new(groups: Vec<Group>, memberships: &[Membership]) -> Self {
		let groups: HashMap<GroupId, Group> = groups.into_iter().map(|g| (g.id, g)).collect();
		let mut containers: HashMap<GroupId, Vec<GroupId>> = HashMap::new();
		for m in memberships {
			containers.entry(m.member_id).or_default().push(m.group_id);
		}
		Self { groups, containers }
	}

	pub fn group(&self, id: GroupId) -> Option<&Group> {
		self.groups.get(&id)
	}

	fn is_active(&self, id: GroupId) -> bool {
		self.groups.get(&id).is_some_and(|g| g.active)
	}

	/// Every active group reachable from `start`, `start` included. Inactive or unknown
	/// groups are neither returned nor walked through; cycles are harmless.
	pub fn expand(&self, start: &[GroupId]) -> BTreeSet<GroupId> {
		let mut visited = BTreeSet::new();
		let mut queue: VecDeque<GroupId> = start.iter().copied().collect();

		while let Some(id) = queue.pop_front() {
			if !self.is_active(id) || !visited.insert(id) {
				continue;
			}
			if let Some(parents) = self.containers.get(&id) {
				queue.extend(parents.iter().copied().filter(|p| !visited.contains(p)));
			}
		}
		visited
	}
}

// Permission //
//************//
#[derive(Debug, Clone, Default)]
pub struct Permission {
	groups: BTreeSet<GroupId>,
	grants: Vec<PermissionGrant>,
}

impl Permission {
	/// Grants nothing
	pub fn none() -> Self {
		Self::default()
	}

	pub fn resolve(graph: &GroupGraph, grants: Vec<PermissionGrant>, start: &[GroupId]) -> Self {
		let groups = graph.expand(start);
		let grants = grants.into_iter().filter(|g| groups.contains(&g.group_id)).collect();
		Self { groups, grants }
	}

	pub fn groups(&self) -> &BTreeSet<GroupId> {
		&self.groups
	}

	pub fn grants(&self) -> &[PermissionGrant] {
		&self.grants
	}

	/// Highest level among the grants matching the module, subpermission and item exactly
	pub fn level(&self, module: &str, sub: Option<&str>, item: Option<u32>) -> PermissionLevel {
		self.grants
			.iter()
			.filter(|g| &*g.module == module && g.subpermission.as_deref() == sub && g.item_id == item)
			.map(|g| g.level)
			.max()
			.unwrap_or_default()
	}

	/// * the module level must be at least `Restricted`
	/// * a subpermission needs its own grant
	/// * an item needs an item grant unless the module level is `Full`
	pub fn allow(&self, module: &str, sub: Option<&str>, item: Option<u32>) -> bool {
		let module_level = self.level(module, None, None);
		if !module_level.satisfies(PermissionLevel::Restricted) {
			return false;
		}
		if let Some(sub) = sub {
			if !self.level(module, Some(sub), None).satisfies(PermissionLevel::Restricted) {
				return false;
			}
		}
		match item {
			Some(item) if module_level < PermissionLevel::Full => self
				.grants
				.iter()
				.any(|g| &*g.module == module && g.item_id == Some(item) && g.level > PermissionLevel::None),
			_ => true,
		}
	}
}

// Identity //
//**********//
/// The authenticated subject of a request
#[derive(Debug, Clone)]
pub struct Identity {
	pub user_id: UserId,
	pub username: Box<str>,
	pub deity: bool,
	pub auth_key: Box<str>,
	/// Personal group of the user
	pub groups: Vec<GroupId>,
}

impl Identity {
	/// Deities pass every check
	pub fn allow(&self, perm: &Permission, module: &str, sub: Option<&str>, item: Option<u32>) -> bool {
		if self.deity {
			return true;
		}
		let allowed = perm.allow(module, sub, item);
		if !allowed {
			debug!(subject = %self.username, module, ?sub, ?item, "permission denied");
		}
		allowed
	}
}

async fn try_load_permission(app: &App, identity: &Identity) -> ClResult<Permission> {
	let groups = app.meta_adapter.list_groups().await?;
	let memberships = app.meta_adapter.list_memberships().await?;
	let grants = app.meta_adapter.list_permission_grants().await?;
	let graph = GroupGraph::new(groups, &memberships);
	Ok(Permission::resolve(&graph, grants, &identity.groups))
}

/// Effective permissions of `identity`. Load failures deny everything.
pub async fn load_permission(app: &App, identity: &Identity) -> Permission {
	match try_load_permission(app, identity).await {
		Ok(perm) => perm,
		Err(err) => {
			warn!(subject = %identity.username, "permission load failed: {}", err);
			Permission::none()
		}
	}
}

/// Permission check for the current subject, `PermissionDenied` if not allowed
pub async fn check(
	app: &App,
	identity: &Identity,
	module: &str,
	sub: Option<&str>,
	item: Option<u32>,
) -> ClResult<()> {
	if identity.deity {
		return Ok(());
	}
	let perm = load_permission(app, identity).await;
	if identity.allow(&perm, module, sub, item) {
		Ok(())
	} else {
		Err(Error::PermissionDenied)
	}
}


// vim: ts=4
