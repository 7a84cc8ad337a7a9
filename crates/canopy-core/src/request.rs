//! Normalised view of an incoming request.
//!
//! A [`Request`] owns the sanitised url, the verb, the addressed module and the stack of
//! commands below it, plus the request variables split into the merged bag and one bag
//! per verb. Values pulled out through the typed `pull_*` accessors are always filtered.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use crate::filter::{filter_boolean, filter_float, filter_integer, filter_string};
use crate::prelude::*;

// Method //
//********//
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
	Get,
	Head,
	Post,
	Put,
	Delete,
	Options,
	Patch,
}

impl Method {
	pub fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Head => "HEAD",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Delete => "DELETE",
			Method::Options => "OPTIONS",
			Method::Patch => "PATCH",
		}
	}

	/// The variable bag a body sent with this verb belongs to
	pub fn body_source(self) -> Option<VarSource> {
		match self {
			Method::Post => Some(VarSource::Post),
			Method::Put => Some(VarSource::Put),
			Method::Patch => Some(VarSource::Patch),
			Method::Delete => Some(VarSource::Delete),
			Method::Get | Method::Head | Method::Options => None,
		}
	}
}

impl FromStr for Method {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"GET" => Ok(Method::Get),
			"HEAD" => Ok(Method::Head),
			"POST" => Ok(Method::Post),
			"PUT" => Ok(Method::Put),
			"DELETE" => Ok(Method::Delete),
			"OPTIONS" => Ok(Method::Options),
			"PATCH" => Ok(Method::Patch),
			other => Err(Error::UnknownMethod(other.to_string())),
		}
	}
}

impl fmt::Display for Method {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

// Variables //
//***********//
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarSource {
	Get,
	Post,
	Put,
	Patch,
	Delete,
}

impl VarSource {
	pub fn as_str(self) -> &'static str {
		match self {
			VarSource::Get => "GET",
			VarSource::Post => "POST",
			VarSource::Put => "PUT",
			VarSource::Patch => "PATCH",
			VarSource::Delete => "DELETE",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarValue {
	Str(String),
	List(Vec<String>),
}

impl VarValue {
	pub fn as_str(&self) -> Option<&str> {
		match self {
			VarValue::Str(s) => Some(s),
			VarValue::List(_) => None,
		}
	}

	/// Empty string, `"0"` and the empty list count as empty
	pub fn is_empty(&self) -> bool {
		match self {
			VarValue::Str(s) => s.is_empty() || s == "0",
			VarValue::List(list) => list.is_empty(),
		}
	}
}

impl From<&str> for VarValue {
	fn from(value: &str) -> Self {
		VarValue::Str(value.to_string())
	}
}

impl From<String> for VarValue {
	fn from(value: String) -> Self {
		VarValue::Str(value)
	}
}

pub type Vars = BTreeMap<String, VarValue>;

/// Parse `application/x-www-form-urlencoded` text. Keys ending in `[]` collect into a
/// list under the bare name; for other repeated keys the last one wins.
pub fn parse_form(text: &str) -> ClResult<Vars> {
	let pairs: Vec<(String, String)> = serde_urlencoded::from_str(text).map_err(|_| Error::Parse)?;
	let mut vars = Vars::new();
	for (key, value) in pairs {
		push_var(&mut vars, &key, value);
	}
	Ok(vars)
}

/// Flatten a JSON object into variables. Scalars become strings, arrays of scalars
/// become lists, nested objects are kept as their JSON text.
pub fn parse_json(value: &serde_json::Value) -> ClResult<Vars> {
	let serde_json::Value::Object(map) = value else {
		return Err(Error::Parse);
	};
	let mut vars = Vars::new();
	for (key, value) in map {
		let var = match value {
			serde_json::Value::Array(items) => VarValue::List(items.iter().map(json_scalar).collect()),
			other => VarValue::Str(json_scalar(other)),
		};
		vars.insert(key.clone(), var);
	}
	Ok(vars)
}

fn json_scalar(value: &serde_json::Value) -> String {
	match value {
		serde_json::Value::Null => String::new(),
		serde_json::Value::Bool(true) => "1".into(),
		serde_json::Value::Bool(false) => String::new(),
		serde_json::Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

fn push_var(vars: &mut Vars, key: &str, value: String) {
	if let Some(name) = key.strip_suffix("[]") {
		let slot = vars.entry(name.to_string()).or_insert_with(|| VarValue::List(Vec::new()));
		if let VarValue::List(list) = &mut *slot {
			list.push(value);
		} else {
			*slot = VarValue::List(vec![value]);
		}
	} else {
		vars.insert(key.to_string(), VarValue::Str(value));
	}
}

// Url //
//*****//
/// Normalise a url path. The result starts with exactly one `/`, has no empty or `.`
/// segments, no trailing slash (except the root) and no query part. Applying it twice
/// gives the same result as applying it once.
pub fn sanitize_url(url: &str) -> String {
	let path = match url.find(['?', '&']) {
		Some(pos) => &url[..pos],
		None => url,
	};
	let mut segments: Vec<&str> = path.split('/').filter(|seg| !seg.is_empty() && *seg != ".").collect();
	// the front controller itself addresses the root
	if segments.last() == Some(&"index.php") {
		segments.clear();
	}
	let mut out = String::with_capacity(path.len() + 1);
	for seg in &segments {
		out.push('/');
		out.push_str(seg);
	}
	if out.is_empty() {
		out.push('/');
	}
	out
}

// Request //
//*********//
#[derive(Debug, Clone)]
pub struct Request {
	url: String,
	method: Method,
	module: Option<String>,
	commands: VecDeque<String>,
	last_command: Option<String>,
	vars: Vars,
	get_vars: Vars,
	post_vars: Vars,
	put_vars: Vars,
	patch_vars: Vars,
	delete_vars: Vars,
	data: Option<String>,
	ajax: bool,
}

impl Request {
	pub fn new(url: &str, method: Method) -> Self {
		let mut req = Request {
			url: sanitize_url(url),
			method,
			module: None,
			commands: VecDeque::new(),
			last_command: None,
			vars: Vars::new(),
			get_vars: Vars::new(),
			post_vars: Vars::new(),
			put_vars: Vars::new(),
			patch_vars: Vars::new(),
			delete_vars: Vars::new(),
			data: None,
			ajax: false,
		};
		req.build_commands();
		req
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	pub fn set_url(&mut self, url: &str) {
		self.url = sanitize_url(url);
		self.build_commands();
	}

	// Method
	//********
	pub fn method(&self) -> Method {
		self.method
	}

	/// Accepts the seven supported verbs only
	pub fn set_method(&mut self, method: &str) -> ClResult<()> {
		self.method = method.parse()?;
		Ok(())
	}

	pub fn is_get(&self) -> bool {
		self.method == Method::Get
	}

	pub fn is_post(&self) -> bool {
		self.method == Method::Post
	}

	pub fn is_put(&self) -> bool {
		self.method == Method::Put
	}

	pub fn is_patch(&self) -> bool {
		self.method == Method::Patch
	}

	pub fn is_delete(&self) -> bool {
		self.method == Method::Delete
	}

	// Module and commands
	//*********************
	pub fn module(&self) -> Option<&str> {
		self.module.as_deref()
	}

	pub fn set_module(&mut self, module: &str) {
		self.module = Some(module.to_string());
		self.build_commands();
	}

	/// Rebuild the command stack from the url. A leading token naming the module is
	/// not a command.
	pub fn build_commands(&mut self) {
		let mut tokens = self.url.split('/').filter(|t| !t.is_empty()).peekable();
		if let (Some(first), Some(module)) = (tokens.peek(), self.module.as_deref()) {
			if *first == module {
				tokens.next();
			}
		}
		self.commands = tokens.map(str::to_string).collect();
	}

	pub fn commands(&self) -> impl Iterator<Item = &str> {
		self.commands.iter().map(String::as_str)
	}

	pub fn shift_command(&mut self) -> Option<String> {
		self.last_command = self.commands.pop_front();
		self.last_command.clone()
	}

	pub fn last_command(&self) -> Option<&str> {
		self.last_command.as_deref()
	}

	/// First path segment, or `/` for the root
	pub fn current_token(&self) -> &str {
		self.url.trim_start_matches('/').split('/').next().filter(|t| !t.is_empty()).unwrap_or("/")
	}

	// Merged request variables
	//**************************
	/// Replace the merged variables. A `module` variable selects the module.
	pub fn set_vars(&mut self, vars: Vars) {
		let module = vars.get("module").and_then(VarValue::as_str).map(str::to_string);
		self.vars = vars;
		if let Some(module) = module {
			self.set_module(&module);
		}
	}

	pub fn set_var(&mut self, name: &str, value: impl Into<VarValue>) {
		self.vars.insert(name.to_string(), value.into());
	}

	pub fn vars(&self) -> &Vars {
		&self.vars
	}

	pub fn is_var(&self, name: &str) -> bool {
		self.vars.contains_key(name)
	}

	/// Present but empty (`""`, `"0"` or an empty list)
	pub fn is_empty(&self, name: &str) -> bool {
		self.vars.get(name).is_some_and(VarValue::is_empty)
	}

	pub fn var(&self, name: &str) -> ClResult<&VarValue> {
		self.vars.get(name).ok_or_else(|| Error::ValueNotSet(name.to_string()))
	}

	pub fn var_or<'a>(&'a self, name: &str, default: &'a VarValue) -> &'a VarValue {
		self.vars.get(name).unwrap_or(default)
	}

	// Per-verb variables
	//********************
	fn bag(&self, source: VarSource) -> &Vars {
		match source {
			VarSource::Get => &self.get_vars,
			VarSource::Post => &self.post_vars,
			VarSource::Put => &self.put_vars,
			VarSource::Patch => &self.patch_vars,
			VarSource::Delete => &self.delete_vars,
		}
	}

	pub fn set_source_vars(&mut self, source: VarSource, vars: Vars) {
		let bag = match source {
			VarSource::Get => &mut self.get_vars,
			VarSource::Post => &mut self.post_vars,
			VarSource::Put => &mut self.put_vars,
			VarSource::Patch => &mut self.patch_vars,
			VarSource::Delete => &mut self.delete_vars,
		};
		*bag = vars;
	}

	pub fn is_set(&self, source: VarSource, name: &str) -> bool {
		self.bag(source).contains_key(name)
	}

	/// Unfiltered value; a missing key is a `ValueNotSet` error
	pub fn pull_var(&self, source: VarSource, name: &str) -> ClResult<&VarValue> {
		self.bag(source).get(name).ok_or_else(|| Error::ValueNotSet(name.to_string()))
	}

	pub fn pull_var_if_set(&self, source: VarSource, name: &str) -> Option<&VarValue> {
		self.bag(source).get(name)
	}

	pub fn pull_vars(&self, source: VarSource) -> &Vars {
		self.bag(source)
	}

	/// The GET variables plus the bag matching the request method
	pub fn list_vars(&self) -> BTreeMap<&'static str, &Vars> {
		let mut list = BTreeMap::new();
		list.insert(VarSource::Get.as_str(), &self.get_vars);
		if let Some(source) = self.method.body_source() {
			list.insert(source.as_str(), self.bag(source));
		}
		list
	}

	fn pull_with<T>(
		&self,
		source: VarSource,
		name: &str,
		test_isset: bool,
		coerce: impl FnOnce(&VarValue) -> Option<T>,
	) -> ClResult<Option<T>> {
		match self.bag(source).get(name) {
			Some(value) => Ok(coerce(value)),
			None if test_isset => Ok(None),
			None => Err(Error::ValueNotSet(name.to_string())),
		}
	}

	/// Filtered string. With `test_isset` a missing key yields `Ok(None)`, otherwise
	/// it is an error.
	pub fn pull_string(
		&self,
		source: VarSource,
		name: &str,
		test_isset: bool,
	) -> ClResult<Option<String>> {
		self.pull_with(source, name, test_isset, |v| v.as_str().map(filter_string))
	}

	pub fn pull_boolean(
		&self,
		source: VarSource,
		name: &str,
		test_isset: bool,
	) -> ClResult<Option<bool>> {
		self.pull_with(source, name, test_isset, |v| v.as_str().and_then(filter_boolean))
	}

	pub fn pull_integer(
		&self,
		source: VarSource,
		name: &str,
		test_isset: bool,
	) -> ClResult<Option<i64>> {
		self.pull_with(source, name, test_isset, |v| v.as_str().and_then(filter_integer))
	}

	pub fn pull_float(
		&self,
		source: VarSource,
		name: &str,
		test_isset: bool,
	) -> ClResult<Option<f64>> {
		self.pull_with(source, name, test_isset, |v| v.as_str().and_then(filter_float))
	}

	/// List variable with every element filtered; a plain string is not an array
	pub fn pull_array(
		&self,
		source: VarSource,
		name: &str,
		test_isset: bool,
	) -> ClResult<Option<Vec<String>>> {
		self.pull_with(source, name, test_isset, |v| match v {
			VarValue::List(list) => Some(list.iter().map(|s| filter_string(s)).collect()),
			VarValue::Str(_) => None,
		})
	}

	// Body
	//******
	pub fn set_data(&mut self, data: Option<String>) {
		self.data = data;
	}

	pub fn raw_data(&self) -> Option<&str> {
		self.data.as_deref()
	}

	pub fn json_data(&self) -> ClResult<serde_json::Value> {
		let data = self.data.as_deref().ok_or(Error::Parse)?;
		Ok(serde_json::from_str(data)?)
	}

	pub fn set_ajax(&mut self, ajax: bool) {
		self.ajax = ajax;
	}

	/// Sent with `X-Requested-With: XMLHttpRequest`
	pub fn is_ajax(&self) -> bool {
		self.ajax
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn form(text: &str) -> Vars {
		parse_form(text).unwrap_or_default()
	}

	#[test]
	fn test_sanitize_url() {
		assert_eq!(sanitize_url("/a/./b/"), "/a/b");
		assert_eq!(sanitize_url("a//b"), "/a/b");
		assert_eq!(sanitize_url("./a/."), "/a");
		assert_eq!(sanitize_url("/users/list?page=2"), "/users/list");
		assert_eq!(sanitize_url("/users&x=1"), "/users");
		assert_eq!(sanitize_url("/a/?x=1"), "/a");
		assert_eq!(sanitize_url(""), "/");
		assert_eq!(sanitize_url("///"), "/");
		assert_eq!(sanitize_url("/site/index.php"), "/");
		assert_eq!(sanitize_url("foo/index.php/"), "/");
		assert_eq!(sanitize_url("/myindex.php"), "/myindex.php");
	}

	#[test]
	fn test_sanitize_url_is_idempotent() {
		let samples = [
			"", "/", "//", "./", "/./", "a", "/a/", "a/./b//c/.", "//mod//./tab/", "/x?y=1",
			"/a/?x=1", "/./././", "/a/../b", ".hidden/./x", "/index.php", "&only",
			"foo/index.php/", "/a/index.php/.", "a//index.php?x=1", "/index.php.bak",
		];
		for url in samples {
			let once = sanitize_url(url);
			assert_eq!(sanitize_url(&once), once, "{:?}", url);
			assert!(once.starts_with('/'), "{:?}", url);
			assert!(!once.starts_with("//"), "{:?}", url);
			assert!(once == "/" || !once.ends_with('/'), "{:?}", url);
		}
	}

	#[test]
	fn test_commands_skip_module_token() {
		let mut req = Request::new("//mod//./tab/", Method::Get);
		req.set_module("mod");
		assert_eq!(req.url(), "/mod/tab");
		assert_eq!(req.commands().collect::<Vec<_>>(), vec!["tab"]);

		assert_eq!(req.shift_command().as_deref(), Some("tab"));
		assert_eq!(req.last_command(), Some("tab"));
		assert_eq!(req.shift_command(), None);
		assert_eq!(req.last_command(), None);
	}

	#[test]
	fn test_root_has_no_commands() {
		let req = Request::new("/", Method::Get);
		assert_eq!(req.commands().count(), 0);
		assert_eq!(req.current_token(), "/");

		let req = Request::new("/users/list", Method::Get);
		assert_eq!(req.current_token(), "users");
	}

	#[test]
	fn test_module_var_selects_module() {
		let mut req = Request::new("/users/edit/5", Method::Get);
		req.set_vars(form("module=users&x=1"));
		assert_eq!(req.module(), Some("users"));
		assert_eq!(req.commands().collect::<Vec<_>>(), vec!["edit", "5"]);
	}

	#[test]
	fn test_set_method() {
		let mut req = Request::new("/", Method::Get);
		assert!(req.set_method("PATCH").is_ok());
		assert!(req.is_patch());
		assert!(matches!(req.set_method("BREW"), Err(Error::UnknownMethod(_))));
		assert!(req.is_patch());
	}

	#[test]
	fn test_merged_vars() {
		let mut req = Request::new("/", Method::Get);
		req.set_vars(form("a=1&b=&c=0&d=x"));
		assert!(req.is_var("a"));
		assert!(!req.is_var("z"));
		assert!(req.is_empty("b"));
		assert!(req.is_empty("c"));
		assert!(!req.is_empty("d"));
		assert!(!req.is_empty("z"));
		assert!(matches!(req.var("z"), Err(Error::ValueNotSet(name)) if name == "z"));
		let default = VarValue::from("dflt");
		assert_eq!(req.var_or("z", &default), &default);
	}

	#[test]
	fn test_pull_presence_contract() {
		let mut req = Request::new("/", Method::Post);
		req.set_source_vars(VarSource::Post, form("name=%3Cb%3EJoe%3C%2Fb%3E&age=42&bad=4x"));

		assert_eq!(req.pull_string(VarSource::Post, "missing", true).ok(), Some(None));
		assert!(matches!(
			req.pull_string(VarSource::Post, "missing", false),
			Err(Error::ValueNotSet(_))
		));
		assert_eq!(
			req.pull_string(VarSource::Post, "name", false).ok().flatten().as_deref(),
			Some("&lt;b&gt;Joe&lt;/b&gt;")
		);
		assert_eq!(req.pull_integer(VarSource::Post, "age", false).ok(), Some(Some(42)));
		assert_eq!(req.pull_integer(VarSource::Post, "bad", false).ok(), Some(None));
		// present in POST only
		assert!(req.pull_integer(VarSource::Get, "age", false).is_err());
	}

	#[test]
	fn test_pull_typed_values() {
		let mut req = Request::new("/", Method::Put);
		req.set_source_vars(VarSource::Put, form("flag=on&off=no&ratio=0.25&ids[]=1&ids[]=%3Ci%3E2"));
		assert_eq!(req.pull_boolean(VarSource::Put, "flag", false).ok(), Some(Some(true)));
		assert_eq!(req.pull_boolean(VarSource::Put, "off", false).ok(), Some(Some(false)));
		assert_eq!(req.pull_boolean(VarSource::Put, "ratio", false).ok(), Some(None));
		assert_eq!(req.pull_float(VarSource::Put, "ratio", false).ok(), Some(Some(0.25)));
		assert_eq!(
			req.pull_array(VarSource::Put, "ids", false).ok(),
			Some(Some(vec!["1".to_string(), "&lt;i&gt;2".to_string()]))
		);
		assert_eq!(req.pull_array(VarSource::Put, "flag", false).ok(), Some(None));
		assert_eq!(req.pull_string(VarSource::Put, "ids", false).ok(), Some(None));
	}

	#[test]
	fn test_list_vars_follows_method() {
		let mut req = Request::new("/", Method::Delete);
		req.set_source_vars(VarSource::Get, form("a=1"));
		req.set_source_vars(VarSource::Delete, form("b=2"));
		req.set_source_vars(VarSource::Post, form("c=3"));
		let list = req.list_vars();
		assert_eq!(list.keys().copied().collect::<Vec<_>>(), vec!["DELETE", "GET"]);
		assert!(req.pull_var_if_set(VarSource::Post, "c").is_some());
	}

	#[test]
	fn test_parse_json_vars() {
		let value = serde_json::json!({ "title": "Home", "on": true, "n": 5, "tags": ["a", 1] });
		let vars = parse_json(&value).unwrap_or_default();
		assert_eq!(vars.get("title"), Some(&VarValue::from("Home")));
		assert_eq!(vars.get("on"), Some(&VarValue::from("1")));
		assert_eq!(vars.get("n"), Some(&VarValue::from("5")));
		assert_eq!(vars.get("tags"), Some(&VarValue::List(vec!["a".into(), "1".into()])));
		assert!(parse_json(&serde_json::json!([1, 2])).is_err());
	}

	#[test]
	fn test_json_data() {
		let mut req = Request::new("/", Method::Post);
		assert!(req.json_data().is_err());
		req.set_data(Some("{\"a\":1}".into()));
		assert_eq!(req.json_data().ok(), Some(serde_json::json!({ "a": 1 })));
		assert_eq!(req.raw_data(), Some("{\"a\":1}"));
	}
}

// vim: ts=4
