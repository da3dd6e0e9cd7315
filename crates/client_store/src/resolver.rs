//! Route-to-module resolution.
//!
//! The route table is static and ordered; every entry whose pattern matches
//! the pathname contributes a resolution (routes are independent panels, so
//! several may match at once). A route's decision is a returned value, never
//! a thrown signal: either a module to mount, a no-op placeholder, or a
//! redirect that short-circuits navigation.

use std::{collections::BTreeMap, sync::Arc};

use tracing::debug;

use shared::error::{AppError, REDIRECT_MOVED};

use crate::ModuleModel;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Mount the identified feature module.
    Module(&'static str),
    /// Route is valid but mounts nothing (e.g. a static panel).
    Placeholder,
    /// Short-circuit navigation toward another path.
    Redirect { code: &'static str, to: String },
}

pub type DecideFn = Arc<dyn Fn() -> RouteDecision + Send + Sync>;

pub struct RouteEntry {
    pub path: &'static str,
    pub exact: bool,
    decide: DecideFn,
}

impl RouteEntry {
    pub fn new(
        path: &'static str,
        exact: bool,
        decide: impl Fn() -> RouteDecision + Send + Sync + 'static,
    ) -> Self {
        Self {
            path,
            exact,
            decide: Arc::new(decide),
        }
    }
}

/// Exact or prefix-on-segment-boundary match, trailing slashes ignored.
pub fn match_path(pathname: &str, path: &str, exact: bool) -> bool {
    let normalize = |p: &str| {
        let trimmed = p.trim_end_matches('/');
        if trimmed.is_empty() {
            "/".to_string()
        } else {
            trimmed.to_string()
        }
    };
    let pathname = normalize(pathname);
    let path = normalize(path);
    if exact {
        return pathname == path;
    }
    if path == "/" {
        return true;
    }
    pathname == path
        || (pathname.starts_with(&path) && pathname.as_bytes().get(path.len()) == Some(&b'/'))
}

#[derive(Clone)]
pub struct Resolution {
    /// Pattern that matched; `None` for the synthesized not-found fallback.
    pub path: Option<&'static str>,
    pub decision: RouteDecision,
}

/// Evaluate the table against a pathname. Always returns at least one
/// resolution: an empty match set synthesizes a single redirect to the
/// not-found destination. Route deciders run only for matched entries, so
/// module loading stays lazy.
pub fn resolve(pathname: &str, table: &[RouteEntry], not_found_url: &str) -> Vec<Resolution> {
    let mut resolutions: Vec<Resolution> = table
        .iter()
        .filter(|entry| match_path(pathname, entry.path, entry.exact))
        .map(|entry| Resolution {
            path: Some(entry.path),
            decision: (entry.decide)(),
        })
        .collect();

    if resolutions.is_empty() {
        debug!(pathname, "no route matched, synthesizing not-found redirect");
        resolutions.push(Resolution {
            path: None,
            decision: RouteDecision::Redirect {
                code: REDIRECT_MOVED,
                to: not_found_url.to_string(),
            },
        });
    }

    resolutions
}

pub type ModuleLoader = Arc<dyn Fn() -> Arc<dyn ModuleModel> + Send + Sync>;

/// Explicit registry mapping module ids to loader closures. Loaders run only
/// when the resolver actually selects the module for a matching route.
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    loaders: BTreeMap<&'static str, ModuleLoader>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        mut self,
        id: &'static str,
        loader: impl Fn() -> Arc<dyn ModuleModel> + Send + Sync + 'static,
    ) -> Self {
        self.loaders.insert(id, Arc::new(loader));
        self
    }

    pub fn load(&self, id: &str) -> Result<Arc<dyn ModuleModel>, AppError> {
        match self.loaders.get(id) {
            Some(loader) => Ok(loader()),
            None => Err(AppError::new(
                "module_missing",
                format!("no loader registered for module '{id}'"),
            )),
        }
    }
}
