//! View registry and request routing.
//!
//! Views are registered once at configuration time and never mutated
//! afterwards. Two matching modes exist, selected globally: literal
//! (exact-match on "METHOD path") and pattern (anchored regexes tried in
//! registration order, first match wins, capture groups become named path
//! parameters).

use std::collections::HashMap;

use regex::Regex;

use crate::config::ConfigError;
use crate::error::GatewayError;
use crate::http::request::Method;

/// Upper bound on a view's bound parameter names.
pub const MAX_BOUND_PARAMS: usize = 32;

/// How a view's result set is rendered.
#[derive(Debug, Clone)]
pub enum OutputFormat {
    /// CSV with an explicit, ordered column projection. The projection is
    /// independent of the database's column order.
    Csv { columns: Vec<String> },

    /// JSON. Columns named in `strings` are always emitted as JSON strings;
    /// all other values are type-sniffed.
    Json { strings: std::collections::HashSet<String> },
}

/// The path half of a view's route.
#[derive(Debug, Clone)]
pub enum PathMatcher {
    /// Exact path, no captures.
    Literal(String),

    /// Anchored regex; capture group `i` is bound to `params[i]`.
    Pattern { regex: Regex, params: Vec<String> },
}

impl PathMatcher {
    pub fn literal(path: impl Into<String>) -> Self {
        PathMatcher::Literal(path.into())
    }

    /// Compile an anchored pattern. The whole request path must match, and
    /// the pattern must declare exactly one name per capture group.
    pub fn pattern(pattern: &str, params: Vec<String>) -> Result<Self, ConfigError> {
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
            ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;

        let groups = regex.captures_len() - 1;
        if groups != params.len() {
            return Err(ConfigError::CaptureMismatch {
                pattern: pattern.to_string(),
                groups,
                params: params.len(),
            });
        }

        Ok(PathMatcher::Pattern { regex, params })
    }
}

/// A configured view: the binding of a route to a SQL statement and an
/// output format. Immutable after registration.
#[derive(Debug, Clone)]
pub struct View {
    pub method: Method,
    pub matcher: PathMatcher,
    pub sql: String,
    /// Bound parameter names, in placeholder order. Order is significant:
    /// the statement uses positional placeholders.
    pub bind: Vec<String>,
    pub format: OutputFormat,
}

/// Which matching mode a registry runs in. The modes are mutually exclusive
/// per configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Literal,
    Pattern,
}

/// A successful route resolution: the view plus any path captures.
pub struct ResolvedView<'a> {
    pub view: &'a View,
    /// Captured path parameters, in capture order. Inserted into the
    /// argument map after cookie/query/body aggregation, so they take
    /// highest precedence.
    pub captures: Vec<(String, String)>,
}

/// Holds the configured set of views and resolves requests against them.
pub struct ViewRegistry {
    mode: MatchMode,
    views: Vec<View>,
    /// Literal mode index: "METHOD path" to position in `views`.
    by_key: HashMap<String, usize>,
}

impl ViewRegistry {
    pub fn new(mode: MatchMode) -> Self {
        ViewRegistry {
            mode,
            views: Vec::new(),
            by_key: HashMap::new(),
        }
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Register a view. Registration order is preserved and decides pattern
    /// precedence. Re-registering a literal route replaces the earlier view.
    pub fn register(&mut self, view: View) -> Result<(), ConfigError> {
        if view.bind.len() > MAX_BOUND_PARAMS {
            return Err(ConfigError::TooManyParameters {
                sql: view.sql.clone(),
                count: view.bind.len(),
            });
        }

        match (self.mode, &view.matcher) {
            (MatchMode::Literal, PathMatcher::Literal(path)) => {
                let key = literal_key(view.method, path);
                self.by_key.insert(key, self.views.len());
                self.views.push(view);
            }
            (MatchMode::Pattern, PathMatcher::Pattern { .. }) => {
                self.views.push(view);
            }
            (_, matcher) => {
                return Err(ConfigError::MatcherMode {
                    path: matcher_path(matcher),
                });
            }
        }
        Ok(())
    }

    /// Resolve a request to exactly one view.
    pub fn resolve(&self, method: Method, path: &str) -> Result<ResolvedView<'_>, GatewayError> {
        match self.mode {
            MatchMode::Literal => {
                let idx = self
                    .by_key
                    .get(&literal_key(method, path))
                    .ok_or(GatewayError::NotFound)?;
                Ok(ResolvedView {
                    view: &self.views[*idx],
                    captures: Vec::new(),
                })
            }
            MatchMode::Pattern => {
                // First match wins, not best match; registration order is
                // the precedence order.
                for view in &self.views {
                    if view.method != method {
                        continue;
                    }
                    let PathMatcher::Pattern { regex, params } = &view.matcher else {
                        continue;
                    };
                    if let Some(caps) = regex.captures(path) {
                        let captures = params
                            .iter()
                            .enumerate()
                            .filter_map(|(i, name)| {
                                caps.get(i + 1).map(|m| (name.clone(), m.as_str().to_string()))
                            })
                            .collect();
                        return Ok(ResolvedView { view, captures });
                    }
                }
                Err(GatewayError::NotFound)
            }
        }
    }
}

fn literal_key(method: Method, path: &str) -> String {
    format!("{method} {path}")
}

fn matcher_path(matcher: &PathMatcher) -> String {
    match matcher {
        PathMatcher::Literal(path) => path.clone(),
        PathMatcher::Pattern { regex, .. } => regex.as_str().to_string(),
    }
}
