//! Wrap status inspection
//!
//! Reports whether a value and its reachable wrappable descendants carry a
//! given wrapper layer. The walk reads through `peek`, so inspecting a
//! sandbox never stages a change, and keeps a visited set so cyclic graphs
//! terminate.

use serde::Serialize;
use std::collections::HashSet;
use tundra_value::{is_wrappable, ObjectId, Value, ViewKind};

/// How many descendants must match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Coverage {
    /// The root or at least one descendant
    Any,
    /// The root and every descendant
    #[default]
    Every,
}

/// Aggregate over wrappable descendants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PropertyStatus {
    /// All descendants match (vacuously true when there are none)
    pub every: bool,
    /// At least one descendant matches
    pub some: bool,
}

/// Result of [`status`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WrapStatus {
    /// The value itself matches
    pub root: bool,
    /// Descendant aggregate; `None` for opaque values
    pub properties: Option<PropertyStatus>,
}

impl WrapStatus {
    /// Root matches but some descendant does not
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.root && self.properties.is_some_and(|p| !p.every)
    }
}

/// Inspect wrap status
///
/// With `recursive` set every reachable wrappable descendant counts;
/// otherwise only direct children do. Logs a warning when the root matches
/// but the graph beneath it is only partially wrapped.
pub fn status(value: &Value, matches: impl Fn(&Value) -> bool, recursive: bool) -> WrapStatus {
    let root = matches(value);
    let properties = is_wrappable(value).then(|| {
        let mut walk = Walk {
            matches: &matches,
            recursive,
            visited: HashSet::new(),
            aggregate: PropertyStatus {
                every: true,
                some: false,
            },
        };
        if let Some(id) = value.object_id() {
            walk.visited.insert(id);
        }
        walk.visit(value);
        walk.aggregate
    });

    let status = WrapStatus { root, properties };
    if status.is_partial() {
        tracing::warn!(
            view = ?value.object_id(),
            kind = ?value.view_kind(),
            "Partially wrapped graph: nested values bypass the root's wrapper"
        );
    }
    status
}

struct Walk<'a, F> {
    matches: &'a F,
    recursive: bool,
    visited: HashSet<ObjectId>,
    aggregate: PropertyStatus,
}

impl<F: Fn(&Value) -> bool> Walk<'_, F> {
    fn visit(&mut self, value: &Value) {
        for (_, child) in value.entries() {
            if !is_wrappable(&child) {
                continue;
            }
            let hit = (self.matches)(&child);
            self.aggregate.every &= hit;
            self.aggregate.some |= hit;

            let fresh = child.object_id().is_some_and(|id| self.visited.insert(id));
            if self.recursive && fresh {
                self.visit(&child);
            }
        }
    }
}

fn is_sandbox_layer(value: &Value) -> bool {
    value.view_kind() == Some(ViewKind::Sandbox)
}

fn is_frost_layer(value: &Value) -> bool {
    value.is_view_of(ViewKind::Frost)
}

fn covered(status: WrapStatus, coverage: Coverage) -> bool {
    match coverage {
        Coverage::Every => status.root && status.properties.map_or(true, |p| p.every),
        Coverage::Any => status.root || status.properties.is_some_and(|p| p.some),
    }
}

/// Whether `value` is a sandbox (and, for [`Coverage::Every`], so is every
/// wrappable descendant)
#[must_use]
pub fn is_sandbox(value: &Value, coverage: Coverage) -> bool {
    covered(status(value, is_sandbox_layer, true), coverage)
}

/// Whether `value` is frosted, looking through sandbox layers
#[must_use]
pub fn is_frost(value: &Value, coverage: Coverage) -> bool {
    covered(status(value, is_frost_layer, true), coverage)
}

/// Whether any wrappable descendant is a sandbox
#[must_use]
pub fn contains_sandbox(value: &Value) -> bool {
    status(value, is_sandbox_layer, true)
        .properties
        .is_some_and(|p| p.some)
}

/// Whether any wrappable descendant is frosted
#[must_use]
pub fn contains_frost(value: &Value) -> bool {
    status(value, is_frost_layer, true)
        .properties
        .is_some_and(|p| p.some)
}
