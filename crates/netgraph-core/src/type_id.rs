//! TypeId and TypeRegistry for nominal node typing.
//!
//! Every domain node type (module, interface, component, signal, ...) gets a
//! unique [`TypeId`] providing O(1) identity comparison. The [`TypeRegistry`]
//! precomputes the full ancestor set of each type at registration time, so
//! subclass/capability checks are O(1) set membership rather than a per-call
//! reflective walk. The registry is an explicit object owned by the store --
//! there is no process-wide memoized type lookup.
//!
//! The engine treats node payloads as opaque; the registry exists purely so
//! hierarchy queries can filter by type and so collaborators can mark a
//! distinguished *module-interface* capability used by built-in checks.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Unique identifier for a registered node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl TypeId {
    /// The pre-registered root type every other type descends from.
    pub const NODE: TypeId = TypeId(0);
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Per-type record: name plus the precomputed transitive ancestor set
/// (always contains the type itself and [`TypeId::NODE`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TypeInfo {
    name: String,
    ancestors: HashSet<TypeId>,
}

/// Registry of node types, providing nominal identity and O(1) subclass
/// checks via precomputed ancestor-id sets.
///
/// On construction, `TypeId(0)` = the root `node` type is pre-registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRegistry {
    /// Types indexed by TypeId.0
    types: Vec<TypeInfo>,
    /// Name -> TypeId lookup.
    names: HashMap<String, TypeId>,
    /// The distinguished module-interface capability, if assigned.
    module_interface: Option<TypeId>,
}

impl TypeRegistry {
    /// Creates a registry with the root `node` type pre-registered.
    pub fn new() -> Self {
        let root = TypeInfo {
            name: "node".to_string(),
            ancestors: HashSet::from([TypeId::NODE]),
        };
        TypeRegistry {
            types: vec![root],
            names: HashMap::from([("node".to_string(), TypeId::NODE)]),
            module_interface: None,
        }
    }

    /// Registers a type with the given base types and returns its [`TypeId`].
    ///
    /// The new type's ancestor set is the union of all bases' ancestor sets
    /// plus the type itself, computed once here so [`is_subclass`](Self::is_subclass)
    /// stays O(1). Unknown base ids are ignored.
    ///
    /// Returns [`GraphError::DuplicateTypeName`] if the name is taken.
    pub fn register(&mut self, name: &str, bases: &[TypeId]) -> Result<TypeId, GraphError> {
        if self.names.contains_key(name) {
            return Err(GraphError::DuplicateTypeName {
                name: name.to_string(),
            });
        }

        let id = TypeId(self.types.len() as u32);
        let mut ancestors = HashSet::from([id, TypeId::NODE]);
        for base in bases {
            if let Some(info) = self.types.get(base.0 as usize) {
                ancestors.extend(info.ancestors.iter().copied());
            }
        }

        self.types.push(TypeInfo {
            name: name.to_string(),
            ancestors,
        });
        self.names.insert(name.to_string(), id);
        Ok(id)
    }

    /// Returns the name of a type, or `"node"` for unknown ids.
    pub fn name(&self, id: TypeId) -> &str {
        self.types
            .get(id.0 as usize)
            .map(|t| t.name.as_str())
            .unwrap_or("node")
    }

    /// Looks up a type's [`TypeId`] by name.
    pub fn get_by_name(&self, name: &str) -> Option<TypeId> {
        self.names.get(name).copied()
    }

    /// O(1): is `ty` the same as or a descendant of `ancestor`?
    pub fn is_subclass(&self, ty: TypeId, ancestor: TypeId) -> bool {
        self.types
            .get(ty.0 as usize)
            .map(|t| t.ancestors.contains(&ancestor))
            .unwrap_or(false)
    }

    /// O(n) in the candidate list: is `ty` a subclass of any of `ancestors`?
    pub fn is_subclass_any(&self, ty: TypeId, ancestors: &[TypeId]) -> bool {
        ancestors.iter().any(|a| self.is_subclass(ty, *a))
    }

    /// Marks `id` as the distinguished module-interface capability.
    pub fn set_module_interface(&mut self, id: TypeId) {
        self.module_interface = Some(id);
    }

    /// Returns the module-interface capability type, if assigned.
    pub fn module_interface(&self) -> Option<TypeId> {
        self.module_interface
    }

    /// Is `ty` a subclass of the module-interface capability?
    ///
    /// `false` when no capability has been assigned.
    pub fn is_module_interface(&self, ty: TypeId) -> bool {
        self.module_interface
            .map(|mi| self.is_subclass(ty, mi))
            .unwrap_or(false)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
