//! External metadata bridge.
//!
//! A read-only view over host-platform library metadata. The resolver only
//! consumes it; readers for real host metadata live outside this workspace.
//! "Not found" is an ordinary answer, never an internal error.

use rustc_hash::FxHashMap;
use serde::Serialize;

/// A host-platform function signature. Type names are host names that map
/// onto intrinsic types by name (`U8`, `I32`, `String`, ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ExternalFunction {
    /// Fully qualified name, e.g. `System.Console.WriteLine`.
    pub qualified_name: String,
    pub params: Vec<String>,
    pub return_type: String,
}

impl ExternalFunction {
    pub fn new(qualified_name: &str, params: &[&str], return_type: &str) -> Self {
        ExternalFunction {
            qualified_name: qualified_name.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            return_type: return_type.to_string(),
        }
    }

    pub fn short_name(&self) -> &str {
        self.qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.qualified_name)
    }
}

/// A host-platform module (class/namespace member container).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExternalModule {
    pub qualified_name: String,
    pub functions: Vec<ExternalFunction>,
}

impl ExternalModule {
    pub fn short_name(&self) -> &str {
        self.qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.qualified_name)
    }

    pub fn namespace(&self) -> &str {
        self.qualified_name
            .rsplit_once('.')
            .map(|(ns, _)| ns)
            .unwrap_or("")
    }

    /// Functions with the given short name, in metadata order.
    pub fn functions_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ExternalFunction> {
        self.functions.iter().filter(move |f| f.short_name() == name)
    }
}

pub trait MetadataBridge: Send + Sync {
    fn try_lookup_module(&self, qualified_name: &str) -> Option<ExternalModule>;

    /// All modules directly inside namespace `ns`.
    fn lookup_namespace(&self, ns: &str) -> Vec<ExternalModule>;

    /// An operator implementation such as `op_Addition(Money, Money) -> Money`.
    /// `return_type` of `None` accepts any return type.
    fn try_lookup_operator_function(
        &self,
        symbol: &str,
        return_type: Option<&str>,
        param_types: &[&str],
    ) -> Option<ExternalFunction>;
}

/// A bridge that knows nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoExternalMetadata;

impl MetadataBridge for NoExternalMetadata {
    fn try_lookup_module(&self, _qualified_name: &str) -> Option<ExternalModule> {
        None
    }

    fn lookup_namespace(&self, _ns: &str) -> Vec<ExternalModule> {
        Vec::new()
    }

    fn try_lookup_operator_function(
        &self,
        _symbol: &str,
        _return_type: Option<&str>,
        _param_types: &[&str],
    ) -> Option<ExternalFunction> {
        None
    }
}

/// Bridge backed by metadata registered up front.
#[derive(Clone, Debug, Default)]
pub struct InMemoryMetadata {
    modules: FxHashMap<String, ExternalModule>,
    operators: Vec<ExternalFunction>,
}

impl InMemoryMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, qualified_name: &str, functions: Vec<ExternalFunction>) -> Self {
        self.modules.insert(
            qualified_name.to_string(),
            ExternalModule {
                qualified_name: qualified_name.to_string(),
                functions,
            },
        );
        self
    }

    pub fn with_operator(mut self, function: ExternalFunction) -> Self {
        self.operators.push(function);
        self
    }
}

impl MetadataBridge for InMemoryMetadata {
    fn try_lookup_module(&self, qualified_name: &str) -> Option<ExternalModule> {
        self.modules.get(qualified_name).cloned()
    }

    fn lookup_namespace(&self, ns: &str) -> Vec<ExternalModule> {
        let mut found: Vec<ExternalModule> = self
            .modules
            .values()
            .filter(|m| m.namespace() == ns)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));
        found
    }

    fn try_lookup_operator_function(
        &self,
        symbol: &str,
        return_type: Option<&str>,
        param_types: &[&str],
    ) -> Option<ExternalFunction> {
        self.operators
            .iter()
            .find(|f| {
                f.short_name() == symbol
                    && return_type.is_none_or(|ret| f.return_type == ret)
                    && f.params.len() == param_types.len()
                    && f.params.iter().zip(param_types).all(|(p, a)| p == a)
            })
            .cloned()
    }
}
