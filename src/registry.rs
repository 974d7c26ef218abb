//! Process-wide operator registry.
//!
//! Sessions resolve every node's `(domain, op_type)` pair here while they
//! are built. Built-in operators live in the empty domain and are installed
//! the first time the registry is touched; custom operators arrive either
//! from a loaded extension library or from in-process registration. The
//! registry lives for the process, matching the lifetime of any loaded
//! extension code backing its entries.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::debug;

use crate::errors::{ExtensionError, ExtensionResult};
use crate::ops::add::AddFactory;
use crate::ops::identity::IdentityFactory;
use crate::ops::mul::MulFactory;
use crate::ops::relu::ReluFactory;
use crate::ops::scale::ScaleFactory;
use crate::ops::OperatorFactory;

/// Domain of the built-in operators.
pub const BUILTIN_DOMAIN: &str = "";

type OperatorKey = (String, String);
type OperatorMap = HashMap<OperatorKey, Arc<dyn OperatorFactory>>;

static REGISTRY: OnceLock<RwLock<OperatorMap>> = OnceLock::new();

fn builtin_operators() -> OperatorMap {
    let mut operators: OperatorMap = HashMap::new();
    let builtins: [(&str, Arc<dyn OperatorFactory>); 5] = [
        ("Identity", Arc::new(IdentityFactory)),
        ("Add", Arc::new(AddFactory)),
        ("Mul", Arc::new(MulFactory)),
        ("Relu", Arc::new(ReluFactory)),
        ("Scale", Arc::new(ScaleFactory)),
    ];
    for (op_type, factory) in builtins {
        operators.insert((BUILTIN_DOMAIN.to_string(), op_type.to_string()), factory);
    }
    operators
}

fn read_registry() -> RwLockReadGuard<'static, OperatorMap> {
    let lock = REGISTRY.get_or_init(|| RwLock::new(builtin_operators()));
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_registry() -> RwLockWriteGuard<'static, OperatorMap> {
    let lock = REGISTRY.get_or_init(|| RwLock::new(builtin_operators()));
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Registers a custom operator under `(domain, op_type)`.
///
/// Registering the same pair twice is an error: two implementations for one
/// operator name would make model binding ambiguous.
pub fn register_custom_operator(
    domain: &str,
    op_type: &str,
    factory: Arc<dyn OperatorFactory>,
) -> ExtensionResult<()> {
    let mut operators = write_registry();
    let key = (domain.to_string(), op_type.to_string());
    if operators.contains_key(&key) {
        return Err(ExtensionError::DuplicateOperator {
            domain: domain.to_string(),
            op_type: op_type.to_string(),
        });
    }
    operators.insert(key, factory);
    debug!("registered custom operator '{op_type}' in domain '{domain}'");
    Ok(())
}

/// Looks up the factory for `(domain, op_type)`, if one is registered.
pub fn resolve(domain: &str, op_type: &str) -> Option<Arc<dyn OperatorFactory>> {
    let operators = read_registry();
    operators
        .get(&(domain.to_string(), op_type.to_string()))
        .cloned()
}

/// Whether `(domain, op_type)` is currently registered.
pub fn is_registered(domain: &str, op_type: &str) -> bool {
    let operators = read_registry();
    operators.contains_key(&(domain.to_string(), op_type.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        for op_type in ["Identity", "Add", "Mul", "Relu", "Scale"] {
            assert!(is_registered(BUILTIN_DOMAIN, op_type), "{op_type} missing");
        }
    }

    #[test]
    fn unknown_operator_resolves_to_none() {
        assert!(resolve(BUILTIN_DOMAIN, "Conv").is_none());
        assert!(resolve("unknown.domain", "Identity").is_none());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        register_custom_operator("registry.test", "Identity", Arc::new(IdentityFactory))
            .expect("first registration succeeds");
        let result =
            register_custom_operator("registry.test", "Identity", Arc::new(IdentityFactory));
        assert!(matches!(
            result,
            Err(ExtensionError::DuplicateOperator { domain, op_type })
                if domain == "registry.test" && op_type == "Identity"
        ));
    }

    #[test]
    fn builtin_names_are_free_in_other_domains() {
        register_custom_operator("registry.test.shadow", "Relu", Arc::new(ReluFactory))
            .expect("same op_type in another domain is distinct");
        assert!(is_registered("registry.test.shadow", "Relu"));
        assert!(is_registered(BUILTIN_DOMAIN, "Relu"));
    }
}
