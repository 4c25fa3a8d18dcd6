//! Activation checks of the module's own status class.
//!
//! The module UI calls a handful of static methods on a status class it
//! ships. Unhooked, they return defaults; hooked, they report that the
//! module is active and which engine runs it.

use super::{HookBridge, HookSet};
use snare_core::{ClassScope, HookCallback, MemberKind, Priority, Value};

/// Names of the status check methods.
pub struct StatusMethods;

impl StatusMethods {
    /// Returns `true` once hooked.
    pub const IS_ACTIVE: &'static str = "isActive";
    /// Returns the engine name.
    pub const EXECUTOR_NAME: &'static str = "getExecutorName";
    /// Returns the engine version.
    pub const EXECUTOR_VERSION: &'static str = "getExecutorVersion";
    /// Returns whether resource hooks are available.
    pub const HAS_RESOURCES_HOOK: &'static str = "hasResourcesHook";
}

impl HookBridge {
    /// Replace the status check methods of `class_name` in `scope`.
    ///
    /// Missing checks are skipped. Returns an empty set when the class is
    /// not present in `scope`.
    pub fn hook_module_status(
        &self,
        scope: &dyn ClassScope,
        class_name: &str,
        with_resources: bool,
    ) -> HookSet {
        let Some(ty) = scope.find_type(class_name) else {
            tracing::warn!(class = class_name, "module status class not found");
            return HookSet::default();
        };

        let checks: [(&str, Value); 4] = [
            (StatusMethods::IS_ACTIVE, Value::Bool(true)),
            (StatusMethods::EXECUTOR_NAME, Value::from(self.engine.name())),
            (StatusMethods::EXECUTOR_VERSION, Value::from(self.engine.version())),
            (StatusMethods::HAS_RESOURCES_HOOK, Value::Bool(with_resources)),
        ];
        let methods = scope.declared_members(&ty, MemberKind::Method);

        checks
            .into_iter()
            .flat_map(|(name, value)| {
                let callback = HookCallback::replace_with(value).with_priority(Priority::HIGHEST);
                methods
                    .iter()
                    .filter(|m| m.name() == name && m.parameter_types().is_empty())
                    .filter_map(|m| self.attach(m, callback.clone(), None))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}
