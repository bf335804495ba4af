// [apps/orchestrator/src/security.rs]
/*!
 * SPEC_FULL.md §C: the core depends only on this trait, never on a
 * concrete session store. Auth itself (spec.md §1) is out of scope;
 * this is the narrow capability the core queries.
 */

use campaign_domain_models::SecurityContext;

pub trait SecurityContextProvider: Send + Sync {
    fn current(&self) -> Option<SecurityContext>;
}

/// Provider used where no real session store is wired up (local runs,
/// tests). Always reports no context — every caller is anonymous.
pub struct NullSecurityContextProvider;

impl SecurityContextProvider for NullSecurityContextProvider {
    fn current(&self) -> Option<SecurityContext> {
        None
    }
}
