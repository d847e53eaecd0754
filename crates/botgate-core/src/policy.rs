//! Authorization policy for bot operations.
//!
//! A pure function from (actor, tenant, operation, target) to a three-way
//! decision. Denials come in two flavours so the caller never has to work
//! out which error to surface:
//!
//! - `Unauthorized`: the actor lacks the role (or is not authenticated, or is
//!   not a member of the tenant). Never depends on whether the target exists.
//! - `NotFound`: the actor has the role, but the target is missing, global,
//!   or belongs to another tenant. Indistinguishable from absence, so
//!   cross-tenant existence does not leak.

use std::fmt;

use botgate_types::actor::{Actor, ActorRole};
use botgate_types::bot::{BotOwner, TenantId};

/// Operations exposed by the identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Read,
    Create,
    Update,
    Delete,
    ResetCredential,
    RemoveAvatar,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::List => "list",
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::ResetCredential => "reset_credential",
            Operation::RemoveAvatar => "remove_avatar",
        };
        f.write_str(name)
    }
}

/// What the operation is aimed at.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// The tenant's bot collection (list, create).
    Collection,
    /// A resolved bot with the given owner.
    Bot(&'a BotOwner),
    /// A bot reference that did not resolve within the tenant's scope.
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Unauthorized,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

/// Decide whether `actor` may perform `operation` on `target` within `tenant`.
pub fn decide(actor: &Actor, tenant: &TenantId, operation: Operation, target: Target<'_>) -> Decision {
    if !actor.is_member_of(tenant) {
        return Decision::Deny(DenyReason::Unauthorized);
    }

    match operation {
        Operation::List | Operation::Read => match target {
            Target::Collection => Decision::Allow,
            Target::Bot(owner) if owner.is_visible_to(tenant) => Decision::Allow,
            Target::Bot(_) | Target::Missing => Decision::Deny(DenyReason::NotFound),
        },
        Operation::Create => require_administrator(actor).unwrap_or(Decision::Allow),
        Operation::Update
        | Operation::Delete
        | Operation::ResetCredential
        | Operation::RemoveAvatar => {
            if let Some(denied) = require_administrator(actor) {
                return denied;
            }
            match target {
                Target::Bot(owner) if owner.is_owned_by(tenant) => Decision::Allow,
                _ => Decision::Deny(DenyReason::NotFound),
            }
        }
    }
}

fn require_administrator(actor: &Actor) -> Option<Decision> {
    (actor.role != ActorRole::Administrator).then_some(Decision::Deny(DenyReason::Unauthorized))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MUTATIONS: [Operation; 4] = [
        Operation::Update,
        Operation::Delete,
        Operation::ResetCredential,
        Operation::RemoveAvatar,
    ];

    fn unauthorized() -> Decision {
        Decision::Deny(DenyReason::Unauthorized)
    }

    fn not_found() -> Decision {
        Decision::Deny(DenyReason::NotFound)
    }

    #[test]
    fn unauthenticated_is_always_unauthorized() {
        let tenant = TenantId::new();
        let owned = BotOwner::Tenant(tenant.clone());
        let actor = Actor::anonymous();

        assert_eq!(decide(&actor, &tenant, Operation::List, Target::Collection), unauthorized());
        assert_eq!(decide(&actor, &tenant, Operation::Create, Target::Collection), unauthorized());
        assert_eq!(decide(&actor, &tenant, Operation::Read, Target::Missing), unauthorized());
        for op in MUTATIONS {
            assert_eq!(decide(&actor, &tenant, op, Target::Bot(&owned)), unauthorized());
            assert_eq!(decide(&actor, &tenant, op, Target::Missing), unauthorized());
        }
    }

    #[test]
    fn non_member_is_unauthorized_even_as_administrator() {
        let tenant = TenantId::new();
        let actor = Actor::administrator(TenantId::new());

        assert_eq!(decide(&actor, &tenant, Operation::List, Target::Collection), unauthorized());
        assert_eq!(
            decide(&actor, &tenant, Operation::Update, Target::Bot(&BotOwner::Global)),
            unauthorized()
        );
    }

    #[test]
    fn agents_and_admins_read_own_and_global_bots() {
        let tenant = TenantId::new();
        let owned = BotOwner::Tenant(tenant.clone());

        for actor in [Actor::agent(tenant.clone()), Actor::administrator(tenant.clone())] {
            assert_eq!(decide(&actor, &tenant, Operation::List, Target::Collection), Decision::Allow);
            assert_eq!(decide(&actor, &tenant, Operation::Read, Target::Bot(&owned)), Decision::Allow);
            assert_eq!(
                decide(&actor, &tenant, Operation::Read, Target::Bot(&BotOwner::Global)),
                Decision::Allow
            );
        }
    }

    #[test]
    fn reading_another_tenants_bot_is_not_found() {
        let tenant = TenantId::new();
        let foreign = BotOwner::Tenant(TenantId::new());
        let actor = Actor::agent(tenant.clone());

        assert_eq!(decide(&actor, &tenant, Operation::Read, Target::Bot(&foreign)), not_found());
        assert_eq!(decide(&actor, &tenant, Operation::Read, Target::Missing), not_found());
    }

    #[test]
    fn only_administrators_create() {
        let tenant = TenantId::new();
        assert_eq!(
            decide(&Actor::administrator(tenant.clone()), &tenant, Operation::Create, Target::Collection),
            Decision::Allow
        );
        assert_eq!(
            decide(&Actor::agent(tenant.clone()), &tenant, Operation::Create, Target::Collection),
            unauthorized()
        );
    }

    #[test]
    fn administrator_mutates_only_owned_bots() {
        let tenant = TenantId::new();
        let owned = BotOwner::Tenant(tenant.clone());
        let foreign = BotOwner::Tenant(TenantId::new());
        let actor = Actor::administrator(tenant.clone());

        for op in MUTATIONS {
            assert_eq!(decide(&actor, &tenant, op, Target::Bot(&owned)), Decision::Allow, "{op}");
            assert_eq!(decide(&actor, &tenant, op, Target::Bot(&BotOwner::Global)), not_found());
            assert_eq!(decide(&actor, &tenant, op, Target::Bot(&foreign)), not_found());
            assert_eq!(decide(&actor, &tenant, op, Target::Missing), not_found());
            assert_eq!(decide(&actor, &tenant, op, Target::Collection), not_found());
        }
    }

    #[test]
    fn agent_mutation_is_unauthorized_regardless_of_target() {
        let tenant = TenantId::new();
        let owned = BotOwner::Tenant(tenant.clone());
        let actor = Actor::agent(tenant.clone());

        for op in MUTATIONS {
            assert_eq!(decide(&actor, &tenant, op, Target::Bot(&owned)), unauthorized());
            assert_eq!(decide(&actor, &tenant, op, Target::Bot(&BotOwner::Global)), unauthorized());
            assert_eq!(decide(&actor, &tenant, op, Target::Missing), unauthorized());
        }
    }
}
