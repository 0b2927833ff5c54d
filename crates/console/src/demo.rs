//! Demo users for an empty console.

use rolegate_access::{Capability, MatrixEdit, ModuleId, PermissionMatrix, Role};
use rolegate_events::EventBus;
use rolegate_infra::ConsoleStore;

use crate::admission::NewUser;
use crate::console::Console;
use crate::errors::ConsoleResult;
use crate::events::ConsoleEvent;

const DEMO_USERS: &[(&str, &str, Role)] = &[
    ("Alice Johnson", "alice@example.com", Role::Admin),
    ("Bob Smith", "bob@example.com", Role::Editor),
    ("Carol White", "carol@example.com", Role::Viewer),
];

/// Admit the demo users when the console has none. Returns how many were added.
pub fn seed<S, B>(console: &mut Console<S, B>) -> ConsoleResult<usize>
where
    S: ConsoleStore,
    B: EventBus<ConsoleEvent>,
{
    if !console.list_users().is_empty() {
        tracing::debug!("console already has users; skipping demo seed");
        return Ok(0);
    }

    for (name, email, role) in DEMO_USERS {
        console.create_user(NewUser::new(*name, *email, *role))?;
    }

    // One custom user with a hand-picked, consistent matrix.
    let mut analyst = PermissionMatrix::for_role(console.catalog(), Role::Custom);
    for (module, capabilities) in [
        ("dashboard", &[Capability::Read][..]),
        ("reports", &[Capability::Read, Capability::Write, Capability::Share][..]),
        ("analytics", &[Capability::Read, Capability::Share][..]),
    ] {
        for capability in capabilities {
            analyst.apply(&MatrixEdit::SetCapability {
                module_id: ModuleId::new(module),
                capability: *capability,
                value: true,
            })?;
        }
    }
    console.create_user(
        NewUser::new("Dan Brown", "dan@example.com", Role::Custom).with_permissions(analyst),
    )?;

    let seeded = DEMO_USERS.len() + 1;
    tracing::info!(users = seeded, "seeded demo users");
    Ok(seeded)
}
