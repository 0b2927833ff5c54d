use anyhow::Context;
use serde::Serialize;

use rolegate_console::{Console, ConsoleEvent, Session, demo};
use rolegate_events::InMemoryEventBus;
use rolegate_infra::ConsoleConfig;

#[derive(Debug, Serialize)]
struct UserSummary<'a> {
    id: String,
    name: &'a str,
    email: &'a str,
    role: &'a str,
    granted: Vec<(String, String)>,
    validation_errors: Vec<String>,
    recent_audit: Vec<&'a str>,
}

fn main() -> anyhow::Result<()> {
    rolegate_observability::init(ConsoleConfig::log_format_from_env());

    let config = ConsoleConfig::from_env();
    tracing::info!(?config, "starting rolegate console");

    let bus = InMemoryEventBus::<ConsoleEvent>::new();
    let mut console = Console::from_config(&config, bus).context("failed to load console state")?;

    if config.seed_demo {
        demo::seed(&mut console).context("failed to seed demo users")?;
    }

    let session = Session::new();
    let summaries: Vec<UserSummary<'_>> = console
        .list_users()
        .iter()
        .map(|user| UserSummary {
            id: user.id.to_string(),
            name: &user.name,
            email: &user.email,
            role: user.role.as_str(),
            granted: user
                .permissions
                .iter()
                .map(|(id, p)| (console.catalog().display_name(id).to_string(), p.to_string()))
                .collect(),
            validation_errors: console
                .validation_errors(&session, user.id)
                .iter()
                .map(ToString::to_string)
                .collect(),
            recent_audit: console
                .recent_audit(user.id)
                .iter()
                .map(|e| e.details.as_str())
                .collect(),
        })
        .collect();

    let out = serde_json::to_string_pretty(&summaries).context("failed to render summary")?;
    println!("{out}");
    Ok(())
}
