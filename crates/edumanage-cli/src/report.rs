//! Plain-text rendering of policy data for the terminal.

use anyhow::{Context, bail};
use edumanage::{Predicate, PolicyRule, PolicyTable, ScopeKey};
use edumanage_models::{OwnerRef, ProfileHistory, ResourceClass, ResourceId, Role};

/// One aligned line per rule, optionally restricted to one role.
pub fn table_lines(table: &PolicyTable, role: Option<Role>) -> Vec<String> {
    let rules: Vec<&PolicyRule> = match role {
        Some(role) => table.rules_for(role).collect(),
        None => table.rules().iter().collect(),
    };

    rules
        .into_iter()
        .map(|rule| {
            format!(
                "{:<8} {:<18} {:<16} {}",
                rule.role.as_str(),
                rule.class.as_str(),
                rule.action.as_str(),
                rule.decision.as_str()
            )
        })
        .collect()
}

/// Parses a `field=<uuid>` owner argument against the class's ownership
/// fields. The uuid is an actor id or an extension id, depending on what the
/// class's ownership columns reference.
pub fn parse_owner(
    class: ResourceClass,
    arg: &str,
) -> anyhow::Result<(&'static str, ResourceId)> {
    let Some((field, id)) = arg.split_once('=') else {
        bail!("owner must look like field=<uuid>, got '{arg}'");
    };

    let Some(field) = class
        .ownership_fields()
        .iter()
        .copied()
        .find(|known| *known == field.trim())
    else {
        bail!(
            "{class} has no ownership field '{}' (known: {})",
            field.trim(),
            describe_fields(class.ownership_fields())
        );
    };

    let owner = id
        .trim()
        .parse::<ResourceId>()
        .with_context(|| format!("invalid owner id in '{arg}'"))?;
    Ok((field, owner))
}

pub fn describe_predicate(predicate: &Predicate) -> String {
    match predicate {
        Predicate::MatchAll => "all records".to_string(),
        Predicate::MatchNone => "no records".to_string(),
        Predicate::KeyIn { key, ids } => match key {
            ScopeKey::Id => format!("records whose id is one of {} related ids", ids.len()),
            ScopeKey::Owner(fields) => format!(
                "records where {} holds the actor's id",
                fields.join(" or ")
            ),
        },
    }
}

/// What an owner id must be for `class`, for help output.
pub fn owner_hint(class: ResourceClass) -> String {
    match class.owner_ref() {
        None => format!("{class} has no owner"),
        Some(OwnerRef::Actor) => format!("{class} is owned through an actor id"),
        Some(OwnerRef::Extension(kind)) => {
            format!("{class} is owned through a {kind} extension id")
        }
    }
}

pub fn history_lines(history: &ProfileHistory) -> Vec<String> {
    let mut lines = Vec::with_capacity(history.extensions.len() + 1);
    match &history.profile {
        Some(profile) => lines.push(format!(
            "Role: {} (since {})",
            profile.role,
            profile.updated_at.format("%Y-%m-%d %H:%M:%S")
        )),
        None => lines.push("Role: none".to_string()),
    }
    for extension in &history.extensions {
        lines.push(format!(
            "  {:<8} {:<12} {}",
            extension.kind.as_str(),
            extension.business_id,
            extension.id
        ));
    }
    lines
}

fn describe_fields(fields: &[&str]) -> String {
    if fields.is_empty() {
        "none".to_string()
    } else {
        fields.join(", ")
    }
}
