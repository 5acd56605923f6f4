//! Boundary normalization: raw feed records into typed change events.

use argus_types::{ChangeEvent, ChangeKind, Entity, EntityKind};

use crate::feed::{RawAction, RawGrantee};

/// Identifier used for anyone-with-link grantees, which carry no address.
const ANYONE_IDENTIFIER: &str = "anyone-with-link";

/// Classify a raw grantee into a strict entity.
///
/// Precedence, first match wins: known user account > group > domain >
/// anyone-with-link > unknown. User-level grants are the highest-priority
/// alert class, so a record carrying several hints classifies as the most
/// specific one.
pub fn classify(grantee: &RawGrantee) -> Entity {
    if let Some(email) = &grantee.user_email {
        return Entity::new(EntityKind::User, email.clone());
    }
    if let Some(email) = &grantee.group_email {
        return Entity::new(EntityKind::Group, email.clone());
    }
    if let Some(domain) = &grantee.domain {
        return Entity::new(EntityKind::Domain, domain.clone());
    }
    if grantee.anyone_with_link {
        return Entity::new(EntityKind::Anyone, ANYONE_IDENTIFIER);
    }
    let identifier = grantee.opaque_id.clone().unwrap_or_default();
    Entity::new(EntityKind::Unknown, identifier)
}

/// Normalize one raw action into zero or more change events, one per
/// permission entry added or removed.
pub fn normalize(action: &RawAction) -> Vec<ChangeEvent> {
    let role = action.role.clone().unwrap_or_else(|| "unknown".to_string());
    let actor = action
        .actor
        .clone()
        .unwrap_or_else(|| "unknown".to_string());

    let build = |kind: ChangeKind, grantee: &RawGrantee| ChangeEvent {
        target_id: action.target_id.clone(),
        target_name: action.target_name.clone(),
        kind,
        entity: classify(grantee),
        role: role.clone(),
        actor: actor.clone(),
        when: action.timestamp,
    };

    let mut events = Vec::with_capacity(action.added.len() + action.removed.len());
    events.extend(action.added.iter().map(|g| build(ChangeKind::Added, g)));
    events.extend(action.removed.iter().map(|g| build(ChangeKind::Removed, g)));
    events
}
