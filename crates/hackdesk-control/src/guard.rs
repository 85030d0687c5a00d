//! Authorization guard
//!
//! Team-scoped predicates over the caller identity. Privileged roles
//! (admin, organizer) bypass team checks entirely; everyone else is
//! resolved against the team record. A missing or absent team id is
//! reported as not-found rather than panicking: cluster records with a
//! dangling team reference are a known occurrence.

use hackdesk_auth::Caller;
use hackdesk_db::entities::{team, team_member};
use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use crate::error::ControlError;

/// Require the caller to be the leader of the given team
pub async fn require_team_leader(
    db: &DatabaseConnection,
    caller: &Caller,
    team_id: Option<Uuid>,
) -> Result<(), ControlError> {
    let (user_id, team) = match resolve(db, caller, team_id).await? {
        Resolution::Bypass => return Ok(()),
        Resolution::Member { user_id, team } => (user_id, team),
    };

    if team.leader_id == user_id {
        Ok(())
    } else {
        Err(ControlError::Forbidden)
    }
}

/// Require the caller to be a member (or the leader) of the given team
pub async fn require_team_member(
    db: &DatabaseConnection,
    caller: &Caller,
    team_id: Option<Uuid>,
) -> Result<(), ControlError> {
    let (user_id, team) = match resolve(db, caller, team_id).await? {
        Resolution::Bypass => return Ok(()),
        Resolution::Member { user_id, team } => (user_id, team),
    };

    if team.leader_id == user_id {
        return Ok(());
    }

    let membership = team_member::Entity::find_by_id((team.id, user_id))
        .one(db)
        .await?;

    if membership.is_some() {
        Ok(())
    } else {
        Err(ControlError::Forbidden)
    }
}

enum Resolution {
    Bypass,
    Member { user_id: Uuid, team: team::Model },
}

async fn resolve(
    db: &DatabaseConnection,
    caller: &Caller,
    team_id: Option<Uuid>,
) -> Result<Resolution, ControlError> {
    let (user_id, role) = match caller {
        Caller::Anonymous => return Err(ControlError::Unauthorized),
        Caller::Authenticated { user_id, role } => (*user_id, *role),
    };

    if role.is_privileged() {
        return Ok(Resolution::Bypass);
    }

    let team_id = team_id.ok_or(ControlError::NotFound("team"))?;
    let team = team::Entity::find_by_id(team_id)
        .one(db)
        .await?
        .ok_or(ControlError::NotFound("team"))?;

    Ok(Resolution::Member { user_id, team })
}
