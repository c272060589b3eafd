//! Checks applied when a vote, night target or kill order arrives.
//! Resolution trusts whatever passed these.

use crate::command::Keyword;
use crate::error::SubmissionError;
use crate::models::{PlayerName, Team};
use crate::roster::Roster;

fn live_target(
    roster: &Roster,
    keyword: Keyword,
    target: Option<PlayerName>,
) -> Result<PlayerName, SubmissionError> {
    let target = target.ok_or(SubmissionError::MissingTarget(keyword.token()))?;
    if !roster.is_known(&target) {
        return Err(SubmissionError::InvalidTarget(target));
    }
    if !roster.is_alive(&target) {
        return Err(SubmissionError::DeadTarget(target));
    }
    Ok(target)
}

pub fn validate_vote(
    roster: &Roster,
    voter: &PlayerName,
    target: Option<PlayerName>,
) -> Result<PlayerName, SubmissionError> {
    if !roster.is_alive(voter) {
        return Err(SubmissionError::NotAlive);
    }
    live_target(roster, Keyword::Vote, target)
}

pub fn validate_target(
    roster: &Roster,
    actor: &PlayerName,
    target: Option<PlayerName>,
) -> Result<PlayerName, SubmissionError> {
    if !roster.is_alive(actor) {
        return Err(SubmissionError::NotAlive);
    }
    let role = roster.role_of(actor).ok_or(SubmissionError::NotAlive)?;
    if !role.has_targeted_action() {
        return Err(SubmissionError::NoNightAction);
    }

    let target = live_target(roster, Keyword::Target, target)?;
    if &target == actor && !role.allows_self_target() {
        return Err(SubmissionError::SelfTarget);
    }
    Ok(target)
}

pub fn validate_kill(
    roster: &Roster,
    killer: &PlayerName,
    target: Option<PlayerName>,
) -> Result<PlayerName, SubmissionError> {
    if !roster.is_alive(killer) {
        return Err(SubmissionError::NotAlive);
    }
    if !roster.role_of(killer).map(|role| role.has_kill_rights()).unwrap_or(false) {
        return Err(SubmissionError::NoKillRights);
    }

    let target = live_target(roster, Keyword::Kill, target)?;
    if roster.team_of(&target) == Some(Team::Wolf) {
        return Err(SubmissionError::WolfTarget);
    }
    Ok(target)
}
