//! Per-template game behaviour, selected by the stored `gameType` tag.

use rand::seq::SliceRandom;
use rand::RngCore;
use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::models::{GameType, PhaseData, PlayerName, Role, Team};
use crate::resolver::{resolve_night, NightOutcome};
use crate::roster::Roster;
use crate::tally::Tally;

pub mod matrix6;
pub mod test_game;

pub use matrix6::Matrix6;
pub use test_game::TestGame;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhasePost {
    pub title: String,
    pub body: String,
}

/// ターンオーバーの結果。次フェーズの投稿文に使う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnoverReport {
    pub tally: Tally,
    pub voted_out: Option<(PlayerName, Role)>,
    pub killed: Option<(PlayerName, Role)>,
}

pub trait GameTemplate: Send + Sync {
    fn name(&self) -> &'static str;

    fn player_limit(&self) -> usize;

    fn signup_post(&self) -> PhasePost {
        PhasePost {
            title: "New Game Signups".to_string(),
            body: format!(
                "Signups are now open for the next game. To sign up, comment on this post with `!signup`.\n\n\
                 Once {} players have signed up, roles will be assigned and the game will begin.",
                self.player_limit()
            ),
        }
    }

    /// 候補となる役職構成。各構成の長さは `player_limit` と一致すること。
    fn role_sets(&self) -> Result<Vec<Vec<Role>>, EngineError> {
        Err(EngineError::Unimplemented {
            template: self.name(),
            hook: "role_sets",
        })
    }

    /// Random role-set draw, roster shuffle, then positional mapping.
    fn assign_roles(
        &self,
        players: &[PlayerName],
        rng: &mut dyn RngCore,
    ) -> Result<BTreeMap<PlayerName, Role>, EngineError> {
        let sets = self.role_sets()?;
        let set = sets.choose(rng).ok_or_else(|| EngineError::Unimplemented {
            template: self.name(),
            hook: "role_sets",
        })?;
        if set.len() != players.len() {
            return Err(EngineError::CorruptSnapshot(format!(
                "role set of {} roles for {} players",
                set.len(),
                players.len()
            )));
        }

        let mut shuffled = players.to_vec();
        shuffled.shuffle(rng);
        Ok(shuffled.into_iter().zip(set.iter().copied()).collect())
    }

    fn role_description(&self, role: Role) -> String {
        let action = if role.has_targeted_action() {
            "\n\nSend your night action to me by private message: `!target u/<player>`. \
             Only your latest target counts."
        } else {
            ""
        };
        format!(
            "Your role is **{}** (team: {}).\n\n{}{}\n\n\
             Reply to this message with `confirm` to confirm your role.",
            role,
            role.team(),
            role.description(),
            action
        )
    }

    fn resolve_night_actions(
        &self,
        roster: &mut Roster,
        phase: &mut PhaseData,
        phase_number: u32,
    ) -> Result<NightOutcome, EngineError> {
        Ok(resolve_night(roster, phase, phase_number))
    }

    fn phase_narrative(&self, phase_number: u32, report: Option<&TurnoverReport>) -> PhasePost {
        let mut body = String::new();
        if let Some(report) = report {
            body.push_str("## Vote results\n\n");
            body.push_str(&report.tally.render());
            body.push('\n');
            match &report.voted_out {
                Some((player, role)) => body.push_str(&format!(
                    "The town has voted out u/{}. They were **{}**.\n\n",
                    player, role
                )),
                None => body.push_str("Nobody was voted out.\n\n"),
            }
            match &report.killed {
                Some((player, role)) => body.push_str(&format!(
                    "u/{} was found dead this morning. They were **{}**.\n\n",
                    player, role
                )),
                None => body.push_str("Nobody died in the night.\n\n"),
            }
        }
        body.push_str(&format!(
            "Phase {} has begun. Vote by commenting `!vote u/<player>` on this post; \
             comment `!table` to see the current count. Submit night actions by private message.",
            phase_number
        ));

        PhasePost {
            title: format!("Phase {}", phase_number),
            body,
        }
    }

    fn finale_narrative(
        &self,
        winner: Team,
        report: &TurnoverReport,
        roles: &BTreeMap<PlayerName, Role>,
    ) -> PhasePost {
        let mut body = match (winner, &report.voted_out) {
            (Team::Town, Some((player, role))) if role.team() == Team::Wolf => format!(
                "The last wolf u/{} has been voted out. The town has won!\n\n",
                player
            ),
            (Team::Town, _) => "The last wolf is gone. The town has won!\n\n".to_string(),
            (Team::Wolf, _) => "The wolves have won!\n\n".to_string(),
        };
        body.push_str("## Roles\n\n");
        for (player, role) in roles {
            body.push_str(&format!("* u/{}: {}\n", player, role));
        }

        PhasePost {
            title: "Finale".to_string(),
            body,
        }
    }
}

impl GameType {
    pub fn template(&self) -> Box<dyn GameTemplate> {
        match self {
            GameType::Matrix6 => Box::new(Matrix6),
            GameType::Test => Box::new(TestGame),
        }
    }
}
