use rand::Rng;
use tracing::info;

use super::PhaseEngine;
use crate::error::EngineError;
use crate::messaging::{Messenger, Visibility};
use crate::models::{GameData, GamePhase, PhaseData, Team};
use crate::roster::Roster;
use crate::tally::Tally;
use crate::templates::{GameTemplate, TurnoverReport};

/// 勝敗が決まっていれば勝った陣営を返す
pub fn winner(roster: &Roster) -> Option<Team> {
    let wolves = roster.wolf_count();
    let town = roster.town_count();
    if wolves == 0 {
        Some(Team::Town)
    } else if town <= wolves {
        Some(Team::Wolf)
    } else {
        None
    }
}

impl<'a, M: Messenger + ?Sized, R: Rng> PhaseEngine<'a, M, R> {
    pub(super) async fn turnover(
        &mut self,
        game: &mut GameData,
        phase: &mut PhaseData,
        mut roster: Roster,
        number: u32,
        template: &dyn GameTemplate,
    ) -> Result<(), EngineError> {
        info!("Phase {} has ended, running turnover", number);
        self.messenger.lock(&game.main_post_id).await?;
        self.messenger.lock(&game.wolf_post_id).await?;

        let tally = Tally::count(roster.live(), &phase.votes);
        let voted_out = tally.eliminate(&mut self.rng);
        if let Some(player) = &voted_out {
            info!("{} is voted out", player);
            roster.kill(player);
            self.messenger
                .send_private_message(
                    player.as_str(),
                    &format!("Eliminated in Phase {}", number),
                    "You have been voted out by the town. Thank you for playing!",
                )
                .await?;
        }

        let outcome = template.resolve_night_actions(&mut roster, phase, number)?;
        for notice in &outcome.notices {
            self.messenger
                .send_private_message(notice.to.as_str(), &notice.subject, &notice.body)
                .await?;
        }

        let report = TurnoverReport {
            tally,
            voted_out: voted_out.and_then(|p| roster.role_of(&p).map(|role| (p, role))),
            killed: outcome
                .killed
                .and_then(|p| roster.role_of(&p).map(|role| (p, role))),
        };
        roster.store(game);

        info!(
            "{} wolves and {} town remain",
            roster.wolf_count(),
            roster.town_count()
        );
        match winner(&roster) {
            None => {
                let next = number + 1;
                phase.clear();
                self.post_phase(game, template.phase_narrative(next, Some(&report)))
                    .await?;
                game.phase = GamePhase::Active(next);
                info!("Advancing to phase {}", next);
            }
            Some(team) => {
                info!("{} win", team);
                self.messenger
                    .set_venue_visibility(&game.wolf_venue, Visibility::Public)
                    .await?;
                for (player, role) in roster.roles() {
                    if role.team() == Team::Wolf {
                        self.messenger
                            .remove_member(&game.wolf_venue, player.as_str())
                            .await?;
                    }
                }

                let finale = template.finale_narrative(team, &report, roster.roles());
                let submission = self
                    .messenger
                    .submit(&game.main_venue, &finale.title, &finale.body)
                    .await?;
                game.main_post_id = submission.id;
                game.last_comment_time = submission.created_at;
                game.phase = GamePhase::Finale;
            }
        }
        Ok(())
    }
}
