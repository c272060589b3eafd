//! Night-action resolution.
//!
//! Actions resolve in a fixed order: roleblock, jail, inspect, protect,
//! track, wolf kill, then kill-rights succession. Targets were validated at
//! submission time, so nothing here rejects input; it only decides what
//! each action ends up doing. The resolver performs no I/O and hands back
//! the private notices it wants delivered.

use std::collections::HashSet;
use tracing::{debug, info};

use crate::models::{NightActionKind, PhaseData, PlayerName, Role, Team};
use crate::roster::Roster;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub to: PlayerName,
    pub subject: String,
    pub body: String,
}

impl Notice {
    fn new(to: &PlayerName, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Notice {
            to: to.clone(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NightOutcome {
    /// 襲撃で死亡したプレイヤー
    pub killed: Option<PlayerName>,
    pub notices: Vec<Notice>,
}

struct Night<'a> {
    roster: &'a mut Roster,
    phase: &'a mut PhaseData,
    subject: String,
    jailed: HashSet<PlayerName>,
    protected: HashSet<PlayerName>,
    kill_cancelled: bool,
    outcome: NightOutcome,
}

pub fn resolve_night(roster: &mut Roster, phase: &mut PhaseData, phase_number: u32) -> NightOutcome {
    let mut night = Night {
        roster,
        phase,
        subject: format!("Night results for Phase {}", phase_number),
        jailed: HashSet::new(),
        protected: HashSet::new(),
        kill_cancelled: false,
        outcome: NightOutcome::default(),
    };

    night.roleblock();
    night.jail();
    night.inspect();
    night.protect();
    night.track();
    night.wolf_kill();
    night.succession();

    night.outcome
}

impl<'a> Night<'a> {
    /// 指定の種類の夜アクションを持つ最初の生存者と、その対象
    fn acting(&self, kind: NightActionKind) -> Option<(PlayerName, PlayerName)> {
        let actor = self
            .roster
            .first_live_with(|role| role.night_action() == kind)?
            .clone();
        let target = self.phase.action_of(&actor)?.clone();
        Some((actor, target))
    }

    fn notify(&mut self, to: &PlayerName, body: impl Into<String>) {
        let notice = Notice::new(to, self.subject.clone(), body);
        self.outcome.notices.push(notice);
    }

    fn roleblock(&mut self) {
        if let Some((blocker, target)) = self.acting(NightActionKind::Roleblock) {
            info!("{} roleblocks {}", blocker, target);
            self.phase.null_action(&target);
        }
    }

    fn jail(&mut self) {
        if let Some((keeper, target)) = self.acting(NightActionKind::Jail) {
            info!("{} jails {}", keeper, target);
            self.phase.null_action(&target);
            if self.phase.wolf_killer.as_ref() == Some(&target) {
                info!("wolf killer {} is jailed, no kill tonight", target);
                self.kill_cancelled = true;
            }
            self.jailed.insert(target);
        }
    }

    fn inspect(&mut self) {
        if let Some((seer, target)) = self.acting(NightActionKind::Inspect) {
            let team = self.roster.team_of(&target).unwrap_or(Team::Town);
            debug!("{} inspects {} -> {}", seer, target, team);
            let body = match team {
                Team::Wolf => format!("Your inspection reveals that u/{} is a **wolf**.", target),
                Team::Town => format!("Your inspection reveals that u/{} is **town**.", target),
            };
            self.notify(&seer, body);
        }
    }

    fn protect(&mut self) {
        if let Some((doctor, target)) = self.acting(NightActionKind::Protect) {
            debug!("{} protects {}", doctor, target);
            self.protected.insert(target);
        }
    }

    fn track(&mut self) {
        let Some((tracker, tracked)) = self.acting(NightActionKind::Track) else {
            return;
        };

        let visited = if self.phase.wolf_killer.as_ref() == Some(&tracked) && !self.kill_cancelled {
            self.phase.wolf_kill.clone()
        } else {
            self.phase.action_of(&tracked).cloned()
        };
        debug!("{} tracks {} -> {:?}", tracker, tracked, visited);

        let body = match visited {
            Some(target) => format!("u/{} visited u/{} last night.", tracked, target),
            None => format!("u/{} did not visit anyone last night.", tracked),
        };
        self.notify(&tracker, body);
    }

    fn wolf_kill(&mut self) {
        let (Some(killer), Some(target)) =
            (self.phase.wolf_killer.clone(), self.phase.wolf_kill.clone())
        else {
            return;
        };

        if self.kill_cancelled {
            return;
        }
        if !self.roster.is_alive(&killer) {
            info!("wolf killer {} is dead, kill on {} fails", killer, target);
            return;
        }
        if !self.roster.is_alive(&target)
            || self.jailed.contains(&target)
            || self.protected.contains(&target)
        {
            info!("kill on {} fails", target);
            return;
        }

        if self.roster.role_of(&target).map(|r| r.is_bulletproof()) == Some(true) {
            info!("{} survives the kill, vest is spent", target);
            self.roster.set_role(&target, Role::VanillaTown);
            self.notify(
                &target,
                "The wolves attacked you last night, but your vest stopped the attack. \
                 It will not save you again; you are now Vanilla Town.",
            );
            return;
        }

        info!("{} kills {}", killer, target);
        self.roster.kill(&target);
        self.notify(
            &target,
            "You have been killed by the wolves. Thank you for playing!",
        );
        self.outcome.killed = Some(target);
    }

    /// 襲撃権を持つ人狼が全滅した場合、残った人狼のうち優先度の高い者に引き継ぐ
    fn succession(&mut self) {
        if self.roster.first_live_with(|role| role.has_kill_rights()).is_some() {
            return;
        }

        let successor = self
            .roster
            .live_wolves()
            .filter_map(|player| self.roster.role_of(player).map(|role| (role, player)))
            .min_by_key(|(role, _)| role.priority())
            .map(|(role, player)| (role, player.clone()));

        let Some((previous, successor)) = successor else {
            return;
        };

        info!("{} ({}) inherits the wolf kill", successor, previous);
        self.roster.set_role(&successor, Role::Wolf);
        let body = if previous.night_action() == NightActionKind::Roleblock {
            "Your partners are gone. You can no longer roleblock; from now on you carry \
             the wolf kill. Post `!kill u/<target>` in the wolf sub."
        } else {
            "Your partners are gone. From now on you carry the wolf kill. \
             Post `!kill u/<target>` in the wolf sub."
        };
        self.notify(&successor, body);
    }
}
