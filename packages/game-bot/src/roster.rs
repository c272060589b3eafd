use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::models::{GameData, PlayerName, Role, Team};

/// 生存者・死亡者と役職の対応。スナップショットから毎回組み立て直す。
#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    live: Vec<PlayerName>,
    dead: Vec<PlayerName>,
    roles: BTreeMap<PlayerName, Role>,
}

impl Roster {
    pub fn new(live: Vec<PlayerName>, roles: BTreeMap<PlayerName, Role>) -> Self {
        Roster {
            live,
            dead: Vec::new(),
            roles,
        }
    }

    /// Every live or dead player must have a role once roles are assigned.
    pub fn from_game(game: &GameData) -> Result<Self, EngineError> {
        for player in game.live_players.iter().chain(game.dead_players.iter()) {
            if !game.roles.contains_key(player) {
                return Err(EngineError::CorruptSnapshot(format!(
                    "player {} has no role",
                    player
                )));
            }
        }
        if let Some(player) = game
            .live_players
            .iter()
            .find(|player| game.dead_players.contains(player))
        {
            return Err(EngineError::CorruptSnapshot(format!(
                "player {} is both alive and dead",
                player
            )));
        }

        Ok(Roster {
            live: game.live_players.clone(),
            dead: game.dead_players.clone(),
            roles: game.roles.clone(),
        })
    }

    pub fn store(&self, game: &mut GameData) {
        game.live_players = self.live.clone();
        game.dead_players = self.dead.clone();
        game.roles = self.roles.clone();
    }

    pub fn live(&self) -> &[PlayerName] {
        &self.live
    }

    pub fn dead(&self) -> &[PlayerName] {
        &self.dead
    }

    pub fn roles(&self) -> &BTreeMap<PlayerName, Role> {
        &self.roles
    }

    pub fn is_alive(&self, player: &PlayerName) -> bool {
        self.live.contains(player)
    }

    pub fn is_known(&self, player: &PlayerName) -> bool {
        self.roles.contains_key(player)
    }

    pub fn role_of(&self, player: &PlayerName) -> Option<Role> {
        self.roles.get(player).copied()
    }

    pub fn team_of(&self, player: &PlayerName) -> Option<Team> {
        self.role_of(player).map(|role| role.team())
    }

    pub fn set_role(&mut self, player: &PlayerName, role: Role) {
        self.roles.insert(player.clone(), role);
    }

    /// 生存者から死亡者へ移す。既に死亡していれば何もしない。
    pub fn kill(&mut self, player: &PlayerName) -> bool {
        match self.live.iter().position(|p| p == player) {
            Some(index) => {
                let removed = self.live.remove(index);
                self.dead.push(removed);
                true
            }
            None => false,
        }
    }

    pub fn count_team(&self, team: Team) -> usize {
        self.live
            .iter()
            .filter(|player| self.team_of(player) == Some(team))
            .count()
    }

    pub fn wolf_count(&self) -> usize {
        self.count_team(Team::Wolf)
    }

    pub fn town_count(&self) -> usize {
        self.count_team(Team::Town)
    }

    /// 指定の役職を持つ最初の生存者
    pub fn first_live_with(&self, predicate: impl Fn(Role) -> bool) -> Option<&PlayerName> {
        self.live
            .iter()
            .find(|player| self.role_of(player).map(&predicate).unwrap_or(false))
    }

    pub fn live_wolves(&self) -> impl Iterator<Item = &PlayerName> {
        self.live
            .iter()
            .filter(|player| self.team_of(player) == Some(Team::Wolf))
    }
}
