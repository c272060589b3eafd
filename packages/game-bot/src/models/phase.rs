use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::player::PlayerName;

/// 現在のフェーズの投票・夜アクション。ターンオーバー毎に空に戻す。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhaseData {
    /// 投票者 -> 投票先
    pub votes: BTreeMap<PlayerName, PlayerName>,
    /// 行動者 -> 対象 (`None` はアクションなし、ロールブロックで無効化された場合も含む)
    pub actions: BTreeMap<PlayerName, Option<PlayerName>>,
    pub wolf_kill: Option<PlayerName>,
    pub wolf_killer: Option<PlayerName>,
}

impl PhaseData {
    pub fn record_vote(&mut self, voter: PlayerName, target: PlayerName) {
        self.votes.insert(voter, target);
    }

    pub fn record_action(&mut self, actor: PlayerName, target: PlayerName) {
        self.actions.insert(actor, Some(target));
    }

    pub fn record_kill(&mut self, killer: PlayerName, target: PlayerName) {
        self.wolf_killer = Some(killer);
        self.wolf_kill = Some(target);
    }

    pub fn action_of(&self, actor: &PlayerName) -> Option<&PlayerName> {
        self.actions.get(actor).and_then(|target| target.as_ref())
    }

    /// 提出済みかどうかに関わらず空で上書きする
    pub fn null_action(&mut self, actor: &PlayerName) {
        self.actions.insert(actor.clone(), None);
    }

    pub fn clear(&mut self) {
        *self = PhaseData::default();
    }
}
