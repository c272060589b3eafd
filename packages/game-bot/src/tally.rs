use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

use crate::models::PlayerName;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteCount {
    pub target: PlayerName,
    pub count: usize,
}

/// 生存者全員の得票数を降順に並べたもの。同数は生存者リストの順のまま(ここでは同数を解決しない)。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tally {
    pub counts: Vec<VoteCount>,
}

impl Tally {
    /// Live players who did not vote, or whose target is no longer alive,
    /// count as voting for themselves.
    pub fn count(live: &[PlayerName], votes: &BTreeMap<PlayerName, PlayerName>) -> Self {
        let mut counts: Vec<VoteCount> = live
            .iter()
            .map(|player| VoteCount {
                target: player.clone(),
                count: 0,
            })
            .collect();

        for voter in live {
            let target = votes
                .get(voter)
                .filter(|target| live.contains(*target))
                .unwrap_or(voter);
            if let Some(entry) = counts.iter_mut().find(|entry| &entry.target == target) {
                entry.count += 1;
            }
        }

        // sort_by は安定ソート。0票の生存者も表に残す。
        counts.sort_by(|a, b| b.count.cmp(&a.count));

        Tally { counts }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|entry| entry.count).sum()
    }

    pub fn max_count(&self) -> usize {
        self.counts.first().map(|entry| entry.count).unwrap_or(0)
    }

    /// 最多得票の候補
    pub fn leaders(&self) -> Vec<&PlayerName> {
        let max = self.max_count();
        self.counts
            .iter()
            .take_while(|entry| entry.count == max)
            .map(|entry| &entry.target)
            .collect()
    }

    /// 同数の場合は候補から一様ランダムに選ぶ。
    pub fn eliminate(&self, rng: &mut impl Rng) -> Option<PlayerName> {
        self.leaders().choose(rng).map(|player| (*player).clone())
    }

    /// `!table` の返信用
    pub fn render(&self) -> String {
        if self.counts.is_empty() {
            return "No live players to vote.".to_string();
        }
        let mut table = String::from("| Player | Votes |\n|:--|--:|\n");
        for entry in &self.counts {
            table.push_str(&format!("| u/{} | {} |\n", entry.target, entry.count));
        }
        table
    }
}
