use serde::{Deserialize, Serialize};
use std::fmt;

/// 役職名に含まれていれば人狼陣営とみなすマーカー
pub const WOLF_MARKER: &str = "Wolf";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Town,
    Wolf,
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Town => write!(f, "Town"),
            Team::Wolf => write!(f, "Wolves"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NightActionKind {
    None,
    Roleblock,
    Jail,
    Inspect,
    Protect,
    Track,
    Kill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Wolf Roleblocker")]
    WolfRoleblocker,
    #[serde(rename = "Town Jailkeeper")]
    Jailkeeper,
    #[serde(rename = "Town Seer")]
    Seer,
    #[serde(rename = "Town Doctor")]
    Doctor,
    #[serde(rename = "Town Tracker")]
    Tracker,
    #[serde(rename = "Wolf")]
    Wolf,
    #[serde(rename = "Town Bulletproof")]
    Bulletproof,
    #[serde(rename = "Vanilla Town")]
    VanillaTown,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::WolfRoleblocker,
        Role::Jailkeeper,
        Role::Seer,
        Role::Doctor,
        Role::Tracker,
        Role::Wolf,
        Role::Bulletproof,
        Role::VanillaTown,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Role::WolfRoleblocker => "Wolf Roleblocker",
            Role::Jailkeeper => "Town Jailkeeper",
            Role::Seer => "Town Seer",
            Role::Doctor => "Town Doctor",
            Role::Tracker => "Town Tracker",
            Role::Wolf => "Wolf",
            Role::Bulletproof => "Town Bulletproof",
            Role::VanillaTown => "Vanilla Town",
        }
    }

    /// 陣営は役職名の文字列から判定する
    pub fn team(&self) -> Team {
        if self.name().contains(WOLF_MARKER) {
            Team::Wolf
        } else {
            Team::Town
        }
    }

    pub fn night_action(&self) -> NightActionKind {
        match self {
            Role::WolfRoleblocker => NightActionKind::Roleblock,
            Role::Jailkeeper => NightActionKind::Jail,
            Role::Seer => NightActionKind::Inspect,
            Role::Doctor => NightActionKind::Protect,
            Role::Tracker => NightActionKind::Track,
            Role::Wolf => NightActionKind::Kill,
            Role::Bulletproof | Role::VanillaTown => NightActionKind::None,
        }
    }

    /// Lower resolves first.
    pub fn priority(&self) -> u8 {
        match self {
            Role::WolfRoleblocker => 1,
            Role::Jailkeeper => 2,
            Role::Seer => 3,
            Role::Doctor => 4,
            Role::Tracker => 5,
            Role::Wolf => 6,
            Role::Bulletproof => 7,
            Role::VanillaTown => 8,
        }
    }

    /// 人狼の襲撃を提出できるかどうか
    pub fn has_kill_rights(&self) -> bool {
        self.night_action() == NightActionKind::Kill
    }

    /// `!target` で個別に提出する夜アクションを持つかどうか
    pub fn has_targeted_action(&self) -> bool {
        !matches!(
            self.night_action(),
            NightActionKind::None | NightActionKind::Kill
        )
    }

    pub fn allows_self_target(&self) -> bool {
        matches!(self, Role::Doctor)
    }

    pub fn is_bulletproof(&self) -> bool {
        matches!(self, Role::Bulletproof)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::WolfRoleblocker => {
                "You are a wolf. Each night you may block one player, cancelling whatever action they submitted. \
                 If no wolf with the kill is left alive, you will inherit it and lose your block."
            }
            Role::Jailkeeper => {
                "You are aligned with the town. Each night you may jail one player. \
                 A jailed player cannot act and cannot be killed that night."
            }
            Role::Seer => {
                "You are aligned with the town. Each night you may inspect one player and learn \
                 whether they are a wolf."
            }
            Role::Doctor => {
                "You are aligned with the town. Each night you may protect one player (yourself included) \
                 from the wolves. You will not be told whether the protection mattered."
            }
            Role::Tracker => {
                "You are aligned with the town. Each night you may track one player and learn who, \
                 if anyone, they visited."
            }
            Role::Wolf => {
                "You are a wolf. Together with your partners you choose one player to kill each night \
                 by posting `!kill u/<target>` in the wolf sub. Only the latest kill order counts."
            }
            Role::Bulletproof => {
                "You are aligned with the town. You wear a bulletproof vest that will save you from \
                 the first wolf attack against you."
            }
            Role::VanillaTown => {
                "You are aligned with the town. You have no night action; find the wolves and vote them out."
            }
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
