use crate::error::EngineError;
use crate::models::Role;
use crate::templates::{GameTemplate, PhasePost};

const PLAYER_LIMIT: usize = 9;

/// 9人・人狼2の固定構成。6通りから1つを抽選する。
pub struct Matrix6;

impl GameTemplate for Matrix6 {
    fn name(&self) -> &'static str {
        "matrix6"
    }

    fn player_limit(&self) -> usize {
        PLAYER_LIMIT
    }

    fn signup_post(&self) -> PhasePost {
        PhasePost {
            title: "New Game Signups".to_string(),
            body: format!(
                "Welcome to another game of Automated Werewolves!\n\n\
                 Signups are now open for the next game. To sign up, simply comment on this post with the text `!signup`\n\n\
                 Once {} players have signed up, roles will be assigned and the game will begin once everyone has confirmed.",
                PLAYER_LIMIT
            ),
        }
    }

    fn role_sets(&self) -> Result<Vec<Vec<Role>>, EngineError> {
        use Role::*;
        Ok(vec![
            vec![
                WolfRoleblocker,
                Wolf,
                Seer,
                Doctor,
                VanillaTown,
                VanillaTown,
                VanillaTown,
                VanillaTown,
                VanillaTown,
            ],
            vec![
                WolfRoleblocker,
                Wolf,
                Seer,
                Tracker,
                VanillaTown,
                VanillaTown,
                VanillaTown,
                VanillaTown,
                VanillaTown,
            ],
            vec![
                WolfRoleblocker,
                Wolf,
                Jailkeeper,
                Doctor,
                VanillaTown,
                VanillaTown,
                VanillaTown,
                VanillaTown,
                VanillaTown,
            ],
            vec![
                Wolf,
                Wolf,
                Seer,
                Bulletproof,
                VanillaTown,
                VanillaTown,
                VanillaTown,
                VanillaTown,
                VanillaTown,
            ],
            vec![
                Wolf,
                Wolf,
                Jailkeeper,
                Tracker,
                VanillaTown,
                VanillaTown,
                VanillaTown,
                VanillaTown,
                VanillaTown,
            ],
            vec![
                Wolf,
                Wolf,
                Doctor,
                Bulletproof,
                VanillaTown,
                VanillaTown,
                VanillaTown,
                VanillaTown,
                VanillaTown,
            ],
        ])
    }
}
