use crate::error::EngineError;
use crate::models::Role;
use crate::templates::GameTemplate;

/// 1人で進行を確認するためのゲーム
pub struct TestGame;

impl GameTemplate for TestGame {
    fn name(&self) -> &'static str {
        "test"
    }

    fn player_limit(&self) -> usize {
        1
    }

    fn role_sets(&self) -> Result<Vec<Vec<Role>>, EngineError> {
        Ok(vec![vec![Role::VanillaTown]])
    }
}
