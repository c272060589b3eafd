use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;

use game_bot::{
    messaging::{Messenger, Visibility},
    utils::test_setup::FakeMessenger,
    EngineError, GameData, GamePhase, GameState, GameType, PhaseData, PhaseEngine, PlayerName,
    Role,
};

type TestEngine<'a> = PhaseEngine<'a, FakeMessenger, StdRng>;

const MAIN: &str = "mafiamain";
const WOLVES: &str = "mafiawolves";

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn name(raw: &str) -> PlayerName {
    PlayerName::new(raw)
}

fn engine(messenger: &FakeMessenger, seed: u64) -> TestEngine<'_> {
    PhaseEngine::new(messenger, vec![name("mafiabot")], StdRng::seed_from_u64(seed))
}

/// 保存が成功した体で1tick進め、処理済みのメッセージを既読にする
async fn run(engine: &mut TestEngine<'_>, state: GameState, now: DateTime<Utc>) -> GameState {
    let outcome = engine.tick(state, now).await.unwrap();
    engine.acknowledge(&outcome.read).await.unwrap();
    outcome.state
}

fn fresh_state(game_type: GameType) -> GameState {
    GameState::new(
        GameData::new(game_type, MAIN.to_string(), WOLVES.to_string(), 1),
        PhaseData::default(),
    )
}

/// 役職を固定した進行中のゲームを作る
async fn active_game(messenger: &FakeMessenger, roles: &[(&str, Role)]) -> GameState {
    let main = messenger.submit(MAIN, "Phase 1", "").await.unwrap();
    let wolf = messenger.submit(WOLVES, "WOLF SUB Phase 1", "").await.unwrap();

    let mut game = GameData::new(GameType::Matrix6, MAIN.to_string(), WOLVES.to_string(), 1);
    game.phase = GamePhase::Active(1);
    game.main_post_id = main.id;
    game.last_comment_time = main.created_at;
    game.wolf_post_id = wolf.id;
    game.last_wolf_comment_time = wolf.created_at;
    game.roles = roles
        .iter()
        .map(|(player, role)| (name(player), *role))
        .collect::<BTreeMap<_, _>>();
    game.live_players = roles.iter().map(|(player, _)| name(player)).collect();
    game.confirmed_players = game.live_players.clone();

    GameState::new(game, PhaseData::default())
}

fn matrix_roles() -> Vec<(&'static str, Role)> {
    vec![
        ("p1", Role::WolfRoleblocker),
        ("p2", Role::Wolf),
        ("p3", Role::Seer),
        ("p4", Role::Doctor),
        ("p5", Role::VanillaTown),
        ("p6", Role::VanillaTown),
        ("p7", Role::VanillaTown),
        ("p8", Role::VanillaTown),
        ("p9", Role::VanillaTown),
    ]
}

#[tokio::test]
async fn test_single_player_lifecycle() {
    let messenger = FakeMessenger::new(start_time());
    let mut engine = engine(&messenger, 1);

    // Init: サインアップ投稿
    let state = run(&mut engine, fresh_state(GameType::Test), messenger.now()).await;
    assert_eq!(state.game.phase, GamePhase::Signup);
    let signup = messenger.last_post_in(MAIN).unwrap();
    assert_eq!(signup.title, "New Game Signups");
    assert_eq!(state.game.main_post_id, signup.id);
    assert_eq!(state.game.last_comment_time, signup.created_at);

    // Signup
    let comment = messenger.add_comment(&signup.id, "Alice", "Count me in\n!signup");
    let state = run(&mut engine, state, messenger.now()).await;
    assert_eq!(messenger.replies_to(&comment), vec!["u/alice has signed up"]);
    assert_eq!(state.game.phase, GamePhase::Confirmation);
    assert!(messenger.is_locked(&signup.id));
    assert_eq!(state.game.roles.get(&name("alice")), Some(&Role::VanillaTown));
    let confirmation = messenger.last_post_in(MAIN).unwrap();
    assert_eq!(confirmation.title, "Confirmation Phase");
    assert_eq!(state.game.main_post_id, confirmation.id);

    // Confirmation: 役職PM
    let state = run(&mut engine, state, messenger.now()).await;
    let role_pm = messenger.sent_to("alice");
    assert_eq!(role_pm.len(), 1);
    assert!(role_pm[0].body.contains("Vanilla Town"));
    assert_eq!(state.game.pending_players, vec![name("alice")]);
    assert_eq!(state.game.phase, GamePhase::Confirmation);

    messenger.add_private_message("Alice", "confirm");
    let state = run(&mut engine, state, messenger.now()).await;
    assert_eq!(state.game.phase, GamePhase::Active(1));
    assert_eq!(state.game.live_players, vec![name("alice")]);
    assert!(state.game.pending_players.is_empty());
    assert_eq!(messenger.visibility(WOLVES), Some(Visibility::Private));
    assert!(messenger.members(WOLVES).is_empty());
    let phase_post = messenger.last_post_in(MAIN).unwrap();
    let wolf_post = messenger.last_post_in(WOLVES).unwrap();
    assert_eq!(phase_post.title, "Phase 1");
    assert_eq!(wolf_post.title, "WOLF SUB Phase 1");
    assert_eq!(state.game.main_post_id, phase_post.id);
    assert_eq!(state.game.wolf_post_id, wolf_post.id);

    // 時間内ならターンオーバーしない
    let now = messenger.advance(Duration::minutes(30));
    let state = run(&mut engine, state, now).await;
    assert_eq!(state.game.phase, GamePhase::Active(1));

    let now = messenger.advance(Duration::hours(1));
    let state = run(&mut engine, state, now).await;
    assert_eq!(state.game.phase, GamePhase::Finale);
    assert!(messenger.is_locked(&phase_post.id));
    assert!(messenger.is_locked(&wolf_post.id));
    assert_eq!(state.game.dead_players, vec![name("alice")]);
    assert_eq!(messenger.visibility(WOLVES), Some(Visibility::Public));
    let finale = messenger.last_post_in(MAIN).unwrap();
    assert_eq!(finale.title, "Finale");
    assert!(finale.body.contains("town has won"));

    // Finale は何もしない
    let posts_before = messenger.posts().len();
    let after = run(
        &mut engine,
        state.clone(),
        messenger.advance(Duration::hours(5)),
    )
    .await;
    assert_eq!(after, state);
    assert_eq!(messenger.posts().len(), posts_before);
}

#[tokio::test]
async fn test_signup_watermark_is_idempotent() {
    let messenger = FakeMessenger::new(start_time());
    let mut engine = engine(&messenger, 3);

    let state = run(&mut engine, fresh_state(GameType::Matrix6), messenger.now()).await;
    let post_id = state.game.main_post_id.clone();

    messenger.add_comment(&post_id, "u/Alice", "!signup");
    messenger.add_comment(&post_id, "bob", "hello everyone");
    let duplicate = messenger.add_comment(&post_id, "alice", "!SIGNUP please");
    let state = run(&mut engine, state, messenger.now()).await;

    assert_eq!(state.game.live_players, vec![name("alice")]);
    assert_eq!(
        messenger.replies_to(&duplicate),
        vec!["u/alice already signed up"]
    );
    assert_eq!(state.game.last_comment_time, messenger.now());

    let replies = messenger.reply_count();
    let again = run(&mut engine, state.clone(), messenger.now()).await;
    assert_eq!(again, state);
    assert_eq!(messenger.reply_count(), replies);
}

#[tokio::test]
async fn test_full_signup_moves_to_confirmation() {
    let messenger = FakeMessenger::new(start_time());
    let mut engine = engine(&messenger, 5);

    let state = run(&mut engine, fresh_state(GameType::Matrix6), messenger.now()).await;
    let post_id = state.game.main_post_id.clone();
    for i in 1..=9 {
        messenger.add_comment(&post_id, &format!("player{}", i), "!signup");
    }
    let late = messenger.add_comment(&post_id, "latecomer", "!signup");
    let state = run(&mut engine, state, messenger.now()).await;

    assert_eq!(messenger.replies_to(&late), vec!["Sorry, the game is full"]);
    assert_eq!(state.game.phase, GamePhase::Confirmation);
    assert_eq!(state.game.roles.len(), 9);
    let wolves = state
        .game
        .roles
        .values()
        .filter(|role| role.team() == game_bot::Team::Wolf)
        .count();
    assert_eq!(wolves, 2);

    // 役職PMは1tickにつき1通
    let state = run(&mut engine, state, messenger.now()).await;
    assert_eq!(state.game.pending_players.len(), 1);
    let state = run(&mut engine, state, messenger.now()).await;
    assert_eq!(state.game.pending_players.len(), 2);
    assert_eq!(messenger.state().sent.len(), 2);

    // 役職PMを受け取っていないプレイヤーの confirm は数えない
    let first = state.game.pending_players[0].clone();
    let unsent = state
        .game
        .live_players
        .iter()
        .rev()
        .find(|p| !state.game.pending_players.contains(p))
        .unwrap()
        .clone();
    messenger.add_private_message(first.as_str(), "Confirm!");
    messenger.add_private_message(unsent.as_str(), "confirm");
    let state = run(&mut engine, state, messenger.now()).await;
    assert_eq!(state.game.confirmed_players, vec![first]);
    assert_eq!(state.game.phase, GamePhase::Confirmation);
}

#[tokio::test]
async fn test_active_phase_commands_and_turnover() {
    let messenger = FakeMessenger::new(start_time());
    let mut engine = engine(&messenger, 9);
    let state = active_game(&messenger, &matrix_roles()).await;
    let main_post = state.game.main_post_id.clone();
    let wolf_post = state.game.wolf_post_id.clone();

    let v1 = messenger.add_comment(&main_post, "p1", "!vote u/p3");
    let v2 = messenger.add_comment(&main_post, "P2", "I think\n!vote /u/P3.");
    let bad_vote = messenger.add_comment(&main_post, "p4", "!vote u/ghost");
    let outsider = messenger.add_comment(&main_post, "lurker", "who is the wolf?");
    let staff = messenger.add_comment(&main_post, "mafiabot", "Reminder: vote!");
    let table = messenger.add_comment(&main_post, "p5", "!table");

    let kill = messenger.add_comment(&wolf_post, "p2", "!kill u/p5");
    let blocked_kill = messenger.add_comment(&wolf_post, "p1", "!kill u/p6");

    let inspect = messenger.add_private_message("p3", "!target u/p2");
    messenger.add_private_message("p4", "!target u/p5");
    let vanilla = messenger.add_private_message("p6", "!target u/p7");

    let now = messenger.advance(Duration::minutes(30));
    let state = run(&mut engine, state, now).await;
    assert_eq!(state.game.phase, GamePhase::Active(1));

    assert_eq!(
        messenger.replies_to(&v1),
        vec!["u/p1 has voted for u/p3 in Phase 1."]
    );
    assert_eq!(
        messenger.replies_to(&v2),
        vec!["u/p2 has voted for u/p3 in Phase 1."]
    );
    assert_eq!(
        messenger.replies_to(&bad_vote),
        vec!["u/ghost is not a valid target."]
    );
    assert!(messenger.is_removed(&outsider));
    assert!(!messenger.is_removed(&staff));
    assert!(messenger.replies_to(&staff).is_empty());
    assert!(messenger.replies_to(&table)[0].contains("| u/p3 | 3 |"));

    assert!(messenger.replies_to(&kill)[0].contains("u/p5"));
    assert_eq!(
        messenger.replies_to(&blocked_kill),
        vec!["Only a wolf holding the kill can submit a kill."]
    );
    assert_eq!(
        messenger.replies_to(&inspect),
        vec!["Your target for Phase 1 is u/p2."]
    );
    assert_eq!(
        messenger.replies_to(&vanilla),
        vec!["Your role has no night action."]
    );

    assert_eq!(state.phase_data.votes.len(), 2);
    assert_eq!(state.phase_data.wolf_killer, Some(name("p2")));
    assert_eq!(state.phase_data.wolf_kill, Some(name("p5")));
    assert_eq!(state.phase_data.action_of(&name("p4")), Some(&name("p5")));

    // ターンオーバー: p3 が処刑され、医者に守られた p5 は生き残る
    let now = messenger.advance(Duration::hours(1));
    let state = run(&mut engine, state, now).await;

    assert_eq!(state.game.phase, GamePhase::Active(2));
    assert_eq!(state.game.dead_players, vec![name("p3")]);
    assert!(state.game.live_players.contains(&name("p5")));
    assert_eq!(state.phase_data, PhaseData::default());
    assert!(messenger.is_locked(&main_post));
    assert!(messenger.is_locked(&wolf_post));

    let eliminated = messenger.sent_to("p3");
    assert_eq!(eliminated.len(), 1);
    assert_eq!(eliminated[0].subject, "Eliminated in Phase 1");
    // 処刑された占い師は占わない
    assert!(messenger
        .sent_to("p3")
        .iter()
        .all(|m| !m.body.contains("inspection")));

    let phase_two = messenger.last_post_in(MAIN).unwrap();
    assert_eq!(phase_two.title, "Phase 2");
    assert!(phase_two.body.contains("voted out u/p3. They were **Town Seer**"));
    assert!(phase_two.body.contains("Nobody died in the night."));
    assert_eq!(state.game.main_post_id, phase_two.id);
    assert_eq!(
        messenger.last_post_in(WOLVES).unwrap().title,
        "WOLF SUB Phase 2"
    );
}

#[tokio::test]
async fn test_night_kill_is_announced() {
    let messenger = FakeMessenger::new(start_time());
    let mut engine = engine(&messenger, 11);
    let state = active_game(&messenger, &matrix_roles()).await;

    messenger.add_comment(&state.game.wolf_post_id, "p2", "!kill u/p6");
    messenger.add_comment(&state.game.main_post_id, "p1", "!vote u/p9");
    messenger.add_comment(&state.game.main_post_id, "p2", "!vote u/p9");

    let now = messenger.advance(Duration::hours(2));
    let state = run(&mut engine, state, now).await;

    assert_eq!(state.game.phase, GamePhase::Active(2));
    assert_eq!(state.game.dead_players, vec![name("p9"), name("p6")]);
    let killed = messenger.sent_to("p6");
    assert_eq!(killed.len(), 1);
    assert_eq!(killed[0].subject, "Night results for Phase 1");

    let post = messenger.last_post_in(MAIN).unwrap();
    assert!(post.body.contains("u/p6 was found dead"));
}

#[tokio::test]
async fn test_town_wins_when_last_wolf_is_voted_out() {
    let messenger = FakeMessenger::new(start_time());
    let mut engine = engine(&messenger, 2);
    let state = active_game(
        &messenger,
        &[("wolf", Role::Wolf), ("t1", Role::VanillaTown), ("t2", Role::Seer)],
    )
    .await;
    messenger.add_member(WOLVES, "wolf").await.unwrap();

    messenger.add_comment(&state.game.main_post_id, "t1", "!vote u/wolf");
    messenger.add_comment(&state.game.main_post_id, "t2", "!vote u/wolf");
    let now = messenger.advance(Duration::hours(2));
    let state = run(&mut engine, state, now).await;

    assert_eq!(state.game.phase, GamePhase::Finale);
    assert_eq!(messenger.visibility(WOLVES), Some(Visibility::Public));
    assert!(messenger.members(WOLVES).is_empty());
    let finale = messenger.last_post_in(MAIN).unwrap();
    assert!(finale
        .body
        .contains("The last wolf u/wolf has been voted out. The town has won!"));
}

#[tokio::test]
async fn test_wolves_win_at_parity() {
    let messenger = FakeMessenger::new(start_time());
    let mut engine = engine(&messenger, 4);
    let state = active_game(
        &messenger,
        &[
            ("wolf", Role::Wolf),
            ("blocker", Role::WolfRoleblocker),
            ("t1", Role::VanillaTown),
            ("t2", Role::VanillaTown),
            ("t3", Role::VanillaTown),
        ],
    )
    .await;

    messenger.add_comment(&state.game.main_post_id, "wolf", "!vote u/t1");
    messenger.add_comment(&state.game.main_post_id, "blocker", "!vote u/t1");
    messenger.add_comment(&state.game.wolf_post_id, "wolf", "!kill u/t2");
    let now = messenger.advance(Duration::hours(2));
    let state = run(&mut engine, state, now).await;

    assert_eq!(state.game.phase, GamePhase::Finale);
    assert_eq!(state.game.live_players, vec![name("wolf"), name("blocker"), name("t3")]);
    let finale = messenger.last_post_in(MAIN).unwrap();
    assert!(finale.body.contains("The wolves have won!"));
    assert!(finale.body.contains("* u/blocker: Wolf Roleblocker"));
}

#[tokio::test]
async fn test_collaborator_failure_aborts_tick() {
    let messenger = FakeMessenger::new(start_time());
    let mut engine = engine(&messenger, 1);
    messenger.fail_with("service unavailable");

    let result = engine
        .tick(fresh_state(GameType::Test), messenger.now())
        .await;
    assert!(matches!(result, Err(EngineError::Messenger(_))));
}

#[tokio::test]
async fn test_corrupt_roster_is_rejected() {
    let messenger = FakeMessenger::new(start_time());
    let mut engine = engine(&messenger, 1);
    let mut state = active_game(&messenger, &[("alice", Role::VanillaTown)]).await;
    state.game.live_players.push(name("stranger"));

    let result = engine.tick(state, messenger.now()).await;
    assert!(matches!(result, Err(EngineError::CorruptSnapshot(_))));
}

#[tokio::test]
async fn test_failed_tick_leaves_private_messages_unread() {
    let messenger = FakeMessenger::new(start_time());
    let mut engine = engine(&messenger, 6);
    let state = active_game(&messenger, &matrix_roles()).await;

    let inspect = messenger.add_private_message("p3", "!target u/p1");
    let protect = messenger.add_private_message("p4", "!target u/p4");

    // 医者への返信で失敗する
    messenger.fail_nth("reply", 2);
    let result = engine.tick(state.clone(), messenger.now()).await;
    assert!(matches!(result, Err(EngineError::Messenger(_))));
    assert!(!messenger.is_read(&inspect));
    assert!(!messenger.is_read(&protect));

    // 失敗したtickは保存されないので、前回の状態からやり直す
    messenger.recover();
    let outcome = engine.tick(state, messenger.now()).await.unwrap();
    assert_eq!(
        outcome.state.phase_data.action_of(&name("p3")),
        Some(&name("p1"))
    );
    assert_eq!(
        outcome.state.phase_data.action_of(&name("p4")),
        Some(&name("p4"))
    );
    assert_eq!(outcome.read, vec![inspect.clone(), protect.clone()]);
    assert!(!messenger.is_read(&inspect));

    engine.acknowledge(&outcome.read).await.unwrap();
    assert!(messenger.is_read(&inspect));
    assert!(messenger.is_read(&protect));
}

#[tokio::test]
async fn test_confirmations_are_read_after_acknowledge() {
    let messenger = FakeMessenger::new(start_time());
    let mut engine = engine(&messenger, 8);
    let mut state = fresh_state(GameType::Test);
    state.game.phase = GamePhase::Confirmation;
    state.game.live_players = vec![name("alice")];
    state.game.pending_players = vec![name("alice")];
    state.game.roles.insert(name("alice"), Role::VanillaTown);

    let confirm = messenger.add_private_message("alice", "confirm");
    messenger.fail_nth("set_venue_visibility", 1);
    let result = engine.tick(state.clone(), messenger.now()).await;
    assert!(result.is_err());
    assert!(!messenger.is_read(&confirm));

    messenger.recover();
    let state = run(&mut engine, state, messenger.now()).await;
    assert_eq!(state.game.confirmed_players, vec![name("alice")]);
    assert_eq!(state.game.phase, GamePhase::Active(1));
    assert!(messenger.is_read(&confirm));
}

#[tokio::test]
async fn test_wolf_sub_removes_outsiders_and_the_dead() {
    let messenger = FakeMessenger::new(start_time());
    let mut engine = engine(&messenger, 12);
    let mut roles = matrix_roles();
    roles.push(("ghost", Role::Wolf));
    let mut state = active_game(&messenger, &roles).await;
    state.game.live_players.retain(|p| p != &name("ghost"));
    state.game.dead_players.push(name("ghost"));
    let wolf_post = state.game.wolf_post_id.clone();

    let lurker = messenger.add_comment(&wolf_post, "lurker", "!kill u/p5");
    let ghost = messenger.add_comment(&wolf_post, "ghost", "!kill u/p6");
    let staff = messenger.add_comment(&wolf_post, "mafiabot", "Kill is due soon");
    let chatter = messenger.add_comment(&wolf_post, "p1", "nothing to add");

    let state = run(&mut engine, state, messenger.now()).await;

    for removed in [&lurker, &ghost] {
        assert!(messenger.is_removed(removed));
        assert_eq!(messenger.replies_to(removed).len(), 1);
        assert!(messenger.replies_to(removed)[0].contains("is not a living player"));
    }
    assert!(!messenger.is_removed(&staff));
    assert!(!messenger.is_removed(&chatter));
    assert_eq!(state.phase_data.wolf_kill, None);
    assert_eq!(state.game.last_wolf_comment_time, messenger.now());
}

#[tokio::test]
async fn test_roleblocker_inherits_the_kill() {
    let messenger = FakeMessenger::new(start_time());
    let mut engine = engine(&messenger, 13);
    let state = active_game(
        &messenger,
        &[
            ("rb", Role::WolfRoleblocker),
            ("wolf", Role::Wolf),
            ("t1", Role::VanillaTown),
            ("t2", Role::VanillaTown),
            ("t3", Role::VanillaTown),
            ("t4", Role::VanillaTown),
        ],
    )
    .await;
    for voter in ["t1", "t2", "t3", "t4"] {
        messenger.add_comment(&state.game.main_post_id, voter, "!vote u/wolf");
    }

    let now = messenger.advance(Duration::hours(2));
    let state = run(&mut engine, state, now).await;

    assert_eq!(state.game.phase, GamePhase::Active(2));
    assert_eq!(state.game.dead_players, vec![name("wolf")]);
    assert_eq!(state.game.roles.get(&name("rb")), Some(&Role::Wolf));
    assert_eq!(state.game.roles.get(&name("wolf")), Some(&Role::Wolf));

    let notices = messenger.sent_to("rb");
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].subject, "Night results for Phase 1");
    assert!(notices[0].body.contains("no longer roleblock"));
}
