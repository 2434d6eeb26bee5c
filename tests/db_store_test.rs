//! Tests for the game and user stores.

use diesel::Connection;
use diesel::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tempfile::NamedTempFile;
use uuid::Uuid;

use tictactoe_arena::{
    Game, GameStatus, GameStore, Mark, NewUser, User, UserStore,
};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Creates a temporary database file with schema applied, returns the file
/// handle (must stay in scope to keep the file alive) and ready stores.
fn setup_test_db() -> (NamedTempFile, GameStore, UserStore) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();

    let mut conn = SqliteConnection::establish(&db_path).expect("Failed to connect");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Migrations failed");

    let games = GameStore::new(db_path.clone());
    let users = UserStore::new(db_path);
    (db_file, games, users)
}

fn create_user(users: &UserStore, name: &str) -> User {
    users
        .create_user(NewUser::with_fresh_id(name, name, "salt$digest"))
        .expect("Create user failed")
}

/// Seats `x` and `o` into their named slots and plays the column-1 X win:
/// X(1,1) O(0,0) X(0,1) O(2,2) X(2,1).
fn finished_game(x: Uuid, o: Uuid) -> Game {
    let mut game = game_with_players(x, o);
    game.place(Mark::X, 1, 1).expect("Move failed");
    game.place(Mark::O, 0, 0).expect("Move failed");
    game.place(Mark::X, 0, 1).expect("Move failed");
    game.place(Mark::O, 2, 2).expect("Move failed");
    game.place(Mark::X, 2, 1).expect("Move failed");
    assert_eq!(*game.status(), GameStatus::XWon);
    game
}

fn game_with_players(x: Uuid, o: Uuid) -> Game {
    let board = tictactoe_arena::Board::new();
    Game::from_stored(
        Uuid::new_v4(),
        "stored game".to_string(),
        Some(x),
        Some(o),
        board,
        GameStatus::XTurn,
    )
}

#[test]
fn insert_and_get_round_trip() {
    let (_db, games, _users) = setup_test_db();
    let game = Game::new("round trip");

    games.insert_game(&game).expect("Insert failed");
    let loaded = games.get_by_id(*game.id()).expect("Get failed");

    assert_eq!(loaded, game);
}

#[test]
fn round_trip_preserves_bindings_board_and_status() {
    let (_db, games, _users) = setup_test_db();
    let mut game = game_with_players(Uuid::new_v4(), Uuid::new_v4());
    game.place(Mark::X, 1, 1).expect("Move failed");
    game.place(Mark::O, 0, 2).expect("Move failed");

    games.insert_game(&game).expect("Insert failed");
    let loaded = games.get_by_id(*game.id()).expect("Get failed");

    assert_eq!(loaded.player_x_id(), game.player_x_id());
    assert_eq!(loaded.player_o_id(), game.player_o_id());
    assert_eq!(loaded.board(), game.board());
    assert_eq!(loaded.status(), game.status());
    assert_eq!(loaded.name(), game.name());
}

#[test]
fn get_missing_game_is_not_found() {
    let (_db, games, _users) = setup_test_db();
    let err = games.get_by_id(Uuid::new_v4()).expect_err("Should miss");
    assert!(err.is_not_found());
}

#[test]
fn update_overwrites_the_stored_row() {
    let (_db, games, users) = setup_test_db();
    let alice = create_user(&users, "alice");
    let bob = create_user(&users, "bob");

    let mut game = Game::new("evolving");
    games.insert_game(&game).expect("Insert failed");

    let mut rng = rand::thread_rng();
    game.join(alice.uuid().expect("Bad id"), &mut rng)
        .expect("Join failed");
    games.update_game(&game).expect("Update failed");
    game.join(bob.uuid().expect("Bad id"), &mut rng)
        .expect("Join failed");
    games.update_game(&game).expect("Update failed");

    let loaded = games.get_by_id(*game.id()).expect("Get failed");
    assert_eq!(loaded, game);
    assert_eq!(*loaded.status(), GameStatus::XTurn);
}

#[test]
fn update_missing_game_is_not_found() {
    let (_db, games, _users) = setup_test_db();
    let game = Game::new("never inserted");
    let err = games.update_game(&game).expect_err("Should miss");
    assert!(err.is_not_found());
}

#[test]
fn games_by_player_matches_either_slot() {
    let (_db, games, _users) = setup_test_db();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let carol = Uuid::new_v4();

    games
        .insert_game(&game_with_players(alice, bob))
        .expect("Insert failed");
    games
        .insert_game(&game_with_players(carol, alice))
        .expect("Insert failed");
    games
        .insert_game(&game_with_players(bob, carol))
        .expect("Insert failed");

    let alices = games.games_by_player(alice).expect("Query failed");
    assert_eq!(alices.len(), 2);
    assert!(alices.iter().all(|g| g.mark_of(alice).is_some()));

    let nobody = games.games_by_player(Uuid::new_v4()).expect("Query failed");
    assert!(nobody.is_empty());
}

#[test]
fn open_games_returns_only_waiting_games() {
    let (_db, games, _users) = setup_test_db();

    let open = Game::new("open");
    games.insert_game(&open).expect("Insert failed");
    // One seated player is not enough to start the game, so it stays open.
    let mut half_seated = Game::new("half seated");
    half_seated
        .join(Uuid::new_v4(), &mut rand::thread_rng())
        .expect("Join failed");
    games.insert_game(&half_seated).expect("Insert failed");
    games
        .insert_game(&game_with_players(Uuid::new_v4(), Uuid::new_v4()))
        .expect("Insert failed");
    games
        .insert_game(&finished_game(Uuid::new_v4(), Uuid::new_v4()))
        .expect("Insert failed");

    let listed = games.open_games().expect("Query failed");
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().any(|g| g.id() == open.id()));
    assert!(listed.iter().any(|g| g.id() == half_seated.id()));
    assert!(
        listed
            .iter()
            .all(|g| *g.status() == GameStatus::WaitingForPlayers)
    );
}

#[test]
fn list_games_is_a_full_scan() {
    let (_db, games, _users) = setup_test_db();
    for i in 0..3 {
        games
            .insert_game(&Game::new(format!("game {i}")))
            .expect("Insert failed");
    }
    let all = games.list_games().expect("Query failed");
    assert_eq!(all.len(), 3);
}

#[test]
fn standings_count_wins_losses_and_draws() {
    let (_db, games, _users) = setup_test_db();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    // Alice wins as X (the worked scenario).
    games
        .insert_game(&finished_game(alice, bob))
        .expect("Insert failed");
    // Alice loses as O to the same line.
    games
        .insert_game(&finished_game(bob, alice))
        .expect("Insert failed");
    // A draw between them.
    let mut drawn = game_with_players(alice, bob);
    let moves = [
        (Mark::X, 0, 0),
        (Mark::O, 0, 1),
        (Mark::X, 0, 2),
        (Mark::O, 1, 1),
        (Mark::X, 1, 0),
        (Mark::O, 1, 2),
        (Mark::X, 2, 1),
        (Mark::O, 2, 0),
        (Mark::X, 2, 2),
    ];
    for (mark, row, col) in moves {
        drawn.place(mark, row, col).expect("Move failed");
    }
    assert_eq!(*drawn.status(), GameStatus::Draw);
    games.insert_game(&drawn).expect("Insert failed");

    let alice_standing = games.win_loss_draw(alice).expect("Standings failed");
    assert_eq!(*alice_standing.wins(), 1);
    assert_eq!(*alice_standing.losses(), 1);
    assert_eq!(*alice_standing.draws(), 1);
    assert_eq!(alice_standing.total(), 3);

    // A loss is the opponent's win: Bob's counts mirror Alice's.
    let bob_standing = games.win_loss_draw(bob).expect("Standings failed");
    assert_eq!(*bob_standing.wins(), 1);
    assert_eq!(*bob_standing.losses(), 1);
    assert_eq!(*bob_standing.draws(), 1);
}

#[test]
fn standings_exclude_games_in_progress() {
    let (_db, games, _users) = setup_test_db();
    let alice = Uuid::new_v4();

    let mut waiting = Game::new("waiting");
    waiting
        .join(alice, &mut rand::thread_rng())
        .expect("Join failed");
    games.insert_game(&waiting).expect("Insert failed");

    let mut running = game_with_players(alice, Uuid::new_v4());
    running.place(Mark::X, 0, 0).expect("Move failed");
    games.insert_game(&running).expect("Insert failed");

    let standing = games.win_loss_draw(alice).expect("Standings failed");
    assert_eq!(standing.total(), 0);
    assert_eq!(standing.win_rate(), 0.0);
}

#[test]
fn fill_display_names_resolves_bound_slots_in_batch() {
    let (_db, games, users) = setup_test_db();
    let alice = create_user(&users, "alice");
    let bob = create_user(&users, "bob");
    let alice_id = alice.uuid().expect("Bad id");
    let bob_id = bob.uuid().expect("Bad id");

    let mut batch = vec![
        game_with_players(alice_id, bob_id),
        game_with_players(bob_id, alice_id),
        Game::new("unseated"),
    ];
    games
        .fill_display_names(&users, &mut batch)
        .expect("Fill failed");

    assert_eq!(batch[0].player_name(Mark::X), Some("alice"));
    assert_eq!(batch[0].player_name(Mark::O), Some("bob"));
    assert_eq!(batch[1].player_name(Mark::X), Some("bob"));
    assert_eq!(batch[1].player_name(Mark::O), Some("alice"));
    assert_eq!(batch[2].player_name(Mark::X), None);
    assert_eq!(batch[2].player_name(Mark::O), None);
}

#[test]
fn create_user_and_look_up() {
    let (_db, _games, users) = setup_test_db();
    let user = create_user(&users, "carol");

    let by_name = users.get_by_name("carol").expect("Query failed");
    assert_eq!(by_name.expect("User missing").id(), user.id());

    let by_id = users
        .get_by_id(user.uuid().expect("Bad id"))
        .expect("Query failed");
    assert_eq!(by_id.expect("User missing").user_name(), "carol");
}

#[test]
fn duplicate_user_name_is_a_conflict() {
    let (_db, _games, users) = setup_test_db();
    create_user(&users, "dave");
    let err = users
        .create_user(NewUser::with_fresh_id("dave", "Dave II", "salt$digest"))
        .expect_err("Duplicate user name should fail");
    assert!(err.is_conflict(), "Unique violation should classify as conflict");
    assert!(!err.is_not_found());
}

#[test]
fn get_missing_user_is_none() {
    let (_db, _games, users) = setup_test_db();
    assert!(
        users
            .get_by_name("nobody")
            .expect("Query failed")
            .is_none()
    );
    assert!(
        users
            .get_by_id(Uuid::new_v4())
            .expect("Query failed")
            .is_none()
    );
}

#[test]
fn update_display_name_persists() {
    let (_db, _games, users) = setup_test_db();
    let user = create_user(&users, "erin");
    let id = user.uuid().expect("Bad id");

    let updated = users
        .update_display_name(id, "Erin the Bold")
        .expect("Update failed");
    assert_eq!(updated.display_name(), "Erin the Bold");

    let reloaded = users.get_by_id(id).expect("Query failed");
    assert_eq!(
        reloaded.expect("User missing").display_name(),
        "Erin the Bold"
    );
}

#[test]
fn update_display_name_for_missing_user_is_not_found() {
    let (_db, _games, users) = setup_test_db();
    let err = users
        .update_display_name(Uuid::new_v4(), "ghost")
        .expect_err("Should miss");
    assert!(err.is_not_found());
}

#[test]
fn resolve_by_ids_skips_unknown_ids() {
    let (_db, _games, users) = setup_test_db();
    let alice = create_user(&users, "alice");
    let bob = create_user(&users, "bob");
    let alice_id = alice.uuid().expect("Bad id");
    let bob_id = bob.uuid().expect("Bad id");
    let unknown = Uuid::new_v4();

    let profiles = users
        .resolve_by_ids(&[alice_id, bob_id, unknown])
        .expect("Resolve failed");

    assert_eq!(profiles.len(), 2);
    assert_eq!(
        profiles.get(&alice_id).expect("Missing").display_name(),
        "alice"
    );
    assert!(!profiles.contains_key(&unknown));
}
