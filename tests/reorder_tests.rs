mod common;

use rand::Rng;

use taskdeck_backend::api::dto::{CreateCardRequest, MoveCardRequest, UpdateColumnsRequest};
use taskdeck_backend::domain::{Column, TaskdeckError};
use taskdeck_backend::services::{BoardService, CardService};

fn move_req(column_id: &str, position: Option<i64>) -> MoveCardRequest {
    MoveCardRequest {
        board_id: None,
        column_id: column_id.into(),
        position,
    }
}

fn move_to_board(board_id: &str, column_id: &str, position: Option<i64>) -> MoveCardRequest {
    MoveCardRequest {
        board_id: Some(board_id.into()),
        column_id: column_id.into(),
        position,
    }
}

#[tokio::test]
async fn create_appends_at_end() {
    let pool = common::setup_pool().await;
    let (user, _) = common::seed_user(&pool, "alice").await;
    let board = common::seed_board(&pool, &user, "Board").await;

    for i in 0..4 {
        common::seed_card(&pool, &user, &board, "todo", &format!("card-{}", i)).await;
    }

    let cards = common::partition_cards(&pool, &board, "todo").await;
    let positions: Vec<i64> = cards.iter().map(|(_, p)| *p).collect();
    assert_eq!(positions, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn forward_move_shifts_intermediates_toward_front() {
    let pool = common::setup_pool().await;
    let (user, _) = common::seed_user(&pool, "alice").await;
    let board = common::seed_board(&pool, &user, "Board").await;

    let mut ids = Vec::new();
    for i in 0..4 {
        ids.push(common::seed_card(&pool, &user, &board, "todo", &format!("card-{}", i)).await);
    }

    // [0,1,2,3]: card at position 1 moves to position 3.
    CardService::move_card(&pool, &user, &ids[1], move_req("todo", Some(3)))
        .await
        .unwrap();

    let cards = common::partition_cards(&pool, &board, "todo").await;
    let order: Vec<&str> = cards.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(order, vec![&ids[0], &ids[2], &ids[3], &ids[1]]);
    common::assert_dense(&pool, &board, "todo").await;
}

#[tokio::test]
async fn backward_move_shifts_intermediates_toward_back() {
    let pool = common::setup_pool().await;
    let (user, _) = common::seed_user(&pool, "alice").await;
    let board = common::seed_board(&pool, &user, "Board").await;

    let mut ids = Vec::new();
    for i in 0..4 {
        ids.push(common::seed_card(&pool, &user, &board, "todo", &format!("card-{}", i)).await);
    }

    CardService::move_card(&pool, &user, &ids[3], move_req("todo", Some(1)))
        .await
        .unwrap();

    let cards = common::partition_cards(&pool, &board, "todo").await;
    let order: Vec<&str> = cards.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(order, vec![&ids[0], &ids[3], &ids[1], &ids[2]]);
    common::assert_dense(&pool, &board, "todo").await;
}

#[tokio::test]
async fn noop_move_leaves_all_positions_unchanged() {
    let pool = common::setup_pool().await;
    let (user, _) = common::seed_user(&pool, "alice").await;
    let board = common::seed_board(&pool, &user, "Board").await;

    for i in 0..3 {
        common::seed_card(&pool, &user, &board, "todo", &format!("card-{}", i)).await;
    }
    let before = common::partition_cards(&pool, &board, "todo").await;

    let moved_id = before[1].0.clone();
    CardService::move_card(&pool, &user, &moved_id, move_req("todo", Some(1)))
        .await
        .unwrap();

    let after = common::partition_cards(&pool, &board, "todo").await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn move_round_trip_restores_original_ordering() {
    let pool = common::setup_pool().await;
    let (user, _) = common::seed_user(&pool, "alice").await;
    let board = common::seed_board(&pool, &user, "Board").await;

    for i in 0..5 {
        common::seed_card(&pool, &user, &board, "todo", &format!("card-{}", i)).await;
    }
    let before = common::partition_cards(&pool, &board, "todo").await;

    let moved_id = before[1].0.clone();
    CardService::move_card(&pool, &user, &moved_id, move_req("todo", Some(4)))
        .await
        .unwrap();
    CardService::move_card(&pool, &user, &moved_id, move_req("todo", Some(1)))
        .await
        .unwrap();

    let after = common::partition_cards(&pool, &board, "todo").await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn cross_partition_move_densifies_both_sides() {
    let pool = common::setup_pool().await;
    let (user, _) = common::seed_user(&pool, "alice").await;
    let board = common::seed_board(&pool, &user, "Board").await;

    // Partition A: 3 cards, partition B: 2 cards.
    let mut a = Vec::new();
    for i in 0..3 {
        a.push(common::seed_card(&pool, &user, &board, "todo", &format!("a-{}", i)).await);
    }
    let mut b = Vec::new();
    for i in 0..2 {
        b.push(common::seed_card(&pool, &user, &board, "done", &format!("b-{}", i)).await);
    }

    // Card at position 1 of A moves to the head of B.
    CardService::move_card(&pool, &user, &a[1], move_req("done", Some(0)))
        .await
        .unwrap();

    let source = common::partition_cards(&pool, &board, "todo").await;
    let source_order: Vec<&str> = source.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(source_order, vec![&a[0], &a[2]]);

    let dest = common::partition_cards(&pool, &board, "done").await;
    let dest_order: Vec<&str> = dest.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(dest_order, vec![&a[1], &b[0], &b[1]]);

    common::assert_dense(&pool, &board, "todo").await;
    common::assert_dense(&pool, &board, "done").await;
}

#[tokio::test]
async fn move_across_boards() {
    let pool = common::setup_pool().await;
    let (user, _) = common::seed_user(&pool, "alice").await;
    let board_a = common::seed_board(&pool, &user, "A").await;
    let board_b = common::seed_board(&pool, &user, "B").await;

    let card = common::seed_card(&pool, &user, &board_a, "todo", "traveler").await;
    common::seed_card(&pool, &user, &board_a, "todo", "stays").await;
    common::seed_card(&pool, &user, &board_b, "todo", "resident").await;

    let moved = CardService::move_card(
        &pool,
        &user,
        &card,
        move_to_board(&board_b, "todo", Some(0)),
    )
    .await
    .unwrap();

    assert_eq!(moved.board_id, board_b);
    assert_eq!(moved.position, 0);
    common::assert_dense(&pool, &board_a, "todo").await;
    common::assert_dense(&pool, &board_b, "todo").await;
    assert_eq!(common::partition_cards(&pool, &board_b, "todo").await.len(), 2);
}

#[tokio::test]
async fn delete_closes_the_gap() {
    let pool = common::setup_pool().await;
    let (user, _) = common::seed_user(&pool, "alice").await;
    let board = common::seed_board(&pool, &user, "Board").await;

    let mut ids = Vec::new();
    for i in 0..4 {
        ids.push(common::seed_card(&pool, &user, &board, "todo", &format!("card-{}", i)).await);
    }

    CardService::delete_card(&pool, &user, &ids[1]).await.unwrap();

    let cards = common::partition_cards(&pool, &board, "todo").await;
    let order: Vec<&str> = cards.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(order, vec![&ids[0], &ids[2], &ids[3]]);
    common::assert_dense(&pool, &board, "todo").await;
}

#[tokio::test]
async fn out_of_range_targets_are_clamped() {
    let pool = common::setup_pool().await;
    let (user, _) = common::seed_user(&pool, "alice").await;
    let board = common::seed_board(&pool, &user, "Board").await;

    let mut ids = Vec::new();
    for i in 0..3 {
        ids.push(common::seed_card(&pool, &user, &board, "todo", &format!("card-{}", i)).await);
    }

    // Way past the end lands on the last slot.
    let moved = CardService::move_card(&pool, &user, &ids[0], move_req("todo", Some(999)))
        .await
        .unwrap();
    assert_eq!(moved.position, 2);
    common::assert_dense(&pool, &board, "todo").await;

    // Negative lands on the head.
    let moved = CardService::move_card(&pool, &user, &ids[0], move_req("todo", Some(-7)))
        .await
        .unwrap();
    assert_eq!(moved.position, 0);
    common::assert_dense(&pool, &board, "todo").await;

    // Omitted position appends, including cross-partition.
    let moved = CardService::move_card(&pool, &user, &ids[0], move_req("done", None))
        .await
        .unwrap();
    assert_eq!(moved.column_id, "done");
    assert_eq!(moved.position, 0);
    common::assert_dense(&pool, &board, "todo").await;
}

#[tokio::test]
async fn unknown_destination_is_rejected_without_mutation() {
    let pool = common::setup_pool().await;
    let (user, _) = common::seed_user(&pool, "alice").await;
    let board = common::seed_board(&pool, &user, "Board").await;

    for i in 0..3 {
        common::seed_card(&pool, &user, &board, "todo", &format!("card-{}", i)).await;
    }
    let before = common::partition_cards(&pool, &board, "todo").await;
    let card_id = before[0].0.clone();

    let err = CardService::move_card(&pool, &user, &card_id, move_req("no-such-column", Some(0)))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskdeckError::InvalidTarget(_)));

    let err = CardService::move_card(
        &pool,
        &user,
        &card_id,
        move_to_board("no-such-board", "todo", Some(0)),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, TaskdeckError::InvalidTarget(_)));

    let after = common::partition_cards(&pool, &board, "todo").await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn missing_or_foreign_cards_are_not_found() {
    let pool = common::setup_pool().await;
    let (alice, _) = common::seed_user(&pool, "alice").await;
    let (bob, _) = common::seed_user(&pool, "bob").await;
    let board = common::seed_board(&pool, &alice, "Board").await;
    let card = common::seed_card(&pool, &alice, &board, "todo", "private").await;

    let err = CardService::move_card(&pool, &alice, "nope", move_req("todo", Some(0)))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskdeckError::NotFound(_)));

    // Bob cannot move or delete Alice's card.
    let err = CardService::move_card(&pool, &bob, &card, move_req("todo", Some(0)))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskdeckError::NotFound(_)));

    let err = CardService::delete_card(&pool, &bob, &card).await.unwrap_err();
    assert!(matches!(err, TaskdeckError::NotFound(_)));
}

#[tokio::test]
async fn density_holds_under_random_operation_sequences() {
    let pool = common::setup_pool().await;
    let (user, _) = common::seed_user(&pool, "alice").await;
    let board = common::seed_board(&pool, &user, "Board").await;
    let columns = ["todo", "in-progress", "done"];

    let mut live: Vec<String> = Vec::new();
    let mut rng = rand::thread_rng();

    for step in 0..150 {
        let roll: u8 = rng.gen_range(0..10);
        if roll < 4 || live.is_empty() {
            let column = columns[rng.gen_range(0..columns.len())];
            let id =
                common::seed_card(&pool, &user, &board, column, &format!("card-{}", step)).await;
            live.push(id);
        } else if roll < 8 {
            let id = live[rng.gen_range(0..live.len())].clone();
            let column = columns[rng.gen_range(0..columns.len())];
            // Deliberately allow out-of-range targets; clamping must hold.
            let position: i64 = rng.gen_range(-2..12);
            CardService::move_card(&pool, &user, &id, move_req(column, Some(position)))
                .await
                .unwrap();
        } else {
            let idx = rng.gen_range(0..live.len());
            let id = live.swap_remove(idx);
            CardService::delete_card(&pool, &user, &id).await.unwrap();
        }

        for column in &columns {
            common::assert_dense(&pool, &board, column).await;
        }
    }

    let total: usize = {
        let mut n = 0;
        for column in &columns {
            n += common::partition_cards(&pool, &board, column).await.len();
        }
        n
    };
    assert_eq!(total, live.len());
}

#[tokio::test]
async fn concurrent_moves_never_break_density() {
    // File-backed database so multiple pooled connections race for real.
    let db_file = tempfile::NamedTempFile::new().unwrap();
    let url = format!("sqlite:{}", db_file.path().display());
    let pool = taskdeck_backend::infrastructure::db::init_db(&url)
        .await
        .unwrap();

    let (user, _) = common::seed_user(&pool, "alice").await;
    let board = common::seed_board(&pool, &user, "Board").await;

    let mut ids = Vec::new();
    for i in 0..4 {
        ids.push(common::seed_card(&pool, &user, &board, "todo", &format!("t-{}", i)).await);
    }
    for i in 0..4 {
        ids.push(common::seed_card(&pool, &user, &board, "done", &format!("d-{}", i)).await);
    }

    let mut handles = Vec::new();
    for worker in 0..4 {
        let pool = pool.clone();
        let user = user.clone();
        let ids = ids.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..25 {
                // ThreadRng is not Send, so keep it out of the await scope.
                let (id, column, position) = {
                    let mut rng = rand::thread_rng();
                    let id = ids[rng.gen_range(0..ids.len())].clone();
                    let column = if rng.gen_bool(0.5) { "todo" } else { "done" };
                    let position: i64 = rng.gen_range(0..8);
                    (id, column, position)
                };
                // A lost write race surfaces as Conflict; the contract is
                // that retrying is always safe.
                loop {
                    match CardService::move_card(
                        &pool,
                        &user,
                        &id,
                        MoveCardRequest {
                            board_id: None,
                            column_id: column.into(),
                            position: Some(position),
                        },
                    )
                    .await
                    {
                        Ok(_) => break,
                        Err(TaskdeckError::Conflict(_)) => {
                            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
                        }
                        Err(e) => panic!("worker {} failed: {:?}", worker, e),
                    }
                }
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    common::assert_dense(&pool, &board, "todo").await;
    common::assert_dense(&pool, &board, "done").await;

    let todo = common::partition_cards(&pool, &board, "todo").await.len();
    let done = common::partition_cards(&pool, &board, "done").await.len();
    assert_eq!(todo + done, ids.len());
}

#[tokio::test]
async fn concurrent_column_removal_never_orphans_cards() {
    let db_file = tempfile::NamedTempFile::new().unwrap();
    let url = format!("sqlite:{}", db_file.path().display());
    let pool = taskdeck_backend::infrastructure::db::init_db(&url)
        .await
        .unwrap();

    let (user, _) = common::seed_user(&pool, "alice").await;

    for round in 0..20 {
        let board = common::seed_board_with_columns(
            &pool,
            &user,
            &format!("Board {}", round),
            &["keep", "doomed"],
        )
        .await;

        // One task races a card into the column the other task is dropping.
        let creator = {
            let pool = pool.clone();
            let user = user.clone();
            let board = board.clone();
            tokio::spawn(async move {
                loop {
                    let req = CreateCardRequest {
                        board_id: board.clone(),
                        column_id: "doomed".into(),
                        title: "straggler".into(),
                        description: None,
                        priority: None,
                        due_date: None,
                    };
                    match CardService::create_card(&pool, &user, req).await {
                        Ok(_) => break true,
                        Err(TaskdeckError::Conflict(_)) => {
                            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
                        }
                        // The column was already gone; a legal outcome.
                        Err(TaskdeckError::InvalidTarget(_)) => break false,
                        Err(e) => panic!("create failed: {:?}", e),
                    }
                }
            })
        };

        let dropper = {
            let pool = pool.clone();
            let user = user.clone();
            let board = board.clone();
            tokio::spawn(async move {
                loop {
                    let req = UpdateColumnsRequest {
                        columns: vec![Column {
                            id: "keep".into(),
                            title: "Keep".into(),
                            color: "gray".into(),
                            position: 0,
                        }],
                    };
                    match BoardService::update_columns(&pool, &user, &board, req).await {
                        Ok(_) => break true,
                        Err(TaskdeckError::Conflict(_)) => {
                            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
                        }
                        // The card landed first; the drop must be refused.
                        Err(TaskdeckError::InvalidTarget(_)) => break false,
                        Err(e) => panic!("drop failed: {:?}", e),
                    }
                }
            })
        };

        let created = creator.await.unwrap();
        let dropped = dropper.await.unwrap();

        // Only serialized outcomes are allowed: either the card landed and
        // the removal was refused, or the removal won and the create was
        // refused.
        assert_ne!(
            created, dropped,
            "round {}: create and drop both {}",
            round,
            if created { "succeeded" } else { "failed" }
        );

        let board_model = BoardService::get_board_model(&pool, &user, &board)
            .await
            .unwrap();
        let column_ids: Vec<String> = board_model
            .parse_columns()
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();

        let card_columns: Vec<(String,)> =
            sqlx::query_as("SELECT column_id FROM cards WHERE board_id = ? AND is_archived = 0")
                .bind(&board)
                .fetch_all(&pool)
                .await
                .unwrap();
        for (column_id,) in &card_columns {
            assert!(
                column_ids.contains(column_id),
                "round {}: active card references removed column {}",
                round,
                column_id
            );
        }
    }
}
