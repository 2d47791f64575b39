use serde_json::json;
use std::sync::{Arc, Barrier};
use std::thread;
use taskboard_core::db::{open_db, open_db_in_memory};
use taskboard_core::{
    AttributeKind, AttributeRegistry, BoardService, CoreError, CreateAttributeRequest,
    CreateContentRequest, ContentEngine, ContentKind, Entity, Repositories, SqliteRepositories,
    UpdateField, UpdateRequest,
};

fn seed_board(repos: Repositories<'_>, name: &str) -> i64 {
    let owner = repos
        .users
        .insert_user(&format!("{name}-owner"), "owner@example.com")
        .unwrap();
    BoardService::new(repos)
        .create_board(Some(owner.id), Some(name), None)
        .unwrap()
        .id
}

#[test]
fn duplicate_name_in_same_board_conflicts_but_other_board_succeeds() {
    let conn = open_db_in_memory().unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let ports = repos.ports();
    let types = AttributeRegistry::new(AttributeKind::Type, ports);
    let board_one = seed_board(ports, "one");
    let board_two = seed_board(ports, "two");

    let bug = types
        .create(&CreateAttributeRequest::new(board_one, "Bug").with_description("defect"))
        .unwrap();
    assert_eq!(bug.name, "Bug");
    assert_eq!(bug.kind, AttributeKind::Type);
    assert_eq!(bug.description, "defect");

    let err = types
        .create(&CreateAttributeRequest::new(board_one, "bug"))
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)), "got {err}");

    let elsewhere = types
        .create(&CreateAttributeRequest::new(board_two, "Bug"))
        .unwrap();
    assert_eq!(elsewhere.board_id, board_two);
    assert_ne!(elsewhere.id, bug.id);
}

#[test]
fn concurrent_creates_of_one_name_admit_a_single_winner() {
    const WRITERS: usize = 8;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.sqlite3");
    let board = {
        let conn = open_db(&path).unwrap();
        let repos = SqliteRepositories::try_new(&conn).unwrap();
        seed_board(repos.ports(), "shared")
    };

    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles = (0..WRITERS)
        .map(|_| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let repos = SqliteRepositories::try_new(&conn).unwrap();
                let statuses = AttributeRegistry::new(AttributeKind::Status, repos.ports());
                barrier.wait();
                match statuses.create(&CreateAttributeRequest::new(board, "Open")) {
                    Ok(_) => true,
                    Err(CoreError::Conflict(_)) => false,
                    Err(err) => panic!("unexpected create error: {err}"),
                }
            })
        })
        .collect::<Vec<_>>();
    let winners = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|created| *created)
        .count();
    assert_eq!(winners, 1);

    let conn = open_db(&path).unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let stored = AttributeRegistry::new(AttributeKind::Status, repos.ports())
        .get_all_in_board(board)
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Open");
}

#[test]
fn same_name_is_allowed_across_families() {
    let conn = open_db_in_memory().unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let ports = repos.ports();
    let board = seed_board(ports, "main");

    AttributeRegistry::new(AttributeKind::Status, ports)
        .create(&CreateAttributeRequest::new(board, "Review"))
        .unwrap();
    AttributeRegistry::new(AttributeKind::Type, ports)
        .create(&CreateAttributeRequest::new(board, "Review"))
        .unwrap();
}

#[test]
fn missing_fields_are_null_input_and_bad_names_are_illegal() {
    let conn = open_db_in_memory().unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let ports = repos.ports();
    let statuses = AttributeRegistry::new(AttributeKind::Status, ports);
    let board = seed_board(ports, "main");

    let no_name = CreateAttributeRequest {
        board_id: Some(board),
        ..CreateAttributeRequest::default()
    };
    assert!(matches!(
        statuses.create(&no_name),
        Err(CoreError::NullInput("name"))
    ));

    let no_board = CreateAttributeRequest {
        name: Some("Done".to_string()),
        ..CreateAttributeRequest::default()
    };
    assert!(matches!(
        statuses.create(&no_board),
        Err(CoreError::NullInput("board_id"))
    ));

    let too_long = "x".repeat(51);
    for bad in ["", "   ", "-leading", "bad/slash", too_long.as_str()] {
        let err = statuses
            .create(&CreateAttributeRequest::new(board, bad))
            .unwrap_err();
        assert!(matches!(err, CoreError::IllegalInput(_)), "{bad:?} gave {err}");
    }

    let err = statuses
        .create(&CreateAttributeRequest::new(board + 100, "Done"))
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::NotFound {
            entity: Entity::Board,
            ..
        }
    ));
}

#[test]
fn lookups_are_scoped_to_the_owning_board() {
    let conn = open_db_in_memory().unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let ports = repos.ports();
    let statuses = AttributeRegistry::new(AttributeKind::Status, ports);
    let board_one = seed_board(ports, "one");
    let board_two = seed_board(ports, "two");

    let todo = statuses
        .create(&CreateAttributeRequest::new(board_one, "Todo"))
        .unwrap();
    statuses
        .create(&CreateAttributeRequest::new(board_one, "Done"))
        .unwrap();
    statuses
        .create(&CreateAttributeRequest::new(board_two, "Todo"))
        .unwrap();

    assert_eq!(statuses.get(board_one, todo.id).unwrap(), todo);
    assert!(matches!(
        statuses.get(board_two, todo.id),
        Err(CoreError::NotFound {
            entity: Entity::Status,
            ..
        })
    ));
    assert!(matches!(
        AttributeRegistry::new(AttributeKind::Type, ports).get(board_one, todo.id),
        Err(CoreError::NotFound {
            entity: Entity::Type,
            ..
        })
    ));

    assert_eq!(statuses.get_all_in_board(board_one).unwrap().len(), 2);
    assert_eq!(statuses.get_all_in_board(board_two).unwrap().len(), 1);
    assert_eq!(statuses.get_all().unwrap().len(), 3);
    assert!(AttributeRegistry::new(AttributeKind::Type, ports)
        .get_all_in_board(board_one)
        .unwrap()
        .is_empty());
}

#[test]
fn check_similarity_matches_substrings_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let ports = repos.ports();
    let types = AttributeRegistry::new(AttributeKind::Type, ports);
    let board = seed_board(ports, "main");

    for name in ["Bug", "Bugfix", "Feature", "100_percent"] {
        types
            .create(&CreateAttributeRequest::new(board, name))
            .unwrap();
    }

    let mut similar = types
        .check_similarity(board, "BUG")
        .unwrap()
        .into_iter()
        .map(|attribute| attribute.name)
        .collect::<Vec<_>>();
    similar.sort();
    assert_eq!(similar, vec!["Bug", "Bugfix"]);

    let underscore = types.check_similarity(board, "_").unwrap();
    assert_eq!(underscore.len(), 1);
    assert_eq!(underscore[0].name, "100_percent");

    assert!(types.check_similarity(board, "epic").unwrap().is_empty());
}

#[test]
fn delete_clears_item_references_and_then_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let ports = repos.ports();
    let boards = BoardService::new(ports);
    let statuses = AttributeRegistry::new(AttributeKind::Status, ports);
    let types = AttributeRegistry::new(AttributeKind::Type, ports);

    let owner = ports.users.insert_user("owner", "owner@example.com").unwrap();
    let board = boards
        .create_board(Some(owner.id), Some("main"), None)
        .unwrap();
    let section = boards
        .create_section(Some(board.id), Some("Backlog"), None)
        .unwrap();
    let todo = statuses
        .create(&CreateAttributeRequest::new(board.id, "Todo"))
        .unwrap();
    let task = types
        .create(&CreateAttributeRequest::new(board.id, "Task"))
        .unwrap();
    let items = ContentEngine::new(ContentKind::Item, ports);
    let item = items
        .create(&CreateContentRequest {
            creator_id: Some(owner.id),
            title: Some("write docs".to_string()),
            section_id: Some(section.id),
            status_id: Some(todo.id),
            type_id: Some(task.id),
            ..CreateContentRequest::default()
        })
        .unwrap();

    assert!(statuses.delete(board.id, todo.id).unwrap());

    let survivor = items.get(item.id()).unwrap().into_item().unwrap();
    assert_eq!(survivor.status_id, None);
    assert_eq!(survivor.type_id, Some(task.id));
    assert!(matches!(
        statuses.delete(board.id, todo.id),
        Err(CoreError::NotFound { .. })
    ));
}

#[test]
fn rename_rechecks_uniqueness() {
    let conn = open_db_in_memory().unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let ports = repos.ports();
    let statuses = AttributeRegistry::new(AttributeKind::Status, ports);
    let board = seed_board(ports, "main");

    let todo = statuses
        .create(&CreateAttributeRequest::new(board, "Todo"))
        .unwrap();
    let done = statuses
        .create(&CreateAttributeRequest::new(board, "Done"))
        .unwrap();

    let err = statuses
        .update(board, done.id, &UpdateRequest::new(UpdateField::Name, "TODO"))
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));

    let recased = statuses
        .update(board, todo.id, &UpdateRequest::new(UpdateField::Name, "TODO"))
        .unwrap();
    assert_eq!(recased.name, "TODO");

    let described = statuses
        .update(
            board,
            done.id,
            &UpdateRequest::new(UpdateField::Description, "finished"),
        )
        .unwrap();
    assert_eq!(described.description, "finished");
    assert_eq!(statuses.get(board, done.id).unwrap().description, "finished");

    let err = statuses
        .update(board, done.id, &UpdateRequest::new(UpdateField::Status, json!(1)))
        .unwrap_err();
    assert_eq!(err.to_string(), "illegal input: Field object doesn't exist");
}
