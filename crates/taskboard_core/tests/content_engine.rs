use serde_json::json;
use taskboard_core::db::{open_db, open_db_in_memory};
use taskboard_core::{
    Attribute, AttributeKind, AttributeRegistry, Board, BoardService, ContentEngine, ContentKind,
    CoreError, CreateAttributeRequest, CreateContentRequest, Entity, Item, Repositories, Section,
    SharedContent, SqliteRepositories, UpdateField, UpdateRequest, User,
};

struct Fixture {
    owner: User,
    board: Board,
    section: Section,
    todo: Attribute,
    done: Attribute,
    task: Attribute,
}

fn fixture(repos: Repositories<'_>) -> Fixture {
    let owner = repos.users.insert_user("owner", "owner@example.com").unwrap();
    let boards = BoardService::new(repos);
    let board = boards
        .create_board(Some(owner.id), Some("Release"), Some("q3 release"))
        .unwrap();
    let section = boards
        .create_section(Some(board.id), Some("Backlog"), None)
        .unwrap();
    let statuses = AttributeRegistry::new(AttributeKind::Status, repos);
    let todo = statuses
        .create(&CreateAttributeRequest::new(board.id, "Todo"))
        .unwrap();
    let done = statuses
        .create(&CreateAttributeRequest::new(board.id, "Done"))
        .unwrap();
    let task = AttributeRegistry::new(AttributeKind::Type, repos)
        .create(&CreateAttributeRequest::new(board.id, "Task"))
        .unwrap();
    Fixture {
        owner,
        board,
        section,
        todo,
        done,
        task,
    }
}

fn item_request(fx: &Fixture, title: &str) -> CreateContentRequest {
    CreateContentRequest {
        creator_id: Some(fx.owner.id),
        title: Some(title.to_string()),
        section_id: Some(fx.section.id),
        status_id: Some(fx.todo.id),
        type_id: Some(fx.task.id),
        ..CreateContentRequest::default()
    }
}

fn comment_request(fx: &Fixture, item_id: i64, title: &str) -> CreateContentRequest {
    CreateContentRequest {
        creator_id: Some(fx.owner.id),
        title: Some(title.to_string()),
        item_id: Some(item_id),
        ..CreateContentRequest::default()
    }
}

fn create_item(engine: &ContentEngine<'_>, request: &CreateContentRequest) -> Item {
    engine.create(request).unwrap().into_item().unwrap()
}

#[test]
fn created_item_round_trips_through_get() {
    let conn = open_db_in_memory().unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let ports = repos.ports();
    let fx = fixture(ports);
    let items = ContentEngine::new(ContentKind::Item, ports);

    let request = CreateContentRequest {
        description: Some("cut the branch".to_string()),
        due_date: Some(1_700_000_000_000),
        importance: Some(7),
        assignee_id: Some(fx.owner.id),
        ..item_request(&fx, "  Prepare release ")
    };
    let created = create_item(&items, &request);

    assert_eq!(created.core.title, "Prepare release");
    assert_eq!(created.core.description, "cut the branch");
    assert_eq!(created.core.creator_id, fx.owner.id);
    assert!(created.core.created_at > 0);
    assert_eq!(created.board_id, fx.board.id);
    assert_eq!(created.section_id, fx.section.id);
    assert_eq!(created.status_id, Some(fx.todo.id));
    assert_eq!(created.type_id, Some(fx.task.id));
    assert_eq!(created.assignee_id, Some(fx.owner.id));
    assert_eq!(created.due_date, Some(1_700_000_000_000));
    assert_eq!(created.importance, 7);
    assert_eq!(created.parent_item_id, None);

    let fetched = items.get(created.id()).unwrap();
    assert_eq!(fetched, SharedContent::Item(created));
}

#[test]
fn create_reports_first_missing_or_unresolved_reference() {
    let conn = open_db_in_memory().unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let ports = repos.ports();
    let fx = fixture(ports);
    let items = ContentEngine::new(ContentKind::Item, ports);

    let no_status = CreateContentRequest {
        status_id: None,
        ..item_request(&fx, "x")
    };
    assert!(matches!(
        items.create(&no_status),
        Err(CoreError::NullInput("status_id"))
    ));

    let bad_section = CreateContentRequest {
        section_id: Some(999),
        ..item_request(&fx, "x")
    };
    assert!(matches!(
        items.create(&bad_section),
        Err(CoreError::NotFound {
            entity: Entity::Section,
            id: 999
        })
    ));

    let status_as_type = CreateContentRequest {
        type_id: Some(fx.todo.id),
        ..item_request(&fx, "x")
    };
    assert!(matches!(
        items.create(&status_as_type),
        Err(CoreError::NotFound {
            entity: Entity::Type,
            ..
        })
    ));

    let too_important = CreateContentRequest {
        importance: Some(11),
        ..item_request(&fx, "x")
    };
    assert!(matches!(
        items.create(&too_important),
        Err(CoreError::IllegalInput(_))
    ));

    let comments = ContentEngine::new(ContentKind::Comment, ports);
    assert!(matches!(
        comments.create(&comment_request(&fx, 404, "hello")),
        Err(CoreError::NotFound {
            entity: Entity::Item,
            id: 404
        })
    ));
}

#[test]
fn foreign_board_attribute_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let ports = repos.ports();
    let fx = fixture(ports);
    let other_board = BoardService::new(ports)
        .create_board(Some(fx.owner.id), Some("Other"), None)
        .unwrap();
    let foreign = AttributeRegistry::new(AttributeKind::Status, ports)
        .create(&CreateAttributeRequest::new(other_board.id, "Blocked"))
        .unwrap();
    let items = ContentEngine::new(ContentKind::Item, ports);

    let request = CreateContentRequest {
        status_id: Some(foreign.id),
        ..item_request(&fx, "x")
    };
    assert!(matches!(
        items.create(&request),
        Err(CoreError::IllegalInput(_))
    ));

    let item = create_item(&items, &item_request(&fx, "local"));
    let err = items
        .update(&UpdateRequest::new(UpdateField::Status, foreign.id), item.id())
        .unwrap_err();
    assert!(matches!(err, CoreError::IllegalInput(_)));
}

#[test]
fn status_update_persists_and_unknown_status_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let ports = repos.ports();
    let fx = fixture(ports);
    let items = ContentEngine::new(ContentKind::Item, ports);
    let item = create_item(&items, &item_request(&fx, "ship"));

    let updated = items
        .update(
            &UpdateRequest::new(UpdateField::Status, fx.done.id.to_string()),
            item.id(),
        )
        .unwrap()
        .into_item()
        .unwrap();
    assert_eq!(updated.status_id, Some(fx.done.id));
    assert_eq!(
        items.get(item.id()).unwrap().into_item().unwrap().status_id,
        Some(fx.done.id)
    );

    let err = items
        .update(&UpdateRequest::new(UpdateField::Status, 9_999), item.id())
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::NotFound {
            entity: Entity::Status,
            id: 9_999
        }
    ));

    let err = items
        .update(&UpdateRequest::new(UpdateField::Status, fx.todo.id), 9_999)
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::NotFound {
            entity: Entity::Item,
            id: 9_999
        }
    ));
}

#[test]
fn scalar_updates_and_bad_field_names() {
    let conn = open_db_in_memory().unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let ports = repos.ports();
    let fx = fixture(ports);
    let items = ContentEngine::new(ContentKind::Item, ports);
    let item = create_item(&items, &item_request(&fx, "ship"));

    let apply = |field: UpdateField, value: serde_json::Value| {
        items
            .update(&UpdateRequest::new(field, value), item.id())
            .map(|content| content.into_item().unwrap())
    };

    assert_eq!(apply(UpdateField::Name, json!("Ship it")).unwrap().core.title, "Ship it");
    assert_eq!(
        apply(UpdateField::Description, json!("now")).unwrap().core.description,
        "now"
    );
    assert_eq!(apply(UpdateField::DueDate, json!(42)).unwrap().due_date, Some(42));
    assert_eq!(apply(UpdateField::DueDate, json!(null)).unwrap().due_date, None);
    assert_eq!(apply(UpdateField::Importance, json!("3")).unwrap().importance, 3);
    assert!(matches!(
        apply(UpdateField::Importance, json!(99)),
        Err(CoreError::IllegalInput(_))
    ));
    assert!(matches!(
        apply(UpdateField::Name, json!("   ")),
        Err(CoreError::IllegalInput(_))
    ));
    assert!(matches!(
        apply(UpdateField::Assignee, json!(404)),
        Err(CoreError::NotFound {
            entity: Entity::User,
            ..
        })
    ));
    assert!(matches!(
        apply(UpdateField::RelatedUsers, json!([fx.owner.id])),
        Err(CoreError::IllegalInput(_))
    ));

    let unknown = UpdateRequest {
        field: Some("COLOR".to_string()),
        content: json!("red"),
    };
    assert!(matches!(
        items.update(&unknown, item.id()),
        Err(CoreError::IllegalInput(_))
    ));
    let missing = UpdateRequest {
        field: None,
        content: json!("red"),
    };
    assert!(matches!(
        items.update(&missing, item.id()),
        Err(CoreError::NullInput("field"))
    ));

    let stored = items.get(item.id()).unwrap().into_item().unwrap();
    assert_eq!(stored.core.title, "Ship it");
    assert_eq!(stored.importance, 3);
}

#[test]
fn self_parent_is_rejected_and_item_is_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let ports = repos.ports();
    let fx = fixture(ports);
    let items = ContentEngine::new(ContentKind::Item, ports);
    let item = create_item(&items, &item_request(&fx, "loop"));

    let err = items
        .update(&UpdateRequest::new(UpdateField::ParentItem, item.id()), item.id())
        .unwrap_err();
    assert!(matches!(err, CoreError::IllegalInput(_)));

    let stored = items.get(item.id()).unwrap().into_item().unwrap();
    assert_eq!(stored, item);
}

#[test]
fn parent_cycles_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let ports = repos.ports();
    let fx = fixture(ports);
    let items = ContentEngine::new(ContentKind::Item, ports);

    let root = create_item(&items, &item_request(&fx, "root"));
    let child = create_item(
        &items,
        &CreateContentRequest {
            parent_item_id: Some(root.id()),
            ..item_request(&fx, "child")
        },
    );
    let grandchild = create_item(
        &items,
        &CreateContentRequest {
            parent_item_id: Some(child.id()),
            ..item_request(&fx, "grandchild")
        },
    );
    assert_eq!(grandchild.parent_item_id, Some(child.id()));

    let err = items
        .update(
            &UpdateRequest::new(UpdateField::ParentItem, grandchild.id()),
            root.id(),
        )
        .unwrap_err();
    assert!(matches!(err, CoreError::IllegalInput(_)));
    assert_eq!(
        items.get(root.id()).unwrap().into_item().unwrap().parent_item_id,
        None
    );

    let detached = items
        .update(
            &UpdateRequest::new(UpdateField::ParentItem, json!(null)),
            grandchild.id(),
        )
        .unwrap()
        .into_item()
        .unwrap();
    assert_eq!(detached.parent_item_id, None);
}

#[test]
fn batch_delete_skips_unknown_ids() {
    let conn = open_db_in_memory().unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let ports = repos.ports();
    let fx = fixture(ports);
    let items = ContentEngine::new(ContentKind::Item, ports);
    let first = create_item(&items, &item_request(&fx, "first"));
    let second = create_item(&items, &item_request(&fx, "second"));

    assert_eq!(items.delete(&[first.id(), 999, second.id()]).unwrap(), 2);
    assert!(matches!(
        items.get(first.id()),
        Err(CoreError::NotFound { .. })
    ));
    assert_eq!(items.delete(&[first.id(), 999]).unwrap(), 0);
    assert_eq!(items.delete(&[]).unwrap(), 0);
}

#[test]
fn batch_delete_skips_rows_removed_by_another_connection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.sqlite3");
    let conn = open_db(&path).unwrap();
    let other = open_db(&path).unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let other_repos = SqliteRepositories::try_new(&other).unwrap();
    let ports = repos.ports();
    let fx = fixture(ports);
    let items = ContentEngine::new(ContentKind::Item, ports);
    let comments = ContentEngine::new(ContentKind::Comment, ports);
    let first = create_item(&items, &item_request(&fx, "first"));
    let gone = create_item(&items, &item_request(&fx, "gone"));
    let last = create_item(&items, &item_request(&fx, "last"));
    let kept = comments
        .create(&comment_request(&fx, last.id(), "kept"))
        .unwrap();
    let stale = comments
        .create(&comment_request(&fx, last.id(), "stale"))
        .unwrap();

    other_repos.ports().items.delete_item(gone.id()).unwrap();
    other_repos.ports().comments.delete_comment(stale.id()).unwrap();

    assert_eq!(comments.delete(&[stale.id(), kept.id()]).unwrap(), 1);
    assert_eq!(
        items.delete(&[first.id(), gone.id(), last.id()]).unwrap(),
        2
    );
    for id in [first.id(), gone.id(), last.id()] {
        assert!(matches!(items.get(id), Err(CoreError::NotFound { .. })));
    }
}

#[test]
fn deleting_item_cascades_to_sub_items_and_comments() {
    let conn = open_db_in_memory().unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let ports = repos.ports();
    let fx = fixture(ports);
    let items = ContentEngine::new(ContentKind::Item, ports);
    let comments = ContentEngine::new(ContentKind::Comment, ports);

    let parent = create_item(&items, &item_request(&fx, "parent"));
    let child = create_item(
        &items,
        &CreateContentRequest {
            parent_item_id: Some(parent.id()),
            ..item_request(&fx, "child")
        },
    );
    let bystander = create_item(&items, &item_request(&fx, "bystander"));
    let on_parent = comments
        .create(&comment_request(&fx, parent.id(), "on parent"))
        .unwrap();
    let on_child = comments
        .create(&CreateContentRequest {
            related_user_ids: vec![fx.owner.id],
            ..comment_request(&fx, child.id(), "on child")
        })
        .unwrap();
    let on_bystander = comments
        .create(&comment_request(&fx, bystander.id(), "kept"))
        .unwrap();

    // The child goes with its parent, so the second id is a miss.
    assert_eq!(items.delete(&[parent.id(), child.id()]).unwrap(), 1);

    for id in [on_parent.id(), on_child.id()] {
        assert!(matches!(
            comments.get(id),
            Err(CoreError::NotFound {
                entity: Entity::Comment,
                ..
            })
        ));
    }
    assert!(items.get(child.id()).is_err());
    assert!(comments.get(on_bystander.id()).is_ok());
    assert!(items.get(bystander.id()).is_ok());
}

#[test]
fn comments_track_related_users() {
    let conn = open_db_in_memory().unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let ports = repos.ports();
    let fx = fixture(ports);
    let alice = ports.users.insert_user("alice", "alice@example.com").unwrap();
    let bob = ports.users.insert_user("bob", "bob@example.com").unwrap();
    let items = ContentEngine::new(ContentKind::Item, ports);
    let comments = ContentEngine::new(ContentKind::Comment, ports);
    let item = create_item(&items, &item_request(&fx, "discuss"));

    let comment = comments
        .create(&CreateContentRequest {
            description: Some("ping both".to_string()),
            related_user_ids: vec![bob.id, alice.id, bob.id],
            ..comment_request(&fx, item.id(), "Heads up")
        })
        .unwrap()
        .into_comment()
        .unwrap();
    assert_eq!(comment.item_id, item.id());
    assert_eq!(comment.related_user_ids, vec![alice.id, bob.id]);

    let updated = comments
        .update(
            &UpdateRequest::new(UpdateField::RelatedUsers, json!([bob.id])),
            comment.id(),
        )
        .unwrap()
        .into_comment()
        .unwrap();
    assert_eq!(updated.related_user_ids, vec![bob.id]);

    let err = comments
        .update(&UpdateRequest::new(UpdateField::Status, fx.done.id), comment.id())
        .unwrap_err();
    assert_eq!(err.to_string(), "illegal input: Field object doesn't exist");

    let missing_title = CreateContentRequest {
        title: None,
        ..comment_request(&fx, item.id(), "")
    };
    assert!(matches!(
        comments.create(&missing_title),
        Err(CoreError::NullInput("title"))
    ));
}

#[test]
fn queries_by_item_section_board_and_status() {
    let conn = open_db_in_memory().unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let ports = repos.ports();
    let fx = fixture(ports);
    let items = ContentEngine::new(ContentKind::Item, ports);
    let comments = ContentEngine::new(ContentKind::Comment, ports);
    let second_section = BoardService::new(ports)
        .create_section(Some(fx.board.id), Some("Doing"), None)
        .unwrap();

    let open = create_item(&items, &item_request(&fx, "open"));
    let closed = create_item(
        &items,
        &CreateContentRequest {
            status_id: Some(fx.done.id),
            section_id: Some(second_section.id),
            parent_item_id: Some(open.id()),
            ..item_request(&fx, "closed")
        },
    );
    let first = comments
        .create(&comment_request(&fx, open.id(), "first"))
        .unwrap();
    let second = comments
        .create(&comment_request(&fx, closed.id(), "second"))
        .unwrap();

    let in_item = comments.get_all_in_item(open.id()).unwrap();
    assert_eq!(in_item, vec![first.clone()]);
    let sub_items = items.get_all_in_item(open.id()).unwrap();
    assert_eq!(sub_items, vec![SharedContent::Item(closed.clone())]);

    let in_section = items.get_all_in_section(second_section.id).unwrap();
    assert_eq!(in_section, vec![closed.clone()]);
    assert!(matches!(
        items.get_all_in_section(999),
        Err(CoreError::NotFound {
            entity: Entity::Section,
            ..
        })
    ));

    assert_eq!(
        items.get_all_items_in_board(fx.board.id).unwrap(),
        vec![open.clone(), closed.clone()]
    );
    assert_eq!(
        items.get_all_items_in_status(fx.done.id).unwrap(),
        vec![closed.clone()]
    );
    assert!(items.get_all_items_in_board(999).is_err());

    let in_board = comments.get_all_comments_in_board(fx.board.id).unwrap();
    assert_eq!(in_board.len(), 2);
    assert_eq!(in_board[0].id(), first.id());
    assert_eq!(in_board[1].id(), second.id());

    let in_done = comments.get_all_comments_in_status(fx.done.id).unwrap();
    assert_eq!(in_done.len(), 1);
    assert_eq!(in_done[0].id(), second.id());
    assert!(matches!(
        comments.get_all_comments_in_status(fx.task.id),
        Err(CoreError::NotFound {
            entity: Entity::Status,
            ..
        })
    ));
}
