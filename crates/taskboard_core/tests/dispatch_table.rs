use taskboard_core::db::open_db_in_memory;
use taskboard_core::{
    AttributeKind, BoardService, ClassTag, ContentKind, CoreError, CreateAttributeRequest,
    CreateContentRequest, DispatchTable, Handler, SqliteRepositories,
};

#[test]
fn every_tag_resolves_to_its_own_handler() {
    let conn = open_db_in_memory().unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let table = DispatchTable::new(repos.ports());

    for tag in ClassTag::ALL {
        match (tag, table.resolve(tag)) {
            (ClassTag::Status, Handler::Attribute(registry)) => {
                assert_eq!(registry.kind(), AttributeKind::Status)
            }
            (ClassTag::Type, Handler::Attribute(registry)) => {
                assert_eq!(registry.kind(), AttributeKind::Type)
            }
            (ClassTag::Item, Handler::Content(engine)) => {
                assert_eq!(engine.kind(), ContentKind::Item)
            }
            (ClassTag::Comment, Handler::Content(engine)) => {
                assert_eq!(engine.kind(), ContentKind::Comment)
            }
            (tag, _) => panic!("{tag} resolved to the wrong handler family"),
        }
    }
}

#[test]
fn tag_names_parse_case_insensitively_and_unknown_names_fail() {
    let conn = open_db_in_memory().unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let table = DispatchTable::new(repos.ports());

    assert!(matches!(
        table.resolve_name(" Comment "),
        Ok(Handler::Content(engine)) if engine.kind() == ContentKind::Comment
    ));
    let err = table.resolve_name("priority").err().unwrap();
    assert_eq!(err.to_string(), "illegal input: No such class in the system");
}

#[test]
fn family_accessors_reject_the_other_family() {
    let conn = open_db_in_memory().unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let table = DispatchTable::new(repos.ports());

    assert!(table.attributes(ClassTag::Type).is_ok());
    assert!(table.content(ClassTag::Item).is_ok());

    let err = table.attributes(ClassTag::Item).err().unwrap();
    assert!(matches!(err, CoreError::IllegalInput(message) if message == "Invalid Attribute class"));
    let err = table.content(ClassTag::Status).err().unwrap();
    assert!(
        matches!(err, CoreError::IllegalInput(message) if message == "Invalid Shared Content class")
    );
}

#[test]
fn dispatched_handlers_share_one_store() {
    let conn = open_db_in_memory().unwrap();
    let repos = SqliteRepositories::try_new(&conn).unwrap();
    let ports = repos.ports();
    let table = DispatchTable::new(ports);
    let owner = ports.users.insert_user("owner", "owner@example.com").unwrap();
    let boards = BoardService::new(ports);
    let board = boards.create_board(Some(owner.id), Some("b"), None).unwrap();
    let section = boards
        .create_section(Some(board.id), Some("Backlog"), None)
        .unwrap();

    let status = table
        .attributes("status".parse().unwrap())
        .unwrap()
        .create(&CreateAttributeRequest::new(board.id, "Todo"))
        .unwrap();
    let kind = table
        .registry(AttributeKind::Type)
        .create(&CreateAttributeRequest::new(board.id, "Bug"))
        .unwrap();
    let item = table
        .content(ClassTag::Item)
        .unwrap()
        .create(&CreateContentRequest {
            creator_id: Some(owner.id),
            title: Some("crash on start".to_string()),
            section_id: Some(section.id),
            status_id: Some(status.id),
            type_id: Some(kind.id),
            ..CreateContentRequest::default()
        })
        .unwrap();
    table
        .engine(ContentKind::Comment)
        .create(&CreateContentRequest {
            creator_id: Some(owner.id),
            title: Some("repro".to_string()),
            item_id: Some(item.id()),
            ..CreateContentRequest::default()
        })
        .unwrap();

    let Handler::Content(comments) = table.resolve(ClassTag::Comment) else {
        panic!("comment tag must resolve to a content engine");
    };
    assert_eq!(comments.get_all_in_item(item.id()).unwrap().len(), 1);
    let Handler::Attribute(statuses) = table.resolve(ClassTag::Status) else {
        panic!("status tag must resolve to an attribute registry");
    };
    assert_eq!(statuses.get_all_in_board(board.id).unwrap(), vec![status]);
}
