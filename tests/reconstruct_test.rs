//! Integration tests for rebuilding reply trees from stored rows.

use tempfile::TempDir;
use thread_archiver::archiver::reconstruct;
use thread_archiver::db::{upsert_comment, upsert_thread, Database, NewComment, NewThread};

async fn setup_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.sqlite");
    let db = Database::new(&db_path)
        .await
        .expect("Failed to create database");
    (db, temp_dir)
}

fn new_thread(thread_id: &str, continuing_reply: &str) -> NewThread {
    NewThread {
        thread_id: thread_id.to_string(),
        continuing_reply: continuing_reply.to_string(),
        replies_num: 3,
        sub: "test".to_string(),
        title: "Reconstruction".to_string(),
        content: String::new(),
        content_link: String::new(),
        author: "op".to_string(),
        timestamp: 1_546_300_800,
        archive_timestamp: 1_546_400_000,
    }
}

fn new_comment(id: &str, thread_key: i64, parent_id: Option<i64>, score: i64) -> NewComment {
    NewComment {
        comment_id: Some(id.to_string()),
        content: format!("body of {id}"),
        author: format!("author_{id}"),
        thread_key,
        parent_id,
        timestamp: 1_546_300_900,
        continues: false,
        score,
    }
}

#[tokio::test]
async fn test_siblings_ordered_by_score() {
    let (db, _temp_dir) = setup_db().await;
    let mut conn = db.writer().acquire().await.unwrap();

    let thread_key = upsert_thread(&mut conn, &new_thread("agi5zf", ""))
        .await
        .unwrap();
    let a = upsert_comment(&mut conn, &new_comment("a", thread_key, None, 5))
        .await
        .unwrap();
    upsert_comment(&mut conn, &new_comment("b", thread_key, None, 9))
        .await
        .unwrap();
    upsert_comment(&mut conn, &new_comment("c", thread_key, Some(a), 3))
        .await
        .unwrap();
    drop(conn);

    let rendered = reconstruct(db.pool(), "agi5zf", "")
        .await
        .unwrap()
        .expect("thread exists");

    let top: Vec<_> = rendered
        .replies
        .iter()
        .map(|c| c.comment_id.as_deref().unwrap())
        .collect();
    assert_eq!(top, vec!["b", "a"]);

    let a_node = &rendered.replies[1];
    assert_eq!(a_node.replies.len(), 1);
    assert_eq!(a_node.replies[0].comment_id.as_deref(), Some("c"));
    assert_eq!(a_node.replies[0].author, "author_c");
    assert!(rendered.replies[0].replies.is_empty());
}

#[tokio::test]
async fn test_equal_scores_keep_insertion_order() {
    let (db, _temp_dir) = setup_db().await;
    let mut conn = db.writer().acquire().await.unwrap();

    let thread_key = upsert_thread(&mut conn, &new_thread("agi5zf", ""))
        .await
        .unwrap();
    for id in ["first", "second", "third"] {
        upsert_comment(&mut conn, &new_comment(id, thread_key, None, 1))
            .await
            .unwrap();
    }
    drop(conn);

    let rendered = reconstruct(db.pool(), "agi5zf", "")
        .await
        .unwrap()
        .unwrap();
    let order: Vec<_> = rendered
        .replies
        .iter()
        .map(|c| c.comment_id.clone().unwrap())
        .collect();
    assert_eq!(order, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn test_missing_thread_is_none() {
    let (db, _temp_dir) = setup_db().await;

    assert!(reconstruct(db.pool(), "zzzzzz", "").await.unwrap().is_none());
}

#[tokio::test]
async fn test_continuation_is_separate_tree() {
    let (db, _temp_dir) = setup_db().await;
    let mut conn = db.writer().acquire().await.unwrap();

    let root_key = upsert_thread(&mut conn, &new_thread("agi5zf", ""))
        .await
        .unwrap();
    upsert_comment(&mut conn, &new_comment("top", root_key, None, 1))
        .await
        .unwrap();
    let cont_key = upsert_thread(&mut conn, &new_thread("agi5zf", "top"))
        .await
        .unwrap();
    upsert_comment(&mut conn, &new_comment("tail", cont_key, None, 1))
        .await
        .unwrap();
    drop(conn);

    let root = reconstruct(db.pool(), "agi5zf", "").await.unwrap().unwrap();
    assert_eq!(root.replies.len(), 1);
    assert_eq!(root.replies[0].comment_id.as_deref(), Some("top"));

    let cont = reconstruct(db.pool(), "agi5zf", "top")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cont.thread.continuing_reply, "top");
    assert_eq!(cont.replies.len(), 1);
    assert_eq!(cont.replies[0].comment_id.as_deref(), Some("tail"));
}

#[tokio::test]
async fn test_deep_chain_rebuilds_without_limit() {
    let (db, _temp_dir) = setup_db().await;
    let mut conn = db.writer().acquire().await.unwrap();

    let thread_key = upsert_thread(&mut conn, &new_thread("agi5zf", ""))
        .await
        .unwrap();
    let mut parent = None;
    for level in 0..250 {
        let key = upsert_comment(&mut conn, &new_comment(&format!("n{level}"), thread_key, parent, 1))
            .await
            .unwrap();
        parent = Some(key);
    }
    drop(conn);

    let rendered = reconstruct(db.pool(), "agi5zf", "").await.unwrap().unwrap();
    let mut depth = 0;
    let mut level = &rendered.replies;
    while let Some(node) = level.first() {
        assert_eq!(node.comment_id, Some(format!("n{depth}")));
        depth += 1;
        level = &node.replies;
    }
    assert_eq!(depth, 250);
}

#[tokio::test]
async fn test_reconstruct_serializes() {
    let (db, _temp_dir) = setup_db().await;
    let mut conn = db.writer().acquire().await.unwrap();
    let thread_key = upsert_thread(&mut conn, &new_thread("agi5zf", ""))
        .await
        .unwrap();
    upsert_comment(&mut conn, &new_comment("a", thread_key, None, 2))
        .await
        .unwrap();
    drop(conn);

    let rendered = reconstruct(db.pool(), "agi5zf", "").await.unwrap().unwrap();
    let value = serde_json::to_value(&rendered).unwrap();

    assert_eq!(value["thread"]["thread_id"], "agi5zf");
    assert_eq!(value["replies"][0]["comment_id"], "a");
    assert_eq!(value["replies"][0]["score"], 2);
}
