//! Database layer tests against a scratch SQLite file

use pulse_common::models::{Question, QuestionKind};
use pulse_web::db::{self, responses, sessions};
use sqlx::SqlitePool;

async fn setup_pool() -> (SqlitePool, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let pool = db::init_database(&dir.path().join("pulse.db"))
        .await
        .expect("init database");
    (pool, dir)
}

fn new_session(title: &str) -> sessions::NewSession {
    sessions::NewSession {
        title: title.to_string(),
        description: String::new(),
        questions: vec![Question {
            id: "q1".into(),
            kind: QuestionKind::Rating,
            prompt: "Overall rating".into(),
            required: false,
            choices: vec![],
        }],
        is_active: true,
    }
}

fn submission(rating: i64) -> responses::NewResponse {
    responses::NewResponse {
        user_name: "Alex".into(),
        user_email: "alex@example.com".into(),
        bootcamp_id: "b-7".into(),
        answers: serde_json::json!({ "q1": rating })
            .as_object()
            .unwrap()
            .clone(),
    }
}

#[tokio::test]
async fn share_tokens_are_unique_even_within_one_millisecond() {
    let (pool, _dir) = setup_pool().await;

    // Back-to-back creates routinely land in the same millisecond; the
    // insert loop must still yield distinct tokens
    let mut tokens = std::collections::HashSet::new();
    for _ in 0..20 {
        let session = sessions::create_session(&pool, new_session("Demo"))
            .await
            .expect("create session");
        assert!(tokens.insert(session.share_token), "duplicate share token");
    }
}

#[tokio::test]
async fn session_lookup_by_token() {
    let (pool, _dir) = setup_pool().await;

    let created = sessions::create_session(&pool, new_session("Demo"))
        .await
        .unwrap();

    let found = sessions::get_session_by_token(&pool, &created.share_token)
        .await
        .unwrap()
        .expect("session by token");
    assert_eq!(found.id, created.id);

    assert!(sessions::get_session_by_token(&pool, "nope")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn update_preserves_share_token_and_bumps_updated_at() {
    let (pool, _dir) = setup_pool().await;

    let created = sessions::create_session(&pool, new_session("Demo"))
        .await
        .unwrap();

    let updated = sessions::update_session(
        &pool,
        created.id,
        sessions::SessionPatch {
            title: Some("Demo v2".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.share_token, created.share_token);
    assert_eq!(updated.title, "Demo v2");
    assert!(updated.updated_at >= created.updated_at);
}

#[tokio::test]
async fn deleting_a_session_orphans_its_responses() {
    let (pool, _dir) = setup_pool().await;

    let session = sessions::create_session(&pool, new_session("Demo"))
        .await
        .unwrap();
    responses::insert_response(&pool, &session, submission(4))
        .await
        .unwrap();

    sessions::delete_session(&pool, session.id).await.unwrap();

    // No cascade: the response row survives its session
    let orphans = responses::list_responses(&pool, Some(session.id))
        .await
        .unwrap();
    assert_eq!(orphans.len(), 1);
}

#[tokio::test]
async fn responses_round_trip_normalized_answers() {
    let (pool, _dir) = setup_pool().await;

    let session = sessions::create_session(&pool, new_session("Demo"))
        .await
        .unwrap();
    let inserted = responses::insert_response(&pool, &session, submission(5))
        .await
        .unwrap();

    let listed = responses::list_responses(&pool, Some(session.id))
        .await
        .unwrap();
    assert_eq!(listed, vec![inserted]);
    assert_eq!(listed[0].mean_rating(), Some(5.0));
}
