use catchpedia::models::{
    ArticleInput, PendingArticle, PendingStatus, ReviewRequest, SessionStatus,
    SubmitArticleRequest, TagsInput, User, UserProfile,
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

// --- Wire Format ---

#[test]
fn test_pending_article_serializes_camel_case() {
    let pending = PendingArticle {
        id: "bass-basics-1".into(),
        title: "Bass Basics".into(),
        category: "fish".into(),
        author_name: "Alice".into(),
        author_email: "a@x.com".into(),
        submitted_at: Utc::now(),
        ..Default::default()
    };

    let value = serde_json::to_value(&pending).unwrap();

    assert_eq!(value["authorName"], "Alice");
    assert_eq!(value["authorEmail"], "a@x.com");
    assert_eq!(value["status"], "pending");
    assert!(value.get("submittedAt").is_some());
    assert!(value.get("author_name").is_none());
}

#[test]
fn test_status_uses_lowercase_names() {
    for (status, name) in [
        (PendingStatus::Pending, "pending"),
        (PendingStatus::Approved, "approved"),
        (PendingStatus::Rejected, "rejected"),
    ] {
        assert_eq!(serde_json::to_value(status).unwrap(), name);
        assert_eq!(status.to_string(), name);
    }
    assert!(serde_json::from_value::<PendingStatus>(json!("Approved")).is_err());
}

#[test]
fn test_user_profile_never_carries_the_hash() {
    let user = User {
        id: Uuid::new_v4(),
        email: "a@x.com".into(),
        display_name: None,
        password_hash: "$argon2id$secret".into(),
        created_at: Utc::now(),
    };

    let value = serde_json::to_value(UserProfile::from(&user)).unwrap();

    assert_eq!(value["email"], "a@x.com");
    assert!(value.get("passwordHash").is_none());
    assert!(!value.to_string().contains("argon2"));
}

// --- Input Normalisation ---

#[test]
fn test_tags_accept_array_or_csv() {
    let list: TagsInput = serde_json::from_value(json!(["pike", " musky "])).unwrap();
    let csv: TagsInput = serde_json::from_value(json!("pike, musky,, ")).unwrap();

    assert_eq!(list.into_tags(), vec!["pike", "musky"]);
    assert_eq!(csv.into_tags(), vec!["pike", "musky"]);
}

#[test]
fn test_submission_converts_to_article_input() {
    let req: SubmitArticleRequest = serde_json::from_value(json!({
        "title": "Pike Tips",
        "category": "fish",
        "content": "<p>Wire</p>",
        "tags": "pike"
    }))
    .unwrap();

    let input = ArticleInput::from(req);

    assert_eq!(input.subcategory, None);
    assert_eq!(input.tags, vec!["pike"]);
    assert!(input.validate().is_ok());
}

#[test]
fn test_missing_fields_deserialize_then_fail_validation() {
    let input: ArticleInput = serde_json::from_value(json!({ "title": "Only a title" })).unwrap();

    assert_eq!(
        input.validate(),
        Err("Missing required fields: title, category, content")
    );
}

#[test]
fn test_review_request_defaults() {
    let req: ReviewRequest = serde_json::from_value(json!({})).unwrap();

    assert!(req.article_id.is_empty());
    assert!(req.review_notes.is_none());
}

#[test]
fn test_anonymous_session_status_omits_user() {
    let status = SessionStatus {
        authenticated: false,
        user: None,
        admin: true,
    };

    assert_eq!(
        serde_json::to_value(&status).unwrap(),
        json!({ "authenticated": false, "admin": true })
    );
}
