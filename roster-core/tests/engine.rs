//! End-to-end engine scenarios against the in-memory directory.
//!
//! Reviewer selection is random by design, so assertions treat the outcome
//! as any valid subset of the eligible pool rather than a specific member;
//! where a test needs a deterministic draw it shrinks the pool to one
//! eligible candidate.

use std::sync::Arc;

use roster_core::{
    Engine, EngineError, MemoryDirectory, NewMember, PrId, PrStatus, Resource, UserId,
};

fn engine() -> Engine {
    Engine::new(Arc::new(MemoryDirectory::new()))
}

fn member(id: &str, active: bool) -> NewMember {
    NewMember {
        user_id: UserId::from(id),
        username: id.to_string(),
        active,
    }
}

async fn team_with(engine: &Engine, name: &str, members: &[(&str, bool)]) {
    let members: Vec<NewMember> = members
        .iter()
        .map(|(id, active)| member(id, *active))
        .collect();
    engine.create_team(name, &members).await.unwrap();
}

// ---------------------------------------------------------------------------
// Team membership
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_team_rejects_duplicate_name() {
    let engine = engine();
    team_with(&engine, "dev-team", &[("u1", true)]).await;

    let err = engine
        .create_team("dev-team", &[member("u2", true)])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AlreadyExists(Resource::Team)));
}

#[tokio::test]
async fn get_team_returns_current_member_flags() {
    let engine = engine();
    team_with(&engine, "dev-team", &[("u1", true), ("u2", false)]).await;

    let (team, members) = engine.get_team("dev-team").await.unwrap();
    assert_eq!(team.name, "dev-team");
    assert_eq!(members.len(), 2);

    let u2 = members.iter().find(|u| u.id == UserId::from("u2")).unwrap();
    assert!(!u2.active, "active flag from the member record must stick");
}

#[tokio::test]
async fn get_team_unknown_fails_not_found() {
    let engine = engine();
    let err = engine.get_team("nobody").await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(Resource::Team)));
}

#[tokio::test]
async fn set_user_active_updates_flag_and_reports_team() {
    let engine = engine();
    team_with(&engine, "dev-team", &[("u1", true)]).await;

    let (user, team) = engine
        .set_user_active(&UserId::from("u1"), false)
        .await
        .unwrap();
    assert!(!user.active);
    assert_eq!(user.name, "u1");
    assert_eq!(team.as_deref(), Some("dev-team"));
}

#[tokio::test]
async fn set_user_active_unknown_fails_not_found() {
    let engine = engine();
    let err = engine
        .set_user_active(&UserId::from("ghost"), true)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(Resource::User)));
}

// ---------------------------------------------------------------------------
// PR creation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_pr_assigns_reviewers_from_team_excluding_author() {
    let engine = engine();
    team_with(
        &engine,
        "dev-team",
        &[("author1", true), ("r1", true), ("r2", true)],
    )
    .await;

    let pr = engine
        .create_pr(&PrId::from("pr-1"), "T", &UserId::from("author1"))
        .await
        .unwrap();

    assert_eq!(pr.status, PrStatus::Open);
    assert_eq!(pr.reviewers.len(), 2, "pool of two yields both reviewers");
    for reviewer in &pr.reviewers {
        assert_ne!(reviewer.id, UserId::from("author1"));
        assert!(["r1", "r2"].contains(&reviewer.id.0.as_str()));
    }
}

#[tokio::test]
async fn create_pr_duplicate_id_fails_already_exists() {
    let engine = engine();
    team_with(&engine, "dev-team", &[("author1", true)]).await;
    engine
        .create_pr(&PrId::from("pr-1"), "T", &UserId::from("author1"))
        .await
        .unwrap();

    let err = engine
        .create_pr(&PrId::from("pr-1"), "T again", &UserId::from("author1"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::AlreadyExists(Resource::PullRequest)
    ));
}

#[tokio::test]
async fn create_pr_unknown_author_fails_not_found() {
    let engine = engine();
    let err = engine
        .create_pr(&PrId::from("pr-1"), "T", &UserId::from("ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(Resource::User)));
}

#[tokio::test]
async fn create_pr_with_solo_team_yields_no_reviewers() {
    let engine = engine();
    team_with(&engine, "solo-team", &[("author1", true)]).await;

    let pr = engine
        .create_pr(&PrId::from("pr-1"), "T", &UserId::from("author1"))
        .await
        .unwrap();
    assert_eq!(pr.status, PrStatus::Open);
    assert!(pr.reviewers.is_empty());
}

#[tokio::test]
async fn create_pr_ignores_inactive_candidates() {
    let engine = engine();
    team_with(
        &engine,
        "dev-team",
        &[("author1", true), ("r1", true), ("r2", false)],
    )
    .await;

    let pr = engine
        .create_pr(&PrId::from("pr-1"), "T", &UserId::from("author1"))
        .await
        .unwrap();
    assert_eq!(pr.reviewers.len(), 1);
    assert_eq!(pr.reviewers[0].id, UserId::from("r1"));
}

#[tokio::test]
async fn create_pr_by_author_without_team_succeeds_with_no_reviewers() {
    use roster_core::DirectoryStore;

    // A user known to the directory but enrolled in no team.
    let store = Arc::new(MemoryDirectory::new());
    let loner = UserId::from("loner");
    store.upsert_user(&loner, "Loner").await.unwrap();
    let engine = Engine::new(store);

    let pr = engine
        .create_pr(&PrId::from("pr-1"), "T", &loner)
        .await
        .unwrap();
    assert_eq!(pr.status, PrStatus::Open);
    assert!(pr.reviewers.is_empty());
}

#[tokio::test]
async fn author_is_never_drawn_and_cap_holds_across_many_creations() {
    let engine = engine();
    team_with(
        &engine,
        "dev-team",
        &[
            ("author1", true),
            ("r1", true),
            ("r2", true),
            ("r3", true),
            ("r4", true),
        ],
    )
    .await;

    for i in 0..20 {
        let pr = engine
            .create_pr(&PrId::from(format!("pr-{i}")), "T", &UserId::from("author1"))
            .await
            .unwrap();
        assert!(pr.reviewers.len() <= 2);
        assert!(pr
            .reviewers
            .iter()
            .all(|r| r.id != UserId::from("author1")));
    }
}

// ---------------------------------------------------------------------------
// Merge lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn merge_pr_is_idempotent() {
    let engine = engine();
    team_with(&engine, "dev-team", &[("author1", true), ("r1", true)]).await;
    engine
        .create_pr(&PrId::from("pr-1"), "T", &UserId::from("author1"))
        .await
        .unwrap();

    let first = engine.merge_pr(&PrId::from("pr-1")).await.unwrap();
    let second = engine.merge_pr(&PrId::from("pr-1")).await.unwrap();

    assert_eq!(first.status, PrStatus::Merged);
    assert_eq!(second.status, PrStatus::Merged);
    assert_eq!(first.reviewer_ids(), second.reviewer_ids());
}

#[tokio::test]
async fn merge_unknown_pr_fails_not_found() {
    let engine = engine();
    let err = engine.merge_pr(&PrId::from("pr-404")).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::NotFound(Resource::PullRequest)
    ));
}

// ---------------------------------------------------------------------------
// Reassignment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reassignment_swaps_old_for_new_and_records_one_event() {
    let engine = engine();
    // r3 is inactive at creation so the initial draw can only pick r1, then
    // flipping the flags afterwards leaves r3 as the only legal replacement.
    team_with(
        &engine,
        "dev-team",
        &[("author1", true), ("r1", true), ("r3", false)],
    )
    .await;
    engine
        .create_pr(&PrId::from("pr-1"), "T", &UserId::from("author1"))
        .await
        .unwrap();
    engine
        .set_user_active(&UserId::from("r3"), true)
        .await
        .unwrap();
    engine
        .set_user_active(&UserId::from("author1"), false)
        .await
        .unwrap();

    let before = engine.assignment_stats().await.unwrap();

    let (pr, replacement) = engine
        .reassign_reviewer(&PrId::from("pr-1"), &UserId::from("r1"))
        .await
        .unwrap();

    assert_eq!(replacement, UserId::from("r3"));
    let ids = pr.reviewer_ids();
    assert!(!ids.contains(&UserId::from("r1")));
    assert!(ids.contains(&UserId::from("r3")));

    let after = engine.assignment_stats().await.unwrap();
    assert_eq!(
        after.get("r3").copied().unwrap_or(0),
        before.get("r3").copied().unwrap_or(0) + 1
    );
    assert_eq!(after.get("r1"), before.get("r1"));
}

#[tokio::test]
async fn reassignment_on_merged_pr_fails_and_leaves_bindings_alone() {
    let engine = engine();
    team_with(&engine, "dev-team", &[("author1", true), ("r1", true)]).await;
    engine
        .create_pr(&PrId::from("pr-1"), "T", &UserId::from("author1"))
        .await
        .unwrap();
    let merged = engine.merge_pr(&PrId::from("pr-1")).await.unwrap();

    let err = engine
        .reassign_reviewer(&PrId::from("pr-1"), &UserId::from("r1"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AlreadyMerged));

    let still = engine.merge_pr(&PrId::from("pr-1")).await.unwrap();
    assert_eq!(still.reviewer_ids(), merged.reviewer_ids());
}

#[tokio::test]
async fn reassignment_of_unassigned_reviewer_fails_not_assigned() {
    let engine = engine();
    team_with(
        &engine,
        "dev-team",
        &[("author1", true), ("r1", true), ("r2", false)],
    )
    .await;
    engine
        .create_pr(&PrId::from("pr-1"), "T", &UserId::from("author1"))
        .await
        .unwrap();

    // r2 was inactive, so it cannot be on the PR.
    let err = engine
        .reassign_reviewer(&PrId::from("pr-1"), &UserId::from("r2"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotAssigned));
}

#[tokio::test]
async fn reassignment_with_empty_pool_fails_no_candidate() {
    let engine = engine();
    team_with(&engine, "dev-team", &[("author1", true), ("r1", true)]).await;
    engine
        .create_pr(&PrId::from("pr-1"), "T", &UserId::from("author1"))
        .await
        .unwrap();
    // With the author deactivated, r1 has no active teammate left.
    engine
        .set_user_active(&UserId::from("author1"), false)
        .await
        .unwrap();

    let err = engine
        .reassign_reviewer(&PrId::from("pr-1"), &UserId::from("r1"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NoCandidate));

    // The failed attempt must not have removed the binding.
    let pr = engine.merge_pr(&PrId::from("pr-1")).await.unwrap();
    assert_eq!(pr.reviewer_ids(), vec![UserId::from("r1")]);
}

#[tokio::test]
async fn reassignment_on_unknown_pr_fails_not_found() {
    let engine = engine();
    let err = engine
        .reassign_reviewer(&PrId::from("pr-404"), &UserId::from("r1"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::NotFound(Resource::PullRequest)
    ));
}

// ---------------------------------------------------------------------------
// Bulk deactivation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bulk_deactivation_flips_all_members_and_starves_future_draws() {
    let engine = engine();
    team_with(
        &engine,
        "dev-team",
        &[("author1", true), ("r1", true), ("r2", true)],
    )
    .await;

    engine.deactivate_team("dev-team", false).await.unwrap();

    let (_, members) = engine.get_team("dev-team").await.unwrap();
    assert!(members.iter().all(|u| !u.active));

    // Future assignment sees an empty candidate pool; the PR still lands.
    let pr = engine
        .create_pr(&PrId::from("pr-1"), "T", &UserId::from("author1"))
        .await
        .unwrap();
    assert!(pr.reviewers.is_empty());
}

#[tokio::test]
async fn bulk_deactivation_does_not_touch_existing_bindings() {
    let engine = engine();
    team_with(&engine, "dev-team", &[("author1", true), ("r1", true)]).await;
    engine
        .create_pr(&PrId::from("pr-1"), "T", &UserId::from("author1"))
        .await
        .unwrap();

    engine.deactivate_team("dev-team", true).await.unwrap();

    let pr = engine.merge_pr(&PrId::from("pr-1")).await.unwrap();
    assert_eq!(pr.reviewer_ids(), vec![UserId::from("r1")]);
}

#[tokio::test]
async fn bulk_deactivation_of_unknown_team_fails_not_found() {
    let engine = engine();
    let err = engine.deactivate_team("nobody", false).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(Resource::Team)));
}

// ---------------------------------------------------------------------------
// Statistics and review listings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stats_count_every_assignment_event_per_user() {
    let engine = engine();
    team_with(&engine, "team-a", &[("a", true), ("r1", true)]).await;
    team_with(&engine, "team-b", &[("b", true), ("r2", true)]).await;

    engine
        .create_pr(&PrId::from("pr-1"), "T", &UserId::from("a"))
        .await
        .unwrap();
    engine
        .create_pr(&PrId::from("pr-2"), "T", &UserId::from("a"))
        .await
        .unwrap();
    engine
        .create_pr(&PrId::from("pr-3"), "T", &UserId::from("b"))
        .await
        .unwrap();

    let stats = engine.assignment_stats().await.unwrap();
    assert_eq!(stats.get("r1"), Some(&2));
    assert_eq!(stats.get("r2"), Some(&1));
    assert_eq!(stats.len(), 2);
}

#[tokio::test]
async fn user_reviews_lists_only_bound_open_and_merged_prs() {
    let engine = engine();
    team_with(&engine, "team-a", &[("a", true), ("r1", true)]).await;

    engine
        .create_pr(&PrId::from("pr-1"), "T", &UserId::from("a"))
        .await
        .unwrap();
    engine
        .create_pr(&PrId::from("pr-2"), "T", &UserId::from("a"))
        .await
        .unwrap();
    engine.merge_pr(&PrId::from("pr-2")).await.unwrap();

    let reviews = engine.user_reviews(&UserId::from("r1")).await.unwrap();
    assert_eq!(reviews.len(), 2);
    assert!(reviews
        .iter()
        .any(|pr| pr.id == PrId::from("pr-2") && pr.status == PrStatus::Merged));

    // The author reviews nothing.
    let none = engine.user_reviews(&UserId::from("a")).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn user_reviews_for_unknown_user_fails_not_found() {
    let engine = engine();
    let err = engine
        .user_reviews(&UserId::from("ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(Resource::User)));
}
