//! Service layer rules exercised against the in-memory repository.

mod support;

use chrono::{Duration, Utc};

use bin_tally::db::repository::{DirectoryRepository, FormRepository};
use bin_tally::db::services::{
    access, auth, catalog, companies, forms, health_check, invitations, submissions, users,
    ServiceError,
};
use bin_tally::models::{
    BinTypeInput, CompanyInput, ContaminationTypeInput, FormBinInput, FormInput, NewInvitation,
    Role,
};
use bin_tally::services::auth::SessionStore;
use bin_tally::services::drafts::{DraftId, DraftStore};
use bin_tally::services::mailer::LogMailer;
use bin_tally::services::tally::{Fullness, InspectionInput, WorkerInfo, WorkerType};

use support::{world, World, ROOT_EMAIL, ROOT_PASSWORD};

fn depot_input() -> FormInput {
    FormInput {
        title: "North Depot".to_string(),
        description: Some("Loading dock bins".to_string()),
        location: "12 Harbour Rd".to_string(),
        area: Some("Dock A".to_string()),
        company_id: None,
    }
}

async fn depot(world: &World) -> bin_tally::models::FormDetails {
    forms::create_form(
        &world.repo,
        &world.acme_admin,
        &depot_input(),
        &[
            FormBinInput {
                id: None,
                bin_type_id: Some(world.general.id),
                quantity: 2,
            },
            FormBinInput {
                id: None,
                bin_type_id: Some(world.recycling.id),
                quantity: 1,
            },
        ],
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let world = world().await;
    assert!(health_check(&world.repo).await.unwrap());
}

// ==================== Auth ====================

#[tokio::test]
async fn test_sign_in_and_uniform_failures() {
    let world = world().await;
    let sessions = SessionStore::new(Duration::hours(1));

    let session = auth::sign_in(&world.repo, &sessions, " ROOT@nuloop.example ", ROOT_PASSWORD)
        .await
        .unwrap();
    assert_eq!(session.actor.role, Role::SuperAdmin);
    assert!(sessions.authenticate(&session.token).is_some());

    let user = world.repo.get_user(world.root.user_id).await.unwrap();
    assert!(user.last_login.is_some());

    let wrong_password = auth::sign_in(&world.repo, &sessions, ROOT_EMAIL, "nope")
        .await
        .unwrap_err();
    let unknown_email = auth::sign_in(&world.repo, &sessions, "ghost@example.com", "nope")
        .await
        .unwrap_err();
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    assert!(matches!(unknown_email, ServiceError::InvalidCredentials));

    assert!(auth::sign_out(&sessions, &session.token));
    assert!(sessions.authenticate(&session.token).is_none());
}

#[tokio::test]
async fn test_bootstrap_is_idempotent() {
    let world = world().await;
    let again = auth::bootstrap_admin(
        &world.repo,
        &world.policy,
        &bin_tally::config::BootstrapAdmin {
            email: ROOT_EMAIL.to_string(),
            password: "different".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(again.id, world.root.user_id);
    assert_eq!(world.repo.list_companies().await.unwrap().len(), 2);
}

// ==================== Companies ====================

#[tokio::test]
async fn test_site_admin_sees_only_own_company() {
    let world = world().await;

    let all = companies::list_companies(&world.repo, &world.root, &world.policy)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let own = companies::list_companies(&world.repo, &world.acme_admin, &world.policy)
        .await
        .unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].company.id, world.acme.id);
}

#[tokio::test]
async fn test_platform_company_cannot_be_deleted() {
    let world = world().await;
    let platform = world
        .repo
        .find_company_by_name("nuloop")
        .await
        .unwrap()
        .unwrap();

    let err = companies::delete_company(&world.repo, &world.root, &world.policy, platform.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let err = companies::create_company(
        &world.repo,
        &world.acme_admin,
        &CompanyInput {
            name: "Rogue".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

// ==================== Users ====================

#[tokio::test]
async fn test_user_placement_rules() {
    let world = world().await;
    let platform = world
        .repo
        .find_company_by_name(&world.policy.platform_company)
        .await
        .unwrap()
        .unwrap();

    let site_in_platform = users::create_user(
        &world.repo,
        &world.root,
        &world.policy,
        &users::CreateUser {
            email: "a@example.com".to_string(),
            password: "pw".to_string(),
            name: None,
            role: Role::SiteAdmin,
            company_id: Some(platform.id),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(site_in_platform, ServiceError::Validation(_)));

    let super_elsewhere = users::create_user(
        &world.repo,
        &world.root,
        &world.policy,
        &users::CreateUser {
            email: "b@example.com".to_string(),
            password: "pw".to_string(),
            name: None,
            role: Role::SuperAdmin,
            company_id: Some(world.acme.id),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(
        super_elsewhere.to_string(),
        "Super Admin users must be assigned to Nuloop company"
    );

    let by_site_admin = users::create_user(
        &world.repo,
        &world.acme_admin,
        &world.policy,
        &users::CreateUser {
            email: "c@example.com".to_string(),
            password: "pw".to_string(),
            name: None,
            role: Role::SuperAdmin,
            company_id: Some(platform.id),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(by_site_admin, ServiceError::Forbidden(_)));

    let duplicate = users::create_user(
        &world.repo,
        &world.root,
        &world.policy,
        &users::CreateUser {
            email: "SITE@acme.example".to_string(),
            password: "pw".to_string(),
            name: None,
            role: Role::SiteAdmin,
            company_id: Some(world.acme.id),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(duplicate, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn test_promotion_moves_user_to_platform_and_back() {
    let world = world().await;
    let platform = world
        .repo
        .find_company_by_name(&world.policy.platform_company)
        .await
        .unwrap()
        .unwrap();

    let promoted = users::update_role(
        &world.repo,
        &world.root,
        &world.policy,
        world.acme_admin.user_id,
        Role::SuperAdmin,
    )
    .await
    .unwrap();
    assert_eq!(promoted.role, Role::SuperAdmin);
    assert_eq!(promoted.company_id, Some(platform.id));

    let demoted = users::update_role(
        &world.repo,
        &world.root,
        &world.policy,
        world.acme_admin.user_id,
        Role::SiteAdmin,
    )
    .await
    .unwrap();
    assert_eq!(demoted.role, Role::SiteAdmin);
    assert_eq!(demoted.company_id, None);
}

#[tokio::test]
async fn test_cannot_delete_yourself() {
    let world = world().await;
    let err = users::delete_user(&world.repo, &world.root, world.root.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    users::delete_user(&world.repo, &world.root, world.acme_admin.user_id)
        .await
        .unwrap();
    assert!(world
        .repo
        .get_user(world.acme_admin.user_id)
        .await
        .unwrap_err()
        .is_not_found());
}

// ==================== Catalogue ====================

#[tokio::test]
async fn test_bin_type_identity_and_usage() {
    let world = world().await;

    let duplicate = catalog::create_bin_type(
        &world.repo,
        &world.root,
        &BinTypeInput {
            name: "  General Waste ".to_string(),
            bin_size: Some("240".to_string()),
            bin_uom: Some("L".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(duplicate, ServiceError::Conflict(_)));

    // Saving a bin type with its own identity is not a clash.
    let renamed = catalog::update_bin_type(
        &world.repo,
        &world.root,
        world.general.id,
        &BinTypeInput {
            name: "General Waste".to_string(),
            color: Some("#ff0000".to_string()),
            bin_size: Some("240".to_string()),
            bin_uom: Some("L".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(renamed.color.as_deref(), Some("#ff0000"));

    depot(&world).await;
    let in_use = catalog::delete_bin_type(&world.repo, &world.root, world.general.id)
        .await
        .unwrap_err();
    assert!(matches!(in_use, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn test_contamination_options_fall_back_to_all_visible() {
    let world = world().await;

    let food = catalog::create_contamination_type(
        &world.repo,
        &world.acme_admin,
        &ContaminationTypeInput {
            name: "Food waste".to_string(),
            bin_type_ids: vec![world.recycling.id],
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(food.company_id, Some(world.acme.id));

    let linked = catalog::options_for_bin(&world.repo, world.recycling.id, Some(world.acme.id))
        .await
        .unwrap();
    assert_eq!(linked.len(), 1);

    let fallback = catalog::options_for_bin(&world.repo, world.general.id, Some(world.acme.id))
        .await
        .unwrap();
    assert_eq!(fallback.len(), 1);
    assert_eq!(fallback[0].id, food.id);

    let no_bins = catalog::create_contamination_type(
        &world.repo,
        &world.acme_admin,
        &ContaminationTypeInput {
            name: "Plastic bags".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(no_bins, ServiceError::Validation(_)));
}

// ==================== Forms ====================

#[tokio::test]
async fn test_form_creation_scoping_and_search() {
    let world = world().await;
    let details = depot(&world).await;

    let code = &details.form.unique_code;
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_uppercase()));
    assert_eq!(details.form.company_id, Some(world.acme.id));
    assert_eq!(details.bins.len(), 2);

    let other = world
        .repo
        .create_company(&CompanyInput {
            name: "Other Co".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let other_listing =
        forms::list_forms(&world.repo, &world.acme_admin, Some(other.id), None)
            .await
            .unwrap();
    assert!(other_listing.is_empty());

    let found = forms::list_forms(&world.repo, &world.root, None, Some("dock"))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    let missed = forms::list_forms(&world.repo, &world.root, None, Some("warehouse"))
        .await
        .unwrap();
    assert!(missed.is_empty());
}

#[tokio::test]
async fn test_form_update_synchronizes_bins() {
    let world = world().await;
    let details = depot(&world).await;
    let kept = &details.bins[0].form_bin;

    let updated = forms::update_form(
        &world.repo,
        &world.acme_admin,
        details.form.id,
        &FormInput {
            title: "North Depot (east)".to_string(),
            ..depot_input()
        },
        &[FormBinInput {
            id: Some(kept.id),
            bin_type_id: Some(kept.bin_type_id),
            quantity: 5,
        }],
    )
    .await
    .unwrap();

    assert_eq!(updated.form.title, "North Depot (east)");
    assert_eq!(updated.bins.len(), 1);
    assert_eq!(updated.bins[0].form_bin.id, kept.id);
    assert_eq!(updated.bins[0].form_bin.quantity, 5);
}

#[tokio::test]
async fn test_form_validation() {
    let world = world().await;
    let err = forms::create_form(
        &world.repo,
        &world.acme_admin,
        &FormInput {
            area: None,
            ..depot_input()
        },
        &[],
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Area is required");

    let err = forms::create_form(
        &world.repo,
        &world.acme_admin,
        &depot_input(),
        &[FormBinInput {
            id: None,
            bin_type_id: Some(world.general.id),
            quantity: 11,
        }],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_form_lists_each_bin_type_once() {
    let world = world().await;
    let general = |quantity| FormBinInput {
        id: None,
        bin_type_id: Some(world.general.id),
        quantity,
    };

    let err = forms::create_form(
        &world.repo,
        &world.acme_admin,
        &depot_input(),
        &[general(1), general(1)],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(world.repo.form_count(), 0);

    let details = depot(&world).await;
    let err = forms::update_form(
        &world.repo,
        &world.acme_admin,
        details.form.id,
        &depot_input(),
        &[
            FormBinInput {
                id: Some(details.bins[0].form_bin.id),
                ..general(2)
            },
            general(1),
        ],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let (_, site) = access::open_site(&world.repo, &details.form.unique_code)
        .await
        .unwrap();
    let keys: std::collections::HashSet<_> = site.bins.iter().map(|b| &b.key).collect();
    assert_eq!(site.total_bins(), 3);
    assert_eq!(keys.len(), 3);
}

// ==================== Access & invitations ====================

#[tokio::test]
async fn test_access_resolution_order() {
    let world = world().await;
    let details = depot(&world).await;
    let form_id = details.form.id;

    let by_id = access::resolve_access(&world.repo, &form_id.to_string())
        .await
        .unwrap();
    assert_eq!(by_id.form_id, form_id);

    let messy = format!(" {} ", details.form.unique_code.to_lowercase());
    let by_code = access::resolve_access(&world.repo, &messy).await.unwrap();
    assert_eq!(by_code.form_id, form_id);
    assert_eq!(by_code.access_code, None);

    let invitation = invitations::create_invitation(
        &world.repo,
        &world.acme_admin,
        form_id,
        " Worker@Example.com ",
    )
    .await
    .unwrap();
    assert_eq!(invitation.email, "worker@example.com");
    assert_eq!(invitation.access_code.len(), 8);

    let by_invitation = access::resolve_access(&world.repo, &invitation.access_code)
        .await
        .unwrap();
    assert_eq!(by_invitation.form_id, form_id);
    assert_eq!(
        by_invitation.access_code.as_deref(),
        Some(invitation.access_code.as_str())
    );

    let expired = world
        .repo
        .create_invitation(&NewInvitation {
            form_id,
            email: "late@example.com".to_string(),
            access_code: "EXPIREDX".to_string(),
            expires_at: Utc::now() - Duration::days(1),
        })
        .await
        .unwrap();
    let err = access::resolve_access(&world.repo, &expired.access_code)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidCode));

    let err = access::resolve_access(&world.repo, "ZZZZZZ").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid code. Please try again.");
}

#[tokio::test]
async fn test_send_invitation_uses_mailer() {
    let world = world().await;
    let details = depot(&world).await;
    let invitation =
        invitations::create_invitation(&world.repo, &world.root, details.form.id, "w@example.com")
            .await
            .unwrap();

    let mailer = LogMailer::new();
    invitations::send_invitation(&world.repo, &mailer, &world.root, invitation.id)
        .await
        .unwrap();

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "w@example.com");
    assert_eq!(sent[0].subject, "Invitation to Bin Tally Form: North Depot");
    assert!(sent[0].html.contains(&invitation.access_code));
}

// ==================== Submissions ====================

#[tokio::test]
async fn test_submit_and_review_submission() {
    let world = world().await;
    let details = depot(&world).await;
    let drafts = DraftStore::new(Duration::hours(1));

    let (grant, site) = access::open_site(&world.repo, &details.form.unique_code)
        .await
        .unwrap();
    let draft = drafts.create(site, grant.access_code);
    let keys: Vec<_> = draft.session.site().bins.iter().map(|b| b.key.clone()).collect();
    assert_eq!(keys.len(), 3);

    let now = Utc::now();
    drafts
        .update(draft.id, |d| {
            d.session
                .identify_worker(WorkerInfo::new("Sam Lee", WorkerType::Cleaner).unwrap())?;
            d.session.record_inspection(
                &keys[0],
                &InspectionInput {
                    fullness: Fullness::new(75).unwrap(),
                    contaminated: false,
                    contamination: vec![],
                },
                now,
            )?;
            d.session
                .report_missing(&keys[1..2], "Taken away by council", now)
                .map(|_| ())
        })
        .unwrap()
        .unwrap();

    let stored = submissions::submit(&world.repo, &drafts, draft.id)
        .await
        .unwrap();
    assert_eq!(stored.submitted_by, "Sam Lee");
    assert!(drafts.get(draft.id).unwrap().session.is_submitted());

    let again = submissions::submit(&world.repo, &drafts, draft.id)
        .await
        .unwrap_err();
    assert!(matches!(again, ServiceError::Tally(_)));

    let listings = submissions::list_submissions(&world.repo, &world.acme_admin, Some("sam"))
        .await
        .unwrap();
    assert_eq!(listings.len(), 1);
    let summary = submissions::summarize(&listings);
    assert_eq!(summary.total_submissions, 1);
    assert_eq!(summary.total_inspected, 1);
    assert_eq!(summary.total_missing, 1);

    let detail = submissions::get_submission(&world.repo, &world.acme_admin, stored.id)
        .await
        .unwrap();
    assert_eq!(detail.counts.inspected, 1);
    assert_eq!(detail.counts.missing, 1);
    assert_eq!(detail.counts.uninspected, 1);
    assert_eq!(detail.tables.inspected.len(), 1);
    assert_eq!(detail.tables.missing.len(), 1);
    assert_eq!(detail.tables.uninspected.len(), 1);
}

async fn identified_draft(world: &World, drafts: &DraftStore, code: &str) -> DraftId {
    let (grant, site) = access::open_site(&world.repo, code).await.unwrap();
    let draft = drafts.create(site, grant.access_code);
    drafts
        .update(draft.id, |d| {
            d.session
                .identify_worker(WorkerInfo::new("Kai", WorkerType::Cleaner).unwrap())
                .map(|_| ())
        })
        .unwrap()
        .unwrap();
    draft.id
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submits_store_one_row_per_draft() {
    let world = world().await;
    let details = depot(&world).await;
    let drafts = DraftStore::new(Duration::hours(1));

    let mut ids = Vec::new();
    for _ in 0..200 {
        ids.push(identified_draft(&world, &drafts, &details.form.unique_code).await);
    }

    let mut tasks = Vec::new();
    for id in &ids {
        for _ in 0..2 {
            let repo = world.repo.clone();
            let drafts = drafts.clone();
            let id = *id;
            tasks.push(tokio::spawn(async move {
                submissions::submit(&repo, &drafts, id).await
            }));
        }
    }
    let mut accepted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(err) => assert!(matches!(err, ServiceError::Tally(_))),
        }
    }

    assert_eq!(accepted, ids.len());
    assert_eq!(world.repo.submission_count(), ids.len());
}

#[tokio::test]
async fn test_failed_submit_reopens_draft() {
    let world = world().await;
    let details = depot(&world).await;
    let drafts = DraftStore::new(Duration::hours(1));
    let id = identified_draft(&world, &drafts, &details.form.unique_code).await;

    world.repo.set_healthy(false);
    let err = submissions::submit(&world.repo, &drafts, id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Repository(_)));
    assert!(!drafts.get(id).unwrap().session.is_submitted());

    world.repo.set_healthy(true);
    submissions::submit(&world.repo, &drafts, id).await.unwrap();
    assert!(drafts.get(id).unwrap().session.is_submitted());
    assert_eq!(world.repo.submission_count(), 1);
}

#[tokio::test]
async fn test_submissions_survive_form_deletion() {
    let world = world().await;
    let details = depot(&world).await;
    let drafts = DraftStore::new(Duration::hours(1));

    let (grant, site) = access::open_site(&world.repo, &details.form.id.to_string())
        .await
        .unwrap();
    let draft = drafts.create(site, grant.access_code);
    drafts
        .update(draft.id, |d| {
            d.session
                .identify_worker(WorkerInfo::new("Ana", WorkerType::Security).unwrap())
                .map(|_| ())
        })
        .unwrap()
        .unwrap();
    let stored = submissions::submit(&world.repo, &drafts, draft.id)
        .await
        .unwrap();

    forms::delete_form(&world.repo, &world.acme_admin, details.form.id)
        .await
        .unwrap();

    let detail = submissions::get_submission(&world.repo, &world.root, stored.id)
        .await
        .unwrap();
    assert_eq!(detail.record.form_title.as_deref(), Some("Unknown"));
    assert_eq!(detail.counts.uninspected, 3);

    let listings = submissions::list_submissions(&world.repo, &world.root, None)
        .await
        .unwrap();
    assert_eq!(listings.len(), 1);
    let row = serde_json::to_value(&listings[0]).unwrap();
    assert_eq!(row["form_title"], "Unknown");
    assert_eq!(row["unique_code"], "Unknown");
    assert_eq!(row["company_name"], "Unknown");
    assert_eq!(row["counts"]["uninspected"], 3);

    // Site admins lose sight of it together with the form.
    let hidden = submissions::get_submission(&world.repo, &world.acme_admin, stored.id)
        .await
        .unwrap_err();
    assert!(matches!(hidden, ServiceError::NotFound(_)));
}
