mod common;

use common::ScriptedModel;
use rusqlite::Connection;
use stylemirror_core::db::open_db_in_memory;
use stylemirror_core::{
    AiError, GenerationSettings, MessageKind, MessageStatus, NewCustomer, OpportunityListQuery,
    OpportunityStatus, OutreachService, ServiceError, SqliteCustomerRepository,
    SqliteOutreachRepository, SqliteUserRepository, StyleService, Timing, TrainingSample,
    UserRepository,
};

type SqliteOutreach<'conn, 'model> = OutreachService<
    SqliteUserRepository<'conn>,
    SqliteCustomerRepository<'conn>,
    SqliteOutreachRepository<'conn>,
    &'model ScriptedModel,
>;

fn style_service<'a>(
    conn: &'a Connection,
    model: &'a ScriptedModel,
) -> StyleService<SqliteUserRepository<'a>, &'a ScriptedModel> {
    StyleService::new(
        SqliteUserRepository::new(conn),
        model,
        GenerationSettings::default(),
    )
}

fn outreach_service<'conn, 'model>(
    conn: &'conn Connection,
    model: &'model ScriptedModel,
) -> SqliteOutreach<'conn, 'model> {
    OutreachService::new(
        SqliteUserRepository::new(conn),
        SqliteCustomerRepository::new(conn),
        SqliteOutreachRepository::new(conn),
        model,
        GenerationSettings::default(),
    )
}

fn samples() -> Vec<TrainingSample> {
    vec![
        TrainingSample::new("Can I see the house Saturday?", "Absolutely!! Let's do 10am :)"),
        TrainingSample::new("Is now a good time to sell?", "Great question! Inventory is low."),
    ]
}

/// Registers a trained realtor with one customer and returns their ids.
fn seed_trained_customer(conn: &Connection) -> (i64, i64) {
    let model = ScriptedModel::with_replies(&["Energetic, lots of exclamation points."]);
    let style = style_service(conn, &model);
    let user = style.register_user("Dana", "realtor").unwrap();
    style.train(user.id, &samples()).unwrap();

    let outreach = outreach_service(conn, &model);
    let customer = outreach
        .add_customer(&NewCustomer::new(user.id, "Amy Chen"))
        .unwrap();
    (user.id, customer.id)
}

#[test]
fn train_stores_samples_and_analysis() {
    let conn = open_db_in_memory().unwrap();
    let model = ScriptedModel::with_replies(&["Warm, short sentences, emoji."]);
    let service = style_service(&conn, &model);
    let user = service.register_user("Dana", "realtor").unwrap();

    let analysis = service.train(user.id, &samples()).unwrap();

    assert_eq!(analysis, "Warm, short sentences, emoji.");
    assert_eq!(model.calls(), 1);
    assert_eq!(
        model.system_prompt(0),
        "You are a communication style analyst."
    );
    let prompt = model.user_prompt(0);
    assert!(prompt.contains("responses from a realtor"));
    assert!(prompt.contains("Absolutely!! Let's do 10am :)"));
    let request = model.request(0);
    assert_eq!(request.model, "gpt-4o");
    assert!((request.temperature - 0.7).abs() < f32::EPSILON);

    let repo = SqliteUserRepository::new(&conn);
    let stored = repo.get_user(user.id).unwrap().unwrap();
    assert_eq!(
        stored.style_analysis.as_deref(),
        Some("Warm, short sentences, emoji.")
    );
    assert_eq!(repo.list_training_responses(user.id).unwrap().len(), 2);
}

#[test]
fn retraining_replaces_earlier_samples() {
    let conn = open_db_in_memory().unwrap();
    let model = ScriptedModel::with_replies(&[
        "Formal and measured.",
        "Casual and upbeat.",
        "Sure thing!! See you then :)",
    ]);
    let service = style_service(&conn, &model);
    let user = service.register_user("Dana", "realtor").unwrap();

    service
        .train(
            user.id,
            &[TrainingSample::new("Can we meet?", "OLD VOICE: I shall confirm.")],
        )
        .unwrap();
    service
        .train(
            user.id,
            &[TrainingSample::new("Can we meet?", "NEW VOICE: yes!!")],
        )
        .unwrap();
    service.respond(user.id, "Are you free Friday?").unwrap();

    let repo = SqliteUserRepository::new(&conn);
    let stored = repo.list_training_responses(user.id).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].response, "NEW VOICE: yes!!");

    let prompt = model.user_prompt(2);
    assert!(prompt.contains("NEW VOICE"));
    assert!(!prompt.contains("OLD VOICE"));
    assert!(prompt.contains("Casual and upbeat."));
    assert!(!prompt.contains("Formal and measured."));
}

#[test]
fn failed_analysis_leaves_user_untrained() {
    let conn = open_db_in_memory().unwrap();
    let model = ScriptedModel::default();
    model.push_error(AiError::Status {
        status: 401,
        body: "invalid api key".to_string(),
    });
    let service = style_service(&conn, &model);
    let user = service.register_user("Dana", "realtor").unwrap();

    let err = service.train(user.id, &samples()).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Ai(AiError::Status { status: 401, .. })
    ));

    let repo = SqliteUserRepository::new(&conn);
    assert!(repo.list_training_responses(user.id).unwrap().is_empty());
    assert!(repo
        .get_user(user.id)
        .unwrap()
        .unwrap()
        .style_analysis
        .is_none());
}

#[test]
fn train_rejects_empty_samples_without_calling_model() {
    let conn = open_db_in_memory().unwrap();
    let model = ScriptedModel::default();
    let service = style_service(&conn, &model);
    let user = service.register_user("Dana", "doctor").unwrap();

    let err = service.train(user.id, &[]).unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
    assert_eq!(model.calls(), 0);
}

#[test]
fn respond_requires_training_then_uses_profile() {
    let conn = open_db_in_memory().unwrap();
    let model = ScriptedModel::with_replies(&["Chatty and upbeat.", "Sure thing!! See you then!"]);
    let service = style_service(&conn, &model);
    let user = service.register_user("Dana", "realtor").unwrap();

    let err = service.respond(user.id, "Can we move the showing?").unwrap_err();
    assert!(matches!(err, ServiceError::NotTrained(id) if id == user.id));
    assert_eq!(model.calls(), 0);

    service.train(user.id, &samples()).unwrap();
    let answer = service.respond(user.id, "Can we move the showing?").unwrap();

    assert_eq!(answer, "Sure thing!! See you then!");
    let prompt = model.user_prompt(1);
    assert!(prompt.contains("You are a realtor"));
    assert!(prompt.contains("Chatty and upbeat."));
    assert!(prompt.contains("1. Absolutely!! Let's do 10am :)"));
    assert!(prompt.contains("\"Can we move the showing?\""));
}

#[test]
fn find_opportunities_persists_pending_suggestions() {
    let conn = open_db_in_memory().unwrap();
    let (_, customer_id) = seed_trained_customer(&conn);
    let model = ScriptedModel::with_replies(&[r#"{"opportunities":[
        {"trigger":"Birthday","timing":"this_week","medium":"sms","reference":"turns 40 Friday","importance":8},
        {"trigger":"Move","timing":"this_month","medium":"email","reference":"new condo","importance":5}
    ]}"#]);
    let service = outreach_service(&conn, &model);
    service.add_note(customer_id, "Turns 40 this Friday").unwrap();
    service.add_note(customer_id, "Just moved into a new condo").unwrap();

    let found = service.find_opportunities(customer_id).unwrap();

    assert_eq!(found.len(), 2);
    assert_eq!(found[0].trigger, "Birthday");
    assert_eq!(found[0].timing, Timing::ThisWeek);
    assert_eq!(found[0].status, OpportunityStatus::Pending);
    assert_eq!(found[1].medium, MessageKind::Email);

    let prompt = model.user_prompt(0);
    assert!(prompt.contains("notes about Amy Chen"));
    assert!(prompt.contains("Turns 40 this Friday\nJust moved into a new condo"));
    assert!(model.system_prompt(0).contains("Always respond with valid JSON."));
}

#[test]
fn repeated_find_reuses_pending_triggers() {
    let conn = open_db_in_memory().unwrap();
    let (_, customer_id) = seed_trained_customer(&conn);
    let model = ScriptedModel::with_replies(&[
        r#"{"opportunities":[
            {"trigger":"Birthday","timing":"this_week","medium":"sms","reference":"turns 40 Friday","importance":8}
        ]}"#,
        r#"{"opportunities":[
            {"trigger":"birthday","timing":"this_week","medium":"sms","reference":"turns 40","importance":7},
            {"trigger":"Move","timing":"this_month","medium":"email","reference":"new condo","importance":5}
        ]}"#,
    ]);
    let service = outreach_service(&conn, &model);
    service.add_note(customer_id, "Turns 40 this Friday").unwrap();

    let first = service.find_opportunities(customer_id).unwrap();
    let second = service.find_opportunities(customer_id).unwrap();

    assert_eq!(first.len(), 1);
    let triggers: Vec<&str> = second.iter().map(|o| o.trigger.as_str()).collect();
    assert_eq!(triggers, vec!["Birthday", "Move"]);
    assert_eq!(second[0].id, first[0].id);
    assert_eq!(
        service
            .list_opportunities(&OpportunityListQuery {
                customer_id: Some(customer_id),
                status: Some(OpportunityStatus::Pending),
                limit: None,
            })
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn malformed_opportunity_reply_yields_empty_list() {
    let conn = open_db_in_memory().unwrap();
    let (_, customer_id) = seed_trained_customer(&conn);
    let model = ScriptedModel::with_replies(&["I found a birthday! Send a card."]);
    let service = outreach_service(&conn, &model);
    service.add_note(customer_id, "Birthday in June").unwrap();

    let found = service.find_opportunities(customer_id).unwrap();

    assert!(found.is_empty());
    assert_eq!(model.calls(), 1);
    assert!(service
        .list_opportunities(&OpportunityListQuery::default())
        .unwrap()
        .is_empty());
}

#[test]
fn customer_without_notes_skips_model() {
    let conn = open_db_in_memory().unwrap();
    let (_, customer_id) = seed_trained_customer(&conn);
    let model = ScriptedModel::default();
    let service = outreach_service(&conn, &model);

    assert!(service.find_opportunities(customer_id).unwrap().is_empty());
    assert_eq!(model.calls(), 0);
}

#[test]
fn draft_message_respects_autopilot() {
    let conn = open_db_in_memory().unwrap();
    let (user_id, customer_id) = seed_trained_customer(&conn);
    let model = ScriptedModel::with_replies(&["  Happy birthday Amy!! 🎉  ", "Congrats on the condo!"]);
    let service = outreach_service(&conn, &model);
    service.add_note(customer_id, "Birthday is today").unwrap();

    let draft = service
        .draft_message(customer_id, MessageKind::Sms, Some("birthday today"))
        .unwrap();
    assert_eq!(draft.content, "Happy birthday Amy!! 🎉");
    assert_eq!(draft.status, MessageStatus::Draft);
    assert_eq!(draft.kind, MessageKind::Sms);

    let prompt = model.user_prompt(0);
    assert!(prompt.contains("named Amy Chen"));
    assert!(prompt.contains("Birthday is today"));
    assert!(prompt.contains("Specifically, be sure to reference this detail: birthday today"));

    SqliteUserRepository::new(&conn)
        .set_autopilot(user_id, true)
        .unwrap();
    let queued = service
        .draft_message(customer_id, MessageKind::Email, None)
        .unwrap();
    assert_eq!(queued.status, MessageStatus::Autopilot);
    assert!(!model.user_prompt(1).contains("Specifically"));
    assert_eq!(service.list_messages(customer_id).unwrap().len(), 2);
}

#[test]
fn draft_for_opportunity_uses_medium_and_marks_processed() {
    let conn = open_db_in_memory().unwrap();
    let (_, customer_id) = seed_trained_customer(&conn);
    let model = ScriptedModel::with_replies(&[
        r#"{"opportunities":[{"trigger":"Knee surgery","timing":"immediate","medium":"email","reference":"knee surgery last week","importance":9}]}"#,
        "Hope the knee is healing well!",
    ]);
    let service = outreach_service(&conn, &model);
    service.add_note(customer_id, "Had knee surgery last week").unwrap();
    let opportunity = service.find_opportunities(customer_id).unwrap().remove(0);

    let message = service.draft_for_opportunity(opportunity.id).unwrap();

    assert_eq!(message.kind, MessageKind::Email);
    assert!(model
        .user_prompt(1)
        .contains("reference this detail: knee surgery last week"));
    let processed = service
        .list_opportunities(&OpportunityListQuery {
            status: Some(OpportunityStatus::Processed),
            ..OpportunityListQuery::default()
        })
        .unwrap();
    assert_eq!(processed.len(), 1);

    let err = service.draft_for_opportunity(opportunity.id).unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[test]
fn drafting_for_untrained_owner_fails() {
    let conn = open_db_in_memory().unwrap();
    let model = ScriptedModel::default();
    let user_id = style_service(&conn, &model)
        .register_user("Sam", "therapist")
        .unwrap()
        .id;
    let service = outreach_service(&conn, &model);
    let customer = service
        .add_customer(&NewCustomer::new(user_id, "Jordan"))
        .unwrap();

    let err = service
        .draft_message(customer.id, MessageKind::Sms, None)
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotTrained(id) if id == user_id));
    assert_eq!(model.calls(), 0);
}

#[test]
fn unknown_ids_surface_as_not_found() {
    let conn = open_db_in_memory().unwrap();
    let model = ScriptedModel::default();
    let service = outreach_service(&conn, &model);

    assert!(matches!(
        service.add_customer(&NewCustomer::new(77, "Nobody")),
        Err(ServiceError::NotFound { entity: "user", id: 77 })
    ));
    assert!(matches!(
        service.find_opportunities(12),
        Err(ServiceError::NotFound {
            entity: "customer",
            id: 12
        })
    ));
    assert!(matches!(
        service.dismiss_opportunity(3),
        Err(ServiceError::NotFound {
            entity: "opportunity",
            id: 3
        })
    ));
}
