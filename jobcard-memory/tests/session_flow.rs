//! Drives a whole job card through the wizard against the seeded memory backend.

use std::sync::Arc;

use chrono::NaiveDate;
use jobcard_core::backend::{BackendConfig, BackendRegistry};
use jobcard_core::fields;
use jobcard_core::session::{JobCardSession, SessionError};
use jobcard_core::wizard::{StepError, StepTransition};
use jobcard_core::{CascadeLevel, JobCardBackend, SaveStatus};
use jobcard_memory::MemoryBackendFactory;
use pretty_assertions::assert_eq;

async fn seeded_backend() -> Arc<dyn JobCardBackend> {
    let mut registry = BackendRegistry::new();
    registry.register(Box::new(MemoryBackendFactory));
    let config = BackendConfig {
        backend: "memory".to_string(),
        connection_string: concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/options.csv")
            .to_string(),
    };
    Arc::from(registry.create(&config).await.expect("memory backend"))
}

async fn set(
    session: &mut JobCardSession,
    name: &str,
    value: &str,
) {
    let notices = session.set_field(name, value).await;
    assert!(notices.is_empty(), "{name}: {notices:?}");
}

async fn fill_job(
    session: &mut JobCardSession,
    description: &str,
) {
    set(session, fields::CATEGORY, "PP").await;
    set(session, fields::JOB_DESCRIPTION, description).await;
    set(session, fields::CUSTOMER, "ACME").await;
    set(session, fields::ADDRESS, "ACME-HQ").await;
    set(session, fields::CONTACT_PERSON, "ASHA").await;
    set(session, fields::CONTACT_NUMBER, "+91 20 5550 0101").await;
    set(session, fields::EMAIL, "asha.rao@acme.example").await;
    set(session, fields::COLOR_COUNT, "3").await;
    set(session, fields::WIDTH, "100").await;
    set(session, fields::HEIGHT, "60").await;
    set(session, fields::MATERIAL, "M1").await;
    set(session, fields::UPS, "04").await;
    set(session, fields::CORE, "C1").await;
    set(session, fields::CUT, "Y").await;
    set(session, fields::PERFORATION, "N").await;
    set(session, fields::QUANTITY, "1000").await;
    set(session, fields::CYLINDER_TEETH, "80").await;
    set(session, fields::UPS_ACROSS, "4").await;
    set(session, fields::UPS_ALONG, "20").await;
    set(session, fields::WARRANTY_STATUS, "AMC").await;
    set(session, fields::WARRANTY_START, "2024-03-01").await;
}

#[tokio::test]
async fn cascade_follows_seeded_options() {
    let mut session = JobCardSession::job_card(seeded_backend().await);
    session.open().await;

    let customers: Vec<_> = session
        .options()
        .options(CascadeLevel::Customer)
        .iter()
        .map(|o| o.value.as_str())
        .collect();
    assert_eq!(customers, vec!["ACME", "GLOBEX"]);

    set(&mut session, fields::CUSTOMER, "ACME").await;
    set(&mut session, fields::ADDRESS, "ACME-HQ").await;
    set(&mut session, fields::CONTACT_PERSON, "VIKRAM").await;

    let numbers = session.options().options(CascadeLevel::ContactNumber);
    let emails = session.options().options(CascadeLevel::Email);
    assert_eq!(numbers.len(), 1);
    assert_eq!(numbers[0].value, "+91 20 5550 0102");
    assert_eq!(emails[0].value, "vikram.shah@acme.example");

    set(&mut session, fields::CUSTOMER, "GLOBEX").await;
    assert_eq!(session.options().selection(CascadeLevel::Address), None);
    assert!(session.options().options(CascadeLevel::ContactPerson).is_empty());
    assert_eq!(session.options().options(CascadeLevel::Address)[0].value, "GLOBEX-1");
}

#[tokio::test]
async fn full_job_card_is_saved_and_numbers_advance() {
    let backend = seeded_backend().await;
    let mut session = JobCardSession::job_card(backend.clone());
    session.open().await;
    fill_job(&mut session, "Spice jar labels").await;

    assert_eq!(
        session.advance().await.unwrap(),
        StepTransition::Advanced { from: 1, to: 2 }
    );
    session.advance().await.unwrap();
    session.advance().await.unwrap();
    let outcome = session.submit().await.unwrap();

    assert_eq!(outcome.status, SaveStatus::Success);
    assert_eq!(outcome.message, "Job card PP001 saved");

    let record = session.assemble();
    assert_eq!(record.serial_number, "3PP001100.x60.0MMM104C1YN");
    assert_eq!(record.meters.as_deref(), Some("3.88"));
    assert_eq!(record.contact_number.as_deref(), Some("+91 20 5550 0101"));
    assert_eq!(record.warranty.days, Some(365));
    assert_eq!(record.warranty.expiry_date, NaiveDate::from_ymd_opt(2025, 3, 1));

    // The next card in the same category gets the following number.
    let mut next = JobCardSession::job_card(backend);
    next.open().await;
    set(&mut next, fields::CATEGORY, "PP").await;
    assert_eq!(next.derived().job_number, "PP002");
}

#[tokio::test]
async fn second_card_with_same_description_is_stopped_at_step_one() {
    let backend = seeded_backend().await;
    let mut first = JobCardSession::job_card(backend.clone());
    first.open().await;
    fill_job(&mut first, "Spice jar labels").await;
    for _ in 0..3 {
        first.advance().await.unwrap();
    }
    first.submit().await.unwrap();

    let mut second = JobCardSession::job_card(backend);
    second.open().await;
    fill_job(&mut second, "spice jar labels").await;
    let result = second.advance().await;

    match result {
        Err(StepError::Duplicate { field, message, .. }) => {
            assert_eq!(field, fields::JOB_DESCRIPTION);
            assert!(message.contains("PP001"), "got: {message}");
        }
        other => panic!("expected Duplicate, got {other:#?}"),
    }
    assert_eq!(second.focus_intent(), Some(fields::JOB_DESCRIPTION));
}

#[tokio::test]
async fn submit_is_refused_until_final_step() {
    let mut session = JobCardSession::job_card(seeded_backend().await);
    session.open().await;
    fill_job(&mut session, "Coffee bag labels").await;
    session.advance().await.unwrap();

    let result = session.submit().await;

    assert!(matches!(
        result,
        Err(SessionError::Incomplete {
            active: 2,
            total: 4
        })
    ));
}

async fn submit_all_steps(session: &mut JobCardSession) -> jobcard_core::SaveOutcome {
    for _ in 0..3 {
        session.advance().await.unwrap();
    }
    session.submit().await.unwrap()
}

#[tokio::test]
async fn reopened_card_saves_as_an_update() {
    let backend = seeded_backend().await;
    let mut first = JobCardSession::job_card(backend.clone());
    first.open().await;
    fill_job(&mut first, "Spice labels").await;
    submit_all_steps(&mut first).await;
    let saved = first.assemble();

    let mut reopened = JobCardSession::job_card(backend.clone());
    let notices = reopened.load_record(&saved).await;
    assert!(notices.is_empty(), "{notices:?}");
    set(&mut reopened, fields::QUANTITY, "2000").await;
    let outcome = submit_all_steps(&mut reopened).await;

    assert_eq!(outcome.message, "Job card PP001 updated");
    assert_eq!(reopened.assemble().meters.as_deref(), Some("7.05"));

    // Submitting the same form again is also an update.
    let again = reopened.submit().await.unwrap();
    assert_eq!(again.message, "Job card PP001 updated");
}

/// Job number of the saved card using `description`.
async fn holder(
    backend: &dyn JobCardBackend,
    description: &str,
) -> Option<String> {
    backend
        .check_unique(fields::JOB_DESCRIPTION, description)
        .await
        .unwrap()
        .job_number
}

#[tokio::test]
async fn cards_open_side_by_side_get_their_own_numbers() {
    let backend = seeded_backend().await;
    let mut card_a = JobCardSession::job_card(backend.clone());
    let mut card_b = JobCardSession::job_card(backend.clone());
    card_a.open().await;
    card_b.open().await;
    fill_job(&mut card_a, "Card A").await;
    fill_job(&mut card_b, "Card B").await;

    let saved_a = submit_all_steps(&mut card_a).await;
    let saved_b = submit_all_steps(&mut card_b).await;

    assert_eq!(saved_a.message, "Job card PP001 saved");
    assert_eq!(saved_b.message, "Job card PP002 saved");
    assert_eq!(holder(backend.as_ref(), "Card A").await.as_deref(), Some("PP001"));
    assert_eq!(holder(backend.as_ref(), "Card B").await.as_deref(), Some("PP002"));
}

#[tokio::test]
async fn exhausted_sequence_is_a_notice_not_a_crash() {
    let backend = seeded_backend().await;
    let mut first = JobCardSession::job_card(backend.clone());
    first.open().await;
    fill_job(&mut first, "Last of the line").await;
    set(&mut first, fields::SEQUENCE, &u32::MAX.to_string()).await;
    submit_all_steps(&mut first).await;

    let mut next = JobCardSession::job_card(backend);
    next.open().await;
    let notices = next.set_field(fields::CATEGORY, "PP").await;

    assert_eq!(notices.len(), 1, "{notices:?}");
    assert_eq!(next.values().get(fields::SEQUENCE), None);
}
