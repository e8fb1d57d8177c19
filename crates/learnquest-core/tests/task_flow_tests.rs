mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use learnquest_core::models::question::QuestionRecord;
use learnquest_core::models::session::{AnswerOutcome, Evaluation, SessionStatus};
use learnquest_core::services::store::ProgressStore;
use learnquest_core::utils::time::today_utc;
use learnquest_core::CoreError;

use common::{correct_input, wrong_input, FlakyStore, TASK_ID};

#[tokio::test]
async fn test_start_without_bell_peppers_is_refused() {
    common::init_tracing();
    let (store, ctx) = common::seeded_store(0, 4).await;
    let flaky = Arc::new(FlakyStore::new(store.clone(), 0));
    let state = common::app_state(flaky.clone());

    let err = state
        .task_service()
        .start_task(&ctx, TASK_ID)
        .await
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<CoreError>(),
        Some(&CoreError::InsufficientResource { available: 0 })
    );
    assert_eq!(flaky.write_attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_all_correct_completes_and_persists_rewards() {
    common::init_tracing();
    let (store, ctx) = common::seeded_store(1, 4).await;
    let state = common::app_state(store.clone());
    let service = state.task_service();

    let mut session = service.start_task(&ctx, TASK_ID).await.unwrap();
    assert_eq!(store.fetch_attributes(&ctx).await.unwrap().bell_peppers, Some(0));

    let mut last = None;
    while let Some(question) = session.current_question().cloned() {
        let (evaluation, outcome) = service
            .submit_answer(&ctx, &mut session, &correct_input(&question))
            .await
            .unwrap();
        assert_eq!(evaluation, Evaluation::Correct);
        last = Some(outcome);
    }

    match last.unwrap() {
        AnswerOutcome::Completed { reward, rounds } => {
            assert_eq!(reward.points, 140);
            assert_eq!(rounds, 1);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(session.status(), SessionStatus::Completed);

    let record = store.fetch_attributes(&ctx).await.unwrap();
    assert_eq!(record.points, Some(140));
    assert_eq!(record.xp, Some(140));
    assert_eq!(record.bell_peppers, Some(1));
    assert_eq!(record.streak, Some(1));
    assert_eq!(record.last_task_date, Some(today_utc()));

    let completions = store.completions().await;
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].session_id, session.id());
    assert!(completions[0].perfect);
}

#[tokio::test]
async fn test_retry_after_wrong_answer() {
    common::init_tracing();
    let (store, ctx) = common::seeded_store(3, 4).await;
    let state = common::app_state(store.clone());
    let service = state.task_service();

    let mut session = service.start_task(&ctx, TASK_ID).await.unwrap();

    let first = session.current_question().cloned().unwrap();
    service
        .submit_answer(&ctx, &mut session, &wrong_input(&first))
        .await
        .unwrap();
    for _ in 0..3 {
        let question = session.current_question().cloned().unwrap();
        service
            .submit_answer(&ctx, &mut session, &correct_input(&question))
            .await
            .unwrap();
    }
    assert_eq!(session.status(), SessionStatus::RoundFailed { round: 1 });

    service.retry_round(&ctx, &mut session).await.unwrap();
    assert_eq!(store.fetch_attributes(&ctx).await.unwrap().bell_peppers, Some(1));

    let round: Vec<_> = session.round_questions().map(|q| q.id.clone()).collect();
    assert_eq!(round, vec![first.id.clone()]);

    let (_, outcome) = service
        .submit_answer(&ctx, &mut session, &correct_input(&first))
        .await
        .unwrap();
    match outcome {
        AnswerOutcome::Completed { reward, rounds } => {
            assert_eq!(reward.points, 140);
            assert_eq!(rounds, 2);
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    // started at 3: two spent, one refunded
    let record = store.fetch_attributes(&ctx).await.unwrap();
    assert_eq!(record.bell_peppers, Some(2));
    assert_eq!(record.points, Some(140));
}

#[tokio::test]
async fn test_failed_write_leaves_session_unchanged() {
    common::init_tracing();
    let (store, ctx) = common::seeded_store(1, 1).await;
    let flaky = Arc::new(FlakyStore::new(store.clone(), 0));
    let state = common::app_state(flaky.clone());
    let service = state.task_service();

    let mut session = service.start_task(&ctx, TASK_ID).await.unwrap();
    let question = session.current_question().cloned().unwrap();

    flaky.fail_next_writes(3);
    let result = service
        .submit_answer(&ctx, &mut session, &correct_input(&question))
        .await;

    assert!(result.is_err());
    assert_eq!(session.status(), SessionStatus::InProgress { round: 1 });
    assert_eq!(session.current_question().unwrap().id, question.id);

    let record = store.fetch_attributes(&ctx).await.unwrap();
    assert_eq!(record.points, Some(0));
    assert_eq!(record.bell_peppers, Some(0));
    assert!(store.completions().await.is_empty());

    // The same answer succeeds once the backend recovers.
    let (_, outcome) = service
        .submit_answer(&ctx, &mut session, &correct_input(&question))
        .await
        .unwrap();
    assert!(matches!(outcome, AnswerOutcome::Completed { .. }));
}

#[tokio::test]
async fn test_transient_write_failure_is_retried() {
    common::init_tracing();
    let (store, ctx) = common::seeded_store(2, 2).await;
    let flaky = Arc::new(FlakyStore::new(store.clone(), 2));
    let state = common::app_state(flaky.clone());

    let session = state
        .task_service()
        .start_task(&ctx, TASK_ID)
        .await
        .unwrap();

    assert_eq!(flaky.write_attempts.load(Ordering::SeqCst), 3);
    assert_eq!(session.bell_peppers().count(), 1);
    assert_eq!(store.fetch_attributes(&ctx).await.unwrap().bell_peppers, Some(1));
}

#[tokio::test]
async fn test_abandon_keeps_bell_pepper_spent() {
    common::init_tracing();
    let (store, ctx) = common::seeded_store(2, 3).await;
    let state = common::app_state(store.clone());
    let service = state.task_service();

    let mut session = service.start_task(&ctx, TASK_ID).await.unwrap();
    service.abandon(&mut session).unwrap();

    assert_eq!(session.status(), SessionStatus::Abandoned);
    assert_eq!(store.fetch_attributes(&ctx).await.unwrap().bell_peppers, Some(1));
    assert!(store.completions().await.is_empty());
}

#[tokio::test]
async fn test_malformed_question_fails_task_load() {
    common::init_tracing();
    let (store, ctx) = common::seeded_store(3, 0).await;
    let mut records = common::true_false_records(2);
    records.push(QuestionRecord {
        id: "broken".to_string(),
        task_id: TASK_ID.to_string(),
        question_type: "press_mistakes".to_string(),
        words: Some(vec!["let".to_string()]),
        ..Default::default()
    });
    store.put_questions(TASK_ID, records).await;
    let state = common::app_state(store.clone());

    let err = state
        .task_service()
        .start_task(&ctx, TASK_ID)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CoreError>(),
        Some(CoreError::MalformedQuestion { id, .. }) if id == "broken"
    ));
    assert_eq!(store.fetch_attributes(&ctx).await.unwrap().bell_peppers, Some(3));
}

#[tokio::test]
async fn test_unknown_task_has_empty_pool() {
    common::init_tracing();
    let (store, ctx) = common::seeded_store(3, 2).await;
    let state = common::app_state(store);

    let err = state
        .task_service()
        .start_task(&ctx, "no-such-task")
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CoreError>(),
        Some(CoreError::EmptyQuestionPool { .. })
    ));
}
