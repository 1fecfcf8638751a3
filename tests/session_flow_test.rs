mod common;

use chrono::{TimeZone, Utc};
use common::full_config;
use risk_survey::application::{run_session, ExperimentSession, Pacing, SimulatedParticipant};
use risk_survey::domain::models::{Config, SessionPhase, SurveyPhase, TimelineItem};
use risk_survey::domain::ports::FixedClock;
use risk_survey::infrastructure::storage::{JsonlSink, MemorySink};
use risk_survey::DomainError;
use std::sync::Arc;

#[tokio::test]
async fn test_full_session_commits_each_block_once() {
    common::setup_test_logging();
    let sink = Arc::new(MemorySink::new());
    let mut session = ExperimentSession::start(full_config(), Some("P042".to_string()), Some(11))
        .unwrap()
        .with_sink(sink.clone());
    let mut participant = SimulatedParticipant::new(0.6, 11);

    let report = run_session(&mut session, &mut participant, Pacing::Virtual)
        .await
        .unwrap();

    assert_eq!(report.practice.trials, 3);
    assert_eq!(report.phase1.trials, 27);
    assert_eq!(report.phase1.attention_checks, 3);
    assert_eq!(report.phase1.attention_correct, 3);
    assert_eq!(report.phase2.trials, 63);
    assert!(report.phase1_delivered && report.phase2_delivered);
    assert_eq!(session.phase(), SessionPhase::Finished);

    let receipts = sink.receipts().await;
    assert_eq!(receipts.len(), 2);
    assert_eq!(receipts[0].phase, SurveyPhase::Phase1);
    assert_eq!(receipts[0].records, 27);
    assert_eq!(receipts[0].attention_results, 3);
    assert_eq!(receipts[1].phase, SurveyPhase::Phase2);
    assert_eq!(receipts[1].records, 63);

    // Practice never leaves the session
    assert!(sink.records(SurveyPhase::Practice).await.is_empty());
    assert_eq!(sink.attention().await.len(), 3);

    let phase1 = sink.records(SurveyPhase::Phase1).await;
    let sequences: Vec<u32> = phase1.iter().map(|r| r.sequence).collect();
    assert_eq!(sequences, (1..=27).collect::<Vec<_>>());
    assert!(phase1.iter().all(|r| r.participant_id == "P042" && r.trial_id.is_none()));

    let phase2 = sink.records(SurveyPhase::Phase2).await;
    assert!(phase2.iter().all(|r| r.trial_id.is_some()
        && r.indifference_point.is_some()
        && r.estimated_alpha == Some(report.estimate.alpha)));
}

#[tokio::test]
async fn test_failing_sink_keeps_blocks_committed() {
    let sink = Arc::new(MemorySink::failing());
    let mut session = ExperimentSession::start(Config::default(), None, Some(3))
        .unwrap()
        .with_sink(sink.clone());
    let mut participant = SimulatedParticipant::new(1.0, 3);

    let report = run_session(&mut session, &mut participant, Pacing::Virtual)
        .await
        .unwrap();

    assert!(!report.phase1_delivered);
    assert!(!report.phase2_delivered);
    assert!(session.session().is_committed(SurveyPhase::Phase1));
    assert!(session.session().is_committed(SurveyPhase::Phase2));
    assert_eq!(session.session().commits().len(), 2);
    assert!(sink.receipts().await.is_empty());
}

#[tokio::test]
async fn test_lapses_are_recorded_as_timeouts_and_excluded_from_estimation() {
    let mut session = ExperimentSession::start(full_config(), None, Some(5)).unwrap();
    let mut participant = SimulatedParticipant::new(0.75, 5).with_lapse_rate(1.0);

    let report = run_session(&mut session, &mut participant, Pacing::Virtual)
        .await
        .unwrap();

    assert_eq!(report.practice.timeouts, 0);
    assert_eq!(report.phase1.timeouts, 27);
    assert!(report.estimate.is_fallback());
    assert!((report.estimate.alpha - 0.75).abs() < f64::EPSILON);

    let records = session.session().records(SurveyPhase::Phase1);
    assert!(records.iter().all(|r| r.timed_out && r.confidence.is_none()));
}

#[tokio::test]
async fn test_same_seed_same_timelines() {
    let a = ExperimentSession::start(full_config(), None, Some(99)).unwrap();
    let b = ExperimentSession::start(full_config(), None, Some(99)).unwrap();
    assert_eq!(a.timeline(SurveyPhase::Phase1), b.timeline(SurveyPhase::Phase1));
    assert_eq!(a.timeline(SurveyPhase::Practice), b.timeline(SurveyPhase::Practice));
}

#[tokio::test]
async fn test_phase_order_is_enforced() {
    let mut session = ExperimentSession::start(Config::default(), None, Some(1)).unwrap();
    assert!(matches!(
        session.finish_phase1().await,
        Err(DomainError::PhaseOrder { .. })
    ));
    assert!(session.finish_phase2().await.is_err());
}

#[tokio::test]
async fn test_session_id_comes_from_clock() {
    let clock = FixedClock(Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap());
    let session = ExperimentSession::start_with_clock(
        Config::default(),
        Some("P1".into()),
        Some(2),
        Arc::new(clock),
    )
    .unwrap();
    assert_eq!(session.session().id, "ses_20260314T092653");
    assert_eq!(session.session().started_at, clock.0);
}

#[tokio::test]
async fn test_commit_receipts_are_stamped_by_clock() {
    let clock = FixedClock(Utc.with_ymd_and_hms(2026, 5, 2, 14, 0, 0).unwrap());
    let sink = Arc::new(MemorySink::new());
    let mut session =
        ExperimentSession::start_with_clock(full_config(), Some("P7".into()), Some(5), Arc::new(clock))
            .unwrap()
            .with_sink(sink.clone());
    let mut participant = SimulatedParticipant::new(0.8, 5);

    run_session(&mut session, &mut participant, Pacing::Virtual)
        .await
        .unwrap();

    let receipts = sink.receipts().await;
    assert_eq!(receipts.len(), 2);
    assert!(receipts.iter().all(|r| r.committed_at == clock.0));
    assert!(session.session().commits().iter().all(|r| r.committed_at == clock.0));
}

#[tokio::test]
async fn test_practice_timeline_has_no_attention_checks() {
    let session = ExperimentSession::start(full_config(), None, Some(8)).unwrap();
    let practice = session.timeline(SurveyPhase::Practice);
    assert_eq!(practice.len(), 3);
    assert!(practice
        .items()
        .iter()
        .all(|item| matches!(item, TimelineItem::Trial(spec) if spec.is_practice)));
}

#[tokio::test]
async fn test_jsonl_output_round_trips_through_estimation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("responses.jsonl");
    let sink = Arc::new(JsonlSink::open(&path).await.unwrap());

    let mut session = ExperimentSession::start(full_config(), None, Some(21))
        .unwrap()
        .with_sink(sink);
    let mut participant = SimulatedParticipant::new(0.5, 21);
    let report = run_session(&mut session, &mut participant, Pacing::Virtual)
        .await
        .unwrap();

    let contents = tokio::fs::read_to_string(&path).await.unwrap();
    let choices = risk_survey::cli::commands::estimate::parse_choices(&contents).unwrap();
    assert_eq!(choices.len(), 27 - report.phase1.timeouts);

    let estimate = risk_survey::AlphaEstimator::from_choices(choices).estimate();
    assert!((estimate.alpha - report.estimate.alpha).abs() < f64::EPSILON);
}

#[tokio::test(start_paused = true)]
async fn test_realtime_pacing_uses_the_driver() {
    let mut config = Config::default();
    config.experiment.phase2_trials = 5;
    let mut session = ExperimentSession::start(config, None, Some(4)).unwrap();
    let mut participant = SimulatedParticipant::new(0.9, 4);

    let report = run_session(&mut session, &mut participant, Pacing::RealTime)
        .await
        .unwrap();
    assert_eq!(report.phase1.trials, 4);
    assert_eq!(report.phase1.attention_checks, 2);
    assert_eq!(report.phase2.trials, 5);
    assert_eq!(report.phase1.timeouts, 0);
}

#[tokio::test]
async fn test_trial_view_uses_configured_bar_sizes() {
    let mut config = full_config();
    config.experiment.bar_sizes.large.width = 210;
    config.experiment.bar_sizes.small.height = 140;
    config.experiment.font_sizes.large = 22;

    let mut session = ExperimentSession::start(config, None, Some(4)).unwrap();
    let Some(TimelineItem::Trial(spec)) = session.next_item() else {
        panic!("practice block should open with a trial");
    };
    let view = session.begin_trial(spec).view(std::time::Duration::ZERO);

    for option in [&view.left, &view.right] {
        match option.size_class {
            "size-large" => assert_eq!(option.width, 210),
            _ => assert_eq!(option.height, 140),
        }
        assert_eq!(option.value_font_size, 22);
    }
}
