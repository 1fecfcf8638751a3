mod common;

use common::{main_trial, practice_trial};
use risk_survey::application::TrialDriver;
use risk_survey::domain::models::{Choice, OptionKind, ScreenSide, TrialCondition};
use risk_survey::services::{TrialExecution, TrialInput, TrialState};
use std::time::Duration;
use tokio::time::sleep;

const TRIAL: Duration = Duration::from_secs(8);

fn condition() -> TrialCondition {
    TrialCondition::new(50, 200, 100)
}

#[tokio::test(start_paused = true)]
async fn test_idle_trial_times_out_with_sentinel() {
    let (mut driver, handle) = TrialDriver::channel(8);

    let response = driver
        .run(TrialExecution::new(main_trial(1, condition()), TRIAL))
        .await
        .unwrap();

    assert!(response.timed_out);
    assert_eq!(response.choice, Choice::Timeout);
    assert_eq!(response.confidence, None);
    assert_eq!(response.bar_choice_time, None);
    assert!((response.submit_time - 8.0).abs() < f64::EPSILON);
    assert_eq!(handle.view().unwrap().state, TrialState::TimedOut);
}

#[tokio::test(start_paused = true)]
async fn test_completed_trial_records_timings() {
    let (mut driver, handle) = TrialDriver::channel(8);
    let execution = TrialExecution::new(main_trial(1, condition()), TRIAL).with_total(27);

    let participant = async {
        sleep(Duration::from_millis(1500)).await;
        assert!(handle.send(TrialInput::SelectSide(ScreenSide::Left)).await);
        sleep(Duration::from_millis(1000)).await;
        assert!(handle.send(TrialInput::Confidence(70)).await);
        sleep(Duration::from_millis(500)).await;
        assert!(handle.send(TrialInput::Advance).await);
    };
    let (response, ()) = tokio::join!(driver.run(execution), participant);
    let response = response.unwrap();

    assert!(!response.timed_out);
    assert_eq!(response.choice, Choice::Risk);
    assert_eq!(response.confidence, Some(70));
    assert!((response.bar_choice_time.unwrap() - 1.5).abs() < 0.01);
    assert!((response.submit_time - 3.0).abs() < 0.01);

    let view = handle.view().unwrap();
    assert_eq!(view.state, TrialState::Complete);
    assert_eq!(view.label, "Trial 1 of 27");
}

#[tokio::test(start_paused = true)]
async fn test_choice_without_confidence_still_times_out_with_choice() {
    let (mut driver, handle) = TrialDriver::channel(8);

    let participant = async {
        sleep(Duration::from_secs(2)).await;
        handle.send(TrialInput::SelectOption(OptionKind::Safe)).await;
        handle.send(TrialInput::Advance).await;
    };
    let (response, ()) = tokio::join!(
        driver.run(TrialExecution::new(main_trial(1, condition()), TRIAL)),
        participant
    );
    let response = response.unwrap();

    assert!(response.timed_out);
    assert_eq!(response.choice, Choice::Safe);
    assert_eq!(response.confidence, None);
}

#[tokio::test(start_paused = true)]
async fn test_input_after_deadline_loses_the_race() {
    let (mut driver, handle) = TrialDriver::channel(8);

    let late = async {
        sleep(Duration::from_secs(9)).await;
        handle.send(TrialInput::SelectOption(OptionKind::Risk)).await;
    };
    let (response, ()) = tokio::join!(
        driver.run(TrialExecution::new(main_trial(1, condition()), TRIAL)),
        late
    );

    let response = response.unwrap();
    assert!(response.timed_out);
    assert_eq!(response.choice, Choice::Timeout);
}

#[tokio::test(start_paused = true)]
async fn test_double_advance_emits_one_response_and_stale_input_is_dropped() {
    let (mut driver, handle) = TrialDriver::channel(8);

    let participant = async {
        sleep(Duration::from_millis(10)).await;
        handle.send(TrialInput::SelectOption(OptionKind::Risk)).await;
        handle.send(TrialInput::Confidence(90)).await;
        handle.send(TrialInput::Advance).await;
        handle.send(TrialInput::Advance).await;
        handle.send(TrialInput::SelectOption(OptionKind::Safe)).await;
    };
    let (first, ()) = tokio::join!(
        driver.run(TrialExecution::new(main_trial(1, condition()), TRIAL)),
        participant
    );
    assert_eq!(first.unwrap().choice, Choice::Risk);

    // Leftover inputs must not leak into the next trial
    let second = driver
        .run(TrialExecution::new(main_trial(2, condition()), TRIAL))
        .await
        .unwrap();
    assert!(second.timed_out);
    assert_eq!(second.choice, Choice::Timeout);
}

#[tokio::test(start_paused = true)]
async fn test_countdown_view_refreshes() {
    let (mut driver, mut handle) = TrialDriver::channel(8);
    let observer = handle.clone();

    let watcher = async {
        let first = handle.changed().await.unwrap();
        assert_eq!(first.remaining_secs, Some(8));
        sleep(Duration::from_millis(2500)).await;
        let later = observer.view().unwrap();
        assert!(later.remaining_secs.unwrap() <= 6);
        assert!(!later.next_enabled);
    };
    let (response, ()) = tokio::join!(
        driver.run(TrialExecution::new(main_trial(1, condition()), TRIAL)),
        watcher
    );
    assert!(response.unwrap().timed_out);
}

#[tokio::test(start_paused = true)]
async fn test_practice_trial_without_renderer_errors() {
    let (mut driver, handle) = TrialDriver::channel(8);
    drop(handle);

    let result = driver
        .run(TrialExecution::new(practice_trial(1, condition()), TRIAL))
        .await;
    assert!(result.is_err());
}
