mod common;

use std::time::Duration;

use common::{Event, FRAME_NS, Harness, config, sample};
use gazelat_core::{
    Eye, GazeSample, OperatorSignals, Stimulus, TrackerError, TransportError, TrialFault,
    TrialOutcome,
};
use gazelat_experiment::TrialController;

fn run(h: &mut Harness) -> TrialOutcome {
    TrialController::new(&mut h.rig, 0).run()
}

#[test]
fn trigger_produces_a_full_timing_record() {
    let mut h = Harness::new(config(1));
    h.rig.tracker.script([
        Some(sample(500.0, 500.0)),
        None,
        None,
        Some(sample(530.0, 530.0)),
    ]);
    h.rig.transport.acks.push_back(Ok("48210\r\n".into()));

    let outcome = run(&mut h);

    let record = outcome.record().expect("trial should succeed");
    assert_eq!(record.sensing_delay_us, 2 * FRAME_NS / 1000);
    assert_eq!(record.drawing_delay_us, FRAME_NS / 1000);
    assert_eq!(record.e2e_token, "48210");
    assert_eq!(
        h.journal.presented(),
        vec![
            Stimulus::IdleBlack,
            Stimulus::IdleWhite,
            Stimulus::IdleBlack,
            Stimulus::TriggeredWhite,
            Stimulus::TriggeredBlack,
            Stimulus::TriggeredWhite,
            Stimulus::TriggeredBlack,
        ]
    );
}

#[test]
fn actions_happen_in_protocol_order() {
    let mut h = Harness::new(config(1));
    h.rig.tracker.script([Some(sample(100.0, 100.0)), Some(sample(60.0, 40.0))]);
    h.rig.transport.acks.push_back(Ok("1".into()));

    assert!(run(&mut h).is_ok());

    let events = h.journal.events();
    let first_trigger_frame = h
        .journal
        .position(&Event::Present(Stimulus::TriggeredWhite))
        .unwrap();
    let trigger_sample = h
        .journal
        .position(&Event::Poll(Some(sample(60.0, 40.0))))
        .unwrap();
    let baseline_sample = h
        .journal
        .position(&Event::Poll(Some(sample(100.0, 100.0))))
        .unwrap();
    let send = h.journal.position(&Event::SendTrigger).unwrap();
    let ack = h.journal.position(&Event::ReceiveAck).unwrap();
    let stop = h.journal.position(&Event::StopStreaming).unwrap();

    assert_eq!(events[0], Event::Present(Stimulus::IdleBlack));
    assert!(h.journal.position(&Event::Offline).unwrap() < h.journal.position(&Event::StartStreaming).unwrap());
    assert!(baseline_sample < trigger_sample);
    assert!(trigger_sample < first_trigger_frame);
    let last_frame = events
        .iter()
        .rposition(|e| matches!(e, Event::Present(_)))
        .unwrap();
    assert!(last_frame < send);
    assert!(send < ack);
    assert!(ack < stop);
    assert_eq!(events.last(), Some(&Event::FlushInput));
}

#[test]
fn invalid_samples_are_skipped_while_waiting_for_a_baseline() {
    let mut h = Harness::new(config(1));
    h.rig.tracker.script([
        None,
        Some(GazeSample::missing(Eye::Right)),
        Some(GazeSample::new(100.0, 100.0, 0.0, Eye::Right)),
        Some(sample(100.0, 100.0)),
        Some(sample(200.0, 200.0)),
    ]);
    h.rig.transport.acks.push_back(Ok("9".into()));

    let outcome = run(&mut h);

    assert!(outcome.is_ok());
    // trigger came on the first armed poll, before any idle frame
    assert_eq!(outcome.record().unwrap().sensing_delay_us, 0);
}

#[test]
fn single_axis_shifts_never_trigger() {
    let mut h = Harness::new(config(1));
    h.rig.tracker.script([
        Some(sample(500.0, 500.0)),
        Some(sample(600.0, 500.0)),
        Some(sample(500.0, 600.0)),
        Some(sample(524.0, 560.0)),
    ]);
    h.rig.presenter.skip_at = Some(4);

    let outcome = run(&mut h);

    assert_eq!(outcome, TrialOutcome::Skip);
    assert!(h.journal.presented().iter().all(|s| !s.is_triggered()));
    assert_eq!(h.journal.count(&Event::SendTrigger), 0);
}

#[test]
fn far_candidate_without_pupil_does_not_trigger() {
    let mut h = Harness::new(config(1));
    h.rig.tracker.script([
        Some(sample(500.0, 500.0)),
        Some(GazeSample::new(1500.0, 900.0, 0.0, Eye::Right)),
    ]);
    h.rig.presenter.abort_at = Some(3);

    assert_eq!(run(&mut h), TrialOutcome::Abort);
    assert_eq!(h.journal.count(&Event::SendTrigger), 0);
}

#[test]
fn idle_frames_alternate_until_the_trial_is_skipped() {
    let mut h = Harness::new(config(1));
    h.rig.tracker.script([Some(sample(10.0, 10.0))]);
    h.rig.presenter.skip_at = Some(6);

    assert_eq!(run(&mut h), TrialOutcome::Skip);
    assert_eq!(
        h.journal.presented(),
        vec![
            Stimulus::IdleBlack,
            Stimulus::IdleWhite,
            Stimulus::IdleBlack,
            Stimulus::IdleWhite,
            Stimulus::IdleBlack,
            Stimulus::IdleWhite,
        ]
    );
}

#[test]
fn repeat_request_ends_the_trial() {
    let mut h = Harness::new(config(1));
    h.rig.tracker.script([Some(sample(10.0, 10.0))]);
    h.rig.presenter.repeat_at = Some(2);

    assert_eq!(run(&mut h), TrialOutcome::Repeat);
    assert_eq!(h.journal.count(&Event::StopStreaming), 1);
}

#[test]
fn lost_link_while_armed_aborts() {
    let mut h = Harness::new(config(1));
    h.rig.tracker.script([Some(sample(10.0, 10.0))]);
    let link = h.rig.tracker.connected.clone();
    h.rig.presenter.drop_link_at = Some((3, link));

    assert_eq!(run(&mut h), TrialOutcome::Abort);
    assert_eq!(h.journal.presented().len(), 3);
}

#[test]
fn no_link_samples_is_a_trial_error() {
    let mut h = Harness::new(config(1));
    h.rig.tracker.stream_starts.push_back(false);

    let outcome = run(&mut h);

    assert_eq!(outcome, TrialOutcome::Error(TrialFault::NoLinkSamples(100)));
    assert_eq!(
        h.journal.presented(),
        vec![Stimulus::IdleBlack, Stimulus::IdleBlack]
    );
    assert!(!h.journal.events().iter().any(|e| matches!(e, Event::Poll(_))));
    assert_eq!(h.journal.count(&Event::StopStreaming), 1);
}

#[test]
fn streaming_start_failure_carries_the_tracker_code() {
    let mut h = Harness::new(config(1));
    h.rig.tracker.start_error = Some(TrackerError::StartStreaming { code: 27 });

    assert_eq!(
        run(&mut h),
        TrialOutcome::Error(TrialFault::StartStreaming(27))
    );
    assert_eq!(h.journal.count(&Event::StopStreaming), 1);
}

#[test]
fn lost_link_at_streaming_start_aborts_the_run() {
    let mut h = Harness::new(config(1));
    h.rig.tracker.start_error = Some(TrackerError::Connect("link down".into()));

    assert_eq!(run(&mut h), TrialOutcome::Abort);
    assert!(!h.journal.events().iter().any(|e| matches!(e, Event::Poll(_))));
    assert_eq!(h.journal.count(&Event::StopStreaming), 1);
}

#[test]
fn failed_trigger_write_skips_the_acknowledgement() {
    let mut h = Harness::new(config(1));
    h.rig.tracker.script([Some(sample(0.0, 0.0)), Some(sample(50.0, 50.0))]);
    h.rig.transport.send_error = Some(TransportError::ShortWrite { written: 0 });

    let outcome = run(&mut h);

    assert!(matches!(
        outcome,
        TrialOutcome::Error(TrialFault::TransportWrite(_))
    ));
    assert_eq!(h.journal.count(&Event::ReceiveAck), 0);
}

#[test]
fn failed_acknowledgement_read_is_a_trial_error() {
    let mut h = Harness::new(config(1));
    h.rig.tracker.script([Some(sample(0.0, 0.0)), Some(sample(50.0, 50.0))]);
    h.rig
        .transport
        .acks
        .push_back(Err(TransportError::AckTimeout { timeout_ms: 500 }));

    let outcome = run(&mut h);

    assert_eq!(
        outcome,
        TrialOutcome::Error(TrialFault::TransportRead(
            "no acknowledgement within 500 ms".into()
        ))
    );
    assert!(outcome.record().is_none());
}

#[test]
fn empty_acknowledgement_still_records() {
    let mut h = Harness::new(config(1));
    h.rig.tracker.script([Some(sample(0.0, 0.0)), Some(sample(50.0, 50.0))]);
    h.rig.transport.acks.push_back(Ok(String::new()));

    let outcome = run(&mut h);

    assert_eq!(outcome.record().map(|r| r.e2e_token.as_str()), Some(""));
}

#[test]
fn display_failure_aborts_before_the_trigger_is_sent() {
    let mut h = Harness::new(config(1));
    h.rig.tracker.script([Some(sample(0.0, 0.0)), Some(sample(50.0, 50.0))]);
    h.rig.presenter.fail_at = Some(2);

    assert_eq!(run(&mut h), TrialOutcome::Abort);
    assert_eq!(h.journal.count(&Event::SendTrigger), 0);
}

#[test]
fn bounded_baseline_wait_gives_up() {
    let mut cfg = config(1);
    cfg.baseline_timeout_ms = Some(5);
    let mut h = Harness::new(cfg);
    h.rig.tracker.poll_cost_ns = 1_000_000;

    assert_eq!(run(&mut h), TrialOutcome::Error(TrialFault::NoBaseline(5)));
}

#[test]
fn teardown_keeps_a_trailing_window_and_clears_signals() {
    let mut cfg = config(1);
    cfg.trailing_window_ms = 100;
    cfg.mode_switch_delay_ms = 50;
    let mut h = Harness::new(cfg);
    h.rig.tracker.script([Some(sample(0.0, 0.0)), Some(sample(50.0, 50.0))]);
    h.rig.transport.acks.push_back(Ok("5".into()));
    // raised during the triggered frames, after the last operator check
    h.rig.presenter.repeat_at = Some(3);

    assert!(run(&mut h).is_ok());

    let settle = h.journal.position(&Event::Sleep(Duration::from_millis(50))).unwrap();
    let start = h.journal.position(&Event::StartStreaming).unwrap();
    let trailing = h.journal.position(&Event::Sleep(Duration::from_millis(100))).unwrap();
    let ack = h.journal.position(&Event::ReceiveAck).unwrap();
    let stop = h.journal.position(&Event::StopStreaming).unwrap();
    assert!(settle < start);
    assert!(ack < trailing && trailing < stop);

    let mut signals = h.signals.clone();
    assert!(!signals.repeat_requested());
}
