use recorder::{Call, Mode, Recorder, RecorderError, Returned};
use serde_json::{json, Value};

// ── helpers ───────────────────────────────────────────────────────────────────

fn sequence() -> Vec<Call> {
    vec![
        Call::new([json!("open"), json!("/tmp/a")]),
        Call::new([json!("write")]).kw("bytes", 128),
        Call::new([json!("write")]).kw("bytes", 64),
        Call::new([json!("close")]),
    ]
}

fn invoke(r: &Recorder, call: &Call) -> Result<Returned, RecorderError> {
    r.invoke(call.args.clone(), call.kwargs.clone())
}

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|v| json!(v)).collect()
}

// ── properties ────────────────────────────────────────────────────────────────

#[test]
fn replaying_the_recorded_sequence_returns_the_recorded_values() {
    let r = Recorder::new();
    let recorded: Vec<Returned> = r.record_with(|r| {
        sequence()
            .iter()
            .map(|call| invoke(r, call).expect("record"))
            .collect()
    });

    for (call, expected) in sequence().iter().zip(&recorded) {
        let replayed = invoke(&r, call).expect("replay");
        assert_eq!(&replayed, expected);
    }
    r.check_missing_calls().expect("every call consumed");
}

#[test]
fn swapped_order_fails_on_the_first_replayed_call() {
    let r = Recorder::new();
    r.record_with(|r| {
        r.call(ints(&[1])).expect("c1");
        r.call(ints(&[2])).expect("c2");
    });

    let err = r.call(ints(&[2])).expect_err("out of order");
    assert_eq!(
        err,
        RecorderError::CallMismatch {
            expected: "mock(1)".to_string(),
            actual: "mock(2)".to_string(),
        }
    );
}

#[test]
fn excess_call_is_unexpected() {
    let r = Recorder::new();
    r.record_with(|r| r.call(ints(&[1])).map(|_| ()))
        .expect("record");

    r.call(ints(&[1])).expect("c1 replays");
    let err = r.call(ints(&[2])).expect_err("c2 was never recorded");
    assert_eq!(
        err,
        RecorderError::UnexpectedCall {
            call: "mock(2)".to_string()
        }
    );
}

#[test]
fn completion_check_names_the_missing_call() {
    let r = Recorder::new();
    r.record_with(|r| {
        r.call(ints(&[1])).expect("c1");
        r.call(ints(&[2])).expect("c2");
    });

    r.call(ints(&[1])).expect("c1 replays");
    let err = r.check_missing_calls().expect_err("c2 missing");
    assert_eq!(
        err,
        RecorderError::MissingCalls {
            calls: vec!["mock(2)".to_string()]
        }
    );
    assert!(err.is_verification_failure());
}

#[test]
fn concrete_f_scenario() {
    let f = Recorder::named("f");
    let ret = f.record_with(|f| f.call(ints(&[1, 2, 3]))).expect("record");
    assert_eq!(f.call(ints(&[1, 2, 3])).expect("replay"), ret);

    f.record_with(|f| f.call(ints(&[1, 2, 3]))).expect("record again");
    let err = f.call(ints(&[2, 3, 4])).expect_err("mismatch");
    assert_eq!(
        err.to_string(),
        "Expected call: f(1, 2, 3)\nActual call: f(2, 3, 4)"
    );

    // Both sides were consumed by the mismatch, so nothing is left.
    let err = f.call(ints(&[1, 2, 3])).expect_err("unexpected");
    assert_eq!(err.to_string(), "Unexpected call: f(1, 2, 3)");
}

#[test]
fn keyword_arguments_take_part_in_matching() {
    let r = Recorder::new();
    r.record_with(|r| {
        r.invoke(Vec::new(), Call::default().kw("retries", 3).kwargs)
            .expect("record")
    });
    let err = r
        .invoke(Vec::new(), Call::default().kw("retries", 4).kwargs)
        .expect_err("kwarg differs");
    assert!(matches!(
        err,
        RecorderError::CallMismatch { ref expected, ref actual }
            if expected == "mock(retries=3)" && actual == "mock(retries=4)"
    ));
}

#[test]
fn calls_during_recording_are_never_consumed() {
    let r = Recorder::new();
    let scope = r.recording();
    for i in 0..5 {
        scope.call(ints(&[i])).expect("record");
    }
    assert_eq!(scope.pending_calls().len(), 5);
    assert_eq!(scope.mode(), Mode::Recording);
    drop(scope);
    assert_eq!(r.mode(), Mode::Replaying);
    assert_eq!(r.pending_signatures()[0], "mock(0)");
}
