use std::cell::Cell;

use autotuner::prelude::*;

/// Drives one fastest-of-style decision point with synthetic costs and
/// returns the sequence of selected variant indices.
fn drive(tuner: &Tuner, label: &str, variable: VariableId, costs: &[f64], iterations: usize) -> Vec<usize> {
    let mut selections = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        let ctx = tuner.begin_context(label);
        let values = tuner
            .request_output_values(ctx, &[OutputRequest::new(variable, 0i64)])
            .unwrap();
        let index = usize::try_from(values[0].as_int().unwrap()).unwrap();
        selections.push(index);
        tuner.report_cost(ctx, costs[index]).unwrap();
        tuner.end_context(ctx).unwrap();
    }
    selections
}

fn variant_variable(tuner: &Tuner, label: &str, n: i64) -> VariableId {
    tuner
        .declare_variable(
            label,
            ValueKind::Int64,
            Category::Categorical,
            Domain::int_range(0, n - 1, 1),
        )
        .unwrap()
}

#[test]
fn exploration_cycles_through_all_variants() {
    let tuner = Tuner::new();
    tuner.set_strategy("choose-one", FastestOf::new().exploration_trials(3).reprobe_every(0));
    let variant = variant_variable(&tuner, "choose-one", 3);

    let selections = drive(&tuner, "choose-one", variant, &[10.0, 5.0, 1.0], 9);
    assert_eq!(selections, vec![0, 1, 2, 0, 1, 2, 0, 1, 2]);
}

#[test]
fn converges_on_the_cheapest_variant() {
    let tuner = Tuner::new();
    tuner.set_strategy("choose-one", FastestOf::new().exploration_trials(3).reprobe_every(20));
    let variant = variant_variable(&tuner, "choose-one", 3);

    let selections = drive(&tuner, "choose-one", variant, &[10.0, 5.0, 1.0], 109);

    // After the 9 exploration observations, the cheapest variant wins every
    // call except the periodic re-probes (one per 20 observations).
    let post = &selections[9..];
    let wins = post.iter().filter(|&&i| i == 2).count();
    assert!(
        wins >= 95,
        "variant 2 should win all but the re-probes: {wins}/100"
    );
}

#[test]
fn disabled_reprobe_locks_in_the_winner() {
    let tuner = Tuner::new();
    tuner.set_strategy("locked", FastestOf::new().exploration_trials(3).reprobe_every(0));
    let variant = variant_variable(&tuner, "locked", 3);

    let selections = drive(&tuner, "locked", variant, &[10.0, 5.0, 1.0], 109);
    assert!(selections[9..].iter().all(|&i| i == 2));
}

#[test]
fn ties_break_to_the_lowest_index() {
    let tuner = Tuner::new();
    tuner.set_strategy("tied", FastestOf::new().exploration_trials(2).reprobe_every(0));
    let variant = variant_variable(&tuner, "tied", 2);

    let selections = drive(&tuner, "tied", variant, &[4.0, 4.0], 24);
    assert!(selections[4..].iter().all(|&i| i == 0));
}

#[test]
fn reprobes_notice_cost_drift() {
    let tuner = Tuner::new();
    tuner.set_strategy("drifting", FastestOf::new().exploration_trials(3).reprobe_every(20));
    let variant = variant_variable(&tuner, "drifting", 3);

    let early = drive(&tuner, "drifting", variant, &[10.0, 5.0, 1.0], 60);
    assert!(early[50..].iter().all(|&i| i == 2));

    // Variant 2 degrades; its running mean climbs past variant 1 within a
    // few more observations, and the selection moves off it.
    let late = drive(&tuner, "drifting", variant, &[10.0, 5.0, 100.0], 300);
    let tail = &late[250..];
    let wins = tail.iter().filter(|&&i| i == 1).count();
    assert!(
        wins >= 40,
        "variant 1 should dominate after the drift: {wins}/50"
    );
    assert!(
        tail.iter().filter(|&&i| i == 2).count() <= 5,
        "the degraded variant should only be re-probed"
    );
}

#[test]
fn wrapper_runs_exactly_one_variant_per_call() {
    let tuner = Tuner::new();
    let runs = [Cell::new(0u32), Cell::new(0u32), Cell::new(0u32)];

    let mut first = || runs[0].set(runs[0].get() + 1);
    let mut second = || runs[1].set(runs[1].get() + 1);
    let mut third = || runs[2].set(runs[2].get() + 1);

    for _ in 0..30 {
        let ran = tuner
            .fastest_of("noop", &mut [&mut first, &mut second, &mut third])
            .unwrap();
        assert!(ran < 3);
    }

    let total: u32 = runs.iter().map(Cell::get).sum();
    assert_eq!(total, 30);
    assert!(
        runs.iter().all(|r| r.get() >= 3),
        "exploration visits every variant: {:?}",
        runs.iter().map(Cell::get).collect::<Vec<_>>()
    );
}

#[test]
fn wrapper_rejects_an_empty_variant_list() {
    let tuner = Tuner::new();
    let err = tuner.fastest_of("empty", &mut []).unwrap_err();
    assert!(matches!(err, Error::EmptyCandidates));
}

#[test]
fn same_label_keeps_learning_across_call_sites() {
    let tuner = Tuner::new();
    tuner.set_strategy("shared", FastestOf::new().exploration_trials(1).reprobe_every(0));
    let variant = variant_variable(&tuner, "shared", 2);

    drive(&tuner, "shared", variant, &[9.0, 1.0], 5);
    // A later, unrelated call site with the same label and no inputs lands
    // on the same instance and exploits immediately.
    let ctx = tuner.begin_context("shared");
    let values = tuner
        .request_output_values(ctx, &[OutputRequest::new(variant, 0i64)])
        .unwrap();
    assert_eq!(values[0], Value::Int(1));
    tuner.end_context(ctx).unwrap();
}
