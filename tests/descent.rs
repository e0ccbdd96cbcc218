use std::sync::Arc;

use autotuner::prelude::*;

#[test]
fn two_axis_search_finds_the_per_axis_optimum() {
    let tuner = Tuner::builder().exploration_trials(1).reprobe_every(0).build();
    let chunk = tuner
        .declare_variable(
            "chunk",
            ValueKind::Int64,
            Category::Ordinal,
            Domain::set([1i64, 2, 4]),
        )
        .unwrap();
    let threads = tuner
        .declare_variable(
            "threads",
            ValueKind::Int64,
            Category::Ordinal,
            Domain::set([8i64, 16]),
        )
        .unwrap();

    // Separable cost surface; minimum at chunk = 2, threads = 16.
    let chunk_cost = |c: i64| match c {
        1 => 5.0,
        2 => 1.0,
        _ => 9.0,
    };
    let thread_cost = |t: i64| if t == 8 { 4.0 } else { 2.0 };

    let mut picks = Vec::new();
    for _ in 0..15 {
        let ctx = tuner.begin_context("stencil");
        let values = tuner
            .request_output_values(
                ctx,
                &[OutputRequest::new(chunk, 1i64), OutputRequest::new(threads, 8i64)],
            )
            .unwrap();
        let (c, t) = (values[0].as_int().unwrap(), values[1].as_int().unwrap());
        tuner.report_cost(ctx, chunk_cost(c) + thread_cost(t)).unwrap();
        tuner.end_context(ctx).unwrap();
        picks.push((c, t));
    }

    assert!(
        picks[10..].iter().all(|&p| p == (2, 16)),
        "descent should settle on the separable optimum: {picks:?}"
    );
}

#[test]
fn continuous_ranges_are_scanned_on_the_step_grid() {
    let tuner = Tuner::builder().exploration_trials(1).reprobe_every(0).build();
    let damping = tuner
        .declare_variable(
            "damping",
            ValueKind::Float64,
            Category::Interval,
            Domain::range(0.8, 1.2, 0.1),
        )
        .unwrap();

    // Cost dips at 1.1.
    let mut picks = Vec::new();
    for _ in 0..12 {
        let ctx = tuner.begin_context("gauss-seidel");
        let d = tuner
            .request_output_values(ctx, &[OutputRequest::new(damping, 1.0)])
            .unwrap()[0]
            .as_float()
            .unwrap();
        tuner.report_cost(ctx, (d - 1.1).abs()).unwrap();
        tuner.end_context(ctx).unwrap();
        assert!((0.8..=1.2).contains(&d), "{d} escaped the declared range");
        picks.push(d);
    }

    let settled = *picks.last().unwrap();
    assert!(
        (settled - 1.1).abs() < 0.05,
        "descent should settle near the dip: {picks:?}"
    );
}

#[test]
fn discrete_domain_is_never_violated() {
    let tuner = Tuner::new();
    let tile = tuner
        .declare_variable(
            "tile",
            ValueKind::Int64,
            Category::Ordinal,
            Domain::set([2i64, 4, 8]),
        )
        .unwrap();

    // Ten thousand random observation histories; every returned value must
    // stay inside the declared set.
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    for _ in 0..10_000 {
        let ctx = tuner.begin_context("fuzzed");
        let v = tuner
            .request_output_values(ctx, &[OutputRequest::new(tile, 4i64)])
            .unwrap()[0];
        assert!(
            matches!(v, Value::Int(2 | 4 | 8)),
            "value {v} escaped the declared set"
        );
        tuner.report_cost(ctx, rng.f64() * 100.0).unwrap();
        tuner.end_context(ctx).unwrap();
    }
}

#[test]
fn observations_flow_through_the_injected_store() {
    let history = Arc::new(MemoryHistory::new());
    let tuner = Tuner::builder()
        .exploration_trials(1)
        .reprobe_every(0)
        .history(Arc::clone(&history) as Arc<dyn HistoryStore>)
        .build();
    let knob = tuner
        .declare_variable("knob", ValueKind::Int64, Category::Ordinal, Domain::set([7i64]))
        .unwrap();

    for cost in [4.0, 6.0, 5.0] {
        let ctx = tuner.begin_context("mean");
        tuner
            .request_output_values(ctx, &[OutputRequest::new(knob, 7i64)])
            .unwrap();
        tuner.report_cost(ctx, cost).unwrap();
        tuner.end_context(ctx).unwrap();
    }

    let keys = history.keys();
    assert_eq!(keys.len(), 1);
    let entries = history.lookup(keys[0]).unwrap();
    assert_eq!(entries.len(), 1, "a single candidate has a single entry");
    assert_eq!(entries[0].1.count, 3);
    assert_eq!(entries[0].1.mean, 5.0, "incremental mean of [4, 6, 5]");
}

#[test]
fn fresh_stores_isolate_tuners() {
    let build = || {
        let tuner = Tuner::builder().exploration_trials(1).reprobe_every(0).build();
        let tile = tuner
            .declare_variable(
                "tile",
                ValueKind::Int64,
                Category::Ordinal,
                Domain::set([1i64, 2]),
            )
            .unwrap();
        (tuner, tile)
    };

    // Teach the first tuner that tile 2 is cheap.
    let (veteran, tile) = build();
    for _ in 0..6 {
        let ctx = veteran.begin_context("isolated");
        let t = veteran
            .request_output_values(ctx, &[OutputRequest::new(tile, 1i64)])
            .unwrap()[0]
            .as_int()
            .unwrap();
        veteran.report_cost(ctx, if t == 2 { 1.0 } else { 9.0 }).unwrap();
        veteran.end_context(ctx).unwrap();
    }

    // A fresh tuner with its own store starts cold: same label, same
    // domain, but the default comes back.
    let (rookie, tile) = build();
    let ctx = rookie.begin_context("isolated");
    let values = rookie
        .request_output_values(ctx, &[OutputRequest::new(tile, 1i64)])
        .unwrap();
    assert_eq!(values[0], Value::Int(1));
    rookie.end_context(ctx).unwrap();
}
