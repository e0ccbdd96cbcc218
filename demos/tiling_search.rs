//! Tune the tile sizes of a blocked matrix multiply. The candidate tiles
//! are the factors of each extent, and the decision point carries the
//! problem shape as an input so different shapes learn separately.

use autotuner::prelude::*;

const M: usize = 64;
const N: usize = 64;
const P: usize = 64;
const ITERATIONS: usize = 150;

fn blocked_matmul(a: &[f64], b: &[f64], out: &mut [f64], ti: usize, tj: usize) {
    for i0 in (0..M).step_by(ti) {
        for j0 in (0..P).step_by(tj) {
            for i in i0..(i0 + ti).min(M) {
                for j in j0..(j0 + tj).min(P) {
                    let mut acc = 0.0;
                    for k in 0..N {
                        acc += a[i * N + k] * b[k * P + j];
                    }
                    out[i * P + j] = acc;
                }
            }
        }
    }
}

fn main() {
    let tuner = Tuner::new();
    let shape = tuner
        .declare_variable(
            "extent",
            ValueKind::Int64,
            Category::Ordinal,
            Domain::set([M as i64]),
        )
        .expect("input declaration failed");
    let ti = tuner
        .declare_variable(
            "ti",
            ValueKind::Int64,
            Category::Ordinal,
            Domain::factors_of(M as i64),
        )
        .expect("ti declaration failed");
    let tj = tuner
        .declare_variable(
            "tj",
            ValueKind::Int64,
            Category::Ordinal,
            Domain::factors_of(P as i64),
        )
        .expect("tj declaration failed");

    let a = vec![1.5f64; M * N];
    let b = vec![0.5f64; N * P];
    let mut out = vec![0.0f64; M * P];

    let mut last = (0, 0);
    for _ in 0..ITERATIONS {
        let ctx = tuner.begin_context("mm2d");
        tuner
            .set_input_values(ctx, &[(shape, Value::Int(M as i64))])
            .expect("input attach failed");
        let values = tuner
            .request_output_values(ctx, &[OutputRequest::new(ti, 8i64), OutputRequest::new(tj, 8i64)])
            .expect("tile request failed");
        let (ti_v, tj_v) = (
            values[0].as_int().expect("ti is an integer") as usize,
            values[1].as_int().expect("tj is an integer") as usize,
        );

        {
            let _timer = tuner.measure(ctx);
            blocked_matmul(&a, &b, &mut out, ti_v, tj_v);
        }
        tuner.end_context(ctx).expect("unbalanced context");
        last = (ti_v, tj_v);
    }

    println!("settled on tiles ti={} tj={} after {ITERATIONS} iterations", last.0, last.1);
}
