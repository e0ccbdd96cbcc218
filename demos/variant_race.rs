//! Race three interchangeable 1-D stencil sweeps and let the tuner converge
//! on the cheapest one. The kernel is the same; the variants differ in how
//! they walk the array.

use std::cell::RefCell;

use autotuner::Tuner;

const LENGTH: usize = 32_768;
const ITERATIONS: usize = 200;

fn sweep_forward(stencil: &mut [f64]) {
    for i in 1..stencil.len() - 1 {
        stencil[i] = (stencil[i - 1] + stencil[i] + stencil[i + 1]) / 3.0;
    }
}

fn sweep_chunked(stencil: &mut [f64]) {
    let mut i = 1;
    while i < stencil.len() - 1 {
        let end = (i + 512).min(stencil.len() - 1);
        for j in i..end {
            stencil[j] = (stencil[j - 1] + stencil[j] + stencil[j + 1]) / 3.0;
        }
        i = end;
    }
}

fn sweep_reversed(stencil: &mut [f64]) {
    for i in (1..stencil.len() - 1).rev() {
        stencil[i] = (stencil[i - 1] + stencil[i] + stencil[i + 1]) / 3.0;
    }
}

fn main() {
    let tuner = Tuner::new();
    let mut stencil = vec![0.0f64; LENGTH];
    stencil[LENGTH / 2] = 1000.0;

    let mut tally = [0usize; 3];
    for _ in 0..ITERATIONS {
        let buffer = RefCell::new(stencil.clone());
        let mut forward = || sweep_forward(&mut buffer.borrow_mut());
        let mut chunked = || sweep_chunked(&mut buffer.borrow_mut());
        let mut reversed = || sweep_reversed(&mut buffer.borrow_mut());

        let ran = tuner
            .fastest_of("heat-transfer", &mut [&mut forward, &mut chunked, &mut reversed])
            .expect("variant selection failed");
        tally[ran] += 1;
    }

    println!("selections over {ITERATIONS} iterations:");
    for (index, name) in ["forward", "chunked", "reversed"].iter().enumerate() {
        println!("  {name:>8}: {}", tally[index]);
    }
}
