use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use k_nn::KnnClassifier;
use ndarray::Array1;
use pseudolab_helpers::L2Dist;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

// Roughly a full rotation store: 4 classes at the default cap of 400.
const EXAMPLES_PER_CLASS: usize = 400;
const DIMENSION: usize = 256;

fn random_vector(rng: &mut Xoshiro256PlusPlus) -> Array1<f32> {
    Array1::from_shape_fn(DIMENSION, |_| rng.random_range(-1.0..1.0))
}

fn bench_predict(c: &mut Criterion) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
    let mut classifier = KnnClassifier::new(L2Dist);
    for label in 0..4u16 {
        for _ in 0..EXAMPLES_PER_CLASS {
            classifier
                .add_example(random_vector(&mut rng), label)
                .expect("uniform dimension");
        }
    }
    let query = random_vector(&mut rng);

    c.bench_function("predict_k3_full_store", |b| {
        b.iter(|| classifier.predict(black_box(query.view()), 3))
    });
}

criterion_group!(benches, bench_predict);
criterion_main!(benches);
