use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ccpp_xai::explainability::TreeExplainer;
use ccpp_xai::training::RandomForest;
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Plant-like rows: four ambient features, output falling with temperature
fn create_plant_data(n_rows: usize) -> (Array2<f64>, Array1<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(0);

    let x = Array2::from_shape_fn((n_rows, 4), |(_, j)| match j {
        0 => rng.gen_range(2.0..35.0),
        1 => rng.gen_range(25.0..80.0),
        2 => rng.gen_range(993.0..1033.0),
        _ => rng.gen_range(25.0..100.0),
    });

    let y = x
        .outer_iter()
        .map(|r| 497.0 - 1.8 * r[0] - 0.25 * r[1] + 0.06 * (r[2] - 1013.0) - 0.15 * r[3])
        .collect();

    (x, y)
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10); // Fewer samples for training benchmarks

    for n_rows in [1000, 4000, 8000].iter() {
        let data = create_plant_data(*n_rows);

        group.bench_with_input(BenchmarkId::new("fit", n_rows), &data, |b, (x, y)| {
            b.iter(|| {
                let mut forest = RandomForest::new_regressor(60)
                    .with_max_depth(15)
                    .with_random_state(42);
                forest.fit(black_box(x), black_box(y)).unwrap();
                forest
            })
        });
    }

    group.finish();
}

fn bench_tree_shap(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_shap");
    group.sample_size(10);

    // Train model once
    let (x_train, y_train) = create_plant_data(4000);
    let mut forest = RandomForest::new_regressor(60).with_max_depth(15).with_random_state(42);
    forest.fit(&x_train, &y_train).unwrap();
    let explainer = TreeExplainer::new(&forest).unwrap();

    for n_rows in [100, 500, 2000].iter() {
        let (x, _) = create_plant_data(*n_rows);

        group.bench_with_input(BenchmarkId::new("shap_values", n_rows), &x, |b, x| {
            b.iter(|| explainer.shap_values(black_box(x)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_training, bench_tree_shap);
criterion_main!(benches);
