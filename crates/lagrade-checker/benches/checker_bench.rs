use criterion::{Criterion, criterion_group, criterion_main};
use lagrade_checker::equations::validate_solve;
use lagrade_checker::generator::{
    generate_non_singular_matrix, generate_nonnegative_vector, generate_singular_matrix,
    generate_vector,
};
use lagrade_checker::pldu::validate_pldu;
use lagrade_checker::simplex::validate_simplex;
use lagrade_checker::{
    CheckerConfig, ReferenceEquations, ReferencePldu, ReferenceSimplex,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn bench_generator(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    c.bench_function("generate_non_singular", |bencher| {
        bencher.iter(|| generate_non_singular_matrix(&mut rng, 2..=4, 3).unwrap());
    });
    c.bench_function("generate_singular", |bencher| {
        bencher.iter(|| generate_singular_matrix(&mut rng, 2..=4, 3).unwrap());
    });
}

fn bench_validators(c: &mut Criterion) {
    let config = CheckerConfig::default();
    let mut rng = StdRng::seed_from_u64(1);
    let square = generate_non_singular_matrix(&mut rng, 4..=4, 3).unwrap();
    let rhs = generate_vector(&mut rng, 4, 3).unwrap();
    let lp = generate_singular_matrix(&mut rng, 4..=4, 3).unwrap();
    let lp_b = generate_nonnegative_vector(&mut rng, lp.len(), 1000).unwrap();
    let lp_c = generate_vector(&mut rng, lp[0].len(), 3).unwrap();

    c.bench_function("validate_pldu_4x4", |bencher| {
        bencher.iter(|| validate_pldu(&mut ReferencePldu, &square, &config).unwrap());
    });
    c.bench_function("validate_solve_4x4", |bencher| {
        bencher.iter(|| validate_solve(&mut ReferenceEquations, &square, &rhs, &config).unwrap());
    });
    c.bench_function("validate_simplex_4x4", |bencher| {
        bencher.iter(|| {
            validate_simplex(&mut ReferenceSimplex, &lp, &lp_b, &lp_c, &config).unwrap()
        });
    });
}

criterion_group!(benches, bench_generator, bench_validators);
criterion_main!(benches);
