use criterion::{black_box, criterion_group, criterion_main, Criterion};
use r1cs_checker::checker::{
    ConstraintSystem, FieldElement, LinearCombination, PrimeField, R1csConstraint, Witness,
};
use r1cs_checker::verify;

/// A chain `w[i+1] = w[i] * w[i] + w[0]` of `len` constraints on BN254.
fn squaring_chain(len: usize) -> (ConstraintSystem, Witness) {
    let field = PrimeField::bn254();
    let mut values = vec![field.one(), field.from_u64(3)];
    let mut constraints = Vec::with_capacity(len);
    for i in 1..=len {
        let prev = values[i].clone();
        values.push(field.add(&field.mul(&prev, &prev), &field.one()));
        let square = LinearCombination::new().with_term(i, field.one());
        let minus_one = field.neg(&field.one());
        constraints.push(R1csConstraint::new(
            square.clone(),
            square,
            LinearCombination::new()
                .with_term(i + 1, field.one())
                .with_term(0, minus_one),
        ));
    }
    let system = ConstraintSystem::new(field.clone(), values.len() as u32, constraints);
    let witness = Witness::new(field, values).unwrap();
    (system, witness)
}

fn bench_field_mul(c: &mut Criterion) {
    let field = PrimeField::bn254();
    let a: FieldElement = field.neg(&field.from_u64(12345));
    let b: FieldElement = field.neg(&field.from_u64(67890));
    c.bench_function("bn254_mul", |bench| {
        bench.iter(|| black_box(field.mul(black_box(&a), black_box(&b))))
    });
}

fn bench_decode(c: &mut Criterion) {
    let (system, witness) = squaring_chain(1_000);
    let r1cs = system.encode().unwrap();
    let wtns = witness.encode().unwrap();

    c.bench_function("decode_r1cs_1k", |b| {
        b.iter(|| black_box(ConstraintSystem::decode(black_box(&r1cs))).unwrap())
    });
    c.bench_function("decode_wtns_1k", |b| {
        b.iter(|| black_box(Witness::decode(black_box(&wtns))).unwrap())
    });
}

fn bench_verify(c: &mut Criterion) {
    for len in [1_000usize, 10_000] {
        let (system, witness) = squaring_chain(len);
        c.bench_function(&format!("verify_chain_{len}"), |b| {
            b.iter(|| verify(black_box(&system), black_box(&witness)).unwrap())
        });
    }
}

criterion_group!(benches, bench_field_mul, bench_decode, bench_verify);
criterion_main!(benches);
