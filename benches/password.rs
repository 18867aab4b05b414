use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use gantry::auth::PasswordKdf;
use std::hint::black_box;

fn bench_password(c: &mut Criterion) {
    let mut group = c.benchmark_group("pbkdf2");
    group.sample_size(10);

    for rounds in [10_000u32, 100_000, 600_000] {
        let kdf = PasswordKdf::new(rounds);
        let phc = kdf.hash("correct horse battery staple").expect("hash");

        group.bench_with_input(BenchmarkId::new("hash", rounds), &kdf, |b, kdf| {
            b.iter(|| kdf.hash(black_box("correct horse battery staple")));
        });
        group.bench_with_input(BenchmarkId::new("verify", rounds), &phc, |b, phc| {
            b.iter(|| kdf.verify(black_box("correct horse battery staple"), phc));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_password);
criterion_main!(benches);
