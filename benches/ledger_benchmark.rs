use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use remittance_engine::core::currency::{BoxId, CurrencyCode};
use remittance_engine::engine::calculator::AmountInput;
use remittance_engine::engine::remittance::RemittanceOrder;
use remittance_engine::engine::Desk;
use remittance_engine::simulation::workload::{run_workload, WorkloadConfig};
use remittance_engine::store::{MemoryStore, Store};
use rust_decimal_macros::dec;

fn populated_store(operations: usize) -> (Desk, MemoryStore) {
    let desk = Desk::default();
    let mut store = MemoryStore::seeded();
    let config = WorkloadConfig {
        clients: 50,
        operations,
        ..Default::default()
    };
    let mut rng = StdRng::seed_from_u64(42);
    // Benchmarks only make sense on a populated store.
    run_workload(&desk, &mut store, &config, &mut rng).expect("workload failed");
    (desk, store)
}

fn bench_balances_1k(c: &mut Criterion) {
    let (_, store) = populated_store(1_000);
    let ledger = store.read().expect("read failed").cash_movements;

    c.bench_function("balances_1k_operations", |b| {
        b.iter(|| black_box(&ledger).balances_by_box())
    });
}

fn bench_business_value_10k(c: &mut Criterion) {
    let (desk, store) = populated_store(10_000);

    c.bench_function("business_value_10k_operations", |b| {
        b.iter(|| desk.business_value(black_box(&store)))
    });
}

fn bench_verify_all_10k(c: &mut Criterion) {
    let (desk, store) = populated_store(10_000);

    c.bench_function("verify_all_10k_operations", |b| {
        b.iter(|| desk.verify_all(black_box(&store)))
    });
}

fn bench_remittance_preview(c: &mut Criterion) {
    let (desk, store) = populated_store(100);
    let order = RemittanceOrder::new(
        "V-00001",
        CurrencyCode::new("BS"),
        BoxId::new("COP", "Nequi"),
        AmountInput::Receive(dec!(420000)),
    )
    .from_box("Pago Móvil");

    c.bench_function("remittance_preview", |b| {
        b.iter(|| desk.preview_remittance(black_box(&store), black_box(&order)))
    });
}

criterion_group!(
    benches,
    bench_balances_1k,
    bench_business_value_10k,
    bench_verify_all_10k,
    bench_remittance_preview
);
criterion_main!(benches);
