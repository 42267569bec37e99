//! Credit extended on one remittance and paid back out of the next.
//!
//! Shows the debt subledger staying in step with the movement log.

use remittance_engine::core::client::ClientId;
use remittance_engine::core::currency::{BoxId, CurrencyCode};
use remittance_engine::engine::calculator::AmountInput;
use remittance_engine::engine::remittance::RemittanceOrder;
use remittance_engine::engine::Desk;
use remittance_engine::store::MemoryStore;
use rust_decimal_macros::dec;

fn main() {
    println!("╔═══════════════════════════════════════════════╗");
    println!("║  remittance-engine: Credit and Payment Demo   ║");
    println!("╚═══════════════════════════════════════════════╝\n");

    let desk = Desk::default();
    let mut store = MemoryStore::seeded();
    let id = ClientId::new("V-123");
    desk.register_client(&mut store, "V-123", "Luis Gómez", "").unwrap();

    // --- Step 1: remittance on credit ---
    println!("━━━ Step 1: 200 USD to BS cash, on credit ━━━\n");

    let credit = RemittanceOrder::new(
        "V-123",
        CurrencyCode::new("USD"),
        BoxId::new("BS", "Efectivo"),
        AmountInput::Send(dec!(200)),
    )
    .on_credit()
    .with_notes("Pays next week");
    let tx = desk.execute_remittance(&mut store, &credit).unwrap();
    println!("Delivered {} BS from {}", tx.delivered_amount(), tx.receive.box_id);
    println!("Client debt: {}", desk.find_client(&store, &id).unwrap().debt);
    println!();

    // --- Step 2: next remittance pays part of the debt ---
    println!("━━━ Step 2: 300 USD by Zelle, 120 kept as payment ━━━\n");

    let repay = RemittanceOrder::new(
        "V-123",
        CurrencyCode::new("USD"),
        BoxId::new("USD", "Efectivo"),
        AmountInput::Send(dec!(300)),
    )
    .from_box("Zelle")
    .paying_debt(dec!(120));
    let tx = desk.execute_remittance(&mut store, &repay).unwrap();
    println!("Receive amount: {} USD", tx.receive.amount);
    println!("Debt payment:   {} USD", tx.debt_payment_amount);
    println!("Delivered:      {} USD", tx.delivered_amount());
    println!();

    // --- Step 3: statement ---
    println!("━━━ Statement ━━━\n");

    let statement = desk.client_statement(&store, &id).unwrap();
    for movement in &statement.movements {
        println!("  {:>10} {}  {}", movement.amount(), movement.currency(), movement.concept());
    }
    println!("  Current debt: {} {}", statement.client.debt, statement.client.debt_currency);

    match desk.verify_all(&store) {
        Ok(()) => println!("\n✓ Debt matches its movement history"),
        Err(e) => println!("\n✗ {}", e),
    }
}
