//! A day at the desk: two remittances, a currency purchase and the
//! resulting balances, business value and profit.

use remittance_engine::core::currency::{BoxId, CurrencyCode};
use remittance_engine::engine::calculator::AmountInput;
use remittance_engine::engine::inventory::AdjustmentDirection;
use remittance_engine::engine::remittance::RemittanceOrder;
use remittance_engine::engine::Desk;
use remittance_engine::store::MemoryStore;
use rust_decimal_macros::dec;

fn main() {
    println!("╔════════════════════════════════════════════╗");
    println!("║  remittance-engine: Basic Remittance Demo  ║");
    println!("╚════════════════════════════════════════════╝\n");

    let desk = Desk::default();
    let mut store = MemoryStore::seeded();

    // Opening float
    desk.adjust(&mut store, &BoxId::new("BS", "Pago Móvil"), AdjustmentDirection::In, dec!(50_000), "Opening float")
        .unwrap();
    desk.adjust(&mut store, &BoxId::new("COP", "Nequi"), AdjustmentDirection::In, dec!(2_000_000), "Opening float")
        .unwrap();
    desk.register_client(&mut store, "V-12345678", "Ana Pérez", "0412-5550000")
        .unwrap();

    // --- Scenario 1: forward mode ---
    println!("━━━ Scenario 1: Client sends 100 USD by Zelle ━━━\n");

    let order = RemittanceOrder::new(
        "V-12345678",
        CurrencyCode::new("USD"),
        BoxId::new("BS", "Pago Móvil"),
        AmountInput::Send(dec!(100)),
    )
    .from_box("Zelle")
    .with_commission(dec!(5));
    let tx = desk.execute_remittance(&mut store, &order).unwrap();

    println!("Reference:  {}", tx.reference());
    println!("Sent:       {} {}", tx.send.amount, tx.send.currency);
    println!("Net:        {} {}", tx.net_amount, tx.send.currency);
    println!("Rate:       {}", tx.rate);
    println!("Delivered:  {} {}", tx.delivered_amount(), tx.receive.currency);
    println!("Profit:     {} {}", tx.profit, tx.profit_currency);
    println!();

    // --- Scenario 2: reverse mode, cross rate ---
    println!("━━━ Scenario 2: Beneficiary must get 420,000 COP, client pays in BS ━━━\n");

    let order = RemittanceOrder::new(
        "V-12345678",
        CurrencyCode::new("BS"),
        BoxId::new("COP", "Nequi"),
        AmountInput::Receive(dec!(420_000)),
    )
    .from_box("Transferencia");
    let preview = desk.preview_remittance(&store, &order).unwrap();
    println!("Client must pay: {} BS", preview.quote.send_amount.round_dp(2));
    println!("Cross rate:      {} COP per BS", preview.quote.rate.round_dp(4));
    let tx = desk.execute_remittance(&mut store, &order).unwrap();
    println!("Recorded as {}", tx.reference());
    println!();

    // --- Scenario 3: buy dollars ---
    println!("━━━ Scenario 3: Buy 200 USD cash with BS ━━━\n");

    let exchange = desk
        .exchange(
            &mut store,
            &BoxId::new("USD", "Efectivo"),
            &BoxId::new("BS", "Pago Móvil"),
            dec!(200),
            dec!(36.8),
        )
        .unwrap();
    println!("{} → {}", exchange.sale.amount(), exchange.purchase.amount());
    println!();

    // --- Results ---
    println!("━━━ Box balances ━━━\n");
    for (box_id, amount) in desk.balances(&store).unwrap().sorted() {
        println!("  {:<24} {:>16}", box_id.to_string(), amount.round_dp(2));
    }

    let value = desk.business_value(&store).unwrap();
    println!("\nBusiness value: {} USD", value.total.round_dp(2));
    println!("Today's profit: {} USD", desk.todays_profit(&store).unwrap().round_dp(2));
}
