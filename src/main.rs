//! remittance-engine CLI
//!
//! Operate a remittance desk from the command line. State lives in a JSON
//! snapshot file that every command loads and, for writes, saves back.
//!
//! # Usage
//!
//! ```bash
//! # Create a state file with the stock currencies, boxes and rates
//! remittance-engine init
//!
//! # Register a client and send 100 USD from Zelle to a BS box
//! remittance-engine client add --id V-123 --name "Ana Pérez"
//! remittance-engine remit --client V-123 --from USD:Zelle --to "BS:Pago Móvil" --send 100
//!
//! # Move the BS rate and look up a client's history
//! remittance-engine rate set --to BS --rate 38.2
//! remittance-engine transactions --search "pérez"
//!
//! # Business value and today's profit
//! remittance-engine value --format json
//! ```

use chrono::{NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use remittance_engine::config::EngineConfig;
use remittance_engine::core::client::ClientId;
use remittance_engine::core::currency::{BoxId, CurrencyCode};
use remittance_engine::engine::calculator::AmountInput;
use remittance_engine::engine::inventory::AdjustmentDirection;
use remittance_engine::engine::remittance::RemittanceOrder;
use remittance_engine::engine::Desk;
use remittance_engine::simulation::workload::{run_workload, WorkloadConfig};
use remittance_engine::store::snapshot::Snapshot;
use remittance_engine::store::{MemoryStore, Store};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;
use std::process;

const DEFAULT_STATE: &str = "remittance-state.json";

fn print_usage() {
    eprintln!(
        r#"remittance-engine — multi-currency remittance and exchange desk

USAGE:
    remittance-engine <COMMAND> [OPTIONS]

COMMANDS:
    init        Create a state file with the stock catalogue
    rate        Set (set) or list (list) pivot exchange rates
    currency    Add a currency (add) or change its commission (commission)
    box         Add a cash box (add)
    client      Register (add), inspect (show), edit (edit) or take a
                debt payment from (pay) a client
    remit       Record a remittance
    quote       Preview a remittance without recording it
    exchange    Buy one currency by selling another between boxes
    adjust      Inject capital into or take an expense out of a box
    balances    Show every box balance
    transactions
                Transaction history, newest first
    value       Business value and today's profit in the pivot currency
    generate    Run a random workload against the state file
    help        Show this message

GLOBAL OPTIONS:
    --state <FILE>      State file (default: remittance-state.json)
    --config <FILE>     Engine config JSON

OPTIONS (init):
    --force             Overwrite an existing state file

OPTIONS (rate set):
    --to <CUR>          Currency quoted against the pivot
    --rate <RATE>       Units of CUR per pivot unit

OPTIONS (currency add | currency commission):
    --symbol <CUR>      Currency symbol
    --name <NAME>       Display name (add)
    --commission <PCT>  Default commission (default 0 on add)

OPTIONS (box add):
    --currency <CUR>    Currency held in the box
    --name <NAME>       Box name

OPTIONS (client add | show | edit | pay):
    --id <ID>           National ID
    --name <NAME>       Client name (add, edit)
    --phone <PHONE>     Phone number (add, edit)
    --amount <AMOUNT>   Amount paid (pay)
    --currency <CUR>    Currency of the payment (pay, default: debt currency)
    --concept <TEXT>    Description (pay)

OPTIONS (remit, quote):
    --client <ID>       National ID of the client
    --from <CUR:BOX>    Box receiving the client's money
    --credit <CUR>      Extend credit in CUR instead of taking cash
    --to <CUR:BOX>      Box paying the beneficiary
    --send <AMOUNT>     Amount the client hands over (forward mode)
    --receive <AMOUNT>  Amount to deliver (reverse mode)
    --rate <RATE>       Manual rate instead of the resolved one
    --commission <PCT>  Commission instead of the currency default
    --pay-debt <AMOUNT> Keep part of the delivery as debt payment
    --notes <TEXT>      Free text

OPTIONS (exchange):
    --buy <CUR:BOX>     Box receiving the bought currency
    --sell <CUR:BOX>    Box paying for it
    --amount <AMOUNT>   Amount bought
    --rate <RATE>       Units sold per unit bought

OPTIONS (adjust):
    --box <CUR:BOX>     Box to adjust
    --in | --out        Capital injection or expense
    --amount <AMOUNT>   Amount
    --concept <TEXT>    Description

OPTIONS (transactions):
    --search <TEXT>     Client name or national ID contains TEXT
    --date <YYYY-MM-DD> Only transactions created that day (UTC)

OPTIONS (balances, value, transactions, client show, rate list):
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (generate):
    --clients <N>       Number of clients (default: 10)
    --operations <N>    Number of operations (default: 100)
    --seed <N>          RNG seed for a reproducible run

EXAMPLES:
    remittance-engine init --force
    remittance-engine rate set --to BS --rate 38.2
    remittance-engine currency add --symbol EUR --name Euro --commission 2
    remittance-engine box add --currency EUR --name Efectivo
    remittance-engine client add --id V-123 --name "Ana Pérez" --phone 0412-5550000
    remittance-engine remit --client V-123 --from USD:Zelle --to BS:Efectivo --send 100
    remittance-engine remit --client V-123 --credit USD --to BS:Efectivo --receive 7300
    remittance-engine exchange --buy USD:Efectivo --sell BS:Transferencia --amount 100 --rate 36.5
    remittance-engine adjust --box USD:Efectivo --out --amount 20 --concept Rent
    remittance-engine client pay --id V-123 --amount 50
    remittance-engine transactions --search ana
    remittance-engine generate --operations 500 --seed 7"#
    );
}

fn fail(message: impl Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// `--key value` pairs and bare `--flag`s.
struct Options {
    values: HashMap<String, String>,
    flags: Vec<String>,
}

impl Options {
    const FLAGS: [&'static str; 4] = ["--force", "--in", "--out", "--json"];

    fn parse(args: &[String]) -> Self {
        let mut values = HashMap::new();
        let mut flags = Vec::new();
        let mut i = 0;
        while i < args.len() {
            let key = args[i].as_str();
            if !key.starts_with("--") {
                fail(format!("Unexpected argument: {}", key));
            }
            if Self::FLAGS.iter().any(|f| *f == key) {
                flags.push(key.to_string());
            } else {
                i += 1;
                let value = args
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| fail(format!("{} requires a value", key)));
                values.insert(key.to_string(), value);
            }
            i += 1;
        }
        Self { values, flags }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn require(&self, key: &str) -> &str {
        self.get(key)
            .unwrap_or_else(|| fail(format!("{} is required", key)))
    }

    fn flag(&self, key: &str) -> bool {
        self.flags.iter().any(|f| f == key)
    }

    fn decimal(&self, key: &str) -> Option<Decimal> {
        self.get(key).map(|raw| {
            raw.parse()
                .unwrap_or_else(|e| fail(format!("Invalid amount '{}' for {}: {}", raw, key, e)))
        })
    }

    fn box_id(&self, key: &str) -> BoxId {
        let raw = self.require(key);
        BoxId::parse(raw)
            .unwrap_or_else(|| fail(format!("{} expects CURRENCY:BOX, got '{}'", key, raw)))
    }

    fn count(&self, key: &str, default: usize) -> usize {
        self.get(key).map_or(default, |raw| {
            raw.parse()
                .unwrap_or_else(|_| fail(format!("{} requires a number", key)))
        })
    }

    fn json(&self) -> bool {
        self.flag("--json") || self.get("--format") == Some("json")
    }
}

fn state_path(opts: &Options) -> &str {
    opts.get("--state").unwrap_or(DEFAULT_STATE)
}

fn load_desk(opts: &Options) -> Desk {
    match opts.get("--config") {
        Some(path) => Desk::new(EngineConfig::from_json_file(path).unwrap_or_else(|e| fail(e))),
        None => Desk::default(),
    }
}

fn load_store(opts: &Options) -> MemoryStore {
    let path = state_path(opts);
    if !Path::new(path).exists() {
        fail(format!(
            "state file '{}' not found; run `remittance-engine init` first",
            path
        ));
    }
    let snapshot = Snapshot::load(path).unwrap_or_else(|e| fail(e));
    MemoryStore::from_snapshot(snapshot).unwrap_or_else(|e| fail(e))
}

fn save_store(opts: &Options, store: &MemoryStore) {
    let path = state_path(opts);
    store
        .read()
        .and_then(|snapshot| snapshot.stamped().save(path))
        .unwrap_or_else(|e| fail(e));
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(e),
    }
}

fn money(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

fn cmd_init(opts: &Options) {
    let path = state_path(opts);
    if Path::new(path).exists() && !opts.flag("--force") {
        fail(format!("'{}' already exists; use --force to overwrite", path));
    }
    save_store(opts, &MemoryStore::seeded());
    eprintln!("Initialised {} with the stock catalogue", path);
}

/// Split `<action> [OPTIONS]` for commands with sub-actions.
fn split_action<'a>(command: &str, actions: &str, args: &'a [String]) -> (&'a str, Options) {
    match args.split_first() {
        Some((action, rest)) => (action.as_str(), Options::parse(rest)),
        None => fail(format!("{} requires one of: {}", command, actions)),
    }
}

fn cmd_rate(args: &[String]) {
    let (action, opts) = split_action("rate", "set, list", args);
    let desk = load_desk(&opts);

    match action {
        "set" => {
            let mut store = load_store(&opts);
            let rate = opts
                .decimal("--rate")
                .unwrap_or_else(|| fail("--rate is required"));
            let edge = desk
                .set_pivot_rate(&mut store, &CurrencyCode::normalized(opts.require("--to")), rate)
                .unwrap_or_else(|e| fail(e));
            save_store(&opts, &store);
            println!("1 {} = {} {}", edge.from, edge.rate, edge.to);
        }
        "list" => {
            let store = load_store(&opts);
            let table = desk.rate_table(&store).unwrap_or_else(|e| fail(e));
            let mut edges: Vec<_> = table.edges().collect();
            edges.sort_by(|a, b| a.to.cmp(&b.to));
            if opts.json() {
                print_json(&edges);
                return;
            }
            for edge in edges {
                println!(
                    "1 {} = {:>14} {}  (updated {})",
                    edge.from,
                    edge.rate,
                    edge.to,
                    edge.updated_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        other => fail(format!("Unknown rate action: {}", other)),
    }
}

fn cmd_currency(args: &[String]) {
    let (action, opts) = split_action("currency", "add, commission", args);
    let desk = load_desk(&opts);
    let mut store = load_store(&opts);

    let currency = match action {
        "add" => desk.add_currency(
            &mut store,
            opts.require("--symbol"),
            opts.require("--name"),
            opts.decimal("--commission").unwrap_or(Decimal::ZERO),
        ),
        "commission" => desk.set_default_commission(
            &mut store,
            &CurrencyCode::normalized(opts.require("--symbol")),
            opts.decimal("--commission")
                .unwrap_or_else(|| fail("--commission is required")),
        ),
        other => fail(format!("Unknown currency action: {}", other)),
    }
    .unwrap_or_else(|e| fail(e));
    save_store(&opts, &store);
    println!(
        "{} ({}): default commission {}%",
        currency.symbol, currency.name, currency.commission_percent
    );
}

fn cmd_box(args: &[String]) {
    let (action, opts) = split_action("box", "add", args);
    if action != "add" {
        fail(format!("Unknown box action: {}", action));
    }
    let desk = load_desk(&opts);
    let mut store = load_store(&opts);
    let cash_box = desk
        .add_cash_box(
            &mut store,
            &CurrencyCode::normalized(opts.require("--currency")),
            opts.require("--name"),
        )
        .unwrap_or_else(|e| fail(e));
    save_store(&opts, &store);
    println!("Added box {}", cash_box.id);
}

fn cmd_client(args: &[String]) {
    let (action, opts) = split_action("client", "add, show, edit, pay", args);
    let desk = load_desk(&opts);
    let mut store = load_store(&opts);

    match action {
        "add" => {
            let client = desk
                .register_client(
                    &mut store,
                    opts.require("--id"),
                    opts.require("--name"),
                    opts.get("--phone").unwrap_or(""),
                )
                .unwrap_or_else(|e| fail(e));
            save_store(&opts, &store);
            println!("Registered {} ({})", client.name, client.id);
        }
        "show" => {
            let id = ClientId::from(opts.require("--id"));
            let statement = desk
                .client_statement(&store, &id)
                .unwrap_or_else(|e| fail(e));
            if opts.json() {
                print_json(&statement);
                return;
            }
            let client = &statement.client;
            println!("{} ({})  phone: {}", client.name, client.id, client.phone);
            println!(
                "Debt: {} {}",
                money(client.debt),
                client.debt_currency
            );
            for m in &statement.movements {
                println!(
                    "  {}  {:>12} {}  {}",
                    m.created_at().format("%Y-%m-%d %H:%M"),
                    money(m.amount()),
                    m.currency(),
                    m.concept()
                );
            }
        }
        "edit" => {
            let id = ClientId::from(opts.require("--id"));
            let current = desk.find_client(&store, &id).unwrap_or_else(|e| fail(e));
            let client = desk
                .update_client_contact(
                    &mut store,
                    &id,
                    opts.get("--name").unwrap_or(&current.name),
                    opts.get("--phone").unwrap_or(&current.phone),
                )
                .unwrap_or_else(|e| fail(e));
            save_store(&opts, &store);
            println!("Updated {} ({})  phone: {}", client.name, client.id, client.phone);
        }
        "pay" => {
            let id = ClientId::from(opts.require("--id"));
            let current = desk.find_client(&store, &id).unwrap_or_else(|e| fail(e));
            let amount = opts
                .decimal("--amount")
                .unwrap_or_else(|| fail("--amount is required"));
            if amount <= Decimal::ZERO {
                fail("--amount must be positive");
            }
            let currency = opts
                .get("--currency")
                .map_or(current.debt_currency, CurrencyCode::normalized);
            let concept = opts.get("--concept").unwrap_or("Debt payment");
            let client = desk
                .apply_debt_delta(&mut store, &id, -amount, &currency, concept, None)
                .unwrap_or_else(|e| fail(e));
            save_store(&opts, &store);
            println!(
                "{} paid {} {}; debt now {} {}",
                client.name,
                money(amount),
                currency,
                money(client.debt),
                client.debt_currency
            );
        }
        other => fail(format!("Unknown client action: {}", other)),
    }
}

fn remittance_order(opts: &Options) -> RemittanceOrder {
    let amount = match (opts.decimal("--send"), opts.decimal("--receive")) {
        (Some(send), None) => AmountInput::Send(send),
        (None, Some(receive)) => AmountInput::Receive(receive),
        _ => fail("exactly one of --send or --receive is required"),
    };

    let mut order = match (opts.get("--from"), opts.get("--credit")) {
        (Some(_), None) => {
            let from = opts.box_id("--from");
            RemittanceOrder::new(
                opts.require("--client"),
                from.currency.clone(),
                opts.box_id("--to"),
                amount,
            )
            .from_box(from.name)
        }
        (None, Some(currency)) => RemittanceOrder::new(
            opts.require("--client"),
            CurrencyCode::normalized(currency),
            opts.box_id("--to"),
            amount,
        )
        .on_credit(),
        _ => fail("exactly one of --from or --credit is required"),
    };

    if let Some(rate) = opts.decimal("--rate") {
        order = order.with_rate(rate);
    }
    if let Some(commission) = opts.decimal("--commission") {
        order = order.with_commission(commission);
    }
    if let Some(payment) = opts.decimal("--pay-debt") {
        order = order.paying_debt(payment);
    }
    if let Some(notes) = opts.get("--notes") {
        order = order.with_notes(notes);
    }
    order
}

fn cmd_remit(opts: &Options) {
    let desk = load_desk(opts);
    let mut store = load_store(opts);
    let order = remittance_order(opts);
    let tx = desk
        .execute_remittance(&mut store, &order)
        .unwrap_or_else(|e| fail(e));
    save_store(opts, &store);

    if opts.json() {
        print_json(&tx);
        return;
    }
    println!("Remittance {} for {}", tx.reference(), tx.client_name);
    println!("  Sent:      {} {} ({})", money(tx.send.amount), tx.send.currency, tx.send.box_name());
    println!("  Rate:      {}", tx.rate);
    println!("  Delivered: {} {} ({})", money(tx.delivered_amount()), tx.receive.currency, tx.receive.box_id.name);
    if tx.debt_payment_amount > Decimal::ZERO {
        println!("  Debt paid: {}", money(tx.debt_payment_amount));
    }
    println!("  Profit:    {} {}", money(tx.profit), tx.profit_currency);
}

fn cmd_quote(opts: &Options) {
    let desk = load_desk(opts);
    let store = load_store(opts);
    let order = remittance_order(opts);
    let preview = desk
        .preview_remittance(&store, &order)
        .unwrap_or_else(|e| fail(e));

    if opts.json() {
        print_json(&preview);
        return;
    }
    let quote = &preview.quote;
    println!("Send:       {} {}", money(quote.send_amount), order.send_currency);
    println!("Commission: {}%", quote.commission_percent);
    println!("Net:        {} {}", money(quote.net_amount), order.send_currency);
    println!("Rate:       {}", quote.rate);
    println!("Receive:    {} {}", money(quote.receive_amount), order.receive_box.currency);
    if preview.settlement.payment > Decimal::ZERO {
        println!("Debt paid:  {}", money(preview.settlement.payment));
        println!("Delivered:  {} {}", money(preview.settlement.delivered), order.receive_box.currency);
    }
    println!("Profit:     {} {}", money(quote.profit), order.send_currency);
}

fn cmd_exchange(opts: &Options) {
    let desk = load_desk(opts);
    let mut store = load_store(opts);
    let amount = opts
        .decimal("--amount")
        .unwrap_or_else(|| fail("--amount is required"));
    let rate = opts
        .decimal("--rate")
        .unwrap_or_else(|| fail("--rate is required"));
    let exchange = desk
        .exchange(&mut store, &opts.box_id("--buy"), &opts.box_id("--sell"), amount, rate)
        .unwrap_or_else(|e| fail(e));
    save_store(opts, &store);

    println!(
        "Bought {} into {}, sold {} from {}",
        money(exchange.purchase.amount()),
        exchange.purchase.box_id(),
        money(-exchange.sale.amount()),
        exchange.sale.box_id()
    );
}

fn cmd_adjust(opts: &Options) {
    let direction = match (opts.flag("--in"), opts.flag("--out")) {
        (true, false) => AdjustmentDirection::In,
        (false, true) => AdjustmentDirection::Out,
        _ => fail("exactly one of --in or --out is required"),
    };
    let desk = load_desk(opts);
    let mut store = load_store(opts);
    let amount = opts
        .decimal("--amount")
        .unwrap_or_else(|| fail("--amount is required"));
    let movement = desk
        .adjust(
            &mut store,
            &opts.box_id("--box"),
            direction,
            amount,
            opts.get("--concept").unwrap_or(""),
        )
        .unwrap_or_else(|e| fail(e));
    save_store(opts, &store);
    println!("{}: {} ({})", movement.box_id(), money(movement.amount()), movement.concept());
}

fn cmd_balances(opts: &Options) {
    let desk = load_desk(opts);
    let store = load_store(opts);
    let balances = desk.balances(&store).unwrap_or_else(|e| fail(e));

    if opts.json() {
        print_json(&balances);
        return;
    }
    if balances.all_balances().is_empty() {
        println!("No movements recorded.");
        return;
    }
    let mut current: Option<&CurrencyCode> = None;
    for (box_id, amount) in balances.sorted() {
        if current != Some(&box_id.currency) {
            println!("{}", box_id.currency);
            current = Some(&box_id.currency);
        }
        println!("  {:<20} {:>14}", box_id.name, money(amount));
    }
}

fn cmd_transactions(opts: &Options) {
    let desk = load_desk(opts);
    let store = load_store(opts);
    let mut transactions = desk
        .search_transactions(&store, opts.get("--search").unwrap_or(""))
        .unwrap_or_else(|e| fail(e));
    if let Some(raw) = opts.get("--date") {
        let date: NaiveDate = raw
            .parse()
            .unwrap_or_else(|e| fail(format!("Invalid date '{}': {}", raw, e)));
        transactions.retain(|t| t.is_on(date));
    }

    if opts.json() {
        print_json(&transactions);
        return;
    }
    if transactions.is_empty() {
        println!("No transactions found.");
        return;
    }
    for tx in &transactions {
        println!(
            "{}  {}  {:<20} {:>12} {} ({}) -> {:>14} {} ({}){}",
            tx.created_at.format("%Y-%m-%d %H:%M"),
            tx.reference(),
            tx.client_name,
            money(tx.send.amount),
            tx.send.currency,
            tx.send.box_name(),
            money(tx.delivered_amount()),
            tx.receive.currency,
            tx.receive.box_id.name,
            if tx.is_debt { "  [credit]" } else { "" }
        );
    }
}

fn cmd_value(opts: &Options) {
    let desk = load_desk(opts);
    let store = load_store(opts);
    let valuation = desk.business_value(&store).unwrap_or_else(|e| fail(e));
    let profit = desk.todays_profit(&store).unwrap_or_else(|e| fail(e));

    if opts.json() {
        #[derive(serde::Serialize)]
        struct ValueOutput<'a> {
            pivot: &'a CurrencyCode,
            date: String,
            #[serde(flatten)]
            valuation: &'a remittance_engine::engine::valuation::Valuation,
            todays_profit: Decimal,
        }
        print_json(&ValueOutput {
            pivot: desk.pivot(),
            date: Utc::now().date_naive().to_string(),
            valuation: &valuation,
            todays_profit: profit,
        });
        return;
    }
    let pivot = desk.pivot();
    println!("Cash:          {} {}", money(valuation.cash), pivot);
    println!("Receivables:   {} {}", money(valuation.receivables), pivot);
    println!("Total value:   {} {}", money(valuation.total), pivot);
    println!("Today's profit: {} {}", money(profit), pivot);
    if !valuation.excluded.is_empty() {
        let boxes: Vec<String> = valuation.excluded.iter().map(|b| b.to_string()).collect();
        println!("Excluded (no rate): {}", boxes.join(", "));
    }
}

fn cmd_generate(opts: &Options) {
    let desk = load_desk(opts);
    let mut store = load_store(opts);
    let config = WorkloadConfig {
        clients: opts.count("--clients", 10),
        operations: opts.count("--operations", 100),
        ..Default::default()
    };
    let mut rng = match opts.get("--seed") {
        Some(raw) => StdRng::seed_from_u64(
            raw.parse()
                .unwrap_or_else(|_| fail("--seed requires a number")),
        ),
        None => StdRng::from_entropy(),
    };

    let report = run_workload(&desk, &mut store, &config, &mut rng).unwrap_or_else(|e| fail(e));
    save_store(opts, &store);
    eprintln!(
        "Ran {} operations ({} rejected) → {}",
        report.total(),
        report.rejected,
        state_path(opts)
    );
    print_json(&report);
}

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "init" => cmd_init(&Options::parse(rest)),
        "rate" => cmd_rate(rest),
        "currency" => cmd_currency(rest),
        "box" => cmd_box(rest),
        "client" => cmd_client(rest),
        "remit" => cmd_remit(&Options::parse(rest)),
        "quote" => cmd_quote(&Options::parse(rest)),
        "exchange" => cmd_exchange(&Options::parse(rest)),
        "adjust" => cmd_adjust(&Options::parse(rest)),
        "balances" => cmd_balances(&Options::parse(rest)),
        "transactions" => cmd_transactions(&Options::parse(rest)),
        "value" => cmd_value(&Options::parse(rest)),
        "generate" => cmd_generate(&Options::parse(rest)),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
