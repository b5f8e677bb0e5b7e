// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Basic beacon usage example.
//!
//! Demonstrates:
//! 1. Building a beacon over in-memory cookie and local stores
//! 2. A burst of search impressions collapsing into one call
//! 3. Cart mutations and the debounced preflight
//! 4. Shopper login and an order
//! 5. Displaying metrics
//!
//! Outbound calls are captured by a recording transport, so nothing leaves
//! the machine.
//!
//! # Run
//!
//! ```bash
//! cargo run --example basic_usage
//! ```

use std::sync::Arc;
use std::time::Duration;

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};

use beacon_engine::{
    Backends, Beacon, BeaconConfig, CartProduct, CartSchemaData, Globals, Item, MemoryCookieStore,
    MemoryLocalStore, OrderTransactionSchemaData, Payload, ProductPageviewSchemaData,
    RecordingTransport, SearchSchemaData,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().expect("failed to install metrics recorder");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beacon_engine=debug".into()),
        )
        .with_target(false)
        .compact()
        .init();

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║            beacon-engine: Basic Usage Example                 ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    // ─────────────────────────────────────────────────────────────────────────
    // 1. Build the beacon
    // ─────────────────────────────────────────────────────────────────────────
    let transport = Arc::new(RecordingTransport::new());
    let backends = Backends::new(transport.clone())
        .with_cookies(Arc::new(MemoryCookieStore::new()))
        .with_local(Arc::new(MemoryLocalStore::new()));
    let config = BeaconConfig {
        href: Some("https://www.example.com/search?q=boots&ss_attribution=email:fall-sale".into()),
        ..Default::default()
    };
    let beacon = Beacon::new(Globals::new("abc123"), config, backends)?;

    println!("📦 Beacon ready");
    println!("   └─ userId:     {}", beacon.user_id());
    println!("   └─ sessionId:  {}", beacon.session_id());
    println!("   └─ pageLoadId: {}", beacon.page_load_id());

    // ─────────────────────────────────────────────────────────────────────────
    // 2. Impressions inside one window
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📝 Tracking 3 impression events for responseId r-1...");
    for chunk in [["boot-1", "boot-2"], ["boot-3", "boot-4"], ["boot-5", "boot-6"]] {
        let results = chunk.iter().map(|uid| Item::new(*uid)).collect();
        beacon.search_impression(Payload::new(
            SearchSchemaData::new(results).with_response_id("r-1"),
        ));
    }
    println!("   └─ Pending: {}", beacon.pending_requests());
    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("   ✅ Sent {} request(s)", transport.len());

    // ─────────────────────────────────────────────────────────────────────────
    // 3. Cart and viewed state
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🛒 Viewing a product and filling the cart...");
    beacon.product_page_view(Payload::new(ProductPageviewSchemaData::new(Item::new("boot-3"))));
    beacon.cart_add(Payload::new(CartSchemaData::new(vec![CartProduct::new("boot-3", 1, 89.0)])));
    beacon.cart_add(Payload::new(CartSchemaData::new(vec![CartProduct::new("boot-3", 1, 79.0)])));
    for product in beacon.cart().get() {
        println!("   └─ {} x{} @ {:.2}", product.uid, product.qty, product.price);
    }
    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("   ✅ Preflights sent: {}", transport.preflights().len());

    // ─────────────────────────────────────────────────────────────────────────
    // 4. Login and order
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🔐 Logging in and placing the order...");
    beacon.set_shopper_id("shopper-42");
    beacon.order_transaction(Payload::new(OrderTransactionSchemaData {
        order_id: Some("order-1001".into()),
        total: Some(79.0),
        results: beacon.cart().get(),
        ..Default::default()
    }));
    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("   └─ Cart after order: {:?}", beacon.cart().product_ids());

    println!("\n📍 Outbound calls:");
    for request in transport.requests() {
        println!("   └─ {} {} ({} bytes)", request.method, request.url, request.body.len());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 5. Metrics
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📈 Metrics:");
    dump_metrics(&snapshotter);

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║                    Example complete!                          ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    Ok(())
}

fn dump_metrics(snapshotter: &Snapshotter) {
    let mut counters = Vec::new();
    let mut gauges = Vec::new();
    let mut histograms = Vec::new();

    for (composite_key, _, _, value) in snapshotter.snapshot().into_vec() {
        let (_, key) = composite_key.into_parts();
        let labels: Vec<_> = key.labels().map(|l| format!("{}={}", l.key(), l.value())).collect();
        let name = if labels.is_empty() {
            key.name().to_string()
        } else {
            format!("{}{{{}}}", key.name(), labels.join(","))
        };

        match value {
            DebugValue::Counter(v) => counters.push((name, v)),
            DebugValue::Gauge(v) => gauges.push((name, v.into_inner())),
            DebugValue::Histogram(samples) => {
                let sum: f64 = samples.iter().map(|v| v.into_inner()).sum();
                histograms.push((name, samples.len(), sum));
            }
        }
    }

    counters.sort();
    gauges.sort_by(|a, b| a.0.cmp(&b.0));
    histograms.sort_by(|a, b| a.0.cmp(&b.0));

    for (name, value) in &counters {
        println!("   └─ {} = {}", name, value);
    }
    for (name, value) in &gauges {
        println!("   └─ {} = {:.0}", name, value);
    }
    for (name, count, sum) in &histograms {
        println!("   └─ {} count={} sum={:.0}", name, count, sum);
    }
    if counters.is_empty() && gauges.is_empty() && histograms.is_empty() {
        println!("   └─ (no metrics recorded)");
    }
}
