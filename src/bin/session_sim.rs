use anyhow::Context;
use cart_risk::utils::logger;
use cart_risk::{
    ActivityTracker, Cart, GateDecision, NewCartItem, RiskConfig, RiskMonitor, UniformNoise,
};
use chrono::{Duration as ChronoDuration, Utc};
use clap::Parser;
use std::sync::{Arc, RwLock};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "session-sim")]
#[command(about = "Replay a scripted shopping session against the abandonment risk monitor")]
struct Args {
    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Number of monitor evaluations to run
    #[arg(long, default_value = "10")]
    ticks: u64,

    /// Polling interval in milliseconds (overrides monitor.interval_secs)
    #[arg(long, default_value = "1000")]
    interval_ms: u64,

    /// How long ago the first item went into the cart, in seconds
    #[arg(long, default_value = "300")]
    cart_age_secs: i64,

    /// Simulated idle seconds per real second once the shopper stops moving
    #[arg(long, default_value = "60")]
    idle_speedup: i32,

    /// Seed for the score noise
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn demo_cart(cart_age_secs: i64) -> Cart {
    let now = Utc::now();
    let age = |offset: i64| now - ChronoDuration::seconds((cart_age_secs - offset).max(0));

    let mut cart = Cart::new();
    cart.add_item(
        NewCartItem::new("Wireless Bluetooth Headphones", 79.99, "Electronics", 4.5),
        age(0),
    );
    let sweater = cart
        .add_item(NewCartItem::new("Cozy Winter Sweater", 34.99, "Clothing", 4.2), age(120))
        .id
        .clone();
    cart.update_quantity(&sweater, 2);
    cart.add_item(NewCartItem::new("Organic Green Tea", 12.99, "Food", 4.8), age(180));
    cart
}

fn browse(tracker: &RwLock<ActivityTracker>, scroll: bool) {
    if let Ok(mut tracker) = tracker.write() {
        tracker.record_pointer_move(Utc::now());
        if scroll {
            tracker.record_scroll(Utc::now());
        }
    }
}

fn drop_item(cart: &RwLock<Cart>, name: &str) -> bool {
    let Ok(mut cart) = cart.write() else {
        return false;
    };
    let id = cart
        .lines()
        .iter()
        .find(|line| line.name == name)
        .map(|line| line.id.clone());
    id.and_then(|id| cart.remove_item(&id)).is_some()
}

fn advance_idle(tracker: &RwLock<ActivityTracker>, simulated_idle: ChronoDuration) {
    if let Ok(mut tracker) = tracker.write() {
        let now = tracker.last_activity() + simulated_idle;
        tracker.refresh_idle(now);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    let config = match &args.config {
        Some(path) => RiskConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path))?,
        None => RiskConfig::default(),
    };
    config.validate_config().context("validating configuration")?;

    let cart = Arc::new(RwLock::new(demo_cart(args.cart_age_secs)));
    let tracker = Arc::new(RwLock::new(ActivityTracker::new(Utc::now())));

    let mut monitor = RiskMonitor::new(
        config.estimator(),
        config.gate(),
        Arc::clone(&cart),
        Arc::clone(&tracker),
        Duration::from_millis(args.interval_ms.max(1)),
    );
    let cart_changed = monitor.cart_changed_handle();

    tracing::info!("🚀 Starting simulated shopping session");

    // Shopper: browses for a moment, drops the tea, then walks away from the screen.
    let shopper_cart = Arc::clone(&cart);
    let shopper_tracker = Arc::clone(&tracker);
    let idle_speedup = args.idle_speedup.max(1);
    let shopper = tokio::spawn(async move {
        for step in 0..20 {
            browse(&shopper_tracker, step % 4 == 0);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        if drop_item(&shopper_cart, "Organic Green Tea") {
            cart_changed.notify_one();
        }

        let idle_since = Utc::now();
        let mut ticker = tokio::time::interval(Duration::from_millis(200));
        loop {
            ticker.tick().await;
            advance_idle(&shopper_tracker, (Utc::now() - idle_since) * idle_speedup);
        }
    });

    let mut noise = match args.seed {
        Some(seed) => UniformNoise::seeded(seed),
        None => UniformNoise::from_entropy(),
    };

    let mut prompted = false;
    let count = monitor
        .run(&mut noise, Some(args.ticks), |tick| {
            match &tick.assessment {
                Some(a) => println!(
                    "[{:>2}] {:<11} risk {:>3}% {:<11} idle {:>5.0}s  offer {}",
                    tick.sequence,
                    format!("{:?}", tick.trigger),
                    a.score,
                    a.level.label(),
                    a.factors.idle_time_secs,
                    a.recommendation.display_value
                ),
                None => println!("[{:>2}] cart is empty", tick.sequence),
            }
            if let GateDecision::Show(offer) = &tick.decision {
                prompted = true;
                println!("     🛍️  Wait! Don't leave yet: {} - {}", offer.display_value, offer.description);
            }
        })
        .await;

    shopper.abort();

    tracing::info!("✅ Session finished after {} evaluations", count);
    if !prompted {
        println!("No retention prompt was shown this session");
    }

    Ok(())
}
