use anyhow::Context;
use cart_risk::core::cart::CheckoutSummary;
use cart_risk::utils::{error::RiskError, logger, validation::Validate};
use cart_risk::{
    CartSnapshot, CliConfig, GateDecision, MonitorTick, NoNoise, NoiseSource, RiskAssessment,
    RiskMonitor, UniformNoise,
};
use chrono::Utc;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting cart-risk");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    let risk_config = config.load_risk_config().unwrap_or_else(|e| exit_with(&e));
    let cart = CartSnapshot::from_json_file(&config.cart).unwrap_or_else(|e| exit_with(&e));
    tracing::info!("📁 Loaded {} cart lines from {}", cart.len(), config.cart.display());

    let signals = config.activity_signals();
    let mut noise: Box<dyn NoiseSource> = match (config.no_noise, config.seed) {
        (true, _) => Box::new(NoNoise),
        (false, Some(seed)) => Box::new(UniformNoise::seeded(seed)),
        (false, None) => Box::new(UniformNoise::from_entropy()),
    };

    let estimator = risk_config.estimator();
    tracing::debug!(
        caps = ?estimator.caps(),
        weights = ?estimator.weights(),
        noise_amplitude = estimator.noise_amplitude(),
        discount_above = estimator.offers().discount_above,
        shipping_above = estimator.offers().shipping_above,
        "Estimator settings"
    );

    if !config.watch {
        let assessment = estimator.assess(&cart, &signals, Utc::now(), noise.as_mut());
        print_assessment(assessment.as_ref(), &cart, config.json)?;
        return Ok(());
    }

    let mut monitor = RiskMonitor::new(
        estimator,
        risk_config.gate(),
        cart,
        signals,
        risk_config.monitor_interval(),
    );
    let json = config.json;

    tokio::select! {
        count = monitor.run(noise.as_mut(), config.ticks, |tick| {
            if let Err(e) = print_tick(tick, json) {
                tracing::warn!("Failed to print tick {}: {:#}", tick.sequence, e);
            }
        }) => {
            tracing::info!("✅ Watch finished after {} evaluations", count);
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, stopping watch");
        }
    }

    Ok(())
}

fn exit_with(e: &RiskError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(1);
}

fn print_assessment(
    assessment: Option<&RiskAssessment>,
    cart: &CartSnapshot,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        let rendered =
            serde_json::to_string_pretty(&assessment).context("serializing risk assessment")?;
        println!("{}", rendered);
        return Ok(());
    }

    let Some(assessment) = assessment else {
        println!("Cart is empty, no risk assessment");
        return Ok(());
    };

    let summary = CheckoutSummary::from_snapshot(cart);
    println!(
        "Abandonment risk: {}% ({})",
        assessment.score,
        assessment.level.label()
    );
    println!(
        "Offer: {} [{}] {}",
        assessment.recommendation.display_value,
        assessment.recommendation.kind,
        assessment.recommendation.description
    );
    println!(
        "Cart: {} items, subtotal ${:.2}, total ${:.2}",
        assessment.factors.item_count, summary.subtotal, summary.total
    );
    Ok(())
}

fn print_tick(tick: &MonitorTick, json: bool) -> anyhow::Result<()> {
    if json {
        let rendered = serde_json::to_string(&tick.assessment).context("serializing tick")?;
        println!("{}", rendered);
    } else {
        match &tick.assessment {
            Some(a) => println!(
                "[{}] {:?}: risk {}% ({}), offer {}",
                tick.sequence,
                tick.trigger,
                a.score,
                a.level.label(),
                a.recommendation.display_value
            ),
            None => println!("[{}] {:?}: cart is empty", tick.sequence, tick.trigger),
        }
    }

    if let GateDecision::Show(offer) = &tick.decision {
        println!("🛍️  Wait! Don't leave yet: {} - {}", offer.display_value, offer.description);
    }
    Ok(())
}
