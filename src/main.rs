use anyhow::Context;
use exadapt::core::client::OperationKey;
use exadapt::utils::exchange_factory::{builtin_ids, ExchangeFactory};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Usage: `exadapt [adapter] [symbol]`, e.g. `exadapt bitvavo BTC/EUR`
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let adapter = args.next().unwrap_or_else(|| "bitvavo".to_string());
    let symbol = args.next();

    let client = ExchangeFactory::create_client_from_env(&adapter).with_context(|| {
        format!("unknown adapter '{}', try one of {}", adapter, builtin_ids().join(", "))
    })?;
    if client.config().endpoint(OperationKey::FetchMarkets).is_none() {
        println!("{} only supports raw requests", client.id());
        return Ok(());
    }

    info!(exchange = %client.id(), "loading markets");
    let markets = client.load_markets().await.context("fetching markets")?;
    println!("Found {} markets on {}", markets.len(), client.config().name);
    for market in markets.iter().take(5) {
        println!(
            "Market: {} ({} -> {}), type {:?}, active: {}",
            market.symbol, market.base, market.quote, market.market_type, market.active
        );
    }

    if let Some(symbol) = symbol {
        let market = markets.get(&symbol)?;
        let book = client.fetch_order_book(market, Some(5)).await?;
        println!("Order book for {}", book.symbol);
        for level in &book.asks {
            println!("  ask {} @ {}", level.amount, level.price);
        }
        for level in &book.bids {
            println!("  bid {} @ {}", level.amount, level.price);
        }
    }

    Ok(())
}
