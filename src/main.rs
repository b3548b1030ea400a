use color_eyre::eyre::Result;
use done_predict::{
    client::EvmChainClient,
    config::HubConfig,
    hub::Hub,
    session,
};
use std::sync::Arc;
use tracing_appender::rolling;
use tracing_subscriber::{
    EnvFilter,
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    let file = rolling::daily("logs", "done-predict.log");
    let (writer, guard) = tracing_appender::non_blocking(file);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let _guard = init_tracing();

    let mut cfg = HubConfig::default();
    if let Ok(url) = std::env::var("DONE_RPC_URL") {
        cfg.rpc_url = url;
    }
    if let Ok(base) = std::env::var("DONE_SCORE_URL") {
        cfg.score_base_url = base;
    }

    let source = session::key_source_from_env()?;
    let signer = session::load_signer(&source)?;
    let (chain, wallet) = EvmChainClient::connect(&cfg, signer).await?;
    println!("Connected as {} on chain {}", wallet.address, wallet.chain_id);

    let hub = Arc::new(Hub::new(Arc::new(chain), wallet, cfg));
    hub.refresh_all().await;

    let snapshot = hub.snapshot();
    println!("DONE balance: {}", snapshot.done_balance);
    println!(
        "Pool: {} DONE | min bet {} | fee {} bps | epoch {}",
        snapshot.pool_balance, snapshot.min_bet, snapshot.fee_bps, snapshot.current_epoch
    );
    if let Some(round) = &snapshot.round {
        if !round.snapshot.locked {
            println!("{}s to lock", round.secs_to_lock);
        } else if !round.snapshot.closed {
            println!("{}s to close", round.secs_to_close);
        } else {
            println!("Round closed");
        }
    }
    for row in &snapshot.claim_rows {
        println!(
            "Epoch #{}: bet {} DONE, payout {}, {}",
            row.epoch, row.amount, row.payout, row.status
        );
    }
    if snapshot.claimable_epochs.is_empty() {
        println!("No claimable rewards.");
    } else {
        println!("Claimable epochs: {:?}", snapshot.claimable_epochs);
    }

    let pollers = hub.start_pollers();
    println!("Polling; press Ctrl-C to disconnect.");
    tokio::signal::ctrl_c().await?;
    for poller in &pollers {
        poller.stop();
    }
    Ok(())
}
