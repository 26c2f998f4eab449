//! Ring peer CLI: joins a UDP ring and plays every configured round.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use dalmuti_ring::game::TracingRenderer;
use dalmuti_ring::{GamePeerBuilder, GreedyChooser, PeerId, RingConfig, UdpLink};

#[derive(Parser)]
#[command(name = "dalmuti-peer")]
#[command(about = "Play The Great Dalmuti as one peer of a token ring")]
struct Args {
    /// Ring description (JSON)
    #[arg(short, long)]
    config: PathBuf,

    /// This peer's id in the ring file
    #[arg(short, long)]
    id: u8,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Override the number of rounds
    #[arg(long)]
    rounds: Option<u32>,

    /// Override the dealer's shuffle seed
    #[arg(long)]
    seed: Option<u64>,

    /// Call a revolution whenever holding both Jesters
    #[arg(long)]
    revolt: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let ring = RingConfig::load(&args.config)?;
    let (mut config, address) = ring.peer(PeerId::new(args.id))?;
    if let Some(rounds) = args.rounds {
        config = config.with_rounds(rounds);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    info!(peer = %config.id, listen = %address.listen, next = %address.next, "joining ring");
    let link = UdpLink::bind(address.listen, address.next)?;
    let mut peer = GamePeerBuilder::new(config)
        .with_chooser(GreedyChooser::new().with_revolt(args.revolt))
        .with_renderer(TracingRenderer)
        .build(link)?;

    for outcome in peer.run()? {
        let finish: Vec<u8> = outcome.finish_order.iter().map(|p| p.get()).collect();
        info!(
            round = outcome.round,
            ?finish,
            revolution = outcome.had_revolution,
            "round finished"
        );
        println!("round {}: finish order {:?}", outcome.round, finish);
    }
    Ok(())
}
