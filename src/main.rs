use anyhow::Context;
use log::{info, warn};

use pow_ledger::{KeyPair, Ledger, LedgerConfig, Transaction};

fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = LedgerConfig::from_env().context("Failed to read ledger configuration")?;
    info!(
        "Starting ledger with difficulty {} and mining reward {}",
        config.difficulty, config.mining_reward
    );
    let mut ledger = Ledger::with_config(config);

    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    let miner = KeyPair::generate();
    info!("Alice: {}", alice.address());
    info!("Bob:   {}", bob.address());
    info!("Miner: {}", miner.address());

    let mut transfer = Transaction::new(alice.address().clone(), bob.address().clone(), 10);
    transfer.sign(&alice)?;
    ledger.add_transaction(transfer)?;

    // Signing on behalf of someone else is refused
    let mut forged = Transaction::new(bob.address().clone(), miner.address().clone(), 50);
    if let Err(err) = forged.sign(&alice) {
        warn!("{}", err);
    }

    ledger.mine_pending_transactions(miner.address());
    // The second block carries the first block's reward
    ledger.mine_pending_transactions(miner.address());

    info!("Balance of Alice: {}", ledger.balance_of(alice.address()));
    info!("Balance of Bob:   {}", ledger.balance_of(bob.address()));
    info!("Balance of Miner: {}", ledger.balance_of(miner.address()));
    info!("Chain of {} blocks valid: {}", ledger.len(), ledger.is_chain_valid());

    Ok(())
}
