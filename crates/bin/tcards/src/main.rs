//! tcards CLI
//!
//! Drives the threshold-cards primitives from the command line: key
//! generation, private-key escrow and local simulations of a threshold
//! tally and a multi-player deck.
//!
//! ## Usage
//!
//! ```bash
//! # fresh keypair
//! tcards keygen
//!
//! # escrow a private key among the other players (default threshold max(2, others))
//! tcards escrow-split --private-key <hex> --from alice --to bob,carol,dave > shares.json
//!
//! # recover it from the pooled shares
//! tcards escrow-recover --shares shares.json --public-key <hex>
//!
//! # dealerless 2-of-3 tally of the given contributions
//! tcards --config session.json tally --values 3,4,5 --round 1
//!
//! # three players encrypt, shuffle and reveal the top five cards
//! tcards --seed 7 deck --players 3 --reveal 5
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};

use threshold_cards::{
    cipher, dkg, elgamal, rng, shamir, tally,
    wire::{CiphertextWire, KeyShareWire, PartialDecryptionWire},
    DkgOutput, DkgParticipant, KeyPair, KeyShare, Point, Scalar, SecureRng, ThresholdConfig,
};

#[derive(Parser)]
#[command(name = "tcards")]
#[command(about = "dealerless card encryption, key escrow and threshold tally")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Session config (json ThresholdConfig)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Deterministic rng seed (testing only)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a secp256k1 keypair
    Keygen,

    /// Split a private key into escrow shares for the other players
    EscrowSplit {
        /// Private key (64 hex chars)
        #[arg(long)]
        private_key: String,

        /// Owner's player id
        #[arg(long)]
        from: String,

        /// Recipient player ids
        #[arg(long, value_delimiter = ',', required = true)]
        to: Vec<String>,

        /// Reconstruction threshold (overrides config)
        #[arg(short, long)]
        threshold: Option<usize>,
    },

    /// Reconstruct an escrowed private key from pooled shares
    EscrowRecover {
        /// Json array of key shares
        #[arg(short, long)]
        shares: PathBuf,

        /// Expected public key (66 hex chars)
        #[arg(long)]
        public_key: Option<String>,
    },

    /// Simulate a dealerless threshold tally
    Tally {
        /// One contribution per participant
        #[arg(long, value_delimiter = ',', required = true)]
        values: Vec<u64>,

        /// Protocol round, bound into every proof
        #[arg(short, long, default_value = "1")]
        round: u64,
    },

    /// Simulate encrypting, shuffling and revealing a deck
    Deck {
        /// Number of players
        #[arg(short, long, default_value = "2")]
        players: usize,

        /// Cards to reveal from the top
        #[arg(short, long, default_value = "5")]
        reveal: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("tcards={}", level).parse()?)
                .add_directive(format!("threshold_cards={}", level).parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref())?;
    let mut rng = match cli.seed {
        Some(seed) => rng::seeded(seed),
        None => rng::from_os(),
    };

    match cli.command {
        Commands::Keygen => run_keygen(&mut rng),
        Commands::EscrowSplit {
            private_key,
            from,
            to,
            threshold,
        } => run_escrow_split(
            &private_key,
            &from,
            &to,
            threshold.or(config.escrow_threshold),
            &mut rng,
        ),
        Commands::EscrowRecover { shares, public_key } => {
            run_escrow_recover(&shares, public_key.as_deref())
        }
        Commands::Tally { values, round } => run_tally(&config, &values, round, &mut rng),
        Commands::Deck { players, reveal } => run_deck(players, reveal, &mut rng),
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<ThresholdConfig> {
    let config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => ThresholdConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KeygenOutput {
    private_key_hex: String,
    public_key_hex: String,
}

fn run_keygen<R: SecureRng>(rng: &mut R) -> Result<()> {
    let keys = KeyPair::generate(rng);
    info!(public_key = %keys.public_key, "generated keypair");
    print_json(&KeygenOutput {
        private_key_hex: keys.private_key.to_hex(),
        public_key_hex: keys.public_key.to_hex(),
    })
}

fn run_escrow_split<R: SecureRng>(
    private_key: &str,
    from: &str,
    to: &[String],
    threshold: Option<usize>,
    rng: &mut R,
) -> Result<()> {
    let key = Scalar::from_hex(private_key).context("parsing private key")?;
    if let Some(t) = threshold {
        if t > to.len() + 1 {
            bail!(
                "escrow threshold {} exceeds the {} shares of this split",
                t,
                to.len() + 1
            );
        }
    }
    let shares = shamir::create_key_shares(&key, from, to, threshold, rng)?;
    info!(
        from,
        recipients = shares.len(),
        threshold = shares.first().map(|s| s.threshold),
        "escrow shares created"
    );

    let wire: Vec<KeyShareWire> = shares.iter().map(KeyShareWire::from).collect();
    print_json(&wire)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecoverOutput {
    from_player: String,
    private_key_hex: String,
    public_key_hex: String,
    verified: bool,
}

fn run_escrow_recover(shares_path: &std::path::Path, public_key: Option<&str>) -> Result<()> {
    let raw = std::fs::read_to_string(shares_path)
        .with_context(|| format!("reading shares {}", shares_path.display()))?;
    let wire: Vec<KeyShareWire> = serde_json::from_str(&raw).context("parsing shares")?;
    let shares = wire
        .iter()
        .map(KeyShare::try_from)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let expected = public_key
        .map(Point::from_hex)
        .transpose()
        .context("parsing public key")?;
    let key = shamir::recover_key(&shares, expected.as_ref())?;

    print_json(&RecoverOutput {
        from_player: shares[0].from_player.clone(),
        private_key_hex: key.to_hex(),
        public_key_hex: Point::mul_base(&key).to_hex(),
        verified: expected.is_some(),
    })
}

/// full dkg among all participants in one process
fn simulate_dkg<R: SecureRng>(participants: u32, rng: &mut R) -> Result<Vec<DkgOutput>> {
    let mut parts = (1..=participants)
        .map(|i| DkgParticipant::new(i, participants))
        .collect::<threshold_cards::Result<Vec<_>>>()?;

    let mut commitments = Vec::with_capacity(parts.len());
    for p in parts.iter_mut() {
        commitments.push((p.index(), p.commit(rng)?));
    }
    for p in parts.iter_mut() {
        for (dealer, c) in &commitments {
            p.receive_commitment(*dealer, *c)?;
        }
    }

    let mut outgoing = Vec::with_capacity(parts.len());
    for p in parts.iter_mut() {
        outgoing.push((p.index(), p.distribute_shares()?));
    }
    for (dealer, shares) in &outgoing {
        for (to, share) in shares {
            let recipient = &mut parts[*to as usize - 1];
            if !recipient.receive_share(*dealer, *share)? {
                bail!("share from dealer {} to {} failed verification", dealer, to);
            }
        }
    }

    let mut outputs = Vec::with_capacity(parts.len());
    for p in parts.iter_mut() {
        p.verify_shares()?;
        outputs.push(p.finalize()?);
    }
    debug!(participants, "dkg complete");
    Ok(outputs)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TallyOutput {
    context: String,
    aggregate_public_key_hex: String,
    public_shares: BTreeMap<u32, String>,
    total: CiphertextWire,
    partials: Vec<PartialDecryptionWire>,
    sum: u64,
}

fn run_tally<R: SecureRng>(
    config: &ThresholdConfig,
    values: &[u64],
    round: u64,
    rng: &mut R,
) -> Result<()> {
    if values.len() != config.participants as usize {
        bail!(
            "expected {} contributions (one per participant), got {}",
            config.participants,
            values.len()
        );
    }
    if let Some(v) = values.iter().find(|v| **v > config.max_contribution) {
        bail!("contribution {} exceeds max {}", v, config.max_contribution);
    }

    let context = config.round_context(round);
    let outputs = simulate_dkg(config.participants, rng)?;
    let key = outputs[0].aggregate_public_key;
    let public_shares = outputs[0].public_shares.clone();

    let mut ciphertexts = Vec::with_capacity(values.len());
    for &v in values {
        ciphertexts.push(elgamal::encrypt_exp_random(&key, v, rng)?.0);
    }
    let total = elgamal::sum(&ciphertexts);

    // any threshold subset decrypts; take the first participants
    let mut partials = Vec::with_capacity(dkg::THRESHOLD);
    for out in outputs.iter().take(dkg::THRESHOLD) {
        partials.push(tally::partial_decryption(
            &total,
            out.index,
            &out.private_share,
            &context,
            rng,
        )?);
    }

    let sum = tally::decrypt_sum(
        &total,
        &partials,
        &public_shares,
        dkg::THRESHOLD,
        &context,
        config.max_tally(),
        values.len() as u64,
    )?
    .context("tally outside the decodable range")?;
    info!(sum, participants = config.participants, "tally decrypted");

    print_json(&TallyOutput {
        context,
        aggregate_public_key_hex: key.to_hex(),
        public_shares: public_shares.iter().map(|(i, p)| (*i, p.to_hex())).collect(),
        total: CiphertextWire::from(&total),
        partials: partials.iter().map(PartialDecryptionWire::from).collect(),
        sum,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeckOutput {
    players: usize,
    cards: usize,
    revealed: Vec<String>,
}

fn run_deck<R: SecureRng>(players: usize, reveal: usize, rng: &mut R) -> Result<()> {
    if players == 0 {
        bail!("need at least one player");
    }
    let ids = cipher::standard_deck_ids();
    if reveal > ids.len() {
        bail!("cannot reveal {} of {} cards", reveal, ids.len());
    }
    let lookup = cipher::CardLookup::new(&ids);
    let keys: Vec<KeyPair> = (0..players).map(|_| KeyPair::generate(rng)).collect();

    let mut deck = cipher::plaintext_deck(&ids);
    for (i, k) in keys.iter().enumerate() {
        deck = cipher::shuffle_deck(&cipher::encrypt_deck(&deck, &k.private_key)?, rng);
        debug!(player = i + 1, "encrypted and shuffled");
    }

    // players strip their layers in reverse seating order
    let mut revealed = Vec::with_capacity(reveal);
    for card in deck.iter().take(reveal) {
        let mut card = *card;
        for k in keys.iter().rev() {
            card = cipher::decrypt(&card, &k.private_key)?;
        }
        revealed.push(lookup.reveal(&card)?.to_string());
    }
    info!(players, revealed = revealed.len(), "deck round complete");

    print_json(&DeckOutput {
        players,
        cards: deck.len(),
        revealed,
    })
}
