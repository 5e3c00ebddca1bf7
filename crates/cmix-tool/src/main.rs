//! cMix command-line tool.
//!
//! # Usage
//!
//! ```bash
//! # New channel identity, exported under a password
//! cmix-tool identity new --password hunter2 > identity.txt
//!
//! # Codename of an exported identity or a raw public key
//! cmix-tool identity import identity.txt --password hunter2
//! cmix-tool codename 9iF3Vn0...=
//!
//! # RSA keys
//! cmix-tool rsa keygen --bits 4096 > key.pem
//! cmix-tool rsa wire key.pem
//!
//! # File transfers and backups
//! cmix-tool transfer fingerprints --key <base64> --count 4
//! cmix-tool transfer plan photo.jpg --part-size 1024
//! cmix-tool backup header account.bak
//! ```

use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
    time::Instant,
};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use clap::{Args as ClapArgs, Parser, Subcommand};
use cmix_codec::{Codeset, Identity, PrivateIdentity, backup};
use cmix_crypto::{
    file_transfer::{self, TransferKey},
    kdf::Params,
    rng::OsRng,
    rsa::{DEFAULT_BITS, Scheme},
};
use cmix_transfer::{SentTransfer, TransferConfig};
use ed25519_dalek::VerifyingKey;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// cMix key and encoding tool
#[derive(Parser, Debug)]
#[command(name = "cmix-tool")]
#[command(about = "Inspect and create cMix identities, keys, transfers and backups")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Channel identities
    #[command(subcommand)]
    Identity(IdentityCommand),

    /// Print the codename of a base64 Ed25519 public key
    Codename {
        /// Public key, standard base64
        public_key: String,
    },

    /// RSA keys
    #[command(subcommand)]
    Rsa(RsaCommand),

    /// File-transfer keying
    #[command(subcommand)]
    Transfer(TransferCommand),

    /// Account backups
    #[command(subcommand)]
    Backup(BackupCommand),
}

#[derive(Subcommand, Debug)]
enum IdentityCommand {
    /// Generate an identity and print its password-protected export
    New {
        /// Export password
        #[arg(long)]
        password: String,

        #[command(flatten)]
        kdf: KdfArgs,
    },

    /// Decrypt an exported identity and print its codename
    Import {
        /// File holding the export string
        file: PathBuf,

        /// Export password
        #[arg(long)]
        password: String,
    },
}

#[derive(Subcommand, Debug)]
enum RsaCommand {
    /// Generate a private key and print it as PEM
    Keygen {
        /// Modulus size in bits
        #[arg(long, default_value_t = DEFAULT_BITS)]
        bits: usize,

        /// Write PKCS#8 instead of PKCS#1
        #[arg(long)]
        pkcs8: bool,
    },

    /// Print the base64 wire form of a PEM key's public half
    Wire {
        /// PEM file (public or private key)
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum TransferCommand {
    /// Print the first `count` part fingerprints of a transfer key
    Fingerprints {
        /// Transfer key, standard base64
        #[arg(long)]
        key: String,

        /// Number of fingerprints
        #[arg(long, default_value_t = 8)]
        count: u16,
    },

    /// Split a file as a sender would and print the transfer summary
    Plan {
        /// File to send
        file: PathBuf,

        /// Plaintext bytes per part
        #[arg(long, default_value_t = cmix_transfer::sent::DEFAULT_PART_SIZE)]
        part_size: usize,
    },
}

#[derive(Subcommand, Debug)]
enum BackupCommand {
    /// Print the unencrypted header of a backup file
    Header {
        /// Backup file
        file: PathBuf,
    },
}

/// Argon2id cost
#[derive(ClapArgs, Debug)]
struct KdfArgs {
    /// Passes over memory
    #[arg(long, default_value_t = Params::RECOMMENDED.time)]
    time: u32,

    /// Memory in KiB
    #[arg(long, default_value_t = Params::RECOMMENDED.memory)]
    memory: u32,

    /// Lanes
    #[arg(long, default_value_t = Params::RECOMMENDED.threads)]
    threads: u8,
}

impl From<&KdfArgs> for Params {
    fn from(args: &KdfArgs) -> Self {
        Self { time: args.time, memory: args.memory, threads: args.threads }
    }
}

fn main() -> CliResult {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let mut out = io::stdout().lock();
    match args.command {
        Command::Identity(cmd) => identity(&mut out, cmd),
        Command::Codename { public_key } => codename(&mut out, &public_key),
        Command::Rsa(cmd) => rsa(&mut out, cmd),
        Command::Transfer(cmd) => transfer(&mut out, cmd),
        Command::Backup(cmd) => backup_cmd(&mut out, cmd),
    }
}

fn identity(out: &mut impl Write, cmd: IdentityCommand) -> CliResult {
    match cmd {
        IdentityCommand::New { password, kdf } => {
            let id = PrivateIdentity::generate(&mut OsRng);
            tracing::info!(codename = %id.identity(), "generated channel identity");
            let exported = id.export(&mut OsRng, password.as_bytes(), &Params::from(&kdf))?;
            writeln!(out, "{exported}")?;
        },
        IdentityCommand::Import { file, password } => {
            let data = fs::read(&file)?;
            let id = PrivateIdentity::import(password.as_bytes(), &data)?;
            print_identity(out, id.identity())?;
            writeln!(out, "dm token:   {}", id.dm_token())?;
        },
    }
    Ok(())
}

fn codename(out: &mut impl Write, public_key: &str) -> CliResult {
    let bytes = STANDARD.decode(public_key.trim())?;
    let bytes: [u8; 32] = bytes.as_slice().try_into()?;
    let key = VerifyingKey::from_bytes(&bytes)?;
    print_identity(out, &Identity::from_public_key(key, Codeset::V0))
}

fn print_identity(out: &mut impl Write, identity: &Identity) -> CliResult {
    writeln!(out, "codename:   {}", identity.codename())?;
    writeln!(out, "extension:  {}", identity.extension())?;
    writeln!(out, "color:      {}", identity.color())?;
    writeln!(out, "public key: {}", STANDARD.encode(identity.public_key().as_bytes()))?;
    Ok(())
}

fn rsa(out: &mut impl Write, cmd: RsaCommand) -> CliResult {
    let scheme = Scheme::default();
    match cmd {
        RsaCommand::Keygen { bits, pkcs8 } => {
            let started = Instant::now();
            let key = scheme.generate(&mut OsRng, bits)?;
            tracing::info!(bits, elapsed = ?started.elapsed(), "generated RSA key");
            let pem = if pkcs8 { key.marshal_pkcs8_pem()? } else { key.marshal_pem()? };
            write!(out, "{pem}")?;
        },
        RsaCommand::Wire { file } => {
            let pem = fs::read_to_string(&file)?;
            let public = match scheme.unmarshal_public_key_pem(&pem) {
                Ok(key) => key,
                Err(_) => scheme.unmarshal_private_key_pem(&pem)?.public(),
            };
            writeln!(out, "{}", STANDARD.encode(public.marshal_wire()?))?;
        },
    }
    Ok(())
}

fn transfer(out: &mut impl Write, cmd: TransferCommand) -> CliResult {
    match cmd {
        TransferCommand::Fingerprints { key, count } => {
            let key = TransferKey::from_base64(key.trim())?;
            for (index, fp) in file_transfer::fingerprints(&key, count).enumerate() {
                writeln!(out, "{index:>5} {fp}")?;
            }
        },
        TransferCommand::Plan { file, part_size } => {
            let data = fs::read(&file)?;
            let config = TransferConfig { part_size, ..TransferConfig::default() };
            let tx = SentTransfer::<Instant>::new(&mut OsRng, &data, config)?;
            writeln!(out, "transfer id: {}", tx.transfer_id())?;
            writeln!(out, "file id:     {}", tx.file_id())?;
            writeln!(out, "file size:   {}", data.len())?;
            writeln!(out, "parts:       {}", tx.num_parts())?;
        },
    }
    Ok(())
}

fn backup_cmd(out: &mut impl Write, cmd: BackupCommand) -> CliResult {
    match cmd {
        BackupCommand::Header { file } => {
            let data = fs::read(&file)?;
            let header = backup::read_header(&data)?;
            writeln!(out, "version: {}", header.version)?;
            writeln!(out, "salt:    {}", STANDARD.encode(header.salt))?;
            writeln!(
                out,
                "argon2:  time={} memory={}KiB threads={}",
                header.params.time, header.params.memory, header.params.threads
            )?;
            writeln!(out, "payload: {} bytes", data.len() - backup::HEADER_LEN)?;
        },
    }
    Ok(())
}
