//! DES decryption utility (single-layer only)
//!
//! Usage:
//!   desdec decrypt <INPUT> <OUTPUT> <KEY> [--hex] [--sequential]
//!   desdec xrit <KEY> <PATH>
//!   desdec keymsg <PATH> <MAC>

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use coms_desdec::keymsg::decrypt_key_message_file;
use coms_desdec::logger::setup_logger;
use coms_desdec::xrit::{decrypt_xrit_file, find_xrit_files, is_decrypted};
use coms_desdec::{decrypt_file_with, Decryptor, Key};

#[derive(Parser)]
#[command(author, version, about = "DES Decryption Utility (single-layer only)")]
struct Cli {
    /// Log at debug level (overrides DESDEC_LOG when quieter)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decrypt a PKCS#5-padded DES-ECB file
    Decrypt {
        /// Encrypted input file path
        input: PathBuf,
        /// Decrypted output file path
        output: PathBuf,
        /// 8-byte DES key
        key: String,
        /// Read KEY as 16 hex digits instead of 8 raw bytes
        #[arg(long)]
        hex: bool,
        /// Decrypt blocks on a single thread
        #[arg(long)]
        sequential: bool,
    },
    /// Decrypt an xRIT file (or every .lrit/.hrit file in a folder) to <file>.dec
    Xrit {
        /// DES key as 16 hex digits
        key: String,
        /// xRIT file or folder
        path: PathBuf,
    },
    /// Decrypt a KMA encryption key message to <file>.dec
    Keymsg {
        /// Encrypted key message file
        path: PathBuf,
        /// Ground station MAC address
        mac: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logger(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Decrypt {
            input,
            output,
            key,
            hex,
            sequential,
        } => {
            let key = if hex {
                Key::from_hex(&key)?
            } else {
                Key::try_from(key.as_bytes())?
            };
            let decryptor = Decryptor::new(&key)?.parallel(!sequential);
            let written = decrypt_file_with(&decryptor, &input, &output)
                .with_context(|| format!("decrypting '{}'", input.display()))?;
            println!(
                "Decrypted {} bytes to {}",
                written,
                output.display()
            );
        }
        Command::Xrit { key, path } => {
            let decryptor = Decryptor::new(&Key::from_hex(&key)?)?;
            if path.is_dir() {
                decrypt_xrit_dir(&path, &decryptor)?;
            } else {
                let out = decrypt_xrit_file(&path, &decryptor)
                    .with_context(|| format!("decrypting '{}'", path.display()))?;
                println!("Output file: {}", out.display());
            }
        }
        Command::Keymsg { path, mac } => {
            let station_key = Key::from_mac(&mac)?;
            let (out, keys) = decrypt_key_message_file(&path, &station_key)
                .with_context(|| format!("decrypting key message '{}'", path.display()))?;
            println!("[Index]: Decrypted Key");
            for entry in &keys {
                println!(
                    "[{:02X}   ]: {}",
                    entry.index & 0xff,
                    hex::encode_upper(entry.key.as_bytes())
                );
            }
            println!("\nOutput file: {}", out.display());
        }
    }
    Ok(())
}

fn decrypt_xrit_dir(dir: &Path, decryptor: &Decryptor) -> Result<()> {
    let files = find_xrit_files(dir)
        .with_context(|| format!("listing '{}'", dir.display()))?;
    if files.is_empty() {
        anyhow::bail!("No LRIT/HRIT files found in '{}'", dir.display());
    }
    println!("Found {} files", files.len());

    let mut decrypted = 0;
    for file in &files {
        if is_decrypted(file) {
            log::warn!("Skipping {}: file already decrypted", file.display());
            continue;
        }
        decrypt_xrit_file(file, decryptor)
            .with_context(|| format!("decrypting '{}'", file.display()))?;
        decrypted += 1;
    }
    println!("Finished decryption: {} decrypted, {} skipped", decrypted, files.len() - decrypted);
    Ok(())
}
