use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use chess_rules::{Game, GenOptions, PgnLoadOptions, PgnOptions, DEFAULT_FEN};
use clap::{Parser, Subcommand};
use log::info;

#[derive(Parser)]
#[command(name = "chess-rules")]
#[command(about = "Move generation, notation and game-state tools for chess positions")]
struct Args {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Count leaf nodes of the legal move tree
    Perft {
        /// Position record to start from
        #[arg(short, long, default_value = DEFAULT_FEN)]
        fen: String,

        #[arg(short, long, default_value_t = 4)]
        depth: u32,
    },

    /// Leaf counts per root move
    Divide {
        #[arg(short, long, default_value = DEFAULT_FEN)]
        fen: String,

        #[arg(short, long, default_value_t = 3)]
        depth: u32,
    },

    /// List legal moves in SAN
    Moves {
        #[arg(short, long, default_value = DEFAULT_FEN)]
        fen: String,

        /// Show squares, pieces and flags for each move
        #[arg(short, long)]
        verbose: bool,
    },

    /// Report check, mate and draw conditions of a position
    Status {
        #[arg(short, long, default_value = DEFAULT_FEN)]
        fen: String,
    },

    /// Play moves from a position and report the outcome
    Play {
        #[arg(short, long, default_value = DEFAULT_FEN)]
        fen: String,

        /// Accept coordinate-style and over-disambiguated moves
        #[arg(long)]
        sloppy: bool,

        /// Moves in SAN, applied in order
        moves: Vec<String>,
    },

    /// Load a PGN file and print the game and its final position
    Pgn {
        path: PathBuf,

        #[arg(long)]
        sloppy: bool,

        /// Wrap movetext at this width (0 disables wrapping)
        #[arg(long, default_value_t = 0)]
        width: usize,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match args.command {
        Command::Perft { fen, depth } => {
            let mut game = load(&fen)?;
            let nodes = game.perft(depth);
            info!("perft({}) of {}", depth, fen);
            println!("{nodes}");
        }
        Command::Divide { fen, depth } => {
            let mut game = load(&fen)?;
            let split = game.divide(depth);
            let total: u64 = split.iter().map(|(_, nodes)| nodes).sum();
            for (san, nodes) in split {
                println!("{san}: {nodes}");
            }
            println!();
            println!("Moves: {}", game.moves(&GenOptions::legal()).len());
            println!("Nodes: {total}");
        }
        Command::Moves { fen, verbose } => {
            let mut game = load(&fen)?;
            if verbose {
                for info in game.moves_verbose(&GenOptions::legal()) {
                    let promotion = info.promotion.map(|kind| kind.to_char()).unwrap_or(' ');
                    println!(
                        "{:<8} {}{} {} {} {}",
                        info.san,
                        info.from,
                        info.to,
                        info.piece.to_char(),
                        promotion,
                        info.flags
                    );
                }
            } else {
                println!("{}", game.moves(&GenOptions::legal()).join(" "));
            }
        }
        Command::Status { fen } => {
            let mut game = load(&fen)?;
            print!("{game}");
            println!("turn:                  {:?}", game.turn());
            println!("check:                 {}", game.in_check());
            println!("checkmate:             {}", game.in_checkmate());
            println!("stalemate:             {}", game.in_stalemate());
            println!("insufficient material: {}", game.insufficient_material());
            println!("draw:                  {}", game.in_draw());
            println!("state:                 {:?}", game.game_state());
        }
        Command::Play { fen, sloppy, moves } => {
            let mut game = load(&fen)?;
            for san in &moves {
                game.play_san(san, sloppy)
                    .ok_or_else(|| anyhow!("illegal move {:?} in {}", san, game.fen()))?;
            }
            print!("{game}");
            println!("{}", game.fen());
            println!("{:?}", game.game_state());
        }
        Command::Pgn {
            path,
            sloppy,
            width,
        } => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let mut game = Game::new();
            let options = PgnLoadOptions {
                sloppy,
                ..PgnLoadOptions::default()
            };
            game.load_pgn(&text, &options)
                .with_context(|| format!("failed to load {}", path.display()))?;
            let options = PgnOptions {
                max_width: width,
                ..PgnOptions::default()
            };
            println!("{}", game.pgn(&options));
            println!();
            print!("{game}");
            println!("{}", game.fen());
            println!("{:?}", game.game_state());
        }
    }

    Ok(())
}

fn load(fen: &str) -> Result<Game> {
    Game::from_fen(fen).with_context(|| format!("invalid position record {:?}", fen))
}
