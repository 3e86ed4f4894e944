use acquire_rules::agent::{self, Agent};
use acquire_rules::state::MergerPhase;
use acquire_rules::{Action, Chain, GameConfig, GameState, Phase, Purchase, StockChoice};
use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Hotel-chain acquisition rules engine")]
struct Cli {
    /// TOML file overriding the default rules.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Let random agents play a full game.
    SelfPlay {
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Print the final snapshot as JSON instead of standings.
        #[arg(long)]
        json: bool,
    },
    /// Play at the terminal, one seat after another.
    Play {
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => GameConfig::from_toml_str(&std::fs::read_to_string(path)?)?,
        None => GameConfig::default(),
    };
    let names = (1..=config.player_count)
        .map(|i| format!("Player {}", i))
        .collect::<Vec<String>>();
    match cli.command {
        Command::SelfPlay { seed, json } => {
            let game = GameState::new_game(&names, seed, config)?;
            let game = self_play(game, seed)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&game)?);
            } else {
                print!("{}", game);
                let mut standings = game.players.clone();
                standings.sort_by(|a, b| b.cash.cmp(&a.cash));
                for (rank, p) in standings.iter().enumerate() {
                    let marker = if game.winner == Some(p.id) { " (winner)" } else { "" };
                    println!("{}. {}: ${}{}", rank + 1, p.name, p.cash, marker);
                }
            }
        }
        Command::Play { seed } => {
            let mut game = GameState::new_game(&names, seed, config)?;
            game_loop(&mut game);
        }
    }
    Ok(())
}

fn self_play(mut game: GameState, seed: u64) -> Result<GameState, Box<dyn Error>> {
    // Take arbitrary legal actions until the game is over.
    let mut ai = agent::create_agent(seed);
    while let Some(action) = ai.choose_action(&game) {
        game = game.apply(game.acting_player(), &action)?;
    }
    Ok(game)
}

fn game_loop(game: &mut GameState) {
    // Minimal terminal front end for testing.
    let mut input = String::new();
    loop {
        print!("{}", game);
        if game.is_over() {
            println!("Game over! Winner: {:?}", game.winner);
            break;
        }
        prompt(game);
        input.clear();
        if std::io::stdin().read_line(&mut input).is_err() || input.trim() == "q" {
            break;
        }
        match parse_command(input.trim()) {
            Ok((actor, action)) => {
                let actor = actor.unwrap_or_else(|| game.acting_player());
                match game.apply(actor, &action) {
                    Ok(next) => *game = next,
                    Err(e) => println!("Rejected ({}): {}", e.code(), e),
                }
            }
            Err(e) => println!("Error: {}", e),
        }
    }
}

fn prompt(game: &GameState) {
    let hint = match &game.phase {
        Phase::PlaceTile => "place <tile> | discard <tile> | end | vote <yes|no> [seat]",
        Phase::FoundChain { .. } => "found <chain>",
        Phase::Merger(MergerPhase::ChooseSurvivor { .. }) => "survivor <chain>",
        Phase::Merger(MergerPhase::PayBonuses(_)) => "pay",
        Phase::Merger(MergerPhase::HandleStock { .. }) => "sell <n> | trade <n> | keep",
        Phase::BuyStock => "buy <chain> <n> [<chain> <n> ...] | end | vote <yes|no> [seat]",
        Phase::GameOver => return,
    };
    println!("Player {}: {} (or 'q' to quit)", game.acting_player(), hint);
}

// Returns an explicit actor only for votes, which any seat may cast.
fn parse_command(line: &str) -> Result<(Option<usize>, Action), Box<dyn Error>> {
    let words = line.split_whitespace().collect::<Vec<&str>>();
    let action = match words.as_slice() {
        ["place", tile] => Action::PlaceTile { tile: tile.parse()? },
        ["discard", tile] => Action::DiscardTile { tile: tile.parse()? },
        ["found", chain] => Action::FoundChain {
            chain: chain.parse::<Chain>()?,
        },
        ["survivor", chain] => Action::ChooseMergerSurvivor {
            chain: chain.parse::<Chain>()?,
        },
        ["pay"] => Action::PayMergerBonuses,
        ["sell", n] => Action::MergerStockChoice {
            choice: StockChoice::Sell { quantity: n.parse()? },
        },
        ["trade", n] => Action::MergerStockChoice {
            choice: StockChoice::Trade { quantity: n.parse()? },
        },
        ["keep"] => Action::MergerStockChoice {
            choice: StockChoice::Keep,
        },
        ["buy", rest @ ..] if rest.len() % 2 == 0 => {
            let mut purchases = Vec::new();
            for pair in rest.chunks(2) {
                purchases.push(Purchase {
                    chain: pair[0].parse::<Chain>()?,
                    quantity: pair[1].parse()?,
                });
            }
            Action::BuyStocks { purchases }
        }
        ["end"] => Action::EndTurn,
        ["vote", choice, seat @ ..] if seat.len() <= 1 => {
            let actor = seat.first().map(|s| s.parse::<usize>()).transpose()?;
            let in_favor = matches!(*choice, "yes" | "y");
            return Ok((actor, Action::EndGameVote { in_favor }));
        }
        _ => return Err(format!("Unrecognized command: {:?}", line).into()),
    };
    Ok((None, action))
}
