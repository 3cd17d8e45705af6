//! Terminal Connect-Four against the MCTS engine.
//!
//! ```text
//! cargo run --example play -- human --budget-ms 1000
//! cargo run --example play -- random --budget-ms 50
//! cargo run --example play -- ai-vs-ai --budget-ms 500 --second-budget-ms 800
//! ```

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use connect4_mcts::board::{GameOutcome, Player};
use connect4_mcts::boards::connect_four::ConnectFourBoard;
use connect4_mcts::mcts::MonteCarloTreeSearch;
use connect4_mcts::random::StandardRandomGenerator;
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tracing::info;

type Engine = MonteCarloTreeSearch<ConnectFourBoard, StandardRandomGenerator>;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// You against the engine
    Human,
    /// A uniformly random player against the engine
    Random,
    /// The engine against itself, with a separate budget per side
    AiVsAi,
}

#[derive(Parser, Debug)]
#[command(name = "play", about = "Play Connect-Four against Monte Carlo tree search")]
struct Args {
    #[arg(value_enum, default_value_t = Mode::Human)]
    mode: Mode,

    /// Search time per engine move, in milliseconds
    #[arg(long, default_value_t = 1000)]
    budget_ms: u64,

    /// Search time for the second engine in ai-vs-ai mode
    #[arg(long)]
    second_budget_ms: Option<u64>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "connect4_mcts=info")]
    log: String,
}

/// Who chooses the moves for one side.
enum Side {
    Human,
    Random,
    Engine { name: &'static str, budget: Duration },
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log);

    let engine_budget = Duration::from_millis(args.budget_ms);
    let (first, second) = match args.mode {
        Mode::Human => (Side::Human, Side::Engine { name: "AI", budget: engine_budget }),
        Mode::Random => (Side::Random, Side::Engine { name: "AI", budget: engine_budget }),
        Mode::AiVsAi => (
            Side::Engine { name: "AI one", budget: engine_budget },
            Side::Engine {
                name: "AI two",
                budget: Duration::from_millis(args.second_budget_ms.unwrap_or(args.budget_ms)),
            },
        ),
    };

    let mut random = StandardRandomGenerator;
    let mut board = ConnectFourBoard::with_random_first_player(&mut random);
    let mut engine = Engine::from_board(board.clone());
    info!(first = ?board.first_player(), "new game");

    while !board.is_terminal() {
        let side = match board.current_player() {
            Player::First => &first,
            Player::Second => &second,
        };
        let column = choose_column(side, &board, &mut engine, &mut random)?;
        board.try_place(column)?;
        engine.play(column)?;
        println!("{board}\n");
    }

    match board.outcome() {
        GameOutcome::Won(player) => println!("{} won!", side_name(player, &first, &second)),
        GameOutcome::Draw => println!("Draw."),
        GameOutcome::InProgress => bail!("game loop ended before the game was decided"),
    }
    Ok(())
}

fn choose_column(
    side: &Side,
    board: &ConnectFourBoard,
    engine: &mut Engine,
    random: &mut StandardRandomGenerator,
) -> Result<usize> {
    match side {
        Side::Human => read_human_column(board),
        Side::Random => {
            let Some(column) = board.random_legal_move(random) else {
                bail!("no legal move left");
            };
            println!("Random robot chose column {}", column + 1);
            Ok(column)
        }
        Side::Engine { name, budget } => {
            println!("Wait. {name} is deciding.");
            let stats = engine.search(*budget)?;
            let column = engine.get_most_visited_move()?;
            info!(simulations = stats.simulations, column, "{name} searched");
            println!("{name} chose column {}", column + 1);
            Ok(column)
        }
    }
}

/// Reads a 1-based column from stdin until a legal one is entered.
fn read_human_column(board: &ConnectFourBoard) -> Result<usize> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Make a play: ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            bail!("input closed");
        };
        match line?.trim().parse::<usize>() {
            Ok(column) if column >= 1 && board.is_open(column - 1) => return Ok(column - 1),
            _ => println!("Invalid play! Try again"),
        }
    }
}

fn side_name(player: Player, first: &Side, second: &Side) -> &'static str {
    let side = match player {
        Player::First => first,
        Player::Second => second,
    };
    match side {
        Side::Human => "You",
        Side::Random => "Random robot",
        Side::Engine { name, .. } => *name,
    }
}
