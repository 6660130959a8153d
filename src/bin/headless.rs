#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;
#[cfg(not(target_arch = "wasm32"))]
use duotris::input::UnknownAction;
#[cfg(not(target_arch = "wasm32"))]
use duotris::{Action, Board, Cell, MatchSettings, Outcome, Side, Versus};
#[cfg(not(target_arch = "wasm32"))]
use log::{debug, info, warn};
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;
#[cfg(not(target_arch = "wasm32"))]
use tokio::io::{AsyncBufReadExt, BufReader};
#[cfg(not(target_arch = "wasm32"))]
use tokio::sync::mpsc;

/// Runs a match in the terminal. Actions are read from stdin one per line,
/// e.g. `left`, `p2 drop`, `opponent hold`; `quit` ends the match early.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Parser, Debug, Clone)]
struct Opts {
    /// Seed for piece order and garbage holes
    #[arg(long)]
    seed: Option<u64>,
    /// Simulated milliseconds per frame
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
    /// Stop after this much simulated time even if nobody has topped out
    #[arg(long, default_value_t = 600_000)]
    max_ms: u64,
}

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, PartialEq)]
enum Msg {
    Frame(f32),
    Input(Side, Action),
    Quit,
}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opts = Opts::parse();
    if opts.frame_ms == 0 {
        anyhow::bail!("--frame-ms must be positive");
    }

    let mut versus = Versus::new(MatchSettings {
        seed: opts.seed,
        ..MatchSettings::default()
    });
    let (tx, mut rx) = mpsc::unbounded_channel::<Msg>();

    let frame_tx = tx.clone();
    let frame_ms = opts.frame_ms;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(frame_ms));
        loop {
            ticker.tick().await;
            if frame_tx.send(Msg::Frame(frame_ms as f32)).is_err() {
                break;
            }
        }
    });

    let input_tx = tx;
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match parse_line(&line) {
                Ok(Some(msg)) => {
                    if input_tx.send(msg).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("{e}"),
            }
        }
    });

    info!("match started (seed {:?})", opts.seed);
    let mut elapsed: u64 = 0;
    while let Some(msg) = rx.recv().await {
        match msg {
            Msg::Frame(dt) => {
                versus.advance(dt);
                elapsed += frame_ms;
            }
            Msg::Input(side, action) => {
                if !versus.apply(side, action) {
                    debug!("{side:?} {action:?} rejected");
                }
            }
            Msg::Quit => break,
        }
        if versus.is_over() {
            break;
        }
        if elapsed >= opts.max_ms {
            info!("time limit reached after {elapsed} ms");
            break;
        }
    }

    report(&versus);
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn parse_line(line: &str) -> Result<Option<Msg>, UnknownAction> {
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Ok(None);
    };
    let (side, word) = match first.to_ascii_lowercase().as_str() {
        "quit" | "exit" => return Ok(Some(Msg::Quit)),
        "p1" | "player" => (Side::Player, words.next()),
        "p2" | "opponent" => (Side::Opponent, words.next()),
        _ => (Side::Player, Some(first)),
    };
    match word {
        Some(w) => Ok(Some(Msg::Input(side, w.parse()?))),
        None => Ok(None),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn render(board: &Board) -> Vec<String> {
    board
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Cell::Empty => '.',
                    Cell::Locked(_) => '#',
                    Cell::Garbage => 'x',
                })
                .collect()
        })
        .collect()
}

#[cfg(not(target_arch = "wasm32"))]
fn report(versus: &Versus) {
    let player = render(versus.player(Side::Player).board());
    let opponent = render(versus.player(Side::Opponent).board());
    for (l, r) in player.iter().zip(&opponent) {
        println!("{l}   {r}");
    }
    for side in Side::both() {
        let p = versus.player(side);
        println!("{side:?}: score {} sent {}", p.score(), p.lines_sent());
    }
    match versus.outcome() {
        Some(Outcome::PlayerWins) => println!("Player wins"),
        Some(Outcome::OpponentWins) => println!("Opponent wins"),
        Some(Outcome::Draw) => println!("Draw"),
        None => println!("No result"),
    }
}
