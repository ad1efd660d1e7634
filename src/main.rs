//! Command-line front end for the search service.
//!
//! Usage: itunes-search <term> [category]
//!
//! `category` is 0 (all, default), 1 (music), 2 (software) or 3 (e-books).

use std::env;
use std::process::ExitCode;

use itunes_search::{Category, Search, SearchState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let Some(term) = args.get(1) else {
        eprintln!("usage: itunes-search <term> [category 0-3]");
        return ExitCode::FAILURE;
    };
    let category = match args.get(2).map(|s| s.parse::<u8>()) {
        None => Category::All,
        Some(Ok(index)) => match Category::try_from(index) {
            Ok(category) => category,
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        Some(Err(_)) => {
            eprintln!("category must be a number from 0 to 3");
            return ExitCode::FAILURE;
        }
    };

    let mut search = Search::new();
    search.search(term, category);

    match search.next_completion().await {
        Some(true) => {}
        _ => {
            eprintln!("Couldn't access the iTunes Store. Please try again.");
            return ExitCode::FAILURE;
        }
    }

    match search.state() {
        SearchState::NoResults => println!("(Nothing Found)"),
        SearchState::Results(results) => {
            let mut rows = results.clone();
            rows.sort_by(|a, b| a.cmp_by_name(b));
            for row in &rows {
                let genre = row.genre();
                if genre.is_empty() {
                    println!("{:>10}  {}", row.display_price(), row);
                } else {
                    println!("{:>10}  {} ({})", row.display_price(), row, genre);
                }
            }
        }
        // A successful completion always settles into one of the above.
        SearchState::NotSearched | SearchState::Loading => {}
    }
    ExitCode::SUCCESS
}
