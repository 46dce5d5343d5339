//! Tweet Search Script
//!
//! Runs a search (or reads a user timeline) with the credentials from the environment
//! and prints every matching tweet.
//!
//! ```text
//! search_tweets [--lang <code>] [--limit <n>] <keyword>...
//! search_tweets --user <screen_name> [--limit <n>]
//! ```
//!
//! Set `RUST_LOG=info` (or `debug`) to see the requests as they are made.

use std::env;

use tweetsearch::{
    QueryOrder, SearchOrder, SearchSession, Statistics, TwitterConfig, TwitterOrder, UserOrder,
};

struct Options {
    keywords: Vec<String>,
    user: Option<String>,
    language: Option<String>,
    limit: Option<usize>,
}

fn parse_args() -> Result<Options, Box<dyn std::error::Error + Send + Sync>> {
    let mut options = Options {
        keywords: Vec::new(),
        user: None,
        language: None,
        limit: None,
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--user" => options.user = Some(args.next().ok_or("--user needs a screen name")?),
            "--lang" => options.language = Some(args.next().ok_or("--lang needs a code")?),
            "--limit" => {
                let limit = args.next().ok_or("--limit needs a number")?;
                options.limit = Some(limit.parse()?);
            }
            _ => options.keywords.push(arg),
        }
    }

    if options.user.is_none() && options.keywords.is_empty() {
        return Err("Usage: search_tweets [--lang <code>] [--limit <n>] <keyword>... | --user <screen_name>".into());
    }
    Ok(options)
}

fn build_order(options: &Options) -> tweetsearch::Result<TwitterOrder> {
    if let Some(user) = &options.user {
        return Ok(UserOrder::with_screen_name(user)?.into());
    }

    let mut order = SearchOrder::new();
    order.set_keywords(&options.keywords, false)?;
    if let Some(language) = &options.language {
        order.set_language(language)?;
    }
    order.set_include_entities(false);
    Ok(order.into())
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    println!("🐦 Twitter Search Tool");
    println!("======================");

    let options = parse_args()?;
    let order = build_order(&options)?;
    println!("🔎 Query: {}", order.build_url()?);

    let mut session = SearchSession::new(TwitterConfig::from_env()?)?;
    session.set_callback(|session| {
        let Statistics { queries, tweets } = session.statistics();
        println!("📄 Page {} received ({} tweets so far)", queries, tweets);
    });

    let limit = options.limit.unwrap_or(usize::MAX);
    for tweet in session.iterate(&order, None)?.take(limit) {
        let tweet = tweet?;
        let author = tweet["user"]["screen_name"].as_str().unwrap_or("unknown");
        let text = tweet["text"].as_str().unwrap_or_default();
        println!("@{}: {}", author, text);
    }

    let statistics = session.statistics();
    println!(
        "\n✅ Done: {} queries, {} tweets received",
        statistics.queries, statistics.tweets
    );
    Ok(())
}
