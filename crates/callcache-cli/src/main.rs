//! ccache - store, replay and memoized fetch against a Redis server

use std::time::Duration;

use anyhow::{Context, Result};
use callcache::{Cache, CacheConfig, Key, Value, ValueKind, STORE_OPERATION};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Redis connection URL
    #[arg(short, long, env = "CALLCACHE_REDIS_URL", default_value = "redis://127.0.0.1:6379/")]
    url: String,

    /// TTL of memoized fetches, in seconds
    #[arg(short, long, default_value_t = 10)]
    ttl: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store a value under a fresh key and print the key
    Store {
        value: String,

        /// How to interpret VALUE
        #[arg(short, long, value_enum, default_value_t = Kind::Text)]
        kind: Kind,
    },

    /// Print the value stored under KEY
    Get {
        key: String,

        /// Decode the stored bytes as
        #[arg(short = 'a', long = "as", value_enum, default_value_t = Kind::Text)]
        kind: Kind,
    },

    /// Print how many times an operation was called
    Count {
        #[arg(default_value = STORE_OPERATION)]
        identity: String,
    },

    /// Print the recorded call history of an operation
    Replay {
        #[arg(default_value = STORE_OPERATION)]
        identity: String,
    },

    /// Fetch a URL through the memoizing cache
    Fetch { url: String },

    /// Print how many times a URL was requested through `fetch`
    Hits { url: String },

    /// Remove every key from the database
    Flush,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Kind {
    Text,
    Bytes,
    Int,
    Float,
}

impl From<Kind> for ValueKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Text => ValueKind::Text,
            Kind::Bytes => ValueKind::Bytes,
            Kind::Int => ValueKind::Int,
            Kind::Float => ValueKind::Float,
        }
    }
}

fn parse_value(raw: String, kind: Kind) -> Result<Value> {
    Ok(match kind {
        Kind::Text => Value::Text(raw),
        Kind::Bytes => Value::Bytes(raw.into_bytes()),
        Kind::Int => Value::Int(raw.parse().context("value is not an integer")?),
        Kind::Float => Value::Float(raw.parse().context("value is not a float")?),
    })
}

fn http_get(url: &str) -> Result<String> {
    info!("Fetching {}", url);
    let body = reqwest::blocking::get(url)?.text()?;
    Ok(body)
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = CacheConfig {
        redis_url: args.url,
        fetch_ttl_secs: args.ttl,
        flush_on_connect: false,
    };
    let cache = config
        .connect()
        .with_context(|| format!("connecting to {}", config.redis_url))?;

    run(&cache, args.command, config.fetch_ttl())?;
    cache.close()?;
    Ok(())
}

fn run(cache: &Cache, command: Command, ttl: Duration) -> Result<()> {
    match command {
        Command::Store { value, kind } => {
            let key = cache.store(parse_value(value, kind)?)?;
            println!("{}", key);
        }
        Command::Get { key, kind } => {
            match cache.retrieve_value(&Key::from(key), kind.into())? {
                Some(Value::Text(s)) => println!("{}", s),
                Some(Value::Bytes(b)) => println!("{}", b.escape_ascii()),
                Some(Value::Int(i)) => println!("{}", i),
                Some(Value::Float(f)) => println!("{}", f),
                None => println!("(nil)"),
            }
        }
        Command::Count { identity } => {
            println!("{}", cache.call_count(&identity)?);
        }
        Command::Replay { identity } => {
            print!("{}", cache.replay(&identity)?);
        }
        Command::Fetch { url } => {
            let memo = cache.memoize(http_get).with_ttl(ttl);
            println!("{}", memo.fetch(&url)?);
        }
        Command::Hits { url } => {
            let memo = cache.memoize(http_get);
            println!("{}", memo.access_count(&url)?);
        }
        Command::Flush => {
            cache.store_handle().flush()?;
            info!("Database flushed");
        }
    }
    Ok(())
}
