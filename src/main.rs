use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use futures_util::StreamExt;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};
use url::Url;

use hostcrawl::{CrawlError, Crawler, HtmlParser, HttpFetcher};

/// Crawl every reachable page on a single host, printing one JSON object
/// per page to stdout and logging errors to stderr.
#[derive(Parser, Debug)]
#[command(name = "hostcrawl", about = "Crawl every reachable page on a single host")]
struct Cli {
    /// Seed URL to start crawling from (http or https)
    url: String,

    /// Whole-request timeout for each fetch, in seconds
    #[arg(long, env = "HTTP_TIMEOUT", default_value_t = 10)]
    http_timeout: u64,

    /// Number of concurrent crawl workers
    #[arg(long, env = "CONCURRENCY", default_value_t = 5)]
    concurrency: usize,

    /// Capacity of the page and error streams
    #[arg(long, env = "RESULT_BUFFER", default_value_t = 5)]
    result_buffer: usize,

    /// Capacity of the bounded URL queue
    #[arg(long, env = "QUEUE_LENGTH", default_value_t = 5)]
    queue_length: usize,
}

#[derive(Serialize)]
struct PageRecord {
    url: String,
    links: Vec<String>,
    assets: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // Usage problems exit 1; --help and --version exit 0.
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let seed = match Url::parse(&cli.url) {
        Ok(url) => url,
        Err(err) => {
            eprintln!("Invalid url: {err}");
            return ExitCode::FAILURE;
        }
    };

    if seed.scheme() != "http" && seed.scheme() != "https" {
        eprintln!("Supported schemes: http, https.");
        return ExitCode::FAILURE;
    }

    let fetcher = match HttpFetcher::new(Duration::from_secs(cli.http_timeout)) {
        Ok(fetcher) => Arc::new(fetcher),
        Err(err) => {
            eprintln!("Failed to build HTTP client: {err}");
            return ExitCode::FAILURE;
        }
    };

    let crawler = match Crawler::builder()
        .concurrency(cli.concurrency)
        .max_queue_length(cli.queue_length)
        .result_buffer_length(cli.result_buffer)
        .build(fetcher, Arc::new(HtmlParser::new()))
    {
        Ok(crawler) => crawler,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = crawler.enqueue(seed) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    let cancel = CancellationToken::new();
    let (mut pages, mut errors) = crawler.run(cancel.clone());

    // Errors drain concurrently with the page loop; a stalled stream would
    // otherwise back-pressure the workers into a deadlock.
    let errors_task = tokio::spawn(async move {
        while let Some(err) = errors.next().await {
            if err == CrawlError::TooManyRequests {
                warn!("stopping: the host is rate limiting us");
                cancel.cancel();
            }
            error!("{err}");
        }
    });

    while let Some(page) = pages.next().await {
        let record = PageRecord {
            url: page.url.to_string(),
            links: page.links.iter().map(Url::to_string).collect(),
            assets: page.assets.iter().map(Url::to_string).collect(),
        };

        match serde_json::to_string_pretty(&record) {
            Ok(json) => println!("{json}"),
            Err(err) => error!("failed to encode page: {err}"),
        }
    }

    let _ = errors_task.await;

    ExitCode::SUCCESS
}
