use beacon_indexer::auth::{Authenticator, ConsentCallback, FileCredentialStore};
use beacon_indexer::sitemap;
use beacon_indexer::submit::{
    DEFAULT_BATCH_SIZE, IndexingClient, ProgressCallback, SubmissionResult, Submitter,
};
use beacon_locale::patch;
use beacon_locale::validate::{self, DEFAULT_LANGUAGES};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber;
use url::Url;

const BANNER: &str = r#"
    __
   / /_  ___  ____ __________  ____
  / __ \/ _ \/ __ `/ ___/ __ \/ __ \
 / /_/ /  __/ /_/ / /__/ /_/ / / / /
/_.___/\___/\__,_/\___/\____/_/ /_/
"#;

pub fn print_banner() {
    println!("{}", BANNER.bright_blue().bold());
    println!(
        "  v{} - sitemap indexing & locale maintenance\n",
        env!("CARGO_PKG_VERSION")
    );
}

fn print_prompt(msg: &str) -> String {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush().unwrap();
    let mut response = String::new();
    io::stdin().read_line(&mut response).unwrap();
    response.trim().to_string()
}

// Helper functions for the submit handler

/// Load URLs from either a newline-delimited file or the sitemap
pub async fn load_urls_from_source(
    sitemap_url: &Url,
    urls_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(path) = urls_file {
        return load_urls_from_file(path);
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Fetching sitemap {}", sitemap_url));

    let client = reqwest::Client::new();
    let result = sitemap::fetch_urls(&client, sitemap_url.as_str())
        .await
        .map_err(|e| format!("Failed to read sitemap {}: {}", sitemap_url, e));

    spinner.finish_and_clear();
    result
}

/// Load and parse URLs from a file
pub fn load_urls_from_file(path: &PathBuf) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read URLs file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| parse_url_line(line.trim()))
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add https:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    // Try to parse as-is
    if Url::parse(line).is_ok() {
        return Some(line.to_string());
    }

    // Try adding https://
    let with_scheme = format!("https://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    eprintln!("⚠️  Skipping invalid URL '{}'", line);
    None
}

pub async fn handle_submit(sub_matches: &ArgMatches) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let sitemap_url = sub_matches.get_one::<Url>("sitemap").unwrap();
    let urls_file = sub_matches.get_one::<PathBuf>("urls-file");
    let token_file = sub_matches.get_one::<String>("token-file").unwrap();
    let secrets_file = sub_matches.get_one::<String>("secrets-file").unwrap();
    let endpoint = sub_matches.get_one::<String>("endpoint");

    // Gather the URLs to submit
    println!("\n🔍 Fetching URLs...");
    let urls = match load_urls_from_source(sitemap_url, urls_file).await {
        Ok(urls) => urls,
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };
    println!(
        "{} Found {} URLs\n",
        "✓".green().bold(),
        urls.len().to_string().cyan()
    );

    // Authenticate against the webmaster API
    println!("🔐 Authenticating...");
    let token_path = shellexpand::tilde(token_file);
    let secrets_path = shellexpand::tilde(secrets_file);

    let consent: ConsentCallback = Arc::new(|auth_url: &str| {
        println!("\nOpen this URL in your browser and approve access:");
        println!("  {}", auth_url.bright_white());
        print_prompt("Paste the authorization code here:")
    });

    let store = FileCredentialStore::new(Path::new(token_path.as_ref()));
    let authenticator = Authenticator::new(
        store,
        reqwest::Client::new(),
        Path::new(secrets_path.as_ref()),
    )
    .with_consent_callback(consent);

    let credential = match authenticator.ensure_credential().await {
        Ok(credential) => credential,
        Err(e) => {
            eprintln!("✗ Authentication failed: {}", e);
            std::process::exit(1);
        }
    };
    println!("{} Authenticated\n", "✓".green().bold());

    // Submit each URL in order
    println!("📤 Submitting {} URLs...\n", urls.len());

    let mut client = IndexingClient::new();
    if let Some(endpoint) = endpoint {
        client = client.with_endpoint(endpoint.clone());
    }

    let total = urls.len();
    let progress: ProgressCallback = Arc::new(move |index, result: &SubmissionResult| {
        if result.is_success() {
            println!(
                "{} {}/{}: {}",
                "✓".green().bold(),
                index + 1,
                total,
                result.url
            );
        } else {
            println!(
                "{} {}/{}: {} - {}",
                "✗".red().bold(),
                index + 1,
                total,
                result.url,
                result.failure_message().unwrap_or_default().red()
            );
        }

        if (index + 1) % DEFAULT_BATCH_SIZE == 0 && index + 1 < total {
            println!(
                "{} Processed {} URLs, taking a short break...",
                "→".blue(),
                index + 1
            );
        }
    });

    let submitter = Submitter::new(client).with_progress_callback(progress);
    let (_results, summary) = submitter.submit_all(&credential.access_token, &urls).await;

    println!("\n📊 Summary:");
    println!(
        "{} Submitted: {}",
        "✓".green().bold(),
        summary.success_count.to_string().green()
    );
    println!(
        "{} Failed:    {}",
        "✗".red().bold(),
        summary.failed_count.to_string().red()
    );
    println!("{} Total:     {}", "→".blue(), summary.total());
    println!("\nNote: it can take the search engine several days to re-crawl the submitted pages.");
}

pub fn handle_locale_patch(sub_matches: &ArgMatches) {
    let file = sub_matches.get_one::<String>("FILE").unwrap();
    let expanded = shellexpand::tilde(file);
    let path = Path::new(expanded.as_ref());

    match patch::patch_file(path) {
        Ok(report) => {
            if report.added_perfect_match {
                println!("{} Added perfectMatch result entry", "✓".green().bold());
            }
            for key in &report.backfilled_messages {
                println!(
                    "{} Backfilled message for {}",
                    "✓".green().bold(),
                    key.cyan()
                );
            }
            if !report.changed_anything() {
                println!("{} Nothing to patch, file already complete", "→".blue());
            }
            println!(
                "{} Updated {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        Err(e) => {
            eprintln!("✗ Patch failed: {}", e);
            std::process::exit(1);
        }
    }
}

pub fn handle_locale_validate(sub_matches: &ArgMatches) {
    let keys_file = sub_matches.get_one::<PathBuf>("keys-file").unwrap();
    let locales_dir = sub_matches.get_one::<String>("locales-dir").unwrap();
    let languages: Vec<String> = match sub_matches.get_one::<String>("languages") {
        Some(raw) => raw
            .split(',')
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect(),
        None => DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect(),
    };

    let keys = match validate::load_keys(keys_file) {
        Ok(keys) if !keys.is_empty() => keys,
        Ok(_) => {
            eprintln!("✗ No keys found in {}", keys_file.display());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("✗ Failed to read keys file: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "\n🔎 Checking {} keys across {} languages\n",
        keys.len(),
        languages.len()
    );

    let expanded = shellexpand::tilde(locales_dir);
    let report = match validate::validate_locales(Path::new(expanded.as_ref()), &languages, &keys)
    {
        Ok(report) => report,
        Err(e) => {
            eprintln!("✗ Validation failed: {}", e);
            std::process::exit(1);
        }
    };

    for language in &languages {
        match report.missing.get(language) {
            Some(missing) => {
                println!(
                    "{} {}: {} missing",
                    "✗".red().bold(),
                    language,
                    missing.len().to_string().red()
                );
                for key in missing {
                    println!("    {}", key);
                }
            }
            None => println!("{} {}: complete", "✓".green().bold(), language),
        }
    }

    println!();
    if report.is_complete() {
        println!(
            "{} All {} keys present in every language",
            "✓".green().bold(),
            report.checked_keys
        );
    } else {
        println!(
            "{} {} missing translations",
            "✗".red().bold(),
            report.total_missing()
        );
        std::process::exit(1);
    }
}
