use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("beacon")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("beacon")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("submit")
                .about(
                    "Read site URLs from a sitemap and submit each one to the indexing API, \
                paced to stay under provider quotas.",
                )
                .arg(
                    arg!(-s --"sitemap" <URL>)
                        .required(false)
                        .help("The sitemap to read URLs from")
                        .value_parser(clap::value_parser!(Url))
                        .default_value("https://lovecalcs.com/sitemap.xml")
                        .conflicts_with("urls-file"),
                )
                .arg(
                    arg!(-H --"urls-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of URLs to submit instead of a sitemap")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("sitemap"),
                )
                .arg(
                    arg!(-t --"token-file" <PATH>)
                        .required(false)
                        .help("Location of the cached OAuth token")
                        .default_value("token.json"),
                )
                .arg(
                    arg!(-c --"secrets-file" <PATH>)
                        .required(false)
                        .help("OAuth client secrets used when interactive authorization is needed")
                        .default_value("credentials.json"),
                )
                .arg(
                    arg!(--"endpoint" <URL>)
                        .required(false)
                        .help("Override the indexing API publish endpoint"),
                ),
        )
        .subcommand(
            command!("locale")
                .about("Maintain the translation files")
                .subcommand_required(true)
                .subcommand(
                    command!("patch")
                        .about("Insert the missing quiz result entry and backfill result messages")
                        .arg(
                            arg!([FILE])
                                .required(false)
                                .help("Locale file to patch")
                                .default_value("public/locales/de.json"),
                        ),
                )
                .subcommand(
                    command!("validate")
                        .about("Check a list of translation keys against the locale files")
                        .arg(
                            arg!(-k --"keys-file" <PATH>)
                                .required(true)
                                .help("Newline-delimited list of dotted translation keys")
                                .value_parser(clap::value_parser!(std::path::PathBuf)),
                        )
                        .arg(
                            arg!(-d --"locales-dir" <DIR>)
                                .required(false)
                                .help("Directory holding the <lang>.json files")
                                .default_value("public/locales"),
                        )
                        .arg(
                            arg!(-l --"languages" <LANGS>)
                                .required(false)
                                .help("Comma-separated language codes (default: the full shipping set)"),
                        ),
                ),
        )
}
