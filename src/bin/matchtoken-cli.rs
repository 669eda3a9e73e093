use std::path::PathBuf;

use axum::body::Body;
use axum::http::Request;
use clap::{Parser, Subcommand};

use matchtoken::config::load_config;
use matchtoken::replacer::VarsReplacer;
use matchtoken::MatcherRegistry;

#[derive(Parser)]
#[command(name = "matchtoken-cli")]
#[command(about = "Offline checks for matchtoken configurations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and provision a configuration
    Check {
        /// Path to the TOML configuration file
        config: PathBuf,
    },
    /// Evaluate a synthetic request against a configuration
    Eval {
        /// Path to the TOML configuration file
        config: PathBuf,

        /// Host header value, optionally with a port
        #[arg(long)]
        host: String,

        /// Value of the `token` header
        #[arg(long)]
        token: Option<String>,

        /// Value of the `token` cookie
        #[arg(long)]
        cookie: Option<String>,

        /// Extra headers as `name=value`
        #[arg(long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,
    },
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))
}

/// Synthetic request for `eval`; the cookie value is sent as the `token` cookie.
fn eval_request(
    host: &str,
    token: Option<&str>,
    cookie: Option<&str>,
    headers: &[(String, String)],
) -> Result<Request<Body>, axum::http::Error> {
    let mut builder = Request::builder().header("Host", host);
    if let Some(token) = token {
        builder = builder.header("token", token);
    }
    if let Some(cookie) = cookie {
        builder = builder.header("Cookie", format!("token={cookie}"));
    }
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder.body(Body::empty())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let registry = MatcherRegistry::with_defaults();

    match cli.command {
        Commands::Check { config } => {
            let config = load_config(&config)?;
            let matcher = registry.build(&config.matcher.module, config.matcher.params_value())?;
            println!("{}", serde_json::to_string_pretty(&matcher.describe())?);
        }
        Commands::Eval {
            config,
            host,
            token,
            cookie,
            headers,
        } => {
            let config = load_config(&config)?;
            let matcher = registry.build(&config.matcher.module, config.matcher.params_value())?;

            let request = eval_request(&host, token.as_deref(), cookie.as_deref(), &headers)?;

            let repl = VarsReplacer::from_request(&request);
            let outcome = matcher.evaluate(&request, &repl);
            println!(
                "{}",
                serde_json::json!({ "outcome": outcome.as_str(), "matched": outcome.is_match() })
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchtoken::matcher::{MatchOutcome, MatchRequest};

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("X-Tenant = acme").unwrap(),
            ("X-Tenant".to_string(), "acme".to_string())
        );
        // Only the first '=' separates name and value.
        assert_eq!(
            parse_header("X-Query=a=b").unwrap(),
            ("X-Query".to_string(), "a=b".to_string())
        );
        assert!(parse_header("no-separator").is_err());
    }

    #[test]
    fn test_eval_request() {
        let headers = vec![("X-Tenant".to_string(), "acme".to_string())];
        let req = eval_request("acme.example.com:443", None, Some("abc1"), &headers).unwrap();
        assert_eq!(MatchRequest::host(&req), "acme.example.com:443");
        assert_eq!(req.header("token"), None);
        assert_eq!(req.cookie("token"), Some("abc1".to_string()));

        let registry = MatcherRegistry::with_defaults();
        let matcher = registry
            .build(
                matchtoken::matcher::token::MODULE_ID,
                serde_json::json!({
                    "tokenprefix": "abc",
                    "host": ["{http.request.header.X-Tenant}.example.com"]
                }),
            )
            .unwrap();
        let outcome = matcher.evaluate(&req, &VarsReplacer::from_request(&req));
        assert_eq!(outcome, MatchOutcome::Matched);

        let invalid = vec![("bad name".to_string(), "v".to_string())];
        assert!(eval_request("example.com", Some("t"), None, &invalid).is_err());
    }
}
