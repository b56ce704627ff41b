#![forbid(unsafe_code)]

use std::io::{Write, stdin, stdout};
use std::process::ExitCode;

use clap::{Parser, error::ErrorKind};
use git_credential_secret_service::{Operation, Store, dispatch, store::DEFAULT_COLLECTION};
use log::{LevelFilter, debug};

#[derive(Debug, Parser)]
#[command(name = "git-credential-secret-service")]
#[command(author, version, about = "Git credential helper backed by the Secret Service")]
struct HelperOptions {
    /// Operation requested by git: get, store or erase. Others are ignored.
    operation: Option<String>,

    /// Collection to store new credentials in.
    #[arg(short, long, value_name = "NAME", default_value = DEFAULT_COLLECTION)]
    collection: String,

    /// Anything after the operation, which git doesn't send and we don't use.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    ignored: Vec<String>,
}

/// Parse the command line, or `None` if there is nothing to do.
///
/// An invocation clap can't make sense of is not an error: like an
/// unknown operation, it is ignored so that git sees success.
fn parse_args<I, T>(args: I) -> Option<HelperOptions>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    match HelperOptions::try_parse_from(args) {
        Ok(opts) => Some(opts),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            None
        }
        Err(e) => {
            debug!("ignoring invocation: {e}");
            None
        }
    }
}

fn usage() -> String {
    let names: Vec<&str> = Operation::ALL.iter().map(|op| op.name()).collect();
    format!("Usage: git-credential-secret-service <{}>", names.join("|"))
}

fn main() -> ExitCode {
    env_logger::builder()
        .format(|buf, record| {
            let level = match record.level() {
                log::Level::Warn => "warning".to_string(),
                level => level.as_str().to_lowercase(),
            };
            writeln!(buf, "{level}: {}", record.args())
        })
        .filter_level(LevelFilter::Warn)
        .parse_default_env()
        .init();

    let Some(opts) = parse_args(std::env::args_os()) else {
        return ExitCode::SUCCESS;
    };

    let Some(name) = opts.operation else {
        eprintln!("{}", usage());
        return ExitCode::SUCCESS;
    };
    let Some(op) = Operation::from_name(&name) else {
        debug!("ignoring unsupported operation {name}");
        return ExitCode::SUCCESS;
    };

    let collection = opts.collection;
    let result = dispatch(op, &mut stdin().lock(), &mut stdout().lock(), || {
        Store::new(&collection)
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: &str = "git-credential-secret-service";

    #[test]
    fn test_operation_and_collection() {
        let opts = parse_args([NAME, "--collection", "git", "store"]).unwrap();
        assert_eq!(opts.operation.as_deref(), Some("store"));
        assert_eq!(opts.collection, "git");
        let opts = parse_args([NAME, "get"]).unwrap();
        assert_eq!(opts.collection, DEFAULT_COLLECTION);
    }

    #[test]
    fn test_extra_arguments_are_ignored() {
        let opts = parse_args([NAME, "get", "extra", "more"]).unwrap();
        assert_eq!(opts.operation.as_deref(), Some("get"));
        assert_eq!(opts.ignored, ["extra", "more"]);
    }

    #[test]
    fn test_unknown_flag_is_not_an_error() {
        assert!(parse_args([NAME, "--unknown-flag", "get"]).is_none());
    }

    #[test]
    fn test_no_arguments() {
        let opts = parse_args([NAME]).unwrap();
        assert!(opts.operation.is_none());
    }
}
