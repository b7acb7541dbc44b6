//! # Decode-Rate Subcommand
//!
//! Prints the structured form of a free-text tariff cell together with the
//! first decode issue, if any. Useful when checking a rate table before a
//! `build-tariffs` run.

use anyhow::Result;
use clap::Args;

use duty_tariff::decode_rate_string_checked;

/// Arguments for the `duty decode-rate` subcommand.
#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Rate text, e.g. "10%, но не менее 2 долл. США за 1 кг".
    #[arg(value_name = "TEXT")]
    pub text: String,

    /// Exit with code 1 when the cell decodes with an issue.
    #[arg(long)]
    pub strict: bool,
}

/// Execute the decode-rate subcommand.
pub fn run_decode(args: &DecodeArgs) -> Result<u8> {
    let decoded = decode_rate_string_checked(&args.text);
    crate::print_json(&decoded)?;
    match &decoded.issue {
        Some(issue) => {
            tracing::warn!(text = %args.text, "{issue}");
            Ok(u8::from(args.strict))
        }
        None => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_cell_exits_zero() {
        let args = DecodeArgs {
            text: "15%".into(),
            strict: true,
        };
        assert_eq!(run_decode(&args).unwrap(), 0);
    }

    #[test]
    fn degraded_cell_fails_only_when_strict() {
        let mut args = DecodeArgs {
            text: "беспошлинно".into(),
            strict: false,
        };
        assert_eq!(run_decode(&args).unwrap(), 0);
        args.strict = true;
        assert_eq!(run_decode(&args).unwrap(), 1);
    }
}
