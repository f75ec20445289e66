use std::path::Path;

use clap::Parser;
use clap::error::ErrorKind;

use crate::cli::{Cli, parse_keep_hours};
use crate::error::SweepError;

#[test]
fn test_cli_defaults() {
    let cli = Cli::parse_from(["cdk-sweep"]);
    assert_eq!(cli.outdir(), Path::new("cdk.out"));
    assert!(cli.explicit_outdir().is_none());
    assert!(!cli.dry_run());
    assert_eq!(cli.keep_hours(), 0);
    assert!(!cli.tmp());
    assert_eq!(cli.verbose(), 0);
    assert!(!cli.quiet());
}

#[test]
fn test_cli_flags() {
    let cli = Cli::parse_from([
        "cdk-sweep",
        "--outdir",
        "build/cdk.out",
        "--dry-run",
        "--keep-hours",
        "48",
        "-vv",
    ]);
    assert_eq!(cli.outdir(), Path::new("build/cdk.out"));
    assert!(cli.dry_run());
    assert_eq!(cli.keep_hours(), 48);
    assert_eq!(cli.verbose(), 2);
}

#[test]
fn test_tmp_conflicts_with_outdir() {
    let err = Cli::try_parse_from(["cdk-sweep", "--tmp", "--outdir", "cdk.out"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArgumentConflict);

    // the default outdir does not count as a conflict
    let cli = Cli::try_parse_from(["cdk-sweep", "--tmp"]).unwrap();
    assert!(cli.tmp());
}

#[test]
fn test_keep_hours_rejects_negative_and_garbage() {
    for bad in ["-1", "abc", "1.5", ""] {
        let err = Cli::try_parse_from(["cdk-sweep", "--keep-hours", bad]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation, "accepted {bad:?}");
    }
}

#[test]
fn test_parse_keep_hours() {
    assert_eq!(parse_keep_hours("0").unwrap(), 0);
    assert_eq!(parse_keep_hours(" 12 ").unwrap(), 12);
    assert!(matches!(
        parse_keep_hours("-3"),
        Err(SweepError::InvalidRetention(message)) if message.contains("negative")
    ));
    assert!(matches!(
        parse_keep_hours("soon"),
        Err(SweepError::InvalidRetention(_))
    ));
}

#[test]
fn test_quiet_conflicts_with_verbose() {
    let err = Cli::try_parse_from(["cdk-sweep", "-q", "-v"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
}

#[test]
fn test_cli_builder() {
    let cli = Cli::builder()
        .outdir("custom/cdk.out")
        .keep_hours(6)
        .verbose(1)
        .build()
        .expect("Failed to build CLI");
    assert_eq!(cli.outdir(), Path::new("custom/cdk.out"));
    assert_eq!(cli.keep_hours(), 6);
    assert_eq!(cli.verbose(), 1);

    let err = Cli::builder()
        .outdir("cdk.out")
        .tmp(true)
        .build()
        .unwrap_err();
    assert!(matches!(err, SweepError::ConfigError(_)));
}
