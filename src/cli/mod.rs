// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap, routes to a use case, and turns
// the result into output and a process exit code.
//
// stdout carries results (dry-run command, JSON, primes);
// logs go to stderr, so `launch --dry-run > run.sh` works.
//
// Reference: Rust Book §12.6 (Writing Error Messages to Standard Error)

pub mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, LaunchArgs, PrimeArgs, ProfileArgs};

use crate::application::{
    check_use_case::{CheckUseCase, TokenOrigin},
    launch_use_case::{LaunchOutcome, LaunchUseCase},
    prime_use_case::PrimeUseCase,
};
use crate::domain::magic_prime::exit_flags_line;
use crate::infra::trainer_process::SystemLauncher;

#[derive(Parser, Debug)]
#[command(
    name = "rwkv-launch",
    version,
    about = "Resolve an RWKV training run config and launch the external trainer."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<ExitCode> {
        match self.command {
            Commands::Launch(args) => run_launch(args),
            Commands::Show(args)   => run_show(args),
            Commands::Prime(args)  => run_prime(args),
            Commands::Check(args)  => run_check(args),
        }
    }
}

fn run_launch(args: LaunchArgs) -> Result<ExitCode> {
    let profile = args.profile.resolve()?;
    let use_case = LaunchUseCase::new(profile, SystemLauncher);

    match use_case.execute(args.dry_run)? {
        LaunchOutcome::DryRun(command) => {
            println!("{}", command.display_line());
            Ok(ExitCode::SUCCESS)
        }
        LaunchOutcome::Finished { exit_code } => Ok(ExitCode::from(exit_byte(exit_code))),
    }
}

fn run_show(args: ProfileArgs) -> Result<ExitCode> {
    let profile = args.resolve()?;
    let json = serde_json::json!({
        "proj_dir": profile.run.proj_dir(),
        "run":      profile.run,
        "trainer":  profile.trainer,
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(ExitCode::SUCCESS)
}

fn run_prime(args: PrimeArgs) -> Result<ExitCode> {
    let result = PrimeUseCase::new(args.source()?, args.ctx_len).execute()?;

    println!("magic_prime = {} (for ctx_len {})", result.magic_prime, result.ctx_len);
    println!("{}", exit_flags_line(result.data_tokens, result.magic_prime, result.ctx_len));
    Ok(ExitCode::SUCCESS)
}

fn run_check(args: ProfileArgs) -> Result<ExitCode> {
    let profile = args.resolve()?;
    let result = CheckUseCase::new(profile).execute()?;
    let report = &result.report;

    let origin = match result.origin {
        TokenOrigin::Dataset    => "dataset",
        TokenOrigin::ExitTokens => "my_exit_tokens",
    };
    println!(
        "magic_prime {} vs {} tokens ({}) at ctx_len {}",
        report.magic_prime, report.data_tokens, origin, report.ctx_len,
    );

    if let Some(exit_tokens) = result.exit_tokens_mismatch {
        println!("note: my_exit_tokens is {exit_tokens}, dataset has {}", report.data_tokens);
    }

    if report.is_consistent() {
        println!("ok");
        return Ok(ExitCode::SUCCESS);
    }

    for issue in &report.issues {
        println!("problem: {issue}");
    }
    if let Some(p) = report.suggested {
        println!("suggested: {}", exit_flags_line(report.data_tokens, p, report.ctx_len));
    }
    Ok(ExitCode::from(1))
}

/// Child exit codes outside 0..=255 (possible on Windows) collapse to 1.
fn exit_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}
