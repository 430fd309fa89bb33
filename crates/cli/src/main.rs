use std::{error::Error, fs::File, path::PathBuf};

use clap::{Args, Parser, Subcommand};
use engine::{Engine, ExternalRecord, MatchRules, StatementReconciliation};
use migration::MigratorTrait;
use rust_decimal::Decimal;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "tesoreria_cli")]
#[command(about = "Back-office utilities for Tesorería (banks and statement reconciliation)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./tesoreria.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List banks and their balances.
    Banks,
    Bank(Bank),
    /// Reconcile a CSV bank statement against unreconciled movements.
    Reconcile(ReconcileArgs),
}

#[derive(Args, Debug)]
struct Bank {
    #[command(subcommand)]
    command: BankCommand,
}

#[derive(Subcommand, Debug)]
enum BankCommand {
    Create(BankCreateArgs),
}

#[derive(Args, Debug)]
struct BankCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    opening_balance: Decimal,
}

#[derive(Args, Debug)]
struct ReconcileArgs {
    /// Bank the statement belongs to.
    #[arg(long)]
    bank: Uuid,
    /// CSV file with `Fecha`, `Descripción` and `Monto` columns.
    #[arg(long)]
    file: PathBuf,
    /// Mark every matched movement as reconciled.
    #[arg(long)]
    apply: bool,
    #[arg(long, default_value = "0.01")]
    amount_epsilon: Decimal,
    #[arg(long, default_value_t = 3)]
    date_window_days: i64,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn source_line(record: &ExternalRecord) -> String {
    record
        .line
        .map_or_else(|| "-".to_string(), |line| format!("#{line}"))
}

fn print_report(outcome: &StatementReconciliation) {
    let report = &outcome.report;

    println!("matches:");
    for (record, movement) in report.matches() {
        println!(
            "  {:>5} {} {:>14} {:<30} -> {}",
            source_line(record),
            record.date,
            record.amount,
            record.description,
            movement.id
        );
    }
    println!("discrepancies (on the statement, not in the books):");
    for record in report.discrepancies() {
        println!(
            "  {:>5} {} {:>14} {}",
            source_line(record),
            record.date,
            record.amount,
            record.description
        );
    }
    println!("missing (in the books, not on the statement):");
    for movement in report.missing() {
        println!(
            "  {} {:>14} {} {}",
            movement.date,
            movement.signed_amount(),
            movement.description.as_deref().unwrap_or("-"),
            movement.id
        );
    }

    let stats = report.stats();
    println!(
        "{} matches, {} discrepancies, {} missing, {} rejected rows",
        stats.matches, stats.discrepancies, stats.missing, outcome.rejected
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;

    match cli.command {
        Command::Banks => {
            let engine = Engine::builder().database(db).build().await?;
            for bank in engine.list_banks().await? {
                println!("{} {:>14} {}", bank.id, bank.balance, bank.name);
            }
        }
        Command::Bank(Bank {
            command: BankCommand::Create(args),
        }) => {
            let engine = Engine::builder().database(db).build().await?;
            let bank_id = engine.new_bank(&args.name, args.opening_balance).await?;
            println!("created bank: {} ({bank_id})", args.name);
        }
        Command::Reconcile(args) => {
            let engine = Engine::builder()
                .database(db)
                .match_rules(MatchRules {
                    amount_epsilon: args.amount_epsilon,
                    date_window_days: args.date_window_days,
                })
                .build()
                .await?;

            let file = File::open(&args.file)?;
            let outcome = engine.reconcile_upload(args.bank, file).await?;
            print_report(&outcome);

            if args.apply {
                let count = engine.reconcile_all_matches(&outcome.report).await?;
                println!("reconciled {count} movements");
            }
        }
    }

    Ok(())
}
