//! Operator entry point over `dealer_core`.
//!
//! # Responsibility
//! - Map subcommands onto core resolver, DAO and overlap operations.
//! - Keep output line-oriented for shell pipelines.

mod args;

use args::{AssociationKind, Cli, Command};
use dealer_core::{
    Bank, BankTemplate, Classifier, ClassifierDefinition, ClassifierResolver, CoreConfig, Dao,
    DatabaseTarget, ItemModel, OverlapCandidate, OverlapCheck, ProductModel, RangedAssociation,
    SqliteDao, YearRange,
};
use log::{error, info};
use rusqlite::Connection;
use std::error::Error;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

fn main() -> ExitCode {
    let cli = args::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let mut config = CoreConfig::from_env()?;
    if let Some(path) = cli.db {
        config.database = if path.as_os_str() == ":memory:" {
            DatabaseTarget::Memory
        } else {
            DatabaseTarget::File(path)
        };
    }
    if cli.log_dir.is_some() {
        config.log_dir = cli.log_dir;
    }
    config.init_logging()?;

    let conn = config.open_db()?;
    info!(
        "event=cli_command module=cli status=start command={:?}",
        cli.cmd
    );

    match cli.cmd {
        Command::Seed => {
            let report = ClassifierResolver::try_new(&conn)?.seed_canonical()?;
            println!("resolved={} created={}", report.resolved, report.created);
        }
        Command::Classifiers { classifier_type } => {
            let classifiers = match classifier_type {
                Some(classifier_type) => {
                    ClassifierResolver::try_new(&conn)?.by_type(&classifier_type)?
                }
                None => SqliteDao::<Classifier>::try_new(&conn)?.list_all(None)?,
            };
            for classifier in &classifiers {
                print_classifier(classifier);
            }
        }
        Command::Resolve {
            classifier_type,
            value,
            label,
            description,
        } => {
            let label = if label.is_empty() { value.as_str() } else { label.as_str() };
            let resolution = ClassifierResolver::try_new(&conn)?.resolve_detailed(
                &ClassifierDefinition {
                    classifier_type: &classifier_type,
                    value: &value,
                    label,
                    description: &description,
                },
            )?;
            println!("id={} created={}", resolution.id, resolution.created);
        }
        Command::Banks {
            name,
            code,
            active,
            search,
        } => {
            let template = BankTemplate {
                name,
                code,
                active,
                ..BankTemplate::default()
            };
            let dao = SqliteDao::<Bank>::try_new(&conn)?;
            let banks = if search {
                dao.search(&template, None)?
            } else {
                dao.find(&template, None)?
            };
            for bank in &banks {
                println!(
                    "{}\t{}\t{}\t{}",
                    bank.id.unwrap_or_default(),
                    bank.code,
                    bank.name,
                    if bank.active { "active" } else { "inactive" }
                );
            }
        }
        Command::CheckOverlap {
            kind,
            owner_id,
            model_id,
            start,
            end,
            exclude,
        } => {
            let years = YearRange::new(start, end)?;
            let mut candidate = OverlapCandidate::new(owner_id, model_id, years);
            if let Some(id) = exclude {
                candidate = candidate.excluding(id);
            }
            let conflicts = match kind {
                AssociationKind::Item => overlaps::<ItemModel>(&conn, &candidate)?,
                AssociationKind::Product => overlaps::<ProductModel>(&conn, &candidate)?,
            };
            if conflicts.is_empty() {
                println!("no overlap");
            }
            for line in conflicts {
                println!("{line}");
            }
        }
    }

    Ok(())
}

fn overlaps<E: RangedAssociation>(
    conn: &Connection,
    candidate: &OverlapCandidate,
) -> CliResult<Vec<String>> {
    let dao = SqliteDao::<E>::try_new(conn)?;
    Ok(dao
        .find_overlaps(candidate)?
        .iter()
        .map(|association| {
            let years = association.years();
            format!(
                "{}\t{}-{}",
                association.id().unwrap_or_default(),
                years.start(),
                years.end()
            )
        })
        .collect())
}

fn print_classifier(classifier: &Classifier) {
    println!(
        "{}\t{}\t{}\t{}",
        classifier.id.unwrap_or_default(),
        classifier.classifier_type,
        classifier.value,
        classifier.label
    );
}
