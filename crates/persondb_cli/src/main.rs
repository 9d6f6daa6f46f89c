//! Command-line entry point for the people collection.
//!
//! # Responsibility
//! - Load configuration, start logging and open the store once at startup.
//! - Map each subcommand to one facade operation and print JSON results.
//!
//! # Invariants
//! - `ping` and `version` never touch configuration or the store.
//! - A failed store connection is logged and reported as a command failure.

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use persondb_core::db::connect;
use persondb_core::service::challenge;
use persondb_core::{
    core_version, default_log_level, init_logging, ping, NewPerson, PersonService, RepoError,
    SqlitePersonRepository, StoreConfig,
};
use rusqlite::Connection;
use serde::Serialize;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "persondb", version, about = "People collection tool")]
struct Cli {
    /// Overrides the configured store connection string.
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prints a liveness probe.
    Ping,
    /// Prints the core crate version.
    Version,
    /// Saves the sample person and the sample batch.
    Seed,
    /// Creates one person.
    Create {
        name: String,
        #[arg(long)]
        age: Option<i64>,
        /// Repeatable.
        #[arg(long = "food")]
        foods: Vec<String>,
    },
    /// Finds people by name, favorite food or id.
    Find {
        #[command(subcommand)]
        by: FindBy,
    },
    /// Appends a favorite food (default "hamburger") to a person.
    AddFood {
        id: String,
        #[arg(long, default_value = challenge::FOOD_TO_ADD)]
        food: String,
    },
    /// Sets the age (default 20) of the first person with this name.
    SetAge {
        name: String,
        #[arg(long, default_value_t = challenge::AGE_TO_SET)]
        age: i64,
    },
    /// Deletes one person by id.
    Delete { id: String },
    /// Deletes every person with this name (default "Mary").
    DeleteName {
        #[arg(default_value = challenge::NAME_TO_REMOVE)]
        name: String,
    },
    /// Lists up to two people who like a food, sorted by name, without age.
    QueryChain {
        #[arg(default_value = challenge::FOOD_TO_SEARCH)]
        food: String,
    },
}

#[derive(Subcommand, Debug)]
enum FindBy {
    Name { name: String },
    Food { food: String },
    Id { id: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Ping => {
            println!("persondb ping={}", ping());
            return ExitCode::SUCCESS;
        }
        Command::Version => {
            println!("persondb version={}", core_version());
            return ExitCode::SUCCESS;
        }
        _ => {}
    }

    let config = match load_config(cli.url.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };
    start_logging(&config);

    let conn = match connect(&config) {
        Ok(conn) => {
            info!("event=store_connect module=cli status=ok");
            conn
        }
        Err(err) => {
            error!("event=store_connect module=cli status=error error={err}");
            eprintln!("store connection failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    match run(&conn, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            warn!(
                "event=command module=cli status=error kind={:?} error={err}",
                err.kind()
            );
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(url_override: Option<&str>) -> Result<StoreConfig, persondb_core::ConfigError> {
    match url_override {
        Some(url) => StoreConfig::from_lookup(|key| match key {
            "PERSONDB_URL" => Some(url.to_string()),
            other => std::env::var(other).ok(),
        }),
        None => StoreConfig::from_env(),
    }
}

fn start_logging(config: &StoreConfig) {
    let level = config
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    let log_dir = config
        .log_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("persondb-logs"));

    if let Err(err) = init_logging(&level, &log_dir.to_string_lossy()) {
        eprintln!("logging disabled: {err}");
    }
}

fn run(conn: &Connection, command: Command) -> Result<(), RepoError> {
    let service = PersonService::new(SqlitePersonRepository::try_new(conn)?);

    match command {
        Command::Ping | Command::Version => Ok(()),
        Command::Seed => {
            let mut stored = vec![challenge::create_and_save_person(&service)?];
            stored.extend(challenge::create_many_people(&service)?);
            print_json(&stored)
        }
        Command::Create { name, age, foods } => {
            let mut person = NewPerson::new(name).with_favorite_foods(foods);
            person.age = age;
            print_json(&service.create_one(&person)?)
        }
        Command::Find { by } => match by {
            FindBy::Name { name } => print_json(&service.find_by_name(&name)?),
            FindBy::Food { food } => print_json(&service.find_one_by_favorite_food(&food)?),
            FindBy::Id { id } => print_json(&service.find_by_id(&id)?),
        },
        Command::AddFood { id, food } => {
            print_json(&service.append_favorite_food_by_id(&id, &food)?)
        }
        Command::SetAge { name, age } => print_json(&service.set_age_by_name(&name, age)?),
        Command::Delete { id } => print_json(&service.delete_by_id(&id)?),
        Command::DeleteName { name } => print_json(&service.delete_many_by_name(&name)?),
        Command::QueryChain { food } => print_json(&service.query_chain(&food)?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), RepoError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| RepoError::InvalidData(format!("cannot render output: {err}")))?;
    println!("{rendered}");
    Ok(())
}
