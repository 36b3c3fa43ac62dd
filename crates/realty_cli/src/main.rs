//! Operator CLI over the content repository.
//!
//! # Responsibility
//! - Expose smoke checks and basic content operations from a shell.
//! - Print JSON on stdout and errors on stderr with exit code 1.

use log::info;
use realty_core::{
    init_logging_from_config, load_config, open_repository, ContentRepository, ContentType,
    CoreConfig, DashboardService, QueryOptions,
};
use serde::Serialize;
use std::error::Error;
use std::path::Path;
use std::process::ExitCode;
use uuid::Uuid;

type CliResult<T> = Result<T, Box<dyn Error>>;

const USAGE: &str = "usage: realty_cli [--config <file>] <command>

commands:
  ping | version
  list <collection> [--limit N] [--offset N] [--sort S] [--search Q] [--fields a,b]
  get <collection> <id>
  create <collection> <json>
  update <collection> <id> <json>
  delete <collection> <id>
  search <query> [collection...]
  upload <path>
  stats";

fn main() -> ExitCode {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match run(args) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(mut args: Vec<String>) -> CliResult<String> {
    let config = take_config(&mut args)?;
    let Some((command, rest)) = args.split_first() else {
        return Ok(USAGE.to_string());
    };

    match command.as_str() {
        "ping" => Ok(format!("realty_core ping={}", realty_core::ping())),
        "version" => Ok(format!("realty_core version={}", realty_core::core_version())),
        "help" | "--help" | "-h" => Ok(USAGE.to_string()),
        _ => {
            init_logging_from_config(&config.logging)?;
            let repo = open_repository(&config)?;
            info!("event=cli_command module=cli status=start command={command}");
            run_content_command(repo.as_ref(), command, rest)
        }
    }
}

fn take_config(args: &mut Vec<String>) -> CliResult<CoreConfig> {
    let Some(index) = args.iter().position(|arg| arg == "--config") else {
        return Ok(CoreConfig::default());
    };
    if index + 1 >= args.len() {
        return Err("--config requires a file path".into());
    }
    let path = args.remove(index + 1);
    args.remove(index);
    Ok(load_config(path)?)
}

fn run_content_command(
    repo: &dyn ContentRepository,
    command: &str,
    args: &[String],
) -> CliResult<String> {
    match (command, args) {
        ("list", [collection, flags @ ..]) => {
            let options = list_options(flags)?;
            to_json(&repo.list_documents(collection_arg(collection)?, &options)?)
        }
        ("get", [collection, id]) => get_record(repo, collection_arg(collection)?, id_arg(id)?),
        ("create", [collection, body]) => create_record(repo, collection_arg(collection)?, body),
        ("update", [collection, id, body]) => {
            update_record(repo, collection_arg(collection)?, id_arg(id)?, body)
        }
        ("delete", [collection, id]) => {
            let id = id_arg(id)?;
            match collection_arg(collection)? {
                ContentType::Property => repo.delete_property(id)?,
                ContentType::Agent => repo.delete_agent(id)?,
                ContentType::Client => repo.delete_client(id)?,
                ContentType::Inquiry => repo.delete_inquiry(id)?,
                ContentType::Article => repo.delete_article(id)?,
                ContentType::Testimonial => repo.delete_testimonial(id)?,
            }
            Ok(format!("deleted {id}"))
        }
        ("search", [query, collections @ ..]) => {
            let collections = ContentType::parse_list(collections)?;
            to_json(&repo.search(query, Some(collections.as_slice()))?)
        }
        ("upload", [path]) => {
            let path = Path::new(path);
            let data = std::fs::read(path)?;
            let filename = path.file_name().and_then(|name| name.to_str());
            Ok(repo.upload_file(&data, filename)?)
        }
        ("stats", []) => to_json(&DashboardService::new(repo).stats()?),
        _ => Err(format!("unrecognised command `{command}`\n\n{USAGE}").into()),
    }
}

fn list_options(flags: &[String]) -> CliResult<QueryOptions> {
    let mut options = QueryOptions::new();
    let mut flags = flags.iter();
    while let Some(flag) = flags.next() {
        let value = flags
            .next()
            .ok_or_else(|| format!("{flag} requires a value"))?;
        options = match flag.as_str() {
            "--limit" => options.limit(value.parse()?),
            "--offset" => options.offset(value.parse()?),
            "--sort" => options.sort_by(value)?,
            "--search" => options.search(value.as_str()),
            "--fields" => options.fields(value.split(',').map(str::trim).filter(|f| !f.is_empty())),
            other => return Err(format!("unknown list flag `{other}`").into()),
        };
    }
    Ok(options)
}

/// Prints `null` for a missing record; a miss is not an error.
fn get_record(repo: &dyn ContentRepository, collection: ContentType, id: Uuid) -> CliResult<String> {
    let record = match collection {
        ContentType::Property => to_value(repo.get_property(id)?)?,
        ContentType::Agent => to_value(repo.get_agent(id)?)?,
        ContentType::Client => to_value(repo.get_client(id)?)?,
        ContentType::Inquiry => to_value(repo.get_inquiry(id)?)?,
        ContentType::Article => to_value(repo.get_article(id)?)?,
        ContentType::Testimonial => to_value(repo.get_testimonial(id)?)?,
    };
    to_json(&record)
}

fn create_record(repo: &dyn ContentRepository, collection: ContentType, body: &str) -> CliResult<String> {
    match collection {
        ContentType::Property => to_json(&repo.create_property(&serde_json::from_str(body)?)?),
        ContentType::Agent => to_json(&repo.create_agent(&serde_json::from_str(body)?)?),
        ContentType::Client => to_json(&repo.create_client(&serde_json::from_str(body)?)?),
        ContentType::Inquiry => to_json(&repo.create_inquiry(&serde_json::from_str(body)?)?),
        ContentType::Article => to_json(&repo.create_article(&serde_json::from_str(body)?)?),
        ContentType::Testimonial => {
            to_json(&repo.create_testimonial(&serde_json::from_str(body)?)?)
        }
    }
}

fn update_record(
    repo: &dyn ContentRepository,
    collection: ContentType,
    id: Uuid,
    body: &str,
) -> CliResult<String> {
    match collection {
        ContentType::Property => to_json(&repo.update_property(id, &serde_json::from_str(body)?)?),
        ContentType::Agent => to_json(&repo.update_agent(id, &serde_json::from_str(body)?)?),
        ContentType::Client => to_json(&repo.update_client(id, &serde_json::from_str(body)?)?),
        ContentType::Inquiry => to_json(&repo.update_inquiry(id, &serde_json::from_str(body)?)?),
        ContentType::Article => to_json(&repo.update_article(id, &serde_json::from_str(body)?)?),
        ContentType::Testimonial => {
            to_json(&repo.update_testimonial(id, &serde_json::from_str(body)?)?)
        }
    }
}

fn collection_arg(raw: &str) -> CliResult<ContentType> {
    ContentType::parse(raw).ok_or_else(|| format!("unknown collection `{raw}`").into())
}

fn id_arg(raw: &str) -> CliResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|err| format!("invalid id `{raw}`: {err}").into())
}

fn to_value<T: Serialize>(value: T) -> CliResult<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}

fn to_json<T: Serialize>(value: &T) -> CliResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::{list_options, run, take_config};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn smoke_commands_need_no_backend() {
        assert_eq!(run(args(&["ping"])).unwrap(), "realty_core ping=pong");
        assert!(run(Vec::new()).unwrap().starts_with("usage:"));
    }

    #[test]
    fn config_flag_is_removed_from_arguments() {
        let mut values = args(&["--config"]);
        assert!(take_config(&mut values).is_err());

        let mut values = args(&["stats"]);
        let config = take_config(&mut values).unwrap();
        assert_eq!(config.backend.kind, "memory");
        assert_eq!(values, args(&["stats"]));
    }

    #[test]
    fn list_flags_build_query_options() {
        let options =
            list_options(&args(&["--limit", "5", "--sort", "-price", "--fields", "title,price"]))
                .unwrap();
        assert_eq!(options.limit, Some(5));
        assert_eq!(options.sort.len(), 1);
        assert_eq!(options.fields, vec!["title".to_string(), "price".to_string()]);
        assert!(list_options(&args(&["--limit"])).is_err());
    }

    #[test]
    fn content_commands_run_against_memory_backend() {
        let created = run(args(&[
            "create",
            "property",
            r#"{"title":"Harbor Loft","price":420000}"#,
        ]))
        .unwrap();
        assert!(created.contains("\"slug\": \"harbor-loft\""));
        assert!(run(args(&["get", "property", "not-a-uuid"])).is_err());
        assert_eq!(
            run(args(&["get", "property", "4f0c2b1e-7d3a-4e5f-9a8b-0c1d2e3f4a5b"])).unwrap(),
            "null"
        );
        assert!(run(args(&["list", "houses"])).is_err());
    }
}
