use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use campus_sync::{
    AssumeYes, Attachment, ConfirmationGate, ControllerConfig, Draft, DynamicRecord, ErrorInfo,
    Filters, HttpResourceClient, Record, RecordId, ResourceError, ResourceKind, ResourceListController,
    RetryPolicy,
};

mod output;
mod prompt;

use prompt::TerminalPrompt;

#[derive(Parser)]
#[command(name = "campus")]
#[command(about = "CLI for the campus dashboard API", long_about = None)]
struct Cli {
    /// API base URL
    #[arg(short, long, default_value = "http://127.0.0.1:8080/api")]
    server: String,

    /// Per-request timeout in seconds (0 = wait indefinitely)
    #[arg(short, long, default_value = "30")]
    timeout: u64,

    /// Attempts per request for transient failures
    #[arg(long, default_value = "1")]
    retries: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the known resources
    Resources,

    /// List records
    List {
        /// Resource name or path (e.g. faculty, /donation/categories)
        resource: ResourceKind,

        /// Exact-match filter (key=value, can be repeated)
        #[arg(short, long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },

    /// Create a record
    Create {
        resource: ResourceKind,

        /// Field value: key=text, or key:=json for numbers, booleans and null
        #[arg(long = "set", value_parser = parse_field)]
        fields: Vec<(String, Value)>,

        /// File to upload with the record
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Update a record
    Update {
        resource: ResourceKind,

        /// Record ID
        id: RecordId,

        /// Field value: key=text, or key:=json
        #[arg(long = "set", value_parser = parse_field)]
        fields: Vec<(String, Value)>,

        /// File to upload with the record
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Delete a record
    Delete {
        resource: ResourceKind,

        /// Record ID
        id: RecordId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Flip a record's status field
    Toggle {
        resource: ResourceKind,

        /// Record ID
        id: RecordId,

        /// Field to flip (defaults to the resource's status field)
        field: Option<String>,
    },
}

fn parse_filter(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or("Expected format: key=value".to_string())?;
    if key.is_empty() {
        return Err("Filter key is empty".to_string());
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_field(s: &str) -> Result<(String, Value), String> {
    if let Some((key, raw)) = s.split_once(":=") {
        if key.is_empty() {
            return Err("Field name is empty".to_string());
        }
        let value = serde_json::from_str(raw).map_err(|e| format!("Invalid JSON for {}: {}", key, e))?;
        return Ok((key.to_string(), value));
    }
    let (key, value) = parse_filter(s)?;
    Ok((key, Value::String(value)))
}

fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("csv") => "text/csv",
        Some("txt") => "text/plain",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

async fn build_draft(fields: Vec<(String, Value)>, file: Option<PathBuf>) -> anyhow::Result<Draft> {
    let fields: Map<String, Value> = fields.into_iter().collect();
    let mut draft = Draft::from(fields);
    if let Some(path) = file {
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        draft = draft.with_attachment(Attachment {
            file_name,
            content_type: content_type(&path).to_string(),
            bytes,
        });
    }
    Ok(draft)
}

/// Turn a controller failure into the message a user should see.
fn user_error(err: ResourceError) -> anyhow::Error {
    debug!(error = ?err, "Request failed");
    anyhow!(ErrorInfo::from(&err).message)
}

type Controller = ResourceListController<DynamicRecord, HttpResourceClient<DynamicRecord>>;

fn controller(cli: &Cli, kind: ResourceKind, filters: Filters) -> Controller {
    let retry = if cli.retries > 1 {
        RetryPolicy::transient(cli.retries, Duration::from_millis(500))
    } else {
        RetryPolicy::single_attempt()
    };
    let config = ControllerConfig {
        resource: kind.path().to_string(),
        filters,
        timeout: (cli.timeout > 0).then(|| Duration::from_secs(cli.timeout)),
        retry,
        ..ControllerConfig::default()
    };
    ResourceListController::with_config(HttpResourceClient::new(&cli.server, kind.path()), config)
}

/// Controller with the current list already loaded.
async fn loaded(cli: &Cli, kind: ResourceKind, filters: Filters) -> anyhow::Result<Controller> {
    let mut controller = controller(cli, kind, filters);
    controller.load().await.map_err(user_error)?;
    Ok(controller)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("campus_sync=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Resources => {
            println!("{}", output::resources());
        }

        Commands::List { resource, filters } => {
            let filters = filters
                .iter()
                .fold(Filters::new(), |acc, (k, v)| acc.with(k.as_str(), v.as_str()));
            let controller = loaded(&cli, *resource, filters).await?;
            if controller.items().is_empty() {
                println!("No {} records found", resource);
            } else {
                println!("{}", output::table(*resource, controller.items()));
            }
        }

        Commands::Create {
            resource,
            fields,
            file,
        } => {
            let draft = build_draft(fields.clone(), file.clone()).await?;
            let mut controller = loaded(&cli, *resource, Filters::new()).await?;
            let created = controller.create(&draft).await.map_err(user_error)?;
            println!("Created {} {}", resource, created.id());
            println!("{}", output::table(*resource, controller.items()));
        }

        Commands::Update {
            resource,
            id,
            fields,
            file,
        } => {
            if fields.is_empty() && file.is_none() {
                bail!("Nothing to update: pass --set key=value or --file");
            }
            let draft = build_draft(fields.clone(), file.clone()).await?;
            let mut controller = loaded(&cli, *resource, Filters::new()).await?;
            controller.update(id, &draft).await.map_err(user_error)?;
            println!("Updated {} {}", resource, id);
            println!("{}", output::table(*resource, controller.items()));
        }

        Commands::Delete { resource, id, yes } => {
            let gate: Box<dyn ConfirmationGate> = if *yes {
                Box::new(AssumeYes)
            } else {
                Box::new(TerminalPrompt)
            };
            let mut controller = loaded(&cli, *resource, Filters::new()).await?;
            if !gate
                .confirm(&format!("Delete {} {}?", resource, id))
                .await
            {
                println!("Aborted");
                return Ok(());
            }
            controller.remove(id).await.map_err(user_error)?;
            println!("Deleted {} {}", resource, id);
            println!("{}", output::table(*resource, controller.items()));
        }

        Commands::Toggle {
            resource,
            id,
            field,
        } => {
            let field = match field.as_deref().or(resource.toggle_field()) {
                Some(field) => field.to_string(),
                None => bail!("{} has no toggleable field; pass one explicitly", resource),
            };
            let mut controller = loaded(&cli, *resource, Filters::new()).await?;
            let toggled = controller
                .toggle_field(id, &field)
                .await
                .map_err(user_error)?;
            match toggled.as_ref().and_then(|r| r.get(&field)) {
                Some(value) => println!("Toggled {} {}: {} = {}", resource, id, field, value),
                None => println!("Toggled {} {} (not in the current list)", resource, id),
            }
            println!("{}", output::table(*resource, controller.items()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field_text_and_json() {
        assert_eq!(
            parse_field("name=Physics Lab").unwrap(),
            ("name".to_string(), Value::String("Physics Lab".to_string()))
        );
        assert_eq!(
            parse_field("amount:=1500.5").unwrap(),
            ("amount".to_string(), serde_json::json!(1500.5))
        );
        assert_eq!(
            parse_field("roll_no=1001").unwrap().1,
            Value::String("1001".to_string())
        );
        assert!(parse_field("active:=maybe").is_err());
        assert!(parse_field("=x").is_err());
        assert!(parse_field("novalue").is_err());
    }

    #[test]
    fn test_parse_filter_keeps_equals_in_value() {
        assert_eq!(
            parse_filter("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
    }

    #[test]
    fn test_content_type_by_extension() {
        assert_eq!(content_type(Path::new("cert.PDF")), "application/pdf");
        assert_eq!(content_type(Path::new("photo.jpeg")), "image/jpeg");
        assert_eq!(content_type(Path::new("blob")), "application/octet-stream");
    }

    #[test]
    fn test_cli_parses_resource_names_and_paths() {
        let cli = Cli::try_parse_from(["campus", "list", "/donation/categories", "-f", "active=true"])
            .unwrap();
        match cli.command {
            Commands::List { resource, filters } => {
                assert_eq!(resource, ResourceKind::DonationCategory);
                assert_eq!(filters, vec![("active".to_string(), "true".to_string())]);
            }
            _ => panic!("expected list"),
        }

        let cli = Cli::try_parse_from(["campus", "toggle", "page", "7"]).unwrap();
        match cli.command {
            Commands::Toggle { resource, id, field } => {
                assert_eq!(resource, ResourceKind::Page);
                assert_eq!(id, RecordId::Int(7));
                assert!(field.is_none());
            }
            _ => panic!("expected toggle"),
        }
    }

    #[test]
    fn test_user_error_hides_server_detail() {
        let err = user_error(ResourceError::Server {
            status: 500,
            message: "SQLSTATE[42S02]".to_string(),
        });
        assert!(!err.to_string().contains("SQLSTATE"));
    }
}
