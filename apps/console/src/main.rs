use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::error;

use client_core::{
    ApiClient, ApiError, AppContext, HttpTransport, ListController, ListEndpoint, MultipartField,
    MultipartValue, NoticeLevel, UiEvent, AS_OF_FILTER, SEARCH_FILTER,
};
use shared::{
    columns::Projection,
    domain::EntityKind,
    records::{Candidate, ComplianceItem, Customer, Employee, Project, StatementOfWork},
};
use storage::LocalStore;

mod config;
mod render;
mod repl;

use config::{load_settings, normalize_database_url};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(name = "console", about = "Back-office console for the operations API")]
struct Cli {
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login { email_id: String, password: String },
    Logout,
    List {
        entity: EntityArg,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        page: Option<usize>,
        #[arg(long = "filter", value_parser = parse_pair)]
        filters: Vec<(String, String)>,
        #[arg(long = "as-of", value_name = "YYYY-MM-DD")]
        as_of: Option<String>,
    },
    Show { entity: EntityArg, id: i64 },
    Create {
        entity: EntityArg,
        #[arg(value_parser = parse_pair, required = true)]
        fields: Vec<(String, String)>,
    },
    Update {
        entity: EntityArg,
        id: i64,
        #[arg(value_parser = parse_pair, required = true)]
        fields: Vec<(String, String)>,
    },
    Delete { entity: EntityArg, id: i64 },
    Attach { id: i64, file: PathBuf },
    Repl { entity: EntityArg },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EntityArg {
    Customers,
    Sows,
    Projects,
    Employees,
    Compliances,
    Candidates,
}

impl EntityArg {
    fn kind(self) -> EntityKind {
        match self {
            EntityArg::Customers => EntityKind::Customers,
            EntityArg::Sows => EntityKind::Sows,
            EntityArg::Projects => EntityKind::Projects,
            EntityArg::Employees => EntityKind::Employees,
            EntityArg::Compliances => EntityKind::Compliances,
            EntityArg::Candidates => EntityKind::Candidates,
        }
    }
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    let Some((name, value)) = raw.split_once('=') else {
        return Err(format!("expected name=value, got '{raw}'"));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err("field name cannot be empty".to_string());
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("warn").init();
    let cli = Cli::parse();

    let mut settings = load_settings();
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
    }
    if let Some(database_url) = cli.database_url {
        settings.database_url = database_url;
    }

    let database_url = normalize_database_url(&settings.database_url);
    let store = LocalStore::new(&database_url)
        .await
        .context("open local state database")?;
    let transport = HttpTransport::new(
        &settings.server_url,
        Duration::from_secs(settings.request_timeout_secs),
    )?;
    let api = ApiClient::new(Arc::new(transport));
    let ctx = AppContext::new(api, store, Duration::from_millis(settings.debounce_ms));
    ctx.restore_session().await?;

    match cli.command {
        Command::Login { email_id, password } => {
            ctx.login(&email_id, &password).await?;
            println!("logged in as {email_id}");
        }
        Command::Logout => {
            ctx.logout().await?;
            println!("logged out");
        }
        Command::List {
            entity,
            search,
            page,
            mut filters,
            as_of,
        } => {
            if let Some(date) = as_of {
                filters.push((AS_OF_FILTER.to_string(), date));
            }
            run_list(&ctx, entity.kind(), search, page, filters).await?;
        }
        Command::Show { entity, id } => run_show(&ctx, entity.kind(), id).await?,
        Command::Create { entity, fields } => {
            let endpoint = ListEndpoint::for_entity(entity.kind());
            let payload = fields_to_json(&fields);
            if let Err(err) = ctx.api().create(endpoint.path, &payload).await {
                return Err(report_api_error(err));
            }
            println!("created");
        }
        Command::Update { entity, id, fields } => {
            let path = ListEndpoint::for_entity(entity.kind()).detail_path(id);
            let payload = fields_to_json(&fields);
            if let Err(err) = ctx.api().update(&path, &payload).await {
                return Err(report_api_error(err));
            }
            println!("updated");
        }
        Command::Delete { entity, id } => {
            let path = ListEndpoint::for_entity(entity.kind()).detail_path(id);
            if let Err(err) = ctx.api().delete(&path).await {
                return Err(report_api_error(err));
            }
            println!("deleted");
        }
        Command::Attach { id, file } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("read {}", file.display()))?;
            let filename = file
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("resume.bin")
                .to_string();
            let content_type = mime_guess::from_path(&file)
                .first()
                .map(|mime| mime.essence_str().to_string());
            let path = format!("{}/resume", ListEndpoint::candidates().detail_path(id));
            let fields = vec![MultipartField {
                name: "file".to_string(),
                value: MultipartValue::File {
                    filename,
                    content_type,
                    data,
                },
            }];
            if let Err(err) = ctx.api().upload(&path, fields).await {
                return Err(report_api_error(err));
            }
            println!("resume uploaded for candidate {id}");
        }
        Command::Repl { entity } => run_repl(&ctx, entity.kind()).await?,
    }

    Ok(())
}

async fn run_list(
    ctx: &AppContext,
    entity: EntityKind,
    search: Option<String>,
    page: Option<usize>,
    filters: Vec<(String, String)>,
) -> Result<()> {
    match entity {
        EntityKind::Customers => print_listing::<Customer>(ctx, entity, search, page, filters).await,
        EntityKind::Sows => {
            print_listing::<StatementOfWork>(ctx, entity, search, page, filters).await
        }
        EntityKind::Projects => print_listing::<Project>(ctx, entity, search, page, filters).await,
        EntityKind::Employees => print_listing::<Employee>(ctx, entity, search, page, filters).await,
        EntityKind::Compliances => {
            print_listing::<ComplianceItem>(ctx, entity, search, page, filters).await
        }
        EntityKind::Candidates => {
            print_listing::<Candidate>(ctx, entity, search, page, filters).await
        }
    }
}

async fn run_show(ctx: &AppContext, entity: EntityKind, id: i64) -> Result<()> {
    match entity {
        EntityKind::Customers => print_record::<Customer>(ctx, entity, id).await,
        EntityKind::Sows => print_record::<StatementOfWork>(ctx, entity, id).await,
        EntityKind::Projects => print_record::<Project>(ctx, entity, id).await,
        EntityKind::Employees => print_record::<Employee>(ctx, entity, id).await,
        EntityKind::Compliances => print_record::<ComplianceItem>(ctx, entity, id).await,
        EntityKind::Candidates => print_record::<Candidate>(ctx, entity, id).await,
    }
}

async fn run_repl(ctx: &AppContext, entity: EntityKind) -> Result<()> {
    let endpoint = ListEndpoint::for_entity(entity);
    match entity {
        EntityKind::Customers => repl::run::<Customer>(ctx.clone(), endpoint).await,
        EntityKind::Sows => repl::run::<StatementOfWork>(ctx.clone(), endpoint).await,
        EntityKind::Projects => repl::run::<Project>(ctx.clone(), endpoint).await,
        EntityKind::Employees => repl::run::<Employee>(ctx.clone(), endpoint).await,
        EntityKind::Compliances => repl::run::<ComplianceItem>(ctx.clone(), endpoint).await,
        EntityKind::Candidates => repl::run::<Candidate>(ctx.clone(), endpoint).await,
    }
}

async fn print_listing<T>(
    ctx: &AppContext,
    entity: EntityKind,
    search: Option<String>,
    page: Option<usize>,
    filters: Vec<(String, String)>,
) -> Result<()>
where
    T: Projection + DeserializeOwned + Clone + Send + 'static,
{
    let mut events = ctx.subscribe_events();
    let controller: ListController<T> =
        ListController::open(ctx.clone(), ListEndpoint::for_entity(entity)).await;
    settle(&controller, &mut events).await?;

    if !filters.is_empty() || search.is_some() {
        for (name, value) in &filters {
            controller.set_filter(name, value).await;
        }
        if let Some(term) = &search {
            controller.set_filter(SEARCH_FILTER, term).await;
        }
        settle(&controller, &mut events).await?;
    }

    // Page selection last: clamping needs the totals the fetch above
    // established.
    if let Some(page) = page {
        controller.set_page(page).await;
        settle(&controller, &mut events).await?;
    }

    let snapshot = controller.snapshot().await;
    if snapshot.failed {
        bail!("could not load the {} listing", entity.label());
    }
    print!("{}", render::table(&snapshot));
    Ok(())
}

async fn print_record<T>(ctx: &AppContext, entity: EntityKind, id: i64) -> Result<()>
where
    T: Projection + DeserializeOwned,
{
    let path = ListEndpoint::for_entity(entity).detail_path(id);
    match ctx.api().fetch_one::<T>(&path).await {
        Ok(record) => {
            print!("{}", render::detail(&record));
            Ok(())
        }
        Err(err) => Err(report_api_error(err)),
    }
}

// Error notices arriving mid-load are logged, not fatal.
async fn settle<T>(
    controller: &ListController<T>,
    events: &mut broadcast::Receiver<UiEvent>,
) -> Result<()>
where
    T: Projection + DeserializeOwned + Clone + Send + 'static,
{
    while controller.snapshot().await.is_loading {
        let event = tokio::time::timeout(SETTLE_TIMEOUT, events.recv())
            .await
            .context("timed out waiting for the listing to load")?;
        match event {
            Ok(UiEvent::Notice {
                level: NoticeLevel::Error,
                text,
            }) => error!("{text}"),
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => bail!("event channel closed"),
        }
    }
    Ok(())
}

fn fields_to_json(fields: &[(String, String)]) -> Value {
    let mut map = serde_json::Map::new();
    for (name, value) in fields {
        map.insert(name.clone(), field_value(value));
    }
    Value::Object(map)
}

// A value becomes a JSON number only when the numeric form prints back
// to the exact input; anything else (leading zeros, trailing decimal
// zeros) is sent verbatim as a string.
fn field_value(raw: &str) -> Value {
    if let Ok(int) = raw.parse::<i64>() {
        if int.to_string() == raw {
            return Value::Number(int.into());
        }
    }
    if let Ok(float) = raw.parse::<f64>() {
        if let Some(number) = serde_json::Number::from_f64(float) {
            if number.to_string() == raw {
                return Value::Number(number);
            }
        }
    }
    Value::String(raw.to_string())
}

fn report_api_error(err: ApiError) -> anyhow::Error {
    if let Some(fields) = err.field_errors() {
        for (field, messages) in fields.iter() {
            for message in messages {
                eprintln!("{field}: {message}");
            }
        }
    }
    anyhow::Error::new(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_split_on_the_first_equals() {
        assert_eq!(
            parse_pair("name=Acme Corp").expect("pair"),
            ("name".to_string(), "Acme Corp".to_string())
        );
        assert_eq!(
            parse_pair("note=a=b").expect("pair"),
            ("note".to_string(), "a=b".to_string())
        );
        assert!(parse_pair("no-equals").is_err());
        assert!(parse_pair("=value").is_err());
    }

    #[test]
    fn field_values_keep_numbers_numeric() {
        let payload = fields_to_json(&[
            ("customer_id".to_string(), "7".to_string()),
            ("value".to_string(), "1200.5".to_string()),
            ("title".to_string(), "Q3 retainer".to_string()),
        ]);
        assert_eq!(payload["customer_id"], 7);
        assert_eq!(payload["value"], 1200.5);
        assert_eq!(payload["title"], "Q3 retainer");
    }

    #[test]
    fn number_like_strings_are_sent_verbatim() {
        let payload = fields_to_json(&[
            ("phone".to_string(), "0123456789".to_string()),
            ("rate".to_string(), "1200.50".to_string()),
        ]);
        assert_eq!(payload["phone"], "0123456789");
        assert_eq!(payload["rate"], "1200.50");
    }
}
