//! Kliv operator CLI
//!
//! Runs database, content, function and user administration calls against
//! a Kliv backend and prints the result as JSON.
//!
//! Usage:
//!   kliv --api-root https://app.example.com/api query posts status=eq.active
//!   KLIV_EMAIL=admin@example.com KLIV_PASSWORD=... kliv users list --end 50
//!
//! Logs go to stderr so stdout stays machine-readable.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{to_params, Args, Command, FilesCommand, UsersCommand};
use kliv_client::{
    BatchUploadOptions, CancelSignal, FilePayload, InvokeOptions, KlivClient, ListUsersOptions,
};
use serde_json::{json, Value};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = args.client_config()?;
    debug!(api_root = %config.api_root, "using API root");
    let client = KlivClient::new(config).context("failed to create client")?;

    if let Some((email, password)) = args.credentials()? {
        client
            .auth()
            .sign_in(email, password)
            .await
            .context("sign in failed")?;
    }

    let output = run(&client, args.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(client: &KlivClient, command: Command) -> Result<Value> {
    let db = client.database();
    let output = match command {
        Command::Tables => Value::from(db.list_tables().await?),
        Command::Query { table, filters } => db.query(&table, &to_params(&filters)).await?,
        Command::Get { table, id } => db
            .get(&table, &id)
            .await?
            .with_context(|| format!("no row with _row_id {id} in {table}"))?,
        Command::Count { table, filters } => {
            let count = db.count(&table, &to_params(&filters)).await?;
            json!({ "count": count })
        }
        Command::Insert { table, data } => db.insert(&table, &data).await?,
        Command::Update {
            table,
            data,
            filters,
        } => db.update(&table, &to_params(&filters), &data).await?,
        Command::Delete { table, filters } => db.delete(&table, &to_params(&filters)).await?,
        Command::Files { command } => files(client, command).await?,
        Command::Invoke {
            name,
            method,
            data,
            query,
        } => {
            let options = InvokeOptions {
                method,
                query: to_params(&query),
                ..Default::default()
            };
            client
                .functions()
                .invoke(&name, data.as_ref(), options)
                .await?
                .into_value()
        }
        Command::Whoami => client
            .auth()
            .get_user(true)
            .await?
            .map(Value::from)
            .unwrap_or(Value::Null),
        Command::Users { command } => users(client, command).await?,
        Command::Groups => client.auth().list_groups().await?,
    };
    Ok(output)
}

async fn files(client: &KlivClient, command: FilesCommand) -> Result<Value> {
    let content = client.content();
    let output = match command {
        FilesCommand::List { prefix } => content.list_files(prefix.as_deref()).await?,
        FilesCommand::Upload { paths, dir } => {
            let mut payloads = Vec::with_capacity(paths.len());
            for path in &paths {
                let payload = FilePayload::from_path(path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?;
                payloads.push(payload);
            }

            let cancel = CancelSignal::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupted, cancelling upload");
                    on_interrupt.cancel();
                }
            });

            let options = BatchUploadOptions::default()
                .with_cancel(cancel)
                .with_file_progress(|file, progress| {
                    debug!(
                        file = file.name(),
                        loaded = progress.loaded,
                        total = progress.total,
                        "upload progress"
                    );
                })
                .with_complete(|file, uploaded| {
                    let url = uploaded.content_url().unwrap_or("-");
                    info!(file = file.name(), url, "upload complete");
                });
            let uploaded = content.upload_multiple(&payloads, &dir, options).await?;
            Value::Array(uploaded.into_iter().map(|u| u.into_value()).collect())
        }
        FilesCommand::Rm { path } => content.delete_file(&path).await?,
        FilesCommand::Mv { old, new } => content.move_file(&old, &new).await?,
    };
    Ok(output)
}

async fn users(client: &KlivClient, command: UsersCommand) -> Result<Value> {
    let auth = client.auth();
    let output = match command {
        UsersCommand::List { start, end, search } => {
            let options = ListUsersOptions {
                start_row: start,
                end_row: end,
                search,
            };
            auth.list_users(&options).await?
        }
        UsersCommand::Get { uuid } => auth.get_user_by_uuid(&uuid).await?,
        UsersCommand::Delete { uuid } => auth.delete_user(&uuid).await?,
        UsersCommand::Update { uuid, data } => auth.update_user_by_uuid(&uuid, &data).await?,
    };
    Ok(output)
}
