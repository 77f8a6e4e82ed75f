use anyhow::Result;
use client_core::{AppContext, ListController, ListEndpoint, NoticeLevel, UiEvent};
use serde::de::DeserializeOwned;
use shared::columns::Projection;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use crate::render;

const HELP: &str = "\
commands:
  search <text>   search as you type (debounced)
  filter <n=v>    set a filter; an empty value removes it
  page <n>        jump to a page
  next | prev     page forward or back
  show <id>       print one record
  clear           reset filters to the screen defaults
  refresh         refetch the current page
  help            show this text
  quit            leave";

// Keystrokes go through the same controller the one-shot commands use.
pub async fn run<T>(ctx: AppContext, endpoint: ListEndpoint) -> Result<()>
where
    T: Projection + DeserializeOwned + Clone + Send + 'static,
{
    let mut events = ctx.subscribe_events();
    let controller: ListController<T> = ListController::open(ctx.clone(), endpoint).await;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(UiEvent::ListUpdated { entity }) if entity == controller.entity() => {
                    let snapshot = controller.snapshot().await;
                    if !snapshot.is_loading {
                        print!("{}", render::table(&snapshot));
                    }
                }
                Ok(UiEvent::Notice { level, text }) => {
                    println!("[{}] {text}", notice_tag(level));
                }
                Ok(UiEvent::ListUpdated { .. }) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !dispatch(&ctx, &controller, line.trim()).await {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn notice_tag(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "info",
        NoticeLevel::Warning => "warn",
        NoticeLevel::Error => "error",
    }
}

async fn dispatch<T>(ctx: &AppContext, controller: &ListController<T>, line: &str) -> bool
where
    T: Projection + DeserializeOwned + Clone + Send + 'static,
{
    let (command, rest) = match line.split_once(' ') {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "" => {}
        "quit" | "exit" => return false,
        "help" => println!("{HELP}"),
        "search" => controller.search_input(rest).await,
        "filter" => match rest.split_once('=') {
            Some((name, value)) => controller.set_filter(name.trim(), value.trim()).await,
            None => println!("usage: filter name=value"),
        },
        "page" => match rest.parse::<usize>() {
            Ok(page) => controller.set_page(page).await,
            Err(_) => println!("usage: page <number>"),
        },
        "next" => {
            let current = controller.snapshot().await.current_page;
            controller.set_page(current + 1).await;
        }
        "prev" => {
            let current = controller.snapshot().await.current_page;
            controller.set_page(current.saturating_sub(1)).await;
        }
        "show" => match rest.parse::<i64>() {
            Ok(id) => {
                let path = controller.endpoint().detail_path(id);
                match ctx.api().fetch_one::<T>(&path).await {
                    Ok(record) => print!("{}", render::detail(&record)),
                    Err(err) => println!("[error] {}", err.toast_text()),
                }
            }
            Err(_) => println!("usage: show <id>"),
        },
        "clear" => controller.clear_filters().await,
        "refresh" => controller.refresh().await,
        _ => println!("unknown command '{command}' (try 'help')"),
    }

    true
}
