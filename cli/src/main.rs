mod client;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use futures_util::StreamExt;
use serde::Serialize;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;
use wire::{CanvasEvent, CanvasId, Frame, GroupId, ImageId};

use client::{ApiClient, CliError, NewImage};

#[derive(Parser, Debug)]
#[command(name = "imageboard", about = "Image canvas API and realtime CLI")]
struct Cli {
    #[arg(long, env = "IMAGEBOARD_BASE_URL", default_value = "http://127.0.0.1:8000")]
    base_url: String,

    /// Active canvas for image, group, chat and watch commands.
    #[arg(long, env = "IMAGEBOARD_CANVAS")]
    canvas: Option<CanvasId>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Ping,
    Canvas(CanvasCommand),
    Image(ImageCommand),
    Group(GroupCommand),
    Chat(ChatCommand),
    /// Upload an image file and print its data URL record.
    Upload {
        path: PathBuf,
    },
    /// Print realtime frames from the active canvas room.
    Watch {
        /// Exit after this many frames.
        #[arg(long)]
        count: Option<usize>,
        /// Exit after this many seconds without a frame.
        #[arg(long)]
        idle_secs: Option<u64>,
    },
}

#[derive(Args, Debug)]
struct CanvasCommand {
    #[command(subcommand)]
    command: CanvasSubcommand,
}

#[derive(Subcommand, Debug)]
enum CanvasSubcommand {
    Create,
    Get {
        /// Defaults to the active canvas.
        canvas_id: Option<CanvasId>,
    },
}

#[derive(Args, Debug)]
struct ImageCommand {
    #[command(subcommand)]
    command: ImageSubcommand,
}

#[derive(Subcommand, Debug)]
enum ImageSubcommand {
    Add {
        #[arg(long)]
        src: String,
        #[arg(long, default_value_t = 0.0)]
        x: f64,
        #[arg(long, default_value_t = 0.0)]
        y: f64,
        #[arg(long, default_value_t = 300.0)]
        w: f64,
        #[arg(long, default_value_t = 300.0)]
        h: f64,
    },
    Delete {
        image_id: ImageId,
    },
}

#[derive(Args, Debug)]
struct GroupCommand {
    #[command(subcommand)]
    command: GroupSubcommand,
}

#[derive(Subcommand, Debug)]
enum GroupSubcommand {
    Create {
        #[arg(required = true, num_args = 2..)]
        image_ids: Vec<ImageId>,
    },
    Delete {
        group_id: GroupId,
    },
}

#[derive(Args, Debug)]
struct ChatCommand {
    #[command(subcommand)]
    command: ChatSubcommand,
}

#[derive(Subcommand, Debug)]
enum ChatSubcommand {
    List {
        #[arg(long)]
        limit: Option<usize>,
    },
    Send {
        text: String,
        #[arg(long)]
        sender: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let mut api = ApiClient::new(&cli.base_url, cli.canvas);

    match cli.command {
        Command::Ping => run_ping(&api).await,
        Command::Canvas(canvas) => run_canvas(&mut api, canvas).await,
        Command::Image(image) => run_image(&api, image).await,
        Command::Group(group) => run_group(&api, group).await,
        Command::Chat(chat) => run_chat(&api, chat).await,
        Command::Upload { path } => print_json(&api.upload(&path).await?),
        Command::Watch { count, idle_secs } => run_watch(&api, count, idle_secs.map(Duration::from_secs)).await,
    }
}

async fn run_ping(api: &ApiClient) -> Result<(), CliError> {
    let health = api.health().await?;
    println!("{} ({} canvases)", health.status, health.canvases);
    Ok(())
}

async fn run_canvas(api: &mut ApiClient, canvas: CanvasCommand) -> Result<(), CliError> {
    match canvas.command {
        CanvasSubcommand::Create => {
            let state = api.create_canvas().await?;
            print_json(&state)?;
            if let Some(id) = api.canvas() {
                eprintln!("active canvas: {id} (export IMAGEBOARD_CANVAS={id})");
            }
            Ok(())
        }
        CanvasSubcommand::Get { canvas_id } => {
            if canvas_id.is_some() {
                api.set_canvas(canvas_id);
            }
            print_json(&api.get_canvas().await?)
        }
    }
}

async fn run_image(api: &ApiClient, image: ImageCommand) -> Result<(), CliError> {
    match image.command {
        ImageSubcommand::Add { src, x, y, w, h } => {
            let added = api.add_image(&NewImage { src, x, y, w, h }).await?;
            print_json(&added)
        }
        ImageSubcommand::Delete { image_id } => {
            api.delete_image(image_id).await?;
            println!("deleted {image_id}");
            Ok(())
        }
    }
}

async fn run_group(api: &ApiClient, group: GroupCommand) -> Result<(), CliError> {
    match group.command {
        GroupSubcommand::Create { image_ids } => print_json(&api.group(&image_ids).await?),
        GroupSubcommand::Delete { group_id } => {
            let released = api.ungroup(group_id).await?;
            println!("ungrouped {group_id}: {} images released", released.len());
            Ok(())
        }
    }
}

async fn run_chat(api: &ApiClient, chat: ChatCommand) -> Result<(), CliError> {
    match chat.command {
        ChatSubcommand::List { limit } => {
            for message in api.messages(limit).await? {
                println!("[{}] {}: {}", message.timestamp, message.sender, message.text);
            }
            Ok(())
        }
        ChatSubcommand::Send { text, sender } => print_json(&api.send(&text, sender.as_deref()).await?),
    }
}

async fn run_watch(api: &ApiClient, count: Option<usize>, idle: Option<Duration>) -> Result<(), CliError> {
    let url = api.ws_url()?;
    let (mut stream, _) = connect_async(url.as_str()).await?;
    eprintln!("watching {url}");

    let mut seen = 0_usize;
    while count.is_none_or(|limit| seen < limit) {
        let next = match idle {
            Some(limit) => match tokio::time::timeout(limit, stream.next()).await {
                Ok(next) => next,
                Err(_) => {
                    eprintln!("no frames for {}s; exiting", limit.as_secs());
                    break;
                }
            },
            None => stream.next().await,
        };
        let Some(message) = next else {
            break;
        };
        match message? {
            Message::Text(text) => match wire::decode_frame(text.as_str()) {
                Ok(frame) => {
                    println!("{}", describe(&frame));
                    seen = seen.saturating_add(1);
                }
                Err(e) => eprintln!("skipping undecodable frame: {e}"),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }
    Ok(())
}

/// One-line summary of a realtime frame.
fn describe(frame: &Frame) -> String {
    let detail = match &frame.event {
        CanvasEvent::CanvasState(s) | CanvasEvent::CanvasUpdate(s) => {
            format!("{} images, {} groups", s.images.len(), s.groups.len())
        }
        CanvasEvent::ChatMessage(m) => format!("{}: {}", m.sender, m.text),
        CanvasEvent::UserJoined(n) | CanvasEvent::UserLeft(n) => n.message.clone(),
        CanvasEvent::ImageAdded(img) => format!("{} at ({}, {}) {}x{}", img.id, img.x, img.y, img.w, img.h),
        CanvasEvent::ImageDeleted(d) => d.image_id.to_string(),
        CanvasEvent::ImagesGrouped(g) => format!("{} <- {}", g.id, join_ids(&g.image_ids)),
        CanvasEvent::ImagesUngrouped(u) => format!("{} -> {}", u.group_id, join_ids(&u.image_ids)),
    };
    format!("[{}] {detail}", frame.kind())
}

fn join_ids(ids: &[Uuid]) -> String {
    ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(", ")
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
