//! Conversation commands and the interactive chat loop

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::StatusCode;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use super::signed_in;
use crate::agent::Agent;
use crate::api::{chat, sidebar};
use crate::app::App;
use crate::models::{Attachment, ChatReply, ChatRequest, ConversationMessage, ConversationSummary};
use crate::notify::Notice;

const TITLE_LEN: usize = 40;

fn format_time(created_at: &Option<chrono::DateTime<Utc>>) -> String {
    created_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "?".to_string())
}

fn print_messages(messages: &[ConversationMessage]) {
    if messages.is_empty() {
        println!("(no messages)");
        return;
    }
    for msg in messages {
        println!("[{}] {}", format_time(&msg.created_at), msg.text.trim());
    }
}

/// List the signed-in user's conversations (prints to stdout).
pub async fn list_chats(app: &mut App, limit: usize) -> Result<()> {
    signed_in(app)?;
    app.refresh_chats().await?;

    println!("\nRecent Chats:");
    println!("{:-<60}", "");

    let chats = app.chats().items();
    if chats.is_empty() {
        println!("  (no chats found)");
        return Ok(());
    }

    for c in chats.iter().take(limit) {
        println!("{}", if c.title.is_empty() { "(untitled)" } else { c.title.as_str() });
        println!("  ID:      {}", c.conversation);
        println!("  Created: {}", format_time(&c.created_at));
        println!();
    }

    Ok(())
}

pub async fn read_conversation(app: &App, conversation_id: &str, limit: usize) -> Result<()> {
    signed_in(app)?;
    let messages = sidebar::open_conversation(app.backend()?, conversation_id).await?;

    let skip = messages.len().saturating_sub(limit);
    print_messages(&messages[skip..]);
    Ok(())
}

/// One-shot message. Without `conversation` a new one is started.
pub async fn send(
    app: &App,
    conversation: Option<String>,
    message: &str,
    file: Option<PathBuf>,
) -> Result<()> {
    signed_in(app)?;
    let file = match file {
        Some(path) => Some(
            Attachment::from_path(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        None => None,
    };

    let request = ChatRequest {
        conversation,
        content: message.to_string(),
        file,
    };
    let reply = chat::send_message(app.backend()?, request).await?;
    print_reply(app.agent()?.agent(), &reply);
    Ok(())
}

fn print_reply(agent: Agent, reply: &ChatReply) {
    println!("\n{}: {}\n", agent, reply.reply.trim());
    if let Some(id) = &reply.conversation {
        tracing::debug!("Conversation {}", id);
    }
}

/// Input line of the chat loop
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Message(String),
    New,
    Open(String),
    Attach(PathBuf),
    Rename(String),
    Agent(Option<Agent>),
    List,
    Help,
    Quit,
    Invalid(String),
}

fn parse_line(line: &str) -> Option<ReplCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(ReplCommand::Message(line.to_string()));
    };

    let (cmd, arg) = match rest.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (rest, ""),
    };
    let parsed = match (cmd.to_ascii_lowercase().as_str(), arg) {
        ("quit" | "exit", _) => ReplCommand::Quit,
        ("new", _) => ReplCommand::New,
        ("list", _) => ReplCommand::List,
        ("help", _) => ReplCommand::Help,
        ("open", "") => ReplCommand::Invalid("usage: /open <conversation-id>".into()),
        ("open", id) => ReplCommand::Open(id.to_string()),
        ("attach", "") => ReplCommand::Invalid("usage: /attach <path>".into()),
        ("attach", path) => ReplCommand::Attach(PathBuf::from(path)),
        ("rename", "") => ReplCommand::Invalid("usage: /rename <title>".into()),
        ("rename", title) => ReplCommand::Rename(title.to_string()),
        ("agent", "") => ReplCommand::Agent(None),
        ("agent", name) => match name.parse::<Agent>() {
            Ok(agent) => ReplCommand::Agent(Some(agent)),
            Err(e) => ReplCommand::Invalid(e),
        },
        (other, _) => ReplCommand::Invalid(format!("unknown command '/{}'", other)),
    };
    Some(parsed)
}

/// Title for a freshly started conversation, from its first message.
fn provisional_title(content: &str) -> String {
    let title: String = content.chars().take(TITLE_LEN).collect();
    if content.chars().count() > TITLE_LEN {
        format!("{}...", title.trim_end())
    } else {
        title
    }
}

fn print_help() {
    println!("Commands:");
    println!("  /new              start a new conversation");
    println!("  /open <id>        continue an existing conversation");
    println!("  /list             list your conversations");
    println!("  /attach <path>    attach a file to the next message");
    println!("  /rename <title>   retitle the current conversation in the list");
    println!("  /agent [name]     switch between professor and hacker");
    println!("  /quit             leave");
}

/// Interactive chat loop
pub async fn run_chat(app: &mut App, conversation: Option<String>) -> Result<()> {
    signed_in(app)?;

    let mut active = conversation;
    let mut pending: Option<Attachment> = None;

    if let Some(id) = &active {
        let messages = sidebar::open_conversation(app.backend()?, id).await?;
        print_messages(&messages);
    }

    println!(
        "Chatting with {}. Type /help for commands.\n",
        app.agent()?.agent()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let Some(command) = parse_line(&input) else {
            continue;
        };

        match command {
            ReplCommand::Quit => break,
            ReplCommand::Help => print_help(),
            ReplCommand::Invalid(msg) => Notice::error("Error", msg).print(),
            ReplCommand::New => {
                active = None;
                println!("New conversation.\n");
            }
            ReplCommand::List => {
                let result = app.refresh_chats().await;
                match result {
                    Ok(()) => {
                        for c in app.chats().items() {
                            println!("  {}  {}", c.conversation, c.title);
                        }
                        println!();
                    }
                    Err(e) => Notice::from_api("Failed to load chats", &e).print(),
                }
            }
            ReplCommand::Open(id) => {
                let result = sidebar::open_conversation(app.backend()?, &id).await;
                match result {
                    Ok(messages) => {
                        if let Some(known) = app.chats().get(&id) {
                            println!("== {} ==", known.title);
                        }
                        print_messages(&messages);
                        active = Some(id);
                    }
                    Err(e) => {
                        if e.status() == Some(StatusCode::NOT_FOUND) && app.chats_mut().remove(&id) {
                            tracing::debug!("Dropped {} from the chat list", id);
                        }
                        Notice::from_api("Error", &e).print();
                    }
                }
            }
            ReplCommand::Attach(path) => match Attachment::from_path(&path) {
                Ok(file) => {
                    println!("Attached {} ({} bytes)", file.file_name, file.bytes.len());
                    pending = Some(file);
                }
                Err(e) => Notice::error("Error", format!("{}: {}", path.display(), e)).print(),
            },
            ReplCommand::Rename(title) => match &active {
                Some(id) if app.chats_mut().rename(id, &title) => {
                    println!("Renamed to {}.\n", title);
                }
                Some(_) => Notice::error("Error", "Conversation is not in the list. Try /list.").print(),
                None => Notice::error("Error", "No conversation open.").print(),
            },
            ReplCommand::Agent(choice) => {
                let ctx = app.agent_mut()?;
                match choice {
                    Some(agent) => ctx.set_agent(agent),
                    None => {
                        ctx.toggle();
                    }
                }
                println!("Now chatting with {}.\n", ctx.agent());
            }
            ReplCommand::Message(content) => {
                let request = ChatRequest {
                    conversation: active.clone(),
                    content: content.clone(),
                    file: pending.take(),
                };
                let result = chat::send_message(app.backend()?, request).await;
                match result {
                    Ok(reply) => {
                        print_reply(app.agent()?.agent(), &reply);
                        if active.is_none() {
                            if let Some(id) = reply.conversation {
                                app.chats_mut().add(ConversationSummary {
                                    conversation: id.clone(),
                                    title: provisional_title(&content),
                                    created_at: Some(Utc::now()),
                                });
                                active = Some(id);
                            }
                        }
                    }
                    Err(e) => Notice::from_api("Error", &e).print(),
                }
            }
        }
    }

    Ok(())
}
