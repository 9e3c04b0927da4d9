use super::{App, stdin_lines};
use crate::chat::render::format_time;
use crate::chat::{ChatSession, RoomId};
use crate::error::ClientError;
use crate::models::{ChatMessage, UserId};

fn print_message(chat: &ChatSession, message: &ChatMessage) {
    let time = message
        .timestamp
        .as_ref()
        .map_or_else(|| "--:--".to_string(), format_time);
    println!("[{time}] {}: {}", chat.sender_name(message), message.content);
}

pub async fn cmd_chat(app: &App, user: UserId) -> anyhow::Result<()> {
    let me = app.require_login().await?;
    if user == me.id {
        anyhow::bail!("Pick someone other than yourself to chat with");
    }

    let room = RoomId::between(me.id, user);
    let result = ChatSession::enter(app.api(), &app.config.api.ws_url, room).await;
    app.flush_events();
    let mut chat = result?;
    // Frames that arrived between connecting and now.
    chat.drain_pending();

    let name = chat
        .profile(chat.counterpart())
        .map_or_else(|| format!("User {user}"), |p| p.username.clone());
    println!("Chat with {name} (room {})", chat.room());
    println!("{:-<60}", "");
    for message in chat.messages() {
        print_message(&chat, message);
    }
    println!("{:-<60}", "");
    println!("Type a message and press Enter. /quit to leave.");

    let mut lines = stdin_lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim() == "/quit" {
                    break;
                }
                let sent = chat.send(&line).await;
                app.flush_events();
                if matches!(sent, Err(ClientError::ChannelNotOpen | ClientError::Channel(_))) {
                    break;
                }
            }
            message = chat.next_message() => {
                let Some(message) = message.cloned() else {
                    println!("Connection closed. Run the command again to reconnect.");
                    break;
                };
                print_message(&chat, &message);
            }
        }
    }

    chat.close().await;
    Ok(())
}

pub async fn cmd_chats(app: &App) -> anyhow::Result<()> {
    app.require_login().await?;
    let conversations = app.api().conversations().await?;

    if conversations.is_empty() {
        println!("No conversations yet. Start one with: anitinder chat <user_id>");
        return Ok(());
    }

    println!("Conversations ({} total)", conversations.len());
    println!("{:-<60}", "");
    for conversation in conversations {
        println!("• {}", conversation.participants.join(", "));
        if let Some(room) = &conversation.room_name_1 {
            println!("  Room: {room}");
        }
        if let Some(last) = conversation.messages.last() {
            println!("  Last: {}", last.content);
        }
    }
    Ok(())
}
