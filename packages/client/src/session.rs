//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use idobata_server::{domain::ServerEvent, infrastructure::dto::websocket::ClientEvent};

use crate::{
    command::{self, Command},
    error::ClientError,
    formatter::MessageFormatter,
    ui::redisplay_prompt,
};

/// Run the WebSocket client session
pub async fn run_client_session(
    url: &str,
    username: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|e| Box::new(ClientError::ConnectionError(e.to_string())))?;

    tracing::info!("Connected to chat server!");
    println!(
        "\nYou are '{}'. Type messages and press Enter to send.\n\
         Commands: /join <room>, /leave, /pm <connection-id> <text>, /typing <on|off>, /quit.\n",
        username
    );

    let (mut write, mut read) = ws_stream.split();

    // Identify ourselves before anything else
    let join_event = ClientEvent::UserJoin {
        username: username.to_string(),
    };
    write
        .send(Message::Text(serde_json::to_string(&join_event)?.into()))
        .await?;

    // Clone username for read task
    let username_for_read = username.to_string();

    // Spawn a task to handle incoming events
    let mut read_task = tokio::spawn(async move {
        let mut connection_error = false;

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => {
                            let formatted =
                                MessageFormatter::format_event(&event, &username_for_read);
                            if !formatted.is_empty() {
                                print!("{}", formatted);
                                redisplay_prompt(&username_for_read);
                            }
                        }
                        // If parsing fails, display as raw text
                        Err(_) => {
                            print!("{}", MessageFormatter::format_raw_message(&text));
                            redisplay_prompt(&username_for_read);
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    connection_error = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    connection_error = true;
                    break;
                }
                _ => {}
            }
        }

        connection_error
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let prompt_name = username.to_string();
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", prompt_name);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Spawn a task to map REPL input to client events and send them
    let mut write_task = tokio::spawn(async move {
        // The room joined most recently; plain input goes here
        let mut current_room: Option<String> = None;
        let mut write_error = false;

        while let Some(line) = input_rx.recv().await {
            let parsed = match command::parse(&line) {
                Ok(parsed) => parsed,
                Err(hint) => {
                    println!("{}", hint);
                    continue;
                }
            };

            let event = match parsed {
                Command::Quit => break,
                Command::Join(room) => {
                    current_room = Some(room.clone());
                    ClientEvent::JoinRoom { room }
                }
                Command::Leave => match current_room.take() {
                    Some(room) => ClientEvent::LeaveRoom { room },
                    None => {
                        println!("(not in a room)");
                        continue;
                    }
                },
                Command::Say(message) => match &current_room {
                    Some(room) => ClientEvent::SendRoomMessage {
                        room: room.clone(),
                        message,
                    },
                    None => ClientEvent::SendMessage { message },
                },
                Command::PrivateMessage { to, message } => {
                    ClientEvent::PrivateMessage { to, message }
                }
                Command::Typing(is_typing) => match &current_room {
                    Some(room) => ClientEvent::Typing {
                        room: room.clone(),
                        is_typing,
                    },
                    None => {
                        println!("(not in a room)");
                        continue;
                    }
                },
            };

            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize event: {}", e);
                    continue;
                }
            };

            if let Err(e) = write.send(Message::Text(json.into())).await {
                tracing::warn!("Failed to send event: {}", e);
                write_error = true;
                break;
            }
        }

        write_error
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            let connection_error = read_result.unwrap_or(false);
            if connection_error {
                return Err(Box::new(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                )));
            }
        }
        write_result = &mut write_task => {
            read_task.abort();
            let write_error = write_result.unwrap_or(false);
            if write_error {
                return Err(Box::new(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                )));
            }
        }
    }

    Ok(())
}
