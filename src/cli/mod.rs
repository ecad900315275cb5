pub mod commands;

use anyhow::Context;
use std::io::{self, Write};
use std::path::Path;

use crate::cli::commands::{ChatAction, Commands, PdfAction, UserAction};
use crate::client::voice::{synthesizer_from_config, Dictation, UnsupportedRecognizer};
use crate::client::{ApiClient, ChatBackend, ChatMessage, ChatView, RecentQueries};
use crate::config::AppConfig;
use crate::db::get_connection;

pub async fn run_cli(command: Commands, config_path: String) -> anyhow::Result<()> {
    let config = AppConfig::load(&config_path).context("Failed to load config")?;

    match command {
        Commands::Serve => {
            anyhow::bail!("Serve command should be intercepted by main.rs to boot actix-web");
        }
        Commands::Chats { action } => {
            let client = ApiClient::from_config(&config.client);
            match action {
                ChatAction::List => {
                    let chats = client.list_chats().await?;
                    if chats.is_empty() {
                        println!("No chats found.");
                    } else {
                        println!("{:<40} | {:<26} | {}", "Chat ID", "Started", "First query");
                        println!("{:-<40}-+-{:-<26}-+-{:-<20}", "", "", "");
                        for c in chats {
                            println!("{:<40} | {:<26} | {}", c.chat_id, c.created_at, c.query);
                        }
                    }
                }
                ChatAction::Show { chat_id } => {
                    let history = client.chat_history(&chat_id).await?;
                    if history.is_empty() {
                        println!("Chat {} has no messages.", chat_id);
                    }
                    for record in history {
                        print_message(&ChatMessage::from(record));
                    }
                }
                ChatAction::Delete { chat_id } => {
                    let res = client.delete_chat(&chat_id).await?;
                    println!("{}", res.message);
                }
            }
        }
        Commands::User { action } => {
            let mut client = ApiClient::from_config(&config.client);
            match action {
                UserAction::Signup {
                    username,
                    email,
                    password,
                } => {
                    let res = client.signup(&username, &email, &password).await?;
                    println!("{}", res.message);
                }
                UserAction::Login { username, password } => {
                    let res = client.login(&username, &password).await?;
                    println!("{} (user {})", res.message, res.user_id);
                    println!("Token: {}", res.token);
                    println!("Expires: {}", res.expires_at);
                }
            }
        }
        Commands::Pdf { action } => match action {
            PdfAction::Import { path, name } => {
                let contents =
                    std::fs::read(&path).with_context(|| format!("Failed to read {}", path))?;
                let name = match name {
                    Some(n) => n,
                    None => Path::new(&path)
                        .file_stem()
                        .map(|s| s.to_string_lossy().to_string())
                        .context("Cannot derive a PDF name from the path")?,
                };
                let pool = get_connection(&config.database).await?;
                pool.put_pdf(&name, &contents).await?;
                pool.close().await;
                println!("Stored {} ({} bytes)", name, contents.len());
            }
        },
        Commands::Chat { chat } => {
            run_repl(chat, config).await?;
        }
    }

    Ok(())
}

fn print_message(msg: &ChatMessage) {
    println!("\nYou> {}", msg.query);
    println!("Navigator> {}", msg.answer);

    let c = &msg.citations;
    for r in &c.pdf_references {
        let pages: Vec<String> = r.page_numbers.iter().map(|p| p.to_string()).collect();
        println!("  [pdf] {} p. {}", r.pdf_name, pages.join(", "));
    }
    for url in &c.online_images {
        println!("  [image] {}", url);
    }
    if !c.similar_images.is_empty() {
        println!("  [similar images] {}", c.similar_images.len());
    }
    for id in &c.online_videos {
        println!("  [video] https://www.youtube.com/watch?v={}", id);
    }
}

fn print_links<B: ChatBackend>(view: &ChatView<B>) {
    let Some(msg) = view.visible() else {
        return;
    };
    for url in &msg.citations.online_links {
        match view.link_metadata(url) {
            Some(meta) => println!("  [link] {} <{}>", meta.title, url),
            None => println!("  [link] {}", url),
        }
    }
}

async fn run_repl(chat: Option<String>, config: AppConfig) -> anyhow::Result<()> {
    let recent = match config.client.recent_queries_file() {
        Some(path) => RecentQueries::load(path, config.client.recent_queries_cap),
        None => RecentQueries::in_memory(config.client.recent_queries_cap),
    };
    let mut view = ChatView::new(ApiClient::from_config(&config.client), recent);
    let synthesizer = synthesizer_from_config(&config.voice);
    let mut dictation = Dictation::new(UnsupportedRecognizer);

    if let Err(e) = view.refresh_chat_list().await {
        eprintln!("Could not load chats: {}", e);
    }
    if let Some(chat_id) = chat {
        if let Err(e) = view.select(&chat_id).await {
            eprintln!("Could not open chat {}: {}", chat_id, e);
        }
        for msg in view.transcript() {
            print_message(msg);
        }
    }

    println!("--- Compliance Navigator ---");
    println!("Type a question, or /help for commands.");
    println!("----------------------------");

    loop {
        match view.selected_chat() {
            Some(id) => print!("\n[{}] > ", id),
            None => print!("\n[new chat] > "),
        }
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let text = input.trim();
        if text.is_empty() {
            continue;
        }

        let mut words = text.split_whitespace();
        match words.next().unwrap_or_default() {
            "/exit" | "/quit" => break,
            "/help" => {
                println!("/new              start a new chat");
                println!("/chats            list chats");
                println!("/open <id>        open a chat");
                println!("/delete <id>      delete a chat");
                println!("/recent           recent queries");
                println!("/links            links of the current answer");
                println!("/speak            read the current answer aloud");
                println!("/listen           toggle dictation");
                println!("/login <u> <p>    sign in");
                println!("/exit             quit");
            }
            "/new" => view.new_chat(),
            "/chats" => {
                if view.refresh_chat_list().await.is_ok() {
                    for c in view.chat_list() {
                        println!("{}  {}", c.chat_id, c.query);
                    }
                }
            }
            "/open" => match words.next() {
                Some(id) => match view.select(id).await {
                    Ok(()) => {
                        for msg in view.transcript() {
                            print_message(msg);
                        }
                    }
                    Err(e) => eprintln!("Could not open chat: {}", e),
                },
                None => eprintln!("Usage: /open <chat id>"),
            },
            "/delete" => match words.next() {
                Some(id) => match view.delete(id).await {
                    Ok(()) => println!("Deleted {}", id),
                    Err(e) => eprintln!("Could not delete chat: {}", e),
                },
                None => eprintln!("Usage: /delete <chat id>"),
            },
            "/recent" => {
                for q in view.recent_queries() {
                    println!("  {}", q);
                }
            }
            "/links" => print_links(&view),
            "/speak" => match view.visible() {
                Some(msg) => {
                    if let Err(e) = synthesizer.speak(&msg.answer) {
                        eprintln!("{}", e);
                    }
                }
                None => eprintln!("Nothing to read yet."),
            },
            "/listen" => match dictation.toggle() {
                Ok(true) => println!("Listening..."),
                Ok(false) => println!("Stopped listening."),
                Err(e) => eprintln!("{}", e),
            },
            "/login" => match (words.next(), words.next()) {
                (Some(u), Some(p)) => match view.backend_mut().login(u, p).await {
                    Ok(res) => println!("{}", res.message),
                    Err(e) => eprintln!("Login failed: {}", e),
                },
                _ => eprintln!("Usage: /login <username> <password>"),
            },
            _ => match view.submit(text).await {
                Ok(()) => {
                    if let Some(msg) = view.visible() {
                        print_message(msg);
                    }
                    print_links(&view);
                }
                Err(e) => eprintln!("Query failed: {}", e),
            },
        }
    }

    Ok(())
}
