//! A terminal chat that manages a user directory with a DIAL deployment.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;

use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use toolchat::input::read_line;
use toolchat::tools::{
    CreateUserTool, DeleteUserTool, GetUserByIdTool, SearchUsersTool,
    UpdateUserTool, UserServiceClient,
};
use toolchat_core::{ChatClientBuilder, Conversation, Message};
use toolchat_dial_model::{DialConfigBuilder, DialProvider};

const BAR_CHAR: &str = "▎";
const DEFAULT_USER_SERVICE_URL: &str = "http://localhost:8041";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = dotenvy::dotenv() {
        debug!("no .env file loaded: {err}");
    }

    let Ok(api_key) = env::var("DIAL_API_KEY") else {
        eprintln!("DIAL_API_KEY environment variable is not set");
        return;
    };
    let mut config = DialConfigBuilder::with_api_key(api_key);
    if let Ok(endpoint) = env::var("DIAL_ENDPOINT") {
        config = config.with_endpoint(endpoint);
    }
    if let Ok(deployment) = env::var("DIAL_DEPLOYMENT") {
        config = config.with_deployment(deployment);
    }
    let config = match config.build() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid DIAL configuration: {err}");
            return;
        }
    };
    let model_provider = match DialProvider::new(config) {
        Ok(provider) => provider,
        Err(err) => {
            eprintln!("failed to create the model provider: {err}");
            return;
        }
    };

    let user_service_url = env::var("USER_SERVICE_URL")
        .unwrap_or_else(|_| DEFAULT_USER_SERVICE_URL.to_owned());
    let user_service = match UserServiceClient::new(user_service_url) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("failed to create the user service client: {err}");
            return;
        }
    };

    let mut builder = ChatClientBuilder::with_model_provider(model_provider)
        .with_tool(GetUserByIdTool::new(user_service.clone()))
        .with_tool(SearchUsersTool::new(user_service.clone()))
        .with_tool(CreateUserTool::new(user_service.clone()))
        .with_tool(UpdateUserTool::new(user_service.clone()))
        .with_tool(DeleteUserTool::new(user_service))
        .on_content(|delta| {
            print!("{}", delta.bright_white());
            std::io::stdout().flush().ok();
        })
        .on_tool_result(print_tool_result);
    if let Ok(max_tool_rounds) = env::var("TOOLCHAT_MAX_TOOL_ROUNDS") {
        let Ok(max_tool_rounds) = max_tool_rounds.parse() else {
            eprintln!("TOOLCHAT_MAX_TOOL_ROUNDS must be a non-negative number");
            return;
        };
        builder = builder.with_max_tool_rounds(max_tool_rounds);
    }
    let client = match builder.build() {
        Ok(client) => client,
        Err(err) => {
            eprintln!("failed to register tools: {err}");
            return;
        }
    };
    info!("tools: {}", client.tool_names().collect::<Vec<_>>().join(", "));

    let mut conversation =
        Conversation::with_system_prompt(include_str!("./system_prompt.md"));

    let mut stdin = BufReader::new(io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line(&mut stdin).await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        conversation.push(Message::user(line));

        print!("{}🤖 ", BAR_CHAR.bright_cyan());
        match client.complete(&mut conversation).await {
            Ok(reply) => {
                println!();
                conversation.push(reply);
            }
            Err(err) => {
                println!();
                println!("{}{}", BAR_CHAR.bright_red(), err.red());
            }
        }
        println!("{}", "─".repeat(40).dimmed());
    }
}

fn print_tool_result(result: &Message) {
    let name = result.name.as_deref().unwrap_or_default();
    let content = result.content.as_deref().unwrap_or_default();
    let bar = BAR_CHAR.bright_yellow();
    println!();
    println!("{bar}{}", format!("FUNCTION '{name}'").bold());
    println!("{bar}{}", content.dimmed());
}
