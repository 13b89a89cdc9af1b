use anyhow::{Context, Result};
use chrono::Local;
use cliclack::{input, spinner};
use console::style;
use heron::agent::Agent;
use heron::errors::AgentError;
use heron::models::message::Message;
use heron::providers::factory;
use tracing::info;

use crate::session_file::{load_messages, persist_messages, session_path};
use crate::settings::Settings;
use crate::tools;

fn build_agent(settings: Settings, history: Vec<Message>) -> Result<Agent> {
    let agent_config = settings.agent.agent_config();
    let system_prompt = settings.agent.system_prompt.clone();
    let provider = factory::get_provider(settings.provider.into_config())?;
    let registry = tools::builtin_registry().context("failed to register built-in tools")?;

    Ok(Agent::new(provider)
        .with_system_prompt(system_prompt)
        .with_config(agent_config)
        .with_registry(registry)
        .with_history(history))
}

/// Run an interactive session, persisting history after every turn.
pub async fn start(settings: Settings, name: Option<String>) -> Result<()> {
    let name = name.unwrap_or_else(|| Local::now().format("session-%Y%m%d-%H%M%S").to_string());
    let session_file = session_path(&name)?;

    let history = if session_file.exists() {
        let messages = load_messages(&session_file)?;
        println!(
            "{}",
            style(format!(
                "Resuming session {} ({} messages)",
                name,
                messages.len()
            ))
            .dim()
        );
        messages
    } else {
        println!(
            "{}",
            style(format!(
                "Starting session {}. Recording to {}",
                name,
                session_file.display()
            ))
            .dim()
        );
        Vec::new()
    };

    let mut agent = build_agent(settings, history)?;
    info!(session = %name, tools = agent.registry().len(), "session ready");

    println!(
        "{}",
        style("Type \"exit\" to end the session.").dim()
    );

    loop {
        let message: String = input("Message:").placeholder("").multiline().interact()?;
        if message.trim().eq_ignore_ascii_case("exit") {
            break;
        }

        let spin = spinner();
        spin.start("awaiting reply");
        let reply = agent.chat(message.as_str()).await;
        spin.stop("");

        match reply {
            Ok(answer) => println!("{}\n", answer),
            Err(AgentError::MaxIterationsExceeded(limit)) => println!(
                "{}\n",
                style(format!(
                    "Gave up after {} iterations without a final answer.",
                    limit
                ))
                .yellow()
            ),
            Err(error) => println!("{}\n", style(format!("Error: {:#}", error)).red()),
        }

        persist_messages(&session_file, agent.history())?;
    }

    println!(
        "{}",
        style(format!("Session recorded to {}", session_file.display())).dim()
    );
    Ok(())
}

/// Send one message and print the reply.
pub async fn run_once(settings: Settings, message: &str) -> Result<()> {
    let mut agent = build_agent(settings, Vec::new())?;

    match agent.chat(message).await {
        Ok(answer) => {
            println!("{}", answer);
            Ok(())
        }
        Err(AgentError::MaxIterationsExceeded(limit)) => {
            anyhow::bail!("gave up after {} iterations without a final answer", limit)
        }
        Err(error) => Err(error.into()),
    }
}
