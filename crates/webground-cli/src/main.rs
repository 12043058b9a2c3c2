use std::io::{self, Read, Write};

use anyhow::{bail, Context, Result};
use clap::Parser;
use console::style;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use webground::models::message::{ChatMessage, ChatRequest};
use webground::relay::{consume_response, ClientMessageState};

#[derive(Parser)]
#[command(author, version, about = "Ask a webground server a question", long_about = None)]
struct Cli {
    /// Chat completions endpoint of the server
    #[arg(long, default_value = "http://127.0.0.1:3000/v1/chat/completions")]
    url: String,

    /// Ground the answer in a web search
    #[arg(short, long)]
    network: bool,

    /// Model to use (the server's default when omitted)
    #[arg(short, long)]
    model: Option<String>,

    /// Optional system message sent before the question
    #[arg(long)]
    system: Option<String>,

    /// Do not print the model's reasoning
    #[arg(long)]
    hide_thinking: bool,

    /// The question; read from stdin when omitted
    message: Vec<String>,
}

impl Cli {
    fn question(&self) -> Result<String> {
        let question = if self.message.is_empty() {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("reading question from stdin")?;
            buffer
        } else {
            self.message.join(" ")
        };

        let question = question.trim().to_string();
        if question.is_empty() {
            bail!("no question given");
        }
        Ok(question)
    }

    fn request(&self, question: String) -> ChatRequest {
        let mut messages = Vec::new();
        if let Some(system) = &self.system {
            messages.push(ChatMessage::system(system.as_str()));
        }
        messages.push(ChatMessage::user(question));

        let request = ChatRequest::new(messages).with_network(self.network);
        match &self.model {
            Some(model) => request.with_model(model.as_str()),
            None => request,
        }
    }
}

/// Prints only what each cumulative update added since the previous one
#[derive(Default)]
struct Renderer {
    hide_thinking: bool,
    think_printed: usize,
    answer_printed: usize,
}

impl Renderer {
    fn new(hide_thinking: bool) -> Self {
        Self {
            hide_thinking,
            ..Self::default()
        }
    }

    /// Returns the (thinking, answer) text not yet shown
    fn advance<'a>(&mut self, state: &'a ClientMessageState) -> (&'a str, &'a str) {
        // Buffers only ever grow, so the printed prefix stays valid
        let think = state.think.get(self.think_printed..).unwrap_or_default();
        let answer = state.content.get(self.answer_printed..).unwrap_or_default();
        self.think_printed = state.think.len();
        self.answer_printed = state.content.len();

        if self.hide_thinking {
            ("", answer)
        } else {
            (think, answer)
        }
    }

    fn render(&mut self, state: &ClientMessageState) {
        let (think, answer) = self.advance(state);
        if !think.is_empty() {
            print!("{}", style(think).dim());
        }
        if !answer.is_empty() {
            if self.answer_printed == answer.len() && self.think_printed > 0 && !self.hide_thinking
            {
                // First answer text after reasoning
                println!("\n");
            }
            print!("{}", answer);
        }
        let _ = io::stdout().flush();
    }
}

fn print_sources(state: &ClientMessageState) {
    if state.sources.is_empty() {
        return;
    }
    println!("\n\n{}", style("Sources:").bold());
    for (i, source) in state.sources.iter().enumerate() {
        println!(
            "  {} {} {}",
            style(format!("[{}]", i + 1)).cyan(),
            source.title,
            style(&source.url).dim()
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let question = cli.question()?;
    let request = cli.request(question);

    // Ctrl-C aborts the answer instead of killing the terminal mid-line
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    debug!(url = %cli.url, network = cli.network, "sending chat request");
    if cli.network {
        eprintln!("{}", style("searching the web...").dim());
    }

    let response = tokio::select! {
        _ = cancel.cancelled() => {
            eprintln!("{}", style("cancelled").yellow());
            return Ok(());
        }
        response = reqwest::Client::new().post(&cli.url).json(&request).send() => {
            response.with_context(|| format!("could not reach {}", cli.url))?
        }
    };

    let mut renderer = Renderer::new(cli.hide_thinking);
    match consume_response(response, &cancel, |state| renderer.render(state)).await {
        Some(state) => {
            print_sources(&state);
            println!();
        }
        None => {
            println!();
            eprintln!("{}", style("cancelled").yellow());
        }
    }
    Ok(())
}
