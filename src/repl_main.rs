use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use finchat_backend::core::config::AppConfig;
use finchat_backend::logging;
use finchat_backend::pipeline::is_exit_phrase;
use finchat_backend::state::AppState;

const PROMPT: &str = "Ask a question about financial decisions (or type 'exit'): ";

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_terminal();

    let config = AppConfig::from_env()?;
    println!("\n[1] Loading vector store...");
    let state = AppState::initialize(config).await?;
    println!("[2] Ready! You can now ask questions about financial decisions.\n");

    let mut editor = DefaultEditor::new()?;
    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };

        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(query);

        if is_exit_phrase(query) {
            break;
        }

        let answer = state.orchestrator.answer_gated(query).await;
        println!("\nAnswer: {}\n", answer);
    }

    Ok(())
}
