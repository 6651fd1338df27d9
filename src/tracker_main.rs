use std::env;
use std::time::Duration;

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use finchat_backend::core::config::AppConfig;
use finchat_backend::llm::{GeminiProvider, LlmProvider};
use finchat_backend::logging;
use finchat_backend::tracker::{
    calculate_loan, query_context, today, ExpenseEntry, ExpenseLog, DEFAULT_EXPENSE_FILE, EMI,
    LOAN_AMOUNT, MONTHLY_RATE,
};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_terminal();

    let config = AppConfig::from_env()?;
    let llm = GeminiProvider::new(
        config.google_api_key.clone(),
        config.gemini_model.clone(),
        config.embed_model.clone(),
        Duration::from_secs(config.http_timeout_secs),
    )?;

    let log_path =
        env::var("FINCHAT_EXPENSE_FILE").unwrap_or_else(|_| DEFAULT_EXPENSE_FILE.to_string());
    let log = ExpenseLog::new(log_path);
    log.initialize()?;

    // Seed a fresh ledger with one opening entry.
    if log.load()?.is_empty() {
        log.append(&ExpenseEntry {
            date: today(),
            income: 3000.0,
            rent: 1000.0,
            groceries: 400.0,
            entertainment: 300.0,
            emi: EMI,
            prepayment: 0.0,
            principal: LOAN_AMOUNT,
            interest: LOAN_AMOUNT * MONTHLY_RATE,
        })?;
    }

    let mut editor = DefaultEditor::new()?;
    loop {
        println!("\nExpense Tracker Menu:");
        println!("1. Add Expense");
        println!("2. Query System");
        println!("3. Exit");

        let Some(choice) = read_line(&mut editor, "Choose an option: ")? else {
            break;
        };

        match choice.trim() {
            "1" => {
                if add_expense(&mut editor, &log)? {
                    println!("Expense saved.");
                }
            }
            "2" => {
                let Some(query) = read_line(
                    &mut editor,
                    "Enter your query (e.g., 'Can I prepay $100 this month?'): ",
                )?
                else {
                    break;
                };
                let context = query_context(&log.raw_history()?, query.trim());
                match llm.generate(&context).await {
                    Ok(text) => println!("System Response: {}", text),
                    Err(err) => println!("Error generating response with {}: {}", llm.name(), err),
                }
            }
            "3" => {
                println!("Exiting...");
                break;
            }
            _ => println!("Invalid choice."),
        }
    }

    Ok(())
}

fn add_expense(editor: &mut DefaultEditor, log: &ExpenseLog) -> Result<bool> {
    let Some(income) = read_amount(editor, "Income: ")? else {
        return Ok(false);
    };
    let Some(rent) = read_amount(editor, "Rent: ")? else {
        return Ok(false);
    };
    let Some(groceries) = read_amount(editor, "Groceries: ")? else {
        return Ok(false);
    };
    let Some(entertainment) = read_amount(editor, "Entertainment: ")? else {
        return Ok(false);
    };
    let Some(prepayment) = read_amount(editor, "Prepayment (0 if none): ")? else {
        return Ok(false);
    };

    let principal = log
        .load()?
        .last()
        .map(|entry| entry.principal)
        .unwrap_or(LOAN_AMOUNT);
    let (new_principal, interest) = calculate_loan(principal, prepayment);

    log.append(&ExpenseEntry {
        date: today(),
        income,
        rent,
        groceries,
        entertainment,
        emi: EMI,
        prepayment,
        principal: new_principal,
        interest,
    })?;

    Ok(true)
}

fn read_line(editor: &mut DefaultEditor, prompt: &str) -> Result<Option<String>> {
    match editor.readline(prompt) {
        Ok(line) => Ok(Some(line)),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn read_amount(editor: &mut DefaultEditor, prompt: &str) -> Result<Option<f64>> {
    loop {
        let Some(line) = read_line(editor, prompt)? else {
            return Ok(None);
        };
        match line.trim().parse::<f64>() {
            Ok(value) => return Ok(Some(value)),
            Err(_) => println!("Please enter a number."),
        }
    }
}
