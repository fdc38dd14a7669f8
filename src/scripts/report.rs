// src/scripts/report.rs
use anyhow::{Context, Result};
use log::info;
use std::io::{self, BufRead, Write};

use crate::config::{BoardConfig, LabelLookup};
use crate::points::{self, SprintReport};
use crate::scripts::init::print_setup_instructions;
use crate::table::{self, OutputFormat};
use crate::trello::TrelloClient;

const PROMPT: &str = "Please enter sprint number";
const EXIT_COMMAND: &str = "exit";

/// Reads one sprint token from `input`. `None` when the user typed `exit` or input ended.
pub fn read_sprint_token<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Option<String>> {
    writeln!(output, "{}", PROMPT)?;
    output.flush()?;
    loop {
        let mut line = String::new();
        if input.read_line(&mut line).context("Failed to read from stdin")? == 0 {
            return Ok(None);
        }
        let token = line.trim();
        if token == EXIT_COMMAND {
            writeln!(output, "User input complete, program exit.")?;
            return Ok(None);
        }
        if token.is_empty() {
            writeln!(output, "{}", PROMPT)?;
            output.flush()?;
            continue;
        }
        return Ok(Some(token.to_string()));
    }
}

/// Reads the prompt on tokio's blocking pool.
pub async fn prompt_sprint_token<R, W>(mut input: R, mut output: W) -> Result<Option<String>>
where
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
{
    tokio::task::spawn_blocking(move || read_sprint_token(&mut input, &mut output))
        .await
        .context("Sprint prompt task failed")?
}

pub fn render_report(report: &SprintReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => table::render_json(report),
        OutputFormat::Table if report.lists.is_empty() => Ok(format!(
            "⚠️  No lists matching \"{}\" on board {}",
            report.sprint, report.board_id
        )),
        OutputFormat::Table => Ok(format!(
            "🏃 Sprint \"{}\" ({})\n{}",
            report.sprint,
            report.lists.join(", "),
            table::render_table(&report.rows)
        )),
    }
}

pub async fn run(
    sprint: Option<String>,
    format: OutputFormat,
    label_lookup: Option<LabelLookup>,
) -> Result<()> {
    let config = BoardConfig::load().context("Failed to load board configuration")?;
    if !config.any_exists() {
        print_setup_instructions();
        return Ok(());
    }
    let mut cfg = config.resolve()?;
    if let Some(lookup) = label_lookup {
        cfg.label_lookup = lookup;
    }

    let sprint = match sprint.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
        Some(sprint) => sprint,
        None => {
            let input = io::BufReader::new(io::stdin());
            match prompt_sprint_token(input, io::stdout()).await? {
                Some(token) => token,
                None => return Ok(()),
            }
        }
    };

    let client = TrelloClient::new(&cfg)?;
    let report = points::run_pipeline(&client, &cfg.board_id, &sprint, cfg.label_lookup)
        .await
        .with_context(|| format!("Failed to build the report for sprint '{}'", sprint))?;
    info!("Report ready: {} rows", report.rows.len());

    println!("{}", render_report(&report, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ResultRow;
    use chrono::Utc;
    use std::io::Cursor;

    fn prompt(input: &str) -> (Option<String>, String) {
        let mut reader = Cursor::new(input.as_bytes().to_vec());
        let mut output = Vec::new();
        let token = read_sprint_token(&mut reader, &mut output).unwrap();
        (token, String::from_utf8(output).unwrap())
    }

    fn report(lists: &[&str], rows: Vec<ResultRow>) -> SprintReport {
        SprintReport {
            sprint: "3".to_string(),
            board_id: "b1".to_string(),
            lists: lists.iter().map(|l| l.to_string()).collect(),
            rows,
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_read_sprint_token_trims_line() {
        let (token, output) = prompt("  12 \n");
        assert_eq!(token.as_deref(), Some("12"));
        assert_eq!(output, "Please enter sprint number\n");
    }

    #[test]
    fn test_read_sprint_token_exit() {
        let (token, output) = prompt("exit\n3\n");
        assert_eq!(token, None);
        assert!(output.ends_with("User input complete, program exit.\n"));
    }

    #[test]
    fn test_read_sprint_token_reprompts_on_blank_line() {
        let (token, output) = prompt("\n   \nSprint 4\n");
        assert_eq!(token.as_deref(), Some("Sprint 4"));
        assert_eq!(output.matches(PROMPT).count(), 3);
    }

    #[test]
    fn test_read_sprint_token_eof() {
        let (token, _) = prompt("");
        assert_eq!(token, None);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_prompt_sprint_token_on_blocking_pool() {
        let input = Cursor::new(b"\nSprint 7\n".to_vec());
        let token = prompt_sprint_token(input, io::sink()).await.unwrap();
        assert_eq!(token.as_deref(), Some("Sprint 7"));

        let token = prompt_sprint_token(Cursor::new(b"exit\n".to_vec()), io::sink()).await.unwrap();
        assert_eq!(token, None);
    }

    #[test]
    fn test_render_report_no_matching_lists() {
        let text = render_report(&report(&[], vec![]), OutputFormat::Table).unwrap();
        assert!(text.contains("No lists matching \"3\" on board b1"));
    }

    #[test]
    fn test_render_report_table_lists_sprint_lists() {
        let rows = vec![ResultRow { label_name: "Backend".to_string(), points: 2 }];
        let text = render_report(&report(&["Sprint 3 - Doing", "Sprint 3 - Done"], rows), OutputFormat::Table)
            .unwrap();
        assert!(text.starts_with("🏃 Sprint \"3\" (Sprint 3 - Doing, Sprint 3 - Done)\n┌"));
        assert!(text.contains("│ Backend   │"));
    }

    #[test]
    fn test_render_report_json_even_when_empty() {
        let text = render_report(&report(&[], vec![]), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["rows"], serde_json::json!([]));
    }
}
