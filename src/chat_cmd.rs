//! One-shot chat from the command line.

use anyhow::Result;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::PipelineError;

/// Run the chat command: answer one message and print answer, sources,
/// and (optionally) the decision trace.
pub async fn run_chat(config: &Config, message: &str, show_trace: bool) -> Result<()> {
    let engine = Engine::build(config.clone())?;

    let result = match engine.chat(message).await {
        Ok(result) => result,
        Err(PipelineError::NotConfigured(reason)) => {
            anyhow::bail!(
                "No LLM provider available: {}. Configure llm.provider = \"openai\" with \
                 OPENAI_API_KEY set, or enable demo mode with llm.provider = \"mock\" and \
                 llm.allow_mock = true.",
                reason
            );
        }
        Err(err) => return Err(err.into()),
    };

    println!("{}", result.answer);

    if !result.sources.is_empty() {
        println!();
        println!("Sources:");
        for (i, source) in result.sources.iter().enumerate() {
            println!(
                "  {}. [{:.2}] {} / {}",
                i + 1,
                source.score,
                source.doc_id,
                source.title
            );
            println!("     excerpt: \"{}\"", source.snippet.replace('\n', " "));
        }
    }

    if let Some(reason) = &result.meta.fallback_reason {
        println!();
        println!("note: {}", reason);
    }

    if show_trace && !result.trace.is_empty() {
        println!();
        println!("Trace:");
        for entry in &result.trace {
            println!(
                "  {}. {:<10} {:>5}ms  in: {}  out: {}",
                entry.step, entry.stage, entry.elapsed_ms, entry.input_summary, entry.output_summary
            );
        }
    }

    Ok(())
}
