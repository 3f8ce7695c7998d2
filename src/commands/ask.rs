use tracing::{info, warn};

use crate::state::Context;
use crate::verify::VerifiedAnswer;

/// Discord rejects messages over 2000 chars.
const CHUNK_LIMIT: usize = 1990;

/// Ask a question and get an answer with sources
#[poise::command(slash_command)]
pub async fn ask(
    ctx: Context<'_>,
    #[description = "Your question"] question: String,
) -> Result<(), anyhow::Error> {
    let Some(session) = ctx.data().sessions.get(ctx.author().id.get()).await else {
        ctx.say("Please log in to ask a question. Use `/factverify login`.")
            .await?;
        return Ok(());
    };

    // Completion plus a possible retry can take well over the 3s interaction window
    ctx.defer().await?;

    info!(user = ctx.author().name, email = session.email, "Question received");

    let text = match ctx.data().engine.get_verified_answer(&question).await {
        Ok(answer) => {
            info!(
                citations = answer.citations.len(),
                retried = answer.retried,
                "Answer delivered"
            );
            format_answer(&question, &answer)
        }
        Err(e) => {
            warn!(error = %e, "Answer retrieval failed");
            format!("**Q:** {}\n\nCould not get an answer: {}", question, e)
        }
    };

    for chunk in split_chunks(&text, CHUNK_LIMIT) {
        ctx.say(chunk).await?;
    }
    Ok(())
}

fn format_answer(question: &str, answer: &VerifiedAnswer) -> String {
    let mut out = format!("**Q:** {}\n\n**A:** {}\n\n", question, answer.answer_text);

    if answer.citations.is_empty() {
        out.push_str("No sources found.");
    } else {
        out.push_str("**Sources:**\n");
        for (i, citation) in answer.citations.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, citation.text));
        }
        if answer.retried {
            out.push_str("_Sources were requested in a follow-up to the original answer._\n");
        }
        out.push_str(
            "_Sources are checked for format only. Confirm they exist and support the answer._",
        );
    }
    out
}

/// Split on the last newline (else space) before `max`, never inside a char.
fn split_chunks(text: &str, max: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        let mut chunk_len = remaining.len().min(max);
        while !remaining.is_char_boundary(chunk_len) {
            chunk_len -= 1;
        }
        if chunk_len == 0 {
            chunk_len = remaining.chars().next().map_or(0, char::len_utf8);
        }
        let split_at = if chunk_len < remaining.len() {
            remaining[..chunk_len]
                .rfind('\n')
                .or_else(|| remaining[..chunk_len].rfind(' '))
                .map(|i| i + 1)
                .unwrap_or(chunk_len)
        } else {
            chunk_len
        };
        chunks.push(&remaining[..split_at]);
        remaining = &remaining[split_at..];
    }
    chunks
}
