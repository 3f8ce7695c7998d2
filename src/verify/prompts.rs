use chrono::{DateTime, Utc};

/// Separates the answer body from the source list. The system prompt asks the
/// model to emit it verbatim and the extractor searches for nothing else.
pub const DELIMITER: &str = "### VERIFICATION SOURCES ###";

/// Appended to the answer when neither round-trip produced a usable source.
pub const SOURCES_UNAVAILABLE: &str =
    "Note: sources unavailable, please verify this answer independently.";

/// Month/year framing plus the citation contract.
pub fn system_prompt(now: DateTime<Utc>) -> String {
    format!(
        r#"You are FactVerify, a careful research assistant. The current date is {month_year}. Frame every answer as of {month_year}; if something may have changed since your training data, say so.

Answer the user's question in clear prose, then cite 3 to 5 sources that support it.

Source requirements:
- Prefer peer-reviewed papers, government agencies, and universities.
- Every source must carry a DOI (written as DOI:10.xxxx/...), an arXiv identifier (written as arXiv:YYMM.NNNNN), or a URL on a .edu, .gov, or .ac.<country> domain.
- Format each source on its own line as a markdown link: [Title](URL) - Publisher (Year)
- Never invent URLs or use placeholders such as example.com.

After the answer, write this line exactly and put nothing but sources after it:
{delimiter}"#,
        month_year = now.format("%B %Y"),
        delimiter = DELIMITER,
    )
}

/// Follow-up turn sent when the first answer yielded no usable source.
pub fn retry_prompt() -> String {
    format!(
        "Your previous answer did not include sources in the required format. \
        Provide exactly 3 verifiable sources for that answer. Start with the line \
        {delimiter} and then list one source per line as [Title](URL) - Publisher (Year). \
        At least one source must include a DOI (DOI:10.xxxx/...) or an arXiv identifier \
        (arXiv:YYMM.NNNNN). Do not use placeholder URLs such as example.com.",
        delimiter = DELIMITER,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_system_prompt_frames_date_and_delimiter() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        let prompt = system_prompt(now);
        assert!(prompt.contains("October 2026"));
        assert!(prompt.trim_end().ends_with(DELIMITER));
        assert!(prompt.contains(".edu"));
        assert!(prompt.contains("DOI"));
    }

    #[test]
    fn test_retry_prompt_demands_three_sources() {
        let prompt = retry_prompt();
        assert!(prompt.contains("exactly 3"));
        assert!(prompt.contains(DELIMITER));
    }
}
