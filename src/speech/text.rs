//! Text preparation for speech synthesis
//!
//! Gemini answers are Markdown. The speech engine should read the words, not
//! the decoration, so headings, emphasis, bullets, links and code blocks are
//! flattened into plain sentences before synthesis.

/// Characters kept besides letters, digits and whitespace
const SPOKEN_PUNCTUATION: &str = ".,!?;:'-\"¿¡()%";

/// Flatten Markdown into plain text suitable for TTS
pub fn normalize_text_for_speech(text: &str) -> String {
    let mut sentences: Vec<String> = Vec::new();
    let mut in_code_block = false;

    for raw_line in text.lines() {
        let line = raw_line.trim();

        if line.starts_with("```") {
            in_code_block = !in_code_block;
            continue;
        }
        if in_code_block || line.is_empty() {
            continue;
        }

        let line = strip_line_prefix(line);
        let line = replace_links(line);
        let line: String = line
            .chars()
            .filter(|c| !matches!(c, '*' | '_' | '`' | '~' | '#' | '>' | '|'))
            .collect();
        let line: String = line
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace() || SPOKEN_PUNCTUATION.contains(*c))
            .collect();
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            continue;
        }

        // Pause between list items and headings
        if line.ends_with(['.', '!', '?', ':', ';']) {
            sentences.push(line);
        } else {
            sentences.push(format!("{}.", line));
        }
    }

    sentences.join(" ")
}

/// Split normalized text into sentences for incremental synthesis
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?' | ';') {
            let at_boundary = chars.peek().map_or(true, |next| next.is_whitespace());
            if at_boundary {
                let sentence = current.trim();
                if !sentence.is_empty() {
                    sentences.push(sentence.to_string());
                }
                current.clear();
            }
        }
    }

    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }

    sentences
}

/// Remove heading markers, quote markers and bullets from the start of a line
fn strip_line_prefix(line: &str) -> &str {
    let line = line.trim_start_matches(['#', '>']).trim_start();
    for bullet in ["- ", "* ", "+ ", "• "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return rest.trim_start();
        }
    }
    line
}

/// Replace `[label](target)` with `label`
fn replace_links(line: &str) -> String {
    let mut result = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(open) = rest.find('[') {
        let Some(close_rel) = rest[open..].find("](") else {
            break;
        };
        let close = open + close_rel;
        let Some(end_rel) = rest[close + 2..].find(')') else {
            break;
        };
        result.push_str(&rest[..open]);
        result.push_str(&rest[open + 1..close]);
        rest = &rest[close + 2 + end_rel + 1..];
    }

    result.push_str(rest);
    result
}
