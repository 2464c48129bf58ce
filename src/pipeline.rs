/// The literal token separating pipeline stages.
pub const PIPE: &str = "|";

/// Splits a token list into pipeline segments on `|`.
///
/// Empty segments (leading, trailing or doubled pipes) are dropped, so every
/// returned segment starts with a command name.
pub fn split_pipeline(tokens: Vec<String>) -> Vec<Vec<String>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();

    for token in tokens {
        if token == PIPE {
            if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        } else {
            current.push(token);
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }

    segments
}
