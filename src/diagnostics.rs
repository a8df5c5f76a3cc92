use crate::span::Span;

pub fn render(source: &str, kind: &str, span: Span, message: &str, hint: Option<&str>) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let line_idx = span.line.saturating_sub(1);
    let source_line = lines.get(line_idx).unwrap_or(&"");

    let line_num = span.line.to_string();
    let gutter_width = line_num.len();

    let pointer_col = span.col.saturating_sub(1);
    let pointer_len = span.length.max(1);

    let mut out = String::new();

    // error[kind]: message
    out.push_str(&format!("error[{}]: {}\n", kind, message));

    // --> line:col
    out.push_str(&format!(
        "{:>width$}--> line {}:{}\n",
        " ",
        span.line,
        span.col,
        width = gutter_width
    ));

    // empty gutter line
    out.push_str(&format!("{:>width$} |\n", " ", width = gutter_width));

    // source line
    out.push_str(&format!(
        "{:>width$} | {}\n",
        span.line,
        source_line,
        width = gutter_width
    ));

    // pointer line
    let padding: String = source_line
        .chars()
        .take(pointer_col)
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();
    let carets = "^".repeat(pointer_len);
    out.push_str(&format!(
        "{:>width$} | {}{}\n",
        " ",
        padding,
        carets,
        width = gutter_width
    ));

    // hint
    if let Some(hint) = hint {
        out.push_str(&format!("{:>width$} |\n", " ", width = gutter_width));
        out.push_str(&format!(
            "{:>width$} = hint: {}\n",
            " ",
            hint,
            width = gutter_width
        ));
    }

    out
}

pub fn suggest_hint(message: &str) -> Option<String> {
    let msg = message.to_lowercase();

    if msg.contains("operator '+'") && msg.contains("boolean") {
        return Some("'+' works on numbers and strings only".into());
    }

    if msg.contains("condition must be a boolean") {
        return Some("use a comparison like == or < in the condition".into());
    }

    if msg.contains("unterminated string") {
        return Some("close the string with a matching quote on the same line".into());
    }

    if msg.contains("expected 'do'") {
        return Some("blocks start with 'do' on the same line and close with 'end'".into());
    }

    if msg.contains("expected 'end'") {
        return Some("every 'do' needs a matching 'end' on its own line".into());
    }

    if msg.contains("is not defined") || msg.contains("does not exist") {
        return Some("define it earlier in the program, or check the spelling".into());
    }

    if msg.contains("invalid float format") {
        return Some("write the fraction digits after the dot, like 1.0".into());
    }

    None
}
