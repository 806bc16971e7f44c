// Each whitespace run becomes one `_`; non-printable bytes are dropped.
fn sanitize_value(value: &str) -> String {
    let joined = value
        .split_ascii_whitespace()
        .map(|word| word.chars().filter(char::is_ascii_graphic).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    if joined.is_empty() {
        "na".to_string()
    } else {
        joined
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WarnEvent<'a> {
    pub code: &'a str,
    pub stage: &'a str,
    pub path: &'a str,
    pub action: &'a str,
    pub reason: &'a str,
    pub err: &'a str,
}

fn render(event: &WarnEvent<'_>) -> String {
    format!(
        "DIGEST_WARN code={} stage={} path={} action={} reason={} err={}",
        sanitize_value(event.code),
        sanitize_value(event.stage),
        sanitize_value(event.path),
        sanitize_value(event.action),
        sanitize_value(event.reason),
        sanitize_value(event.err),
    )
}

pub fn emit(event: WarnEvent<'_>) {
    eprintln!("{}", render(&event));
}
