/// Clean a product name cell: keep text before the first comma (ASCII or
/// full-width), collapse whitespace runs to one space, trim.
pub fn clean_name(raw: &str) -> String {
    let head = raw
        .split(|c: char| c == ',' || c == '，')
        .next()
        .unwrap_or_default();
    head.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when a cleaned name carries no alphanumeric content ("-", "...", "/").
pub fn is_padding(name: &str) -> bool {
    !name.chars().any(char::is_alphanumeric)
}
