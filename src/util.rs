use crate::chain::Chain;

/// `head…tail` form of a long address; short ones are returned as-is.
pub fn abbreviate(text: &str, head: usize, tail: usize) -> String {
    let count = text.chars().count();
    if count <= head + tail + 3 {
        return text.to_owned();
    }

    let prefix = text.chars().take(head).collect::<String>();
    let suffix = text.chars().skip(count - tail).collect::<String>();
    format!("{prefix}...{suffix}")
}

pub fn short_address(address: &str) -> String {
    abbreviate(address, 10, 8)
}

pub fn node_caption(label: &str) -> String {
    abbreviate(label, 10, 0)
}

pub fn format_amount(value: f64, chain: Chain) -> String {
    format!("{value:.8} {}", chain.unit())
}
