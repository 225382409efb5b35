/// Normalises a raw board label into a domain name.
///
/// Any `Fn(&str) -> String` closure that is `Send + Sync` is a filter.
pub trait NameFilter: Send + Sync {
    fn filter(&self, label: &str) -> String;
}

impl<F> NameFilter for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn filter(&self, label: &str) -> String {
        self(label)
    }
}

/// Strips surrounding whitespace; the default filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Trim;

impl NameFilter for Trim {
    fn filter(&self, label: &str) -> String {
        label.trim().to_string()
    }
}
