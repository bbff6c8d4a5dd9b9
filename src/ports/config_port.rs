//! Configuration access port.

/// Raw `[section] key = value` lookup. Parsing and range checks live in the domain.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    fn has_section(&self, section: &str) -> bool;
}
