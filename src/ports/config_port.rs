//! Configuration access port trait.
//!
//! Typed getters return `Ok(None)` for an absent key and `Err` with a reason
//! when the key is present but does not parse.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, String>;
    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, String>;
    fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, String>;
    /// Section names, sorted.
    fn sections(&self) -> Vec<String>;
    /// Keys of `section`, sorted; empty when the section is absent.
    fn keys(&self, section: &str) -> Vec<String>;
}
