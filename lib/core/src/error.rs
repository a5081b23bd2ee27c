//! Error handling foundation for the portal-access client.
//!
//! Fallible operations across the client return `Report`-wrapped domain
//! errors. The enums themselves live next to the code that produces
//! them; this module only supplies the shared `Result` alias so
//! signatures stay uniform across crates.

use rootcause::Report;

/// Result alias carrying a rootcause `Report` over a domain error.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_defaults_to_unit_context() {
        let ok: Result<u8> = Ok(7);
        assert_eq!(ok.expect("should be ok"), 7);
    }
}
