use thiserror::Error;

/// Failures the domain layer can signal to the façade.
///
/// Malformed per-record data (opaque prices, unit-decorated co2 strings,
/// unknown tiers) is never an error; those values coerce to documented
/// defaults inside the types that carry them.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("product name must not be empty")]
    EmptyProductName,
    #[error("catalog lookup failed: {0}")]
    CatalogUnavailable(String),
    #[error("credit lookup failed: {0}")]
    CreditUnavailable(String),
}

#[cfg(test)]
mod tests {
    use super::DomainError;

    #[test]
    fn empty_product_name_has_actionable_message() {
        assert_eq!(DomainError::EmptyProductName.to_string(), "product name must not be empty");
    }

    #[test]
    fn collaborator_failures_carry_their_cause() {
        let error = DomainError::CreditUnavailable("bureau timed out".to_owned());
        assert_eq!(error.to_string(), "credit lookup failed: bureau timed out");

        let error = DomainError::CatalogUnavailable("index offline".to_owned());
        assert_eq!(error.to_string(), "catalog lookup failed: index offline");
    }
}
