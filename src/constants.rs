//! Crate Constants
//!
//! All limits use big-endian naming: `CATEGORY_SPECIFICS_UNIT_LIMIT`
//! Example: `FIELD_STRING_BYTES_MAX` (not `MAX_FIELD_STRING_SIZE`)
//!
//! Every constant includes units in the name:
//! - `_BYTES_MAX` for size limits
//! - `_COUNT_MAX` for quantity limits

// =============================================================================
// Request Body Limits
// =============================================================================

/// Maximum size of a single string value supplied in a request body
pub const FIELD_STRING_BYTES_MAX: usize = 64 * 1024; // 64KB

/// Maximum number of amenity ids carried on a place
pub const PLACE_AMENITY_IDS_COUNT_MAX: usize = 1024;

// =============================================================================
// Entity Model
// =============================================================================

/// Number of entity kinds in the catalog
pub const ENTITY_KINDS_COUNT: usize = 6;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_limits_valid() {
        assert!(FIELD_STRING_BYTES_MAX > 0);
        assert!(PLACE_AMENITY_IDS_COUNT_MAX > 0);
    }

    #[test]
    fn test_kind_count_matches_model() {
        assert_eq!(ENTITY_KINDS_COUNT, crate::store::EntityKind::all().len());
    }
}
