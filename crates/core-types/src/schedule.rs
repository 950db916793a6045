use crate::error::CoreError;
use crate::position::ProductId;

/// Minimum number of hyphen-delimited segments in
/// `schedule-<seq>-<BASE>-<QUOTE>-<kind>`.
const MIN_SEGMENTS: usize = 5;

/// Decodes the instrument traded by a schedule identifier.
///
/// Only the BASE and QUOTE segments carry meaning; the sequence number and
/// kind are ignored.
pub fn decode_schedule(schedule: &str) -> Result<ProductId, CoreError> {
    let parts: Vec<&str> = schedule.split('-').collect();
    if parts.len() < MIN_SEGMENTS {
        return Err(CoreError::InvalidSchedule(schedule.to_string()));
    }

    let (base, quote) = (parts[2], parts[3]);
    if base.is_empty() || quote.is_empty() {
        return Err(CoreError::InvalidSchedule(schedule.to_string()));
    }

    Ok(ProductId::from_assets(base, quote))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_base_and_quote() {
        let product = decode_schedule("schedule-1-BTC-USD-spot").unwrap();
        assert_eq!(product.as_str(), "BTC-USD");
    }

    #[test]
    fn extra_segments_are_ignored() {
        let product = decode_schedule("schedule-42-ETH-EUR-spot-weekly").unwrap();
        assert_eq!(product.as_str(), "ETH-EUR");
    }

    #[test]
    fn short_identifiers_are_rejected() {
        assert_eq!(
            decode_schedule("bad-id"),
            Err(CoreError::InvalidSchedule("bad-id".to_string()))
        );
        assert!(decode_schedule("schedule-1-BTC-USD").is_err());
        assert!(decode_schedule("").is_err());
    }

    #[test]
    fn empty_asset_segments_are_rejected() {
        assert!(decode_schedule("schedule-1--USD-spot").is_err());
    }
}
