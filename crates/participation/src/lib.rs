//! Decoding of attestation participation bitfields.
//!
//! Aggregation bits arrive from the REST API as hex-encoded SSZ bitlists
//! (LSB-first within each byte, terminated by a delimiter bit); committee
//! bits are a fixed-length SSZ bitvector. These functions turn them back
//! into validator indices against the committee rosters for the slot.

use thiserror::Error;
use vigil_api_types::committee::CommitteeData;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParticipationError {
    #[error("invalid hex bitfield: {0}")]
    InvalidHex(String),

    #[error("aggregation bits carry {got} data bits but the selected committees hold {expected} seats")]
    SegmentMismatch { got: usize, expected: usize },

    #[error("attestation references unknown committee index {0}")]
    UnknownCommittee(u64),
}

/// Participation of one committee as reconstructed from a single on-chain
/// aggregate. Several records may share `(slot, committee_index)` when the
/// same committee was re-aggregated into multiple inclusion blocks; callers
/// union the attesting sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionRecord {
    pub slot: u64,
    pub inclusion_slot: u64,
    pub committee_index: u64,
    pub attesting_indices: Vec<u64>,
}

fn parse_bits(hex_bits: &str) -> Result<Vec<bool>, ParticipationError> {
    let stripped = hex_bits.strip_prefix("0x").unwrap_or(hex_bits);
    let bytes =
        hex::decode(stripped).map_err(|err| ParticipationError::InvalidHex(err.to_string()))?;
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for byte in bytes {
        for position in 0..8 {
            bits.push(byte & (1 << position) != 0);
        }
    }
    Ok(bits)
}

/// Data bits of an SSZ bitlist: everything below the delimiter (the highest
/// set bit). A bitlist with no set bit at all decodes to no bits.
fn bitlist_data_bits(hex_bits: &str) -> Result<Vec<bool>, ParticipationError> {
    let mut bits = parse_bits(hex_bits)?;
    match bits.iter().rposition(|bit| *bit) {
        Some(delimiter) => {
            bits.truncate(delimiter);
            Ok(bits)
        }
        None => Ok(Vec::new()),
    }
}

/// Decode a legacy (single-committee) aggregation bitlist to per-seat
/// participation. Trailing bits beyond the declared committee size are
/// discarded.
pub fn decode_bitlist(
    hex_bits: &str,
    committee_size: usize,
) -> Result<Vec<bool>, ParticipationError> {
    let mut bits = bitlist_data_bits(hex_bits)?;
    bits.truncate(committee_size);
    Ok(bits)
}

/// Validator indices attested by a legacy aggregation bitlist over the given
/// committee roster.
pub fn attesting_indices(
    hex_bits: &str,
    committee: &[u64],
) -> Result<Vec<u64>, ParticipationError> {
    let bits = decode_bitlist(hex_bits, committee.len())?;
    Ok(committee
        .iter()
        .zip(bits)
        .filter_map(|(validator_index, bit)| bit.then_some(*validator_index))
        .collect())
}

/// Decode an SSZ bitvector of committee selections. No delimiter; the
/// logical length is `total_committees` and any set bit at or beyond it is
/// discarded. Returns the selected committee indices in ascending order.
pub fn decode_committee_bits(
    hex_bits: &str,
    total_committees: usize,
) -> Result<Vec<u64>, ParticipationError> {
    let bits = parse_bits(hex_bits)?;
    Ok(bits
        .iter()
        .take(total_committees)
        .enumerate()
        .filter_map(|(index, bit)| bit.then_some(index as u64))
        .collect())
}

/// Decode a post-Electra aggregate (EIP-7549): `committee_bits` selects the
/// participating committees and `aggregation_bits` concatenates one segment
/// per selected committee, in committee-index order, under a single
/// delimiter. Yields one [`InclusionRecord`] per selected committee.
///
/// The data bits must cover the selected seats exactly; excess or deficit is
/// a decode error, never a truncation.
pub fn decode_electra_aggregate(
    aggregation_bits: &str,
    committee_bits: &str,
    committees: &[CommitteeData],
    inclusion_slot: u64,
) -> Result<Vec<InclusionRecord>, ParticipationError> {
    let selected_indices = decode_committee_bits(committee_bits, committees.len())?;
    let selected: Vec<&CommitteeData> = selected_indices
        .iter()
        .map(|committee_index| {
            committees
                .iter()
                .find(|committee| committee.index == *committee_index)
                .ok_or(ParticipationError::UnknownCommittee(*committee_index))
        })
        .collect::<Result<_, _>>()?;

    let data_bits = bitlist_data_bits(aggregation_bits)?;
    let expected: usize = selected
        .iter()
        .map(|committee| committee.validators.len())
        .sum();
    if data_bits.len() != expected {
        return Err(ParticipationError::SegmentMismatch {
            got: data_bits.len(),
            expected,
        });
    }

    let mut records = Vec::with_capacity(selected.len());
    let mut offset = 0;
    for committee in selected {
        let seats = committee.validators.len();
        let attesting_indices = committee
            .validators
            .iter()
            .zip(&data_bits[offset..offset + seats])
            .filter_map(|(validator_index, bit)| bit.then_some(*validator_index))
            .collect();
        records.push(InclusionRecord {
            slot: committee.slot,
            inclusion_slot,
            committee_index: committee.index,
            attesting_indices,
        });
        offset += seats;
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// SSZ-encode a bitlist: data bits LSB-first, delimiter appended.
    fn encode_bitlist(bits: &[bool]) -> String {
        let mut bytes = vec![0u8; bits.len() / 8 + 1];
        for (position, bit) in bits.iter().enumerate() {
            if *bit {
                bytes[position / 8] |= 1 << (position % 8);
            }
        }
        bytes[bits.len() / 8] |= 1 << (bits.len() % 8);
        format!("0x{}", hex::encode(bytes))
    }

    /// SSZ-encode a bitvector: data bits LSB-first, zero-padded to a byte.
    fn encode_bitvector(bits: &[bool]) -> String {
        let mut bytes = vec![0u8; bits.len().div_ceil(8)];
        for (position, bit) in bits.iter().enumerate() {
            if *bit {
                bytes[position / 8] |= 1 << (position % 8);
            }
        }
        format!("0x{}", hex::encode(bytes))
    }

    fn committee(index: u64, slot: u64, validators: &[u64]) -> CommitteeData {
        CommitteeData {
            index,
            slot,
            validators: validators.to_vec(),
        }
    }

    #[test]
    fn test_bitlist_round_trip() {
        for bits in [
            vec![],
            vec![true],
            vec![false],
            vec![true, true, false, true],
            vec![false; 8],
            vec![true; 13],
            vec![false, true, false, false, true, false, true, true, false],
        ] {
            let encoded = encode_bitlist(&bits);
            assert_eq!(
                decode_bitlist(&encoded, bits.len()).unwrap(),
                bits,
                "round trip failed for {encoded}"
            );
        }
    }

    #[test]
    fn test_bitvector_round_trip() {
        for bits in [
            vec![true],
            vec![false, true, false, true],
            vec![true, false, false, false, false, false, false, false, true],
        ] {
            let encoded = encode_bitvector(&bits);
            let expected: Vec<u64> = bits
                .iter()
                .enumerate()
                .filter_map(|(index, bit)| bit.then_some(index as u64))
                .collect();
            assert_eq!(decode_committee_bits(&encoded, bits.len()).unwrap(), expected);
        }
    }

    #[test]
    fn test_bitlist_0x1b_decodes_four_data_bits() {
        // 0x1b = 0b00011011: delimiter at bit 4, data bits 1,1,0,1.
        assert_eq!(
            decode_bitlist("0x1b", 4).unwrap(),
            vec![true, true, false, true]
        );
    }

    #[test]
    fn test_attesting_indices_legacy() {
        let roster = [100, 200, 300, 400];
        assert_eq!(attesting_indices("0x1b", &roster).unwrap(), vec![100, 200, 400]);
    }

    #[test]
    fn test_empty_aggregate_yields_empty_set() {
        // Only the delimiter bit present.
        assert_eq!(attesting_indices("0x01", &[1, 2, 3]).unwrap(), Vec::<u64>::new());
    }

    #[test]
    fn test_all_zero_bitfield_yields_empty_set() {
        assert_eq!(attesting_indices("0x00", &[1, 2, 3]).unwrap(), Vec::<u64>::new());
    }

    #[test]
    fn test_bits_beyond_committee_size_are_discarded() {
        // Delimiter at bit 6, six data bits against a four-seat roster.
        let encoded = encode_bitlist(&[true, true, true, true, true, true]);
        assert_eq!(
            decode_bitlist(&encoded, 4).unwrap(),
            vec![true, true, true, true]
        );
    }

    #[test]
    fn test_committee_bits_discard_out_of_range_indices() {
        // 0xff sets bits 0..8 but only 3 committees exist.
        assert_eq!(decode_committee_bits("0xff", 3).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_invalid_hex_is_rejected() {
        assert!(matches!(
            decode_bitlist("0xzz", 4),
            Err(ParticipationError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_electra_aggregate_two_committees() {
        // Four committees of sizes [2, 2, 3, 2]; committees 1 and 3 selected
        // (0x0a); aggregation bits 0x17 carry data bits 1,1,1,0.
        let committees = [
            committee(0, 400, &[1, 2]),
            committee(1, 400, &[11, 12]),
            committee(2, 400, &[21, 22, 23]),
            committee(3, 400, &[31, 32]),
        ];

        let records = decode_electra_aggregate("0x17", "0x0a", &committees, 405).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].committee_index, 1);
        assert_eq!(records[0].slot, 400);
        assert_eq!(records[0].inclusion_slot, 405);
        assert_eq!(records[0].attesting_indices, vec![11, 12]);

        assert_eq!(records[1].committee_index, 3);
        assert_eq!(records[1].attesting_indices, vec![31]);
    }

    #[test]
    fn test_electra_aggregate_preserves_per_committee_attribution() {
        let committees = [committee(0, 10, &[5, 6]), committee(1, 10, &[7])];
        // Both committees selected; data bits 0,1,1 over seats [5,6] ++ [7].
        let aggregation = encode_bitlist(&[false, true, true]);
        let committee_bits = encode_bitvector(&[true, true]);

        let records =
            decode_electra_aggregate(&aggregation, &committee_bits, &committees, 11).unwrap();
        assert_eq!(records[0].attesting_indices, vec![6]);
        assert_eq!(records[1].attesting_indices, vec![7]);
    }

    #[test]
    fn test_electra_aggregate_rejects_short_segments() {
        let committees = [committee(0, 10, &[5, 6]), committee(1, 10, &[7, 8])];
        // Both committees selected (four seats) but only two data bits.
        let aggregation = encode_bitlist(&[true, false]);
        let committee_bits = encode_bitvector(&[true, true]);

        assert_eq!(
            decode_electra_aggregate(&aggregation, &committee_bits, &committees, 11),
            Err(ParticipationError::SegmentMismatch {
                got: 2,
                expected: 4
            })
        );
    }

    #[test]
    fn test_electra_aggregate_rejects_excess_bits() {
        let committees = [committee(0, 10, &[5, 6])];
        let aggregation = encode_bitlist(&[true, false, true]);
        let committee_bits = encode_bitvector(&[true]);

        assert_eq!(
            decode_electra_aggregate(&aggregation, &committee_bits, &committees, 11),
            Err(ParticipationError::SegmentMismatch {
                got: 3,
                expected: 2
            })
        );
    }

    #[test]
    fn test_electra_aggregate_unknown_committee() {
        // Committee 1 selected but the roster skips from index 0 to index 2.
        let committees = [committee(0, 10, &[5, 6]), committee(2, 10, &[7])];
        let committee_bits = encode_bitvector(&[false, true]);

        assert_eq!(
            decode_electra_aggregate("0x01", &committee_bits, &committees, 11),
            Err(ParticipationError::UnknownCommittee(1))
        );
    }
}
