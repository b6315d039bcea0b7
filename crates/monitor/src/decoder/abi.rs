//! Destination extraction from bridge call data and receipt logs.

use ethers::abi::{self, ParamType, Token};
use ethers::types::{Address, Log};
use ethers::utils::id;

use super::DecodeError;

pub const WBTC_BURN_SIGNATURE: &str = "burn(string,uint256)";

/// Extracts the BTC destination (`string` argument) from a WBTC burn call.
pub fn decode_wbtc_burn(input: &[u8]) -> Result<String, DecodeError> {
    if input.len() < 4 {
        return Err(DecodeError::InputTooShort(input.len()));
    }
    if input[..4] != id(WBTC_BURN_SIGNATURE) {
        return Err(DecodeError::SelectorMismatch {
            expected: WBTC_BURN_SIGNATURE,
        });
    }

    let tokens = abi::decode(&[ParamType::String, ParamType::Uint(256)], &input[4..])
        .map_err(|err| DecodeError::Malformed(err.to_string()))?;
    match tokens.into_iter().next() {
        Some(Token::String(address)) if !address.is_empty() => Ok(address),
        Some(Token::String(_)) => Err(DecodeError::MissingDestination),
        other => Err(DecodeError::Malformed(format!(
            "unexpected burn argument {other:?}"
        ))),
    }
}

/// Scans receipt logs emitted by `contract`; the destination sits in the
/// low 20 bytes of the first data word.
pub fn decode_log_destination(logs: &[Log], contract: Address) -> Result<String, DecodeError> {
    logs.iter()
        .filter(|log| log.address == contract)
        .find_map(|log| log.data.get(12..32))
        .map(hex::encode)
        .ok_or(DecodeError::MissingDestination)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ethers::types::{Bytes, U256};

    pub(crate) fn encode_wbtc_burn(btc_address: &str, amount: u64) -> Vec<u8> {
        let mut input = id(WBTC_BURN_SIGNATURE).to_vec();
        input.extend(abi::encode(&[
            Token::String(btc_address.to_string()),
            Token::Uint(U256::from(amount)),
        ]));
        input
    }

    fn log(address: &str, data: Vec<u8>) -> Log {
        Log {
            address: address.parse().unwrap(),
            data: Bytes::from(data),
            ..Log::default()
        }
    }

    #[test]
    fn burn_selector_differs_from_single_argument_burn() {
        assert_eq!(id("burn(uint256)"), [0x42, 0x96, 0x6c, 0x68]);
        assert_ne!(id(WBTC_BURN_SIGNATURE), id("burn(uint256)"));
    }

    #[test]
    fn decodes_wbtc_burn_destination() {
        let input = encode_wbtc_burn("1BoatSLRHtKNngkdXEeobR76b53LETtpyT", 150_000);
        assert_eq!(
            decode_wbtc_burn(&input).unwrap(),
            "1BoatSLRHtKNngkdXEeobR76b53LETtpyT"
        );
    }

    #[test]
    fn empty_destination_is_missing() {
        let input = encode_wbtc_burn("", 1);
        assert!(matches!(
            decode_wbtc_burn(&input),
            Err(DecodeError::MissingDestination)
        ));
    }

    #[test]
    fn rejects_other_calls_and_truncated_payloads() {
        let transfer = id("transfer(address,uint256)").to_vec();
        assert!(matches!(
            decode_wbtc_burn(&transfer),
            Err(DecodeError::SelectorMismatch { .. })
        ));
        assert!(matches!(
            decode_wbtc_burn(&[0x01, 0x02]),
            Err(DecodeError::InputTooShort(2))
        ));

        let mut truncated = encode_wbtc_burn("1BoatSLRHtKNngkdXEeobR76b53LETtpyT", 1);
        truncated.truncate(4 + 3 * 32 + 4);
        assert!(matches!(
            decode_wbtc_burn(&truncated),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn log_destination_reads_low_twenty_bytes() {
        let mut data = vec![0u8; 12];
        data.extend([0xab; 20]);
        data.extend([0u8; 32]);
        let logs = vec![
            log("0x0000000000000000000000000000000000000001", vec![0xff; 64]),
            log("0x3EE18B2214AFF97000D974CF647E7C347E8FA585", data),
        ];

        let contract = "0x3ee18B2214AFF97000D974cf647E7C347E8fa585".parse().unwrap();
        assert_eq!(
            decode_log_destination(&logs, contract).unwrap(),
            "ab".repeat(20)
        );
    }

    #[test]
    fn log_destination_missing_is_an_error() {
        let logs = vec![log(
            "0x3ee18B2214AFF97000D974cf647E7C347E8fa585",
            vec![0x12, 0x34],
        )];
        let contract = "0x3ee18B2214AFF97000D974cf647E7C347E8fa585".parse().unwrap();
        assert!(matches!(
            decode_log_destination(&logs, contract),
            Err(DecodeError::MissingDestination)
        ));
    }
}
