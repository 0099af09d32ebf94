// --- File: crates/calrelay_x402/src/price.rs ---
use crate::error::X402Error;

/// USDC has 6 decimals on every supported network.
pub const USDC_DECIMALS: u32 = 6;

/// USDC contract per network, used when no asset is configured.
pub fn usdc_asset(network: &str) -> Option<&'static str> {
    match network {
        "base-sepolia" => Some("0x036CbD53842c5426634e7929541eC2318f3dCF7e"),
        "base" => Some("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
        "avalanche-fuji" => Some("0x5425890298aed601595a70AB815c96711a31Bc65"),
        "avalanche" => Some("0xB97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E"),
        _ => None,
    }
}

/// Converts a dollar price such as `"$0.001"` into USDC atomic units (`1000`).
///
/// The leading `$` is optional. More than six decimals, negative or zero
/// amounts are rejected.
pub fn usd_to_atomic(price: &str) -> Result<u64, X402Error> {
    let invalid = || X402Error::InvalidPrice(price.to_string());
    let amount = price.trim();
    let amount = amount.strip_prefix('$').unwrap_or(amount).trim();

    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (amount, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if fraction.len() > USDC_DECIMALS as usize {
        return Err(invalid());
    }

    let scale = 10u64.pow(USDC_DECIMALS);
    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let fraction: u64 = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = USDC_DECIMALS as usize);
        padded.parse().map_err(|_| invalid())?
    };

    let atomic = whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(invalid)?;
    if atomic == 0 {
        return Err(invalid());
    }
    Ok(atomic)
}
