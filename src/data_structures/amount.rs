//! Value representation for native and token assets
//!
//! The native asset is carried as a signed 64-bit fixed point number with 8
//! decimal places. Every other asset is carried as an arbitrary precision
//! integer, conventionally scaled by 10^18. [`Amount`] makes the choice
//! explicit and refuses arithmetic across the two.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use num_bigint::{BigInt, Sign};
use serde::{Deserialize, Serialize};

use crate::data_structures::asset::SYSTEM_ASSET_ID;
use crate::data_structures::types::AssetId;
use crate::errors::{WalletError, WalletResult};

/// Decimal places of the native asset
pub const NATIVE_PRECISION: usize = 8;
/// Units in one whole native coin
pub const NATIVE_UNIT: i64 = 100_000_000;
/// Decimal places tokens are scaled by
pub const TOKEN_PRECISION: u32 = 18;
/// Digit count above which token amounts are displayed with a decimal point
const TOKEN_DISPLAY_THRESHOLD: usize = 18;
/// Digits right of the decimal point in token display
const TOKEN_DISPLAY_DECIMALS: usize = 19;

/// 10^18, the scale applied to registered and parsed token amounts
pub fn token_precision() -> BigInt {
    BigInt::from(10u32).pow(TOKEN_PRECISION)
}

/// Native asset value in units of 10^-8
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NativeAmount(i64);

impl NativeAmount {
    pub const ZERO: NativeAmount = NativeAmount(0);

    pub const fn from_units(units: i64) -> Self {
        Self(units)
    }

    /// Whole coins, failing on overflow
    pub fn from_coins(coins: i64) -> WalletResult<Self> {
        coins
            .checked_mul(NATIVE_UNIT)
            .map(Self)
            .ok_or_else(|| WalletError::AmountOverflow(format!("{coins} coins")))
    }

    pub const fn units(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, other: NativeAmount) -> WalletResult<Self> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or_else(|| WalletError::AmountOverflow(format!("{self} + {other}")))
    }

    pub fn checked_sub(self, other: NativeAmount) -> WalletResult<Self> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or_else(|| WalletError::AmountOverflow(format!("{self} - {other}")))
    }

    /// Integer division in native units, returning quotient and remainder
    pub fn div_rem(self, divisor: i64) -> WalletResult<(Self, Self)> {
        if divisor <= 0 {
            return Err(WalletError::InvalidArgument(format!(
                "Cannot divide an amount by {divisor}"
            )));
        }
        Ok((Self(self.0 / divisor), Self(self.0 % divisor)))
    }

    pub fn to_le_bytes(&self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; 8]) -> Self {
        Self(i64::from_le_bytes(bytes))
    }
}

/// Split a decimal string into sign, whole and fraction digits
///
/// Only an optional leading sign and ASCII digits are accepted, with at least
/// one digit on either side of the point.
fn split_decimal(s: &str) -> WalletResult<(&str, &str, &str)> {
    let (sign, unsigned) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.strip_prefix('+').unwrap_or(s)),
    };
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (unsigned, ""),
    };
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() && fraction.is_empty() {
        return Err(WalletError::InvalidAmount(format!("{s}: no digits")));
    }
    if !all_digits(whole) || !all_digits(fraction) {
        return Err(WalletError::InvalidAmount(format!("{s}: not a decimal number")));
    }
    Ok((sign, whole, fraction))
}

impl fmt::Display for NativeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut value = self.0 as i128;
        if value < 0 {
            f.write_str("-")?;
            value = -value;
        }
        write!(f, "{}", value / NATIVE_UNIT as i128)?;
        let fraction = value % NATIVE_UNIT as i128;
        if fraction > 0 {
            write!(f, ".{:0width$}", fraction, width = NATIVE_PRECISION)?;
        }
        Ok(())
    }
}

impl FromStr for NativeAmount {
    type Err = WalletError;

    /// Parse a decimal string with at most 8 fractional digits
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(WalletError::InvalidAmount("empty amount".to_string()));
        }
        let (sign, whole, fraction) = split_decimal(s)?;
        if fraction.len() > NATIVE_PRECISION {
            return Err(WalletError::InvalidAmount(format!(
                "{s}: unsupported precision"
            )));
        }
        let digits = format!("{sign}{whole}{fraction:0<width$}", width = NATIVE_PRECISION);
        digits
            .parse::<i64>()
            .map(Self)
            .map_err(|e| WalletError::InvalidAmount(format!("{s}: {e}")))
    }
}

/// Token value in raw integer units
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenAmount(BigInt);

impl TokenAmount {
    pub fn zero() -> Self {
        Self(BigInt::default())
    }

    pub fn from_units(units: BigInt) -> Self {
        Self(units)
    }

    pub fn from_u64(units: u64) -> Self {
        Self(BigInt::from(units))
    }

    /// Whole tokens scaled by 10^18
    pub fn from_whole(whole: u64) -> Self {
        Self(BigInt::from(whole) * token_precision())
    }

    pub fn units(&self) -> &BigInt {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.sign() == Sign::NoSign
    }

    pub fn is_positive(&self) -> bool {
        self.0.sign() == Sign::Plus
    }

    pub fn checked_add(&self, other: &TokenAmount) -> WalletResult<Self> {
        Ok(Self(&self.0 + &other.0))
    }

    pub fn checked_sub(&self, other: &TokenAmount) -> WalletResult<Self> {
        Ok(Self(&self.0 - &other.0))
    }

    /// Parse a decimal string and scale it by 10^18 without going through floats
    pub fn from_decimal_str(s: &str) -> WalletResult<Self> {
        let s = s.trim();
        let (sign, whole, fraction) = split_decimal(s)?;
        if fraction.len() > TOKEN_PRECISION as usize {
            return Err(WalletError::InvalidAmount(format!(
                "{s}: more than {TOKEN_PRECISION} decimal places"
            )));
        }
        let digits = format!(
            "{sign}{whole}{fraction:0<width$}",
            width = TOKEN_PRECISION as usize
        );
        BigInt::parse_bytes(digits.as_bytes(), 10)
            .map(Self)
            .ok_or_else(|| WalletError::InvalidAmount(format!("{s}: not a decimal number")))
    }

    /// Big-endian magnitude, empty for zero
    pub fn to_wire_bytes(&self) -> Vec<u8> {
        if self.is_zero() {
            return Vec::new();
        }
        self.0.magnitude().to_bytes_be()
    }

    pub fn from_wire_bytes(bytes: &[u8]) -> Self {
        Self(BigInt::from_bytes_be(Sign::Plus, bytes))
    }
}

impl fmt::Display for TokenAmount {
    /// Magnitudes longer than 18 digits are shown divided by 10^19; shorter
    /// ones are shown as raw units without a decimal point.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        if self.0.sign() == Sign::Minus {
            f.write_str("-")?;
        }
        let digits = self.0.magnitude().to_string();
        if digits.len() > TOKEN_DISPLAY_THRESHOLD {
            let split = digits.len() - TOKEN_DISPLAY_DECIMALS;
            let whole = if split == 0 { "0" } else { &digits[..split] };
            write!(f, "{}.{}", whole, &digits[split..])
        } else {
            f.write_str(&digits)
        }
    }
}

impl FromStr for TokenAmount {
    type Err = WalletError;

    /// Parse raw integer units
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (_, whole, fraction) = split_decimal(s)?;
        if s.contains('.') || whole.is_empty() || !fraction.is_empty() {
            return Err(WalletError::InvalidAmount(format!("{s}: not an integer")));
        }
        BigInt::parse_bytes(s.as_bytes(), 10)
            .map(Self)
            .ok_or_else(|| WalletError::InvalidAmount(format!("{s}: not an integer")))
    }
}

/// A value whose representation is fixed by the asset it belongs to
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Amount {
    Native(NativeAmount),
    Token(TokenAmount),
}

impl Amount {
    /// Zero in the representation implied by `asset_id`
    pub fn zero_for(asset_id: &AssetId) -> Self {
        if *asset_id == *SYSTEM_ASSET_ID {
            Amount::Native(NativeAmount::ZERO)
        } else {
            Amount::Token(TokenAmount::zero())
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Amount::Native(_))
    }

    /// Whether this representation is the one `asset_id` requires
    pub fn matches_asset(&self, asset_id: &AssetId) -> bool {
        self.is_native() == (*asset_id == *SYSTEM_ASSET_ID)
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Amount::Native(a) => a.is_zero(),
            Amount::Token(a) => a.is_zero(),
        }
    }

    pub fn is_positive(&self) -> bool {
        match self {
            Amount::Native(a) => a.is_positive(),
            Amount::Token(a) => a.is_positive(),
        }
    }

    pub fn as_native(&self) -> Option<NativeAmount> {
        match self {
            Amount::Native(a) => Some(*a),
            Amount::Token(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<&TokenAmount> {
        match self {
            Amount::Token(a) => Some(a),
            Amount::Native(_) => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Amount::Native(_) => "native amount",
            Amount::Token(_) => "token amount",
        }
    }

    pub fn checked_add(&self, other: &Amount) -> WalletResult<Amount> {
        match (self, other) {
            (Amount::Native(a), Amount::Native(b)) => Ok(Amount::Native(a.checked_add(*b)?)),
            (Amount::Token(a), Amount::Token(b)) => Ok(Amount::Token(a.checked_add(b)?)),
            _ => Err(WalletError::asset_mismatch(self.kind(), other.kind())),
        }
    }

    pub fn checked_sub(&self, other: &Amount) -> WalletResult<Amount> {
        match (self, other) {
            (Amount::Native(a), Amount::Native(b)) => Ok(Amount::Native(a.checked_sub(*b)?)),
            (Amount::Token(a), Amount::Token(b)) => Ok(Amount::Token(a.checked_sub(b)?)),
            _ => Err(WalletError::asset_mismatch(self.kind(), other.kind())),
        }
    }

    pub fn compare(&self, other: &Amount) -> WalletResult<Ordering> {
        match (self, other) {
            (Amount::Native(a), Amount::Native(b)) => Ok(a.cmp(b)),
            (Amount::Token(a), Amount::Token(b)) => Ok(a.cmp(b)),
            _ => Err(WalletError::asset_mismatch(self.kind(), other.kind())),
        }
    }

    /// Raw units as a big integer, the common ordering key for any asset
    pub fn to_units(&self) -> BigInt {
        match self {
            Amount::Native(a) => BigInt::from(a.units()),
            Amount::Token(a) => a.units().clone(),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Native(a) => a.fmt(f),
            Amount::Token(a) => a.fmt(f),
        }
    }
}

impl From<NativeAmount> for Amount {
    fn from(value: NativeAmount) -> Self {
        Amount::Native(value)
    }
}

impl From<TokenAmount> for Amount {
    fn from(value: TokenAmount) -> Self {
        Amount::Token(value)
    }
}

/// An amount bound to the asset it is denominated in
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetAmount {
    asset_id: AssetId,
    amount: Amount,
}

impl AssetAmount {
    pub fn new(asset_id: AssetId, amount: Amount) -> WalletResult<Self> {
        if !amount.matches_asset(&asset_id) {
            return Err(WalletError::asset_mismatch(
                format!("representation of asset {asset_id}"),
                amount.kind(),
            ));
        }
        Ok(Self { asset_id, amount })
    }

    pub fn zero(asset_id: AssetId) -> Self {
        Self {
            amount: Amount::zero_for(&asset_id),
            asset_id,
        }
    }

    pub fn asset_id(&self) -> &AssetId {
        &self.asset_id
    }

    pub fn amount(&self) -> &Amount {
        &self.amount
    }

    pub fn into_amount(self) -> Amount {
        self.amount
    }

    fn check_same_asset(&self, other: &AssetAmount) -> WalletResult<()> {
        if self.asset_id != other.asset_id {
            return Err(WalletError::asset_mismatch(self.asset_id, other.asset_id));
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &AssetAmount) -> WalletResult<Self> {
        self.check_same_asset(other)?;
        Ok(Self {
            asset_id: self.asset_id,
            amount: self.amount.checked_add(&other.amount)?,
        })
    }

    pub fn checked_sub(&self, other: &AssetAmount) -> WalletResult<Self> {
        self.check_same_asset(other)?;
        Ok(Self {
            asset_id: self.asset_id,
            amount: self.amount.checked_sub(&other.amount)?,
        })
    }

    pub fn compare(&self, other: &AssetAmount) -> WalletResult<Ordering> {
        self.check_same_asset(other)?;
        self.amount.compare(&other.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_display() {
        assert_eq!(NativeAmount::from_units(0).to_string(), "0");
        assert_eq!(NativeAmount::from_units(250_000_000).to_string(), "2.50000000");
        assert_eq!(NativeAmount::from_units(100_000_000).to_string(), "1");
        assert_eq!(NativeAmount::from_units(1).to_string(), "0.00000001");
        assert_eq!(NativeAmount::from_units(-40_000_000).to_string(), "-0.40000000");
        assert_eq!(
            NativeAmount::from_units(i64::MIN).to_string(),
            "-92233720368.54775808"
        );
    }

    #[test]
    fn test_native_parse() {
        assert_eq!(NativeAmount::from_str("2.5").unwrap().units(), 250_000_000);
        assert_eq!(NativeAmount::from_str("10").unwrap().units(), 1_000_000_000);
        assert_eq!(NativeAmount::from_str("0.00000001").unwrap().units(), 1);
        assert_eq!(NativeAmount::from_str(".5").unwrap().units(), 50_000_000);
        assert_eq!(NativeAmount::from_str("-1.5").unwrap().units(), -150_000_000);
        assert!(NativeAmount::from_str("0.000000001").is_err());
        assert!(NativeAmount::from_str("abc").is_err());
        assert!(NativeAmount::from_str("").is_err());
    }

    #[test]
    fn test_amounts_without_digits_are_rejected() {
        for input in [".", "-", "-.", "+", "1.2.3", "1_0", "1e5", " - 1"] {
            assert!(
                matches!(NativeAmount::from_str(input), Err(WalletError::InvalidAmount(_))),
                "native {input:?}"
            );
        }
        for input in ["", ".", "-", "1_0", "1._5", "0x10"] {
            assert!(
                matches!(TokenAmount::from_decimal_str(input), Err(WalletError::InvalidAmount(_))),
                "token {input:?}"
            );
        }
        for input in ["", "1_000", "1.0", "-"] {
            assert!(TokenAmount::from_str(input).is_err(), "token units {input:?}");
        }
        assert_eq!(TokenAmount::from_str("1000").unwrap(), TokenAmount::from_u64(1000));
        assert_eq!(NativeAmount::from_str("+2").unwrap().units(), 200_000_000);
    }

    #[test]
    fn test_native_overflow_fails() {
        let max = NativeAmount::from_units(i64::MAX);
        assert!(matches!(
            max.checked_add(NativeAmount::from_units(1)),
            Err(WalletError::AmountOverflow(_))
        ));
        assert!(NativeAmount::from_coins(i64::MAX / 10).is_err());
    }

    #[test]
    fn test_native_div_rem() {
        let (share, rem) = NativeAmount::from_units(10).div_rem(3).unwrap();
        assert_eq!(share.units(), 3);
        assert_eq!(rem.units(), 1);
        assert!(NativeAmount::from_units(10).div_rem(0).is_err());
    }

    #[test]
    fn test_token_display_threshold() {
        // 18 digits: below the threshold, raw units without a decimal point
        let eighteen = TokenAmount::from_str("123456789012345678").unwrap();
        assert_eq!(eighteen.to_string(), "123456789012345678");

        // 19 digits: decimal point 19 digits from the right
        let nineteen = TokenAmount::from_str("1234567890123456789").unwrap();
        assert_eq!(nineteen.to_string(), "0.1234567890123456789");

        // 1000 whole tokens (22 digits)
        assert_eq!(
            TokenAmount::from_whole(1000).to_string(),
            "100.0000000000000000000"
        );

        assert_eq!(TokenAmount::zero().to_string(), "0");
        assert_eq!(
            TokenAmount::from_str("-12345678901234567890").unwrap().to_string(),
            "-1.2345678901234567890"
        );
    }

    #[test]
    fn test_token_decimal_parse_is_exact() {
        let parsed = TokenAmount::from_decimal_str("1.5").unwrap();
        assert_eq!(parsed.units().to_string(), "1500000000000000000");
        let whole = TokenAmount::from_decimal_str("3").unwrap();
        assert_eq!(whole, TokenAmount::from_whole(3));
        assert!(TokenAmount::from_decimal_str("0.0000000000000000001").is_err());
    }

    #[test]
    fn test_token_wire_bytes() {
        assert!(TokenAmount::zero().to_wire_bytes().is_empty());
        let value = TokenAmount::from_u64(0x0102);
        assert_eq!(value.to_wire_bytes(), vec![0x01, 0x02]);
        assert_eq!(TokenAmount::from_wire_bytes(&[0x01, 0x02]), value);
    }

    #[test]
    fn test_cross_variant_arithmetic_is_rejected() {
        let native = Amount::Native(NativeAmount::from_units(5));
        let token = Amount::Token(TokenAmount::from_u64(5));
        assert!(matches!(
            native.checked_add(&token),
            Err(WalletError::AssetMismatch { .. })
        ));
        assert!(matches!(
            token.checked_sub(&native),
            Err(WalletError::AssetMismatch { .. })
        ));
        assert!(native.compare(&token).is_err());
    }

    #[test]
    fn test_asset_amount_binds_representation() {
        let token_id = AssetId::new([3u8; 32]);
        assert!(AssetAmount::new(*SYSTEM_ASSET_ID, NativeAmount::from_units(1).into()).is_ok());
        assert!(matches!(
            AssetAmount::new(token_id, NativeAmount::from_units(1).into()),
            Err(WalletError::AssetMismatch { .. })
        ));

        let a = AssetAmount::new(token_id, TokenAmount::from_u64(1).into()).unwrap();
        let b = AssetAmount::new(AssetId::new([4u8; 32]), TokenAmount::from_u64(1).into()).unwrap();
        assert!(matches!(
            a.checked_add(&b),
            Err(WalletError::AssetMismatch { .. })
        ));
        assert_eq!(
            a.checked_add(&a).unwrap().amount(),
            &Amount::Token(TokenAmount::from_u64(2))
        );
    }
}
