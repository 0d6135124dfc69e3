//! Sidechain transaction model and its canonical binary form
//!
//! The unsigned serialization (everything except programs) is what gets hashed
//! for the transaction id and what every signature covers.

use rand::Rng;

use crate::crypto::sha256d;
use crate::data_structures::amount::{Amount, NativeAmount, TokenAmount};
use crate::data_structures::asset::{Asset, SYSTEM_ASSET_ID};
use crate::data_structures::encoding::{
    write_i64, write_u16, write_u32, write_u8, write_var_bytes, write_var_string, write_var_uint,
    ByteReader,
};
use crate::data_structures::script::SignStatus;
use crate::data_structures::types::{AssetId, ProgramHash, TxId};
use crate::errors::{SerializationError, WalletError, WalletResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TxType {
    CoinBase = 0x00,
    RegisterAsset = 0x01,
    TransferAsset = 0x02,
    TransferCrossChainAsset = 0x08,
}

impl TryFrom<u8> for TxType {
    type Error = SerializationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(TxType::CoinBase),
            0x01 => Ok(TxType::RegisterAsset),
            0x02 => Ok(TxType::TransferAsset),
            0x08 => Ok(TxType::TransferCrossChainAsset),
            other => Err(SerializationError::UnknownTransactionType(other)),
        }
    }
}

/// Type specific body of a transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    CoinBase {
        data: Vec<u8>,
    },
    RegisterAsset {
        asset: Asset,
        amount: NativeAmount,
        controller: ProgramHash,
    },
    Transfer,
    /// Parallel lists: `output_indexes[i]` points at the output funding
    /// `cross_chain_addresses[i]` on the main chain with `cross_chain_amounts[i]`
    CrossChainTransfer {
        cross_chain_addresses: Vec<String>,
        output_indexes: Vec<u64>,
        cross_chain_amounts: Vec<NativeAmount>,
    },
}

impl Payload {
    pub fn tx_type(&self) -> TxType {
        match self {
            Payload::CoinBase { .. } => TxType::CoinBase,
            Payload::RegisterAsset { .. } => TxType::RegisterAsset,
            Payload::Transfer => TxType::TransferAsset,
            Payload::CrossChainTransfer { .. } => TxType::TransferCrossChainAsset,
        }
    }

    fn serialize(&self, buf: &mut Vec<u8>) {
        match self {
            Payload::CoinBase { data } => write_var_bytes(buf, data),
            Payload::RegisterAsset {
                asset,
                amount,
                controller,
            } => {
                asset.serialize(buf);
                write_i64(buf, amount.units());
                buf.extend_from_slice(controller.as_bytes());
            }
            Payload::Transfer => {}
            Payload::CrossChainTransfer {
                cross_chain_addresses,
                output_indexes,
                cross_chain_amounts,
            } => {
                write_var_uint(buf, cross_chain_addresses.len() as u64);
                for ((address, index), amount) in cross_chain_addresses
                    .iter()
                    .zip(output_indexes)
                    .zip(cross_chain_amounts)
                {
                    write_var_string(buf, address);
                    write_var_uint(buf, *index);
                    write_i64(buf, amount.units());
                }
            }
        }
    }

    fn deserialize(tx_type: TxType, reader: &mut ByteReader<'_>) -> Result<Self, SerializationError> {
        match tx_type {
            TxType::CoinBase => Ok(Payload::CoinBase {
                data: reader.read_var_bytes("coinbase data")?,
            }),
            TxType::RegisterAsset => Ok(Payload::RegisterAsset {
                asset: Asset::deserialize(reader)?,
                amount: NativeAmount::from_units(reader.read_i64("registered amount")?),
                controller: ProgramHash::new(reader.read_array("controller")?),
            }),
            TxType::TransferAsset => Ok(Payload::Transfer),
            TxType::TransferCrossChainAsset => {
                let count = reader.read_var_uint("cross-chain entry count")?;
                let mut cross_chain_addresses = Vec::new();
                let mut output_indexes = Vec::new();
                let mut cross_chain_amounts = Vec::new();
                for _ in 0..count {
                    cross_chain_addresses.push(reader.read_var_string("cross-chain address")?);
                    output_indexes.push(reader.read_var_uint("cross-chain output index")?);
                    cross_chain_amounts.push(NativeAmount::from_units(
                        reader.read_i64("cross-chain amount")?,
                    ));
                }
                Ok(Payload::CrossChainTransfer {
                    cross_chain_addresses,
                    output_indexes,
                    cross_chain_amounts,
                })
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum AttributeUsage {
    Nonce = 0x00,
    Script = 0x20,
    Memo = 0x81,
    Description = 0x90,
    DescriptionUrl = 0x91,
    Confirmations = 0x92,
}

impl TryFrom<u8> for AttributeUsage {
    type Error = SerializationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(AttributeUsage::Nonce),
            0x20 => Ok(AttributeUsage::Script),
            0x81 => Ok(AttributeUsage::Memo),
            0x90 => Ok(AttributeUsage::Description),
            0x91 => Ok(AttributeUsage::DescriptionUrl),
            0x92 => Ok(AttributeUsage::Confirmations),
            other => Err(SerializationError::InvalidValue {
                field: "attribute usage".to_string(),
                reason: format!("unknown value {other:#04x}"),
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub usage: AttributeUsage,
    pub data: Vec<u8>,
}

impl Attribute {
    /// Nonce attribute holding a random non-negative 63-bit integer in decimal
    pub fn random_nonce() -> Self {
        let nonce: u64 = rand::thread_rng().gen::<u64>() >> 1;
        Self {
            usage: AttributeUsage::Nonce,
            data: nonce.to_string().into_bytes(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutPoint {
    pub tx_id: TxId,
    pub index: u16,
}

impl OutPoint {
    pub fn new(tx_id: TxId, index: u16) -> Self {
        Self { tx_id, index }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Input {
    pub previous: OutPoint,
    pub sequence: u32,
}

/// A value assigned to a program hash
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Output {
    asset_id: AssetId,
    value: Amount,
    output_lock: u32,
    program_hash: ProgramHash,
}

impl Output {
    /// Fails when the value's representation does not belong to `asset_id` or is negative
    pub fn new(
        asset_id: AssetId,
        value: Amount,
        output_lock: u32,
        program_hash: ProgramHash,
    ) -> WalletResult<Self> {
        if !value.matches_asset(&asset_id) {
            return Err(WalletError::asset_mismatch(
                format!("value for asset {asset_id}"),
                value,
            ));
        }
        if !value.is_zero() && !value.is_positive() {
            return Err(WalletError::InvalidAmount(format!(
                "Output value {value} is negative"
            )));
        }
        Ok(Self {
            asset_id,
            value,
            output_lock,
            program_hash,
        })
    }

    pub fn asset_id(&self) -> &AssetId {
        &self.asset_id
    }

    pub fn value(&self) -> &Amount {
        &self.value
    }

    pub fn output_lock(&self) -> u32 {
        self.output_lock
    }

    pub fn program_hash(&self) -> &ProgramHash {
        &self.program_hash
    }

    fn serialize(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.asset_id.as_bytes());
        match &self.value {
            Amount::Native(value) => write_i64(buf, value.units()),
            Amount::Token(value) => write_var_bytes(buf, &value.to_wire_bytes()),
        }
        write_u32(buf, self.output_lock);
        buf.extend_from_slice(self.program_hash.as_bytes());
    }

    fn deserialize(reader: &mut ByteReader<'_>) -> Result<Self, SerializationError> {
        let asset_id = AssetId::new(reader.read_array("output asset id")?);
        let value = if asset_id == *SYSTEM_ASSET_ID {
            Amount::Native(NativeAmount::from_units(reader.read_i64("output value")?))
        } else {
            let bytes = reader.read_var_bytes("output value")?;
            // Canonical magnitudes have no leading zero byte
            if bytes.first() == Some(&0) {
                return Err(SerializationError::InvalidValue {
                    field: "output value".to_string(),
                    reason: "token value has a leading zero byte".to_string(),
                });
            }
            Amount::Token(TokenAmount::from_wire_bytes(&bytes))
        };
        Ok(Self {
            asset_id,
            value,
            output_lock: reader.read_u32("output lock")?,
            program_hash: ProgramHash::new(reader.read_array("output program hash")?),
        })
    }
}

/// Redeem script plus the signatures collected for it
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    pub code: Vec<u8>,
    pub parameter: Vec<u8>,
}

impl Program {
    pub fn unsigned(code: Vec<u8>) -> Self {
        Self {
            code,
            parameter: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub payload_version: u8,
    pub payload: Payload,
    pub attributes: Vec<Attribute>,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub lock_time: u32,
    pub programs: Vec<Program>,
}

impl Transaction {
    /// Empty transaction carrying `payload`
    pub fn new(payload: Payload) -> Self {
        Self {
            payload_version: 0,
            payload,
            attributes: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
            programs: Vec::new(),
        }
    }

    pub fn tx_type(&self) -> TxType {
        self.payload.tx_type()
    }

    /// The bytes covered by the transaction id and by signatures
    pub fn serialize_unsigned(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        write_u8(&mut buf, self.tx_type() as u8);
        write_u8(&mut buf, self.payload_version);
        self.payload.serialize(&mut buf);

        write_var_uint(&mut buf, self.attributes.len() as u64);
        for attribute in &self.attributes {
            write_u8(&mut buf, attribute.usage as u8);
            write_var_bytes(&mut buf, &attribute.data);
        }

        write_var_uint(&mut buf, self.inputs.len() as u64);
        for input in &self.inputs {
            buf.extend_from_slice(input.previous.tx_id.as_bytes());
            write_u16(&mut buf, input.previous.index);
            write_u32(&mut buf, input.sequence);
        }

        write_var_uint(&mut buf, self.outputs.len() as u64);
        for output in &self.outputs {
            output.serialize(&mut buf);
        }

        write_u32(&mut buf, self.lock_time);
        buf
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = self.serialize_unsigned();
        write_var_uint(&mut buf, self.programs.len() as u64);
        for program in &self.programs {
            write_var_bytes(&mut buf, &program.parameter);
            write_var_bytes(&mut buf, &program.code);
        }
        buf
    }

    /// Decode a complete transaction, rejecting any bytes left over
    pub fn deserialize(bytes: &[u8]) -> Result<Self, SerializationError> {
        let mut reader = ByteReader::new(bytes);
        let tx_type = TxType::try_from(reader.read_u8("transaction type")?)?;
        let payload_version = reader.read_u8("payload version")?;
        let payload = Payload::deserialize(tx_type, &mut reader)?;

        let attribute_count = reader.read_var_uint("attribute count")?;
        let mut attributes = Vec::new();
        for _ in 0..attribute_count {
            attributes.push(Attribute {
                usage: AttributeUsage::try_from(reader.read_u8("attribute usage")?)?,
                data: reader.read_var_bytes("attribute data")?,
            });
        }

        let input_count = reader.read_var_uint("input count")?;
        let mut inputs = Vec::new();
        for _ in 0..input_count {
            let tx_id = TxId::new(reader.read_array("input txid")?);
            let index = reader.read_u16("input index")?;
            inputs.push(Input {
                previous: OutPoint::new(tx_id, index),
                sequence: reader.read_u32("input sequence")?,
            });
        }

        let output_count = reader.read_var_uint("output count")?;
        let mut outputs = Vec::new();
        for _ in 0..output_count {
            outputs.push(Output::deserialize(&mut reader)?);
        }

        let lock_time = reader.read_u32("lock time")?;

        let program_count = reader.read_var_uint("program count")?;
        let mut programs = Vec::new();
        for _ in 0..program_count {
            let parameter = reader.read_var_bytes("program parameter")?;
            let code = reader.read_var_bytes("program code")?;
            programs.push(Program { code, parameter });
        }

        if reader.remaining() > 0 {
            return Err(SerializationError::TrailingBytes(reader.remaining()));
        }

        Ok(Self {
            payload_version,
            payload,
            attributes,
            inputs,
            outputs,
            lock_time,
            programs,
        })
    }

    /// Signing progress of the first program
    pub fn sign_status(&self) -> WalletResult<SignStatus> {
        let program = self
            .programs
            .first()
            .ok_or_else(|| WalletError::InvalidProgram("Transaction has no programs".to_string()))?;
        SignStatus::of(&program.code, &program.parameter)
    }

    pub fn hash(&self) -> TxId {
        TxId::new(sha256d(&self.serialize_unsigned()))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize())
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, SerializationError> {
        let bytes = hex::decode(hex_str.trim())?;
        Self::deserialize(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;
    use crate::data_structures::script::create_standard_redeem_script;

    fn program_hash() -> (Vec<u8>, ProgramHash) {
        let code = create_standard_redeem_script(&PrivateKey::random().public_key());
        let hash = ProgramHash::from_redeem_script(&code).unwrap();
        (code, hash)
    }

    fn sample_transfer() -> Transaction {
        let (code, hash) = program_hash();
        let mut tx = Transaction::new(Payload::Transfer);
        tx.attributes.push(Attribute::random_nonce());
        tx.inputs.push(Input {
            previous: OutPoint::new(TxId::new([4u8; 32]), 1),
            sequence: u32::MAX - 1,
        });
        tx.outputs.push(
            Output::new(
                *SYSTEM_ASSET_ID,
                NativeAmount::from_units(250_000_000).into(),
                0,
                hash,
            )
            .unwrap(),
        );
        tx.outputs.push(
            Output::new(
                AssetId::new([9u8; 32]),
                TokenAmount::from_whole(1000).into(),
                10,
                hash,
            )
            .unwrap(),
        );
        tx.programs.push(Program::unsigned(code));
        tx
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let tx = sample_transfer();
        let bytes = tx.serialize();
        let decoded = Transaction::deserialize(&bytes).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(decoded.serialize(), bytes);
        assert_eq!(Transaction::from_hex(&tx.to_hex()).unwrap(), tx);
    }

    #[test]
    fn test_unsigned_layout_prefix() {
        let tx = Transaction::new(Payload::Transfer);
        assert_eq!(tx.serialize_unsigned(), vec![0x02, 0x00, 0x00, 0x00, 0x00, 0, 0, 0, 0]);
        assert_eq!(tx.serialize().len(), 10);
    }

    #[test]
    fn test_hash_ignores_programs() {
        let mut tx = sample_transfer();
        let before = tx.hash();
        tx.programs[0].parameter = vec![64u8; 65];
        assert_eq!(tx.hash(), before);
        tx.lock_time = 5;
        assert_ne!(tx.hash(), before);
    }

    #[test]
    fn test_cross_chain_payload_round_trip() {
        let (_, hash) = program_hash();
        let mut tx = Transaction::new(Payload::CrossChainTransfer {
            cross_chain_addresses: vec!["EXYZ".to_string(), "EABC".to_string()],
            output_indexes: vec![0, 1],
            cross_chain_amounts: vec![
                NativeAmount::from_units(485_000_000),
                NativeAmount::from_units(485_000_000),
            ],
        });
        tx.outputs.push(
            Output::new(*SYSTEM_ASSET_ID, NativeAmount::from_units(500_000_000).into(), 0, hash)
                .unwrap(),
        );
        let decoded = Transaction::deserialize(&tx.serialize()).unwrap();
        assert_eq!(decoded.tx_type(), TxType::TransferCrossChainAsset);
        assert_eq!(decoded, tx);
    }

    #[test]
    fn test_trailing_bytes_are_rejected() {
        let mut bytes = sample_transfer().serialize();
        bytes.push(0);
        assert_eq!(
            Transaction::deserialize(&bytes),
            Err(SerializationError::TrailingBytes(1))
        );
    }

    #[test]
    fn test_truncated_and_unknown_types_fail() {
        let bytes = sample_transfer().serialize();
        assert!(matches!(
            Transaction::deserialize(&bytes[..bytes.len() - 3]),
            Err(SerializationError::UnexpectedEof(_))
        ));
        assert_eq!(
            Transaction::deserialize(&[0x09, 0x00]),
            Err(SerializationError::UnknownTransactionType(0x09))
        );
    }

    #[test]
    fn test_output_rejects_wrong_representation() {
        let (_, hash) = program_hash();
        assert!(matches!(
            Output::new(AssetId::new([1u8; 32]), NativeAmount::from_units(1).into(), 0, hash),
            Err(WalletError::AssetMismatch { .. })
        ));
        assert!(Output::new(*SYSTEM_ASSET_ID, NativeAmount::from_units(-1).into(), 0, hash).is_err());
    }

    #[test]
    fn test_token_value_with_leading_zero_is_rejected() {
        let (_, hash) = program_hash();
        let encode = |value: &[u8]| {
            let mut buf = Vec::new();
            buf.extend_from_slice(&[9u8; 32]);
            write_var_bytes(&mut buf, value);
            write_u32(&mut buf, 0);
            buf.extend_from_slice(hash.as_bytes());
            buf
        };

        let canonical = encode(&[0x01, 0x00]);
        let output = Output::deserialize(&mut ByteReader::new(&canonical)).unwrap();
        let mut reencoded = Vec::new();
        output.serialize(&mut reencoded);
        assert_eq!(reencoded, canonical);

        let padded = encode(&[0x00, 0x01, 0x00]);
        assert!(matches!(
            Output::deserialize(&mut ByteReader::new(&padded)),
            Err(SerializationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_nonce_is_decimal() {
        let nonce = Attribute::random_nonce();
        assert_eq!(nonce.usage, AttributeUsage::Nonce);
        let text = String::from_utf8(nonce.data).unwrap();
        assert!(text.parse::<i64>().is_ok());
    }
}
