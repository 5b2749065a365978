//! The persisted state of one transfer.

use tredd_contract::{Address, ContractId};
use tredd_core::varint::{append_uvarint, uvarint};

use crate::error::{StoreError, StoreResult};

const RECORD_VERSION: u8 = 1;

const FLAG_BUYER: u8 = 0b01;
const FLAG_CONTRACT: u8 = 0b10;

/// Everything the seller must remember about a transfer, from the moment
/// the stream is served until the claim settles.
///
/// `buyer` and `contract_id` are filled in at reveal time; a record without
/// them describes a transfer that was served but never paid for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRecord {
    pub transfer_id: [u8; 32],
    pub amount: u64,
    pub asset_id: [u8; 32],
    pub clear_root: [u8; 32],
    pub cipher_root: [u8; 32],
    pub key: [u8; 32],
    pub seller: Address,
    pub buyer: Option<Address>,
    pub contract_id: Option<ContractId>,
    pub reveal_deadline_ms: u64,
    pub refund_deadline_ms: u64,
}

impl TransferRecord {
    /// Serialize: integers as varints, 32-byte fields raw, optional fields
    /// behind a presence bitmap.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(256);
        out.push(RECORD_VERSION);
        append_uvarint(&mut out, self.amount);
        append_uvarint(&mut out, self.reveal_deadline_ms);
        append_uvarint(&mut out, self.refund_deadline_ms);
        out.extend_from_slice(&self.transfer_id);
        out.extend_from_slice(&self.asset_id);
        out.extend_from_slice(&self.clear_root);
        out.extend_from_slice(&self.cipher_root);
        out.extend_from_slice(&self.key);
        out.extend_from_slice(&self.seller.0);

        let mut flags = 0u8;
        if self.buyer.is_some() {
            flags |= FLAG_BUYER;
        }
        if self.contract_id.is_some() {
            flags |= FLAG_CONTRACT;
        }
        out.push(flags);
        if let Some(buyer) = self.buyer {
            out.extend_from_slice(&buyer.0);
        }
        if let Some(contract_id) = self.contract_id {
            out.extend_from_slice(&contract_id);
        }
        out
    }

    pub fn from_bytes(data: &[u8]) -> StoreResult<Self> {
        let mut cursor = Cursor { data, pos: 0 };

        if cursor.byte()? != RECORD_VERSION {
            return Err(StoreError::Malformed("unsupported record version"));
        }
        let amount = cursor.varint()?;
        let reveal_deadline_ms = cursor.varint()?;
        let refund_deadline_ms = cursor.varint()?;
        let transfer_id = cursor.array()?;
        let asset_id = cursor.array()?;
        let clear_root = cursor.array()?;
        let cipher_root = cursor.array()?;
        let key = cursor.array()?;
        let seller = Address(cursor.array()?);

        let flags = cursor.byte()?;
        if flags & !(FLAG_BUYER | FLAG_CONTRACT) != 0 {
            return Err(StoreError::Malformed("unknown presence flags"));
        }
        let buyer = if flags & FLAG_BUYER != 0 {
            Some(Address(cursor.array()?))
        } else {
            None
        };
        let contract_id = if flags & FLAG_CONTRACT != 0 {
            Some(cursor.array()?)
        } else {
            None
        };
        if !cursor.at_end() {
            return Err(StoreError::Malformed("trailing bytes"));
        }

        Ok(Self {
            transfer_id,
            amount,
            asset_id,
            clear_root,
            cipher_root,
            key,
            seller,
            buyer,
            contract_id,
            reveal_deadline_ms,
            refund_deadline_ms,
        })
    }
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn byte(&mut self) -> StoreResult<u8> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or(StoreError::Malformed("record truncated"))?;
        self.pos += 1;
        Ok(b)
    }

    fn varint(&mut self) -> StoreResult<u64> {
        let (value, read) = uvarint(&self.data[self.pos..])
            .ok_or(StoreError::Malformed("bad varint in record"))?;
        self.pos += read;
        Ok(value)
    }

    fn array(&mut self) -> StoreResult<[u8; 32]> {
        let end = self.pos + 32;
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or(StoreError::Malformed("record truncated"))?;
        self.pos = end;
        Ok(slice.try_into().expect("slice is exactly 32 bytes"))
    }

    fn at_end(&self) -> bool {
        self.pos == self.data.len()
    }
}
