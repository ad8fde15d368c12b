use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{BarberId, BlockId, SlotBlocked, SlotKey, SlotTime, SlotUnblocked};

/// ストアがIDを割り当てる前のブロック
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlockedSlot {
    pub barber_id: BarberId,
    pub date: NaiveDate,
    pub time: SlotTime,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewBlockedSlot {
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.barber_id, self.date, self.time)
    }

    pub fn with_id(self, id: BlockId) -> BlockedSlot {
        BlockedSlot {
            id,
            barber_id: self.barber_id,
            date: self.date,
            time: self.time,
            reason: self.reason,
            created_at: self.created_at,
        }
    }
}

/// 理容師による枠の予約対象からの除外
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedSlot {
    pub id: BlockId,
    pub barber_id: BarberId,
    pub date: NaiveDate,
    pub time: SlotTime,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BlockedSlot {
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.barber_id, self.date, self.time)
    }
}

/// 純粋関数：枠をブロックする。空白の理由は捨てる。
pub fn block_slot(key: SlotKey, reason: Option<String>, blocked_at: DateTime<Utc>) -> NewBlockedSlot {
    NewBlockedSlot {
        barber_id: key.barber_id,
        date: key.date,
        time: key.time,
        reason: reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty()),
        created_at: blocked_at,
    }
}

pub fn slot_blocked(block: &BlockedSlot) -> SlotBlocked {
    SlotBlocked {
        block_id: block.id,
        key: block.key(),
        reason: block.reason.clone(),
        occurred_at: block.created_at,
    }
}

pub fn slot_unblocked(block: &BlockedSlot, unblocked_at: DateTime<Utc>) -> SlotUnblocked {
    SlotUnblocked {
        block_id: block.id,
        key: block.key(),
        occurred_at: unblocked_at,
    }
}
