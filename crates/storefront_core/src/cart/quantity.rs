use shared::domain::Notice;

pub const BELOW_MINIMUM_MESSAGE: &str = "Cannot be less than 1 item";
pub const OUT_OF_INVENTORY_MESSAGE: &str = "Out of inventory";
pub const INVALID_COUNT_MESSAGE: &str = "Invalid item count";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Increment,
    Decrement,
}

impl Step {
    fn delta(self) -> i64 {
        match self {
            Self::Increment => 1,
            Self::Decrement => -1,
        }
    }
}

/// Why a quantity change was not committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    BelowMinimum,
    OutOfInventory,
    InvalidCount,
    /// The backend refused the update or could not be reached.
    Remote(String),
    /// A newer revision for the same item was already committed.
    Superseded,
}

impl Rejection {
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::BelowMinimum => Some(Notice::warning(BELOW_MINIMUM_MESSAGE)),
            Self::OutOfInventory => Some(Notice::warning(OUT_OF_INVENTORY_MESSAGE)),
            Self::InvalidCount => Some(Notice::warning(INVALID_COUNT_MESSAGE)),
            Self::Remote(message) => Some(Notice::warning(message.clone())),
            Self::Superseded => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::BelowMinimum | Self::OutOfInventory | Self::InvalidCount
        )
    }
}

pub fn plan_step(current: u32, stock: u32, step: Step) -> Result<u32, Rejection> {
    let candidate = i64::from(current) + step.delta();
    if candidate < 1 {
        return Err(Rejection::BelowMinimum);
    }
    if candidate > i64::from(stock) {
        return Err(Rejection::OutOfInventory);
    }
    u32::try_from(candidate).map_err(|_| Rejection::OutOfInventory)
}

/// Validates what the shopper typed into the quantity field.
pub fn parse_direct_input(raw: &str, stock: u32) -> Result<u32, Rejection> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Rejection::InvalidCount);
    }
    let value: i64 = trimmed.parse().map_err(|_| Rejection::InvalidCount)?;
    if value <= 0 || value > i64::from(stock) {
        return Err(Rejection::InvalidCount);
    }
    u32::try_from(value).map_err(|_| Rejection::InvalidCount)
}
