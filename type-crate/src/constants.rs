use fixed::types::I80F48;
use fixed_macro::types::I80F48;

/// Share of every delegator reward that accrues to the operator as a management fee.
pub const DEFAULT_FEE_QUOTIENT: I80F48 = I80F48!(0.1);

/// Smallest deposit accepted for delegation, top-ups included.
pub const MIN_DEPOSIT_TO_DELEGATE_AMOUNT: I80F48 = I80F48!(1);

/// Maximum amount of new delegation applied per processing epoch.
pub const DEFAULT_DELEGATION_CHURN_LIMIT: I80F48 = I80F48!(256);

/// Epochs between an undelegation request and the moment its exit entry matures.
pub const DEFAULT_EXIT_DELAY_EPOCHS: u64 = 4;

/// Quotas are binary fractions, so their sum is only exactly one up to rounding artifacts.
pub const QUOTA_TOLERANCE: I80F48 = I80F48!(0.000000001);

/// Allowed drift between `total_delegated_balance` and the sum of the delegator balances.
/// Per-delegator credits are rounded independently while the total is credited once.
pub const CONSERVATION_TOLERANCE: I80F48 = I80F48!(0.000000001);

/// When set, a slash that overdraws an exit entry or the active stake is rejected
/// instead of clamped.
pub const STRICT_SLASHING_FLAG: u64 = 1 << 0;

pub const CONFIG_FLAGS: u64 = STRICT_SLASHING_FLAG;
