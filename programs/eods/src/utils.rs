use fixed::types::I80F48;

use crate::{math_error, prelude::DelegationResult};

/// `value * numerator / denominator`, multiplying first to keep precision on small ratios.
/// Falls back to dividing first if the product would overflow.
pub fn mul_div(value: I80F48, numerator: I80F48, denominator: I80F48) -> DelegationResult<I80F48> {
    match value.checked_mul(numerator) {
        Some(product) => product.checked_div(denominator).ok_or_else(math_error!()),
        None => value
            .checked_div(denominator)
            .ok_or_else(math_error!())?
            .checked_mul(numerator)
            .ok_or_else(math_error!()),
    }
}

/// Subtracts `amount` from `balance` without going below zero.
/// Returns the new balance and the part of `amount` that could not be taken.
pub fn saturating_debit(balance: I80F48, amount: I80F48) -> DelegationResult<(I80F48, I80F48)> {
    if amount <= balance {
        Ok((
            balance.checked_sub(amount).ok_or_else(math_error!())?,
            I80F48::ZERO,
        ))
    } else {
        Ok((
            I80F48::ZERO,
            amount.checked_sub(balance).ok_or_else(math_error!())?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixed_macro::types::I80F48;

    #[test]
    fn mul_div_keeps_small_ratios() {
        assert_eq!(
            mul_div(I80F48!(8), I80F48!(10), I80F48!(80)).unwrap(),
            I80F48!(1)
        );
    }

    #[test]
    fn mul_div_rejects_zero_denominator() {
        assert!(mul_div(I80F48!(8), I80F48!(10), I80F48::ZERO).is_err());
    }

    #[test]
    fn saturating_debit_reports_remainder() {
        assert_eq!(
            saturating_debit(I80F48!(5), I80F48!(2)).unwrap(),
            (I80F48!(3), I80F48::ZERO)
        );
        assert_eq!(
            saturating_debit(I80F48!(5), I80F48!(7.5)).unwrap(),
            (I80F48::ZERO, I80F48!(2.5))
        );
    }
}
