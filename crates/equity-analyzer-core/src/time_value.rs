use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::EquityAnalyzerError;
use crate::types::{Money, Rate};
use crate::EquityAnalyzerResult;

/// Compounding factor `(1 + rate)^periods` using exact integer powers.
pub fn compound_factor(rate: Rate, periods: u32) -> EquityAnalyzerResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powi(i64::from(periods))
        .ok_or_else(|| EquityAnalyzerError::InvalidInput {
            field: "rate".into(),
            reason: format!("(1 + {rate})^{periods} overflows"),
        })
}

/// Present value of a single amount received after `periods` periods.
pub fn present_value(amount: Money, rate: Rate, periods: u32) -> EquityAnalyzerResult<Money> {
    if rate <= dec!(-1) {
        return Err(EquityAnalyzerError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }
    let growth = compound_factor(rate, periods)?;
    amount
        .checked_div(growth)
        .ok_or_else(|| EquityAnalyzerError::DivisionByZero {
            context: format!("present value at period {periods}"),
        })
}

/// Gordon growth terminal value: `CF * (1 + g) / (r - g)`.
///
/// The denominator must be strictly positive.
pub fn gordon_terminal_value(
    final_cash_flow: Money,
    rate: Rate,
    growth: Rate,
) -> EquityAnalyzerResult<Money> {
    let spread = rate - growth;
    if spread <= Decimal::ZERO {
        return Err(EquityAnalyzerError::InvalidAssumptions {
            scenario: "terminal value".into(),
            reason: format!("WACC ({rate}) must exceed terminal growth ({growth})"),
        });
    }
    Ok(final_cash_flow * (Decimal::ONE + growth) / spread)
}
