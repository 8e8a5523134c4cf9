use crate::error::AnalyticsError;
use crate::fetcher::TransactionFetcher;
use chrono::NaiveDate;
use core_types::{AccountId, DailyAggregate, TransactionRecord, ValuationRecord};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

/// A stateless calculator for deriving a daily performance series from account valuations.
#[derive(Debug, Default)]
pub struct PerformanceEngine {}

impl PerformanceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The main entry point for calculating a performance series.
    ///
    /// Valuations are summed per date, so one call covers a single account or a
    /// whole group, depending on what the caller passes in. Transactions for the
    /// accounts present in `valuations` are pulled from `fetcher` for the span
    /// between the first and last valuation date.
    ///
    /// # Arguments
    ///
    /// * `valuations` - Valuation records in any order, possibly several per date.
    /// * `fetcher` - The storage capability used to load the matching transactions.
    ///
    /// # Returns
    ///
    /// The series in ascending date order, one entry per distinct date, or an
    /// `AnalyticsError` if a day's return is undefined. An empty input yields an
    /// empty series and the fetcher is never called.
    pub async fn compute_performance<F>(
        &self,
        valuations: &[ValuationRecord],
        fetcher: &F,
    ) -> Result<Vec<DailyAggregate>, AnalyticsError>
    where
        F: TransactionFetcher + ?Sized,
    {
        let values_by_date = aggregate_valuations(valuations);

        let (Some(&start_date), Some(&end_date)) =
            (values_by_date.keys().next(), values_by_date.keys().next_back())
        else {
            return Ok(Vec::new());
        };

        let account_ids: Vec<AccountId> = valuations
            .iter()
            .map(|v| v.account_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let transactions = fetcher
            .fetch_transactions(&account_ids, start_date, end_date)
            .await?;

        tracing::debug!(
            accounts = account_ids.len(),
            dates = values_by_date.len(),
            transactions = transactions.len(),
            %start_date,
            %end_date,
            "Computing performance series."
        );

        build_series(&values_by_date, &transactions)
    }

    /// Computes the series from transactions the caller already holds.
    ///
    /// Unlike `compute_performance`, no window is applied to `transactions`:
    /// only their dates matter, and dates without a valuation are ignored.
    pub fn calculate(
        &self,
        valuations: &[ValuationRecord],
        transactions: &[TransactionRecord],
    ) -> Result<Vec<DailyAggregate>, AnalyticsError> {
        build_series(&aggregate_valuations(valuations), transactions)
    }
}

/// Sums valuation records per calendar date.
fn aggregate_valuations(valuations: &[ValuationRecord]) -> BTreeMap<NaiveDate, Decimal> {
    let mut by_date = BTreeMap::new();
    for record in valuations {
        *by_date.entry(record.value_date).or_insert(Decimal::ZERO) += record.value;
    }
    by_date
}

/// Sums qualifying transactions per calendar date.
fn net_flows_by_date(transactions: &[TransactionRecord]) -> BTreeMap<NaiveDate, Decimal> {
    let mut by_date = BTreeMap::new();
    for transaction in transactions.iter().filter(|t| t.counts_toward_performance()) {
        *by_date
            .entry(transaction.transaction_date())
            .or_insert(Decimal::ZERO) += transaction.value;
    }
    by_date
}

fn build_series(
    values_by_date: &BTreeMap<NaiveDate, Decimal>,
    transactions: &[TransactionRecord],
) -> Result<Vec<DailyAggregate>, AnalyticsError> {
    let flows = net_flows_by_date(transactions);
    let mut series = Vec::with_capacity(values_by_date.len());
    let mut previous: Option<Decimal> = None;
    let mut range_performance = Decimal::ONE;

    for (&value_date, &value) in values_by_date {
        let transaction_value = flows.get(&value_date).copied().unwrap_or(Decimal::ZERO);

        // The first date has no prior value to measure against, so it is neutral.
        let (prior_value, day_performance) = match previous {
            None => (value, Decimal::ONE),
            Some(prior_value) => (
                prior_value,
                day_performance(value_date, value, prior_value, transaction_value)?,
            ),
        };

        range_performance = range_performance
            .checked_mul(day_performance)
            .ok_or(AnalyticsError::ArithmeticOverflow { date: value_date })?;

        series.push(DailyAggregate {
            value_date,
            value,
            prior_value,
            transaction_value,
            day_performance,
            range_performance,
        });
        previous = Some(value);
    }

    Ok(series)
}

/// `(value - (prior + flow)) / (prior + flow) + 1`
///
/// The capital base is the prior value plus today's net flow, which isolates
/// the organic gain from the cash that moved in or out.
fn day_performance(
    date: NaiveDate,
    value: Decimal,
    prior_value: Decimal,
    transaction_value: Decimal,
) -> Result<Decimal, AnalyticsError> {
    let overflow = || AnalyticsError::ArithmeticOverflow { date };

    let capital_base = prior_value.checked_add(transaction_value).ok_or_else(overflow)?;
    if capital_base.is_zero() {
        tracing::warn!(%date, %prior_value, %transaction_value, "Capital base is zero; return is undefined.");
        return Err(AnalyticsError::UndefinedReturn { date });
    }

    value
        .checked_sub(capital_base)
        .and_then(|gain| gain.checked_div(capital_base))
        .and_then(|ratio| ratio.checked_add(Decimal::ONE))
        .ok_or_else(overflow)
}
